pub mod builder;
pub mod node;

pub use builder::Builder;
pub use node::{CmdOptions, Color, Node};
