pub mod condition;
pub mod facts;
pub mod outcome;

pub use condition::{Conjunct, Gate};
pub use facts::BuildFacts;
pub use outcome::GateOutcome;
