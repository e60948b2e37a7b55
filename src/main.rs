//! deploy-gate: compile a deploy configuration into a gated script tree.
//!
//! Reads one JSON document from stdin:
//!
//! ```json
//! {
//!   "deploy": { "provider": "heroku", "on": { "tags": true } },
//!   "before_deploy": ["./prepare.sh"],
//!   "after_deploy": "./notify.sh",
//!   "build": { "branch": "master", "pull_request": false, "tag": "v1.0" }
//! }
//! ```
//!
//! and writes the script as a JSON s-expression to stdout. Rejected provider
//! entries are reported on stderr; the blocks of the valid ones are still
//! printed, and the exit code is 1.

use std::io::Read;

use deploy_gate::config::Config;
use deploy_gate::deploy::{DeployAddon, DeployInput};
use deploy_gate::logging;
use deploy_gate::shell::Builder;

const USAGE: &str = "\
usage: deploy-gate [-v|-vv] [-q] < input.json
       deploy-gate --dump-config

  -v, --verbose    log more (repeat for debug)
  -q, --quiet      only log errors
  --dump-config    print the merged configuration as TOML and exit
  -h, --help       show this help";

struct Args {
    dump_config: bool,
    quiet: bool,
    verbose: u8,
}

fn parse_args() -> Args {
    let mut args = Args {
        dump_config: false,
        quiet: false,
        verbose: 0,
    };
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--dump-config" => args.dump_config = true,
            "-q" | "--quiet" => args.quiet = true,
            "-v" | "--verbose" => args.verbose += 1,
            "-vv" => args.verbose += 2,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other => {
                eprintln!("deploy-gate: unknown argument: {other}\n\n{USAGE}");
                std::process::exit(2);
            }
        }
    }
    args
}

fn main() {
    let args = parse_args();
    logging::init(logging::level_from_flags(args.quiet, args.verbose));

    let config = Config::load();

    if args.dump_config {
        match config.to_toml() {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("deploy-gate: cannot render config: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let mut raw = String::new();
    if std::io::stdin().read_to_string(&mut raw).is_err() {
        eprintln!("deploy-gate: failed to read stdin");
        std::process::exit(1);
    }

    let addon = match DeployInput::from_json(&raw).and_then(|input| DeployAddon::from_input(&config, input)) {
        Ok(addon) => addon,
        Err(e) => {
            eprintln!("deploy-gate: {e}");
            std::process::exit(1);
        }
    };

    let mut sh = Builder::new();
    let result = addon.deploy(&mut sh);

    println!("{}", sh.to_sexp());

    if let Err(e) = result {
        eprintln!("deploy-gate: {e}");
        std::process::exit(1);
    }
}
