//! Command-line front end for `apikit-http`

pub mod cli;

pub use cli::{build_config, build_request, init_tracing, run, Cli, Command};
