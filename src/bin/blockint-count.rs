//! Block interval simulator using counting (slow).
//! Closely resembles actual mining, see `blockint` for the efficient version.

use std::env;
use std::io::stdout;
use std::process::ExitCode;

use anyhow::Result;

use blockint::{cli, GeometricCountSampler};

fn main() -> Result<ExitCode> {
    env_logger::init();
    let stdout = stdout();
    let mut out = stdout.lock();
    cli::run(env::args_os(), GeometricCountSampler::new, &mut out).map(ExitCode::from)
}
