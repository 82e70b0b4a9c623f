//! Block interval simulator: draws intervals from the exponential distribution.

use std::env;
use std::io::stdout;
use std::process::ExitCode;

use anyhow::Result;

use blockint::{cli, ExponentialSampler};

fn main() -> Result<ExitCode> {
    env_logger::init();
    let stdout = stdout();
    let mut out = stdout.lock();
    cli::run(env::args_os(), |ave| ExponentialSampler::new(ave as f64), &mut out).map(ExitCode::from)
}
