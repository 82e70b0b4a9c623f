//! Command line front end shared by `blockint` and `blockint-count`.

use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use log::debug;

use crate::output::{write_intervals, Style};
use crate::{rng_from_seed, samples, Sampler};

#[derive(Parser, Debug)]
#[command(version, about = "Simulate block intervals of a proof-of-work chain", long_about = None)]
#[command(allow_negative_numbers = true)]
pub struct Args {
    /// Number of intervals to simulate
    pub n: usize,

    /// Average block interval
    pub ave: u64,

    /// Seed for reproducible runs (OS entropy if not given)
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Print `[a, b]` instead of `[a, b, ]`
    #[arg(long)]
    pub compact: bool,
}

/// How a command line run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Intervals (or help) were printed.
    Printed,
    /// Wrong arguments, usage was printed.
    Usage,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Printed => ExitCode::SUCCESS,
            Outcome::Usage => ExitCode::FAILURE,
        }
    }
}

/// One line usage message for program `prog`.
pub fn usage(prog: &str) -> String {
    let name = Path::new(prog)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| prog.to_string());
    format!("usage: {} n average [--seed S] [--compact]", name)
}

/// Parses `args` (program name first), builds a sampler for the average with `build`
/// and writes the simulated intervals to `out`.
///
/// A wrong number of arguments prints the usage to `out` and gives a failure exit code.
/// Numbers that do not parse and an invalid average are returned as errors.
pub fn run<S, F, I, T, W>(args: I, build: F, out: &mut W) -> Result<Outcome>
where
    S: Sampler,
    F: FnOnce(u64) -> Result<S>,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    W: Write,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let prog = args
        .first()
        .map(|a| a.to_string_lossy().into_owned())
        .unwrap_or_else(|| "blockint".to_string());

    let args = match Args::try_parse_from(&args) {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                write!(out, "{}", e.render())?;
                return Ok(Outcome::Printed);
            }
            ErrorKind::InvalidValue | ErrorKind::ValueValidation => {
                let msg = e.to_string();
                let first = msg.lines().next().unwrap_or_default();
                bail!("{}", first.trim_start_matches("error: "));
            }
            _ => {
                writeln!(out, "{}", usage(&prog))?;
                return Ok(Outcome::Usage);
            }
        },
    };
    debug!("{:?}", args);

    let sampler = build(args.ave)?;
    let mut rng = rng_from_seed(args.seed);
    let style = if args.compact { Style::Compact } else { Style::Trailing };
    write_intervals(out, samples(&sampler, args.n, &mut rng), style)?;
    writeln!(out)?;
    Ok(Outcome::Printed)
}
