//! Simulates a network of block miners in a proof of work system.
//! Give a network topology file and a hash rate for each miner; see `blockint::minesim`.

use std::io::{stdout, Write};

use anyhow::Result;
use clap::Parser;

use blockint::minesim::{self, Config};

fn main() -> Result<()> {
    env_logger::init();
    let config = Config::parse();
    let stdout = stdout();
    let mut out = stdout.lock();
    let summary = minesim::run(&config, &mut out)?;
    write!(out, "{}", summary)?;
    Ok(())
}
