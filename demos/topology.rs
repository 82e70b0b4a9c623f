//! Prints a random fully connected network topology for `minesim`.
//! `cargo run --example topology -- 5 > network`

use std::env;
use std::io::stdout;

use blockint::minesim::network::write_random_topology;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: topology <miners_num> [max_delay=10]");
        return;
    }
    let miners = args[1].parse::<usize>().expect("First argument should be integer");
    let max_delay = if args.len() >= 3 {
        args[2].parse::<f64>().expect("Second argument should be a number")
    } else { 10.0 };
    if miners < 1 { panic!("Wrong miners_num argument") }
    if !(max_delay >= 0.0) { panic!("Wrong max_delay argument") }

    let mut rng = rand::thread_rng();
    let stdout = stdout();
    write_random_topology(&mut stdout.lock(), miners, max_delay, &mut rng).expect("Failed to write topology");
}
