/*!
 * Simulation of a network of block miners in a proof of work system.
 * A network topology gives the hash rate of every miner and the delays to its peers.
 * Time units are arbitrary, but seconds work well.
 *
 * Every miner always has one mining event pending; when it fires the miner found a block on
 * its tip and relays it. Peers switch to a relayed block if it is higher than their own tip,
 * which may abandon (reorg) blocks they mined themselves.
 */

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::ExponentialSampler;

pub mod event;
pub mod network;

use event::{Event, EventQueue};
use network::{Miner, Network};

pub type BlockId = u64;
pub type MinerIndex = usize;

/// Id of the genesis block; arbitrary but helps to tell ids from heights.
pub const GENESIS_ID: BlockId = 1000;

#[derive(Parser, Debug, Clone)]
#[command(name = "minesim", version, about = "Simulate a network of proof-of-work miners", long_about = None)]
pub struct Config {
    /// Network topology file
    #[arg(short = 'f', long = "network", default_value = "./network")]
    pub network: PathBuf,

    /// Average block interval
    #[arg(short = 'i', long = "interval", default_value_t = 300.0)]
    pub block_interval: f64,

    /// Number of simulation steps
    #[arg(short = 'r', long, default_value_t = 1_000_000)]
    pub repetitions: usize,

    /// Print execution trace to stdout
    #[arg(short = 't', long)]
    pub trace: bool,

    /// Random number seed, -1 to use wall-clock
    #[arg(short = 's', long, default_value_t = 0, allow_negative_numbers = true)]
    pub seed: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Block {
    /// Only the first block has no parent in storage.
    parent: BlockId,
    /// More than one block can have the same height.
    height: u64,
    /// `None` for genesis.
    miner: Option<MinerIndex>,
}

pub struct Simulator<R> {
    block_interval: f64,
    current_time: f64,
    /// Indexed by block id minus `base_block_id`, oldest first.
    blocks: Vec<Block>,
    base_block_id: BlockId,
    /// Blocks being mined on, with the number of miners on each.
    tips: HashMap<BlockId, usize>,
    miners: Vec<Miner>,
    total_hashrate: f64,
    solve_times: Vec<ExponentialSampler>,
    events: EventQueue,
    max_reorg: usize,
    trace: bool,
    rng: R,
}

impl<R: Rng> Simulator<R> {
    /// Sets up the simulation; every miner will start on the genesis block.
    pub fn new(network: Network, block_interval: f64, trace: bool, rng: R) -> Result<Self> {
        ensure!(
            block_interval.is_finite() && block_interval > 0.0,
            "block interval must be greater than zero: {}",
            block_interval
        );
        let solve_times = network
            .miners
            .iter()
            .map(|m| ExponentialSampler::new(block_interval * network.total_hashrate / m.hashrate))
            .collect::<Result<Vec<_>>>()?;
        Ok(Simulator {
            block_interval,
            current_time: 0.0,
            blocks: vec![Block { parent: 0, height: 0, miner: None }],
            base_block_id: GENESIS_ID,
            tips: HashMap::new(),
            miners: network.miners,
            total_hashrate: network.total_hashrate,
            solve_times,
            events: EventQueue::new(),
            max_reorg: 0,
            trace,
            rng,
        })
    }

    fn is_stored(&self, id: BlockId) -> bool {
        id >= self.base_block_id && ((id - self.base_block_id) as usize) < self.blocks.len()
    }

    fn block(&self, id: BlockId) -> &Block {
        &self.blocks[(id - self.base_block_id) as usize]
    }

    fn height(&self, id: BlockId) -> u64 {
        self.block(id).height
    }

    fn trace<W: Write>(&self, out: &mut W, args: fmt::Arguments) -> Result<()> {
        if self.trace {
            out.write_fmt(args)?;
        }
        Ok(())
    }

    /// Runs all miners for `repetitions` events, trace lines go to `out`.
    pub fn run<W: Write>(&mut self, repetitions: usize, out: &mut W) -> Result<()> {
        for mi in 0..self.miners.len() {
            self.start_mining(mi, self.base_block_id, out)?;
        }
        for _ in 0..repetitions {
            self.step(out)?;
        }
        debug!("simulation done at time {:.3}", self.current_time);
        Ok(())
    }

    /// Start mining on top of the given existing block.
    fn start_mining<W: Write>(&mut self, mi: MinerIndex, block: BlockId, out: &mut W) -> Result<()> {
        self.miners[mi].tip = block;
        *self.tips.entry(block).or_insert(0) += 1;

        // Schedule an event for when our "mining" will be done.
        let solve_time = self.solve_times[mi].draw(&mut self.rng);
        self.events.push(Event {
            to: mi,
            mining: true,
            when: self.current_time + solve_time,
            block,
        });
        let m = &self.miners[mi];
        self.trace(
            out,
            format_args!(
                "{:.3} {} start-on {} height {} mined {} credit {} solve {:.2}\n",
                self.current_time,
                m.name,
                block,
                self.height(block),
                m.mined,
                m.credit,
                solve_time
            ),
        )
    }

    fn stop_mining(&mut self, mi: MinerIndex) {
        let tip = self.miners[mi].tip;
        if let Some(count) = self.tips.get_mut(&tip) {
            *count -= 1;
            if *count == 0 {
                self.tips.remove(&tip);
            }
        }
    }

    /// Relay a newly found block to our peers, skipping peers that would ignore it.
    fn relay(&mut self, mi: MinerIndex, block: BlockId) {
        let height = self.height(block);
        let arrivals: Vec<Event> = self.miners[mi]
            .peers
            .iter()
            .filter(|p| self.height(self.miners[p.miner].tip) < height)
            .map(|p| Event {
                to: p.miner,
                mining: false,
                when: self.current_time + p.delay,
                block,
            })
            .collect();
        for e in arrivals {
            self.events.push(e);
        }
    }

    /// When all miners build on the same tip, blocks from the tip down to the base can't be
    /// reorged away: credit their miners and drop everything older than the tip.
    /// Newer side-branch blocks are kept so that block ids are never handed out twice.
    fn prune(&mut self) {
        if self.tips.len() != 1 || self.blocks.len() <= 1 {
            return;
        }
        let new_base = self.miners[0].tip;
        let mut id = new_base;
        while id != self.base_block_id {
            let b = *self.block(id);
            if let Some(m) = b.miner {
                self.miners[m].credit += 1;
            }
            id = b.parent;
        }
        self.blocks.drain(..(new_base - self.base_block_id) as usize);
        self.base_block_id = new_base;
    }

    /// Number of blocks abandoned when switching from `from` to the higher block `to`.
    fn reorg_depth(&self, from: BlockId, to: BlockId) -> usize {
        let mut c = from;
        let mut t = to;
        // Move back on the better chain until even with the current one.
        while self.height(t) > self.height(c) {
            t = self.block(t).parent;
        }
        // From the same height, count blocks until the branches meet.
        let mut depth = 0;
        while t != c {
            depth += 1;
            t = self.block(t).parent;
            c = self.block(c).parent;
        }
        depth
    }

    fn step<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.prune();
        let mut ev = self
            .events
            .pop()
            .ok_or_else(|| anyhow!("no pending events"))?;
        self.current_time = ev.when;
        let mi = ev.to;
        let tip = self.miners[mi].tip;
        let mut height = self.height(tip);

        if ev.mining {
            if ev.block != tip {
                // Stale mining event, there is still an active one outstanding.
                return Ok(());
            }
            self.miners[mi].mined += 1;
            self.stop_mining(mi);
            ev.block = self.base_block_id + self.blocks.len() as BlockId;
            height += 1;
            self.blocks.push(Block { parent: tip, height, miner: Some(mi) });
            self.trace(
                out,
                format_args!(
                    "{:.3} {} mined-newid {} on {} height {}\n",
                    self.current_time, self.miners[mi].name, ev.block, tip, height
                ),
            )?;
        } else {
            if !self.is_stored(ev.block) || self.height(ev.block) <= height {
                // Already mining on a block that's at least as good.
                return Ok(());
            }
            self.trace(
                out,
                format_args!(
                    "{:.3} {} received-switch-to {}\n",
                    self.current_time, self.miners[mi].name, ev.block
                ),
            )?;
            let reorg = self.reorg_depth(tip, ev.block);
            if reorg > 0 {
                self.trace(
                    out,
                    format_args!(
                        "{:.3} {} reorg {} maxreorg {}\n",
                        self.current_time, self.miners[mi].name, reorg, self.max_reorg
                    ),
                )?;
            }
            self.max_reorg = self.max_reorg.max(reorg);
            self.stop_mining(mi);
        }
        self.relay(mi, ev.block);
        self.start_mining(mi, ev.block, out)
    }

    /// Results so far.
    pub fn summary(&self, seed: i64, repetitions: usize) -> Summary {
        Summary {
            seed,
            block_interval: self.block_interval,
            repetitions,
            total_time: self.current_time,
            total_hashrate: self.total_hashrate,
            max_reorg: self.max_reorg,
            base_block_id: self.base_block_id,
            miners: self
                .miners
                .iter()
                .map(|m| MinerSummary {
                    name: m.name.clone(),
                    hashrate: m.hashrate,
                    mined: m.mined,
                    credit: m.credit,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinerSummary {
    pub name: String,
    pub hashrate: f64,
    pub mined: u64,
    pub credit: u64,
}

/// Final report; `Display` renders it one `key value` pair per line.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub seed: i64,
    pub block_interval: f64,
    pub repetitions: usize,
    pub total_time: f64,
    pub total_hashrate: f64,
    pub max_reorg: usize,
    pub base_block_id: BlockId,
    pub miners: Vec<MinerSummary>,
}

impl Summary {
    pub fn mined_blocks(&self) -> u64 {
        self.miners.iter().map(|m| m.mined).sum()
    }

    /// Blocks in the best chain.
    pub fn credited_blocks(&self) -> u64 {
        self.miners.iter().map(|m| m.credit).sum()
    }

    pub fn total_stale(&self) -> u64 {
        self.mined_blocks() - self.credited_blocks()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mined = self.mined_blocks();
        let credited = self.credited_blocks();
        writeln!(f, "seed-arg {}", self.seed)?;
        writeln!(f, "block-interval-arg {:.2}", self.block_interval)?;
        writeln!(f, "mined-blocks {}", mined)?;
        writeln!(f, "height {} {:.2}%", credited, credited as f64 * 100.0 / mined as f64)?;
        writeln!(f, "total-simtime {:.2}", self.total_time)?;
        writeln!(f, "ave-block-time {:.2}", self.total_time / credited as f64)?;
        writeln!(f, "total-hashrate-arg {:.2}", self.total_hashrate)?;
        writeln!(f, "total-stale {}", self.total_stale())?;
        writeln!(f, "max-reorg-depth {}", self.max_reorg)?;
        writeln!(f, "baseblockid {}", self.base_block_id)?;
        writeln!(f, "repetitions-arg {}", self.repetitions)?;
        for m in &self.miners {
            writeln!(
                f,
                "miner {} hashrate-arg {:.2} {:.2}% blocks {:.2}% stale {:.2}%",
                m.name,
                m.hashrate,
                m.hashrate * 100.0 / self.total_hashrate,
                m.credit as f64 * 100.0 / credited as f64,
                (m.mined - m.credit) as f64 * 100.0 / m.mined as f64
            )?;
        }
        Ok(())
    }
}

/// Seed actually used for `seed` argument: -1 picks one from the wall clock.
pub fn effective_seed(seed: i64) -> Result<i64> {
    if seed == -1 {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        return Ok(nanos as i64);
    }
    Ok(seed)
}

/// Loads the topology, runs the simulation and returns its summary. Trace goes to `out`.
pub fn run<W: Write>(config: &Config, out: &mut W) -> Result<Summary> {
    let network = Network::load(&config.network)?;
    let seed = effective_seed(config.seed)?;
    info!("seed {}, {} miners", seed, network.miners.len());
    let rng = ChaCha8Rng::seed_from_u64(seed as u64);
    let mut sim = Simulator::new(network, config.block_interval, config.trace, rng)?;
    sim.run(config.repetitions, out)?;
    Ok(sim.summary(seed, config.repetitions))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulate(topology: &str, interval: f64, reps: usize, seed: u64) -> Summary {
        let network = Network::parse(topology.as_bytes()).unwrap();
        let rng = ChaCha8Rng::seed_from_u64(seed);
        let mut sim = Simulator::new(network, interval, false, rng).unwrap();
        sim.run(reps, &mut std::io::sink()).unwrap();
        sim.summary(seed as i64, reps)
    }

    fn two_miners() -> Simulator<ChaCha8Rng> {
        let network = Network::parse("a 1 b 1\nb 1 a 1\n".as_bytes()).unwrap();
        Simulator::new(network, 10.0, false, ChaCha8Rng::seed_from_u64(8)).unwrap()
    }

    /// Appends a block found by `miner` on `parent`, returns its id.
    fn add_block(sim: &mut Simulator<ChaCha8Rng>, parent: BlockId, miner: MinerIndex) -> BlockId {
        let id = sim.base_block_id + sim.blocks.len() as BlockId;
        let height = sim.height(parent) + 1;
        sim.blocks.push(Block { parent, height, miner: Some(miner) });
        id
    }

    fn set_tip(sim: &mut Simulator<ChaCha8Rng>, mi: MinerIndex, block: BlockId) {
        sim.stop_mining(mi);
        sim.miners[mi].tip = block;
        *sim.tips.entry(block).or_insert(0) += 1;
    }

    #[test]
    fn reorg_depth_counts_abandoned_blocks() {
        let mut sim = two_miners();
        let a1 = add_block(&mut sim, GENESIS_ID, 0);
        let a2 = add_block(&mut sim, a1, 0);
        let b1 = add_block(&mut sim, GENESIS_ID, 1);
        let b2 = add_block(&mut sim, b1, 1);
        let b3 = add_block(&mut sim, b2, 1);
        assert_eq!(sim.reorg_depth(a2, b3), 2);
        assert_eq!(sim.reorg_depth(a1, b2), 1);
        assert_eq!(sim.reorg_depth(a1, a2), 0);
        assert_eq!(sim.reorg_depth(GENESIS_ID, b3), 0);
    }

    #[test]
    fn switch_to_longer_fork_records_reorg() {
        let mut sim = two_miners();
        let a1 = add_block(&mut sim, GENESIS_ID, 0);
        let a2 = add_block(&mut sim, a1, 0);
        let b1 = add_block(&mut sim, GENESIS_ID, 1);
        let b2 = add_block(&mut sim, b1, 1);
        let b3 = add_block(&mut sim, b2, 1);
        set_tip(&mut sim, 0, a2);
        set_tip(&mut sim, 1, b3);
        sim.events.push(Event { to: 0, mining: false, when: 1.0, block: b3 });
        sim.step(&mut std::io::sink()).unwrap();
        assert_eq!(sim.max_reorg, 2);
        assert_eq!(sim.miners[0].tip, b3);
    }

    #[test]
    fn prune_keeps_newer_side_blocks() {
        let mut sim = two_miners();
        let a1 = add_block(&mut sim, GENESIS_ID, 0);
        let side = add_block(&mut sim, GENESIS_ID, 1);
        set_tip(&mut sim, 0, a1);
        set_tip(&mut sim, 1, a1);

        sim.prune();
        assert_eq!(sim.base_block_id, a1);
        assert_eq!(sim.miners[0].credit, 1);
        assert_eq!(sim.miners[1].credit, 0);
        assert!(sim.is_stored(side));
        assert!(!sim.is_stored(GENESIS_ID));

        // late relay of the side block is ignored
        sim.events.push(Event { to: 1, mining: false, when: 1.0, block: side });
        sim.step(&mut std::io::sink()).unwrap();
        assert_eq!(sim.miners[1].tip, a1);
        assert_eq!(sim.max_reorg, 0);
        assert!(sim.events.is_empty());

        // the next block found gets a fresh id
        sim.events.push(Event { to: 0, mining: true, when: 2.0, block: a1 });
        sim.step(&mut std::io::sink()).unwrap();
        let newest = sim.miners[0].tip;
        assert!(newest > side);
        assert_eq!(*sim.block(newest), Block { parent: a1, height: 2, miner: Some(0) });
        assert_eq!(*sim.block(side), Block { parent: GENESIS_ID, height: 1, miner: Some(1) });
    }

    #[test]
    fn single_miner_never_stale() {
        let s = simulate("solo 5\n", 600.0, 1000, 1);
        assert_eq!(s.mined_blocks(), 1000);
        assert_eq!(s.max_reorg, 0);
        // the last block found is not credited until the next step
        assert_eq!(s.credited_blocks(), 999);
        assert_eq!(s.base_block_id, GENESIS_ID + 999);
    }

    #[test]
    fn block_time_follows_interval() {
        let s = simulate("solo 5\n", 600.0, 20_000, 2);
        let ave = s.total_time / s.mined_blocks() as f64;
        assert!((ave - 600.0).abs() < 30.0, "average block time {}", ave);
    }

    #[test]
    fn instant_relay_no_reorg() {
        let s = simulate("a 1 b 0\nb 1 a 0\n", 300.0, 10_000, 3);
        assert_eq!(s.max_reorg, 0);
        // only the most recent block can still be waiting for credit
        assert!(s.total_stale() <= 1);
    }

    #[test]
    fn slow_relay_causes_stale_blocks() {
        let s = simulate("a 1 b 200\nb 1 a 200\n", 100.0, 10_000, 4);
        assert!(s.total_stale() > 0);
        assert!(s.max_reorg >= 1);
        assert!(s.credited_blocks() <= s.mined_blocks());
    }

    #[test]
    fn hashrate_share() {
        let s = simulate("big 3 small 1\nsmall 1 big 1\n", 300.0, 20_000, 5);
        let big = s.miners[0].credit as f64 / s.credited_blocks() as f64;
        assert!(big > 0.65 && big < 0.85, "big miner share {}", big);
    }

    #[test]
    fn reproducible() {
        let topology = "a 2 b 10 c 5\nb 1 a 10\nc 1 a 5 b 1\n";
        assert_eq!(simulate(topology, 60.0, 5000, 6), simulate(topology, 60.0, 5000, 6));
    }

    #[test]
    fn rejects_bad_interval() {
        let network = Network::parse("a 1\n".as_bytes()).unwrap();
        assert!(Simulator::new(network.clone(), 0.0, false, ChaCha8Rng::seed_from_u64(0)).is_err());
        assert!(Simulator::new(network, -5.0, false, ChaCha8Rng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn trace_lines() {
        let network = Network::parse("a 1 b 1\nb 1 a 1\n".as_bytes()).unwrap();
        let mut sim = Simulator::new(network, 10.0, true, ChaCha8Rng::seed_from_u64(7)).unwrap();
        let mut out = Vec::new();
        sim.run(50, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("0.000 a start-on 1000 height 0 mined 0 credit 0 solve "));
        assert!(out.contains(" mined-newid "));
        assert!(out.contains(" received-switch-to "));
    }

    #[test]
    fn report_format() {
        let s = Summary {
            seed: 7,
            block_interval: 300.0,
            repetitions: 10,
            total_time: 3000.0,
            total_hashrate: 4.0,
            max_reorg: 1,
            base_block_id: 1009,
            miners: vec![
                MinerSummary { name: "a".into(), hashrate: 3.0, mined: 8, credit: 7 },
                MinerSummary { name: "b".into(), hashrate: 1.0, mined: 2, credit: 1 },
            ],
        };
        let text = s.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "seed-arg 7",
                "block-interval-arg 300.00",
                "mined-blocks 10",
                "height 8 80.00%",
                "total-simtime 3000.00",
                "ave-block-time 375.00",
                "total-hashrate-arg 4.00",
                "total-stale 2",
                "max-reorg-depth 1",
                "baseblockid 1009",
                "repetitions-arg 10",
                "miner a hashrate-arg 3.00 75.00% blocks 87.50% stale 12.50%",
                "miner b hashrate-arg 1.00 25.00% blocks 12.50% stale 50.00%",
            ]
        );
    }

    #[test]
    fn wall_clock_seed() {
        assert_eq!(effective_seed(42).unwrap(), 42);
        assert!(effective_seed(-1).unwrap() > 0);
    }
}
