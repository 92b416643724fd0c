//! Thread-scaling benchmark: fixed-depth searches over a few positions for
//! 1..=N threads, printed as CSV.
//!
//! Usage: `search_bench [max_threads] [depth] [runs_per_thread]`.
//! Set `RUST_LOG=debug` for per-iteration output.

use bramble_chess::engines::engine::Engine;
use bramble_chess::engines::search_limits::{EngineConfig, SearchLimits};
use bramble_chess::game_state::board::Board;
use std::env;

const POSITIONS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
];

fn parse_arg<T: std::str::FromStr>(args: &[String], idx: usize, default: T) -> T {
    args.get(idx)
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let max_threads: usize = parse_arg(&args, 1, 8usize);
    let depth: u32 = parse_arg(&args, 2, 7u32);
    let runs_per_thread: usize = parse_arg(&args, 3, 3usize);

    let mut positions = Vec::with_capacity(POSITIONS.len());
    for fen in POSITIONS {
        match Board::from_fen(fen) {
            Ok(board) => positions.push(board),
            Err(err) => log::warn!("skipping benchmark position {fen}: {err}"),
        }
    }

    println!(
        "Thread scaling benchmark: max_threads={} depth={} runs_per_thread={}",
        max_threads, depth, runs_per_thread
    );
    println!("threads,total_ms,avg_ms,total_nodes,nps,positions,searched_runs");

    let limits = SearchLimits::fixed_depth(depth);
    for threads in 1..=max_threads.max(1) {
        let mut engine = Engine::new(EngineConfig {
            threads,
            ..EngineConfig::default()
        });
        let mut total_ms: u64 = 0;
        let mut total_nodes: u64 = 0;
        let mut searched_runs = 0usize;

        for _ in 0..runs_per_thread.max(1) {
            for board in &positions {
                engine.new_game();
                let result = engine.search_detailed(board, &limits);
                total_ms += result.elapsed_ms;
                total_nodes += result.nodes + result.qnodes;
                searched_runs += 1;
            }
        }

        let avg_ms = if searched_runs == 0 {
            0.0
        } else {
            total_ms as f64 / searched_runs as f64
        };
        println!(
            "{},{},{:.2},{},{},{},{}",
            threads,
            total_ms,
            avg_ms,
            total_nodes,
            total_nodes * 1000 / total_ms.max(1),
            positions.len(),
            searched_runs
        );
    }
}
