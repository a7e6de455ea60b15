//! avalanche-hunt CLI: multiplier constant search for xor-shift-multiply
//! finalizers.
//!
//! Modes:
//!   --mode=population              Truncation-selection search (default)
//!   --mode=hillclimb               Screen-then-confirm hill climb
//!   --mode=inspect --multiplier=M  Score and verify one multiplier
//!
//! Options:
//!   --width=<W>          Word width of the finalizer (default: 64)
//!   --pop-size=<N>       Population cardinality (default: 16384)
//!   --eval-unit=<N>      Samples per mode per evaluation round (default: 6144)
//!   --keep=<F>           Fraction retained at truncation (default: 0.6)
//!   --top=<K>            Ranked candidates reported per generation (default: 3)
//!   --generations=<N>    Stop after N generations; 0 = run until killed
//!   --iterations=<N>     Hill-climb probe budget; 0 = run until killed
//!   --seed=<U64>         Deterministic run; default seeds from OS entropy
//!   --samples=<N>        Samples per mode for inspect mode (default: 50000)
//!   --multiplier=<M>     Multiplier to inspect (decimal or 0x-hex)
//!   --json               Emit reports as JSON lines instead of a table

use avalanche_hunt::avalanche::AvalancheEvaluator;
use avalanche_hunt::entropy::OsEntropy;
use avalanche_hunt::mixer::Mixer;
use avalanche_hunt::prng::Xoroshiro128Plus;
use avalanche_hunt::search::{
    GenerationReport, HillClimbConfig, HillClimbSearch, PopulationSearch, SearchConfig,
};

struct CliConfig {
    mode: Mode,
    width: u32,
    pop_size: usize,
    eval_unit: usize,
    keep_fraction: f64,
    top_k: usize,
    generations: u64,
    iterations: u64,
    seed: Option<u64>,
    samples: usize,
    multiplier: Option<u64>,
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Population,
    HillClimb,
    Inspect,
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    let prefix = format!("--{}=", name);
    args.iter()
        .find(|a| a.starts_with(&prefix))
        .map(|a| &a[prefix.len()..])
}

fn parse_u64_value(s: &str) -> Option<u64> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

fn parse_args() -> CliConfig {
    let args: Vec<String> = std::env::args().collect();

    let mode = match flag_value(&args, "mode") {
        Some("hillclimb") => Mode::HillClimb,
        Some("inspect") => Mode::Inspect,
        Some("population") | None => Mode::Population,
        Some(other) => {
            eprintln!("Unknown mode '{}'; expected population, hillclimb, or inspect", other);
            std::process::exit(2);
        }
    };

    let defaults = SearchConfig::default();
    let hc_defaults = HillClimbConfig::default();

    CliConfig {
        mode,
        width: flag_value(&args, "width")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.width),
        pop_size: flag_value(&args, "pop-size")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.population_size),
        eval_unit: flag_value(&args, "eval-unit")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.eval_unit),
        keep_fraction: flag_value(&args, "keep")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.keep_fraction),
        top_k: flag_value(&args, "top")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.top_k),
        generations: flag_value(&args, "generations")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        iterations: flag_value(&args, "iterations")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        seed: flag_value(&args, "seed").and_then(parse_u64_value),
        samples: flag_value(&args, "samples")
            .and_then(|v| v.parse().ok())
            .unwrap_or(hc_defaults.confirm_samples),
        multiplier: flag_value(&args, "multiplier").and_then(parse_u64_value),
        json: args.iter().any(|a| a == "--json"),
    }
}

/// Seed the generator deterministically if requested, from OS entropy
/// otherwise. Seeding failures are fatal: no sampling without a valid seed.
fn build_rng(seed: Option<u64>) -> Xoroshiro128Plus {
    match seed {
        Some(s) => Xoroshiro128Plus::from_seed(s),
        None => match Xoroshiro128Plus::from_entropy(&mut OsEntropy) {
            Ok(rng) => rng,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
    }
}

fn print_report(report: &GenerationReport, json: bool) {
    if json {
        println!("{}", serde_json::to_string(report).unwrap());
        return;
    }
    for r in &report.top {
        println!(
            "{:>10} - 0x{:016X} 0x{:016X} - {:.10} - {:>20}",
            report.generation, r.multiplier, r.inverse, r.score, r.samples
        );
    }
    println!();
}

fn main() {
    env_logger::init();

    let config = parse_args();

    match config.mode {
        Mode::Population => run_population_mode(&config),
        Mode::HillClimb => run_hill_climb_mode(&config),
        Mode::Inspect => run_inspect_mode(&config),
    }
}

fn run_population_mode(config: &CliConfig) {
    let search_config = SearchConfig {
        width: config.width,
        population_size: config.pop_size,
        eval_unit: config.eval_unit,
        keep_fraction: config.keep_fraction,
        top_k: config.top_k,
    };

    if !config.json {
        println!("=== avalanche-hunt: population search ===");
        println!(
            "width {}  population {}  eval unit {}  keep {:.0}%  top {}",
            search_config.width,
            search_config.population_size,
            search_config.eval_unit,
            search_config.keep_fraction * 100.0,
            search_config.top_k
        );
        println!();
    }

    let rng = build_rng(config.seed);
    let evaluator = AvalancheEvaluator::new(config.width, rng);
    let mut search = PopulationSearch::new(search_config, evaluator);

    loop {
        let report = search.step();
        print_report(&report, config.json);
        if config.generations != 0 && u64::from(search.generation()) >= config.generations {
            break;
        }
    }
}

fn run_hill_climb_mode(config: &CliConfig) {
    let hc_config = HillClimbConfig {
        width: config.width,
        ..HillClimbConfig::default()
    };

    if !config.json {
        println!("=== avalanche-hunt: hill climb ===");
        println!(
            "width {}  screen {}  confirm {}",
            hc_config.width, hc_config.screen_samples, hc_config.confirm_samples
        );
        println!();
    }

    let rng = build_rng(config.seed);
    let evaluator = AvalancheEvaluator::new(config.width, rng);
    let mut search = HillClimbSearch::new(hc_config, evaluator);

    if !config.json {
        let (m, score) = search.best();
        println!("{:>10} - 0x{:016X} - {:.10}", 0, m, score);
    }

    loop {
        if let Some(imp) = search.step() {
            if config.json {
                println!("{}", serde_json::to_string(&imp).unwrap());
            } else {
                println!(
                    "{:>10} - 0x{:016X} 0x{:016X} - {:.10}",
                    imp.iteration, imp.multiplier, imp.inverse, imp.score
                );
            }
        }
        if config.iterations != 0 && search.iteration() >= config.iterations {
            break;
        }
    }
}

fn run_inspect_mode(config: &CliConfig) {
    let multiplier = match config.multiplier {
        Some(m) => m,
        None => {
            eprintln!("inspect mode requires --multiplier=<M>");
            std::process::exit(2);
        }
    };

    let mixer = match Mixer::new(config.width, multiplier) {
        Ok(mixer) => mixer,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let rng = build_rng(config.seed);
    let mut evaluator = AvalancheEvaluator::new(config.width, rng);

    println!("=== avalanche-hunt: inspect ===");
    println!("multiplier 0x{:016X}", mixer.multiplier());
    println!("inverse    0x{:016X}", mixer.inverse());

    // Round-trip verification over a random batch.
    let mut check_rng = build_rng(config.seed.map(|s| s.wrapping_add(1)));
    let mut verified = 0u64;
    for _ in 0..100_000 {
        let x = check_rng.next_word(config.width);
        if mixer.unmix(mixer.mix(x)) != x {
            eprintln!("round-trip FAILED at x = 0x{:016X}", x);
            std::process::exit(1);
        }
        verified += 1;
    }
    println!("round trip verified over {} random inputs", verified);

    let ksac_mse = evaluator.combined_ksac_mse(multiplier, config.samples);
    println!(
        "combined Ksac MSE  {:.10}  ({} samples per mode)",
        ksac_mse, config.samples
    );

    let fsac_n = (config.samples / 100).max(1);
    let fsac = evaluator.combined_fsac_error(multiplier, fsac_n);
    println!(
        "combined Fsac err  {:.10}  ({} sweeps per mode)",
        fsac, fsac_n
    );
}
