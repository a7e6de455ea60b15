//! Multiplier search strategies over the avalanche score.
//!
//! Two strategies share one evaluator:
//! - `PopulationSearch`: truncation selection. No crossover or mutation;
//!   candidates either survive unchanged (their score refined with more
//!   samples each generation) or are replaced wholesale by fresh random
//!   draws. Convergence pressure comes from discarding persistently poor
//!   scorers while survivors' estimates tighten over time.
//! - `HillClimbSearch`: single-candidate screen-then-confirm acceptance.

use serde::Serialize;

use crate::arith;
use crate::avalanche::AvalancheEvaluator;

/// One population slot: an odd multiplier with its running score.
///
/// `rounds` counts evaluation rounds folded into `score` (1 at spawn,
/// monotonically non-decreasing until the slot is replaced); `samples` is
/// the total number of Ksac observations behind the score.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub multiplier: u64,
    pub score: f64,
    pub rounds: u64,
    pub samples: u64,
}

impl Candidate {
    /// Fresh random odd multiplier scored over one evaluation unit.
    fn spawn(evaluator: &mut AvalancheEvaluator, eval_unit: usize) -> Self {
        let multiplier = evaluator.random_odd_multiplier();
        let score = evaluator.combined_ksac_mse(multiplier, eval_unit);
        Candidate {
            multiplier,
            score,
            rounds: 1,
            samples: 2 * eval_unit as u64,
        }
    }

    /// Fold one more evaluation unit into the running score. Survivors
    /// accumulate increasingly precise estimates; the batch enters with
    /// weight 1/rounds.
    fn refine(&mut self, evaluator: &mut AvalancheEvaluator, eval_unit: usize) {
        let batch = evaluator.combined_ksac_mse(self.multiplier, eval_unit);
        self.rounds += 1;
        self.score += (batch - self.score) / self.rounds as f64;
        self.samples += 2 * eval_unit as u64;
    }
}

/// Population search configuration.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Word width of the finalizer under search.
    pub width: u32,
    /// Fixed population cardinality N.
    pub population_size: usize,
    /// Samples per mode per evaluation round (a round draws 2x this).
    pub eval_unit: usize,
    /// Fraction of the population retained at truncation.
    pub keep_fraction: f64,
    /// Ranked candidates exposed per generation.
    pub top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            width: 64,
            population_size: 16 * 1024,
            eval_unit: 6 * 1024,
            keep_fraction: 0.6,
            top_k: 3,
        }
    }
}

/// A ranked candidate as exposed to the reporting sink.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub multiplier: u64,
    pub inverse: u64,
    pub score: f64,
    pub rounds: u64,
    pub samples: u64,
}

/// Per-generation snapshot of the top of the ranking. Formatting and
/// persistence belong to the consumer.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub generation: u32,
    pub top: Vec<RankedCandidate>,
}

/// Truncation-selection optimizer. One steady-state loop: refine every
/// candidate, rank, report, replace the worst tail with fresh draws.
pub struct PopulationSearch {
    config: SearchConfig,
    evaluator: AvalancheEvaluator,
    population: Vec<Candidate>,
    generation: u32,
}

impl PopulationSearch {
    pub fn new(config: SearchConfig, mut evaluator: AvalancheEvaluator) -> Self {
        assert_eq!(config.width, evaluator.width(), "config/evaluator width mismatch");
        assert!(config.population_size > 0);
        assert!((0.0..=1.0).contains(&config.keep_fraction));

        let population: Vec<Candidate> = (0..config.population_size)
            .map(|_| Candidate::spawn(&mut evaluator, config.eval_unit))
            .collect();

        PopulationSearch {
            config,
            evaluator,
            population,
            generation: 0,
        }
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn population(&self) -> &[Candidate] {
        &self.population
    }

    /// Draw one more evaluation-unit batch for every candidate.
    pub fn refine_all(&mut self) {
        let eval_unit = self.config.eval_unit;
        for candidate in &mut self.population {
            candidate.refine(&mut self.evaluator, eval_unit);
        }
    }

    /// Sort ascending by score (lower = better). Tie order is not a
    /// correctness requirement.
    pub fn rank(&mut self) {
        self.population.sort_by(|a, b| a.score.total_cmp(&b.score));
    }

    /// Snapshot of the best `k` candidates with their modular inverses.
    pub fn top(&self, k: usize) -> Vec<RankedCandidate> {
        let width = self.config.width;
        self.population
            .iter()
            .take(k)
            .map(|c| RankedCandidate {
                multiplier: c.multiplier,
                inverse: arith::mod_inverse(c.multiplier, width)
                    .expect("population multipliers are odd by construction"),
                score: c.score,
                rounds: c.rounds,
                samples: c.samples,
            })
            .collect()
    }

    /// Number of candidates retained at truncation: ceil(keep_fraction * N).
    pub fn keep_count(&self) -> usize {
        let n = self.config.population_size;
        ((n as f64) * self.config.keep_fraction).ceil() as usize
    }

    /// Discard the worst tail and replace each slot with a brand-new
    /// candidate (fresh random odd multiplier, round counter back to 1).
    /// Survivors are untouched.
    pub fn truncate_and_replenish(&mut self) {
        let keep = self.keep_count();
        let eval_unit = self.config.eval_unit;
        for slot in self.population.iter_mut().skip(keep) {
            *slot = Candidate::spawn(&mut self.evaluator, eval_unit);
        }
    }

    /// One full generation: refine, rank, report, truncate and replenish.
    pub fn step(&mut self) -> GenerationReport {
        self.refine_all();
        self.rank();

        let report = GenerationReport {
            generation: self.generation,
            top: self.top(self.config.top_k),
        };
        if let Some(best) = report.top.first() {
            log::debug!(
                "generation {}: best {:#018x} score {:.10} ({} rounds)",
                report.generation,
                best.multiplier,
                best.score,
                best.rounds
            );
        }

        self.truncate_and_replenish();
        self.generation += 1;
        report
    }
}

/// Hill-climb configuration: cheap screening batch, expensive confirmation
/// batch.
#[derive(Debug, Clone, Copy)]
pub struct HillClimbConfig {
    pub width: u32,
    /// Samples per mode for the cheap screen of each fresh candidate.
    pub screen_samples: usize,
    /// Samples per mode for confirming a candidate that passed the screen.
    pub confirm_samples: usize,
}

impl Default for HillClimbConfig {
    fn default() -> Self {
        HillClimbConfig {
            width: 64,
            screen_samples: 500,
            confirm_samples: 50_000,
        }
    }
}

/// An accepted hill-climb improvement.
#[derive(Debug, Clone, Serialize)]
pub struct Improvement {
    pub iteration: u64,
    pub multiplier: u64,
    pub inverse: u64,
    pub score: f64,
}

/// Single-candidate search: each fresh random multiplier is screened
/// against the running mean of past screen scores; only candidates that
/// screen below the mean get the expensive confirmation batch, and only a
/// confirmed score below the incumbent's replaces it.
pub struct HillClimbSearch {
    config: HillClimbConfig,
    evaluator: AvalancheEvaluator,
    best_multiplier: u64,
    best_score: f64,
    screen_mean: f64,
    screen_count: u64,
    iteration: u64,
}

impl HillClimbSearch {
    pub fn new(config: HillClimbConfig, mut evaluator: AvalancheEvaluator) -> Self {
        assert_eq!(config.width, evaluator.width(), "config/evaluator width mismatch");

        let best_multiplier = evaluator.random_odd_multiplier();
        let screen_mean = evaluator.combined_ksac_mse(best_multiplier, config.screen_samples);
        let best_score = evaluator.combined_ksac_mse(best_multiplier, config.confirm_samples);

        HillClimbSearch {
            config,
            evaluator,
            best_multiplier,
            best_score,
            screen_mean,
            screen_count: 1,
            iteration: 0,
        }
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn best(&self) -> (u64, f64) {
        (self.best_multiplier, self.best_score)
    }

    /// Probe one fresh candidate. Returns the improvement if it was
    /// confirmed better than the incumbent.
    pub fn step(&mut self) -> Option<Improvement> {
        self.iteration += 1;

        let m = self.evaluator.random_odd_multiplier();
        let screen = self.evaluator.combined_ksac_mse(m, self.config.screen_samples);
        if screen >= self.screen_mean {
            return None;
        }

        self.screen_count += 1;
        self.screen_mean += (screen - self.screen_mean) / self.screen_count as f64;

        let confirmed = self.evaluator.combined_ksac_mse(m, self.config.confirm_samples);
        if confirmed >= self.best_score {
            return None;
        }

        self.best_multiplier = m;
        self.best_score = confirmed;
        log::info!(
            "hill climb iteration {}: accepted {:#018x} score {:.10}",
            self.iteration,
            m,
            confirmed
        );

        Some(Improvement {
            iteration: self.iteration,
            multiplier: m,
            inverse: arith::mod_inverse(m, self.config.width)
                .expect("hill-climb multipliers are odd by construction"),
            score: confirmed,
        })
    }
}
