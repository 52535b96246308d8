//! Batch selection simulator
//!
//! Runs millions of selections across rayon workers and compares the observed
//! prize shares with the shares the cumulative walk should produce.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use ld_core::PrizeTable;
use ld_draw::{PrizeSelector, RngSource};

/// Independent RNG streams; fixed so results don't depend on the thread count
pub const DEFAULT_SHARDS: u64 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub draws: u64,
    pub seed: u64,
    pub shards: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            draws: 1_000_000,
            seed: 0,
            shards: DEFAULT_SHARDS,
        }
    }
}

/// Observed vs expected for one prize
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrizeTally {
    pub name: String,
    pub configured: f64,
    pub expected_share: f64,
    pub count: u64,
    pub observed_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub draws: u64,
    pub seed: u64,
    pub tallies: Vec<PrizeTally>,
    /// Pearson statistic over prizes with a non-zero expected share
    pub chi_squared: f64,
    pub degrees_of_freedom: usize,
    /// Draws that landed on a prize that should be unreachable
    pub unreachable_hits: u64,
}

impl BatchReport {
    /// Largest absolute gap between observed and expected share
    pub fn max_share_error(&self) -> f64 {
        self.tallies
            .iter()
            .map(|t| (t.observed_share - t.expected_share).abs())
            .fold(0.0, f64::max)
    }
}

/// Share of [0, 1) that the selector maps to each prize
///
/// The selector is piecewise constant between cumulative sums, so probing
/// the midpoint of every such interval gives exact shares, including the
/// remainder that falls through to the last prize.
pub fn expected_shares(table: &PrizeTable) -> Vec<f64> {
    let mut breakpoints = vec![0.0, 1.0];
    let mut cumulative = 0.0;
    for prize in table.iter() {
        cumulative += prize.probability;
        if cumulative.is_finite() {
            breakpoints.push(cumulative.clamp(0.0, 1.0));
        }
    }
    breakpoints.sort_by(f64::total_cmp);
    breakpoints.dedup();

    let mut shares = vec![0.0; table.len()];
    for pair in breakpoints.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        let index = PrizeSelector::index_for(table, (lo + hi) / 2.0);
        shares[index] += hi - lo;
    }
    shares
}

fn run_shard(table: &PrizeTable, seed: u64, draws: u64) -> Vec<u64> {
    let mut rng = RngSource::new(ChaCha8Rng::seed_from_u64(seed));
    let mut counts = vec![0u64; table.len()];
    for _ in 0..draws {
        counts[PrizeSelector::select_index(table, &mut rng)] += 1;
    }
    counts
}

/// Run `config.draws` selections split across `config.shards` streams
pub fn run_batch(table: &PrizeTable, config: &BatchConfig) -> BatchReport {
    let shards = config.shards.max(1);
    let per_shard = config.draws / shards;
    let extra = config.draws % shards;

    log::info!(
        "Simulating {} draws over {} prizes ({} shards, seed {})",
        config.draws,
        table.len(),
        shards,
        config.seed
    );

    let counts = (0..shards)
        .into_par_iter()
        .map(|shard| {
            let draws = per_shard + u64::from(shard < extra);
            run_shard(table, config.seed.wrapping_add(shard), draws)
        })
        .reduce(
            || vec![0u64; table.len()],
            |mut acc, shard| {
                for (total, n) in acc.iter_mut().zip(shard) {
                    *total += n;
                }
                acc
            },
        );

    let expected = expected_shares(table);
    let total = config.draws.max(1) as f64;

    let mut chi_squared = 0.0;
    let mut categories: usize = 0;
    let mut unreachable_hits = 0;
    let tallies = table
        .iter()
        .zip(&expected)
        .zip(&counts)
        .map(|((prize, &share), &count)| {
            if share > 0.0 {
                let expected_count = share * config.draws as f64;
                chi_squared += (count as f64 - expected_count).powi(2) / expected_count;
                categories += 1;
            } else {
                unreachable_hits += count;
            }
            PrizeTally {
                name: prize.name.clone(),
                configured: prize.probability,
                expected_share: share,
                count,
                observed_share: count as f64 / total,
            }
        })
        .collect();

    if unreachable_hits > 0 {
        log::warn!("{} draws landed on prizes with no expected share", unreachable_hits);
    }

    BatchReport {
        draws: config.draws,
        seed: config.seed,
        tallies,
        chi_squared,
        degrees_of_freedom: categories.saturating_sub(1),
        unreachable_hits,
    }
}
