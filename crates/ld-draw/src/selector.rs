//! Weighted prize selection
//!
//! One uniform value r is compared against the running sum of prize
//! probabilities in table order; the first prize whose cumulative sum reaches
//! r wins. Tables that fall short of 1.0 hand the remainder to the last entry.

use ld_core::{Prize, PrizeTable};

use crate::random::RandomSource;

/// Stateless weighted selector over a [`PrizeTable`]
pub struct PrizeSelector;

impl PrizeSelector {
    /// Draw one prize
    pub fn select<'a>(table: &'a PrizeTable, rng: &mut dyn RandomSource) -> &'a Prize {
        &table.prizes()[Self::select_index(table, rng)]
    }

    /// Draw one prize and return its table index
    pub fn select_index(table: &PrizeTable, rng: &mut dyn RandomSource) -> usize {
        Self::index_for(table, rng.next_f64())
    }

    /// Index chosen for a given uniform value `r`
    ///
    /// Boundaries are inclusive: r equal to a cumulative sum picks the prize
    /// that sum ends on. Entries with no positive weight are never matched,
    /// so a table summing to zero always lands on its last prize.
    pub fn index_for(table: &PrizeTable, r: f64) -> usize {
        let mut cumulative = 0.0;
        for (index, prize) in table.iter().enumerate() {
            cumulative += prize.probability;
            if prize.probability > 0.0 && r <= cumulative {
                return index;
            }
        }
        table.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ScriptedRandom, SystemRandom};
    use ld_core::LotteryConfig;

    fn table(weights: &[f64]) -> PrizeTable {
        let prizes = weights
            .iter()
            .enumerate()
            .map(|(i, w)| Prize::new(format!("P{i}"), format!("{i}"), *w))
            .collect();
        PrizeTable::new(prizes).unwrap()
    }

    #[test]
    fn test_cumulative_walk() {
        let t = table(&[0.3, 0.7]);
        let mut rng = ScriptedRandom::constant(0.5);
        assert_eq!(PrizeSelector::select(&t, &mut rng).name, "P1");
        assert_eq!(PrizeSelector::index_for(&t, 0.1), 0);
    }

    #[test]
    fn test_inclusive_boundary() {
        let t = table(&[0.25, 0.25, 0.5]);
        assert_eq!(PrizeSelector::index_for(&t, 0.25), 0);
        assert_eq!(PrizeSelector::index_for(&t, 0.2500001), 1);
        assert_eq!(PrizeSelector::index_for(&t, 0.5), 1);
    }

    #[test]
    fn test_shortfall_goes_to_last() {
        let t = table(&[0.1, 0.1, 0.1]);
        assert_eq!(PrizeSelector::index_for(&t, 0.95), 2);
    }

    #[test]
    fn test_zero_weights_fall_back_to_last() {
        let t = table(&[0.0, 0.0, 0.0, 0.0]);
        let mut rng = ScriptedRandom::new(vec![0.0, 0.3, 0.99]);
        for _ in 0..3 {
            assert_eq!(PrizeSelector::select_index(&t, &mut rng), 3);
        }
        let mut rng = SystemRandom::seeded(3);
        for _ in 0..200 {
            assert_eq!(PrizeSelector::select_index(&t, &mut rng), 3);
        }
    }

    #[test]
    fn test_leading_zero_weight_never_matches() {
        // r = 0.0 equals the cumulative sum after the zero entry, yet it is skipped
        let t = table(&[0.0, 1.0]);
        assert_eq!(PrizeSelector::index_for(&t, 0.0), 1);

        let t = table(&[0.0, 0.0, 0.5, 0.5]);
        assert_eq!(PrizeSelector::index_for(&t, 0.0), 2);
        assert_eq!(PrizeSelector::select_index(&t, &mut ScriptedRandom::constant(0.0)), 2);
    }

    #[test]
    fn test_single_prize() {
        let t = table(&[1.0]);
        let mut rng = SystemRandom::seeded(9);
        for _ in 0..50 {
            assert_eq!(PrizeSelector::select_index(&t, &mut rng), 0);
        }
    }

    #[test]
    fn test_default_table_distribution() {
        // Pearson chi-squared against the configured weights, df = 7;
        // the 0.999 quantile is about 24.3
        let config = LotteryConfig::default();
        let t = &config.prizes;
        let trials = 20_000usize;
        let mut counts = vec![0usize; t.len()];
        let mut rng = SystemRandom::seeded(2024);
        for _ in 0..trials {
            counts[PrizeSelector::select_index(t, &mut rng)] += 1;
        }

        let chi2: f64 = t
            .iter()
            .zip(&counts)
            .map(|(prize, &observed)| {
                let expected = prize.probability * trials as f64;
                (observed as f64 - expected).powi(2) / expected
            })
            .sum();
        assert!(chi2 < 30.0, "chi-squared too large: {chi2}");
    }
}
