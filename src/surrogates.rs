//! Surrogate citation histories for null-model testing.
//!
//! A surrogate keeps some aggregate property of the observed history while
//! destroying its temporal arrangement. Classifying many surrogates tells how
//! often a method would call a paper a hibernator by chance.
//!
//! ## Available Rules
//!
//! - **Permutation**: uniform reordering of the yearly counts (keeps total,
//!   length and the multiset of yearly values)
//! - **Multinomial**: every citation reassigned to a uniformly random year
//!   (keeps total and length only)
//! - **Block shuffle**: contiguous blocks of years reordered (keeps total,
//!   length and short-range structure inside blocks)
//!
//! Surrogates keep the source's subjects and publication year.

use crate::errors::{HibernatorError, HibernatorResult};
use crate::series::CitationSeries;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Binomial, Distribution};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Randomization rule used to derive a surrogate history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SurrogateRule {
    /// Uniformly random reordering of the yearly counts
    #[default]
    Permutation,
    /// Total citations redistributed over the same years by independent uniform draws
    Multinomial,
    /// Reordering of contiguous blocks of years
    BlockShuffle {
        /// Years per block; the remainder forms its own block
        block_size: usize,
    },
}

/// Derive one surrogate history from `series` using `rng`.
///
/// Fails with [`HibernatorError::InvalidSeries`] for an empty source and with
/// [`HibernatorError::InvalidParameters`] for a zero block size.
pub fn generate_surrogate<R: Rng + ?Sized>(
    series: &CitationSeries,
    rule: &SurrogateRule,
    rng: &mut R,
) -> HibernatorResult<CitationSeries> {
    if series.is_empty() {
        return Err(HibernatorError::InvalidSeries {
            reason: "cannot derive a surrogate from an empty history".to_string(),
        });
    }

    let counts = match *rule {
        SurrogateRule::Permutation => permutation_counts(series.counts(), rng),
        SurrogateRule::Multinomial => multinomial_counts(series.total(), series.len(), rng)?,
        SurrogateRule::BlockShuffle { block_size } => {
            block_shuffle_counts(series.counts(), block_size, rng)?
        }
    };

    series.with_counts(counts)
}

fn permutation_counts<R: Rng + ?Sized>(counts: &[u64], rng: &mut R) -> Vec<u64> {
    let mut shuffled = counts.to_vec();
    shuffled.shuffle(rng);
    shuffled
}

/// Exact multinomial draw with equal year probabilities, sampled as a chain of
/// conditional binomials so the cost scales with the number of years rather
/// than the number of citations.
fn multinomial_counts<R: Rng + ?Sized>(
    total: u64,
    years: usize,
    rng: &mut R,
) -> HibernatorResult<Vec<u64>> {
    let mut counts = Vec::with_capacity(years);
    let mut remaining = total;

    for year in 0..years - 1 {
        let p = 1.0 / (years - year) as f64;
        let drawn = if remaining == 0 {
            0
        } else {
            Binomial::new(remaining, p)
                .map_err(|e| HibernatorError::invalid_parameter("multinomial", "p", e.to_string()))?
                .sample(rng)
        };
        counts.push(drawn);
        remaining -= drawn;
    }
    counts.push(remaining);

    Ok(counts)
}

fn block_shuffle_counts<R: Rng + ?Sized>(
    counts: &[u64],
    block_size: usize,
    rng: &mut R,
) -> HibernatorResult<Vec<u64>> {
    if block_size == 0 {
        return Err(HibernatorError::invalid_parameter(
            "block_shuffle",
            "block_size",
            "= 0 must be greater than 0",
        ));
    }
    if block_size >= counts.len() {
        // A single block cannot be reordered.
        return Ok(permutation_counts(counts, rng));
    }

    let mut blocks: Vec<&[u64]> = counts.chunks(block_size).collect();
    blocks.shuffle(rng);

    Ok(blocks.concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secure_rng::SecureRng;

    fn source() -> CitationSeries {
        CitationSeries::new(vec![0, 0, 1, 0, 0, 2, 1, 1, 1, 1, 1, 1, 1, 20, 18])
            .unwrap()
            .with_subjects(["PHYS"])
            .with_pub_year(1980)
    }

    #[test]
    fn test_permutation_preserves_multiset() {
        let mut rng = SecureRng::with_seed(11);
        let original = source();
        let surrogate = generate_surrogate(&original, &SurrogateRule::Permutation, &mut rng).unwrap();

        let mut a = original.counts().to_vec();
        let mut b = surrogate.counts().to_vec();
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, b);
        assert_eq!(surrogate.pub_year(), Some(1980));
        assert_eq!(surrogate.subjects(), original.subjects());
    }

    #[test]
    fn test_multinomial_preserves_total_and_length() {
        let mut rng = SecureRng::with_seed(5);
        let original = source();
        for _ in 0..50 {
            let surrogate =
                generate_surrogate(&original, &SurrogateRule::Multinomial, &mut rng).unwrap();
            assert_eq!(surrogate.total(), original.total());
            assert_eq!(surrogate.len(), original.len());
        }
    }

    #[test]
    fn test_multinomial_single_year_and_uncited() {
        let mut rng = SecureRng::with_seed(5);
        let single = CitationSeries::new(vec![17]).unwrap();
        let surrogate = generate_surrogate(&single, &SurrogateRule::Multinomial, &mut rng).unwrap();
        assert_eq!(surrogate.counts(), &[17]);

        let uncited = CitationSeries::new(vec![0, 0, 0]).unwrap();
        let surrogate = generate_surrogate(&uncited, &SurrogateRule::Multinomial, &mut rng).unwrap();
        assert_eq!(surrogate.counts(), &[0, 0, 0]);
    }

    #[test]
    fn test_multinomial_spreads_citations() {
        let mut rng = SecureRng::with_seed(99);
        let spike = CitationSeries::new(vec![0, 0, 0, 0, 1000]).unwrap();
        let surrogate = generate_surrogate(&spike, &SurrogateRule::Multinomial, &mut rng).unwrap();
        // Each year expects 200 citations; all five years are populated.
        assert!(surrogate.counts().iter().all(|&c| c > 100 && c < 300));
    }

    #[test]
    fn test_block_shuffle_keeps_blocks_intact() {
        let mut rng = SecureRng::with_seed(3);
        let series = CitationSeries::new(vec![1, 2, 3, 4, 5, 6, 7]).unwrap();
        let surrogate = generate_surrogate(
            &series,
            &SurrogateRule::BlockShuffle { block_size: 3 },
            &mut rng,
        )
        .unwrap();

        assert_eq!(surrogate.total(), series.total());
        assert_eq!(surrogate.len(), series.len());
        let text = format!("{:?}", surrogate.counts());
        assert!(text.contains("1, 2, 3"));
        assert!(text.contains("4, 5, 6"));
    }

    #[test]
    fn test_block_shuffle_rejects_zero_block() {
        let mut rng = SecureRng::with_seed(3);
        assert!(matches!(
            generate_surrogate(&source(), &SurrogateRule::BlockShuffle { block_size: 0 }, &mut rng),
            Err(HibernatorError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = generate_surrogate(&source(), &SurrogateRule::Multinomial, &mut SecureRng::with_seed(8))
            .unwrap();
        let b = generate_surrogate(&source(), &SurrogateRule::Multinomial, &mut SecureRng::with_seed(8))
            .unwrap();
        assert_eq!(a, b);
    }
}
