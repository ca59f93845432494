//! Score functions over yearly citation counts.
//!
//! These are the continuous indicators that several classifiers threshold. They
//! are exposed so downstream analysis can report raw scores alongside the
//! boolean classification. All functions take `counts[0]` as the publication
//! year and never panic on degenerate input (all-zero or single-year histories).

/// Number of years after publication considered by the K value.
pub const K_VALUE_HORIZON: usize = 20;

/// Offset and value of the yearly maximum; ties resolve to the earliest year.
///
/// Returns `(0, 0)` for an empty slice.
pub fn earliest_peak(counts: &[u64]) -> (usize, u64) {
    let mut peak = (0, 0);
    for (t, &c) in counts.iter().enumerate() {
        if t == 0 || c > peak.1 {
            peak = (t, c);
        }
    }
    peak
}

/// Adjusted Gini coefficient of the citation distribution over time.
///
/// Ranges from -1 (all citations in the publication year) through 0 (uniform)
/// to 1 (all citations in the final year). Uncited histories score 1 and
/// single-year histories score 0.
pub fn adjusted_gini(counts: &[u64]) -> f64 {
    let total: u64 = counts.iter().sum();
    let n = counts.len();
    if total == 0 {
        return 1.0;
    }
    if n < 2 {
        return 0.0;
    }

    let n_f = n as f64;
    let total_f = total as f64;
    let weighted: f64 = counts
        .iter()
        .enumerate()
        .map(|(t, &c)| c as f64 * (n - t) as f64)
        .sum();

    (n_f / (n_f - 1.0)) * (1.0 - (2.0 * weighted - total_f) / (n_f * total_f))
}

/// Beauty coefficient: accumulated shortfall of yearly citations below the
/// straight line joining the publication year and the peak year, each year
/// scaled by `max(1, c_t)`.
///
/// Zero when the history is uncited or peaks in the publication year.
pub fn beauty_coefficient(counts: &[u64]) -> f64 {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let (tm, ctm) = earliest_peak(counts);
    if tm == 0 {
        return 0.0;
    }

    let c0 = counts[0] as f64;
    let slope = (ctm as f64 - c0) / tm as f64;
    counts[..=tm]
        .iter()
        .enumerate()
        .map(|(t, &ct)| (slope * t as f64 + c0 - ct as f64) / (ct.max(1) as f64))
        .sum()
}

/// Beauty coefficient computed on the cumulative citation share instead of
/// yearly counts, which removes the dependence on absolute volume.
///
/// The reference line runs from the first year's share to 1.0 at the year the
/// history reaches its final total.
pub fn beauty_coefficient_cumulative(counts: &[u64]) -> f64 {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }

    let mut running = 0u64;
    let shares: Vec<f64> = counts
        .iter()
        .map(|&c| {
            running += c;
            running as f64 / total as f64
        })
        .collect();

    // First year at which the whole total has been collected (exact integer test).
    let mut cumulative = 0u64;
    let mut tm = 0;
    for (t, &c) in counts.iter().enumerate() {
        cumulative += c;
        if cumulative == total {
            tm = t;
            break;
        }
    }
    if tm == 0 {
        return 0.0;
    }

    let s0 = shares[0];
    shares[..=tm]
        .iter()
        .enumerate()
        .map(|(t, &st)| (1.0 - s0) * t as f64 / tm as f64 + s0 - st)
        .sum()
}

/// Citation delay: one minus the mean cumulative citation share over all but
/// the final year.
///
/// A uniform history scores 0.5; histories that collect citations late score
/// closer to 1. Uncited or single-year histories score 0.
pub fn citation_delay(counts: &[u64]) -> f64 {
    let total: u64 = counts.iter().sum();
    let n = counts.len();
    if total == 0 || n < 2 {
        return 0.0;
    }

    let mut running = 0u64;
    let share_sum: f64 = counts[..n - 1]
        .iter()
        .map(|&c| {
            running += c;
            running as f64 / total as f64
        })
        .sum();

    1.0 - share_sum / (n - 1) as f64
}

/// K value: root-mean-square citation age over the first
/// [`K_VALUE_HORIZON`] years after publication, normalized by the horizon.
pub fn k_value(counts: &[u64]) -> f64 {
    let window = &counts[..counts.len().min(K_VALUE_HORIZON + 1)];
    let total: u64 = window.iter().sum();
    if total == 0 {
        return 0.0;
    }

    let moment: f64 = window
        .iter()
        .enumerate()
        .map(|(i, &c)| (i * i) as f64 * c as f64)
        .sum();

    (moment / total as f64).sqrt() / K_VALUE_HORIZON as f64
}

/// First offset at which the history has collected at least half of its
/// total citations. Uncited histories return 0.
pub fn half_life_year(counts: &[u64]) -> usize {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return 0;
    }

    let mut running = 0u64;
    for (t, &c) in counts.iter().enumerate() {
        running += c;
        if running >= total - running {
            return t;
        }
    }
    counts.len() - 1
}
