//! Inequality and information metrics: Gini, Lorenz curve, Shannon entropy
//! and the mutual information between raters.

use log::debug;

use crate::config::StratificationLabel;
use crate::pairwise::RankTable;

const LOW_CYCLE_DENSITY: f64 = 0.1;
const HIGH_CYCLE_DENSITY: f64 = 0.3;
const HIERARCHY_GINI: f64 = 0.3;
const MARGINALIZED_FRACTION: f64 = 0.1;
const MARGINALIZED_MAX_VARIANCE: f64 = 1.5;
const MIN_BINS: usize = 2;
const MAX_BINS: usize = 5;

/// Discrete Gini coefficient: `sum((2i - n - 1) x_i) / (n sum(x))` over the
/// sorted values, with i starting at 1.
///
/// Returns 0 for empty or all-zero input.
pub fn compute_gini(values: &[f64]) -> f64 {
    let n = values.len();
    let total: f64 = values.iter().sum();
    if n == 0 || total <= 0.0 {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let nf = n as f64;
    let acc: f64 = sorted
        .iter()
        .enumerate()
        .map(|(idx, x)| (2.0 * (idx + 1) as f64 - nf - 1.0) * x)
        .sum();
    acc / (nf * total)
}

/// Points of the Lorenz curve, from (0, 0) to (1, 1).
///
/// With a zero total, this is the equality diagonal.
pub fn compute_lorenz_points(values: &[f64]) -> Vec<(f64, f64)> {
    let n = values.len();
    let mut points = vec![(0.0, 0.0)];
    if n == 0 {
        return points;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let total: f64 = sorted.iter().sum();
    let mut cumulative = 0.0;
    for (idx, x) in sorted.iter().enumerate() {
        cumulative += x;
        let population = (idx + 1) as f64 / n as f64;
        let share = if total > 0.0 {
            cumulative / total
        } else {
            population
        };
        points.push((population, share));
    }
    points
}

/// Rule-based classification, evaluated in a fixed priority order:
///
/// 1. low cycle density and Gini above 0.3: linear hierarchy;
/// 2. several communities, but at most half as many as participants: tiered clusters;
/// 3. high cycle density, or more communities than half the participants: fragmented;
/// 4. otherwise: mixed structure.
pub fn determine_stratification_label(
    cycle_density: f64,
    gini: f64,
    num_communities: usize,
    num_participants: usize,
) -> StratificationLabel {
    let half = num_participants as f64 / 2.0;
    if cycle_density < LOW_CYCLE_DENSITY && gini > HIERARCHY_GINI {
        StratificationLabel::LinearHierarchy
    } else if num_communities > 1 && num_communities as f64 <= half {
        StratificationLabel::TieredClusters
    } else if cycle_density > HIGH_CYCLE_DENSITY || num_communities as f64 > half {
        StratificationLabel::Fragmented
    } else {
        StratificationLabel::MixedStructure
    }
}

/// Population variance. 0 for empty input.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n
}

/// The bottom 10% (at least one) of the Borda scores, kept only if they are
/// consistently ranked low: the variance of their received ranks is below 1.5.
///
/// `received_rank_variance` is indexed like `scores`.
pub fn detect_marginalized(scores: &[u64], received_rank_variance: &[f64]) -> Vec<usize> {
    let n = scores.len();
    if n == 0 {
        return Vec::new();
    }
    let count = ((n as f64 * MARGINALIZED_FRACTION).floor() as usize).max(1);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&p| scores[p]);
    order
        .into_iter()
        .take(count)
        .filter(|&p| received_rank_variance.get(p).cloned().unwrap_or(0.0) < MARGINALIZED_MAX_VARIANCE)
        .collect()
}

/// Shannon entropy (bits) of the distribution proportional to `values`.
///
/// Zero bins are skipped; a zero total gives 0.
pub fn compute_entropy(values: &[f64]) -> f64 {
    let total: f64 = values.iter().filter(|x| **x > 0.0).sum();
    if total <= 0.0 {
        return 0.0;
    }
    values
        .iter()
        .filter(|x| **x > 0.0)
        .map(|x| {
            let p = x / total;
            -p * p.log2()
        })
        .sum()
}

/// Entropy of the histogram of ranks (1..n-1) received by each participant.
///
/// 0 means everyone agrees on where that person stands.
pub fn compute_individual_entropy(table: &RankTable) -> Vec<f64> {
    let n = table.num_participants();
    (0..n)
        .map(|p| {
            let mut histogram = vec![0.0f64; n.max(1)];
            for r in table.received_ranks(p) {
                if r >= 1 && r <= histogram.len() {
                    histogram[r - 1] += 1.0;
                }
            }
            compute_entropy(&histogram)
        })
        .collect()
}

/// Number of bins used to discretize ranks: `clamp(n - 1, 2, 5)`.
pub fn mutual_information_bins(n: usize) -> usize {
    n.saturating_sub(1).clamp(MIN_BINS, MAX_BINS)
}

// Maps a rank in 1..=positions to one of `bins` equal-width bins.
fn rank_bin(rank: usize, positions: usize, bins: usize) -> usize {
    if positions == 0 {
        return 0;
    }
    (((rank - 1) * bins) / positions).min(bins - 1)
}

/// Pairwise mutual information (bits) between the ballots of two voters.
///
/// Ranks are discretized into `clamp(n-1, 2, 5)` bins and the joint
/// histogram is taken over the participants both voters ranked. The
/// diagonal holds `log2(bins)` for participants with a ballot. Pairs
/// without a ballot or without common targets get 0.
pub fn compute_mutual_information_matrix(table: &RankTable) -> Vec<Vec<f64>> {
    let n = table.num_participants();
    let bins = mutual_information_bins(n);
    let positions = n.saturating_sub(1);
    let mut mi = vec![vec![0.0f64; n]; n];

    for a in 0..n {
        if !table.has_ballot(a) {
            continue;
        }
        mi[a][a] = (bins as f64).log2();
        for b in (a + 1)..n {
            if !table.has_ballot(b) {
                continue;
            }
            let mut joint = vec![vec![0.0f64; bins]; bins];
            let mut total = 0.0;
            for t in 0..n {
                if let (Some(ra), Some(rb)) = (table.rank_given(a, t), table.rank_given(b, t)) {
                    joint[rank_bin(ra, positions, bins)][rank_bin(rb, positions, bins)] += 1.0;
                    total += 1.0;
                }
            }
            if total == 0.0 {
                continue;
            }
            let px: Vec<f64> = joint.iter().map(|row| row.iter().sum::<f64>() / total).collect();
            let py: Vec<f64> = (0..bins)
                .map(|y| joint.iter().map(|row| row[y]).sum::<f64>() / total)
                .collect();
            let mut value = 0.0;
            for x in 0..bins {
                for y in 0..bins {
                    let pxy = joint[x][y] / total;
                    if pxy > 0.0 && px[x] > 0.0 && py[y] > 0.0 {
                        value += pxy * (pxy / (px[x] * py[y])).log2();
                    }
                }
            }
            debug!("compute_mutual_information_matrix: ({}, {}) -> {}", a, b, value);
            mi[a][b] = value;
            mi[b][a] = value;
        }
    }
    mi
}
