//! Behavioral metrics: how individual voters relate to each other and to
//! the group consensus.

use log::debug;

use crate::graph::mutual_top_third;
use crate::inequality::variance;
use crate::pairwise::{PairwiseMatrix, RankTable};

const EIGENVECTOR_ITERATIONS: usize = 100;

/// `|rank(i -> j) - rank(j -> i)|` when i and j ranked each other, 0 otherwise.
pub fn compute_asymmetry_matrix(table: &RankTable) -> Vec<Vec<u32>> {
    let n = table.num_participants();
    let mut asymmetry = vec![vec![0u32; n]; n];
    for (i, row) in asymmetry.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            if i == j {
                continue;
            }
            if let (Some(given), Some(received)) = (table.rank_given(i, j), table.rank_given(j, i)) {
                *cell = given.abs_diff(received) as u32;
            }
        }
    }
    asymmetry
}

/// Variance of the ranks received by each participant.
pub fn compute_polarization_scores(table: &RankTable) -> Vec<f64> {
    (0..table.num_participants())
        .map(|p| {
            let ranks: Vec<f64> = table.received_ranks(p).iter().map(|r| *r as f64).collect();
            variance(&ranks)
        })
        .collect()
}

// Ordinal ranks (1-based) of the values, ascending. Values are distinct.
fn ordinal_ranks(values: &[usize]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by_key(|&idx| values[idx]);
    let mut ranks = vec![0.0; values.len()];
    for (position, idx) in order.into_iter().enumerate() {
        ranks[idx] = (position + 1) as f64;
    }
    ranks
}

/// Spearman correlation between each voter's ballot and the group ranking
/// (participants by decreasing Borda score).
///
/// Only the participants present in both are compared, re-ranked among
/// themselves. Voters without a ballot, or with fewer than two comparable
/// entries, get 0.
pub fn compute_spearman_conformity(table: &RankTable, group_ranking: &[usize]) -> Vec<f64> {
    let n = table.num_participants();
    let mut reference = vec![None; n];
    for (position, p) in group_ranking.iter().enumerate() {
        if *p < n {
            reference[*p] = Some(position + 1);
        }
    }

    (0..n)
        .map(|voter| {
            let mut own: Vec<usize> = Vec::new();
            let mut group: Vec<usize> = Vec::new();
            for (t, reference_rank) in reference.iter().enumerate() {
                if let (Some(r), Some(g)) = (table.rank_given(voter, t), reference_rank) {
                    own.push(r);
                    group.push(*g);
                }
            }
            let k = own.len();
            if k < 2 {
                return 0.0;
            }
            let own_ranks = ordinal_ranks(&own);
            let group_ranks = ordinal_ranks(&group);
            let d2: f64 = own_ranks
                .iter()
                .zip(group_ranks.iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            let kf = k as f64;
            1.0 - 6.0 * d2 / (kf * (kf * kf - 1.0))
        })
        .collect()
}

/// Average over mutual voters of `rank received - rank given`, i.e. Borda
/// points given minus points received.
///
/// Positive values mark a generous giver, negative values a net receiver of
/// favor. Participants without any mutual voter get 0.
pub fn compute_reciprocity_imbalance(table: &RankTable) -> Vec<f64> {
    let n = table.num_participants();
    (0..n)
        .map(|i| {
            let diffs: Vec<f64> = (0..n)
                .filter(|&j| j != i)
                .filter_map(|j| match (table.rank_given(i, j), table.rank_given(j, i)) {
                    (Some(given), Some(received)) => Some(received as f64 - given as f64),
                    _ => None,
                })
                .collect();
            if diffs.is_empty() {
                0.0
            } else {
                diffs.iter().sum::<f64>() / diffs.len() as f64
            }
        })
        .collect()
}

/// For each participant, the number of asymmetry entries above `ceil(n/3)`.
pub fn compute_loss_aversion_proxy(asymmetry: &[Vec<u32>]) -> Vec<usize> {
    let n = asymmetry.len();
    let threshold = ((n + 2) / 3) as u32;
    asymmetry
        .iter()
        .map(|row| row.iter().filter(|a| **a > threshold).count())
        .collect()
}

/// Eigenvector centrality by power iteration on the pairwise matrix scaled
/// by its largest entry.
///
/// Runs a fixed 100 iterations over the in-edges (`W[j][i] * ev[j]`), with L2
/// renormalization. The absolute value is returned.
pub fn compute_eigenvector_centrality(matrix: &PairwiseMatrix) -> Vec<f64> {
    let n = matrix.size();
    let max = matrix.max_count();
    if n == 0 || max == 0 {
        return vec![0.0; n];
    }
    let scale = max as f64;
    let mut ev = vec![1.0 / (n as f64).sqrt(); n];
    for iteration in 0..EIGENVECTOR_ITERATIONS {
        let next: Vec<f64> = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| matrix.get(j, i) as f64 / scale * ev[j])
                    .sum::<f64>()
            })
            .collect();
        let norm = next.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm == 0.0 {
            debug!(
                "compute_eigenvector_centrality: vector vanished at iteration {}",
                iteration
            );
            return vec![0.0; n];
        }
        ev = next.iter().map(|x| x / norm).collect();
    }
    ev.iter().map(|x| x.abs()).collect()
}

/// Greedy clique cover of the reciprocal top-third graph.
///
/// Starting from each participant not yet covered, in order, neighbors are
/// added when they are linked to every current member. Only cliques of two
/// or more are reported.
pub fn detect_coalitions(table: &RankTable) -> Vec<Vec<usize>> {
    let n = table.num_participants();
    let adjacency: Vec<Vec<bool>> = (0..n)
        .map(|i| (0..n).map(|j| i != j && mutual_top_third(table, i, j)).collect())
        .collect();

    let mut visited = vec![false; n];
    let mut coalitions: Vec<Vec<usize>> = Vec::new();
    for start in 0..n {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut clique = vec![start];
        for candidate in 0..n {
            if visited[candidate] || !adjacency[start][candidate] {
                continue;
            }
            if clique.iter().all(|&member| adjacency[member][candidate]) {
                clique.push(candidate);
            }
        }
        if clique.len() >= 2 {
            for member in clique.iter() {
                visited[*member] = true;
            }
            coalitions.push(clique);
        }
    }
    coalitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Ballot;
    use crate::pairwise::{borda_from_table, borda_ranking, build_pairwise_matrix};
    use crate::test_fixtures::*;

    fn four_with_pairs() -> RankTable {
        let ps = participants(&["a", "b", "c", "d"]);
        let bs = vec![
            Ballot::new("a", &["b", "c", "d"]),
            Ballot::new("b", &["a", "d", "c"]),
            Ballot::new("c", &["d", "b", "a"]),
            Ballot::new("d", &["c", "a", "b"]),
        ];
        RankTable::new(&ps, &bs)
    }

    #[test]
    fn asymmetry_and_loss_aversion() {
        let (ps, bs) = identical_four();
        let table = RankTable::new(&ps, &bs);
        let a = compute_asymmetry_matrix(&table);
        // P1 ranks P4 third, P4 ranks P1 first.
        assert_eq!(a[0][3], 2);
        assert_eq!(a[3][0], 2);
        assert_eq!(a[0][1], 0);
        assert_eq!(a[2][2], 0);
        // ceil(4 / 3) = 2: nothing strictly above.
        assert_eq!(compute_loss_aversion_proxy(&a), vec![0, 0, 0, 0]);
        assert_eq!(compute_loss_aversion_proxy(&[vec![0, 3], vec![3, 0]]), vec![1, 1]);
    }

    #[test]
    fn asymmetry_is_zero_without_both_ballots() {
        let ps = participants(&["a", "b"]);
        let table = RankTable::new(&ps, &[Ballot::new("a", &["b"])]);
        assert_eq!(compute_asymmetry_matrix(&table), vec![vec![0, 0], vec![0, 0]]);
    }

    #[test]
    fn polarization_is_rank_variance() {
        let (ps, bs) = identical_four();
        let table = RankTable::new(&ps, &bs);
        let p = compute_polarization_scores(&table);
        assert_eq!(p[0], 0.0);
        // P2 receives 1, 2, 2.
        assert!((p[1] - 2.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn conformity_of_consensus_ballots() {
        let (ps, bs) = identical_four();
        let table = RankTable::new(&ps, &bs);
        let ranking = borda_ranking(&borda_from_table(&table));
        let c = compute_spearman_conformity(&table, &ranking);
        for x in c {
            assert!((x - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn conformity_of_a_contrarian() {
        let ps = participants(&["a", "b", "c", "d"]);
        let bs = vec![
            Ballot::new("a", &["b", "c", "d"]),
            Ballot::new("b", &["a", "c", "d"]),
            Ballot::new("c", &["a", "b", "d"]),
            Ballot::new("d", &["c", "b", "a"]),
        ];
        let table = RankTable::new(&ps, &bs);
        let ranking = borda_ranking(&borda_from_table(&table));
        assert_eq!(ranking, vec![0, 1, 2, 3]);
        let c = compute_spearman_conformity(&table, &ranking);
        assert!((c[3] + 1.0).abs() < 1e-12);
        assert!((c[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn conformity_needs_two_entries() {
        let ps = participants(&["a", "b", "c"]);
        let table = RankTable::new(&ps, &[Ballot::new("a", &["b"])]);
        assert_eq!(compute_spearman_conformity(&table, &[1, 2, 0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn reciprocity_imbalance_sign() {
        let (ps, bs) = identical_four();
        let table = RankTable::new(&ps, &bs);
        let r = compute_reciprocity_imbalance(&table);
        // P4 gives better ranks than it receives.
        assert!(r[3] > 0.0);
        assert!(r[0] < 0.0);
        let total: f64 = r.iter().sum();
        assert!(total.abs() < 1e-12);
    }

    #[test]
    fn eigenvector_is_unit_and_non_negative() {
        let (ps, bs) = rock_paper_scissors();
        let m = build_pairwise_matrix(&ps, &bs);
        let ev = compute_eigenvector_centrality(&m);
        assert!(ev.iter().all(|x| *x >= 0.0));
        let norm: f64 = ev.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
        // Symmetric cycle: everybody is equivalent.
        assert!((ev[0] - ev[1]).abs() < 1e-9);

        let ps = participants(&["a", "b"]);
        let m = build_pairwise_matrix(&ps, &[]);
        assert_eq!(compute_eigenvector_centrality(&m), vec![0.0, 0.0]);
    }

    #[test]
    fn coalitions_are_reciprocal_pairs() {
        let table = four_with_pairs();
        assert_eq!(detect_coalitions(&table), vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn coalition_clique_growth() {
        let ps = participants(&["a", "b", "c", "d", "e", "f", "g"]);
        // Top third of 6 positions: 2. a, b, c all put each other first.
        let bs = vec![
            Ballot::new("a", &["b", "c", "d", "e", "f", "g"]),
            Ballot::new("b", &["c", "a", "d", "e", "f", "g"]),
            Ballot::new("c", &["a", "b", "d", "e", "f", "g"]),
            Ballot::new("d", &["a", "b", "c", "e", "f", "g"]),
        ];
        let table = RankTable::new(&ps, &bs);
        assert_eq!(detect_coalitions(&table), vec![vec![0, 1, 2]]);
    }
}
