//! Counterfactuals and composite scores.

use log::debug;
use std::collections::{BTreeMap, VecDeque};

use crate::config::{Ballot, Participant, TopNodeRemoval};
use crate::pairwise::{compute_borda_scores, PairwiseMatrix, RankTable};

// Floor for the standard deviation when z-scoring constant signals.
const MIN_STD: f64 = 1e-9;

/// Removes the highest Borda scorer (first one on ties) and everything
/// referring to them, including their own ballot, then reports the change
/// of Borda score of every remaining participant.
///
/// Returns `None` when there is nobody to remove, or when `scores` is not
/// indexed like `participants`.
pub fn simulate_top_node_removal(
    participants: &[Participant],
    ballots: &[Ballot],
    scores: &[u64],
) -> Option<TopNodeRemoval> {
    if scores.len() != participants.len() {
        debug!(
            "simulate_top_node_removal: {} scores for {} participants",
            scores.len(),
            participants.len()
        );
        return None;
    }
    let top = scores
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, u64)>, (idx, s)| match best {
            Some((_, b)) if b >= *s => best,
            _ => Some((idx, *s)),
        })
        .map(|(idx, _)| idx)?;
    let removed = participants.get(top)?;

    let remaining: Vec<Participant> = participants
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != top)
        .map(|(_, p)| p.clone())
        .collect();
    let reduced_ballots: Vec<Ballot> = ballots
        .iter()
        .filter(|b| b.voter_id != removed.id)
        .map(|b| Ballot {
            voter_id: b.voter_id.clone(),
            ranking: b
                .ranking
                .iter()
                .filter(|id| **id != removed.id)
                .cloned()
                .collect(),
        })
        .collect();
    let new_scores = compute_borda_scores(&remaining, &reduced_ballots);

    let mut deltas: BTreeMap<String, i64> = BTreeMap::new();
    for (idx, p) in participants.iter().enumerate() {
        if idx == top {
            continue;
        }
        let new_idx = if idx < top { idx } else { idx - 1 };
        let new_score = new_scores.get(new_idx).cloned().unwrap_or(0);
        let delta = new_score as i64 - scores[idx] as i64;
        deltas.insert(p.id.clone(), delta);
    }
    debug!(
        "simulate_top_node_removal: removed {:?}, deltas {:?}",
        removed.id, deltas
    );
    Some(TopNodeRemoval {
        removed_id: removed.id.clone(),
        deltas,
    })
}

/// Population z-scores, with the standard deviation floored away from zero.
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n).sqrt();
    let std = std.max(MIN_STD);
    values.iter().map(|x| (x - mean) / std).collect()
}

/// Mean of the z-scored Borda, betweenness and in-degree signals.
pub fn compute_leadership_score(borda: &[u64], betweenness: &[f64], in_degree: &[f64]) -> Vec<f64> {
    let borda: Vec<f64> = borda.iter().map(|x| *x as f64).collect();
    let zb = z_scores(&borda);
    let zc = z_scores(betweenness);
    let zi = z_scores(in_degree);
    (0..zb.len())
        .map(|p| {
            let c = zc.get(p).cloned().unwrap_or(0.0);
            let i = zi.get(p).cloned().unwrap_or(0.0);
            (zb[p] + c + i) / 3.0
        })
        .collect()
}

/// Average normalized preference `1 - (rank - 1)/(n - 1)` among the members
/// of each community, indexed by community label.
///
/// Singletons score 1. Larger communities without any intra-community rank
/// score 0.
pub fn compute_subgroup_cohesion(table: &RankTable, communities: &[usize]) -> Vec<f64> {
    let n = table.num_participants();
    let count = communities.iter().max().map(|m| m + 1).unwrap_or(0);
    let positions = n.saturating_sub(1).max(1) as f64;
    (0..count)
        .map(|c| {
            let members: Vec<usize> = (0..communities.len())
                .filter(|&p| communities[p] == c)
                .collect();
            if members.len() < 2 {
                return 1.0;
            }
            let values: Vec<f64> = members
                .iter()
                .flat_map(|&i| members.iter().map(move |&j| (i, j)))
                .filter(|(i, j)| i != j)
                .filter_map(|(i, j)| table.rank_given(i, j))
                .map(|r| 1.0 - (r as f64 - 1.0) / positions)
                .collect();
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        })
        .collect()
}

// Number of nodes reached from `start`, treating majority edges as undirected
// and skipping `removed`.
fn reachable_without(matrix: &PairwiseMatrix, removed: usize, start: usize) -> usize {
    let n = matrix.size();
    let mut seen = vec![false; n];
    seen[start] = true;
    let mut queue: VecDeque<usize> = VecDeque::new();
    queue.push_back(start);
    let mut reached = 0;
    while let Some(v) = queue.pop_front() {
        reached += 1;
        for w in 0..n {
            if w != removed && !seen[w] && matrix.adjacent(v, w) {
                seen[w] = true;
                queue.push_back(w);
            }
        }
    }
    reached
}

/// Mean, over every single-participant removal, of the fraction of the
/// remaining group unreachable from the first survivor in the majority
/// graph, relative to `n - 1`.
pub fn compute_structural_fragility(matrix: &PairwiseMatrix) -> f64 {
    let n = matrix.size();
    if n < 2 {
        return 0.0;
    }
    let losses: Vec<f64> = (0..n)
        .map(|removed| {
            let start = if removed == 0 { 1 } else { 0 };
            let reached = reachable_without(matrix, removed, start);
            let unreachable = (n - 1).saturating_sub(reached);
            unreachable as f64 / (n - 1) as f64
        })
        .collect();
    losses.iter().sum::<f64>() / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairwise::build_pairwise_matrix;
    use crate::test_fixtures::*;

    #[test]
    fn removing_the_apex() {
        let (ps, bs) = identical_four();
        let scores = compute_borda_scores(&ps, &bs);
        let removal = simulate_top_node_removal(&ps, &bs, &scores).unwrap();
        assert_eq!(removal.removed_id, "P1");
        assert_eq!(removal.deltas.len(), 3);
        // Three participants left: P2 gets 2 + 2, P3 gets 2 + 1, P4 gets 1 + 1.
        assert_eq!(removal.deltas["P2"], 4 - 7);
        assert_eq!(removal.deltas["P3"], 3 - 5);
        assert_eq!(removal.deltas["P4"], 2 - 3);
        assert!(simulate_top_node_removal(&[], &[], &[]).is_none());
    }

    #[test]
    fn removal_needs_one_score_per_participant() {
        let (ps, bs) = identical_four();
        assert!(simulate_top_node_removal(&ps, &bs, &[9, 7]).is_none());
        assert!(simulate_top_node_removal(&ps[..2], &bs, &[9, 7, 5, 3]).is_none());
    }

    #[test]
    fn removal_picks_first_on_ties() {
        let (ps, bs) = rock_paper_scissors();
        let scores = compute_borda_scores(&ps, &bs);
        assert_eq!(scores, vec![3, 3, 3]);
        let removal = simulate_top_node_removal(&ps, &bs, &scores).unwrap();
        assert_eq!(removal.removed_id, "A");
        // B:[C] -> C gets 1, C:[B] -> B gets 1.
        assert_eq!(removal.deltas["B"], 1 - 3);
        assert_eq!(removal.deltas["C"], 1 - 3);
    }

    #[test]
    fn z_scores_of_constant_values() {
        assert_eq!(z_scores(&[2.0, 2.0, 2.0]), vec![0.0, 0.0, 0.0]);
        let z = z_scores(&[1.0, 3.0]);
        assert!((z[0] + 1.0).abs() < 1e-12);
        assert!((z[1] - 1.0).abs() < 1e-12);
        assert!(z_scores(&[]).is_empty());
    }

    #[test]
    fn leadership_follows_consensus() {
        let l = compute_leadership_score(&[9, 7, 5, 3], &[0.0; 4], &[1.0, 0.7, 0.5, 0.3]);
        assert!(l[0] > l[1] && l[1] > l[2] && l[2] > l[3]);
        assert!(l.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn cohesion_per_community() {
        let (ps, bs) = identical_four();
        let table = RankTable::new(&ps, &bs);
        let c = compute_subgroup_cohesion(&table, &[0, 0, 1, 2]);
        // P1 -> P2 rank 1, P2 -> P1 rank 1.
        assert_eq!(c, vec![1.0, 1.0, 1.0]);
        let all = compute_subgroup_cohesion(&table, &[0, 0, 0, 0]);
        assert_eq!(all.len(), 1);
        // Every ballot contributes 1 + 2/3 + 1/3 over its 3 entries.
        assert!((all[0] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn cohesion_without_data() {
        let ps = participants(&["a", "b"]);
        let table = RankTable::new(&ps, &[]);
        assert_eq!(compute_subgroup_cohesion(&table, &[0, 0]), vec![0.0]);
        assert!(compute_subgroup_cohesion(&table, &[]).is_empty());
    }

    #[test]
    fn fragility_of_connected_and_empty_graphs() {
        let (ps, bs) = identical_four();
        let m = build_pairwise_matrix(&ps, &bs);
        assert_eq!(compute_structural_fragility(&m), 0.0);

        let empty = build_pairwise_matrix(&ps, &[]);
        // Without edges, each removal leaves 2 of 3 survivors unreachable.
        assert!((compute_structural_fragility(&empty) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(compute_structural_fragility(&build_pairwise_matrix(&ps[..1], &[])), 0.0);
    }

    #[test]
    fn fragility_of_a_chain_cut_vertex() {
        let ps = participants(&["a", "b", "c"]);
        // a > b and b > c only: b is the cut vertex.
        let bs = vec![Ballot::new("c", &["a", "b"]), Ballot::new("a", &["b", "c"])];
        let m = build_pairwise_matrix(&ps, &bs);
        assert!(m.beats(0, 1));
        assert!(m.beats(1, 2));
        assert!(!m.adjacent(0, 2));
        // Removing b strands one of two survivors: (0 + 1/2 + 0) / 3.
        assert!((compute_structural_fragility(&m) - 1.0 / 6.0).abs() < 1e-12);
    }
}
