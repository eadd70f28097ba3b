//! Network view of the group.
//!
//! Two graphs are derived from the ballots. The majority graph has an edge
//! i -> j when i beats j under strict majority (see
//! [`PairwiseMatrix::beats`]). The top-third graph links two participants
//! when one of them placed the other within the first `ceil((n-1)/3)`
//! positions of their ballot.
//!
//! All the algorithms run over participant positions, in insertion order.
//! The heuristics (community detection) are deterministic for a fixed order.

use log::debug;
use std::collections::VecDeque;

use crate::config::{Ballot, Participant};
use crate::pairwise::{triple_cycle, PairwiseMatrix, RankTable};

const MAX_COMMUNITY_PASSES: usize = 20;

/// Number of positions considered "top third" in a group of `n`.
pub fn top_third(n: usize) -> usize {
    if n < 2 {
        return 0;
    }
    (n - 1 + 2) / 3
}

/// `weights[i][j] = n - rank` when voter i ranked j, 0 otherwise.
///
/// Unlike the pairwise matrix, this is the preference strength of a single
/// voter, not a majority count.
pub fn build_weight_matrix(participants: &[Participant], ballots: &[Ballot]) -> Vec<Vec<u32>> {
    let table = RankTable::new(participants, ballots);
    weights_from_table(&table)
}

pub(crate) fn weights_from_table(table: &RankTable) -> Vec<Vec<u32>> {
    let n = table.num_participants();
    let mut weights = vec![vec![0u32; n]; n];
    for (i, row) in weights.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            if i == j {
                continue;
            }
            if let Some(r) = table.rank_given(i, j) {
                *cell = n.saturating_sub(r) as u32;
            }
        }
    }
    weights
}

/// Column sums of the weight matrix, scaled so that the most chosen
/// participant scores 1.0.
pub fn compute_in_degree_centrality(weights: &[Vec<u32>]) -> Vec<f64> {
    let n = weights.len();
    let sums: Vec<u64> = (0..n)
        .map(|j| weights.iter().map(|row| row[j] as u64).sum())
        .collect();
    let max = sums.iter().cloned().max().unwrap_or(0);
    if max == 0 {
        return vec![0.0; n];
    }
    sums.iter().map(|s| *s as f64 / max as f64).collect()
}

/// True when i and j both placed each other in their top third.
pub(crate) fn mutual_top_third(table: &RankTable, i: usize, j: usize) -> bool {
    let t = top_third(table.num_participants());
    matches!(
        (table.rank_given(i, j), table.rank_given(j, i)),
        (Some(a), Some(b)) if a <= t && b <= t
    )
}

/// True when at least one of i and j placed the other in their top third.
pub(crate) fn either_top_third(table: &RankTable, i: usize, j: usize) -> bool {
    let t = top_third(table.num_participants());
    let high = |r: Option<usize>| matches!(r, Some(x) if x <= t);
    high(table.rank_given(i, j)) || high(table.rank_given(j, i))
}

/// Fraction of all dyads in which both members rank each other in the top third.
pub fn compute_reciprocity_index(participants: &[Participant], ballots: &[Ballot]) -> f64 {
    let table = RankTable::new(participants, ballots);
    reciprocity_from_table(&table)
}

pub(crate) fn reciprocity_from_table(table: &RankTable) -> f64 {
    let n = table.num_participants();
    let dyads = n * n.saturating_sub(1) / 2;
    if dyads == 0 {
        return 0.0;
    }
    let mut reciprocal = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            if mutual_top_third(table, i, j) {
                reciprocal += 1;
            }
        }
    }
    reciprocal as f64 / dyads as f64
}

/// Fraction of the unordered triples forming a majority 3-cycle.
pub fn compute_cycle_density(matrix: &PairwiseMatrix) -> f64 {
    let n = matrix.size();
    if n < 3 {
        return 0.0;
    }
    let mut triads = 0usize;
    let mut cyclic = 0usize;
    for a in 0..n {
        for b in (a + 1)..n {
            for c in (b + 1)..n {
                triads += 1;
                if triple_cycle(matrix, a, b, c).is_some() {
                    cyclic += 1;
                }
            }
        }
    }
    cyclic as f64 / triads as f64
}

/// K-core shell index of every participant in the undirected top-third graph.
///
/// Classic peeling: for k = 1, 2, ... vertices whose remaining degree is
/// below k are stripped and get shell k - 1. Survivors of the last round get
/// shell n - 1.
pub fn compute_k_core_decomposition(participants: &[Participant], ballots: &[Ballot]) -> Vec<usize> {
    let table = RankTable::new(participants, ballots);
    k_core_from_table(&table)
}

pub(crate) fn k_core_from_table(table: &RankTable) -> Vec<usize> {
    let n = table.num_participants();
    let adjacency: Vec<Vec<bool>> = (0..n)
        .map(|i| (0..n).map(|j| i != j && either_top_third(table, i, j)).collect())
        .collect();

    let mut alive = vec![true; n];
    let mut shell = vec![0usize; n];
    for k in 1..n {
        loop {
            let degree = |v: usize, alive: &[bool]| {
                (0..n).filter(|&u| alive[u] && adjacency[v][u]).count()
            };
            let stripped: Vec<usize> = (0..n)
                .filter(|&v| alive[v] && degree(v, &alive) < k)
                .collect();
            if stripped.is_empty() {
                break;
            }
            for v in stripped {
                alive[v] = false;
                shell[v] = k - 1;
            }
        }
    }
    for v in 0..n {
        if alive[v] {
            shell[v] = n.saturating_sub(1);
        }
    }
    shell
}

/// Brandes' betweenness centrality over the directed, unweighted majority
/// graph, normalized by `(n - 1)(n - 2)`.
pub fn compute_betweenness_centrality(matrix: &PairwiseMatrix) -> Vec<f64> {
    let n = matrix.size();
    let mut cb = vec![0.0f64; n];
    if n < 3 {
        return cb;
    }
    let out: Vec<Vec<usize>> = (0..n)
        .map(|v| (0..n).filter(|&w| matrix.beats(v, w)).collect())
        .collect();

    for s in 0..n {
        let mut stack: Vec<usize> = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0f64; n];
        sigma[s] = 1.0;
        let mut dist: Vec<i64> = vec![-1; n];
        dist[s] = 0;

        let mut queue: VecDeque<usize> = VecDeque::new();
        queue.push_back(s);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in out[v].iter() {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0f64; n];
        while let Some(w) = stack.pop() {
            for &v in predecessors[w].iter() {
                if sigma[w] > 0.0 {
                    delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
                }
            }
            if w != s {
                cb[w] += delta[w];
            }
        }
    }

    let norm = ((n - 1) * (n - 2)) as f64;
    cb.iter().map(|x| x / norm).collect()
}

/// Greedy local-moving community detection (a simplified Louvain pass).
///
/// Edge weights are the symmetrized pairwise counts scaled by the ballot
/// count. Each participant, in order, moves to the neighboring community
/// (majority-graph adjacency) with the largest positive gain in attached
/// weight. Stops after a pass with no move or after 20 passes. Labels are
/// compacted to `0..k` in first-seen order.
pub fn detect_communities(matrix: &PairwiseMatrix) -> Vec<usize> {
    let n = matrix.size();
    let m = matrix.num_ballots();
    if n == 0 {
        return Vec::new();
    }
    let weight = |i: usize, j: usize| -> f64 {
        if m == 0 || i == j {
            0.0
        } else {
            (matrix.get(i, j) + matrix.get(j, i)) as f64 / (2.0 * m as f64)
        }
    };
    // Weight between node i and the members of community c, i excluded.
    let attached = |labels: &[usize], i: usize, c: usize| -> f64 {
        (0..n)
            .filter(|&j| j != i && labels[j] == c)
            .map(|j| weight(i, j))
            .sum()
    };

    let mut labels: Vec<usize> = (0..n).collect();
    for pass in 0..MAX_COMMUNITY_PASSES {
        let mut moved = false;
        for i in 0..n {
            let current = labels[i];
            let stay = attached(&labels, i, current);
            let mut best: Option<(usize, f64)> = None;
            for j in 0..n {
                if j == i || !matrix.adjacent(i, j) || labels[j] == current {
                    continue;
                }
                let target = labels[j];
                let gain = attached(&labels, i, target) - stay;
                let better = match best {
                    Some((_, g)) => gain > g,
                    None => true,
                };
                if gain > 0.0 && better {
                    best = Some((target, gain));
                }
            }
            if let Some((target, gain)) = best {
                debug!(
                    "detect_communities: pass {} moving {} from {} to {} (gain {})",
                    pass, i, current, target, gain
                );
                labels[i] = target;
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }
    compact_labels(&labels)
}

/// Renumbers labels to `0..k` in order of first appearance.
pub fn compact_labels(labels: &[usize]) -> Vec<usize> {
    let mut mapping: Vec<(usize, usize)> = Vec::new();
    labels
        .iter()
        .map(|l| match mapping.iter().find(|(old, _)| old == l) {
            Some((_, new)) => *new,
            None => {
                let new = mapping.len();
                mapping.push((*l, new));
                new
            }
        })
        .collect()
}

/// Number of distinct communities in a compacted labelling.
pub fn community_count(labels: &[usize]) -> usize {
    labels.iter().max().map(|m| m + 1).unwrap_or(0)
}
