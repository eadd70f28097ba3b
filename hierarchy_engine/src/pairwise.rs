//! Pairwise comparisons and the classic social-choice primitives built on
//! them: Borda count, Condorcet winner, Condorcet 3-cycles and Kendall's W.

use log::{debug, warn};
use std::collections::HashMap;

use crate::config::{Ballot, Participant};

/// Returns the 1-based position of `target_id` in the ballot, or `None` if
/// the ballot does not rank it.
///
/// Every function reading a ballot goes through this accessor.
pub fn get_rank(ballot: &Ballot, target_id: &str) -> Option<usize> {
    ballot
        .ranking
        .iter()
        .position(|id| id == target_id)
        .map(|idx| idx + 1)
}

/// The ballots, resolved against the positions of the participants.
///
/// Ids that are not participants are ignored. The table is built once and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RankTable {
    num_participants: usize,
    // ranks[b][p]: rank of participant p in ballot b
    ranks: Vec<Vec<Option<usize>>>,
    // The position of the voter of each ballot, if the voter is a participant.
    voters: Vec<Option<usize>>,
    // For each participant, the index of their ballot (first one wins).
    ballot_of: Vec<Option<usize>>,
}

impl RankTable {
    pub fn new(participants: &[Participant], ballots: &[Ballot]) -> RankTable {
        let n = participants.len();
        let positions: HashMap<&str, usize> = participants
            .iter()
            .enumerate()
            .map(|(idx, p)| (p.id.as_str(), idx))
            .collect();

        let mut ranks: Vec<Vec<Option<usize>>> = Vec::with_capacity(ballots.len());
        let mut voters: Vec<Option<usize>> = Vec::with_capacity(ballots.len());
        let mut ballot_of: Vec<Option<usize>> = vec![None; n];
        for (bidx, ballot) in ballots.iter().enumerate() {
            ranks.push(
                participants
                    .iter()
                    .map(|p| get_rank(ballot, p.id.as_str()))
                    .collect(),
            );
            let voter = positions.get(ballot.voter_id.as_str()).cloned();
            match voter {
                Some(v) if ballot_of[v].is_none() => ballot_of[v] = Some(bidx),
                Some(_) => debug!(
                    "RankTable: second ballot from {:?} is ignored for per-voter metrics",
                    ballot.voter_id
                ),
                None => warn!("RankTable: ballot from unknown voter {:?}", ballot.voter_id),
            }
            voters.push(voter);
        }
        RankTable {
            num_participants: n,
            ranks,
            voters,
            ballot_of,
        }
    }

    pub fn num_participants(&self) -> usize {
        self.num_participants
    }

    pub fn num_ballots(&self) -> usize {
        self.ranks.len()
    }

    /// The rank of participant `p` in ballot number `ballot`.
    pub fn rank(&self, ballot: usize, p: usize) -> Option<usize> {
        self.ranks.get(ballot).and_then(|row| row.get(p).cloned().flatten())
    }

    /// The rank that `voter` gave to `target`, if `voter` submitted a ballot
    /// ranking `target`.
    pub fn rank_given(&self, voter: usize, target: usize) -> Option<usize> {
        self.ballot_of
            .get(voter)
            .cloned()
            .flatten()
            .and_then(|b| self.rank(b, target))
    }

    /// The position of the voter of ballot number `ballot`.
    pub fn voter(&self, ballot: usize) -> Option<usize> {
        self.voters.get(ballot).cloned().flatten()
    }

    pub fn has_ballot(&self, p: usize) -> bool {
        matches!(self.ballot_of.get(p), Some(Some(_)))
    }

    /// All the ranks received by participant `p`, in ballot order.
    pub fn received_ranks(&self, p: usize) -> Vec<usize> {
        self.ranks.iter().filter_map(|row| row[p]).collect()
    }

    /// Total number of (ballot, participant) ranks recorded.
    pub fn num_ranks(&self) -> usize {
        self.ranks
            .iter()
            .map(|row| row.iter().filter(|r| r.is_some()).count())
            .sum()
    }
}

/// `counts[i][j]`: number of ballots ranking participant i above participant j.
///
/// A ballot that misses one of the two ids contributes to neither cell.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PairwiseMatrix {
    counts: Vec<Vec<u32>>,
    num_ballots: usize,
}

impl PairwiseMatrix {
    pub fn size(&self) -> usize {
        self.counts.len()
    }

    pub fn num_ballots(&self) -> usize {
        self.num_ballots
    }

    pub fn get(&self, i: usize, j: usize) -> u32 {
        self.counts[i][j]
    }

    pub fn counts(&self) -> &[Vec<u32>] {
        &self.counts
    }

    pub fn max_count(&self) -> u32 {
        self.counts
            .iter()
            .flat_map(|row| row.iter().cloned())
            .max()
            .unwrap_or(0)
    }

    /// Strict majority of i over j, among the ballots that rank both.
    ///
    /// Ballots never rank their own voter, so the denominator is the number
    /// of ballots comparing the pair and not the total ballot count. Ties are
    /// not wins.
    pub fn beats(&self, i: usize, j: usize) -> bool {
        if i == j {
            return false;
        }
        let for_i = self.counts[i][j];
        let for_j = self.counts[j][i];
        2 * for_i > for_i + for_j
    }

    /// Majority edge in either direction.
    pub fn adjacent(&self, i: usize, j: usize) -> bool {
        self.beats(i, j) || self.beats(j, i)
    }
}

pub fn build_pairwise_matrix(participants: &[Participant], ballots: &[Ballot]) -> PairwiseMatrix {
    let table = RankTable::new(participants, ballots);
    pairwise_from_table(&table)
}

pub(crate) fn pairwise_from_table(table: &RankTable) -> PairwiseMatrix {
    let n = table.num_participants();
    let mut counts = vec![vec![0u32; n]; n];
    for b in 0..table.num_ballots() {
        for (i, row) in counts.iter_mut().enumerate() {
            let ri = match table.rank(b, i) {
                Some(r) => r,
                None => continue,
            };
            for (j, cell) in row.iter_mut().enumerate() {
                if let Some(rj) = table.rank(b, j) {
                    if ri < rj {
                        *cell += 1;
                    }
                }
            }
        }
    }
    PairwiseMatrix {
        counts,
        num_ballots: table.num_ballots(),
    }
}

/// Borda count: a participant ranked `r` in a ballot earns `n - r` points,
/// where `n` is the size of the group.
///
/// The result is indexed by participant position.
pub fn compute_borda_scores(participants: &[Participant], ballots: &[Ballot]) -> Vec<u64> {
    let table = RankTable::new(participants, ballots);
    borda_from_table(&table)
}

pub(crate) fn borda_from_table(table: &RankTable) -> Vec<u64> {
    let n = table.num_participants();
    let mut scores = vec![0u64; n];
    for (p, score) in scores.iter_mut().enumerate() {
        *score = table
            .received_ranks(p)
            .iter()
            .map(|r| n.saturating_sub(*r) as u64)
            .sum();
    }
    scores
}

/// Participant positions sorted by decreasing score. Ties keep insertion order.
pub fn borda_ranking(scores: &[u64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|a, b| scores[*b].cmp(&scores[*a]));
    order
}

/// The participant beating every other one under strict majority, if any.
///
/// No winner is the expected outcome under cyclic preferences.
pub fn detect_condorcet_winner(matrix: &PairwiseMatrix) -> Option<usize> {
    let n = matrix.size();
    if matrix.num_ballots() == 0 || n < 2 {
        return None;
    }
    (0..n).find(|&i| (0..n).filter(|&j| j != i).all(|j| matrix.beats(i, j)))
}

/// All majority 3-cycles `a > b > c > a`.
///
/// Each unordered triple contributes at most one cycle, reported starting
/// from its lowest position. Longer cycles are not searched for.
pub fn find_condorcet_cycles(matrix: &PairwiseMatrix) -> Vec<[usize; 3]> {
    let n = matrix.size();
    let mut cycles: Vec<[usize; 3]> = Vec::new();
    for a in 0..n {
        for b in (a + 1)..n {
            for c in (b + 1)..n {
                if let Some(cycle) = triple_cycle(matrix, a, b, c) {
                    cycles.push(cycle);
                }
            }
        }
    }
    debug!("find_condorcet_cycles: {} cycles", cycles.len());
    cycles
}

pub(crate) fn triple_cycle(
    matrix: &PairwiseMatrix,
    a: usize,
    b: usize,
    c: usize,
) -> Option<[usize; 3]> {
    if matrix.beats(a, b) && matrix.beats(b, c) && matrix.beats(c, a) {
        Some([a, b, c])
    } else if matrix.beats(a, c) && matrix.beats(c, b) && matrix.beats(b, a) {
        Some([a, c, b])
    } else {
        None
    }
}

/// Kendall's coefficient of concordance.
///
/// `S` is the sum of squared deviations of the received-rank sums from their
/// mean. Voters never rank themselves, so the textbook maximum of `S` is out
/// of reach: `S` is instead divided by its value for the same ballots, had
/// every voter followed one common order (ascending rank sums) with their
/// own slot removed. Identical ballots give exactly 1, any disagreement
/// lowers the value. The result is clamped to [0, 1].
pub fn compute_kendall_w(participants: &[Participant], ballots: &[Ballot]) -> f64 {
    let table = RankTable::new(participants, ballots);
    kendall_w_from_table(&table)
}

pub(crate) fn kendall_w_from_table(table: &RankTable) -> f64 {
    concordance_ratio(table).clamp(0.0, 1.0)
}

fn squared_deviations(sums: &[f64]) -> f64 {
    if sums.is_empty() {
        return 0.0;
    }
    let mean = sums.iter().sum::<f64>() / sums.len() as f64;
    sums.iter().map(|x| (x - mean) * (x - mean)).sum()
}

// Unclamped W.
pub(crate) fn concordance_ratio(table: &RankTable) -> f64 {
    let n = table.num_participants();
    let m = table.num_ballots();
    if m < 2 || n < 2 {
        return 0.0;
    }

    let sums: Vec<f64> = (0..n)
        .map(|p| table.received_ranks(p).iter().sum::<usize>() as f64)
        .collect();
    let s = squared_deviations(&sums);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|a, b| sums[*a].total_cmp(&sums[*b]).then(a.cmp(b)));
    // Each ballot keeps its length and its voter.
    let mut agreed = vec![0.0f64; n];
    for b in 0..m {
        let length = (0..n).filter(|&p| table.rank(b, p).is_some()).count();
        let voter = table.voter(b);
        for (idx, p) in order
            .iter()
            .filter(|&&p| Some(p) != voter)
            .take(length)
            .enumerate()
        {
            agreed[*p] += (idx + 1) as f64;
        }
    }
    let s_agreed = squared_deviations(&agreed);
    if s_agreed <= 0.0 {
        return 0.0;
    }
    let w = s / s_agreed;
    debug!(
        "compute_kendall_w: S={} S_agreed={} w={}",
        s, s_agreed, w
    );
    w
}
