mod config;

pub mod behavior;
pub mod builder;
pub mod cache;
pub mod graph;
pub mod inequality;
pub mod manual;
pub mod pairwise;
pub mod perturbation;

use log::{debug, info};
use std::collections::BTreeMap;

pub use crate::cache::AnalyticsCache;
pub use crate::config::*;
pub use crate::pairwise::{get_rank, PairwiseMatrix, RankTable};

use crate::behavior::*;
use crate::graph::*;
use crate::inequality::*;
use crate::pairwise::*;
use crate::perturbation::*;

/// Computes every metric for a group and its ballots.
///
/// Returns `None` when there is nothing to analyze: fewer than two
/// participants or no ballot at all. The result is a pure function of the
/// inputs, and of the order of the participants for the order-dependent
/// heuristics (communities, coalitions, ties).
///
/// The inputs are trusted: use [`builder::Builder`] to validate them. Ids
/// that do not match a participant are ignored.
pub fn compute_analytics(participants: &[Participant], ballots: &[Ballot]) -> Option<AnalyticsResult> {
    let n = participants.len();
    if n < 2 || ballots.is_empty() {
        info!(
            "compute_analytics: nothing to analyze ({} participants, {} ballots)",
            n,
            ballots.len()
        );
        return None;
    }
    info!(
        "compute_analytics: processing {} participants, {} ballots",
        n,
        ballots.len()
    );

    let table = RankTable::new(participants, ballots);
    let matrix = pairwise_from_table(&table);

    // Social choice
    let borda = borda_from_table(&table);
    let ranking = borda_ranking(&borda);
    let condorcet_winner = detect_condorcet_winner(&matrix);
    let cycles = find_condorcet_cycles(&matrix);
    let kendall_w = kendall_w_from_table(&table);
    debug!(
        "compute_analytics: borda {:?}, winner {:?}, {} cycles, W={}",
        borda,
        condorcet_winner,
        cycles.len(),
        kendall_w
    );

    // Graph
    let weights = weights_from_table(&table);
    let in_degree = compute_in_degree_centrality(&weights);
    let reciprocity_index = reciprocity_from_table(&table);
    let cycle_density = compute_cycle_density(&matrix);
    let k_core = k_core_from_table(&table);
    let betweenness = compute_betweenness_centrality(&matrix);
    let communities = detect_communities(&matrix);
    let num_communities = community_count(&communities);

    // Inequality and information
    let borda_values: Vec<f64> = borda.iter().map(|x| *x as f64).collect();
    let gini = compute_gini(&borda_values);
    let stratification = determine_stratification_label(cycle_density, gini, num_communities, n);
    let polarization = compute_polarization_scores(&table);
    let marginalized = detect_marginalized(&borda, &polarization);
    debug!(
        "compute_analytics: gini {}, {} communities, {}",
        gini, num_communities, stratification
    );

    // Behavioral
    let asymmetry = compute_asymmetry_matrix(&table);
    let loss_aversion = compute_loss_aversion_proxy(&asymmetry);

    let result = AnalyticsResult {
        participant_ids: participants.iter().map(|p| p.id.clone()).collect(),
        num_ballots: ballots.len(),
        pairwise_matrix: matrix.counts().to_vec(),
        borda_scores: by_id(participants, &borda),
        borda_ranking: ids_of(participants, &ranking),
        condorcet_winner: condorcet_winner.map(|p| participants[p].id.clone()),
        is_tournament_acyclic: cycles.is_empty(),
        condorcet_cycles: cycles
            .iter()
            .map(|c| (*c).map(|p| participants[p].id.clone()))
            .collect(),
        kendall_w,
        weight_matrix: weights,
        in_degree_centrality: by_id(participants, &in_degree),
        reciprocity_index,
        cycle_density,
        k_core: by_id(participants, &k_core),
        betweenness: by_id(participants, &betweenness),
        communities: by_id(participants, &communities),
        community_count: num_communities,
        gini_coefficient: gini,
        lorenz_curve: compute_lorenz_points(&borda_values),
        stratification,
        marginalized: ids_of(participants, &marginalized),
        borda_entropy: compute_entropy(&borda_values),
        individual_entropy: by_id(participants, &compute_individual_entropy(&table)),
        mutual_information: compute_mutual_information_matrix(&table),
        asymmetry_matrix: asymmetry,
        polarization: by_id(participants, &polarization),
        conformity: by_id(participants, &compute_spearman_conformity(&table, &ranking)),
        reciprocity_imbalance: by_id(participants, &compute_reciprocity_imbalance(&table)),
        loss_aversion: by_id(participants, &loss_aversion),
        eigenvector_centrality: by_id(participants, &compute_eigenvector_centrality(&matrix)),
        coalitions: detect_coalitions(&table)
            .iter()
            .map(|c| ids_of(participants, c))
            .collect(),
        top_node_removal: simulate_top_node_removal(participants, ballots, &borda),
        leadership: by_id(
            participants,
            &compute_leadership_score(&borda, &betweenness, &in_degree),
        ),
        subgroup_cohesion: compute_subgroup_cohesion(&table, &communities),
        structural_fragility: compute_structural_fragility(&matrix),
    };
    info!(
        "compute_analytics: done, stratification: {}",
        result.stratification
    );
    Some(result)
}

fn by_id<T: Clone>(participants: &[Participant], values: &[T]) -> BTreeMap<String, T> {
    participants
        .iter()
        .zip(values.iter())
        .map(|(p, v)| (p.id.clone(), v.clone()))
        .collect()
}

fn ids_of(participants: &[Participant], positions: &[usize]) -> Vec<String> {
    positions
        .iter()
        .filter_map(|p| participants.get(*p).map(|x| x.id.clone()))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    pub use crate::config::{Ballot, Participant};

    /// Participants whose id and name are both the given string.
    pub fn participants(ids: &[&str]) -> Vec<Participant> {
        ids.iter().map(|id| Participant::new(id, id)).collect()
    }

    /// A:[B,C], B:[C,A], C:[A,B]
    pub fn rock_paper_scissors() -> (Vec<Participant>, Vec<Ballot>) {
        (
            participants(&["A", "B", "C"]),
            vec![
                Ballot::new("A", &["B", "C"]),
                Ballot::new("B", &["C", "A"]),
                Ballot::new("C", &["A", "B"]),
            ],
        )
    }

    /// Everybody agrees on P1 > P2 > P3 > P4.
    pub fn identical_four() -> (Vec<Participant>, Vec<Ballot>) {
        (
            participants(&["P1", "P2", "P3", "P4"]),
            vec![
                Ballot::new("P1", &["P2", "P3", "P4"]),
                Ballot::new("P2", &["P1", "P3", "P4"]),
                Ballot::new("P3", &["P1", "P2", "P4"]),
                Ballot::new("P4", &["P1", "P2", "P3"]),
            ],
        )
    }

    /// Every participant receives each of the ranks 1, 2, 3 exactly once.
    pub fn latin_square_four() -> (Vec<Participant>, Vec<Ballot>) {
        (
            participants(&["P1", "P2", "P3", "P4"]),
            vec![
                Ballot::new("P1", &["P2", "P3", "P4"]),
                Ballot::new("P2", &["P3", "P4", "P1"]),
                Ballot::new("P3", &["P4", "P1", "P2"]),
                Ballot::new("P4", &["P1", "P2", "P3"]),
            ],
        )
    }

    /// A larger group with mixed, deterministic preferences. Every ballot
    /// is a complete permutation of the other members.
    pub fn rotating_group(n: usize) -> (Vec<Participant>, Vec<Ballot>) {
        let ids: Vec<String> = (0..n).map(|i| format!("m{:02}", i)).collect();
        let ps: Vec<Participant> = ids.iter().map(|id| Participant::new(id, id)).collect();
        let bs: Vec<Ballot> = (0..n)
            .map(|voter| {
                let mut others: Vec<usize> = (0..n).filter(|&i| i != voter).collect();
                others.sort_by_key(|&i| ((i * 7 + voter * 13 + i * voter) % 31, i));
                Ballot {
                    voter_id: ids[voter].clone(),
                    ranking: others.iter().map(|&i| ids[i].clone()).collect(),
                }
            })
            .collect();
        (ps, bs)
    }
}
