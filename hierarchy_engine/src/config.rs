// ********* Input data structures ***********

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

/// A member of the group.
///
/// The id is opaque and immutable. It is the only thing ballots refer to.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
}

impl Participant {
    pub fn new(id: &str, name: &str) -> Participant {
        Participant {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// The ranking submitted by one participant.
///
/// `ranking[0]` is the most preferred peer (rank 1). The ranking never
/// contains the voter and never contains duplicates. It may be partial:
/// ids that are absent simply have no rank in this ballot.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize)]
pub struct Ballot {
    #[serde(rename = "voterId")]
    pub voter_id: String,
    pub ranking: Vec<String>,
}

impl Ballot {
    pub fn new(voter_id: &str, ranking: &[&str]) -> Ballot {
        Ballot {
            voter_id: voter_id.to_string(),
            ranking: ranking.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// ******** Output data structures *********

/// Rule-based classification of the overall shape of the group.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum StratificationLabel {
    #[serde(rename = "Linear Hierarchy")]
    LinearHierarchy,
    #[serde(rename = "Tiered Clusters")]
    TieredClusters,
    #[serde(rename = "Fragmented")]
    Fragmented,
    #[serde(rename = "Mixed Structure")]
    MixedStructure,
}

impl Display for StratificationLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StratificationLabel::LinearHierarchy => "Linear Hierarchy",
            StratificationLabel::TieredClusters => "Tiered Clusters",
            StratificationLabel::Fragmented => "Fragmented",
            StratificationLabel::MixedStructure => "Mixed Structure",
        };
        write!(f, "{}", s)
    }
}

/// Counterfactual: what happens to everyone else's Borda score if the
/// highest scoring participant leaves the group.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopNodeRemoval {
    pub removed_id: String,
    /// New score minus old score, for every remaining participant.
    pub deltas: BTreeMap<String, i64>,
}

/// The complete snapshot of every metric for one `(participants, ballots)` input.
///
/// Matrices are indexed by participant position, in the order given by
/// `participant_ids`. Per-participant metrics are keyed by participant id.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResult {
    pub participant_ids: Vec<String>,
    pub num_ballots: usize,

    // Social choice
    pub pairwise_matrix: Vec<Vec<u32>>,
    pub borda_scores: BTreeMap<String, u64>,
    pub borda_ranking: Vec<String>,
    pub condorcet_winner: Option<String>,
    pub condorcet_cycles: Vec<[String; 3]>,
    /// Free of majority 3-cycles. Longer cycles are not searched, and can
    /// exist without any 3-cycle when the majority relation has ties.
    pub is_tournament_acyclic: bool,
    pub kendall_w: f64,

    // Graph
    pub weight_matrix: Vec<Vec<u32>>,
    pub in_degree_centrality: BTreeMap<String, f64>,
    pub reciprocity_index: f64,
    pub cycle_density: f64,
    pub k_core: BTreeMap<String, usize>,
    pub betweenness: BTreeMap<String, f64>,
    pub communities: BTreeMap<String, usize>,
    pub community_count: usize,

    // Inequality and information
    pub gini_coefficient: f64,
    pub lorenz_curve: Vec<(f64, f64)>,
    pub stratification: StratificationLabel,
    pub marginalized: Vec<String>,
    pub borda_entropy: f64,
    pub individual_entropy: BTreeMap<String, f64>,
    pub mutual_information: Vec<Vec<f64>>,

    // Behavioral
    pub asymmetry_matrix: Vec<Vec<u32>>,
    pub polarization: BTreeMap<String, f64>,
    pub conformity: BTreeMap<String, f64>,
    pub reciprocity_imbalance: BTreeMap<String, f64>,
    pub loss_aversion: BTreeMap<String, usize>,
    pub eigenvector_centrality: BTreeMap<String, f64>,
    pub coalitions: Vec<Vec<String>>,

    // Perturbation and composites
    pub top_node_removal: Option<TopNodeRemoval>,
    pub leadership: BTreeMap<String, f64>,
    pub subgroup_cohesion: Vec<f64>,
    pub structural_fragility: f64,
}

/// Errors raised while assembling the input of an analysis.
///
/// The metric functions themselves never fail: these errors only come from
/// the validating [`crate::builder::Builder`].
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum EngineErrors {
    /// Two participants share the same id.
    DuplicateParticipant(String),
    /// A ballot was submitted by someone who is not a participant.
    UnknownVoter(String),
    /// A ballot ranks an id that is not a participant.
    UnknownCandidate { voter: String, candidate: String },
    /// A voter ranked themselves.
    SelfRanking(String),
    /// The same id appears twice in one ranking.
    DuplicateRanking { voter: String, candidate: String },
    /// A participant submitted more than one ballot.
    DuplicateBallot(String),
}

impl Error for EngineErrors {}

impl Display for EngineErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineErrors::DuplicateParticipant(id) => {
                write!(f, "duplicate participant id {:?}", id)
            }
            EngineErrors::UnknownVoter(id) => write!(f, "ballot from unknown voter {:?}", id),
            EngineErrors::UnknownCandidate { voter, candidate } => write!(
                f,
                "ballot from {:?} ranks unknown participant {:?}",
                voter, candidate
            ),
            EngineErrors::SelfRanking(id) => write!(f, "voter {:?} ranked themselves", id),
            EngineErrors::DuplicateRanking { voter, candidate } => write!(
                f,
                "ballot from {:?} ranks {:?} more than once",
                voter, candidate
            ),
            EngineErrors::DuplicateBallot(id) => {
                write!(f, "voter {:?} submitted more than one ballot", id)
            }
        }
    }
}
