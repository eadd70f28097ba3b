pub use crate::config::*;

use std::collections::HashSet;

/// A builder for assembling a group and its ballots.
///
/// The analytics functions trust their inputs. This is the place where the
/// ingestion layer enforces the data model: unique ids, no self-ranking, no
/// duplicate entries and at most one ballot per voter.
///
/// ```
/// use hierarchy_engine::builder::Builder;
/// use hierarchy_engine::{EngineErrors, Participant};
///
/// let mut builder = Builder::new().participants(&[
///     Participant::new("a", "Anna"),
///     Participant::new("b", "Bob"),
///     Participant::new("c", "Clara"),
/// ])?;
///
/// builder.add_ballot("a", &["b".to_string(), "c".to_string()])?;
/// assert!(builder.add_ballot("b", &["b".to_string()]).is_err());
///
/// let (participants, ballots) = builder.build();
/// assert_eq!(participants.len(), 3);
/// assert_eq!(ballots.len(), 1);
/// # Ok::<(), EngineErrors>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(crate) _participants: Vec<Participant>,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Declares the group. Any ballot added before is discarded.
    pub fn participants(self, participants: &[Participant]) -> Result<Builder, EngineErrors> {
        let mut seen: HashSet<&str> = HashSet::new();
        for p in participants.iter() {
            if !seen.insert(p.id.as_str()) {
                return Err(EngineErrors::DuplicateParticipant(p.id.clone()));
            }
        }
        Ok(Builder {
            _participants: participants.to_vec(),
            _ballots: Vec::new(),
        })
    }

    /// Adds one participant to the group.
    pub fn add_participant(&mut self, participant: Participant) -> Result<(), EngineErrors> {
        if self._participants.iter().any(|p| p.id == participant.id) {
            return Err(EngineErrors::DuplicateParticipant(participant.id));
        }
        self._participants.push(participant);
        Ok(())
    }

    /// Adds the ballot of `voter_id`, most preferred peer first.
    ///
    /// The ranking may be partial, but every entry must be a known
    /// participant other than the voter, and appear only once.
    pub fn add_ballot(&mut self, voter_id: &str, ranking: &[String]) -> Result<(), EngineErrors> {
        if !self.is_participant(voter_id) {
            return Err(EngineErrors::UnknownVoter(voter_id.to_string()));
        }
        if self._ballots.iter().any(|b| b.voter_id == voter_id) {
            return Err(EngineErrors::DuplicateBallot(voter_id.to_string()));
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for candidate in ranking.iter() {
            if candidate == voter_id {
                return Err(EngineErrors::SelfRanking(voter_id.to_string()));
            }
            if !self.is_participant(candidate) {
                return Err(EngineErrors::UnknownCandidate {
                    voter: voter_id.to_string(),
                    candidate: candidate.clone(),
                });
            }
            if !seen.insert(candidate.as_str()) {
                return Err(EngineErrors::DuplicateRanking {
                    voter: voter_id.to_string(),
                    candidate: candidate.clone(),
                });
            }
        }
        self._ballots.push(Ballot {
            voter_id: voter_id.to_string(),
            ranking: ranking.to_vec(),
        });
        Ok(())
    }

    pub fn num_participants(&self) -> usize {
        self._participants.len()
    }

    pub fn build(self) -> (Vec<Participant>, Vec<Ballot>) {
        (self._participants, self._ballots)
    }

    fn is_participant(&self, id: &str) -> bool {
        self._participants.iter().any(|p| p.id == id)
    }
}
