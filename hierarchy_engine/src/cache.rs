use log::debug;
use std::collections::HashMap;

use crate::config::{AnalyticsResult, Ballot, Participant};

/// Content-addressed cache of analytics results.
///
/// The key is the SHA-256 digest of the JSON serialization of
/// `(participants, ballots)`. Two inputs with the same content share an
/// entry, whatever their origin. Degenerate inputs are never stored.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsCache {
    entries: HashMap<String, AnalyticsResult>,
}

/// The cache key of an input.
pub fn content_hash(participants: &[Participant], ballots: &[Ballot]) -> String {
    // Serializing plain strings and vectors cannot fail.
    let serialized = serde_json::to_string(&(participants, ballots)).unwrap_or_default();
    sha256::digest(serialized.as_str())
}

impl AnalyticsCache {
    pub fn new() -> AnalyticsCache {
        AnalyticsCache::default()
    }

    pub fn get(&self, participants: &[Participant], ballots: &[Ballot]) -> Option<&AnalyticsResult> {
        self.entries.get(&content_hash(participants, ballots))
    }

    /// Returns the cached result, computing and storing it on a miss.
    pub fn get_or_compute(
        &mut self,
        participants: &[Participant],
        ballots: &[Ballot],
    ) -> Option<AnalyticsResult> {
        let key = content_hash(participants, ballots);
        if let Some(res) = self.entries.get(&key) {
            debug!("AnalyticsCache: hit {}", key);
            return Some(res.clone());
        }
        debug!("AnalyticsCache: miss {}", key);
        let res = crate::compute_analytics(participants, ballots)?;
        self.entries.insert(key, res.clone());
        Some(res)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::*;

    #[test]
    fn hash_depends_on_content_only() {
        let (ps, bs) = rock_paper_scissors();
        let (ps2, bs2) = rock_paper_scissors();
        assert_eq!(content_hash(&ps, &bs), content_hash(&ps2, &bs2));
        assert_eq!(content_hash(&ps, &bs).len(), 64);
        let mut reordered = bs.clone();
        reordered.reverse();
        assert_ne!(content_hash(&ps, &bs), content_hash(&ps, &reordered));
    }

    #[test]
    fn cache_stores_results_once() {
        let (ps, bs) = identical_four();
        let mut cache = AnalyticsCache::new();
        assert!(cache.is_empty());
        let first = cache.get_or_compute(&ps, &bs).unwrap();
        let second = cache.get_or_compute(&ps, &bs).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&ps, &bs).is_some());

        assert!(cache.get_or_compute(&ps, &[]).is_none());
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.get(&ps, &bs).is_none());
    }
}
