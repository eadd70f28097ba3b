// Reading of the native JSON format.

use crate::analysis::io_common::validate_group;
use crate::analysis::*;

// Any other entry, like the analytics of a previous export, is ignored.
#[derive(Debug, Clone, Deserialize)]
struct InputDocument {
    participants: Vec<Participant>,
    #[serde(default)]
    ballots: Vec<Ballot>,
}

pub fn read_json_input(path: &str) -> AnalysisResult<(Vec<Participant>, Vec<Ballot>)> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let doc: InputDocument = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!(
        "read_json_input: {} participants, {} ballots",
        doc.participants.len(),
        doc.ballots.len()
    );
    validate_group(&doc.participants, &doc.ballots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_participants_and_ballots() {
        let dir = test_dir("io_json");
        let path = dir.join("group.json");
        fs::write(
            &path,
            r#"{
                "participants": [{"id": "a", "name": "Anna"}, {"id": "b", "name": "Bob"}],
                "ballots": [{"voterId": "a", "ranking": ["b"]}],
                "analytics": {"anything": 1}
            }"#,
        )
        .unwrap();
        let (participants, ballots) = read_json_input(path.to_str().unwrap()).unwrap();
        assert_eq!(participants[1], Participant::new("b", "Bob"));
        assert_eq!(ballots, vec![Ballot::new("a", &["b"])]);
    }

    #[test]
    fn rejects_invalid_documents() {
        let dir = test_dir("io_json_invalid");
        let missing = dir.join("missing.json");
        assert!(matches!(
            read_json_input(missing.to_str().unwrap()),
            Err(AnalysisError::OpeningJson { .. })
        ));

        let garbled = dir.join("garbled.json");
        fs::write(&garbled, "{\"participants\": [").unwrap();
        assert!(matches!(
            read_json_input(garbled.to_str().unwrap()),
            Err(AnalysisError::ParsingJson { .. })
        ));

        let self_ranked = dir.join("self.json");
        fs::write(
            &self_ranked,
            r#"{"participants": [{"id": "a", "name": "Anna"}],
                "ballots": [{"voterId": "a", "ranking": ["a"]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            read_json_input(self_ranked.to_str().unwrap()),
            Err(AnalysisError::InvalidInput { .. })
        ));
    }
}
