// Append-only log of the analyzed inputs, one JSON document per line.

use std::fs::OpenOptions;
use std::io::Write;

use hierarchy_engine::cache::content_hash;

use crate::analysis::*;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub hash: String,
    pub participants: Vec<Participant>,
    pub ballots: Vec<Ballot>,
}

/// All the readable entries of the log. A missing log is empty.
pub fn read_history(path: &str) -> AnalysisResult<Vec<HistoryEntry>> {
    if !Path::new(path).exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let mut res: Vec<HistoryEntry> = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<HistoryEntry>(line) {
            Ok(entry) => res.push(entry),
            Err(e) => warn!("read_history: skipping line {} of {:?}: {}", idx + 1, path, e),
        }
    }
    Ok(res)
}

/// Appends the input to the log, unless an entry with the same content is
/// already present. Returns true if a line was written.
pub fn append_history(
    path: &str,
    participants: &[Participant],
    ballots: &[Ballot],
) -> AnalysisResult<bool> {
    let hash = content_hash(participants, ballots);
    if read_history(path)?.iter().any(|e| e.hash == hash) {
        info!("append_history: {} already recorded in {:?}", hash, path);
        return Ok(false);
    }
    let entry = HistoryEntry {
        hash,
        participants: participants.to_vec(),
        ballots: ballots.to_vec(),
    };
    let line = serde_json::to_string(&entry).context(ParsingJsonSnafu {})?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context(WritingOutputSnafu { path })?;
    writeln!(file, "{}", line).context(WritingOutputSnafu { path })?;
    info!("append_history: recorded {} in {:?}", entry.hash, path);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_recorded_once() {
        let dir = test_dir("history");
        let path = dir.join("history.jsonl");
        let path = path.to_str().unwrap();
        let _ = fs::remove_file(path);

        let participants = vec![Participant::new("a", "Anna"), Participant::new("b", "Bob")];
        let ballots = vec![Ballot::new("a", &["b"])];
        assert!(read_history(path).unwrap().is_empty());
        assert!(append_history(path, &participants, &ballots).unwrap());
        assert!(!append_history(path, &participants, &ballots).unwrap());
        assert!(append_history(path, &participants, &[]).unwrap());

        let entries = read_history(path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ballots, ballots);
        assert_eq!(entries[0].hash, content_hash(&participants, &ballots));
    }

    #[test]
    fn unreadable_lines_are_skipped() {
        let dir = test_dir("history_garbled");
        let path = dir.join("history.jsonl");
        let path = path.to_str().unwrap();
        fs::write(path, "not json\n\n").unwrap();
        assert!(read_history(path).unwrap().is_empty());
        assert!(append_history(path, &[Participant::new("a", "Anna")], &[]).unwrap());
        assert_eq!(read_history(path).unwrap().len(), 1);
    }
}
