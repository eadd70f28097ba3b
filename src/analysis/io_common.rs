// Primitives shared by the readers.

use std::collections::HashMap;

use hierarchy_engine::builder::Builder;

use crate::analysis::*;

/// A row of a tabular input, with its 1-based line number in the file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TabularRow {
    pub lineno: usize,
    pub cells: Vec<String>,
}

pub fn participant_id(idx: usize) -> String {
    format!("p{:02}", idx + 1)
}

fn is_header(row: &TabularRow) -> bool {
    row.cells
        .first()
        .map(|c| c.trim().eq_ignore_ascii_case("voter"))
        .unwrap_or(false)
}

/// Builds the group from rows of the form `voter, first choice, second
/// choice, ...`.
///
/// Empty rows and blank cells are skipped, as is a leading header row. The
/// participants are numbered in order of appearance: all the voters first,
/// then the names only found in the rankings.
pub fn assemble_group(rows: &[TabularRow]) -> AnalysisResult<(Vec<Participant>, Vec<Ballot>)> {
    let mut ballots: Vec<(usize, String, Vec<String>)> = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        if idx == 0 && is_header(row) {
            debug!("assemble_group: skipping header {:?}", row.cells);
            continue;
        }
        let names: Vec<String> = row
            .cells
            .iter()
            .map(|c| c.trim().to_string())
            .collect();
        if names.iter().all(|n| n.is_empty()) {
            continue;
        }
        let voter = match names.first() {
            Some(v) if !v.is_empty() => v.clone(),
            _ => whatever!("Missing voter name at line {}", row.lineno),
        };
        let ranking: Vec<String> = names.into_iter().skip(1).filter(|n| !n.is_empty()).collect();
        ballots.push((row.lineno, voter, ranking));
    }

    let mut ids: HashMap<String, String> = HashMap::new();
    let mut builder = Builder::new();
    let voters = ballots.iter().map(|(_, voter, _)| voter);
    let ranked = ballots.iter().flat_map(|(_, _, ranking)| ranking.iter());
    for name in voters.chain(ranked) {
        if ids.contains_key(name) {
            continue;
        }
        let id = participant_id(ids.len());
        builder
            .add_participant(Participant::new(&id, name))
            .context(InvalidInputSnafu {})?;
        ids.insert(name.clone(), id);
    }

    for (lineno, voter, ranking) in ballots.iter() {
        // Every name was registered above.
        let voter_id = ids[voter].clone();
        let ranking_ids: Vec<String> = ranking.iter().map(|name| ids[name].clone()).collect();
        builder
            .add_ballot(&voter_id, &ranking_ids)
            .context(InvalidRowSnafu { lineno: *lineno })?;
    }
    info!(
        "assemble_group: {} participants, {} ballots",
        builder.num_participants(),
        ballots.len()
    );
    Ok(builder.build())
}

/// Validates an already identified group.
pub fn validate_group(
    participants: &[Participant],
    ballots: &[Ballot],
) -> AnalysisResult<(Vec<Participant>, Vec<Ballot>)> {
    let mut builder = Builder::new()
        .participants(participants)
        .context(InvalidInputSnafu {})?;
    for ballot in ballots.iter() {
        builder
            .add_ballot(&ballot.voter_id, &ballot.ranking)
            .context(InvalidInputSnafu {})?;
    }
    Ok(builder.build())
}
