// Primitives for reading CSV files.

use crate::analysis::io_common::{assemble_group, TabularRow};
use crate::analysis::*;

pub fn read_csv_input(path: &str) -> AnalysisResult<(Vec<Participant>, Vec<Ballot>)> {
    let rows = read_csv_rows(path)?;
    assemble_group(&rows)
}

fn read_csv_rows(path: &str) -> AnalysisResult<Vec<TabularRow>> {
    // Rows have different lengths when ballots are partial.
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut res: Vec<TabularRow> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        // The index starts at 1 to respect most conventions in the spreadsheet world
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let cells: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        debug!("read_csv_rows: lineno: {:?} row: {:?}", lineno, &cells);
        res.push(TabularRow { lineno, cells });
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_partial_ballots() {
        let dir = test_dir("io_csv");
        let path = dir.join("group.csv");
        fs::write(
            &path,
            "voter,first,second\nAnna,Bob,Clara\nBob,Clara\nClara,,Anna\n",
        )
        .unwrap();
        let (participants, ballots) = read_csv_input(path.to_str().unwrap()).unwrap();
        assert_eq!(participants.len(), 3);
        assert_eq!(ballots.len(), 3);
        assert_eq!(ballots[1].ranking, vec!["p03".to_string()]);
        assert_eq!(ballots[2].ranking, vec!["p01".to_string()]);
    }

    #[test]
    fn reports_the_faulty_line() {
        let dir = test_dir("io_csv_faulty");
        let path = dir.join("group.csv");
        fs::write(&path, "Anna,Bob\nBob,Anna,Anna\n").unwrap();
        match read_csv_input(path.to_str().unwrap()) {
            Err(AnalysisError::InvalidRow { lineno, .. }) => assert_eq!(lineno, 2),
            x => panic!("unexpected result {:?}", x),
        }
        let missing = dir.join("missing.csv");
        assert!(matches!(
            read_csv_input(missing.to_str().unwrap()),
            Err(AnalysisError::CsvOpen { .. })
        ));
    }
}
