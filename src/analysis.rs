use log::{debug, info, warn};

use hierarchy_engine::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;

pub mod history;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod io_json;

#[derive(Debug, Snafu)]
pub enum AnalysisError {
    #[snafu(display("Error opening file {path}: {source}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The worksheet is missing or empty"))]
    EmptyExcel {},
    #[snafu(display("Unexpected cell at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: usize, content: String },
    #[snafu(display("Error reading file {path}: {source}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error in JSON content: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error opening file {path}: {source}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno}: {source}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Invalid ballot at line {lineno}: {source}"))]
    InvalidRow {
        source: EngineErrors,
        lineno: usize,
    },
    #[snafu(display("Invalid input: {source}"))]
    InvalidInput { source: EngineErrors },
    #[snafu(display("Error writing file {path}: {source}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// The document written by the program: the inputs and everything derived
/// from them. It can be read back as an input.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisExport {
    pub participants: Vec<Participant>,
    pub ballots: Vec<Ballot>,
    #[serde(default)]
    pub analytics: Option<AnalyticsResult>,
}

fn infer_input_type(input: &str, input_type: &Option<String>) -> String {
    if let Some(t) = input_type {
        return t.to_lowercase();
    }
    let extension = Path::new(input)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match extension.as_deref() {
        Some("csv") => "csv".to_string(),
        Some("xlsx") => "xlsx".to_string(),
        _ => "json".to_string(),
    }
}

fn read_input(args: &Args) -> AnalysisResult<(Vec<Participant>, Vec<Ballot>)> {
    let input_type = infer_input_type(&args.input, &args.input_type);
    info!("read_input: reading {:?} as {}", args.input, input_type);
    match input_type.as_str() {
        "json" => io_json::read_json_input(&args.input),
        "csv" => io_csv::read_csv_input(&args.input),
        "xlsx" => io_excel::read_excel_input(&args.input, &args.excel_worksheet_name),
        x => whatever!("Input type not supported: {:?}", x),
    }
}

fn write_output(out: &Option<String>, content: &str) -> AnalysisResult<()> {
    match out.as_deref() {
        None | Some("stdout") => {
            println!("{}", content);
        }
        Some("") => {
            debug!("write_output: no output requested");
        }
        Some(path) => {
            info!("write_output: writing analysis to {:?}", path);
            fs::write(path, content).context(WritingOutputSnafu { path })?;
        }
    }
    Ok(())
}

// Both sides go through the same parser so that the comparison is textual.
fn pretty_analytics(content: &str) -> AnalysisResult<String> {
    let js: JSValue = serde_json::from_str(content).context(ParsingJsonSnafu {})?;
    let analytics = js.get("analytics").cloned().unwrap_or(JSValue::Null);
    serde_json::to_string_pretty(&analytics).context(ParsingJsonSnafu {})
}

fn check_reference(reference_path: &str, exported: &str) -> AnalysisResult<()> {
    let reference =
        fs::read_to_string(reference_path).context(OpeningJsonSnafu { path: reference_path })?;
    let pretty_ref = pretty_analytics(&reference)?;
    let pretty_new = pretty_analytics(exported)?;
    if pretty_ref != pretty_new {
        warn!("Found differences with the reference analysis");
        print_diff(pretty_ref.as_str(), pretty_new.as_str(), "\n");
        whatever!("Difference detected between the computed analytics and the reference")
    }
    info!("check_reference: analytics match {:?}", reference_path);
    Ok(())
}

pub fn run_analysis(args: &Args) -> AnalysisResult<()> {
    let (participants, ballots) = read_input(args)?;
    info!(
        "run_analysis: {} participants, {} ballots",
        participants.len(),
        ballots.len()
    );

    let analytics = compute_analytics(&participants, &ballots);
    if analytics.is_none() {
        warn!("run_analysis: not enough participants or ballots, no analytics computed");
    }

    let export = AnalysisExport {
        participants,
        ballots,
        analytics,
    };
    let pretty_js = serde_json::to_string_pretty(&export).context(ParsingJsonSnafu {})?;
    write_output(&args.out, &pretty_js)?;

    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js)?;
    }

    if let Some(history_path) = &args.history {
        history::append_history(history_path, &export.participants, &export.ballots)?;
    }

    Ok(())
}

#[cfg(test)]
pub(crate) fn test_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir()
        .join(format!("peer-hierarchy-{}", std::process::id()))
        .join(name);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_for(input: &str) -> Args {
        Args {
            input: input.to_string(),
            input_type: None,
            out: Some(String::new()),
            reference: None,
            excel_worksheet_name: None,
            history: None,
            verbose: false,
        }
    }

    const GROUP: &str = "voter,first,second,third
Anna,Bob,Clara,Dan
Bob,Anna,Clara,Dan
Clara,Anna,Bob,Dan
Dan,Anna,Bob,Clara
";

    #[test]
    fn input_type_from_extension() {
        assert_eq!(infer_input_type("a/b.CSV", &None), "csv");
        assert_eq!(infer_input_type("b.xlsx", &None), "xlsx");
        assert_eq!(infer_input_type("b.json", &None), "json");
        assert_eq!(infer_input_type("ballots", &None), "json");
        assert_eq!(infer_input_type("b.json", &Some("CSV".to_string())), "csv");
    }

    #[test]
    fn unknown_input_type() {
        let mut args = args_for("whatever.txt");
        args.input_type = Some("dominion".to_string());
        assert!(run_analysis(&args).is_err());
    }

    #[test]
    fn csv_to_json_and_reference_check() {
        let dir = test_dir("csv_to_json");
        let csv_path = dir.join("group.csv");
        let out_path = dir.join("analysis.json");
        fs::write(&csv_path, GROUP).unwrap();

        let mut args = args_for(csv_path.to_str().unwrap());
        args.out = Some(out_path.to_str().unwrap().to_string());
        run_analysis(&args).unwrap();

        let written = fs::read_to_string(&out_path).unwrap();
        let export: AnalysisExport = serde_json::from_str(&written).unwrap();
        assert_eq!(export.participants.len(), 4);
        assert_eq!(export.ballots.len(), 4);
        let analytics = export.analytics.unwrap();
        assert_eq!(analytics.condorcet_winner, Some("p01".to_string()));
        assert_eq!(analytics.borda_ranking[0], "p01");

        // The export is a valid input, and its analytics are reproduced.
        let mut again = args_for(out_path.to_str().unwrap());
        again.reference = Some(out_path.to_str().unwrap().to_string());
        run_analysis(&again).unwrap();
    }

    #[test]
    fn reference_mismatch_fails() {
        let dir = test_dir("reference_mismatch");
        let csv_path = dir.join("group.csv");
        let out_path = dir.join("analysis.json");
        fs::write(&csv_path, GROUP).unwrap();
        let mut args = args_for(csv_path.to_str().unwrap());
        args.out = Some(out_path.to_str().unwrap().to_string());
        run_analysis(&args).unwrap();

        let other_path = dir.join("other.csv");
        fs::write(&other_path, "Anna,Bob,Clara\nBob,Clara,Anna\nClara,Anna,Bob\n").unwrap();
        let mut other = args_for(other_path.to_str().unwrap());
        other.reference = Some(out_path.to_str().unwrap().to_string());
        assert!(run_analysis(&other).is_err());
    }

    #[test]
    fn degenerate_input_has_no_analytics() {
        let dir = test_dir("degenerate");
        let json_path = dir.join("lonely.json");
        let out_path = dir.join("lonely_out.json");
        fs::write(
            &json_path,
            r#"{"participants": [{"id": "a", "name": "Anna"}], "ballots": []}"#,
        )
        .unwrap();
        let mut args = args_for(json_path.to_str().unwrap());
        args.out = Some(out_path.to_str().unwrap().to_string());
        run_analysis(&args).unwrap();
        let export: AnalysisExport =
            serde_json::from_str(&fs::read_to_string(&out_path).unwrap()).unwrap();
        assert!(export.analytics.is_none());
    }
}
