use clap::Parser;

/// Analytics of the informal hierarchy of a group, from the rankings that its
/// members give to each other.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file containing the participants and their ballots.
    /// See the manual of the hierarchy_engine crate for the supported formats.
    #[clap(short, long, value_parser)]
    pub input: String,

    /// (json, csv or xlsx) The type of the input. If not specified, it is inferred from the
    /// extension of the input file, and defaults to json.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (file path, 'stdout' or empty) Where to write the participants, the ballots and the
    /// analytics in JSON format. Defaults to the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing a previous output in JSON format. If provided,
    /// the program will check that the computed analytics match the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (default: first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path) If specified, the input is appended to this log of past analyses, one JSON
    /// document per line.
    #[clap(long, value_parser)]
    pub history: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
