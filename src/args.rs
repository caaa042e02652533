use clap::Parser;

/// Computes the rankings, summary cards and maps of the eGovernment index dashboard.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON file describing the dashboard and its index families.
    /// File paths inside it are relative to its directory.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference dashboard document in JSON format. If provided, egovdash will
    /// check that the initial document matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the initial dashboard document will be written in
    /// JSON format to the given location. It is printed on the standard output when empty, unless
    /// --interactive is set.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// If passed as an argument, reads '<family> <year>' events from the standard input and answers
    /// each of them with a JSON bundle on a single line.
    #[clap(short, long, takes_value = false)]
    pub interactive: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
