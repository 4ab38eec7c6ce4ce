use clap::Parser;

/// This is a tabulation program for ranked-ballot polls.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON description of the poll: its options and the ballots cast.
    /// For the exact format, read the manual in the instant_runoff crate documentation.
    #[clap(short, long, value_parser)]
    pub poll: String,

    /// (file path or empty) A CSV file with additional ballots, one per row, each cell
    /// naming an option in descending preference order.
    #[clap(short, long, value_parser)]
    pub ballots: Option<String>,

    /// (file path) A reference file containing the expected summary of the poll in JSON
    /// format. If provided, polltally will check that the tabulated output matches the
    /// reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the poll will be
    /// written in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
