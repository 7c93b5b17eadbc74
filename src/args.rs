use clap::{Parser, Subcommand};

/// This is a survey program collecting confidence levels and estimates in months.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, default voting_state.json) The JSON file that holds all the recorded answers.
    /// It is read at startup and rewritten after every recorded answer.
    #[clap(short, long, value_parser, default_value = "voting_state.json", global = true)]
    pub state: String,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Lists the questions of the survey with their ids.
    Questions,

    /// Records the answer of one voter to one question.
    Vote {
        /// (integer) The id of the question, as printed by the `questions` command.
        #[clap(short, long, value_parser)]
        question: usize,
        /// (none, medium or full) The confidence of the voter.
        #[clap(short, long, value_parser)]
        confidence: String,
        /// (non-negative integer) The estimate in months.
        /// Anything else is dropped without recording the answer.
        #[clap(short, long, value_parser)]
        months: String,
    },

    /// Goes through all the questions in order, reading the answers from the standard input.
    Walk {
        /// (integer, default 0) The id of the first question to ask.
        #[clap(long, value_parser, default_value_t = 0)]
        start: usize,
    },

    /// Computes the statistics of the survey.
    Results {
        /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
        /// location. By default, it is printed on the standard output.
        #[clap(short, long, value_parser)]
        out: Option<String>,
        /// (file path) A reference file containing a summary in JSON format. If provided, surveytally will
        /// check that the computed summary matches the reference.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },

    /// Writes one CSV row per recorded answer, in arrival order.
    Export {
        /// (file path or 'stdout') The destination of the CSV rows.
        #[clap(short, long, value_parser)]
        out: String,
    },
}
