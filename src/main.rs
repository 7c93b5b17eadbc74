mod args;
mod survey;

use clap::Parser;
use log::{debug, warn};
use snafu::ErrorCompat;
use std::io;

use crate::args::{Args, Command};
use crate::survey::{SurveyResult, SurveyService};
use survey_stats::QuestionCatalog;

fn run(args: &Args) -> SurveyResult<()> {
    let catalog = QuestionCatalog::builtin();
    let service = SurveyService::open(catalog, &args.state)?;
    match &args.command {
        Command::Questions => survey::run_questions(&service, &mut io::stdout()),
        Command::Vote {
            question,
            confidence,
            months,
        } => {
            let submission = service.submit(*question, confidence, months)?;
            debug!("vote: {:?}", submission);
            Ok(())
        }
        Command::Walk { start } => {
            let stdin = io::stdin();
            let recorded =
                survey::run_walk(&service, *start, &mut stdin.lock(), &mut io::stdout())?;
            println!("{} answers recorded", recorded);
            Ok(())
        }
        Command::Results { out, reference } => {
            survey::run_results(&service, out.as_deref(), reference.as_deref())
        }
        Command::Export { out } => survey::run_export(&service, out),
    }
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    debug!("args: {:?}", args);

    if let Err(e) = run(&args) {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
