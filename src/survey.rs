use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use survey_stats::*;

pub mod io_csv;
pub mod io_json;

#[derive(Debug, Snafu)]
pub enum SurveyError {
    #[snafu(display("Error opening state file {path}"))]
    OpeningState {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("State file {path} is not a valid survey state: {source}"))]
    ParsingState {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("State file {path}: key {key:?} is not a question id"))]
    InvalidStateKey { key: String, path: String },
    #[snafu(display(
        "State file {path}: question {question_id} has {confidences} confidence labels but {months} months"
    ))]
    MisalignedState {
        question_id: usize,
        confidences: usize,
        months: usize,
        path: String,
    },
    #[snafu(display("State file {path}: question {question_id} has unknown confidence {label:?}"))]
    UnknownConfidenceInState {
        question_id: usize,
        label: String,
        path: String,
    },
    #[snafu(display(
        "State file {path}: question {question_id} is not in the catalog (size {catalog_size})"
    ))]
    QuestionOutOfCatalog {
        question_id: usize,
        catalog_size: usize,
        path: String,
    },
    #[snafu(display("Error serializing the survey state"))]
    SerializingState { source: serde_json::Error },
    #[snafu(display("Error serializing the summary"))]
    SerializingSummary { source: serde_json::Error },
    #[snafu(display("Error locking state file {path}"))]
    LockingState {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing state file {path}"))]
    WritingState {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("{source}"))]
    InvalidQuestion { source: SurveyErrors },
    #[snafu(display("Error writing to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing CSV rows to {path}"))]
    WritingCsv { source: csv::Error, path: String },
    #[snafu(display("Error reading the answers"))]
    ReadingInput { source: std::io::Error },
    #[snafu(display("Error opening reference summary {path}"))]
    OpeningReference {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing reference summary {path}"))]
    ParsingReference {
        source: serde_json::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SurveyResult<T> = Result<T, SurveyError>;

/// What happened to a submission.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Submission {
    /// The answer is stored and saved. `sample_count` is the new number of answers to the question.
    Recorded {
        question_id: QuestionId,
        sample_count: usize,
    },
    /// The answer was dropped. Nothing was stored or saved.
    Rejected(RejectReason),
}

/// The live survey: the catalog, the recorded answers and the file that keeps them.
///
/// Submissions may come from several threads, and from several processes sharing the same
/// state file. Each one is appended and saved while holding both the store lock and an
/// exclusive lock on the state file, after reading the file again, so the answers of a
/// question keep their arrival order and no answer saved by another process is lost.
pub struct SurveyService {
    catalog: QuestionCatalog,
    state_path: PathBuf,
    store: Mutex<ResponseStore>,
}

impl SurveyService {
    /// Loads the state file (or starts empty if it does not exist yet).
    pub fn open(catalog: QuestionCatalog, state_path: impl AsRef<Path>) -> SurveyResult<SurveyService> {
        let state_path = state_path.as_ref().to_path_buf();
        let store = io_json::load_state(&state_path, catalog.size())?;
        info!(
            "Opened survey with {} questions and {} recorded answers from {:?}",
            catalog.size(),
            store.total_responses(),
            state_path
        );
        Ok(SurveyService {
            catalog,
            state_path,
            store: Mutex::new(store),
        })
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    // The store is only replaced once a save succeeded, so a panic in another holder
    // cannot leave it half-updated.
    fn lock_store(&self) -> MutexGuard<'_, ResponseStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validates a raw submission, and records and saves it if it is valid.
    ///
    /// An unknown question id is an error. Malformed fields are not: the submission is
    /// dropped and reported as `Submission::Rejected`.
    /// If the save fails, the answer is not kept in memory either.
    pub fn submit(
        &self,
        question_id: QuestionId,
        confidence: &str,
        months: &str,
    ) -> SurveyResult<Submission> {
        self.catalog
            .label_of(question_id)
            .context(InvalidQuestionSnafu {})?;

        let response = match validate_submission(confidence, months) {
            Validation::Valid(r) => r,
            Validation::Rejected(reason) => {
                warn!(
                    "submit: question {}: dropping submission: {}",
                    question_id, reason
                );
                return Ok(Submission::Rejected(reason));
            }
        };

        let mut store = self.lock_store();
        let _file_lock = io_json::lock_state(&self.state_path)?;
        // Another process may have recorded answers since this one last read the file.
        let mut next = io_json::load_state(&self.state_path, self.catalog.size())?;
        next.append(question_id, response)
            .context(InvalidQuestionSnafu {})?;
        io_json::save_state(&next, &self.state_path)?;
        *store = next;

        let sample_count = store
            .responses(question_id)
            .context(InvalidQuestionSnafu {})?
            .len();
        info!(
            "Recorded answer {} to question {}: {} months, confidence {}",
            sample_count, question_id, response.months, response.confidence
        );
        Ok(Submission::Recorded {
            question_id,
            sample_count,
        })
    }

    /// A copy of the recorded answers.
    pub fn snapshot(&self) -> ResponseStore {
        self.lock_store().snapshot()
    }

    pub fn summary(&self) -> SurveyResult<SurveySummary> {
        let snapshot = self.snapshot();
        overall(&snapshot, &self.catalog).context(InvalidQuestionSnafu {})
    }
}

pub fn build_summary_js(catalog: &QuestionCatalog, summary: &SurveySummary) -> SurveyResult<JSValue> {
    let mut results: Vec<JSValue> = Vec::new();
    for q in summary.questions.iter() {
        let label = catalog
            .label_of(q.question_id)
            .context(InvalidQuestionSnafu {})?;
        results.push(json!({
            "questionId": q.question_id,
            "question": label,
            "medianMonths": q.median_months,
            "medianConfidence": q.median_confidence_score,
            "divergenceMonths": q.divergence_months,
            "sampleCount": q.sample_count,
        }));
    }
    Ok(json!({
        "config": {
            "questions": catalog.size(),
        },
        "results": results,
        "totalMedianMonths": summary.total_median_months,
        "participantCount": summary.participant_count,
    }))
}

pub fn read_summary(path: &str) -> SurveyResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningReferenceSnafu { path })?;
    let js: JSValue =
        serde_json::from_str(contents.as_str()).context(ParsingReferenceSnafu { path })?;
    Ok(js)
}

pub fn run_questions<W: Write>(service: &SurveyService, out: &mut W) -> SurveyResult<()> {
    for (qid, label) in service.catalog().iter() {
        writeln!(out, "{}\t{}", qid, label).context(WritingOutputSnafu { path: "stdout" })?;
    }
    Ok(())
}

/// Asks every question from `start` on, reading the confidence then the months for each.
///
/// As with the web form, a malformed answer is dropped and the walk moves on to the next
/// question. Stops early at the end of the input. Once the last question is answered, the
/// summary of the survey is written after the questions. Returns the number of recorded answers.
pub fn run_walk<R: BufRead, W: Write>(
    service: &SurveyService,
    start: QuestionId,
    input: &mut R,
    out: &mut W,
) -> SurveyResult<usize> {
    let mut recorded = 0;
    let mut interrupted = false;
    let size = service.catalog().size();
    for qid in start..size {
        let label = service
            .catalog()
            .label_of(qid)
            .context(InvalidQuestionSnafu {})?;
        writeln!(out, "[{}/{}] {}", qid + 1, size, label)
            .context(WritingOutputSnafu { path: "stdout" })?;

        let confidence = match prompt(input, out, "confidence (none/medium/full): ")? {
            Some(s) => s,
            None => {
                interrupted = true;
                break;
            }
        };
        let months = match prompt(input, out, "months: ")? {
            Some(s) => s,
            None => {
                interrupted = true;
                break;
            }
        };
        match service.submit(qid, &confidence, &months)? {
            Submission::Recorded { .. } => recorded += 1,
            Submission::Rejected(reason) => {
                debug!("run_walk: question {}: not recorded: {}", qid, reason);
            }
        }
    }
    info!("Walk done: {} answers recorded", recorded);
    if !interrupted {
        let pretty_js_stats = pretty_summary(service)?;
        writeln!(out, "{}", pretty_js_stats).context(WritingOutputSnafu { path: "stdout" })?;
    }
    Ok(recorded)
}

fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, text: &str) -> SurveyResult<Option<String>> {
    write!(out, "{}", text).context(WritingOutputSnafu { path: "stdout" })?;
    out.flush().context(WritingOutputSnafu { path: "stdout" })?;
    let mut line = String::new();
    let n = input.read_line(&mut line).context(ReadingInputSnafu {})?;
    if n == 0 {
        debug!("prompt: end of input");
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
}

/// The summary of the survey, as pretty-printed JSON.
pub fn pretty_summary(service: &SurveyService) -> SurveyResult<String> {
    let summary = service.summary()?;
    info!(
        "Summary: {} participants, total median months {}",
        summary.participant_count, summary.total_median_months
    );
    let result_js = build_summary_js(service.catalog(), &summary)?;
    serde_json::to_string_pretty(&result_js).context(SerializingSummarySnafu {})
}

pub fn run_results(
    service: &SurveyService,
    out: Option<&str>,
    check_summary_path: Option<&str>,
) -> SurveyResult<()> {
    let pretty_js_stats = pretty_summary(service)?;

    match out {
        None | Some("stdout") => println!("{}", pretty_js_stats),
        Some(path) => {
            fs::write(path, &pretty_js_stats).context(WritingOutputSnafu { path })?;
            info!("Summary written to {:?}", path);
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(SerializingSummarySnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }
    Ok(())
}

pub fn run_export(service: &SurveyService, out: &str) -> SurveyResult<()> {
    let snapshot = service.snapshot();
    if out == "stdout" {
        io_csv::write_voter_rows(&snapshot, service.catalog(), std::io::stdout(), out)
    } else {
        let file = fs::File::create(out).context(WritingOutputSnafu { path: out })?;
        io_csv::write_voter_rows(&snapshot, service.catalog(), file, out)?;
        info!("Exported {} answers to {:?}", snapshot.total_responses(), out);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::thread;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn catalog(n: usize) -> QuestionCatalog {
        let labels: Vec<String> = (0..n).map(|i| format!("Question {}", i)).collect();
        QuestionCatalog::new(&labels)
    }

    #[test]
    fn recorded_answers_survive_a_restart() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let service = SurveyService::open(catalog(2), &path).unwrap();
        assert_eq!(
            service.submit(0, "full", "10").unwrap(),
            Submission::Recorded {
                question_id: 0,
                sample_count: 1
            }
        );
        service.submit(0, "none", "20").unwrap();
        service.submit(1, "medium", "5").unwrap();

        let reopened = SurveyService::open(catalog(2), &path).unwrap();
        assert_eq!(reopened.snapshot(), service.snapshot());
        let summary = reopened.summary().unwrap();
        assert_eq!(summary.questions[0].median_months, 15.0);
        assert_eq!(summary.questions[0].divergence_months, 10);
        assert_eq!(summary.questions[0].median_confidence_score, 1.0);
        assert_eq!(summary.total_median_months, 20.0);
        assert_eq!(summary.participant_count, 2);
    }

    #[test]
    fn rejected_submission_does_not_save() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let service = SurveyService::open(catalog(2), &path).unwrap();
        let res = service.submit(0, "strong", "10").unwrap();
        assert_eq!(
            res,
            Submission::Rejected(RejectReason::UnknownConfidence("strong".to_string()))
        );
        assert!(!path.exists());
        assert_eq!(service.snapshot(), ResponseStore::initialize(2));
    }

    #[test]
    fn unknown_question_fails() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let service = SurveyService::open(catalog(2), &path).unwrap();
        let res = service.submit(99, "full", "10");
        assert!(matches!(
            res,
            Err(SurveyError::InvalidQuestion {
                source: SurveyErrors::InvalidQuestionId {
                    question_id: 99,
                    catalog_size: 2
                }
            })
        ));
        assert!(!path.exists());
        assert_eq!(service.snapshot(), ResponseStore::initialize(2));
    }

    #[test]
    fn failed_save_is_reported_and_not_kept() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("state.json");
        let service = SurveyService::open(catalog(1), &path).unwrap();
        let res = service.submit(0, "full", "10");
        assert!(matches!(res, Err(SurveyError::LockingState { .. })));
        assert_eq!(service.snapshot().total_responses(), 0);
    }

    #[test]
    fn two_services_on_the_same_file_keep_both_answers() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let first = SurveyService::open(catalog(2), &path).unwrap();
        let second = SurveyService::open(catalog(2), &path).unwrap();
        first.submit(0, "full", "10").unwrap();
        assert_eq!(
            second.submit(0, "none", "20").unwrap(),
            Submission::Recorded {
                question_id: 0,
                sample_count: 2
            }
        );

        let reopened = SurveyService::open(catalog(2), &path).unwrap();
        assert_eq!(
            reopened.snapshot().responses(0).unwrap(),
            &[
                Response {
                    confidence: Confidence::Full,
                    months: 10
                },
                Response {
                    confidence: Confidence::None,
                    months: 20
                }
            ]
        );
        assert_eq!(second.snapshot(), reopened.snapshot());
    }

    #[test]
    fn services_in_many_threads_share_the_file() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        thread::scope(|s| {
            for t in 0..4 {
                let path = &path;
                s.spawn(move || {
                    let service = SurveyService::open(catalog(1), path).unwrap();
                    for i in 0..5 {
                        service.submit(0, "full", &(t * 5 + i).to_string()).unwrap();
                    }
                });
            }
        });
        let reopened = SurveyService::open(catalog(1), &path).unwrap();
        assert_eq!(reopened.snapshot().total_responses(), 20);
    }

    #[test]
    fn summary_errors_are_named() {
        use snafu::IntoError;
        let source = serde_json::from_str::<JSValue>("{").unwrap_err();
        let e = SerializingSummarySnafu {}.into_error(source);
        assert_eq!(e.to_string(), "Error serializing the summary");
    }

    #[test]
    fn concurrent_submissions_are_all_kept() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let service = SurveyService::open(catalog(2), &path).unwrap();
        thread::scope(|s| {
            for t in 0..8 {
                let service = &service;
                s.spawn(move || {
                    for i in 0..10 {
                        let months = (t * 10 + i).to_string();
                        service.submit(t % 2, "medium", &months).unwrap();
                    }
                });
            }
        });
        let snap = service.snapshot();
        assert_eq!(snap.responses(0).unwrap().len(), 40);
        assert_eq!(snap.responses(1).unwrap().len(), 40);

        let reopened = SurveyService::open(catalog(2), &path).unwrap();
        assert_eq!(reopened.snapshot(), snap);
    }

    #[test]
    fn walk_drops_bad_answers_and_moves_on() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let service = SurveyService::open(catalog(3), &path).unwrap();
        let mut input = Cursor::new("full\n10\nstrong\n3\nmedium\r\n5\r\n");
        let mut out: Vec<u8> = Vec::new();
        let recorded = run_walk(&service, 0, &mut input, &mut out).unwrap();
        assert_eq!(recorded, 2);

        let snap = service.snapshot();
        assert_eq!(snap.responses(0).unwrap().len(), 1);
        assert!(snap.responses(1).unwrap().is_empty());
        assert_eq!(
            snap.responses(2).unwrap(),
            &[Response {
                confidence: Confidence::Medium,
                months: 5
            }]
        );
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[1/3] Question 0"));
        assert!(text.contains("[3/3] Question 2"));
        assert!(text.contains("\"totalMedianMonths\": 15.0"));
        assert!(text.contains("\"participantCount\": 1"));
    }

    #[test]
    fn walk_stops_at_end_of_input() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let service = SurveyService::open(catalog(3), dir.path().join("state.json")).unwrap();
        let mut input = Cursor::new("none\n1\nfull\n");
        let mut out: Vec<u8> = Vec::new();
        let recorded = run_walk(&service, 0, &mut input, &mut out).unwrap();
        assert_eq!(recorded, 1);
        assert_eq!(service.snapshot().total_responses(), 1);
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("totalMedianMonths"));
    }

    #[test]
    fn summary_json() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let service = SurveyService::open(catalog(2), dir.path().join("state.json")).unwrap();
        service.submit(0, "full", "10").unwrap();
        service.submit(0, "none", "20").unwrap();
        service.submit(1, "medium", "5").unwrap();
        let js = build_summary_js(service.catalog(), &service.summary().unwrap()).unwrap();
        assert_eq!(js["results"][0]["question"], json!("Question 0"));
        assert_eq!(js["results"][0]["medianMonths"], json!(15.0));
        assert_eq!(js["results"][0]["medianConfidence"], json!(1.0));
        assert_eq!(js["results"][0]["divergenceMonths"], json!(10));
        assert_eq!(js["results"][1]["sampleCount"], json!(1));
        assert_eq!(js["totalMedianMonths"], json!(20.0));
        assert_eq!(js["participantCount"], json!(2));
    }

    #[test]
    fn results_against_reference() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let service = SurveyService::open(catalog(2), dir.path().join("state.json")).unwrap();
        service.submit(1, "full", "7").unwrap();

        let out = dir.path().join("summary.json");
        let out_s = out.to_str().unwrap();
        run_results(&service, Some(out_s), None).unwrap();
        run_results(&service, Some(out_s), Some(out_s)).unwrap();

        let other = dir.path().join("other.json");
        fs::write(&other, "{\"results\": []}").unwrap();
        let res = run_results(&service, None, Some(other.to_str().unwrap()));
        assert!(matches!(res, Err(SurveyError::Whatever { .. })));
    }

    #[test]
    fn questions_are_listed_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let service = SurveyService::open(catalog(2), dir.path().join("state.json")).unwrap();
        let mut out: Vec<u8> = Vec::new();
        run_questions(&service, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0\tQuestion 0\n1\tQuestion 1\n"
        );
    }
}
