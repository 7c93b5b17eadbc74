// Reading and writing the survey state file.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize, Serializer};
use tempfile::NamedTempFile;

use crate::survey::*;

/// The answers to one question, as stored in the file.
/// The two lists are aligned: index i of both is the answer of the same voter.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct PersistedQuestion {
    confidence: Vec<String>,
    months: Vec<u64>,
}

// Writes the questions as a map keyed by the stringified id, in id order.
struct PersistedState<'a>(&'a ResponseStore);

impl<'a> Serialize for PersistedState<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(qid, responses)| {
            let pq = PersistedQuestion {
                confidence: responses
                    .iter()
                    .map(|r| r.confidence.as_str().to_string())
                    .collect(),
                months: responses.iter().map(|r| r.months).collect(),
            };
            (qid.to_string(), pq)
        }))
    }
}

/// Loads the store from the state file.
///
/// A missing file is an empty survey. Questions absent from the file start empty.
/// Anything that cannot be read back exactly is an error: starting empty would drop the history.
pub fn load_state(path: &Path, catalog_size: usize) -> SurveyResult<ResponseStore> {
    let path_s = path.display().to_string();
    // Only a path with nothing at all behind it is a new survey. A dangling link or a
    // directory that cannot be searched is reported.
    match fs::symlink_metadata(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No state file at {:?}, starting an empty survey", path_s);
            return Ok(ResponseStore::initialize(catalog_size));
        }
        res => {
            res.context(OpeningStateSnafu { path: &path_s })?;
        }
    }
    let contents = fs::read_to_string(path).context(OpeningStateSnafu { path: &path_s })?;
    let parsed: BTreeMap<String, PersistedQuestion> =
        serde_json::from_str(contents.as_str()).context(ParsingStateSnafu { path: &path_s })?;

    let mut questions: Vec<Vec<Response>> = vec![Vec::new(); catalog_size];
    for (key, pq) in parsed {
        let question_id = parse_question_key(&key).context(InvalidStateKeySnafu {
            key: &key,
            path: &path_s,
        })?;
        ensure!(
            question_id < catalog_size,
            QuestionOutOfCatalogSnafu {
                question_id,
                catalog_size,
                path: &path_s
            }
        );
        ensure!(
            pq.confidence.len() == pq.months.len(),
            MisalignedStateSnafu {
                question_id,
                confidences: pq.confidence.len(),
                months: pq.months.len(),
                path: &path_s
            }
        );
        let mut seq: Vec<Response> = Vec::with_capacity(pq.months.len());
        for (label, months) in pq.confidence.iter().zip(pq.months.iter()) {
            let confidence =
                Confidence::from_label(label).context(UnknownConfidenceInStateSnafu {
                    question_id,
                    label,
                    path: &path_s,
                })?;
            seq.push(Response {
                confidence,
                months: *months,
            });
        }
        debug!("load_state: question {}: {} answers", question_id, seq.len());
        questions[question_id] = seq;
    }
    ResponseStore::from_sequences(questions, catalog_size).context(InvalidQuestionSnafu {})
}

/// Writes the full store to the state file.
///
/// The content goes to a uniquely named temporary file next to the state file, which then
/// replaces it, so a crash during the write leaves the previous state intact. The temporary
/// file is removed if anything fails.
pub fn save_state(store: &ResponseStore, path: &Path) -> SurveyResult<()> {
    let bytes = serde_json::to_vec(&PersistedState(store)).context(SerializingStateSnafu {})?;

    let dir = parent_dir(path);
    let dir_s = dir.display().to_string();
    let mut tmp = NamedTempFile::new_in(dir).context(WritingStateSnafu { path: &dir_s })?;
    let tmp_s = tmp.path().display().to_string();
    tmp.write_all(&bytes)
        .context(WritingStateSnafu { path: &tmp_s })?;
    tmp.as_file()
        .sync_all()
        .context(WritingStateSnafu { path: &tmp_s })?;

    tmp.persist(path)
        .map_err(|e| e.error)
        .context(WritingStateSnafu {
            path: path.display().to_string(),
        })?;
    debug!(
        "save_state: {} answers written to {:?}",
        store.total_responses(),
        path
    );
    Ok(())
}

/// An exclusive lock on the state file, shared by all the processes using it.
/// Released when dropped.
pub struct StateLock {
    file: fs::File,
    path: PathBuf,
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!("Error unlocking {:?}: {}", self.path, e);
        }
    }
}

/// Waits until no other process holds the lock of the state file, then takes it.
///
/// The lock lives on a `<state>.lock` file next to the state file: the state file itself
/// is replaced on every save.
pub fn lock_state(path: &Path) -> SurveyResult<StateLock> {
    let lock_path = lock_path(path);
    let lock_s = lock_path.display().to_string();
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .open(&lock_path)
        .context(LockingStateSnafu { path: &lock_s })?;
    file.lock_exclusive()
        .context(LockingStateSnafu { path: &lock_s })?;
    debug!("lock_state: holding {:?}", lock_s);
    Ok(StateLock {
        file,
        path: lock_path,
    })
}

fn lock_path(path: &Path) -> PathBuf {
    let mut p = path.to_path_buf().into_os_string();
    p.push(".lock");
    PathBuf::from(p)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

// Only canonical decimal integers: "0", "7", "12". Not "-1", "+1", "01" or " 1".
fn parse_question_key(key: &str) -> Option<QuestionId> {
    let canonical = key == "0"
        || (!key.is_empty()
            && !key.starts_with('0')
            && key.chars().all(|c| c.is_ascii_digit()));
    if canonical {
        key.parse::<QuestionId>().ok()
    } else {
        None
    }
}
