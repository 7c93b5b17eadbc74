pub use crate::config::*;
use crate::intake::validate_submission;
use crate::store::ResponseStore;

/// A builder for filling a store with raw submissions.
///
/// Submissions go through the same validation as the intake of the survey: malformed
/// ones are dropped and reported in the returned `Validation`.
///
/// ```
/// use survey_stats::builder::Builder;
/// # use survey_stats::{Confidence, Response, SurveyErrors};
///
/// let mut builder = Builder::new(2);
/// builder.add_submission(0, "full", "10")?;
/// builder.add_submission(0, "none", "20")?;
/// builder.add_submission(1, "strong", "5")?;
/// builder.add_response(1, Response { confidence: Confidence::Medium, months: 5 })?;
///
/// let store = builder.build();
/// assert_eq!(store.responses(0)?.len(), 2);
/// assert_eq!(store.responses(1)?, &[Response { confidence: Confidence::Medium, months: 5 }]);
///
/// # Ok::<(), SurveyErrors>(())
/// ```
pub struct Builder {
    pub(crate) _store: ResponseStore,
}

impl Builder {
    pub fn new(catalog_size: usize) -> Builder {
        Builder {
            _store: ResponseStore::initialize(catalog_size),
        }
    }

    /// Validates the raw fields and appends the response if they are valid.
    ///
    /// Only an unknown question id is an error. A rejected submission leaves the store untouched.
    pub fn add_submission(
        &mut self,
        question_id: QuestionId,
        confidence: &str,
        months: &str,
    ) -> Result<Validation, SurveyErrors> {
        // Same order as the intake: routing first, then the fields.
        self._store.responses(question_id)?;
        let validation = validate_submission(confidence, months);
        if let Validation::Valid(r) = validation {
            self._store.append(question_id, r)?;
        }
        Ok(validation)
    }

    /// Appends an already validated response.
    pub fn add_response(
        &mut self,
        question_id: QuestionId,
        response: Response,
    ) -> Result<(), SurveyErrors> {
        self._store.append(question_id, response)
    }

    pub fn build(self) -> ResponseStore {
        self._store
    }
}
