use log::debug;

use crate::config::{QuestionId, Response, SurveyErrors};

/// The recorded responses, one sequence per question.
///
/// Invariant: there is exactly one sequence per question of the catalog the store was
/// built for, so any id in `0..len()` has a (possibly empty) sequence.
/// Within a sequence, responses are kept in arrival order.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ResponseStore {
    questions: Vec<Vec<Response>>,
}

impl ResponseStore {
    /// An empty store with one sequence per question id in `0..catalog_size`.
    pub fn initialize(catalog_size: usize) -> ResponseStore {
        ResponseStore {
            questions: vec![Vec::new(); catalog_size],
        }
    }

    /// Builds a store from existing sequences, indexed by question id.
    /// Missing trailing questions are filled with empty sequences up to `catalog_size`.
    ///
    /// Fails if there are more sequences than questions in the catalog.
    pub fn from_sequences(
        mut questions: Vec<Vec<Response>>,
        catalog_size: usize,
    ) -> Result<ResponseStore, SurveyErrors> {
        if questions.len() > catalog_size {
            return Err(SurveyErrors::InvalidQuestionId {
                question_id: questions.len() - 1,
                catalog_size,
            });
        }
        questions.resize(catalog_size, Vec::new());
        Ok(ResponseStore { questions })
    }

    /// Appends a response at the end of the sequence of the question.
    ///
    /// The store does not persist anything: saving after a successful append is the job
    /// of the caller.
    pub fn append(
        &mut self,
        question_id: QuestionId,
        response: Response,
    ) -> Result<(), SurveyErrors> {
        let catalog_size = self.questions.len();
        let seq = self
            .questions
            .get_mut(question_id)
            .ok_or(SurveyErrors::InvalidQuestionId {
                question_id,
                catalog_size,
            })?;
        seq.push(response);
        debug!(
            "append: question {}: {:?} (now {} responses)",
            question_id,
            response,
            seq.len()
        );
        Ok(())
    }

    /// A copy of the current state, for readers that must not hold on to the live store.
    pub fn snapshot(&self) -> ResponseStore {
        self.clone()
    }

    pub fn responses(&self, question_id: QuestionId) -> Result<&[Response], SurveyErrors> {
        self.questions
            .get(question_id)
            .map(|v| v.as_slice())
            .ok_or(SurveyErrors::InvalidQuestionId {
                question_id,
                catalog_size: self.questions.len(),
            })
    }

    /// The (question id, responses) pairs in question order.
    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, &[Response])> {
        self.questions
            .iter()
            .enumerate()
            .map(|(idx, v)| (idx, v.as_slice()))
    }

    /// The number of questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn total_responses(&self) -> usize {
        self.questions.iter().map(|v| v.len()).sum()
    }
}
