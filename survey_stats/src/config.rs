// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// Index of a question in the catalog. Dense, starting at zero.
pub type QuestionId = usize;

/// How confident a voter is in their estimate.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Confidence {
    None,
    Medium,
    Full,
}

impl Confidence {
    pub const ALL: [Confidence; 3] = [Confidence::None, Confidence::Medium, Confidence::Full];

    /// The label used on the submission forms and in the state file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::None => "none",
            Confidence::Medium => "medium",
            Confidence::Full => "full",
        }
    }

    /// Parses one of the recognized labels. Matching is exact: "Full" or " full" are not labels.
    pub fn from_label(label: &str) -> Option<Confidence> {
        Confidence::ALL.iter().find(|c| c.as_str() == label).cloned()
    }
}

impl Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The answer of one voter to one question.
/// There is no voter identity: the position in the store is the only ordering.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct Response {
    pub confidence: Confidence,
    pub months: u64,
}

/// Why a raw submission was not turned into a response.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RejectReason {
    /// The confidence field is missing or not one of the known labels.
    UnknownConfidence(String),
    /// The months field is not a non-negative integer.
    InvalidMonths(String),
}

impl Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::UnknownConfidence(s) => write!(f, "unknown confidence label {:?}", s),
            RejectReason::InvalidMonths(s) => write!(f, "months is not a non-negative integer: {:?}", s),
        }
    }
}

/// The outcome of validating a raw submission.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Validation {
    Valid(Response),
    Rejected(RejectReason),
}

// ******** Output data structures *********

/// Statistics for one question.
#[derive(PartialEq, Debug, Clone)]
pub struct QuestionSummary {
    pub question_id: QuestionId,
    /// Median of the months. 0 when nobody answered.
    pub median_months: f64,
    /// Median of the confidence scores (none=0, medium=1, full=2). 0 when nobody answered.
    pub median_confidence_score: f64,
    /// max - min of the months. 0 when nobody answered.
    pub divergence_months: u64,
    pub sample_count: usize,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SurveySummary {
    /// One entry per question, in catalog order.
    pub questions: Vec<QuestionSummary>,
    pub total_median_months: f64,
    /// Number of responses to the first question.
    ///
    /// This approximates the number of voters: anyone who skipped the first question,
    /// or any question collecting more answers than the first one, makes it drift.
    pub participant_count: usize,
}

/// One bar of a per-voter chart.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct VoterPoint {
    /// Arrival order of the response for this question, starting at 0.
    pub voter: usize,
    pub months: u64,
    pub confidence: Confidence,
    pub confidence_score: u32,
}

/// Errors that prevent an operation on the store or the catalog.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SurveyErrors {
    InvalidQuestionId {
        question_id: QuestionId,
        catalog_size: usize,
    },
}

impl Error for SurveyErrors {}

impl Display for SurveyErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurveyErrors::InvalidQuestionId {
                question_id,
                catalog_size,
            } => write!(
                f,
                "question id {} is outside the catalog (size {})",
                question_id, catalog_size
            ),
        }
    }
}
