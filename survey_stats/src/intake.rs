use log::debug;

use crate::config::{Confidence, RejectReason, Response, Validation};

/// Checks the raw fields of a submission.
///
/// The confidence must be exactly one of the labels `none`, `medium`, `full`.
/// The months must be made of ASCII digits only (no sign, no spaces) and fit in a `u64`.
pub fn validate_submission(confidence: &str, months: &str) -> Validation {
    let conf = match Confidence::from_label(confidence) {
        Some(c) => c,
        None => {
            debug!("validate_submission: rejected confidence {:?}", confidence);
            return Validation::Rejected(RejectReason::UnknownConfidence(confidence.to_string()));
        }
    };
    let months_parsed = if !months.is_empty() && months.chars().all(|c| c.is_ascii_digit()) {
        months.parse::<u64>().ok()
    } else {
        None
    };
    match months_parsed {
        Some(m) => Validation::Valid(Response {
            confidence: conf,
            months: m,
        }),
        None => {
            debug!("validate_submission: rejected months {:?}", months);
            Validation::Rejected(RejectReason::InvalidMonths(months.to_string()))
        }
    }
}
