pub mod builder;
pub mod catalog;
mod config;
mod intake;
pub mod manual;
pub mod store;

use log::{debug, info};

pub use crate::catalog::QuestionCatalog;
pub use crate::config::*;
pub use crate::intake::validate_submission;
pub use crate::store::ResponseStore;

/// Numeric encoding of a confidence level: none=0, medium=1, full=2.
pub fn confidence_to_score(c: Confidence) -> u32 {
    match c {
        Confidence::None => 0,
        Confidence::Medium => 1,
        Confidence::Full => 2,
    }
}

/// The median of the values.
///
/// For an even number of values, the average of the two middle values.
/// The median of an empty sequence is 0, so that a question without answers still has a bar.
pub fn median_of(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid] as f64
    } else {
        // Both halves are converted first, the sum of two u64 may not fit.
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    }
}

/// Computes the statistics of a single question.
pub fn per_question(
    store: &ResponseStore,
    question_id: QuestionId,
) -> Result<QuestionSummary, SurveyErrors> {
    let responses = store.responses(question_id)?;
    let months: Vec<u64> = responses.iter().map(|r| r.months).collect();
    let scores: Vec<u64> = responses
        .iter()
        .map(|r| confidence_to_score(r.confidence) as u64)
        .collect();

    let divergence_months = match (months.iter().max(), months.iter().min()) {
        (Some(max), Some(min)) => max - min,
        _ => 0,
    };

    let res = QuestionSummary {
        question_id,
        median_months: median_of(&months),
        median_confidence_score: median_of(&scores),
        divergence_months,
        sample_count: months.len(),
    };
    debug!("per_question: {:?}", res);
    Ok(res)
}

/// Computes the statistics of every question of the catalog, and the survey-wide figures.
///
/// Arguments:
/// * `store` the responses. It must hold a sequence for every question of the catalog.
/// * `catalog` the questions, which define the order of the results.
pub fn overall(
    store: &ResponseStore,
    catalog: &QuestionCatalog,
) -> Result<SurveySummary, SurveyErrors> {
    info!(
        "Aggregating {} responses over {} questions",
        store.total_responses(),
        catalog.size()
    );
    let mut questions: Vec<QuestionSummary> = Vec::new();
    for (qid, _) in catalog.iter() {
        questions.push(per_question(store, qid)?);
    }
    let total_median_months: f64 = questions.iter().map(|q| q.median_months).sum();
    let participant_count = questions.first().map(|q| q.sample_count).unwrap_or(0);
    Ok(SurveySummary {
        questions,
        total_median_months,
        participant_count,
    })
}

/// The responses of a question, one point per voter in arrival order.
pub fn voter_series(
    store: &ResponseStore,
    question_id: QuestionId,
) -> Result<Vec<VoterPoint>, SurveyErrors> {
    let responses = store.responses(question_id)?;
    Ok(responses
        .iter()
        .enumerate()
        .map(|(voter, r)| VoterPoint {
            voter,
            months: r.months,
            confidence: r.confidence,
            confidence_score: confidence_to_score(r.confidence),
        })
        .collect())
}
