// Primitives for writing CSV files.

use std::io;

use csv::Writer;

use crate::survey::*;

/// Writes one row per recorded answer: question id, question, voter index, confidence,
/// confidence score and months. Rows follow the catalog order, then the arrival order.
///
/// `path` only names the destination in error messages.
pub fn write_voter_rows<W: io::Write>(
    store: &ResponseStore,
    catalog: &QuestionCatalog,
    out: W,
    path: &str,
) -> SurveyResult<()> {
    let mut wtr = Writer::from_writer(out);
    wtr.write_record([
        "question_id",
        "question",
        "voter",
        "confidence",
        "confidence_score",
        "months",
    ])
    .context(WritingCsvSnafu { path })?;

    for (qid, label) in catalog.iter() {
        let series = voter_series(store, qid).context(InvalidQuestionSnafu {})?;
        debug!("write_voter_rows: question {}: {} rows", qid, series.len());
        for p in series {
            wtr.write_record(&[
                qid.to_string(),
                label.to_string(),
                p.voter.to_string(),
                p.confidence.as_str().to_string(),
                p.confidence_score.to_string(),
                p.months.to_string(),
            ])
            .context(WritingCsvSnafu { path })?;
        }
    }
    wtr.flush().context(WritingOutputSnafu { path })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_in_catalog_then_arrival_order() {
        let catalog = QuestionCatalog::new(&["Feeds".to_string(), "Fees, other".to_string()]);
        let mut store = ResponseStore::initialize(2);
        store
            .append(
                1,
                Response {
                    confidence: Confidence::Full,
                    months: 3,
                },
            )
            .unwrap();
        store
            .append(
                0,
                Response {
                    confidence: Confidence::None,
                    months: 12,
                },
            )
            .unwrap();
        store
            .append(
                1,
                Response {
                    confidence: Confidence::Medium,
                    months: 6,
                },
            )
            .unwrap();

        let mut buf: Vec<u8> = Vec::new();
        write_voter_rows(&store, &catalog, &mut buf, "memory").unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "question_id,question,voter,confidence,confidence_score,months",
                "0,Feeds,0,none,0,12",
                "1,\"Fees, other\",0,full,2,3",
                "1,\"Fees, other\",1,medium,1,6",
            ]
        );
    }

    #[test]
    fn header_only_when_empty() {
        let catalog = QuestionCatalog::new(&["Feeds".to_string()]);
        let store = ResponseStore::initialize(1);
        let mut buf: Vec<u8> = Vec::new();
        write_voter_rows(&store, &catalog, &mut buf, "memory").unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "question_id,question,voter,confidence,confidence_score,months\n"
        );
    }
}
