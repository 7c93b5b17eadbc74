use crate::config::{QuestionId, SurveyErrors};

/// The questions asked by the built-in survey, in the order they are presented.
pub const BUILTIN_QUESTIONS: &[&str] = &[
    "Feeds interface",
    "EMEA Aggregation rules",
    "EOD Timers",
    "BATS ETR Liknk",
    "EMEA In-memory cache",
    "Figuration fee engine",
    "Gloss HK interface",
    "Core Client UI Actions",
    "Firm block processing",
    "Tiger client leg",
    "Client static enrichment",
    "Comission/Fees",
    "Confirms",
    "APAC CTM",
    "Financial fees",
    "Client file loader",
    "Apac in memory cache",
    "US Pre allocations methods",
    "US CTM",
    "Power principal",
    "Back2back legs",
    "Bonds",
    "Options/OCC",
    "US in-memory cache",
    "Power client leg",
    "Ops checks",
    "Give-up",
    "Brokers2Custody",
    "EMEA block reshaping",
    "Gloss HK",
    "OTA",
    "Gloss JP",
    "APAC boocking model",
    "SOPA",
    "KOSMOS",
    "TRIANA",
    "Dolphin feed",
    "Power hedge booking",
    "Done with",
    "GBA tech debt (<5) 2028",
    "APAC TRIANA",
    "APAC Donw away",
    "Transparency reporting",
    "LSA",
    "Done away",
    "Rebalancing",
    "APAC client gloss JP",
    "FX exposure Mgt",
    "D1 Integration",
    "Apac client japan Rebalancinfg",
    "Shell swap",
    "Option delta",
    "Risk checks",
    "GBA tech debt <5 2030",
    "FIX post allocations",
];

/// The ordered list of question labels.
///
/// The position of a label is its question id. The catalog never changes after construction.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct QuestionCatalog {
    labels: Vec<String>,
}

impl QuestionCatalog {
    pub fn new(labels: &[String]) -> QuestionCatalog {
        QuestionCatalog {
            labels: labels.to_vec(),
        }
    }

    pub fn builtin() -> QuestionCatalog {
        QuestionCatalog {
            labels: BUILTIN_QUESTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn label_of(&self, question_id: QuestionId) -> Result<&str, SurveyErrors> {
        self.labels
            .get(question_id)
            .map(|s| s.as_str())
            .ok_or(SurveyErrors::InvalidQuestionId {
                question_id,
                catalog_size: self.labels.len(),
            })
    }

    /// The (id, label) pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, &str)> {
        self.labels.iter().enumerate().map(|(idx, s)| (idx, s.as_str()))
    }
}
