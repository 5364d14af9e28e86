//! Structured question analysis - the classifier's output contract.
//!
//! The generative service is forced to invoke a single function whose
//! arguments deserialize into [`QuestionAnalysis`]. Category tags are
//! closed enums with an `Unrecognized` fallback so router dispatch stays
//! exhaustive even when the service invents a new label.

use serde::{Deserialize, Serialize};

/// Recognized question categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Extract a column value from a CSV file (possibly inside a ZIP)
    CsvExtraction,
    /// Count weekdays or compute day differences over a date range
    DateCalculation,
    /// Sort a JSON array embedded in the question
    JsonSorting,
    /// Run an allow-listed command pipeline over the uploaded file
    CommandExecution,
    /// Convert key=value pairs to JSON and hash the result
    JsonProcessing,
    /// Apply a CSS selector to HTML content
    HtmlProcessing,
    /// Anything the service labeled outside the known vocabulary
    #[serde(other)]
    Unrecognized,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CsvExtraction => "csv_extraction",
            Self::DateCalculation => "date_calculation",
            Self::JsonSorting => "json_sorting",
            Self::CommandExecution => "command_execution",
            Self::JsonProcessing => "json_processing",
            Self::HtmlProcessing => "html_processing",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// Actions the classifier can request, drawn from a fixed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisAction {
    ProcessFile,
    ExecuteCommand,
    ProcessJson,
    SpecializedCalculation,
    #[serde(other)]
    Unrecognized,
}

/// Specialized calculation variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationKind {
    CountWednesdays,
    JsonSorting,
    DateDifference,
    #[serde(other)]
    Unrecognized,
}

/// The classifier's structured output for one question.
///
/// `actions` is never null: a missing or malformed field deserializes to
/// an empty list, which downstream code reads as "no deterministic route
/// available". `date_range` is only meaningful when it holds exactly two
/// entries; [`QuestionAnalysis::date_pair`] enforces that.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionAnalysis {
    #[serde(default)]
    pub question_type: Option<QuestionKind>,

    #[serde(default)]
    pub actions: Vec<AnalysisAction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_answer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_type: Option<CalculationKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_data: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_requirements: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_to_extract: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_to_execute: Option<String>,

    /// Set when classification itself failed; the router continues with a
    /// degraded analysis instead of aborting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Extracted file content attached by the router's pre-processing
    /// stage, consumed by the finalizer prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_content: Option<String>,
}

impl QuestionAnalysis {
    /// Degraded analysis carrying only an error note and no actions.
    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn has_action(&self, action: AnalysisAction) -> bool {
        self.actions.contains(&action)
    }

    /// The date range, but only when it holds exactly two entries.
    pub fn date_pair(&self) -> Option<(&str, &str)> {
        match self.date_range.as_deref() {
            Some([start, end]) => Some((start.as_str(), end.as_str())),
            _ => None,
        }
    }

    /// Non-empty direct answer, if the classifier was confident.
    pub fn direct_answer(&self) -> Option<&str> {
        self.direct_answer
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_default_to_empty() {
        let analysis: QuestionAnalysis = serde_json::from_str("{}").unwrap();
        assert!(analysis.actions.is_empty());
        assert!(analysis.question_type.is_none());
    }

    #[test]
    fn test_unknown_tags_fall_back_to_unrecognized() {
        let analysis: QuestionAnalysis = serde_json::from_str(
            r#"{"question_type":"github_url","actions":["process_file","summon_demons"]}"#,
        )
        .unwrap();
        assert_eq!(analysis.question_type, Some(QuestionKind::Unrecognized));
        assert!(analysis.has_action(AnalysisAction::ProcessFile));
        assert!(analysis.has_action(AnalysisAction::Unrecognized));
    }

    #[test]
    fn test_date_pair_requires_exactly_two() {
        let mut analysis = QuestionAnalysis::default();
        assert!(analysis.date_pair().is_none());

        analysis.date_range = Some(vec!["2020-01-01".into()]);
        assert!(analysis.date_pair().is_none());

        analysis.date_range = Some(vec!["2020-01-01".into(), "2020-12-31".into()]);
        assert_eq!(analysis.date_pair(), Some(("2020-01-01", "2020-12-31")));

        analysis.date_range = Some(vec!["a".into(), "b".into(), "c".into()]);
        assert!(analysis.date_pair().is_none());
    }

    #[test]
    fn test_direct_answer_ignores_blank() {
        let mut analysis = QuestionAnalysis::default();
        analysis.direct_answer = Some("   ".into());
        assert!(analysis.direct_answer().is_none());

        analysis.direct_answer = Some("42".into());
        assert_eq!(analysis.direct_answer(), Some("42"));
    }

    #[test]
    fn test_degraded_carries_error_only() {
        let analysis = QuestionAnalysis::degraded("no token");
        assert_eq!(analysis.error.as_deref(), Some("no token"));
        assert!(analysis.actions.is_empty());
        assert!(analysis.direct_answer().is_none());
    }
}
