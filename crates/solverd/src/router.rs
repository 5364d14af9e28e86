//! Question router - the pipeline core.
//!
//! Fixed evaluation order per request, first match wins unless noted:
//!
//! 1. Literal short-circuit: format-then-hash command combo
//! 2. Literal short-circuit: key=value conversion + hash combo
//! 3. Classification (always proceeds, even degraded)
//! 4. File pre-processing (attaches content, never terminal)
//! 5. Command dispatch (terminal)
//! 6. Structured-processing dispatch (terminal)
//! 7. Specialized calculations (terminal on match, else fall through)
//! 8. Direct-answer shortcut
//! 9. Generative fallback
//!
//! Literal short-circuits pre-empt classification so well-known phrasings
//! survive misclassification; deterministic handlers pre-empt the
//! generative fallback whenever their preconditions hold.

use std::sync::Arc;
use tracing::{info, warn};

use solver_common::{AnalysisAction, CalculationKind, QuestionAnalysis, QuestionKind};

use crate::ai_client::ChatClient;
use crate::classifier;
use crate::config::SolverConfig;
use crate::files::{self, StagedUpload};
use crate::finalizer;
use crate::handlers::{command, csv, date, hash, json, keyvalue};

/// Routes one question through short-circuits, classification,
/// deterministic handlers, and the generative fallback.
///
/// Holds only the immutable process-wide configuration and the service
/// client; nothing is shared mutably across concurrent requests.
pub struct QuestionRouter {
    config: Arc<SolverConfig>,
    client: Arc<dyn ChatClient>,
}

impl QuestionRouter {
    pub fn new(config: Arc<SolverConfig>, client: Arc<dyn ChatClient>) -> Self {
        Self { config, client }
    }

    /// Answer a question, optionally with a staged upload. Never fails:
    /// every failure path produces an answer string describing it.
    pub async fn answer(&self, question: &str, upload: Option<&StagedUpload>) -> String {
        let q = question.to_lowercase();

        // 1. Format-then-hash combo bypasses classification entirely
        if let Some(upload) = upload {
            if q.contains("npx") && q.contains("prettier") && q.contains("sha256sum") {
                info!("Short-circuit: prettier | sha256sum pipeline");
                return command::prettier_sha256(upload).await;
            }
        }

        // 2. key=value conversion + hash combo
        if let Some(upload) = upload {
            if q.contains("multi-cursor")
                && q.contains("json")
                && (q.contains("jsonhash") || q.contains("hash"))
            {
                info!("Short-circuit: key=value to JSON hash");
                return self.keyvalue_hash(upload).await;
            }
        }

        // 3. Classify - proceeds even when degraded
        let mut analysis =
            classifier::classify(self.client.as_ref(), question, upload.map(|u| u.name())).await;
        if let Some(error) = analysis.error.as_deref() {
            warn!("Continuing with degraded analysis: {}", error);
        }

        // 4. File pre-processing attaches extracted content for later
        // prompts; it never terminates the pipeline by itself
        if let Some(upload) = upload {
            if analysis.has_action(AnalysisAction::ProcessFile) {
                if let Some(content) = self.process_file(upload, &analysis) {
                    analysis.file_content = Some(content);
                }
            }
        }

        // 5. Command dispatch - terminal
        if analysis.has_action(AnalysisAction::ExecuteCommand) {
            info!("Dispatch: restricted command pipeline");
            return command::process_command_question(question, upload).await;
        }

        // 6. Structured-processing dispatch - terminal
        if analysis.has_action(AnalysisAction::ProcessJson) {
            if let Some(upload) = upload {
                if q.contains("multi-cursor") && q.contains("jsonhash") {
                    info!("Dispatch: key=value to JSON hash");
                    return self.keyvalue_hash(upload).await;
                }
            }
        }

        // 7. Specialized calculations - terminal when their parameters
        // check out, otherwise fall through to the generative paths
        if analysis.has_action(AnalysisAction::SpecializedCalculation) {
            match analysis.calculation_type {
                Some(CalculationKind::CountWednesdays) => {
                    if let Some((start, end)) = analysis.date_pair() {
                        info!("Dispatch: Wednesday count");
                        return date::count_wednesdays(start, end);
                    }
                }
                Some(CalculationKind::DateDifference) => {
                    if let Some((a, b)) = analysis.date_pair() {
                        info!("Dispatch: date difference");
                        return date::date_diff(a, b);
                    }
                }
                Some(CalculationKind::JsonSorting) => {
                    if let Some(json_str) = analysis.json_data.as_deref() {
                        info!("Dispatch: JSON sort");
                        return json::sort_json(json_str);
                    }
                }
                _ => {}
            }
        }

        // 8. Direct answer from the classifier
        if let Some(direct) = analysis.direct_answer() {
            info!("Dispatch: direct answer");
            return direct.to_string();
        }

        // 9. Generative fallback - the catch-all
        info!("Dispatch: generative fallback");
        finalizer::finalize(self.client.as_ref(), question, &analysis).await
    }

    /// File-type-specific extraction: CSV/ZIP column lookup when the
    /// question was classified that way, raw truncated text otherwise.
    fn process_file(&self, upload: &StagedUpload, analysis: &QuestionAnalysis) -> Option<String> {
        if analysis.question_type == Some(QuestionKind::CsvExtraction)
            && matches!(
                files::detect_kind(upload.path()),
                files::FileKind::Archive | files::FileKind::Csv
            )
        {
            let column = analysis.column_to_extract.as_deref().unwrap_or("answer");
            return Some(csv::extract_from_file(upload.path(), column));
        }

        match files::read_text_truncated(upload.path(), self.config.files.max_embed_len) {
            Ok(content) => Some(content),
            Err(e) => Some(format!("Error reading file: {}", e)),
        }
    }

    /// Combo handler: convert key=value lines to JSON, then hash the
    /// normalized serialization.
    async fn keyvalue_hash(&self, upload: &StagedUpload) -> String {
        let json_string = keyvalue::convert_file(upload.path());
        if json_string.starts_with("Error") {
            return json_string;
        }
        hash::json_hash(&json_string, &self.config.hash_service).await
    }
}
