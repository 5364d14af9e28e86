//! Question intent classification via the generative service.
//!
//! One request with a single structured-output schema and a forced
//! invocation. Any failure - missing token, non-200, malformed arguments
//! - degrades to an analysis carrying only an error and no actions;
//! callers treat that as "no deterministic route available", never as a
//! crash.

use serde_json::json;
use solver_common::QuestionAnalysis;
use tracing::{info, warn};

use crate::ai_client::{ChatClient, FunctionSchema};

pub const ANALYSIS_FUNCTION_NAME: &str = "analyze_question";

const SYSTEM_PROMPT: &str = "You are an AI assistant that helps solve questions from a \
     graded data-science assignment. Your task is to analyze questions and determine \
     the best approach to solve them.";

/// The single function the service is forced to invoke.
pub fn analysis_schema() -> FunctionSchema {
    FunctionSchema {
        name: ANALYSIS_FUNCTION_NAME.to_string(),
        description: "Analyze an assignment question to determine the best approach to solve it"
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "question_type": {
                    "type": "string",
                    "description": "The type of question (e.g., 'csv_extraction', 'date_calculation', 'json_sorting', 'command_execution', 'json_processing', 'html_processing')"
                },
                "actions": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Actions needed to solve (e.g., ['process_file', 'specialized_calculation', 'execute_command', 'process_json'])"
                },
                "direct_answer": {
                    "type": "string",
                    "description": "If you know the exact answer, provide it here, otherwise leave empty"
                },
                "calculation_type": {
                    "type": "string",
                    "description": "For specialized calculations, the type (e.g., 'count_wednesdays', 'json_sorting', 'date_difference')"
                },
                "date_range": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "For date calculations, exactly two date strings"
                },
                "json_data": {
                    "type": "string",
                    "description": "For JSON operations, the JSON string"
                },
                "file_requirements": {
                    "type": "string",
                    "description": "Description of what to extract from the file"
                },
                "column_to_extract": {
                    "type": "string",
                    "description": "For CSV files, the name of the column to extract"
                },
                "command_to_execute": {
                    "type": "string",
                    "description": "For command execution questions, the command to run"
                }
            },
            "required": ["question_type", "actions"],
            "additionalProperties": false
        }),
    }
}

/// Build the analysis prompt embedding the question, the uploaded file's
/// name (not its content), and the catalog of recognized task families.
pub fn build_analysis_prompt(question: &str, file_name: Option<&str>) -> String {
    let mut prompt = String::from(
        "Please analyze this question from a graded assignment:\n\nQuestion: ",
    );
    prompt.push_str(question);
    prompt.push_str("\n\n");

    if let Some(name) = file_name {
        prompt.push_str(&format!("A file was uploaded named: {}\n\n", name));
    }

    prompt.push_str(
        "The question might involve various tasks including:\n\
         - Running commands (like npx, sha256sum) and reporting the output\n\
         - Extracting data from CSV files\n\
         - Counting dates (like Wednesdays between date ranges)\n\
         - Sorting JSON data\n\
         - Calculating file hashes\n\
         - Querying HTML with CSS selectors\n\
         - Finding information in specific columns\n\
         - Converting key-value pairs to JSON objects\n\n\
         Your task is to analyze the question and determine:\n\
         1. What type of question this is\n\
         2. What actions are needed to solve it\n\
         3. What specific calculations or extractions are needed\n\
         4. If you already know the exact answer, provide it\n\n\
         Pay special attention to questions involving command execution, like running \
         npx, prettier, or sha256sum. If the question mentions running a command on a \
         file, identify it as a command_execution type.\n\n\
         Also look for questions about multi-cursor operations, JSON conversions, or \
         anything involving jsonhash.\n\n\
         Be specific and precise in your analysis.\n",
    );

    prompt
}

/// Classify a question into a structured analysis. Never fails: every
/// error path yields a degraded analysis with empty actions.
pub async fn classify(
    client: &dyn ChatClient,
    question: &str,
    file_name: Option<&str>,
) -> QuestionAnalysis {
    let schema = analysis_schema();
    let prompt = build_analysis_prompt(question, file_name);

    match client.call_function(SYSTEM_PROMPT, &prompt, &schema).await {
        Ok(arguments) => match serde_json::from_value::<QuestionAnalysis>(arguments) {
            Ok(analysis) => {
                info!(
                    "Classified question: type={:?}, actions={}",
                    analysis.question_type,
                    analysis.actions.len()
                );
                analysis
            }
            Err(e) => {
                warn!("Failed to parse analysis arguments: {}", e);
                QuestionAnalysis::degraded(format!("Failed to parse AI response: {}", e))
            }
        },
        Err(e) => {
            warn!("Classification failed: {}", e);
            QuestionAnalysis::degraded(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai_client::{AiError, FakeChatClient};
    use solver_common::{AnalysisAction, QuestionKind};

    #[tokio::test]
    async fn test_classify_parses_structured_arguments() {
        let client = FakeChatClient::classifying(json!({
            "question_type": "date_calculation",
            "actions": ["specialized_calculation"],
            "calculation_type": "count_wednesdays",
            "date_range": ["2020-01-01", "2020-12-31"]
        }));

        let analysis = classify(&client, "How many Wednesdays?", None).await;
        assert_eq!(analysis.question_type, Some(QuestionKind::DateCalculation));
        assert!(analysis.has_action(AnalysisAction::SpecializedCalculation));
        assert_eq!(analysis.date_pair(), Some(("2020-01-01", "2020-12-31")));
        assert!(analysis.error.is_none());
    }

    #[tokio::test]
    async fn test_classify_degrades_on_service_error() {
        let client = FakeChatClient::new(vec![], vec![Err(AiError::Status(503))]);
        let analysis = classify(&client, "anything", None).await;
        assert!(analysis.actions.is_empty());
        assert!(analysis.error.as_deref().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_classify_degrades_on_malformed_arguments() {
        // A bare string is not an analysis object
        let client = FakeChatClient::classifying(json!("not an object"));
        let analysis = classify(&client, "anything", None).await;
        assert!(analysis.actions.is_empty());
        assert!(analysis.error.is_some());
    }

    #[test]
    fn test_prompt_embeds_question_and_file_name() {
        let prompt = build_analysis_prompt("Count the Wednesdays", Some("dates.txt"));
        assert!(prompt.contains("Count the Wednesdays"));
        assert!(prompt.contains("A file was uploaded named: dates.txt"));

        let prompt = build_analysis_prompt("Count the Wednesdays", None);
        assert!(!prompt.contains("A file was uploaded"));
    }

    #[test]
    fn test_schema_requires_type_and_actions() {
        let schema = analysis_schema();
        assert_eq!(schema.name, ANALYSIS_FUNCTION_NAME);
        let required = schema.parameters["required"].as_array().unwrap();
        assert!(required.contains(&json!("question_type")));
        assert!(required.contains(&json!("actions")));
    }
}
