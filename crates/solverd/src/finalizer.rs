//! Answer finalization - the generative fallback plus reply cleanup.
//!
//! Builds a one-shot prompt merging the question with whatever context
//! the pipeline gathered (extracted file content, classifier error,
//! direct-answer hint), asks the service with deterministic sampling,
//! and strips the reply down to a single literal answer.

use solver_common::QuestionAnalysis;
use tracing::warn;

use crate::ai_client::ChatClient;

const SYSTEM_PROMPT: &str = "You are an AI assistant that helps solve questions from a \
     graded data-science assignment. Your answers should be concise, accurate, and \
     directly provide the solution without explanation.";

/// Line openers that mark meta-commentary to strip from replies.
const INTRO_PHRASES: &[&str] = &["here's", "to solve", "i'll", "let me", "first", "based on"];

/// Produce the final answer for a question with no deterministic route.
/// Failures degrade to a descriptive error string, never an escape.
pub async fn finalize(
    client: &dyn ChatClient,
    question: &str,
    analysis: &QuestionAnalysis,
) -> String {
    let prompt = build_final_prompt(question, analysis);

    match client.chat(SYSTEM_PROMPT, &prompt).await {
        Ok(reply) => extract_final_answer(&reply),
        Err(e) => {
            warn!("Finalize call failed: {}", e);
            e.to_string()
        }
    }
}

/// Build the finalize prompt from the question and gathered context.
pub fn build_final_prompt(question: &str, analysis: &QuestionAnalysis) -> String {
    let mut prompt = String::from("I need to solve this assignment question:\n\n");
    prompt.push_str(question);
    prompt.push_str("\n\n");

    if let Some(content) = analysis.file_content.as_deref() {
        if !content.is_empty() {
            prompt.push_str("Here is the content of the file:\n\n");
            prompt.push_str(content);
            prompt.push_str("\n\n");
        }
    }

    if let Some(error) = analysis.error.as_deref() {
        prompt.push_str(&format!(
            "Note: There was an issue during processing: {}\n\n",
            error
        ));
    }

    if let Some(kind) = analysis.question_type {
        prompt.push_str(&format!("This appears to be a {} question.\n\n", kind.as_str()));
    }

    if let Some(hint) = analysis.direct_answer() {
        prompt.push_str(&format!("Based on the analysis, the answer might be: {}\n\n", hint));
    }

    prompt.push_str(
        "Please provide ONLY the answer without any explanation. The answer should be \
         directly usable as a submission for the assignment question. Do not include \
         phrases like \"The answer is\" or \"Here's the answer\". Just provide the \
         exact answer.\n",
    );

    prompt
}

/// Clean a free-text reply down to one literal answer.
///
/// In order: (a) a labeled line like `Answer: ...` wins; (b) else fenced
/// code blocks are concatenated; (c) else leading meta-commentary lines
/// are stripped; (d) else the reply passes through untouched.
pub fn extract_final_answer(reply: &str) -> String {
    let reply = reply.trim();
    let lines: Vec<&str> = reply.lines().collect();

    for line in &lines {
        let lower = line.to_lowercase();
        if lower.starts_with("answer:")
            || lower.starts_with("the answer is:")
            || lower.starts_with("result:")
        {
            if let Some((_, rest)) = line.split_once(':') {
                return rest.trim().to_string();
            }
        }
    }

    if reply.contains("```") {
        let mut block_lines = Vec::new();
        let mut in_block = false;
        for line in &lines {
            if line.trim_start().starts_with("```") {
                in_block = !in_block;
                continue;
            }
            if in_block {
                block_lines.push(*line);
            }
        }
        if !block_lines.is_empty() {
            return block_lines.join("\n");
        }
    }

    let mut clean_lines = Vec::new();
    let mut started = false;
    for line in &lines {
        let lower = line.to_lowercase();
        if !started && INTRO_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
            continue;
        }
        started = true;
        clean_lines.push(*line);
    }

    if clean_lines.is_empty() {
        reply.to_string()
    } else {
        clean_lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai_client::{AiError, FakeChatClient};

    #[test]
    fn test_labeled_answer_line_wins() {
        assert_eq!(extract_final_answer("Answer: 42"), "42");
        assert_eq!(extract_final_answer("blah\nResult: test_answer\nmore"), "test_answer");
        assert_eq!(extract_final_answer("The answer is: x=1"), "x=1");
    }

    #[test]
    fn test_fenced_block_extracted() {
        let reply = "Sure thing:\n```json\n{\"a\":1}\n```\ndone";
        assert_eq!(extract_final_answer(reply), "{\"a\":1}");
    }

    #[test]
    fn test_multiple_blocks_concatenated() {
        let reply = "```\nline one\n```\ntext\n```\nline two\n```";
        assert_eq!(extract_final_answer(reply), "line one\nline two");
    }

    #[test]
    fn test_meta_commentary_stripped() {
        let reply = "Let me work this out.\n1360";
        assert_eq!(extract_final_answer(reply), "1360");
    }

    #[test]
    fn test_plain_reply_untouched() {
        assert_eq!(extract_final_answer("  1360  "), "1360");
    }

    #[test]
    fn test_all_commentary_falls_back_to_reply() {
        let reply = "Let me think";
        assert_eq!(extract_final_answer(reply), "Let me think");
    }

    #[test]
    fn test_prompt_merges_context() {
        let mut analysis = QuestionAnalysis::default();
        analysis.file_content = Some("k=v".into());
        analysis.error = Some("classifier timeout".into());
        analysis.question_type = Some(solver_common::QuestionKind::JsonProcessing);
        analysis.direct_answer = Some("maybe-this".into());

        let prompt = build_final_prompt("What is the hash?", &analysis);
        assert!(prompt.contains("What is the hash?"));
        assert!(prompt.contains("Here is the content of the file:\n\nk=v"));
        assert!(prompt.contains("issue during processing: classifier timeout"));
        assert!(prompt.contains("a json_processing question"));
        assert!(prompt.contains("the answer might be: maybe-this"));
        assert!(prompt.contains("ONLY the answer"));
    }

    #[tokio::test]
    async fn test_finalize_degrades_to_error_string() {
        let client = FakeChatClient::new(vec![Err(AiError::Status(500))], vec![]);
        let answer = finalize(&client, "q", &QuestionAnalysis::default()).await;
        assert!(answer.contains("Status 500"));
    }

    #[tokio::test]
    async fn test_finalize_cleans_reply() {
        let client = FakeChatClient::new(vec![Ok("Answer: 7".into())], vec![]);
        let answer = finalize(&client, "q", &QuestionAnalysis::default()).await;
        assert_eq!(answer, "7");
    }
}
