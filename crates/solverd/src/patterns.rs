//! Literal pattern extraction from question text.
//!
//! Each task family has an ordered list of regex templates; the first
//! template that matches wins, even when a later one would also match.
//! Declaration order IS the tie-break - callers and tests rely on it, so
//! do not reorder or "fix" these to most-specific-first.

use once_cell::sync::Lazy;
use regex::Regex;

/// Command clause templates. Capture runs from the trigger word up to a
/// literal "What", so the trailing question clause is not swallowed. This
/// terminator is a known fragility of the recognized phrasings and is
/// kept deliberately.
static COMMAND_TEMPLATES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)run\s+([\w\s\-@.|\d]+)\.\s+What").unwrap(),
        Regex::new(r"(?i)execute\s+([\w\s\-@.|\d]+)\.\s+What").unwrap(),
        Regex::new(r"(?i)command[:\s]+([\w\s\-@.|\d]+)\.\s+What").unwrap(),
    ]
});

/// Date range templates, most common format first.
static DATE_RANGE_TEMPLATES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(\d{4}-\d{2}-\d{2})\s+to\s+(\d{4}-\d{2}-\d{2})").unwrap(),
        Regex::new(r"(\d{1,2}/\d{1,2}/\d{4})\s+to\s+(\d{1,2}/\d{1,2}/\d{4})").unwrap(),
        Regex::new(r"([A-Z][a-z]+ \d{1,2}, \d{4})\s+to\s+([A-Z][a-z]+ \d{1,2}, \d{4})").unwrap(),
    ]
});

/// JSON payload templates: fenced block, then bare array, then bare object.
static JSON_BLOCK_TEMPLATES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"```(?:json)?\s*([\[{][\s\S]*?[\]}])\s*```").unwrap(),
        Regex::new(r"(\[\s*\{[\s\S]*?\}\s*\])").unwrap(),
        Regex::new(r"(\{[\s\S]*?\})").unwrap(),
    ]
});

static CSS_SELECTOR_TEMPLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)selector\s+[`"']?([^\s`"']+)[`"']?"#).unwrap());

static CSS_ATTRIBUTE_TEMPLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)attribute\s+[`"']?([\w-]+)"#).unwrap());

/// First matching template wins; returns its first capture group.
fn extract_first<'t>(text: &'t str, templates: &[Regex]) -> Option<regex::Captures<'t>> {
    templates.iter().find_map(|re| re.captures(text))
}

/// Extract the command clause and split it into pipeline stages.
pub fn extract_command_stages(question: &str) -> Option<Vec<String>> {
    let caps = extract_first(question, &COMMAND_TEMPLATES)?;
    let clause = caps.get(1)?.as_str().trim();

    let stages: Vec<String> = clause
        .split('|')
        .map(|stage| stage.trim().to_string())
        .filter(|stage| !stage.is_empty())
        .collect();

    if stages.is_empty() {
        None
    } else {
        Some(stages)
    }
}

/// Extract a (start, end) date range in any supported format.
pub fn extract_date_range(question: &str) -> Option<(String, String)> {
    let caps = extract_first(question, &DATE_RANGE_TEMPLATES)?;
    Some((caps.get(1)?.as_str().to_string(), caps.get(2)?.as_str().to_string()))
}

/// Extract an embedded JSON payload (array preferred over object).
pub fn extract_json_block(question: &str) -> Option<String> {
    let caps = extract_first(question, &JSON_BLOCK_TEMPLATES)?;
    Some(caps.get(1)?.as_str().to_string())
}

/// Extract a CSS selector and optional attribute name.
pub fn extract_css_selector(question: &str) -> Option<(String, Option<String>)> {
    let selector = CSS_SELECTOR_TEMPLATE
        .captures(question)?
        .get(1)?
        .as_str()
        .to_string();
    let attribute = CSS_ATTRIBUTE_TEMPLATE
        .captures(question)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());
    Some((selector, attribute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_run_clause() {
        let stages = extract_command_stages(
            "Download README.md and run npx -y prettier@3.4.2 README.md | sha256sum. \
             What is the output of the command?",
        )
        .unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0], "npx -y prettier@3.4.2 README.md");
        assert_eq!(stages[1], "sha256sum");
    }

    #[test]
    fn test_command_single_stage() {
        let stages =
            extract_command_stages("Please execute sha256sum data.txt. What do you get?").unwrap();
        assert_eq!(stages, vec!["sha256sum data.txt"]);
    }

    #[test]
    fn test_command_requires_what_terminator() {
        // Without the terminator the clause is unrecognized - acknowledged
        // limitation of the supported phrasings.
        assert!(extract_command_stages("run sha256sum data.txt and tell me").is_none());
    }

    #[test]
    fn test_first_template_wins() {
        // Both the "execute" and "run" templates match here; the "run"
        // template is declared first, so its capture wins even though the
        // "execute" clause appears earlier in the text.
        let q = "execute echo b. What? Also run echo a. What else?";
        let stages = extract_command_stages(q).unwrap();
        assert_eq!(stages, vec!["echo a"]);
    }

    #[test]
    fn test_date_range_iso() {
        let (start, end) =
            extract_date_range("How many Wednesdays in 1985-09-10 to 2011-10-02?").unwrap();
        assert_eq!(start, "1985-09-10");
        assert_eq!(end, "2011-10-02");
    }

    #[test]
    fn test_date_range_us_format() {
        let (start, end) = extract_date_range("count days 9/10/1985 to 10/2/2011 please").unwrap();
        assert_eq!(start, "9/10/1985");
        assert_eq!(end, "10/2/2011");
    }

    #[test]
    fn test_json_block_prefers_fenced() {
        let q = "Sort this: ```json\n[{\"a\":1}]\n``` and also {\"b\":2}";
        assert_eq!(extract_json_block(q).unwrap(), "[{\"a\":1}]");
    }

    #[test]
    fn test_json_block_bare_array() {
        let q = r#"Sort [{"name":"Bob","age":30},{"name":"Alice","age":55}] by age"#;
        let block = extract_json_block(q).unwrap();
        assert!(block.starts_with('['));
        assert!(block.contains("Alice"));
    }

    #[test]
    fn test_css_selector_with_attribute() {
        let (sel, attr) =
            extract_css_selector("Use the selector `div.item` and sum the attribute data-value")
                .unwrap();
        assert_eq!(sel, "div.item");
        assert_eq!(attr.as_deref(), Some("data-value"));
    }

    #[test]
    fn test_no_match_returns_none() {
        assert!(extract_command_stages("what is 2+2?").is_none());
        assert!(extract_date_range("what is 2+2?").is_none());
        assert!(extract_json_block("what is 2+2?").is_none());
    }
}
