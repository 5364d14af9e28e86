//! HTML queries via CSS selectors.

use scraper::{Html, Selector};
use std::path::Path;

use crate::files;

/// Apply a CSS selector to an uploaded HTML file.
pub fn process_css_selector_question(path: &Path, selector: &str, attribute: Option<&str>) -> String {
    match files::read_text(path) {
        Ok(html) => select_from_html(&html, selector, attribute),
        Err(e) => format!("Error processing HTML: {}", e),
    }
}

/// Apply a CSS selector to HTML content.
///
/// With an attribute, returns the joined attribute values; for `data-*`
/// attributes whose values are all numeric, returns their sum instead.
/// Without an attribute, returns the match count.
pub fn select_from_html(html: &str, selector: &str, attribute: Option<&str>) -> String {
    let parsed = match Selector::parse(selector) {
        Ok(parsed) => parsed,
        Err(e) => return format!("Error processing HTML with selector: {}", e),
    };

    let document = Html::parse_document(html);
    let elements: Vec<_> = document.select(&parsed).collect();

    if elements.is_empty() {
        return format!("No elements found matching selector '{}'", selector);
    }

    let Some(attribute) = attribute else {
        return elements.len().to_string();
    };

    let values: Vec<&str> = elements
        .iter()
        .filter_map(|el| el.value().attr(attribute))
        .collect();

    if attribute.starts_with("data-") {
        let numbers: Vec<f64> = values
            .iter()
            .filter_map(|v| v.parse::<f64>().ok())
            .collect();
        if !numbers.is_empty() && numbers.len() == values.len() {
            let total: f64 = numbers.iter().sum();
            return if total.fract() == 0.0 {
                format!("{}", total as i64)
            } else {
                total.to_string()
            };
        }
    }

    values.join(", ")
}
