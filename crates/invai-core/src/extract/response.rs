//! Locating the JSON object in a free-form extractor response.
//!
//! The service is asked for bare JSON but may wrap it in a fenced code block
//! or surround it with commentary. A fenced ```` ```json ```` block wins; the
//! span from the first `{` to the last `}` is used otherwise.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::trace;

use crate::error::ResponseError;

lazy_static! {
    /// Interior of the first ```json fenced block.
    static ref JSON_FENCE: Regex = Regex::new(r"(?is)```json[ \t]*\r?\n?(.*?)```").unwrap();
}

/// Where the JSON candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    /// Inside a ```json fenced block.
    Fenced,
    /// Between the outermost braces of the text.
    Braces,
}

/// Find the JSON candidate in a response without parsing it.
pub fn locate_json(text: &str) -> Option<(CandidateSource, &str)> {
    if let Some(caps) = JSON_FENCE.captures(text) {
        let inner = caps.get(1).map_or("", |m| m.as_str());
        return Some((CandidateSource::Fenced, inner.trim()));
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }

    Some((CandidateSource::Braces, &text[start..=end]))
}

/// Parse the single JSON value carried by a response.
pub fn parse_response(text: &str, file_name: &str) -> Result<Value, ResponseError> {
    let (source, candidate) = locate_json(text).ok_or_else(|| ResponseError::NoJsonFound {
        file: file_name.to_string(),
    })?;

    trace!(
        "JSON candidate for {} from {:?} ({} chars)",
        file_name,
        source,
        candidate.len()
    );

    serde_json::from_str(candidate).map_err(|e| ResponseError::MalformedJson {
        file: file_name.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn fenced_block_inside_noise() {
        let text = "noise ```json\n{\"product\":{\"name\":\"X\"}}\n``` noise";
        let value = parse_response(text, "a.pdf").unwrap();
        assert_eq!(value, json!({"product": {"name": "X"}}));
    }

    #[test]
    fn bare_json_inside_prose() {
        let text = "prefix {\"customer\":{\"name\":\"Y\"}} suffix";
        let value = parse_response(text, "a.pdf").unwrap();
        assert_eq!(value, json!({"customer": {"name": "Y"}}));
    }

    #[test]
    fn no_braces_is_no_json() {
        let err = parse_response("I could not read this document.", "scan.png").unwrap_err();
        match err {
            ResponseError::NoJsonFound { file } => assert_eq!(file, "scan.png"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reversed_braces_is_no_json() {
        assert!(matches!(
            parse_response("} nothing here {", "x"),
            Err(ResponseError::NoJsonFound { .. })
        ));
    }

    #[test]
    fn broken_candidate_is_malformed() {
        let err = parse_response("Result: {\"invoice\": {\"tax\": }", "b.pdf").unwrap_err();
        match err {
            ResponseError::MalformedJson { file, .. } => assert_eq!(file, "b.pdf"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn broken_fence_does_not_fall_back() {
        let text = "```json\n{oops}\n```\nAlso: {\"invoice\": {}}";
        assert!(matches!(
            parse_response(text, "c.pdf"),
            Err(ResponseError::MalformedJson { .. })
        ));
    }

    #[test]
    fn first_of_several_fences() {
        let text = "```json\n{\"a\": 1}\n```\nand\n```json\n{\"b\": 2}\n```";
        assert_eq!(parse_response(text, "d").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn uppercase_fence_without_newline() {
        let text = "```JSON {\"invoice\": {\"tax\": 5}}```";
        assert_eq!(
            locate_json(text),
            Some((CandidateSource::Fenced, "{\"invoice\": {\"tax\": 5}}"))
        );
    }

    #[test]
    fn parsing_is_repeatable() {
        let text = "Sure!\n```json\n{\"invoice\": {\"serialNumber\": \"A-1\"}}\n```";
        assert_eq!(
            parse_response(text, "e").unwrap(),
            parse_response(text, "e").unwrap()
        );
    }
}
