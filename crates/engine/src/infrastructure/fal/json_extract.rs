//! Pull a JSON object out of chatty model output.
//!
//! Models wrap the object in prose or code fences, use full-width commas and
//! sometimes leave keys unquoted (`{ result:"steam" }`).

use crate::infrastructure::ports::GenerationError;

const FULL_WIDTH_COMMA: char = '\u{FF0C}';

/// Every top-level balanced `{...}` in `text`, in order, with full-width
/// commas normalised.
///
/// Braces inside string literals do not count towards balance. A `{` that is
/// never closed is skipped.
pub fn extract_objects(text: &str) -> Vec<String> {
    let mut objects = Vec::new();
    let mut from = 0;
    while let Some(found) = text[from..].find('{') {
        let start = from + found;
        match object_end(&text[start..]) {
            Some(len) => {
                objects.push(text[start..start + len].replace(FULL_WIDTH_COMMA, ","));
                from = start + len;
            }
            None => from = start + 1,
        }
    }
    objects
}

/// Byte length of the balanced object that opens at the start of `text`.
fn object_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (offset, ch) in text.char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_string = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => in_string = Some(ch),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// The `result` field of the first object in `text` that has one.
///
/// `Ok(None)` when the field is null or blank. Output with no object carrying
/// a `result` key is an invalid response, not a refusal.
pub fn extract_result_field(text: &str) -> Result<Option<String>, GenerationError> {
    for object in extract_objects(text) {
        if let Some(result) = result_of(&object) {
            return result;
        }
    }
    Err(GenerationError::InvalidResponse(format!(
        "no result object in model output: {}",
        text
    )))
}

/// `None` when `object` has no `result` key.
fn result_of(object: &str) -> Option<Result<Option<String>, GenerationError>> {
    let value = match serde_json::from_str::<serde_json::Value>(object) {
        Ok(serde_json::Value::Object(map)) => map.get("result").cloned()?,
        Ok(_) => return None,
        Err(_) => return lenient_result(object),
    };

    Some(Ok(match value {
        serde_json::Value::String(s) => non_blank(&s),
        serde_json::Value::Null => None,
        other => non_blank(&other.to_string()),
    }))
}

/// Fallback for objects that are not strict JSON: `result` with or without
/// quotes, followed by a single- or double-quoted value or `null`.
fn lenient_result(object: &str) -> Option<Result<Option<String>, GenerationError>> {
    let invalid = || GenerationError::InvalidResponse(format!("unreadable result object: {}", object));

    let rest = object.match_indices("result").find_map(|(at, key)| {
        let rest = object[at + key.len()..].trim_start_matches(['"', '\'']);
        rest.trim_start().strip_prefix(':')
    })?;
    let rest = rest.trim_start();

    if rest.starts_with("null") {
        return Some(Ok(None));
    }
    let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        return Some(Err(invalid()));
    };
    let body = &rest[quote.len_utf8()..];
    Some(match body.find(quote) {
        Some(end) => Ok(non_blank(&body[..end])),
        None => Err(invalid()),
    })
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_object_inside_code_fence() {
        let text = "Sure!\n```json\n{\"result\": \"steam\"}\n```\nHope that helps.";
        assert_eq!(
            extract_result_field(text).expect("parsed"),
            Some("steam".to_string())
        );
    }

    #[test]
    fn nested_objects_are_kept_whole() {
        let text = "x {\"a\": {\"b\": 1}, \"result\": \"mud\"} y {\"result\": \"no\"}";
        assert_eq!(
            extract_objects(text),
            vec![
                "{\"a\": {\"b\": 1}, \"result\": \"mud\"}".to_string(),
                "{\"result\": \"no\"}".to_string()
            ]
        );
        assert_eq!(
            extract_result_field(text).expect("parsed"),
            Some("mud".to_string())
        );
    }

    #[test]
    fn braces_in_strings_do_not_close_the_object() {
        let text = r#"{"result": "curly } brace"}"#;
        assert_eq!(
            extract_result_field(text).expect("parsed"),
            Some("curly } brace".to_string())
        );
    }

    #[test]
    fn full_width_commas_are_normalised() {
        let text = "{\"note\": \"ok\"\u{FF0C} \"result\": \"lava\"}";
        assert_eq!(
            extract_result_field(text).expect("parsed"),
            Some("lava".to_string())
        );
    }

    #[test]
    fn unquoted_key_is_accepted() {
        let text = "{ result:\"steam\" }";
        assert_eq!(
            extract_result_field(text).expect("parsed"),
            Some("steam".to_string())
        );
    }

    #[test]
    fn blank_or_null_result_means_no_reaction() {
        assert_eq!(extract_result_field("{\"result\": \"\"}").expect("parsed"), None);
        assert_eq!(extract_result_field("{\"result\": \"  \"}").expect("parsed"), None);
        assert_eq!(extract_result_field("{\"result\": null}").expect("parsed"), None);
        assert_eq!(extract_result_field("{ result: null }").expect("parsed"), None);
    }

    #[test]
    fn echoed_prompt_placeholders_are_skipped() {
        let text = "I give you {fire} and {water}, so { result:\"steam\" }";
        assert_eq!(
            extract_result_field(text).expect("parsed"),
            Some("steam".to_string())
        );
    }

    #[test]
    fn objects_without_result_key_are_invalid() {
        for text in ["{}", "{fire} and {water}", "{\"answer\": \"steam\"}"] {
            let err = extract_result_field(text).expect_err("no result key");
            assert!(matches!(err, GenerationError::InvalidResponse(_)), "{text}");
        }
    }

    #[test]
    fn unclosed_brace_does_not_hide_later_object() {
        let text = "a { stray, then {\"result\": \"ash\"}";
        assert_eq!(
            extract_result_field(text).expect("parsed"),
            Some("ash".to_string())
        );
    }

    #[test]
    fn output_without_object_is_invalid() {
        let err = extract_result_field("steam").expect_err("no object");
        assert!(matches!(err, GenerationError::InvalidResponse(_)));
    }
}
