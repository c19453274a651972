pub mod gemini;

pub use gemini::GeminiClient;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp-image-generation";

pub const DEFAULT_PROMPT: &str = "You are a powerful and precise OCR (Optical Character Recognition) tool capable of extracting all text from provided images or documents accurately, supporting all languages including Latin alphabets, ideographic scripts (Chinese, Japanese, Korean), special character-based languages, and handwritten text. \nYour task is to precisely, fully, and clearly extract all text from this image, ensuring no words or characters are omitted and retaining the original document formatting.";

pub const NO_TEXT_FOUND: &str = "No text was found in the image.";

/// Pulls the `text` field out of the structured `{"text": ...}` answer.
///
/// Anything that is not such an object is returned unchanged.
pub fn extract_text_field(raw: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => match map.get("text") {
            Some(serde_json::Value::String(text)) => text.clone(),
            _ => raw.to_string(),
        },
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_text_field_reads_structured_answer() {
        assert_eq!(
            extract_text_field(r#"{"text": "Hello\nWorld"}"#),
            "Hello\nWorld"
        );
    }

    #[test]
    fn extract_text_field_keeps_plain_text() {
        assert_eq!(extract_text_field("plain text"), "plain text");
        assert_eq!(extract_text_field(r#"["text"]"#), r#"["text"]"#);
        assert_eq!(extract_text_field(r#"{"other": 1}"#), r#"{"other": 1}"#);
        assert_eq!(extract_text_field(r#"{"text": 5}"#), r#"{"text": 5}"#);
    }
}
