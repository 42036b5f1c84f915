//! Pulls the generated text out of an upstream completion response.
//!
//! Providers (and versions of the same provider) disagree on where the
//! text lives, so each known layout is a strategy tried in priority
//! order. A strategy returns `None` when the response doesn't have its
//! shape at all and `Some(text)` when it does, even if the text is
//! empty.

use std::fmt;

use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractReason {
    Ok,
    Empty,
    UnrecognizedShape,
}

impl ExtractReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractReason::Ok => "ok",
            ExtractReason::Empty => "empty",
            ExtractReason::UnrecognizedShape => "unrecognized-shape",
        }
    }
}

impl fmt::Display for ExtractReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extraction {
    pub text: Option<String>,
    pub reason: ExtractReason,
}

impl Extraction {
    fn ok(text: String) -> Self {
        Self {
            text: Some(text),
            reason: ExtractReason::Ok,
        }
    }

    fn failed(reason: ExtractReason) -> Self {
        Self { text: None, reason }
    }
}

type Strategy = fn(&Value) -> Option<String>;

// Gemini `generateContent`
// {"candidates": [{"content": {"parts": [{"text": "..."}], "role": "model"}}]}
fn gemini_candidates(resp: &Value) -> Option<String> {
    let parts = resp["candidates"][0]["content"]["parts"].as_array()?;
    let text = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect::<Vec<_>>()
        .join("");
    Some(text)
}

// OpenAI compatible `/v1/chat/completions`
fn chat_completion_message(resp: &Value) -> Option<String> {
    resp["choices"][0]["message"]["content"]
        .as_str()
        .map(String::from)
}

// Legacy `/v1/completions`
fn completion_choice_text(resp: &Value) -> Option<String> {
    resp["choices"][0]["text"].as_str().map(String::from)
}

// Responses API convenience field
fn output_text(resp: &Value) -> Option<String> {
    resp["output_text"].as_str().map(String::from)
}

fn bare_text(resp: &Value) -> Option<String> {
    resp["text"].as_str().map(String::from)
}

const STRATEGIES: &[Strategy] = &[
    gemini_candidates,
    chat_completion_message,
    completion_choice_text,
    output_text,
    bare_text,
];

/// Returns the first non-blank text found by the strategies. When some
/// strategy recognized the shape but every match was blank the reason
/// is `Empty`, otherwise `UnrecognizedShape`.
pub fn extract_text(resp: &Value) -> Extraction {
    let mut recognized = false;
    for strategy in STRATEGIES {
        if let Some(text) = strategy(resp) {
            if !text.trim().is_empty() {
                return Extraction::ok(text);
            }
            recognized = true;
        }
    }

    if recognized {
        Extraction::failed(ExtractReason::Empty)
    } else {
        Extraction::failed(ExtractReason::UnrecognizedShape)
    }
}
