pub mod gemini;

pub use gemini::GeminiVerifier;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::CapturedFrame;

/// Why a verification call failed. The phase machine only ever sees the
/// collapsed boolean; these variants exist so the logs can tell a rejected
/// proof apart from a broken call.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("no API key is configured")]
    MissingCredential,
    #[error("verification request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("verification endpoint returned {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed verification response")]
    MalformedResponse,
    #[error("verification timed out after {0}s")]
    TimedOut(u64),
}

/// Only the literal single word counts; trailing punctuation, prose or an
/// empty body all read as a negative verdict.
pub fn affirmative(response_text: &str) -> bool {
    response_text.trim().to_uppercase() == "YES"
}

pub fn instruction(goal_text: &str) -> String {
    format!(
        "You are an accountability verifier. The user's goal was: \"{goal_text}\". \
         Look at the image provided. Does this image provide clear, unambiguous proof \
         that the goal has been successfully completed? Your response must be a single \
         word: YES or NO."
    )
}

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

pub fn request_body(goal_text: &str, frame: &CapturedFrame) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                Part {
                    inline_data: Some(InlineData {
                        mime_type: frame.media_type.clone(),
                        data: frame.data.clone(),
                    }),
                    text: None,
                },
                Part {
                    inline_data: None,
                    text: Some(instruction(goal_text)),
                },
            ],
        }],
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Concatenated text of the first candidate, the way the hosted SDK exposes
/// `response.text`.
pub fn response_text(response: &GenerateContentResponse) -> Option<String> {
    let candidate = response.candidates.as_ref()?.first()?;
    let parts = candidate.content.as_ref()?.parts.as_ref()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
