use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use docchat_model::{ModelFinishReason, ModelRequest, Part as ModelPart};
use serde::{Deserialize, Serialize};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub status: Option<String>,
}

impl GenerateContentChunk {
    /// Concatenated text of the first candidate in this chunk.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }

    pub fn finish_reason(&self) -> Option<ModelFinishReason> {
        let reason = self.candidates.first()?.finish_reason.as_deref()?;
        Some(map_finish_reason(reason))
    }
}

fn map_finish_reason(reason: &str) -> ModelFinishReason {
    match reason {
        "MAX_TOKENS" => ModelFinishReason::Length,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT"
        | "SPII" | "IMAGE_SAFETY" => ModelFinishReason::ContentFiltered,
        _ => ModelFinishReason::Stop,
    }
}

/// Extracts a readable message from an error response body.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error }) => {
            let message = error.message.unwrap_or_else(|| body.to_owned());
            match error.status {
                Some(status) if !status.is_empty() => {
                    format!("{status}: {message}")
                }
                _ => message,
            }
        }
        Err(_) => body.to_owned(),
    }
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

// -----------
// Conversions
// -----------

/// Every part goes into a single user turn, in the order given.
#[inline]
pub fn create_request(req: &ModelRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: req.parts.iter().map(create_part).collect(),
        }],
    }
}

#[inline]
fn create_part(part: &ModelPart) -> Part {
    match part {
        ModelPart::Text(text) => Part::Text { text: text.clone() },
        ModelPart::Blob(blob) => Part::InlineData {
            inline_data: InlineData {
                mime_type: blob.mime_type.clone(),
                data: BASE64_STANDARD.encode(&blob.data),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use docchat_model::Blob;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            parts: vec![
                ModelPart::Text("You are a mechanical engineer.".to_owned()),
                ModelPart::Blob(Blob {
                    mime_type: "application/pdf".to_owned(),
                    data: Bytes::from_static(b"%PDF-1.4"),
                }),
                ModelPart::Text("What tolerance applies?".to_owned()),
            ],
        };
        let value = serde_json::to_value(create_request(&request)).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": "You are a mechanical engineer." },
                        {
                            "inlineData": {
                                "mimeType": "application/pdf",
                                "data": "JVBERi0xLjQ="
                            }
                        },
                        { "text": "What tolerance applies?" }
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_parse_chunk() {
        let chunk: GenerateContentChunk = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"there"}],"role":"model"},"finishReason":"MAX_TOKENS"}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.text().as_deref(), Some("Hello there"));
        assert_eq!(chunk.finish_reason(), Some(ModelFinishReason::Length));
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "INVALID_ARGUMENT: API key not valid.");
        assert_eq!(error_message("bad gateway"), "bad gateway");
    }
}
