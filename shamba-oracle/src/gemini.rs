use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{GenerateRequest, GenerativeBackend, Part, ServiceFailure};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// [`GenerativeBackend`] speaking the Gemini `generateContent` REST API.
pub struct GeminiBackend {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_options(api_key, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT)
    }

    pub fn with_options(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
        })
    }

    fn url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, model)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ServiceFailure> {
        let body = WireRequest::from(request);

        let response = self
            .http
            .post(self.url(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(send_failure)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceFailure::transport(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), &text));
        }

        let parsed: WireResponse =
            serde_json::from_str(&text).map_err(|e| ServiceFailure::InvalidBody {
                message: e.to_string(),
            })?;

        debug!(
            model = %request.model,
            candidates = parsed.candidates.len(),
            "Gemini response received"
        );

        if let Some(failure) = parsed.blocked(status.as_u16()) {
            return Err(failure);
        }

        Ok(parsed.text())
    }
}

fn send_failure(e: reqwest::Error) -> ServiceFailure {
    if e.is_builder() {
        ServiceFailure::InvalidRequest {
            message: e.to_string(),
        }
    } else {
        ServiceFailure::transport(e.to_string())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct WireContent {
    role: &'static str,
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    /// Base64 (standard alphabet, padded).
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

impl From<&GenerateRequest> for WireRequest {
    fn from(request: &GenerateRequest) -> Self {
        let parts = request
            .parts
            .iter()
            .map(|part| match part {
                Part::Text(text) => WirePart::Text { text: text.clone() },
                Part::InlineData { mime_type, data } => WirePart::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.clone(),
                        data: STANDARD.encode(data),
                    },
                },
            })
            .collect();

        let generation_config = if request.response_schema.is_some()
            || request.thinking_budget.is_some()
        {
            Some(GenerationConfig {
                response_mime_type: request
                    .response_schema
                    .as_ref()
                    .map(|_| "application/json"),
                response_schema: request.response_schema.clone(),
                thinking_config: request
                    .thinking_budget
                    .map(|thinking_budget| ThinkingConfig { thinking_budget }),
            })
        } else {
            None
        };

        let tools = if request.search_grounding {
            vec![serde_json::json!({ "googleSearch": {} })]
        } else {
            Vec::new()
        };

        WireRequest {
            contents: vec![WireContent {
                role: "user",
                parts,
            }],
            generation_config,
            tools,
        }
    }
}

/// Finish reasons that mean the answer was withheld by a content filter.
const BLOCKING_FINISH_REASONS: [&str; 4] = ["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl WireResponse {
    /// A success-status response that carries no usable answer.
    fn blocked(&self, code: u16) -> Option<ServiceFailure> {
        let prompt_block = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref());
        if let Some(reason) = prompt_block {
            return Some(ServiceFailure::Status {
                code,
                status: Some(reason.to_owned()),
                message: "prompt blocked by content policy".into(),
            });
        }

        let Some(candidate) = self.candidates.first() else {
            return Some(ServiceFailure::status(code, "response contained no candidates"));
        };

        candidate
            .finish_reason
            .as_deref()
            .filter(|reason| BLOCKING_FINISH_REASONS.contains(reason))
            .map(|reason| ServiceFailure::Status {
                code,
                status: Some(reason.to_owned()),
                message: "response blocked by content policy".into(),
            })
    }

    /// Concatenated text of the first candidate; empty when there is none.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

fn error_from_body(code: u16, body: &str) -> ServiceFailure {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ServiceFailure::Status {
            code,
            status: envelope.error.status,
            message: envelope.error.message,
        },
        Err(_) => ServiceFailure::status(code, body.trim()),
    }
}
