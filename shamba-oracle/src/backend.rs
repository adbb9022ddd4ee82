use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::ServiceFailure;

/// One piece of a multi-part prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    /// Raw bytes; backends encode them as their wire format requires.
    InlineData { mime_type: String, data: Vec<u8> },
}

/// A single generation request, independent of any wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub parts: Vec<Part>,
    /// When set, the service must answer with JSON matching this schema.
    pub response_schema: Option<Value>,
    /// Let the model ground its answer with web search.
    pub search_grounding: bool,
    pub thinking_budget: Option<u32>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            parts: Vec::new(),
            response_schema: None,
            search_grounding: false,
            thinking_budget: None,
        }
    }

    pub fn with_image(mut self, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        self.parts.push(Part::InlineData {
            mime_type: mime_type.into(),
            data,
        });
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Part::Text(text.into()));
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_search(mut self) -> Self {
        self.search_grounding = true;
        self
    }

    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }

    /// All text parts joined by newlines.
    pub fn prompt(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(text) => Some(text.as_str()),
                Part::InlineData { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A generative-AI service that turns a request into response text.
///
/// Implementations perform exactly one network exchange per call and report
/// failures unclassified; retrying is the caller's job.
#[async_trait]
pub trait GenerativeBackend: Send + Sync + 'static {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ServiceFailure>;
}

#[async_trait]
impl<B: GenerativeBackend + ?Sized> GenerativeBackend for Arc<B> {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ServiceFailure> {
        (**self).generate(request).await
    }
}
