use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use shamba_core::{AnalysisResult, AuditLogEntry, ImageInput, Position, ThreatAssessment};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span};
use ulid::Ulid;

use crate::{GenerateRequest, GenerativeBackend, OracleError, RetryPolicy, classify, retry};

pub const DEFAULT_FAST_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_DEEP_MODEL: &str = "gemini-3-pro-preview";

const REPORT_THINKING_BUDGET: u32 = 4000;

/// Which model serves which kind of call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRoutes {
    /// Structured, latency-sensitive calls (image and log analysis).
    pub fast: String,
    /// Search-grounded free-text calls (reports, climate).
    pub deep: String,
}

impl Default for ModelRoutes {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST_MODEL.to_owned(),
            deep: DEFAULT_DEEP_MODEL.to_owned(),
        }
    }
}

/// Unique identifier of one logical oracle call, shared by all its attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallId(pub Ulid);

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CropImage,
    SoilImage,
    StrategicReport,
    ClimateOutlook,
    SecurityLogs,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::CropImage => "crop_image",
            Operation::SoilImage => "soil_image",
            Operation::StrategicReport => "strategic_report",
            Operation::ClimateOutlook => "climate_outlook",
            Operation::SecurityLogs => "security_logs",
        }
    }
}

/// Typed client for the generative-AI service.
///
/// Cloning is cheap. The client carries only immutable configuration and a
/// cancellation token, so any number of calls may run concurrently.
pub struct OracleClient<B> {
    backend: Arc<B>,
    policy: RetryPolicy,
    models: Arc<ModelRoutes>,
    cancel: CancellationToken,
}

impl<B> Clone for OracleClient<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            policy: self.policy,
            models: Arc::clone(&self.models),
            cancel: self.cancel.clone(),
        }
    }
}

impl<B: GenerativeBackend> OracleClient<B> {
    pub fn new(backend: B) -> Self {
        Self::from_shared(Arc::new(backend))
    }

    pub fn from_shared(backend: Arc<B>) -> Self {
        Self {
            backend,
            policy: RetryPolicy::default(),
            models: Arc::new(ModelRoutes::default()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_models(mut self, models: ModelRoutes) -> Self {
        self.models = Arc::new(models);
        self
    }

    /// A client whose calls abort with [`OracleError::Cancelled`] once
    /// `cancel` fires.
    pub fn with_cancellation(&self, cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..self.clone()
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn models(&self) -> &ModelRoutes {
        &self.models
    }

    /// Diagnose crop health, pests and nutrient deficiencies from a photo.
    pub async fn analyze_crop_image(
        &self,
        image: &ImageInput,
    ) -> Result<AnalysisResult, OracleError> {
        check_image(image)?;
        let request = GenerateRequest::new(&self.models.fast)
            .with_image(&*image.mime_type, image.bytes.clone())
            .with_text(
                "Analyze this crop image for health, pests, and nutrient deficiencies. \
                 Provide a professional diagnosis and sustainable recommendations in JSON format.",
            )
            .with_schema(analysis_schema());

        self.call_structured(Operation::CropImage, request).await
    }

    /// Identify soil type and nutrient markers from a photo.
    pub async fn analyze_soil_image(
        &self,
        image: &ImageInput,
    ) -> Result<AnalysisResult, OracleError> {
        check_image(image)?;
        let request = GenerateRequest::new(&self.models.fast)
            .with_image(&*image.mime_type, image.bytes.clone())
            .with_text(
                "Analyze this soil sample. Identify soil type and nutrient markers. \
                 Provide professional management advice in JSON format.",
            )
            .with_schema(analysis_schema());

        self.call_structured(Operation::SoilImage, request).await
    }

    /// Stakeholder report cross-referenced against current agricultural trends.
    pub async fn generate_strategic_report(&self, context: &str) -> Result<String, OracleError> {
        if context.trim().is_empty() {
            return Err(OracleError::InvalidInput("report context is empty".into()));
        }
        let request = GenerateRequest::new(&self.models.deep)
            .with_text(format!(
                "Generate a fact-checked strategic report for stakeholders. Context: {context}. \
                 Use Google Search to cross-reference with 2025 agricultural trends."
            ))
            .with_search()
            .with_thinking_budget(REPORT_THINKING_BUDGET);

        self.call_text(Operation::StrategicReport, request).await
    }

    /// Climate outlook for a location, grounded with live search data.
    pub async fn climate_outlook(&self, position: Position) -> Result<String, OracleError> {
        if !position.is_valid() {
            return Err(OracleError::InvalidInput(format!(
                "coordinates out of range: {}, {}",
                position.lat, position.lng
            )));
        }
        let request = GenerateRequest::new(&self.models.deep)
            .with_text(format!(
                "Provide an accurate climate outlook for Lat {}, Lng {} using real-time search data.",
                position.lat, position.lng
            ))
            .with_search();

        self.call_text(Operation::ClimateOutlook, request).await
    }

    /// Threat assessment over a batch of audit log entries. An empty batch is
    /// allowed and asks for a general posture assessment.
    pub async fn assess_security_logs(
        &self,
        entries: &[AuditLogEntry],
    ) -> Result<ThreatAssessment, OracleError> {
        let logs = serde_json::to_string(entries)
            .map_err(|e| OracleError::InvalidInput(format!("unserializable log entries: {e}")))?;
        let request = GenerateRequest::new(&self.models.fast)
            .with_text(format!("Analyze audit logs for threats: {logs}"))
            .with_schema(threat_schema());

        self.call_structured(Operation::SecurityLogs, request).await
    }

    async fn call_text(
        &self,
        operation: Operation,
        request: GenerateRequest,
    ) -> Result<String, OracleError> {
        let call_id = CallId(Ulid::new());
        let span = info_span!("oracle_call", %call_id, operation = operation.name());

        let backend = &self.backend;
        let request = &request;

        async {
            let text = retry(&self.policy, &self.cancel, |_attempt| async move {
                backend.generate(request).await.map_err(classify)
            })
            .await?;
            info!(chars = text.len(), "Oracle call completed");
            Ok(text)
        }
        .instrument(span)
        .await
    }

    async fn call_structured<T>(
        &self,
        operation: Operation,
        request: GenerateRequest,
    ) -> Result<T, OracleError>
    where
        T: DeserializeOwned + Validate,
    {
        let call_id = CallId(Ulid::new());
        let span = info_span!("oracle_call", %call_id, operation = operation.name());

        let backend = &self.backend;
        let request = &request;

        async {
            // Parsing happens inside the retried closure: a malformed payload
            // is not transient, so it ends the loop on the first occurrence.
            let value = retry(&self.policy, &self.cancel, |_attempt| async move {
                let text = backend.generate(request).await.map_err(classify)?;
                parse_structured::<T>(&text)
            })
            .await?;
            info!("Oracle call completed");
            Ok(value)
        }
        .instrument(span)
        .await
    }
}

fn check_image(image: &ImageInput) -> Result<(), OracleError> {
    if image.bytes.is_empty() {
        return Err(OracleError::InvalidInput("image is empty".into()));
    }
    if image.mime_type.trim().is_empty() {
        return Err(OracleError::InvalidInput("image mime type is missing".into()));
    }
    Ok(())
}

/// Post-parse checks serde cannot express.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

impl Validate for AnalysisResult {
    fn validate(&self) -> Result<(), String> {
        check_confidence(self.confidence)
    }
}

impl Validate for ThreatAssessment {
    fn validate(&self) -> Result<(), String> {
        check_confidence(self.confidence)
    }
}

fn check_confidence(confidence: f64) -> Result<(), String> {
    if (0.0..=1.0).contains(&confidence) {
        Ok(())
    } else {
        Err(format!("confidence {confidence} is outside [0, 1]"))
    }
}

/// Parse a structured payload, tolerating a surrounding markdown code fence.
pub fn parse_structured<T>(text: &str) -> Result<T, OracleError>
where
    T: DeserializeOwned + Validate,
{
    let body = strip_code_fence(text);
    let value: T = serde_json::from_str(body).map_err(|e| OracleError::Malformed(e.to_string()))?;
    value.validate().map_err(OracleError::Malformed)?;
    Ok(value)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "diagnosis": { "type": "STRING" },
            "confidence": { "type": "NUMBER" },
            "recommendations": { "type": "ARRAY", "items": { "type": "STRING" } },
            "sustainabilityImpact": { "type": "STRING" }
        },
        "required": ["diagnosis", "confidence", "recommendations", "sustainabilityImpact"]
    })
}

fn threat_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "threatLevel": { "type": "STRING" },
            "summary": { "type": "STRING" },
            "confidence": { "type": "NUMBER" },
            "riskFactors": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["threatLevel", "summary", "confidence", "riskFactors"]
    })
}
