#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use shamba_oracle::{GenerateRequest, GenerativeBackend, ServiceFailure};

pub const THREAT_PAYLOAD: &str = r#"{
    "threatLevel": "Elevated",
    "summary": "Denied SSH attempt from internal range",
    "confidence": 0.74,
    "riskFactors": ["Lateral movement", "Weak VPN credentials"]
}"#;

pub const ANALYSIS_PAYLOAD: &str = r#"{
    "diagnosis": "Healthy loam, slightly acidic",
    "confidence": 0.88,
    "recommendations": ["Add agricultural lime"],
    "sustainabilityImpact": "Improves nutrient uptake"
}"#;

/// Answers each operation with a fixed payload chosen by its prompt, or
/// fails every call when `failure` is set.
#[derive(Default)]
pub struct FieldStub {
    pub failure: Option<ServiceFailure>,
    calls: AtomicU32,
    security_calls: AtomicU32,
}

impl FieldStub {
    pub fn failing(failure: ServiceFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn security_calls(&self) -> u32 {
        self.security_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeBackend for FieldStub {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ServiceFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = request.prompt();
        if prompt.starts_with("Analyze audit logs") {
            self.security_calls.fetch_add(1, Ordering::SeqCst);
        }

        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        let text = if prompt.starts_with("Analyze audit logs") {
            THREAT_PAYLOAD
        } else if prompt.contains("climate outlook") {
            "Long rains arrive two weeks early."
        } else if prompt.contains("strategic report") {
            "Yields are on track for the season."
        } else {
            ANALYSIS_PAYLOAD
        };
        Ok(text.to_owned())
    }
}
