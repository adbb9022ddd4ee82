use serde::{Deserialize, Serialize};

use crate::{BoxList, BoxStr};

/// An image submitted for analysis.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Raw encoded image bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`, e.g. `image/jpeg`.
    pub mime_type: BoxStr,
}

impl ImageInput {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<BoxStr>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/jpeg")
    }
}

/// Diagnosis of a crop or soil image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub diagnosis: BoxStr,
    /// Model confidence in `[0, 1]`.
    pub confidence: f64,
    /// Ordered, most important first.
    pub recommendations: BoxList<BoxStr>,
    pub sustainability_impact: BoxStr,
}

/// Threat assessment over a set of audit log entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatAssessment {
    pub threat_level: BoxStr,
    pub summary: BoxStr,
    /// Model confidence in `[0, 1]`.
    pub confidence: f64,
    pub risk_factors: BoxList<BoxStr>,
}
