pub mod audit;
pub mod intel;

pub use audit::{AuditLogEntry, AuditSource, AuditStatus};
pub use intel::{AnalysisResult, ImageInput, ThreatAssessment};

use std::fmt;

use serde::{Deserialize, Serialize};

// We use `Box<str>` and `Box<[T]>` for structures that don't need to be
// dynamically sized. This helps us keep allocations compact and avoid
// accidental cloning of large values.
pub type BoxStr = Box<str>;
pub type BoxList<T> = Box<[T]>;

/// Stable identifier for a sensor within the fleet (e.g. `SN-A101`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorId(pub BoxStr);

impl SensorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SensorId {
    fn from(value: &str) -> Self {
        SensorId(value.into())
    }
}

/// Percentage value in the range 0–100 (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Percentage(pub u8);

impl Percentage {
    /// Build a percentage, saturating anything above 100.
    pub fn saturating(value: u8) -> Self {
        Percentage(value.min(100))
    }
}

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both coordinates are finite and inside the valid lat/lng box.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Supported sensor kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorKind {
    SoilMoisture,
    WaterFlow,
    CropHealth,
    SoilPh,
    Nutrient,
}

impl SensorKind {
    pub const ALL: [SensorKind; 5] = [
        SensorKind::SoilMoisture,
        SensorKind::WaterFlow,
        SensorKind::CropHealth,
        SensorKind::SoilPh,
        SensorKind::Nutrient,
    ];

    /// Closed range every value of this kind is clamped into.
    pub const fn range(self) -> ValueRange {
        match self {
            SensorKind::SoilMoisture => ValueRange::new(20.0, 80.0),
            SensorKind::WaterFlow => ValueRange::new(1.0, 30.0),
            SensorKind::SoilPh => ValueRange::new(4.0, 9.0),
            SensorKind::CropHealth => ValueRange::new(60.0, 100.0),
            SensorKind::Nutrient => ValueRange::new(100.0, 500.0),
        }
    }

    /// Spread of the per-tick random walk.
    pub const fn tick_variance(self) -> f64 {
        match self {
            SensorKind::SoilPh => 0.05,
            SensorKind::WaterFlow => 0.2,
            _ => 0.5,
        }
    }

    /// Spread used when synthesizing past values.
    pub const fn history_variance(self) -> f64 {
        match self {
            SensorKind::WaterFlow => 2.0,
            SensorKind::SoilMoisture => 5.0,
            SensorKind::SoilPh => 0.3,
            SensorKind::Nutrient => 10.0,
            SensorKind::CropHealth => 1.0,
        }
    }

    /// Number of decimals values of this kind are rounded to.
    pub const fn decimals(self) -> i32 {
        match self {
            SensorKind::SoilPh => 2,
            _ => 1,
        }
    }

    pub const fn unit(self) -> MetricUnit {
        match self {
            SensorKind::SoilMoisture | SensorKind::CropHealth => MetricUnit::Percent,
            SensorKind::WaterFlow => MetricUnit::LitresPerMinute,
            SensorKind::SoilPh => MetricUnit::Ph,
            SensorKind::Nutrient => MetricUnit::Ppm,
        }
    }

    /// Round `value` to this kind's precision.
    pub fn round(self, value: f64) -> f64 {
        let factor = 10f64.powi(self.decimals());
        (value * factor).round() / factor
    }
}

/// A closed `[min, max]` interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Units used by sensor values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricUnit {
    /// Percent (%) values.
    #[serde(rename = "%")]
    Percent,
    /// Litres per minute.
    #[serde(rename = "L/m")]
    LitresPerMinute,
    /// Acidity on the pH scale.
    #[serde(rename = "pH")]
    Ph,
    /// Parts per million.
    #[serde(rename = "ppm")]
    Ppm,
}

/// Operational status of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorStatus {
    Online,
    LowPower,
    /// Offline sensors never change.
    Offline,
}

/// The latest state of one sensor in the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Stable identity of this sensor.
    pub id: SensorId,
    /// What this sensor measures.
    pub kind: SensorKind,
    /// Measured value in the unit of `kind`.
    pub value: f64,
    /// Where the sensor currently reports itself.
    pub position: Position,
    /// Battery charge level.
    pub battery_percent: Percentage,
    /// Link quality.
    pub signal_percent: Percentage,
    pub status: SensorStatus,
    /// Cosmetic trust flag shown next to the sensor.
    pub verified: bool,
}

impl SensorReading {
    pub fn unit(&self) -> MetricUnit {
        self.kind.unit()
    }

    pub fn is_frozen(&self) -> bool {
        self.status == SensorStatus::Offline
    }
}

/// Subscription tier of the console operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanTier {
    #[serde(rename = "Boutique Estate", alias = "boutique-estate")]
    BoutiqueEstate,
    #[serde(rename = "Industrial Apex", alias = "industrial-apex")]
    IndustrialApex,
    #[serde(rename = "Sovereign Protocol", alias = "sovereign-protocol")]
    SovereignProtocol,
    #[serde(rename = "Master", alias = "master")]
    Master,
}

impl PlanTier {
    /// Background threat sweeps are reserved for the top tiers.
    pub fn allows_threat_sweep(self) -> bool {
        matches!(self, PlanTier::SovereignProtocol | PlanTier::Master)
    }

    pub fn allows_strategic_report(self) -> bool {
        self != PlanTier::BoutiqueEstate
    }

    pub fn label(self) -> &'static str {
        match self {
            PlanTier::BoutiqueEstate => "Boutique Estate",
            PlanTier::IndustrialApex => "Industrial Apex",
            PlanTier::SovereignProtocol => "Sovereign Protocol",
            PlanTier::Master => "Master",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
