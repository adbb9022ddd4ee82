use serde::{Deserialize, Serialize};

use crate::BoxStr;

/// Outcome recorded for an audited event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditStatus {
    Authorized,
    Denied,
    Flagged,
}

/// One line of the security audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: BoxStr,
    pub event: BoxStr,
    pub actor: BoxStr,
    pub status: AuditStatus,
    /// Human-relative timestamp, e.g. `15m ago`.
    pub timestamp: BoxStr,
}

impl AuditLogEntry {
    fn new(id: &str, event: &str, actor: &str, status: AuditStatus, timestamp: &str) -> Self {
        Self {
            id: id.into(),
            event: event.into(),
            actor: actor.into(),
            status,
            timestamp: timestamp.into(),
        }
    }
}

/// Where a batch of audit entries comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSource {
    /// Real-time backhaul traffic.
    #[default]
    Live,
    /// Institutional archive.
    Archive,
    /// Hardware node events.
    Nodes,
}

impl AuditSource {
    /// The canned entries exposed for this source.
    pub fn entries(self) -> Vec<AuditLogEntry> {
        use AuditStatus::*;

        match self {
            AuditSource::Live => vec![
                AuditLogEntry::new(
                    "TX-8821",
                    "Encryption Key Rotation",
                    "System Auto-Task",
                    Authorized,
                    "2m ago",
                ),
                AuditLogEntry::new(
                    "TX-8820",
                    "Biometric Access Sector 4",
                    "Dr. Elena Vance",
                    Authorized,
                    "15m ago",
                ),
                AuditLogEntry::new(
                    "TX-8819",
                    "Mesh-Net Firmware Update",
                    "Command Hub Alpha",
                    Authorized,
                    "1h ago",
                ),
                AuditLogEntry::new(
                    "TX-8818",
                    "Unauthorized SSH Attempt",
                    "IP: 192.168.1.204",
                    Denied,
                    "3h ago",
                ),
            ],
            AuditSource::Archive => vec![
                AuditLogEntry::new(
                    "AX-1022",
                    "System-Wide Entropy Audit",
                    "UN Compliance Bot",
                    Authorized,
                    "2d ago",
                ),
                AuditLogEntry::new(
                    "AX-1021",
                    "Credential Escalation Attempt",
                    "Guest-VPN-02",
                    Flagged,
                    "3d ago",
                ),
            ],
            AuditSource::Nodes => vec![AuditLogEntry::new(
                "NX-440",
                "Hardware Tamper Triggered",
                "Sensor-A102",
                Flagged,
                "10m ago",
            )],
        }
    }
}
