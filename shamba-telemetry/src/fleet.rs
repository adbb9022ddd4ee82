use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use shamba_core::{BoxList, Percentage, SensorId, SensorKind, SensorReading, SensorStatus};
use tokio::sync::watch;

use crate::simulate;

/// A consistent view of the whole fleet at one tick.
#[derive(Debug, Clone, Serialize)]
pub struct FleetSnapshot {
    /// Number of ticks applied since seeding.
    pub tick: u64,
    pub captured_at: jiff::Timestamp,
    /// Simulated mesh round-trip time.
    pub mesh_latency_ms: u32,
    pub sensors: BoxList<SensorReading>,
}

impl FleetSnapshot {
    pub fn get(&self, id: &str) -> Option<&SensorReading> {
        self.sensors.iter().find(|s| s.id.as_str() == id)
    }
}

/// The live sensor fleet.
///
/// Each tick publishes a brand new snapshot, so readers holding an
/// `Arc<FleetSnapshot>` never see a partially updated fleet.
#[derive(Clone)]
pub struct Fleet {
    tx: Arc<watch::Sender<Arc<FleetSnapshot>>>,
}

impl Fleet {
    pub fn new(sensors: Vec<SensorReading>) -> Self {
        let snapshot = FleetSnapshot {
            tick: 0,
            captured_at: jiff::Timestamp::now(),
            mesh_latency_ms: 12,
            sensors: sensors.into_boxed_slice(),
        };
        let (tx, _rx) = watch::channel(Arc::new(snapshot));
        Self { tx: Arc::new(tx) }
    }

    /// Fleet seeded with the default field deployment.
    pub fn seeded() -> Self {
        Self::new(crate::seed::initial_sensors())
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<FleetSnapshot> {
        Arc::clone(&self.tx.borrow())
    }

    /// Receive a notification every time a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<FleetSnapshot>> {
        self.tx.subscribe()
    }

    pub fn get(&self, id: &str) -> Option<SensorReading> {
        self.snapshot().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply one tick using the thread-local RNG.
    pub fn advance(&self) -> Arc<FleetSnapshot> {
        self.advance_with(&mut rand::rng())
    }

    /// Apply one tick, drawing randomness from `rng`.
    pub fn advance_with<R: Rng>(&self, rng: &mut R) -> Arc<FleetSnapshot> {
        self.tx.send_modify(|current| {
            let next = FleetSnapshot {
                tick: current.tick + 1,
                captured_at: jiff::Timestamp::now(),
                mesh_latency_ms: simulate::mesh_latency(rng),
                sensors: simulate::tick(&current.sensors, rng),
            };
            *current = Arc::new(next);
        });
        self.snapshot()
    }

    pub fn summary(&self, battery_threshold: Percentage) -> FleetSummary {
        FleetSummary::from_snapshot(&self.snapshot(), battery_threshold)
    }
}

/// Average value of every sensor of one kind.
#[derive(Debug, Clone, Serialize)]
pub struct KindAverage {
    pub kind: SensorKind,
    pub sensors: usize,
    /// Rounded to one decimal; absent when the fleet has no sensor of this kind.
    pub average: Option<f64>,
}

/// Dashboard roll-up of a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct FleetSummary {
    pub tick: u64,
    pub mesh_latency_ms: u32,
    pub averages: Vec<KindAverage>,
    /// Sensors whose battery is strictly below the threshold.
    pub low_battery: Vec<SensorId>,
    pub offline: usize,
}

impl FleetSummary {
    pub fn from_snapshot(snapshot: &FleetSnapshot, battery_threshold: Percentage) -> Self {
        let averages = SensorKind::ALL
            .iter()
            .map(|&kind| {
                let values: Vec<f64> = snapshot
                    .sensors
                    .iter()
                    .filter(|s| s.kind == kind)
                    .map(|s| s.value)
                    .collect();
                let average = (!values.is_empty()).then(|| {
                    let mean = values.iter().sum::<f64>() / values.len() as f64;
                    (mean * 10.0).round() / 10.0
                });
                KindAverage {
                    kind,
                    sensors: values.len(),
                    average,
                }
            })
            .collect();

        let low_battery = snapshot
            .sensors
            .iter()
            .filter(|s| s.battery_percent < battery_threshold)
            .map(|s| s.id.clone())
            .collect();

        let offline = snapshot
            .sensors
            .iter()
            .filter(|s| s.status == SensorStatus::Offline)
            .count();

        Self {
            tick: snapshot.tick,
            mesh_latency_ms: snapshot.mesh_latency_ms,
            averages,
            low_battery,
            offline,
        }
    }
}
