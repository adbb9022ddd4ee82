use rand::Rng;
use shamba_core::{BoxList, Position, SensorReading};

/// Full width of the per-tick positional drift, in degrees. Each axis moves by
/// at most half of this per tick.
pub const DRIFT_SPAN: f64 = 0.0001;

/// Advance one sensor by a single tick.
///
/// Offline sensors are returned unchanged. Everything else takes a bounded
/// random step on its value (rounded to the kind's precision, then clamped
/// into the kind's range) and a small drift on both coordinates. The result
/// is a whole new reading, so value and position always change together.
pub fn advance_reading<R: Rng>(reading: &SensorReading, rng: &mut R) -> SensorReading {
    if reading.is_frozen() {
        return reading.clone();
    }

    let kind = reading.kind;
    let noise = centered(rng) * kind.tick_variance();
    let value = kind.range().clamp(kind.round(reading.value + noise));

    let position = Position::new(
        reading.position.lat + centered(rng) * DRIFT_SPAN,
        reading.position.lng + centered(rng) * DRIFT_SPAN,
    );

    SensorReading {
        value,
        position,
        ..reading.clone()
    }
}

/// Advance every sensor in `sensors` by one tick.
pub fn tick<R: Rng>(sensors: &[SensorReading], rng: &mut R) -> BoxList<SensorReading> {
    sensors.iter().map(|s| advance_reading(s, rng)).collect()
}

/// Simulated round-trip latency of the sensor mesh, in milliseconds.
pub fn mesh_latency<R: Rng>(rng: &mut R) -> u32 {
    rng.random_range(8..28)
}

/// Uniform sample in `[-0.5, 0.5)`.
fn centered<R: Rng>(rng: &mut R) -> f64 {
    rng.random::<f64>() - 0.5
}
