use shamba_core::{Percentage, Position, SensorKind, SensorReading, SensorStatus};

/// Location of the primary field hub. Also used when no operator location is
/// configured.
pub const FLEET_ORIGIN: Position = Position::new(-1.2863, 36.8172);

/// The field deployment every session starts from.
pub fn initial_sensors() -> Vec<SensorReading> {
    use SensorKind::*;
    use SensorStatus::*;

    [
        ("SN-A101", SoilMoisture, 42.4, (-1.2863, 36.8172), 88, 95, Online),
        ("SN-A102", SoilMoisture, 38.1, (-1.2855, 36.8210), 12, 82, LowPower),
        ("SN-W201", WaterFlow, 8.4, (-1.2900, 36.8150), 95, 98, Online),
        ("SN-PH401", SoilPh, 6.8, (-1.2880, 36.8200), 92, 91, Online),
        ("SN-C301", CropHealth, 94.2, (-1.2820, 36.8190), 76, 45, Online),
        ("SN-A103", SoilMoisture, 45.9, (-1.2875, 36.8185), 81, 89, Online),
        ("SN-W202", WaterFlow, 12.1, (-1.2915, 36.8160), 74, 92, Online),
        ("SN-PH402", SoilPh, 6.2, (-1.2890, 36.8215), 89, 85, Online),
        ("SN-C302", CropHealth, 88.5, (-1.2835, 36.8195), 62, 78, Online),
        ("SN-N501", Nutrient, 240.0, (-1.2850, 36.8220), 97, 99, Online),
    ]
    .into_iter()
    .map(
        |(id, kind, value, (lat, lng), battery, signal, status)| SensorReading {
            id: id.into(),
            kind,
            value,
            position: Position::new(lat, lng),
            battery_percent: Percentage(battery),
            signal_percent: Percentage(signal),
            status,
            verified: true,
        },
    )
    .collect()
}
