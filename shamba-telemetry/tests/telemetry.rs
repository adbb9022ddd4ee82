use std::time::Duration;

use jiff::Zoned;
use rand::SeedableRng;
use rand::rngs::StdRng;
use shamba_core::*;
use shamba_telemetry::simulate::{DRIFT_SPAN, advance_reading, tick};
use shamba_telemetry::*;
use tokio_util::sync::CancellationToken;

fn sensor(id: &str, kind: SensorKind, value: f64, status: SensorStatus) -> SensorReading {
    SensorReading {
        id: id.into(),
        kind,
        value,
        position: Position::new(-1.2863, 36.8172),
        battery_percent: Percentage(88),
        signal_percent: Percentage(95),
        status,
        verified: true,
    }
}

/// Always yields the largest `f64` below 1.0, i.e. maximum positive noise.
struct MaxRng;

impl rand::RngCore for MaxRng {
    fn next_u32(&mut self) -> u32 {
        u32::MAX
    }

    fn next_u64(&mut self) -> u64 {
        u64::MAX
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        dst.fill(0xff);
    }
}

/// Always yields 0.0, i.e. maximum negative noise.
struct MinRng;

impl rand::RngCore for MinRng {
    fn next_u32(&mut self) -> u32 {
        0
    }

    fn next_u64(&mut self) -> u64 {
        0
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        dst.fill(0);
    }
}

#[test]
fn clamps_at_upper_edge_with_maximum_noise() {
    let edge = [
        (SensorKind::SoilMoisture, 79.8),
        (SensorKind::WaterFlow, 29.95),
        (SensorKind::SoilPh, 8.99),
        (SensorKind::CropHealth, 99.9),
        (SensorKind::Nutrient, 499.9),
    ];

    for (kind, value) in edge {
        let next = advance_reading(&sensor("SN-X", kind, value, SensorStatus::Online), &mut MaxRng);
        assert!(
            next.value <= kind.range().max,
            "{kind:?} escaped upper bound: {}",
            next.value
        );
        assert!(next.value >= value);
    }
}

#[test]
fn clamps_at_lower_edge_with_maximum_noise() {
    let edge = [
        (SensorKind::SoilMoisture, 20.1),
        (SensorKind::WaterFlow, 1.05),
        (SensorKind::SoilPh, 4.01),
        (SensorKind::CropHealth, 60.1),
        (SensorKind::Nutrient, 100.1),
    ];

    for (kind, value) in edge {
        let next = advance_reading(&sensor("SN-X", kind, value, SensorStatus::Online), &mut MinRng);
        assert!(
            next.value >= kind.range().min,
            "{kind:?} escaped lower bound: {}",
            next.value
        );
        assert!(next.value <= value);
    }
}

#[test]
fn values_never_leave_range_over_many_seeds() {
    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut fleet: Vec<SensorReading> = SensorKind::ALL
            .iter()
            .map(|&kind| sensor("SN-X", kind, kind.range().max, SensorStatus::Online))
            .collect();

        for _ in 0..200 {
            fleet = tick(&fleet, &mut rng).into_vec();
            for s in &fleet {
                assert!(s.kind.range().contains(s.value), "{:?} = {}", s.kind, s.value);
            }
        }
    }
}

#[test]
fn drift_is_bounded_per_tick() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut current = sensor("SN-A101", SensorKind::SoilMoisture, 42.4, SensorStatus::Online);

    for _ in 0..1_000 {
        let next = advance_reading(&current, &mut rng);
        assert!((next.position.lat - current.position.lat).abs() <= DRIFT_SPAN);
        assert!((next.position.lng - current.position.lng).abs() <= DRIFT_SPAN);
        current = next;
    }
}

#[test]
fn offline_sensors_are_frozen() {
    let mut rng = StdRng::seed_from_u64(9);
    let frozen = sensor("SN-OFF", SensorKind::Nutrient, 240.0, SensorStatus::Offline);
    let mut fleet = vec![frozen.clone()];

    for _ in 0..100 {
        fleet = tick(&fleet, &mut rng).into_vec();
    }

    assert_eq!(fleet[0], frozen);
}

#[test]
fn low_power_sensors_still_move() {
    let fleet = Fleet::new(vec![sensor(
        "SN-A102",
        SensorKind::SoilMoisture,
        38.1,
        SensorStatus::LowPower,
    )]);
    let before = fleet.snapshot();
    for _ in 0..10 {
        fleet.advance();
    }
    let after = fleet.snapshot();
    assert_ne!(after.sensors[0].position, before.sensors[0].position);
}

#[test]
fn soil_moisture_walk_stays_in_range_and_moves() {
    let fleet = Fleet::new(vec![sensor(
        "SN-A101",
        SensorKind::SoilMoisture,
        42.4,
        SensorStatus::Online,
    )]);

    let mut moved = false;
    for _ in 0..100 {
        let snapshot = fleet.advance();
        moved |= snapshot.sensors[0].value != 42.4;
    }

    let snapshot = fleet.snapshot();
    let value = snapshot.sensors[0].value;
    assert_eq!(snapshot.tick, 100);
    assert!((20.0..=80.0).contains(&value));
    // A random walk may come back to its start, but never staying put is a
    // sign the generator is a no-op.
    assert!(moved, "soil moisture never left 42.4 in 100 ticks");
}

#[test]
fn history_has_window_length_and_ends_at_current() {
    let now = Zoned::now();
    for window in [HistoryWindow::Day, HistoryWindow::Week, HistoryWindow::Month] {
        let first = history_series(SensorKind::SoilMoisture, 42.4, window);
        let second = history_series(SensorKind::SoilMoisture, 42.4, window);

        assert_eq!(first.len(), window.points());
        assert_eq!(second.len(), window.points());
        assert_eq!(first.last().unwrap().value, 42.4);
        assert_eq!(second.last().unwrap().value, 42.4);

        let mut rng = StdRng::seed_from_u64(1);
        let seeded = history_series_at(SensorKind::SoilMoisture, 42.4, window, &now, &mut rng);
        let mut rng = StdRng::seed_from_u64(1);
        let again = history_series_at(SensorKind::SoilMoisture, 42.4, window, &now, &mut rng);
        assert_eq!(seeded, again);
    }
}

#[test]
fn history_respects_kind_range() {
    let mut rng = StdRng::seed_from_u64(77);
    let now = Zoned::now();
    for kind in SensorKind::ALL {
        let current = kind.range().min;
        let series = history_series_at(kind, current, HistoryWindow::Month, &now, &mut rng);
        for point in &series {
            assert!(kind.range().contains(point.value), "{kind:?}: {}", point.value);
        }
        assert_eq!(series.last().unwrap().value, current);
    }
}

#[test]
fn history_labels_follow_window() {
    let now = Zoned::now();
    let mut rng = StdRng::seed_from_u64(3);

    let hourly = history_series_at(SensorKind::WaterFlow, 8.4, HistoryWindow::Day, &now, &mut rng);
    assert!(hourly.iter().all(|p| p.label.ends_with(":00")));
    assert_eq!(&*hourly.last().unwrap().label, format!("{}:00", now.hour()));

    let daily = history_series_at(SensorKind::WaterFlow, 8.4, HistoryWindow::Week, &now, &mut rng);
    assert!(daily.iter().all(|p| p.label.contains('/')));
    assert_eq!(
        &*daily.last().unwrap().label,
        format!("{}/{}", now.month(), now.day())
    );
}

#[test]
fn history_does_not_touch_the_fleet() {
    let fleet = Fleet::seeded();
    let before = fleet.snapshot();
    let reading = fleet.get("SN-PH401").unwrap();

    let _ = history_series(reading.kind, reading.value, HistoryWindow::Week);

    let after = fleet.snapshot();
    assert_eq!(before.tick, after.tick);
    assert_eq!(before.sensors, after.sensors);
}

#[tokio::test(start_paused = true)]
async fn ticker_advances_until_stopped() {
    let fleet = Fleet::seeded();
    let generator = TelemetryGenerator::new(fleet.clone(), Duration::from_secs(3));
    let session = CancellationToken::new();

    let ticker = generator.start(&session);
    assert_eq!(ticker.state(), GeneratorState::Ticking);

    tokio::time::sleep(Duration::from_secs(10)).await;
    let ticks = fleet.snapshot().tick;
    assert!(ticks >= 3, "expected at least 3 ticks, saw {ticks}");

    ticker.stop().await;

    let frozen_at = fleet.snapshot().tick;
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(fleet.snapshot().tick, frozen_at);
}

#[tokio::test(start_paused = true)]
async fn no_tick_before_first_interval() {
    let fleet = Fleet::seeded();
    let generator = TelemetryGenerator::new(fleet.clone(), Duration::from_secs(3));
    let session = CancellationToken::new();
    let _ticker = generator.start(&session);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(fleet.snapshot().tick, 0);
}

#[tokio::test(start_paused = true)]
async fn parent_cancellation_stops_ticker() {
    let fleet = Fleet::seeded();
    let generator = TelemetryGenerator::new(fleet.clone(), Duration::from_secs(3));
    let session = CancellationToken::new();
    let ticker = generator.start(&session);

    tokio::time::sleep(Duration::from_secs(4)).await;
    session.cancel();
    assert_eq!(ticker.state(), GeneratorState::Idle);

    tokio::task::yield_now().await;
    let frozen_at = fleet.snapshot().tick;
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(fleet.snapshot().tick, frozen_at);
}

#[tokio::test(start_paused = true)]
async fn dropping_ticker_stops_ticking() {
    let fleet = Fleet::seeded();
    let generator = TelemetryGenerator::new(fleet.clone(), Duration::from_secs(3));
    let session = CancellationToken::new();

    {
        let _ticker = generator.start(&session);
        tokio::time::sleep(Duration::from_secs(4)).await;
    }

    tokio::task::yield_now().await;
    let frozen_at = fleet.snapshot().tick;
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(fleet.snapshot().tick, frozen_at);
}

#[tokio::test(start_paused = true)]
async fn zero_interval_is_raised_to_minimum() {
    let fleet = Fleet::seeded();
    let generator = TelemetryGenerator::new(fleet.clone(), Duration::ZERO);
    assert_eq!(generator.interval(), TelemetryGenerator::MIN_INTERVAL);

    let ticker = generator.start(&CancellationToken::new());
    tokio::time::sleep(Duration::from_millis(10)).await;
    ticker.stop().await;

    assert!(fleet.snapshot().tick >= 1);
}
