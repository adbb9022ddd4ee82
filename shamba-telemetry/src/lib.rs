pub mod fleet;
pub mod history;
pub mod seed;
pub mod simulate;
pub mod ticker;

pub use fleet::{Fleet, FleetSnapshot, FleetSummary, KindAverage};
pub use history::{HistoryPoint, HistoryWindow, UnknownWindow, history_series, history_series_at};
pub use seed::{FLEET_ORIGIN, initial_sensors};
pub use ticker::{GeneratorState, TelemetryGenerator, Ticker};
