use std::fmt;
use std::str::FromStr;

use jiff::{SignedDuration, Zoned};
use rand::Rng;
use serde::{Deserialize, Serialize};
use shamba_core::{BoxStr, SensorKind};
use thiserror::Error;

/// Look-back window for a synthetic history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HistoryWindow {
    /// 24 hourly points.
    #[default]
    #[serde(rename = "24h")]
    Day,
    /// 7 daily points.
    #[serde(rename = "7d")]
    Week,
    /// 30 daily points.
    #[serde(rename = "30d")]
    Month,
}

impl HistoryWindow {
    pub fn points(self) -> usize {
        match self {
            HistoryWindow::Day => 24,
            HistoryWindow::Week => 7,
            HistoryWindow::Month => 30,
        }
    }

    fn step_hours(self) -> i64 {
        match self {
            HistoryWindow::Day => 1,
            HistoryWindow::Week | HistoryWindow::Month => 24,
        }
    }

    fn label(self, at: &Zoned) -> BoxStr {
        match self {
            HistoryWindow::Day => format!("{}:00", at.hour()).into(),
            HistoryWindow::Week | HistoryWindow::Month => {
                format!("{}/{}", at.month(), at.day()).into()
            }
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown history window '{0}', expected 24h, 7d or 30d")]
pub struct UnknownWindow(pub String);

impl FromStr for HistoryWindow {
    type Err = UnknownWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(HistoryWindow::Day),
            "7d" => Ok(HistoryWindow::Week),
            "30d" => Ok(HistoryWindow::Month),
            other => Err(UnknownWindow(other.to_owned())),
        }
    }
}

impl fmt::Display for HistoryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HistoryWindow::Day => "24h",
            HistoryWindow::Week => "7d",
            HistoryWindow::Month => "30d",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub label: BoxStr,
    pub value: f64,
}

/// Synthesize a plausible past for a sensor currently reading `current`.
pub fn history_series(kind: SensorKind, current: f64, window: HistoryWindow) -> Vec<HistoryPoint> {
    history_series_at(kind, current, window, &Zoned::now(), &mut rand::rng())
}

/// Like [`history_series`], with an explicit clock and RNG.
///
/// Points are returned oldest first. The offset applied to a point grows with
/// its distance from `now`, so the newest point is exactly the current value
/// (clamped into the kind's range).
pub fn history_series_at<R: Rng>(
    kind: SensorKind,
    current: f64,
    window: HistoryWindow,
    now: &Zoned,
    rng: &mut R,
) -> Vec<HistoryPoint> {
    let range = kind.range();

    (0..window.points())
        .rev()
        .map(|steps_back| {
            let back = SignedDuration::from_hours(steps_back as i64 * window.step_hours());
            let label = now
                .timestamp()
                .checked_sub(back)
                .map(|ts| window.label(&ts.to_zoned(now.time_zone().clone())))
                .unwrap_or_else(|_| window.label(now));

            let offset =
                (rng.random::<f64>() - 0.5) * kind.history_variance() * steps_back as f64 * 0.2;
            let value = kind.round(range.clamp(current + offset));

            HistoryPoint { label, value }
        })
        .collect()
}
