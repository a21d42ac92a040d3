//! Execution diagnostics: timing and counts for a single pipeline run.
//!
//! Every call to [`PipelineExecutor::execute`](crate::PipelineExecutor::execute)
//! collects diagnostics alongside the final image stack.
//!
//! Timestamps are captured via the `web-time` crate, which uses
//! `performance.now()` on WASM and `std::time::Instant` on native.
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::action::ActionKind;
use crate::types::Dimensions;

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionDiagnostics {
    /// Time spent in the loader (seconds).
    #[serde(with = "duration_serde")]
    pub load_duration: Duration,
    /// Time spent walking the step graph (seconds).
    #[serde(with = "duration_serde")]
    pub walk_duration: Duration,
    /// Time spent in the saver (seconds).
    #[serde(with = "duration_serde")]
    pub save_duration: Duration,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Actions applied, per shape.
    pub actions: ActionCounts,
    /// Branching nodes entered.
    pub branches: usize,
    /// Combinators invoked.
    pub merges: usize,
    /// Frames retained by the final stack.
    pub final_frames: usize,
    /// Dimensions of the final stack's current frame.
    pub final_dimensions: Dimensions,
}

/// Number of applied actions per [`ActionKind`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCounts {
    /// Whole-frame procedures.
    pub mutate: usize,
    /// Per-pixel color maps.
    pub color: usize,
    /// Coordinate-aware color maps.
    pub coordinate: usize,
    /// Neighborhood-aware color maps.
    pub neighborhood: usize,
    /// Coordinate- and neighborhood-aware color maps.
    pub coordinate_neighborhood: usize,
}

impl ActionCounts {
    /// Count one applied action.
    pub const fn record(&mut self, kind: ActionKind) {
        let slot = match kind {
            ActionKind::Mutate => &mut self.mutate,
            ActionKind::Color => &mut self.color,
            ActionKind::Coordinate => &mut self.coordinate,
            ActionKind::Neighborhood => &mut self.neighborhood,
            ActionKind::CoordinateNeighborhood => &mut self.coordinate_neighborhood,
        };
        *slot += 1;
    }

    /// All applied actions.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.mutate + self.color + self.coordinate + self.neighborhood + self.coordinate_neighborhood
    }
}

impl ExecutionDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Execution Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Final image: {} ({} pixels), {} frame(s) retained",
            self.final_dimensions,
            self.final_dimensions.pixel_count(),
            self.final_frames,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!("{:<12} {:>10} {:>10}", "Phase", "Duration", "% Total"));
        lines.push("-".repeat(34));
        let total_ms = duration_ms(self.total_duration);
        for (name, duration) in [
            ("Load", self.load_duration),
            ("Walk", self.walk_duration),
            ("Save", self.save_duration),
        ] {
            let ms = duration_ms(duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!("{name:<12} {ms:>8.3}ms {pct:>9.1}%"));
        }

        lines.push(String::new());
        let a = &self.actions;
        lines.push(format!(
            "Actions: {} (mutate {}, color {}, color+location {}, color+surround {}, color+location+surround {})",
            a.total(),
            a.mutate,
            a.color,
            a.coordinate,
            a.neighborhood,
            a.coordinate_neighborhood,
        ));
        lines.push(format!(
            "Branches: {}  |  Merges: {}",
            self.branches, self.merges,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to fractional milliseconds.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
