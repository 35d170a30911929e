//! The retained location and its update rules
//!
//! Each client keeps exactly one `Location`, created with the client and
//! mutated in place as TPV reports arrive. Observers are notified only
//! when an observable field actually changed.

use chrono::{DateTime, Utc};

use crate::protocol::{response::Tpv, types::FixMode};

/// Quality of the current GPS solution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Fix {
    /// No position solution
    #[default]
    NoFix,
    /// Latitude/longitude solution
    TwoD,
    /// Latitude/longitude/altitude solution
    ThreeD,
}

/// The most recent fix reported by the daemon.
///
/// `latitude` and `longitude` are either both present or both absent; a
/// report without a complete coordinate pair leaves the previous pair in
/// place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    /// Time of the fix, from the report's `time` field
    pub timestamp: Option<DateTime<Utc>>,
    /// Solution quality
    pub fix: Fix,
    /// Latitude in decimal degrees
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees
    pub longitude: Option<f64>,
}

/// Folds TPV reports into the single retained [`Location`].
#[derive(Debug, Default)]
pub(crate) struct LocationTracker {
    current: Location,
}

impl LocationTracker {
    pub(crate) fn current(&self) -> &Location {
        &self.current
    }

    /// Applies one TPV report in arrival order.
    ///
    /// Returns true when an observable field (fix quality or the
    /// coordinate pair) changed; a timestamp refresh alone does not count.
    pub(crate) fn apply(&mut self, report: &Tpv) -> bool {
        let mut changed = false;

        if report.time.is_some() {
            self.current.timestamp = report.time;
        }

        let fix = match report.mode {
            FixMode::NotSeen => None,
            FixMode::NoFix => Some(Fix::NoFix),
            FixMode::Fix2D => Some(Fix::TwoD),
            FixMode::Fix3D => Some(Fix::ThreeD),
        };
        if let Some(fix) = fix {
            if self.current.fix != fix {
                self.current.fix = fix;
                changed = true;
            }
        }

        // Coordinates move as a pair; an incomplete pair never clears a
        // previously known position.
        if let (Some(lat), Some(lon)) = (report.lat, report.lon) {
            if self.current.latitude != Some(lat) || self.current.longitude != Some(lon) {
                self.current.latitude = Some(lat);
                self.current.longitude = Some(lon);
                changed = true;
            }
        }

        changed
    }
}
