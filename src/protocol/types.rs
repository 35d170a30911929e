use serde::{Deserialize, Serialize};
use serde_repr::Deserialize_repr;
use serde_with::skip_serializing_none;

use crate::protocol::GpsdRequestable;

/// * [gps_fix_t.mode](https://gitlab.com/gpsd/gpsd/-/blob/release-3.25/include/gps.h?ref_type=tags#L181)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize_repr)]
#[repr(i32)]
pub enum FixMode {
    NotSeen = 0,
    NoFix = 1,
    Fix2D = 2,
    Fix3D = 3,
}

/// # Watch Policy
/// - [json_watch_read](https://gitlab.com/gpsd/gpsd/-/blob/master/libgps/shared_json.c#L95)
///
/// Sent to switch the daemon into streaming mode; echoed back by the
/// daemon as a WATCH acknowledgement.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Watch {
    pub device: Option<String>,
    pub enable: Option<bool>,
    pub json: Option<bool>,
}

impl Watch {
    /// Policy that enables JSON-streamed reports.
    pub fn json() -> Self {
        Watch {
            enable: Some(true),
            json: Some(true),
            ..Default::default()
        }
    }
}

impl GpsdRequestable for Watch {
    fn to_command(&self) -> String {
        format!("?WATCH={}", serde_json::to_string(self).unwrap())
    }
}
