//! Report messages streamed by the daemon
//!
//! Response messages are identified by their "class" field in the JSON
//! structure. Only TPV (Time-Position-Velocity) reports are significant to
//! this client; everything else is decoded far enough to be recognized and
//! ignored.
//!
//! All timestamps use the ISO 8601 format and are represented as
//! `DateTime<Utc>`.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::types::{FixMode, Watch};

/// Time-Position-Velocity (TPV) report
///
/// The TPV message is the core GPS fix report, containing time, position,
/// and velocity data.
///
/// Reference: [json_tpv_read](https://gitlab.com/gpsd/gpsd/-/blob/master/libgps/libgps_json.c?ref_type=heads#L34)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tpv {
    /// Altitude in meters (deprecated, use altMSL or altHAE)
    pub alt: Option<f64>,
    /// Climb/sink rate in meters per second
    pub climb: Option<f64>,
    /// Device path that provided this data
    pub device: Option<String>,
    /// Latitude in degrees (positive = North)
    #[serde(default, deserialize_with = "lenient_degrees")]
    pub lat: Option<f64>,
    /// Longitude in degrees (positive = East)
    #[serde(default, deserialize_with = "lenient_degrees")]
    pub lon: Option<f64>,
    /// GPS fix mode (NoFix, 2D, 3D)
    pub mode: FixMode,
    /// Speed over ground in meters/second
    pub speed: Option<f64>,
    /// GPS time of fix
    pub time: Option<DateTime<Utc>>,
    /// True track (course over ground) in degrees
    pub track: Option<f64>,
    #[cfg(feature = "extra-fields")]
    /// Additional fields not explicitly defined
    #[serde(flatten)]
    extra: std::collections::HashMap<String, serde_json::Value>,
}

/// GPSD daemon version information
///
/// Reports version and protocol information about the GPSD server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Version {
    /// GPSD release version string
    pub release: String,
    /// Git revision hash
    pub rev: String,
    /// Protocol major version number
    pub proto_major: i32,
    /// Protocol minor version number
    pub proto_minor: i32,
    /// Remote server URL (if applicable)
    pub remote: Option<String>,
}

/// GPSD response message types
///
/// Each named variant corresponds to a "class" value in the JSON response;
/// any other class lands in `Other` and is ignored by the client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "class", rename_all = "UPPERCASE")]
pub enum Message {
    /// Time-Position-Velocity report
    Tpv(Tpv),
    /// Current watch settings
    Watch(Watch),
    /// GPSD version information
    Version(Version),
    /// Unknown/unsupported message type
    #[serde(untagged)]
    Other(serde_json::Value),
}

/// Decimal degrees arrive either as a JSON number or as a quoted string.
fn lenient_degrees<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Degrees {
        Number(f64),
        Text(String),
    }

    let value = Option::<Degrees>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(Degrees::Number(n)) => Ok(Some(n)),
        Some(Degrees::Text(s)) => s.trim().parse::<f64>().map(Some).map_err(|_| {
            serde::de::Error::custom(format!("invalid degrees value: {:?}", s))
        }),
    }
}
