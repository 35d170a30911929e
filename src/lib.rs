//! # gpsd-client
//!
//! A Rust client for tracking the current position fix from GPSD (GPS Service
//! Daemon) over its JSON streaming protocol.
//!
//! The client opens a TCP connection to a GPSD instance, enables JSON watch
//! mode, and incrementally reassembles the newline-delimited byte stream into
//! discrete report messages. Time-Position-Velocity ("TPV") reports are folded
//! into a single retained [`location::Location`] that can be read at any time
//! and observed for changes; every other report class is received and ignored.
//!
//! ## Overview
//!
//! GPSD is a service daemon that monitors one or more GPSes or AIS receivers
//! attached to a host computer, making all data on the location/course/velocity
//! of the sensors available to be queried on TCP port 2947 of the host.
//!
//! Two usage shapes are supported over the same pipeline: a one-shot read that
//! resolves with the first fix and stops, and a continuous mode that keeps the
//! retained location current in the background.
//!
//! ## Example
//!
//! ```ignore
//! use gpsd_client::client::GpsdClient;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect to GPSD and enable JSON streaming
//!     let mut client = GpsdClient::new();
//!     client.connect().await?;
//!
//!     // One-shot: resolve with the first reported fix
//!     let location = client.get_location().await?;
//!     println!(
//!         "fix {:?} at {:?}/{:?}",
//!         location.fix, location.latitude, location.longitude
//!     );
//!
//!     client.close();
//!     Ok(())
//! }
//! ```

use crate::error::GpsdClientError;

/// Client module for connection lifecycle and the observable location
pub mod client;

/// Error types used throughout the library
pub mod error;

/// The retained location and the state machine maintaining it
pub mod location;

/// Wire protocol: line framing, watch policy, and report parsing
pub mod protocol;

/// Convenience type alias for Results with GpsdClientError
pub type Result<T> = core::result::Result<T, GpsdClientError>;
