//! Decoders for encoded station weather messages.
//!
//! [`synop`] handles WMO FM-12 surface reports (`AAXX` groups);
//! [`ttaa`] handles FM-35 upper-air sounding bulletins at the mandatory
//! pressure surfaces. Both decode the group subset the analysis pipeline
//! consumes and drop implausible values rather than failing the message.

pub mod synop;
pub mod ttaa;

pub use synop::{decode_synop, DecodedSynop};
pub use ttaa::{decode_ttaa, DecodedSounding, SoundingLevel};

use thiserror::Error;

/// Failure to decode a whole message. Per-group problems inside a valid
/// message are recovered by skipping the group.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Empty or NIL report")]
    Empty,

    #[error("Invalid report format: {0}")]
    BadFormat(String),
}
