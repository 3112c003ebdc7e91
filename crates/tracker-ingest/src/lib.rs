/// Vehicle tracker frame ingestion library.
///
/// Tracker devices emit compact hexadecimal-encoded bitfield frames. The
/// [`bits`] module expands a hex payload into a padded [`bits::BitString`],
/// the [`frame`] parsers decode the two known frame shapes (status/battery
/// and geolocation), and the [`router`] classifies each inbound event,
/// persists the decoded reading, and fires alert notifications.
use std::sync::Once;

use thiserror::Error;

pub mod bits;
pub mod event;
pub mod frame;
pub mod router;

/// Result type for this library
pub type TIResult<T> = std::result::Result<T, Error>;

/// Error type for this library
#[derive(Debug, Error)]
pub enum Error {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    #[error("Frame length mismatch: expected {expected} bits, got {actual}")]
    FrameLengthMismatch { expected: usize, actual: usize },
    #[error("Decode error: {0}")]
    DecodeError(String),
    #[error("Malformed event: {0}")]
    MalformedEvent(String),
    #[error("Downstream call failed: {0}")]
    Downstream(String),
}

impl From<nom::error::Error<&[u8]>> for Error {
    fn from(err: nom::error::Error<&[u8]>) -> Self {
        Error::DecodeError(format!("{:?}", err))
    }
}

/// Test binary helper to init tracing. This is usually the responsibility of the consumer of the
/// library crate.
pub fn lazy_init_tracing() {
    {
        static INIT: Once = Once::new();
        &INIT
    }
    .call_once(|| {
        tracing_subscriber::fmt::init();
    });
}
