pub mod geoloc;
pub mod status;

use crate::bits::BitString;

/// Width of a status/battery frame in bits.
pub const STATUS_FRAME_BITS: usize = 16;
/// Width of a geolocation frame after left-zero padding.
pub const GEOLOC_FRAME_BITS: usize = 88;
/// Minimum significant width for a payload to be treated as geolocation.
pub const GEOLOC_MIN_RAW_BITS: usize = 60;

/// Frame shapes the wire format carries.
///
/// The format has no explicit type tag; the shape is implied by the decoded
/// bit width. Anything that matches neither known shape is [`Unsupported`]
/// rather than an error, so one odd payload never aborts the stream.
///
/// [`Unsupported`]: FrameKind::Unsupported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Status,
    Geolocation,
    Unsupported,
}

/// Classify a payload decoded at minimum width [`STATUS_FRAME_BITS`].
///
/// Checks run in fixed priority order: exact status width first, then the
/// geolocation minimum significant width.
pub fn classify(bits: &BitString) -> FrameKind {
    if bits.width() == STATUS_FRAME_BITS {
        FrameKind::Status
    } else if bits.raw_width() >= GEOLOC_MIN_RAW_BITS {
        FrameKind::Geolocation
    } else {
        FrameKind::Unsupported
    }
}
