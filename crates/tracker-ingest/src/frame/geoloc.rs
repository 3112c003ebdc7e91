/// Geolocation frame: fixed-point degrees/minutes/seconds position.
use std::fmt;

use nom::{
    bits::{bits, complete::take},
    sequence::tuple,
    Finish, IResult,
};

use super::GEOLOC_FRAME_BITS;
use crate::{bits::BitString, Error, TIResult};

/// Denominator of the 17-bit seconds field; the raw value scales to seconds
/// as `raw / 100000 * 60`, so raw 100000 is exactly 60 seconds.
const SEC_SCALE: f64 = 100_000.0;

/// Hemisphere carried in a single sign bit per coordinate: 0 is South/West,
/// 1 is North/East.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    fn latitude(bit: u8) -> TIResult<Self> {
        match bit {
            0 => Ok(Hemisphere::South),
            1 => Ok(Hemisphere::North),
            other => Err(Error::DecodeError(format!(
                "latitude hemisphere bit {other}, should be 0 or 1"
            ))),
        }
    }

    fn longitude(bit: u8) -> TIResult<Self> {
        match bit {
            0 => Ok(Hemisphere::West),
            1 => Ok(Hemisphere::East),
            other => Err(Error::DecodeError(format!(
                "longitude hemisphere bit {other}, should be 0 or 1"
            ))),
        }
    }

    fn sign(self) -> f64 {
        match self {
            Hemisphere::North | Hemisphere::East => 1.0,
            Hemisphere::South | Hemisphere::West => -1.0,
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Hemisphere::North => 'N',
            Hemisphere::South => 'S',
            Hemisphere::East => 'E',
            Hemisphere::West => 'W',
        };
        write!(f, "{letter}")
    }
}

/// Decoded geolocation frame, as both DMS text and signed decimal degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct GeolocationReading {
    pub latitude_dms: String,
    pub longitude_dms: String,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

/// Decode an 88-bit geolocation frame.
///
/// Layout, MSB first: latitude degrees (8 bits), minutes (6), seconds
/// numerator (17), hemisphere (1), then the same four fields for longitude,
/// then 24 reserved bits ignored by the current protocol. The decimal degree
/// value is `sign * (deg + min/60 + sec/3600)` with the hemisphere bit
/// supplying the sign.
///
/// Rejects any width other than 88 with [`Error::FrameLengthMismatch`]; an
/// oversized payload padded past 88 bits lands here rather than being
/// silently truncated.
pub fn parse(payload: &BitString) -> TIResult<GeolocationReading> {
    if payload.width() != GEOLOC_FRAME_BITS {
        return Err(Error::FrameLengthMismatch {
            expected: GEOLOC_FRAME_BITS,
            actual: payload.width(),
        });
    }
    let nom_res = nom_parse(payload.as_bytes());
    let (lat_deg, lat_min, lat_sec_raw, lat_hem_bit, long_deg, long_min, long_sec_raw, long_hem_bit) =
        nom_res
            .finish()
            .map(|(_, fields)| fields)
            .map_err(Error::from)?;

    let lat_hem = Hemisphere::latitude(lat_hem_bit)?;
    let long_hem = Hemisphere::longitude(long_hem_bit)?;
    let lat_sec = lat_sec_raw as f64 / SEC_SCALE * 60.0;
    let long_sec = long_sec_raw as f64 / SEC_SCALE * 60.0;

    Ok(GeolocationReading {
        latitude_dms: dms_text(lat_deg, lat_min, lat_sec, lat_hem),
        longitude_dms: dms_text(long_deg, long_min, long_sec, long_hem),
        latitude_deg: signed_degrees(lat_deg, lat_min, lat_sec, lat_hem),
        longitude_deg: signed_degrees(long_deg, long_min, long_sec, long_hem),
    })
}

fn nom_parse(bytes: &[u8]) -> IResult<&[u8], (u8, u8, u32, u8, u8, u8, u32, u8)> {
    bits::<_, _, nom::error::Error<(&[u8], usize)>, _, _>(tuple((
        take(8usize),
        take(6usize),
        take(17usize),
        take(1usize),
        take(8usize),
        take(6usize),
        take(17usize),
        take(1usize),
    )))(bytes)
}

fn dms_text(deg: u8, min: u8, sec: f64, hem: Hemisphere) -> String {
    format!("{deg}°{min}'{sec}\"{hem}")
}

fn signed_degrees(deg: u8, min: u8, sec: f64, hem: Hemisphere) -> f64 {
    hem.sign() * (deg as f64 + min as f64 / 60.0 + sec / 3600.0)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lazy_init_tracing;

    fn decode(hex: &str) -> GeolocationReading {
        let bits = BitString::from_hex(hex, GEOLOC_FRAME_BITS).unwrap();
        parse(&bits).unwrap()
    }

    #[test]
    fn test_known_position_frame() {
        lazy_init_tracing();
        // Captured from a live device; 86 significant bits, padded to 88.
        let reading = decode("2b82ee3901793f7100df21");
        assert!((reading.latitude_deg - 43.549338).abs() < 1e-6);
        assert!((reading.longitude_deg - 1.5068147).abs() < 1e-6);
        assert!(reading.latitude_dms.starts_with("43°32'57.6"));
        assert!(reading.latitude_dms.ends_with("\"N"));
        assert!(reading.longitude_dms.starts_with("1°30'24.5"));
        assert!(reading.longitude_dms.ends_with("\"E"));
    }

    #[test]
    fn test_decode_is_deterministic() {
        lazy_init_tracing();
        let first = decode("2b82ee3901793f7100df21");
        for _ in 0..10 {
            assert_eq!(decode("2b82ee3901793f7100df21"), first);
        }
    }

    #[test]
    fn test_seconds_boundaries() {
        lazy_init_tracing();
        // lat 43°32' with sec_raw 100000 (exactly 60"), long 1°30' with
        // sec_raw 0, both hemisphere bits set (N/E).
        let reading = decode("2b830d4101780001000000");
        assert_eq!(reading.latitude_dms, "43°32'60\"N");
        assert_eq!(reading.longitude_dms, "1°30'0\"E");
        assert!((reading.latitude_deg - 43.55).abs() < 1e-9);
        assert!((reading.longitude_deg - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_hemisphere_signs() {
        lazy_init_tracing();
        // Same frame as above with both hemisphere bits cleared (S/W).
        let reading = decode("2b830d4001780000000000");
        assert!(reading.latitude_deg < 0.0);
        assert!(reading.longitude_deg < 0.0);
        assert!(reading.latitude_dms.ends_with("\"S"));
        assert!(reading.longitude_dms.ends_with("\"W"));
        assert!((reading.latitude_deg + 43.55).abs() < 1e-9);
        assert!((reading.longitude_deg + 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_oversized_payload_rejected() {
        lazy_init_tracing();
        // 96 significant bits pad past 88; the parser must refuse rather
        // than truncate.
        let oversized = BitString::from_hex("ff2b82ee3901793f7100df21", GEOLOC_FRAME_BITS).unwrap();
        assert!(matches!(
            parse(&oversized),
            Err(Error::FrameLengthMismatch {
                expected: 88,
                actual: 96
            })
        ));
    }
}
