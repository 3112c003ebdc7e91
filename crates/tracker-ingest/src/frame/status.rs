/// Status/battery frame: power state, movement state, and battery level.
use nom::{
    bits::{bits, complete::take},
    sequence::tuple,
    Finish, IResult,
};

use super::STATUS_FRAME_BITS;
use crate::{bits::BitString, Error, TIResult};

/// Alarm/keep-alive state carried in bit 0 of a status frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    KeepAlive,
    Alarm,
}

impl Status {
    fn from_bit(bit: u8) -> TIResult<Self> {
        match bit {
            0 => Ok(Status::KeepAlive),
            1 => Ok(Status::Alarm),
            other => Err(Error::DecodeError(format!(
                "status bit {other}, should be 0 or 1"
            ))),
        }
    }
}

/// Movement state carried in bit 1 of a status frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Stopped,
    Moving,
}

impl Movement {
    fn from_bit(bit: u8) -> TIResult<Self> {
        match bit {
            0 => Ok(Movement::Stopped),
            1 => Ok(Movement::Moving),
            other => Err(Error::DecodeError(format!(
                "movement bit {other}, should be 0 or 1"
            ))),
        }
    }
}

/// Decoded status frame.
///
/// Bits 2-15 carry the battery level as an unsigned millivolt count;
/// `battery_voltage` is that count divided by 1000.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReading {
    pub status: Status,
    pub movement: Movement,
    pub battery_voltage: f64,
}

/// Decode a 16-bit status frame.
///
/// Rejects any other width with [`Error::FrameLengthMismatch`]; a frame is
/// never truncated or padded to fit.
pub fn parse(payload: &BitString) -> TIResult<StatusReading> {
    if payload.width() != STATUS_FRAME_BITS {
        return Err(Error::FrameLengthMismatch {
            expected: STATUS_FRAME_BITS,
            actual: payload.width(),
        });
    }
    let nom_res = nom_parse(payload.as_bytes());
    let (status_bit, movement_bit, battery_mv) = nom_res
        .finish()
        .map(|(_, fields)| fields)
        .map_err(Error::from)?;
    Ok(StatusReading {
        status: Status::from_bit(status_bit)?,
        movement: Movement::from_bit(movement_bit)?,
        battery_voltage: battery_mv as f64 / 1000.0,
    })
}

fn nom_parse(bytes: &[u8]) -> IResult<&[u8], (u8, u8, u16)> {
    bits::<_, _, nom::error::Error<(&[u8], usize)>, _, _>(tuple((
        take(1usize),
        take(1usize),
        take(14usize),
    )))(bytes)
}
