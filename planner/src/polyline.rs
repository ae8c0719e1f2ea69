//! Encoded polyline codec used by the routing provider.
//!
//! Each coordinate component is stored as a signed delta from the previous
//! point, in units of `10^-precision` degrees, zig-zag encoded and split into
//! 5-bit chunks offset by 63. Latitude and longitude alternate.
//!
//! The encoded string is the only stored form of a route's geometry; decoding
//! happens when a route is drawn.

use shared::GeoPoint;

/// Precision used by the routing provider (1e-5 degrees).
pub const PROVIDER_PRECISION: u32 = 5;

const CHUNK_MASK: u64 = 0x1F;
const CONTINUATION: u64 = 0x20;
const OFFSET: u8 = 63;
const MAX_VALUE_BITS: u32 = 32;
// seven 5-bit chunks cover a 32-bit value
const MAX_SHIFT: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid polyline byte 0x{byte:02x} at offset {index}")]
    InvalidByte { index: usize, byte: u8 },
    #[error("polyline ends inside a coordinate started at offset {index}")]
    Truncated { index: usize },
    #[error("latitude at offset {index} has no matching longitude")]
    MissingLongitude { index: usize },
    #[error("coordinate at offset {index} does not fit in {MAX_VALUE_BITS} bits")]
    Overflow { index: usize },
}

pub fn decode(encoded: &str) -> Result<Vec<GeoPoint>, DecodeError> {
    decode_with_precision(encoded, PROVIDER_PRECISION)
}

pub fn encode(points: &[GeoPoint]) -> String {
    encode_with_precision(points, PROVIDER_PRECISION)
}

/// Decode a polyline, failing on malformed input instead of returning a
/// truncated path.
pub fn decode_with_precision(encoded: &str, precision: u32) -> Result<Vec<GeoPoint>, DecodeError> {
    let bytes = encoded.as_bytes();
    let factor = scale(precision);
    let mut points = Vec::with_capacity(bytes.len() / 4);
    let (mut lat, mut lng) = (0i64, 0i64);
    let mut index = 0;

    while index < bytes.len() {
        let point_start = index;
        lat += next_delta(bytes, &mut index)?;
        if index >= bytes.len() {
            return Err(DecodeError::MissingLongitude { index: point_start });
        }
        lng += next_delta(bytes, &mut index)?;
        points.push(GeoPoint::new(lat as f64 / factor, lng as f64 / factor));
    }

    Ok(points)
}

pub fn encode_with_precision(points: &[GeoPoint], precision: u32) -> String {
    let factor = scale(precision);
    let mut encoded = String::with_capacity(points.len() * 8);
    let (mut prev_lat, mut prev_lng) = (0i64, 0i64);

    for point in points {
        let lat = (point.lat * factor).round() as i64;
        let lng = (point.lng * factor).round() as i64;
        push_delta(&mut encoded, lat - prev_lat);
        push_delta(&mut encoded, lng - prev_lng);
        prev_lat = lat;
        prev_lng = lng;
    }

    encoded
}

fn scale(precision: u32) -> f64 {
    10f64.powi(precision as i32)
}

fn next_delta(bytes: &[u8], index: &mut usize) -> Result<i64, DecodeError> {
    let start = *index;
    let mut result: u64 = 0;
    let mut shift = 0u32;

    loop {
        let byte = *bytes
            .get(*index)
            .ok_or(DecodeError::Truncated { index: start })?;
        if !(OFFSET..=126).contains(&byte) {
            return Err(DecodeError::InvalidByte { index: *index, byte });
        }
        if shift > MAX_SHIFT {
            return Err(DecodeError::Overflow { index: start });
        }
        *index += 1;

        let chunk = u64::from(byte - OFFSET);
        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;

        if chunk & CONTINUATION == 0 {
            break;
        }
    }

    if result > u64::from(u32::MAX) {
        return Err(DecodeError::Overflow { index: start });
    }

    let value = result as i64;
    Ok(if value & 1 == 1 { !(value >> 1) } else { value >> 1 })
}

fn push_delta(encoded: &mut String, delta: i64) {
    let zigzag = if delta < 0 { !(delta << 1) } else { delta << 1 };
    let mut value = zigzag as u64;
    while value >= CONTINUATION {
        encoded.push(char::from(((CONTINUATION | (value & CHUNK_MASK)) as u8) + OFFSET));
        value >>= 5;
    }
    encoded.push(char::from(value as u8 + OFFSET));
}
