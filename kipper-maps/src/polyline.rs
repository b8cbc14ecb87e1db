//! Decoder for the Google encoded polyline format.
//!
//! Directions responses carry their route geometry as an `overview_polyline`
//! string: zigzag-encoded lat/lng deltas at 1e-5 precision, five bits per
//! printable byte.

use kipper_core::model::Coordinate;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Errors while decoding an encoded polyline.
pub enum PolylineError {
    /// The string ended in the middle of a chunk or a coordinate pair.
    #[error("Truncated polyline")]
    Truncated,
    /// A byte outside the printable encoding range (63..=126).
    #[error("Invalid polyline byte: {0}")]
    InvalidByte(u8),
}

/// Decode an encoded polyline into coordinates.
///
/// # Errors
///
/// Returns a [`PolylineError`] when the input is truncated or contains a
/// byte outside the encoding alphabet.
pub fn decode(encoded: &str) -> Result<Vec<Coordinate>, PolylineError> {
    let mut bytes = encoded.bytes();
    let mut coordinates = Vec::new();
    let mut lat = 0i64;
    let mut lng = 0i64;

    while let Some(lat_delta) = read_delta(&mut bytes)? {
        let lng_delta = read_delta(&mut bytes)?.ok_or(PolylineError::Truncated)?;
        lat += lat_delta;
        lng += lng_delta;
        coordinates.push(Coordinate::new(lat as f64 / 1e5, lng as f64 / 1e5));
    }

    Ok(coordinates)
}

/// Read one zigzag-encoded delta; `Ok(None)` at a clean end of input.
fn read_delta(bytes: &mut impl Iterator<Item = u8>) -> Result<Option<i64>, PolylineError> {
    let mut accumulator = 0i64;
    let mut shift = 0u32;

    loop {
        let Some(byte) = bytes.next() else {
            return if shift == 0 {
                Ok(None)
            } else {
                Err(PolylineError::Truncated)
            };
        };
        if !(63..=126).contains(&byte) {
            return Err(PolylineError::InvalidByte(byte));
        }

        let chunk = i64::from(byte - 63);
        accumulator |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk & 0x20 == 0 {
            let delta = if accumulator & 1 == 1 {
                !(accumulator >> 1)
            } else {
                accumulator >> 1
            };
            return Ok(Some(delta));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_the_reference_vector() {
        // Worked example from the polyline format documentation.
        let path = decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@").expect("decode");

        assert_eq!(path.len(), 3);
        assert!((path[0].lat - 38.5).abs() < 1e-9);
        assert!((path[0].lng - -120.2).abs() < 1e-9);
        assert!((path[1].lat - 40.7).abs() < 1e-9);
        assert!((path[1].lng - -120.95).abs() < 1e-9);
        assert!((path[2].lat - 43.252).abs() < 1e-9);
        assert!((path[2].lng - -126.453).abs() < 1e-9);
    }

    #[test]
    fn empty_input_decodes_to_no_points() {
        assert_eq!(decode(""), Ok(Vec::new()));
    }

    #[test]
    fn truncated_input_is_rejected() {
        // A latitude delta with no longitude following it.
        assert_eq!(decode("_p~iF"), Err(PolylineError::Truncated));
        // A continuation bit with nothing after it.
        assert_eq!(decode("_p~iF~"), Err(PolylineError::Truncated));
    }

    #[test]
    fn bytes_outside_the_alphabet_are_rejected() {
        assert_eq!(decode("_p~iF\n"), Err(PolylineError::InvalidByte(b'\n')));
    }
}
