/// Decoding of the Wave Mini current values characteristic
use crate::error::Error;
use crate::models::Reading;
use crate::utils::round_to;

/// Size of the current values characteristic payload
pub const CURRENT_VALUES_LEN: usize = 20;

/// Absolute zero in centikelvin
const ZERO_CELSIUS_CK: f64 = 27315.0;

/// Decode the current values characteristic into a [`Reading`]
///
/// The payload is 20 bytes, little-endian:
/// - Words 0-5: six unsigned 16-bit fields
///   - word 1: temperature in centikelvin
///   - word 3: relative humidity in 0.01 %rH
///   - word 4: VOC in ppm
///   - words 0, 2, 5: not used here
/// - Bytes 12-19: two unsigned 32-bit fields (not used here)
///
/// Temperature is rounded to two decimals, halves away from zero.
pub fn decode(raw: &[u8]) -> Result<Reading, Error> {
    let raw: &[u8; CURRENT_VALUES_LEN] = raw.try_into().map_err(|_| Error::MalformedPayload {
        expected: CURRENT_VALUES_LEN,
        actual: raw.len(),
    })?;

    let word = |index: usize| u16::from_le_bytes([raw[index * 2], raw[index * 2 + 1]]);

    let temperature = round_to((f64::from(word(1)) - ZERO_CELSIUS_CK) / 100.0, 2);
    let humidity = f64::from(word(3)) / 100.0;
    let voc = word(4);

    Ok(Reading {
        temperature,
        humidity,
        voc,
    })
}
