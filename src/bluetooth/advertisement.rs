/// Airthings manufacturer data decoding
use crate::models::ManufacturerPayload;

/// Airthings AS company identifier
pub const AIRTHINGS_COMPANY_ID: u16 = 0x0334;

/// Length of the manufacturer data blob: company id, serial, reserved
const MANUFACTURER_DATA_LEN: usize = 8;

impl ManufacturerPayload {
    /// Decode raw manufacturer data, company id included
    ///
    /// Layout, little-endian:
    /// - Bytes 0-1: company id
    /// - Bytes 2-5: serial number
    /// - Bytes 6-7: reserved
    ///
    /// Returns None unless the blob is exactly 8 bytes long.
    pub fn decode(data: &[u8]) -> Option<Self> {
        let data: &[u8; MANUFACTURER_DATA_LEN] = data.try_into().ok()?;
        Some(Self {
            company_id: u16::from_le_bytes([data[0], data[1]]),
            serial_number: u32::from_le_bytes([data[2], data[3], data[4], data[5]]),
            reserved: u16::from_le_bytes([data[6], data[7]]),
        })
    }
}

/// Extract an Airthings serial number from advertised manufacturer data
///
/// Other vendors' data is common during a scan and yields None.
pub fn parse_serial(data: &[u8]) -> Option<u32> {
    ManufacturerPayload::decode(data)
        .filter(|payload| payload.company_id == AIRTHINGS_COMPANY_ID)
        .map(|payload| payload.serial_number)
}
