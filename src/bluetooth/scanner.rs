/// Discovery of a Wave Mini by its advertised serial number
use bluer::Address;
use log::{debug, warn};
use std::time::Duration;

use crate::bluetooth::advertisement::parse_serial;
use crate::bluetooth::Scanner;
use crate::error::BleError;

/// Default total scan time
pub const DEFAULT_SCAN_WINDOW: Duration = Duration::from_secs(3);
/// Default length of a single scan slice
pub const DEFAULT_SCAN_SLICE: Duration = Duration::from_millis(100);

/// Scan for the device advertising `serial_number`
///
/// Runs `window / slice` short scans (rounded down) and returns the
/// address of the first advertisement carrying the serial number. Returns
/// None when the window passes without a match; the device may simply be
/// out of range. A failed slice is skipped, but if every slice failed the
/// last fault is returned.
///
/// # Arguments
/// * `scanner` - Radio used for scanning
/// * `serial_number` - Serial number to look for
/// * `window` - Total scan time
/// * `slice` - Duration of each individual scan
pub async fn discover<S: Scanner>(
    scanner: &mut S,
    serial_number: u32,
    window: Duration,
    slice: Duration,
) -> Result<Option<Address>, BleError> {
    let slices = window
        .as_nanos()
        .checked_div(slice.as_nanos())
        .unwrap_or(0);

    let mut last_fault = None;
    let mut heard_any = false;

    for count in 0..slices {
        let advertisements = match scanner.scan(slice).await {
            Ok(advertisements) => advertisements,
            Err(e) => {
                warn!("Scan slice {} failed: {}", count + 1, e);
                last_fault = Some(e);
                continue;
            }
        };
        heard_any = true;

        for adv in advertisements {
            let serial = adv.manufacturer_data.as_deref().and_then(parse_serial);
            if serial == Some(serial_number) {
                debug!(
                    "Found serial number {} at {} after {} slice(s)",
                    serial_number,
                    adv.address,
                    count + 1
                );
                return Ok(Some(adv.address));
            }
        }
    }

    match last_fault {
        Some(e) if !heard_any => Err(e),
        _ => {
            debug!(
                "Serial number {} not seen within {:?}",
                serial_number, window
            );
            Ok(None)
        }
    }
}
