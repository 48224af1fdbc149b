/// Error types for the acquisition core
use bluer::Uuid;
use thiserror::Error;

/// Faults reported by the radio capabilities (scan, connect, read)
#[derive(Debug, Error)]
pub enum BleError {
    #[error("BlueZ error: {0}")]
    Bluez(#[from] bluer::Error),

    /// Discovery never produced an address for the serial number
    #[error("no radio address found for serial number {0}")]
    AddressUnresolved(u32),

    #[error("characteristic {0} not found on device")]
    CharacteristicNotFound(Uuid),

    #[error("not connected")]
    NotConnected,
}

/// Errors surfaced to the polling loop
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed payload: expected {expected} bytes, got {actual}")]
    MalformedPayload { expected: usize, actual: usize },

    #[error("connection failed after {attempts} attempt(s): {source}")]
    ConnectionFailed {
        attempts: u32,
        #[source]
        source: BleError,
    },

    #[error("read failed: {0}")]
    ReadFailed(#[source] BleError),
}
