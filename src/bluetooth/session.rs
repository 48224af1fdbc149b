/// Connection lifecycle for a single Wave Mini
use bluer::{Address, Uuid};
use log::{debug, info, warn};
use std::time::Duration;

use crate::bluetooth::scanner::{discover, DEFAULT_SCAN_SLICE, DEFAULT_SCAN_WINDOW};
use crate::bluetooth::{Link, Scanner};
use crate::codec::decode;
use crate::error::{BleError, Error};
use crate::models::Reading;

/// Current values characteristic of the Wave Mini
pub const CURRENT_VALUES_UUID: Uuid = Uuid::from_u128(0xb42e3b98_ade7_11e4_89d3_123b93f75cba);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

/// An open link and the resolved current values characteristic
struct ConnectionHandle<L: Link> {
    address: Address,
    connection: L::Connection,
    characteristic: L::Characteristic,
}

/// Connect, read and disconnect cycle bound to one serial number
///
/// The radio address is looked up by scanning the first time it is needed
/// and cached for the lifetime of the session. At most one link is open at
/// a time. There is no async drop: callers must `disconnect` on every exit
/// path.
pub struct Session<S, L: Link> {
    serial_number: u32,
    scanner: S,
    link: L,
    scan_window: Duration,
    scan_slice: Duration,
    cached_address: Option<Address>,
    handle: Option<ConnectionHandle<L>>,
    state: SessionState,
}

impl<S: Scanner, L: Link> Session<S, L> {
    pub fn new(serial_number: u32, scanner: S, link: L) -> Self {
        Self {
            serial_number,
            scanner,
            link,
            scan_window: DEFAULT_SCAN_WINDOW,
            scan_slice: DEFAULT_SCAN_SLICE,
            cached_address: None,
            handle: None,
            state: SessionState::Disconnected,
        }
    }

    /// Override the discovery window and slice length
    pub fn with_scan_window(mut self, window: Duration, slice: Duration) -> Self {
        self.scan_window = window;
        self.scan_slice = slice;
        self
    }

    /// Use a known radio address instead of scanning for it
    pub fn with_address(mut self, address: Address) -> Self {
        self.cached_address = Some(address);
        self
    }

    pub fn serial_number(&self) -> u32 {
        self.serial_number
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn cached_address(&self) -> Option<Address> {
        self.cached_address
    }

    #[cfg(test)]
    pub(crate) fn link(&self) -> &L {
        &self.link
    }

    /// Whether the open link, if any, still reports itself connected
    pub async fn is_connected(&self) -> bool {
        match &self.handle {
            Some(handle) => self
                .link
                .is_connected(&handle.connection)
                .await
                .unwrap_or(false),
            None => false,
        }
    }

    /// Connect to the device, making up to `retries` attempts
    ///
    /// Each attempt scans for the device first if its address is not yet
    /// known. A failed discovery still counts as an attempt; if the radio
    /// could not scan at all, its fault is kept as the last error. Returns
    /// `ConnectionFailed` with the last fault once all attempts are used;
    /// the session is then `Disconnected`.
    pub async fn connect(&mut self, retries: u32) -> Result<(), Error> {
        if self.is_connected().await {
            return Ok(());
        }
        // Link dropped underneath us
        self.release().await;

        let mut last_error = BleError::NotConnected;
        let mut attempts = 0;

        while attempts < retries {
            attempts += 1;
            self.state = SessionState::Connecting;

            if self.cached_address.is_none() {
                match discover(
                    &mut self.scanner,
                    self.serial_number,
                    self.scan_window,
                    self.scan_slice,
                )
                .await
                {
                    Ok(address) => self.cached_address = address,
                    Err(e) => {
                        warn!("Scanning failed on attempt {}/{}: {}", attempts, retries, e);
                        last_error = e;
                        continue;
                    }
                }
            }

            match self.establish().await {
                Ok(handle) => {
                    info!(
                        "Connected to serial number {} at {} (attempt {}/{})",
                        self.serial_number, handle.address, attempts, retries
                    );
                    self.handle = Some(handle);
                    self.state = SessionState::Connected;
                    return Ok(());
                }
                Err(e) => {
                    warn!("Connection attempt {}/{} failed: {}", attempts, retries, e);
                    last_error = e;
                }
            }
        }

        self.state = SessionState::Disconnected;
        Err(Error::ConnectionFailed {
            attempts,
            source: last_error,
        })
    }

    /// Open a link to the cached address and resolve the characteristic
    async fn establish(&mut self) -> Result<ConnectionHandle<L>, BleError> {
        let address = self
            .cached_address
            .ok_or(BleError::AddressUnresolved(self.serial_number))?;

        debug!("Opening link to {}", address);
        let connection = self.link.open(address).await?;

        match self
            .link
            .resolve_characteristic(&connection, CURRENT_VALUES_UUID)
            .await
        {
            Ok(characteristic) => Ok(ConnectionHandle {
                address,
                connection,
                characteristic,
            }),
            Err(e) => {
                if let Err(close_err) = self.link.close(connection).await {
                    warn!("Failed to close link to {}: {}", address, close_err);
                }
                Err(e)
            }
        }
    }

    /// Read and decode the current values
    pub async fn read(&mut self) -> Result<Reading, Error> {
        let handle = self
            .handle
            .as_ref()
            .ok_or(Error::ReadFailed(BleError::NotConnected))?;

        let raw = self
            .link
            .read(&handle.characteristic)
            .await
            .map_err(Error::ReadFailed)?;
        debug!("Read {} bytes from {}", raw.len(), handle.address);

        decode(&raw)
    }

    /// Close the link if one is open; safe to call in any state
    pub async fn disconnect(&mut self) {
        if self.release().await {
            info!("Disconnected from serial number {}", self.serial_number);
        }
    }

    /// Drop the handle, closing its link. Returns whether there was one.
    async fn release(&mut self) -> bool {
        let released = match self.handle.take() {
            Some(handle) => {
                if let Err(e) = self.link.close(handle.connection).await {
                    warn!("Failed to close link to {}: {}", handle.address, e);
                }
                true
            }
            None => false,
        };
        self.state = SessionState::Disconnected;
        released
    }
}
