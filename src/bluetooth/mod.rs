//! Bluetooth Low Energy discovery and GATT access for the Wave Mini
//!
//! The session logic is written against the [`Scanner`] and [`Link`]
//! capabilities; [`bluez::BluezRadio`] provides both on Linux.
#![allow(async_fn_in_trait)]

pub mod advertisement;
pub mod bluez;
pub mod scanner;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

use bluer::{Address, Uuid};
use std::time::Duration;

use crate::error::BleError;

pub use bluez::BluezRadio;
pub use session::{Session, SessionState};

/// One advertisement seen during a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisementRecord {
    pub address: Address,
    /// Manufacturer data as sent on air, company id first
    pub manufacturer_data: Option<Vec<u8>>,
}

/// Capability to listen for advertisements
pub trait Scanner {
    /// Scan for `duration` and return what was heard
    async fn scan(&mut self, duration: Duration) -> Result<Vec<AdvertisementRecord>, BleError>;
}

/// Capability to open GATT links and read characteristics
pub trait Link {
    type Connection;
    type Characteristic;

    async fn open(&mut self, address: Address) -> Result<Self::Connection, BleError>;

    async fn resolve_characteristic(
        &mut self,
        connection: &Self::Connection,
        uuid: Uuid,
    ) -> Result<Self::Characteristic, BleError>;

    async fn read(&mut self, characteristic: &Self::Characteristic) -> Result<Vec<u8>, BleError>;

    async fn close(&mut self, connection: Self::Connection) -> Result<(), BleError>;

    async fn is_connected(&self, connection: &Self::Connection) -> Result<bool, BleError>;
}
