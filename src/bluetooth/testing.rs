//! Scripted radio capabilities for unit tests
use bluer::{Address, Uuid};
use std::time::Duration;

use crate::bluetooth::advertisement::AIRTHINGS_COMPANY_ID;
use crate::bluetooth::{AdvertisementRecord, Link, Scanner};
use crate::error::BleError;

/// Fault as reported by BlueZ when the adapter is powered off
pub fn adapter_fault() -> BleError {
    BleError::Bluez(bluer::Error {
        kind: bluer::ErrorKind::NotReady,
        message: "Resource Not Ready".to_string(),
    })
}

pub fn addr(n: u8) -> Address {
    Address::new([0xD4, 0x81, 0xCA, 0x00, 0x00, n])
}

pub fn airthings_adv(n: u8, serial: u32) -> AdvertisementRecord {
    let mut data = AIRTHINGS_COMPANY_ID.to_le_bytes().to_vec();
    data.extend_from_slice(&serial.to_le_bytes());
    data.extend_from_slice(&[0x09, 0x00]);
    AdvertisementRecord {
        address: addr(n),
        manufacturer_data: Some(data),
    }
}

pub fn other_adv(n: u8) -> AdvertisementRecord {
    AdvertisementRecord {
        address: addr(n),
        manufacturer_data: Some(vec![0x4C, 0x00, 0x02, 0x15, 0x01, 0x02]),
    }
}

pub fn bare_adv(n: u8) -> AdvertisementRecord {
    AdvertisementRecord {
        address: addr(n),
        manufacturer_data: None,
    }
}

/// Returns the `n`th scripted slice on the `n`th call, then nothing
#[derive(Default)]
pub struct ScriptedScanner {
    pub slices: Vec<Vec<AdvertisementRecord>>,
    /// Number of leading calls that fail
    pub fail_first: usize,
    pub calls: usize,
    pub durations: Vec<Duration>,
}

impl ScriptedScanner {
    pub fn with_slices(slices: Vec<Vec<AdvertisementRecord>>) -> Self {
        Self {
            slices,
            ..Default::default()
        }
    }

    /// Scanner that sees `serial` at `addr(n)` on every slice
    pub fn always(n: u8, serial: u32) -> Self {
        Self::with_slices(vec![vec![airthings_adv(n, serial)]; 1000])
    }
}

impl Scanner for ScriptedScanner {
    async fn scan(&mut self, duration: Duration) -> Result<Vec<AdvertisementRecord>, BleError> {
        let index = self.calls;
        self.calls += 1;
        self.durations.push(duration);
        if index < self.fail_first {
            return Err(adapter_fault());
        }
        Ok(self.slices.get(index).cloned().unwrap_or_default())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct FakeConnection {
    pub address: Address,
    pub id: usize,
}

#[derive(Debug)]
pub struct FakeCharacteristic {
    pub uuid: Uuid,
}

/// Link whose first opens and lookups fail as configured
#[derive(Default)]
pub struct ScriptedLink {
    pub fail_opens: usize,
    pub fail_resolves: usize,
    pub fail_reads: bool,
    pub fail_close: bool,
    pub payload: Vec<u8>,
    pub opened: Vec<Address>,
    pub resolves: usize,
    pub reads: usize,
    pub closed: Vec<usize>,
    /// Ids of links currently open
    pub live: Vec<usize>,
}

impl ScriptedLink {
    pub fn with_payload(payload: Vec<u8>) -> Self {
        Self {
            payload,
            ..Default::default()
        }
    }
}

impl Link for ScriptedLink {
    type Connection = FakeConnection;
    type Characteristic = FakeCharacteristic;

    async fn open(&mut self, address: Address) -> Result<FakeConnection, BleError> {
        self.opened.push(address);
        if self.opened.len() <= self.fail_opens {
            return Err(BleError::NotConnected);
        }
        let id = self.opened.len();
        self.live.push(id);
        Ok(FakeConnection { address, id })
    }

    async fn resolve_characteristic(
        &mut self,
        _connection: &FakeConnection,
        uuid: Uuid,
    ) -> Result<FakeCharacteristic, BleError> {
        self.resolves += 1;
        if self.resolves <= self.fail_resolves {
            return Err(BleError::CharacteristicNotFound(uuid));
        }
        Ok(FakeCharacteristic { uuid })
    }

    async fn read(&mut self, _characteristic: &FakeCharacteristic) -> Result<Vec<u8>, BleError> {
        self.reads += 1;
        if self.fail_reads {
            return Err(BleError::NotConnected);
        }
        Ok(self.payload.clone())
    }

    async fn close(&mut self, connection: FakeConnection) -> Result<(), BleError> {
        self.closed.push(connection.id);
        self.live.retain(|id| *id != connection.id);
        if self.fail_close {
            return Err(BleError::NotConnected);
        }
        Ok(())
    }

    async fn is_connected(&self, connection: &FakeConnection) -> Result<bool, BleError> {
        Ok(self.live.contains(&connection.id))
    }
}
