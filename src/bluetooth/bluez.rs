/// BlueZ implementation of the scan and link capabilities
use bluer::gatt::remote::Characteristic;
use bluer::{Adapter, AdapterEvent, Address, Device, Uuid};
use futures_util::{pin_mut, StreamExt};
use log::{debug, error, info, warn};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

use crate::bluetooth::{AdvertisementRecord, Link, Scanner};
use crate::error::BleError;

/// Default Bluetooth adapter driven through the BlueZ daemon
#[derive(Clone)]
pub struct BluezRadio {
    adapter: Adapter,
}

impl BluezRadio {
    /// Open a BlueZ session on the default adapter and prepare it for LE scanning
    pub async fn new() -> Result<Self, BleError> {
        // Initialize Bluetooth session
        let session = match bluer::Session::new().await {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to create Bluetooth session: {}", e);
                return Err(e.into());
            }
        };

        // Get the default Bluetooth adapter
        let adapter = match session.default_adapter().await {
            Ok(adapter) => adapter,
            Err(e) => {
                error!("Failed to get default Bluetooth adapter: {}", e);
                return Err(e.into());
            }
        };

        // Ensure Bluetooth adapter is powered on
        if let Err(e) = adapter.set_powered(true).await {
            error!("Failed to power on adapter: {}", e);
            return Err(e.into());
        }

        // Low Energy only; keep duplicates so every slice hears the device again
        let filter = bluer::DiscoveryFilter {
            transport: bluer::DiscoveryTransport::Le,
            duplicate_data: true,
            ..Default::default()
        };

        // Apply the discovery filter (warn if it fails, but continue)
        if let Err(e) = adapter.set_discovery_filter(filter).await {
            warn!("Failed to set discovery filter: {}", e);
        }

        info!("Using Bluetooth adapter {}", adapter.name());
        Ok(Self { adapter })
    }

    /// Advertisement records for one device, one per manufacturer data entry
    async fn records_for(&self, address: Address) -> Result<Vec<AdvertisementRecord>, BleError> {
        let device = self.adapter.device(address)?;
        let rssi = device.rssi().await?;
        if rssi.is_none() {
            debug!("Skipping {}: known to BlueZ but not heard", address);
        }
        Ok(advertisement_records(
            address,
            rssi,
            device.manufacturer_data().await?,
        ))
    }
}

/// Records for a device, empty unless it was heard (has an RSSI)
///
/// BlueZ strips the company id from manufacturer data; it is put back in
/// front, little-endian, as sent on air.
fn advertisement_records(
    address: Address,
    rssi: Option<i16>,
    manufacturer_data: Option<HashMap<u16, Vec<u8>>>,
) -> Vec<AdvertisementRecord> {
    if rssi.is_none() {
        return Vec::new();
    }
    match manufacturer_data {
        Some(manufacturer_data) => manufacturer_data
            .into_iter()
            .map(|(company_id, data)| {
                let mut raw = company_id.to_le_bytes().to_vec();
                raw.extend_from_slice(&data);
                AdvertisementRecord {
                    address,
                    manufacturer_data: Some(raw),
                }
            })
            .collect(),
        None => vec![AdvertisementRecord {
            address,
            manufacturer_data: None,
        }],
    }
}

impl Scanner for BluezRadio {
    async fn scan(&mut self, duration: Duration) -> Result<Vec<AdvertisementRecord>, BleError> {
        let mut seen = HashSet::new();
        {
            // Discovery runs while the stream is alive. BlueZ first replays
            // every cached device; those without an RSSI are dropped later.
            let events = self.adapter.discover_devices().await?;
            pin_mut!(events);

            let deadline = Instant::now() + duration;
            while let Ok(Some(event)) = timeout_at(deadline, events.next()).await {
                if let AdapterEvent::DeviceAdded(address) = event {
                    seen.insert(address);
                }
            }
        }

        let mut records = Vec::new();
        for address in seen {
            match self.records_for(address).await {
                Ok(mut device_records) => records.append(&mut device_records),
                Err(e) => debug!("Failed to get manufacturer data for {}: {}", address, e),
            }
        }
        Ok(records)
    }
}

impl Link for BluezRadio {
    type Connection = Device;
    type Characteristic = Characteristic;

    async fn open(&mut self, address: Address) -> Result<Device, BleError> {
        let device = self.adapter.device(address)?;
        if !device.is_connected().await? {
            device.connect().await?;
        }
        Ok(device)
    }

    async fn resolve_characteristic(
        &mut self,
        connection: &Device,
        uuid: Uuid,
    ) -> Result<Characteristic, BleError> {
        for service in connection.services().await? {
            for characteristic in service.characteristics().await? {
                if characteristic.uuid().await? == uuid {
                    return Ok(characteristic);
                }
            }
        }
        Err(BleError::CharacteristicNotFound(uuid))
    }

    async fn read(&mut self, characteristic: &Characteristic) -> Result<Vec<u8>, BleError> {
        Ok(characteristic.read().await?)
    }

    async fn close(&mut self, connection: Device) -> Result<(), BleError> {
        connection.disconnect().await?;
        Ok(())
    }

    async fn is_connected(&self, connection: &Device) -> Result<bool, BleError> {
        Ok(connection.is_connected().await?)
    }
}
