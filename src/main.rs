mod bluetooth;
mod codec;
mod config;
mod error;
mod models;
mod utils;

use log::{debug, error, info};
use tokio::sync::oneshot;
use tokio::time::sleep;

use bluetooth::{BluezRadio, Link, Scanner, Session};
use config::SensorConfig;
use models::Reading;
use utils::{format_datetime, now};

/// Connect, read and always disconnect
async fn read_cycle<S: Scanner, L: Link>(
    session: &mut Session<S, L>,
    retries: u32,
) -> Result<Reading, error::Error> {
    let result = match session.connect(retries).await {
        Ok(()) => session.read().await,
        Err(e) => Err(e),
    };
    session.disconnect().await;
    debug!("Cycle finished, session {:?}", session.state());
    result
}

async fn main_loop(
    config: SensorConfig,
    mut shutdown: oneshot::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "Reading Wave Mini {} every {} seconds",
        config.serial_number, config.sample_period
    );

    let radio = BluezRadio::new().await?;
    let mut session = Session::new(config.serial_number, radio.clone(), radio)
        .with_scan_window(config.scan_window(), config.scan_slice());
    if let Some(address) = config.address()? {
        info!("Using configured address {}", address);
        session = session.with_address(address);
    }

    loop {
        let reading = match read_cycle(&mut session, config.retries).await {
            Ok(reading) => reading,
            Err(e) => {
                error!(
                    "Failed to read serial number {} (address {:?}): {}",
                    session.serial_number(),
                    session.cached_address(),
                    e
                );
                return Err(e.into());
            }
        };

        println!("[{}] {}", format_datetime(&now()), reading);

        // Shutdown is only honoured between readings
        tokio::select! {
            _ = sleep(config.sample_period()) => {}
            _ = &mut shutdown => {
                info!("Program terminated by user. Exiting gracefully.");
                return Ok(());
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match SensorConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    // Handle Ctrl+C gracefully
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(());
            }
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
                // Keep the sender alive so the loop is not shut down
                std::future::pending::<()>().await;
            }
        }
    });

    main_loop(config, rx).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bluetooth::testing::{ScriptedLink, ScriptedScanner};
    use crate::bluetooth::SessionState;
    use crate::error::{BleError, Error};

    const SERIAL: u32 = 2_930_011_111;

    fn session(link: ScriptedLink) -> Session<ScriptedScanner, ScriptedLink> {
        Session::new(SERIAL, ScriptedScanner::always(1, SERIAL), link)
    }

    fn current_values() -> Vec<u8> {
        let mut raw = Vec::new();
        for word in [1u16, 29815, 0, 4550, 120, 0] {
            raw.extend_from_slice(&word.to_le_bytes());
        }
        raw.extend_from_slice(&[0u8; 8]);
        raw
    }

    #[tokio::test]
    async fn cycle_reads_and_disconnects() {
        let mut session = session(ScriptedLink::with_payload(current_values()));

        let reading = read_cycle(&mut session, 3).await.unwrap();

        assert_eq!(reading.temperature, 25.0);
        assert_eq!(reading.humidity, 45.5);
        assert_eq!(reading.voc, 120);
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(session.link().live.is_empty());
        assert_eq!(session.link().closed, vec![1]);
    }

    #[tokio::test]
    async fn read_fault_still_disconnects() {
        let mut session = session(ScriptedLink {
            fail_reads: true,
            ..Default::default()
        });

        let result = read_cycle(&mut session, 3).await;

        assert!(matches!(result, Err(Error::ReadFailed(BleError::NotConnected))));
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(session.link().live.is_empty());
        assert_eq!(session.link().reads, 1);
    }

    #[tokio::test]
    async fn short_payload_still_disconnects() {
        let mut session = session(ScriptedLink::with_payload(vec![0; 16]));

        let result = read_cycle(&mut session, 3).await;

        assert!(matches!(
            result,
            Err(Error::MalformedPayload {
                expected: 20,
                actual: 16
            })
        ));
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(session.link().live.is_empty());
    }

    #[tokio::test]
    async fn exhausted_retries_leave_nothing_open() {
        let mut session = session(ScriptedLink {
            fail_opens: usize::MAX,
            ..Default::default()
        });

        let result = read_cycle(&mut session, 3).await;

        assert!(matches!(
            result,
            Err(Error::ConnectionFailed { attempts: 3, .. })
        ));
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(session.link().live.is_empty());
        assert_eq!(session.link().opened.len(), 3);
        assert_eq!(session.link().reads, 0);
    }
}
