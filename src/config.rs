use bluer::Address;
use clap::Parser;
use std::time::Duration;

/// Read current values from an Airthings Wave Mini
#[derive(Debug, Clone, Parser)]
#[command(name = "read-wavemini", version)]
pub struct SensorConfig {
    /// Airthings device serial number found under the magnetic backplate
    #[arg(
        value_name = "SERIAL_NUMBER",
        env = "WAVE_SERIAL_NUMBER",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub serial_number: u32,

    /// Time in seconds between reading the current values
    #[arg(
        value_name = "SAMPLE_PERIOD",
        env = "WAVE_SAMPLE_PERIOD",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub sample_period: u64,

    /// Connection attempts per reading
    #[arg(
        long,
        env = "WAVE_RETRIES",
        default_value_t = 3,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub retries: u32,

    /// Total time spent scanning for the device, in milliseconds
    #[arg(long, env = "WAVE_SCAN_WINDOW_MS", default_value_t = 3000)]
    pub scan_window_ms: u64,

    /// Length of each scan slice, in milliseconds
    #[arg(
        long,
        env = "WAVE_SCAN_SLICE_MS",
        default_value_t = 100,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub scan_slice_ms: u64,

    /// Radio address of the device; skips scanning when given
    #[arg(long, env = "WAVE_ADDRESS")]
    pub address: Option<String>,
}

impl SensorConfig {
    /// Load configuration from the command line, environment and `.env`
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.scan_slice_ms > self.scan_window_ms {
            return Err(format!(
                "scan slice ({} ms) is longer than the scan window ({} ms)",
                self.scan_slice_ms, self.scan_window_ms
            ));
        }
        self.address()?;
        Ok(())
    }

    pub fn address(&self) -> Result<Option<Address>, String> {
        self.address
            .as_deref()
            .map(|address| {
                address
                    .parse::<Address>()
                    .map_err(|_| format!("invalid radio address: {}", address))
            })
            .transpose()
    }

    pub fn sample_period(&self) -> Duration {
        Duration::from_secs(self.sample_period)
    }

    pub fn scan_window(&self) -> Duration {
        Duration::from_millis(self.scan_window_ms)
    }

    pub fn scan_slice(&self) -> Duration {
        Duration::from_millis(self.scan_slice_ms)
    }
}
