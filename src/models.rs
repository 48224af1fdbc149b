use std::fmt;

/// Current values reported by a Wave Mini
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Temperature in degrees Celsius, rounded to two decimals
    pub temperature: f64,
    /// Relative humidity in %rH
    pub humidity: f64,
    /// Volatile organic compounds in ppm
    pub voc: u16,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Temperature: {:.2} *C, Humidity: {:.2} %rH, VOC: {} ppm",
            self.temperature, self.humidity, self.voc
        )
    }
}

/// Airthings manufacturer data carried in an advertisement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManufacturerPayload {
    pub company_id: u16,
    pub serial_number: u32,
    /// Trailing field, not interpreted
    pub reserved: u16,
}
