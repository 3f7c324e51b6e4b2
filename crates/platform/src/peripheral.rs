//! Serial peripheral abstraction
//!
//! The PPP binding carries its frames over a UART. Only the byte-stream
//! surface is modelled here; pin muxing and baud generation belong to the
//! HAL behind the trait.

/// UART peripheral abstraction
pub trait UartPeripheral {
    /// Error type
    type Error: core::fmt::Debug;

    /// Write all of `data`
    fn write(&mut self, data: &[u8])
        -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Read whatever is available into `buffer`, waiting at most the
    /// configured read timeout. Returns the number of bytes read, which
    /// may be zero.
    fn read(
        &mut self,
        buffer: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, Self::Error>>;

    /// Configure UART
    fn configure(&mut self, config: UartConfig) -> Result<(), Self::Error>;
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits
    pub data_bits: DataBits,
    /// Parity
    pub parity: Parity,
    /// Stop bits
    pub stop_bits: StopBits,
    /// Read timeout in milliseconds (0 = return immediately)
    pub read_timeout_ms: u32,
}

impl Default for UartConfig {
    /// 115200 8N1, 100 ms read timeout (the PPP client's polling interval).
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            read_timeout_ms: 100,
        }
    }
}

/// Data bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    /// 5 data bits
    Five,
    /// 6 data bits
    Six,
    /// 7 data bits
    Seven,
    /// 8 data bits
    Eight,
}

/// Parity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    /// No parity
    None,
    /// Even parity
    Even,
    /// Odd parity
    Odd,
}

/// Stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    /// 1 stop bit
    One,
    /// 1.5 stop bits
    OnePointFive,
    /// 2 stop bits
    Two,
}
