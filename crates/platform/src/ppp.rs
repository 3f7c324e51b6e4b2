//! PPP-over-serial network interface binding.
//!
//! Binds a vendor PPP stack (lwIP's PPPoS on the target) to a UART. This
//! module owns only the interface-level state (active, connected, last
//! status) and the byte pump between the serial port and the stack; LCP/IPCP
//! negotiation and everything above stays inside the [`PppStack`]
//! implementation.
//!
//! # Lifecycle
//!
//! ```text
//! set_active(true) --> configure UART + open() + connect() --> [active, not connected]
//!      pump() ... status Connected   ------> [active, connected]
//!      pump() ... status ConnectionLost ---> [active, not connected]
//! set_active(false) --> close() ---------> [inactive]
//! ```

use crate::peripheral::{UartConfig, UartPeripheral};

/// Scratch size used when draining stack output to the UART.
const TX_CHUNK: usize = 256;

// ── Status codes ─────────────────────────────────────────────────────────────

/// Status reported by the PPP stack's status callback.
///
/// Codes follow lwIP's `PPPERR_*` numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PppStatus {
    /// 0: link is up, addresses negotiated
    Connected,
    /// 1: invalid parameter
    InvalidParameter,
    /// 2: unable to open PPP session
    OpenFailed,
    /// 3: invalid I/O device for PPP
    InvalidDevice,
    /// 4: unable to allocate resources
    AllocFailed,
    /// 5: user interrupt (`close()` was called)
    UserInterrupt,
    /// 6: connection lost
    ConnectionLost,
    /// 7: failed authentication challenge
    AuthFailed,
    /// 8: failed to meet protocol
    ProtocolError,
    /// 9: connection timeout
    PeerDead,
    /// 10: idle timeout
    IdleTimeout,
    /// 11: max connect time reached
    ConnectTimeLimit,
    /// 12: loopback detected
    Loopback,
    /// Any other code
    Unknown(i32),
}

impl PppStatus {
    /// Decode a raw status-callback code.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Connected,
            1 => Self::InvalidParameter,
            2 => Self::OpenFailed,
            3 => Self::InvalidDevice,
            4 => Self::AllocFailed,
            5 => Self::UserInterrupt,
            6 => Self::ConnectionLost,
            7 => Self::AuthFailed,
            8 => Self::ProtocolError,
            9 => Self::PeerDead,
            10 => Self::IdleTimeout,
            11 => Self::ConnectTimeLimit,
            12 => Self::Loopback,
            other => Self::Unknown(other),
        }
    }

    /// Short human-readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Connected => "Connected",
            Self::InvalidParameter => "Invalid parameter",
            Self::OpenFailed => "Unable to open PPP session",
            Self::InvalidDevice => "Invalid I/O device for PPP",
            Self::AllocFailed => "Unable to allocate resources",
            Self::UserInterrupt => "User interrupt",
            Self::ConnectionLost => "Connection lost",
            Self::AuthFailed => "Failed authentication challenge",
            Self::ProtocolError => "Failed to meet protocol",
            Self::PeerDead => "Connection timeout",
            Self::IdleTimeout => "Idle timeout",
            Self::ConnectTimeLimit => "Max connect time reached",
            Self::Loopback => "Loopback detected",
            Self::Unknown(_) => "Unknown error code",
        }
    }
}

// ── Addressing ───────────────────────────────────────────────────────────────

/// IPv4 configuration negotiated by the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IpConfig {
    /// Local address
    pub address: [u8; 4],
    /// Peer (gateway) address
    pub gateway: [u8; 4],
    /// Netmask
    pub netmask: [u8; 4],
    /// Primary DNS server
    pub dns: [u8; 4],
}

// ── Stack collaborator ───────────────────────────────────────────────────────

/// Vendor PPP stack, seen from the interface binding.
pub trait PppStack {
    /// Error type
    type Error: core::fmt::Debug;

    /// Create the PPPoS control block and install it as the default netif.
    fn open(&mut self) -> Result<(), Self::Error>;

    /// Start negotiation after `holdoff_secs`.
    fn connect(&mut self, holdoff_secs: u16) -> Result<(), Self::Error>;

    /// Tear the session down. The stack reports
    /// [`PppStatus::UserInterrupt`] once closed.
    fn close(&mut self) -> Result<(), Self::Error>;

    /// Feed bytes received from the serial link.
    fn input(&mut self, data: &[u8]);

    /// Move bytes the stack wants to transmit into `out`. Returns how many
    /// were written; zero when nothing is pending.
    fn poll_output(&mut self, out: &mut [u8]) -> usize;

    /// Next pending status-callback code, if any.
    fn poll_status(&mut self) -> Option<i32>;

    /// Current negotiated addressing.
    fn ip_config(&self) -> IpConfig;
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// PPP interface errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PppError {
    /// The stack could not create or start the session
    InitFailed,
    /// `set_active(false)` on an interface that is not active
    AlreadyInactive,
    /// Operation requires an active interface
    Inactive,
    /// Addressing is negotiated by the peer and cannot be set
    ReadOnly,
    /// Serial read or write failed
    Serial,
}

#[cfg(feature = "std")]
impl std::error::Error for PppError {}

impl core::fmt::Display for PppError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InitFailed => write!(f, "PPP init failed"),
            Self::AlreadyInactive => write!(f, "PPP interface already inactive"),
            Self::Inactive => write!(f, "PPP interface inactive"),
            Self::ReadOnly => write!(f, "cannot set ifconfig for PPP"),
            Self::Serial => write!(f, "PPP serial link error"),
        }
    }
}

// ── Interface ────────────────────────────────────────────────────────────────

/// PPP network interface bound to one UART.
pub struct PppInterface<S, U> {
    stack: S,
    uart: U,
    active: bool,
    connected: bool,
    last_status: Option<PppStatus>,
}

impl<S, U> PppInterface<S, U>
where
    S: PppStack,
    U: UartPeripheral,
{
    /// Bind `stack` to `uart`. The interface starts inactive.
    pub fn new(stack: S, uart: U) -> Self {
        Self {
            stack,
            uart,
            active: false,
            connected: false,
            last_status: None,
        }
    }

    /// Bring the interface up or down. Returns the resulting active flag.
    ///
    /// Activating an active interface is a no-op. Bringing it up applies
    /// [`UartConfig::default`] first, whose read timeout paces [`Self::pump`].
    ///
    /// # Errors
    ///
    /// - [`PppError::Serial`] if the UART rejects the configuration.
    /// - [`PppError::InitFailed`] if the stack cannot open or connect.
    /// - [`PppError::AlreadyInactive`] when deactivating an inactive interface.
    pub fn set_active(&mut self, active: bool) -> Result<bool, PppError> {
        match (active, self.active) {
            (true, true) => Ok(true),
            (true, false) => {
                self.uart
                    .configure(UartConfig::default())
                    .map_err(|_| PppError::Serial)?;
                self.stack.open().map_err(|_| PppError::InitFailed)?;
                self.stack.connect(0).map_err(|_| PppError::InitFailed)?;
                self.active = true;
                #[cfg(feature = "defmt")]
                defmt::info!("PPP interface up, negotiating");
                Ok(true)
            }
            (false, false) => Err(PppError::AlreadyInactive),
            (false, true) => {
                // Close failures leave nothing to recover: the link is
                // considered down either way.
                let _ = self.stack.close();
                self.active = false;
                self.connected = false;
                #[cfg(feature = "defmt")]
                defmt::info!("PPP interface down");
                Ok(false)
            }
        }
    }

    /// `true` while the interface is up.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// `true` once the stack has reported [`PppStatus::Connected`] and no
    /// later failure.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Most recent status reported by the stack.
    pub fn last_status(&self) -> Option<PppStatus> {
        self.last_status
    }

    /// Negotiated addressing.
    ///
    /// # Errors
    ///
    /// [`PppError::Inactive`] if the interface is down.
    pub fn ifconfig(&self) -> Result<IpConfig, PppError> {
        if self.active {
            Ok(self.stack.ip_config())
        } else {
            Err(PppError::Inactive)
        }
    }

    /// Always fails: PPP addressing comes from the peer.
    ///
    /// # Errors
    ///
    /// Always [`PppError::ReadOnly`].
    pub fn set_ifconfig(&mut self, _config: IpConfig) -> Result<(), PppError> {
        Err(PppError::ReadOnly)
    }

    /// Apply one status-callback code.
    pub fn on_status(&mut self, code: i32) -> PppStatus {
        let status = PppStatus::from_code(code);
        self.connected = status == PppStatus::Connected;
        self.last_status = Some(status);
        #[cfg(feature = "defmt")]
        defmt::info!("PPP status: {=str}", status.description());
        status
    }

    /// Run one iteration of the client loop: read from the UART into the
    /// stack, flush whatever the stack wants to send, then apply pending
    /// status events. Returns the number of bytes received.
    ///
    /// # Errors
    ///
    /// - [`PppError::Inactive`] if the interface is down.
    /// - [`PppError::Serial`] on UART failure.
    pub async fn pump(&mut self, rx: &mut [u8]) -> Result<usize, PppError> {
        if !self.active {
            return Err(PppError::Inactive);
        }

        let received = self.uart.read(rx).await.map_err(|_| PppError::Serial)?;
        if let Some(data) = rx.get(..received) {
            if !data.is_empty() {
                self.stack.input(data);
            }
        }

        let mut tx = [0u8; TX_CHUNK];
        loop {
            let pending = self.stack.poll_output(&mut tx);
            let Some(chunk) = tx.get(..pending) else {
                break;
            };
            if chunk.is_empty() {
                break;
            }
            self.uart.write(chunk).await.map_err(|_| PppError::Serial)?;
        }

        while let Some(code) = self.stack.poll_status() {
            self.on_status(code);
        }

        Ok(received)
    }

    /// Borrow the underlying stack.
    pub fn stack(&self) -> &S {
        &self.stack
    }

    /// Borrow the underlying UART.
    pub fn uart(&self) -> &U {
        &self.uart
    }
}
