//! The two DAC devices, handed out by pin through [`DacRegistry::open`].

use platform::{DacChannel, DacOutput, GpioNum, HardwareTimer};

use crate::device::DacDevice;
use crate::error::{DacError, Reason};

/// Owns one [`DacDevice`] per hardware channel.
///
/// Built once at startup and shared by reference; put it in a `StaticCell`
/// so devices can register themselves as `'static` tick handlers.
pub struct DacRegistry<O, T, B> {
    one: DacDevice<O, T, B>,
    two: DacDevice<O, T, B>,
}

impl<O, T, B> DacRegistry<O, T, B>
where
    O: DacOutput + Send + 'static,
    T: HardwareTimer + Default + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    /// Build both devices, asking `make_output` for each channel's output.
    pub fn new(mut make_output: impl FnMut(DacChannel) -> O) -> Self {
        Self {
            one: DacDevice::new(DacChannel::One, make_output(DacChannel::One)),
            two: DacDevice::new(DacChannel::Two, make_output(DacChannel::Two)),
        }
    }

    /// Device for `channel`, output not yet enabled.
    pub(crate) fn by_channel(&self, channel: DacChannel) -> &DacDevice<O, T, B> {
        match channel {
            DacChannel::One => &self.one,
            DacChannel::Two => &self.two,
        }
    }

    /// Device routed to `pin`, output not yet enabled.
    ///
    /// # Errors
    ///
    /// [`Reason::UnknownPin`] if `pin` is not a DAC pad.
    pub(crate) fn by_pin(&self, pin: GpioNum) -> Result<&DacDevice<O, T, B>, DacError> {
        DacChannel::from_pin(pin)
            .map(|channel| self.by_channel(channel))
            .ok_or_else(|| {
                warn!("{} is not a DAC pin", pin);
                DacError::InvalidArgument(Reason::UnknownPin)
            })
    }

    /// Look up the device on `pin` and enable its output on first use.
    ///
    /// # Errors
    ///
    /// - [`Reason::UnknownPin`] if `pin` is not a DAC pad.
    /// - [`DacError::Device`] if the output stage cannot be enabled.
    pub async fn open(&self, pin: GpioNum) -> Result<&DacDevice<O, T, B>, DacError> {
        let device = self.by_pin(pin)?;
        device.open().await?;
        Ok(device)
    }
}
