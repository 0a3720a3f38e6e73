//! ADC sensor support
//!
//! RP2040 has a single 12-bit ADC with 5 channels:
//! - ADC0: GPIO26
//! - ADC1: GPIO27
//! - ADC2: GPIO28
//! - ADC3: GPIO29 (VSYS sense on the Pico W, shared with the radio clock)
//! - ADC4: Internal temperature sensor
//!
//! Only ADC0..ADC2 are usable for vibration sensors.

use embassy_rp::adc::{Adc, Async, Channel};
use embassy_rp::gpio::Pull;
use embassy_rp::peripherals::{PIN_26, PIN_27, PIN_28};
use embassy_rp::Peri;

use spinwatch_core::sampler::normalize_12bit;
use spinwatch_core::traits::{SensorFault, VibrationSensor};

/// ADC channel identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcChannel {
    /// ADC0 on GPIO26
    Adc0,
    /// ADC1 on GPIO27
    Adc1,
    /// ADC2 on GPIO28
    Adc2,
}

impl AdcChannel {
    /// Channel wired to a GPIO, if it is a usable ADC input
    pub fn from_gpio(gpio: u8) -> Option<Self> {
        match gpio {
            26 => Some(AdcChannel::Adc0),
            27 => Some(AdcChannel::Adc1),
            28 => Some(AdcChannel::Adc2),
            _ => None,
        }
    }
}

/// ADC-capable pins not yet handed out
///
/// Each pin can be taken once; a second request for the same GPIO
/// returns `None`.
pub struct AdcPins {
    pin26: Option<Peri<'static, PIN_26>>,
    pin27: Option<Peri<'static, PIN_27>>,
    pin28: Option<Peri<'static, PIN_28>>,
}

impl AdcPins {
    /// Take ownership of the ADC pins
    pub fn new(
        pin26: Peri<'static, PIN_26>,
        pin27: Peri<'static, PIN_27>,
        pin28: Peri<'static, PIN_28>,
    ) -> Self {
        Self {
            pin26: Some(pin26),
            pin27: Some(pin27),
            pin28: Some(pin28),
        }
    }

    /// Configure the ADC channel on `gpio` with no pull resistor
    pub fn take_channel(&mut self, gpio: u8) -> Option<Channel<'static>> {
        match AdcChannel::from_gpio(gpio)? {
            AdcChannel::Adc0 => self.pin26.take().map(|p| Channel::new_pin(p, Pull::None)),
            AdcChannel::Adc1 => self.pin27.take().map(|p| Channel::new_pin(p, Pull::None)),
            AdcChannel::Adc2 => self.pin28.take().map(|p| Channel::new_pin(p, Pull::None)),
        }
    }
}

/// Vibration sensor on one ADC channel
///
/// Borrows the shared ADC for the duration of a sample, so several sensors
/// can be read in turn from one task.
pub struct AdcSensor<'a, 'd> {
    adc: &'a mut Adc<'d, Async>,
    channel: &'a mut Channel<'d>,
}

impl<'a, 'd> AdcSensor<'a, 'd> {
    pub fn new(adc: &'a mut Adc<'d, Async>, channel: &'a mut Channel<'d>) -> Self {
        Self { adc, channel }
    }
}

impl VibrationSensor for AdcSensor<'_, '_> {
    async fn read_raw(&mut self) -> Result<u16, SensorFault> {
        let raw = self
            .adc
            .read(self.channel)
            .await
            .map_err(|_| SensorFault::ConversionError)?;
        normalize_12bit(raw)
    }
}
