//! Vibration sensor trait

/// Errors that can occur while reading a vibration sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorFault {
    /// Raw conversion exceeded the converter's range
    OutOfRange,
    /// ADC conversion failed
    ConversionError,
}

/// Trait for analog vibration sensors
///
/// Implementations return a single raw magnitude normalised to the 16-bit
/// scale (0..=65535), whatever the converter's native resolution.
#[allow(async_fn_in_trait)]
pub trait VibrationSensor {
    /// Take one raw reading
    ///
    /// Takes `&mut self` because ADC reads typically require mutable access.
    async fn read_raw(&mut self) -> Result<u16, SensorFault>;
}
