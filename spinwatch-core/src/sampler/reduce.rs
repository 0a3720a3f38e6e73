//! Sample reduction
//!
//! One code path serves both averaging and peak sampling; the
//! [`SampleMode`] decides how samples are folded.

use embedded_hal_async::delay::DelayNs;

use crate::config::{SampleMode, SamplingPolicy};
use crate::traits::{SensorFault, VibrationSensor};

/// Largest raw value of a 12-bit converter
pub const ADC_12BIT_MAX: u16 = 4095;

/// Scale a 12-bit conversion to the 16-bit magnitude scale
///
/// Uses bit replication so that 0 maps to 0 and 4095 maps to 65535.
pub fn normalize_12bit(raw: u16) -> Result<u16, SensorFault> {
    if raw > ADC_12BIT_MAX {
        return Err(SensorFault::OutOfRange);
    }
    Ok((raw << 4) | (raw >> 8))
}

/// Running reduction of raw samples
#[derive(Debug, Clone, Copy)]
pub struct Accumulator {
    mode: SampleMode,
    sum: u64,
    peak: u16,
    count: u32,
}

impl Accumulator {
    /// Create an empty accumulator
    pub fn new(mode: SampleMode) -> Self {
        Self {
            mode,
            sum: 0,
            peak: 0,
            count: 0,
        }
    }

    /// Fold one sample in
    pub fn push(&mut self, sample: u16) {
        self.sum += sample as u64;
        self.peak = self.peak.max(sample);
        self.count += 1;
    }

    /// Reduced value, or None if no sample was pushed
    pub fn finish(&self) -> Option<u16> {
        if self.count == 0 {
            return None;
        }
        match self.mode {
            // Floor division; the mean of u16 values always fits a u16
            SampleMode::Average => Some((self.sum / self.count as u64) as u16),
            SampleMode::Peak => Some(self.peak),
        }
    }
}

/// Reduce a slice of samples
pub fn reduce(mode: SampleMode, samples: &[u16]) -> Option<u16> {
    let mut acc = Accumulator::new(mode);
    for &s in samples {
        acc.push(s);
    }
    acc.finish()
}

/// Take one representative reading
///
/// Performs `policy.count` raw reads separated by `policy.delay_ms` and
/// reduces them. A fault on any raw read aborts the whole sample.
pub async fn sample<S, D>(
    sensor: &mut S,
    delay: &mut D,
    policy: &SamplingPolicy,
) -> Result<u16, SensorFault>
where
    S: VibrationSensor,
    D: DelayNs,
{
    let count = policy.count.max(1);
    let mut acc = Accumulator::new(policy.mode);

    for i in 0..count {
        if i > 0 && policy.delay_ms > 0 {
            delay.delay_ms(policy.delay_ms).await;
        }
        acc.push(sensor.read_raw().await?);
    }

    acc.finish().ok_or(SensorFault::ConversionError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use proptest::prelude::*;

    /// Sensor replaying a fixed script of results
    struct ScriptedSensor<'a> {
        script: &'a [Result<u16, SensorFault>],
        pos: usize,
    }

    impl<'a> ScriptedSensor<'a> {
        fn new(script: &'a [Result<u16, SensorFault>]) -> Self {
            Self { script, pos: 0 }
        }
    }

    impl VibrationSensor for ScriptedSensor<'_> {
        async fn read_raw(&mut self) -> Result<u16, SensorFault> {
            let r = self.script[self.pos % self.script.len()];
            self.pos += 1;
            r
        }
    }

    /// Delay that only records how long it was asked to wait
    #[derive(Default)]
    struct RecordingDelay {
        total_ns: u64,
        calls: u32,
    }

    impl DelayNs for RecordingDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
            self.calls += 1;
        }
    }

    fn policy(mode: SampleMode, count: u16, delay_ms: u32) -> SamplingPolicy {
        SamplingPolicy {
            mode,
            count,
            delay_ms,
        }
    }

    #[test]
    fn test_average_uses_floor_division() {
        assert_eq!(reduce(SampleMode::Average, &[1, 2]), Some(1));
        assert_eq!(reduce(SampleMode::Average, &[100, 200, 301]), Some(200));
        assert_eq!(reduce(SampleMode::Average, &[u16::MAX, u16::MAX]), Some(u16::MAX));
    }

    #[test]
    fn test_peak_takes_maximum() {
        assert_eq!(reduce(SampleMode::Peak, &[3, 9000, 12]), Some(9000));
        assert_eq!(reduce(SampleMode::Peak, &[0]), Some(0));
    }

    #[test]
    fn test_empty_reduces_to_none() {
        assert_eq!(reduce(SampleMode::Average, &[]), None);
        assert_eq!(reduce(SampleMode::Peak, &[]), None);
    }

    #[test]
    fn test_normalize_12bit() {
        assert_eq!(normalize_12bit(0), Ok(0));
        assert_eq!(normalize_12bit(4095), Ok(65535));
        assert_eq!(normalize_12bit(2048), Ok(32776));
        assert_eq!(normalize_12bit(4096), Err(SensorFault::OutOfRange));
    }

    #[test]
    fn test_sample_average() {
        let script = [Ok(1000), Ok(2000), Ok(3001)];
        let mut sensor = ScriptedSensor::new(&script);
        let mut delay = RecordingDelay::default();

        let reading = block_on(sample(
            &mut sensor,
            &mut delay,
            &policy(SampleMode::Average, 3, 1),
        ));

        assert_eq!(reading, Ok(2000));
        assert_eq!(sensor.pos, 3);
    }

    #[test]
    fn test_sample_peak() {
        let script = [Ok(10), Ok(4000), Ok(20), Ok(30)];
        let mut sensor = ScriptedSensor::new(&script);
        let mut delay = RecordingDelay::default();

        let reading = block_on(sample(
            &mut sensor,
            &mut delay,
            &policy(SampleMode::Peak, 4, 0),
        ));

        assert_eq!(reading, Ok(4000));
        assert_eq!(delay.calls, 0);
    }

    #[test]
    fn test_delay_only_between_samples() {
        let script = [Ok(1)];
        let mut sensor = ScriptedSensor::new(&script);
        let mut delay = RecordingDelay::default();
        let p = policy(SampleMode::Average, 30, 1);

        block_on(sample(&mut sensor, &mut delay, &p)).unwrap();

        assert!(delay.calls > 0);
        assert_eq!(delay.total_ns, p.max_wait_ms() * 1_000_000);
    }

    #[test]
    fn test_fault_aborts_sample() {
        let script = [Ok(1), Err(SensorFault::ConversionError), Ok(3)];
        let mut sensor = ScriptedSensor::new(&script);
        let mut delay = RecordingDelay::default();

        let reading = block_on(sample(
            &mut sensor,
            &mut delay,
            &policy(SampleMode::Peak, 3, 1),
        ));

        assert_eq!(reading, Err(SensorFault::ConversionError));
        // Third read never happens
        assert_eq!(sensor.pos, 2);
    }

    #[test]
    fn test_zero_count_still_reads_once() {
        let script = [Ok(777)];
        let mut sensor = ScriptedSensor::new(&script);
        let mut delay = RecordingDelay::default();

        let reading = block_on(sample(
            &mut sensor,
            &mut delay,
            &policy(SampleMode::Average, 0, 5),
        ));

        assert_eq!(reading, Ok(777));
        assert_eq!(sensor.pos, 1);
    }

    proptest! {
        #[test]
        fn prop_average_within_bounds(samples in prop::collection::vec(any::<u16>(), 1..64)) {
            let avg = reduce(SampleMode::Average, &samples).unwrap();
            let min = *samples.iter().min().unwrap();
            let max = *samples.iter().max().unwrap();
            prop_assert!(avg >= min && avg <= max);
        }

        #[test]
        fn prop_peak_is_max(samples in prop::collection::vec(any::<u16>(), 1..64)) {
            let peak = reduce(SampleMode::Peak, &samples).unwrap();
            prop_assert_eq!(peak, *samples.iter().max().unwrap());
        }

        #[test]
        fn prop_normalize_is_monotonic(a in 0u16..=4095, b in 0u16..=4095) {
            let (na, nb) = (normalize_12bit(a).unwrap(), normalize_12bit(b).unwrap());
            prop_assert_eq!(a.cmp(&b), na.cmp(&nb));
        }
    }
}
