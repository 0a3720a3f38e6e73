//! Calibration readout
//!
//! In calibration mode the driver logs one line per machine per tick so the
//! threshold can be tuned by shaking the appliance and watching the bar.

use core::fmt::Write;
use heapless::String;

/// Readings per bar character
const BAR_SCALE: u16 = 200;

/// Longest bar printed
const BAR_MAX: usize = 60;

/// Render `[Name] Val:  1800 / Thresh: 1500  ||||||||| >> ACTIVE`
pub fn calibration_line(name: &str, reading: u16, threshold: u16) -> String<128> {
    let mut line = String::new();
    let bars = ((reading / BAR_SCALE) as usize).min(BAR_MAX);

    // 16-byte name, fixed text and a full bar fit in 128
    let _ = write!(line, "[{}] Val: {:5} / Thresh: {:5}  ", name, reading, threshold);
    for _ in 0..bars {
        let _ = line.push('|');
    }
    if reading > threshold {
        let _ = line.push_str(" >> ACTIVE");
    }
    line
}
