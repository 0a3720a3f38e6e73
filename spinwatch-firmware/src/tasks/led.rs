//! Status LED task
//!
//! The Pico W LED hangs off the radio chip, so it is driven through the
//! CYW43 control handle rather than a GPIO.

use defmt::*;
use embassy_time::Timer;

use crate::channels::LED_BLINK;

/// Blink patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum BlinkCode {
    /// Wi-Fi joined and DHCP lease obtained
    NetworkUp,
    /// A machine confirmed a running cycle
    CycleStarted,
    /// A machine finished its cycle
    CycleFinished,
    /// Wi-Fi or DHCP failed
    NetworkFailed,
}

impl BlinkCode {
    /// Number of flashes
    pub fn count(&self) -> u8 {
        match self {
            BlinkCode::NetworkUp => 3,
            BlinkCode::CycleStarted => 2,
            BlinkCode::CycleFinished => 5,
            BlinkCode::NetworkFailed => 10,
        }
    }

    /// On and off time of each flash (ms)
    pub fn half_period_ms(&self) -> u64 {
        match self {
            BlinkCode::NetworkFailed => 50,
            _ => 100,
        }
    }
}

/// LED task - plays blink codes as they are signalled
#[embassy_executor::task]
pub async fn led_task(mut control: cyw43::Control<'static>) {
    info!("LED task started");

    loop {
        let code = LED_BLINK.wait().await;
        trace!("Blink {}", code);

        for _ in 0..code.count() {
            control.gpio_set(0, true).await;
            Timer::after_millis(code.half_period_ms()).await;
            control.gpio_set(0, false).await;
            Timer::after_millis(code.half_period_ms()).await;
        }
    }
}
