//! Driver task
//!
//! Samples every wired sensor, ticks its state machine, publishes a status
//! snapshot and hands completions to the notification task, once per poll
//! period, forever.

use defmt::*;
use embassy_rp::adc::{Adc, Async, Channel};
use embassy_time::{Delay, Duration, Instant, Ticker};
use heapless::Vec;

use spinwatch_core::config::{MonitorSettings, SamplingPolicy, MAX_MACHINES};
use spinwatch_core::monitor::{calibration_line, MachineId, Monitor};
use spinwatch_core::sampler::sample;
use spinwatch_core::state::Event;
use spinwatch_hal_rp2040::AdcSensor;

use crate::channels::{publish_status, LED_BLINK, NOTIFY_CHANNEL};
use crate::tasks::BlinkCode;

/// A monitored machine and the ADC channel its sensor is wired to
pub struct WiredSensor {
    pub id: MachineId,
    pub channel: Channel<'static>,
    pub sampling: SamplingPolicy,
}

/// Monitor task - the fixed-period sampling loop
#[embassy_executor::task]
pub async fn monitor_task(
    mut adc: Adc<'static, Async>,
    mut sensors: Vec<WiredSensor, MAX_MACHINES>,
    mut monitor: Monitor,
    settings: MonitorSettings,
) {
    let period_ms = settings.active_poll_interval_ms();
    info!(
        "Monitor task started ({} machine(s), {} ms period)",
        monitor.len(),
        period_ms
    );

    let mut ticker = Ticker::every(Duration::from_millis(period_ms as u64));
    let mut delay = Delay;

    loop {
        for sensor in sensors.iter_mut() {
            let mut adc_sensor = AdcSensor::new(&mut adc, &mut sensor.channel);
            let reading = match sample(&mut adc_sensor, &mut delay, &sensor.sampling).await {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Sensor fault on machine {}: {:?}", sensor.id.index(), e);
                    None
                }
            };

            let now_ms = Instant::now().as_millis();
            let event = monitor.tick(sensor.id, reading, now_ms);

            let Some(config) = monitor.config(sensor.id) else {
                continue;
            };
            let name = config.name.as_str();

            if settings.calibration_mode {
                if let Some(value) = reading {
                    info!("{}", calibration_line(name, value, config.threshold).as_str());
                }
            }

            if let Some(event) = event {
                handle_event(sensor.id, name, event, settings.calibration_mode);
            }
        }

        publish_status(monitor.snapshot(Instant::now().as_millis()));
        ticker.next().await;
    }
}

fn handle_event(id: MachineId, name: &str, event: Event, calibrating: bool) {
    match event {
        Event::MovementDetected => {
            if !calibrating {
                info!("[{}] Movement detected. Verifying...", name);
            }
        }
        Event::ConfirmedStarted => {
            if !calibrating {
                info!("--- {} CONFIRMED STARTED ---", name);
            }
            LED_BLINK.signal(BlinkCode::CycleStarted);
        }
        Event::FalseAlarm => {
            if !calibrating {
                info!("[{}] Just a bump. Resetting to IDLE.", name);
            }
        }
        Event::Finished => {
            info!("--- {} FINISHED ---", name);
            LED_BLINK.signal(BlinkCode::CycleFinished);
        }
    }

    if event.is_completion() && NOTIFY_CHANNEL.try_send(id).is_err() {
        warn!("Notification queue full, dropping alert for {}", name);
    }
}
