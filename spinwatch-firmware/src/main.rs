//! Spinwatch - Laundry Monitor Firmware
//!
//! Main firmware binary for the Raspberry Pi Pico W. Watches washers and
//! dryers through analog vibration sensors and announces finished cycles
//! over Wi-Fi.

#![no_std]
#![no_main]

use cyw43_pio::{PioSpi, DEFAULT_CLOCK_DIVIDER};
use defmt::*;
use embassy_executor::Spawner;
use embassy_net::StackResources;
use embassy_rp::adc::{Adc, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{InterruptHandler as PioInterruptHandler, Pio};
use embassy_time::Instant;
use heapless::Vec;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use spinwatch_core::config::{MachineConfig, MonitorConfig, MAX_MACHINES};
use spinwatch_core::monitor::Monitor;
use spinwatch_core::notify::Notifier;
use spinwatch_hal_rp2040::AdcPins;

use crate::tasks::{BlinkCode, WiredSensor};

mod channels;
mod config;
mod net;
mod tasks;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

/// CYW43 firmware blobs, flashed separately:
///
/// ```text
/// probe-rs download 43439A0.bin --binary-format bin --chip RP2040 --base-address 0x10100000
/// probe-rs download 43439A0_clm.bin --binary-format bin --chip RP2040 --base-address 0x10140000
/// ```
const CYW43_FW_ADDR: usize = 0x1010_0000;
const CYW43_FW_LEN: usize = 230_321;
const CYW43_CLM_ADDR: usize = 0x1014_0000;
const CYW43_CLM_LEN: usize = 4_752;

/// Sockets: DHCP, DNS, status server, webhook client
const NET_SOCKETS: usize = 5;

// Static cells (must live forever for task references)
static CYW43_STATE: StaticCell<cyw43::State> = StaticCell::new();
static NET_RESOURCES: StaticCell<StackResources<NET_SOCKETS>> = StaticCell::new();
static MACHINES: StaticCell<Vec<MachineConfig, MAX_MACHINES>> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Spinwatch firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::load_config();
    let settings = config.monitor.clone();

    // Wire each configured machine to its ADC channel
    let adc = Adc::new(p.ADC, Irqs, embassy_rp::adc::Config::default());
    let mut adc_pins = AdcPins::new(p.PIN_26, p.PIN_27, p.PIN_28);
    let mut wired: Vec<MachineConfig, MAX_MACHINES> = Vec::new();
    let mut channels: Vec<_, MAX_MACHINES> = Vec::new();

    for machine in config.machines.iter() {
        match adc_pins.take_channel(machine.sensor_pin) {
            Some(channel) => {
                info!(
                    "Initializing {} sensor on GPIO{}",
                    machine.name.as_str(),
                    machine.sensor_pin
                );
                let _ = wired.push(machine.clone());
                let _ = channels.push((channel, machine.sampling));
            }
            None => warn!(
                "GPIO{} unavailable, {} not monitored",
                machine.sensor_pin,
                machine.name.as_str()
            ),
        }
    }

    let monitor = Monitor::new(&wired, Instant::now().as_millis());
    let mut sensors: Vec<WiredSensor, MAX_MACHINES> = Vec::new();
    for (id, (channel, sampling)) in monitor.ids().zip(channels) {
        let _ = sensors.push(WiredSensor {
            id,
            channel,
            sampling,
        });
    }
    let machines: &'static Vec<MachineConfig, MAX_MACHINES> = MACHINES.init(wired);

    announce_mode(&config);

    // Sampling starts before the network so a slow join never delays it
    spawner
        .spawn(tasks::monitor_task(adc, sensors, monitor, settings.clone()))
        .unwrap();

    // Pico W radio on PIO0 (PWR=23, CS=25, DIO=24, CLK=29)
    let (fw, clm) = unsafe {
        (
            core::slice::from_raw_parts(CYW43_FW_ADDR as *const u8, CYW43_FW_LEN),
            core::slice::from_raw_parts(CYW43_CLM_ADDR as *const u8, CYW43_CLM_LEN),
        )
    };

    let pwr = Output::new(p.PIN_23, Level::Low);
    let cs = Output::new(p.PIN_25, Level::High);
    let mut pio = Pio::new(p.PIO0, Irqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        p.PIN_24,
        p.PIN_29,
        p.DMA_CH0,
    );

    let state = CYW43_STATE.init(cyw43::State::new());
    let (net_device, mut control, runner) = cyw43::new(state, pwr, spi, fw).await;
    spawner.spawn(tasks::cyw43_task(runner)).unwrap();

    control.init(clm).await;
    // Power saving drops packets on some mesh access points
    control
        .set_power_management(cyw43::PowerManagementMode::None)
        .await;

    // Boot timing only seeds TCP sequence numbers and DHCP transaction ids
    let seed = Instant::now().as_ticks() ^ 0x5350_494e_5741_5443;
    let (stack, net_runner) = embassy_net::new(
        net_device,
        embassy_net::Config::dhcpv4(Default::default()),
        NET_RESOURCES.init(StackResources::new()),
        seed,
    );
    spawner.spawn(tasks::net_task(net_runner)).unwrap();

    let network_up = match net::bring_up(&mut control, stack).await {
        Ok(address) => {
            info!("Connected! IP: {}", defmt::Debug2Format(&address));
            channels::LED_BLINK.signal(BlinkCode::NetworkUp);
            true
        }
        Err(e) => {
            error!("!!! WIFI CONNECTION FAILED: {} !!!", e);
            channels::LED_BLINK.signal(BlinkCode::NetworkFailed);
            false
        }
    };

    spawner.spawn(tasks::led_task(control)).unwrap();

    if network_up {
        spawner
            .spawn(tasks::status_task(stack, settings.status_port))
            .unwrap();
    }

    // Calibration alerts are only logged, so they need no network
    if network_up || settings.calibration_mode {
        let notifier = Notifier::new(config.notify.push_url.as_str(), settings.calibration_mode);
        spawner
            .spawn(tasks::notify_task(stack, machines, notifier))
            .unwrap();
    }

    info!("All tasks spawned, firmware running");
}

/// Startup banner
fn announce_mode(config: &MonitorConfig) {
    if config.monitor.calibration_mode {
        info!("!!! CALIBRATION MODE ACTIVE !!!");
        for machine in config.machines.iter() {
            info!(
                "[{}] Threshold is set to: {}",
                machine.name.as_str(),
                machine.threshold
            );
        }
        info!("Watching sensors... (Webhooks DISABLED)");
    } else {
        info!("System Armed (Production Mode)...");
    }
}
