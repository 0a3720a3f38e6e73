//! Notification task
//!
//! Drains completion alerts from the driver and delivers them. Slow or
//! unreachable sinks only ever stall this task.

use defmt::*;
use embassy_net::Stack;
use heapless::Vec;

use spinwatch_core::config::{MachineConfig, MAX_MACHINES};
use spinwatch_core::notify::{DeliveryReport, Notifier, SinkOutcome};

use crate::channels::NOTIFY_CHANNEL;
use crate::net::NetWebhookClient;

/// Notification task
///
/// `machines` is indexed by [`MachineId`](spinwatch_core::monitor::MachineId).
#[embassy_executor::task]
pub async fn notify_task(
    stack: Stack<'static>,
    machines: &'static Vec<MachineConfig, MAX_MACHINES>,
    notifier: Notifier,
) {
    info!("Notify task started");

    let mut client = NetWebhookClient::new(stack);

    loop {
        let id = NOTIFY_CHANNEL.receive().await;
        let Some(machine) = machines.get(id.index()) else {
            warn!("Alert for unknown machine {}", id.index());
            continue;
        };
        let name = machine.name.as_str();

        if notifier.is_suppressed() {
            info!("[CALIBRATION] Would alert automation and push for {}", name);
            continue;
        }

        info!("Sending alerts for {}", name);
        let report = notifier
            .notify(&mut client, name, machine.webhook_url.as_str())
            .await;
        log_report(name, &report);
    }
}

fn log_report(name: &str, report: &DeliveryReport) {
    log_sink(name, "Automation webhook", report.automation);
    log_sink(name, "Push", report.push);
}

fn log_sink(name: &str, sink: &str, outcome: SinkOutcome) {
    match outcome {
        SinkOutcome::Delivered(status) => info!("[{}] {} answered {}", name, sink, status),
        SinkOutcome::Failed(fault) => warn!("[{}] {} failed: {:?}", name, sink, fault),
        SinkOutcome::Skipped => debug!("[{}] {} not configured", name, sink),
        SinkOutcome::Suppressed => debug!("[{}] {} suppressed", name, sink),
    }
}
