//! Best-effort delivery to both sinks

use core::fmt::Write;
use heapless::String;

use crate::config::{MAX_LABEL_LEN, MAX_URL_LEN};
use crate::traits::{DeliveryFault, WebhookClient};

/// Longest push body: name plus the fixed suffix
pub const PUSH_MESSAGE_MAX: usize = MAX_LABEL_LEN + 16;

/// Result of one sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SinkOutcome {
    /// Peer answered with this HTTP status
    Delivered(u16),
    /// Transport failure; logged by the caller and dropped
    Failed(DeliveryFault),
    /// No URL configured for this sink
    Skipped,
    /// Calibration mode; nothing was sent
    Suppressed,
}

impl SinkOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SinkOutcome::Delivered(_))
    }
}

/// Outcome of one notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeliveryReport {
    /// Per-machine automation webhook
    pub automation: SinkOutcome,
    /// Shared push service
    pub push: SinkOutcome,
}

/// Push body for a finished machine
pub fn push_message(machine: &str) -> String<PUSH_MESSAGE_MAX> {
    let mut msg = String::new();
    // Names are bounded by MAX_LABEL_LEN
    let _ = write!(msg, "{} has finished!", machine);
    msg
}

/// Completion notifier
///
/// Holds the push endpoint shared by all machines; the automation URL is
/// passed per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notifier {
    push_url: String<MAX_URL_LEN>,
    suppressed: bool,
}

impl Notifier {
    /// Create a notifier; `suppressed` disables delivery (calibration mode)
    pub fn new(push_url: &str, suppressed: bool) -> Self {
        let mut url = String::new();
        // Config URLs are already bounded; an oversized one disables the sink
        if url.push_str(push_url).is_err() {
            url.clear();
        }
        Self {
            push_url: url,
            suppressed,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Deliver a completion alert for `machine`
    ///
    /// Each sink gets exactly one attempt. Failures are reported, never
    /// propagated.
    pub async fn notify<C: WebhookClient>(
        &self,
        client: &mut C,
        machine: &str,
        webhook_url: &str,
    ) -> DeliveryReport {
        if self.suppressed {
            return DeliveryReport {
                automation: SinkOutcome::Suppressed,
                push: SinkOutcome::Suppressed,
            };
        }

        let automation = deliver(client, webhook_url, b"").await;

        let body = push_message(machine);
        let push = deliver(client, &self.push_url, body.as_bytes()).await;

        DeliveryReport { automation, push }
    }
}

async fn deliver<C: WebhookClient>(client: &mut C, url: &str, body: &[u8]) -> SinkOutcome {
    if url.is_empty() {
        return SinkOutcome::Skipped;
    }
    match client.post(url, body).await {
        Ok(status) => SinkOutcome::Delivered(status),
        Err(fault) => SinkOutcome::Failed(fault),
    }
}
