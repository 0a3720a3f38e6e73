//! Network bring-up and outbound HTTP
//!
//! Joins the configured WPA2 network through the CYW43 radio and waits for
//! a DHCP lease. Monitoring runs whether or not this succeeds.

pub mod http_client;

pub use http_client::NetWebhookClient;

use cyw43::JoinOptions;
use defmt::*;
use embassy_net::{Ipv4Cidr, Stack};
use embassy_time::{with_timeout, Duration, Timer};

use crate::config::wifi_credentials;

/// Join attempts before giving up
const JOIN_ATTEMPTS: u32 = 3;

/// Pause between join attempts
const JOIN_RETRY_DELAY_S: u64 = 2;

/// Time allowed for the DHCP lease after joining
const DHCP_TIMEOUT_S: u64 = 20;

/// Network bring-up errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum BootstrapFault {
    /// Firmware was built without SPINWATCH_WIFI_SSID
    MissingCredentials,
    /// Access point rejected every join attempt
    JoinFailed,
    /// No DHCP lease arrived in time
    DhcpTimeout,
}

/// Join Wi-Fi and wait for an IPv4 address
pub async fn bring_up(
    control: &mut cyw43::Control<'static>,
    stack: Stack<'static>,
) -> Result<Ipv4Cidr, BootstrapFault> {
    let (ssid, password) = wifi_credentials().ok_or(BootstrapFault::MissingCredentials)?;

    let mut attempt = 0;
    loop {
        attempt += 1;
        info!("Connecting to {} (attempt {}/{})", ssid, attempt, JOIN_ATTEMPTS);

        let options = if password.is_empty() {
            JoinOptions::new_open()
        } else {
            JoinOptions::new(password.as_bytes())
        };

        match control.join(ssid, options).await {
            Ok(()) => break,
            Err(e) => {
                warn!("Join failed: status={}", e.status);
                if attempt >= JOIN_ATTEMPTS {
                    return Err(BootstrapFault::JoinFailed);
                }
                Timer::after_secs(JOIN_RETRY_DELAY_S).await;
            }
        }
    }

    info!("Joined {}, waiting for DHCP", ssid);
    with_timeout(Duration::from_secs(DHCP_TIMEOUT_S), stack.wait_config_up())
        .await
        .map_err(|_| BootstrapFault::DhcpTimeout)?;

    let config = stack.config_v4().ok_or(BootstrapFault::DhcpTimeout)?;
    Ok(config.address)
}
