//! Outbound webhook trait

/// Errors that can occur while delivering a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeliveryFault {
    /// URL could not be parsed
    InvalidUrl,
    /// Only plain `http://` is supported
    UnsupportedScheme,
    /// Host name did not resolve
    Dns,
    /// TCP connection failed
    Connect,
    /// Read or write on the connection failed
    Io,
    /// Peer did not answer in time
    Timeout,
    /// Request head did not fit the request buffer
    RequestTooLarge,
    /// Peer closed without a parsable status line
    BadResponse,
}

/// Trait for HTTP POST delivery
///
/// Implementations perform one request per call and never retry.
#[allow(async_fn_in_trait)]
pub trait WebhookClient {
    /// POST `body` to `url`, returning the HTTP status code
    ///
    /// Any status code counts as delivered; only transport failures are
    /// errors.
    async fn post(&mut self, url: &str, body: &[u8]) -> Result<u16, DeliveryFault>;
}
