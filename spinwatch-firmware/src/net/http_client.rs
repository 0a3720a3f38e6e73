//! Webhook client over embassy-net TCP
//!
//! One connection per request, `Connection: close`, no TLS. Only the status
//! line of the response is read.

use defmt::*;
use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, Stack};
use embassy_time::{with_timeout, Duration};
use embedded_io_async::Write;
use heapless::String;

use spinwatch_core::notify::{parse_status_line, write_post_request, HttpUrl};
use spinwatch_core::traits::{DeliveryFault, WebhookClient};

const TCP_BUF: usize = 1024;
const REQUEST_HEAD_MAX: usize = 384;
const STATUS_LINE_MAX: usize = 128;

const DNS_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const IO_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP POST client on the shared network stack
pub struct NetWebhookClient {
    stack: Stack<'static>,
    rx_buffer: [u8; TCP_BUF],
    tx_buffer: [u8; TCP_BUF],
}

impl NetWebhookClient {
    pub fn new(stack: Stack<'static>) -> Self {
        Self {
            stack,
            rx_buffer: [0; TCP_BUF],
            tx_buffer: [0; TCP_BUF],
        }
    }

    async fn resolve(&self, host: &str) -> Result<IpAddress, DeliveryFault> {
        // IP literals are answered without a DNS round trip
        let addrs = with_timeout(DNS_TIMEOUT, self.stack.dns_query(host, DnsQueryType::A))
            .await
            .map_err(|_| DeliveryFault::Timeout)?
            .map_err(|_| DeliveryFault::Dns)?;
        addrs.first().copied().ok_or(DeliveryFault::Dns)
    }
}

impl WebhookClient for NetWebhookClient {
    async fn post(&mut self, url: &str, body: &[u8]) -> Result<u16, DeliveryFault> {
        let url = HttpUrl::parse(url)?;

        let mut head: String<REQUEST_HEAD_MAX> = String::new();
        write_post_request(&mut head, &url, body.len())
            .map_err(|_| DeliveryFault::RequestTooLarge)?;

        let addr = self.resolve(url.host).await?;
        debug!("POST {}:{}{}", url.host, url.port, url.path);

        let mut socket = TcpSocket::new(self.stack, &mut self.rx_buffer, &mut self.tx_buffer);
        socket.set_timeout(Some(IO_TIMEOUT));

        let result = exchange(&mut socket, addr, url.port, head.as_bytes(), body).await;

        let _ = with_timeout(Duration::from_millis(250), socket.flush()).await;
        socket.close();
        result
    }
}

async fn exchange(
    socket: &mut TcpSocket<'_>,
    addr: IpAddress,
    port: u16,
    head: &[u8],
    body: &[u8],
) -> Result<u16, DeliveryFault> {
    with_timeout(CONNECT_TIMEOUT, socket.connect((addr, port)))
        .await
        .map_err(|_| DeliveryFault::Timeout)?
        .map_err(|_| DeliveryFault::Connect)?;

    socket.write_all(head).await.map_err(|_| DeliveryFault::Io)?;
    socket.write_all(body).await.map_err(|_| DeliveryFault::Io)?;
    socket.flush().await.map_err(|_| DeliveryFault::Io)?;

    let mut status = [0u8; STATUS_LINE_MAX];
    let mut filled = 0usize;
    loop {
        let n = with_timeout(IO_TIMEOUT, socket.read(&mut status[filled..]))
            .await
            .map_err(|_| DeliveryFault::Timeout)?
            .map_err(|_| DeliveryFault::Io)?;
        if n == 0 {
            break;
        }
        filled += n;
        if filled == status.len() || status[..filled].contains(&b'\n') {
            break;
        }
    }

    parse_status_line(&status[..filled]).ok_or(DeliveryFault::BadResponse)
}
