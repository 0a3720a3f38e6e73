//! Status page server
//!
//! Serves one connection at a time. Each request gets a fresh copy of the
//! status board, so rendering never blocks the driver.

use defmt::*;
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpListenEndpoint, Stack};
use embassy_time::{with_timeout, Duration, Instant};
use embedded_io_async::Write;
use heapless::String;
use static_cell::StaticCell;

use spinwatch_core::status::{find_header_end, render_page, route, Route};

use crate::channels::read_status;

const HTTP_RW_BUF: usize = 1024;
const HTTP_HEADER_MAX: usize = 1024;
const PAGE_MAX: usize = 4096;
const HTTP_HEADER_READ_TIMEOUT_MS: u64 = 5_000;

/// Status server task
#[embassy_executor::task]
pub async fn status_task(stack: Stack<'static>, port: u16) {
    static RX_BUFFER: StaticCell<[u8; HTTP_RW_BUF]> = StaticCell::new();
    static TX_BUFFER: StaticCell<[u8; HTTP_RW_BUF]> = StaticCell::new();
    static PAGE: StaticCell<String<PAGE_MAX>> = StaticCell::new();

    let rx_buffer = RX_BUFFER.init([0u8; HTTP_RW_BUF]);
    let tx_buffer = TX_BUFFER.init([0u8; HTTP_RW_BUF]);
    let page = PAGE.init(String::new());

    if let Some(cfg) = stack.config_v4() {
        info!(
            "Web interface started on http://{}:{}",
            defmt::Debug2Format(&cfg.address.address()),
            port
        );
    }

    loop {
        let mut socket = TcpSocket::new(stack, &mut rx_buffer[..], &mut tx_buffer[..]);
        socket.set_timeout(Some(Duration::from_secs(10)));

        if let Err(e) = socket.accept(IpListenEndpoint { addr: None, port }).await {
            warn!("Status server accept error: {:?}", e);
            continue;
        }

        if let Err(e) = handle_connection(&mut socket, page).await {
            warn!("Status server request error: {}", e);
        }

        let _ = with_timeout(Duration::from_millis(250), socket.flush()).await;
        socket.close();
    }
}

async fn handle_connection(
    socket: &mut TcpSocket<'_>,
    page: &mut String<PAGE_MAX>,
) -> Result<(), &'static str> {
    let mut header_buf = [0u8; HTTP_HEADER_MAX];
    let mut filled = 0usize;
    let header_end = loop {
        if filled == header_buf.len() {
            write_response(socket, b"431 Request Header Fields Too Large", b"text/plain", b"")
                .await;
            return Err("header too large");
        }

        let n = match with_timeout(
            Duration::from_millis(HTTP_HEADER_READ_TIMEOUT_MS),
            socket.read(&mut header_buf[filled..]),
        )
        .await
        {
            Ok(Ok(n)) => n,
            Ok(Err(_)) => return Err("read"),
            Err(_) => return Err("request header timeout"),
        };
        if n == 0 {
            return Err("eof");
        }
        filled += n;

        if let Some(end) = find_header_end(&header_buf[..filled]) {
            break end;
        }
    };

    let header = core::str::from_utf8(&header_buf[..header_end]).map_err(|_| "header utf8")?;

    match route(header) {
        Route::Status => {
            let now_ms = Instant::now().as_millis();
            let board = read_status();

            page.clear();
            if render_page(page, &board, now_ms).is_err() {
                write_response(socket, b"500 Internal Server Error", b"text/plain", b"").await;
                return Err("page buffer overflow");
            }
            write_response(socket, b"200 OK", b"text/html; charset=utf-8", page.as_bytes())
                .await;
            Ok(())
        }
        Route::NotFound => {
            write_response(socket, b"404 Not Found", b"text/plain", b"Not Found").await;
            Ok(())
        }
    }
}

async fn write_response(
    socket: &mut TcpSocket<'_>,
    status: &[u8],
    content_type: &[u8],
    body: &[u8],
) {
    let mut content_length = [0u8; 20];
    let mut idx = content_length.len();
    let mut remaining = body.len();
    loop {
        idx -= 1;
        content_length[idx] = b'0' + (remaining % 10) as u8;
        remaining /= 10;
        if remaining == 0 {
            break;
        }
    }

    let _ = socket.write_all(b"HTTP/1.1 ").await;
    let _ = socket.write_all(status).await;
    let _ = socket.write_all(b"\r\nContent-Type: ").await;
    let _ = socket.write_all(content_type).await;
    let _ = socket
        .write_all(b"\r\nConnection: close\r\nContent-Length: ")
        .await;
    let _ = socket.write_all(&content_length[idx..]).await;
    let _ = socket.write_all(b"\r\n\r\n").await;
    let _ = socket.write_all(body).await;
}
