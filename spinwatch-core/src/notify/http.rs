//! Minimal HTTP/1.1 client framing
//!
//! Only what a webhook POST needs: split an `http://` URL, write the request
//! head and read the status code back. TLS is not supported.

use core::fmt::{self, Write};

use crate::traits::DeliveryFault;

/// Borrowed view of a plain-HTTP URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpUrl<'a> {
    /// Host name or IPv4 literal
    pub host: &'a str,
    pub port: u16,
    /// Path and query; empty or query-only means `/`
    pub path: &'a str,
}

impl<'a> HttpUrl<'a> {
    /// Split `http://host[:port][/path][?query]`
    pub fn parse(url: &'a str) -> Result<Self, DeliveryFault> {
        let url = url.trim();
        let rest = match url.split_once("://") {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("http") => rest,
            // https and anything else
            Some(_) => return Err(DeliveryFault::UnsupportedScheme),
            None => return Err(DeliveryFault::InvalidUrl),
        };

        let split = rest.find(&['/', '?'][..]).unwrap_or(rest.len());
        let (authority, path) = rest.split_at(split);

        // Userinfo and IPv6 literals are not supported
        if authority.contains('@') || authority.starts_with('[') {
            return Err(DeliveryFault::InvalidUrl);
        }

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port: u16 = port.parse().map_err(|_| DeliveryFault::InvalidUrl)?;
                if port == 0 {
                    return Err(DeliveryFault::InvalidUrl);
                }
                (host, port)
            }
            None => (authority, 80),
        };

        if host.is_empty() {
            return Err(DeliveryFault::InvalidUrl);
        }

        Ok(Self { host, port, path })
    }
}

/// Write the head of a POST carrying `body_len` bytes of text
///
/// Fails only when `w` runs out of space.
pub fn write_post_request<W: Write>(w: &mut W, url: &HttpUrl<'_>, body_len: usize) -> fmt::Result {
    w.write_str("POST ")?;
    if !url.path.starts_with('/') {
        w.write_char('/')?;
    }
    write!(w, "{} HTTP/1.1\r\n", url.path)?;

    if url.port == 80 {
        write!(w, "Host: {}\r\n", url.host)?;
    } else {
        write!(w, "Host: {}:{}\r\n", url.host, url.port)?;
    }

    w.write_str("User-Agent: spinwatch\r\n")?;
    w.write_str("Content-Type: text/plain; charset=utf-8\r\n")?;
    write!(w, "Content-Length: {}\r\n", body_len)?;
    w.write_str("Connection: close\r\n\r\n")
}

/// Extract the status code from the first response line
pub fn parse_status_line(buf: &[u8]) -> Option<u16> {
    let end = buf.iter().position(|b| *b == b'\n').unwrap_or(buf.len());
    let line = core::str::from_utf8(&buf[..end]).ok()?;

    let mut parts = line.split_ascii_whitespace();
    let version = parts.next()?;
    if !version.starts_with("HTTP/") {
        return None;
    }

    let code = parts.next()?;
    if code.len() != 3 {
        return None;
    }
    code.parse().ok()
}
