//! Request routing for the status server

/// What to answer a request with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Route {
    /// `GET /`: the status page
    Status,
    /// Anything else
    NotFound,
}

/// Offset of the blank line ending the request head
pub fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

/// Route a request by its head
///
/// Only the request line is inspected. Query strings are ignored.
pub fn route(head: &str) -> Route {
    let Some((method, target)) = parse_request_line(head) else {
        return Route::NotFound;
    };

    let path = target.split('?').next().unwrap_or(target);
    match (method, path) {
        ("GET", "/") => Route::Status,
        _ => Route::NotFound,
    }
}

fn parse_request_line(head: &str) -> Option<(&str, &str)> {
    let first_line = head.lines().next()?;
    let mut parts = first_line.split_ascii_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    let _version = parts.next()?;
    Some((method, target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_status() {
        assert_eq!(route("GET / HTTP/1.1\r\nHost: pico\r\n"), Route::Status);
        assert_eq!(route("GET /?refresh=1 HTTP/1.0"), Route::Status);
    }

    #[test]
    fn test_everything_else_is_not_found() {
        assert_eq!(route("GET /favicon.ico HTTP/1.1"), Route::NotFound);
        assert_eq!(route("POST / HTTP/1.1"), Route::NotFound);
        assert_eq!(route("HEAD / HTTP/1.1"), Route::NotFound);
        assert_eq!(route("GET /"), Route::NotFound);
        assert_eq!(route(""), Route::NotFound);
    }

    #[test]
    fn test_find_header_end() {
        let req = b"GET / HTTP/1.1\r\nHost: pico\r\n\r\nbody";
        assert_eq!(find_header_end(req), Some(26));
        assert_eq!(find_header_end(b"GET / HTTP/1.1\r\n"), None);
    }
}
