//! Status page
//!
//! Renders a [`StatusBoard`](crate::monitor::StatusBoard) as a single
//! self-refreshing HTML page and routes incoming requests to it. Rendering
//! only reads snapshots; it never touches live machine state.

pub mod page;
pub mod request;

pub use page::{format_runtime, format_uptime, render_page, PAGE_REFRESH_S};
pub use request::{find_header_end, route, Route};
