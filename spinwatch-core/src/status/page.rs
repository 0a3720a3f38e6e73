//! HTML rendering

use core::fmt::{self, Write};
use heapless::String;

use crate::monitor::{MachineSnapshot, StatusBoard};

/// Browser refresh period
pub const PAGE_REFRESH_S: u32 = 5;

const HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Laundry Status</title>
<meta name="viewport" content="width=device-width, initial-scale=1">
<style>
body { font-family: sans-serif; text-align: center; background: #222; color: #eee; }
.card { background: #333; margin: 20px; padding: 20px; border-radius: 10px; border: 1px solid #444; }
.status { font-size: 2em; font-weight: bold; }
.RUNNING { color: #00ff00; text-shadow: 0 0 10px #00ff00; }
.IDLE { color: #888; }
.VERIFYING { color: #ffaa00; }
.footer { margin-top: 30px; color: #666; font-size: 0.8em; }
</style>
"#;

/// Format a running duration as `Mm Ss`, or `--:--` when not running
pub fn format_runtime(running_for_ms: Option<u64>) -> String<24> {
    let mut out = String::new();
    match running_for_ms {
        Some(ms) => {
            let secs = ms / 1000;
            let _ = write!(out, "{}m {}s", secs / 60, secs % 60);
        }
        None => {
            let _ = out.push_str("--:--");
        }
    }
    out
}

/// Format uptime as `HH:MM:SS`; hours keep counting past 24
pub fn format_uptime(ms: u64) -> String<24> {
    let secs = ms / 1000;
    let mut out = String::new();
    let _ = write!(
        out,
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60
    );
    out
}

/// Render the full status page
///
/// Fails only when `w` runs out of space.
pub fn render_page<W: Write>(w: &mut W, board: &StatusBoard, now_ms: u64) -> fmt::Result {
    w.write_str(HEAD)?;
    writeln!(
        w,
        r#"<meta http-equiv="refresh" content="{}">"#,
        PAGE_REFRESH_S
    )?;
    write_favicon(w, board.any_running())?;
    w.write_str("</head>\n<body>\n<h1>Laundry Monitor</h1>\n")?;

    for machine in board.iter() {
        write_card(w, machine, now_ms)?;
    }

    writeln!(
        w,
        r#"<div class="footer">Last Updated: {}</div>"#,
        format_uptime(board.taken_at_ms)
    )?;
    w.write_str("</body></html>\n")
}

fn write_favicon<W: Write>(w: &mut W, running: bool) -> fmt::Result {
    let dot = if running { "🟢" } else { "🔴" };
    writeln!(
        w,
        r#"<link id="favicon" rel="icon" href="data:image/svg+xml,<svg xmlns=%22http://www.w3.org/2000/svg%22 viewBox=%220 0 100 100%22><text y=%22.9em%22 font-size=%2290%22>{}</text></svg>">"#,
        dot
    )
}

fn write_card<W: Write>(w: &mut W, machine: &MachineSnapshot, now_ms: u64) -> fmt::Result {
    let phase = machine.phase.as_str();

    w.write_str("<div class=\"card\">\n<h2>")?;
    write_escaped(w, &machine.name)?;
    w.write_str("</h2>\n")?;
    writeln!(w, r#"<div class="status {}">{}</div>"#, phase, phase)?;
    writeln!(
        w,
        "<p>Runtime: {}</p>",
        format_runtime(machine.running_for_ms(now_ms))
    )?;
    writeln!(w, "<p>Session Max: {}</p>", machine.session_peak)?;
    writeln!(
        w,
        "<p><small>Current Vibration: {}</small></p>",
        machine.current_reading
    )?;
    w.write_str("</div>\n")
}

fn write_escaped<W: Write>(w: &mut W, text: &str) -> fmt::Result {
    for c in text.chars() {
        match c {
            '&' => w.write_str("&amp;")?,
            '<' => w.write_str("&lt;")?,
            '>' => w.write_str("&gt;")?,
            '"' => w.write_str("&quot;")?,
            '\'' => w.write_str("&#39;")?,
            c => w.write_char(c)?,
        }
    }
    Ok(())
}
