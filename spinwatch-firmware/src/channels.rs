//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use spinwatch_core::monitor::{MachineId, StatusBoard};

use crate::tasks::BlinkCode;

/// Pending completion alerts
///
/// The driver enqueues with `try_send` and never waits for delivery.
const NOTIFY_CHANNEL_SIZE: usize = 4;

/// Machines that finished a cycle, waiting for notification
pub static NOTIFY_CHANNEL: Channel<CriticalSectionRawMutex, MachineId, NOTIFY_CHANNEL_SIZE> =
    Channel::new();

/// Blink pattern requested from the LED task
pub static LED_BLINK: Signal<CriticalSectionRawMutex, BlinkCode> = Signal::new();

/// Latest copy of every machine's state (written by the driver, read by the
/// status server)
pub static STATUS_BOARD: Mutex<CriticalSectionRawMutex, RefCell<StatusBoard>> =
    Mutex::new(RefCell::new(StatusBoard::new()));

/// Replace the published status board
pub fn publish_status(board: StatusBoard) {
    STATUS_BOARD.lock(|cell| *cell.borrow_mut() = board);
}

/// Copy out the published status board
pub fn read_status() -> StatusBoard {
    STATUS_BOARD.lock(|cell| cell.borrow().clone())
}
