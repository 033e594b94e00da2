//! Terminal input for the reader: key bindings and the async input pump.

pub mod keys;
mod pump;

pub use keys::KeyTranslator;
pub use pump::AsyncInputShutdown;

use core_events::Event;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

/// Spawn the input pump backed by `crossterm::EventStream`.
///
/// The pump runs until the returned handle is signalled, the receiver side of
/// `sender` is dropped, or the terminal stream ends.
pub fn spawn_async_input(sender: Sender<Event>) -> (JoinHandle<()>, AsyncInputShutdown) {
    pump::spawn_input_pump(sender)
}
