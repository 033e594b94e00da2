//! Event types and async event sources for the reader runtime.

use core_model::PageNumber;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

// -------------------------------------------------------------------------------------------------
// Channel policy
// -------------------------------------------------------------------------------------------------
// One bounded mpsc channel carries every event into the runtime. Input awaits `send`, so a slow
// consumer applies backpressure instead of dropping keys; the frame clock drops ticks instead.
// Producers stop once the runtime drops its receiver.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 256;

pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static CHANNEL_SENDS: AtomicU64 = AtomicU64::new(0);
pub static COMMANDS_TOTAL: AtomicU64 = AtomicU64::new(0);
pub static TICKS_COALESCED: AtomicU64 = AtomicU64::new(0);
// Async input task lifecycle
pub static ASYNC_INPUT_STARTS: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_SIGNAL: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_CHANNEL: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_STREAM: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_ERROR: AtomicU64 = AtomicU64::new(0);

/// Top-level event enum consumed by the runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Command(ReaderCommand),
    /// Go-to prompt contents changed; `None` closes the prompt.
    Prompt(Option<String>),
    /// Terminal resize (columns, rows).
    Resize(u16, u16),
    /// Periodic tick; the runtime flushes persisted state on it.
    Tick,
    Shutdown,
}

/// Reader-level commands produced by key translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderCommand {
    NextPage,
    PreviousPage,
    GotoPage(PageNumber),
    ToggleVisraam,
    TogglePageNumber,
    /// Show or hide the key binding overlay.
    ToggleHelp,
    Quit,
}

impl ReaderCommand {
    /// Navigation commands are dropped while a page build is in flight.
    pub fn is_step(self) -> bool {
        matches!(self, ReaderCommand::NextPage | ReaderCommand::PreviousPage)
    }

    /// Commands that abandon an in-flight build.
    pub fn interrupts_build(self) -> bool {
        matches!(self, ReaderCommand::GotoPage(_) | ReaderCommand::Quit)
    }
}

// -------------------------------------------------------------------------------------------------
// Async event sources
// -------------------------------------------------------------------------------------------------
// Each source owns one background task that pushes `Event`s into the shared channel and terminates
// once the channel closes. The runtime registers sources at startup, spawns them together, and joins
// the handles on shutdown after dropping its own sender.

/// Trait implemented by any async event producer.
pub trait AsyncEventSource: Send + 'static {
    /// Stable identifier used in logs.
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task. Implementors stop when
    /// `tx.send(..).await` returns Err.
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

#[derive(Default)]
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: AsyncEventSource>(&mut self, source: S) {
        self.sources.push(Box::new(source));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Spawn and drain every registered source. Drop the caller's sender
    /// before joining the handles so the sources see the channel close.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        self.sources
            .drain(..)
            .map(|source| {
                tracing::info!(target: "runtime.events", source = source.name(), "event_source_spawned");
                source.spawn(tx.clone())
            })
            .collect()
    }
}

/// Frame clock. Emits `Event::Tick` once per interval.
///
/// A tick only asks the runtime to flush staged state, so ticks never queue
/// up: when the channel is full the tick is dropped.
pub struct TickEventSource {
    interval: Duration,
}

impl TickEventSource {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
        }
    }
}

impl AsyncEventSource for TickEventSource {
    fn name(&self) -> &'static str {
        "tick"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let period = self.interval;
        tokio::spawn(async move {
            let mut clock = tokio::time::interval(period);
            clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    _ = clock.tick() => {}
                }
                match tx.try_send(Event::Tick) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        TICKS_COALESCED.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(TrySendError::Closed(_)) => break,
                }
            }
        })
    }
}
