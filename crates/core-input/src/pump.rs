//! Terminal event pump.
//!
//! Reads crossterm events, runs key presses through [`KeyTranslator`] and
//! forwards the resulting reader events. The pump stops on an explicit
//! shutdown signal, when the runtime drops its receiver, or when the terminal
//! stream ends or fails.

use crate::keys::KeyTranslator;
use core_events::{
    ASYNC_INPUT_STARTS, ASYNC_INPUT_STOP_CHANNEL, ASYNC_INPUT_STOP_ERROR, ASYNC_INPUT_STOP_SIGNAL,
    ASYNC_INPUT_STOP_STREAM, CHANNEL_SEND_FAILURES, CHANNEL_SENDS, COMMANDS_TOTAL, Event,
};
use crossterm::event::{Event as TermEvent, EventStream, KeyEvent, KeyEventKind};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio_stream::{Stream, StreamExt};
use tracing::{Instrument, info, trace, warn};

/// Handle that asks the input pump to stop.
#[derive(Clone, Debug)]
pub struct AsyncInputShutdown {
    notify: Arc<Notify>,
}

impl AsyncInputShutdown {
    /// Safe to call before the pump starts waiting; the request is kept.
    pub fn signal(&self) {
        self.notify.notify_one();
    }
}

fn shutdown_pair() -> (AsyncInputShutdown, Arc<Notify>) {
    let notify = Arc::new(Notify::new());
    (
        AsyncInputShutdown {
            notify: notify.clone(),
        },
        notify,
    )
}

pub(crate) fn spawn_input_pump(sender: Sender<Event>) -> (JoinHandle<()>, AsyncInputShutdown) {
    let (shutdown, notify) = shutdown_pair();
    let span = tracing::debug_span!(target: "input.thread", "input_pump");
    let pump = InputPump::new(sender, EventStream::new(), notify);
    let handle = tokio::spawn(pump.run().instrument(span));
    (handle, shutdown)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StopReason {
    Signal,
    ChannelClosed,
    StreamEnded,
    StreamError(io::ErrorKind),
}

impl StopReason {
    fn as_str(self) -> &'static str {
        match self {
            StopReason::Signal => "shutdown_signal",
            StopReason::ChannelClosed => "channel_closed",
            StopReason::StreamEnded => "stream_ended",
            StopReason::StreamError(_) => "stream_error",
        }
    }

    fn counter(self) -> &'static AtomicU64 {
        match self {
            StopReason::Signal => &ASYNC_INPUT_STOP_SIGNAL,
            StopReason::ChannelClosed => &ASYNC_INPUT_STOP_CHANNEL,
            StopReason::StreamEnded => &ASYNC_INPUT_STOP_STREAM,
            StopReason::StreamError(_) => &ASYNC_INPUT_STOP_ERROR,
        }
    }
}

struct InputPump<S> {
    sender: Sender<Event>,
    stream: S,
    keys: KeyTranslator,
    shutdown: Arc<Notify>,
}

impl<S> InputPump<S>
where
    S: Stream<Item = io::Result<TermEvent>> + Unpin,
{
    fn new(sender: Sender<Event>, stream: S, shutdown: Arc<Notify>) -> Self {
        Self {
            sender,
            stream,
            keys: KeyTranslator::new(),
            shutdown,
        }
    }

    async fn run(mut self) {
        info!(target: "input.thread", "input_started");
        ASYNC_INPUT_STARTS.fetch_add(1, Ordering::Relaxed);

        let reason = self.pump().await;
        reason.counter().fetch_add(1, Ordering::Relaxed);
        if let StopReason::StreamError(kind) = reason {
            warn!(target: "input.thread", error_kind = ?kind, "input_stream_error");
        }
        info!(target: "input.thread", reason = reason.as_str(), "input_stopped");
    }

    async fn pump(&mut self) -> StopReason {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.notified() => return StopReason::Signal,
                next = self.stream.next() => next,
            };
            let delivered = match next {
                None => return StopReason::StreamEnded,
                Some(Err(err)) => return StopReason::StreamError(err.kind()),
                Some(Ok(TermEvent::Key(key))) => self.forward_key(key).await,
                Some(Ok(TermEvent::Resize(columns, rows))) => {
                    trace!(target: "input.event", columns, rows, "resize");
                    self.forward(Event::Resize(columns, rows)).await
                }
                Some(Ok(_)) => true,
            };
            if !delivered {
                return StopReason::ChannelClosed;
            }
        }
    }

    /// Key releases are ignored; presses and auto-repeats both count.
    async fn forward_key(&mut self, key: KeyEvent) -> bool {
        if key.kind == KeyEventKind::Release {
            return true;
        }
        for event in self.keys.translate(&key) {
            if let Event::Command(command) = &event {
                trace!(target: "input.event", ?command, repeat = key.kind == KeyEventKind::Repeat, "command");
                COMMANDS_TOTAL.fetch_add(1, Ordering::Relaxed);
            }
            if !self.forward(event).await {
                return false;
            }
        }
        true
    }

    async fn forward(&self, event: Event) -> bool {
        if self.sender.send(event).await.is_ok() {
            CHANNEL_SENDS.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::ReaderCommand;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use tokio::time::{Duration, timeout};
    use tokio_stream::wrappers::UnboundedReceiverStream;

    #[derive(Clone, Default)]
    struct SharedLog(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedLog {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn press(code: KeyCode) -> TermEvent {
        TermEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn key_with_kind(code: KeyCode, kind: KeyEventKind) -> TermEvent {
        TermEvent::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    async fn pump_all(events: Vec<TermEvent>) -> Vec<Event> {
        let (tx, mut rx) = mpsc::channel(64);
        let (_shutdown, notify) = shutdown_pair();
        let stream = tokio_stream::iter(events.into_iter().map(Ok));
        InputPump::new(tx, stream, notify).run().await;

        let mut received = Vec::new();
        while let Some(event) = rx.recv().await {
            received.push(event);
        }
        received
    }

    #[tokio::test]
    async fn keys_and_resizes_reach_the_runtime() {
        let before = COMMANDS_TOTAL.load(Ordering::Relaxed);
        let received = pump_all(vec![
            press(KeyCode::PageDown),
            TermEvent::Resize(120, 40),
            press(KeyCode::Char('q')),
        ])
        .await;
        assert_eq!(
            received,
            vec![
                Event::Command(ReaderCommand::NextPage),
                Event::Resize(120, 40),
                Event::Command(ReaderCommand::Quit),
            ]
        );
        assert!(COMMANDS_TOTAL.load(Ordering::Relaxed) >= before + 2);
    }

    #[tokio::test]
    async fn releases_are_skipped_and_repeats_forwarded() {
        let received = pump_all(vec![
            key_with_kind(KeyCode::Left, KeyEventKind::Release),
            key_with_kind(KeyCode::Left, KeyEventKind::Repeat),
        ])
        .await;
        assert_eq!(received, vec![Event::Command(ReaderCommand::PreviousPage)]);
    }

    #[tokio::test]
    async fn goto_prompt_accumulates_across_events() {
        let received = pump_all(vec![
            press(KeyCode::Char('g')),
            press(KeyCode::Char('4')),
            press(KeyCode::Char('2')),
            press(KeyCode::Enter),
        ])
        .await;
        assert_eq!(
            received,
            vec![
                Event::Prompt(Some(String::new())),
                Event::Prompt(Some("4".into())),
                Event::Prompt(Some("42".into())),
                Event::Prompt(None),
                Event::Command(ReaderCommand::GotoPage(42)),
            ]
        );
    }

    #[tokio::test]
    async fn signal_stop_is_logged_with_reason() {
        let log = SharedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);
        let before = ASYNC_INPUT_STOP_SIGNAL.load(Ordering::Relaxed);

        let (tx, _rx) = mpsc::channel(1);
        let (_events, events_rx) = mpsc::unbounded_channel::<io::Result<TermEvent>>();
        let (shutdown, notify) = shutdown_pair();
        shutdown.signal();
        InputPump::new(tx, UnboundedReceiverStream::new(events_rx), notify)
            .run()
            .await;

        let text = log.text();
        assert!(text.contains("input_started"), "log: {text}");
        assert!(text.contains("input_stopped"), "log: {text}");
        assert!(text.contains("shutdown_signal"), "log: {text}");
        assert!(ASYNC_INPUT_STOP_SIGNAL.load(Ordering::Relaxed) > before);
    }

    #[tokio::test]
    async fn dropped_receiver_stops_pump() {
        let before = ASYNC_INPUT_STOP_CHANNEL.load(Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let (_shutdown, notify) = shutdown_pair();
        let stream = tokio_stream::iter(vec![Ok(TermEvent::Resize(10, 10))]);
        InputPump::new(tx, stream, notify).run().await;
        assert!(ASYNC_INPUT_STOP_CHANNEL.load(Ordering::Relaxed) > before);
    }

    #[tokio::test]
    async fn stream_error_ends_pump_before_later_events() {
        let before = ASYNC_INPUT_STOP_ERROR.load(Ordering::Relaxed);
        let (tx, mut rx) = mpsc::channel(4);
        let (_shutdown, notify) = shutdown_pair();
        let stream = tokio_stream::iter(vec![
            Err(io::Error::other("tty gone")),
            Ok(press(KeyCode::Right)),
        ]);
        InputPump::new(tx, stream, notify).run().await;

        assert!(rx.recv().await.is_none());
        assert!(ASYNC_INPUT_STOP_ERROR.load(Ordering::Relaxed) > before);
    }

    #[tokio::test]
    async fn spawned_pump_honours_shutdown_promptly() {
        let (tx, mut rx) = mpsc::channel(1);
        let (events, events_rx) = mpsc::unbounded_channel::<io::Result<TermEvent>>();
        let (shutdown, notify) = shutdown_pair();
        let task = tokio::spawn(async move {
            let _events = events;
            InputPump::new(tx, UnboundedReceiverStream::new(events_rx), notify)
                .run()
                .await;
        });

        shutdown.signal();
        timeout(Duration::from_millis(50), task)
            .await
            .expect("pump did not stop")
            .expect("pump task panicked");
        assert!(rx.recv().await.is_none());
    }
}
