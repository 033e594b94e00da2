//! Reader event loop.
//!
//! Page builds are the only long-running work. While one is in flight the
//! loop keeps reading events: a jump or quit abandons the build, forward and
//! backward steps are dropped, prompt edits repaint the status row, and
//! everything else waits in a backlog until the build settles. Navigator
//! state is staged into the store only between builds; the store itself is
//! written on ticks.

use anyhow::Result;
use core_api::ContentApi;
use core_config::{Config, ConfigContext, StateStore};
use core_events::{Event, ReaderCommand};
use core_input::AsyncInputShutdown;
use core_model::{PageNumber, SourceId};
use core_reader::{
    BuildError, ContinuityRule, LineParser, LineSource, Navigator, PageBuilder, Transition,
    Viewport,
};
use core_render::{FlowLayout, FlowSurface};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::screen::{STATUS_ROWS, Screen};

/// Wire the pagination pipeline for one source.
pub(crate) fn build_navigator(
    config: &Config,
    api: Arc<dyn ContentApi>,
    source: SourceId,
    viewport: Viewport,
) -> Navigator {
    let rule: Arc<dyn ContinuityRule> = Arc::new(config.continuity_table());
    let parser = LineParser::new(source, rule);
    let lines = LineSource::new(api, parser, source, config.line_source_options(source));
    let builder = PageBuilder::new(Box::new(FlowSurface::new(viewport)));
    Navigator::new(lines, builder)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShutdownReason {
    CommandQuit,
    ShutdownEvent,
    ChannelClosed,
}

impl ShutdownReason {
    fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::CommandQuit => "command_quit",
            ShutdownReason::ShutdownEvent => "shutdown_event",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn log_shutdown_stage(reason: ShutdownReason, stage: &'static str) {
    info!(
        target: "runtime.shutdown",
        reason = reason.as_str(),
        stage = stage,
        "shutdown_stage"
    );
}

enum LoopControl {
    Continue,
    Break { reason: ShutdownReason },
}

/// How a driven build ended.
enum Driven<T> {
    Finished(T),
    /// Abandoned for this event, which still has to be handled.
    Interrupted(Event),
}

/// Poll `build` to completion while servicing the event channel.
async fn drive<T, W: Write>(
    build: impl Future<Output = T>,
    rx: &mut mpsc::Receiver<Event>,
    screen: &mut Screen,
    out: &mut W,
    backlog: &mut VecDeque<Event>,
) -> Driven<T> {
    tokio::pin!(build);
    loop {
        tokio::select! {
            biased;
            result = &mut build => return Driven::Finished(result),
            event = rx.recv() => match event {
                None | Some(Event::Shutdown) => return Driven::Interrupted(Event::Shutdown),
                Some(Event::Command(command)) if command.interrupts_build() => {
                    return Driven::Interrupted(Event::Command(command));
                }
                Some(Event::Command(command)) if command.is_step() => {
                    debug!(target: "runtime", ?command, "navigation_dropped_while_building");
                }
                Some(Event::Prompt(prompt)) => {
                    screen.status.prompt = prompt;
                    if let Err(err) = screen.draw(out) {
                        warn!(target: "runtime", error = %err, "status_draw_failed");
                    }
                }
                Some(Event::Tick) => {}
                Some(other) => backlog.push_back(other),
            },
        }
    }
}

pub(crate) struct ReaderRuntime<W: Write> {
    config: Config,
    store: StateStore,
    navigator: Navigator,
    screen: Screen,
    out: W,
    rx: mpsc::Receiver<Event>,
    tx: Option<mpsc::Sender<Event>>,
    backlog: VecDeque<Event>,
    /// False while a build was abandoned half way; such state is never staged.
    stable: bool,
    source_handles: Vec<JoinHandle<()>>,
    input_task: Option<JoinHandle<()>>,
    input_shutdown: Option<AsyncInputShutdown>,
}

impl<W: Write> ReaderRuntime<W> {
    pub fn new(
        config: Config,
        store: StateStore,
        navigator: Navigator,
        screen: Screen,
        out: W,
        tx: mpsc::Sender<Event>,
        rx: mpsc::Receiver<Event>,
    ) -> Self {
        Self {
            config,
            store,
            navigator,
            screen,
            out,
            rx,
            tx: Some(tx),
            backlog: VecDeque::new(),
            stable: true,
            source_handles: Vec::new(),
            input_task: None,
            input_shutdown: None,
        }
    }

    pub fn with_tasks(
        mut self,
        source_handles: Vec<JoinHandle<()>>,
        input_task: JoinHandle<()>,
        input_shutdown: AsyncInputShutdown,
    ) -> Self {
        self.source_handles = source_handles;
        self.input_task = Some(input_task);
        self.input_shutdown = Some(input_shutdown);
        self
    }

    /// Restore persisted state for the navigator's source, or jump to `page`.
    pub async fn run(&mut self, jump: Option<PageNumber>) -> Result<ShutdownReason> {
        let source = self.navigator.source();
        self.store.update_settings(|settings| settings.source = source);
        let settings = self.store.settings().clone();
        self.navigator.set_show_visraam(settings.show_visraam);
        self.navigator.set_show_page_number(settings.show_page_number);
        match jump {
            Some(page) => self.navigator.reset_to_page(page),
            None => {
                let state = self.store.source_state(source).cloned().unwrap_or_default();
                self.navigator.restore(state);
            }
        }

        let span = tracing::debug_span!(target: "runtime", "event_loop");
        let _enter = span.enter();

        let mut reason = ShutdownReason::ChannelClosed;
        let mut control = self.render_current().await;
        while let LoopControl::Continue = control {
            let event = match self.backlog.pop_front() {
                Some(event) => event,
                None => match self.rx.recv().await {
                    Some(event) => event,
                    None => break,
                },
            };
            control = self.handle_event(event).await;
        }
        if let LoopControl::Break { reason: r } = control {
            reason = r;
        }

        self.rx.close();
        self.finalize_shutdown(reason).await;
        Ok(reason)
    }

    async fn handle_event(&mut self, event: Event) -> LoopControl {
        trace!(target: "runtime", ?event, "event");
        match event {
            Event::Command(command) => self.handle_command(command).await,
            Event::Prompt(prompt) => {
                self.screen.status.prompt = prompt;
                self.draw();
                LoopControl::Continue
            }
            Event::Resize(columns, rows) => self.handle_resize(columns, rows).await,
            Event::Tick => {
                self.flush_store();
                LoopControl::Continue
            }
            Event::Shutdown => LoopControl::Break {
                reason: ShutdownReason::ShutdownEvent,
            },
        }
    }

    async fn handle_command(&mut self, command: ReaderCommand) -> LoopControl {
        match command {
            ReaderCommand::NextPage => self.next_page().await,
            ReaderCommand::PreviousPage => {
                if self.navigator.go_to_previous_page() {
                    self.settle();
                }
                LoopControl::Continue
            }
            ReaderCommand::GotoPage(page) => {
                self.navigator.reset_to_page(page);
                self.render_current().await
            }
            ReaderCommand::ToggleVisraam => {
                let show = !self.navigator.modes().show_visraam;
                self.navigator.set_show_visraam(show);
                self.store.update_settings(|s| s.show_visraam = show);
                self.show();
                LoopControl::Continue
            }
            ReaderCommand::TogglePageNumber => {
                let show = !self.navigator.modes().show_page_number;
                self.navigator.set_show_page_number(show);
                self.store.update_settings(|s| s.show_page_number = show);
                self.show();
                LoopControl::Continue
            }
            ReaderCommand::ToggleHelp => {
                self.screen.help = !self.screen.help;
                self.draw();
                LoopControl::Continue
            }
            ReaderCommand::Quit => LoopControl::Break {
                reason: ShutdownReason::CommandQuit,
            },
        }
    }

    async fn next_page(&mut self) -> LoopControl {
        match self.navigator.begin_next_page() {
            Transition::Advanced { pending_build } => {
                self.show();
                if !pending_build {
                    self.settle();
                    return LoopControl::Continue;
                }
                self.begin_build();
                let driven = drive(
                    self.navigator.finish_navigation(),
                    &mut self.rx,
                    &mut self.screen,
                    &mut self.out,
                    &mut self.backlog,
                )
                .await;
                self.end_build(driven)
            }
            Transition::Stalled => {
                info!(target: "runtime", "retry_after_failed_build");
                let control = self.render_current().await;
                if matches!(control, LoopControl::Continue)
                    && self.stable
                    && self.screen.status.message.is_none()
                {
                    self.backlog
                        .push_front(Event::Command(ReaderCommand::NextPage));
                }
                control
            }
            Transition::AtEnd => {
                debug!(target: "runtime", "end_of_source");
                LoopControl::Continue
            }
            Transition::Ignored => LoopControl::Continue,
        }
    }

    /// Build whatever the visible window is missing.
    async fn render_current(&mut self) -> LoopControl {
        self.begin_build();
        let driven = drive(
            self.navigator.render_current_page(),
            &mut self.rx,
            &mut self.screen,
            &mut self.out,
            &mut self.backlog,
        )
        .await;
        self.end_build(driven)
    }

    fn begin_build(&mut self) {
        self.stable = false;
        self.screen.status.loading = true;
        self.draw();
    }

    fn end_build(&mut self, driven: Driven<Result<(), BuildError>>) -> LoopControl {
        self.screen.status.loading = false;
        match driven {
            Driven::Finished(result) => {
                self.stable = true;
                self.screen.status.message = match result {
                    Ok(()) => None,
                    Err(err) => {
                        warn!(target: "runtime", error = %err, "page_build_failed");
                        Some(err.to_string())
                    }
                };
                self.navigator.set_hidden(false);
                self.settle();
            }
            Driven::Interrupted(event) => {
                debug!(target: "runtime", ?event, "build_interrupted");
                self.backlog.push_front(event);
            }
        }
        LoopControl::Continue
    }

    /// Stage navigator state and repaint after a completed mutation.
    fn settle(&mut self) {
        if self.stable && self.navigator.take_dirty() {
            self.store
                .stage(self.navigator.source(), self.navigator.snapshot());
        }
        self.show();
    }

    fn show(&mut self) {
        self.screen.show(&self.navigator);
        self.draw();
    }

    fn draw(&mut self) {
        if let Err(err) = self.screen.draw(&mut self.out) {
            warn!(target: "runtime", error = %err, "draw_failed");
        }
    }

    /// Later pages are built for the new viewport. The visible page is
    /// rebuilt from its first source page only when it no longer fits.
    async fn handle_resize(&mut self, columns: u16, rows: u16) -> LoopControl {
        let ctx = ConfigContext::new(columns, rows, STATUS_ROWS);
        let area = match self.config.recompute_with_context(ctx) {
            Some(area) => {
                self.navigator.set_viewport(area.viewport);
                area
            }
            None => self.config.text_area,
        };
        self.screen.resize(columns, rows, area);
        if let Some(page) = self.overflowing_page(area.viewport) {
            info!(target: "runtime", page, "rebuild_after_resize");
            self.navigator.reset_to_page(page);
            return self.render_current().await;
        }
        self.show();
        LoopControl::Continue
    }

    /// First source page of the visible page when its content is taller
    /// than `viewport`.
    fn overflowing_page(&self, viewport: Viewport) -> Option<PageNumber> {
        if self.navigator.banner().is_some() {
            return None;
        }
        let node = self.navigator.current_page();
        let height = FlowLayout::layout(node.content()?, viewport.width).height();
        if height > viewport.height {
            node.first_page()
        } else {
            None
        }
    }

    fn flush_store(&mut self) {
        if let Err(err) = self.store.flush_if_dirty() {
            error!(target: "runtime", error = %format!("{err:#}"), "state_flush_failed");
        }
    }

    async fn finalize_shutdown(&mut self, reason: ShutdownReason) {
        log_shutdown_stage(reason, "begin");
        if self.stable && self.navigator.take_dirty() {
            self.store
                .stage(self.navigator.source(), self.navigator.snapshot());
        }
        self.flush_store();

        if let Some(tx) = self.tx.take() {
            trace!(target: "runtime.shutdown", reason = reason.as_str(), "dropping_runtime_sender");
            drop(tx);
        }

        while let Some(handle) = self.source_handles.pop() {
            match tokio::time::timeout(Duration::from_millis(200), handle).await {
                Ok(Ok(_)) => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_stopped"
                ),
                Ok(Err(err)) if err.is_cancelled() => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_cancelled"
                ),
                Ok(Err(err)) => error!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    ?err,
                    "event_source_task_error"
                ),
                Err(_) => warn!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_timeout"
                ),
            }
        }

        if let Some(shutdown) = self.input_shutdown.take() {
            shutdown.signal();
        }
        if let Some(handle) = self.input_task.take() {
            match handle.await {
                Ok(_) => trace!(target: "runtime.shutdown", reason = reason.as_str(), "input_task_joined"),
                Err(err) => error!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    ?err,
                    "input_task_join_failed"
                ),
            }
        }

        log_shutdown_stage(reason, "complete");
    }

    #[cfg(test)]
    fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    #[cfg(test)]
    fn screen(&self) -> &Screen {
        &self.screen
    }
}
