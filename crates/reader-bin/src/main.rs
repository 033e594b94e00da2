//! banireader entrypoint.
use anyhow::{Context, Result};
use clap::Parser;
use core_api::{BaniDbClient, ContentApi};
use core_config::{ConfigContext, StateStore, load_from};
use core_events::{EVENT_CHANNEL_CAP, EventSourceRegistry, TickEventSource};
use core_model::{PageNumber, SourceId};
use core_render::Theme;
use core_render::terminal::{TerminalSession, terminal_size};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

mod runtime;
mod screen;

use runtime::{ReaderRuntime, build_navigator};
use screen::{STATUS_ROWS, Screen};

const LOG_FILE_NAME: &str = "banireader.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "banireader", version, about = "Paginated Gurbani reader")]
struct Args {
    /// Source to read (G or D). Defaults to the source of the last session.
    #[arg(long)]
    source: Option<SourceId>,
    /// Jump to this source page instead of resuming.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    page: Option<PageNumber>,
    /// Optional configuration file path (overrides discovery of `banireader.toml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,
}

#[derive(Default)]
struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join(LOG_FILE_NAME);
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        if tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .with_ansi(false)
            .try_init()
            .is_ok()
        {
            self.log_guard = Some(guard);
        }
        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }

    fn run(&mut self, args: Args) -> Result<()> {
        self.configure_logging()?;
        Self::install_panic_hook();
        info!(target: "runtime", "startup");

        let mut config = load_from(args.config.clone())?;
        let store = StateStore::load(config.state_path());
        let source = args.source.unwrap_or(store.settings().source);
        let settings = store.settings().clone();
        let theme = Theme::from_hex(
            &settings.background_color,
            &settings.text_color,
            &settings.visraam_color,
            &settings.visraam_color_yamki,
        );
        let api: Arc<dyn ContentApi> = Arc::new(BaniDbClient::new(config.client_options())?);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("build tokio runtime")?;

        let session = TerminalSession::open("banireader")?;
        let (columns, rows) = terminal_size()?;
        let area = config.apply_context(ConfigContext::new(columns, rows, STATUS_ROWS));
        info!(
            target: "runtime.startup",
            source = %source,
            jump = args.page,
            config_override = args.config.is_some(),
            state_path = %store.path().display(),
            columns,
            rows,
            "bootstrap_complete"
        );

        let result = runtime.block_on(async {
            let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAP);
            let mut registry = EventSourceRegistry::new();
            registry.register(TickEventSource::new(config.frame_interval()));
            let source_handles = registry.spawn_all(&tx);
            let (input_task, input_shutdown) = core_input::spawn_async_input(tx.clone());

            let navigator = build_navigator(&config, api, source, area.viewport);
            let screen = Screen::new(columns, rows, area, theme);
            let mut reader = ReaderRuntime::new(
                config,
                store,
                navigator,
                screen,
                std::io::stdout(),
                tx,
                rx,
            )
            .with_tasks(source_handles, input_task, input_shutdown);
            reader.run(args.page).await
        });
        session.close()?;
        let reason = result?;
        info!(target: "runtime", reason = %reason, "exit");
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    AppStartup::default().run(args)
}
