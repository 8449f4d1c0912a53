use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use ppt_helper::app::App;
use ppt_helper::config::{default_config_path, project_dirs, Config};
use ppt_helper_client::{FileStore, SettingsStore};
use ppt_helper_supervisor::{Ecosystem, Supervisor, UnitOutcome};
use ratatui::crossterm::event::{self, DisableMouseCapture, EnableMouseCapture};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_ECOSYSTEM_FILE: &str = "ecosystem.toml";
const LOG_FILE: &str = "ppt-helper.log";

#[derive(Parser)]
#[command(
    name = "ppt-helper",
    version,
    about = "Upload lecture slides and read explanations page by page"
)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the backend and frontend processes with restart supervision
    Supervise {
        #[arg(long)]
        ecosystem: Option<PathBuf>,
    },
    /// Manage the process ecosystem file
    Ecosystem {
        #[command(subcommand)]
        action: EcosystemAction,
    },
    /// Inspect or reset the saved model settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum EcosystemAction {
    /// Write the default two-process ecosystem file
    Init {
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    Clear,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.command {
        None => init_file_tracing(),
        Some(_) => init_stderr_tracing(),
    }

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let mut config = Config::load_or_default(&config_path);
    config.apply_env();

    match cli.command {
        None => run_tui(config),
        Some(Command::Supervise { ecosystem }) => supervise(&config, ecosystem),
        Some(Command::Ecosystem {
            action: EcosystemAction::Init { output, force },
        }) => {
            let path = output
                .or_else(|| config.supervisor.ecosystem_path.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ECOSYSTEM_FILE));
            Ecosystem::write_template(&path, force)
                .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        Some(Command::Settings { action }) => settings_command(&config, action),
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// The TUI owns the terminal, so logs go to a file or nowhere.
fn init_file_tracing() {
    let log_path = project_dirs()
        .map(|dirs| dirs.data_dir().join(LOG_FILE))
        .unwrap_or_else(|| PathBuf::from(LOG_FILE));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(env_filter())
                .init();
            tracing::info!(path = %log_path.display(), "Logging initialized");
        }
        Err(_) => tracing_subscriber::registry().with(env_filter()).init(),
    }
}

fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

fn open_store(config: &Config) -> Result<FileStore> {
    match config.storage.dir {
        Some(ref dir) => Ok(FileStore::new(dir)),
        None => Ok(FileStore::default_location()?),
    }
}

fn run_tui(config: Config) -> Result<()> {
    let store = open_store(&config)?;
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let mut terminal = ratatui::init();
    ratatui::crossterm::execute!(io::stdout(), EnableMouseCapture)?;

    let result = run_loop(&mut terminal, App::new(config, store));

    let _ = ratatui::crossterm::execute!(io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

fn run_loop(terminal: &mut ratatui::DefaultTerminal, mut app: App<FileStore>) -> Result<()> {
    app.init();

    loop {
        terminal.draw(|frame| app.render(frame))?;

        if event::poll(Duration::from_millis(50))? {
            match app.handle_event(event::read()?) {
                Ok(true) => break,
                Ok(false) => {}
                Err(e) => tracing::warn!("Event handling failed: {e:#}"),
            }
        }

        app.process_async_events();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn supervise(config: &Config, ecosystem: Option<PathBuf>) -> Result<()> {
    let path = ecosystem
        .or_else(|| config.supervisor.ecosystem_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ECOSYSTEM_FILE));
    let ecosystem = Ecosystem::load(&path)
        .wrap_err_with(|| format!("Failed to load ecosystem file {}", path.display()))?;
    let supervisor = Supervisor::new(ecosystem).map_err(|e| eyre!("{e:#}"))?;

    let rt = tokio::runtime::Runtime::new()?;
    let outcomes = rt.block_on(async move {
        let shutdown = CancellationToken::new();
        let on_signal = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested, stopping processes");
                on_signal.cancel();
            }
        });
        supervisor.run(shutdown).await
    });

    let mut gave_up = Vec::new();
    for (name, outcome) in outcomes {
        tracing::info!(unit = %name, ?outcome, "Process finished");
        if matches!(outcome, UnitOutcome::GaveUp { .. }) {
            gave_up.push(name);
        }
    }

    if gave_up.is_empty() {
        Ok(())
    } else {
        Err(eyre!("Gave up restarting: {}", gave_up.join(", ")))
    }
}

fn settings_command(config: &Config, action: SettingsAction) -> Result<()> {
    let store = open_store(config)?;
    let dir = store.dir().to_path_buf();
    let mut settings = SettingsStore::load(store);

    match action {
        SettingsAction::Show => {
            let key = settings.api_key();
            let key_display = if key.is_empty() {
                "(default)".to_string()
            } else {
                let prefix: String = key.chars().take(4).collect();
                format!("{prefix}… ({} chars)", key.chars().count())
            };
            println!("API key: {key_display}");
            println!("Model:   {} ({})", settings.model().display_name(), settings.model());
            println!("Stored:  {}", dir.display());
        }
        SettingsAction::Clear => {
            settings.clear_settings()?;
            println!("Settings cleared");
        }
    }
    Ok(())
}
