//! Mathchat CLI - math tutor chat

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use mathchat::config::TutorConfig;
use mathchat::error::{FixSuggestion, TutorError};
use mathchat::repl::{self, Delays};
use mathchat::store::{JsonFileStore, KeyValueStore, MemoryStore, Preferences, Theme};
use mathchat::{tui, Session};

const LOG_FILE: &str = "mathchat.log";

#[derive(Parser)]
#[command(name = "mathchat")]
#[command(about = "Mathchat - a math tutor in your terminal")]
#[command(version)]
struct Cli {
    /// Where score and theme are stored
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Keep score and theme in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Full-screen chat (default)
    Chat,

    /// Line-by-line chat on stdin/stdout
    Repl {
        /// Reply immediately instead of pausing to "think"
        #[arg(long)]
        no_delay: bool,
    },

    /// Print the saved score
    Score,

    /// Show or change the saved theme
    Theme {
        #[arg(value_enum)]
        action: Option<ThemeAction>,
    },

    /// Show the effective configuration
    Config {
        /// Write a default config.toml if none exists
        #[arg(long)]
        init: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeAction {
    Light,
    Dark,
    Toggle,
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Chat);

    let result = match load_config(cli.data_dir) {
        Ok(config) => {
            init_tracing(&config, matches!(command, Commands::Chat));
            run(command, config, cli.ephemeral).await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

/// Config file, then environment, then command line
fn load_config(data_dir: Option<PathBuf>) -> Result<TutorConfig, TutorError> {
    let mut config = TutorConfig::load()?.with_env();
    if data_dir.is_some() {
        config.data_dir = data_dir;
    }
    Ok(config)
}

/// Log to stderr, or to a file in the data dir while the TUI owns the screen
fn init_tracing(config: &TutorConfig, fullscreen: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_file = fullscreen
        .then(|| open_log_file(&config.data_dir()))
        .and_then(Result::ok);

    match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        None if fullscreen => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init(),
    }
}

fn open_log_file(dir: &Path) -> io::Result<fs::File> {
    fs::create_dir_all(dir)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))
}

fn open_store(config: &TutorConfig, ephemeral: bool) -> Result<Box<dyn KeyValueStore>, TutorError> {
    if ephemeral {
        Ok(Box::new(MemoryStore::new()))
    } else {
        Ok(Box::new(JsonFileStore::open(&config.data_dir())?))
    }
}

async fn run(command: Commands, config: TutorConfig, ephemeral: bool) -> Result<(), TutorError> {
    match command {
        Commands::Chat => {
            let session = new_session(&config, ephemeral)?;
            tui::run(session, config.greeting_delay(), config.think_delay())
                .await
                .map_err(|e| TutorError::Terminal(e.to_string()))
        }
        Commands::Repl { no_delay } => {
            let config = if no_delay {
                config.without_delays()
            } else {
                config
            };
            let mut session = new_session(&config, ephemeral)?;
            let delays = Delays {
                greeting: config.greeting_delay(),
                think: config.think_delay(),
            };
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            repl::run(&mut session, stdin, &mut io::stdout(), delays).await
        }
        Commands::Score => {
            let prefs = Preferences::new(open_store(&config, ephemeral)?);
            println!("{}", prefs.score());
            Ok(())
        }
        Commands::Theme { action } => {
            let mut prefs = Preferences::new(open_store(&config, ephemeral)?);
            let system = Theme::system_preference();
            let theme = match action {
                None => prefs.theme(system),
                Some(ThemeAction::Toggle) => prefs.toggle_theme(system)?,
                Some(ThemeAction::Light) => {
                    prefs.set_theme(Theme::Light)?;
                    Theme::Light
                }
                Some(ThemeAction::Dark) => {
                    prefs.set_theme(Theme::Dark)?;
                    Theme::Dark
                }
            };
            println!("{}", theme);
            Ok(())
        }
        Commands::Config { init } => show_config(&config, init),
    }
}

fn new_session(config: &TutorConfig, ephemeral: bool) -> Result<Session, TutorError> {
    let store = open_store(config, ephemeral)?;
    Ok(Session::new(
        store,
        Theme::system_preference(),
        config.forced_theme(),
    ))
}

fn show_config(config: &TutorConfig, init: bool) -> Result<(), TutorError> {
    let path = TutorConfig::config_path();

    if init {
        if path.exists() {
            println!("{} {}", "Exists:".yellow(), path.display());
        } else {
            TutorConfig::default().save_to(&path)?;
            println!("{} {}", "Created:".green(), path.display());
        }
    }

    println!("{} {}", "Config:".bold(), path.display());
    println!("{} {}", "Data:".bold(), config.data_dir().display());
    println!("  think_delay_ms    = {}", config.think_delay_ms);
    println!("  greeting_delay_ms = {}", config.greeting_delay_ms);
    println!(
        "  theme             = {}",
        config.theme.as_deref().unwrap_or("(stored or system)")
    );
    Ok(())
}
