use std::fs::File;
use std::io;
use std::panic;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ratatui::crossterm::event::DisableMouseCapture;
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{disable_raw_mode, LeaveAlternateScreen};
use simplelog::{LevelFilter, WriteLogger};

use noterow::config::RowConfig;
use noterow::ui::{app::AppOptions, App};

/// Terminal note feed with reply, boost, like, stats and menu controls.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file; missing means defaults
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Where to write the log
    #[arg(long, default_value = "noterow.log")]
    log_file: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Start with an account that cannot publish
    #[arg(long)]
    read_only: bool,

    /// Start with no account at all
    #[arg(long)]
    signed_out: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The terminal belongs to the UI, so logs go to a file.
    let log_file = File::create(&cli.log_file)
        .with_context(|| format!("creating log file {}", cli.log_file.display()))?;
    WriteLogger::init(cli.log_level, simplelog::Config::default(), log_file)?;

    let config = RowConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    // Set up panic hook for cleanup
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    let app = App::new(
        &config,
        AppOptions {
            read_only: cli.read_only,
            signed_out: cli.signed_out,
        },
    )?;

    if let Err(err) = app.run().await {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        log::error!("App exited with error: {:?}", err);
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
