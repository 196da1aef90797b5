use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use pulsewatch::data::duration::parse_duration;
use pulsewatch::settings::{FileStorage, STORAGE_KEY};
use pulsewatch::ui::{self, Theme};
use pulsewatch::{events, App, ConfigStore, HttpConnector, Silent};

#[derive(Parser, Debug)]
#[command(name = "pulsewatch")]
#[command(about = "Terminal heart-rate monitor with push/poll transports and threshold alarms")]
struct Args {
    /// Directory holding the persisted configuration
    #[arg(short, long, default_value = ".")]
    config_dir: PathBuf,

    /// UI refresh interval (e.g., "100ms", "1s")
    #[arg(short, long, default_value = "100ms")]
    tick: String,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    /// File that receives log output (the terminal belongs to the UI)
    #[arg(long, default_value = "pulsewatch.log")]
    log_file: PathBuf,

    /// Remove the persisted configuration and exit
    #[arg(long)]
    reset: bool,

    /// Target of the in-app CSV export
    #[arg(short, long, default_value = "hr.csv")]
    export_path: PathBuf,

    /// Do not ring the terminal bell on alarms
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let tick = parse_duration(&args.tick)
        .with_context(|| format!("Invalid --tick value: {}", args.tick))?
        .max(Duration::from_millis(10));

    init_logging(&args)?;

    let storage = FileStorage::new(&args.config_dir);
    let blob_path = storage.path_for(STORAGE_KEY);
    let mut store = ConfigStore::new(Box::new(storage));

    // Handle reset mode (non-interactive)
    if args.reset {
        store.reset()?;
        println!("Removed persisted configuration: {}", blob_path.display());
        return Ok(());
    }

    // Network tasks run on this runtime while the UI owns the main thread
    let rt = tokio::runtime::Runtime::new()?;
    let connector = HttpConnector::new(rt.handle().clone())?;

    let palette = Theme::auto_detect();
    let mut app = App::new(store, Box::new(connector))
        .with_palette(palette)
        .with_export_path(&args.export_path);
    if args.quiet {
        app = app.with_notifier(Box::new(Silent));
    }

    info!(source = %app.source_description(), "pulsewatch v{}", env!("CARGO_PKG_VERSION"));

    let result = run_tui(&mut app, tick);

    rt.shutdown_timeout(Duration::from_millis(500));
    result
}

/// Send tracing output to the log file, filtered by RUST_LOG or --log-level.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&args.log_file)
        .with_context(|| format!("Cannot open log file {}", args.log_file.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

/// Run the TUI until the user quits
fn run_tui(app: &mut App, tick: Duration) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    // Run the main loop
    let result = run_app(&mut terminal, app, tick);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tick: Duration,
) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 30;
    const MIN_HEIGHT: u16 = 8;

    while app.running {
        // Apply everything the transport delivered since the last frame
        app.tick();

        // Draw UI
        terminal.draw(|frame| {
            let area = frame.area();

            // Check for minimum terminal size
            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                frame.render_widget(paragraph, ui::centered(area, area.width, 2));
                return;
            }

            ui::draw(frame, app);
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(tick)? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }
    }

    Ok(())
}
