use appseek::cli::{AppConfig, Args};
use appseek::config::UserConfig;
use appseek::coordinator::{CoordinatorOptions, SearchMode, Snapshot, SyncCoordinator};
use appseek::geometry::{GeometrySaver, WindowGeometry, SAVE_DEBOUNCE};
use appseek::thumbnail::{GenericIcons, ImageIconExtractor, ThumbnailCache};
use appseek::tui::{handle_key_event, render, KeyAction};
use appseek::Result;

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use std::{io, time::Duration};

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse_args();

    init_logging(args.verbose, !args.print);

    // Load user configuration
    let user_config = UserConfig::load_or_default();

    // Validate arguments
    if let Err(e) = args.validate(&user_config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let config = AppConfig::from_parts(args, user_config);
    let coordinator = start_coordinator(&config)?;

    if config.print {
        print_matches(coordinator, &config)
    } else {
        run_app(coordinator)
    }
}

/// Logs go to a file under the cache dir while the terminal UI owns the screen
fn init_logging(verbose: bool, to_file: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).parse_default_env();

    if to_file {
        if let Some(file) = open_log_file() {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
    }

    builder.init();
}

fn open_log_file() -> Option<File> {
    let dir = dirs::cache_dir()?.join("appseek");
    fs::create_dir_all(&dir).ok()?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("appseek.log"))
        .ok()
}

fn start_coordinator(config: &AppConfig) -> Result<SyncCoordinator> {
    let icons = GenericIcons::load(config.icons_dir.as_deref());
    let cache = ThumbnailCache::new(icons, Arc::new(ImageIconExtractor), &config.deny_list);

    let options = CoordinatorOptions {
        roots: config.sources.clone(),
        limit: config.result_limit,
        delays: config.delays,
    };
    info!(
        "Starting with {} catalog sources, {} deny-listed extensions",
        options.roots.len(),
        config.deny_list.len()
    );

    let coordinator = SyncCoordinator::new(options, Arc::new(cache))?;

    // entering filesystem mode clears the key, so the base goes first
    if let Some(base) = &config.base {
        coordinator.set_search_base(Some(base.clone()))?;
    }
    if !config.key.is_empty() {
        coordinator.set_key(config.key.clone())?;
    }

    Ok(coordinator)
}

/// Headless mode: prints the ranked matches once any crawl has finished
fn print_matches(coordinator: SyncCoordinator, config: &AppConfig) -> Result<()> {
    let snapshot = coordinator.wait_for_idle()?;

    for entry in &snapshot.results {
        println!("{}", entry.path().display());
    }
    if snapshot.results.is_empty() {
        eprintln!("No matches for '{}'", config.key);
    }

    coordinator.shutdown()
}

/// Runs the TUI application with configuration
fn run_app(mut coordinator: SyncCoordinator) -> Result<()> {
    let geometry_path = WindowGeometry::default_path();
    let geometry = geometry_path
        .as_deref()
        .map(WindowGeometry::load)
        .unwrap_or_default();

    let runtime = coordinator.runtime_handle();
    let saver = geometry_path.map(|path| {
        let _guard = runtime.enter();
        GeometrySaver::spawn(path, SAVE_DEBOUNCE)
    });

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_loop(&mut terminal, &mut coordinator, geometry, saver.as_ref());

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Some(saver) = saver {
        runtime.block_on(saver.close());
    }
    coordinator.shutdown()?;

    result
}

/// Suspends the TUI terminal to allow external programs to run
fn suspend_terminal<B: ratatui::backend::Backend + std::io::Write>(
    terminal: &mut Terminal<B>,
) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Resumes the TUI terminal after external program exits
fn resume_terminal<B: ratatui::backend::Backend + std::io::Write>(
    terminal: &mut Terminal<B>,
) -> io::Result<()> {
    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    terminal.hide_cursor()?;
    terminal.clear()?;
    Ok(())
}

/// Opens `path` with the system handler, restoring the terminal around it
fn open_path<B: ratatui::backend::Backend + std::io::Write>(
    terminal: &mut Terminal<B>,
    path: &Path,
) -> io::Result<()> {
    suspend_terminal(terminal)?;
    let open_result = open::that(path);
    resume_terminal(terminal)?;

    match open_result {
        Ok(()) => info!("Opened {}", path.display()),
        Err(e) => warn!("Failed to open {}: {}", path.display(), e),
    }
    Ok(())
}

/// Main application loop
fn run_loop<B: ratatui::backend::Backend + std::io::Write>(
    terminal: &mut Terminal<B>,
    coordinator: &mut SyncCoordinator,
    mut geometry: WindowGeometry,
    saver: Option<&GeometrySaver>,
) -> Result<()> {
    let mut snapshot: Snapshot = coordinator.snapshot();
    let mut dirty = true;

    loop {
        if coordinator.has_changed() {
            snapshot = coordinator.snapshot();
            dirty = true;
        }

        if dirty {
            terminal.draw(|frame| render(frame, &snapshot, &geometry))?;
            dirty = false;
        }

        // Handle input
        if !event::poll(Duration::from_millis(50))? {
            continue;
        }

        let key = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => key,
            Event::Resize(..) => {
                dirty = true;
                continue;
            }
            _ => continue,
        };

        match handle_key_event(key) {
            KeyAction::Quit => break,
            KeyAction::Type(c) => {
                let mut key = snapshot.key.clone();
                key.push(c);
                coordinator.set_key(key)?;
            }
            KeyAction::Backspace => {
                let mut key = snapshot.key.clone();
                if key.pop().is_some() {
                    coordinator.set_key(key)?;
                }
            }
            KeyAction::Next => coordinator.select_next()?,
            KeyAction::Previous => coordinator.select_previous()?,
            KeyAction::Pivot => {
                coordinator.pivot_into_selected()?;
            }
            KeyAction::Open => {
                if let Some(entry) = snapshot.selected_entry() {
                    open_path(terminal, entry.path())?;
                    coordinator.reset()?;
                    dirty = true;
                }
            }
            KeyAction::OpenParent => {
                if let Some(parent) = snapshot.selected_entry().and_then(|e| e.path().parent()) {
                    open_path(terminal, parent)?;
                    dirty = true;
                }
            }
            KeyAction::Back => match snapshot.mode {
                SearchMode::FileSystem { .. } => coordinator.set_search_base(None)?,
                SearchMode::Catalog => break,
            },
            KeyAction::Refresh => {
                let diff = coordinator.refresh_catalog()?;
                info!("Catalog refresh: {} added, {} removed", diff.added, diff.removed);
            }
            KeyAction::MovePanel(dx, dy) => {
                geometry = geometry.nudged(dx, dy);
                if let Some(saver) = saver {
                    saver.update(geometry);
                }
                dirty = true;
            }
            KeyAction::None => {}
        }
    }

    Ok(())
}
