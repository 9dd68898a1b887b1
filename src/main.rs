use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    rc::Rc,
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::info;

use typometer::{
    app_dirs::AppDirs,
    clock::{Clock, SystemClock},
    config::FileConfigStore,
    controller::{Controller, Flow},
    engine::EngineSettings,
    logging,
    runtime::{AppEvent, CrosstermEventSource, EventSource, Runner},
    texts::TextSource,
};

/// typing-speed test for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A typing-speed test for the terminal: type the passage shown, watch live wpm and errors, and get your gross wpm when you reach the end."
)]
pub struct Cli {
    /// custom text to type instead of a random built-in passage
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// seed for text selection, for reproducible runs
    #[clap(long)]
    seed: Option<u64>,

    /// path to a JSON config file
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// file to write logs to (defaults to the user state directory)
    #[clap(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = cli.log_file.clone().or_else(AppDirs::log_path) {
        // a missing log file is not a reason to refuse to run
        if let Err(err) = logging::init(&path) {
            eprintln!("typometer: logging disabled, cannot open {}: {err}", path.display());
        }
    }

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = store.load_or_init();
    info!(path = %store.path().display(), ?config, "config loaded");

    let texts = match cli.prompt {
        Some(prompt) => TextSource::new([prompt])?,
        None => TextSource::builtin(),
    };
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let clock: Rc<dyn Clock> = Rc::new(SystemClock);
    let mut controller = Controller::new(
        texts,
        rng,
        Rc::clone(&clock),
        EngineSettings::from(&config),
    );
    let mut runner = Runner::new(CrosstermEventSource::new(), clock, config.tick_rate());

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut controller, &mut runner);

    // restore the terminal before surfacing any error from the loop
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("exiting");
    outcome
}

fn start_tui<B: Backend, R: Rng, E: EventSource>(
    terminal: &mut Terminal<B>,
    controller: &mut Controller<R>,
    runner: &mut Runner<E>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| f.render_widget(controller.session(), f.area()))?;

        match runner.step() {
            AppEvent::Tick => controller.on_tick(),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if controller.handle_key(key) == Flow::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}
