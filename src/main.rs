use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use env_logger::{Builder, Target};
use log::{LevelFilter, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    fs::File,
    io::stdout,
    time::{Duration, Instant},
};
use twist_panel::{Config, app::App, error::Result as PanelResult, ui};

const DEFAULT_CONFIG_PATH: &str = "twist_panel.toml";

fn init_logging(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    // stderr belongs to the terminal UI, so logs go to a file
    let file = File::create(&config.debug.log_file)?;
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("twist_panel"), LevelFilter::Debug)
        .parse_default_env()
        .target(Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn load_config(path: &str) -> PanelResult<Config> {
    Ok(Config::load_or_create(path)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&config_path)?;
    init_logging(&config)?;
    info!("Starting up with config {}", config_path);

    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    info!("Shutting down");
    Ok(result?)
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> PanelResult<()> {
    let frame_rate = Duration::from_millis(16); // ~60 FPS
    let mut last_frame = Instant::now();

    terminal.draw(|f| ui::draw(f, app))?;

    while app.running {
        let now = Instant::now();
        let frame_left = frame_rate
            .checked_sub(last_frame.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(app.poll_timeout(now, frame_left))? {
            match event::read()? {
                CrosstermEvent::Key(key) => app.handle_key(key, Instant::now()),
                CrosstermEvent::Mouse(mouse) => app.handle_mouse(mouse, Instant::now()),
                _ => {}
            }
        }

        app.update(Instant::now());

        if last_frame.elapsed() >= frame_rate {
            terminal.draw(|f| ui::draw(f, app))?;
            last_frame = Instant::now();
        }
    }

    Ok(())
}
