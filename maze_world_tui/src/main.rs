use anyhow::Result;
use clap::Parser;
use maze_world_core::{
    Position,
    episode::{Action, MazeEpisode, PATH_MARKER},
    generator::{Cell, MazeConfig},
    targets::DEFAULT_MAX_REGENERATIONS,
};
use rand::Rng;
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};

/// Target glyph colors, cycled by target index (red, green, blue, purple,
/// yellow, salmon).
const TARGET_COLORS: [Color; 6] = [
    Color::Red,
    Color::Green,
    Color::Blue,
    Color::Magenta,
    Color::Yellow,
    Color::LightRed,
];

const TARGET_COLOR_NAMES: [&str; 6] = ["red", "green", "blue", "purple", "yellow", "salmon"];

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Interior maze size in cells, excluding the outer wall ring
    #[arg(short, long, default_value_t = 9)]
    size: usize,

    /// Number of targets to place
    #[arg(short, long, default_value_t = 3)]
    targets: usize,

    /// Maximum number of rooms to carve
    #[arg(short = 'r', long, default_value_t = 4)]
    max_rooms: usize,

    /// Random seed; drawn at random when omitted
    #[arg(long)]
    seed: Option<u64>,
}

struct App {
    /// The running episode being replayed.
    episode: MazeEpisode,
    config: MazeConfig,
    n_targets: usize,
    seed: u64,
    steps: u64,
    /// Flag to control the main loop.
    should_quit: bool,
}

impl App {
    fn new(config: MazeConfig, n_targets: usize, seed: u64) -> Result<Self> {
        let episode = MazeEpisode::new(&config, n_targets, seed, DEFAULT_MAX_REGENERATIONS)?;
        Ok(App {
            episode,
            config,
            n_targets,
            seed,
            steps: 0,
            should_quit: false,
        })
    }

    /// Advances the demo agent one cell along the oracle path.
    fn tick(&mut self) {
        let Some(path) = self.episode.oracle_path() else {
            return;
        };
        if path.len() < 2 {
            return;
        }
        let agent = self.episode.agent();
        let next = path[1];
        self.episode.step(Action::Move {
            dx: next.x as isize - agent.x as isize,
            dy: next.y as isize - agent.y as isize,
        });
        self.steps += 1;
    }

    /// Starts a fresh episode with a new random seed.
    fn regenerate(&mut self) -> Result<()> {
        self.seed = rand::rng().random();
        self.episode =
            MazeEpisode::new(&self.config, self.n_targets, self.seed, DEFAULT_MAX_REGENERATIONS)?;
        self.steps = 0;
        Ok(())
    }

    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = MazeConfig {
        max_rooms: args.max_rooms,
        ..MazeConfig::with_interior(args.size)
    };
    config.validate()?;
    let seed = args.seed.unwrap_or_else(|| rand::rng().random());

    let mut terminal = setup_terminal()?;
    let mut app = App::new(config, args.targets, seed)?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    result
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                    KeyCode::Char('r') => app.regenerate()?,
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Area for the maze
            Constraint::Length(4), // Area for episode status
            Constraint::Length(2), // Area for help text
        ])
        .split(frame.area());

    render_maze(frame, main_layout[0], app);
    render_status(frame, main_layout[1], app);

    let help_text = Paragraph::new("Press 'q' to quit, 'r' for a new maze.")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

/// Renders the maze grid with the oracle path, targets, and agent.
fn render_maze(frame: &mut Frame, area: Rect, app: &App) {
    let episode = &app.episode;
    let maze = episode.maze();
    let overlay = episode.layout_with_path();
    let agent = episode.agent();
    let assignment = episode.assignment();

    let mut lines: Vec<Line> = Vec::with_capacity(maze.height());
    for y in 0..maze.height() {
        let mut spans: Vec<Span> = Vec::with_capacity(maze.width());
        for x in 0..maze.width() {
            let pos = Position::new(x, y);

            if pos == agent {
                spans.push(Span::styled("@", Style::default().fg(Color::Red).bold()));
                continue;
            }
            if let Some(ix) = assignment.positions().iter().position(|p| *p == pos) {
                let color = TARGET_COLORS[ix % TARGET_COLORS.len()];
                let style = if ix == assignment.active_index() {
                    Style::default().fg(color).bold()
                } else {
                    Style::default().fg(color).dim()
                };
                spans.push(Span::styled("O", style));
                continue;
            }
            spans.push(match maze.grid()[pos] {
                Cell::Wall { variation } => {
                    // Shade walls by their variation block label.
                    let shade = 236 + 2 * variation;
                    Span::styled("#", Style::default().fg(Color::Indexed(shade)))
                }
                Cell::Corridor if overlay[pos] == PATH_MARKER => {
                    Span::styled("·", Style::default().fg(Color::Green))
                }
                Cell::Corridor => Span::raw(" "),
            });
        }
        lines.push(Line::from(spans));
    }

    let maze_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Maze World").borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(maze_paragraph, area);
}

/// Renders seed, step count, and target progress.
fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let assignment = app.episode.assignment();
    let active = assignment.active_index();
    let color = TARGET_COLORS[active % TARGET_COLORS.len()];
    let color_name = TARGET_COLOR_NAMES[active % TARGET_COLOR_NAMES.len()];

    let lines = vec![
        Line::from(format!(
            "Seed: {}  Steps: {}  Targets obtained: {}",
            app.seed,
            app.steps,
            assignment.targets_obtained()
        )),
        Line::from(vec![
            Span::raw("Active target: "),
            Span::styled(
                format!("{} ({})", active, color_name),
                Style::default().fg(color).bold(),
            ),
        ]),
    ];
    let status =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Episode"));
    frame.render_widget(status, area);
}
