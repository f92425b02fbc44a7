use std::fs::File;
use std::io::{self, Stdout, Write};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use log::{debug, info, warn};
use simplelog::{LevelFilter, WriteLogger};

use maze_chase::puzzle::PuzzleState;
use maze_chase::{Action, Dir, Pos, SaveStore, Session, SessionConfig, State, Tile};

const CELL_W: usize = 2;
const DEFAULT_TICK_MS: u64 = 33;
const DEFAULT_RENDER_FPS: u64 = 60;
const SAVE_FILE: &str = "savegame.txt";
const HIGH_SCORE_FILE: &str = "highscore.txt";

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Player,
    Enemy,
    Food,
    ScorePower,
    FreezePower,
    Exit,
    Wall,
    Floor,
}

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    glyph: Glyph,
    color: Color,
}

/// Diff renderer: repaints only cells whose glyph changed since the last
/// frame, plus the HUD line when its text changes.
struct Renderer {
    last: Vec<Cell>,
    last_hud: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    fn new(width: usize, height: usize) -> Self {
        Self {
            last: vec![
                Cell {
                    glyph: Glyph::Floor,
                    color: Color::Reset,
                };
                width * height
            ],
            last_hud: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }
}

fn main() -> anyhow::Result<()> {
    setup_logging()?;
    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

// Logging goes to a file: stderr would tear up the raw-mode screen.
fn setup_logging() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--debug") {
        WriteLogger::init(
            LevelFilter::Debug,
            simplelog::Config::default(),
            File::create("maze-chase.log").context("creating log file")?,
        )?;
    }
    Ok(())
}

fn run(stdout: &mut Stdout) -> anyhow::Result<()> {
    let store = SaveStore::new(SAVE_FILE, HIGH_SCORE_FILE);
    let config = SessionConfig::default();
    let mut session = Session::new(config, store.load_high_score())?;
    let mut renderer = Renderer::new(config.grid_width, config.grid_height);
    let mut status = String::new();
    let mut last_state = session.state();

    let (tick_ms, render_fps) = read_speed_settings();
    let dt = tick_ms as f32 / 1000.0;
    let frame_time = Duration::from_micros(1_000_000 / render_fps.max(1));
    let mut last_tick = Instant::now();

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                    handle_key(key.code, &mut session, &store, &mut status);
                }
            }
        }

        if session.state() == State::Quit {
            return Ok(());
        }

        if last_tick.elapsed() >= Duration::from_millis(tick_ms) {
            last_tick = Instant::now();
            session.tick(dt);
        }

        for cue in session.drain_cues() {
            // The audio boundary consumes named cues only.
            debug!("cue: {cue:?}");
        }
        if let Some(high) = session.take_high_score_update() {
            if let Err(err) = store.save_high_score(high) {
                warn!("could not persist high score: {err}");
            }
        }

        if session.state() != last_state {
            renderer.needs_full = true;
            stdout.queue(Clear(ClearType::All))?;
            last_state = session.state();
        }

        match session.state() {
            State::Menu => render_menu(stdout, &session, &status)?,
            State::Playing => render_playing(stdout, &session, &mut renderer)?,
            State::Puzzle => render_puzzle(stdout, &session)?,
            State::GameOver => render_game_over(stdout, &session)?,
            State::Quit => return Ok(()),
        }

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

fn read_speed_settings() -> (u64, u64) {
    let tick_ms = std::env::var("MAZE_CHASE_TICK_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_TICK_MS);
    let render_fps = std::env::var("MAZE_CHASE_FPS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_RENDER_FPS);
    (tick_ms, render_fps)
}

fn handle_key(code: KeyCode, session: &mut Session, store: &SaveStore, status: &mut String) {
    match session.state() {
        State::Menu => match code {
            KeyCode::Char('s') | KeyCode::Enter => session.handle_action(Action::Start),
            KeyCode::Char('l') => match store.load_game() {
                Ok(Some(data)) => session.handle_action(Action::LoadFrom(data)),
                Ok(None) => *status = "No save found - starting fresh".into(),
                Err(err) => {
                    info!("save unusable: {err}");
                    *status = "Save file unreadable - starting fresh".into();
                }
            },
            KeyCode::Char('q') => session.handle_action(Action::Quit),
            _ => {}
        },
        State::Playing => match code {
            KeyCode::Up | KeyCode::Char('w') => session.handle_action(Action::Move(Dir::Up)),
            KeyCode::Down | KeyCode::Char('s') => session.handle_action(Action::Move(Dir::Down)),
            KeyCode::Left | KeyCode::Char('a') => session.handle_action(Action::Move(Dir::Left)),
            KeyCode::Right | KeyCode::Char('d') => session.handle_action(Action::Move(Dir::Right)),
            KeyCode::Char('p') => session.handle_action(Action::TogglePause),
            KeyCode::Char('u') => {
                if let Err(err) = store.save_game(&session.save_data()) {
                    warn!("save failed: {err}");
                }
            }
            KeyCode::Char('m') => session.handle_action(Action::ReturnToMenu),
            KeyCode::Char('q') => session.handle_action(Action::Quit),
            _ => {}
        },
        State::Puzzle => match code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                session.handle_action(Action::PuzzleDigit(c));
            }
            KeyCode::Backspace => session.handle_action(Action::PuzzleBackspace),
            KeyCode::Enter => session.handle_action(Action::PuzzleSubmit),
            KeyCode::Char('m') => session.handle_action(Action::ReturnToMenu),
            KeyCode::Char('q') => session.handle_action(Action::Quit),
            _ => {}
        },
        State::GameOver => match code {
            KeyCode::Char('r') => session.handle_action(Action::Replay),
            KeyCode::Char('m') => session.handle_action(Action::ReturnToMenu),
            KeyCode::Char('q') => session.handle_action(Action::Quit),
            _ => {}
        },
        State::Quit => {}
    }
}

fn render_menu(stdout: &mut Stdout, session: &Session, status: &str) -> io::Result<()> {
    let lines = [
        "MAZE CHASE".to_string(),
        String::new(),
        "s - start".to_string(),
        "l - load save".to_string(),
        "q - quit".to_string(),
        String::new(),
        format!("High score: {}", session.high_score()),
        status.to_string(),
    ];
    draw_centered_lines(stdout, &lines)
}

fn render_playing(
    stdout: &mut Stdout,
    session: &Session,
    renderer: &mut Renderer,
) -> io::Result<()> {
    let grid = session.grid();
    let needed_h = (grid.height() + 3) as u16;
    let needed_w = (grid.width() * CELL_W) as u16;

    let (term_w, term_h) = terminal::size()?;
    if term_w < needed_w || term_h < needed_h {
        stdout.queue(MoveTo(0, 0))?;
        stdout.queue(Clear(ClearType::All))?;
        stdout.queue(Print(format!(
            "Terminal too small. Need at least {}x{} (cols x rows).",
            needed_w, needed_h
        )))?;
        stdout.flush()?;
        renderer.needs_full = true;
        return Ok(());
    }

    let origin_x = (term_w - needed_w) / 2;
    let origin_y = (term_h - needed_h) / 2 + 1;
    if origin_x != renderer.origin_x || origin_y != renderer.origin_y {
        renderer.origin_x = origin_x;
        renderer.origin_y = origin_y;
        renderer.needs_full = true;
    }

    let hud = format!(
        "Score: {}  High: {}  Level: {}  Time: {:>4.1}{}",
        session.score(),
        session.high_score(),
        session.level(),
        session.time_left(),
        if session.is_paused() { "  [PAUSED]" } else { "" }
    );
    if renderer.needs_full || hud != renderer.last_hud {
        stdout.queue(MoveTo(renderer.origin_x, renderer.origin_y - 1))?;
        stdout.queue(SetForegroundColor(Color::White))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(Print(&hud))?;
        stdout.queue(ResetColor)?;
        renderer.last_hud = hud;
    }

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let cell = cell_for(session, Pos::new(x, y));
            let idx = y * grid.width() + x;
            if renderer.needs_full || cell != renderer.last[idx] {
                renderer.last[idx] = cell;
                draw_cell(stdout, renderer, x, y, cell)?;
            }
        }
    }
    renderer.needs_full = false;

    stdout.queue(MoveTo(
        renderer.origin_x,
        renderer.origin_y + grid.height() as u16,
    ))?;
    stdout.queue(Print("wasd/arrows move  p pause  u save  m menu  q quit"))?;
    stdout.flush()?;
    Ok(())
}

fn cell_for(session: &Session, pos: Pos) -> Cell {
    if pos == session.player() {
        return Cell {
            glyph: Glyph::Player,
            color: Color::Yellow,
        };
    }
    if session.enemy_positions().any(|p| p == pos) {
        return Cell {
            glyph: Glyph::Enemy,
            color: if session.enemies_frozen() {
                Color::Blue
            } else {
                Color::Red
            },
        };
    }
    if session.food_pos() == pos {
        return Cell {
            glyph: Glyph::Food,
            color: Color::Green,
        };
    }
    if session.score_powerup_pos() == Some(pos) {
        return Cell {
            glyph: Glyph::ScorePower,
            color: Color::Magenta,
        };
    }
    if session.freeze_powerup_pos() == Some(pos) {
        return Cell {
            glyph: Glyph::FreezePower,
            color: Color::Cyan,
        };
    }
    if session.exit_pos() == Some(pos) {
        return Cell {
            glyph: Glyph::Exit,
            color: Color::Green,
        };
    }
    match session.grid().tile(pos) {
        Tile::Wall => Cell {
            glyph: Glyph::Wall,
            color: Color::DarkBlue,
        },
        Tile::Path => Cell {
            glyph: Glyph::Floor,
            color: Color::Reset,
        },
    }
}

fn draw_cell(
    stdout: &mut Stdout,
    renderer: &Renderer,
    x: usize,
    y: usize,
    cell: Cell,
) -> io::Result<()> {
    let text = match cell.glyph {
        Glyph::Player => "@ ",
        Glyph::Enemy => "& ",
        Glyph::Food => "* ",
        Glyph::ScorePower => "$ ",
        Glyph::FreezePower => "# ",
        Glyph::Exit => ">>",
        Glyph::Wall => "██",
        Glyph::Floor => "  ",
    };
    let x_pos = renderer.origin_x + (x * CELL_W) as u16;
    let y_pos = renderer.origin_y + y as u16;
    stdout.queue(MoveTo(x_pos, y_pos))?;
    stdout.queue(SetForegroundColor(cell.color))?;
    stdout.queue(Print(text))?;
    let w = unicode_width::UnicodeWidthStr::width(text);
    if w < CELL_W {
        for _ in 0..(CELL_W - w) {
            stdout.queue(Print(' '))?;
        }
    }
    stdout.queue(ResetColor)?;
    Ok(())
}

fn render_puzzle(stdout: &mut Stdout, session: &Session) -> io::Result<()> {
    let Some(puzzle) = session.puzzle() else {
        return Ok(());
    };
    let notice = match puzzle.state() {
        PuzzleState::Rejected => "Wrong answer, try again",
        PuzzleState::InvalidFormat => "Enter a number",
        _ => "",
    };
    let lines = [
        "EXIT PUZZLE".to_string(),
        String::new(),
        puzzle.prompt(),
        format!("> {}_", puzzle.input()),
        format!("Attempts left: {}", puzzle.attempts_left()),
        notice.to_string(),
        String::new(),
        "digits + enter to answer, m for menu".to_string(),
    ];
    draw_centered_lines(stdout, &lines)
}

fn render_game_over(stdout: &mut Stdout, session: &Session) -> io::Result<()> {
    let lines = [
        "GAME OVER".to_string(),
        String::new(),
        format!("Final score: {}", session.score()),
        format!("High score: {}", session.high_score()),
        String::new(),
        "r - replay".to_string(),
        "m - menu".to_string(),
        "q - quit".to_string(),
    ];
    draw_centered_lines(stdout, &lines)
}

fn draw_centered_lines(stdout: &mut Stdout, lines: &[String]) -> io::Result<()> {
    let (term_w, term_h) = terminal::size()?;
    let top = (term_h / 2).saturating_sub(lines.len() as u16 / 2);
    for (i, line) in lines.iter().enumerate() {
        let width = unicode_width::UnicodeWidthStr::width(line.as_str()) as u16;
        let x = (term_w / 2).saturating_sub(width / 2);
        stdout.queue(MoveTo(0, top + i as u16))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(MoveTo(x, top + i as u16))?;
        stdout.queue(Print(line))?;
    }
    stdout.flush()?;
    Ok(())
}
