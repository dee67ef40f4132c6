//! Star Swarm terminal host
//!
//! Each terminal cell stands for a fixed patch of arena units. Mouse clicks
//! become pointer events; frames are drawn with crossterm from the render
//! thread.

use std::io::{BufWriter, Stdout, Write, stdout};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    ExecutableCommand, QueueableCommand, cursor,
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
        MouseEventKind,
    },
    style::{self, Color, Print},
    terminal,
};
use glam::Vec2;
use parking_lot::Mutex;

use star_swarm::highscores::{JsonFileStore, MemoryStore, StartScreenScores};
use star_swarm::runtime::{FrameSink, Game, RenderSnapshot, Session, SessionEvent};
use star_swarm::sim::collision::Aabb;
use star_swarm::sim::{Arena, input::RESET_LABEL};
use star_swarm::{Result, ScoreGateway, Settings};

const SETTINGS_PATH: &str = "star_swarm.json";

/// Arena units covered by one terminal cell
const CELL: Vec2 = Vec2::new(20.0, 50.0);

/// How long the host waits for terminal input before checking game events
const INPUT_POLL: Duration = Duration::from_millis(10);

fn arena_for(cols: u16, rows: u16) -> Result<Arena> {
    Arena::new(cols as f32 * CELL.x, rows as f32 * CELL.y)
}

/// Center of a terminal cell in arena units
fn cell_center(col: u16, row: u16) -> Vec2 {
    (Vec2::new(col as f32, row as f32) + 0.5) * CELL
}

fn cell_of(pos: Vec2) -> (u16, u16) {
    let cell = (pos / CELL).max(Vec2::ZERO);
    (cell.x as u16, cell.y as u16)
}

/// Cell-clipped drawing helpers for one frame
struct Canvas<'a, W: Write> {
    out: &'a mut W,
    cols: u16,
    rows: u16,
}

impl<'a, W: Write> Canvas<'a, W> {
    fn new(out: &'a mut W, arena: &Arena) -> Self {
        let (cols, rows) = cell_of(Vec2::new(arena.width, arena.height));
        Self { out, cols, rows }
    }

    fn text(&mut self, col: u16, row: u16, text: &str, color: Color) -> std::io::Result<()> {
        if row >= self.rows || col >= self.cols {
            return Ok(());
        }
        let room = (self.cols - col) as usize;
        let clipped: String = text.chars().take(room).collect();
        self.out.queue(cursor::MoveTo(col, row))?;
        self.out.queue(style::SetForegroundColor(color))?;
        self.out.queue(Print(clipped))?;
        Ok(())
    }

    fn centered(&mut self, row: u16, text: &str, color: Color) -> std::io::Result<()> {
        let len = text.chars().count() as u16;
        self.text(self.cols.saturating_sub(len) / 2, row, text, color)
    }

    fn point(&mut self, pos: Vec2, glyph: char, color: Color) -> std::io::Result<()> {
        let (col, row) = cell_of(pos);
        self.text(col, row, &glyph.to_string(), color)
    }

    fn fill(&mut self, area: &Aabb, glyph: char, color: Color) -> std::io::Result<()> {
        let (c0, r0) = cell_of(area.min());
        // Exclusive far edge
        let (c1, r1) = cell_of(area.max() - Vec2::splat(0.01));
        let width = c1.saturating_sub(c0) as usize + 1;
        let line: String = std::iter::repeat_n(glyph, width).collect();
        for row in r0..=r1 {
            self.text(c0, row, &line, color)?;
        }
        Ok(())
    }
}

fn draw_frame<W: Write>(out: &mut W, frame: &RenderSnapshot) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    let mut canvas = Canvas::new(out, &frame.arena);

    for enemy in &frame.enemies {
        canvas.fill(enemy, '#', Color::Green)?;
    }
    for pos in &frame.projectiles {
        canvas.point(*pos, '|', Color::Yellow)?;
    }
    for explosion in &frame.explosions {
        let glyph = if explosion.life() > 0.5 { '*' } else { '.' };
        canvas.point(explosion.pos, glyph, Color::Red)?;
    }
    canvas.fill(&frame.player, '^', Color::Cyan)?;

    canvas.text(0, 0, &format!("Score: {}", frame.score), Color::White)?;
    let (pause_col, _) = cell_of(frame.pause_button.min());
    let label = if frame.paused { "[>]" } else { "[||]" };
    canvas.text(pause_col, 0, label, Color::DarkGrey)?;

    let mid = canvas.rows / 2;
    if frame.paused {
        canvas.centered(mid, "PAUSED", Color::Yellow)?;
    }
    if frame.game_over {
        canvas.centered(mid.saturating_sub(2), "Game Over", Color::Red)?;
        canvas.centered(mid, &format!("Score: {}", frame.score), Color::White)?;
        let (_, reset_row) = cell_of(frame.reset_region.center);
        canvas.centered(reset_row, RESET_LABEL, Color::DarkGrey)?;
    }

    out.queue(style::ResetColor)?;
    out.flush()
}

/// Draws to the terminal, at most once per frame interval
struct TerminalSink {
    out: BufWriter<Stdout>,
    interval: Duration,
    next_frame: Instant,
}

impl TerminalSink {
    fn new(interval_ms: u64) -> Self {
        Self {
            out: BufWriter::new(stdout()),
            interval: Duration::from_millis(interval_ms),
            next_frame: Instant::now(),
        }
    }
}

impl FrameSink for TerminalSink {
    fn present(&mut self, frame: &RenderSnapshot) -> Result<()> {
        let now = Instant::now();
        if self.next_frame > now {
            thread::sleep(self.next_frame - now);
        }
        self.next_frame = Instant::now() + self.interval;
        draw_frame(&mut self.out, frame)?;
        Ok(())
    }
}

fn draw_start_screen<W: Write>(out: &mut W, scores: &StartScreenScores) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    let (cols, rows) = terminal::size()?;
    let mid = rows / 2;
    let center = |text: &str| cols.saturating_sub(text.chars().count() as u16) / 2;

    let title = "STAR SWARM";
    out.queue(cursor::MoveTo(center(title), mid.saturating_sub(4)))?;
    out.queue(style::SetForegroundColor(Color::Cyan))?;
    out.queue(Print(title))?;

    out.queue(style::SetForegroundColor(Color::Yellow))?;
    for (i, line) in scores.lines().iter().enumerate() {
        out.queue(cursor::MoveTo(center(line), mid.saturating_sub(2) + i as u16))?;
        out.queue(Print(line))?;
    }

    let hint = "click or press SPACE to start, Q to quit";
    out.queue(cursor::MoveTo(center(hint), mid + 2))?;
    out.queue(style::SetForegroundColor(Color::DarkGrey))?;
    out.queue(Print(hint))?;

    out.queue(style::ResetColor)?;
    out.flush()
}

/// Returns true to start a run, false to quit
fn start_screen<W: Write>(
    out: &mut W,
    rx: &Receiver<Event>,
    gateway: &Mutex<ScoreGateway>,
) -> Result<bool> {
    let scores = StartScreenScores::new(gateway.lock().record());
    draw_start_screen(out, &scores)?;

    loop {
        let Ok(event) = rx.recv() else {
            return Ok(false);
        };
        match event {
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                ..
            }) => return Ok(true),
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                modifiers,
                ..
            }) => match code {
                KeyCode::Char(' ') | KeyCode::Enter => return Ok(true),
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(false),
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(false);
                }
                _ => {}
            },
            Event::Resize(..) => draw_start_screen(out, &scores)?,
            _ => {}
        }
    }
}

enum RunEnd {
    BackToStart,
    Quit,
}

fn play(
    session: &Arc<Session>,
    gateway: &Arc<Mutex<ScoreGateway>>,
    settings: &Settings,
    rx: &Receiver<Event>,
) -> Result<RunEnd> {
    let sink = TerminalSink::new(settings.frame_interval_ms);
    let mut game = Game::start(
        Arc::clone(session),
        Arc::clone(gateway),
        settings,
        Some(sink),
    )?;

    let end = 'run: loop {
        while let Ok(event) = game.events().try_recv() {
            if event == SessionEvent::ReturnToStart {
                break 'run RunEnd::BackToStart;
            }
        }

        let event = match rx.recv_timeout(INPUT_POLL) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break RunEnd::Quit,
        };

        match event {
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                ..
            }) => {
                let pos = cell_center(column, row);
                session.pointer_down(pos.x, pos.y);
            }
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                modifiers,
                ..
            }) => match code {
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => break RunEnd::Quit,
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    break RunEnd::Quit;
                }
                // Keyboard stand-ins for taps
                KeyCode::Char(' ') => {
                    let ship = session.snapshot().player.center;
                    session.pointer_down(ship.x, ship.y);
                }
                KeyCode::Char('p') | KeyCode::Char('P') => {
                    let button = session.regions().pause.center;
                    session.pointer_down(button.x, button.y);
                }
                _ => {}
            },
            Event::Resize(cols, rows) => {
                session.resize(cols as f32 * CELL.x, rows as f32 * CELL.y);
            }
            Event::FocusLost => game.set_minimized(true),
            _ => {}
        }
    };

    game.stop();
    Ok(end)
}

fn open_gateway(settings: &Settings) -> ScoreGateway {
    match JsonFileStore::open(&settings.score_store_path) {
        Ok(store) => ScoreGateway::new(store),
        Err(e) => {
            log::warn!("Score file unusable, scores will not persist: {}", e);
            ScoreGateway::new(MemoryStore::new())
        }
    }
}

fn run<W: Write>(out: &mut W, rx: &Receiver<Event>, settings: &Settings) -> Result<()> {
    let gateway = Arc::new(Mutex::new(open_gateway(settings)));
    let (cols, rows) = terminal::size()?;
    let session = Arc::new(Session::new(arena_for(cols, rows)?, settings));

    while start_screen(out, rx, &gateway)? {
        let (cols, rows) = terminal::size()?;
        session.resize(cols as f32 * CELL.x, rows as f32 * CELL.y);
        session.restart();

        match play(&session, &gateway, settings, rx)? {
            RunEnd::BackToStart => continue,
            RunEnd::Quit => break,
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    log::info!("Star Swarm starting...");

    let settings = Settings::load(SETTINGS_PATH)?;

    let mut out = BufWriter::new(stdout());
    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;
    out.execute(EnableMouseCapture)?;
    let focus_events = out.execute(EnableFocusChange).is_ok();

    // Blocking terminal reads live on their own thread
    let (tx, rx) = mpsc::channel::<Event>();
    thread::Builder::new()
        .name("terminal-input".into())
        .spawn(move || {
            while let Ok(event) = event::read() {
                if tx.send(event).is_err() {
                    break;
                }
            }
        })?;

    let result = run(&mut out, &rx, &settings);

    // Always restore the terminal
    if focus_events {
        let _ = out.execute(DisableFocusChange);
    }
    let _ = out.execute(DisableMouseCapture);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    if let Err(e) = &result {
        log::error!("Star Swarm exited with error: {}", e);
    }
    result
}
