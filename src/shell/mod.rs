mod draw;

use crossterm::cursor::{Hide, Show};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use draw::FieldRect;
use skill_trials::games::{Direction, GameId, GameView, Input, Outcome};
use skill_trials::session::{Screen, Session, SessionError};
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

const FRAME_MS: u64 = 16;

struct TerminalGuard
{
    stdout: Stdout,
}

impl TerminalGuard
{
    fn enter() -> io::Result<Self>
    {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture, Hide)?;
        Ok(Self { stdout })
    }

    fn stdout(&mut self) -> &mut Stdout
    {
        &mut self.stdout
    }
}

impl Drop for TerminalGuard
{
    fn drop(&mut self)
    {
        let _ = execute!(self.stdout, Show, DisableMouseCapture, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Drives the session until the player quits.
pub fn run(session: &mut Session) -> Result<(), String>
{
    let mut term = TerminalGuard::enter().map_err(|err| err.to_string())?;
    let mut aim_field: Option<FieldRect> = None;
    let mut last_frame = Instant::now();

    tracing::info!("shell started");
    loop {
        if handle_input(session, aim_field)? {
            break;
        }

        if last_frame.elapsed() >= Duration::from_millis(FRAME_MS) {
            session.tick();
            aim_field = draw::draw(term.stdout(), session)?;
            last_frame = Instant::now();
        }

        std::thread::sleep(Duration::from_millis(1));
    }
    tracing::info!("shell closed");
    Ok(())
}

/// Drains pending terminal events; returns true when the player quits.
fn handle_input(session: &mut Session, aim_field: Option<FieldRect>) -> Result<bool, String>
{
    while event::poll(Duration::from_millis(0)).map_err(|err| err.to_string())? {
        match event::read().map_err(|err| err.to_string())? {
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => {
                if code == KeyCode::Esc
                    || (code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL))
                {
                    return Ok(true);
                }
                handle_key(session, code);
            }
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                ..
            }) => handle_click(session, aim_field, column, row),
            _ => {}
        }
    }
    Ok(false)
}

fn handle_key(session: &mut Session, code: KeyCode)
{
    match session.screen() {
        Screen::Home => {
            if matches!(code, KeyCode::Enter | KeyCode::Char(' ')) {
                session.start_run();
            }
        }
        Screen::Game => {
            if let Some(input) = game_input(session, code) {
                session.input(input);
            }
        }
        Screen::Result => match code {
            KeyCode::Enter => report(session.lock_in_pending()),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let lost = session
                    .pending()
                    .is_some_and(|pending| pending.outcome == Outcome::Loss);
                if lost {
                    report(session.retry_current());
                }
            }
            _ => {}
        },
        Screen::Final => match code {
            KeyCode::Enter => session.start_run(),
            KeyCode::Char('h') | KeyCode::Char('H') => session.reset_to_home(),
            _ => {}
        },
    }
}

fn game_input(session: &Session, code: KeyCode) -> Option<Input>
{
    let game = session.current_game()?;
    match game {
        GameId::Reaction => match code {
            KeyCode::Enter | KeyCode::Char(' ') => Some(Input::Click),
            _ => None,
        },
        GameId::Typing => {
            let Some(GameView::Typing(view)) = session.game_view() else {
                return None;
            };
            let mut text = view.input;
            match code {
                KeyCode::Char(ch) => text.push(ch),
                KeyCode::Backspace => {
                    text.pop()?;
                }
                _ => return None,
            }
            Some(Input::Text(text))
        }
        GameId::Memory => match code {
            KeyCode::Char(ch @ '1'..='9') => {
                let tile = ch.to_digit(10)? as usize - 1;
                Some(Input::Tile(tile))
            }
            _ => None,
        },
        GameId::Aim => None,
        GameId::Timing => match code {
            KeyCode::Enter | KeyCode::Char(' ') => Some(Input::Stop),
            _ => None,
        },
        GameId::Maze => {
            let direction = match code {
                KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Direction::Up,
                KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Direction::Down,
                KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Direction::Left,
                KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Direction::Right,
                _ => return None,
            };
            Some(Input::Move(direction))
        }
    }
}

fn handle_click(session: &mut Session, aim_field: Option<FieldRect>, column: u16, row: u16)
{
    if session.screen() != Screen::Game {
        return;
    }
    let (Some(field), Some(GameView::Aim(view))) = (aim_field, session.game_view()) else {
        return;
    };
    if (column, row) == field.cell_at(view.target.x, view.target.y) {
        session.input(Input::Hit);
    }
}

fn report(result: Result<(), SessionError>)
{
    if let Err(err) = result {
        tracing::warn!(%err, "session rejected command");
    }
}
