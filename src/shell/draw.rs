use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use skill_trials::games::maze::{self, Cell, Point};
use skill_trials::games::reaction::{self, Phase};
use skill_trials::games::{GameId, GameView, Outcome, aim, memory, timing, typing};
use skill_trials::session::{PendingResult, RUN_LENGTH, Screen, Session, Verdict, WIN_THRESHOLD};
use std::io::{Stdout, Write};

pub const AIM_FIELD_WIDTH: u16 = 48;
pub const AIM_FIELD_HEIGHT: u16 = 14;
const TRACK_WIDTH: usize = 48;

#[derive(Clone, Copy, PartialEq, Eq)]
struct Rgb
{
    r: u8,
    g: u8,
    b: u8,
}

const GREEN: Rgb = Rgb { r: 0, g: 255, b: 0 };
const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
const PINK: Rgb = Rgb {
    r: 255,
    g: 105,
    b: 180,
};
const GOLD: Rgb = Rgb {
    r: 255,
    g: 215,
    b: 0,
};
const DIM: Rgb = Rgb {
    r: 90,
    g: 90,
    b: 90,
};

/// Screen region the aim field was drawn into, for mouse hit-testing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldRect
{
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
}

impl FieldRect
{
    /// Terminal cell holding a point given in percent of the field.
    pub fn cell_at(&self, x_percent: f64, y_percent: f64) -> (u16, u16)
    {
        let col = (x_percent / 100.0 * f64::from(self.width)).floor() as u16;
        let row = (y_percent / 100.0 * f64::from(self.height)).floor() as u16;
        (
            self.left + col.min(self.width.saturating_sub(1)),
            self.top + row.min(self.height.saturating_sub(1)),
        )
    }
}

/// Redraws the whole screen and reports where the aim field landed.
pub fn draw(stdout: &mut Stdout, session: &Session) -> Result<Option<FieldRect>, String>
{
    let mut lines = header(session);
    let mut aim_field = None;

    match session.screen() {
        Screen::Home => lines.extend(home_lines(session)),
        Screen::Game => {
            if let Some(def) = session.current_definition() {
                lines.push(format!("Game {} of {}: {}", session.round(), RUN_LENGTH, def.name));
                lines.push(def.tagline.to_string());
                lines.push(String::new());
            }
            if let Some(view) = session.game_view() {
                if let GameView::Aim(_) = view {
                    aim_field = Some(FieldRect {
                        left: 1,
                        top: (lines.len() + 2) as u16,
                        width: AIM_FIELD_WIDTH,
                        height: AIM_FIELD_HEIGHT,
                    });
                }
                lines.extend(game_lines(&view));
            }
            lines.push(String::new());
            lines.push("Retry as needed. Best attempt counts. ESC quits.".to_string());
        }
        Screen::Result => {
            if let Some(pending) = session.pending() {
                lines.extend(result_lines(pending));
            }
        }
        Screen::Final => {
            if let Some(verdict) = session.verdict() {
                lines.extend(final_lines(verdict));
            }
        }
    }

    let output = format!("{}\r\n", lines.join("\r\n"));
    queue!(stdout, MoveTo(0, 0), Clear(ClearType::All)).map_err(|err| err.to_string())?;
    stdout.write_all(output.as_bytes()).map_err(|err| err.to_string())?;
    stdout.flush().map_err(|err| err.to_string())?;
    Ok(aim_field)
}

fn header(session: &Session) -> Vec<String>
{
    let results = session.results();
    vec![
        paint("Love.exe - Valentine Skill Trials", PINK),
        format!(
            "Wins: {}  Losses: {}  Round: {}/{}",
            results.wins(),
            results.losses(),
            session.round(),
            RUN_LENGTH
        ),
        "=".repeat(TRACK_WIDTH + 2),
    ]
}

fn home_lines(session: &Session) -> Vec<String>
{
    let mut lines = vec![
        "Beat the benchmarks. Unlock the Valentine.".to_string(),
        String::new(),
        format!(
            "{RUN_LENGTH} challenges. Win {WIN_THRESHOLD} to reveal the final message. \
             Retry any round as much as you want before locking in a result."
        ),
        String::new(),
        "Benchmarks:".to_string(),
    ];
    for game in session.lineup().games() {
        lines.push(format!("  {:<14} {}", game.definition().name, benchmark(*game)));
    }
    lines.push(String::new());
    lines.push("Press ENTER to start the trials, ESC to quit.".to_string());
    lines
}

fn benchmark(game: GameId) -> String
{
    match game {
        GameId::Reaction => format!("{}ms or faster", reaction::TARGET.as_millis()),
        GameId::Typing => format!("{}+ WPM", typing::TARGET_WPM),
        GameId::Memory => format!("{} sparks", memory::SEQUENCE_LEN),
        GameId::Aim => format!("{} hits in {}s", aim::TARGET_HITS, aim::TIME_LIMIT),
        GameId::Timing => "land in the heart zone".to_string(),
        GameId::Maze => format!("escape in {}s or less", maze::TARGET_TIME),
    }
}

fn game_lines(view: &GameView) -> Vec<String>
{
    match view {
        GameView::Reaction(view) => reaction_lines(view),
        GameView::Typing(view) => typing_lines(view),
        GameView::Memory(view) => memory_lines(view),
        GameView::Aim(view) => aim_lines(view),
        GameView::Timing(view) => timing_lines(view),
        GameView::Maze(view) => maze_lines(view),
    }
}

fn reaction_lines(view: &reaction::View) -> Vec<String>
{
    let pad = match view.phase {
        Phase::Ready => paint("  [  CLICK!  ]  ", GREEN),
        Phase::TooSoon => paint("  [ Too soon! ]  ", RED),
        Phase::Waiting | Phase::Idle => paint("  [  Hold...  ]  ", RED),
    };
    let latest = view
        .latest
        .map(|elapsed| format!("{}ms", (elapsed.as_secs_f64() * 1000.0).round()))
        .unwrap_or_else(|| "-".to_string());
    vec![
        pad,
        String::new(),
        format!("Target: {}ms or faster.", reaction::TARGET.as_millis()),
        format!("Latest: {latest}"),
        "Controls: SPACE when the pad turns green".to_string(),
    ]
}

fn typing_lines(view: &typing::View) -> Vec<String>
{
    let mut typed = String::new();
    for (index, ch) in view.input.chars().enumerate() {
        let expected = view.phrase.chars().nth(index);
        let color = if expected == Some(ch) { GREEN } else { RED };
        typed.push_str(&paint(&ch.to_string(), color));
    }
    vec![
        paint(view.phrase, GOLD),
        format!("> {typed}_"),
        String::new(),
        format!("Target: {}+ WPM, exact phrase.", typing::TARGET_WPM),
        format!("Progress: {}%", view.progress),
    ]
}

fn memory_lines(view: &memory::View) -> Vec<String>
{
    let mut lines = Vec::new();
    let side = (memory::TILE_COUNT as f64).sqrt() as usize;
    for row in 0..side {
        let mut line = String::from("  ");
        for col in 0..side {
            let tile = row * side + col;
            let label = format!("[{}]", tile + 1);
            if view.active == Some(tile) {
                line.push_str(&paint(&label, GOLD));
            } else if view.ready {
                line.push_str(&label);
            } else {
                line.push_str(&paint(&label, DIM));
            }
            line.push(' ');
        }
        lines.push(line);
    }
    lines.push(String::new());
    lines.push(format!("Sequence length: {}.", view.length));
    if view.ready {
        lines.push(format!("Progress: {}/{}", view.step, view.length));
        lines.push("Controls: keys 1-9 repeat the pattern".to_string());
    } else {
        lines.push("Progress: Watching...".to_string());
    }
    lines
}

fn aim_lines(view: &aim::View) -> Vec<String>
{
    let field = FieldRect {
        left: 0,
        top: 0,
        width: AIM_FIELD_WIDTH,
        height: AIM_FIELD_HEIGHT,
    };
    let (target_col, target_row) = field.cell_at(view.target.x, view.target.y);
    let mut lines = vec![format!("Hits: {}  Time left: {}s", view.hits, view.time_left)];
    lines.push(format!("+{}+", "-".repeat(AIM_FIELD_WIDTH as usize)));
    for row in 0..AIM_FIELD_HEIGHT {
        let mut line = String::from("|");
        for col in 0..AIM_FIELD_WIDTH {
            if row == target_row && col == target_col {
                line.push_str(&paint("♥", RED));
            } else {
                line.push(' ');
            }
        }
        line.push('|');
        lines.push(line);
    }
    lines.push(format!("+{}+", "-".repeat(AIM_FIELD_WIDTH as usize)));
    lines.push("Controls: click the heart".to_string());
    lines
}

fn timing_lines(view: &timing::View) -> Vec<String>
{
    let slot = |value: f64| ((value * (TRACK_WIDTH - 1) as f64).round() as usize).min(TRACK_WIDTH - 1);
    let zone = (timing::WINDOW * (TRACK_WIDTH - 1) as f64).round() as usize;
    let target = slot(view.target);
    let slider = slot(view.position);

    let mut track = String::from("|");
    for index in 0..TRACK_WIDTH {
        if index == slider {
            track.push_str(&paint("█", GOLD));
        } else if index.abs_diff(target) <= zone {
            track.push_str(&paint("♥", PINK));
        } else {
            track.push('-');
        }
    }
    track.push('|');

    vec![
        track,
        String::new(),
        if view.stopped {
            "Locked".to_string()
        } else {
            "Controls: SPACE to stop".to_string()
        },
    ]
}

fn maze_lines(view: &maze::View) -> Vec<String>
{
    let mut lines = Vec::new();
    let size = view.grid.size();
    for row in 0..size {
        let mut line = String::from("  ");
        for col in 0..size {
            let point = Point::new(row, col);
            if point == view.player {
                line.push_str(&paint("♥ ", PINK));
            } else if point == view.exit {
                line.push_str(&paint("★ ", GOLD));
            } else if view.grid.cell(point) == Some(Cell::Wall) {
                line.push_str("██");
            } else {
                line.push_str("  ");
            }
        }
        lines.push(line);
    }
    lines.push(String::new());
    lines.push(format!(
        "Moves: {}  Time: {}s  Time to beat: {}s",
        view.moves,
        view.time_left,
        maze::TARGET_TIME
    ));
    lines.push("Controls: arrow keys or WASD".to_string());
    lines
}

fn result_lines(pending: &PendingResult) -> Vec<String>
{
    let (chip, title, color) = match pending.outcome {
        Outcome::Win => ("Victory", "Benchmark cleared!", GREEN),
        Outcome::Loss => ("Missed It", "Benchmark missed.", RED),
    };
    let mut lines = vec![
        paint(chip, color),
        format!("{}: {}", pending.game.definition().name, title),
        pending
            .details
            .clone()
            .unwrap_or_else(|| "Lock it in or try again.".to_string()),
        String::new(),
    ];
    match pending.outcome {
        Outcome::Win => lines.push("ENTER: lock win + continue".to_string()),
        Outcome::Loss => {
            lines.push("R: retry round".to_string());
            lines.push("ENTER: count loss + continue".to_string());
        }
    }
    lines
}

fn final_lines(verdict: Verdict) -> Vec<String>
{
    let (chip, color) = match verdict {
        Verdict::Unlocked => ("Unlocked", GOLD),
        Verdict::Locked => ("Locked", DIM),
    };
    vec![
        paint(chip, color),
        verdict.title().to_string(),
        verdict.message().to_string(),
        String::new(),
        "ENTER: run it back   H: return home   ESC: quit".to_string(),
    ]
}

fn paint(text: &str, color: Rgb) -> String
{
    format!(
        "\x1b[38;2;{};{};{}m{}\x1b[0m",
        color.r, color.g, color.b, text
    )
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn waiting_pad_text_is_ascii()
    {
        let view = reaction::View {
            phase: Phase::Waiting,
            delay: std::time::Duration::from_millis(1500),
            latest: None,
        };
        let pad = &reaction_lines(&view)[0];
        assert!(pad.contains("[  Hold...  ]"));
        assert!(pad.is_ascii());
    }

    #[test]
    fn field_corners_map_inside_the_rect()
    {
        let field = FieldRect {
            left: 1,
            top: 5,
            width: 40,
            height: 10,
        };
        assert_eq!(field.cell_at(0.0, 0.0), (1, 5));
        assert_eq!(field.cell_at(100.0, 100.0), (40, 14));
        assert_eq!(field.cell_at(50.0, 50.0), (21, 10));
    }
}
