pub mod aim;
pub mod maze;
pub mod memory;
pub mod reaction;
pub mod timing;
pub mod typing;

use crate::clock::Clock;
use crate::timers::{TimerId, TimerQueue, TimerScope};
use rand::rngs::StdRng;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GameId
{
    Reaction,
    Typing,
    Memory,
    Aim,
    Timing,
    Maze,
}

impl GameId
{
    pub const ALL: [GameId; 6] = [
        GameId::Reaction,
        GameId::Typing,
        GameId::Memory,
        GameId::Aim,
        GameId::Timing,
        GameId::Maze,
    ];

    pub fn key(self) -> &'static str
    {
        match self {
            GameId::Reaction => "reaction",
            GameId::Typing => "typing",
            GameId::Memory => "memory",
            GameId::Aim => "aim",
            GameId::Timing => "timing",
            GameId::Maze => "maze",
        }
    }

    pub fn parse(value: &str) -> Option<Self>
    {
        Self::ALL
            .into_iter()
            .find(|id| id.key().eq_ignore_ascii_case(value.trim()))
    }

    pub fn definition(self) -> &'static GameDefinition
    {
        &REGISTRY[self as usize]
    }
}

impl fmt::Display for GameId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.key())
    }
}

pub struct GameDefinition
{
    pub id: GameId,
    pub name: &'static str,
    pub tagline: &'static str,
}

// Same order as `GameId::ALL`.
static REGISTRY: [GameDefinition; 6] = [
    GameDefinition {
        id: GameId::Reaction,
        name: "Reaction Rush",
        tagline: "Hit space when the heart flashes green.",
    },
    GameDefinition {
        id: GameId::Typing,
        name: "Typing Sprint",
        tagline: "Type the phrase fast and clean.",
    },
    GameDefinition {
        id: GameId::Memory,
        name: "Memory Glow",
        tagline: "Repeat the sparkle pattern.",
    },
    GameDefinition {
        id: GameId::Aim,
        name: "Heart Whack",
        tagline: "Hit the hearts before the timer ends.",
    },
    GameDefinition {
        id: GameId::Timing,
        name: "Timing Strike",
        tagline: "Stop the slider in the sweet spot.",
    },
    GameDefinition {
        id: GameId::Maze,
        name: "Maze Escape",
        tagline: "Find the exit before the clock does.",
    },
];

pub fn registry() -> &'static [GameDefinition]
{
    &REGISTRY
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome
{
    Win,
    Loss,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction
{
    Up,
    Down,
    Left,
    Right,
}

/// User intents a mini-game can receive.
#[derive(Clone, Debug, PartialEq)]
pub enum Input
{
    Click,
    /// Full contents of the text field after an edit.
    Text(String),
    Tile(usize),
    Hit,
    Stop,
    Move(Direction),
}

/// Read-only snapshot the front-end renders from.
#[derive(Clone, Debug)]
pub enum GameView
{
    Reaction(reaction::View),
    Typing(typing::View),
    Memory(memory::View),
    Aim(aim::View),
    Timing(timing::View),
    Maze(maze::View),
}

type Continuation = Box<dyn FnOnce(Option<String>)>;

/// The `on_win` / `on_lose` pair handed to one attempt.
///
/// Both halves are consumed by the first call, so at most one of them ever
/// runs and later calls are ignored.
pub struct Continuations
{
    on_win: Option<Continuation>,
    on_lose: Option<Continuation>,
}

impl Continuations
{
    pub fn new(
        on_win: impl FnOnce(Option<String>) + 'static,
        on_lose: impl FnOnce(Option<String>) + 'static,
    ) -> Self
    {
        Self {
            on_win: Some(Box::new(on_win)),
            on_lose: Some(Box::new(on_lose)),
        }
    }

    fn settle(&mut self, outcome: Outcome, details: Option<String>) -> bool
    {
        let on_win = self.on_win.take();
        let on_lose = self.on_lose.take();
        let callback = match outcome {
            Outcome::Win => on_win,
            Outcome::Loss => on_lose,
        };
        match callback {
            Some(callback) => {
                callback(details);
                true
            }
            None => false,
        }
    }

    pub fn is_spent(&self) -> bool
    {
        self.on_win.is_none() && self.on_lose.is_none()
    }
}

/// Everything a mini-game may touch while it runs: the clock, its own rng,
/// its own timer scope, and its continuations.
pub struct AttemptCx
{
    clock: Rc<dyn Clock>,
    // Due time of the timer being delivered. Timers armed from inside a timer
    // handler count from here, so chains keep their spacing when delivery lags.
    anchor: Option<Duration>,
    timers: TimerScope,
    rng: StdRng,
    continuations: Continuations,
}

impl AttemptCx
{
    pub fn now(&self) -> Duration
    {
        self.clock.now()
    }

    pub fn rng(&mut self) -> &mut StdRng
    {
        &mut self.rng
    }

    pub fn after(&self, delay: Duration) -> TimerId
    {
        self.timers.once(self.base(), delay)
    }

    pub fn every(&self, period: Duration) -> TimerId
    {
        self.timers.every(self.base(), period)
    }

    fn base(&self) -> Duration
    {
        self.anchor.unwrap_or_else(|| self.now())
    }

    pub fn every_frame(&self) -> TimerId
    {
        self.timers.every_frame()
    }

    pub fn cancel(&self, timer: TimerId)
    {
        self.timers.cancel(timer);
    }

    pub fn win(&mut self, details: impl Into<String>)
    {
        self.settle(Outcome::Win, Some(details.into()));
    }

    pub fn lose(&mut self, details: impl Into<String>)
    {
        self.settle(Outcome::Loss, Some(details.into()));
    }

    pub fn is_settled(&self) -> bool
    {
        self.continuations.is_spent()
    }

    fn settle(&mut self, outcome: Outcome, details: Option<String>)
    {
        if self.continuations.settle(outcome, details) {
            let cancelled = self.timers.cancel_all();
            tracing::debug!(?outcome, cancelled, "attempt settled");
        }
    }
}

/// One mini-game state machine.
///
/// Implementations call exactly one of [`AttemptCx::win`] or
/// [`AttemptCx::lose`] exactly once per attempt.
pub trait MiniGame
{
    fn start(&mut self, cx: &mut AttemptCx);

    fn on_timer(&mut self, _timer: TimerId, _cx: &mut AttemptCx) {}

    fn on_frame(&mut self, _timer: TimerId, _cx: &mut AttemptCx) {}

    fn on_input(&mut self, input: &Input, cx: &mut AttemptCx);

    fn view(&self) -> GameView;
}

fn create(id: GameId, rng: &mut StdRng) -> Box<dyn MiniGame>
{
    match id {
        GameId::Reaction => Box::new(reaction::Reaction::new(rng)),
        GameId::Typing => Box::new(typing::Typing::new(rng)),
        GameId::Memory => Box::new(memory::Memory::new(rng)),
        GameId::Aim => Box::new(aim::Aim::new(rng)),
        GameId::Timing => Box::new(timing::TimingSlider::new(rng)),
        GameId::Maze => Box::new(maze::Maze::new(rng)),
    }
}

/// A running instance of one mini-game.
///
/// Dropping the attempt cancels every timer it registered.
pub struct Attempt
{
    state: Box<dyn MiniGame>,
    cx: AttemptCx,
}

impl Attempt
{
    pub fn begin(
        game: GameId,
        clock: Rc<dyn Clock>,
        queue: &Rc<RefCell<TimerQueue>>,
        mut rng: StdRng,
        continuations: Continuations,
    ) -> Self
    {
        let mut state = create(game, &mut rng);
        let mut cx = AttemptCx {
            clock,
            anchor: None,
            timers: TimerQueue::open_scope(queue),
            rng,
            continuations,
        };
        state.start(&mut cx);
        tracing::debug!(%game, "attempt started");
        Self { state, cx }
    }

    pub fn is_settled(&self) -> bool
    {
        self.cx.is_settled()
    }

    /// Delivers every timer due by now, then one frame.
    pub fn pump(&mut self)
    {
        let now = self.cx.now();
        loop {
            if self.cx.is_settled() {
                return;
            }
            let Some((timer, due)) = self.cx.timers.next_due(now) else {
                break;
            };
            self.cx.anchor = Some(due);
            self.state.on_timer(timer, &mut self.cx);
            self.cx.anchor = None;
        }

        for timer in self.cx.timers.frame_timers() {
            if self.cx.is_settled() {
                return;
            }
            if self.cx.timers.is_live(timer) {
                self.state.on_frame(timer, &mut self.cx);
            }
        }
    }

    pub fn input(&mut self, input: &Input)
    {
        if self.cx.is_settled() {
            return;
        }
        self.state.on_input(input, &mut self.cx);
    }

    pub fn view(&self) -> GameView
    {
        self.state.view()
    }
}


#[cfg(test)]
mod tests
{
    use super::harness::Harness;
    use super::*;

    #[test]
    fn registry_covers_every_game_once()
    {
        for id in GameId::ALL {
            let count = registry().iter().filter(|def| def.id == id).count();
            assert_eq!(count, 1, "{id} registered {count} times");
            assert_eq!(id.definition().id, id);
        }
    }

    #[test]
    fn parse_accepts_keys_case_insensitively()
    {
        assert_eq!(GameId::parse("Maze"), Some(GameId::Maze));
        assert_eq!(GameId::parse(" typing "), Some(GameId::Typing));
        assert_eq!(GameId::parse("pong"), None);
    }

    #[test]
    fn continuations_run_at_most_once()
    {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let wins = Rc::clone(&calls);
        let losses = Rc::clone(&calls);
        let mut continuations = Continuations::new(
            move |_| wins.borrow_mut().push(Outcome::Win),
            move |_| losses.borrow_mut().push(Outcome::Loss),
        );

        assert!(continuations.settle(Outcome::Loss, None));
        assert!(!continuations.settle(Outcome::Win, None));
        assert!(!continuations.settle(Outcome::Loss, None));
        assert!(continuations.is_spent());
        assert_eq!(*calls.borrow(), vec![Outcome::Loss]);
    }

    #[test]
    fn settling_cancels_the_attempts_timers()
    {
        let mut harness = Harness::new(GameId::Aim, 3);
        assert_eq!(harness.live_timers(), 1);

        harness.advance_ms(7_000);

        assert!(harness.attempt.is_settled());
        assert_eq!(harness.live_timers(), 0);
        assert_eq!(harness.report_count(), 1);
    }

    #[test]
    fn input_after_settling_is_ignored()
    {
        let mut harness = Harness::new(GameId::Timing, 8);
        harness.input(Input::Stop);
        harness.input(Input::Stop);
        harness.input(Input::Click);

        assert_eq!(harness.report_count(), 1);
    }

    #[test]
    fn dropping_an_attempt_releases_its_scope()
    {
        let harness = Harness::new(GameId::Memory, 5);
        let queue = Rc::clone(&harness.queue);
        assert!(queue.borrow().len() > 0);

        drop(harness);

        assert_eq!(queue.borrow().len(), 0);
    }
}
