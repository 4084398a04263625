//! Run orchestration: order, retries, scoring, and screen transitions.

use crate::clock::Clock;
use crate::games::{Attempt, Continuations, GameDefinition, GameId, GameView, Input, Outcome};
use crate::timers::TimerQueue;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

pub const RUN_LENGTH: usize = 5;
pub const WIN_THRESHOLD: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError
{
    #[error("a lineup needs exactly {RUN_LENGTH} games, got {0}")]
    LineupSize(usize),
    #[error("'{0}' appears more than once in the lineup")]
    DuplicateGame(GameId),
    #[error("unknown game '{0}'")]
    UnknownGame(String),
    #[error("no result is waiting to be locked in")]
    NothingPending,
    #[error("no round is in progress")]
    NoActiveRound,
}

/// The five distinct games a run is drawn from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lineup([GameId; RUN_LENGTH]);

impl Lineup
{
    pub fn new(games: &[GameId]) -> Result<Self, SessionError>
    {
        let games: [GameId; RUN_LENGTH] = games
            .try_into()
            .map_err(|_| SessionError::LineupSize(games.len()))?;
        for (index, game) in games.iter().enumerate() {
            if games[..index].contains(game) {
                return Err(SessionError::DuplicateGame(*game));
            }
        }
        Ok(Self(games))
    }

    /// Parses a comma separated list such as `reaction,typing,memory,aim,maze`.
    pub fn parse(list: &str) -> Result<Self, SessionError>
    {
        let games = list
            .split(',')
            .map(|name| {
                GameId::parse(name).ok_or_else(|| SessionError::UnknownGame(name.trim().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(&games)
    }

    pub fn games(&self) -> &[GameId]
    {
        &self.0
    }
}

impl Default for Lineup
{
    fn default() -> Self
    {
        Self([
            GameId::Reaction,
            GameId::Typing,
            GameId::Memory,
            GameId::Aim,
            GameId::Timing,
        ])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen
{
    Home,
    Game,
    Result,
    Final,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingResult
{
    pub game: GameId,
    pub outcome: Outcome,
    pub details: Option<String>,
}

/// Committed outcomes for the current run; each game is set at most once.
#[derive(Clone, Debug, Default)]
pub struct ResultMap
{
    slots: HashMap<GameId, Outcome>,
}

impl ResultMap
{
    pub fn get(&self, game: GameId) -> Option<Outcome>
    {
        self.slots.get(&game).copied()
    }

    pub fn wins(&self) -> usize
    {
        self.count(Outcome::Win)
    }

    pub fn losses(&self) -> usize
    {
        self.count(Outcome::Loss)
    }

    pub fn committed(&self) -> usize
    {
        self.slots.len()
    }

    fn count(&self, outcome: Outcome) -> usize
    {
        self.slots.values().filter(|value| **value == outcome).count()
    }

    fn commit(&mut self, game: GameId, outcome: Outcome) -> bool
    {
        if self.slots.contains_key(&game) {
            return false;
        }
        self.slots.insert(game, outcome);
        true
    }

    fn clear(&mut self)
    {
        self.slots.clear();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict
{
    Unlocked,
    Locked,
}

impl Verdict
{
    pub fn from_wins(wins: usize) -> Self
    {
        if wins >= WIN_THRESHOLD {
            Verdict::Unlocked
        } else {
            Verdict::Locked
        }
    }

    pub fn title(self) -> &'static str
    {
        match self {
            Verdict::Unlocked => "Valentine.exe Unlocked",
            Verdict::Locked => "Need More Wins",
        }
    }

    pub fn message(self) -> &'static str
    {
        match self {
            Verdict::Unlocked => {
                "Roses are red, pixels are sweet. You crushed the trials. Be my player two?"
            }
            Verdict::Locked => "You are close! Sharpen those skills and rerun the trials.",
        }
    }
}

struct Report
{
    serial: u64,
    game: GameId,
    outcome: Outcome,
    details: Option<String>,
}

type Mailbox = Rc<RefCell<Option<Report>>>;

pub struct Session
{
    clock: Rc<dyn Clock>,
    timers: Rc<RefCell<TimerQueue>>,
    rng: StdRng,
    lineup: Lineup,
    screen: Screen,
    order: Vec<GameId>,
    index: usize,
    results: ResultMap,
    pending: Option<PendingResult>,
    attempt: Option<Attempt>,
    mailbox: Mailbox,
    serial: u64,
}

impl Session
{
    pub fn new(clock: Rc<dyn Clock>, rng: StdRng, lineup: Lineup) -> Self
    {
        Self {
            clock,
            timers: TimerQueue::shared(),
            rng,
            lineup,
            screen: Screen::Home,
            order: Vec::new(),
            index: 0,
            results: ResultMap::default(),
            pending: None,
            attempt: None,
            mailbox: Rc::default(),
            serial: 0,
        }
    }

    /// Resets everything and begins a freshly shuffled run.
    pub fn start_run(&mut self)
    {
        self.abandon_attempt();
        let mut order = self.lineup.games().to_vec();
        order.shuffle(&mut self.rng);
        self.order = order;
        self.index = 0;
        self.results.clear();
        self.pending = None;
        self.screen = Screen::Game;
        tracing::info!(order = ?self.order, "run started");
        self.begin_attempt();
    }

    /// Throws away the pending result (or the attempt in progress) and plays
    /// the current game again from scratch.
    pub fn retry_current(&mut self) -> Result<(), SessionError>
    {
        if !matches!(self.screen, Screen::Game | Screen::Result) {
            return Err(SessionError::NoActiveRound);
        }
        if let Some(pending) = self.pending.take() {
            tracing::debug!(game = %pending.game, outcome = ?pending.outcome, "pending result discarded");
        }
        self.abandon_attempt();
        self.screen = Screen::Game;
        self.begin_attempt();
        Ok(())
    }

    /// Commits the pending result and moves to the next game, or to the final
    /// screen after the last one.
    pub fn lock_in_pending(&mut self) -> Result<(), SessionError>
    {
        let pending = self.pending.take().ok_or(SessionError::NothingPending)?;
        if !self.results.commit(pending.game, pending.outcome) {
            tracing::warn!(game = %pending.game, "result already committed for this run");
        }
        tracing::info!(
            game = %pending.game,
            outcome = ?pending.outcome,
            wins = self.results.wins(),
            losses = self.results.losses(),
            "result locked in"
        );

        if self.index + 1 >= self.order.len() {
            self.screen = Screen::Final;
            tracing::info!(
                wins = self.results.wins(),
                verdict = ?Verdict::from_wins(self.results.wins()),
                "run finished"
            );
        } else {
            self.index += 1;
            self.screen = Screen::Game;
            self.begin_attempt();
        }
        Ok(())
    }

    /// Abandons the run and returns to the home screen.
    pub fn reset_to_home(&mut self)
    {
        self.abandon_attempt();
        self.order.clear();
        self.index = 0;
        self.results.clear();
        self.pending = None;
        self.screen = Screen::Home;
    }

    /// Delivers due timers and one frame to the running game.
    pub fn tick(&mut self)
    {
        if let Some(attempt) = self.attempt.as_mut() {
            attempt.pump();
        }
        self.collect_report();
    }

    pub fn input(&mut self, input: Input)
    {
        if self.screen != Screen::Game {
            return;
        }
        if let Some(attempt) = self.attempt.as_mut() {
            attempt.input(&input);
        }
        self.collect_report();
    }

    pub fn screen(&self) -> Screen
    {
        self.screen
    }

    pub fn order(&self) -> &[GameId]
    {
        &self.order
    }

    pub fn lineup(&self) -> &Lineup
    {
        &self.lineup
    }

    /// One-based round number, 0 when no run is active.
    pub fn round(&self) -> usize
    {
        if self.order.is_empty() {
            0
        } else {
            self.index + 1
        }
    }

    pub fn current_game(&self) -> Option<GameId>
    {
        if self.screen == Screen::Home {
            return None;
        }
        self.order.get(self.index).copied()
    }

    pub fn current_definition(&self) -> Option<&'static GameDefinition>
    {
        self.current_game().map(GameId::definition)
    }

    pub fn results(&self) -> &ResultMap
    {
        &self.results
    }

    pub fn pending(&self) -> Option<&PendingResult>
    {
        self.pending.as_ref()
    }

    pub fn game_view(&self) -> Option<GameView>
    {
        self.attempt.as_ref().map(Attempt::view)
    }

    pub fn verdict(&self) -> Option<Verdict>
    {
        (self.screen == Screen::Final).then(|| Verdict::from_wins(self.results.wins()))
    }

    fn begin_attempt(&mut self)
    {
        let Some(game) = self.order.get(self.index).copied() else {
            return;
        };
        self.serial += 1;
        let serial = self.serial;
        let on_win = Rc::clone(&self.mailbox);
        let on_lose = Rc::clone(&self.mailbox);
        let continuations = Continuations::new(
            move |details| {
                *on_win.borrow_mut() = Some(Report {
                    serial,
                    game,
                    outcome: Outcome::Win,
                    details,
                });
            },
            move |details| {
                *on_lose.borrow_mut() = Some(Report {
                    serial,
                    game,
                    outcome: Outcome::Loss,
                    details,
                });
            },
        );
        let rng = StdRng::seed_from_u64(self.rng.next_u64());
        self.attempt = Some(Attempt::begin(
            game,
            Rc::clone(&self.clock),
            &self.timers,
            rng,
            continuations,
        ));
    }

    fn abandon_attempt(&mut self)
    {
        // Dropping the attempt cancels its timers before anything new starts.
        self.attempt = None;
        self.mailbox.borrow_mut().take();
    }

    fn collect_report(&mut self)
    {
        let Some(report) = self.mailbox.borrow_mut().take() else {
            return;
        };
        if report.serial != self.serial || self.screen != Screen::Game {
            tracing::warn!(game = %report.game, "stale result ignored");
            return;
        }
        tracing::debug!(game = %report.game, outcome = ?report.outcome, "attempt finished");
        self.attempt = None;
        self.pending = Some(PendingResult {
            game: report.game,
            outcome: report.outcome,
            details: report.details,
        });
        self.screen = Screen::Result;
    }
}
