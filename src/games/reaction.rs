use super::{AttemptCx, GameView, Input, MiniGame};
use crate::timers::TimerId;
use rand::Rng;
use rand::rngs::StdRng;
use std::time::Duration;

pub const TARGET: Duration = Duration::from_millis(280);
const BASE_DELAY_MS: f64 = 1200.0;
const DELAY_JITTER_MS: f64 = 1800.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase
{
    Idle,
    Waiting,
    Ready,
    TooSoon,
}

#[derive(Clone, Debug)]
pub struct View
{
    pub phase: Phase,
    pub delay: Duration,
    pub latest: Option<Duration>,
}

pub struct Reaction
{
    phase: Phase,
    delay: Duration,
    go: Option<TimerId>,
    shown_at: Duration,
    latest: Option<Duration>,
}

impl Reaction
{
    pub fn new(rng: &mut StdRng) -> Self
    {
        let millis = BASE_DELAY_MS + rng.gen_range(0.0..DELAY_JITTER_MS);
        Self {
            phase: Phase::Idle,
            delay: Duration::from_secs_f64(millis / 1000.0),
            go: None,
            shown_at: Duration::ZERO,
            latest: None,
        }
    }
}

impl MiniGame for Reaction
{
    fn start(&mut self, cx: &mut AttemptCx)
    {
        self.phase = Phase::Waiting;
        self.go = Some(cx.after(self.delay));
    }

    fn on_timer(&mut self, timer: TimerId, cx: &mut AttemptCx)
    {
        if self.go != Some(timer) || self.phase != Phase::Waiting {
            return;
        }
        self.go = None;
        self.shown_at = cx.now();
        self.phase = Phase::Ready;
    }

    fn on_input(&mut self, input: &Input, cx: &mut AttemptCx)
    {
        if *input != Input::Click {
            return;
        }
        match self.phase {
            Phase::Waiting => {
                self.phase = Phase::TooSoon;
                if let Some(go) = self.go.take() {
                    cx.cancel(go);
                }
                cx.lose("Too soon! Wait for green.");
            }
            Phase::Ready => {
                let elapsed = cx.now().saturating_sub(self.shown_at);
                self.latest = Some(elapsed);
                let millis = (elapsed.as_secs_f64() * 1000.0).round();
                let details = format!("Reaction time: {millis}ms.");
                if elapsed <= TARGET {
                    cx.win(details);
                } else {
                    cx.lose(details);
                }
            }
            Phase::Idle | Phase::TooSoon => {}
        }
    }

    fn view(&self) -> GameView
    {
        GameView::Reaction(View {
            phase: self.phase,
            delay: self.delay,
            latest: self.latest,
        })
    }
}
