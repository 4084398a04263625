use super::{AttemptCx, GameView, Input, MiniGame};
use crate::timers::TimerId;
use rand::Rng;
use rand::rngs::StdRng;
use std::ops::Range;
use std::time::Duration;

pub const TIME_LIMIT: u32 = 7;
pub const TARGET_HITS: u32 = 6;
const TICK: Duration = Duration::from_secs(1);
// Target centre, in percent of the field. Keeps it off the edges.
const X_RANGE: Range<f64> = 10.0..90.0;
const Y_RANGE: Range<f64> = 10.0..70.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Target
{
    pub x: f64,
    pub y: f64,
}

impl Target
{
    fn random(rng: &mut StdRng) -> Self
    {
        Self {
            x: rng.gen_range(X_RANGE),
            y: rng.gen_range(Y_RANGE),
        }
    }
}

#[derive(Clone, Debug)]
pub struct View
{
    pub hits: u32,
    pub time_left: u32,
    pub target: Target,
}

pub struct Aim
{
    hits: u32,
    time_left: u32,
    target: Target,
    countdown: Option<TimerId>,
}

impl Aim
{
    pub fn new(rng: &mut StdRng) -> Self
    {
        Self {
            hits: 0,
            time_left: TIME_LIMIT,
            target: Target::random(rng),
            countdown: None,
        }
    }
}

impl MiniGame for Aim
{
    fn start(&mut self, cx: &mut AttemptCx)
    {
        self.countdown = Some(cx.every(TICK));
    }

    fn on_timer(&mut self, timer: TimerId, cx: &mut AttemptCx)
    {
        if self.countdown != Some(timer) {
            return;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left > 0 {
            return;
        }

        self.countdown = None;
        cx.cancel(timer);
        let details = format!("Hits: {}.", self.hits);
        if self.hits >= TARGET_HITS {
            cx.win(details);
        } else {
            cx.lose(details);
        }
    }

    fn on_input(&mut self, input: &Input, cx: &mut AttemptCx)
    {
        if *input != Input::Hit || self.time_left == 0 {
            return;
        }
        self.hits += 1;
        self.target = Target::random(cx.rng());
    }

    fn view(&self) -> GameView
    {
        GameView::Aim(View {
            hits: self.hits,
            time_left: self.time_left,
            target: self.target,
        })
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::games::harness::Harness;
    use crate::games::{GameId, Outcome};

    fn view(harness: &Harness) -> View
    {
        match harness.view() {
            GameView::Aim(view) => view,
            other => panic!("unexpected view {other:?}"),
        }
    }

    fn play(hits: u32) -> Harness
    {
        let mut harness = Harness::new(GameId::Aim, 11);
        harness.advance_ms(2_000);
        for _ in 0..hits {
            harness.input(Input::Hit);
        }
        harness.advance_ms(4_999);
        assert_eq!(harness.report_count(), 0);
        assert_eq!(view(&harness).time_left, 1);
        harness.advance_ms(1);
        harness
    }

    #[test]
    fn six_hits_win()
    {
        let harness = play(6);
        assert_eq!(harness.outcome(), Some(Outcome::Win));
        assert_eq!(harness.details().as_deref(), Some("Hits: 6."));
    }

    #[test]
    fn five_hits_lose()
    {
        let harness = play(5);
        assert_eq!(harness.outcome(), Some(Outcome::Loss));
        assert_eq!(harness.details().as_deref(), Some("Hits: 5."));
    }

    #[test]
    fn countdown_resolves_once()
    {
        let mut harness = play(0);
        harness.advance_ms(10_000);
        harness.input(Input::Hit);

        assert_eq!(harness.report_count(), 1);
        assert_eq!(view(&harness).time_left, 0);
        assert_eq!(view(&harness).hits, 0);
    }

    #[test]
    fn hits_move_the_target_inside_the_field()
    {
        let mut harness = Harness::new(GameId::Aim, 21);
        let mut previous = view(&harness).target;
        for _ in 0..25 {
            harness.input(Input::Hit);
            let target = view(&harness).target;
            assert!(X_RANGE.contains(&target.x));
            assert!(Y_RANGE.contains(&target.y));
            assert_ne!(target, previous);
            previous = target;
        }
        assert_eq!(view(&harness).hits, 25);
    }
}
