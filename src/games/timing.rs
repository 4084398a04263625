use super::{AttemptCx, GameView, Input, MiniGame, Outcome};
use crate::timers::TimerId;
use rand::Rng;
use rand::rngs::StdRng;
use std::time::Duration;

/// Milliseconds for one end-to-end sweep.
const SWEEP_MS: f64 = 1200.0;
pub const WINDOW: f64 = 0.16;
// Keeps the window edge inclusive despite float error in `position - target`.
const EDGE_TOLERANCE: f64 = 1e-9;
const TARGET_MIN: f64 = 0.25;
const TARGET_MAX: f64 = 0.75;

#[derive(Clone, Debug)]
pub struct View
{
    pub position: f64,
    pub target: f64,
    pub stopped: bool,
}

pub struct TimingSlider
{
    position: f64,
    direction: f64,
    target: f64,
    last_frame: Duration,
    frames: Option<TimerId>,
    stopped: bool,
}

impl TimingSlider
{
    pub fn new(rng: &mut StdRng) -> Self
    {
        Self::with_target(rng.gen_range(TARGET_MIN..=TARGET_MAX))
    }

    pub fn with_target(target: f64) -> Self
    {
        Self {
            position: 0.0,
            direction: 1.0,
            target,
            last_frame: Duration::ZERO,
            frames: None,
            stopped: false,
        }
    }

    fn advance(&mut self, delta: Duration)
    {
        let mut next = self.position + (delta.as_secs_f64() * 1000.0 / SWEEP_MS) * self.direction;
        if next >= 1.0 {
            next = 1.0;
            self.direction = -1.0;
        }
        if next <= 0.0 {
            next = 0.0;
            self.direction = 1.0;
        }
        self.position = next;
    }
}

pub fn judge(position: f64, target: f64) -> Outcome
{
    if (position - target).abs() <= WINDOW + EDGE_TOLERANCE {
        Outcome::Win
    } else {
        Outcome::Loss
    }
}

impl MiniGame for TimingSlider
{
    fn start(&mut self, cx: &mut AttemptCx)
    {
        self.last_frame = cx.now();
        self.frames = Some(cx.every_frame());
    }

    fn on_frame(&mut self, _timer: TimerId, cx: &mut AttemptCx)
    {
        if self.stopped {
            return;
        }
        let now = cx.now();
        let delta = now.saturating_sub(self.last_frame);
        self.last_frame = now;
        self.advance(delta);
    }

    fn on_input(&mut self, input: &Input, cx: &mut AttemptCx)
    {
        if *input != Input::Stop || self.stopped {
            return;
        }
        self.stopped = true;
        if let Some(frames) = self.frames.take() {
            cx.cancel(frames);
        }
        match judge(self.position, self.target) {
            Outcome::Win => cx.win("Perfect timing!"),
            Outcome::Loss => cx.lose("Missed the sweet spot."),
        }
    }

    fn view(&self) -> GameView
    {
        GameView::Timing(View {
            position: self.position,
            target: self.target,
            stopped: self.stopped,
        })
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::games::GameId;
    use crate::games::harness::Harness;

    fn harness_with(target: f64) -> Harness
    {
        let mut harness = Harness::new(GameId::Timing, 0);
        harness.replace(Box::new(TimingSlider::with_target(target)));
        harness
    }

    fn view(harness: &Harness) -> View
    {
        match harness.view() {
            GameView::Timing(view) => view,
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn window_edge_is_inclusive()
    {
        assert_eq!(judge(0.50, 0.50), Outcome::Win);
        assert_eq!(judge(0.50, 0.70), Outcome::Loss);
        assert_eq!(judge(0.50, 0.66), Outcome::Win);
        assert_eq!(judge(0.50, 0.34), Outcome::Win);
        assert_eq!(judge(0.50, 0.661), Outcome::Loss);
    }

    #[test]
    fn slider_bounces_off_both_ends()
    {
        let mut harness = harness_with(0.5);
        harness.advance_ms(600);
        assert!((view(&harness).position - 0.5).abs() < 1e-9);

        harness.advance_ms(900);
        assert_eq!(view(&harness).position, 1.0);

        harness.advance_ms(300);
        assert!((view(&harness).position - 0.75).abs() < 1e-9);

        harness.advance_ms(2_000);
        assert_eq!(view(&harness).position, 0.0);
        harness.advance_ms(120);
        assert!((view(&harness).position - 0.1).abs() < 1e-9);
    }

    #[test]
    fn stopping_on_target_wins()
    {
        let mut harness = harness_with(0.5);
        harness.run_frames(36, 16);
        harness.advance_ms(24);
        harness.input(Input::Stop);

        assert_eq!(harness.outcome(), Some(Outcome::Win));
        assert_eq!(harness.details().as_deref(), Some("Perfect timing!"));
    }

    #[test]
    fn stopping_far_from_target_loses()
    {
        let mut harness = harness_with(0.7);
        harness.advance_ms(600);
        harness.input(Input::Stop);

        assert_eq!(harness.outcome(), Some(Outcome::Loss));
        assert_eq!(harness.details().as_deref(), Some("Missed the sweet spot."));
    }

    #[test]
    fn stop_freezes_the_slider()
    {
        let mut harness = harness_with(0.2);
        harness.advance_ms(300);
        harness.input(Input::Stop);
        let frozen = view(&harness).position;

        harness.run_frames(10, 16);
        harness.input(Input::Stop);

        assert!(view(&harness).stopped);
        assert_eq!(view(&harness).position, frozen);
        assert_eq!(harness.report_count(), 1);
        assert_eq!(harness.live_timers(), 0);
    }

    #[test]
    fn target_stays_in_the_middle_band()
    {
        for seed in 0..50 {
            let harness = Harness::new(GameId::Timing, seed);
            let target = view(&harness).target;
            assert!((TARGET_MIN..=TARGET_MAX).contains(&target));
        }
    }
}
