use super::{AttemptCx, GameView, Input, MiniGame};
use crate::timers::TimerId;
use rand::Rng;
use rand::rngs::StdRng;
use std::time::Duration;

pub const SEQUENCE_LEN: usize = 5;
pub const TILE_COUNT: usize = 9;
const LEAD_IN: Duration = Duration::from_millis(400);
const STAGGER: Duration = Duration::from_millis(520);
const LIT_FOR: Duration = Duration::from_millis(360);

#[derive(Clone, Debug)]
pub struct View
{
    pub active: Option<usize>,
    pub ready: bool,
    pub step: usize,
    pub length: usize,
}

pub struct Memory
{
    sequence: Vec<usize>,
    step: usize,
    active: Option<usize>,
    ready: bool,
    reveals: Vec<TimerId>,
    // (timer, index into `sequence`)
    hides: Vec<(TimerId, usize)>,
}

impl Memory
{
    pub fn new(rng: &mut StdRng) -> Self
    {
        let sequence = (0..SEQUENCE_LEN)
            .map(|_| rng.gen_range(0..TILE_COUNT))
            .collect();
        Self::with_sequence(sequence)
    }

    pub fn with_sequence(sequence: Vec<usize>) -> Self
    {
        Self {
            sequence,
            step: 0,
            active: None,
            ready: false,
            reveals: Vec::new(),
            hides: Vec::new(),
        }
    }

    fn is_last(&self, index: usize) -> bool
    {
        index + 1 == self.sequence.len()
    }
}

impl MiniGame for Memory
{
    fn start(&mut self, cx: &mut AttemptCx)
    {
        let mut delay = LEAD_IN;
        for _ in &self.sequence {
            self.reveals.push(cx.after(delay));
            delay += STAGGER;
        }
    }

    fn on_timer(&mut self, timer: TimerId, cx: &mut AttemptCx)
    {
        if let Some(index) = self.reveals.iter().position(|id| *id == timer) {
            self.active = Some(self.sequence[index]);
            self.hides.push((cx.after(LIT_FOR), index));
            return;
        }
        if let Some(slot) = self.hides.iter().position(|(id, _)| *id == timer) {
            let (_, index) = self.hides.remove(slot);
            self.active = None;
            if self.is_last(index) {
                self.ready = true;
            }
        }
    }

    fn on_input(&mut self, input: &Input, cx: &mut AttemptCx)
    {
        let Input::Tile(tile) = *input else {
            return;
        };
        if !self.ready {
            return;
        }
        if tile != self.sequence[self.step] {
            cx.lose("Pattern break. Try again!");
            return;
        }
        if self.is_last(self.step) {
            self.step = self.sequence.len();
            cx.win("Memory streak complete.");
        } else {
            self.step += 1;
        }
    }

    fn view(&self) -> GameView
    {
        GameView::Memory(View {
            active: self.active,
            ready: self.ready,
            step: self.step,
            length: self.sequence.len(),
        })
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::games::harness::Harness;
    use crate::games::{GameId, Outcome};

    const SEQUENCE: [usize; 5] = [4, 0, 8, 3, 3];

    fn harness() -> Harness
    {
        let mut harness = Harness::new(GameId::Memory, 0);
        harness.replace(Box::new(Memory::with_sequence(SEQUENCE.to_vec())));
        harness
    }

    fn view(harness: &Harness) -> View
    {
        match harness.view() {
            GameView::Memory(view) => view,
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn generated_tiles_are_on_the_board()
    {
        for seed in 0..20 {
            let mut rng = <StdRng as rand::SeedableRng>::seed_from_u64(seed);
            let memory = Memory::new(&mut rng);
            assert_eq!(memory.sequence.len(), SEQUENCE_LEN);
            assert!(memory.sequence.iter().all(|tile| *tile < TILE_COUNT));
        }
    }

    #[test]
    fn playback_lights_tiles_in_order()
    {
        let mut harness = harness();
        let mut now = 0;
        for (index, tile) in SEQUENCE.iter().enumerate() {
            let reveal = 400 + 520 * index as u64;
            harness.advance_ms(reveal + 100 - now);
            assert_eq!(view(&harness).active, Some(*tile), "tile {index} lit");
            harness.advance_ms(300);
            assert_eq!(view(&harness).active, None, "tile {index} hidden");
            now = reveal + 400;
        }
        assert!(view(&harness).ready);
    }

    #[test]
    fn input_is_locked_until_playback_ends()
    {
        let mut harness = harness();
        harness.advance_ms(2_839);
        assert!(!view(&harness).ready);
        harness.input(Input::Tile(7));
        assert_eq!(harness.report_count(), 0);

        harness.advance_ms(1);
        assert!(view(&harness).ready);
        assert_eq!(view(&harness).active, None);
    }

    #[test]
    fn full_sequence_wins()
    {
        let mut harness = harness();
        harness.advance_ms(3_000);
        for tile in SEQUENCE {
            harness.input(Input::Tile(tile));
        }

        assert_eq!(harness.outcome(), Some(Outcome::Win));
        assert_eq!(view(&harness).step, SEQUENCE_LEN);
    }

    #[test]
    fn wrong_fourth_pick_loses_at_step_four()
    {
        let mut harness = harness();
        harness.advance_ms(3_000);
        for tile in &SEQUENCE[..3] {
            harness.input(Input::Tile(*tile));
        }
        harness.input(Input::Tile((SEQUENCE[3] + 1) % TILE_COUNT));
        harness.input(Input::Tile(SEQUENCE[4]));

        assert_eq!(harness.outcome(), Some(Outcome::Loss));
        assert_eq!(harness.report_count(), 1);
        assert_eq!(view(&harness).step, 3);
    }
}
