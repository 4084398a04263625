use super::{AttemptCx, GameView, Input, MiniGame};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::time::Duration;

pub const TARGET_WPM: f64 = 46.0;
const CHARS_PER_WORD: f64 = 5.0;
// Floor for the measured time, so a pasted phrase cannot divide by ~0.
const MIN_SECONDS: f64 = 0.5;

pub const PHRASES: [&str; 5] = [
    "pixel hearts beat fast",
    "love loads at 60 fps",
    "sweet victory unlocked",
    "press start to sparkle",
    "tiny quests big smiles",
];

#[derive(Clone, Debug)]
pub struct View
{
    pub phrase: &'static str,
    pub input: String,
    pub progress: u8,
}

pub struct Typing
{
    phrase: &'static str,
    input: String,
    started: Option<Duration>,
}

impl Typing
{
    pub fn new(rng: &mut StdRng) -> Self
    {
        let phrase = PHRASES.choose(rng).copied().unwrap_or(PHRASES[0]);
        Self::with_phrase(phrase)
    }

    pub fn with_phrase(phrase: &'static str) -> Self
    {
        Self {
            phrase,
            input: String::new(),
            started: None,
        }
    }
}

/// Words per minute for `chars` characters typed in `elapsed`, one decimal.
pub fn words_per_minute(chars: usize, elapsed: Duration) -> f64
{
    let minutes = elapsed.as_secs_f64().max(MIN_SECONDS) / 60.0;
    let wpm = (chars as f64 / CHARS_PER_WORD) / minutes;
    (wpm * 10.0).round() / 10.0
}

impl MiniGame for Typing
{
    fn start(&mut self, _cx: &mut AttemptCx) {}

    fn on_input(&mut self, input: &Input, cx: &mut AttemptCx)
    {
        let Input::Text(value) = input else {
            return;
        };
        let now = cx.now();
        let started = *self.started.get_or_insert(now);
        self.input.clone_from(value);

        if self.input != self.phrase {
            return;
        }
        let wpm = words_per_minute(self.phrase.chars().count(), now.saturating_sub(started));
        let details = format!("Speed: {wpm:.1} WPM.");
        if wpm >= TARGET_WPM {
            cx.win(details);
        } else {
            cx.lose(details);
        }
    }

    fn view(&self) -> GameView
    {
        let total = self.phrase.chars().count().max(1);
        let typed = self.input.chars().count();
        let progress = ((typed * 100) / total).min(100) as u8;
        GameView::Typing(View {
            phrase: self.phrase,
            input: self.input.clone(),
            progress,
        })
    }
}
