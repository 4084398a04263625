use super::{AttemptCx, Direction, GameView, Input, MiniGame};
use crate::timers::TimerId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::time::Duration;

pub const MAZE_SIZE: usize = 13;
pub const TIME_LIMIT: u32 = 30;
pub const TARGET_TIME: u32 = 15;
const TICK: Duration = Duration::from_secs(1);

const CARVE_DIRS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell
{
    Wall,
    Path,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Point
{
    pub row: usize,
    pub col: usize,
}

impl Point
{
    pub const fn new(row: usize, col: usize) -> Self
    {
        Self { row, col }
    }

    fn step(self, direction: Direction) -> Option<Self>
    {
        let (row, col) = match direction {
            Direction::Up => (self.row.checked_sub(1)?, self.col),
            Direction::Down => (self.row + 1, self.col),
            Direction::Left => (self.row, self.col.checked_sub(1)?),
            Direction::Right => (self.row, self.col + 1),
        };
        Some(Self::new(row, col))
    }
}

/// Square maze grid, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid
{
    size: usize,
    cells: Vec<Cell>,
}

impl Grid
{
    /// Carves a maze by randomized depth-first search from (1,1).
    ///
    /// The carve steps two cells at a time, so even sizes are rounded up to
    /// the next odd one and sizes below 3 are raised to 3.
    pub fn generate(size: usize, rng: &mut StdRng) -> Self
    {
        let size = size.max(3) | 1;
        let mut grid = Self {
            size,
            cells: vec![Cell::Wall; size * size],
        };
        grid.carve(1, 1, rng);
        grid.open(Point::new(1, 1));
        grid.open(Point::new(size - 2, size - 2));
        grid
    }

    fn carve(&mut self, row: usize, col: usize, rng: &mut StdRng)
    {
        self.open(Point::new(row, col));
        let mut dirs = CARVE_DIRS;
        dirs.shuffle(rng);
        for (d_row, d_col) in dirs {
            let next_row = row as isize + d_row * 2;
            let next_col = col as isize + d_col * 2;
            let limit = self.size as isize - 1;
            if next_row <= 0 || next_col <= 0 || next_row >= limit || next_col >= limit {
                continue;
            }
            let (next_row, next_col) = (next_row as usize, next_col as usize);
            if self.cell(Point::new(next_row, next_col)) == Some(Cell::Wall) {
                let link_row = (row as isize + d_row) as usize;
                let link_col = (col as isize + d_col) as usize;
                self.open(Point::new(link_row, link_col));
                self.carve(next_row, next_col, rng);
            }
        }
    }

    fn open(&mut self, point: Point)
    {
        let index = point.row * self.size + point.col;
        self.cells[index] = Cell::Path;
    }

    pub fn size(&self) -> usize
    {
        self.size
    }

    pub fn cell(&self, point: Point) -> Option<Cell>
    {
        if point.row >= self.size || point.col >= self.size {
            return None;
        }
        Some(self.cells[point.row * self.size + point.col])
    }

    pub fn is_open(&self, point: Point) -> bool
    {
        self.cell(point) == Some(Cell::Path)
    }

    pub fn entry(&self) -> Point
    {
        Point::new(1, 1)
    }

    pub fn exit(&self) -> Point
    {
        Point::new(self.size - 2, self.size - 2)
    }
}

#[derive(Clone, Debug)]
pub struct View
{
    pub grid: Grid,
    pub player: Point,
    pub exit: Point,
    pub moves: u32,
    pub time_left: u32,
}

pub struct Maze
{
    grid: Grid,
    player: Point,
    moves: u32,
    time_left: u32,
    countdown: Option<TimerId>,
    resolved: bool,
}

impl Maze
{
    pub fn new(rng: &mut StdRng) -> Self
    {
        Self::with_grid(Grid::generate(MAZE_SIZE, rng))
    }

    pub fn with_grid(grid: Grid) -> Self
    {
        Self {
            player: grid.entry(),
            grid,
            moves: 0,
            time_left: TIME_LIMIT,
            countdown: None,
            resolved: false,
        }
    }

    /// Single resolution step; reaching the exit outranks running out of time.
    fn resolve(&mut self, cx: &mut AttemptCx)
    {
        if self.resolved {
            return;
        }
        if self.player == self.grid.exit() {
            self.finish(cx);
            let elapsed = TIME_LIMIT - self.time_left;
            let cleared = format!(
                "Maze cleared in {} moves and {}s.",
                self.moves, elapsed
            );
            if elapsed <= TARGET_TIME {
                cx.win(format!("{cleared} Beat the target time!"));
            } else {
                cx.lose(format!(
                    "{cleared} Too slow (need {TARGET_TIME}s or less)."
                ));
            }
        } else if self.time_left == 0 {
            self.finish(cx);
            cx.lose("Time ran out.");
        }
    }

    fn finish(&mut self, cx: &mut AttemptCx)
    {
        self.resolved = true;
        if let Some(countdown) = self.countdown.take() {
            cx.cancel(countdown);
        }
    }
}

impl MiniGame for Maze
{
    fn start(&mut self, cx: &mut AttemptCx)
    {
        self.countdown = Some(cx.every(TICK));
    }

    fn on_timer(&mut self, timer: TimerId, cx: &mut AttemptCx)
    {
        if self.countdown != Some(timer) || self.resolved {
            return;
        }
        self.time_left = self.time_left.saturating_sub(1);
        self.resolve(cx);
    }

    fn on_input(&mut self, input: &Input, cx: &mut AttemptCx)
    {
        let Input::Move(direction) = *input else {
            return;
        };
        if self.resolved {
            return;
        }
        let Some(next) = self.player.step(direction) else {
            return;
        };
        if !self.grid.is_open(next) {
            return;
        }
        self.player = next;
        self.moves += 1;
        self.resolve(cx);
    }

    fn view(&self) -> GameView
    {
        GameView::Maze(View {
            grid: self.grid.clone(),
            player: self.player,
            exit: self.grid.exit(),
            moves: self.moves,
            time_left: self.time_left,
        })
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::games::harness::Harness;
    use crate::games::{GameId, Outcome};
    use rand::SeedableRng;
    use std::collections::{HashSet, VecDeque};

    const DIRECTIONS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Shortest path from entry to exit as a list of moves.
    fn solve(grid: &Grid) -> Vec<Direction>
    {
        let mut came_from = std::collections::HashMap::new();
        let mut queue = VecDeque::from([grid.entry()]);
        came_from.insert(grid.entry(), None);
        while let Some(point) = queue.pop_front() {
            if point == grid.exit() {
                break;
            }
            for direction in DIRECTIONS {
                let Some(next) = point.step(direction) else {
                    continue;
                };
                if grid.is_open(next) && !came_from.contains_key(&next) {
                    came_from.insert(next, Some((point, direction)));
                    queue.push_back(next);
                }
            }
        }
        let mut path = Vec::new();
        let mut at = grid.exit();
        while let Some(Some((prev, direction))) = came_from.get(&at) {
            path.push(*direction);
            at = *prev;
        }
        path.reverse();
        path
    }

    fn reachable(grid: &Grid) -> HashSet<Point>
    {
        let mut seen = HashSet::from([grid.entry()]);
        let mut queue = VecDeque::from([grid.entry()]);
        while let Some(point) = queue.pop_front() {
            for direction in DIRECTIONS {
                if let Some(next) = point.step(direction) {
                    if grid.is_open(next) && seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        seen
    }

    fn view(harness: &Harness) -> View
    {
        match harness.view() {
            GameView::Maze(view) => view,
            other => panic!("unexpected view {other:?}"),
        }
    }

    fn fixed_maze(seed: u64) -> (Harness, Vec<Direction>)
    {
        let mut rng = StdRng::seed_from_u64(seed);
        let grid = Grid::generate(MAZE_SIZE, &mut rng);
        let path = solve(&grid);
        let mut harness = Harness::new(GameId::Maze, seed);
        harness.replace(Box::new(Maze::with_grid(grid)));
        (harness, path)
    }

    #[test]
    fn every_open_cell_is_reachable()
    {
        for size in 2..=31 {
            for seed in 0..8 {
                let mut rng = StdRng::seed_from_u64(seed);
                let grid = Grid::generate(size, &mut rng);
                assert!(grid.is_open(grid.entry()));
                assert!(grid.is_open(grid.exit()));

                let seen = reachable(&grid);
                for row in 0..size {
                    for col in 0..size {
                        let point = Point::new(row, col);
                        if grid.is_open(point) {
                            assert!(seen.contains(&point), "size {size} seed {seed}: {point:?}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn even_sizes_round_up_to_odd()
    {
        for size in [0, 1, 2, 3, 4, 12, 14] {
            let mut rng = StdRng::seed_from_u64(1);
            let grid = Grid::generate(size, &mut rng);
            assert_eq!(grid.size() % 2, 1, "size {size}");
            assert!(grid.size() >= size.max(3));
        }
    }

    #[test]
    fn border_stays_solid()
    {
        let mut rng = StdRng::seed_from_u64(99);
        let grid = Grid::generate(MAZE_SIZE, &mut rng);
        for i in 0..MAZE_SIZE {
            assert!(!grid.is_open(Point::new(0, i)));
            assert!(!grid.is_open(Point::new(i, 0)));
            assert!(!grid.is_open(Point::new(MAZE_SIZE - 1, i)));
            assert!(!grid.is_open(Point::new(i, MAZE_SIZE - 1)));
        }
    }

    #[test]
    fn walls_reject_moves()
    {
        let mut harness = Harness::new(GameId::Maze, 4);
        // (0,1) and (1,0) are border walls
        harness.input(Input::Move(Direction::Up));
        harness.input(Input::Move(Direction::Left));

        let view = view(&harness);
        assert_eq!(view.player, Point::new(1, 1));
        assert_eq!(view.moves, 0);
    }

    #[test]
    fn quick_escape_wins()
    {
        let (mut harness, path) = fixed_maze(7);
        harness.advance_ms(3_000);
        for direction in &path {
            harness.input(Input::Move(*direction));
        }

        assert_eq!(harness.outcome(), Some(Outcome::Win));
        let expected = format!(
            "Maze cleared in {} moves and 3s. Beat the target time!",
            path.len()
        );
        assert_eq!(harness.details(), Some(expected));
        assert_eq!(harness.live_timers(), 0);
    }

    #[test]
    fn slow_escape_loses()
    {
        let (mut harness, path) = fixed_maze(8);
        harness.advance_ms(16_000);
        for direction in &path {
            harness.input(Input::Move(*direction));
        }

        assert_eq!(harness.outcome(), Some(Outcome::Loss));
        assert!(harness.details().unwrap().contains("and 16s. Too slow"));
    }

    #[test]
    fn timeout_loses_once()
    {
        let mut harness = Harness::new(GameId::Maze, 12);
        harness.advance_ms(29_999);
        assert_eq!(harness.report_count(), 0);
        harness.advance_ms(1);

        assert_eq!(harness.outcome(), Some(Outcome::Loss));
        assert_eq!(harness.details().as_deref(), Some("Time ran out."));

        harness.advance_ms(5_000);
        harness.input(Input::Move(Direction::Down));
        assert_eq!(harness.report_count(), 1);
    }

    #[test]
    fn exit_on_the_last_second_still_counts()
    {
        let (mut harness, path) = fixed_maze(13);
        let (last, rest) = path.split_last().unwrap();
        harness.advance_ms(29_000);
        for direction in rest {
            harness.input(Input::Move(*direction));
        }
        // the final step lands before the last tick is delivered
        harness.clock.advance_ms(1_000);
        harness.input(Input::Move(*last));
        harness.attempt.pump();

        assert_eq!(harness.outcome(), Some(Outcome::Loss));
        assert!(harness.details().unwrap().starts_with("Maze cleared"));
        assert_eq!(harness.report_count(), 1);
    }
}
