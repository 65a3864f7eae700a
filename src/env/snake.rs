use std::collections::{HashSet, VecDeque};

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use strum::VariantArray;

use crate::{
    config::EnvConfig,
    error::{Error, Result},
    memory::Transition,
};

use super::{
    board::Board,
    encoding::{image_encoding, vector_encoding, EncodingMode, StateEncoding},
};

/// Grid coordinates `(x, y)`; `y` grows southwards and may step outside the grid when the snake hits a wall
pub type Pos = (i32, i32);

pub const APPLE_REWARD: f32 = 1.0;
pub const DEATH_REWARD: f32 = -1.0;
/// Shaping reward for a step that strictly reduces the Manhattan distance to the apple
pub const APPROACH_REWARD: f32 = 0.05;

/// Global direction of travel
#[derive(VariantArray, Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Heading {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Heading {
    /// Rotate by `quarter_turns` clockwise (negative turns counter-clockwise)
    pub fn turn(self, quarter_turns: i32) -> Self {
        let ix = (self as i32 + quarter_turns).rem_euclid(4);
        Self::VARIANTS[ix as usize]
    }

    fn step(self, pos: Pos) -> Pos {
        match self {
            Self::North => (pos.0, pos.1 - 1),
            Self::East => (pos.0 + 1, pos.1),
            Self::South => (pos.0, pos.1 + 1),
            Self::West => (pos.0 - 1, pos.1),
        }
    }
}

fn manhattan(a: Pos, b: Pos) -> i32 {
    (a.0 - b.0).abs() + (a.1 - b.1).abs()
}

/// A single snake on a bounded grid
///
/// The environment keeps both the current and the previous encoding so that [`SnakeEnv::get_transition`] can package
/// the last step as a [`Transition`].
pub struct SnakeEnv {
    board: Board,
    mode: EncodingMode,
    view_radius: usize,
    max_moves: u32,
    /// Head at the front, tail at the back
    body: VecDeque<Pos>,
    heading: Heading,
    apple: Pos,
    score: u32,
    alive: bool,
    reward: f32,
    apple_distance: i32,
    moves_without_apple: u32,
    last_action: usize,
    state: StateEncoding,
    previous_state: StateEncoding,
    rng: StdRng,
}

impl SnakeEnv {
    /// Create an environment and spawn the first episode
    pub fn new(config: &EnvConfig) -> Result<Self> {
        // the 3-cell spawn needs 3 columns plus one more cell for the apple
        if config.width < 3 || config.height < 1 || config.width * config.height <= 3 {
            return Err(Error::InvalidConfig(format!(
                "grid must be at least 3 cells wide with room for an apple, got {}x{}",
                config.width, config.height
            )));
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let empty = StateEncoding::Vector(Vec::new());
        let mut env = Self {
            board: Board::new(config.width, config.height, config.view_radius + 2),
            mode: config.mode,
            view_radius: config.view_radius,
            max_moves: config.max_moves_without_apple,
            body: VecDeque::new(),
            heading: Heading::East,
            apple: (0, 0),
            score: 0,
            alive: true,
            reward: 0.0,
            apple_distance: 0,
            moves_without_apple: 0,
            last_action: 1,
            state: empty.clone(),
            previous_state: empty,
            rng,
        };
        env.reset()?;
        Ok(env)
    }

    /// Start a new episode: a 3-cell snake heading east at a random position and an apple on a free cell
    pub fn reset(&mut self) -> Result<()> {
        let x = self.rng.gen_range(2..self.board.width() as i32);
        let y = self.rng.gen_range(0..self.board.height() as i32);
        self.body = VecDeque::from([(x, y), (x - 1, y), (x - 2, y)]);
        self.heading = Heading::East;
        self.apple = self.free_cell(None)?;
        self.score = 0;
        self.alive = true;
        self.reward = 0.0;
        self.moves_without_apple = 0;
        self.last_action = 1;
        self.apple_distance = manhattan(self.head(), self.apple);
        self.refresh();
        self.previous_state = self.state.clone();
        Ok(())
    }

    pub fn mode(&self) -> EncodingMode {
        self.mode
    }

    pub fn num_actions(&self) -> usize {
        self.mode.num_actions()
    }

    /// Length of every encoding this environment produces
    pub fn input_size(&self) -> usize {
        self.mode.input_size(self.view_radius)
    }

    pub fn head(&self) -> Pos {
        *self.body.front().expect("body is not empty")
    }

    pub fn body(&self) -> &VecDeque<Pos> {
        &self.body
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn apple(&self) -> Pos {
        self.apple
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn reward(&self) -> f32 {
        self.reward
    }

    pub fn moves_without_apple(&self) -> u32 {
        self.moves_without_apple
    }

    /// Steps allowed without eating before the episode is cut short
    pub fn max_moves(&self) -> u32 {
        self.max_moves
    }

    /// The current encoding
    pub fn state(&self) -> &StateEncoding {
        &self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Advance the snake one cell
    ///
    /// In vector mode `action` is a relative turn (0 = left, 1 = straight, 2 = right); in image mode it is an absolute
    /// heading (0 = N, 1 = E, 2 = S, 3 = W). Does nothing once the snake is dead.
    pub fn apply_action(&mut self, action: usize) -> Result<()> {
        let num_actions = self.num_actions();
        if action >= num_actions {
            return Err(Error::InvalidAction {
                action,
                num_actions,
            });
        }
        if !self.alive {
            return Ok(());
        }

        let heading = match self.mode {
            EncodingMode::Vector => self.heading.turn(action as i32 - 1),
            EncodingMode::Image => Heading::VARIANTS[action],
        };
        let head = heading.step(self.head());
        // relocate first so a full board fails before anything changes
        let relocated = if head == self.apple {
            Some(self.free_cell(Some(head))?)
        } else {
            None
        };
        self.last_action = action;
        self.heading = heading;

        if let Some(apple) = relocated {
            self.apple = apple;
            self.reward = APPLE_REWARD;
            self.moves_without_apple = 0;
            self.score += 1;
            self.apple_distance = manhattan(head, self.apple);
        } else {
            self.body.pop_back();
            let previous = self.apple_distance;
            self.apple_distance = manhattan(head, self.apple);
            self.reward = if self.apple_distance < previous {
                APPROACH_REWARD
            } else {
                0.0
            };
        }

        if self.body.contains(&head) {
            self.alive = false;
            self.reward = DEATH_REWARD;
        }

        if !self.board.in_bounds(head) {
            self.alive = false;
            self.reward = DEATH_REWARD;
        }

        self.body.push_front(head);
        self.moves_without_apple += 1;
        // stuck in a loop: end the episode but keep the reward of the step
        if self.moves_without_apple > self.max_moves {
            self.alive = false;
        }

        self.refresh();
        Ok(())
    }

    /// Encode the current board as seen from the head
    pub fn encode_state(&self) -> StateEncoding {
        match self.mode {
            EncodingMode::Vector => vector_encoding(
                &self.board,
                self.head(),
                self.heading,
                self.apple,
                self.body.len(),
            ),
            EncodingMode::Image => image_encoding(&self.board, self.head(), self.view_radius),
        }
    }

    /// Package the last step as `(previous, action, current, reward, alive)` and roll the previous encoding forward
    pub fn get_transition(&mut self) -> Transition {
        let state = std::mem::replace(&mut self.previous_state, self.state.clone());
        Transition {
            state,
            action: self.last_action,
            next_state: self.state.clone(),
            reward: self.reward,
            alive: self.alive,
        }
    }

    fn refresh(&mut self) {
        self.board.refresh(&self.body, self.apple);
        self.state = self.encode_state();
    }

    /// Pick a uniformly random grid cell not covered by the body or `reserved`
    fn free_cell(&mut self, reserved: Option<Pos>) -> Result<Pos> {
        let occupied = HashSet::<&Pos>::from_iter(self.body.iter().chain(reserved.as_ref()));
        let (width, height) = (self.board.width() as i32, self.board.height() as i32);
        let vacant = (0..width)
            .flat_map(|x| (0..height).map(move |y| (x, y)))
            .filter(|pos| !occupied.contains(pos))
            .collect::<Vec<_>>();

        vacant
            .choose(&mut self.rng)
            .copied()
            .ok_or(Error::NoFreeCell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(mode: EncodingMode) -> SnakeEnv {
        let config = EnvConfig::new().with_mode(mode).with_seed(Some(11));
        SnakeEnv::new(&config).unwrap()
    }

    /// Place a body (listed tail first), heading and apple
    fn place(env: &mut SnakeEnv, tail_first: &[Pos], heading: Heading, apple: Pos) {
        env.body = tail_first.iter().rev().copied().collect();
        env.heading = heading;
        env.apple = apple;
        env.apple_distance = manhattan(env.head(), apple);
        env.alive = true;
        env.reward = 0.0;
        env.score = 0;
        env.moves_without_apple = 0;
        env.refresh();
        env.previous_state = env.state.clone();
    }

    #[test]
    fn heading_turns_wrap() {
        assert_eq!(Heading::North.turn(-1), Heading::West);
        assert_eq!(Heading::West.turn(1), Heading::North);
        assert_eq!(Heading::East.turn(0), Heading::East);
        assert_eq!(Heading::South.turn(2), Heading::North);
    }

    #[test]
    fn reset_spawns_valid_episode() {
        let env = env(EncodingMode::Vector);
        assert_eq!(env.body().len(), 3, "three segments");
        assert_eq!(env.heading(), Heading::East, "heading east");
        assert!(env.board().in_bounds(env.head()), "head on the grid");
        assert!(!env.body().contains(&env.apple()), "apple on a free cell");
        assert_eq!(env.state().len(), 9, "vector encoding length");
        assert!(env.is_alive());
    }

    #[test]
    fn eating_grows_and_relocates_apple() {
        let mut env = env(EncodingMode::Vector);
        place(&mut env, &[(5, 5), (6, 5), (7, 5)], Heading::East, (8, 5));

        env.apply_action(1).unwrap();

        assert_eq!(env.reward(), APPLE_REWARD, "apple reward");
        assert_eq!(env.score(), 1, "score incremented");
        assert_eq!(env.head(), (8, 5), "head moved onto the apple");
        assert_eq!(env.body().len(), 4, "tail kept when eating");
        assert!(!env.body().contains(&env.apple()), "apple relocated off the body");
        assert_eq!(env.moves_without_apple(), 1, "counter reset then incremented");
        assert!(env.is_alive());
    }

    #[test]
    fn approach_shaping() {
        let mut env = env(EncodingMode::Vector);
        place(&mut env, &[(5, 5), (6, 5), (7, 5)], Heading::East, (12, 5));
        env.apply_action(1).unwrap();
        assert_eq!(env.reward(), APPROACH_REWARD, "closer to the apple");
        assert_eq!(env.body().len(), 3, "tail popped");

        env.apply_action(0).unwrap();
        assert_eq!(env.heading(), Heading::North, "left turn from east");
        assert_eq!(env.reward(), 0.0, "not closer");
    }

    #[test]
    fn self_collision_kills() {
        let mut env = env(EncodingMode::Vector);
        // a hook: turning left from north runs the head into (4, 5)
        let body = [(7, 6), (6, 6), (5, 6), (4, 6), (4, 5), (5, 5)];
        place(&mut env, &body, Heading::North, (20, 10));
        let apple = env.apple();

        env.apply_action(0).unwrap();

        assert!(!env.is_alive(), "dead after biting the body");
        assert_eq!(env.reward(), DEATH_REWARD, "death penalty");
        assert_eq!(env.score(), 0, "score untouched");
        assert_eq!(env.apple(), apple, "apple untouched");
    }

    #[test]
    fn moving_into_vacated_tail_is_safe() {
        let mut env = env(EncodingMode::Vector);
        // square loop: the head chases its own tail
        let body = [(5, 6), (6, 6), (6, 5), (5, 5)];
        place(&mut env, &body, Heading::West, (20, 10));
        env.apply_action(0).unwrap();
        assert_eq!(env.head(), (5, 6), "head took the old tail cell");
        assert!(env.is_alive(), "tail moved out of the way");
    }

    #[test]
    fn wall_collision_kills() {
        let mut env = env(EncodingMode::Vector);
        place(&mut env, &[(0, 3), (1, 3), (2, 3)], Heading::East, (10, 10));
        env.apply_action(0).unwrap();
        env.apply_action(0).unwrap();
        // heading west at (1, 2)
        assert_eq!(env.heading(), Heading::West);
        env.apply_action(1).unwrap();
        env.apply_action(1).unwrap();
        env.apply_action(1).unwrap();
        assert!(!env.is_alive(), "left the grid");
        assert_eq!(env.reward(), DEATH_REWARD, "wall penalty");

        let head = env.head();
        env.apply_action(1).unwrap();
        assert_eq!(env.head(), head, "dead snakes do not move");
    }

    #[test]
    fn stuck_loop_ends_without_penalty() {
        let mut env = env(EncodingMode::Vector);
        place(&mut env, &[(5, 5), (6, 5), (7, 5)], Heading::East, (25, 15));
        env.moves_without_apple = env.max_moves();
        env.apply_action(1).unwrap();

        assert!(!env.is_alive(), "episode cut short");
        assert_eq!(env.reward(), APPROACH_REWARD, "reward of the step is kept");
    }

    #[test]
    fn transition_rolls_previous_state() {
        let mut env = env(EncodingMode::Vector);
        place(&mut env, &[(5, 5), (6, 5), (7, 5)], Heading::East, (12, 5));
        let first = env.state().clone();

        env.apply_action(1).unwrap();
        let t1 = env.get_transition();
        assert_eq!(t1.state, first, "transition starts from the previous encoding");
        assert_eq!(&t1.next_state, env.state(), "and ends at the current one");
        assert_eq!(t1.action, 1);
        assert_eq!(t1.reward, APPROACH_REWARD);
        assert!(t1.alive);

        env.apply_action(2).unwrap();
        let t2 = env.get_transition();
        assert_eq!(t2.state, t1.next_state, "previous encoding rolled forward");
        assert_eq!(t2.action, 2);
    }

    #[test]
    fn vector_encoding_sees_walls_and_apple() {
        let mut env = env(EncodingMode::Vector);
        place(&mut env, &[(5, 5), (6, 5), (7, 5)], Heading::East, (12, 5));
        let features = env.state().as_slice().to_vec();

        // apple straight ahead 5 cells away
        assert!((features[0] - (1.0 - 5.0 / 20.0)).abs() < 1e-6, "front sees the apple");
        // north wall 6 cells above the head at y = 5
        assert!((features[5] + (1.0 - 6.0 / 20.0)).abs() < 1e-6, "left sees the north wall");
        assert!(features[7].abs() < 1e-6, "apple dead ahead");
        assert!((features[8] - 0.03).abs() < 1e-6, "body length feature");
    }

    #[test]
    fn full_board_fails_before_moving() {
        let config = EnvConfig::new()
            .with_width(4)
            .with_height(1)
            .with_seed(Some(11));
        let mut env = SnakeEnv::new(&config).unwrap();
        place(&mut env, &[(0, 0), (1, 0), (2, 0)], Heading::North, (3, 0));
        env.last_action = 0;

        // a right turn from north heads east onto the last free cell
        assert!(
            matches!(env.apply_action(2), Err(Error::NoFreeCell)),
            "nowhere to put the next apple"
        );
        assert_eq!(env.heading(), Heading::North, "heading untouched");
        assert_eq!(env.last_action, 0, "last action untouched");
        assert_eq!(env.head(), (2, 0), "snake did not move");
        assert_eq!(env.apple(), (3, 0), "apple untouched");
        assert_eq!(env.score(), 0);
    }

    #[test]
    fn grid_must_fit_snake_and_apple() {
        for (width, height) in [(3, 1), (2, 5), (3, 0)] {
            let config = EnvConfig::new().with_width(width).with_height(height);
            assert!(
                matches!(SnakeEnv::new(&config), Err(Error::InvalidConfig(_))),
                "{width}x{height} rejected"
            );
        }
        let config = EnvConfig::new().with_width(4).with_height(1);
        assert!(SnakeEnv::new(&config).is_ok(), "4x1 leaves one cell for the apple");
    }

    #[test]
    fn image_mode_uses_absolute_headings() {
        let mut env = env(EncodingMode::Image);
        place(&mut env, &[(5, 5), (6, 5), (7, 5)], Heading::East, (12, 12));
        assert_eq!(env.state().len(), 121, "11x11 patch");
        assert_eq!(env.state().as_slice()[60], -1.0, "head at the centre");

        env.apply_action(2).unwrap();
        assert_eq!(env.heading(), Heading::South, "absolute heading");
        assert_eq!(env.head(), (7, 6));

        assert!(matches!(
            env.apply_action(4),
            Err(Error::InvalidAction { action: 4, num_actions: 4 })
        ));
    }
}
