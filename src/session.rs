//! The session state machine: level progression, entity lifecycles, timers
//! and the win/loss/puzzle transitions, driven one tick per rendered frame.
//!
//! The session exclusively owns the grid and every entity. A level
//! transition or reset replaces them wholesale; nothing mutates stale
//! entities across a maze regeneration.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::entity::{Enemy, ExitGate, Food, PowerUp};
use crate::grid::{Dir, Grid, Pos};
use crate::maze::{self, MazeError};
use crate::persist::SaveData;
use crate::puzzle::{Puzzle, PuzzleState};

const PLAYER_START: Pos = Pos::new(1, 1);
const BASE_TIME: f32 = 60.0;
const LEVEL_TIME_REDUCTION: f32 = 5.0;
const MIN_LEVEL_TIME: f32 = 10.0;
const BASE_THRESHOLD: u32 = 100;
const THRESHOLD_INCREMENT: u32 = 150;
const FOOD_REWARD: u32 = 10;
const HIT_COOLDOWN: f32 = 1.0;
const BASE_ENEMY_INTERVAL: f32 = 0.5;
const ENEMY_INTERVAL_STEP: f32 = 0.05;
const MIN_ENEMY_INTERVAL: f32 = 0.2;
const SCORE_POWERUP_BONUS: u32 = 5;
const SCORE_POWERUP_DURATION: f32 = 5.0;
const SCORE_POWERUP_SPAWN_AT: [f32; 2] = [40.0, 20.0];
const FREEZE_POWERUP_DURATION: f32 = 3.0;
const FREEZE_POWERUP_SPAWN_AT: [f32; 2] = [35.0, 10.0];
const FREEZE_EFFECT_DURATION: f32 = 5.0;

/// Which screen the session is on. Pausing is a sub-flag of `Playing`, not
/// a state of its own: rendering queries keep working while paused.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum State {
    Menu,
    Playing,
    Puzzle,
    GameOver,
    Quit,
}

/// Discrete inputs from the frontend, one per player intent.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Action {
    Start,
    LoadFrom(SaveData),
    Move(Dir),
    TogglePause,
    ReturnToMenu,
    Replay,
    Quit,
    PuzzleDigit(char),
    PuzzleBackspace,
    PuzzleSubmit,
}

/// Named audio/feedback cues for the frontend to play. The session never
/// touches a sound device itself.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cue {
    Food,
    PowerUp,
    LevelUp,
    GameOver,
}

/// Feature flags and dimensions, consolidating what used to be separate
/// program variants into one configurable session.
#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    pub grid_width: usize,
    pub grid_height: usize,
    pub enemy_count: usize,
    pub powerups_enabled: bool,
    pub exit_puzzle_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            grid_width: 21,
            grid_height: 11,
            enemy_count: 2,
            powerups_enabled: true,
            exit_puzzle_enabled: true,
        }
    }
}

pub struct Session {
    config: SessionConfig,
    rng: StdRng,
    state: State,
    paused: bool,
    score: u32,
    level: u32,
    timer: f32,
    next_threshold: u32,
    time_since_hit: f32,
    freeze_timer: f32,
    grid: Grid,
    player: Pos,
    enemies: Vec<Enemy>,
    food: Food,
    score_powerup: PowerUp,
    freeze_powerup: PowerUp,
    exit: ExitGate,
    puzzle: Option<Puzzle>,
    score_spawn_done: [bool; 2],
    freeze_spawn_done: [bool; 2],
    queued_move: Option<Dir>,
    high_score: u32,
    high_score_dirty: bool,
    cues: Vec<Cue>,
}

impl Session {
    pub fn new(config: SessionConfig, high_score: u32) -> Result<Self, MazeError> {
        Self::with_rng(config, high_score, StdRng::from_entropy())
    }

    /// Seedable constructor so generation and spawning are reproducible.
    pub fn with_rng(
        config: SessionConfig,
        high_score: u32,
        mut rng: StdRng,
    ) -> Result<Self, MazeError> {
        let grid = maze::generate(&mut rng, config.grid_width, config.grid_height)?;
        let food = Food::spawn(&grid, &mut rng);
        let score_powerup = PowerUp::spawn(&grid, &mut rng);
        let freeze_powerup = PowerUp::spawn(&grid, &mut rng);
        let exit = ExitGate::for_grid(&grid);
        let enemies = patrol_routes(config.grid_width, config.grid_height, config.enemy_count)
            .into_iter()
            .map(|route| Enemy::new(route, enemy_interval(1)))
            .collect();
        Ok(Self {
            config,
            rng,
            state: State::Menu,
            paused: false,
            score: 0,
            level: 1,
            timer: BASE_TIME,
            next_threshold: BASE_THRESHOLD,
            time_since_hit: 0.0,
            freeze_timer: 0.0,
            grid,
            player: PLAYER_START,
            enemies,
            food,
            score_powerup,
            freeze_powerup,
            exit,
            puzzle: None,
            score_spawn_done: [false; 2],
            freeze_spawn_done: [false; 2],
            queued_move: None,
            high_score,
            high_score_dirty: false,
            cues: Vec::new(),
        })
    }

    pub fn handle_action(&mut self, action: Action) {
        match (self.state, action) {
            (_, Action::Quit) => self.state = State::Quit,
            (State::Menu, Action::Start) => self.start(),
            (State::Menu, Action::LoadFrom(data)) => self.start_from_save(data),
            (State::Playing, Action::Move(dir)) => {
                if !self.paused {
                    self.queued_move = Some(dir);
                }
            }
            (State::Playing, Action::TogglePause) => self.paused = !self.paused,
            (State::Playing, Action::ReturnToMenu)
            | (State::GameOver, Action::ReturnToMenu) => self.to_menu(),
            (State::Puzzle, Action::ReturnToMenu) => {
                // Abandoning mid-puzzle discards the attempt state entirely.
                self.puzzle = None;
                self.to_menu();
            }
            (State::GameOver, Action::Replay) => self.reset_to_level_one(),
            (State::Puzzle, Action::PuzzleDigit(digit)) => {
                if let Some(puzzle) = self.puzzle.as_mut() {
                    puzzle.push_digit(digit);
                }
            }
            (State::Puzzle, Action::PuzzleBackspace) => {
                if let Some(puzzle) = self.puzzle.as_mut() {
                    puzzle.backspace();
                }
            }
            (State::Puzzle, Action::PuzzleSubmit) => self.submit_puzzle(),
            _ => {}
        }
    }

    /// One frame of game time. Only `Playing` advances; the fixed step
    /// order below is the contract the tests pin down.
    pub fn tick(&mut self, dt: f32) {
        if self.state != State::Playing || self.paused {
            return;
        }
        self.time_since_hit += dt;

        // 1. countdown
        self.timer = (self.timer - dt).max(0.0);
        if self.timer <= 0.0 {
            info!("time expired at level {} with score {}", self.level, self.score);
            self.state = State::GameOver;
            self.cues.push(Cue::GameOver);
            return;
        }

        // 2. queued player movement
        if let Some(dir) = self.queued_move.take() {
            self.player = self.grid.try_move(self.player, dir);
        }

        // 3. enemy patrols, suspended while the freeze effect runs
        if self.freeze_timer > 0.0 {
            self.freeze_timer = (self.freeze_timer - dt).max(0.0);
        } else {
            for enemy in &mut self.enemies {
                enemy.tick(dt);
            }
        }

        // 4. power-up timers and threshold-gated activation
        if self.config.powerups_enabled {
            self.score_powerup.tick(dt);
            self.freeze_powerup.tick(dt);
            self.spawn_powerups();
        }

        // 5. collectible pickup
        if self.player == self.food.pos {
            self.food.respawn(&self.grid, &mut self.rng);
            self.score += FOOD_REWARD;
            self.bump_high_score();
            self.cues.push(Cue::Food);
        }

        // 6. exit reveal
        if !self.exit.active && self.score >= self.next_threshold {
            self.exit.active = true;
            debug!("exit revealed at score {}", self.score);
        }

        // 7. stepping onto the exit
        if self.exit.active && self.player == self.exit.pos {
            if self.config.exit_puzzle_enabled {
                self.puzzle = Some(Puzzle::new(&mut self.rng));
                self.state = State::Puzzle;
            } else {
                self.level_up();
            }
            return;
        }

        // 8. enemy contact, cooldown-gated so sustained overlap drains
        //    at most one point per second
        if self.enemies.iter().any(|enemy| enemy.pos == self.player)
            && self.time_since_hit >= HIT_COOLDOWN
        {
            self.score = self.score.saturating_sub(1);
            self.time_since_hit = 0.0;
        }

        // 9. power-up pickup
        if self.score_powerup.active && self.player == self.score_powerup.pos {
            self.score += SCORE_POWERUP_BONUS;
            self.bump_high_score();
            self.score_powerup.deactivate();
            self.cues.push(Cue::PowerUp);
        }
        if self.freeze_powerup.active && self.player == self.freeze_powerup.pos {
            self.freeze_timer = FREEZE_EFFECT_DURATION;
            self.freeze_powerup.deactivate();
            self.cues.push(Cue::PowerUp);
        }
    }

    fn start(&mut self) {
        self.score = 0;
        self.timer = start_timer(self.level);
        self.regenerate();
        self.paused = false;
        self.state = State::Playing;
        info!("session started at level {}", self.level);
    }

    fn start_from_save(&mut self, data: SaveData) {
        self.level = data.level.max(1);
        self.score = data.score;
        self.timer = start_timer(self.level);
        self.regenerate();
        // The saved cell was recorded against a maze that no longer
        // exists; keep it only if the fresh maze carved it.
        let saved = Pos::new(data.player_x as usize, data.player_y as usize);
        if self.grid.is_path(saved) {
            self.player = saved;
        }
        self.paused = false;
        self.state = State::Playing;
        info!("session restored at level {} score {}", self.level, self.score);
    }

    fn to_menu(&mut self) {
        self.paused = false;
        self.queued_move = None;
        self.state = State::Menu;
    }

    fn reset_to_level_one(&mut self) {
        self.level = 1;
        self.score = 0;
        self.next_threshold = BASE_THRESHOLD;
        self.timer = start_timer(1);
        self.regenerate();
        self.paused = false;
        self.state = State::Playing;
    }

    fn submit_puzzle(&mut self) {
        let Some(puzzle) = self.puzzle.as_mut() else {
            return;
        };
        match puzzle.submit() {
            PuzzleState::Solved => {
                self.puzzle = None;
                self.level_up();
                self.state = State::Playing;
            }
            PuzzleState::Exhausted => {
                // Out of attempts: one well-defined outcome, a full soft
                // reset, with no immediate re-challenge.
                self.puzzle = None;
                info!("puzzle failed, resetting to level 1");
                self.reset_to_level_one();
            }
            _ => {}
        }
    }

    fn level_up(&mut self) {
        self.level += 1;
        self.timer = (BASE_TIME - self.level as f32 * LEVEL_TIME_REDUCTION).max(MIN_LEVEL_TIME);
        self.next_threshold += THRESHOLD_INCREMENT;
        self.regenerate();
        self.cues.push(Cue::LevelUp);
        info!("advanced to level {}", self.level);
    }

    /// Fresh maze and a fresh set of entities; the old ones are dropped
    /// wholesale.
    fn regenerate(&mut self) {
        self.grid = maze::generate(&mut self.rng, self.config.grid_width, self.config.grid_height)
            .expect("dimensions validated at construction");
        self.player = PLAYER_START;
        self.food.respawn(&self.grid, &mut self.rng);
        self.score_powerup = PowerUp::spawn(&self.grid, &mut self.rng);
        self.freeze_powerup = PowerUp::spawn(&self.grid, &mut self.rng);
        self.exit = ExitGate::for_grid(&self.grid);
        let interval = enemy_interval(self.level);
        for enemy in &mut self.enemies {
            enemy.reset(interval);
        }
        self.score_spawn_done = [false; 2];
        self.freeze_spawn_done = [false; 2];
        self.freeze_timer = 0.0;
        self.queued_move = None;
    }

    fn spawn_powerups(&mut self) {
        if !self.score_powerup.active {
            for (done, at) in self.score_spawn_done.iter_mut().zip(SCORE_POWERUP_SPAWN_AT) {
                if !*done && self.timer <= at {
                    self.score_powerup
                        .activate(&self.grid, &mut self.rng, SCORE_POWERUP_DURATION);
                    *done = true;
                    break;
                }
            }
        }
        if !self.freeze_powerup.active {
            for (done, at) in self.freeze_spawn_done.iter_mut().zip(FREEZE_POWERUP_SPAWN_AT) {
                if !*done && self.timer <= at {
                    self.freeze_powerup
                        .activate(&self.grid, &mut self.rng, FREEZE_POWERUP_DURATION);
                    *done = true;
                    break;
                }
            }
        }
    }

    fn bump_high_score(&mut self) {
        if self.score > self.high_score {
            self.high_score = self.score;
            self.high_score_dirty = true;
        }
    }

    // --- render/persistence queries ---

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn time_left(&self) -> f32 {
        self.timer
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn player(&self) -> Pos {
        self.player
    }

    pub fn enemy_positions(&self) -> impl Iterator<Item = Pos> + '_ {
        self.enemies.iter().map(|enemy| enemy.pos)
    }

    pub fn food_pos(&self) -> Pos {
        self.food.pos
    }

    pub fn score_powerup_pos(&self) -> Option<Pos> {
        self.score_powerup.active.then_some(self.score_powerup.pos)
    }

    pub fn freeze_powerup_pos(&self) -> Option<Pos> {
        self.freeze_powerup.active.then_some(self.freeze_powerup.pos)
    }

    pub fn exit_pos(&self) -> Option<Pos> {
        self.exit.active.then_some(self.exit.pos)
    }

    pub fn enemies_frozen(&self) -> bool {
        self.freeze_timer > 0.0
    }

    pub fn puzzle(&self) -> Option<&Puzzle> {
        self.puzzle.as_ref()
    }

    pub fn save_data(&self) -> SaveData {
        SaveData {
            level: self.level,
            score: self.score,
            player_x: self.player.x as f32,
            player_y: self.player.y as f32,
        }
    }

    /// Cues emitted since the last drain, in emission order.
    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    /// New high score to persist, if one was set since the last call.
    pub fn take_high_score_update(&mut self) -> Option<u32> {
        if self.high_score_dirty {
            self.high_score_dirty = false;
            Some(self.high_score)
        } else {
            None
        }
    }
}

fn start_timer(level: u32) -> f32 {
    (BASE_TIME - (level - 1) as f32 * LEVEL_TIME_REDUCTION).max(MIN_LEVEL_TIME)
}

fn enemy_interval(level: u32) -> f32 {
    (BASE_ENEMY_INTERVAL - level as f32 * ENEMY_INTERVAL_STEP).max(MIN_ENEMY_INTERVAL)
}

/// Authored patrol loops on room coordinates, so every cell is carved in
/// any generated maze of the configured size.
fn patrol_routes(width: usize, height: usize, count: usize) -> Vec<Vec<Pos>> {
    const ANCHORS: [(usize, usize); 4] = [(3, 3), (7, 7), (11, 3), (15, 7)];
    (0..count)
        .map(|i| {
            let (ax, ay) = ANCHORS[i % ANCHORS.len()];
            square_route(ax, ay, width, height)
        })
        .collect()
}

fn square_route(ax: usize, ay: usize, width: usize, height: usize) -> Vec<Pos> {
    if width < 7 || height < 7 {
        // Too cramped for a loop; park on the start room.
        return vec![PLAYER_START];
    }
    let ax = ax.min(width - 4);
    let ay = ay.min(height - 4);
    vec![
        Pos::new(ax, ay),
        Pos::new(ax + 2, ay),
        Pos::new(ax + 2, ay + 2),
        Pos::new(ax, ay + 2),
    ]
}
