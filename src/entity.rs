//! Everything that lives on the grid besides the player: the collectible,
//! timed power-ups, patrolling enemies and the exit gate, plus the shared
//! random-placement rule they spawn with.

use rand::Rng;

use crate::grid::{Grid, Pos};

/// Retry bound for rejection sampling. Purely defensive: a generated maze
/// always has Path cells, so the loop terminates almost surely long before
/// this. Past the bound we fall back to a deterministic scan.
const PLACEMENT_RETRY_LIMIT: usize = 10_000;

/// Uniformly random Path cell, by rejection sampling over the whole grid.
pub fn place_random(grid: &Grid, rng: &mut impl Rng) -> Pos {
    for _ in 0..PLACEMENT_RETRY_LIMIT {
        let candidate = Pos::new(rng.gen_range(0..grid.width()), rng.gen_range(0..grid.height()));
        if grid.is_path(candidate) {
            return candidate;
        }
    }
    grid.path_cells()
        .next()
        .unwrap_or_else(|| Pos::new(1, 1))
}

/// The collectible the player chases for score.
#[derive(Debug)]
pub struct Food {
    pub pos: Pos,
}

impl Food {
    pub fn spawn(grid: &Grid, rng: &mut impl Rng) -> Self {
        Self {
            pos: place_random(grid, rng),
        }
    }

    pub fn respawn(&mut self, grid: &Grid, rng: &mut impl Rng) {
        self.pos = place_random(grid, rng);
    }
}

/// A timed pickup. Dormant until activated, then visible at a fresh random
/// Path cell for `timer` seconds before despawning on its own.
#[derive(Debug)]
pub struct PowerUp {
    pub pos: Pos,
    pub active: bool,
    pub timer: f32,
}

impl PowerUp {
    pub fn spawn(grid: &Grid, rng: &mut impl Rng) -> Self {
        Self {
            pos: place_random(grid, rng),
            active: false,
            timer: 0.0,
        }
    }

    pub fn activate(&mut self, grid: &Grid, rng: &mut impl Rng, duration: f32) {
        self.pos = place_random(grid, rng);
        self.active = true;
        self.timer = duration;
    }

    pub fn tick(&mut self, dt: f32) {
        if self.active {
            self.timer -= dt;
            if self.timer <= 0.0 {
                self.deactivate();
            }
        }
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.timer = 0.0;
    }
}

/// A patrolling enemy: a fixed closed cycle of cells stepped through at a
/// per-level interval. Routes are authored, not derived from the maze;
/// callers pick routes whose cells are always-carved rooms.
#[derive(Debug)]
pub struct Enemy {
    pub pos: Pos,
    route: Vec<Pos>,
    index: usize,
    move_timer: f32,
    move_interval: f32,
}

impl Enemy {
    pub fn new(route: Vec<Pos>, move_interval: f32) -> Self {
        assert!(!route.is_empty(), "patrol route must be non-empty");
        Self {
            pos: route[0],
            route,
            index: 0,
            move_timer: 0.0,
            move_interval,
        }
    }

    /// Back to the first route cell, with a new per-level step interval.
    pub fn reset(&mut self, move_interval: f32) {
        self.index = 0;
        self.pos = self.route[0];
        self.move_timer = 0.0;
        self.move_interval = move_interval;
    }

    pub fn tick(&mut self, dt: f32) {
        self.move_timer += dt;
        if self.move_timer >= self.move_interval {
            self.index = (self.index + 1) % self.route.len();
            self.pos = self.route[self.index];
            self.move_timer = 0.0;
        }
    }

    #[cfg(test)]
    pub fn index(&self) -> usize {
        self.index
    }
}

/// The level exit. Sits dormant at its cell until the score threshold is
/// reached, then reveals itself.
#[derive(Debug)]
pub struct ExitGate {
    pub pos: Pos,
    pub active: bool,
}

impl ExitGate {
    /// The far room is always carved on an odd grid, and maximally distant
    /// from the (1,1) start.
    pub fn for_grid(grid: &Grid) -> Self {
        Self {
            pos: Pos::new(grid.width() - 2, grid.height() - 2),
            active: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::maze;

    #[test]
    fn placement_always_lands_on_a_path_cell() {
        let mut rng = StdRng::seed_from_u64(3);
        let grid = maze::generate(&mut rng, 21, 11).unwrap();
        for _ in 0..500 {
            assert!(grid.is_path(place_random(&grid, &mut rng)));
        }
    }

    #[test]
    fn placement_spreads_over_distinct_cells() {
        let mut rng = StdRng::seed_from_u64(4);
        let grid = maze::generate(&mut rng, 21, 11).unwrap();
        let distinct: HashSet<(usize, usize)> = (0..500)
            .map(|_| {
                let p = place_random(&grid, &mut rng);
                (p.x, p.y)
            })
            .collect();
        // 500 uniform draws over ~100 path cells should hit most of them.
        assert!(distinct.len() > grid.path_cells().count() / 2);
    }

    #[test]
    fn enemy_cycles_through_its_route() {
        let route = vec![
            Pos::new(3, 3),
            Pos::new(5, 3),
            Pos::new(5, 5),
            Pos::new(3, 5),
        ];
        let mut enemy = Enemy::new(route.clone(), 0.5);
        for k in 1..=10 {
            enemy.tick(0.5);
            assert_eq!(enemy.index(), k % route.len());
            assert_eq!(enemy.pos, route[k % route.len()]);
        }
    }

    #[test]
    fn enemy_waits_out_its_interval() {
        let mut enemy = Enemy::new(vec![Pos::new(1, 1), Pos::new(3, 1)], 0.5);
        enemy.tick(0.2);
        assert_eq!(enemy.pos, Pos::new(1, 1));
        enemy.tick(0.2);
        assert_eq!(enemy.pos, Pos::new(1, 1));
        enemy.tick(0.2);
        assert_eq!(enemy.pos, Pos::new(3, 1));
    }

    #[test]
    fn powerup_expires_after_its_duration() {
        let mut rng = StdRng::seed_from_u64(5);
        let grid = maze::generate(&mut rng, 21, 11).unwrap();
        let mut powerup = PowerUp::spawn(&grid, &mut rng);
        assert!(!powerup.active);
        powerup.activate(&grid, &mut rng, 3.0);
        assert!(powerup.active);
        assert!(grid.is_path(powerup.pos));
        powerup.tick(2.9);
        assert!(powerup.active);
        powerup.tick(0.2);
        assert!(!powerup.active);
    }

    #[test]
    fn exit_gate_sits_on_the_far_room() {
        let mut rng = StdRng::seed_from_u64(6);
        let grid = maze::generate(&mut rng, 21, 11).unwrap();
        let exit = ExitGate::for_grid(&grid);
        assert_eq!(exit.pos, Pos::new(19, 9));
        assert!(grid.is_path(exit.pos));
        assert!(!exit.active);
    }
}
