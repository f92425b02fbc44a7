//! Procedural maze generation.
//!
//! Randomized depth-first backtracker on a decimated grid: only odd-indexed
//! cells are rooms, spaced two apart, with the cells between them acting as
//! removable walls. The result is a perfect maze (every Path cell reachable
//! from `(1,1)` through exactly one simple route), fully enclosed by a
//! one-cell border.

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::grid::{Dir, Grid, Pos, Tile};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MazeError {
    #[error("maze dimensions must be odd and at least 3, got {width}x{height}")]
    BadDimensions { width: usize, height: usize },
}

/// Generates a perfect maze. Deterministic for a seeded `rng`.
pub fn generate(rng: &mut impl Rng, width: usize, height: usize) -> Result<Grid, MazeError> {
    if width < 3 || height < 3 || width % 2 == 0 || height % 2 == 0 {
        return Err(MazeError::BadDimensions { width, height });
    }

    let mut grid = Grid::filled(width, height, Tile::Wall);
    let start = Pos::new(1, 1);
    grid.set_tile(start, Tile::Path);

    let mut stack: Vec<Pos> = Vec::new();
    let mut current = start;
    let mut dirs = Dir::ALL;

    loop {
        dirs.shuffle(rng);

        // First shuffled direction whose room two cells over is still
        // uncarved and strictly inside the border.
        let next = dirs.iter().copied().find_map(|dir| {
            let (dx, dy) = dir.delta();
            let nx = current.x as isize + dx * 2;
            let ny = current.y as isize + dy * 2;
            if nx <= 0 || ny <= 0 || nx >= (width - 1) as isize || ny >= (height - 1) as isize {
                return None;
            }
            let room = Pos::new(nx as usize, ny as usize);
            if grid.tile(room) == Tile::Wall {
                let wall = Pos::new(
                    (current.x as isize + dx) as usize,
                    (current.y as isize + dy) as usize,
                );
                Some((wall, room))
            } else {
                None
            }
        });

        match next {
            Some((wall, room)) => {
                grid.set_tile(wall, Tile::Path);
                grid.set_tile(room, Tile::Path);
                stack.push(current);
                current = room;
            }
            None => match stack.pop() {
                Some(prev) => current = prev,
                None => break,
            },
        }
    }

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn reachable_from_start(grid: &Grid) -> usize {
        let start = Pos::new(1, 1);
        let mut seen = vec![false; grid.width() * grid.height()];
        let mut queue = VecDeque::new();
        seen[start.y * grid.width() + start.x] = true;
        queue.push_back(start);
        let mut count = 0;
        while let Some(pos) = queue.pop_front() {
            count += 1;
            for dir in Dir::ALL {
                if let Some(next) = grid.neighbor(pos, dir) {
                    let idx = next.y * grid.width() + next.x;
                    if grid.tile(next) == Tile::Path && !seen[idx] {
                        seen[idx] = true;
                        queue.push_back(next);
                    }
                }
            }
        }
        count
    }

    fn carved_openings(grid: &Grid) -> usize {
        // Count each adjacent Path pair once (right/down only).
        let mut edges = 0;
        for pos in grid.path_cells() {
            for dir in [Dir::Right, Dir::Down] {
                if let Some(next) = grid.neighbor(pos, dir) {
                    if grid.tile(next) == Tile::Path {
                        edges += 1;
                    }
                }
            }
        }
        edges
    }

    #[test]
    fn rejects_even_or_tiny_dimensions() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            generate(&mut rng, 20, 11),
            Err(MazeError::BadDimensions { .. })
        ));
        assert!(generate(&mut rng, 21, 10).is_err());
        assert!(generate(&mut rng, 1, 11).is_err());
        assert!(generate(&mut rng, 3, 3).is_ok());
    }

    #[test]
    fn seeded_generation_is_a_perfect_maze() {
        // Spanning tree: connected and acyclic, i.e. edges = nodes - 1.
        let mut rng = StdRng::seed_from_u64(0xCAFE);
        let grid = generate(&mut rng, 21, 11).unwrap();
        let paths = grid.path_cells().count();
        assert!(paths > 0);
        assert_eq!(reachable_from_start(&grid), paths);
        assert_eq!(carved_openings(&grid), paths - 1);
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let first = generate(&mut StdRng::seed_from_u64(42), 21, 11).unwrap();
        let second = generate(&mut StdRng::seed_from_u64(42), 21, 11).unwrap();
        for y in 0..first.height() {
            for x in 0..first.width() {
                assert_eq!(first.tile(Pos::new(x, y)), second.tile(Pos::new(x, y)));
            }
        }
    }

    #[test]
    fn border_stays_enclosed() {
        let mut rng = StdRng::seed_from_u64(7);
        let grid = generate(&mut rng, 31, 21).unwrap();
        for x in 0..grid.width() {
            assert_eq!(grid.tile(Pos::new(x, 0)), Tile::Wall);
            assert_eq!(grid.tile(Pos::new(x, grid.height() - 1)), Tile::Wall);
        }
        for y in 0..grid.height() {
            assert_eq!(grid.tile(Pos::new(0, y)), Tile::Wall);
            assert_eq!(grid.tile(Pos::new(grid.width() - 1, y)), Tile::Wall);
        }
    }

    #[test]
    fn every_room_gets_carved() {
        let mut rng = StdRng::seed_from_u64(99);
        let grid = generate(&mut rng, 21, 11).unwrap();
        for y in (1..grid.height()).step_by(2) {
            for x in (1..grid.width()).step_by(2) {
                assert_eq!(grid.tile(Pos::new(x, y)), Tile::Path);
            }
        }
    }
}
