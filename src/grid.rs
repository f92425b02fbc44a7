//! Grid primitives shared by every entity: tiles, cell coordinates,
//! directions and the single movement rule.

/// One cell of the maze.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Wall,
    Path,
}

/// Integer cell coordinate. Entities never hold fractional positions;
/// conversion to screen space happens at the render boundary only.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Dir {
    Up,
    Right,
    Down,
    Left,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Right, Dir::Down, Dir::Left];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Dir::Up => (0, -1),
            Dir::Right => (1, 0),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
        }
    }
}

/// Rectangular tile storage. Row-major, fixed size for its lifetime;
/// a level transition replaces the whole grid rather than mutating it.
#[derive(Clone, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn filled(width: usize, height: usize, tile: Tile) -> Self {
        Self {
            width,
            height,
            tiles: vec![tile; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    pub fn tile(&self, pos: Pos) -> Tile {
        self.tiles[pos.y * self.width + pos.x]
    }

    pub fn set_tile(&mut self, pos: Pos, tile: Tile) {
        self.tiles[pos.y * self.width + pos.x] = tile;
    }

    pub fn is_path(&self, pos: Pos) -> bool {
        self.in_bounds(pos) && self.tile(pos) == Tile::Path
    }

    /// Cell one step from `pos` in `dir`, if it stays inside the grid.
    pub fn neighbor(&self, pos: Pos, dir: Dir) -> Option<Pos> {
        let (dx, dy) = dir.delta();
        let nx = pos.x as isize + dx;
        let ny = pos.y as isize + dy;
        if nx < 0 || ny < 0 {
            return None;
        }
        let next = Pos::new(nx as usize, ny as usize);
        self.in_bounds(next).then_some(next)
    }

    /// The one movement rule. A step is accepted iff the target cell is in
    /// bounds and a Path tile; a rejected step returns the original
    /// position unchanged rather than an error.
    pub fn try_move(&self, pos: Pos, dir: Dir) -> Pos {
        match self.neighbor(pos, dir) {
            Some(next) if self.tile(next) == Tile::Path => next,
            _ => pos,
        }
    }

    pub fn path_cells(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width)
                .map(move |x| Pos::new(x, y))
                .filter(move |p| self.tile(*p) == Tile::Path)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_by_three() -> Grid {
        // Walls everywhere except the center and the cell right of it.
        let mut grid = Grid::filled(3, 3, Tile::Wall);
        grid.set_tile(Pos::new(1, 1), Tile::Path);
        grid.set_tile(Pos::new(2, 1), Tile::Path);
        grid
    }

    #[test]
    fn move_into_path_is_accepted() {
        let grid = three_by_three();
        assert_eq!(grid.try_move(Pos::new(1, 1), Dir::Right), Pos::new(2, 1));
    }

    #[test]
    fn move_into_wall_is_a_no_op() {
        let grid = three_by_three();
        let start = Pos::new(1, 1);
        for dir in [Dir::Up, Dir::Down, Dir::Left] {
            assert_eq!(grid.try_move(start, dir), start);
        }
    }

    #[test]
    fn move_off_the_edge_is_a_no_op() {
        let grid = three_by_three();
        let edge = Pos::new(2, 1);
        assert_eq!(grid.try_move(edge, Dir::Right), edge);
    }

    #[test]
    fn wall_adjacent_cells_never_drift() {
        let grid = three_by_three();
        for start in grid.path_cells() {
            for dir in Dir::ALL {
                let next = grid.try_move(start, dir);
                assert!(grid.is_path(next));
            }
        }
    }
}
