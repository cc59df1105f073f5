use crate::error::MazeError;
use crate::types::{Cell, Direction, PelletKind};

pub const WALL: char = '#';
pub const DOOR: char = '=';
pub const PELLET: char = '.';
pub const POWER_PELLET: char = 'o';
pub const PACMAN_SPAWN: char = 'P';
pub const GHOST_HOME: char = 'G';
pub const GHOST_EXIT: char = 'D';

/// Geometry answers at a single node.
pub trait Occupancy {
    fn occupied(&self, dir: Direction) -> bool;

    fn available_directions(&self) -> Vec<Direction> {
        Direction::CARDINALS
            .into_iter()
            .filter(|dir| !self.occupied(*dir))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PelletSpawn {
    pub cell: Cell,
    pub kind: PelletKind,
}

#[derive(Clone, Debug)]
pub struct Maze {
    pub width: i32,
    pub height: i32,
    pub pellets: Vec<PelletSpawn>,
    pub pacman_spawn: Cell,
    pub ghost_home: Cell,
    pub ghost_exit: Cell,
    walls: Vec<bool>,
}

impl Maze {
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, MazeError> {
        if rows.is_empty() {
            return Err(MazeError::Empty);
        }
        let expected = rows[0].as_ref().chars().count();
        if expected == 0 {
            return Err(MazeError::Empty);
        }

        let mut walls = Vec::with_capacity(expected * rows.len());
        let mut pellets = Vec::new();
        let mut pacman_spawn = None;
        let mut ghost_home = None;
        let mut ghost_exit = None;

        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let width = row.chars().count();
            if width != expected {
                return Err(MazeError::RaggedRow {
                    row: y,
                    width,
                    expected,
                });
            }
            for (x, ch) in row.chars().enumerate() {
                let cell = Cell::new(x as i32, y as i32);
                walls.push(ch == WALL || ch == DOOR);
                match ch {
                    PELLET => pellets.push(PelletSpawn {
                        cell,
                        kind: PelletKind::Pellet,
                    }),
                    POWER_PELLET => pellets.push(PelletSpawn {
                        cell,
                        kind: PelletKind::Power,
                    }),
                    PACMAN_SPAWN => set_marker(&mut pacman_spawn, cell, PACMAN_SPAWN)?,
                    GHOST_HOME => set_marker(&mut ghost_home, cell, GHOST_HOME)?,
                    GHOST_EXIT => set_marker(&mut ghost_exit, cell, GHOST_EXIT)?,
                    _ => {}
                }
            }
        }

        if pellets.is_empty() {
            return Err(MazeError::NoPellets);
        }

        Ok(Self {
            width: expected as i32,
            height: rows.len() as i32,
            pellets,
            pacman_spawn: pacman_spawn.ok_or(MazeError::MissingMarker(PACMAN_SPAWN))?,
            ghost_home: ghost_home.ok_or(MazeError::MissingMarker(GHOST_HOME))?,
            ghost_exit: ghost_exit.ok_or(MazeError::MissingMarker(GHOST_EXIT))?,
            walls,
        })
    }

    pub fn is_walkable(&self, cell: Cell) -> bool {
        if cell.x < 0 || cell.y < 0 || cell.x >= self.width || cell.y >= self.height {
            return false;
        }
        !self.walls[(cell.y * self.width + cell.x) as usize]
    }

    pub fn node(&self, cell: Cell) -> MazeNode<'_> {
        MazeNode { maze: self, cell }
    }
}

fn set_marker(slot: &mut Option<Cell>, cell: Cell, marker: char) -> Result<(), MazeError> {
    if slot.is_some() {
        return Err(MazeError::DuplicateMarker(marker));
    }
    *slot = Some(cell);
    Ok(())
}

#[derive(Clone, Copy, Debug)]
pub struct MazeNode<'a> {
    maze: &'a Maze,
    cell: Cell,
}

impl Occupancy for MazeNode<'_> {
    fn occupied(&self, dir: Direction) -> bool {
        if dir.is_none() {
            return false;
        }
        !self.maze.is_walkable(self.cell.step(dir))
    }
}
