//! Core of a maze-chase arcade game: procedural perfect-maze generation,
//! grid entities, a patrol-and-pickup tick loop and the session state
//! machine that strings levels together. Rendering, input and audio live in
//! the frontend binary; this crate only emits abstract cues and answers
//! render queries.

pub mod entity;
pub mod grid;
pub mod maze;
pub mod persist;
pub mod puzzle;
pub mod session;

pub use grid::{Dir, Grid, Pos, Tile};
pub use persist::{SaveData, SaveStore};
pub use session::{Action, Cue, Session, SessionConfig, State};
