//! Save-file gateway: a three-line plain-text session record and a single
//! integer high-score file. Missing or corrupt files degrade to defaults;
//! nothing here is allowed to take down the frame loop.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("save file i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("save file is malformed: {0}")]
    Malformed(String),
}

/// The on-disk session record. Line 1 level, line 2 score, line 3 the
/// player cell as two space-separated floats (format kept compatible with
/// earlier save files).
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct SaveData {
    pub level: u32,
    pub score: u32,
    pub player_x: f32,
    pub player_y: f32,
}

/// File-backed store for the session record and the high score.
#[derive(Debug)]
pub struct SaveStore {
    save_path: PathBuf,
    high_score_path: PathBuf,
}

impl SaveStore {
    pub fn new(save_path: impl Into<PathBuf>, high_score_path: impl Into<PathBuf>) -> Self {
        Self {
            save_path: save_path.into(),
            high_score_path: high_score_path.into(),
        }
    }

    pub fn save_game(&self, data: &SaveData) -> Result<(), PersistError> {
        let mut file = fs::File::create(&self.save_path)?;
        writeln!(file, "{}", data.level)?;
        writeln!(file, "{}", data.score)?;
        writeln!(file, "{} {}", data.player_x, data.player_y)?;
        info!("saved game: level {} score {}", data.level, data.score);
        Ok(())
    }

    /// `Ok(None)` when no save exists; other failures are real errors the
    /// caller may still choose to shrug off.
    pub fn load_game(&self) -> Result<Option<SaveData>, PersistError> {
        let text = match fs::read_to_string(&self.save_path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("no save file found, starting fresh");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        parse_save(&text).map(Some)
    }

    pub fn save_high_score(&self, high_score: u32) -> Result<(), PersistError> {
        fs::write(&self.high_score_path, high_score.to_string())?;
        Ok(())
    }

    /// A missing or unreadable high-score file reads as 0.
    pub fn load_high_score(&self) -> u32 {
        read_high_score(&self.high_score_path).unwrap_or_else(|err| {
            info!("high score unavailable ({err}), defaulting to 0");
            0
        })
    }
}

fn parse_save(text: &str) -> Result<SaveData, PersistError> {
    let mut lines = text.lines();
    let level = parse_line(lines.next(), "level")?;
    let score = parse_line(lines.next(), "score")?;
    let pos_line = lines
        .next()
        .ok_or_else(|| PersistError::Malformed("missing position line".into()))?;
    let mut parts = pos_line.split_whitespace();
    let player_x = parse_float(parts.next(), "player x")?;
    let player_y = parse_float(parts.next(), "player y")?;
    Ok(SaveData {
        level,
        score,
        player_x,
        player_y,
    })
}

fn parse_line(line: Option<&str>, field: &str) -> Result<u32, PersistError> {
    line.ok_or_else(|| PersistError::Malformed(format!("missing {field}")))?
        .trim()
        .parse()
        .map_err(|_| PersistError::Malformed(format!("bad {field}")))
}

fn parse_float(part: Option<&str>, field: &str) -> Result<f32, PersistError> {
    part.ok_or_else(|| PersistError::Malformed(format!("missing {field}")))?
        .parse()
        .map_err(|_| PersistError::Malformed(format!("bad {field}")))
}

fn read_high_score(path: &Path) -> Result<u32, PersistError> {
    let text = fs::read_to_string(path)?;
    text.trim()
        .parse()
        .map_err(|_| PersistError::Malformed("bad high score".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> SaveStore {
        SaveStore::new(dir.join("savegame.txt"), dir.join("highscore.txt"))
    }

    #[test]
    fn round_trips_a_session_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let data = SaveData {
            level: 3,
            score: 250,
            player_x: 5.0,
            player_y: 7.0,
        };
        store.save_game(&data).unwrap();
        assert_eq!(store.load_game().unwrap(), Some(data));
    }

    #[test]
    fn missing_save_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert_eq!(store.load_game().unwrap(), None);
    }

    #[test]
    fn corrupt_save_is_reported_as_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(dir.path().join("savegame.txt"), "3\nnot-a-score\n1 1\n").unwrap();
        assert!(matches!(
            store.load_game(),
            Err(PersistError::Malformed(_))
        ));
    }

    #[test]
    fn high_score_defaults_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert_eq!(store.load_high_score(), 0);
        store.save_high_score(420).unwrap();
        assert_eq!(store.load_high_score(), 420);
    }
}
