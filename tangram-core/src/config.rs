use serde::{Deserialize, Serialize};

use crate::catalog::Difficulty;
use crate::constants::{
    BOARD_DROP_POINT, DEFAULT_SHAPE_ID, FLAT_AWARD, HANDLE_BIAS_DEG, POSITION_TOLERANCE,
    ROTATION_TOLERANCE_DEG,
};
use crate::error::ConfigError;
use crate::geometry::Point;

/// Which pieces count as present when matching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// Pieces resting in the palette fail the match.
    #[default]
    OnBoard,
    /// Every piece of the set counts regardless of its board flag.
    Present,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    pub position: f64,
    #[serde(rename = "rotation")]
    pub rotation_deg: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances {
            position: POSITION_TOLERANCE,
            rotation_deg: ROTATION_TOLERANCE_DEG,
        }
    }
}

/// How many points a first-time solve is worth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ScorePolicy {
    Flat { points: u32 },
    ByDifficulty { easy: u32, medium: u32, hard: u32 },
}

impl Default for ScorePolicy {
    fn default() -> Self {
        ScorePolicy::Flat {
            points: FLAT_AWARD,
        }
    }
}

impl ScorePolicy {
    pub fn award(&self, difficulty: Difficulty) -> u32 {
        match *self {
            ScorePolicy::Flat { points } => points,
            ScorePolicy::ByDifficulty { easy, medium, hard } => match difficulty {
                Difficulty::Easy => easy,
                Difficulty::Medium => medium,
                Difficulty::Hard => hard,
            },
        }
    }
}

/// Game rules. Every field has a default so a partial JSON override is enough.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub tolerances: Tolerances,
    pub presence: Presence,
    pub handle_bias_deg: f64,
    pub board_drop_point: Point,
    pub score: ScorePolicy,
    pub initial_shape: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            tolerances: Tolerances::default(),
            presence: Presence::default(),
            handle_bias_deg: HANDLE_BIAS_DEG,
            board_drop_point: BOARD_DROP_POINT.into(),
            score: ScorePolicy::default(),
            initial_shape: DEFAULT_SHAPE_ID.to_string(),
        }
    }
}

impl GameConfig {
    pub fn from_json(text: &str) -> Result<GameConfig, ConfigError> {
        let cfg: GameConfig = serde_json::from_str(text)?;
        check_tolerance("position", cfg.tolerances.position)?;
        check_tolerance("rotation", cfg.tolerances.rotation_deg)?;
        Ok(cfg)
    }
}

fn check_tolerance(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Tolerance { name, value })
    }
}
