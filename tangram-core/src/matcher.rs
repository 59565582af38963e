use serde::Serialize;

use crate::catalog::SolutionEntry;
use crate::config::{Presence, Tolerances};
use crate::geometry::{MirrorScale, normalized_angle_diff};
use crate::piece::PieceId;
use crate::store::Arrangement;

/// Why a template entry was not satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Mismatch {
    /// The piece is missing or resting in the palette.
    NotOnBoard,
    Position { distance: f64, tolerance: f64 },
    Rotation { diff_deg: f64, tolerance: f64 },
    Scale {
        expected: MirrorScale,
        actual: MirrorScale,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum MatchResult {
    Solved,
    Failed { piece_id: PieceId, mismatch: Mismatch },
    /// The template is empty; nothing can be verified.
    NoSolutionAvailable,
}

impl MatchResult {
    pub fn is_solved(&self) -> bool {
        matches!(self, MatchResult::Solved)
    }
}

/// Measurements for one evaluated template entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntryDiagnostic {
    pub piece_id: PieceId,
    pub on_board: bool,
    /// `None` when the piece was not present to measure.
    pub distance: Option<f64>,
    pub angle_diff_deg: Option<f64>,
    pub scale_ok: Option<bool>,
    pub passed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchReport {
    pub result: MatchResult,
    /// Entries in template order, up to and including the first failure.
    pub diagnostics: Vec<EntryDiagnostic>,
}

/// Solution matcher settings.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Matcher {
    pub tolerances: Tolerances,
    pub presence: Presence,
}

impl Matcher {
    pub fn new(tolerances: Tolerances, presence: Presence) -> Self {
        Matcher {
            tolerances,
            presence,
        }
    }

    pub fn check(&self, pieces: &impl Arrangement, template: &[SolutionEntry]) -> MatchResult {
        self.check_detailed(pieces, template).result
    }

    /// Compare the arrangement against `template` entry by entry, stopping at
    /// the first entry that fails.
    pub fn check_detailed(
        &self,
        pieces: &impl Arrangement,
        template: &[SolutionEntry],
    ) -> MatchReport {
        if template.is_empty() {
            return MatchReport {
                result: MatchResult::NoSolutionAvailable,
                diagnostics: Vec::new(),
            };
        }
        let mut diagnostics = Vec::with_capacity(template.len());
        for entry in template {
            let (diag, mismatch) = self.evaluate(pieces, entry);
            diagnostics.push(diag);
            if let Some(mismatch) = mismatch {
                return MatchReport {
                    result: MatchResult::Failed {
                        piece_id: entry.piece_id.clone(),
                        mismatch,
                    },
                    diagnostics,
                };
            }
        }
        MatchReport {
            result: MatchResult::Solved,
            diagnostics,
        }
    }

    fn evaluate(
        &self,
        pieces: &impl Arrangement,
        entry: &SolutionEntry,
    ) -> (EntryDiagnostic, Option<Mismatch>) {
        let mut diag = EntryDiagnostic {
            piece_id: entry.piece_id.clone(),
            on_board: false,
            distance: None,
            angle_diff_deg: None,
            scale_ok: None,
            passed: false,
        };
        let Some(state) = pieces.piece_state(&entry.piece_id) else {
            return (diag, Some(Mismatch::NotOnBoard));
        };
        diag.on_board = state.on_board;
        if self.presence == Presence::OnBoard && !state.on_board {
            return (diag, Some(Mismatch::NotOnBoard));
        }

        let t = state.transform;
        let distance = t.position.distance(entry.target_position);
        let diff = normalized_angle_diff(t.rotation_deg, entry.target_rotation_deg);
        let scale_ok = entry.target_scale.map(|s| s == t.scale);
        diag.distance = Some(distance);
        diag.angle_diff_deg = Some(diff);
        diag.scale_ok = scale_ok;

        // NaN compares false both ways; treat it as out of tolerance
        let mismatch = if distance.is_nan() || distance > self.tolerances.position {
            Some(Mismatch::Position {
                distance,
                tolerance: self.tolerances.position,
            })
        } else if diff.is_nan() || diff > self.tolerances.rotation_deg {
            Some(Mismatch::Rotation {
                diff_deg: diff,
                tolerance: self.tolerances.rotation_deg,
            })
        } else if let (Some(false), Some(expected)) = (scale_ok, entry.target_scale) {
            Some(Mismatch::Scale {
                expected,
                actual: t.scale,
            })
        } else {
            None
        };
        diag.passed = mismatch.is_none();
        (diag, mismatch)
    }
}
