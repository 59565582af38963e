use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::catalog::{Catalog, Category, Shape};
use crate::config::GameConfig;
use crate::error::{TransformError, UnknownPieceError, UnknownShapeError};
use crate::geometry::Point;
use crate::gesture::{DirectInput, GestureController, GestureScope};
use crate::matcher::{MatchReport, MatchResult, Matcher};
use crate::observer::{ObserverId, Observers};
use crate::piece::PieceView;
use crate::store::TransformStore;

/// What the shell should tell the player after a check.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// First solve of this shape; the award has been added to the score.
    FirstTimeSuccess { shape_id: String, award: u32 },
    /// Solved again; score and completed set unchanged.
    RepeatSuccess { shape_id: String },
    TryAgain { result: MatchResult },
    /// The shape has no solution template.
    UnsupportedShape { shape_id: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryProgress {
    pub category: Category,
    pub completed: usize,
    pub total: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub categories: Vec<CategoryProgress>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoreSnapshot {
    pub score: u32,
    pub completed_shape_ids: Vec<String>,
}

/// Notifications other than the piece list, which comes from the store.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    ShapeSelected { shape_id: String },
    HintChanged { visible: bool },
    Checked { outcome: CheckOutcome, report: MatchReport },
    ScoreChanged(ScoreSnapshot),
}

/// Serializable summary for the shell.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub current_shape_id: String,
    pub hint_visible: bool,
    pub score: u32,
    pub completed_shape_ids: Vec<String>,
    pub pieces: Vec<PieceView>,
}

/// Process-wide game state: the store, the gesture controller, the current target
/// and the score.
pub struct GameSession<S: GestureScope = DirectInput> {
    catalog: Catalog,
    config: GameConfig,
    matcher: Matcher,
    pub store: TransformStore,
    pub gestures: GestureController<S>,
    current_shape: usize,
    score: u32,
    // insertion order kept for display
    completed: Vec<String>,
    hint_visible: bool,
    events: Observers<SessionEvent>,
}

impl GameSession<DirectInput> {
    pub fn new(catalog: Catalog, config: GameConfig) -> Result<Self, UnknownShapeError> {
        GameSession::with_scope(catalog, config, DirectInput)
    }
}

impl<S: GestureScope> GameSession<S> {
    pub fn with_scope(
        catalog: Catalog,
        config: GameConfig,
        scope: S,
    ) -> Result<Self, UnknownShapeError> {
        let current_shape = shape_index(&catalog, &config.initial_shape)?;
        let store = TransformStore::new(&catalog);
        let gestures = GestureController::new(scope, config.handle_bias_deg);
        let matcher = Matcher::new(config.tolerances, config.presence);
        Ok(GameSession {
            catalog,
            config,
            matcher,
            store,
            gestures,
            current_shape,
            score: 0,
            completed: Vec::new(),
            hint_visible: false,
            events: Observers::new(),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn current_shape(&self) -> &Shape {
        &self.catalog.shapes()[self.current_shape]
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn completed_shape_ids(&self) -> &[String] {
        &self.completed
    }

    pub fn is_completed(&self, shape_id: &str) -> bool {
        self.completed.iter().any(|s| s == shape_id)
    }

    pub fn hint_visible(&self) -> bool {
        self.hint_visible
    }

    pub fn subscribe(&mut self, f: impl FnMut(&SessionEvent) + 'static) -> ObserverId {
        self.events.subscribe(f)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn move_piece(&mut self, id: &str, position: Point) -> Result<(), TransformError> {
        self.store.set_position(id, position)
    }

    pub fn rotate_piece(&mut self, id: &str, degrees: f64) -> Result<(), TransformError> {
        self.store.set_rotation(id, degrees)
    }

    pub fn rotate_piece_by(&mut self, id: &str, delta_deg: f64) -> Result<(), TransformError> {
        self.store.rotate_by(id, delta_deg)
    }

    pub fn flip_piece(&mut self, id: &str) -> Result<(), UnknownPieceError> {
        self.store.flip(id)
    }

    /// Move a palette piece onto the board, at the configured drop point unless given.
    pub fn place_on_board(
        &mut self,
        id: &str,
        at: Option<Point>,
    ) -> Result<(), TransformError> {
        let at = at.unwrap_or(self.config.board_drop_point);
        self.store.place_on_board(id, at)
    }

    /// Send one piece back to the palette.
    pub fn park_piece(&mut self, id: &str) -> Result<(), UnknownPieceError> {
        self.gestures.cancel_piece(id);
        self.store.park(id)
    }

    /// Park every piece without changing the target shape.
    pub fn reset_pieces(&mut self) {
        self.gestures.release_all();
        self.store.reset_all();
    }

    /// Switch the target shape; all pieces return to the palette and the hint hides.
    pub fn select_shape(&mut self, shape_id: &str) -> Result<(), UnknownShapeError> {
        let idx = shape_index(&self.catalog, shape_id)?;
        self.apply_shape(idx);
        Ok(())
    }

    /// Switch to another shape library and select `shape_id` from it.
    ///
    /// Score carries over; completed ids the new library does not know are dropped.
    pub fn load_catalog(
        &mut self,
        catalog: Catalog,
        shape_id: &str,
    ) -> Result<(), UnknownShapeError> {
        let idx = shape_index(&catalog, shape_id)?;
        self.gestures.release_all();
        self.store.replace_pieces(&catalog);
        self.completed.retain(|id| catalog.shape(id).is_some());
        self.catalog = catalog;
        self.apply_shape(idx);
        let snapshot = self.score_snapshot();
        self.events.notify(&SessionEvent::ScoreChanged(snapshot));
        Ok(())
    }

    /// Pick a shape not yet completed, or any shape once all are completed.
    pub fn select_random_shape<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &Shape {
        let open: Vec<usize> = (0..self.catalog.shapes().len())
            .filter(|&i| !self.is_completed(&self.catalog.shapes()[i].id))
            .collect();
        let pool: Vec<usize> = if open.is_empty() {
            (0..self.catalog.shapes().len()).collect()
        } else {
            open
        };
        if let Some(&idx) = pool.choose(rng) {
            self.apply_shape(idx);
        }
        self.current_shape()
    }

    fn apply_shape(&mut self, idx: usize) {
        self.current_shape = idx;
        self.reset_pieces();
        self.set_hint(false);
        let shape_id = self.current_shape().id.clone();
        log::info!("shape selected: {shape_id}");
        self.events.notify(&SessionEvent::ShapeSelected { shape_id });
    }

    pub fn toggle_hint(&mut self) -> bool {
        self.set_hint(!self.hint_visible);
        self.hint_visible
    }

    pub fn set_hint(&mut self, visible: bool) {
        if self.hint_visible != visible {
            self.hint_visible = visible;
            self.events.notify(&SessionEvent::HintChanged { visible });
        }
    }

    /// Compare the board with the current shape's template and update the score.
    pub fn check_solution(&mut self) -> CheckOutcome {
        let shape = &self.catalog.shapes()[self.current_shape];
        let shape_id = shape.id.clone();
        let difficulty = shape.difficulty;
        let report = self.matcher.check_detailed(&self.store, &shape.solution);

        let outcome = match &report.result {
            MatchResult::NoSolutionAvailable => CheckOutcome::UnsupportedShape { shape_id },
            MatchResult::Failed { .. } => CheckOutcome::TryAgain {
                result: report.result.clone(),
            },
            MatchResult::Solved if self.is_completed(&shape_id) => {
                CheckOutcome::RepeatSuccess { shape_id }
            }
            MatchResult::Solved => {
                let award = self.config.score.award(difficulty);
                self.score = self.score.saturating_add(award);
                self.completed.push(shape_id.clone());
                log::info!("shape {shape_id} solved, +{award} (score {})", self.score);
                CheckOutcome::FirstTimeSuccess { shape_id, award }
            }
        };

        self.events.notify(&SessionEvent::Checked {
            outcome: outcome.clone(),
            report,
        });
        if matches!(outcome, CheckOutcome::FirstTimeSuccess { .. }) {
            let snapshot = self.score_snapshot();
            self.events.notify(&SessionEvent::ScoreChanged(snapshot));
        }
        outcome
    }

    pub fn score_snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            score: self.score,
            completed_shape_ids: self.completed.clone(),
        }
    }

    pub fn progress(&self) -> Progress {
        let categories = Category::ALL
            .iter()
            .map(|&category| {
                let shapes: Vec<&Shape> = self.catalog.shapes_in(category).collect();
                CategoryProgress {
                    category,
                    completed: shapes.iter().filter(|s| self.is_completed(&s.id)).count(),
                    total: shapes.len(),
                }
            })
            .collect();
        Progress {
            completed: self.completed.len(),
            total: self.catalog.shapes().len(),
            categories,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_shape_id: self.current_shape().id.clone(),
            hint_visible: self.hint_visible,
            score: self.score,
            completed_shape_ids: self.completed.clone(),
            pieces: self.store.views(),
        }
    }
}

fn shape_index(catalog: &Catalog, shape_id: &str) -> Result<usize, UnknownShapeError> {
    let trimmed = shape_id.trim();
    catalog
        .shapes()
        .iter()
        .position(|s| s.id.eq_ignore_ascii_case(trimmed))
        .ok_or_else(|| UnknownShapeError(shape_id.to_string()))
}
