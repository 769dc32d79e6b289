//! Local stroke builder: the stroke this participant is drawing right now.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pointer-down starts a provisional stroke (id 0) with the current tool
//! settings, pointer-move appends points, and pointer-up appends the final
//! point and hands the finished stroke to the commit coordinator. The
//! builder returns to `Idle` as soon as the stroke is handed off; it never
//! waits for the commit.
//!
//! ERROR HANDLING
//! ==============
//! Out-of-order calls are contract violations. They are rejected with a
//! `BuilderError` and leave the current state untouched, so a second
//! pointer-down can never replace a stroke that is still being drawn.

#[cfg(test)]
#[path = "builder_test.rs"]
mod builder_test;

use strokes::{PROVISIONAL_ID, Point, Stroke};

use crate::tools::ToolSettings;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuilderError {
    #[error("a stroke is already being drawn")]
    AlreadyBuilding,
    #[error("no stroke is being drawn")]
    NotBuilding,
    #[error("point ({x}, {y}) is not finite")]
    InvalidPoint { x: f64, y: f64 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum BuilderState {
    #[default]
    Idle,
    Building(Stroke),
}

#[derive(Debug, Default)]
pub struct StrokeBuilder {
    state: BuilderState,
}

impl StrokeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &BuilderState {
        &self.state
    }

    #[must_use]
    pub fn is_building(&self) -> bool {
        matches!(self.state, BuilderState::Building(_))
    }

    /// The in-progress provisional stroke, if any.
    #[must_use]
    pub fn provisional(&self) -> Option<&Stroke> {
        match &self.state {
            BuilderState::Building(stroke) => Some(stroke),
            BuilderState::Idle => None,
        }
    }

    /// Begin a new provisional stroke at `point`.
    ///
    /// # Errors
    ///
    /// [`BuilderError::AlreadyBuilding`] if a stroke is in progress,
    /// [`BuilderError::InvalidPoint`] for non-finite coordinates.
    pub fn start(&mut self, tools: &ToolSettings, point: Point) -> Result<(), BuilderError> {
        if self.is_building() {
            return Err(BuilderError::AlreadyBuilding);
        }
        check_point(point)?;
        self.state = BuilderState::Building(Stroke {
            id: PROVISIONAL_ID,
            red: tools.color.red,
            green: tools.color.green,
            blue: tools.color.blue,
            alpha: tools.alpha,
            width: tools.stroke_width,
            points: vec![point],
        });
        Ok(())
    }

    /// Append `point` to the stroke in progress.
    ///
    /// # Errors
    ///
    /// [`BuilderError::NotBuilding`] when idle, [`BuilderError::InvalidPoint`]
    /// for non-finite coordinates.
    pub fn move_to(&mut self, point: Point) -> Result<(), BuilderError> {
        check_point(point)?;
        match &mut self.state {
            BuilderState::Building(stroke) => {
                stroke.points.push(point);
                Ok(())
            }
            BuilderState::Idle => Err(BuilderError::NotBuilding),
        }
    }

    /// Append the final `point`, return the completed stroke, and go idle.
    ///
    /// # Errors
    ///
    /// [`BuilderError::NotBuilding`] when idle, [`BuilderError::InvalidPoint`]
    /// for non-finite coordinates. State is unchanged on error.
    pub fn end(&mut self, point: Point) -> Result<Stroke, BuilderError> {
        check_point(point)?;
        match std::mem::take(&mut self.state) {
            BuilderState::Building(mut stroke) => {
                stroke.points.push(point);
                Ok(stroke)
            }
            BuilderState::Idle => Err(BuilderError::NotBuilding),
        }
    }

    /// Drop any stroke in progress without committing it.
    pub fn discard(&mut self) -> Option<Stroke> {
        match std::mem::take(&mut self.state) {
            BuilderState::Building(stroke) => Some(stroke),
            BuilderState::Idle => None,
        }
    }
}

fn check_point(point: Point) -> Result<(), BuilderError> {
    if point.is_finite() {
        Ok(())
    } else {
        Err(BuilderError::InvalidPoint { x: point.x, y: point.y })
    }
}
