use super::unit_range::UnitRange;
use thiserror::Error;

/// Failures surfaced by the quiz state machine. None of them are fatal; each one
/// is stored in the machine's error slot and shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("Invalid unit selection '{0}'. Enter a unit (1-30) or a range like 1-10.")]
    InvalidUnitRange(String),
    #[error("Number of questions must be at least 1.")]
    InvalidQuestionCount,
    #[error("No questions found for units {0}.")]
    NoQuestionsForRange(UnitRange),
    #[error("Failed to load questions: {0}")]
    SourceFetch(String),
}

impl QuizError {
    /// Validation errors block `start()` until the settings are corrected.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidUnitRange(_) | Self::InvalidQuestionCount)
    }
}

/// Informational outcomes that are not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizNotice {
    NothingToRepeat,
}

impl QuizNotice {
    pub fn message(self) -> &'static str {
        match self {
            Self::NothingToRepeat => "No missed questions to repeat.",
        }
    }
}
