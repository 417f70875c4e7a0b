pub mod error;
pub mod formatter;
pub mod session;
pub mod shuffle;
pub mod unit_range;

pub use error::{QuizError, QuizNotice};
pub use formatter::{FormatterOptions, Question};
pub use session::{AnswerState, LoadRequest, PhaseKind, QuizMachine, QuizSettings, QuizSnapshot};
pub use unit_range::UnitRange;
