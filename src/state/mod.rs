/// Cancellation tied to the owner of an operation.
pub mod lifetime;
/// Local quiz run state machine.
pub mod quiz_run;
/// Room session state machine.
pub mod session;

pub use self::lifetime::{CancelHandle, CancelToken, Cancelled, Lifetime};
pub use self::quiz_run::{
    AnswerOutcome, DEFAULT_QUESTION_SECONDS, QuizRun, RunError, RunPhase, RunSummary,
};
pub use self::session::{RoomSession, SessionEvent, SessionPhase, SessionRole};
