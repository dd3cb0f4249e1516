use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Content endpoint payloads.
pub mod content;
/// Question union shared by every mode.
pub mod question;
/// Room Service contract.
pub mod room;
/// Checks on user-entered values.
pub mod validation;

pub use self::question::{OptionsQuestion, Question, QuoteQuestion};
pub use self::room::{ErrorCode, PlayerScore, ResponseError, RoomRequest, ServiceMessage};

/// Render a wall-clock timestamp as RFC 3339 for display and logs.
pub fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
