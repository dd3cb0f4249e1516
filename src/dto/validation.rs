//! Validation of user-entered values before they are sent to a remote service.

use validator::{Validate, ValidationError, ValidationErrors};

use crate::dto::room::RoomRequest;

/// Longest accepted player name, in characters.
pub const MAX_PLAYER_NAME_CHARS: usize = 32;

/// Validates that a player name is non-blank, reasonably short and free of control characters.
///
/// # Examples
///
/// ```ignore
/// validate_player_name("Joey")   // Ok
/// validate_player_name("   ")    // Err - blank
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("player_name_blank");
        err.message = Some("Please enter your name".into());
        return Err(err);
    }

    let chars = name.chars().count();
    if chars > MAX_PLAYER_NAME_CHARS {
        let mut err = ValidationError::new("player_name_length");
        err.message = Some(
            format!("Name must be at most {MAX_PLAYER_NAME_CHARS} characters (got {chars})").into(),
        );
        return Err(err);
    }

    if name.chars().any(char::is_control) {
        let mut err = ValidationError::new("player_name_format");
        err.message = Some("Name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Longest accepted room identifier, in characters.
pub const MAX_ROOM_ID_CHARS: usize = 64;

/// Validates a room identifier. Identifiers are issued by the room service and
/// otherwise opaque, so only blank, oversized or control-laden values are refused.
pub fn validate_room_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        let mut err = ValidationError::new("room_id_blank");
        err.message = Some("Please enter the room ID".into());
        return Err(err);
    }

    let chars = id.chars().count();
    if chars > MAX_ROOM_ID_CHARS {
        let mut err = ValidationError::new("room_id_length");
        err.message = Some(
            format!("Room ID must be at most {MAX_ROOM_ID_CHARS} characters (got {chars})").into(),
        );
        return Err(err);
    }

    if id.chars().any(char::is_control) {
        let mut err = ValidationError::new("room_id_format");
        err.message = Some("Room ID must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Input collected before creating a room.
#[derive(Debug, Validate)]
pub struct CreateRoomInput {
    /// Name the player entered.
    #[validate(custom(function = "validate_player_name"))]
    pub player_name: String,
}

/// Input collected before joining a room.
#[derive(Debug, Validate)]
pub struct JoinRoomInput {
    /// Name the player entered.
    #[validate(custom(function = "validate_player_name"))]
    pub player_name: String,
    /// Room identifier received from the host.
    #[validate(custom(function = "validate_room_id"))]
    pub room_id: String,
}

/// Name and contact email collected once for the weekly challenge.
#[derive(Debug, Validate)]
pub struct RegistrationInput {
    /// Name to register.
    #[validate(custom(function = "validate_player_name"))]
    pub name: String,
    /// Contact email.
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
}

/// Incoming room requests are checked field by field, the same way client input is.
impl Validate for RoomRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let (player_name, room_id) = match self {
            RoomRequest::Create { player_name } => (Some(player_name), None),
            RoomRequest::Join {
                player_name,
                room_id,
            }
            | RoomRequest::SubmitScore {
                player_name,
                room_id,
                ..
            } => (Some(player_name), Some(room_id)),
            RoomRequest::CheckStatus { room_id } => (None, Some(room_id)),
        };

        if let Some(Err(err)) = player_name.map(|name| validate_player_name(name)) {
            errors.add("playerName", err);
        }
        if let Some(Err(err)) = room_id.map(|id| validate_room_id(id)) {
            errors.add("roomId", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_player_name() {
        assert!(validate_player_name("Joey").is_ok());
        assert!(validate_player_name("Rachel Green").is_ok());
        assert!(validate_player_name("").is_err());
        assert!(validate_player_name("   ").is_err());
        assert!(validate_player_name(&"x".repeat(33)).is_err());
        assert!(validate_player_name("bad\nname").is_err());
    }

    #[test]
    fn test_validate_room_id() {
        assert!(validate_room_id("4821").is_ok());
        assert!(validate_room_id("ab12").is_ok());
        assert!(validate_room_id("").is_err());
        assert!(validate_room_id("  ").is_err());
        assert!(validate_room_id("48\t21").is_err());
        assert!(validate_room_id(&"7".repeat(MAX_ROOM_ID_CHARS + 1)).is_err());
    }

    #[test]
    fn service_issued_room_ids_are_opaque() {
        assert!(validate_room_id("a1b2-c3d4").is_ok());
        assert!(validate_room_id("0f8fad5b-d9cb-469f-a165-70867728950e").is_ok());
        assert!(validate_room_id("room_42").is_ok());
    }

    #[test]
    fn join_input_reports_every_field() {
        let input = JoinRoomInput {
            player_name: String::new(),
            room_id: String::new(),
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("player_name"));
        assert!(fields.contains_key("room_id"));
    }

    #[test]
    fn room_requests_validate_their_fields() {
        let ok = RoomRequest::SubmitScore {
            room_id: "4821".into(),
            player_name: "Ross".into(),
            score: 80,
        };
        assert!(ok.validate().is_ok());

        let bad = RoomRequest::Join {
            player_name: " ".into(),
            room_id: "48\n21".into(),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("playerName"));
        assert!(fields.contains_key("roomId"));
    }

    #[test]
    fn registration_requires_email() {
        let input = RegistrationInput {
            name: "Monica".into(),
            email: "not-an-email".into(),
        };
        assert!(input.validate().is_err());

        let input = RegistrationInput {
            name: "Monica".into(),
            email: "monica@example.com".into(),
        };
        assert!(input.validate().is_ok());
    }
}
