use serde::Deserialize;

use crate::overlay_presenter::OverlayPosition;

/// Inbound control messages from other surfaces, a tagged union keyed on
/// `type`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlMessage {
    Update {
        text: String,
        confidence: f32,
        /// Optional auto-hide override in milliseconds
        #[serde(rename = "autoHide")]
        auto_hide: Option<u64>,
    },
    Show,
    Hide,
    Position {
        position: OverlayPosition,
    },
    Style {
        style: serde_json::Map<String, serde_json::Value>,
    },
}

/// Parse a raw message. Unknown or malformed shapes are ignored, not errors.
pub fn parse_control_message(raw: &str) -> Option<ControlMessage> {
    serde_json::from_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update() {
        let msg = parse_control_message(
            r#"{"type": "update", "text": "Hello!", "confidence": 0.9, "autoHide": 3000}"#,
        );
        assert_eq!(
            msg,
            Some(ControlMessage::Update {
                text: "Hello!".to_string(),
                confidence: 0.9,
                auto_hide: Some(3000),
            })
        );
    }

    #[test]
    fn test_parse_update_without_auto_hide() {
        let msg =
            parse_control_message(r#"{"type": "update", "text": "Hi", "confidence": 0.5}"#);
        assert!(matches!(
            msg,
            Some(ControlMessage::Update {
                auto_hide: None,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_show_hide_position() {
        assert_eq!(
            parse_control_message(r#"{"type": "show"}"#),
            Some(ControlMessage::Show)
        );
        assert_eq!(
            parse_control_message(r#"{"type": "hide"}"#),
            Some(ControlMessage::Hide)
        );
        assert_eq!(
            parse_control_message(r#"{"type": "position", "position": "top"}"#),
            Some(ControlMessage::Position {
                position: OverlayPosition::Top
            })
        );
    }

    #[test]
    fn test_unknown_shapes_ignored() {
        assert_eq!(parse_control_message(r#"{"type": "reboot"}"#), None);
        assert_eq!(parse_control_message(r#"{"text": "no type"}"#), None);
        assert_eq!(parse_control_message("not json"), None);
        assert_eq!(
            parse_control_message(r#"{"type": "position", "position": "center"}"#),
            None
        );
    }
}
