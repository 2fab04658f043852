//! JSON envelope output, matching the shape the HTTP layer serves.

use serde::Serialize;

use crate::error::Result;

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Print a `{ "success": true, "data": ... }` envelope.
pub fn print_success<T: Serialize>(data: T) -> Result<()> {
    let envelope = Envelope {
        success: true,
        data: Some(data),
        message: None,
    };
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

/// Print a `{ "success": false, "message": ... }` envelope to stderr.
pub fn print_failure(message: &str) {
    let envelope: Envelope<()> = Envelope {
        success: false,
        data: None,
        message: Some(message.to_string()),
    };
    // Serializing a flat string envelope cannot fail.
    if let Ok(json) = serde_json::to_string_pretty(&envelope) {
        eprintln!("{json}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let envelope = Envelope {
            success: true,
            data: Some(42),
            message: None,
        };
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(json, r#"{"success":true,"data":42}"#);
    }

    #[test]
    fn failure_envelope_shape() {
        let envelope: Envelope<()> = Envelope {
            success: false,
            data: None,
            message: Some("self-referral".to_string()),
        };
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(json, r#"{"success":false,"message":"self-referral"}"#);
    }
}
