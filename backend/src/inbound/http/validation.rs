//! Shared validation helpers for inbound HTTP adapters.
//!
//! Errors carry a `field`/`code` details object so clients can attach
//! messages to form fields.

use serde_json::json;

use crate::domain::{DoseStatus, Error};

/// Error for a field missing from the request payload.
pub(crate) fn missing_field_error(field: &'static str) -> Error {
    Error::invalid_request(format!("{field} is required")).with_details(json!({
        "field": field,
        "code": "missing_field",
    }))
}

/// Parse a dose status from its wire value.
pub(crate) fn parse_status(value: &str, field: &'static str) -> Result<DoseStatus, Error> {
    value.parse::<DoseStatus>().map_err(|_| {
        Error::invalid_request("status must be pendente, aplicada, atrasada, or cancelada")
            .with_details(json!({
                "field": field,
                "value": value,
                "code": "invalid_status",
            }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_names_the_field() {
        let err = missing_field_error("nome");
        let details = err.details.expect("details");
        assert_eq!(details["field"], "nome");
        assert_eq!(details["code"], "missing_field");
    }

    #[test]
    fn parse_status_accepts_wire_values() {
        assert_eq!(
            parse_status("aplicada", "status").expect("known status"),
            DoseStatus::Applied
        );
    }

    #[test]
    fn parse_status_reports_offending_value() {
        let err = parse_status("done", "status").unwrap_err();
        assert_eq!(err.details.expect("details")["value"], "done");
    }
}
