use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Conflict,
    Internal,
    #[serde(other)]
    Unknown,
}

/// Error body a catalog server may attach to a non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default = "unknown_code")]
    pub code: ErrorCode,
    #[serde(alias = "error")]
    pub message: String,
}

fn unknown_code() -> ErrorCode {
    ErrorCode::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerates_flask_style_error_bodies() {
        let parsed: ApiError =
            serde_json::from_str(r#"{"error":"title is required"}"#).expect("parse");
        assert_eq!(parsed.code, ErrorCode::Unknown);
        assert_eq!(parsed.message, "title is required");
    }

    #[test]
    fn unknown_codes_do_not_fail_decoding() {
        let parsed: ApiError =
            serde_json::from_str(r#"{"code":"teapot","message":"short and stout"}"#)
                .expect("parse");
        assert_eq!(parsed.code, ErrorCode::Unknown);
    }

    #[test]
    fn decodes_coded_error_bodies() {
        let parsed: ApiError =
            serde_json::from_str(r#"{"code":"not_found","message":"no book 7"}"#).expect("parse");
        assert_eq!(parsed.code, ErrorCode::NotFound);
        assert_eq!(parsed.message, "no book 7");
    }
}
