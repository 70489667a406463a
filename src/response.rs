use axum::http::StatusCode;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Detail entry carried in the `errors` array of a failure envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub timestamp: String,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>, path: Option<String>) -> Self {
        Self {
            message: message.into(),
            path,
            timestamp: now_rfc3339(),
        }
    }
}

/// Uniform wrapper around every API response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    pub path: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorDetail>>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, message: &str, path: &str, status: StatusCode) -> Self {
        Self {
            success: true,
            status_code: status.as_u16(),
            message: message.to_string(),
            path: path.to_string(),
            timestamp: now_rfc3339(),
            data: Some(data),
            errors: None,
        }
    }
}

impl ApiResponse<()> {
    /// Success envelope without a payload (e.g. delete).
    pub fn empty(message: &str, path: &str, status: StatusCode) -> Self {
        Self {
            success: true,
            status_code: status.as_u16(),
            message: message.to_string(),
            path: path.to_string(),
            timestamp: now_rfc3339(),
            data: None,
            errors: None,
        }
    }

    pub fn failure(
        message: &str,
        path: &str,
        status: StatusCode,
        errors: Vec<ErrorDetail>,
    ) -> Self {
        Self {
            success: false,
            status_code: status.as_u16(),
            message: message.to_string(),
            path: path.to_string(),
            timestamp: now_rfc3339(),
            data: None,
            errors: Some(errors),
        }
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let env = ApiResponse::success(
            serde_json::json!({"id": 1}),
            "User retrieved successfully",
            "/users/1",
            StatusCode::OK,
        );
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["path"], "/users/1");
        assert_eq!(json["data"]["id"], 1);
        assert!(json.get("errors").is_none());
        // RFC 3339 timestamps carry a date-time separator
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn empty_envelope_skips_data() {
        let env = ApiResponse::empty("User deleted successfully", "/users/1", StatusCode::OK);
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("data").is_none());
    }

    #[test]
    fn failure_envelope_carries_detail() {
        let env = ApiResponse::failure(
            "Failed to create user",
            "/users",
            StatusCode::BAD_REQUEST,
            vec![ErrorDetail::new("duplicate key", Some("/users".into()))],
        );
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["statusCode"], 400);
        assert_eq!(json["errors"][0]["message"], "duplicate key");
        // low-level text stays in errors[], not in the top-level message
        assert_eq!(json["message"], "Failed to create user");
    }
}
