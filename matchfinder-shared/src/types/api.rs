use serde::{Deserialize, Serialize};

/// Error body returned by every failing request.
///
/// ```json
/// { "detail": "Match is full", "code": "E1002" }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub detail: String,
    pub code: String,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            code: code.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
}

impl HealthResponse {
    pub fn ok(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Ok,
            service: service.into(),
            version: version.into(),
        }
    }
}
