use crate::gateway::GatewayError;
use crate::roster::RosterError;
use crate::sheet::SheetError;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use tracing::error;

/// Shown when the board API could not be reached or answered garbage.
pub const CONNECTION_FAILED: &str = "サーバーとの通信に失敗しました";

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Rejected(reason) => Self::bad_request(reason),
            GatewayError::Storage(io) => Self::internal(io),
            other => {
                error!("board API call failed: {other}");
                Self::bad_gateway(CONNECTION_FAILED)
            }
        }
    }
}

impl From<SheetError> for AppError {
    fn from(err: SheetError) -> Self {
        match err {
            SheetError::Unsupported(name) => {
                Self::bad_request(format!("対応していないファイル形式です: {name}"))
            }
            other => {
                error!("spreadsheet read failed: {other}");
                Self::bad_request("Excelファイルの読み込みに失敗しました")
            }
        }
    }
}

impl From<RosterError> for AppError {
    fn from(err: RosterError) -> Self {
        let message = match &err {
            RosterError::MissingColumn(column) => format!("「{column}」列が見つかりません"),
            RosterError::NoScheduledRows => "出勤予のデータが見つかりませんでした".to_string(),
            RosterError::MalformedTime { name, .. } => format!("{name}の出勤時間が読み取れません"),
        };
        Self::bad_request(message)
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self::bad_request(format!("アップロードを受け取れませんでした: {err}"))
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(json!({ "success": false, "error": self.message }));
        (self.status, body).into_response()
    }
}
