/// 커맨드/쿼리 계층 오류와 HTTP 매핑
/// 업무 규칙 거부(검증/상태 충돌/대상 없음)와 외부 협력자 장애(DB/브로커/결제)를
/// 항상 구분해 내보낸다. 클라이언트는 이 구분으로 "입력 수정"과 "재시도"를 나눈다.
// region:    --- Imports
use crate::domain::error::{DomainError, ErrorKind};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

// endregion: --- Imports

// region:    --- Command Error

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("대상을 찾을 수 없습니다: {0}")]
    NotFound(String),

    /// 저장된 상태가 도메인 불변식을 깨는 경우 (조용히 넘어가지 않는다)
    #[error("저장된 상태가 손상되었습니다: {0}")]
    CorruptState(String),

    #[error("이벤트 직렬화 실패: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("데이터베이스 오류: {0}")]
    Database(sqlx::Error),

    #[error("메시지 브로커 오류: {0}")]
    Broker(String),

    #[error("결제 게이트웨이 오류: {0}")]
    PaymentGateway(String),

    #[error("최대 재시도 횟수 초과")]
    RetryExhausted,
}

impl From<sqlx::Error> for CommandError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => {
                CommandError::NotFound("요청한 대상이 없습니다".to_string())
            }
            other => CommandError::Database(other),
        }
    }
}

impl CommandError {
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::Domain(e) => e.code(),
            CommandError::NotFound(_) => "NOT_FOUND",
            CommandError::CorruptState(_) => "CORRUPT_STATE",
            CommandError::Serialization(_) => "SERIALIZATION_ERROR",
            CommandError::Database(_) => "DATABASE_ERROR",
            CommandError::Broker(_) => "BROKER_ERROR",
            CommandError::PaymentGateway(_) => "PAYMENT_GATEWAY_ERROR",
            CommandError::RetryExhausted => "MAX_RETRIES_EXCEEDED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CommandError::Domain(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::StateConflict => StatusCode::CONFLICT,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
            },
            CommandError::NotFound(_) => StatusCode::NOT_FOUND,
            CommandError::CorruptState(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CommandError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CommandError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CommandError::Broker(_) | CommandError::PaymentGateway(_) => StatusCode::BAD_GATEWAY,
            CommandError::RetryExhausted => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{:<12} --> 처리 실패: {:?}", "Error", self);
        }
        let mut body = json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        // 하한가는 클라이언트가 안내 문구에 쓸 수 있게 따로 싣는다
        if let CommandError::Domain(DomainError::BidTooLow { floor }) = &self {
            body["floor"] = json!(floor);
        }
        (status, Json(body)).into_response()
    }
}

// endregion: --- Command Error
