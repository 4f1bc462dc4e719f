/// 도메인 오류 분류
/// 검증 오류 / 상태 충돌 / 대상 없음을 구분해 HTTP 계층과 UI 안내("입력 수정" vs "재시도")가
/// 올바른 쪽으로 매핑할 수 있게 한다. 외부 협력자(DB/브로커/결제) 오류는 여기 속하지 않는다.
use super::auction::AuctionStatus;
use super::money::{Money, MoneyError};
use super::order::OrderStatus;
use thiserror::Error;

/// 오류 대분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    StateConflict,
    NotFound,
}

/// 도메인 규칙 위반 오류
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("수량은 1 이상이어야 합니다: {quantity}")]
    InvalidQuantity { quantity: i64 },

    #[error("최소 입찰 증가액은 0보다 커야 합니다")]
    InvalidIncrement,

    #[error("입찰 금액이 최소 입찰 가능 금액보다 낮습니다 (최소: {floor})")]
    BidTooLow { floor: Money },

    #[error("진행 중인 경매가 아닙니다 (상태: {status})")]
    AuctionNotActive { status: AuctionStatus },

    #[error("주문이 결제 대기 상태가 아닙니다 (상태: {status})")]
    InvalidOrderState { status: OrderStatus },

    #[error("자재를 찾을 수 없습니다: {material_id}")]
    UnknownMaterial { material_id: i64 },

    #[error("장바구니가 비어 있습니다")]
    EmptyCart,

    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl DomainError {
    /// 클라이언트용 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidQuantity { .. } => "INVALID_QUANTITY",
            DomainError::InvalidIncrement => "INVALID_INCREMENT",
            DomainError::BidTooLow { .. } => "BID_TOO_LOW",
            DomainError::AuctionNotActive { .. } => "AUCTION_NOT_ACTIVE",
            DomainError::InvalidOrderState { .. } => "INVALID_ORDER_STATE",
            DomainError::UnknownMaterial { .. } => "UNKNOWN_MATERIAL",
            DomainError::EmptyCart => "EMPTY_CART",
            DomainError::Money(_) => "INVALID_AMOUNT",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::InvalidQuantity { .. }
            | DomainError::InvalidIncrement
            | DomainError::EmptyCart
            | DomainError::Money(_) => ErrorKind::Validation,
            DomainError::BidTooLow { .. }
            | DomainError::AuctionNotActive { .. }
            | DomainError::InvalidOrderState { .. } => ErrorKind::StateConflict,
            DomainError::UnknownMaterial { .. } => ErrorKind::NotFound,
        }
    }
}
