/// 주문 확정
/// 체크아웃 시점에 장바구니를 불변 스냅샷으로 고정하고,
/// 결제 결과에 따라 PENDING_PAYMENT -> PAID | FAILED 로 한 번만 전이한다.
/// 두 종료 상태 모두 되살릴 수 없다. 실패한 주문의 재시도는 새 체크아웃으로만 한다.
// region:    --- Imports
use super::cart::{Cart, Catalog};
use super::error::DomainError;
use super::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// endregion: --- Imports

// region:    --- Order Status

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PendingPayment,
    Paid,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "PENDING_PAYMENT",
            OrderStatus::Paid => "PAID",
            OrderStatus::Failed => "FAILED",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "PENDING_PAYMENT" => Some(OrderStatus::PendingPayment),
            "PAID" => Some(OrderStatus::Paid),
            "FAILED" => Some(OrderStatus::Failed),
            _ => None,
        }
    }

    /// 종료 상태 여부 (PAID, FAILED는 더 이상 전이하지 않는다)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::PendingPayment)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// endregion: --- Order Status

// region:    --- Payment Result

/// 결제 시도의 업무적 결과
/// 게이트웨이 장애는 여기 속하지 않는다. 장애는 전이 없이 별도 오류로 보고된다.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentResult {
    Approved { transaction_id: String },
    Declined { reason: String },
}

// endregion: --- Payment Result

// region:    --- Order

/// 주문 라인 스냅샷 (체크아웃 시점의 이름과 단가로 고정)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub material_id: i64,
    pub material_name: String,
    pub unit_price: Money,
    pub quantity: i64,
}

/// 주문 (체크아웃이 만든 불변 스냅샷)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    /// 저장 전에는 0
    pub id: i64,
    pub user_id: i64,
    pub lines: Vec<OrderLine>,
    pub subtotal: Money,
    pub status: OrderStatus,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 체크아웃: 장바구니를 주문 스냅샷으로 고정한다
/// 이후의 단가 변경은 이 주문에 영향을 주지 않는다.
pub fn begin_checkout(
    cart: &Cart,
    catalog: &impl Catalog,
    now: DateTime<Utc>,
) -> Result<Order, DomainError> {
    if cart.is_empty() {
        return Err(DomainError::EmptyCart);
    }

    let mut lines = Vec::with_capacity(cart.lines.len());
    let mut subtotal = Money::ZERO;
    for line in &cart.lines {
        let snapshot = catalog
            .material(line.material_id)
            .ok_or(DomainError::UnknownMaterial {
                material_id: line.material_id,
            })?;
        let line_total = snapshot.unit_price.multiply_by_qty(line.quantity)?;
        subtotal = subtotal.add(line_total)?;
        lines.push(OrderLine {
            material_id: line.material_id,
            material_name: snapshot.name,
            unit_price: snapshot.unit_price,
            quantity: line.quantity,
        });
    }

    Ok(Order {
        id: 0,
        user_id: cart.user_id,
        lines,
        subtotal,
        status: OrderStatus::PendingPayment,
        transaction_id: None,
        created_at: now,
    })
}

/// 결제 완료 전이
/// 결제 대기 상태에서만 전이한다. 종료 상태의 주문에 다시 호출하면
/// 스냅샷은 그대로 두고 InvalidOrderState를 보고한다 (이미 처리됨 신호).
pub fn complete_payment(order: &Order, result: PaymentResult) -> Result<Order, DomainError> {
    if order.status != OrderStatus::PendingPayment {
        return Err(DomainError::InvalidOrderState {
            status: order.status,
        });
    }

    let mut next = order.clone();
    match result {
        PaymentResult::Approved { transaction_id } => {
            next.status = OrderStatus::Paid;
            next.transaction_id = Some(transaction_id);
        }
        PaymentResult::Declined { .. } => {
            next.status = OrderStatus::Failed;
        }
    }
    Ok(next)
}

// endregion: --- Order

// region:    --- Tests


// endregion: --- Tests
