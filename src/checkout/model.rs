use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::money::Money;
use crate::domain::order::{Order, OrderLine, OrderStatus};
use crate::error::CommandError;

// 주문 읽기 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct OrderRow {
    pub id: i64,
    pub user_id: i64,
    pub subtotal: i64,
    pub status: String,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// 주문 라인 읽기 모델 (체크아웃 시점 스냅샷)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct OrderLineRow {
    pub id: i64,
    pub order_id: i64,
    pub material_id: i64,
    pub material_name: String,
    pub unit_price: i64,
    pub quantity: i64,
}

fn stored_amount(order_id: i64, value: i64) -> Result<Money, CommandError> {
    Money::from_paise(value)
        .map_err(|e| CommandError::CorruptState(format!("주문 {}: {}", order_id, e)))
}

impl OrderRow {
    /// 저장된 행 → 도메인 주문 복원
    pub fn to_domain(&self, lines: &[OrderLineRow]) -> Result<Order, CommandError> {
        let status = OrderStatus::parse(&self.status).ok_or_else(|| {
            CommandError::CorruptState(format!(
                "주문 {}: 알 수 없는 상태 {}",
                self.id, self.status
            ))
        })?;

        let lines = lines
            .iter()
            .map(|l| {
                Ok(OrderLine {
                    material_id: l.material_id,
                    material_name: l.material_name.clone(),
                    unit_price: stored_amount(self.id, l.unit_price)?,
                    quantity: l.quantity,
                })
            })
            .collect::<Result<Vec<_>, CommandError>>()?;

        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            lines,
            subtotal: stored_amount(self.id, self.subtotal)?,
            status,
            transaction_id: self.transaction_id.clone(),
            created_at: self.created_at,
        })
    }
}
