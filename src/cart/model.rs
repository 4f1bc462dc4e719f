use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 장바구니 라인 읽기 모델 ((user_id, material_id)가 키)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct CartItem {
    pub user_id: i64,
    pub material_id: i64,
    pub quantity: i64,
    pub added_at: DateTime<Utc>,
}
