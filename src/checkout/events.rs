use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 주문 결제 결과 알림 이벤트
/// 읽기 모델은 커맨드가 같은 트랜잭션에서 직접 갱신하므로,
/// 이 이벤트는 후속 소비자(정산/알림)를 위한 브로커 발행 전용이다.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum OrderEvent {
    PaymentSucceeded {
        order_id: i64,
        user_id: i64,
        subtotal: i64,
        transaction_id: String,
        timestamp: DateTime<Utc>,
    },
    PaymentFailed {
        order_id: i64,
        user_id: i64,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}
