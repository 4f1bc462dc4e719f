/// 결제 게이트웨이 협력자
/// 실제 PG 연동은 범위 밖이므로 지연과 거절을 흉내 내는 모의 구현을 쓴다.
/// 전송 장애(GatewayError)와 업무적 거절(PaymentResult::Declined)은 별개다.
/// 장애는 주문 전이 없이 의존성 오류로 보고되고, 거절은 FAILED 전이로 이어진다.
// region:    --- Imports
use crate::domain::money::Money;
use crate::domain::order::PaymentResult;
use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::time::{sleep, Duration};
use tracing::info;

// endregion: --- Imports

// region:    --- Payment Gateway

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("결제 게이트웨이에 연결할 수 없습니다: {0}")]
    Unreachable(String),
}

/// 결제 게이트웨이 트레이트
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, order_id: i64, amount: Money) -> Result<PaymentResult, GatewayError>;
}

// endregion: --- Payment Gateway

// region:    --- Mock Gateway

/// 모의 결제 게이트웨이
pub struct MockPaymentGateway;

impl MockPaymentGateway {
    pub fn new() -> Self {
        MockPaymentGateway
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn charge(&self, order_id: i64, amount: Money) -> Result<PaymentResult, GatewayError> {
        info!(
            "{:<12} --> 결제 시도: 주문 {} / {}",
            "Payment", order_id, amount
        );

        // 네트워크 왕복 흉내
        sleep(Duration::from_millis(50)).await;

        // 파이사 끝자리가 123이면 거절하는 고정 규칙 (재현 가능한 테스트용)
        if amount.paise() % 1000 == 123 {
            info!("{:<12} --> 결제 거절: 주문 {}", "Payment", order_id);
            return Ok(PaymentResult::Declined {
                reason: "카드 한도 초과 (모의 거절)".to_string(),
            });
        }

        let transaction_id = format!("txn_{}_{}", order_id, Utc::now().timestamp_millis());
        info!(
            "{:<12} --> 결제 승인: 주문 {} / {}",
            "Payment", order_id, transaction_id
        );
        Ok(PaymentResult::Approved { transaction_id })
    }
}

// endregion: --- Mock Gateway

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_gateway_approves_with_transaction_id() {
        let gateway = MockPaymentGateway::new();
        let amount = Money::parse("135.00").unwrap();
        match gateway.charge(1, amount).await.unwrap() {
            PaymentResult::Approved { transaction_id } => {
                assert!(transaction_id.starts_with("txn_1_"));
            }
            other => panic!("승인을 기대했는데 {other:?}"),
        }
    }

    #[tokio::test]
    async fn mock_gateway_declines_on_fixed_rule() {
        let gateway = MockPaymentGateway::new();
        let amount = Money::from_paise(10_123).unwrap();
        match gateway.charge(2, amount).await.unwrap() {
            PaymentResult::Declined { reason } => assert!(!reason.is_empty()),
            other => panic!("거절을 기대했는데 {other:?}"),
        }
    }
}

// endregion: --- Tests
