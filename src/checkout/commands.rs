/// 체크아웃 커맨드 처리
/// 1. 체크아웃 (장바구니 → 주문 스냅샷)
/// 2. 결제 완료 (상태 전이 + 장바구니 1회 비우기)
///
/// 주문 스냅샷과 상태 전이는 도메인이 결정하고, 여기서는 그 결과를 한 트랜잭션으로
/// 반영한다. 결제 전이는 조건부 UPDATE로 커밋돼 중복 완료가 두 번 반영될 수 없다.
// region:    --- Imports
use crate::checkout::events::OrderEvent;
use crate::database::DatabaseManager;
use crate::domain::error::DomainError;
use crate::domain::order::{self, Order, OrderStatus, PaymentResult};
use crate::error::CommandError;
use crate::message_broker::KafkaProducer;
use crate::payment::PaymentGateway;
use crate::query::handlers;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands

/// 체크아웃 명령 (현재 장바구니를 사용한다)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CheckoutCommand {
    pub user_id: i64,
}

// 결제 알림 토픽
pub const ORDER_EVENTS_TOPIC: &str = "order-events";

/// 1. 체크아웃
/// 모든 라인의 자재 이름과 단가를 이 시점으로 고정한다. 이후 단가 변경은 주문에 영향이 없다.
pub async fn handle_checkout(
    cmd: CheckoutCommand,
    db_manager: &DatabaseManager,
) -> Result<Order, CommandError> {
    info!(
        "{:<12} --> 체크아웃 처리 시작: 사용자 {}",
        "Command", cmd.user_id
    );

    let (cart, catalog) = crate::cart::commands::load_cart(db_manager, cmd.user_id).await?;
    let now = Utc::now();

    // 빈 장바구니와 끊어진 참조는 여기서 거부된다
    let order = order::begin_checkout(&cart, &catalog, now)?;

    // 주문 + 라인 저장 (한 트랜잭션), 장바구니는 결제 성공 전까지 그대로 둔다
    let to_store = order.clone();
    let order_id = db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let order_id = sqlx::query_scalar::<_, i64>(
                    "INSERT INTO orders (user_id, subtotal, status, transaction_id, created_at, updated_at)
                     VALUES ($1, $2, $3, $4, $5, $5)
                     RETURNING id",
                )
                .bind(to_store.user_id)
                .bind(to_store.subtotal.paise())
                .bind(to_store.status.as_str())
                .bind(&to_store.transaction_id)
                .bind(to_store.created_at)
                .fetch_one(&mut **tx)
                .await?;

                for line in &to_store.lines {
                    sqlx::query(
                        "INSERT INTO order_lines (order_id, material_id, material_name, unit_price, quantity)
                         VALUES ($1, $2, $3, $4, $5)",
                    )
                    .bind(order_id)
                    .bind(line.material_id)
                    .bind(&line.material_name)
                    .bind(line.unit_price.paise())
                    .bind(line.quantity)
                    .execute(&mut **tx)
                    .await?;
                }
                Ok::<i64, sqlx::Error>(order_id)
            })
        })
        .await?;

    info!(
        "{:<12} --> 주문 생성 완료: 주문 {} / 소계 {}",
        "Command", order_id, order.subtotal
    );
    Ok(Order { id: order_id, ..order })
}

/// 2. 결제 완료
/// 게이트웨이 장애는 전이 없이 의존성 오류로 보고된다 (업무적 거절과 절대 섞지 않는다).
/// 이미 종료된 주문은 스냅샷과 장바구니를 건드리지 않고 상태 충돌을 보고한다.
pub async fn handle_complete_payment(
    order_id: i64,
    db_manager: &DatabaseManager,
    gateway: &dyn PaymentGateway,
    kafka_producer: &KafkaProducer,
) -> Result<Order, CommandError> {
    info!(
        "{:<12} --> 결제 완료 처리 시작: 주문 {}",
        "Command", order_id
    );

    // 주문 복원
    let order_row = handlers::get_order(db_manager, order_id).await?;
    let line_rows = handlers::get_order_lines(db_manager, order_id).await?;
    let order = order_row.to_domain(&line_rows)?;

    // 종료 상태면 게이트웨이를 호출하지 않는다 (재호출이 이중 과금으로 이어지면 안 된다)
    if order.status.is_terminal() {
        return Err(DomainError::InvalidOrderState {
            status: order.status,
        }
        .into());
    }

    // 결제 시도
    let result = gateway
        .charge(order.id, order.subtotal)
        .await
        .map_err(|e| CommandError::PaymentGateway(e.to_string()))?;
    let declined_reason = match &result {
        PaymentResult::Declined { reason } => Some(reason.clone()),
        PaymentResult::Approved { .. } => None,
    };

    // 도메인 상태 전이
    let next = order::complete_payment(&order, result)?;

    // 전이 반영 + 결제 성공 시 장바구니 비우기 (같은 트랜잭션, 조건부 UPDATE가 1회를 보장)
    let now = Utc::now();
    let next_status = next.status;
    let next_txn = next.transaction_id.clone();
    let user_id = next.user_id;
    let applied = db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let updated = sqlx::query_scalar::<_, i64>(
                    "UPDATE orders SET status = $1, transaction_id = $2, updated_at = $3
                     WHERE id = $4 AND status = 'PENDING_PAYMENT'
                     RETURNING id",
                )
                .bind(next_status.as_str())
                .bind(&next_txn)
                .bind(now)
                .bind(order_id)
                .fetch_optional(&mut **tx)
                .await?;

                if updated.is_none() {
                    return Ok(false);
                }
                if next_status == OrderStatus::Paid {
                    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
                        .bind(user_id)
                        .execute(&mut **tx)
                        .await?;
                }
                Ok::<bool, sqlx::Error>(true)
            })
        })
        .await?;

    // 경쟁에서 진 완료 시도: 다른 호출이 먼저 종료시켰다
    if !applied {
        let refreshed = handlers::get_order(db_manager, order_id).await?;
        let status = OrderStatus::parse(&refreshed.status).ok_or_else(|| {
            CommandError::CorruptState(format!(
                "주문 {}: 알 수 없는 상태 {}",
                order_id, refreshed.status
            ))
        })?;
        return Err(DomainError::InvalidOrderState { status }.into());
    }

    // 결제 결과 알림 발행 (커밋 이후이므로 발행 실패는 요청을 되돌리지 않는다)
    let event = match (&next.status, &next.transaction_id) {
        (OrderStatus::Paid, Some(transaction_id)) => OrderEvent::PaymentSucceeded {
            order_id,
            user_id,
            subtotal: next.subtotal.paise(),
            transaction_id: transaction_id.clone(),
            timestamp: now,
        },
        _ => OrderEvent::PaymentFailed {
            order_id,
            user_id,
            reason: declined_reason.unwrap_or_else(|| "결제 거절".to_string()),
            timestamp: now,
        },
    };
    let payload = serde_json::to_string(&event)?;
    if let Err(e) = kafka_producer
        .send_message(ORDER_EVENTS_TOPIC, &order_id.to_string(), &payload)
        .await
    {
        warn!("{:<12} --> 결제 알림 발행 실패: {}", "Command", e);
    }

    info!(
        "{:<12} --> 결제 완료 처리 종료: 주문 {} / 상태 {}",
        "Command", order_id, next.status
    );
    Ok(next)
}

// endregion: --- Commands
