// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::error::CommandError;
use crate::message_broker::{KafkaConsumer, KafkaProducer};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- Event Model

/// 이벤트 저장소에 저장되는 이벤트 모델
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Event {
    pub id: i64,
    pub aggregate_id: i64,
    pub event_type: String,
    pub data: serde_json::Value,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: i64,
}

// endregion: --- Event Model

// region:    --- Event Store Error

/// 이벤트 저장/발행 오류
/// 버전 충돌은 낙관적 동시성의 정상 경로이므로 별도 변형으로 구분한다
#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("버전 충돌")]
    VersionConflict,
    #[error("데이터베이스 오류: {0}")]
    Database(#[from] sqlx::Error),
    #[error("이벤트 직렬화 실패: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("메시지 브로커 오류: {0}")]
    Broker(String),
}

impl From<EventStoreError> for CommandError {
    fn from(e: EventStoreError) -> Self {
        match e {
            EventStoreError::VersionConflict => CommandError::RetryExhausted,
            EventStoreError::Database(e) => CommandError::from(e),
            EventStoreError::Serialization(e) => CommandError::Serialization(e),
            EventStoreError::Broker(msg) => CommandError::Broker(msg),
        }
    }
}

// endregion: --- Event Store Error

// region:    --- Event Store

/// 이벤트 저장소 트레이트
#[async_trait]
pub trait EventStore {
    async fn append_and_publish_event(&self, event: Event) -> Result<(), EventStoreError>;
}

/// 이벤트 저장소 구현체
pub struct PostgresEventStore {
    pool: Arc<PgPool>,
    kafka_producer: Arc<KafkaProducer>,
}

impl PostgresEventStore {
    pub fn new(pool: Arc<PgPool>, kafka_producer: Arc<KafkaProducer>) -> Self {
        Self {
            pool,
            kafka_producer,
        }
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    /// 이벤트 추가 및 발행
    /// (aggregate_id, version) 유일 제약이 집계별 compare-and-swap 역할을 한다.
    /// 같은 버전에 먼저 쓴 커맨드가 이기고, 진 커맨드는 버전 충돌을 받는다.
    async fn append_and_publish_event(&self, event: Event) -> Result<(), EventStoreError> {
        let event_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (aggregate_id, event_type, data, timestamp, version)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (aggregate_id, version) DO NOTHING
            RETURNING id",
        )
        .bind(event.aggregate_id)
        .bind(&event.event_type)
        .bind(&event.data)
        .bind(event.timestamp)
        .bind(event.version)
        .fetch_optional(&*self.pool)
        .await?
        .ok_or(EventStoreError::VersionConflict)?;

        // 이벤트를 카프카에 발행
        let stored = Event {
            id: event_id,
            ..event
        };
        self.kafka_producer
            .send_message(
                "events",
                &event_id.to_string(),
                &serde_json::to_string(&stored)?,
            )
            .await
            .map_err(|e| EventStoreError::Broker(e.to_string()))?;

        Ok(())
    }
}

// endregion: --- Event Store

// region:    --- Event Consumer

/// 이벤트를 읽기 모델로 접는 소비자
pub struct EventConsumer {
    pool: Arc<PgPool>,
    kafka_consumer: Arc<KafkaConsumer>,
}

impl EventConsumer {
    pub fn new(pool: Arc<PgPool>, kafka_consumer: Arc<KafkaConsumer>) -> Self {
        EventConsumer {
            pool,
            kafka_consumer,
        }
    }

    /// 이벤트 소싱 시작
    pub async fn start(&self) {
        let pool = Arc::clone(&self.pool);
        if let Err(e) = self
            .kafka_consumer
            .consume_events("events", move |event| {
                let pool = Arc::clone(&pool);
                Box::pin(async move {
                    if let Err(e) = Self::process_event(&pool, event).await {
                        error!("{:<12} --> 이벤트 처리 오류: {:?}", "EventConsume", e);
                    }
                    Ok(())
                })
            })
            .await
        {
            error!("{:<12} --> 이벤트 소비 오류: {:?}", "EventConsume", e);
        }
    }

    /// 이벤트 처리
    async fn process_event(pool: &PgPool, event: Event) -> Result<(), Box<dyn std::error::Error>> {
        match event.event_type.as_str() {
            "BidPlaced" => Self::handle_bid_placed(pool, &event).await?,
            "AuctionClosed" => Self::handle_auction_closed(pool, &event).await?,
            _ => warn!(
                "{:<12} --> 알 수 없는 이벤트 타입: {}",
                "EventConsume", event.event_type
            ),
        }
        Ok(())
    }

    /// 입찰 이벤트 처리
    /// 접는 시점에 하한가를 다시 검증한다. 구버전 읽기 모델을 보고 통과한
    /// 입찰이 이벤트 로그에 들어와도 읽기 모델은 절대 후퇴하지 않는다.
    async fn handle_bid_placed(pool: &PgPool, event: &Event) -> Result<(), sqlx::Error> {
        info!("{:<12} --> 입찰(BidPlaced)", "EventConsume");
        let bid_event: AuctionEvent = serde_json::from_value(event.data.clone())
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        if let AuctionEvent::BidPlaced {
            auction_id,
            bidder_id,
            bidder_name,
            amount,
            timestamp,
        } = bid_event
        {
            // 트랜잭션 시작
            let mut tx = pool.begin().await?;

            // 하한가 재검증 및 현재가 갱신
            let result = sqlx::query_scalar::<_, i64>(
                "UPDATE auctions SET current_bid = $1, highest_bidder_id = $2
                 WHERE id = $3
                   AND status = 'ACTIVE'
                   AND ((current_bid = 0 AND $1 >= starting_price)
                     OR (current_bid > 0 AND $1 >= current_bid + min_bid_increment))
                 RETURNING current_bid",
            )
            .bind(amount)
            .bind(bidder_id)
            .bind(auction_id)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(current_bid) = result {
                // 입찰 기록 추가
                sqlx::query(
                    "INSERT INTO bids (auction_id, bidder_id, bidder_name, amount, bid_time)
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(auction_id)
                .bind(bidder_id)
                .bind(&bidder_name)
                .bind(amount)
                .bind(timestamp)
                .execute(&mut *tx)
                .await?;

                // 트랜잭션 커밋
                tx.commit().await?;
                info!(
                    "{:<12} --> 입찰 반영 성공: 현재가 {}",
                    "EventConsume", current_bid
                );
            } else {
                // 롤백
                tx.rollback().await?;
                info!(
                    "{:<12} --> 입찰 반영 실패: 하한가 미달 또는 종료된 경매 (구버전 상태 기준 입찰)",
                    "EventConsume"
                );
            }
        }
        Ok(())
    }

    /// 경매 조기 종료 이벤트 처리
    async fn handle_auction_closed(pool: &PgPool, event: &Event) -> Result<(), sqlx::Error> {
        info!("{:<12} --> 경매 종료(AuctionClosed)", "EventConsume");
        let close_event: AuctionEvent = serde_json::from_value(event.data.clone())
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        if let AuctionEvent::AuctionClosed { auction_id, .. } = close_event {
            let result = sqlx::query_scalar::<_, i64>(
                "UPDATE auctions SET status = 'ENDED'
                 WHERE id = $1 AND status != 'ENDED'
                 RETURNING id",
            )
            .bind(auction_id)
            .fetch_optional(pool)
            .await?;

            if result.is_some() {
                info!(
                    "{:<12} --> 경매 종료 반영 성공: {}",
                    "EventConsume", auction_id
                );
            } else {
                info!(
                    "{:<12} --> 경매 종료 반영 생략: 이미 종료된 경매 {}",
                    "EventConsume", auction_id
                );
            }
        }
        Ok(())
    }
}

// endregion: --- Event Consumer
