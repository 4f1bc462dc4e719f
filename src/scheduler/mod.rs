/// 경매 상태 업데이트 스케줄러
/// 시작/종료 시각에 따른 PENDING -> ACTIVE -> ENDED 전환을 주기적으로 반영한다.
/// 관리자 조기 종료는 커맨드 경로(AuctionClosed 이벤트)로 별도 처리된다.
// region:    --- Imports
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error};

// endregion: --- Imports

// region:    --- Auction Scheduler

/// 경매 상태 업데이트 스케줄러
pub struct AuctionScheduler {
    pool: Arc<PgPool>,
}

impl AuctionScheduler {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// 경매 상태 업데이트 스케줄러 시작
    pub async fn start(&self) {
        let pool = Arc::clone(&self.pool);
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(1)); // 1초마다 실행
            loop {
                interval.tick().await;
                if let Err(e) = Self::update_auction_statuses(&pool).await {
                    error!(
                        "{:<12} --> 경매 상태 업데이트 중 오류 발생: {:?}",
                        "Scheduler", e
                    );
                }
            }
        });
    }

    /// 경매 상태 업데이트
    async fn update_auction_statuses(pool: &PgPool) -> Result<(), sqlx::Error> {
        let now = Utc::now();

        // PENDING -> ACTIVE 상태 변경
        sqlx::query(
            "UPDATE auctions SET status = 'ACTIVE'
             WHERE status = 'PENDING' AND start_time <= $1",
        )
        .bind(now)
        .execute(pool)
        .await?;

        // ACTIVE -> ENDED 상태 변경
        sqlx::query(
            "UPDATE auctions SET status = 'ENDED'
             WHERE status = 'ACTIVE' AND end_time <= $1",
        )
        .bind(now)
        .execute(pool)
        .await?;

        debug!(
            "{:<12} --> 경매 상태가 성공적으로 업데이트되었습니다.",
            "Scheduler"
        );

        Ok(())
    }
}
// endregion: --- Auction Scheduler
