/// 입찰 관련 커맨드 처리
/// 1. 입찰
/// 2. 관리자 조기 종료
///
/// 검증은 도메인 엔진의 순수 함수가 수행하고, 여기서는 최신 읽기 모델을 복원해
/// 넘겨준 뒤 이벤트 추가(버전 CAS)로 커밋한다. 버전 충돌이면 새 상태로 재시도한다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::database::DatabaseManager;
use crate::domain::auction::AuctionState;
use crate::domain::money::Money;
use crate::error::CommandError;
use crate::event_store::{Event, EventStore, EventStoreError};
use crate::query::handlers;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub bidder_id: i64,
    pub bidder_name: String,
    pub amount: Money,
}

/// 관리자 조기 종료 명령 (본문 없는 POST)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CloseAuctionCommand {
    pub auction_id: i64,
}

// 최대 재시도 횟수
const MAX_RETRIES: i32 = 100;

/// 1. 입찰
pub async fn handle_place_bid(
    auction_id: i64,
    cmd: PlaceBidCommand,
    event_store: &impl EventStore,
    db_manager: &DatabaseManager,
) -> Result<AuctionState, CommandError> {
    info!(
        "{:<12} --> 입찰 요청 처리 시작: 경매 {} / 입찰자 {} / {}",
        "Command", auction_id, cmd.bidder_id, cmd.amount
    );
    let mut retries = 0;

    while retries < MAX_RETRIES {
        // 현재 이벤트 버전 조회
        let current_version = handlers::get_auction_version(db_manager, auction_id).await?;

        // 최신 읽기 모델에서 도메인 상태 복원
        let auction_row = handlers::get_auction(db_manager, auction_id).await?;
        let bids = handlers::get_bid_history(db_manager, auction_id).await?;
        let auction = auction_row.to_domain(&bids)?;

        let now = Utc::now();

        // 순수 검증 및 적용 (저장된 상태 문자열이 아니라 현재 시각으로 상태를 다시 계산한다)
        let next = auction.place_bid(cmd.bidder_id, &cmd.bidder_name, cmd.amount, now)?;

        // 입찰 이벤트 생성
        let bid_event = AuctionEvent::BidPlaced {
            auction_id,
            bidder_id: cmd.bidder_id,
            bidder_name: cmd.bidder_name.clone(),
            amount: cmd.amount.paise(),
            timestamp: now,
        };

        let event = Event {
            id: 0,
            aggregate_id: auction_id,
            event_type: "BidPlaced".to_string(),
            data: serde_json::to_value(&bid_event)?,
            timestamp: now,
            version: current_version + 1,
        };

        // 이벤트 저장 및 발행
        match event_store.append_and_publish_event(event).await {
            Ok(_) => return Ok(next),
            Err(EventStoreError::VersionConflict) => {
                warn!(
                    "{:<12} --> 낙관적 업데이트로 인한 버전 충돌: 재시도",
                    "Command"
                );
                retries += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(CommandError::RetryExhausted)
}

/// 2. 관리자 조기 종료
pub async fn handle_close_auction(
    cmd: CloseAuctionCommand,
    event_store: &impl EventStore,
    db_manager: &DatabaseManager,
) -> Result<AuctionState, CommandError> {
    info!(
        "{:<12} --> 경매 조기 종료 처리 시작: {:?}",
        "Command", cmd
    );
    let mut retries = 0;

    while retries < MAX_RETRIES {
        // 현재 이벤트 버전 조회
        let current_version = handlers::get_auction_version(db_manager, cmd.auction_id).await?;

        // 최신 읽기 모델에서 도메인 상태 복원
        let auction_row = handlers::get_auction(db_manager, cmd.auction_id).await?;
        let bids = handlers::get_bid_history(db_manager, cmd.auction_id).await?;
        let auction = auction_row.to_domain(&bids)?;

        let now = Utc::now();

        // 이미 종료된 경매면 상태 충돌로 거부된다
        let next = auction.close(now)?;

        // 종료 이벤트 생성
        let close_event = AuctionEvent::AuctionClosed {
            auction_id: cmd.auction_id,
            timestamp: now,
        };

        let event = Event {
            id: 0,
            aggregate_id: cmd.auction_id,
            event_type: "AuctionClosed".to_string(),
            data: serde_json::to_value(&close_event)?,
            timestamp: now,
            version: current_version + 1,
        };

        // 이벤트 저장 및 발행
        match event_store.append_and_publish_event(event).await {
            Ok(_) => {
                info!(
                    "{:<12} --> AuctionClosed 이벤트가 성공적으로 저장되었습니다.",
                    "Command"
                );
                return Ok(next);
            }
            Err(EventStoreError::VersionConflict) => {
                retries += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(CommandError::RetryExhausted)
}

// endregion: --- Commands
