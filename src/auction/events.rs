use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 경매 집계 이벤트 (이벤트 저장소에 기록되고 읽기 모델로 접힌다)
/// 금액은 파이사 단위 정수로 싣는다.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum AuctionEvent {
    // 입찰 이벤트
    BidPlaced {
        auction_id: i64,
        bidder_id: i64,
        bidder_name: String,
        amount: i64,
        timestamp: DateTime<Utc>,
    },
    // 관리자 조기 종료 이벤트
    AuctionClosed {
        auction_id: i64,
        timestamp: DateTime<Utc>,
    },
}
