use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::auction::{self, AuctionState, AuctionStatus};
use crate::domain::cart::MaterialSnapshot;
use crate::domain::money::Money;
use crate::error::CommandError;

// 자재 모델 (재활용 원자재 / 업사이클 제품)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Material {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub unit_price: i64,
    pub unit: String,
    pub seller: String,
    pub created_at: DateTime<Utc>,
}

// 경매 읽기 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Auction {
    pub id: i64,
    pub material_id: i64,
    pub starting_price: i64,
    pub min_bid_increment: i64,
    pub current_bid: i64,
    pub highest_bidder_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

// 입찰 읽기 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_id: i64,
    pub bidder_name: String,
    pub amount: i64,
    pub bid_time: DateTime<Utc>,
}

/// 저장된 파이사 정수 → Money 복원 (음수면 저장 상태 손상)
fn stored_amount(what: &str, id: i64, value: i64) -> Result<Money, CommandError> {
    Money::from_paise(value)
        .map_err(|e| CommandError::CorruptState(format!("{} {}: {}", what, id, e)))
}

impl Material {
    /// 체크아웃/소계 계산용 스냅샷
    pub fn snapshot(&self) -> Result<MaterialSnapshot, CommandError> {
        Ok(MaterialSnapshot {
            material_id: self.id,
            name: self.name.clone(),
            unit_price: stored_amount("자재", self.id, self.unit_price)?,
        })
    }
}

impl Auction {
    /// 읽기 모델 행과 입찰 이력으로 도메인 상태를 복원한다
    pub fn to_domain(&self, bids: &[Bid]) -> Result<AuctionState, CommandError> {
        let bids = bids
            .iter()
            .map(|b| {
                Ok(auction::Bid {
                    id: b.id,
                    bidder_id: b.bidder_id,
                    bidder_name: b.bidder_name.clone(),
                    amount: stored_amount("입찰", b.id, b.amount)?,
                    bid_time: b.bid_time,
                })
            })
            .collect::<Result<Vec<_>, CommandError>>()?;

        Ok(AuctionState {
            id: self.id,
            material_id: self.material_id,
            starting_price: stored_amount("경매", self.id, self.starting_price)?,
            min_bid_increment: stored_amount("경매", self.id, self.min_bid_increment)?,
            current_bid: stored_amount("경매", self.id, self.current_bid)?,
            highest_bidder_id: self.highest_bidder_id,
            bids,
            start_time: self.start_time,
            end_time: self.end_time,
            // 타이머가 지나기 전에 ENDED로 저장됐다면 관리자 조기 종료다
            closed: self.status == AuctionStatus::Ended.as_str(),
        })
    }
}
