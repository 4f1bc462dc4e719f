/// 경매 엔진
/// 입찰 검증과 적용은 순수 함수로 두고, 저장/발행은 커맨드 계층이 검증 이후에 수행한다.
/// 현재 시각(now)은 항상 호출자가 주입한다. 엔진은 자체 타이머를 갖지 않는다.
// region:    --- Imports
use super::error::DomainError;
use super::money::Money;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// endregion: --- Imports

// region:    --- Auction Status

/// 경매 상태 (시각 기준으로 매번 재계산한다)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Pending,
    Active,
    Ended,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Pending => "PENDING",
            AuctionStatus::Active => "ACTIVE",
            AuctionStatus::Ended => "ENDED",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "PENDING" => Some(AuctionStatus::Pending),
            "ACTIVE" => Some(AuctionStatus::Active),
            "ENDED" => Some(AuctionStatus::Ended),
            _ => None,
        }
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// endregion: --- Auction Status

// region:    --- Bid

/// 입찰 기록 (생성 이후 불변)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    /// 저장 전에는 0, 읽기 모델 반영 시 확정된다
    pub id: i64,
    pub bidder_id: i64,
    pub bidder_name: String,
    pub amount: Money,
    pub bid_time: DateTime<Utc>,
}

// endregion: --- Bid

// region:    --- Auction State

/// 경매 집계 상태
/// 불변식: current_bid == 0 XOR bids 비어있지 않음,
/// current_bid(0이 아닐 때) == bids[0].amount,
/// bids는 최신순이며 금액이 제출 순서대로 순증가(동액 제출은 저장 전에 거부)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuctionState {
    pub id: i64,
    pub material_id: i64,
    pub starting_price: Money,
    pub min_bid_increment: Money,
    /// 0이면 아직 입찰 없음
    pub current_bid: Money,
    pub highest_bidder_id: Option<i64>,
    /// 최신 입찰이 맨 앞
    pub bids: Vec<Bid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// 관리자 조기 종료 여부
    pub closed: bool,
}

impl AuctionState {
    /// 새 경매 생성 (입찰 이력 없음)
    pub fn new(
        id: i64,
        material_id: i64,
        starting_price: Money,
        min_bid_increment: Money,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if min_bid_increment.is_zero() {
            return Err(DomainError::InvalidIncrement);
        }
        Ok(AuctionState {
            id,
            material_id,
            starting_price,
            min_bid_increment,
            current_bid: Money::ZERO,
            highest_bidder_id: None,
            bids: Vec::new(),
            start_time,
            end_time,
            closed: false,
        })
    }

    /// 시각 기준 상태 계산 (저장된 상태를 신뢰하지 않는다)
    pub fn status(&self, now: DateTime<Utc>) -> AuctionStatus {
        if self.closed || now >= self.end_time {
            AuctionStatus::Ended
        } else if now < self.start_time {
            AuctionStatus::Pending
        } else {
            AuctionStatus::Active
        }
    }

    /// 새 입찰이 넘어야 하는 하한가
    /// 첫 입찰은 시작가, 이후에는 현재가 + 최소 증가액
    pub fn bid_floor(&self) -> Money {
        if self.current_bid.is_zero() {
            self.starting_price
        } else {
            // 파이사 정수 합이므로 현실적인 경매 금액 범위에서 넘치지 않는다
            self.current_bid
                .add(self.min_bid_increment)
                .unwrap_or(self.current_bid)
        }
    }

    /// 입찰 적용
    /// 성공 시 입력은 건드리지 않고 새 상태를 반환한다. 호출자는 반환값으로 갈아탄다.
    pub fn place_bid(
        &self,
        bidder_id: i64,
        bidder_name: &str,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<AuctionState, DomainError> {
        let status = self.status(now);
        if status != AuctionStatus::Active {
            return Err(DomainError::AuctionNotActive { status });
        }
        let floor = self.bid_floor();
        if amount < floor {
            return Err(DomainError::BidTooLow { floor });
        }

        let mut next = self.clone();
        next.bids.insert(
            0,
            Bid {
                id: 0,
                bidder_id,
                bidder_name: bidder_name.to_string(),
                amount,
                bid_time: now,
            },
        );
        next.current_bid = amount;
        next.highest_bidder_id = Some(bidder_id);
        Ok(next)
    }

    /// 관리자 조기 종료
    pub fn close(&self, now: DateTime<Utc>) -> Result<AuctionState, DomainError> {
        let status = self.status(now);
        if status == AuctionStatus::Ended {
            return Err(DomainError::AuctionNotActive { status });
        }
        let mut next = self.clone();
        next.closed = true;
        Ok(next)
    }

    /// 종료까지 남은 시간 (표시용 카운트다운, 호출자가 주기적으로 다시 읽는다)
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        if self.closed || now >= self.end_time {
            Duration::zero()
        } else {
            self.end_time - now
        }
    }
}

// endregion: --- Auction State

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    fn money(text: &str) -> Money {
        Money::parse(text).unwrap()
    }

    fn active_auction() -> AuctionState {
        let now = Utc::now();
        AuctionState::new(
            1,
            10,
            money("0.60"),
            money("0.05"),
            now - Duration::minutes(5),
            now + Duration::hours(1),
        )
        .unwrap()
    }

    #[test]
    fn bid_ladder_enforces_floor() {
        let now = Utc::now();
        let auction = active_auction();

        // 시작가 미달
        let err = auction.place_bid(1, "Asha", money("0.55"), now).unwrap_err();
        assert_eq!(err, DomainError::BidTooLow { floor: money("0.60") });

        // 시작가와 같은 첫 입찰은 허용
        let auction = auction.place_bid(1, "Asha", money("0.60"), now).unwrap();
        assert_eq!(auction.current_bid, money("0.60"));
        assert_eq!(auction.highest_bidder_id, Some(1));

        // 하한가는 0.65로 올라갔다
        let err = auction.place_bid(2, "Ravi", money("0.62"), now).unwrap_err();
        assert_eq!(err, DomainError::BidTooLow { floor: money("0.65") });

        let auction = auction.place_bid(2, "Ravi", money("0.65"), now).unwrap();
        assert_eq!(auction.current_bid, money("0.65"));
        assert_eq!(auction.bids.len(), 2);
    }

    #[test]
    fn ended_auction_rejects_any_bid() {
        let now = Utc::now();
        let mut auction = active_auction();
        auction.end_time = now - Duration::seconds(1);

        assert_eq!(auction.status(now), AuctionStatus::Ended);
        let err = auction
            .place_bid(1, "Asha", money("999.00"), now)
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::AuctionNotActive {
                status: AuctionStatus::Ended
            }
        );
    }

    #[test]
    fn pending_auction_rejects_bids() {
        let now = Utc::now();
        let mut auction = active_auction();
        auction.start_time = now + Duration::minutes(10);

        assert_eq!(auction.status(now), AuctionStatus::Pending);
        assert!(auction.place_bid(1, "Asha", money("0.60"), now).is_err());
    }

    #[test]
    fn close_forces_ended_and_blocks_bids() {
        let now = Utc::now();
        let auction = active_auction().close(now).unwrap();
        assert_eq!(auction.status(now), AuctionStatus::Ended);
        assert_eq!(auction.time_remaining(now), Duration::zero());
        assert!(auction.place_bid(1, "Asha", money("1.00"), now).is_err());

        // 이미 종료된 경매는 다시 종료할 수 없다
        assert!(auction.close(now).is_err());
    }

    #[test]
    fn place_bid_returns_new_state_without_mutating_input() {
        let now = Utc::now();
        let auction = active_auction();
        let next = auction.place_bid(1, "Asha", money("0.60"), now).unwrap();

        assert_eq!(auction.current_bid, Money::ZERO);
        assert!(auction.bids.is_empty());
        assert_eq!(next.bids.len(), 1);
        assert_eq!(next.bids[0].amount, next.current_bid);
    }

    /// 무작위에 가까운 입찰 시도 시퀀스를 재생해도
    /// 수락된 입찰은 항상 하한가 이상이고 이력은 최신순 순감소를 유지한다
    #[test]
    fn replayed_bid_attempts_never_violate_floor() {
        let now = Utc::now();
        let mut auction = active_auction();
        let mut seed: u64 = 0x9E37_79B9;

        for round in 0..200 {
            seed = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            // 하한가 주변 금액을 고르게 시도한다 (-50 ~ +149 파이사)
            let offset = (seed >> 33) as i64 % 200 - 50;
            let floor = auction.bid_floor();
            let attempt = floor.paise() + offset;
            if attempt < 0 {
                continue;
            }
            let amount = Money::from_paise(attempt).unwrap();

            match auction.place_bid(round, "bidder", amount, now) {
                Ok(next) => {
                    assert!(amount >= floor);
                    assert_eq!(next.current_bid, amount);
                    assert_eq!(next.bids[0].amount, amount);
                    auction = next;
                }
                Err(DomainError::BidTooLow { floor: reported }) => {
                    assert!(amount < reported);
                    assert_eq!(reported, floor);
                }
                Err(other) => panic!("예상 밖의 오류: {other:?}"),
            }
        }

        // 이력 전체가 최신순 순감소인지 확인
        assert!(!auction.bids.is_empty());
        for window in auction.bids.windows(2) {
            assert!(window[0].amount > window[1].amount);
        }
        assert_eq!(auction.current_bid, auction.bids[0].amount);
    }

    #[test]
    fn time_remaining_counts_down_and_floors_at_zero() {
        let now = Utc::now();
        let mut auction = active_auction();
        auction.end_time = now + Duration::seconds(90);

        assert_eq!(auction.time_remaining(now), Duration::seconds(90));
        assert_eq!(
            auction.time_remaining(now + Duration::seconds(200)),
            Duration::zero()
        );
    }
}

// endregion: --- Tests
