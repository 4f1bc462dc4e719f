// region:    --- Imports
use crate::bidding::commands::{
    handle_close_auction as command_handle_close_auction,
    handle_place_bid as command_handle_place_bid, CloseAuctionCommand, PlaceBidCommand,
};
use crate::bidding::model::Material;
use crate::cart::commands::{self as cart_commands, AddToCartCommand, UpdateQuantityCommand};
use crate::checkout::commands::{self as checkout_commands, CheckoutCommand};
use crate::database::DatabaseManager;
use crate::domain::auction::{AuctionState, AuctionStatus};
use crate::domain::money::Money;
use crate::error::CommandError;
use crate::event_store::PostgresEventStore;
use crate::message_broker::KafkaProducer;
use crate::payment::PaymentGateway;
use crate::query;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- App State

pub type AppState = (
    Arc<DatabaseManager>,
    Arc<KafkaProducer>,
    Arc<dyn PaymentGateway>,
);

/// 사용자 식별 쿼리 파라미터 (본문이 없는 요청용)
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: i64,
}

// endregion: --- App State

// region:    --- Views

/// 경매 응답 뷰: 도메인 상태에 파생 값(상태, 남은 시간)을 붙인다
#[derive(Debug, Serialize)]
pub struct AuctionView {
    #[serde(flatten)]
    pub auction: AuctionState,
    pub status: AuctionStatus,
    pub time_remaining_seconds: i64,
}

impl AuctionView {
    pub fn from_state(auction: AuctionState, now: DateTime<Utc>) -> Self {
        let status = auction.status(now);
        let time_remaining_seconds = auction.time_remaining(now).num_seconds();
        AuctionView {
            auction,
            status,
            time_remaining_seconds,
        }
    }
}

/// 자재 응답 뷰 (금액은 루피 소수 표기로 나간다)
#[derive(Debug, Serialize)]
pub struct MaterialView {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub unit_price: Money,
    pub unit: String,
    pub seller: String,
    pub created_at: DateTime<Utc>,
}

impl MaterialView {
    fn from_row(material: Material) -> Result<Self, CommandError> {
        let unit_price = Money::from_paise(material.unit_price)
            .map_err(|e| CommandError::CorruptState(format!("자재 {}: {}", material.id, e)))?;
        Ok(MaterialView {
            id: material.id,
            name: material.name,
            category: material.category,
            description: material.description,
            unit_price,
            unit: material.unit,
            seller: material.seller,
            created_at: material.created_at,
        })
    }
}

// endregion: --- Views

// region:    --- Command Handlers

/// 입찰 요청 처리
pub async fn handle_place_bid(
    State((db_manager, kafka_producer, _)): State<AppState>,
    Path(auction_id): Path<i64>,
    Json(cmd): Json<PlaceBidCommand>,
) -> Result<impl IntoResponse, CommandError> {
    info!(
        "{:<12} --> 입찰 요청 수신: 경매 {} / {:?}",
        "Command", auction_id, cmd
    );

    // 이벤트 저장소 생성
    let event_store =
        PostgresEventStore::new(db_manager.get_pool(), Arc::clone(&kafka_producer));

    let next = command_handle_place_bid(auction_id, cmd, &event_store, &db_manager).await?;

    Ok(Json(json!({
        "message": "입찰이 성공적으로 처리되었습니다.",
        "auction": AuctionView::from_state(next, Utc::now()),
    })))
}

/// 경매 조기 종료 요청 처리
pub async fn handle_close_auction(
    State((db_manager, kafka_producer, _)): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse, CommandError> {
    info!(
        "{:<12} --> 경매 조기 종료 요청 수신: {}",
        "Command", auction_id
    );

    // 이벤트 저장소 생성
    let event_store =
        PostgresEventStore::new(db_manager.get_pool(), Arc::clone(&kafka_producer));

    let cmd = CloseAuctionCommand { auction_id };
    let next = command_handle_close_auction(cmd, &event_store, &db_manager).await?;

    Ok(Json(json!({
        "message": "경매가 종료되었습니다.",
        "auction": AuctionView::from_state(next, Utc::now()),
    })))
}

/// 장바구니 담기 요청 처리
pub async fn handle_add_to_cart(
    State((db_manager, _, _)): State<AppState>,
    Json(cmd): Json<AddToCartCommand>,
) -> Result<impl IntoResponse, CommandError> {
    let view = cart_commands::handle_add_to_cart(cmd, &db_manager).await?;
    Ok(Json(view))
}

/// 장바구니 수량 변경 요청 처리
pub async fn handle_update_cart_item(
    State((db_manager, _, _)): State<AppState>,
    Path(material_id): Path<i64>,
    Json(cmd): Json<UpdateQuantityCommand>,
) -> Result<impl IntoResponse, CommandError> {
    let view = cart_commands::handle_update_quantity(material_id, cmd, &db_manager).await?;
    Ok(Json(view))
}

/// 장바구니 빼기 요청 처리
pub async fn handle_remove_cart_item(
    State((db_manager, _, _)): State<AppState>,
    Path(material_id): Path<i64>,
    Query(user): Query<UserQuery>,
) -> Result<impl IntoResponse, CommandError> {
    let view =
        cart_commands::handle_remove_from_cart(user.user_id, material_id, &db_manager).await?;
    Ok(Json(view))
}

/// 체크아웃 요청 처리
pub async fn handle_checkout(
    State((db_manager, _, _)): State<AppState>,
    Json(cmd): Json<CheckoutCommand>,
) -> Result<impl IntoResponse, CommandError> {
    let order = checkout_commands::handle_checkout(cmd, &db_manager).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// 결제 완료 요청 처리 (본문은 결제 수단 페이로드, 모의 게이트웨이는 내용을 보지 않는다)
pub async fn handle_complete_payment(
    State((db_manager, kafka_producer, payment_gateway)): State<AppState>,
    Path(order_id): Path<i64>,
    payload: Option<Json<serde_json::Value>>,
) -> Result<impl IntoResponse, CommandError> {
    if let Some(Json(payload)) = payload {
        debug!(
            "{:<12} --> 결제 수단 페이로드 수신: {}",
            "Command", payload
        );
    }

    let order = checkout_commands::handle_complete_payment(
        order_id,
        &db_manager,
        payment_gateway.as_ref(),
        &kafka_producer,
    )
    .await?;
    Ok(Json(order))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 경매 상태 조회
pub async fn handle_get_auction(
    State((db_manager, _, _)): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse, CommandError> {
    info!("{:<12} --> 경매 상태 조회 id: {}", "HandlerQuery", auction_id);
    let row = query::handlers::get_auction(&db_manager, auction_id).await?;
    let bids = query::handlers::get_bid_history(&db_manager, auction_id).await?;
    let state = row.to_domain(&bids)?;
    Ok(Json(AuctionView::from_state(state, Utc::now())))
}

/// 입찰 이력 조회 (최신순)
pub async fn handle_get_bid_history(
    State((db_manager, _, _)): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse, CommandError> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "HandlerQuery", auction_id);
    let row = query::handlers::get_auction(&db_manager, auction_id).await?;
    let bids = query::handlers::get_bid_history(&db_manager, auction_id).await?;
    let state = row.to_domain(&bids)?;
    Ok(Json(state.bids))
}

/// 최고 입찰가 조회
pub async fn handle_get_highest_bid(
    State((db_manager, _, _)): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse, CommandError> {
    info!(
        "{:<12} --> 최고 입찰가 조회 id: {}",
        "HandlerQuery", auction_id
    );
    let highest = query::handlers::get_highest_bid(&db_manager, auction_id).await?;
    let highest = highest
        .map(|paise| {
            Money::from_paise(paise).map_err(|e| {
                CommandError::CorruptState(format!("경매 {}: {}", auction_id, e))
            })
        })
        .transpose()?;
    Ok(Json(json!({ "highest_bid": highest })))
}

/// 자재 목록 조회
pub async fn handle_get_materials(
    State((db_manager, _, _)): State<AppState>,
) -> Result<impl IntoResponse, CommandError> {
    info!("{:<12} --> 자재 목록 조회", "HandlerQuery");
    let materials = query::handlers::get_all_materials(&db_manager).await?;
    let views = materials
        .into_iter()
        .map(MaterialView::from_row)
        .collect::<Result<Vec<_>, CommandError>>()?;
    Ok(Json(views))
}

/// 자재 조회 (붙어 있는 경매가 있으면 함께 싣는다)
/// 경매 연결은 여기서 한 번 해석해 내려보낸다. 표시 계층이 다시 조합하지 않는다.
pub async fn handle_get_material(
    State((db_manager, _, _)): State<AppState>,
    Path(material_id): Path<i64>,
) -> Result<impl IntoResponse, CommandError> {
    info!("{:<12} --> 자재 조회 id: {}", "HandlerQuery", material_id);
    let material = query::handlers::get_material(&db_manager, material_id).await?;

    let now = Utc::now();
    let auction = match query::handlers::get_auction_by_material(&db_manager, material_id).await? {
        Some(row) => {
            let bids = query::handlers::get_bid_history(&db_manager, row.id).await?;
            Some(AuctionView::from_state(row.to_domain(&bids)?, now))
        }
        None => None,
    };

    Ok(Json(json!({
        "material": MaterialView::from_row(material)?,
        "auction": auction,
    })))
}

/// 장바구니 조회
pub async fn handle_get_cart(
    State((db_manager, _, _)): State<AppState>,
    Query(user): Query<UserQuery>,
) -> Result<impl IntoResponse, CommandError> {
    info!(
        "{:<12} --> 장바구니 조회 user_id: {}",
        "HandlerQuery", user.user_id
    );
    let view = cart_commands::handle_get_cart(user.user_id, &db_manager).await?;
    Ok(Json(view))
}

/// 주문 조회
pub async fn handle_get_order(
    State((db_manager, _, _)): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<impl IntoResponse, CommandError> {
    info!("{:<12} --> 주문 조회 id: {}", "HandlerQuery", order_id);
    let row = query::handlers::get_order(&db_manager, order_id).await?;
    let lines = query::handlers::get_order_lines(&db_manager, order_id).await?;
    Ok(Json(row.to_domain(&lines)?))
}

// endregion: --- Query Handlers
