// region:    --- Imports
use super::queries;
use crate::bidding::model::{Auction, Bid, Material};
use crate::cart::model::CartItem;
use crate::checkout::model::{OrderLineRow, OrderRow};
use crate::database::DatabaseManager;
use sqlx::Error as SqlxError;
use sqlx::Row;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 자재 목록 조회
pub async fn get_all_materials(db_manager: &DatabaseManager) -> Result<Vec<Material>, SqlxError> {
    info!("{:<12} --> 자재 목록 조회", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Material>(queries::GET_ALL_MATERIALS)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 자재 조회
pub async fn get_material(
    db_manager: &DatabaseManager,
    material_id: i64,
) -> Result<Material, SqlxError> {
    info!("{:<12} --> 자재 조회 id: {}", "Query", material_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Material>(queries::GET_MATERIAL)
                    .bind(material_id)
                    .fetch_one(&mut **tx)
                    .await
            })
        })
        .await
}

/// 경매 조회
pub async fn get_auction(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<Auction, SqlxError> {
    info!("{:<12} --> 경매 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
                    .bind(auction_id)
                    .fetch_one(&mut **tx)
                    .await
            })
        })
        .await
}

/// 자재에 붙은 경매 조회 (없으면 None)
pub async fn get_auction_by_material(
    db_manager: &DatabaseManager,
    material_id: i64,
) -> Result<Option<Auction>, SqlxError> {
    info!(
        "{:<12} --> 자재의 경매 조회 material_id: {}",
        "Query", material_id
    );
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Auction>(queries::GET_AUCTION_BY_MATERIAL)
                    .bind(material_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 입찰 이력 조회
pub async fn get_bid_history(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<Vec<Bid>, SqlxError> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Bid>(queries::GET_BID_HISTORY)
                    .bind(auction_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 최고 입찰가 조회
pub async fn get_highest_bid(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<Option<i64>, SqlxError> {
    info!("{:<12} --> 최고 입찰가 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let result = sqlx::query(queries::GET_HIGHEST_BID)
                    .bind(auction_id)
                    .fetch_one(&mut **tx)
                    .await?;

                Ok(result.get("highest_bid"))
            })
        })
        .await
}

/// 경매 이벤트 버전 조회
pub async fn get_auction_version(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<i64, SqlxError> {
    info!("{:<12} --> 경매 이벤트 버전 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let result = sqlx::query(queries::GET_AUCTION_VERSION)
                    .bind(auction_id)
                    .fetch_one(&mut **tx)
                    .await?;

                Ok(result.get("version"))
            })
        })
        .await
}

/// 장바구니 조회
pub async fn get_cart_items(
    db_manager: &DatabaseManager,
    user_id: i64,
) -> Result<Vec<CartItem>, SqlxError> {
    info!("{:<12} --> 장바구니 조회 user_id: {}", "Query", user_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, CartItem>(queries::GET_CART_ITEMS)
                    .bind(user_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 장바구니에 담긴 자재 조회
pub async fn get_cart_materials(
    db_manager: &DatabaseManager,
    user_id: i64,
) -> Result<Vec<Material>, SqlxError> {
    info!(
        "{:<12} --> 장바구니 자재 조회 user_id: {}",
        "Query", user_id
    );
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Material>(queries::GET_CART_MATERIALS)
                    .bind(user_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 주문 조회
pub async fn get_order(db_manager: &DatabaseManager, order_id: i64) -> Result<OrderRow, SqlxError> {
    info!("{:<12} --> 주문 조회 id: {}", "Query", order_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, OrderRow>(queries::GET_ORDER)
                    .bind(order_id)
                    .fetch_one(&mut **tx)
                    .await
            })
        })
        .await
}

/// 주문 라인 조회
pub async fn get_order_lines(
    db_manager: &DatabaseManager,
    order_id: i64,
) -> Result<Vec<OrderLineRow>, SqlxError> {
    info!("{:<12} --> 주문 라인 조회 id: {}", "Query", order_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, OrderLineRow>(queries::GET_ORDER_LINES)
                    .bind(order_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

// endregion: --- Query Handlers
