// region:    --- Imports
use crate::database::DatabaseManager;
use crate::event_store::EventConsumer;
use crate::payment::{MockPaymentGateway, PaymentGateway};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use message_broker::KafkaManager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod auction;
mod bidding;
mod cart;
mod checkout;
mod database;
mod domain;
mod error;
mod event_store;
mod handlers;
mod message_broker;
mod payment;
mod query;
mod scheduler;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // Kafka 매니저 생성 및 초기화
    let kafka_manager = Arc::new(KafkaManager::new());
    if let Err(e) = kafka_manager.initialize().await {
        error!("{:<12} --> Kafka 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> Kafka 초기화 성공", "Main");

    // 토픽 생성 (경매 이벤트 접기용 + 결제 알림용)
    kafka_manager.create_topic("events", 5, 1).await?;
    kafka_manager
        .create_topic(checkout::commands::ORDER_EVENTS_TOPIC, 1, 1)
        .await?;

    // 이벤트 소싱 시작
    let event_consumer =
        EventConsumer::new(db_manager.get_pool(), kafka_manager.get_consumer());
    tokio::spawn(async move {
        event_consumer.start().await;
    });

    // 경매 시작/종료 시각에 따른 상태 전환 스케줄러
    let scheduler = scheduler::AuctionScheduler::new(db_manager.get_pool());
    scheduler.start().await;

    // 모의 결제 게이트웨이 (실 PG 연동 시 이 자리만 교체한다)
    let payment_gateway: Arc<dyn PaymentGateway> = Arc::new(MockPaymentGateway::new());

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = Router::new()
        .route(
            "/auctions/:id/bids",
            post(handlers::handle_place_bid).get(handlers::handle_get_bid_history),
        )
        .route("/auctions/:id/close", post(handlers::handle_close_auction))
        .route("/auctions/:id", get(handlers::handle_get_auction))
        .route(
            "/auctions/:id/highest-bid",
            get(handlers::handle_get_highest_bid),
        )
        .route("/materials", get(handlers::handle_get_materials))
        .route("/materials/:id", get(handlers::handle_get_material))
        .route("/cart", get(handlers::handle_get_cart))
        .route("/cart/items", post(handlers::handle_add_to_cart))
        .route(
            "/cart/items/:material_id",
            patch(handlers::handle_update_cart_item).delete(handlers::handle_remove_cart_item),
        )
        .route("/checkout", post(handlers::handle_checkout))
        .route("/orders/:id", get(handlers::handle_get_order))
        .route(
            "/orders/:id/payment",
            post(handlers::handle_complete_payment),
        )
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 20)) // 동시성을 위한 바디 사이즈 10배 증가(20MB)
        .with_state((db_manager, kafka_manager.get_producer(), payment_gateway));

    // 리스너 생성(로컬 호스트의 3000번 포트를 사용)
    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
