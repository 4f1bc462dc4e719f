use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use waste_exchange_service::bidding::model::{Auction, Material};
use waste_exchange_service::database::DatabaseManager;
use waste_exchange_service::query;

const BASE_URL: &str = "http://localhost:3000";

/// 로컬 통합 환경(DB + Kafka + 실행 중인 서버)이 준비된 경우에만 실행한다
fn integration_env_ready() -> bool {
    std::env::var("DATABASE_URL").is_ok()
}

/// 트레이싱 초기화
fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 데이터베이스 매니저 설정
async fn setup() -> Arc<DatabaseManager> {
    Arc::new(DatabaseManager::new().await)
}

/// 파이사 → 루피 소수 문자열
fn major(paise: i64) -> String {
    format!("{}.{:02}", paise / 100, paise % 100)
}

/// 입찰 테스트
#[tokio::test]
async fn test_place_bid() {
    if !integration_env_ready() {
        return;
    }
    let db_manager = setup().await;
    let client = Client::new();

    // 테스트용 자재와 경매 생성 (시작가 100.00, 최소 증가액 5.00)
    let material = create_test_material(&db_manager, "입찰 테스트 자재", 4500).await;
    let auction = create_test_auction(
        &db_manager,
        material.id,
        10_000,
        500,
        Utc::now() - Duration::minutes(1),
        Utc::now() + Duration::hours(2),
    )
    .await;

    // 시작가 미달 입찰은 409로 거부된다
    let response = client
        .post(format!("{}/auctions/{}/bids", BASE_URL, auction.id))
        .json(&json!({
            "bidder_id": 1,
            "bidder_name": "Asha",
            "amount": major(9_000)
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "BID_TOO_LOW");
    assert_eq!(body["floor"], major(10_000));

    // 시작가와 같은 첫 입찰은 수락된다
    let response = client
        .post(format!("{}/auctions/{}/bids", BASE_URL, auction.id))
        .json(&json!({
            "bidder_id": 1,
            "bidder_name": "Asha",
            "amount": major(10_000)
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["auction"]["current_bid"], major(10_000));

    // 이벤트 처리 대기
    tokio::time::sleep(tokio::time::Duration::from_millis(1500)).await;

    // 읽기 모델 반영 확인
    let updated = query::handlers::get_auction(&db_manager, auction.id)
        .await
        .unwrap();
    assert_eq!(updated.current_bid, 10_000);
    assert_eq!(updated.highest_bidder_id, Some(1));

    // 하한가는 현재가 + 최소 증가액으로 올라갔다
    let response = client
        .post(format!("{}/auctions/{}/bids", BASE_URL, auction.id))
        .json(&json!({
            "bidder_id": 2,
            "bidder_name": "Ravi",
            "amount": major(10_200)
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// 경매 조기 종료 테스트
#[tokio::test]
async fn test_close_auction() {
    if !integration_env_ready() {
        return;
    }
    let db_manager = setup().await;
    let client = Client::new();

    let material = create_test_material(&db_manager, "조기 종료 테스트 자재", 4500).await;
    let auction = create_test_auction(
        &db_manager,
        material.id,
        10_000,
        500,
        Utc::now() - Duration::minutes(1),
        Utc::now() + Duration::hours(2),
    )
    .await;

    // 조기 종료
    let response = client
        .post(format!("{}/auctions/{}/close", BASE_URL, auction.id))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["auction"]["status"], "ENDED");

    // 이벤트 처리 대기
    tokio::time::sleep(tokio::time::Duration::from_millis(1500)).await;

    // 종료된 경매에는 어떤 금액도 입찰할 수 없다
    let response = client
        .post(format!("{}/auctions/{}/bids", BASE_URL, auction.id))
        .json(&json!({
            "bidder_id": 1,
            "bidder_name": "Asha",
            "amount": major(99_900)
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "AUCTION_NOT_ACTIVE");

    // 두 번째 종료 요청도 상태 충돌이다
    let response = client
        .post(format!("{}/auctions/{}/close", BASE_URL, auction.id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// 경매 사이클 테스트 (타이머 종료)
#[tokio::test]
async fn test_auction_lifecycle() {
    if !integration_env_ready() {
        return;
    }
    let db_manager = setup().await;
    let client = Client::new();

    let material = create_test_material(&db_manager, "경매 사이클 테스트 자재", 4500).await;
    let auction = create_test_auction(
        &db_manager,
        material.id,
        10_000,
        500,
        Utc::now(),
        Utc::now() + Duration::seconds(5),
    )
    .await;

    // 진행 중 입찰
    let response = client
        .post(format!("{}/auctions/{}/bids", BASE_URL, auction.id))
        .json(&json!({
            "bidder_id": 1,
            "bidder_name": "Asha",
            "amount": major(15_000)
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // 이벤트 처리 대기
    tokio::time::sleep(tokio::time::Duration::from_millis(1500)).await;

    let current = query::handlers::get_auction(&db_manager, auction.id)
        .await
        .unwrap();
    assert_eq!(current.current_bid, 15_000);

    // 경매 종료 대기
    tokio::time::sleep(tokio::time::Duration::from_secs(6)).await;

    // 종료 후 상태와 남은 시간 확인
    let response = client
        .get(format!("{}/auctions/{}", BASE_URL, auction.id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ENDED");
    assert_eq!(body["time_remaining_seconds"], 0);

    // 종료 후 입찰은 거부된다
    let response = client
        .post(format!("{}/auctions/{}/bids", BASE_URL, auction.id))
        .json(&json!({
            "bidder_id": 2,
            "bidder_name": "Ravi",
            "amount": major(99_900)
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// 장바구니와 체크아웃 흐름 테스트
#[tokio::test]
async fn test_cart_and_checkout_flow() {
    if !integration_env_ready() {
        return;
    }
    let db_manager = setup().await;
    let client = Client::new();

    // 단가 45.00 자재, 충돌 없는 사용자 id
    let material = create_test_material(&db_manager, "장바구니 테스트 자재", 4500).await;
    let user_id = Utc::now().timestamp_millis();

    // 담기 (수량 1) -> 소계 45.00
    let response = client
        .post(format!("{}/cart/items", BASE_URL))
        .json(&json!({"user_id": user_id, "material_id": material.id, "quantity": 1}))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["subtotal"], "45.00");

    // 같은 자재 담기 (수량 2) -> 수량 3, 소계 135.00
    let response = client
        .post(format!("{}/cart/items", BASE_URL))
        .json(&json!({"user_id": user_id, "material_id": material.id, "quantity": 2}))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["lines"][0]["quantity"], 3);
    assert_eq!(body["subtotal"], "135.00");

    // 수량 0으로 변경 -> 라인 제거, 소계 0.00
    let response = client
        .patch(format!("{}/cart/items/{}", BASE_URL, material.id))
        .json(&json!({"user_id": user_id, "quantity": 0}))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["total_items"], 0);
    assert_eq!(body["subtotal"], "0.00");

    // 빈 장바구니 체크아웃은 400이다
    let response = client
        .post(format!("{}/checkout", BASE_URL))
        .json(&json!({"user_id": user_id}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // 다시 담고 체크아웃 -> 201, 결제 대기 주문
    let response = client
        .post(format!("{}/cart/items", BASE_URL))
        .json(&json!({"user_id": user_id, "material_id": material.id, "quantity": 3}))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/checkout", BASE_URL))
        .json(&json!({"user_id": user_id}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let order: Value = response.json().await.unwrap();
    assert_eq!(order["status"], "PENDING_PAYMENT");
    assert_eq!(order["subtotal"], "135.00");
    let order_id = order["id"].as_i64().unwrap();

    // 결제 완료 -> PAID, 장바구니는 비워진다
    let response = client
        .post(format!("{}/orders/{}/payment", BASE_URL, order_id))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let paid: Value = response.json().await.unwrap();
    assert_eq!(paid["status"], "PAID");
    assert!(paid["transaction_id"].as_str().unwrap().starts_with("txn_"));

    let response = client
        .get(format!("{}/cart?user_id={}", BASE_URL, user_id))
        .send()
        .await
        .expect("Failed to send request");
    let cart: Value = response.json().await.unwrap();
    assert_eq!(cart["total_items"], 0);

    // 두 번째 결제 완료 시도 -> 409, 스냅샷과 장바구니는 그대로다
    let response = client
        .post(format!("{}/orders/{}/payment", BASE_URL, order_id))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_ORDER_STATE");

    let response = client
        .get(format!("{}/orders/{}", BASE_URL, order_id))
        .send()
        .await
        .expect("Failed to send request");
    let order_after: Value = response.json().await.unwrap();
    assert_eq!(order_after["status"], "PAID");
    assert_eq!(order_after["subtotal"], "135.00");

    let response = client
        .get(format!("{}/cart?user_id={}", BASE_URL, user_id))
        .send()
        .await
        .expect("Failed to send request");
    let cart: Value = response.json().await.unwrap();
    assert_eq!(cart["total_items"], 0);
}

/// 동시성 입찰 테스트
#[tokio::test]
async fn test_concurrent_bidding() {
    if !integration_env_ready() {
        return;
    }
    // 테스트 시작 시 tracing 초기화
    init_tracing();

    let db_manager = setup().await;

    let starting_price: i64 = 10_000;
    let increment: i64 = 500;
    let material = create_test_material(&db_manager, "동시성 입찰 테스트 자재", 4500).await;
    let auction = create_test_auction(
        &db_manager,
        material.id,
        starting_price,
        increment,
        Utc::now() - Duration::minutes(1),
        Utc::now() + Duration::hours(2),
    )
    .await;

    // 50개의 동시 입찰 생성 (금액은 모두 서로 다르다)
    let mut handles = vec![];
    for i in 1..=50i64 {
        let client = reqwest::Client::new();
        let amount = starting_price + i * increment;
        let auction_id = auction.id;

        let handle = tokio::spawn(async move {
            let bid_data = serde_json::json!({
                "bidder_id": i,
                "bidder_name": format!("bidder-{}", i),
                "amount": format!("{}.{:02}", amount / 100, amount % 100)
            });

            // POST 요청 전송
            let response = client
                .post(format!("{}/auctions/{}/bids", BASE_URL, auction_id))
                .header("Content-Type", "application/json")
                .json(&bid_data)
                .send()
                .await
                .unwrap();

            let status = response.status();
            let body = response.text().await.unwrap();

            (status, body)
        });

        handles.push(handle);
    }

    // 모든 입찰 처리 대기 및 결과 확인
    let mut successful_bids = 0;
    let mut rejected_bids = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();

        if status == StatusCode::OK {
            successful_bids += 1;
        } else if status == StatusCode::CONFLICT {
            let error_info: Value = serde_json::from_str(&body).unwrap();
            if error_info["code"] == "MAX_RETRIES_EXCEEDED" {
                panic!("최대 재시도 횟수 초과 오류 발생: {:?}", error_info);
            }
            rejected_bids += 1;
        } else {
            panic!("예상 밖의 응답: {} {}", status, body);
        }
    }

    info!(
        "성공한 입찰 수: {}, 거부된 입찰 수: {}",
        successful_bids, rejected_bids
    );
    assert!(successful_bids >= 1);

    // 이벤트 처리 대기
    tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;

    // 최고 금액 입찰은 어떤 순서로 끼어들어도 결국 수락된다
    let updated = query::handlers::get_auction(&db_manager, auction.id)
        .await
        .unwrap();
    assert_eq!(updated.current_bid, starting_price + 50 * increment);

    // 입찰 이력은 최신순으로 금액이 순감소해야 한다
    let bid_history = query::handlers::get_bid_history(&db_manager, auction.id)
        .await
        .unwrap();
    assert!(!bid_history.is_empty());
    for window in bid_history.windows(2) {
        assert!(window[0].amount > window[1].amount);
    }

    // 버전 확인
    let final_version = query::handlers::get_auction_version(&db_manager, auction.id)
        .await
        .unwrap();
    assert!(final_version >= 1);
}

/// 테스트용 자재 생성
async fn create_test_material(
    db_manager: &DatabaseManager,
    name: &str,
    unit_price: i64,
) -> Material {
    let name = name.to_string();
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Material>(
                    "INSERT INTO materials (name, category, description, unit_price, unit, seller, created_at)
                     VALUES ($1, $2, $3, $4, $5, $6, $7)
                     RETURNING *",
                )
                .bind(&name)
                .bind("플라스틱")
                .bind("통합 테스트를 위한 자재입니다.")
                .bind(unit_price)
                .bind("kg")
                .bind("TestSeller")
                .bind(Utc::now())
                .fetch_one(&mut **tx)
                .await
            })
        })
        .await
        .unwrap()
}

/// 테스트용 경매 생성
async fn create_test_auction(
    db_manager: &DatabaseManager,
    material_id: i64,
    starting_price: i64,
    min_bid_increment: i64,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Auction {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Auction>(
                    "INSERT INTO auctions (material_id, starting_price, min_bid_increment, current_bid, start_time, end_time, status, created_at)
                     VALUES ($1, $2, $3, 0, $4, $5, 'ACTIVE', $6)
                     RETURNING *",
                )
                .bind(material_id)
                .bind(starting_price)
                .bind(min_bid_increment)
                .bind(start_time)
                .bind(end_time)
                .bind(Utc::now())
                .fetch_one(&mut **tx)
                .await
            })
        })
        .await
        .unwrap()
}
