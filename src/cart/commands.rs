/// 장바구니 커맨드 처리
/// 1. 담기
/// 2. 수량 변경
/// 3. 빼기
///
/// 장바구니는 사용자 세션 단일 작성자 모델이므로 이벤트 저장소를 거치지 않고
/// 읽기 모델을 트랜잭션 안에서 직접 갱신한다. 검증은 도메인 원장이 수행한다.
// region:    --- Imports
use crate::database::DatabaseManager;
use crate::domain::cart::{Cart, CartLine, Catalog, MaterialSnapshot};
use crate::domain::error::DomainError;
use crate::domain::money::Money;
use crate::error::CommandError;
use crate::query::handlers;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

// endregion: --- Imports

// region:    --- Commands

/// 담기 명령 (수량 생략 시 1)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AddToCartCommand {
    pub user_id: i64,
    pub material_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

/// 수량 변경 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UpdateQuantityCommand {
    pub user_id: i64,
    pub quantity: i64,
}

// endregion: --- Commands

// region:    --- Cart View

/// 장바구니 응답 뷰 (금액은 루피 소수 표기로 나간다)
#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub material_id: i64,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_total: Money,
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub user_id: i64,
    pub lines: Vec<CartLineView>,
    pub subtotal: Money,
    pub total_items: i64,
}

impl CartView {
    /// 도메인 장바구니 + 카탈로그 → 응답 뷰
    /// 카탈로그에서 끊어진 라인은 여기서도 명시적으로 실패한다 (조용히 버리지 않는다)
    pub fn build(
        cart: &Cart,
        catalog: &HashMap<i64, MaterialSnapshot>,
    ) -> Result<Self, CommandError> {
        let mut lines = Vec::with_capacity(cart.lines.len());
        for line in &cart.lines {
            let snapshot =
                catalog
                    .material(line.material_id)
                    .ok_or(DomainError::UnknownMaterial {
                        material_id: line.material_id,
                    })?;
            let line_total = snapshot
                .unit_price
                .multiply_by_qty(line.quantity)
                .map_err(DomainError::from)?;
            lines.push(CartLineView {
                material_id: line.material_id,
                name: snapshot.name,
                unit_price: snapshot.unit_price,
                quantity: line.quantity,
                line_total,
            });
        }
        let subtotal = cart.subtotal(catalog)?;
        Ok(CartView {
            user_id: cart.user_id,
            lines,
            subtotal,
            total_items: cart.total_items(),
        })
    }
}

// endregion: --- Cart View

// region:    --- Loading

/// 읽기 모델에서 도메인 장바구니와 카탈로그를 복원한다
/// 카탈로그는 장바구니에 담긴 자재만 싣는다. 삭제된 자재의 라인은
/// 카탈로그에 나타나지 않아 소계/체크아웃이 명시적으로 실패한다.
pub async fn load_cart(
    db_manager: &DatabaseManager,
    user_id: i64,
) -> Result<(Cart, HashMap<i64, MaterialSnapshot>), CommandError> {
    let items = handlers::get_cart_items(db_manager, user_id).await?;
    let materials = handlers::get_cart_materials(db_manager, user_id).await?;

    let lines = items
        .iter()
        .map(|item| CartLine {
            material_id: item.material_id,
            quantity: item.quantity,
        })
        .collect();
    let cart = Cart { user_id, lines };

    let mut catalog = HashMap::with_capacity(materials.len());
    for material in &materials {
        catalog.insert(material.id, material.snapshot()?);
    }
    Ok((cart, catalog))
}

// endregion: --- Loading

// region:    --- Command Handlers

/// 1. 담기
pub async fn handle_add_to_cart(
    cmd: AddToCartCommand,
    db_manager: &DatabaseManager,
) -> Result<CartView, CommandError> {
    info!(
        "{:<12} --> 장바구니 담기: 사용자 {} / 자재 {} x {}",
        "Command", cmd.user_id, cmd.material_id, cmd.quantity
    );

    // 자재 존재 확인 (없는 자재는 담을 수 없다)
    let material = handlers::get_material(db_manager, cmd.material_id).await?;

    let (cart, mut catalog) = load_cart(db_manager, cmd.user_id).await?;
    catalog.insert(material.id, material.snapshot()?);

    let next = cart.add(cmd.material_id, cmd.quantity)?;
    persist_line(db_manager, &next, cmd.material_id).await?;

    CartView::build(&next, &catalog)
}

/// 2. 수량 변경 (1 미만은 제거로 처리)
pub async fn handle_update_quantity(
    material_id: i64,
    cmd: UpdateQuantityCommand,
    db_manager: &DatabaseManager,
) -> Result<CartView, CommandError> {
    info!(
        "{:<12} --> 장바구니 수량 변경: 사용자 {} / 자재 {} -> {}",
        "Command", cmd.user_id, material_id, cmd.quantity
    );

    let (cart, catalog) = load_cart(db_manager, cmd.user_id).await?;
    let next = cart.update_quantity(material_id, cmd.quantity);
    persist_line(db_manager, &next, material_id).await?;

    CartView::build(&next, &catalog)
}

/// 3. 빼기 (없는 자재는 무시)
pub async fn handle_remove_from_cart(
    user_id: i64,
    material_id: i64,
    db_manager: &DatabaseManager,
) -> Result<CartView, CommandError> {
    info!(
        "{:<12} --> 장바구니 빼기: 사용자 {} / 자재 {}",
        "Command", user_id, material_id
    );

    let (cart, catalog) = load_cart(db_manager, user_id).await?;
    let next = cart.remove(material_id);
    persist_line(db_manager, &next, material_id).await?;

    CartView::build(&next, &catalog)
}

/// 장바구니 조회
pub async fn handle_get_cart(
    user_id: i64,
    db_manager: &DatabaseManager,
) -> Result<CartView, CommandError> {
    let (cart, catalog) = load_cart(db_manager, user_id).await?;
    CartView::build(&cart, &catalog)
}

/// 변경된 라인 하나를 절대 수량으로 반영한다
/// 도메인 연산이 이미 새 수량을 계산했으므로 upsert는 EXCLUDED 수량을 그대로 쓴다.
async fn persist_line(
    db_manager: &DatabaseManager,
    next: &Cart,
    material_id: i64,
) -> Result<(), CommandError> {
    let line = next.lines.iter().find(|l| l.material_id == material_id);
    let user_id = next.user_id;

    match line {
        Some(line) => {
            let quantity = line.quantity;
            db_manager
                .transaction(|tx| {
                    Box::pin(async move {
                        sqlx::query(
                            "INSERT INTO cart_items (user_id, material_id, quantity, added_at)
                             VALUES ($1, $2, $3, $4)
                             ON CONFLICT (user_id, material_id)
                             DO UPDATE SET quantity = EXCLUDED.quantity",
                        )
                        .bind(user_id)
                        .bind(material_id)
                        .bind(quantity)
                        .bind(Utc::now())
                        .execute(&mut **tx)
                        .await
                    })
                })
                .await?;
        }
        None => {
            db_manager
                .transaction(|tx| {
                    Box::pin(async move {
                        sqlx::query(
                            "DELETE FROM cart_items WHERE user_id = $1 AND material_id = $2",
                        )
                        .bind(user_id)
                        .bind(material_id)
                        .execute(&mut **tx)
                        .await
                    })
                })
                .await?;
        }
    }
    Ok(())
}

// endregion: --- Command Handlers
