/// 장바구니 원장
/// 장바구니는 자재 데이터를 소유하지 않고 material_id로만 참조한다.
/// 가격/이름 조회는 Catalog 인터페이스로 주입받는다.
// region:    --- Imports
use super::error::DomainError;
use super::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// endregion: --- Imports

// region:    --- Catalog

/// 자재 스냅샷 (조회 시점의 이름과 단가)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSnapshot {
    pub material_id: i64,
    pub name: String,
    pub unit_price: Money,
}

/// 자재 카탈로그 조회 인터페이스
/// 장바구니의 모든 라인이 조회 가능해야 한다. 끊어진 참조는 호출자가 명시적으로 처리한다.
pub trait Catalog {
    fn material(&self, material_id: i64) -> Option<MaterialSnapshot>;
}

impl Catalog for HashMap<i64, MaterialSnapshot> {
    fn material(&self, material_id: i64) -> Option<MaterialSnapshot> {
        self.get(&material_id).cloned()
    }
}

// endregion: --- Catalog

// region:    --- Cart

/// 장바구니 라인 (자재당 1개, 수량은 항상 1 이상)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub material_id: i64,
    pub quantity: i64,
}

/// 사용자 세션 소유의 장바구니
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cart {
    pub user_id: i64,
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn empty(user_id: i64) -> Self {
        Cart {
            user_id,
            lines: Vec::new(),
        }
    }

    /// 담기: 기존 라인이 있으면 수량을 더하고, 없으면 라인을 추가한다
    pub fn add(&self, material_id: i64, quantity: i64) -> Result<Cart, DomainError> {
        if quantity < 1 {
            return Err(DomainError::InvalidQuantity { quantity });
        }
        let mut next = self.clone();
        match next.lines.iter_mut().find(|l| l.material_id == material_id) {
            Some(line) => line.quantity += quantity,
            None => next.lines.push(CartLine {
                material_id,
                quantity,
            }),
        }
        Ok(next)
    }

    /// 빼기: 없는 자재는 오류가 아니라 무시한다
    pub fn remove(&self, material_id: i64) -> Cart {
        let mut next = self.clone();
        next.lines.retain(|l| l.material_id != material_id);
        next
    }

    /// 수량 변경: 1 미만은 제거로 취급한다 (클라이언트 가드를 믿지 않는다)
    pub fn update_quantity(&self, material_id: i64, quantity: i64) -> Cart {
        if quantity < 1 {
            return self.remove(material_id);
        }
        let mut next = self.clone();
        if let Some(line) = next.lines.iter_mut().find(|l| l.material_id == material_id) {
            line.quantity = quantity;
        }
        next
    }

    /// 소계: 모든 라인이 카탈로그에서 조회되어야 한다
    pub fn subtotal(&self, catalog: &impl Catalog) -> Result<Money, DomainError> {
        let mut total = Money::ZERO;
        for line in &self.lines {
            let snapshot = catalog
                .material(line.material_id)
                .ok_or(DomainError::UnknownMaterial {
                    material_id: line.material_id,
                })?;
            let line_total = snapshot.unit_price.multiply_by_qty(line.quantity)?;
            total = total.add(line_total)?;
        }
        Ok(total)
    }

    /// 총 수량
    pub fn total_items(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// 비우기 (멱등)
    pub fn clear(&self) -> Cart {
        Cart::empty(self.user_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// endregion: --- Cart

// region:    --- Tests


// endregion: --- Tests
