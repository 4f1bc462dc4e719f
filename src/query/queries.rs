/// 자재 목록 조회
pub const GET_ALL_MATERIALS: &str =
    "SELECT id, name, category, description, unit_price, unit, seller, created_at FROM materials ORDER BY created_at DESC";

/// 자재 조회
pub const GET_MATERIAL: &str =
    "SELECT id, name, category, description, unit_price, unit, seller, created_at FROM materials WHERE id = $1";

/// 경매 조회
pub const GET_AUCTION: &str =
    "SELECT id, material_id, starting_price, min_bid_increment, current_bid, highest_bidder_id, start_time, end_time, status, created_at FROM auctions WHERE id = $1";

/// 자재에 붙은 경매 조회 (1:1, 없을 수 있음)
pub const GET_AUCTION_BY_MATERIAL: &str =
    "SELECT id, material_id, starting_price, min_bid_increment, current_bid, highest_bidder_id, start_time, end_time, status, created_at FROM auctions WHERE material_id = $1";

/// 입찰 이력 조회 (최신순)
pub const GET_BID_HISTORY: &str = r#"
    SELECT id, auction_id, bidder_id, bidder_name, amount, bid_time
    FROM bids
    WHERE auction_id = $1
    ORDER BY bid_time DESC, id DESC
"#;

/// 최고 입찰 조회
pub const GET_HIGHEST_BID: &str =
    "SELECT MAX(amount) as highest_bid FROM bids WHERE auction_id = $1";

/// 경매 이벤트 버전 조회
pub const GET_AUCTION_VERSION: &str =
    "SELECT COALESCE(MAX(version), 0) as version FROM events WHERE aggregate_id = $1";

/// 장바구니 조회
pub const GET_CART_ITEMS: &str =
    "SELECT user_id, material_id, quantity, added_at FROM cart_items WHERE user_id = $1 ORDER BY added_at, material_id";

/// 장바구니에 담긴 자재 조회 (삭제된 자재의 라인은 결과에 나타나지 않는다)
pub const GET_CART_MATERIALS: &str = r#"
    SELECT m.id, m.name, m.category, m.description, m.unit_price, m.unit, m.seller, m.created_at
    FROM materials m
    JOIN cart_items c ON c.material_id = m.id
    WHERE c.user_id = $1
"#;

/// 주문 조회
pub const GET_ORDER: &str =
    "SELECT id, user_id, subtotal, status, transaction_id, created_at, updated_at FROM orders WHERE id = $1";

/// 주문 라인 조회
pub const GET_ORDER_LINES: &str =
    "SELECT id, order_id, material_id, material_name, unit_price, quantity FROM order_lines WHERE order_id = $1 ORDER BY id";
