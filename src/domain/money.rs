/// 금액 기본형
/// 내부 연산은 항상 파이사(paise) 단위 정수로 수행하고,
/// 외부 경계(API/표시)에서만 루피(₹) 소수 표기로 변환한다.
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

// region:    --- Money Error

/// 금액 오류
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("금액은 음수가 될 수 없습니다")]
    Negative,
    #[error("금액은 소수점 둘째 자리까지만 허용됩니다: {0}")]
    Precision(String),
    #[error("금액 표현 범위를 초과했습니다")]
    Overflow,
    #[error("금액 형식이 잘못되었습니다: {0}")]
    Parse(String),
}

// endregion: --- Money Error

// region:    --- Money

/// 파이사 단위 정수 금액 (음수 불가)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// 파이사 단위 정수로 생성
    pub fn from_paise(paise: i64) -> Result<Self, MoneyError> {
        if paise < 0 {
            return Err(MoneyError::Negative);
        }
        Ok(Money(paise))
    }

    /// 소수 문자열로 생성 ("45", "45.5", "45.00" 허용, 셋째 자리부터 거부)
    pub fn parse(input: &str) -> Result<Self, MoneyError> {
        let text = input.trim();
        if text.starts_with('-') {
            return Err(MoneyError::Negative);
        }
        let (major, minor) = match text.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (text, ""),
        };
        if major.is_empty() || !major.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MoneyError::Parse(input.to_string()));
        }
        if !minor.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MoneyError::Parse(input.to_string()));
        }
        if minor.len() > 2 {
            return Err(MoneyError::Precision(input.to_string()));
        }
        let major: i64 = major.parse().map_err(|_| MoneyError::Overflow)?;
        let minor: i64 = if minor.is_empty() {
            0
        } else {
            let digits: i64 = minor.parse().map_err(|_| MoneyError::Parse(input.to_string()))?;
            // "1.5"는 1.50과 같다
            if minor.len() == 1 {
                digits * 10
            } else {
                digits
            }
        };
        major
            .checked_mul(100)
            .and_then(|p| p.checked_add(minor))
            .map(Money)
            .ok_or(MoneyError::Overflow)
    }

    /// 부동소수점 루피 값으로 생성
    /// 파이사 경계에서 반올림(round-half-up)하되, 둘째 자리를 넘는 정밀도는 거부한다.
    pub fn from_major_f64(value: f64) -> Result<Self, MoneyError> {
        if !value.is_finite() {
            return Err(MoneyError::Parse(value.to_string()));
        }
        if value < 0.0 {
            return Err(MoneyError::Negative);
        }
        let scaled = value * 100.0;
        if scaled > i64::MAX as f64 {
            return Err(MoneyError::Overflow);
        }
        let rounded = scaled.round();
        if (scaled - rounded).abs() > 1e-6 {
            return Err(MoneyError::Precision(value.to_string()));
        }
        Ok(Money(rounded as i64))
    }

    pub fn paise(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn add(self, other: Money) -> Result<Money, MoneyError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or(MoneyError::Overflow)
    }

    /// 결과가 음수가 되는 차감은 거부한다
    pub fn subtract(self, other: Money) -> Result<Money, MoneyError> {
        if other.0 > self.0 {
            return Err(MoneyError::Negative);
        }
        Ok(Money(self.0 - other.0))
    }

    /// 비교 전용 부호 있는 차액 (파이사)
    pub fn signed_delta(self, other: Money) -> i64 {
        self.0 - other.0
    }

    pub fn multiply_by_qty(self, quantity: i64) -> Result<Money, MoneyError> {
        if quantity < 0 {
            return Err(MoneyError::Negative);
        }
        self.0
            .checked_mul(quantity)
            .map(Money)
            .ok_or(MoneyError::Overflow)
    }

    /// 루피 소수 표기 (항상 둘째 자리까지)
    pub fn to_major_string(self) -> String {
        format!("{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{}", self.to_major_string())
    }
}

/// 직렬화는 루피 소수 문자열로 내보낸다
impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_major_string())
    }
}

/// 역직렬화는 소수 문자열과 숫자 표기를 모두 받는다
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(f64),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Money::parse(&text).map_err(DeError::custom),
            Raw::Number(value) => Money::from_major_f64(value).map_err(DeError::custom),
        }
    }
}

// endregion: --- Money

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_two_fraction_digits() {
        assert_eq!(Money::parse("0.60").unwrap().paise(), 60);
        assert_eq!(Money::parse("45").unwrap().paise(), 4500);
        assert_eq!(Money::parse("45.5").unwrap().paise(), 4550);
        assert_eq!(Money::parse("135.00").unwrap().paise(), 13500);
    }

    #[test]
    fn parse_rejects_extra_precision_and_garbage() {
        assert_eq!(
            Money::parse("1.234"),
            Err(MoneyError::Precision("1.234".to_string()))
        );
        assert_eq!(Money::parse("-1.00"), Err(MoneyError::Negative));
        assert!(matches!(Money::parse("abc"), Err(MoneyError::Parse(_))));
        assert!(matches!(Money::parse(".50"), Err(MoneyError::Parse(_))));
        assert!(matches!(Money::parse("1.x"), Err(MoneyError::Parse(_))));
    }

    #[test]
    fn from_major_f64_rounds_at_paise_boundary() {
        assert_eq!(Money::from_major_f64(45.0).unwrap().paise(), 4500);
        // 0.1 + 0.2의 이진 표현 오차는 파이사 경계에서 흡수된다
        assert_eq!(Money::from_major_f64(0.1 + 0.2).unwrap().paise(), 30);
        assert!(matches!(
            Money::from_major_f64(0.605),
            Err(MoneyError::Precision(_))
        ));
        assert_eq!(Money::from_major_f64(-3.0), Err(MoneyError::Negative));
    }

    #[test]
    fn subtract_never_goes_negative() {
        let a = Money::from_paise(500).unwrap();
        let b = Money::from_paise(700).unwrap();
        assert_eq!(a.subtract(b), Err(MoneyError::Negative));
        assert_eq!(b.subtract(a).unwrap().paise(), 200);
        assert_eq!(a.signed_delta(b), -200);
    }

    #[test]
    fn multiply_by_qty_is_integer_arithmetic() {
        let unit = Money::parse("45.00").unwrap();
        assert_eq!(unit.multiply_by_qty(3).unwrap().paise(), 13500);
        assert_eq!(unit.multiply_by_qty(0).unwrap(), Money::ZERO);
        assert_eq!(unit.multiply_by_qty(-1), Err(MoneyError::Negative));
    }

    #[test]
    fn formats_with_two_decimals() {
        assert_eq!(Money::from_paise(60).unwrap().to_major_string(), "0.60");
        assert_eq!(Money::from_paise(13500).unwrap().to_major_string(), "135.00");
        assert_eq!(format!("{}", Money::from_paise(4505).unwrap()), "₹45.05");
    }

    #[test]
    fn serde_round_trip_from_string_and_number() {
        let m: Money = serde_json::from_str("\"45.00\"").unwrap();
        assert_eq!(m.paise(), 4500);
        let m: Money = serde_json::from_str("0.65").unwrap();
        assert_eq!(m.paise(), 65);
        assert_eq!(serde_json::to_string(&m).unwrap(), "\"0.65\"");
        assert!(serde_json::from_str::<Money>("\"1.999\"").is_err());
    }
}

// endregion: --- Tests
