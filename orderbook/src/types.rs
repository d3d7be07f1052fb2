// Prices are decimals kept exactly as submitted; matching compares them
// rounded to `Price::SCALE` fractional digits (see `Price::rounded`).
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BookError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl FromStr for Side {
    type Err = BookError;

    /// Accepts the order-entry spellings clients send: `buy`/`buyer`/`bid`
    /// and `sell`/`seller`/`ask`, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "buyer" | "bid" => Ok(Side::Buy),
            "sell" | "seller" | "ask" => Ok(Side::Sell),
            other => Err(BookError::InvalidArgument(format!(
                "invalid side `{other}`, expected buy or sell"
            ))),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("buy"),
            Side::Sell => f.write_str("sell"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strictly positive limit price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Fractional digits used when comparing a buy against a sell.
    pub const SCALE: u32 = 2;

    pub fn new(value: Decimal) -> Result<Self, BookError> {
        if value <= Decimal::ZERO {
            return Err(BookError::InvalidArgument(format!(
                "price must be positive, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Price at matching precision, half away from zero (10.005 -> 10.01).
    pub fn rounded(&self) -> Decimal {
        self.0
            .round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl FromStr for Price {
    type Err = BookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| BookError::InvalidArgument(format!("invalid price `{s}`: {e}")))?;
        Self::new(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One resting interest in the book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub price: Price,
    pub remaining_qty: u64,
    pub created_at: u64, // ns, strictly increasing per book
}

impl Order {
    pub fn is_filled(&self) -> bool {
        self.remaining_qty == 0
    }
}

/// A completed match. Carries no order identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub price: Price,
    pub qty: u64,
}

/// One match step between a resting buy and a resting sell.
///
/// This is what the journal persists; the ledger only keeps the `Trade`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub buy: OrderId,
    pub sell: OrderId,
    pub price: Price,
    pub qty: u64,
}

impl Fill {
    pub fn trade(&self) -> Trade {
        Trade {
            price: self.price,
            qty: self.qty,
        }
    }
}

/// Completed volume at one execution price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTotal {
    pub price: Price,
    pub qty: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_accepts_order_entry_spellings() {
        assert_eq!("buyer".parse::<Side>().unwrap(), Side::Buy);
        assert_eq!("SELL".parse::<Side>().unwrap(), Side::Sell);
        assert_eq!("ask".parse::<Side>().unwrap(), Side::Sell);
        assert!(matches!(
            "hold".parse::<Side>(),
            Err(BookError::InvalidArgument(_))
        ));
    }

    #[test]
    fn price_rejects_zero_and_negative() {
        assert!("0".parse::<Price>().is_err());
        assert!("-1.5".parse::<Price>().is_err());
        assert!("abc".parse::<Price>().is_err());
        assert!("0.01".parse::<Price>().is_ok());
    }

    #[test]
    fn price_rounds_half_away_from_zero() {
        let up: Price = "10.005".parse().unwrap();
        let down: Price = "10.0049".parse().unwrap();
        let near: Price = "9.999".parse().unwrap();
        assert_eq!(up.rounded(), Decimal::new(1001, 2));
        assert_eq!(down.rounded(), Decimal::new(1000, 2));
        assert_eq!(near.rounded(), Decimal::new(1000, 2));
    }

    #[test]
    fn serde_uses_plain_values() {
        let order = Order {
            id: OrderId(7),
            side: Side::Sell,
            price: "99.50".parse().unwrap(),
            remaining_qty: 5,
            created_at: 1,
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["side"], "sell");
        assert_eq!(json["price"], "99.50");

        let back: Order = serde_json::from_value(json).unwrap();
        assert_eq!(back, order);
    }
}
