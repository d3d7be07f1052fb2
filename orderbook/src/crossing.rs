//! Crossing detection at matching precision.

use crate::types::Price;

/// A buy crosses a sell when its price, rounded to two decimals, is at or
/// above the sell's rounded price.
pub fn can_match(bid_price: Price, ask_price: Price) -> bool {
    bid_price.rounded() >= ask_price.rounded()
}
