//! Shop records: users, products, orders and their request payloads.

use crate::document::Document;
use crate::error::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Money
// ============================================================================

/// Non-negative monetary amount.
///
/// Backed by `Decimal` so that totals are exact. JSON accepts numbers or
/// strings and emits strings; the stored (non human-readable) form is the
/// fixed 16-byte decimal encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Create money from a decimal amount.
    ///
    /// # Errors
    /// `Error::InvalidInput` if the amount is negative.
    pub fn new(amount: Decimal) -> Result<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(Error::InvalidInput(format!(
                "Money amount cannot be negative: {}",
                amount
            )));
        }
        Ok(Self(amount.normalize()))
    }

    /// Create money from minor units, e.g. `from_cents(1050)` is 10.50.
    pub fn from_cents(cents: u64) -> Self {
        Self((Decimal::from(cents) / Decimal::ONE_HUNDRED).normalize())
    }

    /// Get the underlying decimal value.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn checked_add(self, other: Money) -> Result<Money> {
        self.0
            .checked_add(other.0)
            .map(|sum| Money(sum.normalize()))
            .ok_or_else(|| Error::InvalidInput("money amount overflow".to_string()))
    }

    /// Subtract, refusing to go below zero.
    pub fn checked_sub(self, other: Money) -> Result<Money> {
        if other.0 > self.0 {
            return Err(Error::InvalidInput(format!(
                "cannot subtract {} from {}",
                other, self
            )));
        }
        Ok(Money((self.0 - other.0).normalize()))
    }

    /// Price times quantity.
    pub fn checked_mul(self, quantity: u32) -> Result<Money> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(|product| Money(product.normalize()))
            .ok_or_else(|| Error::InvalidInput("money amount overflow".to_string()))
    }
}

impl From<u32> for Money {
    fn from(units: u32) -> Self {
        Money(Decimal::from(units))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let amount = s.trim().parse::<Decimal>().map_err(|e| {
            Error::InvalidInput(format!("Failed to parse money amount '{}': {}", s, e))
        })?;
        Money::new(amount)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(&self.0)
        } else {
            self.0.serialize().serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let amount = if deserializer.is_human_readable() {
            <Decimal as Deserialize>::deserialize(deserializer)?
        } else {
            let raw = <[u8; 16]>::deserialize(deserializer)?;
            Decimal::deserialize(raw)
        };
        Money::new(amount).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// User
// ============================================================================

/// A registered shopper with a spendable balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub balance: Money,
}

impl User {
    pub fn new(id: u64, name: impl Into<String>, balance: Money) -> Self {
        Self {
            id,
            name: name.into(),
            balance,
        }
    }
}

impl Document for User {
    type Key = u64;

    fn key(&self) -> Self::Key {
        self.id
    }

    fn collection() -> &'static str {
        "users"
    }
}

// ============================================================================
// Product
// ============================================================================

/// A product in the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    /// Units on hand
    pub quantity: u32,
    /// Unit price
    pub price: Money,
}

impl Product {
    pub fn new(id: u64, name: impl Into<String>, quantity: u32, price: Money) -> Self {
        Self {
            id,
            name: name.into(),
            quantity,
            price,
        }
    }
}

impl Document for Product {
    type Key = u64;

    fn key(&self) -> Self::Key {
        self.id
    }

    fn collection() -> &'static str {
        "products"
    }
}

// ============================================================================
// Order
// ============================================================================

/// One line of a committed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: u64,
    pub quantity: u32,
    /// Unit price captured when the order was created
    pub price: Money,
}

impl LineItem {
    /// Quantity times the captured unit price.
    pub fn line_total(&self) -> Result<Money> {
        self.price.checked_mul(self.quantity)
    }
}

/// A committed order. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub user_id: u64,
    pub items: Vec<LineItem>,
    pub total: Money,
}

impl Document for Order {
    type Key = u64;

    fn key(&self) -> Self::Key {
        self.id
    }

    fn collection() -> &'static str {
        "orders"
    }
}

/// Requested line of a candidate order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemRequest {
    pub product_id: u64,
    pub quantity: u32,
}

/// Payload for creating a new order.
///
/// `id` is optional: when absent the store assigns the next free order id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub user_id: u64,
    pub items: Vec<LineItemRequest>,
}

impl OrderRequest {
    pub fn new(user_id: u64) -> Self {
        Self {
            id: None,
            user_id,
            items: Vec::new(),
        }
    }

    /// Request a specific order id.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Append a line item.
    pub fn item(mut self, product_id: u64, quantity: u32) -> Self {
        self.items.push(LineItemRequest {
            product_id,
            quantity,
        });
        self
    }

    /// Reject malformed requests before any store access.
    ///
    /// # Errors
    /// `Error::InvalidInput` for an empty item list or a zero quantity.
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(Error::InvalidInput(
                "order must contain at least one item".to_string(),
            ));
        }

        if let Some(line) = self.items.iter().find(|line| line.quantity == 0) {
            return Err(Error::InvalidInput(format!(
                "quantity for product {} must be positive",
                line.product_id
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Sequence
// ============================================================================

/// Named id counter used for server-assigned keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub name: String,
    /// Next id to hand out
    pub next: u64,
}

impl Document for Sequence {
    type Key = String;

    fn key(&self) -> Self::Key {
        self.name.clone()
    }

    fn collection() -> &'static str {
        "sequences"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_rejects_negative() {
        assert!(Money::new(Decimal::new(-100, 2)).is_err());
        assert!(Money::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_money_arithmetic() {
        let price = Money::from(5);
        let total = price.checked_mul(3).unwrap();
        assert_eq!(total, Money::from(15));

        let balance = Money::from(100).checked_sub(total).unwrap();
        assert_eq!(balance, Money::from(85));

        assert!(Money::from(10).checked_sub(Money::from(15)).is_err());
    }

    #[test]
    fn test_money_from_cents() {
        assert_eq!(Money::from_cents(1050), "10.5".parse().unwrap());
        assert_eq!(Money::from_cents(1050).to_string(), "10.5");
        assert_eq!(Money::from_cents(500), Money::from(5));
    }

    #[test]
    fn test_money_from_cents_matches_parsed_on_the_wire() {
        let from_cents = Money::from_cents(1050);
        let parsed: Money = "10.5".parse().unwrap();

        assert_eq!(serde_json::to_string(&from_cents).unwrap(), "\"10.5\"");
        assert_eq!(
            postcard::to_allocvec(&from_cents).unwrap(),
            postcard::to_allocvec(&parsed).unwrap()
        );
    }

    #[test]
    fn test_money_json_accepts_numbers_and_strings() {
        let from_int: Money = serde_json::from_str("100").unwrap();
        let from_float: Money = serde_json::from_str("2.50").unwrap();
        let from_str: Money = serde_json::from_str("\"2.5\"").unwrap();

        assert_eq!(from_int, Money::from(100));
        assert_eq!(from_float, from_str);
        assert!(serde_json::from_str::<Money>("-1").is_err());
    }

    #[test]
    fn test_money_json_output_is_string() {
        let json = serde_json::to_string(&Money::from_cents(1999)).unwrap();
        assert_eq!(json, "\"19.99\"");
    }

    #[test]
    fn test_money_survives_postcard_envelope() {
        let product = Product::new(1, "Widget", 10, "4.99".parse().unwrap());
        let bytes = product.to_bytes().unwrap();
        assert_eq!(Product::from_bytes(&bytes).unwrap(), product);
    }

    #[test]
    fn test_order_request_validation() {
        assert!(OrderRequest::new(1).item(1, 3).validate().is_ok());
        assert!(matches!(
            OrderRequest::new(1).validate(),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            OrderRequest::new(1).item(1, 2).item(2, 0).validate(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_order_request_json_id_optional() {
        let request: OrderRequest =
            serde_json::from_str(r#"{"user_id": 1, "items": [{"product_id": 1, "quantity": 3}]}"#)
                .unwrap();
        assert_eq!(request, OrderRequest::new(1).item(1, 3));
    }

    #[test]
    fn test_collections() {
        assert_eq!(User::collection(), "users");
        assert_eq!(Product::collection(), "products");
        assert_eq!(Order::collection(), "orders");
        assert_eq!(Sequence::collection(), "sequences");
    }
}
