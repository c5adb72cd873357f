//! Typed records for every entity the engine stores.
//!
//! Rows are decoded with `sqlx::FromRow`, so a column holding the wrong type is reported as a decode error rather than
//! being silently coerced.
use std::{fmt::Display, str::FromStr};

pub use canteen_common::Paise;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

const MAX_USER_ID_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid identifier: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------       ProductId       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl FromStr for ProductId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(ConversionError(format!("'{s}' is not a valid product id"))),
        }
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ProductId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(ConversionError(format!("'{s}' is not a valid order id"))),
        }
    }
}

impl From<i64> for OrderId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------        UserId         ---------------------------------------------------------
/// The identity-provider's user id. The canteen never creates users; it only keys carts and orders by this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(String);

impl FromStr for UserId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = !s.is_empty()
            && s.len() <= MAX_USER_ID_LENGTH
            && s.chars().all(|c| c.is_ascii_alphanumeric() || "-_.@:".contains(c));
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(ConversionError(format!("'{s}' is not a valid user id")))
        }
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------          Role         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------        Customer        --------------------------------------------------------
/// Who is checking out. Name and email are copied onto the order so that it stays readable even if the user's profile
/// changes later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl Customer {
    pub fn new<S1: Into<String>, S2: Into<String>>(id: UserId, name: S1, email: S2) -> Self {
        Self { id, name: name.into(), email: email.into() }
    }
}

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Paise,
    /// Units in stock. Never negative.
    pub quantity: i64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Paise,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub created_by: String,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, price: Paise, quantity: i64) -> Self {
        Self { name: name.into(), description: String::default(), price, quantity, created_by: String::default() }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_created_by<S: Into<String>>(mut self, created_by: S) -> Self {
        self.created_by = created_by.into();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Product name cannot be empty".into());
        }
        validate_price_and_stock(Some(self.price), Some(self.quantity))
    }
}

/// A partial edit of a product. Fields left as `None` are unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Paise>,
    pub quantity: Option<i64>,
}

impl ProductUpdate {
    pub fn with_price(mut self, price: Paise) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.price.is_none() && self.quantity.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("The product update is empty".into());
        }
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err("Product name cannot be empty".into());
        }
        validate_price_and_stock(self.price, self.quantity)
    }
}

fn validate_price_and_stock(price: Option<Paise>, quantity: Option<i64>) -> Result<(), String> {
    if matches!(price, Some(p) if p.is_negative()) {
        return Err("Price cannot be negative".into());
    }
    if matches!(quantity, Some(q) if q < 0) {
        return Err("Stock quantity cannot be negative".into());
    }
    Ok(())
}

//--------------------------------------        CartLine       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub updated_at: DateTime<Utc>,
}

/// A cart line joined against the current product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub product_id: ProductId,
    pub name: String,
    pub description: String,
    pub unit_price: Paise,
    pub quantity: i64,
    pub stock_remaining: i64,
    pub line_total: Paise,
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// Order statuses only ever move forward: `Pending → Paid → Delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order snapshot exists, but no verified payment has been applied yet.
    Pending,
    /// A verified payment was applied, and stock has been debited.
    Paid,
    /// The order was handed over to the customer.
    Delivered,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Paid => write!(f, "Paid"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Delivered" => Ok(Self::Delivered),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------       OrderItem       ---------------------------------------------------------
/// One immutable line of an order, copied from the cart and the catalog at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Paise,
    pub quantity: i64,
    pub line_total: Paise,
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_id: UserId,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<OrderItem>,
    pub total: Paise,
    pub currency: String,
    pub status: OrderStatusType,
    pub payment_method: String,
    pub is_paid: bool,
    pub delivered: bool,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    /// Σ line_total over `items`.
    pub total: Paise,
    pub currency: String,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}
