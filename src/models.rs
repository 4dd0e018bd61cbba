use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Order side (Buy or Sell)
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for OrderSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(OrderSide::Buy),
            "SELL" => Ok(OrderSide::Sell),
            _ => Err("Side must be either 'BUY' or 'SELL'".to_string()),
        }
    }
}

/// Order type
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn requires_price(&self) -> bool {
        matches!(self, OrderType::Limit)
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit => write!(f, "LIMIT"),
        }
    }
}

impl FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MARKET" => Ok(OrderType::Market),
            "LIMIT" => Ok(OrderType::Limit),
            _ => Err("Order type must be either 'MARKET' or 'LIMIT'".to_string()),
        }
    }
}

/// A validated order, ready to hand to the exchange client
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

/// Response from order placement.
///
/// Amounts stay as the exchange's literal strings so they display exactly as
/// returned. Spot responses carry `transactTime` where futures use
/// `updateTime`; [`OrderResponse::time`] picks whichever is present.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(default)]
    pub order_id: Option<u64>,
    #[serde(default)]
    pub client_order_id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default, rename = "type")]
    pub order_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub orig_qty: Option<String>,
    #[serde(default)]
    pub executed_qty: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub avg_price: Option<String>,
    #[serde(default)]
    pub update_time: Option<u64>,
    #[serde(default)]
    pub transact_time: Option<u64>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl OrderResponse {
    /// Error code embedded in a 2xx body, if it is not a success code
    pub fn embedded_error(&self) -> Option<(i64, &str)> {
        match self.code {
            Some(code) if code != 200 => {
                Some((code, self.msg.as_deref().unwrap_or("Unknown error")))
            }
            _ => None,
        }
    }

    /// Order timestamp in ms, preferring `updateTime` over `transactTime`
    pub fn time(&self) -> Option<u64> {
        self.update_time.or(self.transact_time)
    }

    /// Average fill price when the exchange reported a positive one
    pub fn nonzero_avg_price(&self) -> Option<&str> {
        let raw = self.avg_price.as_deref()?;
        let value = Decimal::from_str(raw.trim()).ok()?;
        (value > Decimal::ZERO).then_some(raw)
    }
}

/// Error body the exchange returns alongside non-2xx statuses
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}

impl ApiErrorBody {
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

/// Account snapshot from the signed account endpoint
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    #[serde(default)]
    pub can_trade: bool,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub update_time: Option<u64>,
    #[serde(default)]
    pub balances: Vec<Balance>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Balance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

impl Balance {
    pub fn total(&self) -> Decimal {
        self.free + self.locked
    }
}

impl AccountInfo {
    pub fn nonzero_balances(&self) -> impl Iterator<Item = &Balance> {
        self.balances.iter().filter(|b| !b.total().is_zero())
    }
}
