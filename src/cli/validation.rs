use crate::errors::ValidationErrors;
use crate::models::{OrderRequest, OrderSide, OrderType};
use rust_decimal::Decimal;
use std::str::FromStr;

pub const MIN_SYMBOL_LEN: usize = 6;

/// Order fields exactly as the user typed them
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawOrderInput {
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub quantity: String,
    pub price: Option<String>,
}

/// Check every field and collect all violations. Symbol, side and type are
/// normalised to uppercase; a price given for a MARKET order is dropped.
pub fn validate_inputs(raw: &RawOrderInput) -> Result<OrderRequest, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let symbol = raw.symbol.trim().to_uppercase();
    if symbol.chars().count() < MIN_SYMBOL_LEN {
        errors.push(format!(
            "Symbol must be at least {} characters (e.g., BTCUSDT)",
            MIN_SYMBOL_LEN
        ));
    }

    let side = OrderSide::from_str(&raw.side)
        .map_err(|e| errors.push(e))
        .ok();
    let order_type = OrderType::from_str(&raw.order_type)
        .map_err(|e| errors.push(e))
        .ok();

    let quantity = match parse_decimal(&raw.quantity) {
        Some(qty) if qty > Decimal::ZERO => Some(qty),
        Some(_) => {
            errors.push("Quantity must be greater than 0");
            None
        }
        None => {
            errors.push("Quantity must be a valid number");
            None
        }
    };

    let price = if order_type.is_some_and(|t| t.requires_price()) {
        let given = raw.price.as_deref().map(str::trim).filter(|p| !p.is_empty());
        match given {
            None => {
                errors.push("Price is required for LIMIT orders");
                None
            }
            Some(text) => match parse_decimal(text) {
                Some(price) if price > Decimal::ZERO => Some(price),
                Some(_) => {
                    errors.push("Price must be greater than 0");
                    None
                }
                None => {
                    errors.push("Price must be a valid number");
                    None
                }
            },
        }
    } else {
        None
    };

    match (side, order_type, quantity) {
        (Some(side), Some(order_type), Some(quantity)) if errors.is_empty() => Ok(OrderRequest {
            symbol,
            side,
            order_type,
            quantity,
            price,
        }),
        _ => Err(errors),
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}
