use crate::errors::OrderError;
use crate::models::{AccountInfo, ApiErrorBody, OrderRequest, OrderResponse};

const RULE_WIDTH: usize = 50;
const NOT_AVAILABLE: &str = "N/A";

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
}

/// Summary block shown before an order is submitted
pub fn format_order_summary(title: &str, request: &OrderRequest) -> String {
    let mut lines = vec![
        rule(),
        title.to_string(),
        rule(),
        format!("Symbol: {}", request.symbol),
        format!("Side: {}", request.side),
        format!("Type: {}", request.order_type),
        format!("Quantity: {}", request.quantity),
    ];
    if let Some(price) = request.price {
        lines.push(format!("Price: {}", price));
    }
    lines.push(rule());

    lines.join("\n")
}

/// Human-readable rendering of an order response. An error code embedded in
/// the body renders as an error line instead of the order fields.
pub fn format_order_response(response: &OrderResponse) -> String {
    if let Some((_, msg)) = response.embedded_error() {
        return format!("❌ Error: {}", msg);
    }

    let mut lines = vec![
        rule(),
        "✅ ORDER PLACED SUCCESSFULLY".to_string(),
        rule(),
        format!("Order ID: {}", or_na(response.order_id)),
        format!("Symbol: {}", or_na(response.symbol.as_deref())),
        format!("Side: {}", or_na(response.side.as_deref())),
        format!("Type: {}", or_na(response.order_type.as_deref())),
        format!("Status: {}", or_na(response.status.as_deref())),
        format!("Quantity: {}", or_na(response.orig_qty.as_deref())),
        format!(
            "Executed Quantity: {}",
            response.executed_qty.as_deref().unwrap_or("0")
        ),
        format!("Price: {}", or_na(response.price.as_deref())),
    ];

    if let Some(avg_price) = response.nonzero_avg_price() {
        lines.push(format!("Average Price: {}", avg_price));
    }

    lines.push(format!("Time: {}", or_na(response.time())));
    lines.push(rule());

    lines.join("\n")
}

pub fn format_account(account: &AccountInfo) -> String {
    let mut lines = vec![
        rule(),
        "ACCOUNT".to_string(),
        rule(),
        format!("Account Type: {}", or_na(account.account_type.as_deref())),
        format!("Can Trade: {}", if account.can_trade { "yes" } else { "no" }),
    ];

    let balances: Vec<String> = account
        .nonzero_balances()
        .map(|b| format!("  {:<8} free {:>20}  locked {:>20}", b.asset, b.free, b.locked))
        .collect();

    if balances.is_empty() {
        lines.push("Balances: none".to_string());
    } else {
        lines.push("Balances:".to_string());
        lines.extend(balances);
    }
    lines.push(rule());

    lines.join("\n")
}

/// Message shown to the user for a failed operation
pub fn format_error(error: &OrderError) -> String {
    match error {
        OrderError::ApiError { status, body } => match ApiErrorBody::parse(body) {
            Some(api) => format!("API error {}: {} (code {})", status, api.msg, api.code),
            None => error.to_string(),
        },
        _ => error.to_string(),
    }
}
