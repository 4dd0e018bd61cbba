use crate::config::ExchangeConfig;
use crate::errors::{OrderError, Result, ValidationErrors};
use crate::execution::signer::{RequestParams, RequestSigner};
use crate::models::{AccountInfo, OrderResponse, OrderSide, OrderType};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::{Client, Method};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

const PING_PATH: &str = "/api/v3/ping";
const ACCOUNT_PATH: &str = "/api/v3/account";
const ORDER_PATH: &str = "/api/v3/order";

/// Longest slice of a bad response body kept in error messages
const BODY_EXCERPT_LEN: usize = 200;

/// Authenticated REST client for the exchange's spot API.
///
/// One `reqwest::Client` is reused for every call. Redirects are never
/// followed: a redirect means the endpoint is wrong and surfaces as an
/// `ApiError` carrying the 3xx status.
pub struct ExchangeClient {
    http_client: Client,
    base_url: String,
    signer: RequestSigner,
    quantity_precision: u32,
    price_precision: u32,
    time_in_force: String,
    order_resp_type: String,
    recv_window_ms: Option<u64>,
}

impl ExchangeClient {
    /// Build a client from validated settings. Fails on missing or
    /// placeholder credentials before any network access.
    pub fn new(config: &ExchangeConfig) -> Result<Self> {
        let credentials = config.credentials()?;

        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(credentials.api_key()).map_err(|e| {
            OrderError::ConfigError(format!("API key is not a valid header value: {}", e))
        })?;
        headers.insert(API_KEY_HEADER, api_key);

        let http_client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .redirect(Policy::none())
            .build()
            .map_err(|e| OrderError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.endpoint().to_string(),
            signer: RequestSigner::new(credentials.secret_key())?,
            quantity_precision: config.quantity_precision,
            price_precision: config.price_precision,
            time_in_force: config.time_in_force.clone(),
            order_resp_type: config.order_resp_type.clone(),
            recv_window_ms: config.recv_window_ms,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Signature for the encoded form of `params`
    pub fn sign(&self, params: &RequestParams) -> String {
        self.signer.sign(params)
    }

    /// Append `recvWindow`, `timestamp` and finally `signature` to `params`.
    /// The signature covers everything pushed before it.
    fn sign_params(&self, params: &mut RequestParams, timestamp_ms: i64) {
        if let Some(window) = self.recv_window_ms {
            params.push("recvWindow", window);
        }
        params.push("timestamp", timestamp_ms);
        let signature = self.sign(params);
        params.push("signature", signature);
    }

    /// Issue one request and decode the JSON body into `T`
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        mut params: RequestParams,
        signed: bool,
    ) -> Result<T> {
        info!("Sending {} request to {} with params: {}", method, path, params);

        if signed {
            self.sign_params(&mut params, Utc::now().timestamp_millis());
        }
        let payload = params.encode();
        let url = format!("{}{}", self.base_url, path);

        let request = if method == Method::GET {
            let url = if payload.is_empty() {
                url
            } else {
                format!("{}?{}", url, payload)
            };
            self.http_client.get(url)
        } else if method == Method::POST {
            self.http_client
                .post(url)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(payload)
        } else {
            return Err(OrderError::Unknown(format!(
                "Unsupported HTTP method: {}",
                method
            )));
        };

        let response = request.send().await.map_err(|e| {
            error!("Network error on {} {}: {}", method, path, e);
            OrderError::NetworkError(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("{} {} returned HTTP {}: {}", method, path, status, body);
            return Err(OrderError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let data = serde_json::from_str(&body).map_err(|e| {
            error!("JSON parsing error on {} {}: {}", method, path, e);
            OrderError::ResponseParseError(format!("{} (body: {})", e, excerpt(&body)))
        })?;

        info!("Response received: {}", body);
        Ok(data)
    }

    /// Place a new order. All parameter problems are reported together and
    /// nothing is sent when any exist.
    pub async fn place_order(
        &self,
        symbol: &str,
        side: OrderSide,
        order_type: OrderType,
        quantity: Decimal,
        price: Option<Decimal>,
    ) -> Result<OrderResponse> {
        let client_order_id = Uuid::new_v4().to_string();
        let params = self.build_order_params(
            symbol,
            side,
            order_type,
            quantity,
            price,
            &client_order_id,
        )?;

        info!("Placing order: {}", params);

        self.send(Method::POST, ORDER_PATH, params, true)
            .await
            .map_err(|e| {
                error!("Failed to place order {}: {}", client_order_id, e);
                e
            })
    }

    fn build_order_params(
        &self,
        symbol: &str,
        side: OrderSide,
        order_type: OrderType,
        quantity: Decimal,
        price: Option<Decimal>,
        client_order_id: &str,
    ) -> std::result::Result<RequestParams, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            errors.push("Symbol is required");
        }

        let quantity = quantity.round_dp(self.quantity_precision);
        if quantity <= Decimal::ZERO {
            errors.push(format!(
                "Quantity must be greater than 0 (at {} decimal places)",
                self.quantity_precision
            ));
        }

        // MARKET orders ignore any price given
        let price = match (order_type, price) {
            (OrderType::Limit, None) => {
                errors.push("Price is required for LIMIT orders");
                None
            }
            (OrderType::Limit, Some(price)) => {
                let price = price.round_dp(self.price_precision);
                if price <= Decimal::ZERO {
                    errors.push(format!(
                        "Price must be greater than 0 (at {} decimal places)",
                        self.price_precision
                    ));
                }
                Some(price)
            }
            (OrderType::Market, _) => None,
        };

        let mut params = RequestParams::new()
            .with("symbol", symbol)
            .with("side", side)
            .with("type", order_type);
        if let Some(price) = price {
            params.push("timeInForce", &self.time_in_force);
            params.push("quantity", quantity);
            params.push("price", price);
        } else {
            params.push("quantity", quantity);
        }
        params.push("newClientOrderId", client_order_id);
        params.push("newOrderRespType", &self.order_resp_type);

        errors.into_result(params)
    }

    /// Current account snapshot (signed)
    pub async fn get_account_info(&self) -> Result<AccountInfo> {
        self.send(Method::GET, ACCOUNT_PATH, RequestParams::new(), true)
            .await
    }

    /// Liveness check against the unauthenticated ping endpoint
    pub async fn test_connection(&self) -> bool {
        match self
            .send::<serde_json::Value>(Method::GET, PING_PATH, RequestParams::new(), false)
            .await
        {
            Ok(_) => {
                debug!("Ping to {} succeeded", self.base_url);
                true
            }
            Err(e) => {
                warn!("Connection test failed: {}", e);
                false
            }
        }
    }
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
