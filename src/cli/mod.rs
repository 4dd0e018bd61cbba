pub mod display;
pub mod prompt;
pub mod validation;

use crate::config::Config;
use crate::errors::{OrderError, Result};
use crate::execution::ExchangeClient;
use crate::models::{OrderRequest, OrderResponse, OrderType};
use crate::storage::OrderLogger;
use display::{format_account, format_error, format_order_response, format_order_summary};
use prompt::Prompter;
use std::io::{BufRead, Write};
use std::str::FromStr;
use tracing::{error, info, warn};
use validation::{validate_inputs, RawOrderInput};

/// Collects orders from the user, submits them and renders the outcome
pub struct OrderCli {
    client: ExchangeClient,
    journal: Option<OrderLogger>,
}

impl OrderCli {
    pub fn new(config: &Config) -> Result<Self> {
        let client = ExchangeClient::new(&config.exchange)?;
        let journal = Some(config.logging.order_journal.trim())
            .filter(|path| !path.is_empty())
            .map(OrderLogger::new);

        Ok(Self::with_client(client, journal))
    }

    pub fn with_client(client: ExchangeClient, journal: Option<OrderLogger>) -> Self {
        Self { client, journal }
    }

    /// Prompt for an order, confirm it and place it. Order failures are
    /// reported to the user; only I/O errors on the terminal are returned.
    pub async fn run_interactive<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<()> {
        let mut prompter = Prompter::new(input, output);

        prompter.say(&format!("\n{}", "=".repeat(50)))?;
        prompter.say("TESTNET ORDER PLACER")?;
        prompter.say(&"=".repeat(50))?;

        prompter.say("🔍 Testing API connection...")?;
        if !self.client.test_connection().await {
            prompter.say("❌ Cannot connect to the exchange API. Check credentials and network.")?;
            return Ok(());
        }
        prompter.say(&format!("✅ Connected to {}", self.client.base_url()))?;

        let request = loop {
            let Some(raw) = Self::prompt_order(&mut prompter)? else {
                prompter.say("\nOrder cancelled.")?;
                return Ok(());
            };

            match validate_inputs(&raw) {
                Ok(request) => break request,
                Err(errors) => {
                    warn!("Rejected order input: {}", errors);
                    prompter.say(&format!("\n❌ Validation Error:\n{}", errors))?;
                    prompter.say("Please enter the order again.")?;
                }
            }
        };

        prompter.say(&format!("\n{}", format_order_summary("📋 ORDER SUMMARY", &request)))?;

        if !prompter.confirm("\nConfirm order? (yes/no): ")? {
            info!("Order cancelled at confirmation: {:?}", request);
            prompter.say("Order cancelled.")?;
            return Ok(());
        }

        prompter.say("\n🚀 Placing order...")?;
        match self.submit(&request).await {
            Ok(response) => {
                prompter.say(&format!("\n{}", format_order_response(&response)))?;
            }
            Err(e) => {
                error!("Order placement failed: {}", e);
                prompter.say(&format!("\n❌ Error: {}", format_error(&e)))?;
            }
        }

        Ok(())
    }

    /// One pass over the order prompts; `None` when input ends early
    fn prompt_order<R: BufRead, W: Write>(
        prompter: &mut Prompter<R, W>,
    ) -> Result<Option<RawOrderInput>> {
        let Some(symbol) = prompter.ask("\nEnter trading pair (e.g., BTCUSDT): ")? else {
            return Ok(None);
        };
        let Some(side) = prompter.ask("Enter side (BUY/SELL): ")? else {
            return Ok(None);
        };
        let Some(order_type) = prompter.ask("Enter order type (MARKET/LIMIT): ")? else {
            return Ok(None);
        };
        let Some(quantity) = prompter.ask("Enter quantity: ")? else {
            return Ok(None);
        };

        let price = if OrderType::from_str(&order_type).is_ok_and(|t| t.requires_price()) {
            match prompter.ask("Enter price: ")? {
                Some(price) => Some(price),
                None => return Ok(None),
            }
        } else {
            None
        };

        Ok(Some(RawOrderInput {
            symbol,
            side,
            order_type,
            quantity,
            price,
        }))
    }

    /// Validate and place an order without confirmation. Any failure is
    /// returned so the caller can exit non-zero. Input is validated before
    /// the exchange is contacted at all.
    pub async fn run_from_args<W: Write>(&self, raw: &RawOrderInput, output: &mut W) -> Result<()> {
        let request = validate_inputs(raw)?;

        if !self.client.test_connection().await {
            return Err(OrderError::ConnectionError(self.client.base_url().to_string()));
        }

        writeln!(
            output,
            "\n{}",
            format_order_summary("📋 ORDER REQUEST SUMMARY", &request)
        )?;
        writeln!(output, "\n🚀 Placing order...")?;

        let response = self.submit(&request).await?;
        if let Some((code, msg)) = response.embedded_error() {
            return Err(OrderError::OrderRejected {
                code,
                msg: msg.to_string(),
            });
        }

        writeln!(output, "\n{}", format_order_response(&response))?;
        Ok(())
    }

    /// Print the account's trading flag and non-zero balances
    pub async fn run_account<W: Write>(&self, output: &mut W) -> Result<()> {
        let account = self.client.get_account_info().await?;
        writeln!(output, "{}", format_account(&account))?;
        Ok(())
    }

    /// Print whether the exchange answers its liveness endpoint
    pub async fn run_ping<W: Write>(&self, output: &mut W) -> Result<()> {
        if !self.client.test_connection().await {
            return Err(OrderError::ConnectionError(self.client.base_url().to_string()));
        }
        writeln!(output, "✅ Connected to {}", self.client.base_url())?;
        Ok(())
    }

    /// Place a validated order and journal the outcome
    async fn submit(&self, request: &OrderRequest) -> Result<OrderResponse> {
        let result = self
            .client
            .place_order(
                &request.symbol,
                request.side,
                request.order_type,
                request.quantity,
                request.price,
            )
            .await;

        if let Some(journal) = &self.journal {
            let logged = match &result {
                Ok(response) => journal.log_submitted_order(request, response),
                Err(e) => journal.log_failed_order(request, &e.to_string()),
            };
            if let Err(e) = logged {
                warn!("Failed to write order journal {}: {}", journal.path().display(), e);
            }
        }

        result
    }
}
