pub mod exchange_client;
pub mod signer;

pub use exchange_client::ExchangeClient;
