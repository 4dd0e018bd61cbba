pub mod order_log;

pub use order_log::OrderLogger;
