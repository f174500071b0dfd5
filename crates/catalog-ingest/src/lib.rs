pub mod collector;
pub mod source;

pub use collector::Collector;
pub use source::{ProductSource, WooCommerceConfig, WooCommerceSource};
