pub mod errors;
pub mod model;
pub mod predicate;
pub mod registry;
pub mod rule;
pub mod segment;
pub mod upstream;

pub use errors::*;
pub use model::*;
pub use predicate::*;
pub use registry::*;
pub use rule::Rule;
pub use segment::{evaluate, evaluate_request};
pub use upstream::*;
