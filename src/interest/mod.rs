pub mod pricing;
pub mod reputation;

pub use pricing::InterestPolicy;
pub use reputation::{RateBracket, ReputationCalculator, ReputationConfig, ReputationReport};
