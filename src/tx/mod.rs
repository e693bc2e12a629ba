//! Transaction preparation: gas policy and quote normalization

mod gas;
mod normalize;

pub use gas::GasPolicy;
pub use normalize::normalize_execution;
