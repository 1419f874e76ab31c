//! Retry loop and failure classification.
//!
//! Every network step runs through [`RetryDriver`]; the step itself decides
//! whether a failure is fatal, usually via [`classify`].

pub mod classify;
mod driver;

pub use classify::{classify_bootstrap, is_policy_exists};
pub use driver::{Attempt, RetryDriver};
