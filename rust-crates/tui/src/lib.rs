pub mod catalog;
pub mod chain;
pub mod error;
pub mod market;
pub mod provider;
pub mod session;
pub mod state;
pub mod units;
pub mod wallets;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use error::{
    Result,
    StorefrontError,
};
