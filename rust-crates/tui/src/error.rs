use thiserror::Error;

pub type Result<T, E = StorefrontError> = std::result::Result<T, E>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StorefrontError {
    #[error("failed to load web3, accounts, or contract: {0}")]
    Connection(String),

    #[error(
        "Please connect to the right Ethereum network (expected chain id {expected}, provider reports {actual})"
    )]
    NetworkMismatch { expected: u64, actual: u64 },

    #[error("failed to read cards: {0}")]
    Read(String),

    #[error("transaction failed: {0}")]
    Mutation(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no active account; unlock a wallet to trade")]
    NoActiveAccount,

    #[error("another transaction is still pending")]
    Busy,
}
