pub mod balance;
pub mod commission;
pub mod mode;
pub mod operation;
pub mod snapshot;
pub mod token;
pub mod vendor;

pub use {
    balance::UserBalance,
    commission::{CommissionQuote, Payment},
    mode::{Action, Mode, PaymentAsset, TokenKind},
    operation::{Operations, Settings, Verification},
    snapshot::{Field, StateSnapshot, Unavailable},
    token::{Token, Tokens},
    vendor::Vendor,
};

use {
    crate::infra::{config, contracts, protocol, submitter},
    number::PrecisionError,
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] config::Error),
    #[error(transparent)]
    Contracts(#[from] contracts::Error),
    #[error(transparent)]
    Protocol(#[from] protocol::Error),
    #[error(transparent)]
    Submission(#[from] submitter::Error),
    #[error(transparent)]
    Verification(#[from] Verification),
    #[error(transparent)]
    Precision(#[from] PrecisionError),
    #[error(transparent)]
    Unavailable(#[from] Unavailable),
    #[error("the {0} balance could not be read")]
    BalanceUnavailable(&'static str),
    #[error("operation requires a {expected} deployment but this one is {actual}")]
    WrongMode { expected: Mode, actual: Mode },
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}
