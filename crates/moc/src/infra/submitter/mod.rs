//! Signs, broadcasts and confirms state changing calls.
//!
//! There is no retry anywhere in here. A submission either confirms, is still
//! pending when the confirmation timeout expires, or fails with the step that
//! broke.

use {
    alloy::{
        consensus::TxEnvelope,
        network::{Ethereum, EthereumWallet, TransactionBuilder, TransactionBuilderError},
        primitives::{Address, Bytes, TxHash, U256},
        providers::{PendingTransactionBuilder, PendingTransactionError, Provider, WatchTxError},
        rpc::types::{TransactionReceipt, TransactionRequest},
        transports::{TransportError, TransportErrorKind},
    },
    bigdecimal::{BigDecimal, RoundingMode, ToPrimitive},
    ethrpc::{AlloyProvider, errors::ContractErrorExt},
    serde::Serialize,
    std::{sync::Arc, time::Duration},
    thiserror::Error,
    tracing::instrument,
};

pub mod events;

pub use events::{EventRegistry, FilteredEvent};

/// The node operations a submission goes through.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Node: Send + Sync {
    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64, TransportError>;

    async fn gas_price(&self) -> Result<u128, TransportError>;

    async fn nonce(&self, account: Address) -> Result<u64, TransportError>;

    async fn chain_id(&self) -> Result<u64, TransportError>;

    async fn broadcast(&self, tx: TxEnvelope) -> Result<TxHash, TransportError>;

    /// Waits for the receipt of `tx_hash`. Returns `None` when `timeout`
    /// expires first.
    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        timeout: Option<Duration>,
    ) -> Result<Option<TransactionReceipt>, TransportError>;
}

#[async_trait::async_trait]
impl Node for AlloyProvider {
    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64, TransportError> {
        Provider::estimate_gas(self, tx).await
    }

    async fn gas_price(&self) -> Result<u128, TransportError> {
        self.get_gas_price().await
    }

    async fn nonce(&self, account: Address) -> Result<u64, TransportError> {
        self.get_transaction_count(account).pending().await
    }

    async fn chain_id(&self) -> Result<u64, TransportError> {
        self.get_chain_id().await
    }

    async fn broadcast(&self, tx: TxEnvelope) -> Result<TxHash, TransportError> {
        let pending = self.send_tx_envelope(tx).await?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        timeout: Option<Duration>,
    ) -> Result<Option<TransactionReceipt>, TransportError> {
        let pending = PendingTransactionBuilder::<Ethereum>::new(self.root().clone(), tx_hash)
            .with_timeout(timeout);
        match pending.get_receipt().await {
            Ok(receipt) => Ok(Some(receipt)),
            Err(PendingTransactionError::TxWatcher(WatchTxError::Timeout)) => Ok(None),
            Err(PendingTransactionError::TransportError(err)) => Err(err),
            Err(err) => Err(TransportErrorKind::custom(err)),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("gas estimation failed: {}", reason.as_deref().unwrap_or("no revert reason"))]
    GasEstimation {
        reason: Option<String>,
        #[source]
        source: TransportError,
    },
    #[error("gas limit {0} does not fit into 64 bits")]
    GasLimit(BigDecimal),
    #[error("node request failed")]
    Node(#[source] TransportError),
    #[error("failed to sign transaction")]
    Signing(#[source] TransactionBuilderError<Ethereum>),
    #[error("failed to broadcast transaction")]
    Broadcast(#[source] TransportError),
    #[error("transaction {tx_hash} reverted")]
    Reverted {
        tx_hash: TxHash,
        receipt: Box<TransactionReceipt>,
    },
    #[error("transaction {tx_hash} ran out of gas, limit was {gas_limit}")]
    OutOfGas {
        tx_hash: TxHash,
        gas_limit: u64,
        receipt: Box<TransactionReceipt>,
    },
}

/// An encoded call to a protocol contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub to: Address,
    pub data: Bytes,
    /// Native value attached to the transaction, in wei.
    pub value: U256,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Submission {
    Confirmed {
        receipt: Box<TransactionReceipt>,
        events: Vec<FilteredEvent>,
    },
    /// The confirmation timeout expired. The transaction may still be mined.
    PendingConfirmation { tx_hash: TxHash },
}

pub struct Submitter {
    node: Arc<dyn Node>,
    wallet: EthereumWallet,
    sender: Address,
    gas_multiplier: BigDecimal,
    confirmation_timeout: Option<Duration>,
    events: EventRegistry,
}

impl Submitter {
    pub fn new(
        node: Arc<dyn Node>,
        wallet: EthereumWallet,
        sender: Address,
        gas_multiplier: BigDecimal,
        confirmation_timeout: Option<Duration>,
        events: EventRegistry,
    ) -> Self {
        Self {
            node,
            wallet,
            sender,
            gas_multiplier,
            confirmation_timeout,
            events,
        }
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    #[instrument(skip_all, fields(to = %call.to, value = %call.value))]
    pub async fn submit(&self, call: Call) -> Result<Submission, Error> {
        let tx = TransactionRequest::default()
            .with_from(self.sender)
            .with_to(call.to)
            .with_input(call.data)
            .with_value(call.value);

        let estimate = self
            .node
            .estimate_gas(tx.clone())
            .await
            .map_err(|source| Error::GasEstimation {
                reason: source.revert_reason(),
                source,
            })?;
        let gas_limit = gas_limit(estimate, &self.gas_multiplier)?;
        let gas_price = self.node.gas_price().await.map_err(Error::Node)?;
        let nonce = self.node.nonce(self.sender).await.map_err(Error::Node)?;
        let chain_id = self.node.chain_id().await.map_err(Error::Node)?;
        tracing::debug!(estimate, gas_limit, gas_price, nonce, "prepared transaction");

        let envelope = tx
            .with_gas_limit(gas_limit)
            .with_gas_price(gas_price)
            .with_nonce(nonce)
            .with_chain_id(chain_id)
            .build(&self.wallet)
            .await
            .map_err(Error::Signing)?;
        let tx_hash = self
            .node
            .broadcast(envelope)
            .await
            .map_err(Error::Broadcast)?;
        tracing::info!(?tx_hash, "transaction sent, waiting for confirmation");

        let Some(receipt) = self
            .node
            .wait_for_receipt(tx_hash, self.confirmation_timeout)
            .await
            .map_err(Error::Node)?
        else {
            tracing::warn!(?tx_hash, "transaction not confirmed in time");
            return Ok(Submission::PendingConfirmation { tx_hash });
        };

        if !receipt.status() {
            return Err(if receipt.gas_used >= gas_limit {
                Error::OutOfGas {
                    tx_hash,
                    gas_limit,
                    receipt: Box::new(receipt),
                }
            } else {
                Error::Reverted {
                    tx_hash,
                    receipt: Box::new(receipt),
                }
            });
        }

        let events = self.events.filter(receipt.inner.logs());
        tracing::info!(?tx_hash, gas_used = receipt.gas_used, events = events.len(), "transaction confirmed");
        Ok(Submission::Confirmed {
            receipt: Box::new(receipt),
            events,
        })
    }
}

/// `ceil(estimate * multiplier)`
fn gas_limit(estimate: u64, multiplier: &BigDecimal) -> Result<u64, Error> {
    let limit = (BigDecimal::from(estimate) * multiplier).with_scale_round(0, RoundingMode::Ceiling);
    limit.to_u64().ok_or(Error::GasLimit(limit))
}
