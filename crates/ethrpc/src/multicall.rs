//! Packs independent read calls into a single `tryBlockAndAggregate` call on
//! a Multicall2 deployment and decodes the results position by position.
//!
//! Individual calls are allowed to fail: their slot decodes to `None`. Only a
//! failure of the aggregated request itself is an error.

use {
    crate::{AlloyProvider, errors::ContractErrorExt},
    alloy::{
        dyn_abi::{DynSolType, DynSolValue},
        eips::BlockId,
        primitives::{Address, Bytes, U256},
    },
    contracts::Multicall2,
    std::{
        collections::{HashMap, HashSet},
        hash::Hash,
    },
    thiserror::Error,
    tracing::instrument,
};

/// An encoded read request that has not been executed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCall {
    pub target: Address,
    pub call_data: Bytes,
}

/// Outcome of one [`BatchCall`], at the same position as the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub success: bool,
    pub return_data: Bytes,
}

#[derive(Debug, Clone)]
pub struct Aggregate {
    /// Block the calls were evaluated at, as reported by the aggregator.
    pub block: u64,
    pub results: Vec<BatchResult>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("misaligned batch: {calls} calls, {descriptors} type descriptors, {results} results")]
pub struct AlignmentError {
    pub calls: usize,
    pub descriptors: usize,
    pub results: usize,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Alignment(#[from] AlignmentError),
    #[error("aggregated request failed")]
    Node(#[source] alloy::contract::Error),
    #[error("aggregated request reverted: {}", reason.as_deref().unwrap_or("no reason"))]
    Reverted {
        reason: Option<String>,
        #[source]
        source: alloy::contract::Error,
    },
    #[error("aggregator reported block {0} which does not fit into 64 bits")]
    BlockNumber(U256),
    #[error("batch call {position} reuses the key of an earlier call")]
    DuplicateKey { position: usize },
}

impl From<alloy::contract::Error> for Error {
    fn from(err: alloy::contract::Error) -> Self {
        if err.is_node_error() {
            Self::Node(err)
        } else {
            Self::Reverted {
                reason: err.revert_reason(),
                source: err,
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    multicall: Multicall2::Multicall2Instance<AlloyProvider>,
}

impl Aggregator {
    /// Aggregator that tolerates failing sub-calls.
    pub fn new(address: Address, provider: AlloyProvider) -> Self {
        Self {
            multicall: Multicall2::new(address, provider),
        }
    }

    pub fn provider(&self) -> &AlloyProvider {
        self.multicall.provider()
    }

    /// Executes all `calls` in one round trip, against the latest block or,
    /// when `at_block` is given, against the state as of that block.
    #[instrument(skip_all, fields(calls = calls.len(), at_block = ?at_block))]
    pub async fn aggregate(
        &self,
        calls: &[BatchCall],
        at_block: Option<u64>,
    ) -> Result<Aggregate, Error> {
        let wire = calls
            .iter()
            .map(|call| Multicall2::Call {
                target: call.target,
                callData: call.call_data.clone(),
            })
            .collect::<Vec<_>>();

        let mut request = self.multicall.tryBlockAndAggregate(false, wire);
        if let Some(block) = at_block {
            request = request.block(BlockId::number(block));
        }
        let response = request.call().await?;

        let block = u64::try_from(response.blockNumber)
            .map_err(|_| Error::BlockNumber(response.blockNumber))?;
        let results = response
            .returnData
            .into_iter()
            .map(|result| BatchResult {
                success: result.success,
                return_data: result.returnData,
            })
            .collect::<Vec<_>>();
        if results.len() != calls.len() {
            return Err(AlignmentError {
                calls: calls.len(),
                descriptors: calls.len(),
                results: results.len(),
            }
            .into());
        }

        tracing::debug!(
            block,
            failed = results.iter().filter(|result| !result.success).count(),
            "aggregated calls"
        );
        Ok(Aggregate { block, results })
    }
}

/// Decodes every result with the descriptor at the same position.
///
/// Failed sub-calls decode to `None`. Return data that does not match its
/// descriptor also degrades to `None` instead of failing the batch.
pub fn decode(
    results: &[BatchResult],
    descriptors: &[DynSolType],
) -> Result<Vec<Option<DynSolValue>>, AlignmentError> {
    if results.len() != descriptors.len() {
        return Err(AlignmentError {
            calls: results.len(),
            descriptors: descriptors.len(),
            results: results.len(),
        });
    }
    Ok(results
        .iter()
        .zip(descriptors)
        .map(|(result, descriptor)| decode_one(result, descriptor))
        .collect())
}

fn decode_one(result: &BatchResult, descriptor: &DynSolType) -> Option<DynSolValue> {
    if !result.success {
        return None;
    }
    match descriptor.abi_decode(&result.return_data) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(?err, ?descriptor, data = %result.return_data, "undecodable return data");
            None
        }
    }
}

/// Calls keyed by a name instead of a position. The wire order is the
/// insertion order.
#[derive(Debug, Clone)]
pub struct Batch<K> {
    keys: Vec<K>,
    calls: Vec<BatchCall>,
    descriptors: Vec<DynSolType>,
}

impl<K> Default for Batch<K> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            calls: Vec::new(),
            descriptors: Vec::new(),
        }
    }
}

impl<K: Eq + Hash> Batch<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        key: K,
        target: Address,
        call_data: impl Into<Bytes>,
        descriptor: DynSolType,
    ) -> &mut Self {
        self.keys.push(key);
        self.calls.push(BatchCall {
            target,
            call_data: call_data.into(),
        });
        self.descriptors.push(descriptor);
        self
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub async fn execute(
        self,
        aggregator: &Aggregator,
        at_block: Option<u64>,
    ) -> Result<Decoded<K>, Error> {
        let mut seen = HashSet::with_capacity(self.keys.len());
        if let Some(position) = self.keys.iter().position(|key| !seen.insert(key)) {
            return Err(Error::DuplicateKey { position });
        }
        let aggregate = aggregator.aggregate(&self.calls, at_block).await?;
        let values = decode(&aggregate.results, &self.descriptors)?;
        Ok(Decoded {
            block: aggregate.block,
            values: self.keys.into_iter().zip(values).collect(),
        })
    }
}

/// Decoded results of a [`Batch`].
#[derive(Debug, Clone)]
pub struct Decoded<K> {
    pub block: u64,
    values: HashMap<K, Option<DynSolValue>>,
}

impl<K: Eq + Hash> Decoded<K> {
    pub fn get(&self, key: &K) -> Option<&DynSolValue> {
        self.values.get(key)?.as_ref()
    }

    pub fn uint(&self, key: &K) -> Option<U256> {
        self.get(key)?.as_uint().map(|(value, _)| value)
    }

    pub fn address(&self, key: &K) -> Option<Address> {
        self.get(key)?.as_address()
    }

    pub fn bool(&self, key: &K) -> Option<bool> {
        self.get(key)?.as_bool()
    }
}

/// Helpers to fake aggregator responses.
#[cfg(any(test, feature = "test-util"))]
pub mod testing {
    use alloy::{
        primitives::{B256, Bytes, U256},
        sol_types::SolValue,
    };

    /// ABI encoded `tryBlockAndAggregate` return data.
    pub fn aggregate_response(block: u64, results: Vec<(bool, Vec<u8>)>) -> Bytes {
        let results = results
            .into_iter()
            .map(|(success, data)| (success, Bytes::from(data)))
            .collect::<Vec<_>>();
        (U256::from(block), B256::ZERO, results)
            .abi_encode_params()
            .into()
    }
}
