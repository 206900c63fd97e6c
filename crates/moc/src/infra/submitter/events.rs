//! Decoding of receipt logs against the ABIs of the protocol contracts.

use {
    alloy::{
        dyn_abi::{DynSolValue, EventExt},
        json_abi::{Event, JsonAbi},
        primitives::{Address, B256},
        rpc::types::Log,
    },
    serde::{Deserialize, Serialize},
    std::{
        collections::HashMap,
        path::{Path, PathBuf},
    },
    thiserror::Error,
};

/// Events worth reporting back to the user. Everything else the receipt
/// contains is dropped.
pub const ALLOWED_EVENTS: &[&str] = &[
    "StableTokenMint",
    "StableTokenRedeem",
    "FreeStableTokenRedeem",
    "RiskProWithDiscountMint",
    "RiskProMint",
    "RiskProRedeem",
    "RiskProxMint",
    "RiskProxRedeem",
    "Transfer",
    "Approval",
    "VendorReceivedMarkup",
    "VendorStakeAdded",
    "VendorStakeRemoved",
    "TCMinted",
    "TCRedeemed",
    "TPMinted",
    "TPRedeemed",
    "TPSwappedForTP",
    "TPSwappedForTC",
    "TCSwappedForTP",
    "TCandTPRedeemed",
    "TCandTPMinted",
    "PeggedTokenChange",
    "SuccessFeeDistributed",
    "TPemaUpdated",
    "TCMintedWithWrapper",
    "TCRedeemedWithWrapper",
    "TPMintedWithWrapper",
    "TPRedeemedWithWrapper",
    "TCandTPMintedWithWrapper",
    "TCandTPRedeemedWithWrapper",
    "TPSwappedForTPWithWrapper",
    "TPSwappedForTCWithWrapper",
    "TCSwappedForTPWithWrapper",
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read ABI document {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed ABI document {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Either a bare ABI array or a build artifact carrying one.
#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Abi(JsonAbi),
    Artifact { abi: JsonAbi },
}

impl From<Document> for JsonAbi {
    fn from(document: Document) -> Self {
        match document {
            Document::Abi(abi) | Document::Artifact { abi } => abi,
        }
    }
}

/// Log entry of an allowed event, decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilteredEvent {
    pub name: String,
    pub address: Address,
    pub fields: Vec<EventField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventField {
    pub name: String,
    pub value: String,
}

/// Event definitions indexed by their topic 0.
#[derive(Debug, Clone, Default)]
pub struct EventRegistry {
    events: HashMap<B256, Vec<Event>>,
}

impl EventRegistry {
    pub fn new(abis: impl IntoIterator<Item = JsonAbi>) -> Self {
        let mut registry = Self::default();
        for abi in abis {
            for event in abi.events().filter(|event| !event.anonymous) {
                let candidates = registry.events.entry(event.selector()).or_default();
                // The same token events show up in several documents.
                if !candidates.contains(event) {
                    candidates.push(event.clone());
                }
            }
        }
        registry
    }

    /// Reads `<dir>/<name>.json` for every name.
    pub async fn load(dir: &Path, names: &[&str]) -> Result<Self, LoadError> {
        let mut abis = Vec::with_capacity(names.len());
        for name in names {
            let path = dir.join(format!("{name}.json"));
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| LoadError::Read {
                    path: path.clone(),
                    source,
                })?;
            let document: Document = serde_json::from_str(&content)
                .map_err(|source| LoadError::Parse { path, source })?;
            abis.push(document.into());
        }
        tracing::debug!(documents = abis.len(), "loaded event ABIs");
        Ok(Self::new(abis))
    }

    /// Decodes the logs this registry knows about and keeps the allowed ones,
    /// in log order.
    pub fn filter(&self, logs: &[Log]) -> Vec<FilteredEvent> {
        logs.iter()
            .filter_map(|log| self.decode(log))
            .filter(|event| ALLOWED_EVENTS.contains(&event.name.as_str()))
            .collect()
    }

    fn decode(&self, log: &Log) -> Option<FilteredEvent> {
        let selector = log.inner.data.topics().first()?;
        self.events.get(selector)?.iter().find_map(|event| {
            let decoded = event.decode_log(&log.inner.data).ok()?;
            let mut indexed = decoded.indexed.into_iter();
            let mut body = decoded.body.into_iter();
            let fields = event
                .inputs
                .iter()
                .map(|input| {
                    let value = if input.indexed {
                        indexed.next()
                    } else {
                        body.next()
                    };
                    value.map(|value| EventField {
                        name: input.name.clone(),
                        value: render(&value),
                    })
                })
                .collect::<Option<Vec<_>>>()?;
            Some(FilteredEvent {
                name: event.name.clone(),
                address: log.inner.address,
                fields,
            })
        })
    }
}

fn render(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(value) => value.to_string(),
        DynSolValue::Int(value, _) => value.to_string(),
        DynSolValue::Uint(value, _) => value.to_string(),
        DynSolValue::Address(value) => value.to_checksum(None),
        DynSolValue::FixedBytes(value, size) => alloy::hex::encode_prefixed(&value[..*size]),
        DynSolValue::Bytes(value) => alloy::hex::encode_prefixed(value),
        DynSolValue::String(value) => value.clone(),
        other => format!("{other:?}"),
    }
}
