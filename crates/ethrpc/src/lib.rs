pub mod errors;
mod instrumentation;
pub mod multicall;

pub use multicall::{Aggregator, Batch, BatchCall, BatchResult, Decoded};
use {
    alloy::{
        providers::{DynProvider, Provider, ProviderBuilder},
        rpc::client::ClientBuilder,
    },
    instrumentation::InstrumentationLayer,
    url::Url,
};

pub type AlloyProvider = DynProvider;

/// Connects to the node at `url`. Every request is logged by the
/// instrumentation layer.
pub fn provider(url: &Url) -> AlloyProvider {
    let rpc = ClientBuilder::default()
        .layer(InstrumentationLayer)
        .http(url.clone());
    ProviderBuilder::new().connect_client(rpc).erased()
}

/// Provider answering from a queue of canned responses.
#[cfg(any(test, feature = "test-util"))]
pub fn mock_provider(asserter: alloy::providers::mock::Asserter) -> AlloyProvider {
    ProviderBuilder::new()
        .connect_mocked_client(asserter)
        .erased()
}
