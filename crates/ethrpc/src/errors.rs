use alloy::{
    contract::Error as ContractError,
    primitives::Bytes,
    transports::{RpcError, TransportError},
};

pub trait ContractErrorExt {
    /// Returns whether a given error is a contract error, this is considered to
    /// be all errors except the transport error where there is no revert data.
    fn is_contract_error(&self) -> bool;

    /// Returns whether a given error is a node error.
    fn is_node_error(&self) -> bool;

    /// Human readable revert reason, if the node returned one that decodes.
    fn revert_reason(&self) -> Option<String>;
}

impl ContractErrorExt for ContractError {
    fn is_contract_error(&self) -> bool {
        !self.is_node_error()
    }

    fn is_node_error(&self) -> bool {
        match self {
            ContractError::TransportError(err) => err.is_node_error(),
            _ => false,
        }
    }

    fn revert_reason(&self) -> Option<String> {
        match self {
            ContractError::TransportError(err) => err.revert_reason(),
            _ => None,
        }
    }
}

impl ContractErrorExt for TransportError {
    fn is_contract_error(&self) -> bool {
        !self.is_node_error()
    }

    fn is_node_error(&self) -> bool {
        // A revert always comes back as an error response carrying revert data,
        // possibly empty. Anything else is the node or the connection failing.
        match self {
            RpcError::ErrorResp(err) => {
                let no_revert_data = err.as_revert_data().is_none();
                tracing::debug!(?err, %no_revert_data, "transport rpc error");
                no_revert_data
            }
            _ => true,
        }
    }

    fn revert_reason(&self) -> Option<String> {
        let data: Bytes = match self {
            RpcError::ErrorResp(err) => err.as_revert_data()?,
            _ => return None,
        };
        alloy::sol_types::decode_revert_reason(&data)
    }
}

/// Turns a reverted call into `None` while keeping node failures as errors.
pub fn ignore_non_node_error<T>(
    result: Result<T, ContractError>,
) -> Result<Option<T>, ContractError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_node_error() => Err(err),
        Err(err) => {
            tracing::debug!(?err, "ignoring contract error");
            Ok(None)
        }
    }
}

/// Create an arbitrary alloy error that will convert into a "contract" error.
/// Useful for testing.
#[cfg(any(test, feature = "test-util"))]
pub fn testing_alloy_contract_error() -> ContractError {
    ContractError::NotADeploymentTransaction
}

/// Create an arbitrary alloy error that will convert into a "node" error.
/// Useful for testing.
#[cfg(any(test, feature = "test-util"))]
pub fn testing_alloy_node_error() -> ContractError {
    ContractError::TransportError(TransportError::ErrorResp(
        alloy::rpc::json_rpc::ErrorPayload::internal_error(),
    ))
}
