//! Trait abstraction for the web service transport to enable mocking in tests

use super::types::{RpcRequest, RpcResponse};
use crate::error::TransportError;
use async_trait::async_trait;

/// Executes plugin web service calls
///
/// An `Ok` response may still describe a failed call; see
/// [`RpcResponse::is_failure`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(&self, request: RpcRequest) -> Result<RpcResponse, TransportError>;
}
