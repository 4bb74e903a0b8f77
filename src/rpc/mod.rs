//! Web service transport for the plugin's ajax methods

mod client;
mod traits;
mod types;

pub use client::AjaxClient;
pub use traits::RpcTransport;
pub use types::{
    PublishTeamArgs, RpcException, RpcRequest, RpcResponse, SubmitMessageArgs, PUBLISH_TEAM,
    SUBMIT_MESSAGE,
};

#[cfg(test)]
pub use traits::MockRpcTransport;

use crate::error::TransportError;
use crate::state::Generation;
use serde_json::Value;

/// A request tagged with the lifecycle generation that issued it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub generation: Generation,
    pub request: RpcRequest,
}

/// The result of an [`Outbound`] request, still carrying its tag
#[derive(Debug, Clone)]
pub struct Completion {
    pub generation: Generation,
    pub result: Result<RpcResponse, TransportError>,
}

impl Completion {
    pub fn new(generation: Generation, result: Result<RpcResponse, TransportError>) -> Self {
        Self { generation, result }
    }

    /// Success data, or the error text of the failed call if it had one
    pub fn outcome(self) -> Result<Value, Option<String>> {
        match self.result {
            Ok(response) if !response.is_failure() => Ok(response.data),
            Ok(response) => Err(response.exception_message().map(str::to_string)),
            Err(_) => Err(None),
        }
    }
}

/// Execute one outbound request
pub async fn dispatch<T: RpcTransport + ?Sized>(transport: &T, outbound: Outbound) -> Completion {
    let Outbound {
        generation,
        request,
    } = outbound;
    let method = request.method();
    tracing::debug!(method, %generation, "dispatching request");

    let result = transport.call(request).await;
    match &result {
        Ok(response) if response.is_failure() => {
            tracing::warn!(
                method,
                %generation,
                message = ?response.exception_message(),
                "call reported an error"
            );
        }
        Ok(_) => tracing::debug!(method, %generation, "call succeeded"),
        Err(e) => tracing::warn!(method, %generation, error = %e, "transport failure"),
    }

    Completion { generation, result }
}
