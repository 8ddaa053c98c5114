//! The seam between the compile session and the network.

use async_trait::async_trait;
use fsm_compiler_client::{Client, CompileRequest, CompileResponse};

use crate::error::Result;

/// Sends one compile request and returns the decoded response.
///
/// Implementations must issue exactly one request per call and must not retry.
#[async_trait]
pub trait CompileTransport: Send + Sync + 'static {
    async fn compile(&self, request: CompileRequest) -> Result<CompileResponse>;
}

#[async_trait]
impl CompileTransport for Client {
    async fn compile(&self, request: CompileRequest) -> Result<CompileResponse> {
        Ok(Client::compile(self, request).await?)
    }
}
