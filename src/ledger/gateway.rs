//! HTTP ledger gateway client
//!
//! Talks JSON to a gateway service that owns keys, ABI encoding and
//! broadcast. One POST per ledger call; the HTTP timeout is the call timeout.

use crate::error::LedgerError;
use crate::ledger::{Artifact, DeployedContract, LedgerClient, Receipt, SignerSpec, Value};
use crate::types::{serde_amount, Address, Amount, NetworkId};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Gateway-backed ledger client for one network
pub struct GatewayLedgerClient {
    client: Client,
    base_url: String,
    network: NetworkId,
}

#[derive(Debug, Serialize)]
struct ReadRequest<'a> {
    network: &'a str,
    contract: &'a str,
    function: &'a str,
    args: &'a [Value],
}

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    network: &'a str,
    contract: &'a str,
    signer: &'a SignerSpec,
    function: &'a str,
    args: &'a [Value],
}

#[derive(Debug, Serialize)]
struct DeployRequest<'a> {
    network: &'a str,
    name: &'a str,
    signer: &'a SignerSpec,
    artifact: &'a Artifact,
    args: &'a [Value],
}

#[derive(Debug, Serialize)]
struct TransferRequest<'a> {
    network: &'a str,
    to: &'a Address,
    from: &'a SignerSpec,
    #[serde(with = "serde_amount")]
    amount: Amount,
}

#[derive(Debug, Serialize)]
struct BalanceRequest<'a> {
    network: &'a str,
    address: &'a Address,
}

#[derive(Debug, Deserialize)]
struct ReadResponse {
    value: Value,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    #[serde(with = "serde_amount")]
    balance: Amount,
}

impl GatewayLedgerClient {
    pub fn new(
        base_url: impl Into<String>,
        network: impl Into<NetworkId>,
        timeout: Duration,
    ) -> Result<Self, LedgerError> {
        let base_url = base_url.into();
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            LedgerError::Read {
                contract: "-".to_string(),
                function: "connect".to_string(),
                message: format!("Failed to build HTTP client for {}: {}", base_url, e),
            }
        })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            network: network.into(),
        })
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// POST a JSON body and decode the JSON reply; errors are returned as text
    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, String> {
        let url = self.endpoint(path);
        debug!(url = %url, "Gateway request");
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request to {} failed: {}", url, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(format!("gateway returned {}: {}", status, error_text));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| format!("failed to parse gateway response: {}", e))
    }
}

#[async_trait]
impl LedgerClient for GatewayLedgerClient {
    #[instrument(skip(self, args), fields(network = %self.network))]
    async fn read(
        &self,
        contract: &str,
        function: &str,
        args: &[Value],
    ) -> Result<Value, LedgerError> {
        let request = ReadRequest {
            network: &self.network,
            contract,
            function,
            args,
        };
        let response: ReadResponse =
            self.post("read", &request)
                .await
                .map_err(|message| LedgerError::Read {
                    contract: contract.to_string(),
                    function: function.to_string(),
                    message,
                })?;
        Ok(response.value)
    }

    #[instrument(skip(self, args, signer), fields(network = %self.network, from = %signer.from))]
    async fn execute(
        &self,
        contract: &str,
        signer: &SignerSpec,
        function: &str,
        args: &[Value],
    ) -> Result<Receipt, LedgerError> {
        let request = ExecuteRequest {
            network: &self.network,
            contract,
            signer,
            function,
            args,
        };
        self.post("execute", &request)
            .await
            .map_err(|message| LedgerError::Write {
                contract: contract.to_string(),
                function: function.to_string(),
                message,
            })
    }

    #[instrument(skip(self, args, signer, artifact), fields(network = %self.network, artifact = %artifact.name))]
    async fn deploy(
        &self,
        name: &str,
        signer: &SignerSpec,
        artifact: &Artifact,
        args: &[Value],
    ) -> Result<DeployedContract, LedgerError> {
        let request = DeployRequest {
            network: &self.network,
            name,
            signer,
            artifact,
            args,
        };
        self.post("deploy", &request)
            .await
            .map_err(|message| LedgerError::Deploy {
                name: name.to_string(),
                message,
            })
    }

    #[instrument(skip(self, from), fields(network = %self.network))]
    async fn raw_transfer(
        &self,
        to: &Address,
        from: &SignerSpec,
        amount: Amount,
    ) -> Result<Receipt, LedgerError> {
        let request = TransferRequest {
            network: &self.network,
            to,
            from,
            amount,
        };
        self.post("transfer", &request)
            .await
            .map_err(|message| LedgerError::Transfer {
                to: to.canonical(),
                message,
            })
    }

    #[instrument(skip(self), fields(network = %self.network))]
    async fn native_balance(&self, address: &Address) -> Result<Amount, LedgerError> {
        let request = BalanceRequest {
            network: &self.network,
            address,
        };
        let response: BalanceResponse =
            self.post("balance", &request)
                .await
                .map_err(|message| LedgerError::Read {
                    contract: address.canonical(),
                    function: "balance".to_string(),
                    message,
                })?;
        Ok(response.balance)
    }
}
