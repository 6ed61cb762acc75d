//! Resolves a connected chain client by trying candidates in order: an
//! unlocked keystore wallet, then a node named in the environment, then the
//! local development node.

use crate::{
    chain::{
        EvmClient,
        Signing,
    },
    error::{
        Result,
        StorefrontError,
    },
    wallets::{
        self,
        WalletDescriptor,
    },
};
use alloy::{
    network::EthereumWallet,
    providers::{
        Provider,
        ProviderBuilder,
    },
};
use std::future::Future;
use tracing::{
    debug,
    info,
};
use url::Url;

pub const DEFAULT_LOCAL_RPC_URL: &str = "http://127.0.0.1:9545";
pub const DEFAULT_SEPOLIA_RPC_URL: &str = "https://ethereum-sepolia-rpc.publicnode.com";
pub const NODE_URL_ENV: &str = "STOREFRONT_NODE_URL";

/// One step in the fallback chain. `Ok(None)` declines and lets the next
/// candidate try; `Err` stops resolution.
pub trait ProviderCandidate {
    type Client;

    fn label(&self) -> String;

    fn resolve(&self) -> impl Future<Output = Result<Option<Self::Client>>>;
}

/// Tries each candidate in order and returns the first client produced.
pub async fn resolve_first<C: ProviderCandidate>(candidates: &[C]) -> Result<C::Client> {
    for candidate in candidates {
        let label = candidate.label();
        debug!(candidate = %label, "trying provider candidate");
        if let Some(client) = candidate.resolve().await? {
            info!(candidate = %label, "provider resolved");
            return Ok(client);
        }
        debug!(candidate = %label, "provider candidate declined");
    }
    Err(StorefrontError::Connection(
        "no provider candidate produced a client".into(),
    ))
}

#[derive(Clone, Debug)]
pub enum Candidate {
    /// Keystore unlocked with a password prompt, signing locally.
    Keystore {
        wallet: WalletDescriptor,
        rpc_url: Url,
    },
    /// A node configured in the environment, used without authorization.
    EnvironmentNode { url: Option<Url> },
    /// Always available.
    LocalNode { url: Url },
}

#[derive(Clone, Debug, Default)]
pub struct ProviderSettings {
    pub wallet: Option<String>,
    pub wallet_dir: Option<String>,
    pub rpc_url: Option<Url>,
    pub node_url: Option<Url>,
}

impl ProviderSettings {
    /// Builds the ordered fallback chain. A named wallet that cannot be found
    /// is a connection failure rather than a silent fallback.
    pub fn candidates(&self) -> Result<Vec<Candidate>> {
        let mut candidates = Vec::with_capacity(3);
        if let Some(name) = &self.wallet {
            let dir = wallets::resolve_wallet_dir(self.wallet_dir.as_deref())?;
            let wallet = wallets::find_wallet(&dir, name)?;
            let rpc_url = match &self.rpc_url {
                Some(url) => url.clone(),
                None => parse_url(DEFAULT_SEPOLIA_RPC_URL)?,
            };
            candidates.push(Candidate::Keystore { wallet, rpc_url });
        }
        candidates.push(Candidate::EnvironmentNode {
            url: self.node_url.clone(),
        });
        candidates.push(Candidate::LocalNode {
            url: parse_url(DEFAULT_LOCAL_RPC_URL)?,
        });
        Ok(candidates)
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    raw.parse()
        .map_err(|e| StorefrontError::Connection(format!("invalid RPC URL {raw:?}: {e}")))
}

impl ProviderCandidate for Candidate {
    type Client = EvmClient;

    fn label(&self) -> String {
        match self {
            Candidate::Keystore { wallet, rpc_url } => {
                format!("keystore '{}' via {rpc_url}", wallet.name)
            }
            Candidate::EnvironmentNode { url: Some(url) } => format!("node {url}"),
            Candidate::EnvironmentNode { url: None } => format!("${NODE_URL_ENV} (unset)"),
            Candidate::LocalNode { url } => format!("local node {url}"),
        }
    }

    async fn resolve(&self) -> Result<Option<EvmClient>> {
        match self {
            Candidate::Keystore { wallet, rpc_url } => {
                let signer = wallets::unlock_wallet(wallet)?;
                let address = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .connect_http(rpc_url.clone())
                    .erased();
                Ok(Some(EvmClient::new(provider, Signing::Local(address))))
            }
            Candidate::EnvironmentNode { url: None } => Ok(None),
            Candidate::EnvironmentNode { url: Some(url) } | Candidate::LocalNode { url } => {
                let provider = ProviderBuilder::new().connect_http(url.clone()).erased();
                Ok(Some(EvmClient::new(provider, Signing::Node)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use std::sync::Mutex;

    struct FakeCandidate {
        name: &'static str,
        outcome: Result<Option<&'static str>>,
        tried: &'static Mutex<Vec<&'static str>>,
    }

    impl ProviderCandidate for FakeCandidate {
        type Client = &'static str;

        fn label(&self) -> String {
            self.name.to_string()
        }

        async fn resolve(&self) -> Result<Option<&'static str>> {
            self.tried.lock().unwrap().push(self.name);
            self.outcome.clone()
        }
    }

    fn leak_log() -> &'static Mutex<Vec<&'static str>> {
        Box::leak(Box::new(Mutex::new(Vec::new())))
    }

    #[tokio::test]
    async fn resolve_first__stops_at_first_client() {
        // given
        let tried = leak_log();
        let candidates = [
            FakeCandidate { name: "injected", outcome: Ok(None), tried },
            FakeCandidate { name: "legacy", outcome: Ok(Some("legacy-client")), tried },
            FakeCandidate { name: "local", outcome: Ok(Some("local-client")), tried },
        ];

        // when
        let client = resolve_first(&candidates).await;

        // then
        assert_eq!(client, Ok("legacy-client"));
        assert_eq!(*tried.lock().unwrap(), vec!["injected", "legacy"]);
    }

    #[tokio::test]
    async fn resolve_first__rejected_authorization__fails_without_fallback() {
        // given
        let tried = leak_log();
        let candidates = [
            FakeCandidate {
                name: "injected",
                outcome: Err(StorefrontError::Connection("user rejected".into())),
                tried,
            },
            FakeCandidate { name: "local", outcome: Ok(Some("local-client")), tried },
        ];

        // when
        let client = resolve_first(&candidates).await;

        // then
        assert_eq!(client, Err(StorefrontError::Connection("user rejected".into())));
        assert_eq!(*tried.lock().unwrap(), vec!["injected"]);
    }

    #[tokio::test]
    async fn resolve_first__all_decline__is_connection_error() {
        let tried = leak_log();
        let candidates = [FakeCandidate { name: "only", outcome: Ok(None), tried }];

        let client = resolve_first(&candidates).await;

        assert!(matches!(client, Err(StorefrontError::Connection(_))));
    }

    #[test]
    fn candidates__without_wallet__falls_back_to_environment_then_local() {
        // given
        let settings = ProviderSettings::default();

        // when
        let candidates = settings.candidates().unwrap();

        // then
        assert_eq!(candidates.len(), 2);
        assert!(matches!(candidates[0], Candidate::EnvironmentNode { url: None }));
        match &candidates[1] {
            Candidate::LocalNode { url } => assert_eq!(url.as_str(), "http://127.0.0.1:9545/"),
            other => panic!("expected local node, got {other:?}"),
        }
    }

    #[test]
    fn candidates__unknown_wallet__is_connection_error() {
        // given
        let settings = ProviderSettings {
            wallet: Some("ghost".into()),
            wallet_dir: Some("/nonexistent/storefront/keys".into()),
            ..ProviderSettings::default()
        };

        // when
        let result = settings.candidates();

        // then
        assert!(matches!(result, Err(StorefrontError::Connection(_))));
    }

    #[tokio::test]
    async fn environment_node_without_url__declines() {
        let candidate = Candidate::EnvironmentNode { url: None };
        assert!(candidate.resolve().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn local_node__resolves_to_node_signed_client() {
        // given
        let candidate = Candidate::LocalNode {
            url: DEFAULT_LOCAL_RPC_URL.parse().unwrap(),
        };

        // when
        let client = candidate.resolve().await.unwrap().unwrap();

        // then
        assert!(matches!(client.signing(), Signing::Node));
        assert_eq!(candidate.label(), "local node http://127.0.0.1:9545/");
    }
}
