use crate::{
    chain::ChainClient,
    error::{
        Result,
        StorefrontError,
    },
};
use alloy::primitives::Address;
use tracing::{
    info,
    warn,
};

/// Accounts of a connected client and the card contract bound through it.
/// Only built once every part is available.
pub struct Session<C: ChainClient> {
    accounts: Vec<Address>,
    contract: C::Contract,
}

impl<C: ChainClient> Session<C> {
    /// Checks the network, reads the accounts and binds the contract. A
    /// network mismatch stops before anything else is read.
    pub async fn connect(
        client: C,
        contract_address: Address,
        expected_network_id: u64,
    ) -> Result<Self> {
        let actual = client.network_id().await?;
        if actual != expected_network_id {
            warn!(expected = expected_network_id, actual, "wrong network");
            return Err(StorefrontError::NetworkMismatch {
                expected: expected_network_id,
                actual,
            });
        }
        let accounts = client.accounts().await?;
        if accounts.is_empty() {
            warn!("provider exposes no accounts; trading disabled");
        }
        let contract = client.bind(contract_address);
        info!(%contract_address, accounts = accounts.len(), "session ready");
        Ok(Self {
            accounts,
            contract,
        })
    }

    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    pub fn active_account(&self) -> Option<Address> {
        self.accounts.first().copied()
    }

    pub fn contract(&self) -> &C::Contract {
        &self.contract
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::test_helpers::{
        FakeChain,
        account,
    };
    use card_abi::{
        CONTRACT_ADDRESS,
        EXPECTED_CHAIN_ID,
    };

    #[tokio::test]
    async fn connect__expected_network__binds_contract_and_exposes_first_account() {
        // given
        let chain = FakeChain::sepolia().with_accounts(vec![account(5), account(6)]);

        // when
        let session = Session::connect(chain.clone(), CONTRACT_ADDRESS, EXPECTED_CHAIN_ID)
            .await
            .unwrap();

        // then
        assert_eq!(session.active_account(), Some(account(5)));
        assert_eq!(session.accounts().len(), 2);
        assert_eq!(chain.binds(), vec![CONTRACT_ADDRESS]);
    }

    #[tokio::test]
    async fn connect__wrong_network__binds_nothing_and_loads_nothing() {
        // given
        let chain = FakeChain::on_network(1);

        // when
        let result =
            Session::connect(chain.clone(), CONTRACT_ADDRESS, EXPECTED_CHAIN_ID).await;

        // then
        assert!(matches!(
            result,
            Err(StorefrontError::NetworkMismatch {
                expected: 11_155_111,
                actual: 1
            })
        ));
        assert!(chain.binds().is_empty());
        assert_eq!(chain.count_reads(), 0);
    }

    #[tokio::test]
    async fn connect__account_request_rejected__is_connection_error() {
        // given
        let chain = FakeChain::sepolia();
        chain.fail_accounts();

        // when
        let result =
            Session::connect(chain.clone(), CONTRACT_ADDRESS, EXPECTED_CHAIN_ID).await;

        // then
        assert!(matches!(result, Err(StorefrontError::Connection(_))));
        assert!(chain.binds().is_empty());
    }

    #[tokio::test]
    async fn connect__no_accounts__still_connects_without_active_account() {
        let chain = FakeChain::sepolia().with_accounts(Vec::new());

        let session = Session::connect(chain, CONTRACT_ADDRESS, EXPECTED_CHAIN_ID)
            .await
            .unwrap();

        assert_eq!(session.active_account(), None);
    }
}
