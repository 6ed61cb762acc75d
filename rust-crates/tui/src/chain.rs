//! The seam between the storefront and the chain: a connected client that can
//! report its network and accounts, and the card contract it binds to.

use crate::error::{
    Result,
    StorefrontError,
};
use alloy::{
    primitives::{
        Address,
        TxHash,
        U256,
    },
    providers::{
        DynProvider,
        Provider,
    },
};
use card_abi::card_types::NBATradingCards;
use std::future::Future;
use tracing::debug;

/// A card record exactly as the contract returns it, price in wei.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawCard {
    pub id: U256,
    pub name: String,
    pub price: U256,
    pub owner: Address,
    pub is_listed: bool,
}

impl From<NBATradingCards::Card> for RawCard {
    fn from(card: NBATradingCards::Card) -> Self {
        Self {
            id: card.id,
            name: card.name,
            price: card.price,
            owner: card.owner,
            is_listed: card.isListed,
        }
    }
}

pub trait ChainClient: Send + Sync {
    type Contract: CardContract + 'static;

    fn network_id(&self) -> impl Future<Output = Result<u64>> + Send;

    fn accounts(&self) -> impl Future<Output = Result<Vec<Address>>> + Send;

    fn bind(&self, address: Address) -> Self::Contract;
}

pub trait CardContract: Send + Sync {
    fn card_count(&self) -> impl Future<Output = Result<U256>> + Send;

    fn card(&self, index: U256) -> impl Future<Output = Result<RawCard>> + Send;

    /// Submits `listCard` and waits for the receipt.
    fn list_card(
        &self,
        from: Address,
        name: String,
        price: U256,
    ) -> impl Future<Output = Result<TxHash>> + Send;

    /// Submits `buyCard` with `value` attached and waits for the receipt.
    fn buy_card(
        &self,
        from: Address,
        id: U256,
        value: U256,
    ) -> impl Future<Output = Result<TxHash>> + Send;
}

/// Where transactions get signed.
#[derive(Clone, Debug)]
pub enum Signing {
    /// Unlocked keystore; the only account is the signer's address.
    Local(Address),
    /// The node signs for the accounts it manages (`eth_accounts`).
    Node,
}

#[derive(Clone)]
pub struct EvmClient {
    provider: DynProvider,
    signing: Signing,
}

impl EvmClient {
    pub fn new(provider: DynProvider, signing: Signing) -> Self {
        Self { provider, signing }
    }

    pub fn signing(&self) -> &Signing {
        &self.signing
    }
}

impl ChainClient for EvmClient {
    type Contract = EvmCardContract;

    async fn network_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| StorefrontError::Connection(format!("reading chain id: {e}")))
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        match &self.signing {
            Signing::Local(address) => Ok(vec![*address]),
            Signing::Node => self.provider.get_accounts().await.map_err(|e| {
                StorefrontError::Connection(format!("reading accounts: {e}"))
            }),
        }
    }

    fn bind(&self, address: Address) -> EvmCardContract {
        EvmCardContract {
            instance: card_abi::card_contract(address, self.provider.clone()),
        }
    }
}

#[derive(Clone)]
pub struct EvmCardContract {
    instance: NBATradingCards::NBATradingCardsInstance<DynProvider>,
}

impl CardContract for EvmCardContract {
    async fn card_count(&self) -> Result<U256> {
        self.instance
            .getCardCount()
            .call()
            .await
            .map_err(|e| StorefrontError::Read(format!("getCardCount: {e}")))
    }

    async fn card(&self, index: U256) -> Result<RawCard> {
        let card = self
            .instance
            .getCard(index)
            .call()
            .await
            .map_err(|e| StorefrontError::Read(format!("getCard({index}): {e}")))?;
        Ok(card.into())
    }

    async fn list_card(&self, from: Address, name: String, price: U256) -> Result<TxHash> {
        let pending = self
            .instance
            .listCard(name, price)
            .from(from)
            .send()
            .await
            .map_err(|e| StorefrontError::Mutation(format!("listCard: {e}")))?;
        debug!(tx = %pending.tx_hash(), "listCard submitted");
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| StorefrontError::Mutation(format!("listCard receipt: {e}")))?;
        if !receipt.status() {
            return Err(StorefrontError::Mutation(format!(
                "listCard reverted in {}",
                receipt.transaction_hash
            )));
        }
        Ok(receipt.transaction_hash)
    }

    async fn buy_card(&self, from: Address, id: U256, value: U256) -> Result<TxHash> {
        let pending = self
            .instance
            .buyCard(id)
            .from(from)
            .value(value)
            .send()
            .await
            .map_err(|e| StorefrontError::Mutation(format!("buyCard({id}): {e}")))?;
        debug!(tx = %pending.tx_hash(), "buyCard submitted");
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| StorefrontError::Mutation(format!("buyCard receipt: {e}")))?;
        if !receipt.status() {
            return Err(StorefrontError::Mutation(format!(
                "buyCard({id}) reverted in {}",
                receipt.transaction_hash
            )));
        }
        Ok(receipt.transaction_hash)
    }
}
