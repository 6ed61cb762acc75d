//! In-memory chain used by unit and integration tests. Behaves like the
//! deployed card contract and records every call it receives.

use crate::{
    chain::{
        CardContract,
        ChainClient,
        RawCard,
    },
    error::{
        Result,
        StorefrontError,
    },
};
use alloy::primitives::{
    Address,
    TxHash,
    U256,
};
use card_abi::EXPECTED_CHAIN_ID;
use std::sync::{
    Arc,
    Mutex,
};

pub fn account(n: u64) -> Address {
    Address::left_padding_from(&n.to_be_bytes())
}

pub fn raw_card(id: u64, name: &str, price_wei: u128, owner: u64, is_listed: bool) -> RawCard {
    RawCard {
        id: U256::from(id),
        name: name.to_string(),
        price: U256::from(price_wei),
        owner: account(owner),
        is_listed,
    }
}

#[derive(Debug, Default)]
struct FakeState {
    network_id: u64,
    accounts: Vec<Address>,
    cards: Vec<RawCard>,
    binds: Vec<Address>,
    count_reads: usize,
    card_reads: Vec<u64>,
    fail_card_read_at: Option<u64>,
    fail_accounts: bool,
    revert_next_mutation: bool,
    list_calls: Vec<(Address, String, U256)>,
    buy_calls: Vec<(Address, U256, U256)>,
    tx_counter: u64,
}

impl FakeState {
    fn next_tx(&mut self) -> TxHash {
        self.tx_counter += 1;
        TxHash::left_padding_from(&self.tx_counter.to_be_bytes())
    }
}

#[derive(Clone, Debug)]
pub struct FakeChain {
    state: Arc<Mutex<FakeState>>,
}

impl FakeChain {
    pub fn on_network(network_id: u64) -> Self {
        let state = FakeState {
            network_id,
            accounts: vec![account(1)],
            ..FakeState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn sepolia() -> Self {
        Self::on_network(EXPECTED_CHAIN_ID)
    }

    pub fn with_accounts(self, accounts: Vec<Address>) -> Self {
        self.lock().accounts = accounts;
        self
    }

    pub fn contract(&self) -> FakeContract {
        FakeContract {
            state: self.state.clone(),
        }
    }

    pub fn push_card(&self, card: RawCard) {
        self.lock().cards.push(card);
    }

    pub fn set_owner(&self, index: usize, owner: Address, is_listed: bool) {
        let mut state = self.lock();
        state.cards[index].owner = owner;
        state.cards[index].is_listed = is_listed;
    }

    pub fn fail_card_read_at(&self, index: u64) {
        self.lock().fail_card_read_at = Some(index);
    }

    pub fn fail_accounts(&self) {
        self.lock().fail_accounts = true;
    }

    pub fn revert_next_mutation(&self) {
        self.lock().revert_next_mutation = true;
    }

    pub fn binds(&self) -> Vec<Address> {
        self.lock().binds.clone()
    }

    /// Number of `getCardCount` calls, i.e. catalog loads started.
    pub fn count_reads(&self) -> usize {
        self.lock().count_reads
    }

    pub fn card_reads(&self) -> Vec<u64> {
        self.lock().card_reads.clone()
    }

    pub fn list_calls(&self) -> Vec<(Address, String, U256)> {
        self.lock().list_calls.clone()
    }

    pub fn buy_calls(&self) -> Vec<(Address, U256, U256)> {
        self.lock().buy_calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake chain state poisoned")
    }
}

impl ChainClient for FakeChain {
    type Contract = FakeContract;

    async fn network_id(&self) -> Result<u64> {
        Ok(self.lock().network_id)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        let state = self.lock();
        if state.fail_accounts {
            return Err(StorefrontError::Connection("user rejected the request".into()));
        }
        Ok(state.accounts.clone())
    }

    fn bind(&self, address: Address) -> FakeContract {
        self.lock().binds.push(address);
        self.contract()
    }
}

#[derive(Clone, Debug)]
pub struct FakeContract {
    state: Arc<Mutex<FakeState>>,
}

impl FakeContract {
    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake chain state poisoned")
    }
}

impl CardContract for FakeContract {
    async fn card_count(&self) -> Result<U256> {
        let mut state = self.lock();
        state.count_reads += 1;
        Ok(U256::from(state.cards.len()))
    }

    async fn card(&self, index: U256) -> Result<RawCard> {
        let mut state = self.lock();
        let index: u64 = index.to();
        state.card_reads.push(index);
        if state.fail_card_read_at == Some(index) {
            return Err(StorefrontError::Read(format!("getCard({index}) timed out")));
        }
        state
            .cards
            .get(index as usize)
            .cloned()
            .ok_or_else(|| StorefrontError::Read(format!("getCard({index}) out of bounds")))
    }

    async fn list_card(&self, from: Address, name: String, price: U256) -> Result<TxHash> {
        let mut state = self.lock();
        state.list_calls.push((from, name.clone(), price));
        if std::mem::take(&mut state.revert_next_mutation) {
            return Err(StorefrontError::Mutation("listCard reverted".into()));
        }
        let id = U256::from(state.cards.len());
        state.cards.push(RawCard {
            id,
            name,
            price,
            owner: from,
            is_listed: true,
        });
        Ok(state.next_tx())
    }

    async fn buy_card(&self, from: Address, id: U256, value: U256) -> Result<TxHash> {
        let mut state = self.lock();
        state.buy_calls.push((from, id, value));
        if std::mem::take(&mut state.revert_next_mutation) {
            return Err(StorefrontError::Mutation(format!("buyCard({id}) reverted")));
        }
        let Some(card) = state.cards.iter_mut().find(|c| c.id == id) else {
            return Err(StorefrontError::Mutation(format!("card {id} does not exist")));
        };
        if !card.is_listed || card.owner == from || card.price != value {
            return Err(StorefrontError::Mutation(format!("buyCard({id}) reverted")));
        }
        card.owner = from;
        card.is_listed = false;
        Ok(state.next_tx())
    }
}
