use crate::{
    chain::{
        CardContract,
        RawCard,
    },
    error::{
        Result,
        StorefrontError,
    },
    units,
};
use alloy::primitives::{
    Address,
    U256,
};
use tracing::debug;

/// A card as shown to the user: price already in ether.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Card {
    pub id: U256,
    pub name: String,
    pub price: String,
    pub owner: Address,
    pub is_listed: bool,
}

impl From<RawCard> for Card {
    fn from(raw: RawCard) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            price: units::from_smallest_unit(raw.price),
            owner: raw.owner,
            is_listed: raw.is_listed,
        }
    }
}

pub type Catalog = Vec<Card>;

/// Reads the card count, then every card by index, one call at a time.
/// Any failed read fails the whole load.
pub async fn load_catalog<C: CardContract>(contract: &C) -> Result<Catalog> {
    let count = contract.card_count().await?;
    let count = u64::try_from(count).map_err(|_| {
        StorefrontError::Read(format!("card count {count} is out of range"))
    })?;
    let mut cards = Vec::with_capacity(count.min(1024) as usize);
    for index in 0..count {
        let raw = contract.card(U256::from(index)).await?;
        cards.push(Card::from(raw));
    }
    debug!(count, "catalog loaded");
    Ok(cards)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::test_helpers::{
        FakeChain,
        raw_card,
    };
    use proptest::prelude::*;

    #[tokio::test]
    async fn load_catalog__reads_every_index_in_order() {
        // given
        let chain = FakeChain::sepolia();
        chain.push_card(raw_card(0, "Jordan", 1_500_000_000_000_000_000, 1, true));
        chain.push_card(raw_card(1, "Bird", 250_000_000_000_000_000, 2, false));
        let contract = chain.contract();

        // when
        let catalog = load_catalog(&contract).await.unwrap();

        // then
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].name, "Jordan");
        assert_eq!(catalog[0].price, "1.5");
        assert_eq!(catalog[1].name, "Bird");
        assert_eq!(catalog[1].price, "0.25");
        assert!(!catalog[1].is_listed);
        assert_eq!(chain.card_reads(), vec![0, 1]);
    }

    #[tokio::test]
    async fn load_catalog__empty_contract__is_empty() {
        let chain = FakeChain::sepolia();
        let catalog = load_catalog(&chain.contract()).await.unwrap();
        assert!(catalog.is_empty());
        assert_eq!(chain.count_reads(), 1);
    }

    #[tokio::test]
    async fn load_catalog__failed_card_read__publishes_nothing() {
        // given
        let chain = FakeChain::sepolia();
        chain.push_card(raw_card(0, "Magic", 1, 1, true));
        chain.push_card(raw_card(1, "Kareem", 1, 1, true));
        chain.fail_card_read_at(1);

        // when
        let result = load_catalog(&chain.contract()).await;

        // then
        assert!(matches!(result, Err(StorefrontError::Read(_))));
    }

    #[tokio::test]
    async fn load_catalog__twice_over_same_data__is_structurally_equal() {
        // given
        let chain = FakeChain::sepolia();
        chain.push_card(raw_card(7, "Duncan", 42, 3, true));
        let contract = chain.contract();

        // when
        let first = load_catalog(&contract).await.unwrap();
        let second = load_catalog(&contract).await.unwrap();

        // then
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn loaded_catalog_matches_records(
            records in prop::collection::vec((any::<u64>(), "[a-zA-Z ]{0,12}", any::<u64>(), any::<bool>()), 0..12)
        ) {
            let chain = FakeChain::sepolia();
            for (i, (price, name, owner, listed)) in records.iter().enumerate() {
                chain.push_card(raw_card(i as u64, name, *price as u128, *owner, *listed));
            }
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let catalog = runtime.block_on(load_catalog(&chain.contract())).unwrap();

            prop_assert_eq!(catalog.len(), records.len());
            for (i, (card, (price, name, _, listed))) in catalog.iter().zip(&records).enumerate() {
                prop_assert_eq!(card.id, U256::from(i));
                prop_assert_eq!(&card.name, name);
                prop_assert_eq!(card.is_listed, *listed);
                prop_assert_eq!(units::to_smallest_unit(&card.price), Ok(U256::from(*price)));
            }
        }
    }
}
