use alloy::{
    primitives::{
        Address,
        TxHash,
        address,
    },
    providers::Provider,
};

pub mod card_types {
    use alloy::sol;

    sol! {
        #[sol(rpc)]
        contract NBATradingCards {
            struct Card {
                uint256 id;
                string name;
                uint256 price;
                address owner;
                bool isListed;
            }

            function getCardCount() external view returns (uint256);
            function getCard(uint256 index) external view returns (Card memory);
            function listCard(string memory name, uint256 price) external;
            function buyCard(uint256 id) external payable;
        }
    }
}

/// Deployed storefront contract on Sepolia.
pub const CONTRACT_ADDRESS: Address =
    address!("d4352f75ed115f331f30fc571dc4e01f13007e8e");

/// Sepolia chain id. Any other network aborts startup.
pub const EXPECTED_CHAIN_ID: u64 = 11_155_111;

/// Prices are stored in wei and shown in ether.
pub const PRICE_DECIMALS: u8 = 18;

pub const EXPLORER_TX_BASE_URL: &str = "https://sepolia.etherscan.io/tx/";

pub fn explorer_tx_url(hash: &TxHash) -> String {
    format!("{EXPLORER_TX_BASE_URL}{hash}")
}

pub fn card_contract<P: Provider>(
    address: Address,
    provider: P,
) -> card_types::NBATradingCards::NBATradingCardsInstance<P> {
    card_types::NBATradingCards::new(address, provider)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn explorer_tx_url__formats_hash_with_0x_prefix() {
        // given
        let hash = TxHash::repeat_byte(0xab);

        // when
        let url = explorer_tx_url(&hash);

        // then
        assert_eq!(
            url,
            format!("https://sepolia.etherscan.io/tx/0x{}", "ab".repeat(32))
        );
    }

    #[test]
    fn contract_address__matches_deployment() {
        assert_eq!(
            CONTRACT_ADDRESS.to_string().to_lowercase(),
            "0xd4352f75ed115f331f30fc571dc4e01f13007e8e"
        );
    }
}
