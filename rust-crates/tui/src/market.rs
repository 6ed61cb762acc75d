//! Listing and buying cards, and the worker that runs every contract call
//! one at a time so reloads never overlap.

use crate::{
    catalog::{
        self,
        Catalog,
    },
    chain::{
        CardContract,
        ChainClient,
    },
    error::{
        Result,
        StorefrontError,
    },
    session::Session,
    units,
};
use alloy::primitives::{
    TxHash,
    U256,
};
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tracing::{
    error,
    info,
    warn,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarketCommand {
    Reload,
    List { name: String, price: String },
    Buy { id: U256, price: String },
    Shutdown,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarketEvent {
    CatalogLoaded(Catalog),
    CatalogFailed(StorefrontError),
    Listed(TxHash),
    ListFailed(StorefrontError),
    Bought { id: U256, tx: TxHash },
    BuyFailed { id: U256, error: StorefrontError },
}

/// Checks a listing before anything is sent: the name must be non-blank and
/// the price a positive ether amount. Returns the trimmed name and wei price.
pub fn validate_listing(name: &str, price: &str) -> Result<(String, U256)> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StorefrontError::InvalidInput("card name is required".into()));
    }
    let wei = units::to_smallest_unit(price)?;
    if wei.is_zero() {
        return Err(StorefrontError::InvalidInput(
            "price must be greater than zero".into(),
        ));
    }
    Ok((name.to_string(), wei))
}

pub struct Marketplace<C: ChainClient> {
    session: Session<C>,
}

impl<C: ChainClient> Marketplace<C> {
    pub fn new(session: Session<C>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    pub async fn load_catalog(&self) -> Result<Catalog> {
        catalog::load_catalog(self.session.contract()).await
    }

    /// Submits `listCard` from the active account and waits for the receipt.
    pub async fn list(&self, name: &str, price: &str) -> Result<TxHash> {
        let (name, wei) = validate_listing(name, price)?;
        let from = self
            .session
            .active_account()
            .ok_or(StorefrontError::NoActiveAccount)?;
        info!(%from, name = %name, price_wei = %wei, "listing card");
        self.session.contract().list_card(from, name, wei).await
    }

    /// Submits `buyCard` paying exactly `price` (ether) and waits for the
    /// receipt. Whether the card is still for sale is up to the contract.
    pub async fn buy(&self, id: U256, price: &str) -> Result<TxHash> {
        let value = units::to_smallest_unit(price)?;
        let from = self
            .session
            .active_account()
            .ok_or(StorefrontError::NoActiveAccount)?;
        info!(%from, %id, value_wei = %value, "buying card");
        self.session.contract().buy_card(from, id, value).await
    }

    async fn reload(&self) -> MarketEvent {
        match self.load_catalog().await {
            Ok(cards) => MarketEvent::CatalogLoaded(cards),
            Err(e) => {
                error!(error = %e, "catalog load failed");
                MarketEvent::CatalogFailed(e)
            }
        }
    }

    /// Runs one command, emitting its events in order. A successful mutation
    /// is followed by exactly one reload.
    pub async fn execute(&self, command: MarketCommand, mut emit: impl FnMut(MarketEvent)) {
        match command {
            MarketCommand::Reload => emit(self.reload().await),
            MarketCommand::List { name, price } => match self.list(&name, &price).await {
                Ok(tx) => {
                    info!(%tx, "card listed");
                    emit(MarketEvent::Listed(tx));
                    emit(self.reload().await);
                }
                Err(e) => {
                    warn!(error = %e, "listing failed");
                    emit(MarketEvent::ListFailed(e));
                }
            },
            MarketCommand::Buy { id, price } => match self.buy(id, &price).await {
                Ok(tx) => {
                    info!(%tx, %id, "card bought");
                    emit(MarketEvent::Bought { id, tx });
                    emit(self.reload().await);
                }
                Err(e) => {
                    warn!(error = %e, %id, "purchase failed");
                    emit(MarketEvent::BuyFailed { id, error: e });
                }
            },
            MarketCommand::Shutdown => {}
        }
    }
}

/// Processes commands strictly in order. Reload requests already waiting in
/// the queue are folded into the one being run.
pub async fn market_worker<C: ChainClient>(
    market: Marketplace<C>,
    mut cmd_rx: mpsc::UnboundedReceiver<MarketCommand>,
    event_tx: mpsc::UnboundedSender<MarketEvent>,
) {
    let mut backlog: VecDeque<MarketCommand> = VecDeque::new();
    loop {
        let command = match backlog.pop_front() {
            Some(command) => command,
            None => match cmd_rx.recv().await {
                Some(command) => command,
                None => break,
            },
        };
        while let Ok(queued) = cmd_rx.try_recv() {
            backlog.push_back(queued);
        }
        match command {
            MarketCommand::Shutdown => break,
            MarketCommand::Reload => {
                backlog.retain(|queued| *queued != MarketCommand::Reload)
            }
            _ => {}
        }
        let mut receiver_gone = false;
        market
            .execute(command, |event| {
                if event_tx.send(event).is_err() {
                    receiver_gone = true;
                }
            })
            .await;
        if receiver_gone {
            warn!("market event receiver dropped");
            break;
        }
    }
    info!("market worker stopped");
}
