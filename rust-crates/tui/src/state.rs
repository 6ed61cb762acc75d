//! Everything the storefront shows, changed only through the transitions
//! below.

use crate::{
    catalog::{
        Card,
        Catalog,
    },
    error::{
        Result,
        StorefrontError,
    },
    market::{
        self,
        MarketCommand,
        MarketEvent,
    },
};
use alloy::primitives::{
    Address,
    TxHash,
    U256,
};

const MAX_ERRORS: usize = 5;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormDraft {
    pub name: String,
    pub price: String,
}

impl FormDraft {
    pub fn clear(&mut self) {
        self.name.clear();
        self.price.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.price.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardAction {
    Owned,
    Buy,
    NotForSale,
    /// No account is available, so nothing can be bought.
    NoAccount,
}

impl CardAction {
    pub fn label(self) -> &'static str {
        match self {
            CardAction::Owned => "Owned",
            CardAction::Buy => "Buy",
            CardAction::NotForSale => "Not For Sale",
            CardAction::NoAccount => "Connect a wallet",
        }
    }
}

pub fn card_action(active_account: Option<Address>, card: &Card) -> CardAction {
    match active_account {
        None => CardAction::NoAccount,
        Some(account) if account == card.owner => CardAction::Owned,
        Some(_) if card.is_listed => CardAction::Buy,
        Some(_) => CardAction::NotForSale,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Connecting,
    Connected {
        accounts: Vec<Address>,
    },
    Failed(StorefrontError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingOp {
    List,
    Buy(U256),
}

#[derive(Clone, Debug, Default)]
pub struct StoreState {
    session: SessionStatus,
    catalog: Catalog,
    draft: FormDraft,
    last_tx: Option<TxHash>,
    pending: Option<PendingOp>,
    submitted_draft: Option<FormDraft>,
    reloading: bool,
    status: String,
    errors: Vec<String>,
}

impl StoreState {
    pub fn session(&self) -> &SessionStatus {
        &self.session
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut FormDraft {
        &mut self.draft
    }

    pub fn last_tx(&self) -> Option<TxHash> {
        self.last_tx
    }

    pub fn explorer_link(&self) -> Option<String> {
        self.last_tx.as_ref().map(card_abi::explorer_tx_url)
    }

    pub fn pending(&self) -> Option<PendingOp> {
        self.pending
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn active_account(&self) -> Option<Address> {
        match &self.session {
            SessionStatus::Connected { accounts } => accounts.first().copied(),
            _ => None,
        }
    }

    pub fn action_for(&self, card: &Card) -> CardAction {
        card_action(self.active_account(), card)
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        if self.errors.len() > MAX_ERRORS {
            let excess = self.errors.len() - MAX_ERRORS;
            self.errors.drain(..excess);
        }
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn connected(&mut self, accounts: Vec<Address>) {
        self.status = match accounts.first() {
            Some(account) => format!("Connected as {account}"),
            None => "Connected without an account; trading disabled".to_string(),
        };
        self.session = SessionStatus::Connected { accounts };
    }

    /// Startup failed: nothing else gets populated.
    pub fn startup_failed(&mut self, error: StorefrontError) {
        self.status = error.to_string();
        self.session = SessionStatus::Failed(error);
    }

    /// Returns a reload command unless one is already running.
    pub fn begin_reload(&mut self) -> Option<MarketCommand> {
        if self.reloading || !matches!(self.session, SessionStatus::Connected { .. }) {
            return None;
        }
        self.reloading = true;
        self.status = "Loading cards...".to_string();
        Some(MarketCommand::Reload)
    }

    /// Validates the draft and returns the listing command to submit. The
    /// draft stays as typed until the listing is confirmed.
    pub fn begin_list(&mut self) -> Result<MarketCommand> {
        self.ready_to_trade()?;
        market::validate_listing(&self.draft.name, &self.draft.price)?;
        self.pending = Some(PendingOp::List);
        self.submitted_draft = Some(self.draft.clone());
        self.status = format!("Listing {}...", self.draft.name.trim());
        Ok(MarketCommand::List {
            name: self.draft.name.clone(),
            price: self.draft.price.clone(),
        })
    }

    /// Returns the purchase command for the card at `index` if it shows a
    /// Buy action.
    pub fn begin_buy(&mut self, index: usize) -> Result<MarketCommand> {
        self.ready_to_trade()?;
        let card = self.catalog.get(index).ok_or_else(|| {
            StorefrontError::InvalidInput(format!("no card at position {index}"))
        })?;
        if self.action_for(card) != CardAction::Buy {
            return Err(StorefrontError::InvalidInput(format!(
                "card {} is not for sale",
                card.id
            )));
        }
        let command = MarketCommand::Buy {
            id: card.id,
            price: card.price.clone(),
        };
        self.status = format!("Buying {} for {} ETH...", card.name, card.price);
        self.pending = Some(PendingOp::Buy(card.id));
        Ok(command)
    }

    fn ready_to_trade(&self) -> Result<()> {
        match &self.session {
            SessionStatus::Connected { accounts } if accounts.is_empty() => {
                Err(StorefrontError::NoActiveAccount)
            }
            SessionStatus::Connected { .. } => match self.pending {
                Some(_) => Err(StorefrontError::Busy),
                None => Ok(()),
            },
            SessionStatus::Connecting => Err(StorefrontError::Connection(
                "contract is not initialized yet".into(),
            )),
            SessionStatus::Failed(error) => Err(error.clone()),
        }
    }

    pub fn apply(&mut self, event: MarketEvent) {
        match event {
            MarketEvent::CatalogLoaded(cards) => {
                self.status = format!("Loaded {} cards", cards.len());
                self.catalog = cards;
                self.reloading = false;
            }
            MarketEvent::CatalogFailed(error) => {
                self.reloading = false;
                self.status = "Could not refresh cards".to_string();
                self.push_error(error.to_string());
            }
            MarketEvent::Listed(tx) => {
                self.last_tx = Some(tx);
                // a draft typed while the listing was in flight is kept
                if self.submitted_draft.take().as_ref() == Some(&self.draft) {
                    self.draft.clear();
                }
                self.pending = None;
                self.reloading = true;
                self.status = "Card listed; refreshing...".to_string();
            }
            MarketEvent::ListFailed(error) => {
                self.submitted_draft = None;
                self.pending = None;
                self.status = "Listing failed".to_string();
                self.push_error(format!("Error listing card: {error}"));
            }
            MarketEvent::Bought { id, tx } => {
                self.last_tx = Some(tx);
                self.pending = None;
                self.reloading = true;
                self.status = format!("Bought card {id}; refreshing...");
            }
            MarketEvent::BuyFailed { id, error } => {
                self.pending = None;
                self.status = "Purchase failed".to_string();
                self.push_error(format!("Error buying card {id}: {error}"));
            }
        }
    }
}
