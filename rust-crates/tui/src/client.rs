use crate::ui;
use card_abi::{
    CONTRACT_ADDRESS,
    EXPECTED_CHAIN_ID,
};
use card_storefront::{
    chain::{
        ChainClient,
        EvmClient,
    },
    market::{
        MarketCommand,
        MarketEvent,
        Marketplace,
        market_worker,
    },
    provider::{
        self,
        ProviderSettings,
    },
    session::Session,
    state::StoreState,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use tokio::sync::mpsc;
use tracing::{
    error,
    info,
    warn,
};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub provider: ProviderSettings,
}

async fn connect(config: &AppConfig) -> card_storefront::Result<Marketplace<EvmClient>> {
    let candidates = config.provider.candidates()?;
    let client = provider::resolve_first(&candidates).await?;
    let session = Session::connect(client, CONTRACT_ADDRESS, EXPECTED_CHAIN_ID).await?;
    Ok(Marketplace::new(session))
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let mut store = StoreState::default();
    // Keystore unlocking prompts on stdin, so connect before raw mode.
    let market = match connect(&config).await {
        Ok(market) => {
            store.connected(market.session().accounts().to_vec());
            Some(market)
        }
        Err(e) => {
            error!(error = %e, "startup failed");
            store.startup_failed(e);
            None
        }
    };

    let mut ui_state = ui::UiState::default();
    let mut input_events = ui::input_event_stream();
    ui::terminal_enter(&mut ui_state)?;
    info!("UI ready");
    let res = run_loop(market, &mut store, &mut ui_state, &mut input_events).await;
    ui::terminal_exit()?;
    res
}

fn submit(
    cmd_tx: &mpsc::UnboundedSender<MarketCommand>,
    store: &mut StoreState,
    command: MarketCommand,
) {
    if cmd_tx.send(command).is_err() {
        warn!("market worker is gone; dropping command");
        store.push_error("Market worker stopped; restart the storefront");
    }
}

async fn run_loop<C: ChainClient + 'static>(
    market: Option<Marketplace<C>>,
    store: &mut StoreState,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()> {
    info!("Running app loop");
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<MarketEvent>();
    let mut worker_closed = market.is_none();
    if let Some(market) = market {
        tokio::spawn(market_worker(market, cmd_rx, event_tx));
    }

    if let Some(command) = store.begin_reload() {
        submit(&cmd_tx, store, command);
    }
    ui::draw(ui_state, store).wrap_err("initial draw failed")?;

    loop {
        tokio::select! {
            maybe_event = event_rx.recv(), if !worker_closed => {
                match maybe_event {
                    Some(event) => {
                        store.apply(event);
                        ui::draw(ui_state, store).wrap_err("draw after market event failed")?;
                    }
                    None => {
                        warn!("market worker channel closed");
                        worker_closed = true;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                let _ = cmd_tx.send(MarketCommand::Shutdown);
                break;
            }
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, store, event) else {
                    continue;
                };
                match ev {
                    ui::UserEvent::Quit => {
                        let _ = cmd_tx.send(MarketCommand::Shutdown);
                        break;
                    }
                    ui::UserEvent::Reload => match store.begin_reload() {
                        Some(command) => submit(&cmd_tx, store, command),
                        None => store.set_status("Cards are already loading"),
                    },
                    ui::UserEvent::SubmitListing => match store.begin_list() {
                        Ok(command) => {
                            store.clear_errors();
                            submit(&cmd_tx, store, command);
                        }
                        Err(e) => {
                            warn!(error = %e, "listing rejected");
                            store.push_error(format!("Cannot list card: {e}"));
                        }
                    },
                    ui::UserEvent::Buy(index) => match store.begin_buy(index) {
                        Ok(command) => {
                            store.clear_errors();
                            submit(&cmd_tx, store, command);
                        }
                        Err(e) => {
                            warn!(error = %e, index, "purchase rejected");
                            store.push_error(format!("Cannot buy card: {e}"));
                        }
                    },
                    ui::UserEvent::Redraw => {}
                }
                ui::draw(ui_state, store).wrap_err("draw after input failed")?;
            }
        }
    }
    info!("App loop finished");
    Ok(())
}
