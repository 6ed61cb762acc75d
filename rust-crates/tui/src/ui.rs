use card_storefront::{
    StorefrontError,
    state::{
        CardAction,
        SessionStatus,
        StoreState,
    },
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        Event,
        EventStream,
        KeyCode,
        KeyEvent,
        KeyEventKind,
        KeyModifiers,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use futures::StreamExt;
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::stdout;

const CARD_WIDTH: u16 = 28;
const CARD_HEIGHT: u16 = 7;

pub type InputEventReceiver = EventStream;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserEvent {
    Quit,
    Buy(usize),
    SubmitListing,
    Reload,
    Redraw,
}

#[derive(Debug, Default)]
pub struct UiState {
    mode: Mode,
    selected: usize,
    columns: usize,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Normal,
    ListForm(FormField),
    QuitModal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum FormField {
    #[default]
    Name,
    Price,
}

impl FormField {
    fn toggle(self) -> Self {
        match self {
            FormField::Name => FormField::Price,
            FormField::Price => FormField::Name,
        }
    }
}

impl UiState {
    #[cfg(test)]
    fn selected(&self) -> usize {
        self.selected
    }

    fn move_selection(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        let next = self.selected as isize + delta;
        self.selected = next.clamp(0, len as isize - 1) as usize;
    }

    fn columns(&self) -> usize {
        self.columns.max(1)
    }
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::event::DisableMouseCapture,
        crossterm::terminal::LeaveAlternateScreen
    )?;
    Ok(())
}

pub fn input_event_stream() -> InputEventReceiver {
    EventStream::new()
}

pub async fn next_raw_event(events: &mut InputEventReceiver) -> Result<Event> {
    match events.next().await {
        Some(event) => Ok(event?),
        None => Err(eyre!("terminal input stream closed")),
    }
}

pub fn draw(state: &mut UiState, store: &StoreState) -> Result<()> {
    let len = store.catalog().len();
    if state.selected >= len {
        state.selected = len.saturating_sub(1);
    }
    if let Some(mut term) = state.terminal.take() {
        let mut columns = state.columns;
        term.draw(|f| columns = ui(f, state, store))?;
        state.columns = columns;
        state.terminal = Some(term);
    }
    Ok(())
}

/// Maps a terminal event onto an app action. Typing into the listing form
/// edits the store's draft directly and only asks for a redraw.
pub fn interpret_event(
    state: &mut UiState,
    store: &mut StoreState,
    event: Event,
) -> Option<UserEvent> {
    let key = match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => key,
        Event::Resize(..) => return Some(UserEvent::Redraw),
        _ => return None,
    };
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(UserEvent::Quit);
    }
    if let SessionStatus::Failed(_) = store.session() {
        return match key.code {
            KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => Some(UserEvent::Quit),
            _ => None,
        };
    }
    match state.mode {
        Mode::QuitModal => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => Some(UserEvent::Quit),
            KeyCode::Char('n') | KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Mode::ListForm(field) => interpret_form_key(state, store, field, key),
        Mode::Normal => interpret_normal_key(state, store, key),
    }
}

fn interpret_normal_key(
    state: &mut UiState,
    store: &StoreState,
    key: KeyEvent,
) -> Option<UserEvent> {
    let len = store.catalog().len();
    let columns = state.columns() as isize;
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            state.mode = Mode::QuitModal;
            Some(UserEvent::Redraw)
        }
        KeyCode::Left | KeyCode::Char('h') => {
            state.move_selection(-1, len);
            Some(UserEvent::Redraw)
        }
        KeyCode::Right | KeyCode::Char('l') => {
            state.move_selection(1, len);
            Some(UserEvent::Redraw)
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.move_selection(-columns, len);
            Some(UserEvent::Redraw)
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.move_selection(columns, len);
            Some(UserEvent::Redraw)
        }
        KeyCode::Enter | KeyCode::Char('b') if len > 0 => Some(UserEvent::Buy(state.selected)),
        KeyCode::Char('n') => {
            state.mode = Mode::ListForm(FormField::Name);
            Some(UserEvent::Redraw)
        }
        KeyCode::Char('r') => Some(UserEvent::Reload),
        _ => None,
    }
}

fn interpret_form_key(
    state: &mut UiState,
    store: &mut StoreState,
    field: FormField,
    key: KeyEvent,
) -> Option<UserEvent> {
    match key.code {
        // the draft survives closing the form
        KeyCode::Esc => {
            state.mode = Mode::Normal;
            Some(UserEvent::Redraw)
        }
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            state.mode = Mode::ListForm(field.toggle());
            Some(UserEvent::Redraw)
        }
        KeyCode::Enter => {
            state.mode = Mode::Normal;
            Some(UserEvent::SubmitListing)
        }
        KeyCode::Backspace => {
            form_input(store, field).pop();
            Some(UserEvent::Redraw)
        }
        KeyCode::Char(c) => {
            form_input(store, field).push(c);
            Some(UserEvent::Redraw)
        }
        _ => None,
    }
}

fn form_input(store: &mut StoreState, field: FormField) -> &mut String {
    let draft = store.draft_mut();
    match field {
        FormField::Name => &mut draft.name,
        FormField::Price => &mut draft.price,
    }
}

fn ui(f: &mut Frame, state: &UiState, store: &StoreState) -> usize {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // account
            Constraint::Min(CARD_HEIGHT),
            Constraint::Length(3), // last transaction
            Constraint::Length(6), // status/errors
            Constraint::Length(3), // help
        ])
        .split(f.area());

    draw_account_panel(f, chunks[0], store);
    let columns = draw_cards(f, chunks[1], state, store);
    draw_last_tx(f, chunks[2], store);
    draw_status(f, chunks[3], store);
    draw_help(f, chunks[4], state);
    draw_modals(f, state, store);
    columns
}

fn draw_account_panel(f: &mut Frame, area: Rect, store: &StoreState) {
    let text = match store.session() {
        SessionStatus::Connecting => "Connecting...".to_string(),
        SessionStatus::Connected { accounts } => match accounts.first() {
            Some(account) => format!(
                "Account: {account} | Contract: {}",
                card_abi::CONTRACT_ADDRESS
            ),
            None => "No account available; browsing only".to_string(),
        },
        SessionStatus::Failed(_) => "Not connected".to_string(),
    };
    let widget =
        Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Wallet"));
    f.render_widget(widget, area);
}

fn draw_cards(f: &mut Frame, area: Rect, state: &UiState, store: &StoreState) -> usize {
    let block = Block::default().borders(Borders::ALL).title(format!(
        "NBA Cards ({}){}",
        store.catalog().len(),
        if store.is_reloading() { " - loading" } else { "" }
    ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let columns = (inner.width / CARD_WIDTH).max(1) as usize;
    if store.catalog().is_empty() {
        let empty = Paragraph::new("No cards yet. Press n to list one.")
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(empty, inner);
        return columns;
    }

    let visible_rows = (inner.height / CARD_HEIGHT).max(1) as usize;
    let selected_row = state.selected / columns;
    let first_row = selected_row.saturating_sub(visible_rows - 1);

    for (index, card) in store.catalog().iter().enumerate() {
        let row = index / columns;
        if row < first_row || row >= first_row + visible_rows {
            continue;
        }
        let col = (index % columns) as u16;
        let cell = Rect {
            x: inner.x + col * CARD_WIDTH,
            y: inner.y + (row - first_row) as u16 * CARD_HEIGHT,
            width: CARD_WIDTH.min(inner.width),
            height: CARD_HEIGHT,
        }
        .intersection(inner);
        if cell.is_empty() {
            continue;
        }
        let action = store.action_for(card);
        let border = if index == state.selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let lines = vec![
            Line::from(Span::styled(
                card.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("{} ETH", card.price)),
            Line::from(format!("Owner {}", short_address(&card.owner.to_string()))),
            Line::from(""),
            Line::from(Span::styled(action.label(), action_style(action))),
        ];
        let widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(format!("#{}", card.id)),
        );
        f.render_widget(widget, cell);
    }
    columns
}

fn action_style(action: CardAction) -> Style {
    match action {
        CardAction::Buy => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        CardAction::Owned => Style::default().fg(Color::Cyan),
        CardAction::NotForSale | CardAction::NoAccount => {
            Style::default().fg(Color::DarkGray)
        }
    }
}

fn short_address(address: &str) -> String {
    if address.len() <= 12 {
        return address.to_string();
    }
    format!("{}…{}", &address[..6], &address[address.len() - 4..])
}

fn draw_last_tx(f: &mut Frame, area: Rect, store: &StoreState) {
    let text = match store.explorer_link() {
        Some(link) => link,
        None => "No transactions yet".to_string(),
    };
    let widget = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Last Transaction"));
    f.render_widget(widget, area);
}

fn draw_status(f: &mut Frame, area: Rect, store: &StoreState) {
    let status_widget = if store.errors().is_empty() {
        let status = if store.status().trim().is_empty() {
            "Ready"
        } else {
            store.status()
        };
        Paragraph::new(status)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .style(Style::default().fg(Color::Green))
    } else {
        let lines: Vec<Line> = store
            .errors()
            .iter()
            .map(|e| Line::from(e.clone()))
            .collect();
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Errors"))
            .style(Style::default().fg(Color::Red))
    };
    f.render_widget(status_widget, area);
}

fn draw_help(f: &mut Frame, area: Rect, state: &UiState) {
    let text = match state.mode {
        Mode::ListForm(_) => "Tab switch field | Enter list card | Esc close",
        Mode::QuitModal => "y/Enter quit | n/Esc stay",
        Mode::Normal => "←/→/↑/↓ select | Enter/b buy | n new listing | r reload | q/Esc quit",
    };
    let help = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

fn draw_modals(f: &mut Frame, state: &UiState, store: &StoreState) {
    if let SessionStatus::Failed(error) = store.session() {
        let area = centered_rect(60, 30, f.area());
        f.render_widget(Clear, area);
        let lines = vec![
            Line::from(error.to_string()),
            Line::from(""),
            Line::from("Press q to quit"),
        ];
        let alert = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL).title(alert_title(error)));
        f.render_widget(alert, area);
        return;
    }
    match state.mode {
        Mode::Normal => {}
        Mode::QuitModal => {
            let area = centered_rect(40, 20, f.area());
            f.render_widget(Clear, area);
            let modal = Paragraph::new("Quit the storefront? (y/n)")
                .block(Block::default().borders(Borders::ALL).title("Quit"));
            f.render_widget(modal, area);
        }
        Mode::ListForm(field) => {
            let area = centered_rect(50, 30, f.area());
            f.render_widget(Clear, area);
            let draft = store.draft();
            let field_line = |label: &str, value: &str, focused: bool| {
                let style = if focused {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                let cursor = if focused { "_" } else { "" };
                Line::from(vec![
                    Span::styled(format!("{label:<7}"), style),
                    Span::raw(format!("{value}{cursor}")),
                ])
            };
            let lines = vec![
                field_line("Name", &draft.name, field == FormField::Name),
                field_line("Price", &draft.price, field == FormField::Price),
                Line::from(""),
                Line::from("Price in ETH, e.g. 0.5"),
            ];
            let form = Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title("List a Card"));
            f.render_widget(form, area);
        }
    }
}

fn alert_title(error: &StorefrontError) -> &'static str {
    match error {
        StorefrontError::NetworkMismatch { .. } => "Wrong network",
        _ => "Connection failed",
    }
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1])[1]
}
