// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{debug, warn};
use wholesale_app::{
    CatalogCommand, CatalogEvent, CatalogState, FetchCompletion, FetchError, FetchPayload,
    FetchRequest, InputFocus, PriceField, Product, RequestId, Slice, SortOrder, SupplyQuantity,
    SupplySummary,
};

pub const CATALOG_TITLE: &str = "Wholesale base catalog";
const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(4);

/// Executes catalog fetches for the UI loop.
pub trait CatalogRuntime {
    fn fetch(&mut self, request: &FetchRequest) -> Result<FetchPayload, FetchError>;

    /// Runs `request` and reports the completion on `tx`. The default runs
    /// inline; real runtimes move the call to a worker thread.
    fn spawn_fetch(
        &mut self,
        id: RequestId,
        request: FetchRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self.fetch(&request);
        tx.send(InternalEvent::Fetch(FetchCompletion::new(id, request, result)))
            .map_err(|_| anyhow::anyhow!("fetch event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    Fetch(FetchCompletion),
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    selected: usize,
    help_visible: bool,
    status_token: u64,
}

pub fn run_app<R: CatalogRuntime>(state: &mut CatalogState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    dispatch(
        state,
        runtime,
        &mut view_data,
        &internal_tx,
        CatalogCommand::Mount,
    );

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut CatalogState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::Fetch(completion) => {
                let events = state.complete(completion);
                apply_events(state, view_data, tx, &events);
            }
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(CatalogCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn dispatch<R: CatalogRuntime>(
    state: &mut CatalogState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: CatalogCommand,
) {
    let events = state.dispatch(command);
    for event in &events {
        if let CatalogEvent::FetchRequested { id, request } = event
            && let Err(error) = runtime.spawn_fetch(*id, request.clone(), tx.clone())
        {
            warn!(request = request.label(), %id, "fetch not started: {error:#}");
        }
    }
    apply_events(state, view_data, tx, &events);
}

fn apply_events(
    state: &CatalogState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    events: &[CatalogEvent],
) {
    for event in events {
        match event {
            CatalogEvent::ProductsReplaced { .. } | CatalogEvent::ProductsSorted(_) => {
                view_data.selected = clamp_selection(view_data.selected, state.products.len());
            }
            CatalogEvent::StatusUpdated(_) => {
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule_status_clear(tx, view_data.status_token);
            }
            CatalogEvent::StaleResponseDiscarded { id, slice } => {
                debug!(%id, slice = slice.label(), "ui skipped stale completion");
            }
            _ => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_DELAY);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status<R: CatalogRuntime>(
    state: &mut CatalogState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    dispatch(
        state,
        runtime,
        view_data,
        tx,
        CatalogCommand::SetStatus(message.into()),
    );
}

fn clamp_selection(selected: usize, len: usize) -> usize {
    selected.min(len.saturating_sub(1))
}

fn handle_key_event<R: CatalogRuntime>(
    state: &mut CatalogState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if state.alert.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            dispatch(
                state,
                runtime,
                view_data,
                internal_tx,
                CatalogCommand::DismissAlert,
            );
        }
        return false;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if state.modal.is_visible() {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('c')
        ) {
            dispatch(
                state,
                runtime,
                view_data,
                internal_tx,
                CatalogCommand::CloseModal,
            );
        }
        return false;
    }

    if let InputFocus::Price(field) = state.focus {
        handle_price_input_key(state, runtime, view_data, internal_tx, field, key);
        return false;
    }

    let command = match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Char('?'), _) => {
            view_data.help_visible = true;
            return false;
        }
        (KeyCode::Char('j') | KeyCode::Down, _) => {
            view_data.selected =
                clamp_selection(view_data.selected.saturating_add(1), state.products.len());
            return false;
        }
        (KeyCode::Char('k') | KeyCode::Up, _) => {
            view_data.selected = view_data.selected.saturating_sub(1);
            return false;
        }
        (KeyCode::Char('g') | KeyCode::Home, _) => {
            view_data.selected = 0;
            return false;
        }
        (KeyCode::Char('G') | KeyCode::End, _) => {
            view_data.selected = state.products.len().saturating_sub(1);
            return false;
        }
        (KeyCode::Tab, _) => CatalogCommand::FocusNext,
        (KeyCode::Char('f'), KeyModifiers::NONE) => CatalogCommand::ApplyPriceFilter,
        (KeyCode::Char('a'), KeyModifiers::NONE) => CatalogCommand::Sort(SortOrder::Asc),
        (KeyCode::Char('d'), KeyModifiers::NONE) => CatalogCommand::Sort(SortOrder::Desc),
        (KeyCode::Char('n'), KeyModifiers::NONE) => CatalogCommand::LoadNoPriceIncrease,
        (KeyCode::Char('r'), KeyModifiers::NONE) => CatalogCommand::Reload,
        (KeyCode::Enter, _) => match state.products.get(view_data.selected) {
            Some(product) => CatalogCommand::ViewSupplies(product.product_id),
            None => {
                emit_status(state, runtime, view_data, internal_tx, "no product selected");
                return false;
            }
        },
        _ => return false,
    };

    let focus_changes = command == CatalogCommand::FocusNext;
    dispatch(state, runtime, view_data, internal_tx, command);
    if focus_changes {
        announce_focus(state, runtime, view_data, internal_tx);
    }
    false
}

fn handle_price_input_key<R: CatalogRuntime>(
    state: &mut CatalogState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    field: PriceField,
    key: KeyEvent,
) {
    let command = match key.code {
        KeyCode::Tab => CatalogCommand::FocusNext,
        KeyCode::Esc => CatalogCommand::FocusList,
        KeyCode::Enter => CatalogCommand::ApplyPriceFilter,
        KeyCode::Backspace => CatalogCommand::InputBackspace,
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            CatalogCommand::InputChar(ch)
        }
        _ => return,
    };

    let focus_changes = matches!(
        command,
        CatalogCommand::FocusNext | CatalogCommand::FocusList
    );
    if command == CatalogCommand::ApplyPriceFilter {
        debug!(field = field.label(), "filter submitted from input");
    }
    dispatch(state, runtime, view_data, internal_tx, command);
    if focus_changes {
        announce_focus(state, runtime, view_data, internal_tx);
    }
}

fn announce_focus<R: CatalogRuntime>(
    state: &mut CatalogState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let message = match state.focus {
        InputFocus::List => "list".to_owned(),
        InputFocus::Price(field) => format!("editing {}", field.label()),
    };
    emit_status(state, runtime, view_data, internal_tx, message);
}

fn render(frame: &mut ratatui::Frame<'_>, state: &CatalogState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let header = Paragraph::new(render_header_text(state))
        .style(Style::default().fg(Color::White))
        .block(Block::default().title(CATALOG_TITLE).borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    let filter_style = if state.focus == InputFocus::List {
        Style::default()
    } else {
        Style::default().fg(Color::Cyan)
    };
    let filters = Paragraph::new(render_filter_text(state))
        .style(filter_style)
        .block(Block::default().title("price").borders(Borders::ALL));
    frame.render_widget(filters, layout[1]);

    render_products(frame, layout[2], state, view_data);

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status, layout[3]);

    if let Some(summary) = state.modal.summary(&state.products)
        && state.modal.is_visible()
    {
        let (title, body) = render_supply_modal_text(&summary);
        let area = centered_rect(60, 30, frame.area());
        frame.render_widget(Clear, area);
        let modal = Paragraph::new(format!("{body}\n\nesc close"))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Cyan)),
            );
        frame.render_widget(modal, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }

    if let Some(alert) = &state.alert {
        let area = centered_rect(40, 20, frame.area());
        frame.render_widget(Clear, area);
        let alert = Paragraph::new(format!("{alert}\n\nenter ok"))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title("notice")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Red)),
            );
        frame.render_widget(alert, area);
    }
}

fn render_products(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &CatalogState,
    view_data: &ViewData,
) {
    let title = format!("products ({})", state.products.len());
    if state.products.is_empty() {
        let empty = Paragraph::new("No data")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let rows = state
        .products
        .iter()
        .map(|product| Row::new([Cell::from(product_line(product))]));
    let table = Table::new(rows, [Constraint::Min(8)])
        .row_highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().title(title).borders(Borders::ALL));
    let mut table_state = TableState::default().with_selected(Some(view_data.selected));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn render_header_text(state: &CatalogState) -> String {
    let mut parts = vec![format!("suppliers: {}", state.suppliers.len())];
    if let Some(updated_at) = state.products_updated_at {
        parts.push(format!("updated {}", format_clock(updated_at)));
    }
    if state.is_loading(Slice::Products) {
        parts.push("loading...".to_owned());
    }
    parts.join(" | ")
}

fn render_filter_text(state: &CatalogState) -> String {
    [PriceField::Min, PriceField::Max]
        .into_iter()
        .map(|field| {
            let value = state.price_range.get(field);
            if state.focus == InputFocus::Price(field) {
                format!("{}: [{value}_]", field.label())
            } else {
                format!("{}: {value}", field.label())
            }
        })
        .collect::<Vec<_>>()
        .join("   ")
}

fn format_clock(at: OffsetDateTime) -> String {
    at.format(&format_description!("[hour]:[minute]:[second] UTC"))
        .unwrap_or_default()
}

fn product_line(product: &Product) -> String {
    format!("{} - {} rub.", product.name, product.price)
}

fn render_supply_modal_text(summary: &SupplySummary) -> (String, String) {
    match summary {
        SupplySummary::Increase {
            product_name,
            quantity,
            ..
        } => {
            let body = match quantity {
                SupplyQuantity::Units(units) => format!(
                    "Supplies of this product grew by {units} units in 2023 compared to the previous year."
                ),
                SupplyQuantity::NoData => "No 2023 supply data for this product.".to_owned(),
            };
            (format!("Supplies of \"{product_name}\" in 2023"), body)
        }
        SupplySummary::NoRecords { product_name } => {
            let name = product_name.as_deref().unwrap_or("selected product");
            (
                format!("Supplies of \"{name}\" in 2023"),
                "No supply records for this product.".to_owned(),
            )
        }
    }
}

fn status_text(state: &CatalogState, view_data: &ViewData) -> String {
    if let Some(message) = &state.status_line {
        return message.clone();
    }
    if view_data.help_visible || state.alert.is_some() || state.modal.is_visible() {
        return String::new();
    }
    match state.focus {
        InputFocus::List => format!(
            "j/k g/G | enter supplies | f filter | a/d sort ({}) | n no price increase | r reload | tab price | ? help | q quit",
            state.sort_order.label()
        ),
        InputFocus::Price(_) => {
            "type price | backspace | enter filter | tab next | esc list".to_owned()
        }
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ? help\n\
list: j/k up/down | g/G first/last | enter supplies of selected product\n\
list: f filter by price | a cheapest first | d most expensive first\n\
list: n products without price increase | r reload | tab price inputs | q quit\n\
price: type digits | backspace delete | enter filter | tab next field | esc list\n\
supplies: esc/enter/c close\n\
notice: enter/esc dismiss"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        CatalogRuntime, InternalEvent, ViewData, handle_key_event, process_internal_events,
        product_line, render, render_filter_text, render_header_text, render_supply_modal_text,
        status_text,
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::mpsc::{self, Receiver, Sender};
    use wholesale_app::{
        CatalogCommand, CatalogState, EMPTY_LIST_ALERT, FetchError, FetchPayload, FetchRequest,
        InputFocus, PriceField, PriceRange, Product, ProductId, RequestId, SupplyIncreaseRecord,
    };

    #[derive(Default)]
    struct TestRuntime {
        requests: Vec<FetchRequest>,
        replies: VecDeque<Result<FetchPayload, FetchError>>,
        deferred: bool,
        pending: Vec<(RequestId, FetchRequest)>,
    }

    impl TestRuntime {
        fn replying(replies: impl IntoIterator<Item = Result<FetchPayload, FetchError>>) -> Self {
            Self {
                replies: replies.into_iter().collect(),
                ..Self::default()
            }
        }
    }

    impl CatalogRuntime for TestRuntime {
        fn fetch(&mut self, request: &FetchRequest) -> Result<FetchPayload, FetchError> {
            self.requests.push(request.clone());
            self.replies
                .pop_front()
                .unwrap_or_else(|| Ok(FetchPayload::Products(Vec::new())))
        }

        fn spawn_fetch(
            &mut self,
            id: RequestId,
            request: FetchRequest,
            tx: Sender<InternalEvent>,
        ) -> anyhow::Result<()> {
            if self.deferred {
                self.requests.push(request.clone());
                self.pending.push((id, request));
                return Ok(());
            }
            let result = self.fetch(&request);
            tx.send(InternalEvent::Fetch(wholesale_app::FetchCompletion::new(
                id, request, result,
            )))?;
            Ok(())
        }
    }

    struct Harness {
        state: CatalogState,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: Sender<InternalEvent>,
        rx: Receiver<InternalEvent>,
    }

    impl Harness {
        fn new(runtime: TestRuntime) -> Self {
            let (tx, rx) = mpsc::channel();
            Self {
                state: CatalogState::default(),
                runtime,
                view_data: ViewData::default(),
                tx,
                rx,
            }
        }

        fn loaded(products: Vec<Product>) -> Self {
            let mut harness = Self::new(TestRuntime::replying([Ok(FetchPayload::Products(
                products,
            ))]));
            harness.press(KeyCode::Char('r'));
            harness
        }

        fn press(&mut self, code: KeyCode) -> bool {
            self.press_with(code, KeyModifiers::NONE)
        }

        fn press_with(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
            let quit = handle_key_event(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                KeyEvent::new(code, modifiers),
            );
            self.drain();
            quit
        }

        fn drain(&mut self) {
            process_internal_events(&mut self.state, &mut self.view_data, &self.tx, &self.rx);
        }

        fn names(&self) -> Vec<&str> {
            self.state
                .products
                .iter()
                .map(|product| product.name.as_str())
                .collect()
        }
    }

    fn product(id: i64, name: &str, price: f64) -> Product {
        Product {
            product_id: ProductId::new(id),
            name: name.to_owned(),
            price,
        }
    }

    fn supply(product_id: i64, quantity: Option<i64>) -> SupplyIncreaseRecord {
        SupplyIncreaseRecord {
            product_id: ProductId::new(product_id),
            total_quantity_2023: quantity,
            fields: BTreeMap::new(),
        }
    }

    fn screen_text(state: &CatalogState, view_data: &ViewData) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).expect("test terminal");
        terminal
            .draw(|frame| render(frame, state, view_data))
            .expect("draw");
        let buffer = terminal.backend().buffer();
        let area = buffer.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn product_rows_show_name_and_price_in_roubles() {
        assert_eq!(product_line(&product(1, "Sugar", 50.0)), "Sugar - 50 rub.");
        assert_eq!(product_line(&product(2, "Tea", 12.5)), "Tea - 12.5 rub.");
    }

    #[test]
    fn empty_list_renders_no_data() {
        let state = CatalogState::default();
        let screen = screen_text(&state, &ViewData::default());
        assert!(screen.contains("No data"));
        assert!(screen.contains("Wholesale base catalog"));
    }

    #[test]
    fn reload_key_replaces_products() {
        let harness = Harness::loaded(vec![product(1, "A", 50.0), product(2, "B", 10.0)]);
        assert_eq!(harness.runtime.requests, vec![FetchRequest::Products]);
        assert_eq!(harness.names(), ["A", "B"]);

        let screen = screen_text(&harness.state, &harness.view_data);
        assert!(screen.contains("A - 50 rub."));
        assert!(screen.contains("B - 10 rub."));
    }

    #[test]
    fn sort_keys_reorder_without_fetching() {
        let mut harness = Harness::loaded(vec![product(1, "A", 50.0), product(2, "B", 10.0)]);

        harness.press(KeyCode::Char('d'));
        assert_eq!(harness.names(), ["A", "B"]);
        harness.press(KeyCode::Char('a'));
        assert_eq!(harness.names(), ["B", "A"]);
        assert_eq!(harness.runtime.requests.len(), 1);
        assert_eq!(
            harness.state.status_line.as_deref(),
            Some("sorted: cheapest first")
        );
    }

    #[test]
    fn sort_on_empty_list_shows_blocking_alert() {
        let mut harness = Harness::new(TestRuntime::default());
        harness.press(KeyCode::Char('a'));
        assert_eq!(harness.state.alert.as_deref(), Some(EMPTY_LIST_ALERT));
        assert!(screen_text(&harness.state, &harness.view_data).contains(EMPTY_LIST_ALERT));

        // Everything but dismissal is swallowed while the alert is up.
        harness.press(KeyCode::Char('r'));
        harness.press(KeyCode::Tab);
        harness.press(KeyCode::Char('?'));
        assert!(harness.runtime.requests.is_empty());
        assert_eq!(harness.state.focus, InputFocus::List);
        assert!(!harness.view_data.help_visible);
        assert!(!harness.press(KeyCode::Char('q')));

        harness.press(KeyCode::Enter);
        assert!(harness.state.alert.is_none());
        harness.press(KeyCode::Char('r'));
        assert_eq!(harness.runtime.requests, vec![FetchRequest::Products]);
    }

    #[test]
    fn ctrl_q_quits_even_with_alert() {
        let mut harness = Harness::new(TestRuntime::default());
        harness.press(KeyCode::Char('d'));
        assert!(harness.state.alert.is_some());
        assert!(harness.press_with(KeyCode::Char('q'), KeyModifiers::CONTROL));
    }

    #[test]
    fn price_inputs_edit_and_submit_filter() {
        let mut harness = Harness::new(TestRuntime::default());

        harness.press(KeyCode::Tab);
        assert_eq!(harness.state.focus, InputFocus::Price(PriceField::Min));
        assert_eq!(harness.state.status_line.as_deref(), Some("editing price from"));
        harness.press(KeyCode::Backspace);
        harness.press(KeyCode::Char('1'));
        harness.press(KeyCode::Char('0'));
        harness.press(KeyCode::Tab);
        for _ in 0..4 {
            harness.press(KeyCode::Backspace);
        }
        harness.press(KeyCode::Char('2'));
        harness.press(KeyCode::Char('0'));
        assert_eq!(
            render_filter_text(&harness.state),
            "price from: 10   price to: [20_]"
        );

        harness.press(KeyCode::Enter);
        assert_eq!(
            harness.runtime.requests,
            vec![FetchRequest::FilterByPrice(PriceRange::new("10", "20"))]
        );

        // Typing 'q' in an input edits it instead of quitting.
        assert!(!harness.press(KeyCode::Char('q')));
        assert_eq!(harness.state.price_range.max, "20q");

        harness.press(KeyCode::Esc);
        assert_eq!(harness.state.focus, InputFocus::List);
        assert!(harness.press(KeyCode::Char('q')));
    }

    #[test]
    fn filter_key_on_list_uses_current_inputs() {
        let mut harness = Harness::new(TestRuntime::default());
        harness.press(KeyCode::Char('f'));
        assert_eq!(
            harness.runtime.requests,
            vec![FetchRequest::FilterByPrice(PriceRange::new("0", "1000"))]
        );
    }

    #[test]
    fn no_price_increase_key_caps_results() {
        let rows = (1..=5).map(|id| product(id, &format!("p{id}"), 1.0)).collect();
        let mut harness = Harness::new(TestRuntime::replying([Ok(FetchPayload::Products(rows))]));
        harness.press(KeyCode::Char('n'));
        assert_eq!(harness.runtime.requests, vec![FetchRequest::NoPriceIncrease]);
        assert_eq!(harness.names(), ["p1", "p2"]);
    }

    #[test]
    fn supplies_modal_names_product_and_closes_without_clearing() {
        let mut harness = Harness::loaded(vec![product(1, "Widget", 12.0)]);
        harness
            .runtime
            .replies
            .push_back(Ok(FetchPayload::SupplyIncrease(vec![supply(1, Some(30))])));

        harness.press(KeyCode::Enter);
        assert_eq!(
            harness.runtime.requests.last(),
            Some(&FetchRequest::SupplyIncrease(ProductId::new(1)))
        );
        assert!(harness.state.modal.is_visible());
        let screen = screen_text(&harness.state, &harness.view_data);
        assert!(screen.contains("Supplies of \"Widget\" in 2023"));
        assert!(screen.contains("30"));

        harness.press(KeyCode::Char('c'));
        assert!(!harness.state.modal.is_visible());
        assert!(harness.state.modal.payload.is_some());
        assert!(!screen_text(&harness.state, &harness.view_data).contains("in 2023"));
    }

    #[test]
    fn selection_moves_and_picks_product_for_supplies() {
        let mut harness = Harness::loaded(vec![
            product(1, "A", 1.0),
            product(2, "B", 2.0),
            product(3, "C", 3.0),
        ]);
        harness.press(KeyCode::Char('G'));
        assert_eq!(harness.view_data.selected, 2);
        harness.press(KeyCode::Char('j'));
        assert_eq!(harness.view_data.selected, 2);
        harness.press(KeyCode::Char('k'));
        harness.press(KeyCode::Enter);
        assert_eq!(
            harness.runtime.requests.last(),
            Some(&FetchRequest::SupplyIncrease(ProductId::new(2)))
        );
        harness.press(KeyCode::Esc);
        harness.press(KeyCode::Char('g'));
        assert_eq!(harness.view_data.selected, 0);
    }

    #[test]
    fn enter_on_empty_list_does_not_fetch() {
        let mut harness = Harness::new(TestRuntime::default());
        harness.press(KeyCode::Enter);
        assert!(harness.runtime.requests.is_empty());
        assert_eq!(harness.state.status_line.as_deref(), Some("no product selected"));
    }

    #[test]
    fn failed_supply_fetch_is_swallowed() {
        let mut harness = Harness::loaded(vec![product(1, "Widget", 12.0)]);
        harness.runtime.replies.push_back(Err(FetchError::Transport {
            url: "http://127.0.0.1:1/api/supplies/increase?productId=1".to_owned(),
            message: "connection refused".to_owned(),
        }));

        harness.press(KeyCode::Enter);
        assert!(!harness.state.modal.is_visible());
        assert!(harness.state.status_line.is_none());
        assert!(!screen_text(&harness.state, &harness.view_data).contains("refused"));
    }

    #[test]
    fn stale_product_completion_is_dropped() {
        let mut harness = Harness::new(TestRuntime {
            deferred: true,
            ..TestRuntime::default()
        });
        harness.press(KeyCode::Char('r'));
        harness.press(KeyCode::Char('n'));
        assert!(render_header_text(&harness.state).contains("loading..."));

        let pending = std::mem::take(&mut harness.runtime.pending);
        let (newest_id, newest) = pending[1].clone();
        let (oldest_id, oldest) = pending[0].clone();
        for (id, request, rows) in [
            (newest_id, newest, vec![product(2, "newest", 1.0)]),
            (oldest_id, oldest, vec![product(1, "stale", 1.0)]),
        ] {
            harness
                .tx
                .send(InternalEvent::Fetch(wholesale_app::FetchCompletion::new(
                    id,
                    request,
                    Ok(FetchPayload::Products(rows)),
                )))
                .expect("send completion");
        }
        harness.drain();
        assert_eq!(harness.names(), ["newest"]);
        assert!(!render_header_text(&harness.state).contains("loading..."));
    }

    #[test]
    fn status_clear_ignores_outdated_tokens() {
        let mut harness = Harness::loaded(vec![product(1, "A", 1.0)]);
        harness.press(KeyCode::Char('a'));
        let token = harness.view_data.status_token;
        assert!(token > 0);

        harness
            .tx
            .send(InternalEvent::ClearStatus { token: token - 1 })
            .expect("send");
        harness.drain();
        assert!(harness.state.status_line.is_some());

        harness
            .tx
            .send(InternalEvent::ClearStatus { token })
            .expect("send");
        harness.drain();
        assert!(harness.state.status_line.is_none());
    }

    #[test]
    fn help_overlay_toggles_and_hides_hints() {
        let mut harness = Harness::new(TestRuntime::default());
        harness.press(KeyCode::Char('?'));
        assert!(harness.view_data.help_visible);
        assert_eq!(status_text(&harness.state, &harness.view_data), "");
        harness.press(KeyCode::Char('r'));
        assert!(harness.runtime.requests.is_empty());
        harness.press(KeyCode::Esc);
        assert!(!harness.view_data.help_visible);
        assert!(status_text(&harness.state, &harness.view_data).contains("q quit"));
    }

    #[test]
    fn header_counts_suppliers() {
        let mut state = CatalogState::default();
        assert_eq!(render_header_text(&state), "suppliers: 0");
        state.dispatch(CatalogCommand::Mount);
        assert!(render_header_text(&state).ends_with("loading..."));
    }

    #[test]
    fn modal_text_covers_missing_data() {
        let (title, body) = render_supply_modal_text(&wholesale_app::SupplySummary::Increase {
            product_id: ProductId::new(4),
            product_name: "unknown product #4".to_owned(),
            quantity: wholesale_app::SupplyQuantity::NoData,
        });
        assert_eq!(title, "Supplies of \"unknown product #4\" in 2023");
        assert!(body.contains("No 2023 supply data"));

        let (title, body) = render_supply_modal_text(&wholesale_app::SupplySummary::NoRecords {
            product_name: Some("Widget".to_owned()),
        });
        assert!(title.contains("Widget"));
        assert!(body.contains("No supply records"));
    }
}
