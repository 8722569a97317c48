use crate::advisor::AdvisoryClient;
use crate::db::slot::PersistencePort;
use crate::models::transaction::{Transaction, TransactionType};
use crate::operations::add::add_transaction;
use crate::operations::advise::{AdvisorPanel, UNAVAILABLE_MESSAGE, generate_insights};
use crate::operations::remove::remove_transaction;
use crate::operations::report::{format_currency, render_allocation_chart, render_summary_cards};
use crate::operations::stats::derive_stats;
use crate::store::RecordStore;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Modifier, Rect, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    List,
    Form(TransactionType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Amount,
    Description,
    Category,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Amount => FormField::Description,
            FormField::Description => FormField::Category,
            FormField::Category => FormField::Amount,
        }
    }
}

#[derive(Debug, Clone)]
struct FormState {
    field: FormField,
    amount: String,
    description: String,
    category: String,
    error: Option<String>,
}

impl FormState {
    fn new(transaction_type: TransactionType) -> Self {
        Self {
            field: FormField::Amount,
            amount: String::new(),
            description: String::new(),
            category: transaction_type.default_category().to_string(),
            error: None,
        }
    }

    fn buffer(&mut self) -> &mut String {
        match self.field {
            FormField::Amount => &mut self.amount,
            FormField::Description => &mut self.description,
            FormField::Category => &mut self.category,
        }
    }

    /// Steps through the suggestions for the current type. A custom category
    /// restarts from the first suggestion.
    fn cycle_category(&mut self, transaction_type: TransactionType, delta: isize) {
        let suggestions = transaction_type.suggested_categories();
        let len = suggestions.len() as isize;
        let next = match suggestions.iter().position(|c| *c == self.category) {
            Some(idx) => (idx as isize + delta).rem_euclid(len),
            None => 0,
        };
        self.category = suggestions[next as usize].to_string();
    }
}

struct DashboardState {
    mode: Mode,
    form: FormState,
    table_state: TableState,
    advisor: AdvisorPanel,
    advisor_rx: Option<Receiver<Option<String>>>,
    status: Option<String>,
}

impl DashboardState {
    fn new(transaction_count: usize) -> Self {
        let mut table_state = TableState::default();
        if transaction_count > 0 {
            table_state.select(Some(0));
        }
        Self {
            mode: Mode::List,
            form: FormState::new(TransactionType::Expense),
            table_state,
            advisor: AdvisorPanel::default(),
            advisor_rx: None,
            status: None,
        }
    }

    fn move_selection(&mut self, delta: i32, len: usize) {
        if len == 0 {
            self.table_state.select(None);
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as i32;
        let next = (current + delta).clamp(0, len as i32 - 1) as usize;
        self.table_state.select(Some(next));
    }

    fn clamp_selection(&mut self, len: usize) {
        match (self.table_state.selected(), len) {
            (_, 0) => self.table_state.select(None),
            (None, _) => self.table_state.select(Some(0)),
            (Some(sel), _) => self.table_state.select(Some(sel.min(len - 1))),
        }
    }

    fn open_form(&mut self, transaction_type: TransactionType) {
        self.form = FormState::new(transaction_type);
        self.mode = Mode::Form(transaction_type);
    }

    fn start_advice(&mut self, client: &Arc<dyn AdvisoryClient>, transactions: &[Transaction]) {
        if !self.advisor.begin(!transactions.is_empty()) {
            return;
        }

        let (tx, rx) = mpsc::channel();
        let client = Arc::clone(client);
        let snapshot = transactions.to_vec();
        thread::spawn(move || {
            let _ = tx.send(generate_insights(client.as_ref(), &snapshot));
        });
        self.advisor_rx = Some(rx);
    }

    /// Picks up a finished advisory request, if any. A worker that went away
    /// without answering counts as a failure.
    fn poll_advice(&mut self) {
        let outcome = match self.advisor_rx.as_ref() {
            Some(rx) => match rx.try_recv() {
                Ok(text) => text.unwrap_or_else(|| UNAVAILABLE_MESSAGE.to_string()),
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => UNAVAILABLE_MESSAGE.to_string(),
            },
            None => return,
        };
        self.advisor_rx = None;
        self.advisor.finish(&outcome);
    }
}

pub fn run_dashboard<P: PersistencePort>(
    store: &mut RecordStore<P>,
    client: Arc<dyn AdvisoryClient>,
) -> Result<(), String> {
    enable_raw_mode().map_err(|e| format!("Failed to enable raw mode: {}", e))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)
        .map_err(|e| format!("Failed to enter alternate screen: {}", e))?;

    let result = (|| {
        let backend = ratatui::backend::CrosstermBackend::new(stdout);
        let mut terminal = ratatui::Terminal::new(backend)
            .map_err(|e| format!("Failed to initialize terminal: {}", e))?;

        let mut state = DashboardState::new(store.transactions().len());

        loop {
            state.poll_advice();

            terminal
                .draw(|frame| draw(frame, store.transactions(), &mut state))
                .map_err(|e| format!("Failed to draw terminal UI: {}", e))?;

            if event::poll(std::time::Duration::from_millis(200))
                .map_err(|e| format!("Failed to poll input: {}", e))?
            {
                match event::read().map_err(|e| format!("Failed to read input: {}", e))? {
                    Event::Key(key) => {
                        if handle_key(store, &mut state, &client, key) {
                            break;
                        }
                    }
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }

        Ok(())
    })();

    disable_raw_mode().map_err(|e| format!("Failed to disable raw mode: {}", e))?;
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen)
        .map_err(|e| format!("Failed to leave alternate screen: {}", e))?;

    result
}

/// Applies one key press. Returns `true` when the dashboard should close.
fn handle_key<P: PersistencePort>(
    store: &mut RecordStore<P>,
    state: &mut DashboardState,
    client: &Arc<dyn AdvisoryClient>,
    key: KeyEvent,
) -> bool {
    // Many terminals emit both a Press and a Release event. Only act on Press/Repeat.
    if key.kind == KeyEventKind::Release {
        return false;
    }

    match state.mode {
        Mode::List => {
            let len = store.transactions().len();
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return true,
                KeyCode::Up => state.move_selection(-1, len),
                KeyCode::Down => state.move_selection(1, len),
                KeyCode::Char('i') => state.open_form(TransactionType::Income),
                KeyCode::Char('e') => state.open_form(TransactionType::Expense),
                KeyCode::Char('d') | KeyCode::Delete => delete_selected(store, state),
                KeyCode::Char('g') => state.start_advice(client, store.transactions()),
                _ => {}
            }
        }
        Mode::Form(transaction_type) => {
            if key.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
            {
                state.mode = Mode::List;
                return false;
            }

            match key.code {
                KeyCode::Esc => state.mode = Mode::List,
                KeyCode::Tab => state.form.field = state.form.field.next(),
                KeyCode::Up if state.form.field == FormField::Category => {
                    state.form.cycle_category(transaction_type, -1)
                }
                KeyCode::Down if state.form.field == FormField::Category => {
                    state.form.cycle_category(transaction_type, 1)
                }
                KeyCode::Enter => submit_form(store, state, transaction_type),
                KeyCode::Backspace => {
                    state.form.buffer().pop();
                    state.form.error = None;
                }
                KeyCode::Char(ch) => {
                    state.form.buffer().push(ch);
                    state.form.error = None;
                }
                _ => {}
            }
        }
    }

    false
}

fn submit_form<P: PersistencePort>(
    store: &mut RecordStore<P>,
    state: &mut DashboardState,
    transaction_type: TransactionType,
) {
    let form = &state.form;
    match add_transaction(store, transaction_type, &form.amount, &form.description, &form.category) {
        Ok(transaction) => {
            info!(id = %transaction.id, "added from dashboard");
            state.status = Some(format!(
                "Added {} {}",
                transaction.transaction_type.as_str(),
                format_currency(transaction.amount)
            ));
            state.mode = Mode::List;
            state.table_state.select(Some(0));
        }
        Err(e) => state.form.error = Some(e),
    }
}

fn delete_selected<P: PersistencePort>(store: &mut RecordStore<P>, state: &mut DashboardState) {
    let id = match state
        .table_state
        .selected()
        .and_then(|sel| store.transactions().get(sel))
    {
        Some(transaction) => transaction.id.clone(),
        None => return,
    };

    state.status = match remove_transaction(store, &id) {
        Ok(_) => Some("Transaction deleted".to_string()),
        Err(e) => Some(e),
    };
    state.clamp_selection(store.transactions().len());
}

fn draw(frame: &mut ratatui::Frame, transactions: &[Transaction], state: &mut DashboardState) {
    let stats = derive_stats(transactions);
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(size);

    render_summary_cards(frame, layout[0], &stats);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(layout[1]);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(body[0]);

    render_allocation_chart(frame, left[0], &stats);
    render_advisor(frame, left[1], state, !transactions.is_empty());
    render_history(frame, body[1], transactions, state);
    render_footer(frame, layout[2], state);

    if let Mode::Form(transaction_type) = state.mode {
        render_form(frame, size, &state.form, transaction_type);
    }
}

fn render_advisor(frame: &mut ratatui::Frame, area: Rect, state: &DashboardState, has_transactions: bool) {
    let title = if state.advisor.is_pending() {
        "AI Financial Advisor (Analyzing...)"
    } else if state.advisor.can_request(has_transactions) {
        "AI Financial Advisor (g: Generate Tips)"
    } else {
        "AI Financial Advisor"
    };
    let block = Block::default().title(title).borders(Borders::ALL);

    let lines: Vec<Line> = match state.advisor.tips() {
        _ if state.advisor.is_pending() => vec![Line::from(Span::styled(
            "Analyzing your transactions...",
            Style::default().fg(Color::DarkGray),
        ))],
        Some(tips) => tips
            .iter()
            .map(|tip| Line::from(vec![Span::styled("• ", Style::default().fg(Color::Cyan)), Span::raw(tip.clone())]))
            .collect(),
        None => vec![Line::from(Span::styled(
            "Get personalized insights based on your spending habits. Add at least one transaction to start.",
            Style::default().fg(Color::DarkGray),
        ))],
    };

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_history(frame: &mut ratatui::Frame, area: Rect, transactions: &[Transaction], state: &mut DashboardState) {
    let block = Block::default().title("History").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if transactions.is_empty() {
        let empty = Paragraph::new("No transactions yet")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let header = Row::new([
        Cell::from("Date").style(bold),
        Cell::from("Description").style(bold),
        Cell::from("Category").style(bold),
        Cell::from("Amount").style(bold),
    ]);

    let rows = transactions.iter().map(|tx| {
        let (sign, color) = match tx.transaction_type {
            TransactionType::Income => ("+", Color::Green),
            TransactionType::Expense => ("-", Color::Red),
        };
        Row::new([
            Cell::from(tx.date.format("%Y-%m-%d").to_string()),
            Cell::from(tx.description.clone()),
            Cell::from(tx.category.clone()),
            Cell::from(format!("{}{}", sign, format_currency(tx.amount))).style(Style::default().fg(color)),
        ])
    });

    let widths = [
        Constraint::Length(10),
        Constraint::Min(10),
        Constraint::Length(13),
        Constraint::Length(13),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White))
        .highlight_symbol("➤ ")
        .column_spacing(1);

    frame.render_stateful_widget(table, inner, &mut state.table_state);
}

fn render_footer(frame: &mut ratatui::Frame, area: Rect, state: &DashboardState) {
    let hint = match state.mode {
        Mode::List => "i add income  e add expense  ↑/↓ move  d delete  g tips  q/Esc exit",
        Mode::Form(_) => "Tab next field  ↑/↓ category  Enter save  Esc cancel",
    };

    let mut spans = vec![Span::raw(hint)];
    if let Some(ref status) = state.status {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::Yellow)));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_form(frame: &mut ratatui::Frame, area: Rect, form: &FormState, transaction_type: TransactionType) {
    let popup_area = centered_rect(60, 50, area);
    frame.render_widget(Clear, popup_area);

    let (title, color) = match transaction_type {
        TransactionType::Income => ("Add New Income", Color::Green),
        TransactionType::Expense => ("Add New Expense", Color::Red),
    };

    let field_line = |label: &str, value: &str, field: FormField| {
        let style = if form.field == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let cursor = if form.field == field { "_" } else { "" };
        Line::from(vec![
            Span::styled(format!("{:<13}", label), style),
            Span::styled(format!("> {}{}", value, cursor), style),
        ])
    };

    let mut lines = vec![
        Line::from(""),
        field_line("Amount ($)", &form.amount, FormField::Amount),
        field_line("Description", &form.description, FormField::Description),
        field_line("Category", &form.category, FormField::Category),
        Line::from(Span::styled(
            format!("Suggestions: {}", transaction_type.suggested_categories().join(", ")),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    if let Some(ref err) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title, Style::default().fg(color).add_modifier(Modifier::BOLD)));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        popup_area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

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
    use super::*;
    use crate::operations::advise::tests::{Script, ScriptedAdvisor};
    use crate::store::tests::MemorySlot;
    use rust_decimal::Decimal;
    use std::time::Duration;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(
        store: &mut RecordStore<MemorySlot>,
        state: &mut DashboardState,
        client: &Arc<dyn AdvisoryClient>,
        text: &str,
    ) {
        for ch in text.chars() {
            handle_key(store, state, client, press(KeyCode::Char(ch)));
        }
    }

    fn scripted(script: Script) -> Arc<dyn AdvisoryClient> {
        Arc::new(ScriptedAdvisor::new(script))
    }

    fn wait_for_advice(state: &mut DashboardState) {
        for _ in 0..200 {
            state.poll_advice();
            if !state.advisor.is_pending() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("advisory request never finished");
    }

    #[test]
    fn test_add_income_through_form() {
        let mut store = RecordStore::load(MemorySlot::default());
        let mut state = DashboardState::new(0);
        let client = scripted(Script::Reply("- tip"));

        handle_key(&mut store, &mut state, &client, press(KeyCode::Char('i')));
        type_text(&mut store, &mut state, &client, "1000");
        handle_key(&mut store, &mut state, &client, press(KeyCode::Tab));
        type_text(&mut store, &mut state, &client, "Paycheck");
        handle_key(&mut store, &mut state, &client, press(KeyCode::Enter));

        assert_eq!(state.mode, Mode::List);
        assert_eq!(store.transactions().len(), 1);
        let added = &store.transactions()[0];
        assert_eq!(added.transaction_type, TransactionType::Income);
        assert_eq!(added.amount, Decimal::from(1000));
        assert_eq!(added.category, "Salary");
    }

    #[test]
    fn test_invalid_form_stays_open() {
        let mut store = RecordStore::load(MemorySlot::default());
        let mut state = DashboardState::new(0);
        let client = scripted(Script::Reply("- tip"));

        handle_key(&mut store, &mut state, &client, press(KeyCode::Char('e')));
        type_text(&mut store, &mut state, &client, "12");
        handle_key(&mut store, &mut state, &client, press(KeyCode::Enter));

        assert_eq!(state.mode, Mode::Form(TransactionType::Expense));
        assert_eq!(state.form.error.as_deref(), Some("Description is required."));
        assert!(store.is_empty());
    }

    #[test]
    fn test_editing_clears_form_error() {
        let mut store = RecordStore::load(MemorySlot::default());
        let mut state = DashboardState::new(0);
        let client = scripted(Script::Reply("- tip"));

        handle_key(&mut store, &mut state, &client, press(KeyCode::Char('e')));
        handle_key(&mut store, &mut state, &client, press(KeyCode::Enter));
        assert_eq!(state.form.error.as_deref(), Some("Amount is required."));

        type_text(&mut store, &mut state, &client, "5");
        assert!(state.form.error.is_none());

        handle_key(&mut store, &mut state, &client, press(KeyCode::Enter));
        assert!(state.form.error.is_some());
        handle_key(&mut store, &mut state, &client, press(KeyCode::Backspace));
        assert!(state.form.error.is_none());
    }

    #[test]
    fn test_failed_save_does_not_duplicate_on_retry() {
        let slot = MemorySlot {
            fail_writes: true,
            ..MemorySlot::default()
        };
        let mut store = RecordStore::load(slot);
        let mut state = DashboardState::new(0);
        let client = scripted(Script::Reply("- tip"));

        handle_key(&mut store, &mut state, &client, press(KeyCode::Char('e')));
        type_text(&mut store, &mut state, &client, "20");
        handle_key(&mut store, &mut state, &client, press(KeyCode::Tab));
        type_text(&mut store, &mut state, &client, "Groceries");
        handle_key(&mut store, &mut state, &client, press(KeyCode::Enter));
        handle_key(&mut store, &mut state, &client, press(KeyCode::Enter));

        assert_eq!(state.mode, Mode::Form(TransactionType::Expense));
        assert!(
            state
                .form
                .error
                .as_deref()
                .is_some_and(|e| e.starts_with("Failed to save transaction"))
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_category_cycles_through_suggestions() {
        let mut form = FormState::new(TransactionType::Expense);

        form.cycle_category(TransactionType::Expense, 1);
        assert_eq!(form.category, "Rent");
        form.cycle_category(TransactionType::Expense, -2);
        assert_eq!(form.category, "Other");
    }

    #[test]
    fn test_delete_selected_transaction() {
        let mut store = RecordStore::load(MemorySlot::default());
        let client = scripted(Script::Reply("- tip"));
        let mut state = DashboardState::new(0);

        handle_key(&mut store, &mut state, &client, press(KeyCode::Char('e')));
        type_text(&mut store, &mut state, &client, "5");
        handle_key(&mut store, &mut state, &client, press(KeyCode::Tab));
        type_text(&mut store, &mut state, &client, "Snack");
        handle_key(&mut store, &mut state, &client, press(KeyCode::Enter));
        assert_eq!(store.transactions().len(), 1);

        handle_key(&mut store, &mut state, &client, press(KeyCode::Char('d')));

        assert!(store.is_empty());
        assert_eq!(state.table_state.selected(), None);
    }

    #[test]
    fn test_delete_with_empty_list_is_noop() {
        let mut store = RecordStore::load(MemorySlot::default());
        let mut state = DashboardState::new(0);
        let client = scripted(Script::Reply("- tip"));

        let quit = handle_key(&mut store, &mut state, &client, press(KeyCode::Char('d')));

        assert!(!quit);
        assert!(state.status.is_none());
    }

    #[test]
    fn test_generate_tips_requires_transactions() {
        let mut store = RecordStore::load(MemorySlot::default());
        let mut state = DashboardState::new(0);
        let client = scripted(Script::Reply("- tip"));

        handle_key(&mut store, &mut state, &client, press(KeyCode::Char('g')));

        assert!(!state.advisor.is_pending());
        assert!(state.advisor_rx.is_none());
    }

    #[test]
    fn test_generate_tips_runs_in_background() {
        let mut store = RecordStore::load(MemorySlot::default());
        let mut state = DashboardState::new(0);
        let client = scripted(Script::Reply("1. Spend less\n2. Save more"));
        store
            .append(crate::store::tests::create_test_draft(TransactionType::Income, 100, "Pay"))
            .unwrap();

        handle_key(&mut store, &mut state, &client, press(KeyCode::Char('g')));
        assert!(state.advisor.is_pending());
        assert!(!state.advisor.can_request(true));

        wait_for_advice(&mut state);
        assert_eq!(
            state.advisor.tips(),
            Some(&["Spend less".to_string(), "Save more".to_string()][..])
        );
    }

    #[test]
    fn test_failed_tips_clear_pending_with_fallback() {
        let mut store = RecordStore::load(MemorySlot::default());
        let mut state = DashboardState::new(0);
        let client = scripted(Script::Timeout);
        store
            .append(crate::store::tests::create_test_draft(TransactionType::Expense, 10, "Food"))
            .unwrap();

        handle_key(&mut store, &mut state, &client, press(KeyCode::Char('g')));
        wait_for_advice(&mut state);

        assert_eq!(state.advisor.tips(), Some(&[UNAVAILABLE_MESSAGE.to_string()][..]));
    }

    #[test]
    fn test_quit_keys() {
        let mut store = RecordStore::load(MemorySlot::default());
        let mut state = DashboardState::new(0);
        let client = scripted(Script::Reply("- tip"));

        assert!(handle_key(&mut store, &mut state, &client, press(KeyCode::Char('q'))));

        handle_key(&mut store, &mut state, &client, press(KeyCode::Char('i')));
        // In the form, q is text and Esc only closes the form.
        assert!(!handle_key(&mut store, &mut state, &client, press(KeyCode::Char('q'))));
        assert!(!handle_key(&mut store, &mut state, &client, press(KeyCode::Esc)));
        assert_eq!(state.mode, Mode::List);
    }
}
