use anyhow::Result;
use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dataset_catalog::{
    view::NO_MATCHES_MESSAGE, Browser, CardView, CatalogError, Config, FeedbackForm, FilterGroup,
    UiEvent,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Catalog,
    Filters,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Catalog => Page::Filters,
            Page::Filters => Page::Catalog,
        }
    }

    pub fn previous(&self) -> Self {
        // two pages: same as next
        self.next()
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Catalog => "Catalog",
            Page::Filters => "Filters",
        }
    }
}

/// What typed characters currently go into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    YearFrom(String),
    YearTo(String),
    Feedback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Warning(String),
}

/// One row on the Filters page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterItem {
    Pill(String),
    Check(FilterGroup, String),
}

pub struct App {
    pub browser: Browser,
    pub state: TableState,
    pub filters_state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
    pub input: InputMode,
    /// Raw search box text; the browser keeps the normalized form
    pub search_text: String,
    pub feedback: FeedbackForm,
    pub notice: Option<Notice>,
    pub export_dir: PathBuf,
    pub export_prefix: String,
    pub today: NaiveDate,
}

impl App {
    pub fn new(browser: Browser, config: &Config, today: NaiveDate) -> Self {
        let mut state = TableState::default();
        if browser.visible_count() > 0 {
            state.select(Some(0));
        }

        let mut filters_state = TableState::default();
        filters_state.select(Some(0));

        Self {
            browser,
            state,
            filters_state,
            current_page: Page::Catalog,
            show_detail: false,
            input: InputMode::Normal,
            search_text: String::new(),
            feedback: FeedbackForm::default(),
            notice: None,
            export_dir: config.export_dir.clone(),
            export_prefix: config.export_prefix.clone(),
            today,
        }
    }

    /// Forward an event to the browser and keep the selection in range
    pub fn dispatch(&mut self, event: UiEvent) {
        self.browser.apply(event);

        if self.browser.visible_count() > 0 {
            self.state.select(Some(0));
        } else {
            self.state.select(None);
            self.show_detail = false;
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail && self.state.selected().is_some();
    }

    pub fn filter_items(&self) -> Vec<FilterItem> {
        let facets = self.browser.facets();
        let mut items: Vec<FilterItem> = facets
            .categories
            .iter()
            .map(|c| FilterItem::Pill(c.clone()))
            .collect();
        for group in [FilterGroup::Type, FilterGroup::Tags, FilterGroup::Region] {
            items.extend(
                facets
                    .values(group)
                    .iter()
                    .map(|v| FilterItem::Check(group, v.clone())),
            );
        }
        items
    }

    pub fn is_item_active(&self, item: &FilterItem) -> bool {
        match item {
            FilterItem::Pill(category) => self.browser.is_pill_active(category),
            FilterItem::Check(group, value) => self.browser.state().is_checked(*group, value),
        }
    }

    /// Space on the Filters page
    pub fn toggle_selected_item(&mut self) {
        let items = self.filter_items();
        let Some(item) = self.filters_state.selected().and_then(|i| items.get(i)) else {
            return;
        };

        let event = match item {
            FilterItem::Pill(category) => UiEvent::PillClicked(category.clone()),
            FilterItem::Check(group, value) => UiEvent::FilterToggled {
                group: *group,
                value: value.clone(),
                checked: !self.is_item_active(item),
            },
        };
        self.dispatch(event);
    }

    pub fn clear_filters(&mut self) {
        self.search_text.clear();
        self.dispatch(UiEvent::ClearAll);
    }

    pub fn export(&mut self) {
        match self
            .browser
            .export_to(&self.export_dir, &self.export_prefix, self.today)
        {
            Ok(path) => {
                self.notice = Some(Notice::Info(format!(
                    "Exported {} to {}",
                    self.browser.result_label().replace(" found", ""),
                    path.display()
                )));
            }
            Err(CatalogError::NothingToExport) => {
                debug!("nothing visible to export");
                self.notice = Some(Notice::Warning(CatalogError::NothingToExport.to_string()));
            }
            Err(e) => {
                warn!(error = %e, "export failed");
                self.notice = Some(Notice::Warning(e.to_string()));
            }
        }
    }

    pub fn submit_feedback(&mut self) {
        match self.feedback.submit() {
            Ok(ack) => {
                self.notice = Some(Notice::Info(ack.to_string()));
                self.input = InputMode::Normal;
            }
            Err(e) => self.notice = Some(Notice::Warning(e.to_string())),
        }
    }

    pub fn next(&mut self) {
        let len = self.current_len();
        let state = self.current_table_mut();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.current_len();
        let state = self.current_table_mut();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.current_len();
        let state = self.current_table_mut();
        if len == 0 {
            return;
        }
        let i = state.selected().map_or(0, |i| (i + 20).min(len - 1));
        state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let len = self.current_len();
        let state = self.current_table_mut();
        if len == 0 {
            return;
        }
        let i = state.selected().map_or(0, |i| i.saturating_sub(20));
        state.select(Some(i));
    }

    fn current_len(&self) -> usize {
        match self.current_page {
            Page::Catalog => self.browser.visible_count(),
            Page::Filters => self.filter_items().len(),
        }
    }

    fn current_table_mut(&mut self) -> &mut TableState {
        match self.current_page {
            Page::Catalog => &mut self.state,
            Page::Filters => &mut self.filters_state,
        }
    }

    /// Returns true when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        // A notice lasts until the next key
        self.notice = None;

        match self.input.clone() {
            InputMode::Normal => return self.handle_normal_key(key),
            InputMode::Search => match key.code {
                KeyCode::Esc | KeyCode::Enter => self.input = InputMode::Normal,
                KeyCode::Backspace => {
                    self.search_text.pop();
                    self.dispatch(UiEvent::SearchChanged(self.search_text.clone()));
                }
                KeyCode::Char(c) => {
                    self.search_text.push(c);
                    self.dispatch(UiEvent::SearchChanged(self.search_text.clone()));
                }
                _ => {}
            },
            InputMode::YearFrom(mut buffer) | InputMode::YearTo(mut buffer) => {
                let from = matches!(self.input, InputMode::YearFrom(_));
                match key.code {
                    KeyCode::Esc | KeyCode::Enter => {
                        self.input = InputMode::Normal;
                        return false;
                    }
                    KeyCode::Backspace => {
                        buffer.pop();
                    }
                    KeyCode::Char(c) => buffer.push(c),
                    _ => return false,
                }
                let event = if from {
                    self.input = InputMode::YearFrom(buffer.clone());
                    UiEvent::YearFromChanged(buffer)
                } else {
                    self.input = InputMode::YearTo(buffer.clone());
                    UiEvent::YearToChanged(buffer)
                };
                self.dispatch(event);
            }
            InputMode::Feedback => match key.code {
                KeyCode::Esc => {
                    self.feedback.close();
                    self.input = InputMode::Normal;
                }
                KeyCode::Enter => self.submit_feedback(),
                KeyCode::Backspace => {
                    self.feedback.text.pop();
                }
                KeyCode::Char(c) => self.feedback.text.push(c),
                _ => {}
            },
        }
        false
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                if self.show_detail {
                    self.show_detail = false;
                } else {
                    return true;
                }
            }
            KeyCode::Enter if self.current_page == Page::Catalog => self.toggle_detail(),
            KeyCode::Tab | KeyCode::BackTab => {
                self.show_detail = false;
                if key.modifiers.contains(KeyModifiers::SHIFT) || key.code == KeyCode::BackTab {
                    self.current_page = self.current_page.previous();
                } else {
                    self.current_page = self.current_page.next();
                }
            }
            KeyCode::Char('/') => self.input = InputMode::Search,
            KeyCode::Char('[') => {
                let current = self.browser.state().year_from.map(|y| y.to_string());
                self.input = InputMode::YearFrom(current.unwrap_or_default());
            }
            KeyCode::Char(']') => {
                let current = self.browser.state().year_to.map(|y| y.to_string());
                self.input = InputMode::YearTo(current.unwrap_or_default());
            }
            KeyCode::Char(' ') if self.current_page == Page::Filters => self.toggle_selected_item(),
            KeyCode::Char('c') => self.clear_filters(),
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('f') => {
                self.feedback.open();
                self.input = InputMode::Feedback;
            }
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home => {
                if self.current_len() > 0 {
                    self.current_table_mut().select(Some(0));
                }
            }
            KeyCode::End => {
                let len = self.current_len();
                if len > 0 {
                    self.current_table_mut().select(Some(len - 1));
                }
            }
            _ => {}
        }
        false
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header: pages, count, pills
            Constraint::Length(3), // Search + year inputs
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_inputs(f, chunks[1], app);

    if app.show_detail && app.current_page == Page::Catalog {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(55), // Card list
                Constraint::Percentage(45), // Detail panel
            ])
            .split(chunks[2]);

        render_cards(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Catalog => render_cards(f, chunks[2], app),
            Page::Filters => render_filters(f, chunks[2], app),
        }
    }

    render_status_bar(f, chunks[3], app);

    if app.feedback.open {
        render_feedback_modal(f, app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Catalog, Page::Filters].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        app.browser.result_label(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Total: {}", app.browser.total_count()),
        Style::default().fg(Color::DarkGray),
    ));
    if app.browser.state().is_active() {
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled("Filtered (c to clear)", Style::default().fg(Color::Yellow)));
    }

    let mut pill_spans = vec![Span::styled("Categories: ", Style::default().fg(Color::Cyan))];
    for category in &app.browser.facets().categories {
        let style = if app.browser.is_pill_active(category) {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        pill_spans.push(Span::styled(format!(" {category} "), style));
        pill_spans.push(Span::raw(" "));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans), Line::from(pill_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_inputs(f: &mut Frame, area: Rect, app: &App) {
    let editing = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let label = Style::default().fg(Color::Cyan);

    let search_cursor = if app.input == InputMode::Search { "▏" } else { "" };
    let (from_text, from_style) = match &app.input {
        InputMode::YearFrom(buffer) => (format!("{buffer}▏"), editing),
        _ => (year_text(app.browser.state().year_from), Style::default()),
    };
    let (to_text, to_style) = match &app.input {
        InputMode::YearTo(buffer) => (format!("{buffer}▏"), editing),
        _ => (year_text(app.browser.state().year_to), Style::default()),
    };

    let line = Line::from(vec![
        Span::styled(" Search: ", label),
        Span::styled(
            format!("{}{}", app.search_text, search_cursor),
            if app.input == InputMode::Search { editing } else { Style::default() },
        ),
        Span::raw("   "),
        Span::styled("Years: ", label),
        Span::styled(from_text, from_style),
        Span::raw(" – "),
        Span::styled(to_text, to_style),
    ]);

    let inputs = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(inputs, area);
}

fn year_text(bound: Option<i64>) -> String {
    bound.map_or_else(|| "any".to_string(), |y| y.to_string())
}

fn render_cards(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" Datasets ");

    let cards = app.browser.cards(app.today);
    if cards.is_empty() {
        let empty = Paragraph::new(format!("\n  {NO_MATCHES_MESSAGE}")).block(block);
        f.render_widget(empty, area);
        return;
    }

    let header_cells = ["", "Name", "Type", "Tags", "Description"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = cards.iter().map(card_row);

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(32),
            Constraint::Length(10),
            Constraint::Length(28),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn card_row(card: &CardView) -> Row<'static> {
    let kind_color = if card.is_database { Color::Magenta } else { Color::Green };
    let badge = if card.recently_added {
        Cell::from("NEW").style(Style::default().fg(Color::Black).bg(Color::Green))
    } else {
        Cell::from("")
    };

    Row::new(vec![
        badge,
        Cell::from(truncate(&card.name, 30)),
        Cell::from(card.kind.clone()).style(Style::default().fg(kind_color)),
        Cell::from(truncate(&card.tags.join(", "), 26)).style(Style::default().fg(Color::Cyan)),
        Cell::from(card.description.clone()).style(Style::default().fg(Color::Gray)),
    ])
    .height(1)
}

fn render_filters(f: &mut Frame, area: Rect, app: &mut App) {
    let items = app.filter_items();

    let rows: Vec<Row> = items
        .iter()
        .map(|item| {
            let active = app.is_item_active(item);
            let mark = if active { "[x]" } else { "[ ]" };
            let (group, value) = match item {
                FilterItem::Pill(category) => ("Category", category.as_str()),
                FilterItem::Check(group, value) => (group.title(), value.as_str()),
            };
            let style = if active {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(mark).style(style),
                Cell::from(group).style(Style::default().fg(Color::Cyan)),
                Cell::from(value.to_string()).style(style),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Length(4), Constraint::Length(10), Constraint::Min(20)],
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Filters - Space to toggle "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.filters_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = Style::default().fg(Color::Yellow);

    let status_spans = match (&app.notice, &app.input) {
        (_, InputMode::Search) | (_, InputMode::YearFrom(_)) | (_, InputMode::YearTo(_)) => vec![
            Span::styled(" Typing", Style::default().fg(Color::Cyan)),
            Span::raw(" | "),
            Span::styled("Enter/Esc", key),
            Span::raw(" Done"),
        ],
        (Some(Notice::Info(msg)), _) => vec![Span::styled(format!(" {msg}"), Style::default().fg(Color::Green))],
        (Some(Notice::Warning(msg)), _) => vec![Span::styled(format!(" ⚠ {msg}"), Style::default().fg(Color::Red))],
        (None, _) => {
            let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
            let mut spans = vec![Span::styled(
                format!(" Row: {}/{} ", selected, app.browser.visible_count()),
                Style::default().fg(Color::Cyan),
            )];
            for (k, label) in [
                ("/", " Search | "),
                ("[ ]", " Years | "),
                ("Enter", " More info | "),
                ("Tab", " Filters | "),
                ("c", " Clear | "),
                ("e", " Export | "),
                ("f", " Feedback | "),
            ] {
                spans.push(Span::styled(k, key));
                spans.push(Span::raw(label));
            }
            spans.push(Span::styled("q", Style::default().fg(Color::Red)));
            spans.push(Span::raw(" Quit"));
            spans
        }
    };

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" More Info ");

    let Some(detail) = app.state.selected().and_then(|i| app.browser.detail(i)) else {
        f.render_widget(Paragraph::new("No dataset selected").block(block), area);
        return;
    };

    let heading = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let mut content = vec![
        Line::from(Span::styled(detail.title.clone(), heading)),
        Line::from(""),
    ];
    for line in detail.info_text().lines() {
        content.push(Line::from(line.to_string()));
    }
    content.push(Line::from(""));
    content.push(Line::from("  ─────────────────────────────────────"));
    content.push(Line::from(vec![
        Span::styled("Download: ", heading),
        Span::styled(detail.download_url.clone(), Style::default().fg(Color::Green)),
    ]));
    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "Press Enter to close",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));

    let detail_panel = Paragraph::new(content).block(block).wrap(Wrap { trim: false });
    f.render_widget(detail_panel, area);
}

fn render_feedback_modal(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 30, f.size());
    f.render_widget(Clear, area);

    let content = vec![
        Line::from(Span::styled(
            "Suggest a dataset or share feedback",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("{}▏", app.feedback.text)),
        Line::from(""),
        Line::from(Span::styled(
            "Enter to submit, Esc to cancel",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ];

    let modal = Paragraph::new(content).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Feedback "),
    );
    f.render_widget(modal, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
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
        .split(vertical[1])[1]
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
