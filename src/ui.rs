// 🖥️ Terminal editor for the build list
//
// Key presses and mouse gestures become controller commands; every frame is
// drawn from controller state alone. Rows can be dragged with the mouse
// (live preview, saved on release) or moved with Shift+J / Shift+K.

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::categories::CategoryRegistry;
use crate::controller::{BuildController, Command};
use crate::drag::RowBounds;
use crate::error::Result;
use crate::persistence;
use crate::row::{BuildRow, RowField};
use crate::store::KeyValueStore;
use crate::summary::{self, ClipboardSink};

/// How long a status message stays in the status bar
const STATUS_TTL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Build,
    Summary,
    Categories,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Build => Page::Summary,
            Page::Summary => Page::Categories,
            Page::Categories => Page::Build,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Build => Page::Categories,
            Page::Summary => Page::Build,
            Page::Categories => Page::Summary,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Build => "Build",
            Page::Summary => "Summary",
            Page::Categories => "Categories",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browse,
    /// Typing into the selected cell
    Editing { buffer: String },
    /// Typing the path of a file to import
    ImportPrompt { buffer: String },
    ConfirmClear,
}

struct StatusMessage {
    text: String,
    is_error: bool,
    shown_at: Instant,
}

pub struct App<S: KeyValueStore> {
    pub controller: BuildController<S>,
    pub state: TableState,
    pub column: RowField,
    pub current_page: Page,
    pub mode: Mode,
    status: Option<StatusMessage>,
    export_dir: PathBuf,
    export_filename: String,
    clipboard: Box<dyn ClipboardSink>,
    /// Where the build table was last drawn, for mapping mouse rows
    table_area: Rect,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(
        controller: BuildController<S>,
        export_dir: PathBuf,
        export_filename: String,
        clipboard: Box<dyn ClipboardSink>,
    ) -> Self {
        let mut state = TableState::default();
        if !controller.rows().is_empty() {
            state.select(Some(0));
        }

        Self {
            controller,
            state,
            column: RowField::Product,
            current_page: Page::Build,
            mode: Mode::Browse,
            status: None,
            export_dir,
            export_filename,
            clipboard,
            table_area: Rect::default(),
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.state.selected()
    }

    /// Current status text, if it hasn't expired
    pub fn status_text(&self) -> Option<&str> {
        self.status
            .as_ref()
            .filter(|s| s.shown_at.elapsed() < STATUS_TTL)
            .map(|s| s.text.as_str())
    }

    fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error,
            shown_at: Instant::now(),
        });
    }

    /// Show a storage failure without interrupting the session
    fn report(&mut self, result: Result<()>) {
        if let Err(e) = result {
            warn!(error = %e, "build change not saved");
            self.set_status(format!("Not saved: {}", e), true);
        }
    }

    fn select_clamped(&mut self, position: Option<usize>) {
        let len = self.controller.rows().len();
        let position = match position {
            _ if len == 0 => None,
            Some(p) => Some(p.min(len - 1)),
            None => Some(0),
        };
        self.state.select(position);
    }

    pub fn next(&mut self) {
        let len = self.controller.rows().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.controller.rows().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    fn dispatch(&mut self, command: Command) {
        let result = self.controller.apply(command);
        self.report(result);
    }

    pub fn add_row(&mut self) {
        self.dispatch(Command::AddRow(BuildRow::default()));
        let last = self.controller.rows().len().checked_sub(1);
        self.state.select(last);
        self.column = RowField::Category;
    }

    pub fn delete_selected(&mut self) {
        if let Some(position) = self.selected() {
            self.dispatch(Command::DeleteRow { position });
            self.select_clamped(Some(position));
        }
    }

    /// Move the selected row up (`-1`) or down (`+1`)
    pub fn move_selected(&mut self, delta: isize) {
        let Some(from) = self.selected() else {
            return;
        };
        let Some(to) = from.checked_add_signed(delta) else {
            return;
        };
        if to >= self.controller.rows().len() {
            return;
        }
        self.dispatch(Command::Reorder { from, to });
        self.state.select(Some(to));
    }

    pub fn cycle_category(&mut self, forward: bool) {
        let Some(position) = self.selected() else {
            return;
        };
        let Some(row) = self.controller.rows().get(position) else {
            return;
        };
        let registry = CategoryRegistry::standard();
        let value = if forward {
            registry.next_after(&row.category)
        } else {
            registry.previous_before(&row.category)
        };
        self.dispatch(Command::EditRow {
            position,
            field: RowField::Category,
            value: value.to_string(),
        });
    }

    fn begin_edit(&mut self) {
        let Some(position) = self.selected() else {
            return;
        };
        if self.column == RowField::Category {
            self.cycle_category(true);
            return;
        }
        if let Some(row) = self.controller.rows().get(position) {
            let buffer = row.field(self.column).to_string();
            self.mode = Mode::Editing { buffer };
        }
    }

    fn commit_edit(&mut self, buffer: String) {
        if let Some(position) = self.selected() {
            self.dispatch(Command::EditRow {
                position,
                field: self.column,
                value: buffer,
            });
        }
        self.mode = Mode::Browse;
    }

    pub fn export(&mut self) {
        match persistence::export_to_file(
            self.controller.list(),
            &self.export_dir,
            &self.export_filename,
        ) {
            Ok(path) => self.set_status(format!("Saved {}", path.display()), false),
            Err(e) => self.set_status(format!("Export failed: {}", e), true),
        }
    }

    pub fn import(&mut self, path: &str) {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                self.set_status(format!("Cannot read {}: {}", path, e), true);
                return;
            }
        };

        match self.controller.import(&contents) {
            Ok(count) => {
                self.select_clamped(Some(0));
                self.set_status(format!("Loaded {} rows", count), false);
            }
            Err(e) => self.set_status(e.to_string(), true),
        }
    }

    /// Copy the summary; a refused clipboard is only logged
    pub fn copy_summary(&mut self) {
        match summary::copy_summary(self.controller.list(), self.clipboard.as_mut()) {
            Ok(_) => self.set_status("Copied!", false),
            Err(e) => debug!(error = %e, "clipboard write ignored"),
        }
    }

    fn clear(&mut self) {
        let result = self.controller.apply(Command::Clear);
        self.report(result);
        self.state.select(None);
    }

    // ========================================================================
    // INPUT
    // ========================================================================

    /// Handle one key press; returns true when the editor should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match std::mem::replace(&mut self.mode, Mode::Browse) {
            Mode::Browse => return self.handle_browse_key(key),
            Mode::Editing { mut buffer } => match key.code {
                KeyCode::Enter => self.commit_edit(buffer),
                KeyCode::Esc => {}
                KeyCode::Backspace => {
                    buffer.pop();
                    self.mode = Mode::Editing { buffer };
                }
                KeyCode::Char(c) => {
                    buffer.push(c);
                    self.mode = Mode::Editing { buffer };
                }
                _ => self.mode = Mode::Editing { buffer },
            },
            Mode::ImportPrompt { mut buffer } => match key.code {
                KeyCode::Enter => self.import(buffer.trim()),
                KeyCode::Esc => {}
                KeyCode::Backspace => {
                    buffer.pop();
                    self.mode = Mode::ImportPrompt { buffer };
                }
                KeyCode::Char(c) => {
                    buffer.push(c);
                    self.mode = Mode::ImportPrompt { buffer };
                }
                _ => self.mode = Mode::ImportPrompt { buffer },
            },
            Mode::ConfirmClear => {
                if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                    self.clear();
                    self.set_status("Build cleared", false);
                }
            }
        }
        false
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                if !self.controller.drag_cancel() {
                    return true;
                }
            }
            KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.current_page = self.current_page.previous()
            }
            KeyCode::Tab => self.current_page = self.current_page.next(),
            KeyCode::BackTab => self.current_page = self.current_page.previous(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Home => self.select_clamped(Some(0)),
            KeyCode::End => self.select_clamped(Some(usize::MAX)),
            KeyCode::Left | KeyCode::Char('h') => self.column = self.column.previous(),
            KeyCode::Right | KeyCode::Char('l') => self.column = self.column.next(),
            KeyCode::Enter | KeyCode::Char('e') => self.begin_edit(),
            KeyCode::Char(']') => self.cycle_category(true),
            KeyCode::Char('[') => self.cycle_category(false),
            KeyCode::Char('a') => self.add_row(),
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
            KeyCode::Char('J') => self.move_selected(1),
            KeyCode::Char('K') => self.move_selected(-1),
            KeyCode::Char('x') => self.mode = Mode::ConfirmClear,
            KeyCode::Char('s') => self.export(),
            KeyCode::Char('o') => {
                self.mode = Mode::ImportPrompt {
                    buffer: self.export_filename.clone(),
                }
            }
            KeyCode::Char('y') => self.copy_summary(),
            _ => {}
        }
        false
    }

    /// First screen line holding a data row
    fn first_row_line(&self) -> u16 {
        // border + header
        self.table_area.y + 2
    }

    fn row_at(&self, line: u16) -> Option<usize> {
        let first = self.first_row_line();
        let last = self.table_area.bottom().saturating_sub(1);
        if line < first || line >= last {
            return None;
        }
        let position = self.state.offset() + (line - first) as usize;
        (position < self.controller.rows().len()).then_some(position)
    }

    /// One-line rows laid out from the top of the table, scrolled by the offset
    fn row_bounds(&self) -> Vec<RowBounds> {
        let first = self.first_row_line() as f64 - self.state.offset() as f64;
        (0..self.controller.rows().len())
            .map(|i| RowBounds::new(first + i as f64, 1.0))
            .collect()
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        // A release always ends the drag, whatever the mode or page
        if let MouseEventKind::Up(MouseButton::Left) = mouse.kind {
            match self.controller.drag_drop() {
                Ok(Some((from, to))) if from != to => {
                    self.set_status(format!("Moved row {} to {}", from + 1, to + 1), false)
                }
                Ok(_) => {}
                Err(e) => self.report(Err(e)),
            }
            return;
        }

        if self.current_page != Page::Build || self.mode != Mode::Browse {
            return;
        }

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(position) = self.row_at(mouse.row) {
                    self.state.select(Some(position));
                    self.controller.drag_begin(position);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let Some(dragged) = self.controller.dragged() else {
                    return;
                };
                let bounds = self.row_bounds();
                // Terminal rows are one line tall: bias the pointer towards the
                // direction of travel so hovering a neighbour crosses its midpoint
                let line = mouse.row as f64;
                let above = bounds.get(dragged).map_or(false, |b| line < b.top);
                let pointer_y = if above {
                    line + 0.25
                } else {
                    line + 0.75
                };
                if let Some(position) = self.controller.drag_move(&bounds, pointer_y) {
                    self.state.select(Some(position));
                }
            }
            _ => {}
        }
    }
}

pub fn run_ui<S: KeyValueStore>(app: &mut App<S>) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend, S: KeyValueStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        // Poll so expired status messages disappear without input
        if !event::poll(Duration::from_millis(250))? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if app.handle_key(key) {
                    return Ok(());
                }
            }
            Event::Mouse(mouse) => app.handle_mouse(mouse),
            _ => {}
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

pub fn ui<S: KeyValueStore>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Build => render_table(f, chunks[1], app),
        Page::Summary => render_summary(f, chunks[1], app),
        Page::Categories => render_categories(f, chunks[1]),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let pages = [Page::Build, Page::Summary, Page::Categories];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
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
        format!("Parts: {}", app.controller.rows().len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Total: {}", summary::format_total(app.controller.total())),
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn cell_text(row: &BuildRow, field: RowField) -> String {
    match field {
        RowField::Product => row.product.replace('\n', " "),
        _ => row.field(field).to_string(),
    }
}

fn render_table<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    app.table_area = area;
    let registry = CategoryRegistry::standard();
    let selected = app.state.selected();
    let dragged = app.controller.dragged();

    let header_cells = ["#", "Category", "Product", "Price", "Source"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows: Vec<Row> = app
        .controller
        .list()
        .iter_positioned()
        .map(|(position, row)| {
            let mut cells = vec![Cell::from(format!("{}", position + 1))];

            for field in RowField::ALL {
                let is_cursor = selected == Some(position) && field == app.column;
                let text = match &app.mode {
                    Mode::Editing { buffer } if is_cursor => format!("{}▏", buffer),
                    _ => cell_text(row, field),
                };

                let mut style = match field {
                    RowField::Category if !registry.contains(&row.category) => Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                    RowField::Price if !row.price_is_valid() => Style::default().fg(Color::Red),
                    _ => Style::default(),
                };
                if is_cursor {
                    style = style.bg(Color::Blue);
                }

                cells.push(Cell::from(text).style(style));
            }

            let row_style = if dragged == Some(position) {
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            Row::new(cells).height(1).style(row_style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(20),
            Constraint::Min(30),
            Constraint::Length(12),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Build "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_summary<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let text = summary::format_summary(app.controller.list());
    let lines: Vec<Line> = text.lines().map(|l| Line::from(l.to_string())).collect();

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Summary - press y to copy "),
        );

    f.render_widget(paragraph, area);
}

fn render_categories(f: &mut Frame, area: Rect) {
    let rows = CategoryRegistry::standard().entries().iter().map(|entry| {
        Row::new(vec![
            Cell::from(entry.name),
            Cell::from(entry.icon_id).style(Style::default().fg(Color::DarkGray)),
        ])
    });

    let table = Table::new(rows, [Constraint::Length(22), Constraint::Length(20)])
        .header(
            Row::new(vec!["Category", "Icon"]).style(
                Style::default()
                    .fg(Color::Yellow)
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            ),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Categories "),
        );

    f.render_widget(table, area);
}

fn key_hint(key: &str, label: &str) -> Vec<Span<'static>> {
    vec![
        Span::styled(key.to_string(), Style::default().fg(Color::Yellow)),
        Span::raw(format!(" {} | ", label)),
    ]
}

fn render_status_bar<S: KeyValueStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let mut status_spans: Vec<Span> = vec![];

    match &app.mode {
        Mode::Editing { .. } => {
            status_spans.push(Span::styled(
                format!(" Editing {} ", app.column.label()),
                Style::default().fg(Color::Cyan),
            ));
            status_spans.extend(key_hint("Enter", "Save"));
            status_spans.extend(key_hint("Esc", "Cancel"));
        }
        Mode::ImportPrompt { buffer } => {
            status_spans.push(Span::styled(
                " Import file: ",
                Style::default().fg(Color::Cyan),
            ));
            status_spans.push(Span::raw(format!("{}▏  ", buffer)));
            status_spans.extend(key_hint("Enter", "Load"));
            status_spans.extend(key_hint("Esc", "Cancel"));
        }
        Mode::ConfirmClear => {
            status_spans.push(Span::styled(
                " Clear the whole build? ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
            status_spans.extend(key_hint("y", "Yes"));
            status_spans.push(Span::raw("any other key cancels"));
        }
        Mode::Browse => {
            let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
            status_spans.push(Span::styled(
                format!(" Row: {}/{} ", selected, app.controller.rows().len()),
                Style::default().fg(Color::Cyan),
            ));
            status_spans.push(Span::raw("| "));

            match (&app.status, app.status_text()) {
                (Some(status), Some(text)) => {
                    let color = if status.is_error { Color::Red } else { Color::Green };
                    status_spans.push(Span::styled(
                        text.to_string(),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ));
                }
                _ => {
                    status_spans.extend(key_hint("a", "Add"));
                    status_spans.extend(key_hint("Enter", "Edit"));
                    status_spans.extend(key_hint("d", "Delete"));
                    status_spans.extend(key_hint("J/K", "Move"));
                    status_spans.extend(key_hint("s/o", "Save/Load"));
                    status_spans.extend(key_hint("y", "Copy"));
                    status_spans.extend(key_hint("x", "Clear"));
                    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
                    status_spans.push(Span::raw(" Quit"));
                }
            }
        }
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildList;
    use crate::store::{MemoryStore, BUILD_KEY};
    use crate::summary::MemoryClipboard;
    use ratatui::backend::TestBackend;
    use tempfile::TempDir;

    fn app_with(rows: &[&str], dir: &TempDir) -> App<MemoryStore> {
        let list = BuildList::from_rows(
            rows.iter()
                .map(|p| BuildRow::default().with_product(p).with_price("100"))
                .collect(),
        );
        App::new(
            BuildController::new(list, MemoryStore::new()),
            dir.path().to_path_buf(),
            "pc-build-config.json".to_string(),
            Box::new(MemoryClipboard::default()),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn products<S: KeyValueStore>(app: &App<S>) -> Vec<String> {
        app.controller.rows().iter().map(|r| r.product.clone()).collect()
    }

    fn mouse(kind: MouseEventKind, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column: 10,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn draw(app: &mut App<MemoryStore>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_edit_product_cell() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with(&["old"], &dir);

        app.handle_key(key(KeyCode::Enter));
        for _ in 0..3 {
            app.handle_key(key(KeyCode::Backspace));
        }
        for c in "Ryzen 5".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(products(&app), vec!["Ryzen 5"]);
        assert!(app.controller.store().get(BUILD_KEY).unwrap().unwrap().contains("Ryzen 5"));
    }

    #[test]
    fn test_escape_discards_edit() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with(&["keep"], &dir);

        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('!')));
        app.handle_key(key(KeyCode::Esc));

        assert_eq!(products(&app), vec!["keep"]);
    }

    #[test]
    fn test_add_move_and_delete_keys() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with(&["a", "b"], &dir);

        app.handle_key(key(KeyCode::Char('a')));
        assert_eq!(app.controller.rows().len(), 3);
        assert_eq!(app.selected(), Some(2));

        app.handle_key(key(KeyCode::Char('K')));
        assert_eq!(products(&app), vec!["a", "", "b"]);
        assert_eq!(app.selected(), Some(1));

        app.handle_key(key(KeyCode::Char('d')));
        assert_eq!(products(&app), vec!["a", "b"]);
    }

    #[test]
    fn test_category_cycles_on_enter() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with(&["x"], &dir);
        app.column = RowField::Category;

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.controller.rows()[0].category, "Motherboard");
        app.handle_key(key(KeyCode::Char('[')));
        assert_eq!(app.controller.rows()[0].category, "Processor");
    }

    #[test]
    fn test_clear_requires_confirmation() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with(&["a"], &dir);

        app.handle_key(key(KeyCode::Char('x')));
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.controller.rows().len(), 1);

        app.handle_key(key(KeyCode::Char('x')));
        app.handle_key(key(KeyCode::Char('y')));
        assert!(app.controller.rows().is_empty());
        assert_eq!(app.controller.store().get(BUILD_KEY).unwrap(), None);
    }

    #[test]
    fn test_export_then_import_bad_file() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with(&["a"], &dir);

        app.export();
        assert!(dir.path().join("pc-build-config.json").exists());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"not": "an array"}"#).unwrap();
        app.import(bad.to_str().unwrap());

        assert_eq!(products(&app), vec!["a"]);
        assert!(app.status_text().unwrap().starts_with("Invalid JSON format"));
    }

    #[test]
    fn test_copy_summary_sets_status() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with(&["a"], &dir);

        app.copy_summary();
        assert_eq!(app.status_text(), Some("Copied!"));
    }

    #[test]
    fn test_mouse_drag_reorders_and_persists_on_release() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with(&["row0", "row1", "row2"], &dir);
        draw(&mut app);

        // header block is 3 lines, table border 1, table header 1
        let first = 5;
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), first));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), first + 2));
        assert_eq!(products(&app), vec!["row1", "row2", "row0"]);

        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), first + 2));
        let stored = app.controller.store().get(BUILD_KEY).unwrap().unwrap();
        assert_eq!(stored, serde_json::to_string(app.controller.list()).unwrap());
        assert_eq!(app.selected(), Some(2));
    }

    #[test]
    fn test_keys_during_drag_keep_store_in_step() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with(&["row0", "row1", "row2"], &dir);
        draw(&mut app);

        let first = 5;
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), first));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), first + 2));
        app.handle_key(key(KeyCode::Char('K')));
        assert_eq!(products(&app), vec!["row1", "row0", "row2"]);

        // Editing mode must not swallow the release
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), first));
        app.handle_key(key(KeyCode::Enter));
        assert!(matches!(app.mode, Mode::Editing { .. }));
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), first));
        assert_eq!(app.controller.dragged(), None);
        app.handle_key(key(KeyCode::Esc));

        let stored = app.controller.store().get(BUILD_KEY).unwrap().unwrap();
        assert_eq!(stored, serde_json::to_string(app.controller.list()).unwrap());
    }

    #[test]
    fn test_render_shows_total() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with(&["a", "b"], &dir);

        let screen = draw(&mut app);
        assert!(screen.contains("Total: ₹ 200"));
        assert!(screen.contains("Processor"));
    }
}
