//! Terminal host for the file picker page.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::app::explorer::RowKind;
use crate::app::page::{Host, Page, PageAnchors, PageEvent, PageOutcome, Trigger};
use crate::app::store::{FileStorage, SelectionStore};
use crate::infra::clipboard::Clipboard;
use crate::infra::http::HttpBackend;
use crate::ui::components::command_palette::{
    COMMAND_HELP, CommandPalette, CommandPaletteState, PaletteCommand, PaletteMessageLevel,
};
use crate::ui::components::document::{DocumentState, DocumentView};
use crate::ui::components::file_tree::{FileTree, FileTreeState, TreeSummary};

const TICK_RATE: Duration = Duration::from_millis(120);
const PAGE_SCROLL: i32 = 20;

/// Where the picker connects and keeps its state.
#[derive(Debug, Clone)]
pub struct PickOptions {
    pub server_url: String,
    pub storage_dir: PathBuf,
    pub request_timeout: Option<Duration>,
}

type PickerPage = Page<HttpBackend, FileStorage>;

/// Collects alerts raised while a page event is handled.
#[derive(Debug, Default)]
struct AlertQueue(Vec<String>);

impl Host for AlertQueue {
    fn alert(&mut self, message: &str) {
        self.0.push(message.to_owned());
    }
}

/// Primary entry point for running the interactive picker.
pub struct UiApp {
    runtime: Runtime,
    options: PickOptions,
    page: Option<PickerPage>,
    tree: FileTreeState,
    file_tree: FileTree,
    document: Option<DocumentState>,
    document_view: DocumentView,
    palette_state: CommandPaletteState,
    palette_component: CommandPalette,
    clipboard: Clipboard,
    status: Option<StatusMessage>,
    focus: FocusTarget,
    palette_return: FocusTarget,
    should_quit: bool,
}

impl UiApp {
    pub fn new(options: PickOptions) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        Ok(Self {
            runtime,
            options,
            page: None,
            tree: FileTreeState::default(),
            file_tree: FileTree,
            document: None,
            document_view: DocumentView,
            palette_state: CommandPaletteState::default(),
            palette_component: CommandPalette,
            clipboard: Clipboard::new(),
            status: None,
            focus: FocusTarget::FileTree,
            palette_return: FocusTarget::FileTree,
            should_quit: false,
        })
    }

    /// Load the page, then enter the terminal event loop.
    pub fn run(&mut self) -> Result<()> {
        let backend = HttpBackend::with_timeout(
            self.options.server_url.clone(),
            self.options.request_timeout,
        )?;
        let store = SelectionStore::new(FileStorage::open(
            &self.options.storage_dir,
            backend.base_url(),
        ));
        self.load(backend, store)?;

        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to initialize terminal")?;
        terminal.hide_cursor().ok();

        let event_loop_result = self.event_loop(&mut terminal);

        disable_raw_mode().ok();
        let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        event_loop_result
    }

    fn load(&mut self, backend: HttpBackend, store: SelectionStore<FileStorage>) -> Result<()> {
        let mut alerts = AlertQueue::default();
        let page = self
            .runtime
            .block_on(PickerPage::load(PageAnchors::full(), backend, store, &mut alerts));
        let Some(page) = page else {
            bail!("picker page could not be initialized");
        };
        info!(
            server = %self.options.server_url,
            files = page.explorer().file_values().len(),
            "picker loaded"
        );
        self.page = Some(page);
        self.show_alerts(alerts);
        self.refresh_rows();
        self.tree.select_first();
        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        let Some(page) = self.page.take() else {
            return Ok(());
        };
        let (backend, store) = page.into_parts();
        self.document = None;
        self.focus = FocusTarget::FileTree;
        self.load(backend, store)
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|frame| self.render(frame))?;
            self.tick();

            if self.should_quit {
                break;
            }

            if event::poll(TICK_RATE)?
                && let Event::Key(key) = event::read()?
            {
                self.handle_key_event(key)?;
            }
        }
        Ok(())
    }

    fn tick(&mut self) {
        if let Some(status) = &self.status
            && status.is_expired()
        {
            self.status = None;
        }
        self.palette_state.purge_expired_messages();
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let size = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(2),
            ])
            .split(size);

        match (&self.document, self.focus) {
            (Some(document), FocusTarget::Document) => {
                self.document_view
                    .render(document, layout[0], frame.buffer_mut());
            }
            _ => {
                let summary = TreeSummary {
                    server: &self.options.server_url,
                    selected: self
                        .page
                        .as_ref()
                        .map_or(0, |page| page.explorer().checked_values().len()),
                    include_line_numbers: self
                        .page
                        .as_ref()
                        .is_some_and(|page| page.include_line_numbers()),
                };
                let has_focus = matches!(self.focus, FocusTarget::FileTree);
                self.file_tree
                    .render(frame, layout[0], &self.tree, summary, has_focus);
            }
        }

        self.render_hints(frame, layout[1]);
        self.render_status(frame, layout[2]);
        self.palette_component
            .render(frame, size, &self.palette_state);
    }

    fn render_hints(&self, frame: &mut Frame<'_>, area: Rect) {
        let keys: &[(&str, &str)] = match self.focus {
            FocusTarget::Document => &[("j/k", "scroll"), ("y", "copy"), ("esc", "back")],
            _ => &[
                ("space", "toggle"),
                ("a/d", "all/none"),
                ("n", "line numbers"),
                ("c", "concat"),
                ("A", "ai"),
                ("v", "v2"),
                ("b", "base dir"),
                (":", "commands"),
            ],
        };
        let mut spans = Vec::with_capacity(keys.len() * 2);
        for (key, label) in keys {
            spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
            spans.push(Span::raw(format!(" {label}  ")));
        }
        let hints = Paragraph::new(Line::from(spans))
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(hints, area);
    }

    fn render_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let line = match &self.status {
            Some(status) => {
                let style = match status.level {
                    StatusLevel::Info => Style::default().fg(Color::Gray),
                    StatusLevel::Success => Style::default().fg(Color::Green),
                    StatusLevel::Error => Style::default().fg(Color::Red),
                };
                Line::styled(status.text.clone(), style)
            }
            None => Line::styled(
                "Ready · press : for commands",
                Style::default().fg(Color::DarkGray),
            ),
        };

        let block = Block::default().borders(Borders::TOP);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Paragraph::new(line), inner);
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
        {
            self.should_quit = true;
            return Ok(());
        }

        match self.focus {
            FocusTarget::CommandPalette => self.handle_palette_key(key),
            FocusTarget::Document => self.handle_document_key(key),
            FocusTarget::FileTree => self.handle_tree_key(key),
        }
    }

    fn handle_tree_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char(':') => self.open_palette(None),
            KeyCode::Char('b') => self.open_palette(Some("base ")),
            KeyCode::Char('j') | KeyCode::Down => self.tree.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.tree.select_previous(),
            KeyCode::Char('g') | KeyCode::Home => self.tree.select_first(),
            KeyCode::Char('G') | KeyCode::End => self.tree.select_last(),
            KeyCode::Char(' ') | KeyCode::Enter => self.activate_current(None)?,
            KeyCode::Char('l') | KeyCode::Right => self.activate_current(Some(true))?,
            KeyCode::Char('h') | KeyCode::Left => self.activate_current(Some(false))?,
            KeyCode::Char('a') => self.dispatch(PageEvent::Click(Trigger::SelectAll))?,
            KeyCode::Char('d') => self.dispatch(PageEvent::Click(Trigger::DeselectAll))?,
            KeyCode::Char('c') => self.dispatch(PageEvent::Click(Trigger::Concatenate))?,
            KeyCode::Char('A') => {
                self.dispatch(PageEvent::Click(Trigger::ConcatenateWithAi))?
            }
            KeyCode::Char('v') => self.dispatch(PageEvent::Click(Trigger::ConcatenateV2))?,
            KeyCode::Char('n') => {
                let current = self
                    .page
                    .as_ref()
                    .is_some_and(|page| page.include_line_numbers());
                self.dispatch(PageEvent::LineNumbersChange(!current))?;
            }
            KeyCode::Char('r') => self.reload()?,
            KeyCode::Tab if self.document.is_some() => self.focus = FocusTarget::Document,
            _ => {}
        }
        Ok(())
    }

    /// Toggle the row under the cursor. `open` restricts folders to opening or closing only.
    fn activate_current(&mut self, open: Option<bool>) -> Result<()> {
        let Some(row) = self.tree.selected_row() else {
            return Ok(());
        };
        let event = match row.kind {
            RowKind::File {
                checkbox, checked, ..
            } if open.is_none() => PageEvent::CheckboxChange {
                checkbox,
                checked: !checked,
            },
            RowKind::Folder {
                toggle, expanded, ..
            } if open.is_none_or(|open| open != expanded) => PageEvent::FolderClick(toggle),
            _ => return Ok(()),
        };
        self.dispatch(event)
    }

    fn handle_document_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(document) = self.document.as_mut() else {
            self.focus = FocusTarget::FileTree;
            return Ok(());
        };
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => document.scroll_by(1),
            KeyCode::Char('k') | KeyCode::Up => document.scroll_by(-1),
            KeyCode::PageDown | KeyCode::Char(' ') => document.scroll_by(PAGE_SCROLL),
            KeyCode::PageUp => document.scroll_by(-PAGE_SCROLL),
            KeyCode::Char('g') | KeyCode::Home => document.scroll_to_top(),
            KeyCode::Char('y') => {
                let text = document.copy_text();
                match self.clipboard.copy(&text) {
                    Ok(via) => self.set_status(
                        StatusLevel::Success,
                        format!("Copied {} characters via {}", text.chars().count(), via.describe()),
                    ),
                    Err(err) => self.set_status(StatusLevel::Error, format!("{err:#}")),
                }
            }
            KeyCode::Char(':') => self.open_palette(None),
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') => {
                // A replaced document has no page to go back to, so the picker loads afresh.
                if document.is_replacement() {
                    self.reload()?;
                } else {
                    self.document = None;
                    self.focus = FocusTarget::FileTree;
                }
            }
            KeyCode::Tab => self.focus = FocusTarget::FileTree,
            _ => {}
        }
        Ok(())
    }

    fn open_palette(&mut self, prefill: Option<&str>) {
        match prefill {
            Some(text) => self.palette_state.open_with(text),
            None => self.palette_state.open(),
        }
        self.palette_return = self.focus;
        self.focus = FocusTarget::CommandPalette;
    }

    fn handle_palette_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.palette_state.close();
                self.focus = self.palette_return;
            }
            KeyCode::Enter => {
                let input = self.palette_state.take_input();
                self.palette_state.close();
                self.focus = self.palette_return;
                match PaletteCommand::parse(&input) {
                    Ok(Some(command)) => self.execute_command(command)?,
                    Ok(None) => {}
                    Err(err) => {
                        self.palette_state.open_with(input);
                        self.palette_state
                            .set_message(PaletteMessageLevel::Error, err.to_string());
                        self.focus = FocusTarget::CommandPalette;
                    }
                }
            }
            KeyCode::Backspace => self.palette_state.pop_char(),
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.palette_state.push_char(ch)
            }
            _ => {}
        }
        Ok(())
    }

    fn execute_command(&mut self, command: PaletteCommand) -> Result<()> {
        debug!(?command, "palette command");
        match command {
            PaletteCommand::BaseDir(path) => self.dispatch(PageEvent::BaseDirSubmit(path))?,
            PaletteCommand::SelectAll => self.dispatch(PageEvent::Click(Trigger::SelectAll))?,
            PaletteCommand::DeselectAll => {
                self.dispatch(PageEvent::Click(Trigger::DeselectAll))?
            }
            PaletteCommand::Concatenate => {
                self.dispatch(PageEvent::Click(Trigger::Concatenate))?
            }
            PaletteCommand::ConcatenateWithAi => {
                self.dispatch(PageEvent::Click(Trigger::ConcatenateWithAi))?
            }
            PaletteCommand::ConcatenateV2 => {
                self.dispatch(PageEvent::Click(Trigger::ConcatenateV2))?
            }
            PaletteCommand::LineNumbers(value) => {
                self.dispatch(PageEvent::LineNumbersChange(value))?
            }
            PaletteCommand::Reload => self.reload()?,
            PaletteCommand::Help => self.set_status(StatusLevel::Info, COMMAND_HELP),
            PaletteCommand::Quit => self.should_quit = true,
        }
        Ok(())
    }

    /// Route one event through the page and act on its outcome.
    fn dispatch(&mut self, event: PageEvent) -> Result<()> {
        let Some(page) = self.page.as_mut() else {
            return Ok(());
        };
        let mut alerts = AlertQueue::default();
        let outcome = self.runtime.block_on(page.dispatch(event, &mut alerts));
        self.show_alerts(alerts);

        match outcome {
            PageOutcome::Idle => {}
            PageOutcome::Navigated(document) => {
                self.document = Some(DocumentState::navigated(document));
                self.focus = FocusTarget::Document;
            }
            PageOutcome::Replaced(document) => {
                self.document = Some(DocumentState::replaced(document));
                self.focus = FocusTarget::Document;
            }
            PageOutcome::Reload => {
                self.reload()?;
                self.set_status(StatusLevel::Success, "Base directory updated");
            }
        }
        self.refresh_rows();
        Ok(())
    }

    fn refresh_rows(&mut self) {
        if let Some(page) = &self.page {
            self.tree.set_rows(page.explorer().visible_rows());
        }
    }

    fn show_alerts(&mut self, alerts: AlertQueue) {
        if let Some(last) = alerts.0.into_iter().last() {
            self.set_status(StatusLevel::Error, last);
        }
    }

    fn set_status<S: Into<String>>(&mut self, level: StatusLevel, message: S) {
        self.status = Some(StatusMessage::new(level, message.into()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusTarget {
    FileTree,
    Document,
    CommandPalette,
}

#[derive(Debug)]
struct StatusMessage {
    level: StatusLevel,
    text: String,
    expires_at: Instant,
}

impl StatusMessage {
    fn new(level: StatusLevel, text: String) -> Self {
        Self {
            level,
            text,
            expires_at: Instant::now() + Duration::from_secs(4),
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug, Clone, Copy)]
enum StatusLevel {
    Info,
    Success,
    Error,
}
