//! Terminal rendering of the explorer's visible rows.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::app::explorer::{Row, RowKind};

/// Cursor over the rows currently visible in the explorer.
#[derive(Debug, Default, Clone)]
pub struct FileTreeState {
    rows: Vec<Row>,
    selected: usize,
}

impl FileTreeState {
    /// Replace the rows, keeping the cursor on the same item when it is still visible.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        let current = self.selected_row().map(|row| row.item);
        self.rows = rows;
        self.selected = current
            .and_then(|item| self.rows.iter().position(|row| row.item == item))
            .unwrap_or_else(|| self.selected.min(self.rows.len().saturating_sub(1)));
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.rows.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.rows.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.rows.len().saturating_sub(1);
    }
}

/// Header facts shown above the tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeSummary<'a> {
    pub server: &'a str,
    pub selected: usize,
    pub include_line_numbers: bool,
}

/// Ratatui component for the explorer.
#[derive(Debug, Default)]
pub struct FileTree;

impl FileTree {
    pub fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        state: &FileTreeState,
        summary: TreeSummary<'_>,
        has_focus: bool,
    ) {
        let lines_flag = if summary.include_line_numbers { "on" } else { "off" };
        let block = Block::default().borders(Borders::ALL).title(format!(
            "Files · {} · {} selected · line numbers {lines_flag}",
            summary.server, summary.selected
        ));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if state.rows.is_empty() {
            let placeholder = Paragraph::new("No files to show").style(
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            );
            frame.render_widget(placeholder, inner);
            return;
        }

        let items: Vec<ListItem<'_>> = state.rows.iter().map(row_item).collect();

        let mut list_state = ListState::default();
        list_state.select(Some(state.selected));

        let highlight_style = if has_focus {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Black).bg(Color::Gray)
        };

        let list = List::new(items).highlight_style(highlight_style);
        frame.render_stateful_widget(list, inner, &mut list_state);
    }
}

fn row_item(row: &Row) -> ListItem<'_> {
    let mut spans = vec![Span::raw("  ".repeat(row.depth))];
    match &row.kind {
        RowKind::File { label, checked, .. } => {
            let (mark, style) = if *checked {
                ("[x] ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            } else {
                ("[ ] ", Style::default())
            };
            spans.push(Span::styled(mark, style));
            spans.push(Span::styled(label.clone(), style));
        }
        RowKind::Folder {
            label,
            expanded,
            has_children,
            ..
        } => {
            let symbol = match (*expanded, *has_children) {
                (_, false) => "· ",
                (true, true) => "▾ ",
                (false, true) => "▸ ",
            };
            spans.push(Span::styled(symbol, Style::default().fg(Color::Yellow)));
            spans.push(Span::styled(
                format!("{label}/"),
                Style::default().fg(Color::Yellow),
            ));
        }
        RowKind::Error(message) => {
            spans.push(Span::styled(
                format!("! {message}"),
                Style::default().fg(Color::Red).add_modifier(Modifier::ITALIC),
            ));
        }
    }
    ListItem::new(Line::from(spans))
}
