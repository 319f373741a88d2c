//! Print pagination of markdown documents.
//!
//! Minutes are shown and printed as a stack of fixed-height sheets. A naive
//! split every N lines would regularly cut a GFM table in two: the second
//! half loses its header row and renders as stray pipe characters. This
//! splitter walks the document in windows of
//! [`PageGeometry::lines_per_page`] lines and moves each page break so it
//! never falls inside a table.
//!
//! ## Table blocks
//!
//! A *table line* contains `|` and either starts with `|` (after trimming) or
//! contains a `---` divider. A table block runs from the first table line
//! until a blank line following one.
//!
//! ## Break placement
//!
//! If a window ends inside a table block:
//!
//! * the table starts after the window's first line → the page ends just
//!   before the table's first line, which starts the next page;
//! * the table starts on the window's first line → the page runs through the
//!   consecutive table-or-blank lines, extending past the window when the
//!   table is longer than a page.
//!
//! Keeping a table whole takes priority over the nominal page height, so a
//! page that starts with a long table can exceed `lines_per_page`.

use crate::config::PageGeometry;
use serde::{Deserialize, Serialize};

/// One emitted page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 0-based position in the document.
    pub index: usize,
    /// First line of the page (0-based, inclusive).
    pub start_line: usize,
    /// One past the last line of the page.
    pub end_line: usize,
    /// The page's lines joined with `\n`.
    pub text: String,
}

impl Page {
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line
    }
}

/// Splits documents into pages of a fixed nominal line count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    lines_per_page: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::from_geometry(&PageGeometry::default())
    }
}

impl Paginator {
    /// A paginator with an explicit page size; 0 is treated as 1.
    pub fn new(lines_per_page: usize) -> Self {
        Self {
            lines_per_page: lines_per_page.max(1),
        }
    }

    pub fn from_geometry(geometry: &PageGeometry) -> Self {
        Self::new(geometry.lines_per_page())
    }

    pub fn lines_per_page(&self) -> usize {
        self.lines_per_page
    }

    /// Split `text` (lines separated by `\n`) into page texts.
    ///
    /// Joining the result with `\n` reproduces `text`. Empty input yields no
    /// pages.
    pub fn paginate(&self, text: &str) -> Vec<String> {
        self.pages(text).into_iter().map(|p| p.text).collect()
    }

    /// Like [`Paginator::paginate`] but with line ranges attached.
    pub fn pages(&self, text: &str) -> Vec<Page> {
        if text.is_empty() {
            return Vec::new();
        }
        let lines: Vec<&str> = text.split('\n').collect();
        self.paginate_lines(&lines)
    }

    /// Split an already-split line sequence.
    pub fn paginate_lines(&self, lines: &[&str]) -> Vec<Page> {
        let mut pages = Vec::new();
        let mut start = 0;

        while start < lines.len() {
            let end = self.page_end(lines, start);
            pages.push(Page {
                index: pages.len(),
                start_line: start,
                end_line: end,
                text: lines[start..end].join("\n"),
            });
            start = end;
        }

        pages
    }

    /// Where the page starting at `start` ends (exclusive). Always > `start`.
    fn page_end(&self, lines: &[&str], start: usize) -> usize {
        let window_end = (start + self.lines_per_page).min(lines.len());
        let window = &lines[start..window_end];

        if !ends_inside_table(window) {
            return window_end;
        }

        match window.iter().position(|l| is_table_line(l)) {
            // The table begins mid-window: break just before it.
            Some(offset) if offset > 0 => start + offset,
            // The page opens with the table: keep the whole block, even past
            // the window.
            _ => table_block_end(lines, start),
        }
    }
}

/// Split `text` with the default 40-line geometry.
pub fn paginate(text: &str) -> Vec<String> {
    Paginator::default().paginate(text)
}

/// A line that belongs to a markdown table.
pub fn is_table_line(line: &str) -> bool {
    line.contains('|') && (line.trim_start().starts_with('|') || line.contains("---"))
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// True when the last line of `block` is still inside a table block, i.e.
/// a table line was seen and no blank line has closed it since.
fn ends_inside_table(block: &[&str]) -> bool {
    let mut in_table = false;
    for line in block {
        if is_table_line(line) {
            in_table = true;
        } else if in_table && is_blank(line) {
            in_table = false;
        }
    }
    in_table
}

/// End (exclusive) of the run of table-or-blank lines starting at `start`.
fn table_block_end(lines: &[&str], start: usize) -> usize {
    let run = lines[start..]
        .iter()
        .take_while(|l| is_table_line(l) || is_blank(l))
        .count();
    start + run.max(1)
}
