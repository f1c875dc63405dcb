//! Document writer primitives and the paginated plain-text backend.
//!
//! # Responsibility
//! - Define the drawing primitives the report renderer relies on.
//! - Provide a fixed-grid text implementation with table pagination.
//!
//! # Invariants
//! - Coordinates are layout units of the backend (character cells for
//!   `PlainTextWriter`); `y` always refers to the current page.
//! - A paginated table repeats its head row at the top of every new page.
//! - Table rows taller than the free space are split across pages, never
//!   clipped.
//! - `finish` output depends only on the primitives called, never on time.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const DEFAULT_PAGE_WIDTH: usize = 96;
const DEFAULT_PAGE_HEIGHT: usize = 64;
const DEFAULT_TOP_MARGIN: usize = 2;
const HEADING_MIN_SIZE: u8 = 14;
const PAGE_BREAK: char = '\u{c}';

/// Horizontal anchoring of text relative to its `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Bold,
    Italic,
}

/// Font hint for a text placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    /// Point size hint.
    pub size: u8,
    pub font: FontStyle,
}

impl TextStyle {
    pub const fn new(size: u8, font: FontStyle) -> Self {
        Self { size, font }
    }
}

/// One piece of styled text placed on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextItem {
    pub text: String,
    pub x: usize,
    pub y: usize,
    pub align: Align,
    pub style: TextStyle,
}

/// Table column: inner text width and body alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub width: usize,
    pub align: Align,
}

/// Paginated table request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// Left edge of the table.
    pub x: usize,
    /// First line of the table on the current page.
    pub start_y: usize,
    /// Rows must end before this line; overflow moves to a new page.
    pub bottom_y: usize,
    pub columns: Vec<ColumnSpec>,
    pub head: Vec<String>,
    pub body: Vec<Vec<String>>,
    /// Drawn once, after the last body row.
    pub foot: Option<Vec<String>>,
    /// Overrides column alignment for the head row.
    pub head_align: Option<Align>,
    /// Overrides column alignment for the foot row.
    pub foot_align: Option<Align>,
}

/// Drawing primitives consumed by the report renderer.
pub trait DocumentWriter {
    fn page_width(&self) -> usize;
    fn page_height(&self) -> usize;
    /// First usable line on a freshly added page.
    fn top_margin(&self) -> usize;
    fn page_count(&self) -> usize;
    fn new_page(&mut self);
    fn text(&mut self, item: TextItem);
    /// Horizontal rule on line `y` spanning `[from_x, to_x)`.
    fn rule(&mut self, y: usize, from_x: usize, to_x: usize);
    /// Word-wraps `text` into lines of at most `width` units.
    fn split_text_to_size(&self, text: &str, width: usize) -> Vec<String>;
    /// Draws a paginated table; returns the first free line after it on the
    /// (possibly new) current page.
    fn table(&mut self, table: &TableSpec) -> usize;
    /// File extension without the dot.
    fn extension(&self) -> &'static str;
    /// Serialized document bytes.
    fn finish(&self) -> Vec<u8>;

    /// Writes the document to `<dir>/<file_stem>.<extension>` atomically.
    fn save(&self, dir: &Path, file_stem: &str) -> io::Result<PathBuf> {
        let path = dir.join(format!("{file_stem}.{}", self.extension()));
        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(&self.finish())?;
        staged.flush()?;
        staged.persist(&path).map_err(|err| err.error)?;
        Ok(path)
    }
}

/// Fixed-size character grid document.
///
/// Pages are separated by a form feed. Style hints are accepted; headings at
/// or above size 14 are upper-cased, everything else is written as given.
#[derive(Debug, Clone)]
pub struct PlainTextWriter {
    width: usize,
    height: usize,
    top_margin: usize,
    pages: Vec<Vec<Vec<char>>>,
}

impl Default for PlainTextWriter {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_WIDTH, DEFAULT_PAGE_HEIGHT)
    }
}

impl PlainTextWriter {
    /// Creates a writer with one blank page of `width` x `height` cells.
    pub fn new(width: usize, height: usize) -> Self {
        let mut writer = Self {
            width,
            height,
            top_margin: DEFAULT_TOP_MARGIN.min(height.saturating_sub(1)),
            pages: Vec::new(),
        };
        writer.new_page();
        writer
    }

    /// Text of one page with trailing spaces removed from every line.
    pub fn page_text(&self, page: usize) -> Option<String> {
        self.pages.get(page).map(|grid| {
            grid.iter()
                .map(|line| line.iter().collect::<String>().trim_end().to_string())
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    fn current(&mut self) -> &mut Vec<Vec<char>> {
        if self.pages.is_empty() {
            self.new_page();
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn put(&mut self, x: usize, y: usize, text: &str) {
        let width = self.width;
        let page = self.current();
        let Some(line) = page.get_mut(y) else {
            return;
        };
        for (offset, ch) in text.chars().enumerate() {
            let col = x + offset;
            if col >= width {
                break;
            }
            line[col] = ch;
        }
    }

    fn border_line(columns: &[ColumnSpec]) -> String {
        let mut line = String::from("+");
        for column in columns {
            line.push_str(&"-".repeat(column.width + 2));
            line.push('+');
        }
        line
    }

    /// Wraps every cell and lays the row out as one or more text lines.
    fn row_lines(&self, cells: &[String], columns: &[ColumnSpec], align: Option<Align>) -> Vec<String> {
        let wrapped = columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let text = cells.get(idx).map(String::as_str).unwrap_or("");
                let mut lines = self.split_text_to_size(text, column.width);
                if lines.is_empty() {
                    lines.push(String::new());
                }
                lines
            })
            .collect::<Vec<_>>();
        let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);

        (0..height)
            .map(|line_idx| {
                let mut line = String::from("|");
                for (column, cell_lines) in columns.iter().zip(&wrapped) {
                    let text = cell_lines.get(line_idx).map(String::as_str).unwrap_or("");
                    line.push(' ');
                    line.push_str(&pad(text, column.width, align.unwrap_or(column.align)));
                    line.push_str(" |");
                }
                line
            })
            .collect()
    }

    fn draw_block(&mut self, x: usize, y: usize, lines: &[String]) -> usize {
        for (offset, line) in lines.iter().enumerate() {
            self.put(x, y + offset, line);
        }
        y + lines.len()
    }

    fn draw_border(&mut self, x: usize, y: usize, border: &str) -> usize {
        self.put(x, y, border);
        y + 1
    }

    fn draw_head(&mut self, table: &TableSpec, y: usize, border: &str, head: &[String]) -> usize {
        let y = self.draw_border(table.x, y, border);
        let y = self.draw_block(table.x, y, head);
        self.draw_border(table.x, y, border)
    }

    /// Starts a new page and repeats the head row on it.
    fn continue_table(&mut self, table: &TableSpec, border: &str, head: &[String]) -> usize {
        self.new_page();
        self.draw_head(table, self.top_margin, border, head)
    }
}

impl DocumentWriter for PlainTextWriter {
    fn page_width(&self) -> usize {
        self.width
    }

    fn page_height(&self) -> usize {
        self.height
    }

    fn top_margin(&self) -> usize {
        self.top_margin
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn new_page(&mut self) {
        self.pages.push(vec![vec![' '; self.width]; self.height]);
    }

    fn text(&mut self, item: TextItem) {
        let text = if item.style.size >= HEADING_MIN_SIZE && item.style.font == FontStyle::Bold {
            item.text.to_uppercase()
        } else {
            item.text
        };
        let len = text.chars().count();
        let x = match item.align {
            Align::Left => item.x,
            Align::Center => item.x.saturating_sub(len / 2),
            Align::Right => item.x.saturating_sub(len),
        };
        self.put(x, item.y, &text);
    }

    fn rule(&mut self, y: usize, from_x: usize, to_x: usize) {
        let len = to_x.saturating_sub(from_x);
        self.put(from_x, y, &"-".repeat(len));
    }

    fn split_text_to_size(&self, text: &str, width: usize) -> Vec<String> {
        wrap_text(text, width)
    }

    fn table(&mut self, table: &TableSpec) -> usize {
        let border = Self::border_line(&table.columns);
        let head = self.row_lines(&table.head, &table.columns, table.head_align);
        let head_height = head.len() + 2;
        let bottom_y = table.bottom_y.min(self.height);

        let mut rows = table
            .body
            .iter()
            .map(|cells| self.row_lines(cells, &table.columns, None))
            .collect::<Vec<_>>();
        if let Some(foot) = table.foot.as_ref() {
            rows.push(self.row_lines(foot, &table.columns, table.foot_align));
        }

        let mut y = table.start_y;
        let first_row_height = rows.first().map_or(0, |lines| lines.len() + 1);
        if y + head_height + first_row_height > bottom_y && y > self.top_margin {
            self.new_page();
            y = self.top_margin;
        }
        y = self.draw_head(table, y, &border, &head);

        let body_top = self.top_margin + head_height;
        let mut rows_on_page = 0;
        for lines in rows {
            let needed = lines.len() + 1;
            if y + needed > bottom_y && rows_on_page > 0 && body_top + needed <= bottom_y {
                y = self.continue_table(table, &border, &head);
                rows_on_page = 0;
            }

            let mut pending = lines.as_slice();
            loop {
                // Lines that still fit above a closing border.
                let room = bottom_y.saturating_sub(y + 1);
                if pending.len() <= room || (room == 0 && y <= body_top) {
                    break;
                }
                if room > 0 {
                    let (now, rest) = pending.split_at(room);
                    y = self.draw_block(table.x, y, now);
                    y = self.draw_border(table.x, y, &border);
                    pending = rest;
                }
                y = self.continue_table(table, &border, &head);
                rows_on_page = 0;
            }
            y = self.draw_block(table.x, y, pending);
            y = self.draw_border(table.x, y, &border);
            rows_on_page += 1;
        }
        y
    }

    fn extension(&self) -> &'static str {
        "txt"
    }

    fn finish(&self) -> Vec<u8> {
        let pages = (0..self.pages.len())
            .filter_map(|page| self.page_text(page))
            .collect::<Vec<_>>();
        let mut out = pages.join(&format!("\n{PAGE_BREAK}"));
        out.push('\n');
        out.into_bytes()
    }
}

/// Greedy word wrap. Explicit newlines start a new line and words longer
/// than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let needed = if current_len == 0 {
                word.len()
            } else {
                current_len + 1 + word.len()
            };
            if needed > width && current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += word.len();
            current.extend(word);
        }
        if current_len > 0 || paragraph.trim().is_empty() {
            lines.push(current);
        }
    }
    lines
}

fn pad(text: &str, width: usize, align: Align) -> String {
    let len = text.chars().count();
    let gap = width.saturating_sub(len);
    match align {
        Align::Left => format!("{text}{}", " ".repeat(gap)),
        Align::Right => format!("{}{text}", " ".repeat(gap)),
        Align::Center => {
            let left = gap / 2;
            format!("{}{text}{}", " ".repeat(left), " ".repeat(gap - left))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{pad, wrap_text, Align, ColumnSpec, DocumentWriter, PlainTextWriter, TableSpec};

    fn table(rows: usize, bottom_y: usize) -> TableSpec {
        TableSpec {
            x: 0,
            start_y: 0,
            bottom_y,
            columns: vec![
                ColumnSpec {
                    width: 3,
                    align: Align::Center,
                },
                ColumnSpec {
                    width: 10,
                    align: Align::Left,
                },
            ],
            head: vec!["Nr.".to_string(), "Name".to_string()],
            body: (1..=rows)
                .map(|idx| vec![idx.to_string(), format!("row {idx}")])
                .collect(),
            foot: Some(vec![String::new(), "end".to_string()]),
            head_align: None,
            foot_align: Some(Align::Right),
        }
    }

    #[test]
    fn wrap_text_breaks_on_words_and_splits_long_words() {
        assert_eq!(wrap_text("alpha beta gamma", 10), vec!["alpha beta", "gamma"]);
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("one\ntwo", 20), vec!["one", "two"]);
    }

    #[test]
    fn pad_respects_alignment() {
        assert_eq!(pad("ab", 5, Align::Left), "ab   ");
        assert_eq!(pad("ab", 5, Align::Right), "   ab");
        assert_eq!(pad("ab", 5, Align::Center), " ab  ");
    }

    #[test]
    fn table_fits_on_one_page() {
        let mut writer = PlainTextWriter::new(40, 30);
        let end = writer.table(&table(2, 30));
        assert_eq!(writer.page_count(), 1);
        // border, head, border, 2 x (row, border), foot, border
        assert_eq!(end, 9);
        let page = writer.page_text(0).unwrap();
        assert!(page.contains("| row 2      |"));
        assert!(page.contains("|        end |"));
    }

    #[test]
    fn table_overflow_repeats_head_on_new_page() {
        let mut writer = PlainTextWriter::new(40, 12);
        writer.table(&table(6, 12));
        assert!(writer.page_count() > 1);
        for page in 0..writer.page_count() {
            let text = writer.page_text(page).unwrap();
            assert!(text.contains("| Nr. | Name       |"), "page {page} lacks head");
        }
        let last = writer.page_text(writer.page_count() - 1).unwrap();
        assert!(last.contains("row 6"));
        assert!(last.contains("end"));
    }

    #[test]
    fn row_taller_than_page_is_split_across_pages() {
        let words = (1..=30).map(|idx| format!("w{idx:02}")).collect::<Vec<_>>();
        let mut spec = table(0, 12);
        spec.body = vec![vec!["1".to_string(), words.join(" ")]];

        let mut writer = PlainTextWriter::new(40, 12);
        writer.table(&spec);

        assert!(writer.page_count() > 1);
        let pages = (0..writer.page_count())
            .map(|page| writer.page_text(page).unwrap())
            .collect::<Vec<_>>();
        for word in &words {
            assert!(
                pages.iter().any(|page| page.contains(word.as_str())),
                "{word} was dropped"
            );
        }
        for page in &pages {
            assert!(page.contains("| Nr. | Name       |"));
        }
        assert!(pages[pages.len() - 1].contains("end"));
    }

    #[test]
    fn finish_separates_pages_with_form_feed() {
        let mut writer = PlainTextWriter::new(10, 2);
        writer.new_page();
        let text = String::from_utf8(writer.finish()).unwrap();
        assert_eq!(text.matches('\u{c}').count(), 1);
    }
}
