//! The row-based document buffer: ordered rows, edit operations with their
//! join/split semantics, and the load/save boundary.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::row::Row;
use crate::syntax::{self, RuleSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

#[derive(Default)]
pub struct Document {
    rows: Vec<Row>,
    filename: Option<PathBuf>,
    modified: bool,
    syntax: Option<RuleSet>,
}

impl Document {
    pub fn empty() -> Self {
        Document::default()
    }

    /// Loads a file one row per line. A file that does not exist yet yields
    /// an empty document carrying the name, so a later save creates it.
    pub fn open(path: &Path) -> io::Result<Self> {
        let mut doc = Document::empty();
        doc.syntax = syntax::rules_for_path(path);
        match fs::read_to_string(path) {
            Ok(content) => {
                for (i, line) in content.lines().enumerate() {
                    doc.insert_row(i, line);
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        doc.filename = Some(path.to_path_buf());
        doc.modified = false;
        Ok(doc)
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, at: usize) -> Option<&Row> {
        self.rows.get(at)
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Setting the name also re-resolves the highlight rules, so a save-as
    /// picks up the rules for the new extension.
    pub fn set_filename(&mut self, path: PathBuf) {
        self.syntax = syntax::rules_for_path(&path);
        self.filename = Some(path);
        for row in &mut self.rows {
            row.update(self.syntax.as_ref());
        }
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Width of the line-number margin: digit count plus one space. Zero
    /// while the document is empty.
    pub fn gutter_width(&self) -> usize {
        if self.rows.is_empty() {
            0
        } else {
            self.rows.len().ilog10() as usize + 2
        }
    }

    pub fn insert_row(&mut self, at: usize, text: &str) {
        if at > self.rows.len() {
            return;
        }
        self.rows.insert(at, Row::new(text, self.syntax.as_ref()));
        self.modified = true;
    }

    pub fn delete_row(&mut self, at: usize) {
        if at >= self.rows.len() {
            return;
        }
        self.rows.remove(at);
        self.modified = true;
    }

    pub fn insert_char(&mut self, pos: Position, c: char) {
        if pos.y == self.rows.len() {
            // The past-last-line cursor position grows the document.
            self.insert_row(pos.y, "");
        }
        let Some(row) = self.rows.get_mut(pos.y) else {
            return;
        };
        row.insert_char(pos.x, c, self.syntax.as_ref());
        self.modified = true;
    }

    /// Deletes the character before `pos` and returns where the cursor lands.
    /// At column 0 the row is joined onto the previous one; at the document
    /// start this is a no-op and returns `None`.
    pub fn backspace(&mut self, pos: Position) -> Option<Position> {
        if pos.y >= self.rows.len() {
            return None;
        }
        if pos.x == 0 && pos.y == 0 {
            return None;
        }

        if pos.x > 0 {
            self.rows[pos.y].delete_char(pos.x - 1, self.syntax.as_ref());
            self.modified = true;
            return Some(Position {
                x: pos.x - 1,
                y: pos.y,
            });
        }

        let tail: Vec<char> = self.rows[pos.y].chars().to_vec();
        let join_x = self.rows[pos.y - 1].len();
        self.rows[pos.y - 1].append(&tail, self.syntax.as_ref());
        self.rows.remove(pos.y);
        self.modified = true;
        Some(Position {
            x: join_x,
            y: pos.y - 1,
        })
    }

    /// Newline insertion: truncates the row at the cursor column and opens a
    /// new row below holding the remainder.
    pub fn split_row(&mut self, pos: Position) {
        if pos.y >= self.rows.len() {
            self.insert_row(self.rows.len(), "");
            return;
        }
        if pos.x == 0 {
            self.insert_row(pos.y, "");
            return;
        }
        let tail = self.rows[pos.y].split_off(pos.x, self.syntax.as_ref());
        let tail: String = tail.iter().collect();
        self.insert_row(pos.y + 1, &tail);
        self.modified = true;
    }

    pub fn delete_to_eol(&mut self, pos: Position) {
        let Some(row) = self.rows.get_mut(pos.y) else {
            return;
        };
        if pos.x >= row.len() {
            return;
        }
        row.truncate(pos.x, self.syntax.as_ref());
        self.modified = true;
    }

    /// Full text with a newline after every row, used only for save.
    pub fn serialize(&self) -> String {
        let mut text = String::new();
        for row in &self.rows {
            text.push_str(&row.text());
            text.push('\n');
        }
        text
    }

    /// Truncates the file to the serialized length and writes from offset 0.
    /// Returns `(lines, bytes)` for the message bar.
    pub fn save(&mut self) -> io::Result<(usize, usize)> {
        let Some(path) = self.filename.clone() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no file name",
            ));
        };
        let text = self.serialize();
        let mut file = OpenOptions::new().write(true).create(true).open(&path)?;
        file.set_len(text.len() as u64)?;
        file.write_all(text.as_bytes())?;
        self.modified = false;
        Ok((self.rows.len(), text.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(lines: &[&str]) -> Document {
        let mut doc = Document::empty();
        for (i, line) in lines.iter().enumerate() {
            doc.insert_row(i, line);
        }
        doc
    }

    fn lines(doc: &Document) -> Vec<String> {
        (0..doc.num_rows())
            .map(|i| doc.row(i).unwrap().text())
            .collect()
    }

    #[test]
    fn insert_then_delete_row_round_trips() {
        let mut d = doc(&["one", "two", "three"]);
        let before = lines(&d);
        for pos in 0..=d.num_rows() {
            d.insert_row(pos, "interloper");
            d.delete_row(pos);
            assert_eq!(lines(&d), before, "position {pos}");
        }
    }

    #[test]
    fn out_of_range_row_operations_are_no_ops() {
        let mut d = doc(&["only"]);
        d.insert_row(5, "nope");
        d.delete_row(5);
        assert_eq!(lines(&d), vec!["only"]);
    }

    #[test]
    fn backspace_at_document_start_is_a_no_op() {
        let mut d = doc(&["abc"]);
        assert_eq!(d.backspace(Position { x: 0, y: 0 }), None);
        assert_eq!(lines(&d), vec!["abc"]);
    }

    #[test]
    fn backspace_mid_row_deletes_the_previous_character() {
        let mut d = doc(&["abc"]);
        let pos = d.backspace(Position { x: 2, y: 0 }).unwrap();
        assert_eq!(pos, Position { x: 1, y: 0 });
        assert_eq!(lines(&d), vec!["ac"]);
    }

    #[test]
    fn backspace_at_column_zero_joins_rows() {
        let mut d = doc(&["ab", "cd", "ef"]);
        let pos = d.backspace(Position { x: 0, y: 1 }).unwrap();
        assert_eq!(pos, Position { x: 2, y: 0 });
        assert_eq!(lines(&d), vec!["abcd", "ef"]);
        assert_eq!(d.num_rows(), 2);
    }

    #[test]
    fn split_row_moves_the_remainder_below() {
        let mut d = doc(&["hello world"]);
        d.split_row(Position { x: 5, y: 0 });
        assert_eq!(lines(&d), vec!["hello", " world"]);
    }

    #[test]
    fn split_row_at_column_zero_opens_an_empty_row_above() {
        let mut d = doc(&["keep"]);
        d.split_row(Position { x: 0, y: 0 });
        assert_eq!(lines(&d), vec!["", "keep"]);
    }

    #[test]
    fn insert_char_past_the_last_line_appends_a_row() {
        let mut d = doc(&["one"]);
        d.insert_char(Position { x: 0, y: 1 }, 'z');
        assert_eq!(lines(&d), vec!["one", "z"]);
    }

    #[test]
    fn delete_to_eol_truncates_at_the_cursor() {
        let mut d = doc(&["hello world"]);
        d.delete_to_eol(Position { x: 5, y: 0 });
        assert_eq!(lines(&d), vec!["hello"]);
    }

    #[test]
    fn serialize_appends_a_newline_per_row() {
        let d = doc(&["a", "", "b"]);
        assert_eq!(d.serialize(), "a\n\nb\n");
    }

    #[test]
    fn mutations_mark_the_document_modified() {
        let mut d = doc(&["abc"]);
        d.modified = false;
        d.insert_char(Position { x: 1, y: 0 }, 'x');
        assert!(d.is_modified());
    }

    #[test]
    fn gutter_width_tracks_the_row_count() {
        assert_eq!(Document::empty().gutter_width(), 0);
        assert_eq!(doc(&["a"]).gutter_width(), 2);
        let many: Vec<String> = (0..12).map(|i| i.to_string()).collect();
        let many: Vec<&str> = many.iter().map(String::as_str).collect();
        assert_eq!(doc(&many).gutter_width(), 3);
    }
}
