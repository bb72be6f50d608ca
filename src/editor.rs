//! Editor state and the modal input dispatcher.
//!
//! All mutation of the document, cursor and viewport happens here, on the
//! single control thread, in response to decoded key events. The dispatcher
//! is exhaustive over the mode variants; prompts run as a nested
//! render+read loop through the same `Frontend` seam the main loop uses.

use std::io;
use std::path::{Path, PathBuf};

use crossterm::style::Color;

use crate::document::{Document, Position};
use crate::keys::Key;
use crate::search::{SearchHit, SearchState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Insert,
    Prompt(PromptKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Command,
    Search,
    SaveAs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Continue,
    Quit,
}

/// Transient status text plus its color pair, overwritten by the next
/// notable action.
#[derive(Debug, Clone)]
pub struct MessageBar {
    pub text: String,
    pub fg: Color,
    pub bg: Color,
}

impl Default for MessageBar {
    fn default() -> Self {
        MessageBar::plain(String::new())
    }
}

impl MessageBar {
    pub fn plain(text: String) -> Self {
        MessageBar {
            text,
            fg: Color::White,
            bg: Color::Reset,
        }
    }

    pub fn warn(text: String) -> Self {
        MessageBar {
            text,
            fg: Color::White,
            bg: Color::Blue,
        }
    }

    pub fn wrap(text: String) -> Self {
        MessageBar {
            text,
            fg: Color::Red,
            bg: Color::Reset,
        }
    }
}

/// The dispatcher's view of the outside world: where the next key comes from
/// and how a frame gets on screen. The terminal frontend implements this in
/// production; tests drive the editor with a scripted one.
pub trait Frontend {
    fn next_key(&mut self) -> io::Result<Key>;
    fn refresh(&mut self, state: &mut EditorState) -> io::Result<()>;
}

pub struct EditorState {
    pub doc: Document,
    pub cursor: Position,
    pub rx: usize,
    pub row_offset: usize,
    pub col_offset: usize,
    pub screen_cols: usize,
    pub text_rows: usize,
    pub mode: Mode,
    pub message: MessageBar,
    pub search: SearchState,
}

impl EditorState {
    pub fn new(screen_cols: usize, screen_rows: usize) -> Self {
        EditorState {
            doc: Document::empty(),
            cursor: Position::default(),
            rx: 0,
            row_offset: 0,
            col_offset: 0,
            screen_cols,
            text_rows: screen_rows.saturating_sub(2),
            mode: Mode::Normal,
            message: MessageBar::default(),
            search: SearchState::default(),
        }
    }

    pub fn open(&mut self, path: &Path) -> io::Result<()> {
        self.doc = Document::open(path)?;
        log::info!(
            "opened {} ({} lines)",
            path.display(),
            self.doc.num_rows()
        );
        Ok(())
    }

    /// Recomputes the render column and the smallest scroll that keeps the
    /// cursor visible. Skipped while a prompt owns the cursor.
    pub fn scroll(&mut self) {
        if matches!(self.mode, Mode::Prompt(_)) {
            return;
        }
        self.rx = self
            .doc
            .row(self.cursor.y)
            .map_or(0, |row| row.cx_to_rx(self.cursor.x));

        if self.cursor.y < self.row_offset {
            self.row_offset = self.cursor.y;
        }
        if self.cursor.y >= self.row_offset + self.text_rows {
            self.row_offset = self.cursor.y + 1 - self.text_rows;
        }
        if self.rx < self.col_offset {
            self.col_offset = self.rx;
        }
        if self.rx >= self.col_offset + self.screen_cols {
            self.col_offset = self.rx + 1 - self.screen_cols;
        }
    }

    pub fn process_key<F: Frontend>(&mut self, key: Key, frontend: &mut F) -> io::Result<Transition> {
        match self.mode {
            Mode::Normal => self.normal_key(key, frontend),
            Mode::Insert => {
                self.insert_key(key);
                Ok(Transition::Continue)
            }
            // Prompt keys are consumed by the nested prompt loop, never here.
            Mode::Prompt(_) => Ok(Transition::Continue),
        }
    }

    fn normal_key<F: Frontend>(&mut self, key: Key, frontend: &mut F) -> io::Result<Transition> {
        match key {
            Key::Char('h') => self.move_cursor(Key::Left),
            Key::Char('j') => self.move_cursor(Key::Down),
            Key::Char('k') => self.move_cursor(Key::Up),
            Key::Char('l') => self.move_cursor(Key::Right),
            Key::Char('0') => self.cursor.x = 0,
            Key::Char('$') => self.line_end(),
            Key::Char('i') => self.enter_insert(),
            Key::Char('a') => {
                self.move_cursor(Key::Right);
                self.enter_insert();
            }
            Key::Char('o') => self.open_line(self.cursor.y + 1),
            Key::Char('O') => self.open_line(self.cursor.y),
            Key::Char('D') => {
                self.doc.delete_to_eol(self.cursor);
                self.move_cursor(Key::Left);
            }
            Key::Char('C') => {
                self.doc.delete_to_eol(self.cursor);
                self.enter_insert();
            }
            Key::Char('x') => {
                self.move_cursor(Key::Right);
                self.backspace();
            }
            Key::Char('r') => self.replace_char(frontend)?,
            Key::Char('f') => self.find_in_row(frontend, true, false)?,
            Key::Char('F') => self.find_in_row(frontend, false, false)?,
            Key::Char('t') => self.find_in_row(frontend, true, true)?,
            Key::Char('T') => self.find_in_row(frontend, false, true)?,
            Key::Char('/') => self.search_prompt(frontend)?,
            Key::Char(':') => return self.command_prompt(frontend),
            Key::Char('n') => self.repeat_search(true),
            Key::Char('N') => self.repeat_search(false),
            other => self.universal_key(other),
        }
        Ok(Transition::Continue)
    }

    fn insert_key(&mut self, key: Key) {
        match key {
            Key::Enter => {
                self.doc.split_row(self.cursor);
                self.cursor.y += 1;
                self.cursor.x = 0;
            }
            Key::Backspace => self.backspace(),
            Key::Char(c) if !c.is_control() || c == '\t' => self.insert_char(c),
            other => self.universal_key(other),
        }
    }

    /// Keys that behave the same in every mode: movement, and Escape back to
    /// Normal with the message bar cleared.
    fn universal_key(&mut self, key: Key) {
        match key {
            Key::Up | Key::Down | Key::Left | Key::Right => self.move_cursor(key),
            Key::Home => self.cursor.x = 0,
            Key::End => self.line_end(),
            Key::PageUp => {
                self.cursor.y = self.row_offset;
                for _ in 0..self.text_rows {
                    self.move_cursor(Key::Up);
                }
            }
            Key::PageDown => {
                let bottom = self.row_offset + self.text_rows.saturating_sub(1);
                self.cursor.y = bottom.min(self.doc.num_rows());
                for _ in 0..self.text_rows {
                    self.move_cursor(Key::Down);
                }
            }
            Key::Delete => {
                self.move_cursor(Key::Right);
                self.backspace();
            }
            Key::Esc => {
                self.mode = Mode::Normal;
                self.message = MessageBar::default();
            }
            _ => {}
        }
    }

    pub fn move_cursor(&mut self, key: Key) {
        match key {
            Key::Up => {
                if self.cursor.y > 0 {
                    self.cursor.y -= 1;
                }
            }
            Key::Down => {
                if self.cursor.y < self.doc.num_rows() {
                    self.cursor.y += 1;
                }
            }
            Key::Left => {
                if self.cursor.x > 0 {
                    self.cursor.x -= 1;
                } else if self.cursor.y > 0 {
                    self.cursor.y -= 1;
                    self.cursor.x = self.doc.row(self.cursor.y).map_or(0, |r| r.len());
                }
            }
            Key::Right => {
                let len = self.doc.row(self.cursor.y).map(|r| r.len());
                match len {
                    Some(len) if self.cursor.x < len => self.cursor.x += 1,
                    Some(len) if self.cursor.x == len => {
                        self.cursor.y += 1;
                        self.cursor.x = 0;
                    }
                    _ => {}
                }
            }
            _ => {}
        }

        // x stays within the destination row after every move.
        let len = self.doc.row(self.cursor.y).map_or(0, |r| r.len());
        if self.cursor.x > len {
            self.cursor.x = len;
        }
    }

    fn line_end(&mut self) {
        self.cursor.x = self.doc.row(self.cursor.y).map_or(0, |r| r.len());
    }

    fn enter_insert(&mut self) {
        self.mode = Mode::Insert;
        self.message = MessageBar::plain("-- INSERT --".into());
    }

    fn open_line(&mut self, at: usize) {
        let at = at.min(self.doc.num_rows());
        self.doc.insert_row(at, "");
        self.cursor = Position { x: 0, y: at };
        self.enter_insert();
    }

    fn insert_char(&mut self, c: char) {
        self.doc.insert_char(self.cursor, c);
        self.cursor.x += 1;
    }

    fn backspace(&mut self) {
        if let Some(pos) = self.doc.backspace(self.cursor) {
            self.cursor = pos;
        }
    }

    /// `r`: one more key, substituted for the character under the cursor.
    fn replace_char<F: Frontend>(&mut self, frontend: &mut F) -> io::Result<()> {
        let key = frontend.next_key()?;
        if let Key::Char(c) = key {
            if (' '..='~').contains(&c) {
                self.move_cursor(Key::Right);
                self.backspace();
                self.insert_char(c);
            }
        }
        Ok(())
    }

    /// `f`/`F`/`t`/`T`: one more key, then jump within the current row's raw
    /// text. Forward looks strictly after the cursor, backward strictly
    /// before; `till` stops one column short of the target.
    fn find_in_row<F: Frontend>(
        &mut self,
        frontend: &mut F,
        forward: bool,
        till: bool,
    ) -> io::Result<()> {
        let key = frontend.next_key()?;
        let Key::Char(target) = key else {
            return Ok(());
        };
        if !(' '..='~').contains(&target) {
            return Ok(());
        }
        let Some(row) = self.doc.row(self.cursor.y) else {
            return Ok(());
        };
        let chars = row.chars();
        let x = self.cursor.x;

        let hit = if forward {
            chars
                .iter()
                .enumerate()
                .skip(x + 1)
                .find(|(_, &c)| c == target)
                .map(|(i, _)| if till { i - 1 } else { i })
        } else {
            chars[..x.min(chars.len())]
                .iter()
                .rposition(|&c| c == target)
                .map(|i| if till { i + 1 } else { i })
        };

        if let Some(new_x) = hit {
            self.cursor.x = new_x;
        }
        Ok(())
    }

    fn search_prompt<F: Frontend>(&mut self, frontend: &mut F) -> io::Result<()> {
        let Some(query) = self.prompt(frontend, "/", PromptKind::Search)? else {
            return Ok(());
        };
        if query.is_empty() {
            return Ok(());
        }
        match self.search.begin(&self.doc, &query) {
            SearchHit::Found { y, rx, .. } => self.jump_to(y, rx),
            _ => self.message = MessageBar::warn(format!("Pattern not found: {query}")),
        }
        Ok(())
    }

    fn repeat_search(&mut self, forward: bool) {
        let hit = if forward {
            self.search.next(&self.doc)
        } else {
            self.search.prev(&self.doc)
        };
        match hit {
            SearchHit::Found { y, rx, wrapped } => {
                self.jump_to(y, rx);
                if wrapped {
                    let notice = if forward {
                        "Hit bottom, starting from the top"
                    } else {
                        "Hit top, starting from the bottom"
                    };
                    self.message = MessageBar::wrap(notice.into());
                }
            }
            SearchHit::NotFound => {
                self.message =
                    MessageBar::warn(format!("Pattern not found: {}", self.search.query()));
            }
            SearchHit::Inactive => {}
        }
    }

    fn jump_to(&mut self, y: usize, rx: usize) {
        self.cursor.y = y;
        self.cursor.x = self.doc.row(y).map_or(0, |row| row.rx_to_cx(rx));
    }

    fn command_prompt<F: Frontend>(&mut self, frontend: &mut F) -> io::Result<Transition> {
        let Some(input) = self.prompt(frontend, ":", PromptKind::Command)? else {
            return Ok(Transition::Continue);
        };
        let cmd = input.split_whitespace().next().unwrap_or("");
        match cmd {
            "" => {}
            "q" | "quit" => return Ok(self.quit(false)),
            "q!" | "quit!" => return Ok(self.quit(true)),
            "w" | "write" => {
                self.save(frontend)?;
            }
            "wq" => {
                if self.save(frontend)? {
                    return Ok(Transition::Quit);
                }
            }
            other => {
                self.message = MessageBar::warn(format!("Not an editor command: {other}"));
            }
        }
        Ok(Transition::Continue)
    }

    /// Quitting with unsaved changes needs the force flag; the refusal is a
    /// guarded action, not an error.
    fn quit(&mut self, force: bool) -> Transition {
        if self.doc.is_modified() && !force {
            self.message =
                MessageBar::warn("No write since last change (add ! to override)".into());
            return Transition::Continue;
        }
        Transition::Quit
    }

    /// Saves the document, prompting for a name first if none is set.
    /// Returns whether the file actually hit the disk.
    fn save<F: Frontend>(&mut self, frontend: &mut F) -> io::Result<bool> {
        if self.doc.filename().is_none() {
            match self.prompt(frontend, "Save as ", PromptKind::SaveAs)? {
                Some(name) if !name.trim().is_empty() => {
                    self.doc.set_filename(PathBuf::from(name.trim()));
                }
                _ => {
                    self.message = MessageBar::warn("Save aborted".into());
                    return Ok(false);
                }
            }
        }
        match self.doc.save() {
            Ok((lines, bytes)) => {
                let name = self.display_name();
                self.message =
                    MessageBar::plain(format!("\"{name}\" {lines}L, {bytes}B written to disk"));
                log::info!("wrote {name}: {lines} lines, {bytes} bytes");
                Ok(true)
            }
            Err(err) => {
                log::error!("save failed: {err}");
                self.message = MessageBar::warn(format!("Can't save! I/O error: {err}"));
                Ok(false)
            }
        }
    }

    pub fn display_name(&self) -> String {
        self.doc
            .filename()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| "[No Name]".into())
    }

    /// Nested blocking line prompt. Redraws `prefix + typed` in the message
    /// bar after every key; Backspace/Left/Right edit the typed text without
    /// ever reaching into the prefix. Enter returns the text, Escape
    /// cancels.
    fn prompt<F: Frontend>(
        &mut self,
        frontend: &mut F,
        prefix: &str,
        kind: PromptKind,
    ) -> io::Result<Option<String>> {
        let saved_cursor = self.cursor;
        let saved_mode = self.mode;
        self.mode = Mode::Prompt(kind);

        let prefix_cols = prefix.chars().count();
        let mut typed: Vec<char> = Vec::new();
        let mut pos = 0usize;

        let result = loop {
            let text: String = typed.iter().collect();
            self.message = MessageBar::plain(format!("{prefix}{text}"));
            // While prompting, the cursor lives on the message bar line.
            self.cursor = Position {
                x: prefix_cols + pos,
                y: self.text_rows + 1,
            };
            frontend.refresh(self)?;

            match frontend.next_key()? {
                Key::Enter => break Some(typed.iter().collect()),
                Key::Esc => {
                    self.message = MessageBar::default();
                    break None;
                }
                Key::Backspace => {
                    if pos > 0 {
                        typed.remove(pos - 1);
                        pos -= 1;
                    }
                }
                Key::Left => pos = pos.saturating_sub(1),
                Key::Right => {
                    if pos < typed.len() {
                        pos += 1;
                    }
                }
                Key::Char(c) if !c.is_control() => {
                    typed.insert(pos, c);
                    pos += 1;
                }
                _ => {}
            }
        };

        self.cursor = saved_cursor;
        self.mode = saved_mode;
        Ok(result)
    }
}
