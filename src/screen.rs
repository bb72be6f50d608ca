//! Per-frame render pipeline.
//!
//! Each cycle assembles the whole frame (rows, gutter, status bar, message
//! bar, cursor placement) into one buffer of escape-coded output and hands
//! it to the terminal as a single write, so a frame is never torn.

use std::io;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::queue;
use crossterm::style::{
    Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::terminal::{Clear, ClearType};

use crate::editor::{EditorState, Mode};
use crate::terminal::Terminal;

pub struct Screen {
    frame: Vec<u8>,
}

impl Default for Screen {
    fn default() -> Self {
        Screen::new()
    }
}

impl Screen {
    pub fn new() -> Self {
        Screen {
            frame: Vec::with_capacity(16 * 1024),
        }
    }

    pub fn draw(&mut self, state: &mut EditorState, terminal: &mut Terminal) -> io::Result<()> {
        state.scroll();
        self.frame.clear();
        queue!(self.frame, Hide, MoveTo(0, 0))?;
        self.draw_rows(state)?;
        self.draw_status_bar(state)?;
        self.draw_message_bar(state)?;

        let (col, row) = cursor_screen_position(state);
        queue!(self.frame, MoveTo(col, row), Show)?;
        terminal.write_frame(&self.frame)
    }

    fn draw_rows(&mut self, state: &EditorState) -> io::Result<()> {
        let gutter = state.doc.gutter_width();
        for screen_row in 0..state.text_rows {
            let file_row = screen_row + state.row_offset;
            match state.doc.row(file_row) {
                None => {
                    queue!(
                        self.frame,
                        SetForegroundColor(Color::DarkGrey),
                        Print('~'),
                        ResetColor
                    )?;
                }
                Some(row) => {
                    queue!(
                        self.frame,
                        SetForegroundColor(Color::Green),
                        Print(format!(
                            "{:>width$} ",
                            file_row + 1,
                            width = gutter.saturating_sub(1)
                        )),
                        ResetColor
                    )?;

                    let start = state.col_offset.min(row.rsize());
                    let end = (state.col_offset + state.screen_cols).min(row.rsize());
                    let mut current: Option<Color> = None;
                    for i in start..end {
                        let color = row.highlight()[i].color();
                        // Only emit a color code when the color changes.
                        if current != Some(color) {
                            queue!(self.frame, SetForegroundColor(color))?;
                            current = Some(color);
                        }
                        queue!(self.frame, Print(row.render()[i]))?;
                    }
                    queue!(self.frame, ResetColor)?;
                }
            }
            queue!(self.frame, Clear(ClearType::UntilNewLine), Print("\r\n"))?;
        }
        Ok(())
    }

    fn draw_status_bar(&mut self, state: &EditorState) -> io::Result<()> {
        let left = format!("{:.20} - {} lines", state.display_name(), state.doc.num_rows());
        let right = format!("{},{}", state.cursor.y + 1, state.rx + 1);

        queue!(self.frame, SetAttribute(Attribute::Reverse), Print(&left))?;
        let mut col = left.chars().count();
        while col < state.screen_cols {
            if state.screen_cols - col == right.len() {
                queue!(self.frame, Print(&right))?;
                break;
            }
            queue!(self.frame, Print(' '))?;
            col += 1;
        }
        queue!(self.frame, SetAttribute(Attribute::Reset), Print("\r\n"))
    }

    fn draw_message_bar(&mut self, state: &EditorState) -> io::Result<()> {
        let text: String = state.message.text.chars().take(state.screen_cols).collect();
        queue!(
            self.frame,
            Clear(ClearType::UntilNewLine),
            SetForegroundColor(state.message.fg),
            SetBackgroundColor(state.message.bg),
            Print(text),
            ResetColor
        )
    }
}

/// The prompt owns the cursor while it is active and positions it inside the
/// message bar itself; otherwise the cursor sits at its viewport-relative,
/// tab-aware column, pushed right by the gutter.
fn cursor_screen_position(state: &EditorState) -> (u16, u16) {
    if matches!(state.mode, Mode::Prompt(_)) {
        (state.cursor.x as u16, state.cursor.y as u16)
    } else {
        let col = state.rx.saturating_sub(state.col_offset) + state.doc.gutter_width();
        let row = state.cursor.y.saturating_sub(state.row_offset);
        (col as u16, row as u16)
    }
}
