//! One document line plus its derived render and highlight forms.

use crate::syntax::{self, Highlight, RuleSet};

pub const TAB_STOP: usize = 4;

/// A row keeps its raw characters together with a tab-expanded render form
/// and one highlight tag per render column. The derived state is recomputed
/// by every mutation, so a row is never drawn stale.
#[derive(Debug, Clone, Default)]
pub struct Row {
    chars: Vec<char>,
    render: Vec<char>,
    highlight: Vec<Highlight>,
}

impl Row {
    pub fn new(text: &str, rules: Option<&RuleSet>) -> Self {
        let mut row = Row {
            chars: text.chars().collect(),
            render: Vec::new(),
            highlight: Vec::new(),
        };
        row.update(rules);
        row
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn render(&self) -> &[char] {
        &self.render
    }

    pub fn highlight(&self) -> &[Highlight] {
        &self.highlight
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn rsize(&self) -> usize {
        self.render.len()
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn insert_char(&mut self, at: usize, c: char, rules: Option<&RuleSet>) {
        let at = at.min(self.chars.len());
        self.chars.insert(at, c);
        self.update(rules);
    }

    pub fn delete_char(&mut self, at: usize, rules: Option<&RuleSet>) {
        if at >= self.chars.len() {
            return;
        }
        self.chars.remove(at);
        self.update(rules);
    }

    pub fn append(&mut self, tail: &[char], rules: Option<&RuleSet>) {
        self.chars.extend_from_slice(tail);
        self.update(rules);
    }

    /// Truncates at `at` and returns the remainder, for newline insertion.
    pub fn split_off(&mut self, at: usize, rules: Option<&RuleSet>) -> Vec<char> {
        let at = at.min(self.chars.len());
        let tail = self.chars.split_off(at);
        self.update(rules);
        tail
    }

    pub fn truncate(&mut self, at: usize, rules: Option<&RuleSet>) {
        if at >= self.chars.len() {
            return;
        }
        self.chars.truncate(at);
        self.update(rules);
    }

    /// Rebuilds the render form (each tab expands to `TAB_STOP` columns) and
    /// its highlight tags.
    pub fn update(&mut self, rules: Option<&RuleSet>) {
        self.render.clear();
        for &c in &self.chars {
            if c == '\t' {
                for _ in 0..TAB_STOP {
                    self.render.push(' ');
                }
            } else {
                self.render.push(c);
            }
        }
        self.highlight = syntax::annotate(&self.render, rules);
    }

    /// Buffer column to render column.
    pub fn cx_to_rx(&self, cx: usize) -> usize {
        self.chars
            .iter()
            .take(cx)
            .map(|&c| if c == '\t' { TAB_STOP } else { 1 })
            .sum()
    }

    /// Render column back to buffer column: the first `cx` whose render
    /// column exceeds `rx`. Columns inside a tab's span resolve to the tab.
    pub fn rx_to_cx(&self, rx: usize) -> usize {
        let mut cur_rx = 0;
        for (cx, &c) in self.chars.iter().enumerate() {
            cur_rx += if c == '\t' { TAB_STOP } else { 1 };
            if cur_rx > rx {
                return cx;
            }
        }
        self.chars.len()
    }
}
