//! Incremental substring search over row render text, with wraparound and a
//! repeat anchor.

use crate::document::Document;

/// Last query plus the anchor of the most recent match, in render columns.
/// An empty query means no search has ever matched.
#[derive(Debug, Default)]
pub struct SearchState {
    query: String,
    row: usize,
    rx: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchHit {
    Found { y: usize, rx: usize, wrapped: bool },
    NotFound,
    Inactive,
}

impl SearchState {
    pub fn query(&self) -> &str {
        &self.query
    }

    fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    /// First match scanning from the top of the document. Only a hit records
    /// the query and anchor; a miss leaves any previous search repeatable.
    pub fn begin(&mut self, doc: &Document, query: &str) -> SearchHit {
        let needle: Vec<char> = query.chars().collect();
        if needle.is_empty() {
            return SearchHit::Inactive;
        }
        for y in 0..doc.num_rows() {
            if let Some(rx) = find_from(doc, y, &needle, 0) {
                self.query = query.to_string();
                self.row = y;
                self.rx = rx;
                return SearchHit::Found {
                    y,
                    rx,
                    wrapped: false,
                };
            }
        }
        SearchHit::NotFound
    }

    /// Next occurrence strictly after the anchor, wrapping to the top once.
    pub fn next(&mut self, doc: &Document) -> SearchHit {
        if !self.is_active() {
            return SearchHit::Inactive;
        }
        let needle: Vec<char> = self.query.chars().collect();
        self.clamp_anchor(doc);

        if let Some(rx) = find_from(doc, self.row, &needle, self.rx + 1) {
            return self.record(self.row, rx, false);
        }
        for y in self.row + 1..doc.num_rows() {
            if let Some(rx) = find_from(doc, y, &needle, 0) {
                return self.record(y, rx, false);
            }
        }
        // Hit bottom: retry once from the top of the document.
        for y in 0..doc.num_rows() {
            if let Some(rx) = find_from(doc, y, &needle, 0) {
                return self.record(y, rx, true);
            }
        }
        SearchHit::NotFound
    }

    /// Previous occurrence strictly before the anchor, wrapping to the
    /// bottom once.
    pub fn prev(&mut self, doc: &Document) -> SearchHit {
        if !self.is_active() {
            return SearchHit::Inactive;
        }
        let needle: Vec<char> = self.query.chars().collect();
        self.clamp_anchor(doc);

        if let Some(rx) = rfind_before(doc, self.row, &needle, self.rx) {
            return self.record(self.row, rx, false);
        }
        for y in (0..self.row).rev() {
            if let Some(rx) = rfind_before(doc, y, &needle, usize::MAX) {
                return self.record(y, rx, false);
            }
        }
        // Hit top: retry once from the bottom of the document.
        for y in (0..doc.num_rows()).rev() {
            if let Some(rx) = rfind_before(doc, y, &needle, usize::MAX) {
                return self.record(y, rx, true);
            }
        }
        SearchHit::NotFound
    }

    fn record(&mut self, y: usize, rx: usize, wrapped: bool) -> SearchHit {
        self.row = y;
        self.rx = rx;
        SearchHit::Found { y, rx, wrapped }
    }

    // Edits since the last match may have shrunk the document under the
    // anchor.
    fn clamp_anchor(&mut self, doc: &Document) {
        if self.row >= doc.num_rows() {
            self.row = 0;
            self.rx = 0;
        }
    }
}

fn find_from(doc: &Document, y: usize, needle: &[char], from: usize) -> Option<usize> {
    let hay = doc.row(y)?.render();
    if hay.len() < needle.len() {
        return None;
    }
    (from..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()] == *needle)
}

fn rfind_before(doc: &Document, y: usize, needle: &[char], before: usize) -> Option<usize> {
    let hay = doc.row(y)?.render();
    if hay.len() < needle.len() {
        return None;
    }
    let last_start = (hay.len() - needle.len()).min(before.checked_sub(1)?);
    (0..=last_start)
        .rev()
        .find(|&i| hay[i..i + needle.len()] == *needle)
}
