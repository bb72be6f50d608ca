//! Highlight rules and per-row classification.
//!
//! Rules live in per-extension TOML files under the user config directory
//! (`<config>/rill/syntax/<ext>.toml`), each carrying word lists for comment
//! markers, statement keywords and type keywords. A missing rule file just
//! means plain highlighting; a broken one is logged and ignored.

use std::fs;
use std::path::{Path, PathBuf};

use crossterm::style::Color;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    Normal,
    Number,
    Comment,
    Statement,
    Type,
}

impl Highlight {
    pub fn color(self) -> Color {
        match self {
            Highlight::Normal => Color::White,
            Highlight::Number => Color::Magenta,
            Highlight::Comment => Color::Red,
            Highlight::Statement => Color::Yellow,
            Highlight::Type => Color::Green,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub statements: Vec<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

pub fn parse_rules(text: &str) -> Result<RuleSet, toml::de::Error> {
    toml::from_str(text)
}

fn rules_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rill").join("syntax"))
}

/// Looks up the rule file for a file extension. Absence is not an error.
pub fn load_rules(extension: &str) -> Option<RuleSet> {
    let path = rules_dir()?.join(format!("{extension}.toml"));
    let text = fs::read_to_string(&path).ok()?;
    match parse_rules(&text) {
        Ok(rules) => Some(rules),
        Err(err) => {
            log::warn!("ignoring malformed rule file {}: {err}", path.display());
            None
        }
    }
}

pub fn rules_for_path(path: &Path) -> Option<RuleSet> {
    let extension = path.extension()?.to_str()?;
    load_rules(extension)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn find_marker(render: &[char], marker: &str) -> Option<usize> {
    let needle: Vec<char> = marker.chars().collect();
    if needle.is_empty() || render.len() < needle.len() {
        return None;
    }
    (0..=render.len() - needle.len()).find(|&i| render[i..i + needle.len()] == needle[..])
}

/// Classifies one render row, one tag per render column. Comment markers win
/// over word tags; digits glued to a preceding letter stay plain.
pub fn annotate(render: &[char], rules: Option<&RuleSet>) -> Vec<Highlight> {
    let mut tags = vec![Highlight::Normal; render.len()];

    for (i, &c) in render.iter().enumerate() {
        if c.is_ascii_digit() && (i == 0 || !render[i - 1].is_alphabetic()) {
            tags[i] = Highlight::Number;
        }
    }

    let Some(rules) = rules else {
        return tags;
    };

    let mut i = 0;
    while i < render.len() {
        if !is_word_char(render[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < render.len() && is_word_char(render[i]) {
            i += 1;
        }
        let word: String = render[start..i].iter().collect();
        let tag = if rules.statements.iter().any(|s| *s == word) {
            Some(Highlight::Statement)
        } else if rules.types.iter().any(|t| *t == word) {
            Some(Highlight::Type)
        } else {
            None
        };
        if let Some(tag) = tag {
            for slot in &mut tags[start..i] {
                *slot = tag;
            }
        }
    }

    let comment_start = rules
        .comments
        .iter()
        .filter_map(|marker| find_marker(render, marker))
        .min();
    if let Some(start) = comment_start {
        for slot in &mut tags[start..] {
            *slot = Highlight::Comment;
        }
    }

    tags
}
