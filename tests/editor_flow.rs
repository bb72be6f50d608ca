//! End-to-end editing workflows driven through the modal dispatcher with
//! scripted keyboard input, against real files on disk.

use std::collections::VecDeque;
use std::fs;
use std::io;

use rill::editor::{EditorState, Frontend, Transition};
use rill::keys::Key;

struct Script {
    keys: VecDeque<Key>,
}

impl Script {
    fn new(keys: Vec<Key>) -> Self {
        Script {
            keys: keys.into_iter().collect(),
        }
    }
}

impl Frontend for Script {
    fn next_key(&mut self) -> io::Result<Key> {
        self.keys
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }

    fn refresh(&mut self, _state: &mut EditorState) -> io::Result<()> {
        Ok(())
    }
}

fn typed(s: &str) -> Vec<Key> {
    s.chars().map(Key::Char).collect()
}

/// Runs the main-loop shape: pop a key, dispatch it, let prompts consume
/// whatever else they need from the same script.
fn run_keys(state: &mut EditorState, keys: Vec<Key>) -> Transition {
    let mut script = Script::new(keys);
    while let Ok(key) = script.next_key() {
        match state.process_key(key, &mut script).unwrap() {
            Transition::Quit => return Transition::Quit,
            Transition::Continue => {}
        }
    }
    Transition::Continue
}

#[test]
fn insert_on_line_two_then_write_quit_preserves_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "alpha\nbravo\ncharlie\n").unwrap();

    let mut state = EditorState::new(80, 24);
    state.open(&path).unwrap();

    // Move to line 2 column 0, type `ihello<Esc>`, then `:wq`.
    let mut keys = vec![Key::Char('j'), Key::Char('i')];
    keys.extend(typed("hello"));
    keys.push(Key::Esc);
    keys.push(Key::Char(':'));
    keys.extend(typed("wq"));
    keys.push(Key::Enter);

    assert_eq!(run_keys(&mut state, keys), Transition::Quit);

    let saved = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = saved.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "alpha");
    assert!(lines[1].starts_with("hello"));
    assert_eq!(lines[1], "hellobravo");
    assert_eq!(lines[2], "charlie");
}

#[test]
fn quit_with_unsaved_changes_refuses_until_forced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("draft.txt");
    fs::write(&path, "line\n").unwrap();

    let mut state = EditorState::new(80, 24);
    state.open(&path).unwrap();

    let mut keys = vec![Key::Char('i'), Key::Char('z'), Key::Esc, Key::Char(':')];
    keys.push(Key::Char('q'));
    keys.push(Key::Enter);
    assert_eq!(run_keys(&mut state, keys), Transition::Continue);
    assert_eq!(
        state.message.text,
        "No write since last change (add ! to override)"
    );

    let mut keys = vec![Key::Char(':')];
    keys.extend(typed("q!"));
    keys.push(Key::Enter);
    assert_eq!(run_keys(&mut state, keys), Transition::Quit);

    // The refused quit must not have written anything.
    assert_eq!(fs::read_to_string(&path).unwrap(), "line\n");
}

#[test]
fn write_command_truncates_and_reports_the_byte_count() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shrink.txt");
    fs::write(&path, "a much longer original line\nsecond\n").unwrap();

    let mut state = EditorState::new(80, 24);
    state.open(&path).unwrap();

    // Delete the whole first line's text, then save: the file must shrink.
    let mut keys = vec![Key::Char('D')];
    keys.push(Key::Char(':'));
    keys.push(Key::Char('w'));
    keys.push(Key::Enter);
    run_keys(&mut state, keys);

    let saved = fs::read_to_string(&path).unwrap();
    assert_eq!(saved, "\nsecond\n");
    assert_eq!(
        state.message.text,
        format!("\"{}\" 2L, {}B written to disk", path.display(), saved.len())
    );
}

#[test]
fn save_as_prompt_names_an_unnamed_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.txt");

    let mut state = EditorState::new(80, 24);
    let mut keys = vec![Key::Char('i')];
    keys.extend(typed("first line"));
    keys.push(Key::Esc);
    keys.push(Key::Char(':'));
    keys.push(Key::Char('w'));
    keys.push(Key::Enter);
    keys.extend(typed(&path.display().to_string()));
    keys.push(Key::Enter);
    run_keys(&mut state, keys);

    assert_eq!(fs::read_to_string(&path).unwrap(), "first line\n");
    assert!(!state.doc.is_modified());
}

#[test]
fn opening_a_missing_file_starts_an_empty_named_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("new.txt");

    let mut state = EditorState::new(80, 24);
    state.open(&path).unwrap();
    assert_eq!(state.doc.num_rows(), 0);
    assert!(!state.doc.is_modified());

    let mut keys = vec![Key::Char('i')];
    keys.extend(typed("created"));
    keys.push(Key::Esc);
    keys.push(Key::Char(':'));
    keys.extend(typed("wq"));
    keys.push(Key::Enter);
    assert_eq!(run_keys(&mut state, keys), Transition::Quit);
    assert_eq!(fs::read_to_string(&path).unwrap(), "created\n");
}

#[test]
fn search_wraps_around_the_document_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hay.txt");
    fs::write(&path, "needle at top\nmiddle\nbottom\n").unwrap();

    let mut state = EditorState::new(80, 24);
    state.open(&path).unwrap();

    let mut keys = vec![Key::Char('/')];
    keys.extend(typed("needle"));
    keys.push(Key::Enter);
    run_keys(&mut state, keys);
    assert_eq!(state.cursor.y, 0);

    // The only occurrence is behind the anchor, so `n` must wrap and say so.
    run_keys(&mut state, vec![Key::Char('n')]);
    assert_eq!(state.cursor.y, 0);
    assert_eq!(state.message.text, "Hit bottom, starting from the top");

    // A notable action afterwards replaces the wrap notice.
    run_keys(&mut state, vec![Key::Char('i')]);
    assert_eq!(state.message.text, "-- INSERT --");
}
