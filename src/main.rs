use std::env;
use std::io;
use std::path::Path;
use std::process;

use rill::editor::{EditorState, Frontend, Transition};
use rill::keys::{self, Key};
use rill::logger;
use rill::screen::Screen;
use rill::terminal::Terminal;

/// Terminal-backed frontend: keys decoded from the raw byte stream, frames
/// drawn through the render pipeline.
struct Tui {
    terminal: Terminal,
    screen: Screen,
}

impl Frontend for Tui {
    fn next_key(&mut self) -> io::Result<Key> {
        keys::read_key(&mut self.terminal)
    }

    fn refresh(&mut self, state: &mut EditorState) -> io::Result<()> {
        self.screen.draw(state, &mut self.terminal)
    }
}

fn run(path: Option<&Path>) -> io::Result<()> {
    let mut terminal = Terminal::new()?;
    let mut state = EditorState::new(terminal.cols() as usize, terminal.rows() as usize);
    if let Some(path) = path {
        state.open(path)?;
    }

    terminal.enter_raw_mode()?;
    let mut tui = Tui {
        terminal,
        screen: Screen::new(),
    };

    loop {
        tui.refresh(&mut state)?;
        let key = tui.next_key()?;
        if state.process_key(key, &mut tui)? == Transition::Quit {
            return Ok(());
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() > 1 {
        eprintln!("usage: rill [file]");
        process::exit(2);
    }

    if let Err(err) = logger::init() {
        eprintln!("rill: logging disabled: {err}");
    }

    // The raw-mode guard inside run() is dropped before we get here, so the
    // terminal is already cooked again on the error path.
    if let Err(err) = run(args.first().map(Path::new)) {
        log::error!("fatal: {err}");
        eprintln!("rill: {err}");
        process::exit(1);
    }
}
