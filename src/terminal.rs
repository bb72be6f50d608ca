//! Terminal control adapter.
//!
//! Owns the controlling terminal for the lifetime of the editor: raw mode,
//! geometry, byte-granularity reads and single-write frame output. Raw mode
//! is released in `Drop`, so the terminal is restored on every exit path.

use std::io::{self, Read, Write};
use std::time::Duration;

use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};

use crate::keys::ByteSource;

pub struct Terminal {
    stdin: io::Stdin,
    stdout: io::Stdout,
    cols: u16,
    rows: u16,
    raw: bool,
}

impl Terminal {
    /// Connects to the controlling terminal and queries its geometry. The
    /// editor cannot run without known dimensions, so failure here is fatal.
    pub fn new() -> io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        Ok(Terminal {
            stdin: io::stdin(),
            stdout: io::stdout(),
            cols,
            rows,
            raw: false,
        })
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn enter_raw_mode(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        self.raw = true;
        execute!(self.stdout, EnterAlternateScreen)
    }

    /// Reapplies the cooked terminal state. Idempotent; also invoked by
    /// `Drop`.
    pub fn restore(&mut self) {
        if self.raw {
            let _ = execute!(self.stdout, Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
            self.raw = false;
        }
    }

    /// One buffered write for the whole frame, flushed immediately.
    pub fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.stdout.write_all(frame)?;
        self.stdout.flush()
    }

    fn poll_stdin(&self, timeout: Duration) -> io::Result<bool> {
        let mut fds = libc::pollfd {
            fd: libc::STDIN_FILENO,
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as libc::c_int;
        loop {
            let ready = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
            if ready < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            return Ok(ready > 0);
        }
    }
}

impl ByteSource for Terminal {
    fn read_byte(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        loop {
            // The terminal read timeout can surface as a zero-length read;
            // keep waiting until a byte actually arrives.
            let n = self.stdin.read(&mut buf)?;
            if n == 1 {
                return Ok(buf[0]);
            }
        }
    }

    fn read_byte_within(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
        if self.poll_stdin(timeout)? {
            self.read_byte().map(Some)
        } else {
            Ok(None)
        }
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        self.restore();
    }
}
