//! Escape-sequence key decoder.
//!
//! Turns the raw byte stream coming out of the terminal into logical key
//! events, one per call. Malformed or timed-out sequences never error; they
//! degrade to a bare `Esc`.

use std::io;
use std::time::Duration;

/// How long to wait for the rest of an escape sequence before deciding the
/// user really pressed Escape.
pub const ESCAPE_TIMEOUT: Duration = Duration::from_millis(75);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Esc,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
}

/// Byte-granularity input, the seam between the terminal adapter and the
/// decoder. `read_byte` blocks; `read_byte_within` gives the decoder its
/// bounded lookahead inside escape sequences.
pub trait ByteSource {
    fn read_byte(&mut self) -> io::Result<u8>;
    fn read_byte_within(&mut self, timeout: Duration) -> io::Result<Option<u8>>;
}

/// Blocks for the next logical key. Total: every byte sequence maps to some
/// key, so callers never see a decode error.
pub fn read_key<S: ByteSource>(input: &mut S) -> io::Result<Key> {
    let first = input.read_byte()?;
    match first {
        0x1b => read_escape(input),
        0x7f => Ok(Key::Backspace),
        b'\r' => Ok(Key::Enter),
        b if b < 0x80 => Ok(Key::Char(b as char)),
        b => read_utf8(input, b),
    }
}

fn read_escape<S: ByteSource>(input: &mut S) -> io::Result<Key> {
    let Some(intro) = input.read_byte_within(ESCAPE_TIMEOUT)? else {
        return Ok(Key::Esc);
    };

    match intro {
        b'[' => {
            let Some(code) = input.read_byte_within(ESCAPE_TIMEOUT)? else {
                return Ok(Key::Esc);
            };
            match code {
                b'A' => Ok(Key::Up),
                b'B' => Ok(Key::Down),
                b'C' => Ok(Key::Right),
                b'D' => Ok(Key::Left),
                b'H' => Ok(Key::Home),
                b'F' => Ok(Key::End),
                b'1'..=b'9' => read_tilde_suffix(input, code),
                _ => Ok(Key::Esc),
            }
        }
        b'O' => match input.read_byte_within(ESCAPE_TIMEOUT)? {
            Some(b'H') => Ok(Key::Home),
            Some(b'F') => Ok(Key::End),
            _ => Ok(Key::Esc),
        },
        _ => Ok(Key::Esc),
    }
}

fn read_tilde_suffix<S: ByteSource>(input: &mut S, digit: u8) -> io::Result<Key> {
    match input.read_byte_within(ESCAPE_TIMEOUT)? {
        Some(b'~') => Ok(match digit {
            b'1' | b'7' => Key::Home,
            b'3' => Key::Delete,
            b'4' | b'8' => Key::End,
            b'5' => Key::PageUp,
            b'6' => Key::PageDown,
            _ => Key::Esc,
        }),
        _ => Ok(Key::Esc),
    }
}

/// Accumulates the continuation bytes of a multi-byte rune. Truncated or
/// invalid input decodes to U+FFFD instead of failing.
fn read_utf8<S: ByteSource>(input: &mut S, first: u8) -> io::Result<Key> {
    let width = match first {
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => return Ok(Key::Char(char::REPLACEMENT_CHARACTER)),
    };

    let mut buf = [first, 0, 0, 0];
    for slot in buf.iter_mut().take(width).skip(1) {
        match input.read_byte_within(ESCAPE_TIMEOUT)? {
            Some(b) => *slot = b,
            None => return Ok(Key::Char(char::REPLACEMENT_CHARACTER)),
        }
    }

    let ch = std::str::from_utf8(&buf[..width])
        .ok()
        .and_then(|s| s.chars().next())
        .unwrap_or(char::REPLACEMENT_CHARACTER);
    Ok(Key::Char(ch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Script(VecDeque<u8>);

    impl Script {
        fn new(bytes: &[u8]) -> Self {
            Script(bytes.iter().copied().collect())
        }
    }

    impl ByteSource for Script {
        fn read_byte(&mut self) -> io::Result<u8> {
            self.0
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
        }

        fn read_byte_within(&mut self, _timeout: Duration) -> io::Result<Option<u8>> {
            Ok(self.0.pop_front())
        }
    }

    fn decode(bytes: &[u8]) -> Key {
        read_key(&mut Script::new(bytes)).unwrap()
    }

    #[test]
    fn printable_characters_decode_directly() {
        assert_eq!(decode(b"a"), Key::Char('a'));
        assert_eq!(decode(b"$"), Key::Char('$'));
        assert_eq!(decode(b"\t"), Key::Char('\t'));
    }

    #[test]
    fn control_bytes_map_to_named_keys() {
        assert_eq!(decode(b"\r"), Key::Enter);
        assert_eq!(decode(&[0x7f]), Key::Backspace);
    }

    #[test]
    fn arrow_keys() {
        assert_eq!(decode(b"\x1b[A"), Key::Up);
        assert_eq!(decode(b"\x1b[B"), Key::Down);
        assert_eq!(decode(b"\x1b[C"), Key::Right);
        assert_eq!(decode(b"\x1b[D"), Key::Left);
    }

    #[test]
    fn home_and_end_variants() {
        for seq in [&b"\x1b[H"[..], b"\x1bOH", b"\x1b[1~", b"\x1b[7~"] {
            assert_eq!(decode(seq), Key::Home, "sequence {seq:?}");
        }
        for seq in [&b"\x1b[F"[..], b"\x1bOF", b"\x1b[4~", b"\x1b[8~"] {
            assert_eq!(decode(seq), Key::End, "sequence {seq:?}");
        }
    }

    #[test]
    fn tilde_suffixed_keys() {
        assert_eq!(decode(b"\x1b[3~"), Key::Delete);
        assert_eq!(decode(b"\x1b[5~"), Key::PageUp);
        assert_eq!(decode(b"\x1b[6~"), Key::PageDown);
    }

    #[test]
    fn unmapped_digit_with_tilde_degrades_to_escape() {
        assert_eq!(decode(b"\x1b[2~"), Key::Esc);
        assert_eq!(decode(b"\x1b[9~"), Key::Esc);
    }

    #[test]
    fn mismatched_terminator_degrades_to_escape() {
        assert_eq!(decode(b"\x1b[5x"), Key::Esc);
    }

    #[test]
    fn unknown_sequences_degrade_to_escape() {
        assert_eq!(decode(b"\x1b[Z"), Key::Esc);
        assert_eq!(decode(b"\x1bOx"), Key::Esc);
        assert_eq!(decode(b"\x1bq"), Key::Esc);
    }

    #[test]
    fn truncated_sequences_degrade_to_escape() {
        assert_eq!(decode(b"\x1b"), Key::Esc);
        assert_eq!(decode(b"\x1b["), Key::Esc);
        assert_eq!(decode(b"\x1b[5"), Key::Esc);
        assert_eq!(decode(b"\x1bO"), Key::Esc);
    }

    #[test]
    fn multibyte_input_decodes_one_rune() {
        assert_eq!(decode("é".as_bytes()), Key::Char('é'));
        assert_eq!(decode("日".as_bytes()), Key::Char('日'));
    }

    #[test]
    fn truncated_multibyte_input_degrades_to_replacement() {
        assert_eq!(decode(&[0xc3]), Key::Char(char::REPLACEMENT_CHARACTER));
        assert_eq!(decode(&[0xff]), Key::Char(char::REPLACEMENT_CHARACTER));
    }
}
