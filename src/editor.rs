use std::io;
use std::io::{IsTerminal, Read, Write};

use nix::sys::termios::{self, LocalFlags, SetArg, SpecialCharacterIndices, Termios};

const TAB: u8 = 0x09;
const EOT: u8 = 0x04;
const BS: u8 = 0x08;
const DEL: u8 = 0x7f;
const ESC: u8 = 0x1b;
/// Appended on tab; the parser reads it back as a completion request.
pub const COMPLETION_MARKER: u8 = b'?';

/// Non-canonical, no-echo terminal mode. The saved mode is restored on drop.
pub struct RawMode {
	saved: Termios,
}

impl RawMode {
	pub fn enable() -> nix::Result<RawMode> {
		let saved = termios::tcgetattr(io::stdin())?;
		let mut raw = saved.clone();
		raw.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO);
		raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
		raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
		termios::tcsetattr(io::stdin(), SetArg::TCSANOW, &raw)?;
		Ok(RawMode { saved: saved })
	}
}

impl Drop for RawMode {
	fn drop(&mut self) {
		if let Err(e) = termios::tcsetattr(io::stdin(), SetArg::TCSANOW, &self.saved) {
			log::warn!("failed to restore terminal mode: {}", e);
		}
	}
}

#[derive(Debug, PartialEq, Eq)]
pub enum Input {
	Line(String),
	/// Ctrl-D or end of input; carries no text.
	Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escape { Idle, Start, Bracket }

pub struct LineEditor {
	last_line: Option<String>,
	seed: Option<String>,
	capacity: usize,
}

impl LineEditor {
	pub fn new(capacity: usize) -> LineEditor {
		LineEditor { last_line: None, seed: None, capacity: capacity }
	}

	/// The line recalled by cursor-up.
	#[cfg(test)]
	pub fn last_line(&self) -> Option<&str> {
		self.last_line.as_deref()
	}

	/// Pre-fills the next read with `text`.
	pub fn seed(&mut self, text: String) {
		self.seed = Some(text);
	}

	/// Reads one line from the controlling terminal, writing `prompt` first.
	/// Terminal-mode failures are returned to the caller, who should give up.
	pub fn read_line(&mut self, prompt: &str) -> nix::Result<Input> {
		let stdin = io::stdin();
		let interactive = stdin.is_terminal();
		let _raw = if interactive { Some(RawMode::enable()?) } else { None };
		let mut stdout = io::stdout();
		let r = if interactive {
			if let Err(e) = stdout.write_all(prompt.as_bytes()) {
				log::debug!("prompt write failed: {}", e);
			}
			self.edit(stdin.lock(), &mut stdout)
		} else {
			self.edit(stdin.lock(), &mut io::sink())
		};
		// Unreadable input behaves like end of input.
		Ok(r.unwrap_or_else(|e| {
			log::debug!("read failed: {}", e);
			Input::Eof
		}))
	}

	fn erase_visual<W: Write>(out: &mut W, count: usize) -> io::Result<()> {
		for _ in 0 .. count {
			out.write_all(&[BS, b' ', BS])?;
		}
		Ok(())
	}

	fn pop_char(buf: &mut Vec<u8>) {
		while let Some(c) = buf.pop() {
			// stop once a UTF-8 lead byte (or ASCII) is removed
			if c & 0xc0 != 0x80 { break; }
		}
	}

	fn char_count(buf: &[u8]) -> usize {
		String::from_utf8_lossy(buf).chars().count()
	}

	fn recall<W: Write>(&self, buf: &mut Vec<u8>, out: &mut W) -> io::Result<()> {
		LineEditor::erase_visual(out, LineEditor::char_count(buf))?;
		buf.clear();
		if let Some(ref line) = self.last_line {
			buf.extend_from_slice(line.as_bytes());
			out.write_all(line.as_bytes())?;
		}
		Ok(())
	}

	fn accept(&mut self, buf: &[u8], remember: bool) -> Input {
		let line = String::from_utf8_lossy(buf).into_owned();
		if remember {
			self.last_line = Some(line.clone());
		}
		Input::Line(line)
	}

	/// The key-handling core, independent of any terminal.
	pub fn edit<R: Read, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<Input> {
		let mut buf: Vec<u8> = vec![];
		if let Some(seed) = self.seed.take() {
			buf.extend_from_slice(seed.as_bytes());
			buf.truncate(self.capacity);
			out.write_all(&buf)?;
		}
		out.flush()?;

		let mut escape = Escape::Idle;
		for byte in input.bytes() {
			let c = byte?;
			match (escape, c) {
				(Escape::Start, b'[') => {
					escape = Escape::Bracket;
					continue;
				},
				(Escape::Bracket, b'A') => {
					escape = Escape::Idle;
					self.recall(&mut buf, out)?;
					out.flush()?;
					continue;
				},
				(Escape::Bracket, _) => {
					escape = Escape::Idle;
					continue;
				},
				(Escape::Start, _) => escape = Escape::Idle,
				(Escape::Idle, _) => {},
			}

			match c {
				ESC => escape = Escape::Start,
				EOT => return Ok(Input::Eof),
				TAB => {
					buf.push(COMPLETION_MARKER);
					out.write_all(b"\n")?;
					out.flush()?;
					return Ok(self.accept(&buf, false));
				},
				b'\n' | b'\r' => {
					out.write_all(b"\n")?;
					out.flush()?;
					return Ok(self.accept(&buf, true));
				},
				BS | DEL => if !buf.is_empty() {
					LineEditor::pop_char(&mut buf);
					LineEditor::erase_visual(out, 1)?;
				},
				c if c < 0x20 => {},
				c => {
					buf.push(c);
					out.write_all(&[c])?;
					if buf.len() >= self.capacity {
						out.write_all(b"\n")?;
						out.flush()?;
						return Ok(self.accept(&buf, true));
					}
				},
			}
			out.flush()?;
		}

		if buf.is_empty() {
			Ok(Input::Eof)
		} else {
			Ok(self.accept(&buf, true))
		}
	}
}
