
use derive_new::new;
use parse_display::Display;

use crate::address::parse_hex;

// ------------------------------------------------------------------------------------------------
// MultiCellKind
// ------------------------------------------------------------------------------------------------

/// What a group of cells forms.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy)]
pub enum MultiCellKind {
	#[display("function")] Function,
	#[display("struct")]   Struct,
	#[display("array")]    Array,
	#[display("unknown")]  Unknown,
}

impl MultiCellKind {
	fn as_char(self) -> char {
		match self {
			MultiCellKind::Function => 'f',
			MultiCellKind::Struct   => 's',
			MultiCellKind::Array    => 'a',
			MultiCellKind::Unknown  => 'u',
		}
	}

	fn from_char(c: char) -> MultiCellKind {
		match c {
			'f' => MultiCellKind::Function,
			's' => MultiCellKind::Struct,
			'a' => MultiCellKind::Array,
			_   => MultiCellKind::Unknown,
		}
	}
}

// ------------------------------------------------------------------------------------------------
// MultiCell
// ------------------------------------------------------------------------------------------------

/// A higher-level grouping spanning multiple cells (a function, structure, or array)
/// anchored at an address.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[derive(new)]
pub struct MultiCell {
	pub kind: MultiCellKind,
	pub size: u16,
}

impl MultiCell {
	/// `mc(kind size)`, the kind as its single-character tag.
	pub fn dump(&self) -> String {
		format!("mc({} {:#x})", self.kind.as_char(), self.size)
	}

	/// Parses the `dump` form back. Unrecognised kind characters read as `Unknown`.
	pub fn parse(s: &str) -> Option<MultiCell> {
		let body = s.strip_prefix("mc(")?.strip_suffix(')')?;
		let mut fields = body.split_whitespace();

		let kind = fields.next()?;
		let size = parse_hex(fields.next()?)?;

		if fields.next().is_some() || kind.len() != 1 || size > u16::MAX as u64 {
			return None;
		}

		Some(MultiCell::new(
			MultiCellKind::from_char(kind.chars().next()?), size as u16))
	}
}

// ------------------------------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------------------------------
