
use derive_new::new;
use parse_display::Display;

use crate::address::parse_hex;
use crate::plugin::ArchTag;

// ------------------------------------------------------------------------------------------------
// CellType
// ------------------------------------------------------------------------------------------------

/// What kind of thing a cell is.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy)]
pub enum CellType {
	#[display("instruction")] Instruction,
	#[display("value")]       Value,
	#[display("string")]      String,
	#[display("character")]   Character,
	#[display("unknown")]     Unknown,
}

impl CellType {
	pub fn from_u8(v: u8) -> CellType {
		match v {
			0 => CellType::Instruction,
			1 => CellType::Value,
			2 => CellType::String,
			3 => CellType::Character,
			_ => CellType::Unknown,
		}
	}

	pub fn as_u8(self) -> u8 {
		match self {
			CellType::Instruction => 0,
			CellType::Value       => 1,
			CellType::String      => 2,
			CellType::Character   => 3,
			CellType::Unknown     => 4,
		}
	}
}

/// Sub-types for `CellType::Value` cells: how the value is rendered.
pub const VALUE_BINARY:      u8 = 0;
pub const VALUE_DECIMAL:     u8 = 1;
pub const VALUE_HEXADECIMAL: u8 = 2;
pub const VALUE_OCTAL:       u8 = 3;

// ------------------------------------------------------------------------------------------------
// CellData
// ------------------------------------------------------------------------------------------------

/// The typed unit placed at an offset in a memory area. `length` is how many raw bytes it
/// consumes starting there; offsets it covers past its start host no other cell.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[derive(new)]
pub struct CellData {
	pub ty:           CellType,
	pub sub_type:     u8,
	pub length:       u16,
	pub format_style: u16,
	pub flags:        u8,
	pub arch_tag:     ArchTag,
	pub arch_mode:    u8,
}

impl CellData {
	/// A value cell with the given rendering and length; everything else defaulted.
	pub fn value(sub_type: u8, length: u16) -> Self {
		Self::new(CellType::Value, sub_type, length, 0, 0, ArchTag::UNKNOWN, 0)
	}

	/// An instruction cell of the given length for the given architecture.
	pub fn instruction(length: u16, arch_tag: ArchTag, arch_mode: u8) -> Self {
		Self::new(CellType::Instruction, 0, length, 0, 0, arch_tag, arch_mode)
	}

	#[inline] pub fn length(&self) -> u16 { self.length }

	// ---------------------------------------------------------------------------------------------
	// Text form

	/// Stable one-line form consumed by the database:
	/// `dna(type sub size fmt flags mode arch)`, all hex.
	pub fn dump(&self) -> String {
		format!("dna({:#x} {:#x} {:#x} {:#x} {:#x} {:#x} {:#x})",
			self.ty.as_u8(), self.sub_type, self.length, self.format_style,
			self.flags, self.arch_mode, self.arch_tag.0)
	}

	/// Parses the `dump` form back.
	pub fn parse(s: &str) -> Option<CellData> {
		let body = s.strip_prefix("dna(")?.strip_suffix(')')?;
		let mut fields = body.split_whitespace().map(parse_hex);

		let ty    = fields.next()??;
		let sub   = fields.next()??;
		let size  = fields.next()??;
		let fmt   = fields.next()??;
		let flags = fields.next()??;
		let mode  = fields.next()??;
		let arch  = fields.next()??;

		if fields.next().is_some() || size == 0 || size > u16::MAX as u64 {
			return None;
		}

		Some(CellData::new(
			CellType::from_u8(ty as u8), sub as u8, size as u16,
			fmt as u16, flags as u8, ArchTag(arch as u32), mode as u8))
	}
}

impl Default for CellData {
	/// The synthesised cell for an offset nothing has claimed: one hexadecimal byte.
	fn default() -> Self {
		Self::value(VALUE_HEXADECIMAL, 1)
	}
}

// ------------------------------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn dump_and_parse() {
		let cell = CellData::instruction(4, ArchTag(0x41524d), 1);
		assert_eq!(cell.dump(), "dna(0x0 0x0 0x4 0x0 0x0 0x1 0x41524d)");
		assert_eq!(CellData::parse(&cell.dump()), Some(cell));

		let dflt = CellData::default();
		assert_eq!(dflt.ty, CellType::Value);
		assert_eq!(dflt.sub_type, VALUE_HEXADECIMAL);
		assert_eq!(dflt.length(), 1);
		assert_eq!(CellData::parse(&dflt.dump()), Some(dflt));
	}

	#[test]
	fn parse_rejects_garbage() {
		assert_eq!(CellData::parse("dna(0x1 0x2)"), None);
		assert_eq!(CellData::parse("dna(0x1 0x2 0x0 0x0 0x0 0x0 0x0)"), None); // zero length
		assert_eq!(CellData::parse("lbl(x 0x1 cg- 0x1)"), None);
	}
}
