
use crate::address::Address;
use crate::document::Document;
use crate::memory::BinaryStream;
use crate::plugin::{ ArchTag, IArchitecture, Instruction };

// ------------------------------------------------------------------------------------------------
// ArmArchitecture
// ------------------------------------------------------------------------------------------------

/// "arm" as a little-endian byte tag.
pub const ARM_TAG: ArchTag = ArchTag(0x006d_7261);

/// Set when the instruction updates the condition flags (the trailing `s`).
pub const ARM_PREFIX_S: u32 = 0x10;

/// Condition mnemonics indexed by the low four prefix bits; AL and NV render as nothing.
const COND_SUFFIX: [&str; 16] = [
	"eq", "ne", "cs", "cc", "mi", "pl", "vs", "vc",
	"hi", "ls", "ge", "lt", "gt", "le", "", "",
];

pub struct ArmArchitecture;

impl IArchitecture for ArmArchitecture {
	fn name(&self) -> &str {
		"ARM"
	}

	fn tag(&self) -> ArchTag {
		ARM_TAG
	}

	fn format_instruction(&self, _doc: &Document, _stream: &BinaryStream, _addr: &Address,
	insn: &mut Instruction) {
		let mut text = String::from(insn.name());

		text.push_str(COND_SUFFIX[(insn.prefix() & 0xF) as usize]);
		if insn.prefix() & ARM_PREFIX_S != 0 {
			text.push('s');
		}

		insn.update_text(text);
	}
}

// ------------------------------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	fn format(name: &str, prefix: u32) -> String {
		let doc = Document::new();
		let stream = BinaryStream::default();
		let mut insn = Instruction::new(name, prefix);

		ArmArchitecture.format_instruction(&doc, &stream, &Address::flat(0), &mut insn);
		insn.text().into()
	}

	#[test]
	fn condition_suffixes() {
		assert_eq!(format("mov", 0x1 | ARM_PREFIX_S), "movnes");
		assert_eq!(format("mov", 0x0), "moveq");
		assert_eq!(format("b", 0xB), "blt");
		assert_eq!(format("add", 0xE), "add");         // AL: no suffix
		assert_eq!(format("add", 0xE | ARM_PREFIX_S), "adds");
	}
}
