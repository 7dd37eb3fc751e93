
use crate::plugin::{ IArchitecture, ILoader, IOperatingSystem };

// ------------------------------------------------------------------------------------------------
// UnixOperatingSystem
// ------------------------------------------------------------------------------------------------

/// The UNIX personality: content to run anything an ELF loader recognises.
pub struct UnixOperatingSystem;

impl IOperatingSystem for UnixOperatingSystem {
	fn name(&self) -> &str {
		// TODO: report the flavor (linux, *BSD, ...) once loaders expose it
		"UNIX"
	}

	fn is_supported(&self, loader: &dyn ILoader, _arch: &dyn IArchitecture) -> bool {
		loader.name().starts_with("ELF")
	}
}

// ------------------------------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use crate::document::Document;
	use crate::memory::BinaryStream;
	use crate::plugin::{ ArmArchitecture, CpuContext, MemoryContext };

	struct FakeLoader(&'static str);

	impl ILoader for FakeLoader {
		fn name(&self) -> String {
			self.0.into()
		}

		fn is_compatible(&self, _stream: &BinaryStream) -> bool {
			true
		}

		fn map(&self, _doc: &Document) -> bool {
			true
		}
	}

	#[test]
	fn accepts_elf_loaders_only() {
		let os = UnixOperatingSystem;

		assert!(os.is_supported(&FakeLoader("ELF (64-bit)"), &ArmArchitecture));
		assert!(!os.is_supported(&FakeLoader("PE"), &ArmArchitecture));
	}

	#[test]
	fn context_initialisation_accepts_everything() {
		let os = UnixOperatingSystem;
		let doc = Document::new();

		assert!(os.initialize_cpu_context(&doc, &mut CpuContext::default()));
		assert!(os.initialize_memory_context(&doc, &mut MemoryContext::default()));
	}
}
