
use std::collections::HashMap;
use std::fmt::{ Display, Formatter, Result as FmtResult };
use std::sync::{ Arc, Mutex };

use lazy_static::lazy_static;

use crate::address::Address;
use crate::document::Document;
use crate::memory::BinaryStream;

// ------------------------------------------------------------------------------------------------
// Sub-modules
// ------------------------------------------------------------------------------------------------

mod arm;
mod unix;

pub use arm::*;
pub use unix::*;

// ------------------------------------------------------------------------------------------------
// ArchTag
// ------------------------------------------------------------------------------------------------

/// Opaque identifier selecting an architecture plug-in. Cells carry the tag of the
/// architecture that decoded them; the module manager resolves tags back to plug-ins.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct ArchTag(pub u32);

impl ArchTag {
	/// The tag of no architecture at all.
	pub const UNKNOWN: ArchTag = ArchTag(0);
}

impl Display for ArchTag {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{:#x}", self.0)
	}
}

// ------------------------------------------------------------------------------------------------
// Instruction
// ------------------------------------------------------------------------------------------------

/// An already-decoded instruction handed to an architecture for display. The decoder fills
/// in the mnemonic and prefix bits; formatting produces the display text.
#[derive(Debug, Clone)]
pub struct Instruction {
	name:   String,
	prefix: u32,
	text:   String,
}

impl Instruction {
	pub fn new(name: &str, prefix: u32) -> Self {
		Self { name: name.into(), prefix, text: String::new() }
	}

	#[inline] pub fn name  (&self) -> &str { &self.name }
	#[inline] pub fn prefix(&self) -> u32  { self.prefix }
	#[inline] pub fn text  (&self) -> &str { &self.text }

	pub fn update_text(&mut self, text: impl Into<String>) {
		self.text = text.into();
	}
}

// ------------------------------------------------------------------------------------------------
// IArchitecture
// ------------------------------------------------------------------------------------------------

/// What an architecture plug-in must provide to the core: turning one decoded instruction
/// into its display string. Mnemonic suffixes and operand rendering are its business.
pub trait IArchitecture: Sync + Send {
	fn name(&self) -> &str;
	fn tag(&self) -> ArchTag;
	fn format_instruction(&self, doc: &Document, stream: &BinaryStream, addr: &Address,
		insn: &mut Instruction);
}

// ------------------------------------------------------------------------------------------------
// ILoader
// ------------------------------------------------------------------------------------------------

/// What a loader plug-in must provide: recognising a binary and populating a document with
/// its memory areas and initial labels.
pub trait ILoader: Sync + Send {
	fn name(&self) -> String;
	fn is_compatible(&self, stream: &BinaryStream) -> bool;
	fn map(&self, doc: &Document) -> bool;
}

// ------------------------------------------------------------------------------------------------
// IOperatingSystem
// ------------------------------------------------------------------------------------------------

/// Execution contexts an OS personality may prime. Their internals belong to the emulation
/// layer; the core only routes them.
#[derive(Debug, Default)]
pub struct CpuContext;

#[derive(Debug, Default)]
pub struct MemoryContext;

/// What an operating-system personality must provide: optional context initialisation and
/// an acceptance predicate over a (loader, architecture) pair.
pub trait IOperatingSystem: Sync + Send {
	fn name(&self) -> &str;

	fn initialize_cpu_context(&self, _doc: &Document, _ctx: &mut CpuContext) -> bool {
		true
	}

	fn initialize_memory_context(&self, _doc: &Document, _ctx: &mut MemoryContext) -> bool {
		true
	}

	fn is_supported(&self, loader: &dyn ILoader, arch: &dyn IArchitecture) -> bool;
}

// ------------------------------------------------------------------------------------------------
// ModuleManager
// ------------------------------------------------------------------------------------------------

/// Registry of loaded architecture plug-ins, keyed by tag. The database parser asks it
/// whether a tag read from disk is backed by anything.
#[derive(Default)]
pub struct ModuleManager {
	architectures: Mutex<HashMap<ArchTag, Arc<dyn IArchitecture>>>,
}

impl ModuleManager {
	/// Registers an architecture under its tag. Fails if the tag is taken.
	pub fn register_architecture(&self, arch: Arc<dyn IArchitecture>) -> bool {
		let mut archs = self.architectures.lock().unwrap();

		if archs.contains_key(&arch.tag()) {
			return false;
		}

		archs.insert(arch.tag(), arch);
		true
	}

	/// The architecture registered under `tag`, if any.
	pub fn find_architecture(&self, tag: ArchTag) -> Option<Arc<dyn IArchitecture>> {
		self.architectures.lock().unwrap().get(&tag).cloned()
	}
}

lazy_static! {
	static ref MODULE_MANAGER: ModuleManager = ModuleManager::default();
}

/// The process-wide plug-in registry.
pub fn module_manager() -> &'static ModuleManager {
	&MODULE_MANAGER
}
