
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Mutex;

use crate::address::Address;
use crate::cell::CellData;
use crate::memory::{ BinaryStream, IMemoryArea, MemoryArea };
use crate::plugin::ArchTag;

// ------------------------------------------------------------------------------------------------
// Sub-modules
// ------------------------------------------------------------------------------------------------

mod label;
mod multicell;
mod xref;

#[cfg(test)]
mod tests;

pub use label::*;
pub use multicell::*;
pub use xref::*;

// ------------------------------------------------------------------------------------------------
// Document
// ------------------------------------------------------------------------------------------------

/// The analysis state of one binary: its memory areas layered over the binary stream, plus
/// everything analysis and the user pile on top — labels, cross-references, multi-cells,
/// comments, and the set of architectures in play.
///
/// The document is shared between threads. Each concern has its own mutex; queries copy
/// their results out, and no lock is held across a caller-supplied predicate. When two
/// domains must be taken together, the order is areas, then labels, then xrefs.
#[derive(Default)]
pub struct Document {
	/// Memory areas, the stream behind them, multi-cells, and comments share one lock:
	/// a flush walks them as a unit.
	core:       Mutex<DocumentCore>,
	labels:     Mutex<LabelMap>,
	/// Serialises `for_each_label` so label enumeration survives predicates that mutate
	/// the registry.
	label_enum: Mutex<()>,
	xrefs:      Mutex<XRefMap>,
	arch_tags:  Mutex<Vec<ArchTag>>,
}

#[derive(Default)]
struct DocumentCore {
	stream:      BinaryStream,
	areas:       BTreeMap<Address, MemoryArea>,
	multi_cells: BTreeMap<Address, MultiCell>,
	comments:    BTreeMap<Address, String>,
}

impl DocumentCore {
	/// The unique area whose span contains `addr` (areas are disjoint).
	fn area_containing(&self, addr: Address) -> Option<&MemoryArea> {
		let (_, area) = self.areas.range(..= addr).next_back()?;

		if area.contains_offset(addr.offset()) {
			Some(area)
		} else {
			None
		}
	}

	fn area_containing_mut(&mut self, addr: Address) -> Option<&mut MemoryArea> {
		let (_, area) = self.areas.range_mut(..= addr).next_back()?;

		if area.contains_offset(addr.offset()) {
			Some(area)
		} else {
			None
		}
	}

	/// The area ordered after the one based at `base`, if any.
	fn area_after(&self, base: Address) -> Option<&MemoryArea> {
		self.areas.range((Bound::Excluded(base), Bound::Unbounded)).next().map(|(_, a)| a)
	}

	/// The area ordered before the one based at `base`, if any.
	fn area_before(&self, base: Address) -> Option<&MemoryArea> {
		self.areas.range(.. base).next_back().map(|(_, a)| a)
	}
}

impl Document {
	pub fn new() -> Self {
		Self::default()
	}

	// ---------------------------------------------------------------------------------------------
	// Binary stream

	pub fn set_binary_stream(&self, stream: BinaryStream) {
		self.core.lock().unwrap().stream = stream;
	}

	pub fn with_binary_stream<R>(&self, f: impl FnOnce(&BinaryStream) -> R) -> R {
		f(&self.core.lock().unwrap().stream)
	}

	// ---------------------------------------------------------------------------------------------
	// Memory areas

	/// Adds an area. Fails if its span overlaps an existing area's.
	pub fn add_memory_area(&self, area: MemoryArea) -> bool {
		let base = area.base_address();
		let core = &mut *self.core.lock().unwrap();

		if let Some(prev) = core.areas.range(..= base).next_back().map(|(_, a)| a) {
			if prev.base_address().offset() + prev.size() > base.offset() {
				return false;
			}
		}
		if let Some(next) = core.area_after(base) {
			if base.offset() + area.size() > next.base_address().offset() {
				return false;
			}
		}

		core.areas.insert(base, area);
		true
	}

	/// Calls `f` on a copy of every area, in base-address order. The copy is taken in one
	/// locked window so the predicate sees a consistent snapshot without holding the lock.
	pub fn for_each_memory_area(&self, mut f: impl FnMut(&MemoryArea)) {
		let snapshot: Vec<MemoryArea> =
			self.core.lock().unwrap().areas.values().cloned().collect();

		for area in &snapshot {
			f(area);
		}
	}

	/// Borrows the area containing `addr` for the duration of one call.
	pub fn with_memory_area_at<R>(&self, addr: Address, f: impl FnOnce(&MemoryArea) -> R)
	-> Option<R> {
		let core = self.core.lock().unwrap();
		core.area_containing(addr).map(f)
	}

	// ---------------------------------------------------------------------------------------------
	// Cells

	/// The cell at `addr`, resolved through its containing area.
	pub fn cell_at(&self, addr: Address) -> Option<CellData> {
		let core = self.core.lock().unwrap();
		core.area_containing(addr)?.cell_at(addr.offset())
	}

	/// Places a cell at `addr`. Overwritten cell starts are appended to `deleted`; see
	/// `IMemoryArea::set_cell` for the overlap rules.
	pub fn set_cell(&self, addr: Address, cell: CellData, deleted: &mut Vec<Address>,
	force: bool) -> bool {
		let core = &mut *self.core.lock().unwrap();

		match core.area_containing_mut(addr) {
			Some(area) => area.set_cell(addr.offset(), cell, deleted, force),
			None       => false,
		}
	}

	// ---------------------------------------------------------------------------------------------
	// Coordinates

	/// The ordinal of `addr` among all cell starts, in area order.
	pub fn address_to_position(&self, addr: Address) -> Option<u64> {
		let core = self.core.lock().unwrap();
		let mut position = 0u64;

		for area in core.areas.values() {
			if area.contains_offset(addr.offset()) {
				return area.offset_to_position(addr.offset()).map(|p| position + p);
			}
			position += area.position_count();
		}

		None
	}

	/// Inverse of `address_to_position`.
	pub fn position_to_address(&self, position: u64) -> Option<Address> {
		let core = self.core.lock().unwrap();
		let mut position = position;

		for area in core.areas.values() {
			let count = area.position_count();
			if position < count {
				return area.position_to_offset(position).map(|o| area.make_address(o));
			}
			position -= count;
		}

		None
	}

	// ---------------------------------------------------------------------------------------------
	// Navigation

	/// Moves `addr` by `disp` cell-steps, carrying across area boundaries. A displacement
	/// of zero snaps to the nearest cell start, or steps back once when `addr` is in no
	/// area at all.
	pub fn move_address(&self, addr: Address, disp: i64) -> Option<Address> {
		let core = self.core.lock().unwrap();

		match disp {
			d if d > 0 => Self::move_forward(&core, addr, d as u64),
			d if d < 0 => Self::move_backward(&core, addr, d.unsigned_abs()),
			_ => match core.area_containing(addr) {
				Some(area) => area.nearest_address(&addr),
				None       => Self::move_backward(&core, addr, 1),
			},
		}
	}

	fn move_forward(core: &DocumentCore, addr: Address, steps: u64) -> Option<Address> {
		let mut cur = addr;

		for _ in 0 .. steps {
			let area = core.area_containing(cur)?;

			cur = match area.move_address_forward(&cur, 1) {
				Some(moved) => moved,
				// off the end of this area: the next cell is the next area's base
				None => core.area_after(area.base_address())?.base_address(),
			};
		}

		Some(cur)
	}

	fn move_backward(core: &DocumentCore, addr: Address, steps: u64) -> Option<Address> {
		let first_base = core.areas.values().next()?.base_address();

		if addr <= first_base {
			return Some(first_base);
		}

		let mut area = core.area_containing(addr)?;
		let mut cur = addr;

		for _ in 0 .. steps {
			cur = match area.move_address_backward(&cur, 1) {
				Some(moved) => moved,
				None => match core.area_before(area.base_address()) {
					// land on the previous area's last cell start
					Some(prev) => {
						area = prev;
						let tail = prev.base_address() + (prev.size() - 1);
						prev.nearest_address(&tail)?
					}
					// ran out of document: collapse to its start
					None => return Some(first_base),
				},
			};
		}

		Some(cur)
	}

	// ---------------------------------------------------------------------------------------------
	// Labels

	/// Attaches a label. Fails if the address is already labelled or the name is taken.
	pub fn add_label(&self, addr: Address, label: Label) -> bool {
		self.labels.lock().unwrap().add(addr, label)
	}

	/// Removes the label at `addr`.
	pub fn remove_label(&self, addr: Address) -> bool {
		self.labels.lock().unwrap().remove(addr)
	}

	pub fn label_at(&self, addr: Address) -> Option<Label> {
		self.labels.lock().unwrap().label_at(addr).cloned()
	}

	pub fn address_of_label(&self, name: &str) -> Option<Address> {
		self.labels.lock().unwrap().address_of(name)
	}

	/// Calls `f` for every label in address order. The full set is snapshotted up front,
	/// so the predicate is free to add or remove labels; concurrent enumerations are
	/// serialised on their own lock.
	pub fn for_each_label(&self, mut f: impl FnMut(&Address, &Label)) {
		let _enumerating = self.label_enum.lock().unwrap();

		let snapshot: Vec<(Address, Label)> = {
			let labels = self.labels.lock().unwrap();
			labels.iter().map(|(addr, label)| (*addr, label.clone())).collect()
		};

		for (addr, label) in &snapshot {
			f(addr, label);
		}
	}

	// ---------------------------------------------------------------------------------------------
	// Cross-references

	/// Records that `from` references `to`. Fails if `from` already references something.
	pub fn add_xref(&self, to: Address, from: Address) -> bool {
		self.xrefs.lock().unwrap().add(to, from)
	}

	/// Forgets what `from` references.
	pub fn remove_xref(&self, from: Address) -> bool {
		self.xrefs.lock().unwrap().remove(from)
	}

	/// Drops the whole graph.
	pub fn remove_all_xrefs(&self) {
		self.xrefs.lock().unwrap().erase_all();
	}

	pub fn has_xref_sources(&self, to: Address) -> bool {
		self.xrefs.lock().unwrap().has_sources(to)
	}

	pub fn xref_sources_of(&self, to: Address) -> Option<Vec<Address>> {
		self.xrefs.lock().unwrap().sources_of(to).map(|set| set.iter().copied().collect())
	}

	pub fn has_xref_target(&self, from: Address) -> bool {
		self.xrefs.lock().unwrap().has_target(from)
	}

	pub fn xref_target_of(&self, from: Address) -> Option<Address> {
		self.xrefs.lock().unwrap().target_of(from)
	}

	/// Every (to, sources) pair, copied out in target order.
	pub fn all_xrefs(&self) -> Vec<(Address, Vec<Address>)> {
		self.xrefs.lock().unwrap()
			.all_sources()
			.map(|(to, sources)| (*to, sources.iter().copied().collect()))
			.collect()
	}

	// ---------------------------------------------------------------------------------------------
	// Multi-cells

	/// Anchors a multi-cell at `addr`, replacing any previous one there.
	pub fn add_multi_cell(&self, addr: Address, multi_cell: MultiCell) -> bool {
		self.core.lock().unwrap().multi_cells.insert(addr, multi_cell);
		true
	}

	pub fn remove_multi_cell(&self, addr: Address) -> bool {
		self.core.lock().unwrap().multi_cells.remove(&addr).is_some()
	}

	pub fn multi_cell_at(&self, addr: Address) -> Option<MultiCell> {
		self.core.lock().unwrap().multi_cells.get(&addr).copied()
	}

	/// Every (address, multi-cell) pair, copied out in address order.
	pub fn multi_cells(&self) -> Vec<(Address, MultiCell)> {
		self.core.lock().unwrap().multi_cells.iter().map(|(a, mc)| (*a, *mc)).collect()
	}

	// ---------------------------------------------------------------------------------------------
	// Comments

	/// Attaches a comment to `addr`. The empty string removes any existing comment.
	pub fn set_comment(&self, addr: Address, comment: &str) -> bool {
		let core = &mut *self.core.lock().unwrap();

		if comment.is_empty() {
			core.comments.remove(&addr);
		} else {
			core.comments.insert(addr, comment.into());
		}
		true
	}

	pub fn comment_at(&self, addr: Address) -> Option<String> {
		self.core.lock().unwrap().comments.get(&addr).cloned()
	}

	/// Every (address, comment) pair, copied out in address order.
	pub fn comments(&self) -> Vec<(Address, String)> {
		self.core.lock().unwrap().comments.iter().map(|(a, c)| (*a, c.clone())).collect()
	}

	// ---------------------------------------------------------------------------------------------
	// Architecture tags

	pub fn register_arch_tag(&self, tag: ArchTag) -> bool {
		self.arch_tags.lock().unwrap().push(tag);
		true
	}

	pub fn unregister_arch_tag(&self, tag: ArchTag) -> bool {
		self.arch_tags.lock().unwrap().retain(|t| *t != tag);
		true
	}

	pub fn arch_tags(&self) -> Vec<ArchTag> {
		self.arch_tags.lock().unwrap().clone()
	}
}
