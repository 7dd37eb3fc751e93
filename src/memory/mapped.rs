
use std::cmp::min;
use std::collections::BTreeMap;

use crate::address::Address;
use crate::cell::CellData;
use crate::memory::{ Access, IMemoryArea };

// ------------------------------------------------------------------------------------------------
// MappedMemoryArea
// ------------------------------------------------------------------------------------------------

/// A memory area backed by a window of the binary stream. The file window may be shorter
/// than the virtual span; the tail past `file_size` exists virtually but has no file image.
///
/// Cells are kept sparsely, keyed by their (absolute) start offset. An offset with no
/// recorded cell and not covered by a preceding cell's length reads as a one-byte value
/// cell; covered offsets read as absent.
#[derive(Debug, Clone)]
pub struct MappedMemoryArea {
	name:         String,
	access:       Access,
	file_offset:  u64,
	file_size:    u64,
	virtual_base: Address,
	virtual_size: u64,
	cells:        BTreeMap<u64, CellData>,
}

impl MappedMemoryArea {
	pub fn new(name: &str, file_offset: u64, file_size: u64, virtual_base: Address,
	virtual_size: u64, access: Access) -> Self {
		Self {
			name: name.into(),
			access,
			file_offset,
			file_size,
			virtual_base,
			virtual_size,
			cells: BTreeMap::new(),
		}
	}

	#[inline] pub fn file_offset(&self) -> u64 { self.file_offset }
	#[inline] pub fn file_size  (&self) -> u64 { self.file_size }

	/// One past the last offset of the span.
	fn limit(&self) -> u64 {
		self.virtual_base.offset() + self.virtual_size
	}

	/// The recorded cell whose extent covers `offset` from strictly before it, if any.
	fn covering_cell(&self, offset: u64) -> Option<(u64, &CellData)> {
		let (&start, cell) = self.cells.range(.. offset).next_back()?;

		if offset < start + cell.length() as u64 {
			Some((start, cell))
		} else {
			None
		}
	}

	#[cfg(debug_assertions)]
	fn check_invariants(&self) {
		// INVARIANT: cell extents are pairwise disjoint
		let mut prev_end = 0u64;
		for (&start, cell) in &self.cells {
			assert!(start >= prev_end, "overlapping cell at {:#x}", start);
			prev_end = start + cell.length() as u64;
		}
	}
}

impl IMemoryArea for MappedMemoryArea {
	fn name(&self) -> &str {
		&self.name
	}

	fn access(&self) -> Access {
		self.access
	}

	fn size(&self) -> u64 {
		self.virtual_size
	}

	fn base_address(&self) -> Address {
		self.virtual_base
	}

	fn make_address(&self, offset: u64) -> Address {
		let mut addr = self.virtual_base;
		addr.set_offset(offset);
		addr
	}

	fn contains_offset(&self, offset: u64) -> bool {
		self.virtual_base.is_between(self.virtual_size, offset)
	}

	fn cell_at(&self, offset: u64) -> Option<CellData> {
		if !self.contains_offset(offset) {
			return None;
		}

		if let Some(cell) = self.cells.get(&offset) {
			return Some(*cell);
		}

		if self.covering_cell(offset).is_some() {
			return None;
		}

		Some(CellData::default())
	}

	fn set_cell(&mut self, offset: u64, cell: CellData, deleted: &mut Vec<Address>, force: bool)
	-> bool {
		if !self.contains_offset(offset) {
			return false;
		}

		let new_end = match offset.checked_add(cell.length() as u64) {
			Some(end) => end,
			None      => return false,
		};

		// every recorded start the new extent tramples, except a same-start redefinition
		let mut overlapped: Vec<u64> = Vec::new();

		if let Some((start, _)) = self.covering_cell(offset) {
			overlapped.push(start);
		}

		overlapped.extend(
			self.cells.range(offset .. new_end)
				.map(|(&start, _)| start)
				.filter(|&start| start != offset));

		if !overlapped.is_empty() && !force {
			return false;
		}

		for start in overlapped {
			self.cells.remove(&start);
			deleted.push(self.make_address(start));
		}

		self.cells.insert(offset, cell);

		#[cfg(debug_assertions)]
		self.check_invariants();

		true
	}

	fn for_each_cell(&self, f: &mut dyn FnMut(u64, &CellData)) {
		let base = self.virtual_base.offset();

		for (&start, cell) in &self.cells {
			f(start - base, cell);
		}
	}

	// ---------------------------------------------------------------------------------------------
	// Navigation

	fn next_address(&self, addr: &Address) -> Option<Address> {
		let base = self.virtual_base.offset();
		let mut next = std::cmp::max(addr.offset().checked_add(1)?, base);

		if let Some((start, cell)) = self.covering_cell(next) {
			next = start + cell.length() as u64;
		}

		if next < self.limit() {
			Some(self.make_address(next))
		} else {
			None
		}
	}

	fn nearest_address(&self, addr: &Address) -> Option<Address> {
		if self.virtual_size == 0 {
			return None;
		}

		let mut offset = addr.offset();

		if offset < self.virtual_base.offset() {
			return Some(self.virtual_base);
		}
		if offset >= self.limit() {
			offset = self.limit() - 1;
		}

		match self.covering_cell(offset) {
			Some((start, _)) => Some(self.make_address(start)),
			None             => Some(self.make_address(offset)),
		}
	}

	fn move_address(&self, addr: &Address, disp: i64) -> Option<Address> {
		match disp {
			d if d > 0 => self.move_address_forward(addr, d as u64),
			d if d < 0 => self.move_address_backward(addr, d.unsigned_abs()),
			_          => Some(*addr),
		}
	}

	fn move_address_forward(&self, addr: &Address, steps: u64) -> Option<Address> {
		let mut offset = addr.offset();

		for _ in 0 .. steps {
			let stride = match self.cell_at(offset) {
				Some(cell) => cell.length() as u64,
				None       => 1, // covered byte: creep to the next cell boundary
			};

			offset = offset.checked_add(stride)?;

			if !self.contains_offset(offset) {
				return None;
			}
		}

		Some(self.make_address(offset))
	}

	fn move_address_backward(&self, addr: &Address, steps: u64) -> Option<Address> {
		let base = self.virtual_base.offset();
		let mut offset = addr.offset();

		for _ in 0 .. steps {
			if offset <= base {
				return None;
			}

			let candidate = offset - 1;

			// a hole is one step; a covered byte snaps to its cell's start for one step
			offset = match self.cells.range(..= candidate).next_back() {
				Some((&start, cell)) if start + cell.length() as u64 > candidate => start,
				_ => candidate,
			};
		}

		Some(self.make_address(offset))
	}

	// ---------------------------------------------------------------------------------------------
	// Coordinates

	fn position_count(&self) -> u64 {
		let limit = self.limit();
		let mut count = self.virtual_size;

		for (&start, cell) in &self.cells {
			let end = min(start + cell.length() as u64, limit);
			if end > start + 1 {
				count -= end - start - 1;
			}
		}

		count
	}

	fn offset_to_position(&self, offset: u64) -> Option<u64> {
		if !self.contains_offset(offset) || self.covering_cell(offset).is_some() {
			return None;
		}

		let mut position = offset - self.virtual_base.offset();

		for (&start, cell) in self.cells.range(.. offset) {
			let end = min(start + cell.length() as u64, offset);
			if end > start + 1 {
				position -= end - start - 1;
			}
		}

		Some(position)
	}

	fn position_to_offset(&self, position: u64) -> Option<u64> {
		let base  = self.virtual_base.offset();
		let limit = self.limit();

		let mut offset = base;
		let mut position = position;

		for (&start, cell) in self.cells.range(base .. limit) {
			debug_assert!(start >= offset);

			if start > offset {
				let holes = start - offset;
				if position < holes {
					return Some(offset + position);
				}
				position -= holes;
				offset = start;
			}

			if position == 0 {
				return Some(offset);
			}
			position -= 1;
			offset = start + cell.length() as u64;
		}

		let remaining = limit.saturating_sub(offset);
		if position < remaining {
			Some(offset + position)
		} else {
			None
		}
	}

	fn offset_to_file_offset(&self, offset: u64) -> Option<u64> {
		if !self.virtual_base.is_between(self.file_size, offset) {
			return None;
		}

		Some(offset - self.virtual_base.offset() + self.file_offset)
	}

	fn dump(&self) -> String {
		format!("ma(m {} {:#x} {:#x} {} {:#x} {})",
			self.name, self.file_offset, self.file_size, self.virtual_base.dump(),
			self.virtual_size, self.access)
	}
}
