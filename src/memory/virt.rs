
use crate::address::Address;
use crate::cell::CellData;
use crate::memory::{ Access, IMemoryArea };

// ------------------------------------------------------------------------------------------------
// VirtualMemoryArea
// ------------------------------------------------------------------------------------------------

/// A memory area with no file backing. Every in-range offset reads as the synthesised
/// one-byte cell; cell writes are refused, and navigation degenerates to byte steps.
#[derive(Debug, Clone)]
pub struct VirtualMemoryArea {
	name:         String,
	access:       Access,
	virtual_base: Address,
	virtual_size: u64,
}

impl VirtualMemoryArea {
	pub fn new(name: &str, virtual_base: Address, virtual_size: u64, access: Access) -> Self {
		Self { name: name.into(), access, virtual_base, virtual_size }
	}
}

impl IMemoryArea for VirtualMemoryArea {
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

		Some(CellData::default())
	}

	fn set_cell(&mut self, _offset: u64, _cell: CellData, _deleted: &mut Vec<Address>,
	_force: bool) -> bool {
		false
	}

	fn for_each_cell(&self, _f: &mut dyn FnMut(u64, &CellData)) {}

	// ---------------------------------------------------------------------------------------------
	// Navigation

	fn next_address(&self, addr: &Address) -> Option<Address> {
		let next = addr.offset().checked_add(1)?;

		if !self.contains_offset(next) {
			return None;
		}

		Some(self.make_address(next))
	}

	fn nearest_address(&self, addr: &Address) -> Option<Address> {
		if !self.contains_offset(addr.offset()) {
			return None;
		}

		Some(self.make_address(addr.offset()))
	}

	fn move_address(&self, addr: &Address, disp: i64) -> Option<Address> {
		match disp {
			d if d > 0 => self.move_address_forward(addr, d as u64),
			d if d < 0 => self.move_address_backward(addr, d.unsigned_abs()),
			_          => self.nearest_address(addr),
		}
	}

	fn move_address_forward(&self, addr: &Address, steps: u64) -> Option<Address> {
		let moved = addr.offset().checked_add(steps)?;

		if !self.contains_offset(moved) {
			return None;
		}

		Some(self.make_address(moved))
	}

	fn move_address_backward(&self, addr: &Address, steps: u64) -> Option<Address> {
		let moved = addr.offset().checked_sub(steps)?;

		if !self.contains_offset(moved) {
			return None;
		}

		Some(self.make_address(moved))
	}

	// ---------------------------------------------------------------------------------------------
	// Coordinates

	fn position_count(&self) -> u64 {
		self.virtual_size
	}

	fn offset_to_position(&self, offset: u64) -> Option<u64> {
		if !self.contains_offset(offset) {
			return None;
		}

		Some(offset - self.virtual_base.offset())
	}

	fn position_to_offset(&self, position: u64) -> Option<u64> {
		if position >= self.virtual_size {
			return None;
		}

		Some(self.virtual_base.offset() + position)
	}

	fn offset_to_file_offset(&self, _offset: u64) -> Option<u64> {
		None
	}

	fn dump(&self) -> String {
		format!("ma(v {} {} {:#x} {})",
			self.name, self.virtual_base.dump(), self.virtual_size, self.access)
	}
}
