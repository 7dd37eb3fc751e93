
use std::collections::{ BTreeMap, HashMap };

use crate::address::{ Address, parse_hex };

// ------------------------------------------------------------------------------------------------
// Label
// ------------------------------------------------------------------------------------------------

/// A symbolic name attached to an address. The flags say what the labelled thing is, where
/// the name came from, and whether it was auto-generated.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Label {
	name:    String,
	flags:   u16,
	version: u32,
}

impl Label {
	pub const DATA:     u16 = 0x0001;
	pub const CODE:     u16 = 0x0002;
	pub const FUNCTION: u16 = 0x0004;
	pub const STRING:   u16 = 0x0008;

	pub const IMPORTED: u16 = 0x0010;
	pub const EXPORTED: u16 = 0x0020;
	pub const GLOBAL:   u16 = 0x0040;
	pub const LOCAL:    u16 = 0x0080;

	pub const AUTO_GENERATED: u16 = 0x0100;

	pub fn new(name: &str, flags: u16, version: u32) -> Self {
		Self { name: name.into(), flags, version }
	}

	#[inline] pub fn name   (&self) -> &str { &self.name }
	#[inline] pub fn flags  (&self) -> u16  { self.flags }
	#[inline] pub fn version(&self) -> u32  { self.version }

	pub fn has(&self, flags: u16) -> bool {
		self.flags & flags == flags
	}

	// ---------------------------------------------------------------------------------------------
	// Text form

	/// `lbl(name namelen type version)`: the type is a three-character triplet — what the
	/// label names (`d`/`c`/`f`/`s`), its scope (`i`/`e`/`g`/`l`), and `a` when it was
	/// auto-generated.
	pub fn dump(&self) -> String {
		let what = if self.has(Self::FUNCTION) { 'f' }
			else if self.has(Self::CODE)       { 'c' }
			else if self.has(Self::STRING)     { 's' }
			else if self.has(Self::DATA)       { 'd' }
			else                               { '-' };

		let scope = if self.has(Self::IMPORTED) { 'i' }
			else if self.has(Self::EXPORTED)    { 'e' }
			else if self.has(Self::GLOBAL)      { 'g' }
			else if self.has(Self::LOCAL)       { 'l' }
			else                                { '-' };

		let auto = if self.has(Self::AUTO_GENERATED) { 'a' } else { '-' };

		format!("lbl({} {:#x} {}{}{} {:#x})",
			self.name, self.name.len(), what, scope, auto, self.version)
	}

	/// Parses the `dump` form back. A type triplet of the wrong length is malformed.
	pub fn parse(s: &str) -> Option<Label> {
		let body = s.strip_prefix("lbl(")?.strip_suffix(')')?;
		let mut fields = body.split_whitespace();

		let name    = fields.next()?;
		let _len    = parse_hex(fields.next()?)?;
		let triplet = fields.next()?;
		let version = parse_hex(fields.next()?)?;

		if fields.next().is_some() || triplet.len() != 3 {
			return None;
		}

		let mut flags = 0u16;
		let t = triplet.as_bytes();
		match t[0] {
			b'd' => flags |= Self::DATA,
			b'c' => flags |= Self::CODE,
			b'f' => flags |= Self::FUNCTION,
			b's' => flags |= Self::STRING,
			_    => {}
		}
		match t[1] {
			b'i' => flags |= Self::IMPORTED,
			b'e' => flags |= Self::EXPORTED,
			b'g' => flags |= Self::GLOBAL,
			b'l' => flags |= Self::LOCAL,
			_    => {}
		}
		if t[2] == b'a' {
			flags |= Self::AUTO_GENERATED;
		}

		Some(Label::new(name, flags, version as u32))
	}
}

// ------------------------------------------------------------------------------------------------
// LabelMap
// ------------------------------------------------------------------------------------------------

/// A bidirectional mapping between addresses and labels. Labels are unique by name and an
/// address carries at most one label; an insert that would collide on either side fails
/// without touching the other.
#[derive(Default)]
pub struct LabelMap {
	by_addr: BTreeMap<Address, Label>,
	by_name: HashMap<String, Address>,
}

impl LabelMap {
	pub fn new() -> Self {
		Self::default()
	}

	/// Attaches `label` to `addr`. Fails if the address is already labelled or the name is
	/// already taken.
	pub fn add(&mut self, addr: Address, label: Label) -> bool {
		if self.by_addr.contains_key(&addr) || self.by_name.contains_key(label.name()) {
			return false;
		}

		self.by_name.insert(label.name().into(), addr);
		self.by_addr.insert(addr, label);
		true
	}

	/// Removes the label at `addr`, if any.
	pub fn remove(&mut self, addr: Address) -> bool {
		match self.by_addr.remove(&addr) {
			Some(label) => {
				self.by_name.remove(label.name());
				true
			}
			None => false,
		}
	}

	/// The label at `addr`.
	pub fn label_at(&self, addr: Address) -> Option<&Label> {
		self.by_addr.get(&addr)
	}

	/// The address a name is attached to.
	pub fn address_of(&self, name: &str) -> Option<Address> {
		self.by_name.get(name).copied()
	}

	pub fn len(&self) -> usize {
		self.by_addr.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_addr.is_empty()
	}

	/// All (address, label) pairs in address order.
	pub fn iter(&self) -> impl Iterator<Item = (&Address, &Label)> {
		self.by_addr.iter()
	}

	#[cfg(test)]
	fn check_bijection(&self) {
		assert_eq!(self.by_addr.len(), self.by_name.len());
		for (addr, label) in &self.by_addr {
			assert_eq!(self.by_name.get(label.name()), Some(addr));
		}
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
		let lbl = Label::new("start", Label::CODE | Label::GLOBAL, 1);
		assert_eq!(lbl.dump(), "lbl(start 0x5 cg- 0x1)");
		assert_eq!(Label::parse(&lbl.dump()), Some(lbl));

		let auto = Label::new("loc_1000", Label::DATA | Label::LOCAL | Label::AUTO_GENERATED, 2);
		assert_eq!(auto.dump(), "lbl(loc_1000 0x8 dla 0x2)");
		assert_eq!(Label::parse(&auto.dump()), Some(auto));

		// bad triplet
		assert_eq!(Label::parse("lbl(x 0x1 cgla 0x1)"), None);
		assert_eq!(Label::parse("lbl(x 0x1 cg 0x1)"), None);
	}

	#[test]
	fn both_indexes_agree() {
		let mut map = LabelMap::new();
		let a = Address::flat(0x10);
		let b = Address::flat(0x20);

		assert!(map.add(a, Label::new("one", Label::CODE | Label::GLOBAL, 1)));
		assert!(map.add(b, Label::new("two", Label::DATA | Label::LOCAL, 1)));
		map.check_bijection();

		// collisions on either side leave both indexes untouched
		assert!(!map.add(a, Label::new("three", Label::CODE, 1)));
		assert!(!map.add(Address::flat(0x30), Label::new("one", Label::CODE, 1)));
		map.check_bijection();
		assert_eq!(map.len(), 2);
		assert_eq!(map.address_of("three"), None);

		assert_eq!(map.address_of("one"), Some(a));
		assert_eq!(map.label_at(b).unwrap().name(), "two");

		assert!(map.remove(a));
		assert!(!map.remove(a));
		map.check_bijection();
		assert_eq!(map.address_of("one"), None);

		// the freed name can be reused
		assert!(map.add(Address::flat(0x40), Label::new("one", Label::CODE, 2)));
		map.check_bijection();
	}
}
