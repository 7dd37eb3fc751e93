
use derive_new::new;

use std::collections::{
	BTreeMap,
	BTreeSet,

	btree_map::Iter as BTreeIter,
};

use crate::address::Address;

// ------------------------------------------------------------------------------------------------
// XRefMap
// ------------------------------------------------------------------------------------------------

pub type SourceSet = BTreeSet<Address>;

/// The cross-reference graph: directed edges from a referencing address to the address it
/// refers to. An address has at most one outgoing edge; a referred-to address can have any
/// number of sources, indexed for reverse lookup.
#[derive(Default)]
#[derive(new)]
pub struct XRefMap {
	/// to -> every from that references it.
	#[new(value = "BTreeMap::new()")]
	sources: BTreeMap<Address, SourceSet>,
	/// from -> its unique to.
	#[new(value = "BTreeMap::new()")]
	targets: BTreeMap<Address, Address>,
}

impl XRefMap {
	/// Adds an edge `from -> to`. Fails if `from` already has an outgoing edge.
	pub fn add(&mut self, to: Address, from: Address) -> bool {
		if self.targets.contains_key(&from) {
			return false;
		}

		self.targets.insert(from, to);
		self.sources.entry(to).or_default().insert(from);
		true
	}

	/// Removes the outgoing edge of `from`, if any.
	pub fn remove(&mut self, from: Address) -> bool {
		let to = match self.targets.remove(&from) {
			Some(to) => to,
			None     => return false,
		};

		let set = self.sources.get_mut(&to).expect("target without source index");
		assert!(set.remove(&from));
		if set.is_empty() {
			self.sources.remove(&to);
		}
		true
	}

	/// Drops every edge.
	pub fn erase_all(&mut self) {
		self.sources.clear();
		self.targets.clear();
	}

	/// Whether anything references `to`.
	pub fn has_sources(&self, to: Address) -> bool {
		self.sources.contains_key(&to)
	}

	/// Everything that references `to`, or None if nothing does.
	pub fn sources_of(&self, to: Address) -> Option<&SourceSet> {
		self.sources.get(&to)
	}

	/// Whether `from` references anything.
	pub fn has_target(&self, from: Address) -> bool {
		self.targets.contains_key(&from)
	}

	/// What `from` references, or None if it references nothing.
	pub fn target_of(&self, from: Address) -> Option<Address> {
		self.targets.get(&from).copied()
	}

	/// All (to, sources) pairs in target order.
	pub fn all_sources(&self) -> BTreeIter<'_, Address, SourceSet> {
		self.sources.iter()
	}
}

// ------------------------------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use std::iter::FromIterator;

	#[test]
	fn basic() {
		let mut xrefs = XRefMap::new();
		let a = Address::flat(0x00);
		let b = Address::flat(0x10);
		let c = Address::flat(0x20);
		let d = Address::flat(0x30);

		// many sources, one target each
		assert!(xrefs.add(d, a));
		assert!(xrefs.add(d, b));
		assert!(xrefs.add(c, c)); // self-reference

		// the out-edge is unique
		assert!(!xrefs.add(c, a));

		assert_eq!(xrefs.sources_of(d), Some(&SourceSet::from_iter(vec![a, b])));
		assert_eq!(xrefs.target_of(a), Some(d));
		assert_eq!(xrefs.target_of(b), Some(d));
		assert_eq!(xrefs.target_of(d), None);
		assert!(xrefs.has_sources(c));
		assert!(!xrefs.has_sources(a));

		// removing one source leaves the rest
		assert!(xrefs.remove(a));
		assert!(!xrefs.remove(a));
		assert_eq!(xrefs.sources_of(d), Some(&SourceSet::from_iter(vec![b])));

		// removing the last source drops the reverse entry
		assert!(xrefs.remove(b));
		assert_eq!(xrefs.sources_of(d), None);
		assert!(!xrefs.has_sources(d));

		xrefs.erase_all();
		assert!(!xrefs.has_target(c));
		assert_eq!(xrefs.all_sources().count(), 0);
	}
}
