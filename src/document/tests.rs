use super::*;

use crate::address::AddrKind;
use crate::cell::{ CellData, VALUE_HEXADECIMAL };
use crate::memory::{ Access, MappedMemoryArea, VirtualMemoryArea };

/// Three areas: `.text` with two multi-byte cells, `.data` with none, and a virtual `ram`
/// area, with gaps between them.
///
/// Cell starts per area: 12 in `.text` (positions 0-11), 8 in `.data` (12-19), 16 in
/// `ram` (20-35).
fn sample_document() -> Document {
	let doc = Document::new();

	doc.add_memory_area(MappedMemoryArea::new(".text", 0x0, 0x10,
		Address::flat(0x1000), 0x10, Access::READ | Access::EXECUTE).into());
	doc.add_memory_area(MappedMemoryArea::new(".data", 0x10, 0x8,
		Address::flat(0x1020), 0x8, Access::READ | Access::WRITE).into());
	doc.add_memory_area(VirtualMemoryArea::new("ram",
		Address::flat(0x2000), 0x10, Access::READ | Access::WRITE).into());

	let mut deleted = Vec::new();
	assert!(doc.set_cell(Address::flat(0x1000),
		CellData::instruction(4, crate::plugin::ArchTag(1), 0), &mut deleted, false));
	assert!(doc.set_cell(Address::flat(0x1004),
		CellData::instruction(2, crate::plugin::ArchTag(1), 0), &mut deleted, false));
	assert!(deleted.is_empty());

	doc
}

const TOTAL_POSITIONS: u64 = 12 + 8 + 16;

#[test]
fn areas_stay_disjoint() {
	let doc = sample_document();

	// overlapping either end of .text is refused
	assert!(!doc.add_memory_area(MappedMemoryArea::new("bad", 0x0, 0x10,
		Address::flat(0x1008), 0x10, Access::READ).into()));
	assert!(!doc.add_memory_area(MappedMemoryArea::new("bad", 0x0, 0x10,
		Address::flat(0x0FF8), 0x10, Access::READ).into()));

	// flush against .text is fine
	assert!(doc.add_memory_area(MappedMemoryArea::new("ok", 0x0, 0x10,
		Address::flat(0x1010), 0x10, Access::READ).into()));

	let mut names = Vec::new();
	doc.for_each_memory_area(|area| names.push(area.name().to_owned()));
	assert_eq!(names, vec![".text", "ok", ".data", "ram"]);
}

#[test]
fn position_conversions_are_inverse() {
	let doc = sample_document();

	for position in 0 .. TOTAL_POSITIONS {
		let addr = doc.position_to_address(position).unwrap();
		assert_eq!(doc.address_to_position(addr), Some(position), "position {}", position);
	}

	assert_eq!(doc.position_to_address(TOTAL_POSITIONS), None);
	assert_eq!(doc.address_to_position(Address::flat(0x1018)), None); // in the gap
	assert_eq!(doc.address_to_position(Address::flat(0x1001)), None); // covered
}

#[test]
fn navigation_is_position_monotonic() {
	let doc = sample_document();

	let mut cur = Address::flat(0x1000);
	let mut expected = 0;
	assert_eq!(doc.address_to_position(cur), Some(0));

	while let Some(next) = doc.move_address(cur, 1) {
		expected += 1;
		assert_eq!(doc.address_to_position(next), Some(expected), "after {}", cur);
		cur = next;
	}

	// the walk visited every cell start in the document
	assert_eq!(expected, TOTAL_POSITIONS - 1);
}

#[test]
fn moves_cancel_out() {
	let doc = sample_document();
	let start = Address::flat(0x1000);

	for steps in [1i64, 5, 12, 20, 35] {
		let there = doc.move_address(start, steps).unwrap();
		assert_eq!(doc.move_address(there, -steps), Some(start), "steps {}", steps);
	}

	// +20 crosses both gaps and lands on the virtual area's base
	assert_eq!(doc.move_address(start, 20), Some(Address::flat(0x2000)));
	assert_eq!(doc.move_address(start, 36), None);
}

#[test]
fn move_zero_snaps_or_falls_back() {
	let doc = sample_document();

	// inside an area: snap to the covering cell's start
	assert_eq!(doc.move_address(Address::flat(0x1002), 0), Some(Address::flat(0x1000)));
	assert_eq!(doc.move_address(Address::flat(0x1006), 0), Some(Address::flat(0x1006)));

	// in a gap: fall back to one step backward, which needs a containing area and fails
	assert_eq!(doc.move_address(Address::flat(0x1018), 0), None);

	// before the whole document: collapse to its start
	assert_eq!(doc.move_address(Address::flat(0x500), 0), Some(Address::flat(0x1000)));
}

#[test]
fn backward_collapses_at_document_start() {
	let doc = sample_document();

	assert_eq!(doc.move_address(Address::flat(0x1000), -5), Some(Address::flat(0x1000)));
	assert_eq!(doc.move_address(Address::flat(0x1002), -10), Some(Address::flat(0x1000)));

	// stepping back from an area base lands on the previous area's last cell start
	assert_eq!(doc.move_address(Address::flat(0x1020), -1), Some(Address::flat(0x100F)));
	assert_eq!(doc.move_address(Address::flat(0x2000), -1), Some(Address::flat(0x1027)));
}

#[test]
fn cells_resolve_through_areas() {
	let doc = sample_document();
	let mut deleted = Vec::new();

	assert_eq!(doc.cell_at(Address::flat(0x1000)).unwrap().length(), 4);
	assert_eq!(doc.cell_at(Address::flat(0x1001)), None);
	assert_eq!(doc.cell_at(Address::flat(0x1006)), Some(CellData::default()));
	assert_eq!(doc.cell_at(Address::flat(0x1800)), None);

	// no area, no write
	assert!(!doc.set_cell(Address::flat(0x1800), CellData::default(), &mut deleted, true));

	// a forced overwrite reports what it trampled
	assert!(doc.set_cell(Address::flat(0x1002),
		CellData::value(VALUE_HEXADECIMAL, 2), &mut deleted, true));
	assert_eq!(deleted, vec![Address::flat(0x1000)]);
}

#[test]
fn label_registry() {
	let doc = sample_document();
	let a = Address::flat(0x1000);
	let b = Address::flat(0x1004);

	assert!(doc.add_label(a, Label::new("start", Label::CODE | Label::GLOBAL, 1)));
	assert!(doc.add_label(b, Label::new("next", Label::CODE | Label::LOCAL, 1)));

	assert!(!doc.add_label(a, Label::new("other", Label::CODE, 1)));
	assert!(!doc.add_label(Address::flat(0x1006), Label::new("start", Label::CODE, 1)));

	assert_eq!(doc.label_at(a).unwrap().name(), "start");
	assert_eq!(doc.address_of_label("next"), Some(b));

	assert!(doc.remove_label(a));
	assert!(!doc.remove_label(a));
	assert_eq!(doc.address_of_label("start"), None);
}

#[test]
fn label_enumeration_survives_mutation() {
	let doc = sample_document();

	for i in 0 .. 4u64 {
		let name = format!("lbl_{}", i);
		assert!(doc.add_label(Address::flat(0x1000 + i), Label::new(&name, Label::DATA, 1)));
	}

	// the predicate removes every label it visits, including ones not yet visited;
	// the snapshot means every label is still enumerated
	let mut seen = 0;
	doc.for_each_label(|addr, _| {
		seen += 1;
		doc.remove_label(*addr);
		doc.remove_label(Address::flat(0x1003));
	});

	assert_eq!(seen, 4);
	for i in 0 .. 4u64 {
		assert_eq!(doc.label_at(Address::flat(0x1000 + i)), None);
	}
}

#[test]
fn xrefs_through_the_document() {
	let doc = sample_document();
	let a = Address::flat(0x1000);
	let b = Address::flat(0x1004);
	let c = Address::flat(0x1006);

	assert!(doc.add_xref(c, a));
	assert!(doc.add_xref(c, b));
	assert!(!doc.add_xref(a, a)); // a already references c

	assert!(doc.has_xref_sources(c));
	assert_eq!(doc.xref_sources_of(c), Some(vec![a, b]));
	assert_eq!(doc.xref_target_of(a), Some(c));
	assert!(!doc.has_xref_target(c));

	assert!(doc.remove_xref(a));
	assert_eq!(doc.xref_sources_of(c), Some(vec![b]));

	doc.remove_all_xrefs();
	assert!(!doc.has_xref_sources(c));
	assert_eq!(doc.all_xrefs(), vec![]);
}

#[test]
fn multi_cells_keyed_by_address() {
	let doc = sample_document();
	let a = Address::flat(0x1000);

	assert!(doc.add_multi_cell(a, MultiCell::new(MultiCellKind::Function, 0x10)));
	assert_eq!(doc.multi_cell_at(a).unwrap().kind, MultiCellKind::Function);

	// replacing in place is fine
	assert!(doc.add_multi_cell(a, MultiCell::new(MultiCellKind::Array, 0x8)));
	assert_eq!(doc.multi_cell_at(a).unwrap().kind, MultiCellKind::Array);

	assert!(doc.remove_multi_cell(a));
	assert!(!doc.remove_multi_cell(a));
	assert_eq!(doc.multi_cell_at(a), None);
}

#[test]
fn empty_comment_deletes() {
	let doc = sample_document();
	let a = Address::flat(0x1000);

	assert!(doc.set_comment(a, "first pass"));
	assert_eq!(doc.comment_at(a).as_deref(), Some("first pass"));

	assert!(doc.set_comment(a, ""));
	assert_eq!(doc.comment_at(a), None);
	assert!(doc.comments().is_empty());
}

#[test]
fn arch_tag_registry() {
	let doc = sample_document();
	let tag = crate::plugin::ArchTag(0x41);

	assert!(doc.register_arch_tag(tag));
	assert_eq!(doc.arch_tags(), vec![tag]);

	assert!(doc.unregister_arch_tag(tag));
	assert!(doc.arch_tags().is_empty());
}
