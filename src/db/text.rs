
use std::fs::{ self, File };
use std::io::{ BufRead, BufReader };
use std::path::{ Path, PathBuf };

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{ error, warn };

use crate::address::{ Address, parse_hex };
use crate::cell::CellData;
use crate::db::IDatabase;
use crate::document::{ Document, Label, MultiCell };
use crate::memory::{
	Access, BinaryStream, IMemoryArea, MappedMemoryArea, MemoryArea, VirtualMemoryArea,
};
use crate::plugin::{ module_manager, ArchTag };

// ------------------------------------------------------------------------------------------------
// TextDatabase
// ------------------------------------------------------------------------------------------------

const MAGIC: &str = "# Medusa Text Database";

/// The line-oriented `.mdt` back-end. One UTF-8 file, `\n`-terminated lines, `## `-headed
/// sections, opaque bytes as base64. Parsing is a state machine keyed on the last section
/// header seen.
#[derive(Default)]
pub struct TextDatabase {
	path: Option<PathBuf>,
}

/// Which section's grammar applies to body lines.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Section {
	Unknown,
	BinaryStream,
	Architecture,
	MemoryArea,
	Label,
	CrossReference,
	MultiCell,
	Comment,
}

impl Section {
	fn from_header(line: &str) -> Option<Section> {
		match line {
			"## BinaryStream"   => Some(Section::BinaryStream),
			"## Architecture"   => Some(Section::Architecture),
			"## MemoryArea"     => Some(Section::MemoryArea),
			"## Label"          => Some(Section::Label),
			"## CrossReference" => Some(Section::CrossReference),
			"## MultiCell"      => Some(Section::MultiCell),
			"## Comment"        => Some(Section::Comment),
			_                   => None,
		}
	}
}

impl IDatabase for TextDatabase {
	fn name(&self) -> &'static str {
		"Text"
	}

	fn extension(&self) -> &'static str {
		".mdt"
	}

	fn is_compatible(&self, path: &Path) -> bool {
		let file = match File::open(path) {
			Ok(file) => file,
			Err(_)   => return false,
		};

		let mut first_line = String::new();
		if BufReader::new(file).read_line(&mut first_line).is_err() {
			return false;
		}

		first_line.trim_end_matches('\n') == MAGIC
	}

	fn open(&mut self, path: &Path) -> Option<Document> {
		if self.path.is_some() {
			return None;
		}

		let file = File::open(path).ok()?;
		let doc = Document::new();

		let mut section = Section::Unknown;
		let mut pending_area: Option<MemoryArea> = None;

		for line in BufReader::new(file).lines() {
			let line = line.ok()?;

			if line == MAGIC {
				continue;
			}

			if line.starts_with("## ") {
				commit_area(&doc, pending_area.take());

				section = match Section::from_header(&line) {
					Some(section) => section,
					None => {
						error!("malformed database: unknown section {:?}", line);
						return None;
					}
				};
				continue;
			}

			match section {
				Section::Unknown => {
					error!("malformed database: {:?} outside any section", line);
					return None;
				}

				Section::BinaryStream => {
					let raw = match BASE64.decode(line.as_bytes()) {
						Ok(raw) => raw,
						Err(_) => {
							error!("malformed binary stream");
							return None;
						}
					};
					doc.set_binary_stream(BinaryStream::new(raw));
				}

				Section::Architecture => {
					for token in line.split_whitespace() {
						let tag = match parse_hex(token) {
							Some(tag) => ArchTag(tag as u32),
							None      => break,
						};

						if module_manager().find_architecture(tag).is_none() {
							warn!("unable to load architecture with tag {}", tag);
						} else {
							doc.register_arch_tag(tag);
						}
					}
				}

				Section::MemoryArea => {
					if line.starts_with("ma(") {
						commit_area(&doc, pending_area.take());

						pending_area = match parse_area(&line) {
							Some(area) => Some(area),
							None => {
								error!("unknown memory area type in {:?}", line);
								return None;
							}
						};
					} else if line.starts_with('|') {
						match pending_area.as_mut() {
							Some(area) => {
								if !parse_cell_into(area, &line) {
									warn!("dropped cell line {:?}", line);
								}
							}
							None => {
								error!("cell line {:?} without a memory area", line);
								return None;
							}
						}
					}
				}

				Section::Label => {
					let (addr_part, label_part) = match line.split_once(' ') {
						Some(parts) => parts,
						None => {
							error!("malformed label line {:?}", line);
							return None;
						}
					};

					let addr = match Address::parse(addr_part) {
						Some(addr) => addr,
						None => {
							error!("malformed label address {:?}", addr_part);
							return None;
						}
					};

					// a bad type triplet skips the label, nothing more
					match Label::parse(label_part) {
						Some(label) => {
							if !doc.add_label(addr, label) {
								warn!("unable to add label at {}", addr);
							}
						}
						None => warn!("unknown type for label located at {}", addr),
					}
				}

				Section::CrossReference => {
					let mut tokens = line.split_whitespace();

					let to = match tokens.next().and_then(Address::parse) {
						Some(to) => to,
						None => {
							error!("malformed cross reference line {:?}", line);
							return None;
						}
					};

					for token in tokens {
						let from = match Address::parse(token) {
							Some(from) => from,
							None       => break,
						};

						if !doc.add_xref(to, from) {
							warn!("unable to add cross reference to: {}, from: {}", to, from);
						}
					}
				}

				Section::MultiCell => {
					let parsed = line.split_once(' ').and_then(|(addr_part, mc_part)| {
						Some((Address::parse(addr_part)?, MultiCell::parse(mc_part)?))
					});

					match parsed {
						Some((addr, multi_cell)) => {
							doc.add_multi_cell(addr, multi_cell);
						}
						None => {
							error!("malformed multicell line {:?}", line);
							return None;
						}
					}
				}

				Section::Comment => {
					let parsed = line.split_once(' ').and_then(|(addr_part, blob)| {
						Some((Address::parse(addr_part)?, BASE64.decode(blob.as_bytes()).ok()?))
					});

					match parsed {
						Some((addr, raw)) => {
							doc.set_comment(addr, &String::from_utf8_lossy(&raw));
						}
						None => {
							error!("malformed comment line {:?}", line);
							return None;
						}
					}
				}
			}
		}

		commit_area(&doc, pending_area.take());

		// only a fully-parsed file binds the path
		self.path = Some(path.into());
		Some(doc)
	}

	fn create(&mut self, path: &Path, force: bool) -> bool {
		if self.path.is_some() {
			return false;
		}

		if path.exists() && !force {
			return false;
		}

		if File::create(path).is_err() {
			return false;
		}

		self.path = Some(path.into());
		true
	}

	fn flush(&self, doc: &Document) -> bool {
		let path = match &self.path {
			Some(path) => path,
			None       => return false,
		};

		fs::write(path, render(doc)).is_ok()
	}

	fn close(&mut self, doc: &Document) -> bool {
		let flushed = self.flush(doc);
		self.path = None;
		flushed
	}
}

// ------------------------------------------------------------------------------------------------
// Serialisation
// ------------------------------------------------------------------------------------------------

/// The whole document as one `.mdt` body. Every map iterates in key order, so the same
/// document always renders the same bytes.
fn render(doc: &Document) -> String {
	let mut out = String::new();

	out.push_str(MAGIC);
	out.push('\n');

	out.push_str("## BinaryStream\n");
	doc.with_binary_stream(|stream| {
		out.push_str(&BASE64.encode(stream.data()));
		out.push('\n');
	});

	out.push_str("## Architecture\n");
	let tags: Vec<String> = doc.arch_tags().iter().map(ArchTag::to_string).collect();
	out.push_str(&tags.join(" "));
	out.push('\n');

	out.push_str("## MemoryArea\n");
	doc.for_each_memory_area(|area| {
		out.push_str(&area.dump());
		out.push('\n');

		area.for_each_cell(&mut |offset, cell| {
			out.push_str(&format!("|{:#x} {}\n", offset, cell.dump()));
		});
	});

	out.push_str("## Label\n");
	doc.for_each_label(|addr, label| {
		out.push_str(&format!("{} {}\n", addr.dump(), label.dump()));
	});

	out.push_str("## CrossReference\n");
	for (to, froms) in doc.all_xrefs() {
		out.push_str(&to.dump());
		for from in froms {
			out.push(' ');
			out.push_str(&from.dump());
		}
		out.push('\n');
	}

	out.push_str("## MultiCell\n");
	for (addr, multi_cell) in doc.multi_cells() {
		out.push_str(&format!("{} {}\n", addr.dump(), multi_cell.dump()));
	}

	out.push_str("## Comment\n");
	for (addr, comment) in doc.comments() {
		out.push_str(&format!("{} {}\n", addr.dump(), BASE64.encode(comment.as_bytes())));
	}

	out
}

// ------------------------------------------------------------------------------------------------
// Parsing helpers
// ------------------------------------------------------------------------------------------------

fn commit_area(doc: &Document, area: Option<MemoryArea>) {
	if let Some(area) = area {
		if !doc.add_memory_area(area) {
			warn!("dropped a memory area overlapping an earlier one");
		}
	}
}

/// `ma(m name file-off file-size vaddr vsize RWX)` or `ma(v name vaddr vsize RWX)`.
fn parse_area(line: &str) -> Option<MemoryArea> {
	let body = line.strip_prefix("ma(")?.strip_suffix(')')?;
	let mut fields = body.split_whitespace();

	let kind = fields.next()?;
	let name = fields.next()?;

	let area = match kind {
		"m" => {
			let file_offset  = parse_hex(fields.next()?)?;
			let file_size    = parse_hex(fields.next()?)?;
			let virtual_base = Address::parse(fields.next()?)?;
			let virtual_size = parse_hex(fields.next()?)?;
			let access       = Access::parse(fields.next()?)?;

			MappedMemoryArea::new(name, file_offset, file_size, virtual_base, virtual_size,
				access).into()
		}
		"v" => {
			let virtual_base = Address::parse(fields.next()?)?;
			let virtual_size = parse_hex(fields.next()?)?;
			let access       = Access::parse(fields.next()?)?;

			VirtualMemoryArea::new(name, virtual_base, virtual_size, access).into()
		}
		_ => return None,
	};

	if fields.next().is_some() {
		return None;
	}

	Some(area)
}

/// `|offset dna(...)`, the offset relative to the owning area's base.
fn parse_cell_into(area: &mut MemoryArea, line: &str) -> bool {
	let parsed = line.strip_prefix('|').and_then(|rest| {
		let (offset_part, dna_part) = rest.split_once(' ')?;
		Some((parse_hex(offset_part)?, CellData::parse(dna_part)?))
	});

	let (offset, cell) = match parsed {
		Some(parsed) => parsed,
		None         => return false,
	};

	let mut deleted = Vec::new();
	area.set_cell(area.base_address().offset() + offset, cell, &mut deleted, true)
}

// ------------------------------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------------------------------
