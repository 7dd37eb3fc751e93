
use std::path::Path;

use enum_dispatch::enum_dispatch;

use crate::document::Document;

// ------------------------------------------------------------------------------------------------
// Sub-modules
// ------------------------------------------------------------------------------------------------

mod text;

pub use text::*;

// ------------------------------------------------------------------------------------------------
// IDatabase
// ------------------------------------------------------------------------------------------------

/// What a database back-end must provide: recognising its own files, reconstituting a
/// document from one, and writing a document back out.
///
/// A back-end is bound to at most one path at a time. `open` and `create` bind it;
/// `close` flushes and unbinds. Every operation reports failure as `false`/`None` and
/// leaves the binding untouched on failure.
#[enum_dispatch(Database)]
pub trait IDatabase {
	/// The back-end's name (shown when picking a format).
	fn name(&self) -> &'static str;
	/// The file extension this back-end claims.
	fn extension(&self) -> &'static str;

	/// Whether the file at `path` looks like one of ours.
	fn is_compatible(&self, path: &Path) -> bool;
	/// Parses the file at `path` into a fresh document and binds the path. Fails when a
	/// path is already bound or the file is malformed; nothing is bound on failure.
	fn open(&mut self, path: &Path) -> Option<Document>;
	/// Creates an empty file at `path` and binds it. Refuses to clobber an existing file
	/// unless `force` is set.
	fn create(&mut self, path: &Path, force: bool) -> bool;
	/// Rewrites the bound file from `doc`, whole.
	fn flush(&self, doc: &Document) -> bool;
	/// Flushes, then unbinds.
	fn close(&mut self, doc: &Document) -> bool;
}

// ------------------------------------------------------------------------------------------------
// Database
// ------------------------------------------------------------------------------------------------

/// The available back-ends.
#[enum_dispatch]
pub enum Database {
	TextDatabase,
}
