
// ------------------------------------------------------------------------------------------------
// BinaryStream
// ------------------------------------------------------------------------------------------------

/// A read-only image of the binary being analysed. Mapped memory areas describe windows into
/// this; the database persists it whole.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BinaryStream {
	data: Vec<u8>,
}

impl BinaryStream {
	/// Ctor.
	pub fn new(data: impl Into<Vec<u8>>) -> Self {
		Self { data: data.into() }
	}

	/// Convenience ctor to load the data directly from a file.
	pub fn from_file(filename: &str) -> std::io::Result<Self> {
		Ok(Self::new(std::fs::read(filename)?))
	}

	/// The whole backing buffer.
	pub fn data(&self) -> &[u8] {
		&self.data
	}

	/// Length in bytes.
	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// A sub-slice, or `None` if the range hangs off the end.
	pub fn slice(&self, offset: u64, size: u64) -> Option<&[u8]> {
		let start = usize::try_from(offset).ok()?;
		let end   = start.checked_add(usize::try_from(size).ok()?)?;

		self.data.get(start .. end)
	}

	/// One byte, or `None` past the end.
	pub fn read_u8(&self, offset: u64) -> Option<u8> {
		self.data.get(usize::try_from(offset).ok()?).copied()
	}
}
