use std::{
	error::Error,
	fmt::{self, Display, Formatter},
	io,
};

/// Capacity and write protection of a volume, returned by [`Backend::stat`].
///
/// [`Backend::stat`]: crate::Backend::stat
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct StatInfo {
	/// Total size of the volume in bytes.
	pub byte_count: u64,

	/// Number of free bytes on the volume.
	pub free_byte_count: u64,

	/// Number of free bytes that are available to the calling user.
	///
	/// Quotas and reserved blocks can make it smaller than
	/// [`free_byte_count`](Self::free_byte_count).
	pub available_byte_count: u64,

	/// The volume is mounted read-only.
	pub read_only: bool,
}

/// Error type for [`Backend::stat`].
///
/// The cause is only logged; callers of [`Volume`] see it as `is_valid()` or `is_ready()`
/// returning `false`.
///
/// [`Backend::stat`]: crate::Backend::stat
/// [`Volume`]: crate::Volume
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StatError {
	/// The volume exists but has no readable media, e.g. an empty optical drive.
	NotReady,

	/// The OS call failed with the given error code.
	Os(i32),
}

impl Error for StatError {}

impl Display for StatError {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		match self {
			StatError::NotReady => write!(f, "volume is not ready"),
			StatError::Os(code) => write!(f, "volume query failed: {}", io::Error::from_raw_os_error(*code)),
		}
	}
}

impl From<io::Error> for StatError {
	fn from(err: io::Error) -> Self {
		StatError::Os(err.raw_os_error().unwrap_or_default())
	}
}
