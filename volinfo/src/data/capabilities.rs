use bitflags::bitflags;

bitflags! {
	/// Features supported by the file system of a volume, as returned by
	/// [`Volume::capabilities`].
	///
	/// On Windows and macOS the set is read from flags reported by the OS. Elsewhere it is looked
	/// up from the file system type name, which makes it a property of the file system driver
	/// rather than of the particular volume.
	///
	/// [`Volume::capabilities`]: crate::Volume::capabilities
	#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
	pub struct Capabilities : u32 {
		/// Symbolic links can be created.
		const SYMBOLIC_LINKS = 0x01;

		/// Hard links can be created.
		const HARD_LINKS = 0x02;

		/// Names that differ only in case refer to different files.
		const CASE_SENSITIVE_NAMES = 0x04;

		/// The case of a name is kept as it was written.
		const CASE_PRESERVED_NAMES = 0x08;

		/// Metadata changes are journaled.
		const JOURNALING = 0x10;

		/// Files may contain unallocated holes.
		const SPARSE_FILES = 0x20;

		/// Files have identifiers that survive renames and remounts.
		const PERSISTENT_IDS = 0x40;
	}
}
