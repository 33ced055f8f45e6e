use crate::Capabilities;

const JOURNALED: Capabilities = Capabilities::SYMBOLIC_LINKS
	.union(Capabilities::HARD_LINKS)
	.union(Capabilities::CASE_SENSITIVE_NAMES)
	.union(Capabilities::CASE_PRESERVED_NAMES)
	.union(Capabilities::JOURNALING)
	.union(Capabilities::SPARSE_FILES);

const UNIX_NATIVE: Capabilities = JOURNALED.difference(Capabilities::JOURNALING);

const NTFS: Capabilities = Capabilities::SPARSE_FILES.union(Capabilities::CASE_PRESERVED_NAMES);

const HFS: Capabilities = Capabilities::SYMBOLIC_LINKS
	.union(Capabilities::CASE_PRESERVED_NAMES)
	.union(Capabilities::SPARSE_FILES);

const FILE_SYSTEM_CLASSES: &[(&[&str], Capabilities)] = &[
	(
		&["ext3", "ext3cow", "ext4", "xfs", "jfs", "reiserfs", "hfsplus"],
		JOURNALED,
	),
	(&["ext2", "btrfs", "reiser4", "zfs"], UNIX_NATIVE),
	(&["ntfs", "ntfs3", "ntfs-3g", "fuseblk"], NTFS),
	(&["fat32", "exfat"], Capabilities::CASE_PRESERVED_NAMES),
	(&["hfs"], HFS),
	(
		&["vfat", "fat12", "fat16", "msdos", "nfs", "nfs4", "cifs", "autofs", "subfs"],
		Capabilities::empty(),
	),
];

/// Looks up the capabilities of a file system from its type name, ignoring case.
///
/// Unknown names, including every network file system, have no capabilities.
pub(crate) fn capabilities_for(file_system_type: &str) -> Capabilities {
	let name = file_system_type.to_ascii_lowercase();
	for (names, capabilities) in FILE_SYSTEM_CLASSES {
		if names.contains(&name.as_str()) {
			return *capabilities;
		}
	}
	if name.contains("fuse.ntfs") || name.contains("fuseblk.ntfs") {
		return NTFS;
	}
	Capabilities::empty()
}
