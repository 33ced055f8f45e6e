use std::{
	collections::{HashMap, HashSet},
	ffi::OsString,
	path::{Path, PathBuf},
};

use crate::MountEntry;

/// Returns the entry whose mount point is the longest component-wise prefix of `path`.
///
/// `path` must already be canonical. When several entries share the winning mount point the
/// later one wins, since it was mounted over the earlier ones.
pub(crate) fn longest_prefix<'a>(path: &Path, entries: &'a [MountEntry]) -> Option<&'a MountEntry> {
	let mut best: Option<&MountEntry> = None;
	let mut best_depth = 0;
	for entry in entries {
		if entry.mount_point.as_os_str().is_empty() || !path.starts_with(&entry.mount_point) {
			continue;
		}
		let depth = entry.mount_point.components().count();
		if best.is_none() || depth >= best_depth {
			best = Some(entry);
			best_depth = depth;
		}
	}
	best
}

/// Reduces a mount table to one entry per volume.
///
/// A mount point that appears more than once keeps its last entry. A device mounted more than
/// once keeps its first mount point, unless one of them is `root_mount`, which is then kept
/// instead. Entries without a device are never merged.
pub(crate) fn distinct_volumes(entries: Vec<MountEntry>, root_mount: Option<&Path>) -> Vec<MountEntry> {
	let mut last_index: HashMap<PathBuf, usize> = HashMap::new();
	for (index, entry) in entries.iter().enumerate() {
		last_index.insert(entry.mount_point.clone(), index);
	}
	let visible: Vec<MountEntry> = entries
		.into_iter()
		.enumerate()
		.filter(|(index, entry)| last_index.get(&entry.mount_point) == Some(index))
		.map(|(_, entry)| entry)
		.collect();

	let root_device: Option<OsString> = root_mount.and_then(|root| {
		visible
			.iter()
			.find(|entry| entry.mount_point == root)
			.map(|entry| entry.device.clone())
	});

	let mut seen: HashSet<OsString> = HashSet::new();
	visible
		.into_iter()
		.filter(|entry| {
			if entry.device.is_empty() {
				return true;
			}
			if root_device.as_ref() == Some(&entry.device) {
				return root_mount == Some(entry.mount_point.as_path());
			}
			seen.insert(entry.device.clone())
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entries() -> Vec<MountEntry> {
		vec![
			MountEntry::new("/", "/dev/sda1", "ext4"),
			MountEntry::new("/home", "/dev/sda2", "ext4"),
			MountEntry::new("/home/user/media", "/dev/sdb1", "vfat"),
			MountEntry::new("/homework", "/dev/sdc1", "xfs"),
		]
	}

	#[test]
	fn picks_deepest_mount_point() {
		let entries = entries();
		let found = longest_prefix(Path::new("/home/user/media/photo.jpg"), &entries);
		assert_eq!(found.map(|e| e.device.as_os_str()), Some("/dev/sdb1".as_ref()));
		let found = longest_prefix(Path::new("/home/user/notes.txt"), &entries);
		assert_eq!(found.map(|e| e.device.as_os_str()), Some("/dev/sda2".as_ref()));
	}

	#[test]
	fn matches_whole_components_only() {
		let entries = entries();
		let found = longest_prefix(Path::new("/homework/essay"), &entries);
		assert_eq!(found.map(|e| e.device.as_os_str()), Some("/dev/sdc1".as_ref()));
		let found = longest_prefix(Path::new("/homeless"), &entries);
		assert_eq!(found.map(|e| e.mount_point.as_path()), Some(Path::new("/")));
	}

	#[test]
	fn mount_point_itself_resolves_to_its_entry() {
		let entries = entries();
		let found = longest_prefix(Path::new("/home"), &entries);
		assert_eq!(found.map(|e| e.device.as_os_str()), Some("/dev/sda2".as_ref()));
	}

	#[test]
	fn later_entry_wins_on_same_mount_point() {
		let mut entries = entries();
		entries.push(MountEntry::new("/home", "/dev/sdd1", "btrfs"));
		let found = longest_prefix(Path::new("/home/user"), &entries);
		assert_eq!(found.map(|e| e.device.as_os_str()), Some("/dev/sdd1".as_ref()));
	}

	#[test]
	fn no_match_without_root() {
		let entries = vec![MountEntry::new("/mnt", "/dev/sdb1", "ext4")];
		assert!(longest_prefix(Path::new("/usr/bin"), &entries).is_none());
	}

	#[test]
	fn distinct_volumes_prefers_root_mount() {
		let entries = vec![
			MountEntry::new("/snapshots", "/dev/sda1", "btrfs"),
			MountEntry::new("/", "/dev/sda1", "btrfs"),
			MountEntry::new("/mnt/usb", "/dev/sdb1", "vfat"),
			MountEntry::new("/mnt/usb-again", "/dev/sdb1", "vfat"),
		];
		let volumes = distinct_volumes(entries, Some(Path::new("/")));
		let mount_points: Vec<&Path> = volumes.iter().map(|e| e.mount_point.as_path()).collect();
		assert_eq!(mount_points, vec![Path::new("/"), Path::new("/mnt/usb")]);
	}

	#[test]
	fn distinct_volumes_keeps_last_entry_per_mount_point() {
		let entries = vec![
			MountEntry::new("/", "rootfs", "rootfs"),
			MountEntry::new("/", "/dev/sda1", "ext4"),
			MountEntry::new("/a", "", "nfs"),
			MountEntry::new("/b", "", "nfs"),
		];
		let volumes = distinct_volumes(entries, Some(Path::new("/")));
		assert_eq!(volumes.len(), 3);
		assert_eq!(volumes[0].device, "/dev/sda1");
	}
}
