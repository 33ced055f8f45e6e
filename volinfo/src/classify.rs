//! Volume type heuristics for platforms that cannot report the type directly.

#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd", target_os = "openbsd"))]
use std::{ffi::OsStr, path::Path};
#[cfg(any(target_os = "linux", target_os = "android"))]
use std::{fs, os::unix::fs::MetadataExt, path::PathBuf};

#[cfg(any(target_os = "linux", target_os = "android"))]
use log::debug;

use crate::{MountEntry, VolumeType};

/// Returns `true` for network file systems and UNC-style `//server/share` sources.
pub(crate) fn is_remote(entry: &MountEntry) -> bool {
	let fs_type = entry.file_system_type.to_ascii_lowercase();
	entry.device.to_string_lossy().starts_with("//")
		|| entry.mount_point.to_string_lossy().starts_with("//")
		|| matches!(
			fs_type.as_str(),
			"nfs" | "nfs4" | "cifs" | "autofs" | "subfs" | "fuse.sshfs" | "sshfs"
		) || fs_type.starts_with("smb")
}

/// Falls back to [`VolumeType::Remote`] when the device heuristics found nothing.
pub(crate) fn with_network_fallback(local: VolumeType, entry: &MountEntry) -> VolumeType {
	if local == VolumeType::Unknown && is_remote(entry) {
		VolumeType::Remote
	} else {
		local
	}
}

/// Classifies a Linux block device by walking sysfs rooted at `sys_root`.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub(crate) fn classify_block_device(device: &OsStr, sys_root: &Path) -> VolumeType {
	let device = fs::canonicalize(device).unwrap_or_else(|_| PathBuf::from(device));
	let name = match device.strip_prefix("/dev") {
		Ok(name) => name.to_string_lossy().into_owned(),
		Err(_) => return VolumeType::Unknown,
	};
	if name.starts_with("mmc") {
		return VolumeType::Removable;
	}
	let block = if name.starts_with("mapper/") || name.starts_with("dm-") {
		match device_mapper_slave(&device, &name, sys_root) {
			Some(slave) => slave,
			None => return VolumeType::Unknown,
		}
	} else {
		name
	};
	let disk = whole_disk(&block, sys_root);
	if disk.starts_with("mmc") {
		VolumeType::Removable
	} else if disk.starts_with("ram") || disk.starts_with("zram") {
		VolumeType::Ram
	} else if disk.starts_with("sr") || disk.starts_with("scd") {
		VolumeType::Optical
	} else if is_removable(&disk, sys_root) {
		VolumeType::Removable
	} else {
		VolumeType::Internal
	}
}

/// Finds the first device underneath a device-mapper node such as `/dev/mapper/root`.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn device_mapper_slave(device: &Path, name: &str, sys_root: &Path) -> Option<String> {
	let dm_name = if name.starts_with("dm-") {
		name.to_owned()
	} else {
		let rdev = match fs::metadata(device) {
			Ok(metadata) => metadata.rdev(),
			Err(err) => {
				debug!("cannot stat device-mapper node {:?}: {}", device, err);
				return None;
			}
		};
		format!("dm-{}", (rdev & 0xff) | ((rdev >> 12) & 0xfff00))
	};
	let slaves = sys_root.join("block").join(&dm_name).join("slaves");
	let mut names: Vec<String> = match fs::read_dir(&slaves) {
		Ok(entries) => entries
			.flatten()
			.map(|entry| entry.file_name().to_string_lossy().into_owned())
			.collect(),
		Err(_) => return Some(dm_name),
	};
	names.sort();
	Some(names.into_iter().next().unwrap_or(dm_name))
}

/// Maps a partition name such as `sda1` to the disk holding it.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn whole_disk(name: &str, sys_root: &Path) -> String {
	let class_entry = sys_root.join("class/block").join(name);
	if class_entry.join("partition").exists() {
		let parent = fs::canonicalize(&class_entry)
			.ok()
			.and_then(|target| target.parent().and_then(Path::file_name).map(OsStr::to_os_string));
		if let Some(parent) = parent {
			return parent.to_string_lossy().into_owned();
		}
	}
	if sys_root.join("block").join(name).exists() {
		return name.to_owned();
	}
	strip_partition_suffix(name).to_owned()
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn strip_partition_suffix(name: &str) -> &str {
	let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
	if stem.len() == name.len() || stem.is_empty() {
		return name;
	}
	if let Some(disk) = stem.strip_suffix('p') {
		if disk.ends_with(|c: char| c.is_ascii_digit()) {
			return disk;
		}
	}
	let legacy = ["sd", "hd", "vd", "xvd"]
		.iter()
		.any(|prefix| stem.starts_with(prefix) && stem[prefix.len()..].chars().all(|c| c.is_ascii_lowercase()));
	if legacy {
		stem
	} else {
		name
	}
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn is_removable(disk: &str, sys_root: &Path) -> bool {
	fs::read_to_string(sys_root.join("block").join(disk).join("removable"))
		.map(|flag| flag.contains('1'))
		.unwrap_or(false)
}

/// Classifies a BSD device node by its driver name.
#[cfg(any(target_os = "freebsd", target_os = "openbsd"))]
pub(crate) fn classify_bsd_device(device: &OsStr) -> VolumeType {
	const DRIVERS: &[(&str, VolumeType)] = &[
		("cd", VolumeType::Optical),
		("acd", VolumeType::Optical),
		("md", VolumeType::Ram),
		("mmcsd", VolumeType::Removable),
		("sdda", VolumeType::Removable),
		("da", VolumeType::Removable),
		("ada", VolumeType::Internal),
		("nvd", VolumeType::Internal),
		("nda", VolumeType::Internal),
		("wd", VolumeType::Internal),
		("sd", VolumeType::Internal),
	];
	let name = match Path::new(device).strip_prefix("/dev") {
		Ok(name) => name.to_string_lossy().into_owned(),
		Err(_) => return VolumeType::Unknown,
	};
	DRIVERS
		.iter()
		.find(|(driver, _)| name.starts_with(driver))
		.map(|(_, volume_type)| *volume_type)
		.unwrap_or(VolumeType::Unknown)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn network_file_systems_are_remote() {
		let nfs = MountEntry::new("/srv/share", "server:/export", "nfs4");
		assert!(is_remote(&nfs));
		assert_eq!(with_network_fallback(VolumeType::Unknown, &nfs), VolumeType::Remote);
		let smb = MountEntry::new("/mnt/smb", "//server/share", "smb3");
		assert!(is_remote(&smb));
		let local = MountEntry::new("/", "/dev/sda1", "ext4");
		assert!(!is_remote(&local));
		assert_eq!(with_network_fallback(VolumeType::Unknown, &local), VolumeType::Unknown);
	}

	#[test]
	fn device_heuristics_take_precedence_over_network() {
		let odd = MountEntry::new("/mnt", "/dev/sdb1", "cifs");
		assert_eq!(with_network_fallback(VolumeType::Internal, &odd), VolumeType::Internal);
	}

	#[cfg(any(target_os = "linux", target_os = "android"))]
	mod sysfs {
		use std::{fs, os::unix::fs::symlink, path::Path};

		use tempfile::TempDir;

		use super::super::*;

		/// Lays out `block/<disk>/<partition>` with `class/block/<partition>` links the way the
		/// kernel does.
		fn fake_sysfs() -> TempDir {
			let root = tempfile::tempdir().unwrap();
			let sys = root.path();
			fs::create_dir_all(sys.join("class/block")).unwrap();
			for (disk, removable, partitions) in [
				("sda", "0\n", &["sda1", "sda2"][..]),
				("sdb", "1\n", &["sdb1", "sdb2"][..]),
				("nvme0n1", "0\n", &["nvme0n1p1"][..]),
			] {
				let disk_dir = sys.join("block").join(disk);
				fs::create_dir_all(&disk_dir).unwrap();
				fs::write(disk_dir.join("removable"), removable).unwrap();
				for partition in partitions {
					let partition_dir = disk_dir.join(partition);
					fs::create_dir_all(&partition_dir).unwrap();
					fs::write(partition_dir.join("partition"), "1\n").unwrap();
					symlink(&partition_dir, sys.join("class/block").join(partition)).unwrap();
				}
			}
			let slaves = sys.join("block/dm-0/slaves");
			fs::create_dir_all(&slaves).unwrap();
			fs::create_dir_all(slaves.join("sdb2")).unwrap();
			root
		}

		fn classify(device: &str, sys: &Path) -> VolumeType {
			classify_block_device(OsStr::new(device), sys)
		}

		#[test]
		fn partitions_follow_their_disk() {
			let sys = fake_sysfs();
			assert_eq!(classify("/dev/sda1", sys.path()), VolumeType::Internal);
			assert_eq!(classify("/dev/sdb1", sys.path()), VolumeType::Removable);
			assert_eq!(classify("/dev/nvme0n1p1", sys.path()), VolumeType::Internal);
		}

		#[test]
		fn device_mapper_resolves_to_slave() {
			let sys = fake_sysfs();
			assert_eq!(classify("/dev/dm-0", sys.path()), VolumeType::Removable);
		}

		#[test]
		fn name_based_types() {
			let sys = fake_sysfs();
			assert_eq!(classify("/dev/mmcblk0p1", sys.path()), VolumeType::Removable);
			assert_eq!(classify("/dev/zram0", sys.path()), VolumeType::Ram);
			assert_eq!(classify("/dev/sr0", sys.path()), VolumeType::Optical);
		}

		#[test]
		fn non_device_sources_are_unknown() {
			let sys = fake_sysfs();
			assert_eq!(classify("overlay", sys.path()), VolumeType::Unknown);
			assert_eq!(classify("server:/export", sys.path()), VolumeType::Unknown);
		}

		#[test]
		fn partition_suffix_without_sysfs() {
			assert_eq!(strip_partition_suffix("sdc3"), "sdc");
			assert_eq!(strip_partition_suffix("nvme1n1p2"), "nvme1n1");
			assert_eq!(strip_partition_suffix("nvme1n1"), "nvme1n1");
			assert_eq!(strip_partition_suffix("loop0"), "loop0");
			assert_eq!(strip_partition_suffix("xvda"), "xvda");
		}
	}

	#[cfg(any(target_os = "freebsd", target_os = "openbsd"))]
	#[test]
	fn bsd_driver_names() {
		assert_eq!(classify_bsd_device(OsStr::new("/dev/ada0p2")), VolumeType::Internal);
		assert_eq!(classify_bsd_device(OsStr::new("/dev/da0s1")), VolumeType::Removable);
		assert_eq!(classify_bsd_device(OsStr::new("/dev/cd0")), VolumeType::Optical);
		assert_eq!(classify_bsd_device(OsStr::new("/dev/md0")), VolumeType::Ram);
		assert_eq!(classify_bsd_device(OsStr::new("zroot/ROOT/default")), VolumeType::Unknown);
	}
}
