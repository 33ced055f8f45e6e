use std::{ffi::OsString, os::unix::ffi::OsStringExt, path::PathBuf};

use libc::c_char;

use super::{mntinfo, statvfs::statvfs, Backend};
use crate::{
	capability_table, classify, mount_table, Capabilities, MountEntry, StatError, StatInfo, VolumeType,
};

/// Backend for FreeBSD and OpenBSD, which list their mounts through `getmntinfo`.
#[derive(Debug, Copy, Clone, Default)]
pub struct BsdBackend;

fn c_chars_to_os_string(chars: &[c_char]) -> OsString {
	OsString::from_vec(
		chars
			.iter()
			.take_while(|c| **c != 0)
			.map(|c| *c as u8)
			.collect(),
	)
}

fn entry_from_statfs(stat: &libc::statfs) -> MountEntry {
	MountEntry {
		mount_point: PathBuf::from(c_chars_to_os_string(&stat.f_mntonname)),
		device: c_chars_to_os_string(&stat.f_mntfromname),
		file_system_type: c_chars_to_os_string(&stat.f_fstypename)
			.to_string_lossy()
			.into_owned(),
	}
}

impl Backend for BsdBackend {
	fn mounts(&self) -> Vec<MountEntry> {
		mntinfo::map_mounted(|stat| {
			Some(entry_from_statfs(stat))
				.filter(|entry| !mount_table::is_pseudo_fs(&entry.mount_point, &entry.file_system_type))
		})
	}

	fn stat(&self, entry: &MountEntry) -> Result<StatInfo, StatError> {
		statvfs(&entry.mount_point)
	}

	fn label(&self, _entry: &MountEntry) -> String {
		String::new()
	}

	fn volume_type(&self, entry: &MountEntry) -> VolumeType {
		classify::with_network_fallback(classify::classify_bsd_device(&entry.device), entry)
	}

	fn capabilities(&self, entry: &MountEntry) -> Capabilities {
		capability_table::capabilities_for(&entry.file_system_type)
	}

	fn root_path(&self) -> PathBuf {
		PathBuf::from("/")
	}
}
