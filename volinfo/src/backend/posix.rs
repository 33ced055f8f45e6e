#[cfg(any(target_os = "linux", target_os = "android"))]
use std::{ffi::OsStr, fs};
use std::{path::PathBuf, sync::Arc};

use super::{statvfs::statvfs, Backend};
use crate::{
	capability_table, classify, mount_table, Capabilities, MountEntry, StatError, StatInfo, VolumeType,
};

/// Locations [`PosixBackend`] reads its information from.
///
/// The defaults point at the live system. Tests and sandboxes can redirect them to prepared
/// copies.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PosixOptions {
	/// Text mount table with `device mount_point type options...` lines.
	pub mount_table: PathBuf,

	/// Root of the sysfs tree used to classify block devices.
	pub sys_root: PathBuf,

	/// Directory of symbolic links named after volume labels and pointing to their devices.
	pub label_dir: PathBuf,

	/// Root directory of the system, resolved by [`Volume::root_volume`](crate::Volume::root_volume).
	pub root_path: PathBuf,
}

impl Default for PosixOptions {
	fn default() -> Self {
		let mount_table = if cfg!(any(target_os = "linux", target_os = "android")) {
			"/proc/self/mounts"
		} else if cfg!(any(target_os = "solaris", target_os = "illumos")) {
			"/etc/mnttab"
		} else {
			"/etc/mtab"
		};
		PosixOptions {
			mount_table: PathBuf::from(mount_table),
			sys_root: PathBuf::from("/sys"),
			label_dir: PathBuf::from("/dev/disk/by-label"),
			root_path: PathBuf::from("/"),
		}
	}
}

/// Backend for Linux and other systems that describe their mounts in a text table.
#[derive(Debug, Clone, Default)]
pub struct PosixBackend {
	options: Arc<PosixOptions>,
}

impl PosixBackend {
	pub fn with_options(options: PosixOptions) -> Self {
		PosixBackend {
			options: Arc::new(options),
		}
	}

	pub fn options(&self) -> &PosixOptions {
		&self.options
	}
}

impl Backend for PosixBackend {
	fn mounts(&self) -> Vec<MountEntry> {
		mount_table::read_mount_table(&self.options.mount_table)
	}

	fn stat(&self, entry: &MountEntry) -> Result<StatInfo, StatError> {
		statvfs(&entry.mount_point)
	}

	#[cfg(any(target_os = "linux", target_os = "android"))]
	fn label(&self, entry: &MountEntry) -> String {
		label_for_device(&self.options.label_dir, &entry.device)
	}

	#[cfg(not(any(target_os = "linux", target_os = "android")))]
	fn label(&self, _entry: &MountEntry) -> String {
		String::new()
	}

	fn volume_type(&self, entry: &MountEntry) -> VolumeType {
		#[cfg(any(target_os = "linux", target_os = "android"))]
		let local = classify::classify_block_device(&entry.device, &self.options.sys_root);
		#[cfg(not(any(target_os = "linux", target_os = "android")))]
		let local = VolumeType::Unknown;
		classify::with_network_fallback(local, entry)
	}

	fn capabilities(&self, entry: &MountEntry) -> Capabilities {
		capability_table::capabilities_for(&entry.file_system_type)
	}

	fn root_path(&self) -> PathBuf {
		self.options.root_path.clone()
	}
}

/// Looks for a link in `label_dir` that points to `device` and decodes its name.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn label_for_device(label_dir: &std::path::Path, device: &OsStr) -> String {
	let device = fs::canonicalize(device).unwrap_or_else(|_| PathBuf::from(device));
	let links = match fs::read_dir(label_dir) {
		Ok(links) => links,
		Err(_) => return String::new(),
	};
	for link in links.flatten() {
		let is_link = link.file_type().map(|t| t.is_symlink()).unwrap_or(false);
		if !is_link {
			continue;
		}
		if fs::canonicalize(link.path()).map_or(false, |target| target == device) {
			return decode_label(&link.file_name().to_string_lossy());
		}
	}
	String::new()
}

/// Decodes the `\xNN` escapes udev puts into label link names.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn decode_label(name: &str) -> String {
	let bytes = name.as_bytes();
	let mut out = Vec::with_capacity(bytes.len());
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] == b'\\' && bytes.get(i + 1) == Some(&b'x') {
			let hex = bytes.get(i + 2..i + 4).and_then(|hex| std::str::from_utf8(hex).ok());
			if let Some(byte) = hex.and_then(|hex| u8::from_str_radix(hex, 16).ok()) {
				out.push(byte);
				i += 4;
				continue;
			}
		}
		out.push(bytes[i]);
		i += 1;
	}
	String::from_utf8_lossy(&out).into_owned()
}
