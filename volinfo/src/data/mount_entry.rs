use std::{ffi::OsString, path::PathBuf};

/// One line of the mount table: where a device is mounted and with which file system.
///
/// Produced by [`Backend::mounts`] and [`Backend::identify`].
///
/// [`Backend::mounts`]: crate::Backend::mounts
/// [`Backend::identify`]: crate::Backend::identify
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct MountEntry {
	/// Directory the file system is mounted on.
	pub mount_point: PathBuf,

	/// Platform-specific identifier of the mounted device.
	///
	/// A device node such as `/dev/sda1` for local volumes on Unix, a `\\?\Volume{GUID}\` path
	/// on Windows, or whatever the OS reports for remote and virtual file systems.
	pub device: OsString,

	/// Name of the file system driver, e.g. `ext4` or `NTFS`.
	pub file_system_type: String,
}

impl MountEntry {
	pub fn new(
		mount_point: impl Into<PathBuf>,
		device: impl Into<OsString>,
		file_system_type: impl Into<String>,
	) -> Self {
		MountEntry {
			mount_point: mount_point.into(),
			device: device.into(),
			file_system_type: file_system_type.into(),
		}
	}
}
