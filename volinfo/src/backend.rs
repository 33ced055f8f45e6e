use std::{
	fs,
	path::{Path, PathBuf},
};

use log::debug;

use crate::{resolve, Capabilities, MountEntry, StatError, StatInfo, VolumeType};

#[cfg(all(
	unix,
	not(any(target_os = "macos", target_os = "freebsd", target_os = "openbsd"))
))]
mod posix;
#[cfg(all(
	unix,
	not(any(target_os = "macos", target_os = "freebsd", target_os = "openbsd"))
))]
pub use posix::{PosixBackend, PosixOptions};
#[cfg(all(
	unix,
	not(any(target_os = "macos", target_os = "freebsd", target_os = "openbsd"))
))]
/// Backend used by [`Volume`](crate::Volume) unless another one is supplied.
pub type NativeBackend = PosixBackend;

#[cfg(any(target_os = "freebsd", target_os = "openbsd"))]
mod bsd;
#[cfg(any(target_os = "freebsd", target_os = "openbsd"))]
pub use bsd::BsdBackend;
#[cfg(any(target_os = "freebsd", target_os = "openbsd"))]
/// Backend used by [`Volume`](crate::Volume) unless another one is supplied.
pub type NativeBackend = BsdBackend;

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
pub use macos::MacBackend;
#[cfg(target_os = "macos")]
/// Backend used by [`Volume`](crate::Volume) unless another one is supplied.
pub type NativeBackend = MacBackend;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use self::windows::WindowsBackend;
#[cfg(windows)]
/// Backend used by [`Volume`](crate::Volume) unless another one is supplied.
pub type NativeBackend = WindowsBackend;

#[cfg(all(unix, not(target_os = "macos")))]
mod statvfs;

#[cfg(any(target_os = "macos", target_os = "freebsd", target_os = "openbsd"))]
mod mntinfo;

/// Source of volume information for one platform.
///
/// [`Volume`](crate::Volume) calls these methods lazily, at most once per attribute group and
/// snapshot, and never for a handle that is known to be invalid. Implementors may assume that
/// [`stat`](Self::stat), [`label`](Self::label), [`volume_type`](Self::volume_type) and
/// [`capabilities`](Self::capabilities) are only called with entries produced by
/// [`mounts`](Self::mounts) or [`identify`](Self::identify).
///
/// The crate ships one backend per supported OS, available as [`NativeBackend`]. Other
/// implementations are mostly useful for tests.
pub trait Backend: Clone {
	/// Lists the volumes currently mounted, without pseudo file systems.
	///
	/// An empty list means the mount table could not be read.
	fn mounts(&self) -> Vec<MountEntry>;

	/// Finds the mount holding `path`.
	///
	/// The default implementation canonicalizes `path` and picks the entry of
	/// [`mounts`](Self::mounts) whose mount point is its longest prefix. If the mount table is
	/// unreadable, paths below [`root_path`](Self::root_path) resolve to an anonymous root
	/// entry. Returns `None` if the path does not exist or no mount holds it.
	fn identify(&self, path: &Path) -> Option<MountEntry> {
		let canonical = match fs::canonicalize(path) {
			Ok(canonical) => canonical,
			Err(err) => {
				debug!("cannot canonicalize {:?}: {}", path, err);
				return None;
			}
		};
		let mounts = self.mounts();
		if mounts.is_empty() {
			let root = self.root_path();
			return if canonical.starts_with(&root) {
				Some(MountEntry {
					mount_point: root,
					..Default::default()
				})
			} else {
				None
			};
		}
		let found = resolve::longest_prefix(&canonical, &mounts).cloned();
		if found.is_none() {
			debug!("no mount holds {:?}", canonical);
		}
		found
	}

	/// Queries the sizes and the read-only flag of a mounted volume.
	fn stat(&self, entry: &MountEntry) -> Result<StatInfo, StatError>;

	/// Returns the user-visible name of the volume, or an empty string if it has none.
	fn label(&self, entry: &MountEntry) -> String;

	fn volume_type(&self, entry: &MountEntry) -> VolumeType;

	fn capabilities(&self, entry: &MountEntry) -> Capabilities;

	/// Returns a path on the volume the operating system boots from.
	fn root_path(&self) -> PathBuf;
}
