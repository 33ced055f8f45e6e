use std::{ffi::OsString, path::PathBuf};

use crate::{cache::CacheGroups, Capabilities, MountEntry, VolumeType};

/// Everything known about one volume, filled in lazily group by group.
///
/// A field is only meaningful once its group is in `cached`. Handles share records through an
/// `Arc` and copy them before writing.
#[derive(Debug, Clone, Default)]
pub(crate) struct VolumeRecord {
	pub requested_path: PathBuf,
	pub root_path: PathBuf,
	pub device: OsString,
	pub file_system_type: String,
	pub label: String,
	pub bytes_total: u64,
	pub bytes_free: u64,
	pub bytes_available: u64,
	pub read_only: bool,
	pub ready: bool,
	pub valid: bool,
	pub volume_type: VolumeType,
	pub capabilities: Capabilities,
	pub cached: CacheGroups,
}

impl VolumeRecord {
	pub fn with_path(path: PathBuf) -> Self {
		VolumeRecord {
			requested_path: path,
			..Default::default()
		}
	}

	/// Creates a record whose identity is already known, e.g. from a mount table line.
	pub fn from_entry(entry: MountEntry) -> Self {
		VolumeRecord {
			requested_path: entry.mount_point.clone(),
			root_path: entry.mount_point,
			device: entry.device,
			file_system_type: entry.file_system_type,
			cached: CacheGroups::IDENTITY,
			..Default::default()
		}
	}

	pub fn entry(&self) -> MountEntry {
		MountEntry {
			mount_point: self.root_path.clone(),
			device: self.device.clone(),
			file_system_type: self.file_system_type.clone(),
		}
	}

	/// Returns `true` once the record is known to describe no volume, after which no attribute
	/// is ever queried again.
	pub fn is_known_invalid(&self) -> bool {
		(self.cached.contains(CacheGroups::IDENTITY) && self.root_path.as_os_str().is_empty())
			|| (self.cached.contains(CacheGroups::STAT) && !self.valid)
	}

	/// Resets every attribute except the requested and root paths and marks the record invalid.
	pub fn invalidate(&mut self) {
		let cached = self.cached;
		*self = VolumeRecord {
			requested_path: std::mem::take(&mut self.requested_path),
			root_path: std::mem::take(&mut self.root_path),
			cached,
			..Default::default()
		};
	}
}
