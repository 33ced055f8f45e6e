//! Lazy attribute fetching for [`VolumeRecord`]s.
//!
//! Attributes are fetched in groups, in a fixed order, and each group is fetched at most once
//! per record. Asking for a group also fetches the groups it depends on. Validity is part of
//! every round until it is known, so a record never reports attributes of a volume that turned
//! out not to exist.

use std::path::PathBuf;

use bitflags::bitflags;
use log::{debug, trace};

use crate::{backend::Backend, data::VolumeRecord, StatError};

bitflags! {
	/// Attribute groups of a [`VolumeRecord`] that are fetched together.
	#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
	pub(crate) struct CacheGroups : u8 {
		/// Root path, device and file system type.
		const IDENTITY = 0x01;

		/// Sizes, read-only flag, readiness and validity.
		const STAT = 0x02;

		const LABEL = 0x04;
		const CAPABILITIES = 0x08;
		const TYPE = 0x10;
	}
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Flow {
	Continue,
	Stop,
}

struct Step<B> {
	group: CacheGroups,
	requires: CacheGroups,
	fetch: fn(&B, &mut VolumeRecord) -> Flow,
}

fn steps<B: Backend>() -> [Step<B>; 5] {
	let identified = CacheGroups::IDENTITY | CacheGroups::STAT;
	[
		Step {
			group: CacheGroups::IDENTITY,
			requires: CacheGroups::empty(),
			fetch: fetch_identity::<B>,
		},
		Step {
			group: CacheGroups::STAT,
			requires: CacheGroups::IDENTITY,
			fetch: fetch_stat::<B>,
		},
		Step {
			group: CacheGroups::LABEL,
			requires: identified,
			fetch: fetch_label::<B>,
		},
		Step {
			group: CacheGroups::CAPABILITIES,
			requires: identified,
			fetch: fetch_capabilities::<B>,
		},
		Step {
			group: CacheGroups::TYPE,
			requires: identified,
			fetch: fetch_type::<B>,
		},
	]
}

/// Returns `true` if reading `groups` from `record` needs no backend call.
///
/// Nothing is satisfied before validity is known, even when the groups themselves are cached.
pub(crate) fn is_satisfied(record: &VolumeRecord, groups: CacheGroups) -> bool {
	record.cached.contains(groups | CacheGroups::STAT) || record.is_known_invalid()
}

fn with_prerequisites<B>(steps: &[Step<B>], mut groups: CacheGroups) -> CacheGroups {
	loop {
		let expanded = steps
			.iter()
			.filter(|step| groups.intersects(step.group))
			.fold(groups, |acc, step| acc | step.requires);
		if expanded == groups {
			return groups;
		}
		groups = expanded;
	}
}

/// Fetches every group in `required` that `record` does not hold yet.
///
/// Does nothing once the groups are cached or the record is known to be invalid.
pub(crate) fn ensure_cached<B: Backend>(backend: &B, record: &mut VolumeRecord, required: CacheGroups) {
	if is_satisfied(record, required) {
		return;
	}
	let steps = steps::<B>();
	let mut wanted = with_prerequisites(&steps, required);
	if !record.cached.contains(CacheGroups::STAT) {
		wanted |= with_prerequisites(&steps, CacheGroups::STAT);
	}
	for step in steps.iter() {
		if !wanted.intersects(step.group) || record.cached.contains(step.group) {
			continue;
		}
		debug_assert!(record.cached.contains(step.requires));
		trace!("fetching {:?} for {:?}", step.group, record.requested_path);
		let flow = (step.fetch)(backend, record);
		record.cached.insert(step.group);
		if flow == Flow::Stop || record.is_known_invalid() {
			break;
		}
	}
}

fn fetch_identity<B: Backend>(backend: &B, record: &mut VolumeRecord) -> Flow {
	let entry = if record.requested_path.as_os_str().is_empty() {
		None
	} else {
		backend.identify(&record.requested_path)
	};
	match entry {
		Some(entry) => {
			record.root_path = entry.mount_point;
			record.device = entry.device;
			record.file_system_type = entry.file_system_type;
			Flow::Continue
		}
		None => {
			record.root_path = PathBuf::new();
			Flow::Stop
		}
	}
}

fn fetch_stat<B: Backend>(backend: &B, record: &mut VolumeRecord) -> Flow {
	match backend.stat(&record.entry()) {
		Ok(info) => {
			record.bytes_total = info.byte_count;
			record.bytes_free = info.free_byte_count;
			record.bytes_available = info.available_byte_count;
			record.read_only = info.read_only;
			record.ready = true;
			record.valid = true;
			Flow::Continue
		}
		Err(StatError::NotReady) => {
			record.bytes_total = 0;
			record.bytes_free = 0;
			record.bytes_available = 0;
			record.read_only = false;
			record.ready = false;
			record.valid = true;
			Flow::Continue
		}
		Err(err) => {
			debug!("cannot query volume at {:?}: {}", record.root_path, err);
			record.invalidate();
			Flow::Stop
		}
	}
}

fn fetch_label<B: Backend>(backend: &B, record: &mut VolumeRecord) -> Flow {
	record.label = if record.ready {
		backend.label(&record.entry())
	} else {
		String::new()
	};
	Flow::Continue
}

fn fetch_capabilities<B: Backend>(backend: &B, record: &mut VolumeRecord) -> Flow {
	record.capabilities = backend.capabilities(&record.entry());
	Flow::Continue
}

fn fetch_type<B: Backend>(backend: &B, record: &mut VolumeRecord) -> Flow {
	record.volume_type = backend.volume_type(&record.entry());
	Flow::Continue
}

#[cfg(test)]
mod tests {
	use std::path::{Path, PathBuf};

	use super::*;
	use crate::{testing::RecordingBackend, Capabilities, MountEntry, VolumeType};

	fn record_for(path: &str) -> VolumeRecord {
		VolumeRecord::with_path(PathBuf::from(path))
	}
	#[test]
	fn empty_record_never_queries_backend() {
		let backend = RecordingBackend::new();
		let mut record = VolumeRecord::default();
		ensure_cached(&backend, &mut record, CacheGroups::all());
		assert!(backend.calls().is_empty());
		assert!(!record.valid);
		assert!(record.root_path.as_os_str().is_empty());
	}

	#[test]
	fn fetches_prerequisites_in_order() {
		let backend = RecordingBackend::new();
		let mut record = record_for("/mnt/data/file");
		ensure_cached(&backend, &mut record, CacheGroups::CAPABILITIES);
		assert_eq!(backend.calls(), vec!["identify", "stat", "capabilities"]);
		assert!(record.valid);
		assert!(record.ready);
		assert_eq!(record.bytes_free, 400);
		assert_eq!(
			record.capabilities,
			Capabilities::SYMBOLIC_LINKS | Capabilities::JOURNALING
		);
		assert!(!record.cached.contains(CacheGroups::LABEL));
	}

	#[test]
	fn identity_alone_still_establishes_validity() {
		let backend = RecordingBackend::new();
		let mut record = record_for("/mnt/data");
		ensure_cached(&backend, &mut record, CacheGroups::IDENTITY);
		assert_eq!(backend.calls(), vec!["identify", "stat"]);
		assert_eq!(record.root_path, Path::new("/mnt/data"));
	}

	#[test]
	fn cached_groups_are_fetched_once() {
		let backend = RecordingBackend::new();
		let mut record = record_for("/mnt/data");
		ensure_cached(&backend, &mut record, CacheGroups::LABEL | CacheGroups::TYPE);
		ensure_cached(&backend, &mut record, CacheGroups::LABEL);
		ensure_cached(&backend, &mut record, CacheGroups::TYPE | CacheGroups::STAT);
		assert_eq!(backend.calls(), vec!["identify", "stat", "label", "volume_type"]);
		assert_eq!(record.label, "Data");
		assert_eq!(record.volume_type, VolumeType::Removable);
	}

	#[test]
	fn stat_failure_invalidates_and_stops() {
		let backend = RecordingBackend::new();
		backend.set_stat(Err(StatError::Os(5)));
		let mut record = record_for("/mnt/data");
		ensure_cached(&backend, &mut record, CacheGroups::LABEL);
		ensure_cached(&backend, &mut record, CacheGroups::all());
		assert_eq!(backend.calls(), vec!["identify", "stat"]);
		assert!(!record.valid);
		assert!(!record.ready);
		assert!(record.device.is_empty());
		assert!(record.file_system_type.is_empty());
		assert_eq!(record.root_path, Path::new("/mnt/data"));
		assert!(is_satisfied(&record, CacheGroups::all()));
	}

	#[test]
	fn not_ready_volume_is_valid_without_label() {
		let backend = RecordingBackend::new();
		backend.set_stat(Err(StatError::NotReady));
		let mut record = record_for("/mnt/data");
		ensure_cached(&backend, &mut record, CacheGroups::LABEL | CacheGroups::TYPE);
		assert_eq!(backend.calls(), vec!["identify", "stat", "volume_type"]);
		assert!(record.valid);
		assert!(!record.ready);
		assert_eq!(record.bytes_total, 0);
		assert!(record.label.is_empty());
		assert!(record.cached.contains(CacheGroups::LABEL));
	}

	#[test]
	fn unresolved_path_stops_before_stat() {
		let mut backend = RecordingBackend::new();
		backend.resolves = false;
		let mut record = record_for("/nowhere");
		ensure_cached(&backend, &mut record, CacheGroups::all());
		ensure_cached(&backend, &mut record, CacheGroups::STAT);
		assert_eq!(backend.calls(), vec!["identify"]);
		assert!(!record.valid);
		assert!(record.root_path.as_os_str().is_empty());
	}

	#[test]
	fn pre_identified_record_skips_identify() {
		let backend = RecordingBackend::new();
		let mut record = VolumeRecord::from_entry(MountEntry::new("/mnt/data", "/dev/sdb1", "ext4"));
		assert!(!is_satisfied(&record, CacheGroups::IDENTITY));
		ensure_cached(&backend, &mut record, CacheGroups::IDENTITY);
		ensure_cached(&backend, &mut record, CacheGroups::STAT);
		assert_eq!(backend.calls(), vec!["stat"]);
		assert!(is_satisfied(&record, CacheGroups::IDENTITY | CacheGroups::STAT));
	}

	#[test]
	fn pre_identified_record_is_invalidated_before_identity_is_read() {
		let backend = RecordingBackend::new();
		backend.set_stat(Err(StatError::Os(116)));
		let mut record = VolumeRecord::from_entry(MountEntry::new("/mnt/data", "/dev/sdb1", "ext4"));
		ensure_cached(&backend, &mut record, CacheGroups::IDENTITY);
		assert_eq!(backend.calls(), vec!["stat"]);
		assert!(!record.valid);
		assert!(record.device.is_empty());
		assert!(is_satisfied(&record, CacheGroups::all()));
	}
}
