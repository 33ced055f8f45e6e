use std::{
	cell::RefCell,
	ffi::OsString,
	fmt,
	path::{Path, PathBuf},
	sync::Arc,
};

use lazy_static::lazy_static;

use crate::{
	backend::{Backend, NativeBackend},
	cache::{self, CacheGroups},
	data::VolumeRecord,
	resolve, Capabilities, MountEntry, VolumeType,
};

lazy_static! {
	static ref ROOT_RECORD: Arc<VolumeRecord> = root_record(&NativeBackend::default());
}

fn root_record<B: Backend>(backend: &B) -> Arc<VolumeRecord> {
	let root_path = backend.root_path();
	let record = match backend.identify(&root_path) {
		Some(entry) => {
			let mut record = VolumeRecord::from_entry(entry);
			record.requested_path = root_path;
			record
		}
		None => VolumeRecord::with_path(root_path),
	};
	Arc::new(record)
}

/// A mounted volume and its attributes.
///
/// A `Volume` is created from any path on the volume and queries the OS lazily: each attribute
/// is fetched the first time it is read and then cached until [`refresh`](Self::refresh) is
/// called. Cloning a `Volume` is cheap and the clone shares the attributes fetched so far; a
/// handle copies them before fetching more, so reads on one handle never change what another
/// one reports.
///
/// A handle whose path does not exist, or whose volume cannot be queried, is invalid: every
/// attribute then has its default value and no further OS calls are made.
///
/// `Volume` can be sent to another thread but not shared between threads, since reading an
/// attribute may update the cache.
///
/// ```no_run
/// use volinfo::Volume;
///
/// let volume = Volume::new("/home");
/// if volume.is_valid() && volume.is_ready() {
/// 	println!("{:?}: {} of {} bytes free", volume.root_path(), volume.bytes_free(), volume.bytes_total());
/// }
/// ```
pub struct Volume<B: Backend = NativeBackend> {
	backend: B,
	record: RefCell<Arc<VolumeRecord>>,
}

impl Volume {
	/// Creates a handle for the volume holding `path`.
	///
	/// Nothing is queried until an attribute is read.
	pub fn new(path: impl AsRef<Path>) -> Self {
		Self::with_backend(path, NativeBackend::default())
	}

	/// Returns the volume the operating system boots from.
	///
	/// On Unix this is the volume mounted on `/`. On Windows it is the volume holding the user
	/// profiles directory, which is normally the system drive.
	pub fn root_volume() -> Self {
		Volume {
			backend: NativeBackend::default(),
			record: RefCell::new(Arc::clone(&ROOT_RECORD)),
		}
	}

	/// Lists the mounted volumes, skipping pseudo file systems.
	///
	/// Returns just the [root volume](Self::root_volume) if the mount table cannot be read.
	pub fn enumerate_volumes() -> Vec<Self> {
		Self::enumerate_volumes_with(NativeBackend::default())
	}
}

impl<B: Backend> Volume<B> {
	/// Creates a handle for the volume holding `path`, queried through `backend`.
	pub fn with_backend(path: impl AsRef<Path>, backend: B) -> Self {
		Volume {
			backend,
			record: RefCell::new(Arc::new(VolumeRecord::with_path(path.as_ref().to_path_buf()))),
		}
	}

	/// Returns the volume `backend` considers the system root.
	pub fn root_volume_with(backend: B) -> Self {
		let record = root_record(&backend);
		Volume {
			backend,
			record: RefCell::new(record),
		}
	}

	/// Lists the volumes `backend` reports as mounted.
	///
	/// A mount point listed twice yields the volume mounted last. A device mounted in several
	/// places yields a single volume, preferably the root volume.
	pub fn enumerate_volumes_with(backend: B) -> Vec<Self> {
		let entries = backend.mounts();
		if entries.is_empty() {
			return vec![Self::root_volume_with(backend)];
		}
		let root_mount = root_mount_point(&backend, &entries);
		resolve::distinct_volumes(entries, root_mount.as_deref())
			.into_iter()
			.map(|entry| Volume {
				backend: backend.clone(),
				record: RefCell::new(Arc::new(VolumeRecord::from_entry(entry))),
			})
			.collect()
	}

	/// Points the handle at the volume holding `path` and drops all cached attributes.
	pub fn set_path(&mut self, path: impl AsRef<Path>) {
		*self.record.get_mut() = Arc::new(VolumeRecord::with_path(path.as_ref().to_path_buf()));
	}

	/// Drops all cached attributes so the next reads query the OS again.
	///
	/// Other handles cloned from this one keep their attributes.
	pub fn refresh(&mut self) {
		let path = self.record.get_mut().requested_path.clone();
		*self.record.get_mut() = Arc::new(VolumeRecord::with_path(path));
	}

	fn read<T>(&self, groups: CacheGroups, read: impl FnOnce(&VolumeRecord) -> T) -> T {
		let mut record = self.record.borrow_mut();
		if !cache::is_satisfied(&record, groups) {
			cache::ensure_cached(&self.backend, Arc::make_mut(&mut record), groups);
		}
		read(&**record)
	}

	/// Returns the mount point of the volume, or an empty path if the handle is invalid.
	pub fn root_path(&self) -> PathBuf {
		self.read(CacheGroups::IDENTITY, |r| r.root_path.clone())
	}

	/// Returns the device the volume is mounted from.
	///
	/// A device node like `/dev/sda1` on Unix and a `\\?\Volume{GUID}\` path on Windows. Network
	/// drives report their share path.
	pub fn device(&self) -> OsString {
		self.read(CacheGroups::IDENTITY, |r| r.device.clone())
	}

	/// Returns the name of the file system driver, e.g. `ext4`, `apfs` or `NTFS`.
	pub fn file_system_type(&self) -> String {
		self.read(CacheGroups::IDENTITY, |r| r.file_system_type.clone())
	}

	/// Returns the user-visible name of the volume.
	///
	/// Empty if the volume has no label, is not ready, or the platform cannot report labels.
	pub fn label(&self) -> String {
		self.read(CacheGroups::LABEL, |r| r.label.clone())
	}

	/// Returns the label, falling back to the device and then to the mount point.
	pub fn display_name(&self) -> String {
		self.read(CacheGroups::LABEL, |r| {
			if !r.label.is_empty() {
				r.label.clone()
			} else if !r.device.is_empty() {
				r.device.to_string_lossy().into_owned()
			} else {
				r.root_path.to_string_lossy().into_owned()
			}
		})
	}

	pub fn bytes_total(&self) -> u64 {
		self.read(CacheGroups::STAT, |r| r.bytes_total)
	}

	pub fn bytes_free(&self) -> u64 {
		self.read(CacheGroups::STAT, |r| r.bytes_free)
	}

	/// Returns the free bytes the calling user may use, which quotas can make smaller than
	/// [`bytes_free`](Self::bytes_free).
	pub fn bytes_available(&self) -> u64 {
		self.read(CacheGroups::STAT, |r| r.bytes_available)
	}

	pub fn is_read_only(&self) -> bool {
		self.read(CacheGroups::STAT, |r| r.read_only)
	}

	/// Returns `true` if the volume has media that can be read, which is `false` for an empty
	/// optical drive.
	pub fn is_ready(&self) -> bool {
		self.read(CacheGroups::STAT, |r| r.ready)
	}

	/// Returns `true` if the handle refers to an existing volume.
	pub fn is_valid(&self) -> bool {
		self.read(CacheGroups::STAT, |r| r.valid)
	}

	pub fn volume_type(&self) -> VolumeType {
		self.read(CacheGroups::TYPE, |r| r.volume_type)
	}

	pub fn capabilities(&self) -> Capabilities {
		self.read(CacheGroups::CAPABILITIES, |r| r.capabilities)
	}

	/// Returns `true` if the file system supports every capability in `capabilities`.
	pub fn has_capability(&self, capabilities: Capabilities) -> bool {
		self.capabilities().contains(capabilities)
	}

	/// Returns `true` if this is the volume the operating system boots from.
	///
	/// An invalid handle is never the root volume.
	pub fn is_root(&self) -> bool {
		self.is_valid() && *self == Self::root_volume_with(self.backend.clone())
	}
}

fn root_mount_point<B: Backend>(backend: &B, entries: &[MountEntry]) -> Option<PathBuf> {
	let root = backend.root_path();
	let root = std::fs::canonicalize(&root).unwrap_or(root);
	resolve::longest_prefix(&root, entries).map(|entry| entry.mount_point.clone())
}

impl<B: Backend + Default> Default for Volume<B> {
	/// Creates an invalid handle that refers to no volume.
	fn default() -> Self {
		Volume {
			backend: B::default(),
			record: RefCell::new(Arc::new(VolumeRecord::default())),
		}
	}
}

impl<B: Backend> Clone for Volume<B> {
	fn clone(&self) -> Self {
		Volume {
			backend: self.backend.clone(),
			record: RefCell::new(Arc::clone(&self.record.borrow())),
		}
	}
}

/// Two handles are equal if they share a snapshot or report the same device.
///
/// Invalid handles have no device and are therefore all equal to each other.
impl<B: Backend> PartialEq for Volume<B> {
	fn eq(&self, other: &Self) -> bool {
		if Arc::ptr_eq(&self.record.borrow(), &other.record.borrow()) {
			return true;
		}
		self.device() == other.device()
	}
}

impl<B: Backend> Eq for Volume<B> {}

impl<B: Backend> fmt::Debug for Volume<B> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self.record.try_borrow() {
			Ok(record) => f
				.debug_struct("Volume")
				.field("root_path", &record.root_path)
				.field("device", &record.device)
				.field("file_system_type", &record.file_system_type)
				.field("cached", &record.cached)
				.finish(),
			Err(_) => f.debug_struct("Volume").finish_non_exhaustive(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{testing::RecordingBackend, StatError};

	fn data_volume(backend: &RecordingBackend) -> Volume<RecordingBackend> {
		Volume::with_backend("/mnt/data/photos", backend.clone())
	}

	#[test]
	fn default_handle_is_invalid() {
		let volume = Volume::<RecordingBackend>::default();
		assert!(!volume.is_valid());
		assert!(!volume.is_ready());
		assert!(volume.root_path().as_os_str().is_empty());
		assert!(volume.device().is_empty());
		assert!(volume.label().is_empty());
		assert_eq!(volume.bytes_total(), 0);
		assert_eq!(volume.volume_type(), VolumeType::Unknown);
		assert!(volume.capabilities().is_empty());
	}

	#[test]
	fn accessors_resolve_lazily() {
		let backend = RecordingBackend::new();
		let volume = data_volume(&backend);
		assert!(backend.calls().is_empty());
		assert_eq!(volume.root_path(), Path::new("/mnt/data"));
		assert_eq!(volume.device(), "/dev/sdb1");
		assert_eq!(volume.bytes_free(), 400);
		assert_eq!(volume.label(), "Data");
		assert_eq!(volume.display_name(), "Data");
		assert!(volume.has_capability(Capabilities::JOURNALING));
		assert!(!volume.has_capability(Capabilities::JOURNALING | Capabilities::HARD_LINKS));
		assert_eq!(backend.calls(), vec!["identify", "stat", "label", "capabilities"]);
	}

	#[test]
	fn clones_share_fetched_attributes() {
		let backend = RecordingBackend::new();
		let volume = data_volume(&backend);
		assert_eq!(volume.bytes_free(), 400);
		let copy = volume.clone();
		backend.clear_calls();
		assert_eq!(copy.bytes_free(), 400);
		assert_eq!(copy.root_path(), Path::new("/mnt/data"));
		assert!(backend.calls().is_empty());
	}

	#[test]
	fn refresh_detaches_from_clones() {
		let backend = RecordingBackend::new();
		let volume = data_volume(&backend);
		assert_eq!(volume.bytes_free(), 400);
		let mut copy = volume.clone();

		backend.set_free_bytes(100);
		assert_eq!(volume.bytes_free(), 400);
		assert_eq!(copy.bytes_free(), 400);

		copy.refresh();
		assert_eq!(copy.bytes_free(), 100);
		assert_eq!(volume.bytes_free(), 400);
		assert_eq!(volume, copy);
	}

	#[test]
	fn fetching_on_a_clone_leaves_the_original_untouched() {
		let backend = RecordingBackend::new();
		let volume = data_volume(&backend);
		assert!(volume.is_valid());
		let copy = volume.clone();
		assert_eq!(copy.label(), "Data");
		let record = volume.record.borrow();
		assert!(!record.cached.contains(CacheGroups::LABEL));
	}

	#[test]
	fn set_path_switches_volume() {
		let backend = RecordingBackend::new();
		let mut volume = data_volume(&backend);
		assert_eq!(volume.device(), "/dev/sdb1");
		volume.set_path("/etc");
		assert_eq!(volume.device(), "/dev/sda1");
		assert_eq!(volume.root_path(), Path::new("/"));
	}

	#[test]
	fn invalid_handles_compare_equal() {
		let mut backend = RecordingBackend::new();
		backend.resolves = false;
		let missing = Volume::with_backend("/does/not/exist", backend.clone());
		let other_missing = Volume::with_backend("/also/missing", backend);
		assert!(!missing.is_valid());
		assert_eq!(missing, other_missing);
		assert_eq!(missing, Volume::<RecordingBackend>::default());
		assert_eq!(
			Volume::<RecordingBackend>::default(),
			Volume::<RecordingBackend>::default()
		);
	}

	#[test]
	fn missing_path_is_not_root_without_mount_table() {
		let mut backend = RecordingBackend::new();
		backend.mounts.clear();
		backend.resolves = false;
		let missing = Volume::with_backend("/does/not/exist", backend.clone());
		assert!(!missing.is_valid());
		assert!(!missing.is_root());
		assert!(!Volume::<RecordingBackend>::default().is_root());
	}

	#[test]
	fn enumerated_volume_reports_identity_consistently_after_failed_stat() {
		let backend = RecordingBackend::new();
		backend.set_stat(Err(StatError::Os(116)));
		let volumes = Volume::enumerate_volumes_with(backend.clone());
		let volume = &volumes[1];
		let first = volume.device();
		assert!(!volume.is_valid());
		assert_eq!(volume.device(), first);
		assert!(first.is_empty());
		assert_eq!(volume.file_system_type(), "");
		assert_eq!(backend.calls(), vec!["mounts", "stat"]);
	}

	#[test]
	fn enumerated_handles_compare_regardless_of_read_order() {
		let backend = RecordingBackend::new();
		backend.set_stat(Err(StatError::Os(116)));
		let volumes = Volume::enumerate_volumes_with(backend.clone());
		let read_first = volumes[1].clone();
		let _ = read_first.is_valid();
		assert_eq!(volumes[1], read_first);
		assert_eq!(volumes[0], volumes[1]);
	}

	#[test]
	fn failed_stat_clears_identity() {
		let backend = RecordingBackend::new();
		backend.set_stat(Err(StatError::Os(13)));
		let volume = data_volume(&backend);
		assert!(!volume.is_valid());
		assert_eq!(volume.root_path(), Path::new("/mnt/data"));
		assert!(volume.device().is_empty());
		assert!(volume.file_system_type().is_empty());
		assert_eq!(volume.display_name(), "/mnt/data");
	}

	#[test]
	fn enumeration_and_root() {
		let mut backend = RecordingBackend::new();
		backend.mounts.push(MountEntry::new("/media/usb", "/dev/sdb1", "vfat"));
		let volumes = Volume::enumerate_volumes_with(backend.clone());
		let roots: Vec<PathBuf> = volumes.iter().map(Volume::root_path).collect();
		assert_eq!(roots, vec![PathBuf::from("/"), PathBuf::from("/mnt/data")]);

		let root = Volume::root_volume_with(backend);
		assert!(root.is_root());
		assert_eq!(volumes.iter().filter(|v| **v == root).count(), 1);
		assert!(!volumes[1].is_root());
	}

	#[test]
	fn empty_mount_table_yields_root() {
		let mut backend = RecordingBackend::new();
		let mounts = std::mem::take(&mut backend.mounts);
		let volumes = Volume::enumerate_volumes_with(backend.clone());
		assert_eq!(volumes.len(), 1);
		assert!(!volumes[0].is_valid());
		backend.mounts = mounts;
		assert_eq!(Volume::with_backend("/", backend).device(), "/dev/sda1");
	}
}
