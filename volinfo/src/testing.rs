//! In-memory backend for unit tests.

use std::{
	cell::RefCell,
	path::{Path, PathBuf},
	rc::Rc,
};

use crate::{resolve, Backend, Capabilities, MountEntry, StatError, StatInfo, VolumeType};

/// Serves a fixed mount table and records every call made to it.
///
/// Clones share the call log and the stat result, so a test can change what the volume reports
/// after handles have been created.
#[derive(Clone)]
pub(crate) struct RecordingBackend {
	calls: Rc<RefCell<Vec<&'static str>>>,
	stat_result: Rc<RefCell<Result<StatInfo, StatError>>>,
	pub mounts: Vec<MountEntry>,
	pub resolves: bool,
}

impl RecordingBackend {
	pub fn new() -> Self {
		RecordingBackend {
			calls: Rc::new(RefCell::new(Vec::new())),
			stat_result: Rc::new(RefCell::new(Ok(StatInfo {
				byte_count: 1000,
				free_byte_count: 400,
				available_byte_count: 300,
				read_only: false,
			}))),
			mounts: vec![
				MountEntry::new("/", "/dev/sda1", "ext4"),
				MountEntry::new("/mnt/data", "/dev/sdb1", "ext4"),
			],
			resolves: true,
		}
	}

	pub fn calls(&self) -> Vec<&'static str> {
		self.calls.borrow().clone()
	}

	pub fn clear_calls(&self) {
		self.calls.borrow_mut().clear();
	}

	pub fn set_stat(&self, result: Result<StatInfo, StatError>) {
		*self.stat_result.borrow_mut() = result;
	}

	pub fn set_free_bytes(&self, free: u64) {
		if let Ok(info) = &mut *self.stat_result.borrow_mut() {
			info.free_byte_count = free;
		}
	}

	fn log(&self, call: &'static str) {
		self.calls.borrow_mut().push(call);
	}
}

impl Default for RecordingBackend {
	fn default() -> Self {
		Self::new()
	}
}

impl Backend for RecordingBackend {
	fn mounts(&self) -> Vec<MountEntry> {
		self.log("mounts");
		self.mounts.clone()
	}

	fn identify(&self, path: &Path) -> Option<MountEntry> {
		self.log("identify");
		if !self.resolves {
			return None;
		}
		resolve::longest_prefix(path, &self.mounts).cloned()
	}

	fn stat(&self, _entry: &MountEntry) -> Result<StatInfo, StatError> {
		self.log("stat");
		self.stat_result.borrow().clone()
	}

	fn label(&self, _entry: &MountEntry) -> String {
		self.log("label");
		"Data".to_owned()
	}

	fn volume_type(&self, _entry: &MountEntry) -> VolumeType {
		self.log("volume_type");
		VolumeType::Removable
	}

	fn capabilities(&self, _entry: &MountEntry) -> Capabilities {
		self.log("capabilities");
		Capabilities::SYMBOLIC_LINKS | Capabilities::JOURNALING
	}

	fn root_path(&self) -> PathBuf {
		PathBuf::from("/")
	}
}
