use std::{io, ptr, slice};

use lazy_static::lazy_static;
use log::warn;
use parking_lot::Mutex;

lazy_static! {
	/// `getmntinfo` hands out a buffer that the next call from any thread reuses.
	static ref GETMNTINFO_LOCK: Mutex<()> = Mutex::new(());
}

/// Runs `map` over every `statfs` returned by `getmntinfo(MNT_NOWAIT)`.
///
/// Returns an empty list if the mounts cannot be listed.
pub(super) fn map_mounted<T>(map: impl FnMut(&libc::statfs) -> Option<T>) -> Vec<T> {
	let _guard = GETMNTINFO_LOCK.lock();
	let mut buf: *mut libc::statfs = ptr::null_mut();
	let count = unsafe { libc::getmntinfo(&mut buf, libc::MNT_NOWAIT) };
	if count <= 0 || buf.is_null() {
		warn!("cannot list mounts: {}", io::Error::last_os_error());
		return Vec::new();
	}
	let stats = unsafe { slice::from_raw_parts(buf, count as usize) };
	stats.iter().filter_map(map).collect()
}
