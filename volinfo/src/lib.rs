//! Information about mounted volumes: where they are mounted, what they are mounted from, how
//! much space is left and what their file systems can do.
//!
//! A [`Volume`] is created from any path on the volume it describes and fetches its attributes
//! lazily, so constructing one is cheap and only the attributes that are actually read cost an
//! OS call. [`Volume::enumerate_volumes`] lists every mounted volume that holds user data;
//! kernel interfaces and memory file systems such as `proc` or `tmpfs` are left out.
//!
//! ```no_run
//! use volinfo::Volume;
//!
//! for volume in Volume::enumerate_volumes() {
//! 	if volume.is_ready() {
//! 		println!(
//! 			"{} on {:?} ({}): {} bytes free",
//! 			volume.display_name(),
//! 			volume.root_path(),
//! 			volume.file_system_type(),
//! 			volume.bytes_available(),
//! 		);
//! 	}
//! }
//! ```
//!
//! Information is read through a [`Backend`]. [`NativeBackend`] is the one for the current OS;
//! supplying another implementation through [`Volume::with_backend`] lets tests run against a
//! fixed mount table. On Linux, [`PosixOptions`] redirects the native backend to other copies
//! of the mount table and sysfs.

mod backend;
mod cache;
#[cfg(not(any(windows, target_os = "macos")))]
mod capability_table;
#[cfg(unix)]
mod classify;
mod data;
#[cfg(unix)]
mod mount_table;
mod resolve;
mod volume;

#[cfg(test)]
mod testing;

pub use backend::*;
pub use data::*;
pub use volume::Volume;
