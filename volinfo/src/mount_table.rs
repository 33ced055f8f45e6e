//! Text mount tables (`/proc/self/mounts`, `/etc/mtab`, `/etc/mnttab`) and the pseudo file
//! system filter shared by every Unix backend.

// Systems with getmntinfo only need the filter.
#![cfg_attr(any(target_os = "macos", target_os = "freebsd", target_os = "openbsd"), allow(dead_code))]

use std::{
	ffi::OsString,
	fs,
	os::unix::ffi::OsStringExt,
	path::{Path, PathBuf},
};

use log::warn;

use crate::MountEntry;

const PSEUDO_FS_TYPES: &[&str] = &[
	"anon_inodefs",
	"autofs",
	"bdev",
	"binfmt_misc",
	"bpf",
	"cgroup",
	"cgroup2",
	"configfs",
	"cpuset",
	"debugfs",
	"devpts",
	"devtmpfs",
	"efivarfs",
	"fuse",
	"fuse.gvfsd-fuse",
	"fuse.portal",
	"fusectl",
	"hugetlbfs",
	"mqueue",
	"none",
	"nsfs",
	"pipefs",
	"proc",
	"pstore",
	"ramfs",
	"rootfs",
	"rpc_pipefs",
	"securityfs",
	"selinuxfs",
	"sockfs",
	"sysfs",
	"tmpfs",
	"tracefs",
	"usbfs",
	// BSD, macOS and Solaris
	"ctfs",
	"devfs",
	"fd",
	"fdescfs",
	"kernfs",
	"linprocfs",
	"linsysfs",
	"mntfs",
	"objfs",
	"procfs",
	"ptyfs",
	"sharefs",
];

const PSEUDO_FS_PREFIXES: &[&str] = &["fuse.vmware"];

const SYSTEM_DIRS: &[&str] = &["/dev", "/proc", "/sys", "/run"];

const USER_DIRS_UNDER_SYSTEM: &[&str] = &["/run/media"];

/// Returns `true` for mounts that hold no user data: kernel interfaces, memory file systems
/// and anything mounted below the system directories.
pub(crate) fn is_pseudo_fs(mount_point: &Path, file_system_type: &str) -> bool {
	if PSEUDO_FS_TYPES.contains(&file_system_type)
		|| PSEUDO_FS_PREFIXES
			.iter()
			.any(|prefix| file_system_type.starts_with(prefix))
	{
		return true;
	}
	if USER_DIRS_UNDER_SYSTEM
		.iter()
		.any(|dir| mount_point.starts_with(dir))
	{
		return false;
	}
	SYSTEM_DIRS.iter().any(|dir| mount_point.starts_with(dir))
}

/// Reads the mount table at `path`, keeping only real volumes.
///
/// An unreadable table yields no entries.
pub(crate) fn read_mount_table(path: &Path) -> Vec<MountEntry> {
	match fs::read(path) {
		Ok(text) => parse_mount_table(&text)
			.into_iter()
			.filter(|entry| !is_pseudo_fs(&entry.mount_point, &entry.file_system_type))
			.collect(),
		Err(err) => {
			warn!("cannot read mount table {:?}: {}", path, err);
			Vec::new()
		}
	}
}

/// Parses `device mount_point type ...` lines. Blank lines, comments and lines with fewer than
/// three fields are skipped.
pub(crate) fn parse_mount_table(text: &[u8]) -> Vec<MountEntry> {
	text.split(|b| *b == b'\n')
		.filter_map(|line| {
			let mut fields = line
				.split(|b| *b == b' ' || *b == b'\t')
				.filter(|field| !field.is_empty());
			let device = fields.next()?;
			if device.starts_with(b"#") {
				return None;
			}
			let mount_point = fields.next()?;
			let file_system_type = fields.next()?;
			Some(MountEntry {
				mount_point: PathBuf::from(OsString::from_vec(unescape(mount_point))),
				device: OsString::from_vec(unescape(device)),
				file_system_type: String::from_utf8_lossy(&unescape(file_system_type)).into_owned(),
			})
		})
		.collect()
}

/// Decodes the `\ooo` octal escapes the kernel uses for whitespace and backslashes.
fn unescape(field: &[u8]) -> Vec<u8> {
	let mut out = Vec::with_capacity(field.len());
	let mut i = 0;
	while i < field.len() {
		if field[i] == b'\\' && i + 3 < field.len() && is_octal_escape(&field[i + 1..i + 4]) {
			let digits = &field[i + 1..i + 4];
			out.push((digits[0] - b'0') * 64 + (digits[1] - b'0') * 8 + (digits[2] - b'0'));
			i += 4;
		} else {
			out.push(field[i]);
			i += 1;
		}
	}
	out
}

fn is_octal_escape(digits: &[u8]) -> bool {
	digits[0] <= b'3' && digits.iter().all(|d| (b'0'..=b'7').contains(d))
}
