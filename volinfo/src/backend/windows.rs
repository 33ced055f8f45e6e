use std::{
	ffi::OsString,
	fs, mem,
	path::{Path, PathBuf},
	ptr,
};

use log::debug;
use widestring::{U16CStr, U16CString};
use winapi::{
	shared::{
		minwindef::{DWORD, LPVOID, MAX_PATH, TRUE, UINT},
		ntdef::PULARGE_INTEGER,
		winerror::{ERROR_MORE_DATA, ERROR_NOT_READY, NO_ERROR},
	},
	um::{
		errhandlingapi::{GetLastError, SetErrorMode},
		fileapi::{
			GetDiskFreeSpaceExW, GetDriveTypeW, GetLogicalDrives, GetVolumeInformationW,
			GetVolumeNameForVolumeMountPointW, GetVolumePathNameW,
		},
		userenv::GetProfilesDirectoryW,
		winbase::{
			DRIVE_CDROM, DRIVE_FIXED, DRIVE_RAMDISK, DRIVE_REMOTE, DRIVE_REMOVABLE,
			SEM_FAILCRITICALERRORS, SEM_NOOPENFILEERRORBOX,
		},
		winnetwk::{WNetGetUniversalNameW, UNIVERSAL_NAME_INFOW, UNIVERSAL_NAME_INFO_LEVEL},
		winnt::{
			FILE_CASE_PRESERVED_NAMES, FILE_CASE_SENSITIVE_SEARCH, FILE_READ_ONLY_VOLUME,
			FILE_SUPPORTS_HARD_LINKS, FILE_SUPPORTS_OBJECT_IDS, FILE_SUPPORTS_REPARSE_POINTS,
			FILE_SUPPORTS_SPARSE_FILES, FILE_SUPPORTS_USN_JOURNAL,
		},
	},
};

use super::Backend;
use crate::{Capabilities, MountEntry, StatError, StatInfo, VolumeType};

/// Backend for Windows drive letters and mounted folders.
#[derive(Debug, Copy, Clone, Default)]
pub struct WindowsBackend;

/// Suppresses the "insert a disk" dialog while querying removable drives.
struct ErrorModeGuard(UINT);

impl ErrorModeGuard {
	fn new() -> Self {
		ErrorModeGuard(unsafe { SetErrorMode(SEM_FAILCRITICALERRORS | SEM_NOOPENFILEERRORBOX) })
	}
}

impl Drop for ErrorModeGuard {
	fn drop(&mut self) {
		unsafe { SetErrorMode(self.0) };
	}
}

fn to_wide(path: &Path) -> Option<U16CString> {
	U16CString::from_os_str(path.as_os_str()).ok()
}

fn from_wide(buffer: &[u16]) -> OsString {
	U16CStr::from_slice_with_nul(buffer)
		.map(|s| s.to_os_string())
		.unwrap_or_default()
}

/// Turns a canonical path into `X:\...\` form, or `None` for paths without a drive letter.
fn drive_path(canonical: &Path) -> Option<String> {
	let lossy = canonical.to_string_lossy();
	let path = lossy.strip_prefix(r"\\?\").unwrap_or(&*lossy);
	let mut chars = path.chars();
	match (chars.next(), chars.next()) {
		(Some(letter), Some(':')) if letter.is_ascii_alphabetic() => {}
		_ => return None,
	}
	let mut path = format!("{}{}", path[..1].to_ascii_uppercase(), &path[1..]);
	if !path.ends_with('\\') {
		path.push('\\');
	}
	Some(path)
}

struct VolumeInformation {
	name: String,
	fs_flags: DWORD,
	fs_name: String,
}

fn volume_information(root: &Path) -> Result<VolumeInformation, StatError> {
	let wide = to_wide(root).ok_or(StatError::Os(0))?;
	let mut name = [0u16; MAX_PATH + 1];
	let mut fs_name = [0u16; MAX_PATH + 1];
	let mut fs_flags: DWORD = 0;
	let ok = unsafe {
		GetVolumeInformationW(
			wide.as_ptr(),
			name.as_mut_ptr(),
			name.len() as DWORD,
			ptr::null_mut(),
			ptr::null_mut(),
			&mut fs_flags,
			fs_name.as_mut_ptr(),
			fs_name.len() as DWORD,
		)
	};
	if ok != TRUE {
		let code = unsafe { GetLastError() };
		return Err(if code == ERROR_NOT_READY {
			StatError::NotReady
		} else {
			StatError::Os(code as i32)
		});
	}
	Ok(VolumeInformation {
		name: from_wide(&name).to_string_lossy().into_owned(),
		fs_flags,
		fs_name: from_wide(&fs_name).to_string_lossy().into_owned(),
	})
}

fn drive_type(root: &Path) -> VolumeType {
	let kind = match to_wide(root) {
		Some(wide) => unsafe { GetDriveTypeW(wide.as_ptr()) },
		None => return VolumeType::Unknown,
	};
	match kind {
		DRIVE_REMOVABLE => VolumeType::Removable,
		DRIVE_FIXED => VolumeType::Internal,
		DRIVE_REMOTE => VolumeType::Remote,
		DRIVE_CDROM => VolumeType::Optical,
		DRIVE_RAMDISK => VolumeType::Ram,
		_ => VolumeType::Unknown,
	}
}

/// Returns the `\\?\Volume{GUID}\` path of a local volume.
fn volume_guid_path(root: &Path) -> OsString {
	let wide = match to_wide(root) {
		Some(wide) => wide,
		None => return OsString::new(),
	};
	let mut buffer = [0u16; MAX_PATH + 1];
	let ok = unsafe {
		GetVolumeNameForVolumeMountPointW(wide.as_ptr(), buffer.as_mut_ptr(), buffer.len() as DWORD)
	};
	if ok != TRUE {
		debug!("no volume name for {:?}: error {}", root, unsafe { GetLastError() });
		return OsString::new();
	}
	from_wide(&buffer)
}

/// Returns the `\\server\share` path a network drive is mapped to.
fn universal_name(root: &Path) -> OsString {
	let wide = match to_wide(root) {
		Some(wide) => wide,
		None => return OsString::new(),
	};
	// UNIVERSAL_NAME_INFOW is followed by the string it points to.
	let mut buffer: Vec<u8> = vec![0; mem::size_of::<UNIVERSAL_NAME_INFOW>() + 2 * (MAX_PATH + 1)];
	loop {
		let mut size = buffer.len() as DWORD;
		let result = unsafe {
			WNetGetUniversalNameW(
				wide.as_ptr(),
				UNIVERSAL_NAME_INFO_LEVEL,
				buffer.as_mut_ptr() as LPVOID,
				&mut size,
			)
		};
		match result {
			NO_ERROR => break,
			ERROR_MORE_DATA if size as usize > buffer.len() => buffer.resize(size as usize, 0),
			_ => {
				debug!("no universal name for {:?}: error {}", root, result);
				return OsString::new();
			}
		}
	}
	unsafe {
		let info = &*(buffer.as_ptr() as *const UNIVERSAL_NAME_INFOW);
		if info.lpUniversalName.is_null() {
			return OsString::new();
		}
		U16CStr::from_ptr_str(info.lpUniversalName).to_os_string()
	}
}

fn describe(root: PathBuf) -> MountEntry {
	let device = if drive_type(&root) == VolumeType::Remote {
		universal_name(&root)
	} else {
		volume_guid_path(&root)
	};
	let file_system_type = volume_information(&root)
		.map(|info| info.fs_name)
		.unwrap_or_default();
	MountEntry {
		mount_point: root,
		device,
		file_system_type,
	}
}

/// Finds the root of the volume holding `path`, which may be a mounted folder.
fn volume_path_name(path: &str) -> Option<PathBuf> {
	let wide = U16CString::from_str(path).ok()?;
	let mut buffer = [0u16; MAX_PATH + 1];
	let ok = unsafe { GetVolumePathNameW(wide.as_ptr(), buffer.as_mut_ptr(), buffer.len() as DWORD) };
	if ok != TRUE {
		debug!("no volume holds {}: error {}", path, unsafe { GetLastError() });
		return None;
	}
	Some(PathBuf::from(from_wide(&buffer)))
}

fn capabilities_from_flags(fs_flags: DWORD, fs_name: &str) -> Capabilities {
	const FLAGS: &[(DWORD, Capabilities)] = &[
		(FILE_SUPPORTS_OBJECT_IDS, Capabilities::PERSISTENT_IDS),
		(FILE_SUPPORTS_HARD_LINKS, Capabilities::HARD_LINKS),
		(FILE_SUPPORTS_USN_JOURNAL, Capabilities::JOURNALING),
		(FILE_SUPPORTS_SPARSE_FILES, Capabilities::SPARSE_FILES),
		(FILE_CASE_SENSITIVE_SEARCH, Capabilities::CASE_SENSITIVE_NAMES),
		(FILE_CASE_PRESERVED_NAMES, Capabilities::CASE_PRESERVED_NAMES),
		(FILE_SUPPORTS_REPARSE_POINTS, Capabilities::SYMBOLIC_LINKS),
	];
	let mut capabilities = FLAGS
		.iter()
		.filter(|(flag, _)| fs_flags & flag != 0)
		.fold(Capabilities::empty(), |acc, (_, capability)| acc | *capability);
	if fs_name.eq_ignore_ascii_case("NTFS") {
		capabilities |= Capabilities::SYMBOLIC_LINKS;
	}
	capabilities
}

impl Backend for WindowsBackend {
	fn mounts(&self) -> Vec<MountEntry> {
		let _mode = ErrorModeGuard::new();
		let drives = unsafe { GetLogicalDrives() } & 0x3ff_ffff;
		(0..26u8)
			.filter(|bit| drives & (1 << bit) != 0)
			.filter_map(|bit| volume_path_name(&format!("{}:\\", (b'A' + bit) as char)))
			.map(describe)
			.collect()
	}

	fn identify(&self, path: &Path) -> Option<MountEntry> {
		let canonical = match fs::canonicalize(path) {
			Ok(canonical) => canonical,
			Err(err) => {
				debug!("cannot canonicalize {:?}: {}", path, err);
				return None;
			}
		};
		let drive = drive_path(&canonical)?;
		let _mode = ErrorModeGuard::new();
		volume_path_name(&drive).map(describe)
	}

	fn stat(&self, entry: &MountEntry) -> Result<StatInfo, StatError> {
		let _mode = ErrorModeGuard::new();
		let info = volume_information(&entry.mount_point)?;
		let mut available = 0u64;
		let mut total = 0u64;
		let mut free = 0u64;
		if let Some(wide) = to_wide(&entry.mount_point) {
			let ok = unsafe {
				GetDiskFreeSpaceExW(
					wide.as_ptr(),
					&mut available as *mut u64 as PULARGE_INTEGER,
					&mut total as *mut u64 as PULARGE_INTEGER,
					&mut free as *mut u64 as PULARGE_INTEGER,
				)
			};
			if ok != TRUE {
				debug!("no free space for {:?}: error {}", entry.mount_point, unsafe { GetLastError() });
			}
		}
		Ok(StatInfo {
			byte_count: total,
			free_byte_count: free,
			available_byte_count: available,
			read_only: info.fs_flags & FILE_READ_ONLY_VOLUME != 0,
		})
	}

	fn label(&self, entry: &MountEntry) -> String {
		let _mode = ErrorModeGuard::new();
		volume_information(&entry.mount_point)
			.map(|info| info.name)
			.unwrap_or_default()
	}

	fn volume_type(&self, entry: &MountEntry) -> VolumeType {
		drive_type(&entry.mount_point)
	}

	fn capabilities(&self, entry: &MountEntry) -> Capabilities {
		let _mode = ErrorModeGuard::new();
		volume_information(&entry.mount_point)
			.map(|info| capabilities_from_flags(info.fs_flags, &info.fs_name))
			.unwrap_or_default()
	}

	fn root_path(&self) -> PathBuf {
		let mut size: DWORD = 0;
		unsafe { GetProfilesDirectoryW(ptr::null_mut(), &mut size) };
		let mut buffer = vec![0u16; size.max(1) as usize];
		if unsafe { GetProfilesDirectoryW(buffer.as_mut_ptr(), &mut size) } != TRUE {
			debug!("no profiles directory: error {}", unsafe { GetLastError() });
			return PathBuf::new();
		}
		PathBuf::from(from_wide(&buffer))
	}
}
