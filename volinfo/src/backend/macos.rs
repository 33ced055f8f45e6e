use std::{
	ffi::{CString, OsStr, OsString},
	fs, io, mem,
	os::unix::ffi::{OsStrExt, OsStringExt},
	path::{Path, PathBuf},
	ptr,
};

use libc::{c_char, c_void};
use log::debug;
use volinfo_sys::*;

use super::{mntinfo, Backend};
use crate::{classify, mount_table, Capabilities, MountEntry, StatError, StatInfo, VolumeType};

/// Backend for macOS, combining BSD mount information with CoreFoundation volume properties and
/// Disk Arbitration media descriptions.
#[derive(Debug, Copy, Clone, Default)]
pub struct MacBackend;

/// Releases a CoreFoundation object when dropped.
struct CfOwned(CFTypeRef);

impl Drop for CfOwned {
	fn drop(&mut self) {
		if !self.0.is_null() {
			unsafe { CFRelease(self.0) };
		}
	}
}

/// Resource properties of a volume URL.
struct VolumeProperties {
	map: CfOwned,
}

impl VolumeProperties {
	fn load(path: &Path, keys: &[CFStringRef]) -> Option<Self> {
		let bytes = path.as_os_str().as_bytes();
		unsafe {
			let url = CFURLCreateFromFileSystemRepresentation(
				kCFAllocatorDefault,
				bytes.as_ptr(),
				bytes.len() as CFIndex,
				1,
			);
			if url.is_null() {
				return None;
			}
			let url = CfOwned(url as CFTypeRef);
			let key_array = CFArrayCreate(
				kCFAllocatorDefault,
				keys.as_ptr() as *const *const c_void,
				keys.len() as CFIndex,
				&kCFTypeArrayCallBacks,
			);
			if key_array.is_null() {
				return None;
			}
			let key_array = CfOwned(key_array as CFTypeRef);
			let mut error: CFErrorRef = ptr::null_mut();
			let map = CFURLCopyResourcePropertiesForKeys(
				url.0 as CFURLRef,
				key_array.0 as CFArrayRef,
				&mut error,
			);
			drop(CfOwned(error as CFTypeRef));
			if map.is_null() {
				debug!("cannot read volume properties of {:?}", path);
				return None;
			}
			Some(VolumeProperties {
				map: CfOwned(map as CFTypeRef),
			})
		}
	}

	fn value(&self, key: CFStringRef) -> *const c_void {
		unsafe { CFDictionaryGetValue(self.map.0 as CFDictionaryRef, key as *const c_void) }
	}

	fn int64(&self, key: CFStringRef) -> Option<i64> {
		let number = self.value(key);
		if number.is_null() {
			return None;
		}
		let mut value: i64 = 0;
		let ok = unsafe {
			CFNumberGetValue(
				number as CFNumberRef,
				kCFNumberSInt64Type,
				&mut value as *mut i64 as *mut c_void,
			)
		};
		if ok != 0 {
			Some(value)
		} else {
			None
		}
	}

	fn flag(&self, key: CFStringRef) -> bool {
		let boolean = self.value(key);
		!boolean.is_null() && unsafe { CFBooleanGetValue(boolean as CFBooleanRef) } != 0
	}

	fn string(&self, key: CFStringRef) -> Option<String> {
		let string = self.value(key) as CFStringRef;
		if string.is_null() {
			return None;
		}
		cf_string_to_string(string)
	}
}

fn cf_string_to_string(string: CFStringRef) -> Option<String> {
	unsafe {
		let length = CFStringGetLength(string);
		let capacity = CFStringGetMaximumSizeForEncoding(length, kCFStringEncodingUTF8) + 1;
		let mut buffer = vec![0 as c_char; capacity as usize];
		if CFStringGetCString(string, buffer.as_mut_ptr(), capacity, kCFStringEncodingUTF8) == 0 {
			return None;
		}
		let bytes: Vec<u8> = buffer.iter().take_while(|c| **c != 0).map(|c| *c as u8).collect();
		String::from_utf8(bytes).ok()
	}
}

fn c_chars_to_os_string(chars: &[c_char]) -> OsString {
	OsString::from_vec(
		chars
			.iter()
			.take_while(|c| **c != 0)
			.map(|c| *c as u8)
			.collect(),
	)
}

fn entry_from_statfs(stat: &libc::statfs) -> MountEntry {
	MountEntry {
		mount_point: PathBuf::from(c_chars_to_os_string(&stat.f_mntonname)),
		device: c_chars_to_os_string(&stat.f_mntfromname),
		file_system_type: c_chars_to_os_string(&stat.f_fstypename)
			.to_string_lossy()
			.into_owned(),
	}
}

fn statfs(path: &Path) -> io::Result<libc::statfs> {
	let c_path = CString::new(path.as_os_str().as_bytes())
		.map_err(|_| io::Error::from_raw_os_error(libc::EINVAL))?;
	let mut buf: libc::statfs = unsafe { mem::zeroed() };
	loop {
		if unsafe { libc::statfs(c_path.as_ptr(), &mut buf) } == 0 {
			return Ok(buf);
		}
		let err = io::Error::last_os_error();
		if err.kind() != io::ErrorKind::Interrupted {
			return Err(err);
		}
	}
}

/// Classifies a disk through its Disk Arbitration description.
fn disk_arbitration_type(device: &OsStr) -> VolumeType {
	let bsd_name = Path::new(device)
		.strip_prefix("/dev")
		.map(|name| name.as_os_str())
		.unwrap_or(device);
	let bsd_name = match CString::new(bsd_name.as_bytes()) {
		Ok(name) => name,
		Err(_) => return VolumeType::Unknown,
	};
	unsafe {
		let session = DASessionCreate(kCFAllocatorDefault);
		if session.is_null() {
			return VolumeType::Unknown;
		}
		let session = CfOwned(session as CFTypeRef);
		let disk = DADiskCreateFromBSDName(kCFAllocatorDefault, session.0 as DASessionRef, bsd_name.as_ptr());
		if disk.is_null() {
			return VolumeType::Unknown;
		}
		let disk = CfOwned(disk as CFTypeRef);
		let description = DADiskCopyDescription(disk.0 as DADiskRef);
		if description.is_null() {
			return VolumeType::Remote;
		}
		let description = CfOwned(description as CFTypeRef);
		let lookup = |key: CFStringRef| {
			let value = CFDictionaryGetValue(description.0 as CFDictionaryRef, key as *const c_void);
			!value.is_null() && CFBooleanGetValue(value as CFBooleanRef) != 0
		};
		if lookup(kDADiskDescriptionVolumeNetworkKey) {
			return VolumeType::Remote;
		}
		if is_optical(disk.0 as DADiskRef) {
			return VolumeType::Optical;
		}
		if lookup(kDADiskDescriptionMediaRemovableKey) {
			VolumeType::Removable
		} else {
			VolumeType::Internal
		}
	}
}

unsafe fn is_optical(disk: DADiskRef) -> bool {
	let whole = DADiskCopyWholeDisk(disk);
	if whole.is_null() {
		return false;
	}
	let whole = CfOwned(whole as CFTypeRef);
	let media = DADiskCopyIOMedia(whole.0 as DADiskRef);
	if media == IO_OBJECT_NULL {
		return false;
	}
	let optical = [kIOCDMediaClass, kIODVDMediaClass, kIOBDMediaClass]
		.iter()
		.any(|class| IOObjectConformsTo(media, class.as_ptr() as *const c_char) != 0);
	IOObjectRelease(media);
	optical
}

impl Backend for MacBackend {
	fn mounts(&self) -> Vec<MountEntry> {
		mntinfo::map_mounted(|stat| {
			if stat.f_flags & MNT_DONTBROWSE != 0 {
				return None;
			}
			Some(entry_from_statfs(stat))
				.filter(|entry| !mount_table::is_pseudo_fs(&entry.mount_point, &entry.file_system_type))
		})
	}

	fn identify(&self, path: &Path) -> Option<MountEntry> {
		let canonical = match fs::canonicalize(path) {
			Ok(canonical) => canonical,
			Err(err) => {
				debug!("cannot canonicalize {:?}: {}", path, err);
				return None;
			}
		};
		match statfs(&canonical) {
			Ok(stat) => Some(entry_from_statfs(&stat)),
			Err(err) => {
				debug!("cannot statfs {:?}: {}", canonical, err);
				None
			}
		}
	}

	fn stat(&self, entry: &MountEntry) -> Result<StatInfo, StatError> {
		let stat = statfs(&entry.mount_point)?;
		let block_size = stat.f_bsize as u64;
		let keys = unsafe { [kCFURLVolumeTotalCapacityKey, kCFURLVolumeAvailableCapacityKey] };
		let properties = VolumeProperties::load(&entry.mount_point, &keys);
		let capacity = |key: CFStringRef| {
			properties
				.as_ref()
				.and_then(|properties| properties.int64(key))
				.map(|value| value.max(0) as u64)
		};
		Ok(StatInfo {
			byte_count: capacity(keys[0]).unwrap_or_else(|| (stat.f_blocks as u64).saturating_mul(block_size)),
			free_byte_count: (stat.f_bfree as u64).saturating_mul(block_size),
			available_byte_count: capacity(keys[1])
				.unwrap_or_else(|| (stat.f_bavail as u64).saturating_mul(block_size)),
			read_only: stat.f_flags & libc::MNT_RDONLY as u32 != 0,
		})
	}

	fn label(&self, entry: &MountEntry) -> String {
		let key = unsafe { kCFURLVolumeNameKey };
		VolumeProperties::load(&entry.mount_point, &[key])
			.and_then(|properties| properties.string(key))
			.unwrap_or_default()
	}

	fn volume_type(&self, entry: &MountEntry) -> VolumeType {
		classify::with_network_fallback(disk_arbitration_type(&entry.device), entry)
	}

	fn capabilities(&self, entry: &MountEntry) -> Capabilities {
		let flags = unsafe {
			[
				(kCFURLVolumeSupportsSymbolicLinksKey, Capabilities::SYMBOLIC_LINKS),
				(kCFURLVolumeSupportsHardLinksKey, Capabilities::HARD_LINKS),
				(kCFURLVolumeSupportsCaseSensitiveNamesKey, Capabilities::CASE_SENSITIVE_NAMES),
				(kCFURLVolumeSupportsCasePreservedNamesKey, Capabilities::CASE_PRESERVED_NAMES),
				(kCFURLVolumeSupportsJournalingKey, Capabilities::JOURNALING),
				(kCFURLVolumeSupportsSparseFilesKey, Capabilities::SPARSE_FILES),
				(kCFURLVolumeSupportsPersistentIDsKey, Capabilities::PERSISTENT_IDS),
			]
		};
		let keys: Vec<CFStringRef> = flags.iter().map(|(key, _)| *key).collect();
		let properties = match VolumeProperties::load(&entry.mount_point, &keys) {
			Some(properties) => properties,
			None => return Capabilities::empty(),
		};
		flags
			.iter()
			.filter(|(key, _)| properties.flag(*key))
			.fold(Capabilities::empty(), |acc, (_, capability)| acc | *capability)
	}

	fn root_path(&self) -> PathBuf {
		PathBuf::from("/")
	}
}
