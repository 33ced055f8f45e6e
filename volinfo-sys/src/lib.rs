#![cfg(target_os = "macos")]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]

//! Raw FFI bindings for the parts of [CoreFoundation], [DiskArbitration] and [IOKit] that
//! `volinfo` needs to describe a mounted volume.
//!
//! Only the handful of functions and keys used to read URL resource properties and disk
//! descriptions are declared here. For more information, refer to Apple's documentation of the
//! corresponding items.
//!
//! [CoreFoundation]: https://developer.apple.com/documentation/corefoundation
//! [DiskArbitration]: https://developer.apple.com/documentation/diskarbitration
//! [IOKit]: https://developer.apple.com/documentation/iokit

extern crate libc;

use libc::{c_char, c_int, c_void};

pub type Boolean = u8;
pub type CFIndex = isize;
pub type CFTypeRef = *const c_void;
pub type CFStringEncoding = u32;
pub type CFNumberType = CFIndex;

#[repr(C)]
pub struct __CFAllocator(c_void);
pub type CFAllocatorRef = *const __CFAllocator;

#[repr(C)]
pub struct __CFString(c_void);
pub type CFStringRef = *const __CFString;

#[repr(C)]
pub struct __CFURL(c_void);
pub type CFURLRef = *const __CFURL;

#[repr(C)]
pub struct __CFArray(c_void);
pub type CFArrayRef = *const __CFArray;

#[repr(C)]
pub struct __CFDictionary(c_void);
pub type CFDictionaryRef = *const __CFDictionary;

#[repr(C)]
pub struct __CFNumber(c_void);
pub type CFNumberRef = *const __CFNumber;

#[repr(C)]
pub struct __CFBoolean(c_void);
pub type CFBooleanRef = *const __CFBoolean;

#[repr(C)]
pub struct __CFError(c_void);
pub type CFErrorRef = *mut __CFError;

#[repr(C)]
pub struct __DASession(c_void);
pub type DASessionRef = *const __DASession;

#[repr(C)]
pub struct __DADisk(c_void);
pub type DADiskRef = *const __DADisk;

pub type mach_port_t = u32;
pub type io_object_t = mach_port_t;
pub type io_service_t = io_object_t;
pub type kern_return_t = c_int;

pub const IO_OBJECT_NULL: io_object_t = 0;

pub const kCFStringEncodingUTF8: CFStringEncoding = 0x0800_0100;
pub const kCFNumberSInt64Type: CFNumberType = 4;

pub const kIOCDMediaClass: &[u8] = b"IOCDMedia\0";
pub const kIODVDMediaClass: &[u8] = b"IODVDMedia\0";
pub const kIOBDMediaClass: &[u8] = b"IOBDMedia\0";

/// `statfs::f_flags` bit for volumes that should not be shown to the user.
pub const MNT_DONTBROWSE: u32 = 0x0010_0000;

#[repr(C)]
pub struct CFArrayCallBacks {
	pub version: CFIndex,
	pub retain: *const c_void,
	pub release: *const c_void,
	pub copyDescription: *const c_void,
	pub equal: *const c_void,
}

extern "C" {
	pub static kCFAllocatorDefault: CFAllocatorRef;
	pub static kCFTypeArrayCallBacks: CFArrayCallBacks;

	pub static kCFURLVolumeNameKey: CFStringRef;
	pub static kCFURLVolumeTotalCapacityKey: CFStringRef;
	pub static kCFURLVolumeAvailableCapacityKey: CFStringRef;
	pub static kCFURLVolumeSupportsPersistentIDsKey: CFStringRef;
	pub static kCFURLVolumeSupportsSymbolicLinksKey: CFStringRef;
	pub static kCFURLVolumeSupportsHardLinksKey: CFStringRef;
	pub static kCFURLVolumeSupportsJournalingKey: CFStringRef;
	pub static kCFURLVolumeSupportsSparseFilesKey: CFStringRef;
	pub static kCFURLVolumeSupportsCaseSensitiveNamesKey: CFStringRef;
	pub static kCFURLVolumeSupportsCasePreservedNamesKey: CFStringRef;

	pub fn CFRelease(cf: CFTypeRef);

	pub fn CFArrayCreate(
		allocator: CFAllocatorRef,
		values: *const *const c_void,
		numValues: CFIndex,
		callBacks: *const CFArrayCallBacks,
	) -> CFArrayRef;

	pub fn CFURLCreateFromFileSystemRepresentation(
		allocator: CFAllocatorRef,
		buffer: *const u8,
		bufLen: CFIndex,
		isDirectory: Boolean,
	) -> CFURLRef;

	pub fn CFURLCopyResourcePropertiesForKeys(
		url: CFURLRef,
		keys: CFArrayRef,
		error: *mut CFErrorRef,
	) -> CFDictionaryRef;

	pub fn CFDictionaryGetValue(theDict: CFDictionaryRef, key: *const c_void) -> *const c_void;

	pub fn CFNumberGetValue(number: CFNumberRef, theType: CFNumberType, valuePtr: *mut c_void) -> Boolean;

	pub fn CFBooleanGetValue(boolean: CFBooleanRef) -> Boolean;

	pub fn CFStringGetLength(theString: CFStringRef) -> CFIndex;

	pub fn CFStringGetMaximumSizeForEncoding(length: CFIndex, encoding: CFStringEncoding) -> CFIndex;

	pub fn CFStringGetCString(
		theString: CFStringRef,
		buffer: *mut c_char,
		bufferSize: CFIndex,
		encoding: CFStringEncoding,
	) -> Boolean;
}

extern "C" {
	pub static kDADiskDescriptionVolumeNetworkKey: CFStringRef;
	pub static kDADiskDescriptionMediaRemovableKey: CFStringRef;

	pub fn DASessionCreate(allocator: CFAllocatorRef) -> DASessionRef;

	pub fn DADiskCreateFromBSDName(
		allocator: CFAllocatorRef,
		session: DASessionRef,
		name: *const c_char,
	) -> DADiskRef;

	pub fn DADiskCopyDescription(disk: DADiskRef) -> CFDictionaryRef;

	pub fn DADiskCopyWholeDisk(disk: DADiskRef) -> DADiskRef;

	pub fn DADiskCopyIOMedia(disk: DADiskRef) -> io_service_t;
}

extern "C" {
	pub fn IOObjectConformsTo(object: io_object_t, className: *const c_char) -> Boolean;

	pub fn IOObjectRelease(object: io_object_t) -> kern_return_t;
}
