use std::{ffi::CString, io, mem, os::unix::ffi::OsStrExt, path::Path};

use crate::{StatError, StatInfo};

/// Queries the sizes of the file system mounted at `path`, retrying on `EINTR`.
pub(crate) fn statvfs(path: &Path) -> Result<StatInfo, StatError> {
	let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| StatError::Os(libc::EINVAL))?;
	let mut buf: libc::statvfs = unsafe { mem::zeroed() };
	loop {
		if unsafe { libc::statvfs(c_path.as_ptr(), &mut buf) } == 0 {
			break;
		}
		let err = io::Error::last_os_error();
		if err.kind() != io::ErrorKind::Interrupted {
			return Err(err.into());
		}
	}
	let block_size = if buf.f_frsize != 0 {
		buf.f_frsize as u64
	} else {
		buf.f_bsize as u64
	};
	Ok(StatInfo {
		byte_count: (buf.f_blocks as u64).saturating_mul(block_size),
		free_byte_count: (buf.f_bfree as u64).saturating_mul(block_size),
		available_byte_count: (buf.f_bavail as u64).saturating_mul(block_size),
		read_only: (buf.f_flag as u64) & (libc::ST_RDONLY as u64) != 0,
	})
}
