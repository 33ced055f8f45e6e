use std::fmt::{self, Display, Formatter};

/// Kind of storage behind a volume, as returned by [`Volume::volume_type`].
///
/// Only Windows answers this question directly. macOS derives it from Disk Arbitration media
/// descriptions, and every other platform guesses from device and file system names, so the
/// value is approximate there.
///
/// [`Volume::volume_type`]: crate::Volume::volume_type
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum VolumeType {
	/// The type cannot be determined.
	#[default]
	Unknown,

	/// Internal mass storage such as a hard drive.
	Internal,

	/// Removable media such as a flash drive or memory card.
	Removable,

	/// Network share.
	Remote,

	/// CD, DVD or Blu-ray drive.
	Optical,

	/// Internal flash storage such as phone memory.
	InternalFlash,

	/// Volume backed by RAM.
	Ram,
}

impl Display for VolumeType {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		let name = match self {
			VolumeType::Unknown => "unknown",
			VolumeType::Internal => "internal",
			VolumeType::Removable => "removable",
			VolumeType::Remote => "remote",
			VolumeType::Optical => "optical",
			VolumeType::InternalFlash => "internal flash",
			VolumeType::Ram => "ram",
		};
		write!(f, "{}", name)
	}
}
