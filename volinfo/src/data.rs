mod capabilities;
mod mount_entry;
mod stat_info;
mod volume_record;
mod volume_type;

pub use capabilities::*;
pub use mount_entry::*;
pub use stat_info::*;
pub(crate) use volume_record::*;
pub use volume_type::*;
