use std::path::PathBuf;

use clap::Parser;
use volinfo::Volume;

#[derive(Parser, Debug)]
#[command(about = "Lists mounted volumes and their free space")]
struct Args {
	/// Show only the volume holding this path
	#[arg(short, long)]
	path: Option<PathBuf>,

	/// Also show volumes without readable media
	#[arg(short, long)]
	all: bool,
}

fn format_size(bytes: u64) -> String {
	const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
	let mut value = bytes as f64;
	let mut unit = 0;
	while value >= 1024.0 && unit + 1 < UNITS.len() {
		value /= 1024.0;
		unit += 1;
	}
	if unit == 0 {
		format!("{} {}", bytes, UNITS[0])
	} else {
		format!("{:.1} {}", value, UNITS[unit])
	}
}

fn main() {
	env_logger::init();
	let args = Args::parse();

	let volumes = match &args.path {
		Some(path) => vec![Volume::new(path)],
		None => Volume::enumerate_volumes(),
	};

	println!(
		"{:<24} {:<16} {:<20} {:<10} {:<10} {:>10} {:>10} {:>10}  {}",
		"MOUNTED ON", "LABEL", "DEVICE", "TYPE", "KIND", "SIZE", "FREE", "AVAIL", "FLAGS"
	);
	for volume in volumes {
		if !volume.is_valid() {
			if let Some(path) = &args.path {
				eprintln!("{}: no volume holds this path", path.display());
			}
			continue;
		}
		if !args.all && !volume.is_ready() {
			continue;
		}
		let mut flags = Vec::new();
		if volume.is_root() {
			flags.push("root");
		}
		if volume.is_read_only() {
			flags.push("ro");
		}
		if !volume.is_ready() {
			flags.push("not-ready");
		}
		println!(
			"{:<24} {:<16} {:<20} {:<10} {:<10} {:>10} {:>10} {:>10}  {}",
			volume.root_path().display(),
			volume.label(),
			volume.device().to_string_lossy(),
			volume.file_system_type(),
			volume.volume_type().to_string(),
			format_size(volume.bytes_total()),
			format_size(volume.bytes_free()),
			format_size(volume.bytes_available()),
			flags.join(","),
		);
		log::debug!("{:?} capabilities: {:?}", volume.root_path(), volume.capabilities());
	}
}
