use std::env;

const FRAMEWORKS: [&str; 3] = ["CoreFoundation", "DiskArbitration", "IOKit"];

fn main() {
	println!("cargo:rerun-if-changed=build.rs");
	let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
	if target_os != "macos" {
		return;
	}
	for framework in FRAMEWORKS {
		println!("cargo:rustc-link-lib=framework={}", framework);
	}
}
