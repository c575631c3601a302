use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;

// Fingerprint static assets so templates can bust browser caches on change.
fn main() {
    println!("cargo:rerun-if-changed=static/");
    println!("cargo:rerun-if-changed=migrations/");

    let mut hasher = DefaultHasher::new();

    let mut assets: Vec<_> = fs::read_dir(Path::new("static"))
        .map(|dir| dir.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default();
    assets.sort();

    for path in assets.iter().filter(|p| p.is_file()) {
        if let Ok(contents) = fs::read(path) {
            path.file_name().hash(&mut hasher);
            contents.hash(&mut hasher);
        }
    }

    let fingerprint = format!("{:016x}", hasher.finish());
    println!("cargo:rustc-env=STATIC_HASH={}", &fingerprint[..8]);
}
