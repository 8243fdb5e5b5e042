//! User-facing message catalogue.

use std::path::Path;

pub const USAGE: &str = "Usage: apkrebuild -i filename.apk -o output.apk";
pub const OUTPUT_EXISTS: &str =
    "Output filename exists.\nDo you want to overwrite this file? [y/N]";
pub const REBUILD_COMPLETED: &str = "Rebuild completed!";

pub fn unpacking(input: &Path, dir: &Path) -> String {
    format!("Unpacking {} to {}...", input.display(), dir.display())
}

pub fn change_manifest(manifest: &Path) -> String {
    format!("Change manifest {}...", manifest.display())
}

pub fn create_resources(path: &Path) -> String {
    format!("Create resources {}...", path.display())
}

pub fn building(output: &Path, dir: &Path) -> String {
    format!("Building {} from {}...", output.display(), dir.display())
}

pub fn zipalign(output: &Path, aligned: &Path) -> String {
    format!("Zipalign {} to {}...", output.display(), aligned.display())
}

pub fn remove_file(path: &Path) -> String {
    format!("Remove file {}...", path.display())
}

pub fn remove_folder(path: &Path) -> String {
    format!("Remove folder {}...", path.display())
}

pub fn rename_file(from: &Path, to: &Path) -> String {
    format!("Rename file from {} to {}...", from.display(), to.display())
}

pub fn keystore(path: &Path) -> String {
    format!("Obtaining keystore from {}...", path.display())
}

pub fn sign(output: &Path) -> String {
    format!("Sign {}...", output.display())
}
