use std::ffi::OsString;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{PresetError, Result};

/// Default save root on Windows: `%APPDATA%/EldenRing`, one folder per account.
pub fn default_save_root() -> Option<PathBuf> {
    root_from_appdata(std::env::var_os("APPDATA"))
}

fn root_from_appdata(appdata: Option<OsString>) -> Option<PathBuf> {
    appdata.map(|p| PathBuf::from(p).join("EldenRing"))
}

/// `explicit` if given, otherwise the default root.
pub fn resolve_save_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    explicit
        .or_else(default_save_root)
        .ok_or(PresetError::NoSaveRoot)
}

pub fn is_save_file(p: &Path) -> bool {
    p.is_file() && p.extension().and_then(|s| s.to_str()).map(|e| e.eq_ignore_ascii_case("sl2")) == Some(true)
}

/// All `.sl2` files below `root`, sorted.
pub fn find_save_files(root: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = WalkDir::new(root)
        .max_depth(3)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| is_save_file(p))
        .collect();
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn explicit_root_wins() {
        let p = PathBuf::from("/saves");
        assert_eq!(resolve_save_root(Some(p.clone())).unwrap(), p);
    }

    #[test]
    fn appdata_root() {
        assert_eq!(
            root_from_appdata(Some(OsString::from("/home/u/AppData"))),
            Some(PathBuf::from("/home/u/AppData").join("EldenRing"))
        );
        assert_eq!(root_from_appdata(None), None);
    }

    #[test]
    fn missing_root_is_not_found() {
        assert_eq!(PresetError::NoSaveRoot.kind(), ErrorKind::FileNotFound);
    }
}
