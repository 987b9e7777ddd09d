// src/file.rs

use std::{
    collections::HashMap,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

/// Replace `path` with `bytes` so that readers see either the old or the
/// new content: write a sibling temp file, fsync, then rename over.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    {
        let mut f = File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

pub fn ensure_directory(dir: &Path) -> io::Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Path exists but is not a directory: {}", dir.display()),
        ));
    }
    if !dir.exists() { fs::create_dir_all(dir)?; }
    Ok(())
}

/// Sanitized `<NN>_<title>.<ext>` inside `dir`, numbered by position.
/// Duplicate stems within one batch get " (N)" appended.
pub fn resolve_chart_filename(
    dir: &Path,
    index: usize,
    title: &str,
    seen_names: &mut HashMap<String, usize>,
    ext: &str,
) -> PathBuf {
    let stem = crate::core::sanitize::sanitize_filename(title, "chart");
    let count = seen_names.entry(stem.clone()).or_insert(0);

    let filename = if *count == 0 {
        format!("{:02}_{stem}.{ext}", index + 1)
    } else {
        format!("{:02}_{stem} ({}).{ext}", index + 1, *count + 1)
    };

    *count += 1;
    dir.join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("nested").join("x.json");
        write_atomic(&p, b"one").unwrap();
        write_atomic(&p, b"two").unwrap();
        assert_eq!(fs::read_to_string(&p).unwrap(), "two");
        assert!(!dir.path().join("nested").join("x.json.tmp").exists());
    }

    #[test]
    fn chart_names_are_numbered_and_deduped() {
        let mut seen = HashMap::new();
        let d = Path::new("out");
        assert_eq!(resolve_chart_filename(d, 0, "p2pDox", &mut seen, "png"), d.join("01_p2pDox.png"));
        assert_eq!(resolve_chart_filename(d, 1, "p2pDox", &mut seen, "png"), d.join("02_p2pDox (2).png"));
    }

    #[test]
    fn file_in_place_of_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("f");
        fs::write(&f, "x").unwrap();
        assert!(ensure_directory(&f).is_err());
    }
}
