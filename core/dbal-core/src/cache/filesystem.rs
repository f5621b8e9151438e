//! One cache entry directory on disk.
//!
//! Every write goes to a temporary file in the same directory and is renamed into
//! place, so readers only ever see complete files.

use crate::error::DbalResult;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct Filesystem {
    path: PathBuf,
}

impl Filesystem {
    /// Does not touch the disk; directories are created on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.file(name).is_file()
    }

    /// Last modification time of `name`.
    pub fn modified(&self, name: &str) -> io::Result<SystemTime> {
        fs::metadata(self.file(name))?.modified()
    }

    /// Serialize `data` as JSON into `name`, atomically.
    pub fn put_json<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> DbalResult<()> {
        let json = serde_json::to_vec(data)?;

        fs::create_dir_all(&self.path)?;
        let mut tmp = NamedTempFile::new_in(&self.path)?;
        tmp.write_all(&json)?;
        tmp.persist(self.file(name)).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn get_json<T: DeserializeOwned>(&self, name: &str) -> DbalResult<T> {
        let bytes = fs::read(self.file(name))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Remove `name`; a file that is already gone is not an error.
    pub fn remove(&self, name: &str) -> DbalResult<()> {
        match fs::remove_file(self.file(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// File names directly inside the entry directory.
    pub fn list(&self) -> DbalResult<Vec<String>> {
        let entries = match fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_put_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let entry = Filesystem::new(dir.path().join("a").join("b"));
        assert!(!entry.has(".data"));

        let mut data = BTreeMap::new();
        data.insert("totalRows", 3);
        entry.put_json(".data", &data).unwrap();

        assert!(entry.has(".data"));
        let back: BTreeMap<String, i32> = entry.get_json(".data").unwrap();
        assert_eq!(back["totalRows"], 3);
        assert!(entry.modified(".data").is_ok());
    }

    #[test]
    fn test_no_temp_files_left() {
        let dir = tempfile::tempdir().unwrap();
        let entry = Filesystem::new(dir.path());
        entry.put_json("0.row", &vec![1, 2]).unwrap();
        entry.put_json("0.row", &vec![3]).unwrap();
        assert_eq!(entry.list().unwrap(), vec!["0.row".to_string()]);
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let entry = Filesystem::new(dir.path());
        entry.remove("nothing").unwrap();
        assert!(Filesystem::new(dir.path().join("absent")).list().unwrap().is_empty());
    }
}
