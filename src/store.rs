use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::Result;

/// Key-value preferences kept as one JSON document per key.
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: &Path) -> Result<Store> {
        fs::create_dir_all(path)?;
        Ok(Store {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let file = File::create(self.key_path(key))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        debug!(key, "store write");
        Ok(())
    }

    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let file = match File::open(self.key_path(key)) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(key, "store miss");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let value = serde_json::from_reader(BufReader::new(file))?;
        debug!(key, "store hit");
        Ok(Some(value))
    }

    /// Returns whether the key was present.
    pub fn remove(&self, key: &str) -> Result<bool> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let name = key.replace('/', "__").replace('\\', "__");
        self.path.join(format!("{}.json", name))
    }
}
