use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cell::FlatMap;

lazy_static! {
    static ref TABLE_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap();
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid table id {0:?}")]
    InvalidId(String),

    #[error("table {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
}

pub fn is_valid_table_id(id: &str) -> bool {
    TABLE_ID_REGEX.is_match(id)
}

/// Write a flat map as gzip-compressed bincode.
pub fn save_flat_map(flat: &FlatMap, path: impl AsRef<Path>) -> Result<(), StoreError> {
    let file = File::create(path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut writer = BufWriter::new(encoder);

    serialize_into(&mut writer, flat)?;
    writer
        .into_inner()
        .map_err(|e| e.into_error())?
        .finish()?
        .flush()?;

    Ok(())
}

pub fn load_flat_map(path: impl AsRef<Path>) -> Result<FlatMap, StoreError> {
    let file = File::open(path)?;
    let decoder = GzDecoder::new(file);
    let mut reader = BufReader::new(decoder);

    let flat: FlatMap = deserialize_from(&mut reader)?;

    Ok(flat)
}

/// Directory of persisted grids, one `{table_id}.bin.gz` file each.
#[derive(Clone, Debug)]
pub struct GridStore {
    root: PathBuf,
}

impl GridStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(GridStore { root })
    }

    fn path_for(&self, table_id: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_table_id(table_id) {
            return Err(StoreError::InvalidId(table_id.to_string()));
        }
        Ok(self.root.join(format!("{}.bin.gz", table_id)))
    }

    pub fn exists(&self, table_id: &str) -> bool {
        self.path_for(table_id)
            .map(|p| p.exists())
            .unwrap_or(false)
    }

    pub fn load(&self, table_id: &str) -> Result<FlatMap, StoreError> {
        let path = self.path_for(table_id)?;
        match load_flat_map(&path) {
            Err(StoreError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(table_id.to_string()))
            }
            other => other,
        }
    }

    /// Persist a snapshot, replacing any previous one atomically.
    pub fn save(&self, table_id: &str, flat: &FlatMap) -> Result<(), StoreError> {
        let path = self.path_for(table_id)?;
        let tmp = path.with_extension("gz.tmp");
        let written = save_flat_map(flat, &tmp).and_then(|()| Ok(fs::rename(&tmp, &path)?));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        info!("saved table {} ({} cells)", table_id, flat.len());
        Ok(())
    }

    pub fn delete(&self, table_id: &str) -> Result<(), StoreError> {
        let path = self.path_for(table_id)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(table_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
