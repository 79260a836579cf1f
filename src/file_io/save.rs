//! Saving and loading viewer preferences, in a compact binary format.

use std::{
    fs::File,
    io::{self, Read, Write},
    path::Path,
};

use bincode::{
    config,
    error::{DecodeError, EncodeError},
    Decode, Encode,
};

use crate::map::MapConfig;

pub const DEFAULT_PREFS_FILE: &str = "plasmap_prefs.pp";
pub const DEFAULT_SVG_FILE: &str = "map.svg";

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("preferences file I/O: {0}")]
    Io(#[from] io::Error),
    #[error("unable to encode preferences: {0}")]
    Encode(#[from] EncodeError),
    #[error("unable to decode preferences: {0}")]
    Decode(#[from] DecodeError),
}

/// Save to file, using Bincode.
pub fn save<T: Encode>(path: &Path, data: &T) -> Result<(), PrefsError> {
    let encoded: Vec<u8> = bincode::encode_to_vec(data, config::standard())?;

    let mut file = File::create(path)?;
    file.write_all(&encoded)?;
    Ok(())
}

/// Load from file, using Bincode.
pub fn load<T: Decode<()>>(path: &Path) -> Result<T, PrefsError> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;

    let (decoded, _len) = bincode::decode_from_slice(&buffer, config::standard())?;
    Ok(decoded)
}

/// Load display preferences, falling back to defaults if the file is missing or unreadable.
pub fn load_prefs(path: &Path) -> MapConfig {
    match load::<MapConfig>(path) {
        Ok(v) => {
            log::info!("Loaded preferences from {}", path.display());
            v
        }
        Err(PrefsError::Io(e)) if e.kind() == io::ErrorKind::NotFound => MapConfig::default(),
        Err(e) => {
            log::warn!("Unable to load preferences from {}: {e}", path.display());
            MapConfig::default()
        }
    }
}

pub fn save_prefs(path: &Path, config: &MapConfig) {
    match save(path, config) {
        Ok(()) => log::debug!("Saved preferences to {}", path.display()),
        Err(e) => log::error!("Error saving preferences to {}: {e}", path.display()),
    }
}
