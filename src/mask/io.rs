//! I/O helpers for mask images and JSON.
//!
//! - `load_mask`: read a PNG/JPEG mask into an owned 8-bit buffer.
//! - `read_json_file`: parse a JSON document from disk.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::MaskU8;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Owned 8-bit mask buffer with borrowed view conversion.
#[derive(Clone, Debug)]
pub struct OwnedMaskU8 {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl OwnedMaskU8 {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Borrow as a read-only `MaskU8` view
    pub fn as_view(&self) -> MaskU8<'_> {
        MaskU8 {
            w: self.width,
            h: self.height,
            stride: self.width,
            data: &self.data,
        }
    }
}

/// Load a mask image from disk, converting to 8-bit grayscale.
pub fn load_mask(path: &Path) -> Result<OwnedMaskU8, String> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to open mask {}: {e}", path.display()))?
        .into_luma8();
    let width = img.width() as usize;
    let height = img.height() as usize;
    Ok(OwnedMaskU8::new(width, height, img.into_raw()))
}

pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&data).map_err(|e| format!("Failed to parse {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
