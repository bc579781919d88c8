//! Image file backing the emulated chip

use crate::error::CliError;
use std::fs;
use std::io;
use std::path::Path;

/// Load the chip contents from `path`
///
/// A missing path or file gives an erased chip. A short image is padded with
/// 0xFF.
pub fn load(path: Option<&Path>, size: usize) -> Result<Vec<u8>, CliError> {
    let mut data = match path {
        Some(path) => match fs::read(path) {
            Ok(data) => {
                log::debug!("Loaded {} bytes from {}", data.len(), path.display());
                data
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("Image {} not found, starting erased", path.display());
                Vec::new()
            }
            Err(source) => {
                return Err(CliError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        },
        None => Vec::new(),
    };

    if data.len() > size {
        return Err(CliError::ImageTooLarge {
            len: data.len(),
            size,
        });
    }
    data.resize(size, 0xFF);
    Ok(data)
}

/// Save the chip contents to `path`
pub fn save(path: &Path, data: &[u8]) -> Result<(), CliError> {
    write_file(path, data)?;
    log::debug!("Saved {} bytes to {}", data.len(), path.display());
    Ok(())
}

/// Read a whole input file
pub fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a whole output file
pub fn write_file(path: &Path, data: &[u8]) -> Result<(), CliError> {
    fs::write(path, data).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}
