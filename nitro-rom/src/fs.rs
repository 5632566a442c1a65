//! Reading ROM images from disk

use std::path::Path;

use crate::error::MountError;

/// Read a file into memory, refusing anything larger than `max_bytes`.
pub fn read_file_with_limit(path: &Path, max_bytes: u64) -> Result<Vec<u8>, MountError> {
    let io = |source| MountError::Io {
        path: path.to_path_buf(),
        source,
    };
    let len = std::fs::metadata(path).map_err(io)?.len();
    if len > max_bytes {
        return Err(MountError::TooLarge {
            path: path.to_path_buf(),
            len,
            max: max_bytes,
        });
    }
    std::fs::read(path).map_err(io)
}
