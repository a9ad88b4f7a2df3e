//! One-block-per-file storage.

use crate::atomic::write_atomic;
use crate::error::StoreError;
use crate::layout::Datadir;

/// Reads and writes `blocks/NNNNNN.blk` files. The encoding is opaque here;
/// the chain crate owns the canonical block codec.
#[derive(Clone, Debug)]
pub struct BlockFileStore {
    datadir: Datadir,
}

impl BlockFileStore {
    pub fn new(datadir: Datadir) -> Self {
        Self { datadir }
    }

    /// Atomically persist a block's canonical bytes at its height.
    pub fn put(&self, height: u64, bytes: &[u8]) -> Result<(), StoreError> {
        write_atomic(&self.datadir.block_file(height), bytes)
    }

    pub fn get(&self, height: u64) -> Result<Vec<u8>, StoreError> {
        let path = self.datadir.block_file(height);
        std::fs::read(&path)
            .map_err(|e| StoreError::NotFound(format!("{}: {e}", path.display())))
    }

    pub fn exists(&self, height: u64) -> bool {
        self.datadir.block_file(height).is_file()
    }

    /// All stored heights in ascending order.
    pub fn heights(&self) -> Result<Vec<u64>, StoreError> {
        let mut heights = Vec::new();
        let dir = self.datadir.blocks_dir();
        if !dir.is_dir() {
            return Ok(heights);
        }
        for entry in std::fs::read_dir(&dir)? {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".blk") {
                if let Ok(height) = stem.parse::<u64>() {
                    heights.push(height);
                }
            }
        }
        heights.sort_unstable();
        Ok(heights)
    }
}
