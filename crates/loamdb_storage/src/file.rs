//! File-backed key-value store.

use crate::error::{StorageError, StorageResult};
use crate::kv::KvStore;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Frame operation: store a key-value pair.
const OP_PUT: u8 = 1;
/// Frame operation: remove a key.
const OP_DELETE: u8 = 2;

/// Size of the fixed frame header: op byte + key length + value length.
const FRAME_HEADER_LEN: usize = 1 + 4 + 4;

/// A file-backed key-value store.
///
/// The store is log-structured: every `put` and `delete` appends one framed
/// record to the log file, and the full map is rebuilt by replaying the log
/// on open. Reads are served from the in-memory map.
///
/// # Frame format
///
/// ```text
/// [op:u8][key_len:u32 LE][val_len:u32 LE][key][value][crc32:u32 LE]
/// ```
///
/// The CRC covers all bytes before it. An incomplete final frame (torn write
/// on crash) ends replay; a CRC mismatch earlier in the log is corruption.
///
/// # Durability
///
/// - `flush()` calls `File::sync_data()` to ensure appended frames are on disk
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
#[derive(Debug)]
pub struct FileKv {
    path: PathBuf,
    log: Mutex<File>,
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl FileKv {
    /// Opens or creates a file-backed store at the given path.
    ///
    /// If the file exists, the log is replayed to rebuild the map.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the log is corrupted.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let data = if path.exists() {
            std::fs::read(path)?
        } else {
            Vec::new()
        };
        let entries = replay_log(&data)?;

        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            log: Mutex::new(log),
            entries: RwLock::new(entries),
        })
    }

    /// Opens or creates a store, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the underlying log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_frame(&self, op: u8, key: &[u8], value: &[u8]) -> StorageResult<()> {
        let frame = encode_frame(op, key, value);
        let mut log = self.log.lock();
        log.write_all(&frame)?;
        Ok(())
    }
}

impl KvStore for FileKv {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.append_frame(OP_PUT, key, value)?;
        self.entries.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.append_frame(OP_DELETE, key, &[])?;
        self.entries.write().remove(key);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let entries = self.entries.read();
        Ok(entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn flush(&self) -> StorageResult<()> {
        let log = self.log.lock();
        log.sync_data()?;
        Ok(())
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.entries.read().len())
    }
}

fn encode_frame(op: u8, key: &[u8], value: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(FRAME_HEADER_LEN + key.len() + value.len() + 4);
    buf.push(op);
    buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
    buf.extend_from_slice(key);
    buf.extend_from_slice(value);
    let crc = compute_crc32(&buf);
    buf.extend_from_slice(&crc.to_le_bytes());
    buf
}

/// Replays a log buffer into the live entry map.
///
/// An incomplete final frame is tolerated (crash during append); a checksum
/// mismatch on a complete frame is a corruption error.
fn replay_log(data: &[u8]) -> StorageResult<BTreeMap<Vec<u8>, Vec<u8>>> {
    let mut entries = BTreeMap::new();
    let mut cursor = 0usize;

    while cursor < data.len() {
        if cursor + FRAME_HEADER_LEN > data.len() {
            break; // torn header at tail
        }
        let op = data[cursor];
        let key_len = u32::from_le_bytes(
            data[cursor + 1..cursor + 5]
                .try_into()
                .map_err(|_| StorageError::corrupted("invalid key length"))?,
        ) as usize;
        let val_len = u32::from_le_bytes(
            data[cursor + 5..cursor + 9]
                .try_into()
                .map_err(|_| StorageError::corrupted("invalid value length"))?,
        ) as usize;

        let frame_end = cursor + FRAME_HEADER_LEN + key_len + val_len;
        if frame_end + 4 > data.len() {
            break; // torn body at tail
        }

        let stored_crc = u32::from_le_bytes(
            data[frame_end..frame_end + 4]
                .try_into()
                .map_err(|_| StorageError::corrupted("invalid checksum"))?,
        );
        let actual_crc = compute_crc32(&data[cursor..frame_end]);
        if stored_crc != actual_crc {
            return Err(StorageError::corrupted(format!(
                "checksum mismatch at offset {cursor}: expected {stored_crc:08x}, got {actual_crc:08x}"
            )));
        }

        let key = data[cursor + FRAME_HEADER_LEN..cursor + FRAME_HEADER_LEN + key_len].to_vec();
        match op {
            OP_PUT => {
                let value = data[cursor + FRAME_HEADER_LEN + key_len..frame_end].to_vec();
                entries.insert(key, value);
            }
            OP_DELETE => {
                entries.remove(&key);
            }
            other => {
                return Err(StorageError::corrupted(format!(
                    "unknown frame op {other} at offset {cursor}"
                )));
            }
        }

        cursor = frame_end + 4;
    }

    Ok(entries)
}

/// Computes CRC32 checksum for data (IEEE polynomial).
pub fn compute_crc32(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    !crc
}
