use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{RemoteError, Result};
use crate::node::RemoteWrite;

/// Flush/sync strategy for the journal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// `fsync` after every write.
    EveryWrite,
    /// Flush to the OS and rely on its page cache.
    #[default]
    OsDefault,
}

/// Configuration for the [`Journal`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub sync_mode: SyncMode,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

struct JournalWriter {
    writer: BufWriter<File>,
    /// Current write offset in the journal file.
    offset: u64,
}

/// Append-only journal of remote writes.
///
/// On-disk format, one frame per write:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized RemoteWrite)]
/// ```
///
/// Recovery reads front to back. Frames failing the CRC check are skipped;
/// a truncated tail ends recovery.
pub struct Journal {
    path: PathBuf,
    writer: Mutex<JournalWriter>,
    config: JournalConfig,
}

impl Journal {
    /// Open (or create) the journal file at the given path.
    pub fn open(path: &Path, config: JournalConfig) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let offset = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(JournalWriter {
                writer: BufWriter::new(file),
                offset,
            }),
            config,
        })
    }

    /// Append a write. Returns the byte offset of its frame.
    pub fn append(&self, write: &RemoteWrite) -> Result<u64> {
        let payload = encode(write)?;
        let mut w = self.writer.lock().expect("journal mutex poisoned");
        let frame_offset = w.offset;

        write_frame(&mut w.writer, &payload)?;
        w.writer.flush()?;
        if self.config.sync_mode == SyncMode::EveryWrite {
            w.writer.get_ref().sync_all()?;
        }
        w.offset += (HEADER_SIZE + payload.len()) as u64;

        debug!(offset = frame_offset, len = payload.len(), "journal append");
        Ok(frame_offset)
    }

    /// Recover every intact write, in append order.
    pub fn recover(&self) -> Result<Vec<RemoteWrite>> {
        let file = File::open(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => RemoteError::JournalPathNotFound(self.path.clone()),
            _ => RemoteError::Io(e),
        })?;
        let file_len = file.metadata()?.len();
        let mut file = BufReader::new(file);
        let mut writes = Vec::new();
        let mut offset: u64 = 0;

        while offset + HEADER_SIZE as u64 <= file_len {
            file.seek(SeekFrom::Start(offset))?;

            let mut header = [0u8; HEADER_SIZE];
            match file.read_exact(&mut header) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
            let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
            let frame_end = offset + HEADER_SIZE as u64 + length as u64;

            if length == 0 || frame_end > file_len {
                warn!(offset, length, file_len, "invalid journal frame length; stopping recovery");
                break;
            }

            let mut payload = vec![0u8; length as usize];
            match file.read_exact(&mut payload) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    warn!(offset, "truncated journal frame; stopping recovery");
                    break;
                }
                Err(e) => return Err(e.into()),
            }

            let actual_crc = crc32fast::hash(&payload);
            if actual_crc != expected_crc {
                warn!(offset, expected = expected_crc, actual = actual_crc, "CRC mismatch; skipping frame");
                offset = frame_end;
                continue;
            }

            match bincode::deserialize::<RemoteWrite>(&payload) {
                Ok(write) => writes.push(write),
                Err(e) => warn!(offset, error = %e, "undecodable journal frame; skipping"),
            }

            offset = frame_end;
        }

        debug!(recovered = writes.len(), "journal recovery complete");
        Ok(writes)
    }

    /// Replace the journal contents with `writes`.
    ///
    /// The new contents are written to a sibling file which is then renamed
    /// over the journal, so a crash leaves either the old or the new file.
    pub fn rewrite(&self, writes: &[RemoteWrite]) -> Result<()> {
        let mut w = self.writer.lock().expect("journal mutex poisoned");
        let tmp_path = self.path.with_extension("compact");

        let mut offset = 0u64;
        {
            let mut tmp = BufWriter::new(File::create(&tmp_path)?);
            for write in writes {
                let payload = encode(write)?;
                write_frame(&mut tmp, &payload)?;
                offset += (HEADER_SIZE + payload.len()) as u64;
            }
            tmp.flush()?;
            tmp.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        let file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        w.writer = BufWriter::new(file);
        w.offset = offset;

        debug!(frames = writes.len(), bytes = offset, "journal rewritten");
        Ok(())
    }

    /// Current write offset.
    pub fn offset(&self) -> u64 {
        self.writer.lock().expect("journal mutex poisoned").offset
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn encode(write: &RemoteWrite) -> Result<Vec<u8>> {
    bincode::serialize(write).map_err(|e| RemoteError::Serialization(e.to_string()))
}

fn write_frame<W: Write>(out: &mut W, payload: &[u8]) -> Result<()> {
    let length = payload.len() as u32;
    let crc = crc32fast::hash(payload);
    out.write_all(&length.to_le_bytes())?;
    out.write_all(&crc.to_le_bytes())?;
    out.write_all(payload)?;
    Ok(())
}
