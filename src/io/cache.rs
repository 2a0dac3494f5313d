//! On-disk cache for the synthetic emission table.
//!
//! File layout (little-endian, 64-byte header):
//!
//! ```text
//! magic        8 bytes  "SYNTHEM1"
//! n_temps      u32
//! n_channels   u32
//! reference    u32
//! (padding)    u32
//! t0           f64
//! t_step       f64
//! dem_width    f64
//! dem_amp      f64
//! checksum     u64      FNV-1a over the payload bytes
//! payload      n_temps * n_channels f32, row-major
//! ```
//!
//! Writers go through a temp file in the cache directory followed by a rename,
//! so concurrent readers see either the old file or the complete new one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable, bytes_of};
use thiserror::Error;

use crate::models::{ModelKey, SynthModel};

const MAGIC: &[u8; 8] = b"SYNTHEM1";
const HEADER_LEN: usize = size_of::<CacheHeader>();

// Tables are written in host byte order; the format is defined as little-endian.
const _: () = assert!(cfg!(target_endian = "little"), "cache format requires a little-endian host");

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("not a synthetic emission table")]
    BadMagic,

    #[error("cached table was built for a different setup ({found})")]
    KeyMismatch { found: String },

    #[error("truncated table: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("payload checksum mismatch")]
    Checksum,
}

impl CacheError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Directory holding cached tables, one file per shape.
#[derive(Debug, Clone)]
pub struct ModelCache {
    dir: PathBuf,
}

impl ModelCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &ModelKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Read the table for `key`.
    ///
    /// `Ok(None)` when no file exists. Any file that exists but does not match
    /// `key` byte for byte is an error; callers treat that as a cache miss.
    pub fn load(&self, key: &ModelKey) -> Result<Option<SynthModel>, CacheError> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(&path, e)),
        };
        decode(&bytes, key).map(Some)
    }

    /// Write `model` atomically. Returns the final path.
    pub fn store(&self, model: &SynthModel) -> Result<PathBuf, CacheError> {
        fs::create_dir_all(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;
        let path = self.path_for(model.key());
        let bytes = encode(model);

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| CacheError::io(&self.dir, e))?;
        tmp.write_all(&bytes).map_err(|e| CacheError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| CacheError::io(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| CacheError::io(&path, e.error))?;
        Ok(path)
    }
}

/// Fixed-size file header, stored verbatim ahead of the payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct CacheHeader {
    magic: [u8; 8],
    n_temps: u32,
    n_channels: u32,
    reference: u32,
    _pad: u32,
    t0: f64,
    t_step: f64,
    dem_width: f64,
    dem_amplitude: f64,
    checksum: u64,
}

impl CacheHeader {
    fn key(&self) -> ModelKey {
        ModelKey {
            n_temps: self.n_temps as usize,
            n_channels: self.n_channels as usize,
            reference_channel: self.reference as usize,
            t0: self.t0,
            t_step: self.t_step,
            dem_width: self.dem_width,
            dem_amplitude: self.dem_amplitude,
        }
    }
}

fn encode(model: &SynthModel) -> Vec<u8> {
    let key = model.key();
    let values = model.to_row_major();
    let payload: &[u8] = bytemuck::cast_slice(&values);

    let header = CacheHeader {
        magic: *MAGIC,
        n_temps: key.n_temps as u32,
        n_channels: key.n_channels as u32,
        reference: key.reference_channel as u32,
        _pad: 0,
        t0: key.t0,
        t_step: key.t_step,
        dem_width: key.dem_width,
        dem_amplitude: key.dem_amplitude,
        checksum: fnv1a(payload),
    };

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(bytes_of(&header));
    out.extend_from_slice(payload);
    out
}

fn decode(bytes: &[u8], key: &ModelKey) -> Result<SynthModel, CacheError> {
    if bytes.len() < HEADER_LEN {
        return Err(CacheError::Truncated {
            expected: HEADER_LEN,
            found: bytes.len(),
        });
    }
    let header: CacheHeader = bytemuck::pod_read_unaligned(&bytes[..HEADER_LEN]);
    if &header.magic != MAGIC {
        return Err(CacheError::BadMagic);
    }

    let found = header.key();
    if found != *key {
        return Err(CacheError::KeyMismatch {
            found: format!(
                "{}x{} t0={} step={} ref={} width={} amp={}",
                found.n_temps,
                found.n_channels,
                found.t0,
                found.t_step,
                found.reference_channel,
                found.dem_width,
                found.dem_amplitude
            ),
        });
    }

    let expected = HEADER_LEN + key.n_temps * key.n_channels * size_of::<f32>();
    if bytes.len() != expected {
        return Err(CacheError::Truncated {
            expected,
            found: bytes.len(),
        });
    }
    let payload = &bytes[HEADER_LEN..];
    if fnv1a(payload) != header.checksum {
        return Err(CacheError::Checksum);
    }

    let values: Vec<f32> = bytemuck::pod_collect_to_vec(payload);
    // Length was checked above, so this cannot fail.
    SynthModel::from_row_major(*key, &values).map_err(|_| CacheError::Truncated {
        expected,
        found: bytes.len(),
    })
}

fn fnv1a(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in data {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
