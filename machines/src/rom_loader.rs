//! ROM files and their assembly into memory regions.
//!
//! A [`RomSet`] is a bag of named dumps, read from a directory, wrapped
//! around one image file, or built from byte slices in tests. A [`RomRegion`]
//! says where each dump lands and which CRC32 values identify a good dump.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

// ---------------------------------------------------------------------------
// CRC-32
// ---------------------------------------------------------------------------

const fn crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut crc = n as u32;
        let mut bit = 0;
        while bit < 8 {
            // Reflected polynomial 0xEDB88320, as used by ZIP.
            crc = (crc >> 1) ^ (0xEDB8_8320 & (crc & 1).wrapping_neg());
            bit += 1;
        }
        table[n] = crc;
        n += 1;
    }
    table
}

static CRC32_TABLE: [u32; 256] = crc32_table();

/// CRC-32 of a byte slice.
pub fn crc32(data: &[u8]) -> u32 {
    !data.iter().fold(!0u32, |crc, &byte| {
        (crc >> 8) ^ CRC32_TABLE[usize::from(crc as u8 ^ byte)]
    })
}

#[derive(Debug, Error)]
pub enum RomLoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing ROM file: {0}")]
    MissingFile(String),

    /// `expected` is a description, since some slots accept several sizes.
    #[error("ROM {file}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        file: String,
        expected: String,
        actual: usize,
    },

    #[error("ROM {file}: CRC32 0x{actual:08X} matches none of the known dumps")]
    ChecksumMismatch { file: String, actual: u32 },

    /// The assembled image was rejected by the machine.
    #[error("invalid ROM image: {0}")]
    Core(#[from] orchard_core::CoreError),
}

// ---------------------------------------------------------------------------
// RomSet
// ---------------------------------------------------------------------------

/// Dumps keyed by bare file name.
#[derive(Debug, Default)]
pub struct RomSet {
    dumps: HashMap<String, Vec<u8>>,
}

impl RomSet {
    /// Read the regular files directly inside `dir`.
    pub fn from_directory(dir: &Path) -> Result<Self, RomLoadError> {
        let mut set = Self::default();
        for dir_entry in std::fs::read_dir(dir)? {
            let path = dir_entry?.path();
            if path.is_file()
                && let Some(name) = path.file_name()
            {
                set.insert(&name.to_string_lossy(), std::fs::read(&path)?);
            }
        }
        debug!(dir = %dir.display(), files = set.len(), "loaded ROM directory");
        Ok(set)
    }

    /// A set holding one image under `name`.
    pub fn single(name: &str, data: Vec<u8>) -> Self {
        let mut set = Self::default();
        set.insert(name, data);
        set
    }

    pub fn from_slices(dumps: &[(&str, &[u8])]) -> Self {
        dumps.iter().fold(Self::default(), |mut set, (name, data)| {
            set.insert(name, data.to_vec());
            set
        })
    }

    pub fn insert(&mut self, name: &str, data: Vec<u8>) {
        self.dumps.insert(name.to_owned(), data);
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.dumps.get(name).map(Vec::as_slice)
    }

    pub fn require(&self, name: &str) -> Result<&[u8], RomLoadError> {
        self.get(name)
            .ok_or_else(|| RomLoadError::MissingFile(name.to_owned()))
    }

    /// Like [`require`](Self::require), also checking the length.
    pub fn require_sized(&self, name: &str, size: usize) -> Result<&[u8], RomLoadError> {
        match self.require(name)? {
            data if data.len() == size => Ok(data),
            data => Err(RomLoadError::SizeMismatch {
                file: name.to_owned(),
                expected: size.to_string(),
                actual: data.len(),
            }),
        }
    }

    /// File names in sorted order.
    pub fn file_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.dumps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.dumps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dumps.is_empty()
    }
}

// ---------------------------------------------------------------------------
// RomRegion
// ---------------------------------------------------------------------------

/// One dump's place in a region.
pub struct RomEntry {
    pub name: &'static str,
    pub size: usize,
    pub offset: usize,
    /// CRC32 of every known good dump. Empty accepts any content.
    pub crc32: &'static [u32],
}

impl RomEntry {
    fn verify(&self, data: &[u8]) -> Result<(), RomLoadError> {
        if self.crc32.is_empty() {
            return Ok(());
        }
        let actual = crc32(data);
        if self.crc32.contains(&actual) {
            Ok(())
        } else {
            Err(RomLoadError::ChecksumMismatch {
                file: self.name.to_owned(),
                actual,
            })
        }
    }
}

/// A contiguous address range filled from several dumps. Bytes no entry
/// covers stay zero.
pub struct RomRegion {
    pub size: usize,
    pub entries: &'static [RomEntry],
}

impl RomRegion {
    pub fn load(&self, rom_set: &RomSet) -> Result<Vec<u8>, RomLoadError> {
        self.assemble(rom_set, true)
    }

    /// Assemble without checksum verification. Sizes are still enforced.
    pub fn load_skip_checksums(&self, rom_set: &RomSet) -> Result<Vec<u8>, RomLoadError> {
        self.assemble(rom_set, false)
    }

    fn assemble(&self, rom_set: &RomSet, verify: bool) -> Result<Vec<u8>, RomLoadError> {
        let mut image = vec![0u8; self.size];
        for entry in self.entries {
            let data = rom_set.require_sized(entry.name, entry.size)?;
            if verify {
                entry.verify(data)?;
            }
            let end = entry.offset + entry.size;
            debug_assert!(end <= self.size, "{} lies outside its region", entry.name);
            image[entry.offset..end].copy_from_slice(data);
        }
        Ok(image)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
