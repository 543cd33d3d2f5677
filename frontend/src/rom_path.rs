//! ROM path resolution: builds a [`RomSet`] from a bare system image, a ZIP
//! archive, a rompath directory holding `{rom_name}.zip`, or a directory of
//! loose chip dumps.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use orchard_machines::MachineEntry;
use orchard_machines::rom_loader::{RomLoadError, RomSet};
use tracing::debug;

/// Resolve `path` for `entry` and load every ROM file it names.
///
/// Resolution order:
/// 1. `*.zip` loads the archive.
/// 2. Any other regular file is the pre-assembled system image and is filed
///    under [`MachineEntry::image_name`].
/// 3. A directory containing `{rom_name}.zip` loads that archive.
/// 4. Otherwise the directory's loose files are loaded.
pub fn load_rom_set(entry: &MachineEntry, path: &Path) -> Result<RomSet, RomLoadError> {
    if path.is_file() {
        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
        {
            return load_from_zip(path);
        }
        debug!(file = %path.display(), image = entry.image_name, "loading system image");
        return Ok(RomSet::single(entry.image_name, std::fs::read(path)?));
    }

    if path.is_dir() {
        let zip_path = path.join(format!("{}.zip", entry.rom_name));
        if zip_path.is_file() {
            return load_from_zip(&zip_path);
        }
        return RomSet::from_directory(path);
    }

    Err(RomLoadError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("ROM path not found: {}", path.display()),
    )))
}

fn zip_error(e: zip::result::ZipError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("invalid ZIP: {e}"))
}

/// Read every file of a ZIP archive, keyed by its base name so archives
/// with a top-level folder still resolve.
fn load_from_zip(path: &Path) -> Result<RomSet, RomLoadError> {
    let mut archive = zip::ZipArchive::new(BufReader::new(File::open(path)?)).map_err(zip_error)?;

    let mut rom_set = RomSet::default();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(zip_error)?;
        if file.is_dir() {
            continue;
        }
        let name = file
            .name()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        rom_set.insert(&name, data);
    }
    debug!(archive = %path.display(), files = rom_set.len(), "loaded ROM archive");
    Ok(rom_set)
}
