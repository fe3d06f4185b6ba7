use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapMut};
use tracing::warn;

/// A contiguous region of bytes a table can live in.
pub trait ByteStore: AsRef<[u8]> {
    /// Writable view of the region, `None` when it is mapped read-only.
    fn bytes_mut(&mut self) -> Option<&mut [u8]>;

    /// Pushes pending writes to the backing medium.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

impl ByteStore for Vec<u8> {
    fn bytes_mut(&mut self) -> Option<&mut [u8]> {
        Some(self.as_mut_slice())
    }
}

impl ByteStore for Box<[u8]> {
    fn bytes_mut(&mut self) -> Option<&mut [u8]> {
        Some(&mut self[..])
    }
}

enum Mapping {
    Writable(MmapMut),
    ReadOnly(Mmap),
}

/// A memory map, either backed by a file or anonymous.
///
/// File-backed maps are shared with the file. Anonymous maps are private to
/// this process, so writes are not visible to forked children.
///
/// The mapping is released when the value is dropped; for file-backed maps
/// the kernel writes dirty pages back to the file. Call [`ByteStore::flush`]
/// to make that synchronous.
pub struct MMapFile {
    mapping: Mapping,
    path: Option<PathBuf>,
}

impl MMapFile {
    /// Creates (or truncates) `path`, sizes it to `len` bytes and maps it read-write.
    ///
    /// If sizing or mapping fails the file is removed again.
    pub fn create(path: &Path, len: usize) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        // Safety: the file was just truncated by us; concurrent modification
        // by other processes is outside the single-writer contract.
        let mapped = file
            .set_len(len as u64)
            .and_then(|()| unsafe { MmapMut::map_mut(&file) });

        match mapped {
            // The mapping outlives the descriptor, which closes here. `File` drops
            // any close error, so it cannot be reported.
            Ok(mmap) => Ok(Self {
                mapping: Mapping::Writable(mmap),
                path: Some(path.to_path_buf()),
            }),
            Err(err) => {
                drop(file);
                if let Err(rm_err) = fs::remove_file(path) {
                    warn!(
                        "failed to remove {} after mapping error: {rm_err}",
                        path.display()
                    );
                }
                Err(err)
            }
        }
    }

    /// Maps `len` zeroed bytes with no file behind them.
    pub fn anonymous(len: usize) -> io::Result<Self> {
        let mmap = MmapMut::map_anon(len)?;
        Ok(Self {
            mapping: Mapping::Writable(mmap),
            path: None,
        })
    }

    /// Maps an existing file read-only; its size comes from the filesystem.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            mapping: Mapping::ReadOnly(mmap),
            path: Some(path.to_path_buf()),
        })
    }

    /// Maps an existing file read-write.
    pub fn open_mut(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self {
            mapping: Mapping::Writable(mmap),
            path: Some(path.to_path_buf()),
        })
    }

    /// The backing file, `None` for anonymous maps.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_writable(&self) -> bool {
        matches!(self.mapping, Mapping::Writable(_))
    }

    pub fn len(&self) -> usize {
        self.as_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AsRef<[u8]> for MMapFile {
    fn as_ref(&self) -> &[u8] {
        match &self.mapping {
            Mapping::Writable(mmap) => mmap,
            Mapping::ReadOnly(mmap) => mmap,
        }
    }
}

impl ByteStore for MMapFile {
    fn bytes_mut(&mut self) -> Option<&mut [u8]> {
        match &mut self.mapping {
            Mapping::Writable(mmap) => Some(&mut mmap[..]),
            Mapping::ReadOnly(_) => None,
        }
    }

    fn flush(&self) -> io::Result<()> {
        match (&self.mapping, &self.path) {
            (Mapping::Writable(mmap), Some(_)) => mmap.flush(),
            _ => Ok(()),
        }
    }
}
