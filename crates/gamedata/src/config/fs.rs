use std::fs;
use std::io;
use std::path::Path;

/// Source the gamedata document is read from.
///
/// Hosts with their own virtual filesystem implement this; everything else
/// uses [`StdFileSystem`].
pub trait FileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Reads straight from the OS filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

impl<F: FileSystem + ?Sized> FileSystem for &F {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }
}
