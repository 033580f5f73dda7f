use std::fs;
use std::io::{self, Read};
use std::path::Path;

use tracing::debug;

// Holds the data from a chip8 file as a vec of bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RomBuffer {
    buffer: Vec<u8>,
}

impl RomBuffer {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let buffer = fs::read(path.as_ref())?;
        debug!(path = %path.as_ref().display(), bytes = buffer.len(), "read rom");
        Ok(RomBuffer { buffer })
    }

    pub fn from_reader(reader: &mut impl Read) -> io::Result<Self> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Ok(RomBuffer { buffer })
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        RomBuffer { buffer: bytes }
    }

    pub fn contents(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
