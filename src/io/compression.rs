use std::fs::File;
use std::io::{
    BufRead,
    BufReader,
    Read,
    Seek,
    SeekFrom,
};
use std::path::Path;

use flate2::read::MultiGzDecoder;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compression of an input file. bgzip output is a multi-member gzip
/// stream, so it is read with [`MultiGzDecoder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    Gz,
}

impl Compression {
    pub fn name(&self) -> &str {
        match self {
            Compression::None => "none",
            Compression::Gz => "gzip",
        }
    }

    /// Detects compression from the leading magic bytes, rewinding the
    /// handle afterwards.
    pub fn detect(handle: &mut File) -> std::io::Result<Self> {
        let mut magic = [0u8; 2];
        let read = handle.read(&mut magic)?;
        handle.seek(SeekFrom::Start(0))?;
        if read == 2 && magic == GZIP_MAGIC {
            Ok(Compression::Gz)
        } else {
            Ok(Compression::None)
        }
    }

    pub fn get_decoder(
        &self,
        handle: File,
    ) -> Box<dyn Read + Send> {
        match self {
            Compression::Gz => Box::new(MultiGzDecoder::new(handle)),
            Compression::None => Box::new(handle),
        }
    }
}

/// Opens a possibly gzip-compressed text file for buffered line reading.
pub fn open_text<P: AsRef<Path>>(path: P) -> std::io::Result<Box<dyn BufRead + Send>> {
    let mut handle = File::open(path.as_ref())?;
    let compression = Compression::detect(&mut handle)?;
    log::debug!(
        "Opening {} (compression: {})",
        path.as_ref().display(),
        compression.name()
    );
    Ok(Box::new(BufReader::new(compression.get_decoder(handle))))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::GzEncoder;

    use super::*;

    #[test]
    fn test_open_plain_and_gz() {
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("a.txt");
        std::fs::write(&plain, "x\ty\n").unwrap();

        let gz = dir.path().join("a.txt.gz");
        let mut encoder =
            GzEncoder::new(File::create(&gz).unwrap(), flate2::Compression::default());
        encoder.write_all(b"x\ty\n").unwrap();
        encoder.finish().unwrap();

        for path in [plain, gz] {
            let mut content = String::new();
            open_text(&path)
                .unwrap()
                .read_to_string(&mut content)
                .unwrap();
            assert_eq!(content, "x\ty\n");
        }
    }
}
