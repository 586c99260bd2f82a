use std::fs::File;
use std::io::{
    BufWriter,
    ErrorKind,
    Write,
};
use std::path::Path;

use crate::data_structs::Read;

/// Whether an io error means the consumer stopped reading.
pub fn is_sink_closed(err: &std::io::Error) -> bool {
    err.kind() == ErrorKind::BrokenPipe
}

/// Buffered writer of pat lines and region labels.
pub struct PatWriter<W: Write> {
    inner: BufWriter<W>,
}

impl PatWriter<Box<dyn Write + Send>> {
    /// Writes to `path`, or to stdout if `None`.
    pub fn from_path<P: AsRef<Path>>(path: Option<P>) -> std::io::Result<Self> {
        let sink: Box<dyn Write + Send> = match path {
            Some(path) => Box::new(File::create(path)?),
            None => Box::new(std::io::stdout()),
        };
        Ok(PatWriter::new(sink))
    }
}

impl<W: Write> PatWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            inner: BufWriter::new(sink),
        }
    }

    pub fn write_read(
        &mut self,
        read: &Read,
    ) -> std::io::Result<()> {
        writeln!(self.inner, "{}", read)
    }

    pub fn write_reads<'a, I>(
        &mut self,
        reads: I,
    ) -> std::io::Result<()>
    where
        I: IntoIterator<Item = &'a Read>, {
        for read in reads {
            self.write_read(read)?;
        }
        Ok(())
    }

    pub fn write_label(
        &mut self,
        label: &str,
    ) -> std::io::Result<()> {
        writeln!(self.inner, "{}", label)
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> std::io::Result<W> {
        self.inner.into_inner().map_err(|e| e.into_error())
    }
}
