//! Range-query collaborators.
//!
//! A [`PatSource`] returns the raw lines of reads starting inside a site
//! range. The production source shells out to `tabix`; the in-memory source
//! backs tests and small uncompressed inputs.
//!
//! A running `tabix` query is only interrupted by the optional
//! [`TabixPatSource::with_timeout`] deadline. The multi-region driver checks
//! for a closed sink between super-chunks, so queries already in flight
//! finish before a run stops.

use std::io::{
    BufRead,
    Read,
};
use std::path::{
    Path,
    PathBuf,
};
use std::process::{
    Child,
    Command,
    Stdio,
};
use std::thread;
use std::time::{
    Duration,
    Instant,
};

use log::debug;

use crate::data_structs::SiteInterval;
use crate::error::{
    Result,
    ViewError,
};
use crate::io::compression::open_text;
use crate::io::record::parse_line;

/// Maximal read length in sites. A read overlapping `[start, end)` starts no
/// earlier than `start - MAX_PAT_LEN`.
pub const MAX_PAT_LEN: u64 = 150;

const TABIX_POLL_INTERVAL: Duration = Duration::from_millis(20);

pub trait PatSource: Send + Sync {
    /// Lines of reads on `chrom` whose start site lies in the 1-based
    /// half-open range `[start, end)`.
    fn fetch(
        &self,
        chrom: &str,
        start: u64,
        end: u64,
    ) -> Result<Vec<String>>;

    /// Every line of the source.
    fn fetch_all(&self) -> Result<Vec<String>>;

    /// Lines that may contain reads overlapping `interval`; all lines when
    /// no interval is given.
    fn fetch_interval(
        &self,
        interval: Option<&SiteInterval>,
    ) -> Result<Vec<String>> {
        match interval {
            None => self.fetch_all(),
            Some(interval) => {
                let (start, end) = query_window(interval);
                self.fetch(interval.chrom(), start, end)
            },
        }
    }
}

/// Query window for an interval: reads up to [`MAX_PAT_LEN`] sites long may
/// start before the interval and still overlap it.
pub fn query_window(interval: &SiteInterval) -> (u64, u64) {
    (
        interval.start().saturating_sub(MAX_PAT_LEN).max(1),
        interval.end(),
    )
}

/// bgzip-compressed, tabix-indexed pat file.
#[derive(Debug, Clone)]
pub struct TabixPatSource {
    path:    PathBuf,
    tabix:   PathBuf,
    timeout: Option<Duration>,
}

impl TabixPatSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(ViewError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("pat file {} does not exist", path.display()),
            )));
        }
        Ok(Self {
            path,
            tabix: PathBuf::from("tabix"),
            timeout: None,
        })
    }

    /// Uses a specific `tabix` executable.
    pub fn with_tabix<P: Into<PathBuf>>(
        mut self,
        tabix: P,
    ) -> Self {
        self.tabix = tabix.into();
        self
    }

    /// Kills a `tabix` query still running after `timeout`. The region then
    /// fails with a query error.
    pub fn with_timeout(
        mut self,
        timeout: Option<Duration>,
    ) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn has_index(&self) -> bool {
        ["tbi", "csi"].iter().any(|ext| {
            let mut index = self.path.clone().into_os_string();
            index.push(".");
            index.push(ext);
            PathBuf::from(index).is_file()
        })
    }
}

impl PatSource for TabixPatSource {
    fn fetch(
        &self,
        chrom: &str,
        start: u64,
        end: u64,
    ) -> Result<Vec<String>> {
        // tabix ranges are 1-based inclusive
        let query = format!("{}:{}-{}", chrom, start, end.saturating_sub(1).max(start));
        debug!("tabix {} {}", self.path.display(), query);

        if !self.has_index() {
            return Err(ViewError::RegionQuery {
                query,
                reason: format!("{} is not indexed", self.path.display()),
            });
        }

        let query_error = |reason: String| {
            ViewError::RegionQuery {
                query: query.clone(),
                reason,
            }
        };

        let mut child = Command::new(&self.tabix)
            .arg(&self.path)
            .arg(&query)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| query_error(e.to_string()))?;

        // Pipes are drained concurrently so a large result cannot block
        // the child while it is being polled.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = wait_with_deadline(&mut child, self.timeout)
            .map_err(|e| query_error(e.to_string()))?;
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        let Some(status) = status
        else {
            return Err(query_error(format!(
                "tabix timed out after {:.1}s",
                self.timeout.unwrap_or_default().as_secs_f64()
            )));
        };
        if !status.success() {
            return Err(query_error(
                String::from_utf8_lossy(&stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&stdout)
            .lines()
            .map(str::to_owned)
            .collect())
    }

    fn fetch_all(&self) -> Result<Vec<String>> {
        debug!("Reading whole file {}", self.path.display());
        let lines = open_text(&self.path)?
            .lines()
            .collect::<std::io::Result<Vec<_>>>()?;
        Ok(lines)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Waits for `child` to exit. Returns `None` after killing it when
/// `timeout` elapses first.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<Option<std::process::ExitStatus>> {
    let Some(timeout) = timeout
    else {
        return child.wait().map(Some);
    };
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            debug!("Killing tabix process {}", child.id());
            child.kill()?;
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(TABIX_POLL_INTERVAL);
    }
}

/// Pat lines held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryPatSource {
    lines: Vec<String>,
}

impl MemoryPatSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>, {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Reads a (possibly gzip-compressed) pat file into memory.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let lines = open_text(path)?
            .lines()
            .collect::<std::io::Result<Vec<_>>>()?;
        Ok(Self { lines })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl PatSource for MemoryPatSource {
    fn fetch(
        &self,
        chrom: &str,
        start: u64,
        end: u64,
    ) -> Result<Vec<String>> {
        Ok(self
            .lines
            .iter()
            .filter(|line| {
                parse_line(line)
                    .map(|read| read.chrom == chrom && read.start >= start && read.start < end)
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    fn fetch_all(&self) -> Result<Vec<String>> {
        Ok(self.lines.clone())
    }
}
