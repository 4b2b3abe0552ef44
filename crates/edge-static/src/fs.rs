//! File system backed [`System`].

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use edge_core::{Platform, ResponseWriter};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::trace;

use crate::config::StaticGenerateOptions;
use crate::system::{spawn_worker, System, WorkerHandle, WorkerHandler};

/// Name of the page data file written next to each page.
pub const DATA_FILE_NAME: &str = "q-data.json";

/// Writes a response body to a file.
///
/// The file is created on the first write, or on close for an empty body.
#[derive(Debug)]
pub struct FileWriter {
    path: PathBuf,
    file: Option<File>,
    closed: bool,
    bytes_written: usize,
}

impl FileWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
            closed: false,
            bytes_written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    async fn file(&mut self) -> io::Result<&mut File> {
        let file = match self.file.take() {
            Some(file) => file,
            None => File::create(&self.path).await?,
        };
        Ok(self.file.insert(file))
    }
}

#[async_trait]
impl ResponseWriter for FileWriter {
    async fn write(&mut self, chunk: Bytes) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "file writer closed"));
        }
        self.file().await?.write_all(&chunk).await?;
        self.bytes_written += chunk.len();
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.file().await?.flush().await?;
        self.file = None;
        self.closed = true;
        trace!(path = %self.path.display(), bytes = self.bytes_written, "file written");
        Ok(())
    }
}

/// [`System`] writing under `options.out_dir` and hosting workers as tokio
/// tasks.
///
/// Layout:
///
/// ```text
/// /            -> index.html       q-data.json
/// /actions/    -> actions/index.html  actions/q-data.json
/// /actions     -> actions/index.html  (actions.html without trailing slashes)
/// ```
pub struct FsSystem {
    options: StaticGenerateOptions,
    platform: Platform,
    next_worker: AtomicUsize,
}

impl FsSystem {
    pub fn new(options: StaticGenerateOptions) -> Self {
        Self {
            options,
            platform: Arc::new(()),
            next_worker: AtomicUsize::new(0),
        }
    }

    /// Set the host context handed to handlers.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Pathname relative to the base, without a leading slash.
    fn relative<'a>(&self, pathname: &'a str) -> &'a str {
        pathname
            .strip_prefix(self.options.base_pathname.as_str())
            .unwrap_or(pathname)
            .trim_start_matches('/')
    }
}

#[async_trait]
impl System for FsSystem {
    fn options(&self) -> &StaticGenerateOptions {
        &self.options
    }

    fn page_file_path(&self, pathname: &str) -> PathBuf {
        let relative = self.relative(pathname);
        let out_dir = &self.options.out_dir;

        if relative.is_empty() || relative.ends_with('/') || self.options.trailing_slash {
            out_dir.join(relative.trim_end_matches('/')).join("index.html")
        } else {
            out_dir.join(format!("{}.html", relative))
        }
    }

    fn data_file_path(&self, pathname: &str) -> Option<PathBuf> {
        let relative = self.relative(pathname).trim_end_matches('/');
        Some(self.options.out_dir.join(relative).join(DATA_FILE_NAME))
    }

    async fn ensure_dir(&self, file_path: &Path) -> io::Result<()> {
        match file_path.parent() {
            Some(dir) => tokio::fs::create_dir_all(dir).await,
            None => Ok(()),
        }
    }

    fn create_write_stream(&self, path: &Path) -> Box<dyn ResponseWriter> {
        Box::new(FileWriter::new(path))
    }

    fn create_worker_process(&self, handler: WorkerHandler) -> WorkerHandle {
        let id = self.next_worker.fetch_add(1, Ordering::SeqCst);
        spawn_worker(id, handler)
    }

    fn platform(&self) -> Platform {
        self.platform.clone()
    }
}
