//! JSON-lines graph log
//!
//! Nodes and edges go to two separate append-only files, one JSON object per line.

use crate::storage::traits::{GraphLog, RecordIter, StorageError, StorageResult};
use crate::storage::{EdgeRecord, NodeRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Bytes scanned per step when searching backwards for the last newline
const TAIL_SCAN_CHUNK: u64 = 4096;

/// File-backed graph log writing `{"id": ..}` and `{"from": .., "to": ..}` lines
pub struct JsonlGraphLog {
    node_path: PathBuf,
    edge_path: PathBuf,
    writers: Option<Writers>,
}

struct Writers {
    nodes: BufWriter<File>,
    edges: BufWriter<File>,
}

impl JsonlGraphLog {
    /// Opens (creating if needed) both logs in append mode
    ///
    /// A trailing partial line left by a crash mid-write is cut off first, so new
    /// appends never fuse onto a torn record.
    pub fn open(node_path: &Path, edge_path: &Path) -> StorageResult<Self> {
        Ok(Self {
            writers: Some(Writers {
                nodes: BufWriter::new(open_append(node_path)?),
                edges: BufWriter::new(open_append(edge_path)?),
            }),
            node_path: node_path.to_path_buf(),
            edge_path: edge_path.to_path_buf(),
        })
    }

    /// Opens both logs for reading only
    ///
    /// Nothing is created, repaired or truncated, so this is safe to use while a
    /// crawl is appending to the same files. A torn last line is skipped by the
    /// reader; missing files read as empty.
    pub fn open_read_only(node_path: &Path, edge_path: &Path) -> Self {
        Self {
            writers: None,
            node_path: node_path.to_path_buf(),
            edge_path: edge_path.to_path_buf(),
        }
    }

    pub fn node_path(&self) -> &Path {
        &self.node_path
    }

    pub fn edge_path(&self) -> &Path {
        &self.edge_path
    }

    /// Empties both logs
    pub fn truncate(&mut self) -> StorageResult<()> {
        let writers = self.writers_mut()?;
        writers.nodes.flush()?;
        writers.edges.flush()?;
        writers.nodes.get_ref().set_len(0)?;
        writers.edges.get_ref().set_len(0)?;
        tracing::info!(
            "Truncated graph logs {} and {}",
            self.node_path.display(),
            self.edge_path.display()
        );
        Ok(())
    }

    fn writers_mut(&mut self) -> StorageResult<&mut Writers> {
        match self.writers.as_mut() {
            Some(writers) => Ok(writers),
            None => Err(StorageError::ReadOnly {
                path: self.node_path.clone(),
            }),
        }
    }

    fn flush(&mut self) -> StorageResult<()> {
        if let Some(writers) = self.writers.as_mut() {
            writers.nodes.flush()?;
            writers.edges.flush()?;
        }
        Ok(())
    }
}

impl GraphLog for JsonlGraphLog {
    fn append_node(&mut self, node: &NodeRecord) -> StorageResult<()> {
        write_line(&mut self.writers_mut()?.nodes, node)
    }

    fn append_edge(&mut self, edge: &EdgeRecord) -> StorageResult<()> {
        write_line(&mut self.writers_mut()?.edges, edge)
    }

    fn sync(&mut self) -> StorageResult<()> {
        if let Some(writers) = self.writers.as_mut() {
            writers.nodes.flush()?;
            writers.edges.flush()?;
            writers.nodes.get_ref().sync_data()?;
            writers.edges.get_ref().sync_data()?;
        }
        Ok(())
    }

    fn read_nodes(&mut self) -> StorageResult<RecordIter<'_, NodeRecord>> {
        self.flush()?;
        read_lines(&self.node_path)
    }

    fn read_edges(&mut self) -> StorageResult<RecordIter<'_, EdgeRecord>> {
        self.flush()?;
        read_lines(&self.edge_path)
    }
}

fn write_line<T: Serialize>(writer: &mut BufWriter<File>, record: &T) -> StorageResult<()> {
    serde_json::to_writer(&mut *writer, record)?;
    writer.write_all(b"\n")?;
    Ok(())
}

fn open_append(path: &Path) -> StorageResult<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    repair_torn_tail(path)?;

    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Truncates an incomplete trailing line, returning the number of bytes removed
///
/// Scans backwards from the end so large logs are not read in full.
pub fn repair_torn_tail(path: &Path) -> StorageResult<u64> {
    let mut file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(0);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    if last[0] == b'\n' {
        return Ok(0);
    }

    let mut end = len;
    let mut keep = 0;
    let mut chunk = vec![0u8; TAIL_SCAN_CHUNK as usize];
    while end > 0 {
        let start = end.saturating_sub(TAIL_SCAN_CHUNK);
        let size = (end - start) as usize;
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(&mut chunk[..size])?;

        if let Some(pos) = chunk[..size].iter().rposition(|&b| b == b'\n') {
            keep = start + pos as u64 + 1;
            break;
        }
        end = start;
    }

    file.set_len(keep)?;
    let removed = len - keep;
    tracing::warn!(
        "Repaired torn write in {}: truncated {} trailing bytes",
        path.display(),
        removed
    );

    Ok(removed)
}

fn read_lines<'a, T: DeserializeOwned + 'a>(path: &Path) -> StorageResult<RecordIter<'a, T>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Box::new(std::iter::empty()));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Box::new(JsonLines {
        path: path.to_path_buf(),
        reader: BufReader::new(file),
        line_no: 0,
        buf: String::new(),
        _record: PhantomData,
    }))
}

/// Iterator decoding one record per line
struct JsonLines<T> {
    path: PathBuf,
    reader: BufReader<File>,
    line_no: usize,
    buf: String,
    _record: PhantomData<T>,
}

impl<T: DeserializeOwned> Iterator for JsonLines<T> {
    type Item = StorageResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            self.line_no += 1;

            let complete = self.buf.ends_with('\n');
            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }

            return match serde_json::from_str::<T>(line) {
                Ok(record) => Some(Ok(record)),
                Err(e) if !complete => {
                    // torn final line from an interrupted append
                    tracing::warn!(
                        "Ignoring incomplete last line {} of {}: {}",
                        self.line_no,
                        self.path.display(),
                        e
                    );
                    None
                }
                Err(e) => Some(Err(StorageError::Malformed {
                    path: self.path.clone(),
                    line: self.line_no,
                    message: e.to_string(),
                })),
            };
        }
    }
}
