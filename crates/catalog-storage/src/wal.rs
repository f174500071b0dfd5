use catalog_core::Product;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct WalRecord {
    pub ts: i64,
    pub product: Product,
}

/// Append-only JSON-lines log of upserts. One file per generation, named
/// `wal-<generation>.log` with a zero-padded, strictly increasing generation
/// so lexical order is creation order.
pub struct Wal {
    path: PathBuf,
    file: File,
}

impl Wal {
    pub fn create(dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let last = segments(dir)?
            .iter()
            .filter_map(|p| generation(p))
            .max()
            .unwrap_or(0);
        let now = Utc::now().timestamp_micros().max(0) as u64;
        let path = dir.join(format!("wal-{:020}.log", now.max(last + 1)));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    /// Reopen the newest generation for appending, or start the first one.
    pub fn open_latest(dir: &Path) -> std::io::Result<Self> {
        match segments(dir)?.pop() {
            Some(path) => {
                let file = OpenOptions::new().append(true).open(&path)?;
                Ok(Self { path, file })
            }
            None => Self::create(dir),
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn append(&mut self, rec: &WalRecord) -> std::io::Result<()> {
        let line = serde_json::to_string(rec)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.file.flush()?;
        Ok(())
    }
}

fn generation(path: &Path) -> Option<u64> {
    path.file_stem()?
        .to_str()?
        .strip_prefix("wal-")?
        .parse()
        .ok()
}

/// WAL files in `dir`, oldest first.
pub fn segments(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if let Ok(rd) = std::fs::read_dir(dir) {
        for e in rd.flatten() {
            let p = e.path();
            if p.extension().and_then(|s| s.to_str()) == Some("log") {
                files.push(p);
            }
        }
    }
    files.sort();
    Ok(files)
}

pub fn read_segment(path: &Path) -> std::io::Result<Vec<WalRecord>> {
    let mut out = Vec::new();
    let br = BufReader::new(File::open(path)?);
    for line in br.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        // a torn final line is skipped
        match serde_json::from_str::<WalRecord>(&line) {
            Ok(rec) => out.push(rec),
            Err(e) => tracing::warn!(file = %path.display(), error = %e, "skipping wal line"),
        }
    }
    Ok(out)
}
