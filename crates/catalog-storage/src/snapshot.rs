use catalog_core::Product;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub current_snapshot: Option<String>,
    pub snapshot_products: usize,
    pub created_ts: i64,
    // first WAL generation not covered by the snapshot
    pub wal_from: Option<String>,
}

impl Manifest {
    pub fn load(data_dir: &Path) -> std::io::Result<Self> {
        let path = data_dir.join("manifest.json");
        if !path.exists() {
            return Ok(Self::default());
        }
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn store(&self, data_dir: &Path) -> std::io::Result<()> {
        let tmp = data_dir.join("manifest.json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        std::fs::rename(tmp, data_dir.join("manifest.json"))
    }
}

/// Write `products` as zstd-compressed JSON lines to `snapshots/snap-<ulid>.zst`.
pub fn write_snapshot(data_dir: &Path, products: &[Product]) -> std::io::Result<PathBuf> {
    let dir = data_dir.join("snapshots");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("snap-{}.zst", ulid::Ulid::new()));
    let file = File::create(&path)?;
    let mut z = zstd::Encoder::new(file, 3)?;
    for p in products {
        let line = serde_json::to_string(p)?;
        z.write_all(line.as_bytes())?;
        z.write_all(b"\n")?;
    }
    z.finish()?;
    Ok(path)
}

pub fn read_snapshot(path: &Path) -> std::io::Result<Vec<Product>> {
    let d = zstd::Decoder::new(File::open(path)?)?;
    let mut out = Vec::new();
    for line in BufReader::new(d).lines() {
        let line = line?;
        if !line.trim().is_empty() {
            out.push(serde_json::from_str(&line)?);
        }
    }
    Ok(out)
}
