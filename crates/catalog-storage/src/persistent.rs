use crate::snapshot::{read_snapshot, write_snapshot, Manifest};
use crate::wal::{self, Wal, WalRecord};
use crate::{InMemoryStore, ProductStore};
use catalog_core::{CatalogError, CompiledPredicate, Product, ProductId, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// In-memory product index backed by a write-ahead log and zstd snapshots.
pub struct PersistentStore {
    mem: InMemoryStore,
    wal: parking_lot::Mutex<Wal>,
    manifest: parking_lot::RwLock<Manifest>,
    data_dir: PathBuf,
}

fn storage_err(e: std::io::Error) -> CatalogError {
    CatalogError::StorageFailure(e.to_string())
}

/// Latest version of every product recorded under `data_dir`, by id.
/// Reads only; used both on open and by offline tooling.
pub fn load_products(data_dir: &Path) -> std::io::Result<Vec<Product>> {
    let manifest = Manifest::load(data_dir)?;
    let mut by_id: BTreeMap<ProductId, Product> = BTreeMap::new();
    if let Some(name) = &manifest.current_snapshot {
        for p in read_snapshot(&data_dir.join("snapshots").join(name))? {
            by_id.insert(p.id, p);
        }
    }
    let wal_dir = data_dir.join("wal");
    let from = manifest.wal_from.as_deref();
    for seg in wal::segments(&wal_dir)? {
        let name = seg
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if from.is_some_and(|f| name.as_str() < f) {
            continue;
        }
        for rec in wal::read_segment(&seg)? {
            by_id.insert(rec.product.id, rec.product);
        }
    }
    Ok(by_id.into_values().collect())
}

impl PersistentStore {
    pub fn open(data_dir: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&data_dir)?;
        let manifest = Manifest::load(&data_dir)?;
        let mem = InMemoryStore::new();
        let products = load_products(&data_dir)?;
        let restored = products.len();
        for p in products {
            mem.replay_upsert(p);
        }
        let wal = Wal::open_latest(&data_dir.join("wal"))?;
        tracing::info!(dir = %data_dir.display(), restored, "opened persistent store");
        Ok(Self {
            mem,
            wal: parking_lot::Mutex::new(wal),
            manifest: parking_lot::RwLock::new(manifest),
            data_dir,
        })
    }

    /// Compact the current state into a snapshot and start a fresh WAL
    /// generation; older generations and the previous snapshot are removed.
    pub fn snapshot(&self) -> std::io::Result<(String, usize)> {
        let mut wal = self.wal.lock();
        let products = self.mem.all_products();
        let path = write_snapshot(&self.data_dir, &products)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let next = Wal::create(&self.data_dir.join("wal"))?;
        let wal_from = next.file_name();

        let manifest = Manifest {
            current_snapshot: Some(name.clone()),
            snapshot_products: products.len(),
            created_ts: Utc::now().timestamp(),
            wal_from: Some(wal_from.clone()),
        };
        manifest.store(&self.data_dir)?;
        let previous = std::mem::replace(&mut *self.manifest.write(), manifest).current_snapshot;
        *wal = next;
        drop(wal);

        for seg in wal::segments(&self.data_dir.join("wal"))? {
            let old = seg
                .file_name()
                .is_some_and(|n| n.to_string_lossy().as_ref() < wal_from.as_str());
            if old {
                let _ = std::fs::remove_file(&seg);
            }
        }
        if let Some(prev) = previous {
            let _ = std::fs::remove_file(self.data_dir.join("snapshots").join(prev));
        }
        tracing::info!(snapshot = %name, products = products.len(), "snapshot written");
        Ok((name, products.len()))
    }
}

#[async_trait::async_trait]
impl ProductStore for PersistentStore {
    async fn upsert(&self, mut product: Product) -> Result<Product> {
        product.updated_at = Some(Utc::now());
        let mut wal = self.wal.lock();
        wal.append(&WalRecord {
            ts: Utc::now().timestamp(),
            product: product.clone(),
        })
        .map_err(storage_err)?;
        self.mem.replay_upsert(product.clone());
        Ok(product)
    }

    async fn get(&self, id: ProductId) -> Result<Product> {
        self.mem.get(id).await
    }

    async fn find(&self, predicate: &CompiledPredicate) -> Result<Vec<Product>> {
        self.mem.find(predicate).await
    }

    async fn count(&self) -> Result<usize> {
        self.mem.count().await
    }

    async fn admin_snapshot(&self) -> Result<(String, usize)> {
        self.snapshot().map_err(storage_err)
    }

    async fn admin_manifest(&self) -> Result<serde_json::Value> {
        let m = self.manifest.read().clone();
        let mut v = serde_json::to_value(m)
            .map_err(|e| CatalogError::StorageFailure(e.to_string()))?;
        v["mode"] = serde_json::json!("persistent");
        v["wal"] = serde_json::json!(self.wal.lock().file_name());
        v["products"] = serde_json::json!(self.mem.len());
        Ok(v)
    }
}
