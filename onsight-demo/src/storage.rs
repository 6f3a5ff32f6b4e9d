/// Provides a concrete `sled`-based implementation for the `DeviceStore`
/// trait defined in the `onsight-analytics` library.
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sled::{transaction::TransactionalTree, Db};

use onsight_analytics::storage::DeviceStore;

/// A `sled`-backed implementation of the `DeviceStore` trait.
///
/// The device id survives across demo runs, so events from repeated
/// invocations are attributed to the same device.
#[derive(Clone)]
pub struct SledDeviceStore {
    db: Db,
}

impl SledDeviceStore {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: &str) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Wraps an already opened `sled` database.
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DeviceStore for SledDeviceStore {
    /// Retrieves the stored device id. Returns `None` on first run.
    async fn load_device_id(&self) -> Result<Option<String>> {
        let result = self
            .db
            .get("device::id")?
            .and_then(|v| String::from_utf8(v.to_vec()).ok());
        Ok(result)
    }

    async fn store_device_id(&self, device_id: &str) -> Result<()> {
        self.db.insert("device::id", device_id.as_bytes())?;
        self.db.flush_async().await?;
        Ok(())
    }

    /// Atomically records the identified address and the time it was seen,
    /// using a `sled` transaction so the pair is always consistent.
    async fn store_identity(&self, _device_id: &str, address: &str) -> Result<()> {
        let identified_at = chrono::Utc::now().to_rfc3339();
        self.db.transaction(
            |tx: &TransactionalTree| -> Result<(), sled::transaction::ConflictableTransactionError<()>> {
                tx.insert("device::last-address", address.as_bytes())?;
                tx.insert("device::identified-at", identified_at.as_bytes())?;
                Ok(())
            },
        ).map_err(|e| anyhow!("Sled transaction for identity failed: {:?}", e))?;

        self.db.flush_async().await?;

        Ok(())
    }
}
