use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

/// A trait defining the required functionality for persistent device
/// identity. This allows for different database implementations.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Retrieves the stored device id, if one has been created before.
    async fn load_device_id(&self) -> Result<Option<String>>;

    /// Persists a freshly generated device id.
    async fn store_device_id(&self, device_id: &str) -> Result<()>;

    /// Records the last identity associated with this device.
    async fn store_identity(&self, device_id: &str, address: &str) -> Result<()>;
}

/// A volatile `DeviceStore` for tests and short-lived processes. Identity
/// survives for the lifetime of the store instance only.
#[derive(Default)]
pub struct MemoryDeviceStore {
    inner: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    device_id: Option<String>,
    last_address: Option<String>,
}

impl MemoryDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last address recorded through `store_identity`.
    pub fn last_address(&self) -> Option<String> {
        self.lock().last_address.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DeviceStore for MemoryDeviceStore {
    async fn load_device_id(&self) -> Result<Option<String>> {
        Ok(self.lock().device_id.clone())
    }

    async fn store_device_id(&self, device_id: &str) -> Result<()> {
        self.lock().device_id = Some(device_id.to_string());
        Ok(())
    }

    async fn store_identity(&self, _device_id: &str, address: &str) -> Result<()> {
        self.lock().last_address = Some(address.to_string());
        Ok(())
    }
}
