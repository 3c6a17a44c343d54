//! Snapshot persistence between runs, one `<ADDRESS>.json` file per device.

use std::io;
use std::path::PathBuf;

use hmvi_domain::device::Device;

/// Directory of device snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotDir {
    dir: PathBuf,
}

impl SnapshotDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, address: &str) -> PathBuf {
        self.dir.join(format!("{address}.json"))
    }

    /// Stored snapshot for `address`, if any.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the file exists but cannot be read.
    pub fn load(&self, address: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(address)) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Store `snapshot` for `address`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the directory or file cannot be written.
    pub fn save(&self, address: &str, snapshot: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(address);
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, snapshot)?;
        std::fs::rename(&staging, &path)?;
        tracing::debug!(path = %path.display(), "snapshot saved");
        Ok(())
    }

    /// Stored snapshot for `address`, treating an unreadable file as absent
    /// so the device falls back to its template.
    pub fn load_or_skip(&self, address: &str) -> Option<String> {
        match self.load(address) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(%address, error = %err, "cannot read stored snapshot");
                None
            }
        }
    }

    /// Save the snapshot of `device`. Failures are logged and only affect
    /// this device.
    pub fn persist(&self, device: &Device) -> bool {
        let Some(address) = device.address() else {
            return false;
        };
        let snapshot = match device.save_persistent() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::error!(%address, error = %err, "cannot serialize device");
                return false;
            }
        };
        if let Err(err) = self.save(address.as_str(), &snapshot) {
            tracing::error!(%address, error = %err, "cannot save snapshot");
            return false;
        }
        true
    }
}
