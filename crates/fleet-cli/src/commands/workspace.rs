// Snapshot-backed engine shared by every command

use anyhow::{Context, Result};
use fleet_capabilities::{
    CapabilityAdministration, CapabilityResolver, EngineConfig, StoredActiveSubscription,
};
use fleet_effects::{MemoryCapabilityStore, RealTimeHandler, StoreSnapshot};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub type Resolver = CapabilityResolver<
    MemoryCapabilityStore,
    StoredActiveSubscription<MemoryCapabilityStore>,
    RealTimeHandler,
>;

pub type Admin = CapabilityAdministration<MemoryCapabilityStore, RealTimeHandler>;

/// Load the engine configuration: file (if any), then `FLEETCAP_*` variables
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    config.merge_with_env()?;
    config.validate()?;
    Ok(config)
}

/// Tables loaded from a snapshot file, plus the configuration to resolve them with
pub struct Workspace {
    snapshot_path: PathBuf,
    config: EngineConfig,
    store: MemoryCapabilityStore,
}

impl Workspace {
    /// Open a snapshot; a missing file starts from empty tables
    pub fn open(snapshot_path: &Path, config: EngineConfig) -> Result<Self> {
        let snapshot = if snapshot_path.exists() {
            StoreSnapshot::load_from_file(snapshot_path)
                .with_context(|| format!("loading snapshot {}", snapshot_path.display()))?
        } else {
            debug!(path = %snapshot_path.display(), "snapshot not found, starting empty");
            StoreSnapshot::default()
        };
        let store = snapshot.into_store()?;
        Ok(Self {
            snapshot_path: snapshot_path.to_path_buf(),
            config,
            store,
        })
    }

    pub fn store(&self) -> &MemoryCapabilityStore {
        &self.store
    }

    pub fn resolver(&self) -> Resolver {
        CapabilityResolver::new(
            self.store.clone(),
            StoredActiveSubscription::with_policy(
                self.store.clone(),
                self.config.subscription_policy(),
            ),
            RealTimeHandler::new(),
            self.config.capability_defaults(),
        )
    }

    pub fn admin(&self) -> Admin {
        CapabilityAdministration::new(self.store.clone(), RealTimeHandler::new())
    }

    /// Write the tables back to the snapshot file
    pub async fn save(&self) -> Result<()> {
        let json = self.store.snapshot().await.to_json_string()?;
        std::fs::write(&self.snapshot_path, json)
            .with_context(|| format!("writing snapshot {}", self.snapshot_path.display()))?;
        info!(path = %self.snapshot_path.display(), "snapshot saved");
        Ok(())
    }
}

/// Print a response as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::{OrganizationId, ValueType};

    #[tokio::test]
    async fn test_missing_snapshot_starts_empty_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.json");

        let workspace = Workspace::open(&path, EngineConfig::default()).unwrap();
        workspace
            .admin()
            .define_capability("max_devices", ValueType::Int, "Devices")
            .await
            .unwrap();
        workspace.save().await.unwrap();

        let reopened = Workspace::open(&path, EngineConfig::default()).unwrap();
        let limit = reopened
            .resolver()
            .get_limit(&OrganizationId::new_random(), "max_devices")
            .await
            .unwrap();
        assert_eq!(limit, 1);
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Workspace::open(&path, EngineConfig::default()).is_err());
    }
}
