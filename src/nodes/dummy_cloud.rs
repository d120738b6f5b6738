//! Placeholder Cloud Registry
//!
//! BYON and edge node candidates must reference a cloud even though no
//! cloud provisions them. One placeholder cloud per resource class is
//! created lazily and reused by every later candidate.

use crate::domain::model::{Cloud, ResourceClass};
use crate::domain::ports::PersistenceRef;
use crate::error::{Error, Result};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Get-or-create access to the placeholder cloud of each resource class
pub struct DummyCloudRegistry {
    store: PersistenceRef,
    /// Serializes the create path so concurrent first use stores one cloud
    create_lock: Mutex<()>,
}

impl DummyCloudRegistry {
    pub fn new(store: PersistenceRef) -> Self {
        Self {
            store,
            create_lock: Mutex::new(()),
        }
    }

    /// Return the placeholder cloud for `class`, creating it on first use.
    ///
    /// Fails with `PlaceholderConflict` when a cloud of another type already
    /// holds the class id.
    pub async fn get_or_create(&self, class: ResourceClass) -> Result<Cloud> {
        debug!("Searching for the {} placeholder cloud", class);
        if let Some(cloud) = self.store.get_cloud(class.as_str()).await? {
            return Self::ensure_placeholder(cloud, class);
        }

        let _guard = self.create_lock.lock().await;

        // Another caller may have created it while we waited
        if let Some(cloud) = self.store.get_cloud(class.as_str()).await? {
            debug!("Placeholder cloud {} created concurrently", class);
            return Self::ensure_placeholder(cloud, class);
        }

        let cloud = Cloud::placeholder(class);
        self.store.save_cloud(cloud.clone()).await?;
        info!("Placeholder cloud created for {} nodes", class.owner());

        Ok(cloud)
    }

    fn ensure_placeholder(cloud: Cloud, class: ResourceClass) -> Result<Cloud> {
        if cloud.cloud_type != class.cloud_type() {
            error!(
                "Cloud {} has type {:?}, expected the {} placeholder",
                cloud.cloud_id, cloud.cloud_type, class
            );
            return Err(Error::PlaceholderConflict {
                cloud_id: cloud.cloud_id,
                class: class.to_string(),
            });
        }
        Ok(cloud)
    }
}
