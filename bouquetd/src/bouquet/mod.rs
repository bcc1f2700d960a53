//! Bouquet subsystem.
//!
//! A bouquet is a named collection of broadcast services discovered from one
//! source (a DVB network, a satellite position, an IPTV playlist). Bouquets
//! track which services currently belong to them, reconcile that set at the
//! end of every scan, and can turn their members into user visible channels.
//!
//! All state lives in [`Bouquets`], behind the single lock held by
//! [`BouquetSubsystem`]. Every operation takes `&mut Bouquets`, so callers
//! cannot reach the registry without holding the lock.

pub mod collab;
mod class;
mod entity;
mod mapping;
pub mod membership;
pub mod policy;
mod reconcile;
mod registry;
mod resolve;
#[cfg(test)]
mod testing;

use bouquet_protocol::PropertyError;
use log::info;
use parking_lot::{Mutex, MutexGuard};
use thiserror::Error;

use crate::database::DatabaseError;

pub use collab::{
    ChannelDirectory, ChannelMapping, ChannelTagDirectory, Collaborators, EventSink,
    LogEventSink, MappingOrigin, OfflineCollaborators, ServiceDirectory, SettingsStore,
};
pub use entity::{is_blank_name, Bouquet, LoadPhase};
pub use membership::MembershipSet;
pub use policy::{MappingAction, PolicyFlag, PolicyFlags};
pub use registry::{Bouquets, DeleteOutcome, SETTINGS_CATEGORY};

/// Bouquet subsystem error types.
#[derive(Error, Debug)]
pub enum BouquetError {
    #[error("Invalid bouquet identity: {0}")]
    InvalidIdentity(String),

    #[error("Bouquet not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0} requires admin access")]
    PermissionDenied(&'static str),

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

pub type Result<T> = std::result::Result<T, BouquetError>;

/// Process wide owner of the bouquet registry.
#[derive(Debug, Default)]
pub struct BouquetSubsystem {
    registry: Mutex<Bouquets>,
}

impl BouquetSubsystem {
    pub fn new() -> Self {
        Self::with_registry(Bouquets::new())
    }

    pub fn with_registry(registry: Bouquets) -> Self {
        Self {
            registry: Mutex::new(registry),
        }
    }

    /// Take the global lock.
    pub fn lock(&self) -> MutexGuard<'_, Bouquets> {
        self.registry.lock()
    }

    /// Destroy every bouquet. Unsaved changes are lost.
    pub fn shutdown(&self) {
        let count = self.lock().drain();
        info!("Bouquet: shut down, released {} bouquets", count);
    }
}
