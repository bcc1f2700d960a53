//! Shared definitions for the bouquet subsystem.
//!
//! This crate holds the types that every consumer of bouquet records agrees on:
//!
//! - [`ids`]: typed UUID identifiers for bouquets, services, channels and tags
//! - [`types`]: property values, the bouquet property table and config maps
//! - [`error`]: property-level errors
//!
//! ```rust
//! use bouquet_protocol::{BouquetId, PropertyValue, property};
//!
//! let id = BouquetId::generate();
//! let parsed: BouquetId = id.to_string().parse().unwrap();
//! assert_eq!(id, parsed);
//!
//! let prop = property::lookup("maptoch").unwrap();
//! assert_eq!(prop.caption, "Auto-Map to Channels");
//! assert!(prop.kind.accepts(&PropertyValue::Bool(true)));
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::PropertyError;
pub use ids::{BouquetId, ChannelId, ServiceId, TagId};
pub use types::{
    property, AccessLevel, ClassInfo, ConfigMap, PropertyDef, PropertyKind, PropertyOpts,
    PropertyValue, BOUQUET_CLASS,
};
