//! Typed identifiers.
//!
//! Every entity the bouquet subsystem touches is referenced by a UUID, wrapped in
//! its own newtype so a service id can never be passed where a channel id is
//! expected. The string form is the hyphenated lowercase UUID.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Allocate a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.as_hyphenated())
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Identity of a bouquet record.
    BouquetId
);
uuid_id!(
    /// Identity of an externally owned broadcast service.
    ServiceId
);
uuid_id!(
    /// Identity of a user-facing channel.
    ChannelId
);
uuid_id!(
    /// Identity of a channel tag.
    TagId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_display_parse() {
        let id = ServiceId::generate();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(text.parse::<ServiceId>().unwrap(), id);
    }

    #[test]
    fn test_id_parse_rejects_garbage() {
        assert!("not-a-uuid".parse::<BouquetId>().is_err());
        assert!("".parse::<BouquetId>().is_err());
    }

    #[test]
    fn test_ids_are_distinct() {
        let ids: HashSet<_> = (0..64).map(|_| ChannelId::generate()).collect();
        assert_eq!(ids.len(), 64);
    }
}
