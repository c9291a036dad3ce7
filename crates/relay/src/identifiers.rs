//! Newtype domain identifiers.
//!
//! Every string that has a distinct meaning on the broker is wrapped in its own
//! newtype so that a [`DedupKey`] cannot be passed where a [`Subject`] is
//! expected, even though both are strings under the hood.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub(crate) String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// A dot-delimited broker subject (e.g. `"gitlab.group~myproject.push"`).
    ///
    /// Produced by [`crate::subject::derive_subject`]; consumers filter on its
    /// positional tokens, so the layout is part of the public contract.
    Subject
}

string_id! {
    /// Broker-level deduplication identifier, sent as the `Nats-Msg-Id` header.
    ///
    /// Always prefixed with the provider name (e.g. `"gitlab-abc123"`).
    DedupKey
}

string_id! {
    /// Name of a JetStream stream (e.g. `"GITLAB"`).
    StreamName
}
