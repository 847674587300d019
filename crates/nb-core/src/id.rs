use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner shared by node and link ids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Counter behind generated ids; shared so generated names never collide
/// across prefixes.
static GENERATED: AtomicU64 = AtomicU64::new(0);

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Intern a string as an id, or return the existing one.
            pub fn intern(s: &str) -> Self {
                $name(INTERNER.get_or_intern(s))
            }

            /// Resolve back to a string slice.
            pub fn as_str(&self) -> &str {
                INTERNER.resolve(&self.0)
            }

            /// Generate a fresh id of the form `{prefix}-{n}`.
            pub fn with_prefix(prefix: &str) -> Self {
                let n = GENERATED.fetch_add(1, Ordering::Relaxed);
                Self::intern(&format!("{prefix}-{n}"))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::intern(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::intern(&s))
            }
        }
    };
}

interned_id!(
    /// Interned identifier of a node. 4 bytes, `Copy`, O(1) `Eq`/`Hash`.
    NodeId
);

interned_id!(
    /// Interned identifier of a link.
    LinkId
);

impl LinkId {
    /// Generate a unique link id (`ln-N`).
    pub fn generate() -> Self {
        Self::with_prefix("ln")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = NodeId::intern("card_7");
        let b = NodeId::intern("card_7");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "card_7");
        assert_eq!(a.to_string(), "card_7");
    }

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let a = NodeId::with_prefix("nd");
        let b = NodeId::with_prefix("nd");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("nd-"));

        let l = LinkId::generate();
        assert!(l.as_str().starts_with("ln-"));
    }

    #[test]
    fn node_and_link_ids_share_text_but_not_type() {
        let n = NodeId::intern("shared");
        let l = LinkId::intern("shared");
        assert_eq!(n.as_str(), l.as_str());
    }
}
