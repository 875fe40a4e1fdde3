use std::fmt;
use std::str::FromStr;

use kube::ResourceExt;

/// A `namespace/name` pair identifying a namespaced Kubernetes object.
///
/// This is the key type for every map in the cache. Dispatch code that
/// holds keys in string form can split them back apart with [FromStr].
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// The key for any namespaced object, read from its metadata.
    pub fn from_resource<K: ResourceExt>(resource: &K) -> Self {
        Self::new(resource.namespace().unwrap_or_default(), resource.name_any())
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// An error splitting a string into an [ObjectKey].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid object key {0:?}: expected \"namespace/name\"")]
pub struct InvalidObjectKey(String);

impl FromStr for ObjectKey {
    type Err = InvalidObjectKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((namespace, name))
                if !namespace.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(namespace, name))
            }
            _ => Err(InvalidObjectKey(s.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display_round_trips() {
        let key = ObjectKey::new("kube-system", "coredns");
        assert_eq!(key.to_string(), "kube-system/coredns");
        assert_eq!(key.to_string().parse::<ObjectKey>().unwrap(), key);
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        for input in ["", "coredns", "/coredns", "kube-system/", "a/b/c"] {
            assert!(input.parse::<ObjectKey>().is_err(), "parsed {input:?}");
        }
    }
}
