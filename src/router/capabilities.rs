//! Adapter classification and capability reporting

use serde::Serialize;

use super::adapter::AdapterDescriptor;

/// How the router treats an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    /// Executes queries itself
    Native,
    /// File-persisted; queried through the fallback path
    FileBacked,
    /// Iteration only
    Plain,
    /// Undeclared; treated as plain
    Unknown,
}

impl AdapterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::Native => "native",
            AdapterKind::FileBacked => "file_backed",
            AdapterKind::Plain => "plain",
            AdapterKind::Unknown => "unknown",
        }
    }

    /// Only native adapters skip the in-memory fallback
    pub fn is_native(&self) -> bool {
        matches!(self, AdapterKind::Native)
    }
}

/// Classifies a descriptor.
///
/// A native descriptor needs a non-empty database id and a file-backed one a
/// non-empty path; otherwise the adapter is plain.
pub fn classify(descriptor: &AdapterDescriptor) -> AdapterKind {
    match descriptor {
        AdapterDescriptor::Native { database } if !database.trim().is_empty() => {
            AdapterKind::Native
        }
        AdapterDescriptor::FileBacked { path } if !path.as_os_str().is_empty() => {
            AdapterKind::FileBacked
        }
        AdapterDescriptor::Native { .. }
        | AdapterDescriptor::FileBacked { .. }
        | AdapterDescriptor::Plain => AdapterKind::Plain,
        AdapterDescriptor::Unknown => AdapterKind::Unknown,
    }
}

/// What an adapter supports through the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterCapabilities {
    pub native_query: bool,
    pub indexing: bool,
    /// Always true: every adapter can aggregate through the fallback path
    pub aggregation: bool,
    pub streaming: bool,
    pub caching: bool,
}

impl AdapterCapabilities {
    pub fn for_kind(kind: AdapterKind) -> Self {
        let native = kind.is_native();
        Self {
            native_query: native,
            indexing: native,
            aggregation: true,
            streaming: false,
            caching: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let native = AdapterDescriptor::Native {
            database: "db1".to_string(),
        };
        let file = AdapterDescriptor::FileBacked {
            path: "/x.json".into(),
        };
        assert_eq!(classify(&native), AdapterKind::Native);
        assert_eq!(classify(&file), AdapterKind::FileBacked);
        assert_eq!(classify(&AdapterDescriptor::Plain), AdapterKind::Plain);
        assert_eq!(classify(&AdapterDescriptor::Unknown), AdapterKind::Unknown);
    }

    #[test]
    fn test_incomplete_descriptors_are_plain() {
        let native = AdapterDescriptor::Native {
            database: String::new(),
        };
        let file = AdapterDescriptor::FileBacked {
            path: Default::default(),
        };
        assert_eq!(classify(&native), AdapterKind::Plain);
        assert_eq!(classify(&file), AdapterKind::Plain);
    }

    #[test]
    fn test_capabilities() {
        let native = AdapterCapabilities::for_kind(AdapterKind::Native);
        assert!(native.native_query && native.indexing && native.aggregation);
        assert!(!native.streaming && !native.caching);

        for kind in [AdapterKind::FileBacked, AdapterKind::Plain, AdapterKind::Unknown] {
            let caps = AdapterCapabilities::for_kind(kind);
            assert!(!caps.native_query && !caps.indexing);
            assert!(caps.aggregation);
            assert!(!caps.streaming && !caps.caching);
        }
    }
}
