use crate::table::CACHE_LINE;

/// Limits for the flat-table compactor.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Upper bound on the bucket-count search. Must be greater than zero.
    pub max_size: usize,
    /// Maximum packed bytes per bucket, terminator slot included.
    ///
    /// Must not exceed `65536` minus the cache-line size.
    pub bucket_size: usize,
    /// Diagnostic label embedded in log messages and errors.
    pub name: &'static str,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_size: 512,
            bucket_size: CACHE_LINE,
            name: "hash",
        }
    }
}

/// Staging table sizing, chosen once when a key set is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingSize {
    /// 107 staging buckets, initial sequence capacity 4.
    Small,
    /// 10007 staging buckets, initial sequence capacity 16384.
    Large,
}

impl Default for StagingSize {
    fn default() -> Self {
        StagingSize::Small
    }
}

/// Per-call options for [`crate::HostKeys::add_key`].
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyFlags {
    /// Accept wildcard patterns: `*.example.com`, `.example.com`,
    /// `www.example.*`. Without it, any `*` or leading `.` is malformed.
    pub wildcard_keys: bool,
    /// Never write into the caller's key buffer. The caller must then
    /// supply exact keys already lowercase.
    pub readonly_key: bool,
}
