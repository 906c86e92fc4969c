use thiserror::Error;

#[derive(Error, Debug)]
pub enum HashError {
    /// Empty, over-long, NUL-carrying, or a wildcard in no recognized
    /// position.
    #[error("malformed key \"{0}\"")]
    Malformed(String),
    /// The key canonicalizes to one already staged in its class.
    #[error("conflicting key \"{0}\"")]
    Duplicate(String),
    /// `bucket_size` exceeds what the 16-bit bucket accounting can address.
    #[error("could not build {name}, too large {name}_bucket_size: {bucket_size}")]
    BucketSize { name: &'static str, bucket_size: usize },
    /// A single packed element cannot fit a bucket of the configured size.
    #[error("could not build {name}, you should increase {name}_bucket_size: {bucket_size}")]
    ElementSize { name: &'static str, bucket_size: usize },
    /// A bucket overflows the hard per-bucket limit even at `max_size`
    /// buckets, or `max_size` is zero.
    #[error("could not build {name}, you should increase {name}_max_size: {max_size}")]
    MaxSize { name: &'static str, max_size: usize },
    #[error("allocation of {0} bytes failed")]
    Alloc(usize),
}

pub type Result<T> = std::result::Result<T, HashError>;
