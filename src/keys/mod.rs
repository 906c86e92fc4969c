use std::cmp::Ordering;

use crate::config::{KeyFlags, StagingSize};
use crate::error::{HashError, Result};
use crate::hash::{hash, to_lower};

/// Staging bucket count for [`StagingSize::Small`].
const SMALL_HSIZE: usize = 107;
/// Staging bucket count for [`StagingSize::Large`]. Prime, so the staging
/// hash spreads even over pathological key sets.
const LARGE_HSIZE: usize = 10_007;

/// Initial capacities of the staged-key sequences.
const SMALL_ASIZE: usize = 4;
const LARGE_ASIZE: usize = 16_384;

/// Longest raw key the packed element layout can describe.
const MAX_KEY_LEN: usize = 65_533;

/// One staged key.
///
/// `name` is the canonical form: lowercase for exact keys, dot-reversed for
/// head wildcards, `.*`-stripped for tail wildcards. `hash` is zero for
/// wildcard entries; the composer hashes those per segment.
pub(crate) struct Staged {
    pub name: Box<[u8]>,
    pub hash: usize,
    pub value: usize,
}

/// Collects keys for one lookup handle, classifying each as exact,
/// head-wildcard or tail-wildcard and rejecting duplicates within a class.
///
/// All staging state is scratch: it is consumed by
/// [`crate::HostMap::build`] and nothing of it survives into the frozen
/// tables.
pub struct HostKeys<V> {
    hsize: usize,
    values: Vec<V>,
    keys: Vec<Staged>,
    wc_head: Vec<Staged>,
    wc_tail: Vec<Staged>,
    keys_hash: Vec<Vec<Box<[u8]>>>,
    wc_head_hash: Vec<Vec<Box<[u8]>>>,
    wc_tail_hash: Vec<Vec<Box<[u8]>>>,
}

impl<V> HostKeys<V> {
    pub fn new(size: StagingSize) -> Self {
        let (hsize, asize) = match size {
            StagingSize::Small => (SMALL_HSIZE, SMALL_ASIZE),
            StagingSize::Large => (LARGE_HSIZE, LARGE_ASIZE),
        };

        Self {
            hsize,
            values: Vec::new(),
            keys: Vec::with_capacity(asize),
            wc_head: Vec::with_capacity(asize),
            wc_tail: Vec::with_capacity(asize),
            keys_hash: vec![Vec::new(); hsize],
            wc_head_hash: vec![Vec::new(); hsize],
            wc_tail_hash: vec![Vec::new(); hsize],
        }
    }

    /// Stage one key.
    ///
    /// Exact keys are lowercased in place unless `flags.readonly_key` is
    /// set; with `readonly_key` the caller must supply exact keys already
    /// lowercase, since lookups hash the canonical lowercase form.
    ///
    /// Wildcard patterns are accepted only with `flags.wildcard_keys` and
    /// are rewritten into canonical form: `*.example.com` is staged as
    /// `com.example.`, `.example.com` as `com.example`, `www.example.*` as
    /// `www.example`. A dot-prefix pattern also claims its bare literal, so
    /// a later exact `example.com` conflicts with `.example.com`.
    ///
    /// A rejected call leaves the staging state untouched.
    pub fn add_key(&mut self, key: &mut [u8], value: V, flags: KeyFlags) -> Result<()> {
        if key.is_empty() || key.len() > MAX_KEY_LEN || key.contains(&0) {
            return Err(HashError::Malformed(printable(key)));
        }

        let mut last = key.len();
        let mut skip = 0;
        let mut wildcard = false;

        if flags.wildcard_keys {
            let mut stars = 0;
            for i in 0..key.len() {
                if key[i] == b'*' {
                    stars += 1;
                    if stars > 1 {
                        return Err(HashError::Malformed(printable(key)));
                    }
                }
                if key[i] == b'.' && i + 1 < key.len() && key[i + 1] == b'.' {
                    return Err(HashError::Malformed(printable(key)));
                }
            }

            if key.len() > 1 && key[0] == b'.' {
                if stars != 0 {
                    return Err(HashError::Malformed(printable(key)));
                }
                skip = 1;
                wildcard = true;
            } else if key.len() > 2 && key[0] == b'*' && key[1] == b'.' {
                skip = 2;
                wildcard = true;
            } else if key.len() > 2 && key[last - 2] == b'.' && key[last - 1] == b'*' {
                last -= 2;
                wildcard = true;
            } else if stars != 0 || key[0] == b'.' {
                return Err(HashError::Malformed(printable(key)));
            }
        } else if key[0] == b'.' || key.contains(&b'*') {
            return Err(HashError::Malformed(printable(key)));
        }

        if wildcard {
            self.add_wildcard(key, skip, last, value, flags)
        } else {
            self.add_exact(key, value, flags)
        }
    }

    fn add_exact(&mut self, key: &mut [u8], value: V, flags: KeyFlags) -> Result<()> {
        let mut h = 0;
        for i in 0..key.len() {
            if !flags.readonly_key {
                key[i] = to_lower(key[i]);
            }
            h = hash(h, key[i]);
        }

        let bucket = h % self.hsize;
        if contains(&self.keys_hash[bucket], key) {
            return Err(HashError::Duplicate(printable(key)));
        }

        let index = self.push_value(value);
        self.keys_hash[bucket].push(Box::from(&key[..]));
        self.keys.push(Staged {
            name: Box::from(&key[..]),
            hash: h,
            value: index,
        });
        Ok(())
    }

    fn add_wildcard(
        &mut self,
        key: &mut [u8],
        skip: usize,
        last: usize,
        value: V,
        flags: KeyFlags,
    ) -> Result<()> {
        // canonical forms are always built from lowered bytes
        let mut low = key[..last].to_vec();
        let mut h = 0;
        for i in skip..last {
            low[i] = to_lower(low[i]);
            h = hash(h, low[i]);
        }
        if !flags.readonly_key {
            key[skip..last].copy_from_slice(&low[skip..last]);
        }

        let bucket = h % self.hsize;

        // run every conflict check before any insertion, so a rejected key
        // leaves the staging state untouched
        let chain = if skip != 0 {
            &self.wc_head_hash[bucket]
        } else {
            &self.wc_tail_hash[bucket]
        };
        if contains(chain, &low[skip..]) {
            return Err(HashError::Duplicate(printable(key)));
        }
        if skip == 1 && contains(&self.keys_hash[bucket], &low[1..]) {
            return Err(HashError::Duplicate(printable(key)));
        }

        let index = self.push_value(value);
        if skip != 0 {
            if skip == 1 {
                // ".example.com" also claims the bare "example.com" literal
                self.keys_hash[bucket].push(Box::from(&low[1..]));
            }
            let canonical = reverse_segments(&low);
            self.wc_head_hash[bucket].push(Box::from(&low[skip..]));
            self.wc_head.push(Staged {
                name: canonical,
                hash: 0,
                value: index,
            });
        } else {
            self.wc_tail_hash[bucket].push(Box::from(&low[..]));
            self.wc_tail.push(Staged {
                name: low.into_boxed_slice(),
                hash: 0,
                value: index,
            });
        }
        Ok(())
    }

    fn push_value(&mut self, value: V) -> usize {
        self.values.push(value);
        self.values.len() - 1
    }

    pub(crate) fn into_parts(self) -> (Vec<V>, Vec<Staged>, Vec<Staged>, Vec<Staged>) {
        (self.values, self.keys, self.wc_head, self.wc_tail)
    }
}

fn contains(chain: &[Box<[u8]>], name: &[u8]) -> bool {
    chain.iter().any(|stored| &stored[..] == name)
}

fn printable(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}

/// Rewrite a lowered head-wildcard key into its dot-reversed canonical
/// form: `*.example.com` to `com.example.`, `.example.com` to
/// `com.example`. The leading `.` or `*` is dropped; a `*.` prefix leaves
/// a trailing dot marking "wildcard child only".
fn reverse_segments(raw: &[u8]) -> Box<[u8]> {
    let last = raw.len();
    let mut out = vec![0u8; last - 1];
    let mut n = 0;
    let mut seg = 0;

    for i in (1..last).rev() {
        if raw[i] == b'.' {
            out[n..n + seg].copy_from_slice(&raw[i + 1..i + 1 + seg]);
            n += seg;
            out[n] = b'.';
            n += 1;
            seg = 0;
        } else {
            seg += 1;
        }
    }
    if seg != 0 {
        out[n..n + seg].copy_from_slice(&raw[1..1 + seg]);
        n += seg;
    }
    debug_assert_eq!(n, last - 1);

    out.into_boxed_slice()
}

/// DNS-order comparison: bytewise, except `.` ranks below every other
/// byte, so a name sorts immediately before its subdomains.
pub(crate) fn dns_name_cmp(a: &[u8], b: &[u8]) -> Ordering {
    for (&x, &y) in a.iter().zip(b.iter()) {
        if x == y {
            continue;
        }
        if x == b'.' {
            return Ordering::Less;
        }
        if y == b'.' {
            return Ordering::Greater;
        }
        return x.cmp(&y);
    }
    a.len().cmp(&b.len())
}
