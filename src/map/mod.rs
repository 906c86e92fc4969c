use crate::config::BuildOptions;
use crate::error::Result;
use crate::hash::hash_key;
use crate::keys::{dns_name_cmp, HostKeys, Staged};
use crate::table::wildcard::{WcKey, WildcardTable};
use crate::table::{Entry, HashTable};

/// Data words are pool indices biased by one and shifted past the tag
/// bits, so they are never zero and never tagged.
#[inline]
fn data_word(index: usize) -> usize {
    (index + 1) << 2
}

/// The frozen lookup handle: an exact table, a head-wildcard hierarchy
/// and a tail-wildcard hierarchy over one owned value pool.
///
/// Immutable once built; any number of threads may run lookups against it
/// concurrently.
///
/// ```
/// use hostmap::{BuildOptions, HostKeys, HostMap, KeyFlags, StagingSize};
///
/// let flags = KeyFlags { wildcard_keys: true, ..KeyFlags::default() };
/// let mut keys = HostKeys::new(StagingSize::Small);
///
/// let mut host = b"example.com".to_vec();
/// keys.add_key(&mut host, 1, flags).unwrap();
/// let mut host = b"*.example.org".to_vec();
/// keys.add_key(&mut host, 2, flags).unwrap();
///
/// let map = HostMap::build(keys, &BuildOptions::default()).unwrap();
/// assert_eq!(map.find(b"example.com"), Some(&1));
/// assert_eq!(map.find(b"www.example.org"), Some(&2));
/// assert_eq!(map.find(b"example.org"), None);
/// ```
pub struct HostMap<V> {
    exact: Option<HashTable>,
    wc_head: Option<WildcardTable>,
    wc_tail: Option<WildcardTable>,
    values: Box<[V]>,
}

impl<V> HostMap<V> {
    /// Compact the staged keys into a frozen lookup handle.
    ///
    /// The exact sequence feeds the flat-table compactor; each wildcard
    /// sequence is sorted in DNS order and composed into its hierarchy.
    /// All staging scratch is dropped here.
    pub fn build(staged: HostKeys<V>, opts: &BuildOptions) -> Result<HostMap<V>> {
        let (values, exact_keys, mut wc_head_keys, mut wc_tail_keys) = staged.into_parts();

        let exact = if exact_keys.is_empty() {
            None
        } else {
            let entries: Vec<Entry<'_>> = exact_keys
                .iter()
                .map(|s| Entry {
                    name: &s.name,
                    hash: s.hash,
                    value: data_word(s.value),
                })
                .collect();
            Some(HashTable::build(&entries, opts)?)
        };

        let wc_head = build_wildcard(&mut wc_head_keys, opts)?;
        let wc_tail = build_wildcard(&mut wc_tail_keys, opts)?;

        Ok(HostMap {
            exact,
            wc_head,
            wc_tail,
            values: values.into_boxed_slice(),
        })
    }

    /// Combined lookup. `name` must already be lowercase; the exact-table
    /// hash is computed here with [`hash_key`].
    #[inline]
    pub fn find(&self, name: &[u8]) -> Option<&V> {
        self.find_with_hash(hash_key(name), name)
    }

    /// Combined lookup with a caller-computed exact-table hash, e.g. one
    /// produced by [`crate::hash_strlow`] while lowercasing the query.
    ///
    /// Tries the exact table first, then the head-wildcard hierarchy,
    /// then the tail-wildcard hierarchy; the first hit wins.
    pub fn find_with_hash(&self, key: usize, name: &[u8]) -> Option<&V> {
        if let Some(exact) = &self.exact {
            let word = exact.find(key, name);
            if word != 0 {
                return self.resolve(word);
            }
        }

        if name.is_empty() {
            return None;
        }

        if let Some(wc) = &self.wc_head {
            let word = wc.find_wc_head(name);
            if word != 0 {
                return self.resolve(word);
            }
        }
        if let Some(wc) = &self.wc_tail {
            let word = wc.find_wc_tail(name);
            if word != 0 {
                return self.resolve(word);
            }
        }

        None
    }

    /// Exact-table lookup only.
    pub fn find_exact(&self, key: usize, name: &[u8]) -> Option<&V> {
        let table = self.exact.as_ref()?;
        self.resolve(table.find(key, name))
    }

    /// Head-wildcard lookup only: `*.example.com`, `.example.com`.
    pub fn find_wc_head(&self, name: &[u8]) -> Option<&V> {
        let wc = self.wc_head.as_ref()?;
        self.resolve(wc.find_wc_head(name))
    }

    /// Tail-wildcard lookup only: `www.example.*`.
    pub fn find_wc_tail(&self, name: &[u8]) -> Option<&V> {
        let wc = self.wc_tail.as_ref()?;
        self.resolve(wc.find_wc_tail(name))
    }

    /// Number of keys the map was built from.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    fn resolve(&self, word: usize) -> Option<&V> {
        if word == 0 {
            None
        } else {
            Some(&self.values[(word >> 2) - 1])
        }
    }
}

fn build_wildcard(
    staged: &mut Vec<Staged>,
    opts: &BuildOptions,
) -> Result<Option<WildcardTable>> {
    if staged.is_empty() {
        return Ok(None);
    }

    // the composer groups consecutive keys by leading segment, which needs
    // DNS order: a name sorts immediately before its subdomains
    staged.sort_by(|a, b| dns_name_cmp(&a.name, &b.name));

    let keys: Vec<WcKey<'_>> = staged
        .iter()
        .map(|s| WcKey {
            name: &s.name,
            value: data_word(s.value),
        })
        .collect();
    WildcardTable::build(&keys, opts).map(Some)
}
