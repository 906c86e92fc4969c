use core::alloc::Layout;
use core::mem;
use core::ptr::{self, NonNull};
use core::slice;
use std::alloc::{alloc, dealloc};
use std::cmp;

use log::{debug, error, warn};

use crate::config::BuildOptions;
use crate::error::{HashError, Result};
use crate::hash::strlow;

pub(crate) mod wildcard;

cfg_if::cfg_if! {
    if #[cfg(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64"))] {
        /// Stride that bucket blocks are padded to, so that walking one
        /// bucket never shares a line with its neighbours.
        pub(crate) const CACHE_LINE: usize = 64;
    } else if #[cfg(target_arch = "powerpc64")] {
        pub(crate) const CACHE_LINE: usize = 128;
    } else if #[cfg(target_arch = "s390x")] {
        pub(crate) const CACHE_LINE: usize = 256;
    } else {
        pub(crate) const CACHE_LINE: usize = 64;
    }
}

/// Native word size: the value slot of a packed element, and the unit
/// every element is aligned to.
pub(crate) const WORD: usize = mem::size_of::<usize>();

/// Hard per-bucket byte limit the 16-bit accounting can address.
const BUCKET_LIMIT: usize = 65_536 - CACHE_LINE;

#[inline]
pub(crate) const fn align_up(len: usize, align: usize) -> usize {
    (len + align - 1) & !(align - 1)
}

/// Packed footprint of one element: value slot, `u16` length and name,
/// padded out to the next word boundary.
#[inline]
pub(crate) const fn elt_size(name_len: usize) -> usize {
    WORD + align_up(name_len + 2, WORD)
}

/// One (name, hash, value word) triple handed to the compactor.
///
/// The value word is opaque here; zero is reserved for the bucket
/// terminator and must never be stored.
pub(crate) struct Entry<'a> {
    pub name: &'a [u8],
    pub hash: usize,
    pub value: usize,
}

/// A frozen hash table: a bucket-pointer vector into one contiguous,
/// cache-line-aligned arena of packed elements.
///
/// Each nonempty bucket is a run of packed elements closed by a null
/// value slot; empty buckets hold no pointer at all. Nothing is mutated
/// after [`HashTable::build`] returns.
pub(crate) struct HashTable {
    buckets: Box<[Option<NonNull<u8>>]>,
    arena: NonNull<u8>,
    arena_size: usize,
}

impl HashTable {
    /// Compact `entries` into a frozen table.
    ///
    /// Searches for the smallest bucket count whose per-bucket packed
    /// length respects `opts.bucket_size`, then lays every element into a
    /// single arena, one cache-line-padded block per nonempty bucket.
    pub(crate) fn build(entries: &[Entry<'_>], opts: &BuildOptions) -> Result<HashTable> {
        let name = opts.name;

        if opts.max_size == 0 {
            error!(
                "could not build {}, you should increase {}_max_size: {}",
                name, name, opts.max_size
            );
            return Err(HashError::MaxSize {
                name,
                max_size: opts.max_size,
            });
        }
        if opts.bucket_size > BUCKET_LIMIT {
            error!(
                "could not build {}, too large {}_bucket_size: {}",
                name, name, opts.bucket_size
            );
            return Err(HashError::BucketSize {
                name,
                bucket_size: opts.bucket_size,
            });
        }
        for e in entries {
            if opts.bucket_size < elt_size(e.name.len()) + WORD {
                error!(
                    "could not build {}, you should increase {}_bucket_size: {}",
                    name, name, opts.bucket_size
                );
                return Err(HashError::ElementSize {
                    name,
                    bucket_size: opts.bucket_size,
                });
            }
        }

        if entries.is_empty() {
            return Ok(HashTable {
                buckets: vec![None; 1].into_boxed_slice(),
                arena: NonNull::dangling(),
                arena_size: 0,
            });
        }

        let mut test = vec![0u16; opts.max_size];
        // usable bytes per bucket once the terminator slot is reserved
        let capacity = opts.bucket_size - WORD;

        let mut start = match capacity / (2 * WORD) {
            0 => 1,
            per => cmp::max(1, entries.len() / per),
        };
        if opts.max_size > 10_000 && opts.max_size / entries.len() < 100 {
            start = opts.max_size - 1000;
        }

        let mut size = opts.max_size;
        let mut found = false;
        'search: for s in start..=opts.max_size {
            for t in &mut test[..s] {
                *t = 0;
            }
            for e in entries {
                let bucket = e.hash % s;
                let len = test[bucket] as usize + elt_size(e.name.len());
                if len > capacity {
                    continue 'search;
                }
                test[bucket] = len as u16;
            }
            size = s;
            found = true;
            break;
        }
        if !found {
            warn!(
                "could not build optimal {}, you should increase either \
                 {}_max_size: {} or {}_bucket_size: {}; ignoring {}_bucket_size",
                name, name, opts.max_size, name, opts.bucket_size, name
            );
        }

        // actual byte count per bucket, terminator included
        for t in &mut test[..size] {
            *t = WORD as u16;
        }
        for e in entries {
            let bucket = e.hash % size;
            let len = test[bucket] as usize + elt_size(e.name.len());
            if len > BUCKET_LIMIT {
                error!(
                    "could not build {}, you should increase {}_max_size: {}",
                    name, name, opts.max_size
                );
                return Err(HashError::MaxSize {
                    name,
                    max_size: opts.max_size,
                });
            }
            test[bucket] = len as u16;
        }

        // arena footprint: nonempty buckets only, each padded to a full
        // cache line
        let mut total = 0;
        for t in &mut test[..size] {
            if *t as usize == WORD {
                continue;
            }
            *t = align_up(*t as usize, CACHE_LINE) as u16;
            total += *t as usize;
        }

        let arena = if total == 0 {
            NonNull::dangling()
        } else {
            let layout =
                Layout::from_size_align(total, CACHE_LINE).map_err(|_| HashError::Alloc(total))?;
            match NonNull::new(unsafe { alloc(layout) }) {
                Some(p) => p,
                None => {
                    error!("could not allocate {} bytes for {}", total, name);
                    return Err(HashError::Alloc(total));
                }
            }
        };

        // carve the arena into bucket blocks
        let mut buckets: Box<[Option<NonNull<u8>>]> = vec![None; size].into_boxed_slice();
        let mut offset = 0;
        for i in 0..size {
            if test[i] as usize == WORD {
                continue;
            }
            buckets[i] = Some(unsafe { NonNull::new_unchecked(arena.as_ptr().add(offset)) });
            offset += test[i] as usize;
        }

        // fill, tracking a write cursor per bucket
        for t in &mut test[..size] {
            *t = 0;
        }
        for e in entries {
            let bucket = e.hash % size;
            let base = match buckets[bucket] {
                Some(p) => p.as_ptr(),
                None => unreachable!(),
            };
            unsafe {
                let elt = base.add(test[bucket] as usize);
                ptr::write(elt as *mut usize, e.value);
                ptr::write(elt.add(WORD) as *mut u16, e.name.len() as u16);
                strlow(
                    slice::from_raw_parts_mut(elt.add(WORD + 2), e.name.len()),
                    e.name,
                );
            }
            test[bucket] = (test[bucket] as usize + elt_size(e.name.len())) as u16;
        }

        // a null value slot closes every bucket chain; the space was
        // reserved by seeding the counters with WORD
        for i in 0..size {
            if let Some(base) = buckets[i] {
                unsafe {
                    ptr::write(base.as_ptr().add(test[i] as usize) as *mut usize, 0);
                }
            }
        }

        debug!(
            "{} built: {} buckets for {} elements",
            name,
            size,
            entries.len()
        );

        Ok(HashTable {
            buckets,
            arena,
            arena_size: total,
        })
    }

    /// Look up `name` (already lowercase) by its precomputed hash.
    ///
    /// Returns the stored value word, or zero when the name is absent.
    #[inline]
    pub(crate) fn find(&self, key: usize, name: &[u8]) -> usize {
        let mut elt = match self.buckets[key % self.buckets.len()] {
            Some(p) => p.as_ptr() as *const u8,
            None => return 0,
        };

        unsafe {
            loop {
                let value = ptr::read(elt as *const usize);
                if value == 0 {
                    return 0;
                }

                let len = ptr::read(elt.add(WORD) as *const u16) as usize;
                if len == name.len() {
                    let stored = slice::from_raw_parts(elt.add(WORD + 2), len);
                    if stored == name {
                        return value;
                    }
                }

                elt = elt.add(elt_size(len));
            }
        }
    }

    /// Number of buckets.
    #[cfg(test)]
    pub(crate) fn size(&self) -> usize {
        self.buckets.len()
    }
}

impl Drop for HashTable {
    fn drop(&mut self) {
        if self.arena_size != 0 {
            unsafe {
                dealloc(
                    self.arena.as_ptr(),
                    Layout::from_size_align_unchecked(self.arena_size, CACHE_LINE),
                );
            }
        }
    }
}

// The table is immutable once built; lookups are pure reads.
unsafe impl Send for HashTable {}
unsafe impl Sync for HashTable {}
