use super::{Entry, HashTable};
use crate::config::BuildOptions;
use crate::error::Result;
use crate::hash::hash_key;

/// One canonical-form wildcard key: dot-reversed for head wildcards,
/// `.*`-stripped for tail wildcards. `value` is an untagged data word.
pub(crate) struct WcKey<'a> {
    pub name: &'a [u8],
    pub value: usize,
}

/// A node of the wildcard hierarchy: a flat table over the leading
/// segments at this level, an embedded value word for a pattern that
/// terminates here, and the child nodes owned by this one.
///
/// Value words stored in the flat table carry a tag in their two low
/// bits; tagged links address `children` by index, so the hierarchy is
/// acyclic by construction.
pub(crate) struct WildcardTable {
    table: HashTable,
    children: Vec<WildcardTable>,
    value: usize,
}

impl WildcardTable {
    /// Build one level of the hierarchy from keys sorted in DNS order,
    /// recursing on the tails of each leading-segment group.
    pub(crate) fn build(keys: &[WcKey<'_>], opts: &BuildOptions) -> Result<WildcardTable> {
        let mut curr: Vec<Entry<'_>> = Vec::with_capacity(keys.len());
        let mut children: Vec<WildcardTable> = Vec::new();

        let mut n = 0;
        while n < keys.len() {
            let key = keys[n].name;
            let seg_len = key.iter().position(|&c| c == b'.').unwrap_or(key.len());
            // a trailing dot on the group leader means its own label level
            // must not resolve as a literal
            let dot = seg_len < key.len();

            let mut word = keys[n].value;

            // every member of the group shares the leader's first segment,
            // dot included when there is one
            let len = if dot { seg_len + 1 } else { seg_len };
            let dot_len = seg_len + 1;

            let mut next: Vec<WcKey<'_>> = Vec::new();
            if key.len() != len {
                next.push(WcKey {
                    name: &key[len..],
                    value: keys[n].value,
                });
            }

            let mut i = n + 1;
            while i < keys.len() {
                let other = keys[i].name;
                if other.len() < len || other[..len] != key[..len] {
                    break;
                }
                if !dot && other.len() > len && other[len] != b'.' {
                    break;
                }
                next.push(WcKey {
                    name: &other[dot_len..],
                    value: keys[i].value,
                });
                i += 1;
            }

            if !next.is_empty() {
                let mut child = WildcardTable::build(&next, opts)?;
                if key.len() == len {
                    // the leader's pattern ends at this segment; its value
                    // becomes the literal terminator of the child level
                    child.value = word;
                }
                word = (children.len() << 2) | if dot { 3 } else { 2 };
                children.push(child);
            } else if dot {
                word |= 1;
            }

            curr.push(Entry {
                name: &key[..seg_len],
                hash: hash_key(&key[..seg_len]),
                value: word,
            });

            n = i;
        }

        let table = HashTable::build(&curr, opts)?;
        Ok(WildcardTable {
            table,
            children,
            value: 0,
        })
    }

    /// Head-wildcard lookup, consuming labels right to left.
    ///
    /// Returns an untagged data word, or zero for a miss.
    pub(crate) fn find_wc_head(&self, name: &[u8]) -> usize {
        let mut n = name.len();
        while n > 0 {
            if name[n - 1] == b'.' {
                break;
            }
            n -= 1;
        }

        let seg = &name[n..];
        let value = self.table.find(hash_key(seg), seg);

        // the two low bits of a stored word:
        //   00 - data, for both "example.com" and "*.example.com"
        //   01 - data, for "*.example.com" only
        //   10 - child table allowing both "example.com" and "*.example.com"
        //   11 - child table allowing "*.example.com" only
        if value != 0 {
            if value & 2 != 0 {
                let child = &self.children[value >> 2];

                if n == 0 {
                    // the query is down to its leading label
                    if value & 1 != 0 {
                        return 0;
                    }
                    return child.value;
                }

                let found = child.find_wc_head(&name[..n - 1]);
                if found != 0 {
                    return found;
                }
                return child.value;
            }

            if value & 1 != 0 {
                if n == 0 {
                    return 0;
                }
                return value & !3;
            }

            return value;
        }

        self.value
    }

    /// Tail-wildcard lookup, consuming labels left to right.
    ///
    /// Returns an untagged data word, or zero for a miss.
    pub(crate) fn find_wc_tail(&self, name: &[u8]) -> usize {
        let i = match name.iter().position(|&c| c == b'.') {
            Some(i) => i,
            // a pattern always covers at least one label beyond its own
            None => return 0,
        };

        let seg = &name[..i];
        let value = self.table.find(hash_key(seg), seg);

        // the two low bits: 00 - data, 11 - child table
        if value != 0 {
            if value & 2 != 0 {
                let child = &self.children[value >> 2];

                let found = child.find_wc_tail(&name[i + 1..]);
                if found != 0 {
                    return found;
                }
                return child.value;
            }

            return value;
        }

        self.value
    }
}
