//! Equivalence classes over interned substitution units.
//!
//! Strings are interned to dense `u32` ids; the forest lives in parallel
//! `parent`/`rank` arrays with path compression. Each root also records the
//! id of its class representative, which is independent of the tree shape:
//! union by rank decides the root, the representative rule decides the
//! canonical string.

use std::collections::HashMap;

use crate::codec::is_ascii_unit;

/// Outcome of a single [`EquivalenceClasses::union`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Union {
    Merged,
    /// Both units were already in the same class.
    Same,
    /// The classes are anchored on two different ASCII strings.
    Refused,
}

/// A finished class: the representative plus every member, sorted by bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
    pub representative: String,
    pub members: Vec<String>,
}

#[derive(Debug, Default)]
pub struct EquivalenceClasses {
    ids: HashMap<String, u32>,
    strings: Vec<String>,
    parent: Vec<u32>,
    rank: Vec<u8>,
    /// Representative id, meaningful only at roots.
    repr: Vec<u32>,
    pinned: Option<u32>,
    refused: usize,
}

impl EquivalenceClasses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct units seen so far.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Number of unions refused by the ASCII anchor rule.
    pub fn refused(&self) -> usize {
        self.refused
    }

    pub fn intern(&mut self, unit: &str) -> u32 {
        if let Some(&id) = self.ids.get(unit) {
            return id;
        }
        let id = self.strings.len() as u32;
        self.ids.insert(unit.to_string(), id);
        self.strings.push(unit.to_string());
        self.parent.push(id);
        self.rank.push(0);
        self.repr.push(id);
        id
    }

    /// Make `unit` the representative of whatever class it ends up in.
    ///
    /// Only one unit can be pinned; pinning again replaces the previous pin.
    pub fn pin(&mut self, unit: &str) {
        let id = self.intern(unit);
        let root = self.find(id);
        self.repr[root as usize] = id;
        self.pinned = Some(id);
    }

    fn find(&mut self, id: u32) -> u32 {
        let mut root = id;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        let mut cur = id;
        while self.parent[cur as usize] != root {
            let next = self.parent[cur as usize];
            self.parent[cur as usize] = root;
            cur = next;
        }
        root
    }

    pub fn union(&mut self, a: &str, b: &str) -> Union {
        let a = self.intern(a);
        let b = self.intern(b);
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return Union::Same;
        }

        let repr_a = self.repr[ra as usize];
        let repr_b = self.repr[rb as usize];
        let repr = if self.pinned == Some(repr_a) {
            repr_a
        } else if self.pinned == Some(repr_b) {
            repr_b
        } else {
            let (sa, sb) = (&self.strings[repr_a as usize], &self.strings[repr_b as usize]);
            if is_ascii_unit(sa) && is_ascii_unit(sb) {
                tracing::trace!(left = %sa, right = %sb, "refusing union of two ASCII-anchored classes");
                self.refused += 1;
                return Union::Refused;
            }
            if sa <= sb {
                repr_a
            } else {
                repr_b
            }
        };

        let (ra, rb) = (ra as usize, rb as usize);
        let root = match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => {
                self.parent[ra] = rb as u32;
                rb
            }
            std::cmp::Ordering::Greater => {
                self.parent[rb] = ra as u32;
                ra
            }
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra as u32;
                self.rank[ra] += 1;
                ra
            }
        };
        self.repr[root] = repr;
        Union::Merged
    }

    /// Canonical representative of the class holding `unit`, if interned.
    pub fn representative(&mut self, unit: &str) -> Option<&str> {
        let id = *self.ids.get(unit)?;
        let root = self.find(id);
        Some(&self.strings[self.repr[root as usize] as usize])
    }

    /// Every class with at least two members, ordered by representative.
    pub fn classes(&mut self) -> Vec<Class> {
        let mut by_root: HashMap<u32, Vec<u32>> = HashMap::new();
        for id in 0..self.strings.len() as u32 {
            let root = self.find(id);
            by_root.entry(root).or_default().push(id);
        }

        let mut classes: Vec<Class> = by_root
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(root, ids)| {
                let mut members: Vec<String> = ids
                    .into_iter()
                    .map(|id| self.strings[id as usize].clone())
                    .collect();
                members.sort_unstable();
                Class {
                    representative: self.strings[self.repr[root as usize] as usize].clone(),
                    members,
                }
            })
            .collect();
        classes.sort_unstable_by(|x, y| x.representative.cmp(&y.representative));
        classes
    }
}
