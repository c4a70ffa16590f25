//! Set domains bounded by a greatest lower bound and a least upper bound.

use std::collections::BTreeSet;
use std::fmt;

/// Set domain: every admissible set `s` satisfies `glb ⊆ s ⊆ lub`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDomain {
    glb: BTreeSet<i64>,
    lub: BTreeSet<i64>,
}

impl SetDomain {
    /// Returns `None` when `glb` is not contained in `lub`.
    pub fn new(
        glb: impl IntoIterator<Item = i64>,
        lub: impl IntoIterator<Item = i64>,
    ) -> Option<Self> {
        let glb: BTreeSet<i64> = glb.into_iter().collect();
        let lub: BTreeSet<i64> = lub.into_iter().collect();
        glb.is_subset(&lub).then_some(Self { glb, lub })
    }

    pub fn glb(&self) -> &BTreeSet<i64> {
        &self.glb
    }

    pub fn lub(&self) -> &BTreeSet<i64> {
        &self.lub
    }

    /// Elements still free to be in or out.
    pub fn undecided(&self) -> impl DoubleEndedIterator<Item = i64> + '_ {
        self.lub.iter().filter(move |e| !self.glb.contains(*e)).copied()
    }

    /// Number of admissible sets, saturating at `u64::MAX`.
    pub fn size(&self) -> u64 {
        let free = (self.lub.len() - self.glb.len()) as u32;
        1u64.checked_shl(free).unwrap_or(u64::MAX)
    }

    pub fn is_singleton(&self) -> bool {
        self.glb.len() == self.lub.len()
    }

    /// Forces `elem` into the set. `None` if `elem` is outside the lub.
    pub fn include(&mut self, elem: i64) -> Option<bool> {
        if !self.lub.contains(&elem) {
            return None;
        }
        Some(self.glb.insert(elem))
    }

    /// Forces `elem` out of the set. `None` if `elem` is already in the glb.
    pub fn exclude(&mut self, elem: i64) -> Option<bool> {
        if self.glb.contains(&elem) {
            return None;
        }
        Some(self.lub.remove(&elem))
    }
}

fn write_elems(f: &mut fmt::Formatter<'_>, elems: &BTreeSet<i64>) -> fmt::Result {
    write!(f, "{{")?;
    for (i, e) in elems.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", e)?;
    }
    write!(f, "}}")
}

impl fmt::Display for SetDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_elems(f, &self.glb)?;
        if !self.is_singleton() {
            write!(f, "..")?;
            write_elems(f, &self.lub)?;
        }
        Ok(())
    }
}
