use serde::Serialize;

use crate::{GlueError, Pattern, ResourceRecord};

/// Highest position an index may name.
pub const MAX_INDEX: u32 = 99;

/// Records ordered by compound key. The order does not depend on backend return order, so an
/// index read off one listing names the same record on the next run over the same fleet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MatchSet(Vec<ResourceRecord>);

impl MatchSet {
    pub fn new(mut records: Vec<ResourceRecord>) -> Self {
        records.sort_by_cached_key(ResourceRecord::key);
        Self(records)
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn iter(&self) -> std::slice::Iter<'_, ResourceRecord> { self.0.iter() }

    /// Record at a 1-based position.
    pub fn get(&self, position: usize) -> Option<&ResourceRecord> {
        position.checked_sub(1).and_then(|i| self.0.get(i))
    }

    /// `(position, record)` pairs with 1-based positions, as shown to the operator.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &ResourceRecord)> + '_ {
        self.0.iter().enumerate().map(|(i, r)| (i + 1, r))
    }
}

impl IntoIterator for MatchSet {
    type Item = ResourceRecord;
    type IntoIter = std::vec::IntoIter<ResourceRecord>;
    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

/// Outcome of applying an optional index to a match set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    None,
    One(ResourceRecord),
    Ambiguous(MatchSet),
}

/// Keep the records whose compound key matches `pattern`.
pub fn filter(records: Vec<ResourceRecord>, pattern: &Pattern) -> Vec<ResourceRecord> {
    records.into_iter().filter(|r| pattern.is_match(&r.key())).collect()
}

/// Order `matches` and collapse them by `index` (1-based).
///
/// An index is validated before it is applied, so an out-of-bounds index fails even when
/// there are no matches. A valid in-range index always wins over ambiguity.
pub fn select(matches: Vec<ResourceRecord>, index: Option<u32>) -> Result<Selection, GlueError> {
    let set = MatchSet::new(matches);
    match index {
        None if set.len() > 1 => Ok(Selection::Ambiguous(set)),
        None => Ok(set.into_iter().next().map_or(Selection::None, Selection::One)),
        Some(i) if !(1..=MAX_INDEX).contains(&i) => Err(GlueError::InvalidIndex(i)),
        Some(i) => {
            let available = set.len();
            set.into_iter()
                .nth(i as usize - 1)
                .map(Selection::One)
                .ok_or(GlueError::IndexOutOfRange { requested: i, available })
        }
    }
}
