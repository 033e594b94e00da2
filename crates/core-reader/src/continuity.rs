//! Shabad continuity exemptions.
//!
//! A change of shabad id normally starts a new centered block. Some
//! compositions are split across many ids yet read as one flowing text (the
//! pauris of Japji Sahib); a rule declares such transitions continuous.

use core_model::{ShabadId, SourceId};

/// Last pauri of Japji Sahib in the Granth numbering.
pub const JAPJI_LAST_PAURI: ShabadId = 40;

pub trait ContinuityRule: Send + Sync {
    fn is_continuous(&self, previous: Option<ShabadId>, next: ShabadId, source: SourceId) -> bool;
}

/// Every shabad change starts a block.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContinuity;

impl ContinuityRule for NoContinuity {
    fn is_continuous(&self, _previous: Option<ShabadId>, _next: ShabadId, _source: SourceId) -> bool {
        false
    }
}

/// Ids strictly between `first` and `last` continue the preceding block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuityRange {
    pub source: SourceId,
    pub first: ShabadId,
    pub last: ShabadId,
}

impl ContinuityRange {
    pub fn contains(&self, source: SourceId, id: ShabadId) -> bool {
        self.source == source && self.first < id && id < self.last
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuityTable {
    ranges: Vec<ContinuityRange>,
}

impl ContinuityTable {
    pub fn new(ranges: Vec<ContinuityRange>) -> Self {
        Self { ranges }
    }

    pub fn ranges(&self) -> &[ContinuityRange] {
        &self.ranges
    }
}

impl Default for ContinuityTable {
    fn default() -> Self {
        Self::new(vec![ContinuityRange {
            source: SourceId::Granth,
            first: 1,
            last: JAPJI_LAST_PAURI,
        }])
    }
}

impl ContinuityRule for ContinuityTable {
    fn is_continuous(&self, _previous: Option<ShabadId>, next: ShabadId, source: SourceId) -> bool {
        self.ranges.iter().any(|range| range.contains(source, next))
    }
}
