use std::fmt;

use serde::Serialize;
use serde::ser::SerializeMap;

use crate::cache::stage::{STAGE_ORDER, StageKind};

/// Effective force-refresh flags, one bit per stage.
///
/// Cascading returns a new set; existing values never change.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ForceRefresh {
    bits: u16,
}

impl ForceRefresh {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn get(self, stage: StageKind) -> bool {
        self.bits & (1 << stage.index()) != 0
    }

    pub fn with(self, stage: StageKind) -> Self {
        Self {
            bits: self.bits | (1 << stage.index()),
        }
    }

    pub fn from_stages<I: IntoIterator<Item = StageKind>>(stages: I) -> Self {
        stages.into_iter().fold(Self::none(), Self::with)
    }

    pub fn any(self) -> bool {
        self.bits != 0
    }

    pub fn enabled(self) -> impl Iterator<Item = StageKind> {
        STAGE_ORDER.into_iter().filter(move |s| self.get(*s))
    }

    /// Every stage strictly after `stage` forced; `stage` and earlier untouched.
    pub fn cascaded_from(self, stage: StageKind) -> Self {
        stage.downstream().iter().copied().fold(self, Self::with)
    }

    /// Resolves configured flags into effective flags.
    pub fn resolve(raw: ForceRefresh) -> Self {
        raw.enabled().fold(raw, |acc, stage| acc.cascaded_from(stage))
    }
}

impl fmt::Debug for ForceRefresh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.enabled()).finish()
    }
}

impl Serialize for ForceRefresh {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(STAGE_ORDER.len()))?;
        for stage in STAGE_ORDER {
            map.serialize_entry(stage.as_str(), &self.get(stage))?;
        }
        map.end()
    }
}
