use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content category a slug belongs to.
///
/// Kinds namespace the identifier space: the same slug under two kinds
/// yields two unrelated bindings. Wire names are lowercase and matched
/// case-sensitively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// A comic series.
    Series,
    /// A single chapter of a series.
    Chapter,
}

impl Kind {
    /// Every kind, in declaration order.
    pub const ALL: [Kind; 2] = [Kind::Series, Kind::Chapter];

    /// The wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Series => "series",
            Self::Chapter => "chapter",
        }
    }
}

impl FromStr for Kind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "series" => Ok(Self::Series),
            "chapter" => Ok(Self::Chapter),
            other => Err(TypeError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
