//! The closed set of object classes the trained model can emit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category assigned to a detected object by the classifier.
///
/// The set is fixed at model-training time; `class_names` artifacts list a
/// subset or reordering of these variants. Rendering colors are deliberately
/// not part of this type (see the `render` module).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClass {
    /// Point-like stellar source
    Star,
    /// Diffuse extended emission region
    Nebula,
    /// Extended source with a bright core
    Galaxy,
    /// Elongated source with a tail
    Comet,
    /// Bright disk-like source
    Planet,
    /// Artifact, hot pixel cluster or background fluctuation
    Noise,
}

impl ObjectClass {
    /// All variants, in declaration order.
    pub const ALL: [ObjectClass; 6] = [
        ObjectClass::Star,
        ObjectClass::Nebula,
        ObjectClass::Galaxy,
        ObjectClass::Comet,
        ObjectClass::Planet,
        ObjectClass::Noise,
    ];

    /// Stable lowercase label used in serialized output and model artifacts.
    pub fn label(&self) -> &'static str {
        match self {
            ObjectClass::Star => "star",
            ObjectClass::Nebula => "nebula",
            ObjectClass::Galaxy => "galaxy",
            ObjectClass::Comet => "comet",
            ObjectClass::Planet => "planet",
            ObjectClass::Noise => "noise",
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
