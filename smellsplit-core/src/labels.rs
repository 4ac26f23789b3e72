//! Smell labels and the hierarchy they are folded into.
//!
//! The label store only records positive occurrences. A [`LabelHierarchy`]
//! is built once per (repository, smell) pair and queried for every
//! structural unit; a missing key always means "negative".
//!
//! Units the analysis never looked at (generated code, for instance) are
//! therefore counted as negatives as well.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LabelError;

/// Granularity a smell is reported at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmellKind {
    /// Attributed to a class within a component.
    Design,
    /// Attributed to a method within a class.
    Implementation,
}

impl SmellKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Design => "design",
            Self::Implementation => "implementation",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, LabelError> {
        match raw.trim() {
            "design" => Ok(Self::Design),
            "implementation" => Ok(Self::Implementation),
            other => Err(LabelError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for SmellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported smell occurrence, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmellLabel {
    pub kind: SmellKind,
    pub class_name: String,
    pub component: String,
    /// Only present for implementation smells.
    pub method: Option<String>,
}

/// Positive labels for one (repository, smell) pair, indexed for lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "components", rename_all = "lowercase")]
pub enum LabelHierarchy {
    /// No rows: nothing is positive.
    #[default]
    Empty,
    /// component → classes flagged positive.
    Design(BTreeMap<String, BTreeSet<String>>),
    /// component → class → methods flagged positive.
    Implementation(BTreeMap<String, BTreeMap<String, BTreeSet<String>>>),
}

impl LabelHierarchy {
    /// Fold a flat list of labels into a hierarchy keyed by the first label's kind.
    ///
    /// Every label must share that kind; implementation labels must carry a method.
    pub fn from_labels(smell: &str, labels: &[SmellLabel]) -> Result<Self, LabelError> {
        let Some(first) = labels.first() else {
            return Ok(Self::Empty);
        };
        if labels.iter().any(|l| l.kind != first.kind) {
            return Err(LabelError::MixedKinds {
                smell: smell.to_string(),
            });
        }

        match first.kind {
            SmellKind::Design => {
                let mut components: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
                for label in labels {
                    components
                        .entry(label.component.clone())
                        .or_default()
                        .insert(label.class_name.clone());
                }
                Ok(Self::Design(components))
            }
            SmellKind::Implementation => {
                let mut components: BTreeMap<String, BTreeMap<String, BTreeSet<String>>> =
                    BTreeMap::new();
                for label in labels {
                    let method = label.method.clone().ok_or_else(|| LabelError::MissingMethod {
                        component: label.component.clone(),
                        class: label.class_name.clone(),
                    })?;
                    components
                        .entry(label.component.clone())
                        .or_default()
                        .entry(label.class_name.clone())
                        .or_default()
                        .insert(method);
                }
                Ok(Self::Implementation(components))
            }
        }
    }

    /// Kind of the labels, or `None` when there were no rows.
    pub fn kind(&self) -> Option<SmellKind> {
        match self {
            Self::Empty => None,
            Self::Design(_) => Some(SmellKind::Design),
            Self::Implementation(_) => Some(SmellKind::Implementation),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Design(c) => c.is_empty(),
            Self::Implementation(c) => c.is_empty(),
        }
    }

    /// Fail if the rows disagree with the kind tracked for `smell`. An empty
    /// hierarchy is compatible with either kind.
    pub fn ensure_kind(&self, smell: &str, expected: SmellKind) -> Result<(), LabelError> {
        match self.kind() {
            Some(found) if found != expected => Err(LabelError::KindMismatch {
                smell: smell.to_string(),
                expected: expected.to_string(),
                found: found.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Whether a component has any positive labels at all.
    pub fn has_component(&self, component: &str) -> bool {
        match self {
            Self::Empty => false,
            Self::Design(c) => c.contains_key(component),
            Self::Implementation(c) => c.contains_key(component),
        }
    }

    /// Whether a class has positive labels. For design smells this means the
    /// class itself is smelly; for implementation smells, one of its methods is.
    pub fn has_class(&self, component: &str, class_name: &str) -> bool {
        match self {
            Self::Empty => false,
            Self::Design(c) => c.get(component).is_some_and(|s| s.contains(class_name)),
            Self::Implementation(c) => c
                .get(component)
                .is_some_and(|classes| classes.contains_key(class_name)),
        }
    }

    pub fn is_positive_method(&self, component: &str, class_name: &str, method: &str) -> bool {
        match self {
            Self::Implementation(c) => c
                .get(component)
                .and_then(|classes| classes.get(class_name))
                .is_some_and(|methods| methods.contains(method)),
            _ => false,
        }
    }

    /// Total number of positive entries (classes or methods).
    pub fn positive_count(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Design(c) => c.values().map(BTreeSet::len).sum(),
            Self::Implementation(c) => c
                .values()
                .flat_map(BTreeMap::values)
                .map(BTreeSet::len)
                .sum(),
        }
    }
}
