//! Dataset kinds and their entry payloads
//!
//! Every kind shares the same entry envelope (name, comment, keyword
//! overrides, attributes) around a kind-specific molecular input. The
//! server returns molecules by id and only embeds the full molecule when
//! the caller asks for it through the entry includes.

use std::collections::BTreeSet;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::dataset::DatasetType;

/// Anything stored in a dataset under a unique name
pub trait NamedEntry {
    fn name(&self) -> &str;
}

/// Capabilities that differ between dataset kinds
///
/// Implemented by zero-sized marker types; the cache in `qcportal-core` is
/// generic over this trait.
pub trait DatasetKind: Send + Sync + 'static {
    /// Tag used in endpoint paths and dataset metadata
    const DATASET_TYPE: DatasetType;

    /// Payload accepted by the entry bulk-create endpoint
    type NewEntry: NamedEntry + Serialize + DeserializeOwned + Clone + Debug + Send + Sync;

    /// Payload returned by the entry fetch endpoint
    type Entry: NamedEntry + Serialize + DeserializeOwned + Clone + Debug + Send + Sync;

    /// Entry fields that embed molecules and are only sent when included
    const MOLECULE_FIELDS: &'static [&'static str];

    /// Translate user-facing includes into the server's include list
    ///
    /// `None` means "server default". Otherwise every plain column is
    /// requested (`*`) and molecule fields are added only when named.
    fn transform_entry_includes(includes: Option<&[String]>) -> Option<BTreeSet<String>> {
        let includes = includes?;
        let mut transformed = BTreeSet::from(["*".to_string()]);
        for field in Self::MOLECULE_FIELDS {
            if includes.iter().any(|inc| inc == field) {
                transformed.insert((*field).to_string());
            }
        }
        Some(transformed)
    }
}

/// A molecule given inline or by the id of one already on the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoleculeInput {
    Id(i64),
    Molecule(Value),
}

impl From<i64> for MoleculeInput {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<Value> for MoleculeInput {
    fn from(molecule: Value) -> Self {
        Self::Molecule(molecule)
    }
}

/// Entry as submitted for creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry<P> {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(flatten)]
    pub input: P,
    #[serde(default)]
    pub additional_keywords: Map<String, Value>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl<P> NewEntry<P> {
    pub fn new(name: impl Into<String>, input: P) -> Self {
        Self {
            name: name.into(),
            comment: None,
            input,
            additional_keywords: Map::new(),
            attributes: Map::new(),
        }
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    #[must_use]
    pub fn with_keyword(mut self, key: impl Into<String>, value: Value) -> Self {
        self.additional_keywords.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

impl<P> NamedEntry for NewEntry<P> {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Entry as stored on the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<P> {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(flatten)]
    pub data: P,
    #[serde(default)]
    pub additional_keywords: Map<String, Value>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl<P> NamedEntry for Entry<P> {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Input of kinds built around one molecule (`singlepoint`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoleculeEntryInput {
    pub molecule: MoleculeInput,
}

/// Stored form of [`MoleculeEntryInput`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoleculeEntryData {
    pub molecule_id: i64,
    #[serde(default)]
    pub molecule: Option<Value>,
}

/// Input of kinds starting from one structure (optimization,
/// gridoptimization, manybody)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialMoleculeInput {
    pub initial_molecule: MoleculeInput,
}

/// Stored form of [`InitialMoleculeInput`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialMoleculeData {
    pub initial_molecule_id: i64,
    #[serde(default)]
    pub initial_molecule: Option<Value>,
}

/// Torsion drives may start from several conformers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialMoleculesInput {
    pub initial_molecules: Vec<MoleculeInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialMoleculesData {
    #[serde(default)]
    pub initial_molecule_ids: Vec<i64>,
    #[serde(default)]
    pub initial_molecules: Option<Vec<Value>>,
}

/// One reactant or product with its coefficient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoichiometryInput {
    pub coefficient: f64,
    pub molecule: MoleculeInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoichiometryData {
    pub coefficient: f64,
    pub molecule_id: i64,
    #[serde(default)]
    pub molecule: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionInput {
    pub stoichiometries: Vec<StoichiometryInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionData {
    #[serde(default)]
    pub stoichiometries: Vec<StoichiometryData>,
}

macro_rules! dataset_kind {
    ($(#[$doc:meta])* $kind:ident, $tag:ident, $input:ty, $data:ty, [$($field:literal),*]) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $kind;

        impl DatasetKind for $kind {
            const DATASET_TYPE: DatasetType = DatasetType::$tag;
            const MOLECULE_FIELDS: &'static [&'static str] = &[$($field),*];
            type NewEntry = NewEntry<$input>;
            type Entry = Entry<$data>;
        }
    };
}

dataset_kind!(
    /// One calculation per molecule
    Singlepoint, Singlepoint, MoleculeEntryInput, MoleculeEntryData, ["molecule"]
);
dataset_kind!(
    /// Geometry optimizations
    Optimization, Optimization, InitialMoleculeInput, InitialMoleculeData, ["initial_molecule"]
);
dataset_kind!(
    /// Torsion scans driven from one or more conformers
    Torsiondrive, Torsiondrive, InitialMoleculesInput, InitialMoleculesData, ["initial_molecules"]
);
dataset_kind!(
    /// Grid scans over constrained optimizations
    Gridoptimization,
    Gridoptimization,
    InitialMoleculeInput,
    InitialMoleculeData,
    ["initial_molecule"]
);
dataset_kind!(
    /// Many-body expansions of clusters
    Manybody, Manybody, InitialMoleculeInput, InitialMoleculeData, ["initial_molecule"]
);
dataset_kind!(
    /// Reaction energies from stoichiometric combinations
    Reaction, Reaction, ReactionInput, ReactionData, ["stoichiometries"]
);
