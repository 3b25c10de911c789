use std::collections::HashMap;
use std::path::PathBuf;

use indexmap::IndexMap;

use crate::parser::block_data::BlockData;

/// Root of the document produced by `terraform providers schema -json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TerraformSchema {
    #[serde(default)]
    pub provider_schemas: HashMap<String, ProviderSchema>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderSchema {
    #[serde(default)]
    pub resource_schemas: HashMap<String, ResourceSchema>,
    #[serde(default)]
    pub data_source_schemas: HashMap<String, ResourceSchema>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceSchema {
    pub block: Option<SchemaBlock>,
}

/// One level of a provider schema tree. Recursion terminates at leaves with
/// empty maps. The maps keep document order so findings come out in a stable
/// order for a given schema document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaBlock {
    #[serde(default)]
    pub attributes: IndexMap<String, SchemaAttribute>,
    #[serde(default)]
    pub block_types: IndexMap<String, SchemaBlockType>,
}

/// An attribute that is computed and neither optional nor required is
/// read-only and exempt from conformance checks.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SchemaAttribute {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub computed: bool,
    #[serde(default)]
    pub deprecated: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaBlockType {
    #[serde(default)]
    pub min_items: u64,
    #[serde(default)]
    pub max_items: u64,
    #[serde(default)]
    pub deprecated: bool,
    pub block: Option<SchemaBlock>,
}

impl SchemaBlockType {
    /// `min_items > 0` marks the block type as required.
    pub fn is_required(&self) -> bool {
        self.min_items > 0
    }
}

/// A provider requirement declared in a `terraform { required_providers {} }`
/// block, with `source` normalized to its registry form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    pub source: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Resource,
    DataSource,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Resource => "resource",
            EntityKind::DataSource => "data source",
        }
    }
}

/// A resource or data source declaration lifted out of a configuration file.
#[derive(Debug, Clone)]
pub struct ParsedEntity {
    pub kind: EntityKind,
    pub type_name: String,
    pub name: String,
    pub data: BlockData,
}

/// A nested configuration directory validated independently of its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submodule {
    pub name: String,
    pub path: PathBuf,
}

/// A single schema mismatch. `path` is the dot-joined ancestry rooted at
/// `"root"`, with an `[index]` suffix when the finding originates from one of
/// several static instances of the same block type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFinding {
    pub resource_type: String,
    pub path: String,
    pub name: String,
    pub required: bool,
    pub is_block: bool,
    pub is_data_source: bool,
    pub submodule_name: String,
}
