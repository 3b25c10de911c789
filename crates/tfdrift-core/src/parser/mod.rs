pub mod block_data;
pub mod ignore;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::errors::ValidatorError;
use crate::hcl::expr::{Expression, ObjectKey};
use crate::hcl::structure::{BlockLabel, Body};
use crate::types::{EntityKind, ParsedEntity, ProviderConfig, Submodule};
use block_data::ParsedBlock;

pub const DEFAULT_REGISTRY: &str = "registry.terraform.io";

/// Lists the `.tf` files directly inside `dir`, sorted by name.
pub fn walk_terraform_files(dir: &Path) -> Result<Vec<PathBuf>, ValidatorError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ValidatorError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ValidatorError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "tf") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Reads and parses one configuration file into an HCL body.
pub fn parse_terraform_file(path: &Path) -> Result<Body, ValidatorError> {
    let content = std::fs::read_to_string(path).map_err(|e| ValidatorError::io(path, e))?;
    parse_terraform_source(&content, path)
}

pub fn parse_terraform_source(source: &str, path: &Path) -> Result<Body, ValidatorError> {
    crate::hcl::parser::parse_body(source).map_err(|e| ValidatorError::Parse {
        file: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Collects provider requirements from `terraform { required_providers {} }`
/// blocks. A requirement without an explicit source defaults to
/// `hashicorp/<name>`; short `org/name` sources are normalized to their
/// registry form.
pub fn parse_provider_requirements(body: &Body) -> HashMap<String, ProviderConfig> {
    let mut providers = HashMap::new();

    for block in body.blocks().filter(|b| b.ident.as_str() == "terraform") {
        for inner in block.body.blocks().filter(|b| b.ident.as_str() == "required_providers") {
            for attr in inner.body.attributes() {
                let name = attr.key.as_str();
                let Expression::Object(object) = &attr.value else {
                    continue;
                };

                let mut config = ProviderConfig::default();
                for (key, value) in object.iter() {
                    let field = match key {
                        ObjectKey::Ident(ident) => ident.as_str().to_string(),
                        ObjectKey::Expression(Expression::String(literal)) => {
                            literal.value().to_string()
                        }
                        ObjectKey::Expression(_) => continue,
                    };
                    match (field.as_str(), expression_as_string(value.expr())) {
                        ("source", Some(source)) => config.source = normalize_source(&source),
                        ("version", Some(version)) => config.version = version,
                        _ => {}
                    }
                }
                if config.source.is_empty() {
                    config.source = normalize_source(&format!("hashicorp/{name}"));
                }
                providers.insert(name.to_string(), config);
            }
        }
    }

    providers
}

/// Prefixes a short `org/name` source with the public registry host.
pub fn normalize_source(source: &str) -> String {
    if source.contains('/') && !source.contains(&format!("{DEFAULT_REGISTRY}/")) {
        return format!("{DEFAULT_REGISTRY}/{source}");
    }
    source.to_string()
}

/// Lifts `resource` and `data` blocks with at least two labels out of a body.
pub fn parse_entities(body: &Body) -> Vec<ParsedEntity> {
    let mut entities = Vec::new();

    for block in body.blocks() {
        let kind = match block.ident.as_str() {
            "resource" => EntityKind::Resource,
            "data" => EntityKind::DataSource,
            _ => continue,
        };
        if block.labels.len() < 2 {
            continue;
        }
        entities.push(ParsedEntity {
            kind,
            type_name: label_value(&block.labels[0]),
            name: label_value(&block.labels[1]),
            data: ParsedBlock::from_body(&block.body).data,
        });
    }

    entities
}

/// Immediate subdirectories of `modules_dir` that contain a `main.tf`. A
/// missing modules directory is not an error, there is simply nothing to
/// validate.
pub fn find_submodules(modules_dir: &Path) -> Vec<Submodule> {
    let Ok(entries) = std::fs::read_dir(modules_dir) else {
        return Vec::new();
    };

    let mut submodules = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() && path.join("main.tf").is_file() {
            submodules.push(Submodule {
                name: entry.file_name().to_string_lossy().to_string(),
                path,
            });
        }
    }
    submodules.sort_by(|a, b| a.name.cmp(&b.name));
    submodules
}

pub(crate) fn label_value(label: &BlockLabel) -> String {
    match label {
        BlockLabel::String(literal) => literal.value().to_string(),
        BlockLabel::Ident(ident) => ident.as_str().to_string(),
    }
}

fn expression_as_string(expr: &Expression) -> Option<String> {
    match expr {
        Expression::String(literal) => Some(literal.value().to_string()),
        _ => None,
    }
}
