use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::config::ValidationConfig;
use crate::errors::ValidatorError;
use crate::project::validate_project;
use crate::runner::{CancellationToken, TerraformRunner};
use crate::types::TerraformSchema;
use crate::validation::module_validator::validate_module;
use crate::Context;

/// Runner double: serves a fixed schema document and records init calls.
struct StubRunner {
    schema: Arc<TerraformSchema>,
    fail_init_for: Vec<String>,
    init_calls: Mutex<Vec<PathBuf>>,
}

impl StubRunner {
    fn new(schema: TerraformSchema) -> Self {
        StubRunner {
            schema: Arc::new(schema),
            fail_init_for: Vec::new(),
            init_calls: Mutex::new(Vec::new()),
        }
    }
}

impl TerraformRunner for StubRunner {
    fn init(&self, dir: &Path, _cancellation: &CancellationToken) -> Result<(), ValidatorError> {
        self.init_calls.lock().unwrap().push(dir.to_path_buf());
        let dir_name = dir.file_name().unwrap_or_default().to_string_lossy().to_string();
        if self.fail_init_for.contains(&dir_name) {
            return Err(ValidatorError::Init {
                dir: dir.display().to_string(),
                message: "stubbed failure".into(),
            });
        }
        Ok(())
    }

    fn schema(
        &self,
        _dir: &Path,
        _cancellation: &CancellationToken,
    ) -> Result<Arc<TerraformSchema>, ValidatorError> {
        Ok(self.schema.clone())
    }
}

fn azurerm_schema() -> TerraformSchema {
    serde_json::from_value(json!({
        "provider_schemas": {
            "registry.terraform.io/hashicorp/azurerm": {
                "resource_schemas": {
                    "azurerm_virtual_network": {
                        "block": {
                            "attributes": {
                                "id": { "computed": true },
                                "name": { "required": true },
                                "location": { "required": true },
                                "tags": { "optional": true }
                            },
                            "block_types": {
                                "subnet": {
                                    "min_items": 1,
                                    "block": {
                                        "attributes": {
                                            "address_prefix": { "required": true }
                                        }
                                    }
                                },
                                "timeouts": {
                                    "block": {}
                                }
                            }
                        }
                    }
                },
                "data_source_schemas": {
                    "azurerm_client_config": {
                        "block": {
                            "attributes": {
                                "display_name": { "optional": true }
                            }
                        }
                    }
                }
            }
        }
    }))
    .expect("schema fixture should deserialize")
}

const PROVIDER_BLOCK: &str = r#"
terraform {
  required_providers {
    azurerm = {
      source  = "hashicorp/azurerm"
      version = ">= 3.0"
    }
  }
}
"#;

fn write_module(dir: &Path, body: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("main.tf"), format!("{PROVIDER_BLOCK}\n{body}")).unwrap();
}

#[test]
fn schema_document_deserializes_flag_defaults() {
    let schema = azurerm_schema();
    let provider = &schema.provider_schemas["registry.terraform.io/hashicorp/azurerm"];
    let vnet = provider.resource_schemas["azurerm_virtual_network"].block.as_ref().unwrap();

    let name = &vnet.attributes["name"];
    assert!(name.required && !name.optional && !name.computed && !name.deprecated);
    assert!(vnet.block_types["subnet"].is_required());
    assert_eq!(vnet.block_types["subnet"].max_items, 0);
}

#[test]
fn validates_module_against_stub_schema() {
    let dir = tempfile::tempdir().unwrap();
    write_module(
        dir.path(),
        r#"
resource "azurerm_virtual_network" "vnet" {
  location = "westeurope"

  lifecycle {
    ignore_changes = [tags]
  }
}
"#,
    );

    let runner = StubRunner::new(azurerm_schema());
    let config = ValidationConfig::new(dir.path());
    let findings =
        validate_module(&Context::empty(), dir.path(), "", &runner, &config).unwrap();

    let mut reported: Vec<_> = findings.iter().map(|f| f.name.as_str()).collect();
    reported.sort();
    // tags is ignored, id is computed-only, timeouts is never reported
    assert_eq!(reported, vec!["name", "subnet"]);
    assert!(findings.iter().all(|f| f.path == "root" && f.submodule_name.is_empty()));
}

#[test]
fn data_sources_are_validated_and_tagged() {
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path(), "data \"azurerm_client_config\" \"current\" {}\n");

    let runner = StubRunner::new(azurerm_schema());
    let config = ValidationConfig::new(dir.path());
    let findings =
        validate_module(&Context::empty(), dir.path(), "", &runner, &config).unwrap();

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].name, "display_name");
    assert!(findings[0].is_data_source);
    assert!(!findings[0].required);
}

#[test]
fn unknown_entity_schema_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path(), "resource \"azurerm_unknown_thing\" \"x\" {}\n");

    let runner = StubRunner::new(azurerm_schema());
    let config = ValidationConfig::new(dir.path());
    let findings =
        validate_module(&Context::empty(), dir.path(), "", &runner, &config).unwrap();
    assert!(findings.is_empty());
}

#[test]
fn excluded_resource_types_are_filtered_out() {
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path(), "resource \"azurerm_virtual_network\" \"vnet\" {}\n");

    let runner = StubRunner::new(azurerm_schema());
    let config = ValidationConfig::new(dir.path())
        .with_excluded_resources(vec!["azurerm_virtual_network"]);
    let findings =
        validate_module(&Context::empty(), dir.path(), "", &runner, &config).unwrap();
    assert!(findings.is_empty());
}

#[test]
fn module_without_configuration_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let runner = StubRunner::new(azurerm_schema());
    let config = ValidationConfig::new(dir.path());
    let err =
        validate_module(&Context::empty(), dir.path(), "", &runner, &config).unwrap_err();
    assert!(matches!(err, ValidatorError::MissingConfiguration { .. }));
}

#[test]
fn project_run_combines_root_and_submodules() {
    let dir = tempfile::tempdir().unwrap();
    write_module(
        dir.path(),
        r#"
resource "azurerm_virtual_network" "vnet" {
  name     = "vnet"
  location = "westeurope"
  tags     = {}

  subnet {
    address_prefix = "10.0.1.0/24"
  }
}
"#,
    );
    write_module(
        &dir.path().join("modules/network"),
        r#"
resource "azurerm_virtual_network" "net" {
  name     = "net"
  location = "westeurope"
  tags     = {}

  subnet {}
}
"#,
    );

    let runner = StubRunner::new(azurerm_schema());
    let config = ValidationConfig::new(dir.path());
    let findings = validate_project(&Context::empty(), &config, &runner).unwrap();

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].name, "address_prefix");
    assert_eq!(findings[0].path, "root.subnet");
    assert_eq!(findings[0].submodule_name, "network");

    let init_calls = runner.init_calls.lock().unwrap();
    assert_eq!(init_calls.len(), 2);
}

#[test]
fn failing_submodule_never_suppresses_its_siblings() {
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path(), "resource \"azurerm_virtual_network\" \"vnet\" {}\n");
    write_module(
        &dir.path().join("modules/network"),
        "resource \"azurerm_virtual_network\" \"net\" {}\n",
    );
    // malformed configuration: parse failure is isolated to this submodule
    let broken = dir.path().join("modules/broken");
    std::fs::create_dir_all(&broken).unwrap();
    std::fs::write(broken.join("main.tf"), "resource \"azurerm_virtual_network\" {").unwrap();

    let runner = StubRunner::new(azurerm_schema());
    let config = ValidationConfig::new(dir.path());
    let findings = validate_project(&Context::empty(), &config, &runner).unwrap();

    assert!(findings.iter().any(|f| f.submodule_name.is_empty()));
    assert!(findings.iter().any(|f| f.submodule_name == "network"));
    assert!(!findings.iter().any(|f| f.submodule_name == "broken"));
}

#[test]
fn submodule_init_failure_is_non_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path(), "resource \"azurerm_virtual_network\" \"vnet\" {}\n");
    write_module(
        &dir.path().join("modules/flaky"),
        "resource \"azurerm_virtual_network\" \"net\" {}\n",
    );

    let mut runner = StubRunner::new(azurerm_schema());
    runner.fail_init_for = vec!["flaky".into()];
    let config = ValidationConfig::new(dir.path());
    let findings = validate_project(&Context::empty(), &config, &runner).unwrap();

    assert!(!findings.is_empty());
    assert!(findings.iter().all(|f| f.submodule_name.is_empty()));
}

#[test]
fn root_init_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path(), "resource \"azurerm_virtual_network\" \"vnet\" {}\n");

    let root_name =
        dir.path().file_name().unwrap_or_default().to_string_lossy().to_string();
    let mut runner = StubRunner::new(azurerm_schema());
    runner.fail_init_for = vec![root_name];
    let config = ValidationConfig::new(dir.path());

    let err = validate_project(&Context::empty(), &config, &runner).unwrap_err();
    assert!(matches!(err, ValidatorError::Init { .. }));
}

#[test]
fn cancelled_run_still_returns_completed_findings() {
    let dir = tempfile::tempdir().unwrap();
    write_module(dir.path(), "resource \"azurerm_virtual_network\" \"vnet\" {}\n");
    write_module(
        &dir.path().join("modules/network"),
        "resource \"azurerm_virtual_network\" \"net\" {}\n",
    );

    let cancellation = CancellationToken::new();
    let runner = StubRunner::new(azurerm_schema());
    let config = ValidationConfig::new(dir.path()).with_cancellation(cancellation.clone());

    // cancel after the root module has been validated on the calling thread
    // but before workers pick up the submodule jobs
    cancellation.cancel();
    let findings = validate_project(&Context::empty(), &config, &runner).unwrap();

    assert!(!findings.is_empty());
    assert!(findings.iter().all(|f| f.submodule_name.is_empty()));
}

#[test]
fn findings_are_deduplicated_across_modules() {
    let dir = tempfile::tempdir().unwrap();
    // two files in the root module declaring the same resource shape produce
    // identical findings, only one survives
    std::fs::create_dir_all(dir.path()).unwrap();
    std::fs::write(
        dir.path().join("main.tf"),
        format!("{PROVIDER_BLOCK}\nresource \"azurerm_virtual_network\" \"a\" {{}}\n"),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("extra.tf"),
        "resource \"azurerm_virtual_network\" \"b\" {}\n",
    )
    .unwrap();

    let runner = StubRunner::new(azurerm_schema());
    let config = ValidationConfig::new(dir.path());
    let findings = validate_project(&Context::empty(), &config, &runner).unwrap();

    let mut names: Vec<_> = findings.iter().map(|f| f.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["location", "name", "subnet"]);
}
