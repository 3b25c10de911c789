use std::collections::HashMap;
use std::path::Path;

use hiro_system_kit::slog;

use crate::config::ValidationConfig;
use crate::errors::ValidatorError;
use crate::parser;
use crate::runner::TerraformRunner;
use crate::types::{EntityKind, ParsedEntity, ProviderConfig, TerraformSchema, ValidationFinding};
use crate::validation::conformance::validate_block_data;
use crate::Context;

/// Validates a single module directory: discovers its `.tf` files, resolves
/// provider requirements, obtains the provider schema through the runner and
/// checks every resource and data source. `submodule_name` is empty for the
/// root module.
pub fn validate_module(
    ctx: &Context,
    dir: &Path,
    submodule_name: &str,
    runner: &dyn TerraformRunner,
    config: &ValidationConfig,
) -> Result<Vec<ValidationFinding>, ValidatorError> {
    let files = parser::walk_terraform_files(dir)?;
    if files.is_empty() {
        return Err(ValidatorError::MissingConfiguration { dir: dir.display().to_string() });
    }

    let mut providers = HashMap::new();
    let mut bodies = Vec::with_capacity(files.len());
    for file in &files {
        let body = parser::parse_terraform_file(file)?;
        providers.extend(parser::parse_provider_requirements(&body));
        bodies.push(body);
    }

    runner.init(dir, &config.cancellation)?;
    let schema = runner.schema(dir, &config.cancellation)?;

    let mut entities = Vec::new();
    for body in &bodies {
        entities.extend(parser::parse_entities(body));
    }
    entities.retain(|entity| {
        let excluded = match entity.kind {
            EntityKind::Resource => &config.excluded_resources,
            EntityKind::DataSource => &config.excluded_data_sources,
        };
        !excluded.contains(&entity.type_name)
    });

    let mut findings = Vec::new();
    for entity in &entities {
        validate_entity(ctx, entity, &schema, &providers, dir, submodule_name, &mut findings);
    }

    Ok(findings)
}

/// A provider's name is the portion of the entity type before the first
/// underscore. Every lookup miss along the way is logged and skipped; an
/// entity whose schema cannot be located contributes zero findings.
fn validate_entity(
    ctx: &Context,
    entity: &ParsedEntity,
    schema: &TerraformSchema,
    providers: &HashMap<String, ProviderConfig>,
    dir: &Path,
    submodule_name: &str,
    findings: &mut Vec<ValidationFinding>,
) {
    let provider_name = entity.type_name.split('_').next().unwrap_or_default();

    let Some(provider) = providers.get(provider_name) else {
        ctx.try_log(|logger| {
            slog::warn!(
                logger,
                "no provider requirement for {} {} in {}",
                entity.kind.label(),
                entity.type_name,
                dir.display()
            )
        });
        return;
    };

    let Some(provider_schema) = schema.provider_schemas.get(&provider.source) else {
        ctx.try_log(|logger| {
            slog::warn!(
                logger,
                "no provider schema for source {} in {}",
                provider.source,
                dir.display()
            )
        });
        return;
    };

    let entity_schemas = match entity.kind {
        EntityKind::Resource => &provider_schema.resource_schemas,
        EntityKind::DataSource => &provider_schema.data_source_schemas,
    };
    let Some(entity_schema) = entity_schemas.get(&entity.type_name) else {
        ctx.try_log(|logger| {
            slog::warn!(
                logger,
                "no {} schema for {} in provider {} (dir={})",
                entity.kind.label(),
                entity.type_name,
                provider.source,
                dir.display()
            )
        });
        return;
    };

    let mut local = Vec::new();
    validate_block_data(
        &entity.type_name,
        "root",
        &entity.data,
        entity_schema.block.as_ref(),
        &[],
        &mut local,
    );

    for mut finding in local {
        finding.is_data_source = entity.kind == EntityKind::DataSource;
        finding.submodule_name = submodule_name.to_string();
        findings.push(finding);
    }
}
