use crate::parser::block_data::BlockData;
use crate::parser::ignore::IGNORE_ALL;
use crate::types::{SchemaBlock, ValidationFinding};

/// Recursively diffs a parsed block against a schema node, collecting a
/// finding for every attribute or block type the schema knows about but the
/// configuration omits. An absent schema node terminates the branch without
/// findings; a schema that could not be located is the caller's concern.
pub fn validate_block_data(
    resource_type: &str,
    path: &str,
    data: &BlockData,
    schema: Option<&SchemaBlock>,
    parent_ignore: &[String],
    findings: &mut Vec<ValidationFinding>,
) {
    let Some(schema) = schema else {
        return;
    };

    let mut ignore = parent_ignore.to_vec();
    ignore.extend(data.ignore_changes.iter().cloned());

    validate_attributes(resource_type, path, data, schema, &ignore, findings);
    validate_blocks(resource_type, path, data, schema, &ignore, findings);
}

fn is_ignored(ignore: &[String], name: &str) -> bool {
    ignore.iter().any(|entry| entry == IGNORE_ALL || entry.eq_ignore_ascii_case(name))
}

fn validate_attributes(
    resource_type: &str,
    path: &str,
    data: &BlockData,
    schema: &SchemaBlock,
    ignore: &[String],
    findings: &mut Vec<ValidationFinding>,
) {
    for (name, attribute) in schema.attributes.iter() {
        if name == "id" {
            continue;
        }
        // computed-only attributes are read-only
        if attribute.computed && !attribute.optional && !attribute.required {
            continue;
        }
        if attribute.deprecated || is_ignored(ignore, name) {
            continue;
        }
        if !data.properties.contains(name) {
            findings.push(ValidationFinding {
                resource_type: resource_type.to_string(),
                path: path.to_string(),
                name: name.clone(),
                required: attribute.required,
                is_block: false,
                is_data_source: false,
                submodule_name: String::new(),
            });
        }
    }
}

fn validate_blocks(
    resource_type: &str,
    path: &str,
    data: &BlockData,
    schema: &SchemaBlock,
    ignore: &[String],
    findings: &mut Vec<ValidationFinding>,
) {
    for (name, block_type) in schema.block_types.iter() {
        if name == "timeouts" {
            continue;
        }
        if block_type.deprecated || is_ignored(ignore, name) {
            continue;
        }

        let static_instances =
            data.static_blocks.get(name).map(Vec::as_slice).unwrap_or_default();
        let dynamic_merge = data.dynamic_blocks.get(name);

        if static_instances.is_empty() && dynamic_merge.is_none() {
            findings.push(ValidationFinding {
                resource_type: resource_type.to_string(),
                path: path.to_string(),
                name: name.clone(),
                required: block_type.is_required(),
                is_block: true,
                is_data_source: false,
                submodule_name: String::new(),
            });
            continue;
        }

        let child_path = format!("{path}.{name}");
        let indexed = static_instances.len() > 1;
        for (index, instance) in static_instances.iter().enumerate() {
            let instance_path =
                if indexed { format!("{child_path}[{index}]") } else { child_path.clone() };
            validate_block_data(
                resource_type,
                &instance_path,
                &instance.data,
                block_type.block.as_ref(),
                ignore,
                findings,
            );
        }

        // the dynamic union recurses once, never indexed
        if let Some(dynamic) = dynamic_merge {
            validate_block_data(
                resource_type,
                &child_path,
                &dynamic.data,
                block_type.block.as_ref(),
                ignore,
                findings,
            );
        }
    }
}
