use std::collections::HashSet;

use crate::types::ValidationFinding;

/// Keeps the first occurrence per identity key, preserving input order.
pub fn deduplicate_findings(findings: Vec<ValidationFinding>) -> Vec<ValidationFinding> {
    let mut seen = HashSet::new();
    let mut result = Vec::with_capacity(findings.len());

    for finding in findings {
        let key = (
            finding.resource_type.clone(),
            finding.path.clone(),
            finding.name.clone(),
            finding.is_block,
            finding.is_data_source,
            finding.submodule_name.clone(),
        );
        if seen.insert(key) {
            result.push(finding);
        }
    }

    result
}

/// Renders a finding as a single human-readable line.
pub fn format_finding(finding: &ValidationFinding) -> String {
    let clean_path = finding.path.strip_prefix("root.").unwrap_or(&finding.path);
    let requirement = if finding.required { "required" } else { "optional" };
    let kind = if finding.is_block { "block" } else { "property" };
    let entity = if finding.is_data_source { "data source" } else { "resource" };

    if finding.submodule_name.is_empty() {
        format!(
            "{}: missing {} {} {} in {} ({})",
            finding.resource_type, requirement, kind, finding.name, clean_path, entity
        )
    } else {
        format!(
            "{}: missing {} {} {} in {} in submodule {} ({})",
            finding.resource_type,
            requirement,
            kind,
            finding.name,
            clean_path,
            finding.submodule_name,
            entity
        )
    }
}
