use std::collections::HashSet;

use indexmap::IndexMap;

use crate::hcl::structure::{Block, Body};
use crate::parser::{ignore, label_value};

/// What a configuration block declares, reduced to what conformance checking
/// needs: attribute presence, child blocks and lifecycle ignore directives.
///
/// `static_blocks` and `dynamic_blocks` for the same type name are
/// independent containers; a type may legitimately be present in both.
/// `ignore_changes` holds only this block's own directives, ancestor scopes
/// are combined at validation time.
#[derive(Debug, Clone, Default)]
pub struct BlockData {
    pub properties: HashSet<String>,
    pub static_blocks: IndexMap<String, Vec<ParsedBlock>>,
    pub dynamic_blocks: IndexMap<String, ParsedBlock>,
    pub ignore_changes: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedBlock {
    pub data: BlockData,
}

/// Child block dispatch, decided once during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Lifecycle,
    Dynamic,
    Plain,
}

impl BlockKind {
    fn from_ident(ident: &str) -> Self {
        match ident {
            "lifecycle" => Self::Lifecycle,
            "dynamic" => Self::Dynamic,
            _ => Self::Plain,
        }
    }
}

impl ParsedBlock {
    pub fn from_body(body: &Body) -> ParsedBlock {
        let mut data = BlockData::default();
        data.parse_attributes(body);
        data.parse_blocks(body);
        ParsedBlock { data }
    }
}

impl BlockData {
    fn parse_attributes(&mut self, body: &Body) {
        for attr in body.attributes() {
            self.properties.insert(attr.key.as_str().to_string());
        }
    }

    fn parse_blocks(&mut self, body: &Body) {
        for block in body.blocks() {
            match BlockKind::from_ident(block.ident.as_str()) {
                BlockKind::Lifecycle => self.parse_lifecycle(&block.body),
                BlockKind::Dynamic => {
                    if block.labels.len() == 1 {
                        let label = label_value(&block.labels[0]);
                        self.parse_dynamic_block(block, &label);
                    }
                }
                BlockKind::Plain => {
                    let parsed = ParsedBlock::from_body(&block.body);
                    self.static_blocks
                        .entry(block.ident.as_str().to_string())
                        .or_default()
                        .push(parsed);
                }
            }
        }
    }

    /// Malformed input with several `ignore_changes` attributes is tolerated;
    /// each one contributes independently.
    fn parse_lifecycle(&mut self, body: &Body) {
        for attr in body.attributes() {
            if attr.key.as_str() == "ignore_changes" {
                self.ignore_changes.extend(ignore::extract_ignore_entries(&attr.value));
            }
        }
    }

    /// A dynamic block counts as presence of its label both as a property and
    /// as a block type; all generators targeting the same label are merged
    /// into a single union block.
    fn parse_dynamic_block(&mut self, block: &Block, label: &str) {
        let content = block
            .body
            .blocks()
            .find(|b| b.ident.as_str() == "content")
            .map(|b| &b.body)
            .unwrap_or(&block.body);

        let parsed = ParsedBlock::from_body(content);
        self.properties.insert(label.to_string());
        match self.dynamic_blocks.get_mut(label) {
            Some(existing) => merge_blocks(existing, parsed),
            None => {
                self.dynamic_blocks.insert(label.to_string(), parsed);
            }
        }
    }
}

/// Folds `src` into `dest`: properties union, static sequences concatenate
/// per type name, dynamic blocks merge recursively, ignore lists
/// concatenate. Source entries land after destination entries.
pub fn merge_blocks(dest: &mut ParsedBlock, src: ParsedBlock) {
    dest.data.properties.extend(src.data.properties);

    for (name, instances) in src.data.static_blocks {
        dest.data.static_blocks.entry(name).or_default().extend(instances);
    }

    for (name, block) in src.data.dynamic_blocks {
        match dest.data.dynamic_blocks.get_mut(&name) {
            Some(existing) => merge_blocks(existing, block),
            None => {
                dest.data.dynamic_blocks.insert(name, block);
            }
        }
    }

    dest.data.ignore_changes.extend(src.data.ignore_changes);
}
