use std::collections::BTreeSet;
use std::rc::Rc;

use crate::body::{Attribute, Attributes, Block, Body, BodyContent, missing_required_attributes};
use crate::diagnostic::{Diagnostic, Diagnostics, SourceRange};
use crate::schema::Schema;
use crate::value::Expression;

/// An attribute exactly as written in the source.
#[derive(Debug, Clone)]
pub struct SyntaxAttribute {
    pub name: String,
    pub name_range: SourceRange,
    pub expr: Expression,
    pub range: SourceRange,
}

/// A block exactly as written in the source.
#[derive(Debug, Clone)]
pub struct SyntaxBlock {
    pub block_type: String,
    pub type_range: SourceRange,
    pub labels: Vec<(String, SourceRange)>,
    pub open_brace_range: SourceRange,
    pub body: Rc<SyntaxBody>,
    pub range: SourceRange,
}

/// A body produced by the parser. Items keep their declaration order.
#[derive(Debug, Clone)]
pub struct SyntaxBody {
    pub attributes: Vec<SyntaxAttribute>,
    pub blocks: Vec<SyntaxBlock>,
    /// The closing brace of the block, or the end of the file for a root body.
    pub end_range: SourceRange,
    /// Names already consumed by an earlier partial decode.
    hidden: BTreeSet<String>,
}

impl SyntaxBody {
    pub fn new(
        attributes: Vec<SyntaxAttribute>,
        blocks: Vec<SyntaxBlock>,
        end_range: SourceRange,
    ) -> Self {
        SyntaxBody {
            attributes,
            blocks,
            end_range,
            hidden: BTreeSet::new(),
        }
    }

    fn visible_attributes(&self) -> impl Iterator<Item = &SyntaxAttribute> {
        self.attributes
            .iter()
            .filter(|a| !self.hidden.contains(&a.name))
    }

    fn visible_blocks(&self) -> impl Iterator<Item = &SyntaxBlock> {
        self.blocks
            .iter()
            .filter(|b| !self.hidden.contains(&b.block_type))
    }

    /// Shared decoder for `content` and `partial_content`. In partial mode,
    /// items the schema does not name are skipped instead of reported.
    fn decode(&self, schema: &Schema, partial: bool) -> (BodyContent, Diagnostics) {
        let mut content = BodyContent::new();
        let mut diags = Diagnostics::new();

        for attr in self.visible_attributes() {
            if schema.find_attribute(&attr.name).is_some() {
                content.attributes.insert(
                    attr.name.clone(),
                    Attribute {
                        name: attr.name.clone(),
                        expr: attr.expr.clone(),
                        range: Some(attr.range.clone()),
                    },
                );
            } else if !partial {
                let mut detail = format!("An argument named \"{}\" is not expected here.", attr.name);
                if schema.find_block(&attr.name).is_some() {
                    detail.push_str(&format!(
                        " Did you mean to define a block of type \"{}\"?",
                        attr.name
                    ));
                }
                diags.push(
                    Diagnostic::error("Unsupported argument", detail)
                        .with_subject(attr.name_range.clone()),
                );
            }
        }

        for block in self.visible_blocks() {
            let Some(header) = schema.find_block(&block.block_type) else {
                if !partial {
                    let mut detail =
                        format!("Blocks of type \"{}\" are not expected here.", block.block_type);
                    if schema.find_attribute(&block.block_type).is_some() {
                        detail.push_str(&format!(
                            " Did you mean to define argument \"{}\"?",
                            block.block_type
                        ));
                    }
                    diags.push(
                        Diagnostic::error("Unsupported block type", detail)
                            .with_subject(block.type_range.clone()),
                    );
                }
                continue;
            };

            let want = header.label_names.len();
            if block.labels.len() < want {
                let missing = &header.label_names[block.labels.len()];
                diags.push(
                    Diagnostic::error(
                        format!("Missing {} label", missing),
                        format!(
                            "All {} blocks must have {} labels ({}).",
                            block.block_type,
                            want,
                            header.label_names.join(", ")
                        ),
                    )
                    .with_subject(block.open_brace_range.clone()),
                );
                continue;
            }
            if block.labels.len() > want {
                let detail = if want == 0 {
                    format!("No labels are expected for {} blocks.", block.block_type)
                } else {
                    format!(
                        "Only {} labels ({}) are expected for {} blocks.",
                        want,
                        header.label_names.join(", "),
                        block.block_type
                    )
                };
                diags.push(
                    Diagnostic::error("Extra label on block", detail)
                        .with_subject(block.labels[want].1.clone()),
                );
                continue;
            }

            let body: Rc<dyn Body> = block.body.clone();
            content.blocks.push(Block {
                block_type: block.block_type.clone(),
                labels: block.labels.iter().map(|(l, _)| l.clone()).collect(),
                label_ranges: block.labels.iter().map(|(_, r)| Some(r.clone())).collect(),
                body,
                range: Some(block.range.clone()),
            });
        }

        diags.extend(missing_required_attributes(
            &content.attributes,
            schema,
            &self.end_range,
        ));
        (content, diags)
    }
}

impl Body for SyntaxBody {
    fn content(&self, schema: &Schema) -> (BodyContent, Diagnostics) {
        self.decode(schema, false)
    }

    fn partial_content(&self, schema: &Schema) -> (BodyContent, Rc<dyn Body>, Diagnostics) {
        let (content, diags) = self.decode(schema, true);

        let mut remain = self.clone();
        remain
            .hidden
            .extend(schema.attributes.iter().map(|a| a.name.clone()));
        remain
            .hidden
            .extend(schema.blocks.iter().map(|b| b.block_type.clone()));

        (content, Rc::new(remain), diags)
    }

    fn just_attributes(&self) -> (Attributes, Diagnostics) {
        let mut attrs = Attributes::new();
        let mut diags = Diagnostics::new();

        for block in self.visible_blocks() {
            diags.push(
                Diagnostic::error(
                    format!("Unexpected \"{}\" block", block.block_type),
                    "Blocks are not allowed here.",
                )
                .with_subject(block.type_range.clone()),
            );
        }
        for attr in self.visible_attributes() {
            attrs.insert(
                attr.name.clone(),
                Attribute {
                    name: attr.name.clone(),
                    expr: attr.expr.clone(),
                    range: Some(attr.range.clone()),
                },
            );
        }

        (attrs, diags)
    }

    fn missing_item_range(&self) -> SourceRange {
        self.end_range.clone()
    }
}
