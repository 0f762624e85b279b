pub mod syntax;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::diagnostic::{Diagnostic, Diagnostics, SourceRange};
use crate::schema::Schema;
use crate::value::Expression;

pub use syntax::SyntaxBody;

/// A node that can be decoded against a schema.
///
/// Every operation returns whatever it could decode together with the
/// diagnostics it found; callers decide whether errors are fatal.
pub trait Body: fmt::Debug {
    /// Decode the body, requiring that everything in it is named by `schema`.
    fn content(&self, schema: &Schema) -> (BodyContent, Diagnostics);

    /// Decode only what `schema` names. The rest comes back as a remainder
    /// body that a later pass can decode with a different schema.
    fn partial_content(&self, schema: &Schema) -> (BodyContent, Rc<dyn Body>, Diagnostics);

    /// Decode the body as a flat set of attributes, with no blocks allowed.
    fn just_attributes(&self) -> (Attributes, Diagnostics);

    /// Where to point diagnostics about something that is absent.
    fn missing_item_range(&self) -> SourceRange;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub expr: Expression,
    /// Byte span of the whole `name = value` item, if it came from source.
    pub range: Option<SourceRange>,
}

pub type Attributes = BTreeMap<String, Attribute>;

#[derive(Debug, Clone)]
pub struct Block {
    pub block_type: String,
    pub labels: Vec<String>,
    /// One entry per label; `None` for labels with no source position.
    pub label_ranges: Vec<Option<SourceRange>>,
    pub body: Rc<dyn Body>,
    pub range: Option<SourceRange>,
}

/// The result of decoding a body against a schema.
#[derive(Debug, Clone, Default)]
pub struct BodyContent {
    pub attributes: Attributes,
    pub blocks: Vec<Block>,
}

impl BodyContent {
    pub fn new() -> Self {
        BodyContent::default()
    }

    pub fn blocks_of_type<'a>(&'a self, block_type: &'a str) -> impl Iterator<Item = &'a Block> {
        self.blocks.iter().filter(move |b| b.block_type == block_type)
    }
}

/// One "Missing required argument" error per required attribute of `schema`
/// that `attributes` does not define.
pub fn missing_required_attributes(
    attributes: &Attributes,
    schema: &Schema,
    missing_item_range: &SourceRange,
) -> Diagnostics {
    let mut diags = Diagnostics::new();
    for attr in schema.required_attributes() {
        if !attributes.contains_key(&attr.name) {
            diags.push(
                Diagnostic::error(
                    "Missing required argument",
                    format!(
                        "The argument \"{}\" is required, but no definition was found.",
                        attr.name
                    ),
                )
                .with_subject(missing_item_range.clone()),
            );
        }
    }
    diags
}

/// A body with nothing in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyBody;

impl EmptyBody {
    pub fn rc() -> Rc<dyn Body> {
        Rc::new(EmptyBody)
    }
}

impl Body for EmptyBody {
    fn content(&self, schema: &Schema) -> (BodyContent, Diagnostics) {
        let content = BodyContent::new();
        let diags =
            missing_required_attributes(&content.attributes, schema, &self.missing_item_range());
        (content, diags)
    }

    fn partial_content(&self, schema: &Schema) -> (BodyContent, Rc<dyn Body>, Diagnostics) {
        let (content, diags) = self.content(schema);
        (content, EmptyBody::rc(), diags)
    }

    fn just_attributes(&self) -> (Attributes, Diagnostics) {
        (Attributes::new(), Diagnostics::new())
    }

    fn missing_item_range(&self) -> SourceRange {
        SourceRange::default()
    }
}
