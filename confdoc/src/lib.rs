pub mod body;
pub mod diagnostic;
pub mod parser;
pub mod schema;
pub mod value;

pub use body::{Attribute, Attributes, Block, Body, BodyContent, EmptyBody, SyntaxBody};
pub use diagnostic::{Diagnostic, Diagnostics, SourceRange};
pub use schema::{AttributeSchema, BlockHeaderSchema, Schema};
pub use value::{Expression, Value};
