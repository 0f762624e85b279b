//! Overlays: edits folded onto a decoded configuration body without
//! rewriting the document they came from.
//!
//! The usual source of overlays is the command line. [`extract_cli_options`]
//! picks out arguments like `--io_mode=async` or
//! `--service.http.web_proxy.listen_addr=:8080` whose first step is named by
//! the root schema, and [`apply_overlays`] wraps the parsed document so that
//! every decode of it sees those settings.
//!
//! Overlaid settings are always strings with no source range; downstream
//! decoding decides whether a string is acceptable.

pub mod apply;
pub mod cli_args;
pub mod error;
pub mod overlay;
pub mod path;

pub use apply::apply_overlays;
pub use cli_args::{ExtractedOptions, TERMINATOR, extract_cli_options, parse_cli_argument};
pub use error::OverlayError;
pub use overlay::Overlay;
pub use path::PathOverlay;
