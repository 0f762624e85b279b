use std::rc::Rc;

use confdoc::parser::valid_identifier;
use confdoc::{Diagnostics, Schema};
use tracing::debug;

use crate::error::OverlayError;
use crate::overlay::Overlay;
use crate::path::PathOverlay;

/// Ends overlay scanning; everything after it is passed through untouched.
pub const TERMINATOR: &str = "--";

/// Parse a `path=value` argument into an overlay that sets the addressed
/// attribute to `value` as a string.
///
/// The path is a sequence of dot-separated identifiers. The value is
/// everything after the first `=`, and may be empty or contain further `=`
/// and `.` characters. Every invalid path component is reported, not just
/// the first.
pub fn parse_cli_argument(raw: &str) -> (Option<PathOverlay>, Diagnostics) {
    let mut diags = Diagnostics::new();

    let Some(eq) = raw.find('=').filter(|&eq| eq > 0) else {
        diags.push(OverlayError::InvalidArgumentSyntax {
            raw: raw.to_string(),
        });
        return (None, diags);
    };
    let (path, value) = (&raw[..eq], &raw[eq + 1..]);

    let steps: Vec<String> = path.split('.').map(str::to_string).collect();
    for step in &steps {
        if !valid_identifier(step) {
            diags.push(OverlayError::InvalidIdentifierComponent {
                step: step.clone(),
                path: path.to_string(),
            });
        }
    }
    if diags.has_errors() {
        return (None, diags);
    }

    (Some(PathOverlay::from_parts(path, steps, value)), diags)
}

/// Overlays found on a command line, and what is left of it.
#[derive(Debug, Default)]
pub struct ExtractedOptions {
    pub overlays: Vec<Rc<dyn Overlay>>,
    /// The arguments that were not taken as overlays, in their original order.
    pub remaining: Vec<String>,
    pub diagnostics: Diagnostics,
}

/// Find the `--name...=value` options in `args` whose first path step names
/// an attribute or block type in `schema`, and parse each into an overlay.
///
/// Options whose first step is not in the schema are left for some other
/// option parser. A literal `--` stops the scan; it and everything after it
/// are kept in `remaining`.
pub fn extract_cli_options(args: &[String], schema: &Schema) -> ExtractedOptions {
    let mut extracted = ExtractedOptions::default();

    for (i, arg) in args.iter().enumerate() {
        if arg == TERMINATOR {
            extracted.remaining.extend(args[i..].iter().cloned());
            break;
        }
        let Some(raw) = arg.strip_prefix("--") else {
            extracted.remaining.push(arg.clone());
            continue;
        };
        let name = raw.split(['.', '=']).next().unwrap_or(raw);
        if !schema.has_name(name) {
            extracted.remaining.push(arg.clone());
            continue;
        }

        debug!(argument = %raw, "taking argument as overlay");
        let (overlay, diags) = parse_cli_argument(raw);
        extracted.diagnostics.extend(diags);
        if let Some(overlay) = overlay {
            extracted.overlays.push(Rc::new(overlay));
        }
    }

    extracted
}
