use std::rc::Rc;

use confdoc::{Attribute, Attributes, Block, BodyContent, Diagnostics, EmptyBody, Expression, Schema};
use tracing::{debug, trace};

use crate::apply::apply_overlays;
use crate::error::OverlayError;
use crate::overlay::Overlay;

/// Sets one attribute, addressed by a dotted path through the schema, to a
/// literal string.
///
/// A path is read against the schema one step at a time. A step naming an
/// attribute must be the last one. A step naming a block type is followed by
/// one step per label the block type declares, and then by the path to
/// apply inside that block. The first block in the body with that type and
/// those labels is the one changed; if there is none, a new block is
/// appended containing only the overlaid setting.
///
/// Overlaid attributes, synthesized blocks, and their labels have no source
/// range.
#[derive(Debug, Clone)]
pub struct PathOverlay {
    /// The path as the user wrote it, for error messages.
    full_path: Rc<str>,
    steps: Rc<[String]>,
    /// Steps before this index were consumed by enclosing blocks.
    start: usize,
    value: Rc<str>,
}

impl PathOverlay {
    /// `steps` must be non-empty.
    pub(crate) fn from_parts(full_path: &str, steps: Vec<String>, value: &str) -> Self {
        debug_assert!(!steps.is_empty());
        PathOverlay {
            full_path: full_path.into(),
            steps: steps.into(),
            start: 0,
            value: value.into(),
        }
    }

    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// The steps still to be resolved at this level of the document.
    pub fn steps(&self) -> &[String] {
        &self.steps[self.start..]
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// The same overlay scoped to the body reached after `consumed` more steps.
    fn sub_overlay(&self, consumed: usize) -> PathOverlay {
        PathOverlay {
            full_path: Rc::clone(&self.full_path),
            steps: Rc::clone(&self.steps),
            start: self.start + consumed,
            value: Rc::clone(&self.value),
        }
    }

    fn literal_attribute(&self, name: &str) -> Attribute {
        Attribute {
            name: name.to_string(),
            expr: Expression::literal_string(&*self.value),
            range: None,
        }
    }

    fn unexpected(&self) -> Diagnostics {
        OverlayError::UnexpectedArgument {
            path: self.full_path.to_string(),
        }
        .into_diagnostics()
    }
}

fn labels_match(have: &[String], want: &[String]) -> bool {
    have.len() == want.len() && have.iter().zip(want).all(|(a, b)| a == b)
}

impl Overlay for PathOverlay {
    fn apply_overlay(&self, content: &mut BodyContent, schema: &Schema) -> Diagnostics {
        let (remain, mut diags) = self.partial_apply_overlay(content, schema);
        if remain.is_some() {
            // The schema had no place for our path, so the argument is invalid.
            diags.extend(self.unexpected());
        }
        diags
    }

    fn partial_apply_overlay(
        &self,
        content: &mut BodyContent,
        schema: &Schema,
    ) -> (Option<Rc<dyn Overlay>>, Diagnostics) {
        let steps = self.steps();
        let name = &steps[0];

        if schema.find_attribute(name).is_some() {
            if steps.len() != 1 {
                let err = OverlayError::AttributeUsedAsPrefix {
                    path: self.full_path.to_string(),
                    attribute: name.clone(),
                };
                return (None, err.into_diagnostics());
            }
            trace!(path = %self.full_path, attribute = %name, "overriding attribute");
            content
                .attributes
                .insert(name.clone(), self.literal_attribute(name));
            return (None, Diagnostics::new());
        }

        if let Some(header) = schema.find_block(name) {
            // The block type, one step per label, and at least one more step
            // to set inside the block.
            let label_count = header.label_names.len();
            if steps.len() < label_count + 2 {
                return (None, self.unexpected());
            }

            let want_labels = &steps[1..=label_count];
            let sub: Rc<dyn Overlay> = Rc::new(self.sub_overlay(label_count + 1));

            let existing = content
                .blocks
                .iter_mut()
                .find(|b| b.block_type == header.block_type && labels_match(&b.labels, want_labels));
            if let Some(block) = existing {
                trace!(path = %self.full_path, block = %name, labels = ?want_labels, "descending into existing block");
                block.body = apply_overlays(Rc::clone(&block.body), vec![sub]);
                return (None, Diagnostics::new());
            }

            trace!(path = %self.full_path, block = %name, labels = ?want_labels, "synthesizing block");
            content.blocks.push(Block {
                block_type: header.block_type.clone(),
                labels: want_labels.to_vec(),
                label_ranges: vec![None; label_count],
                body: apply_overlays(EmptyBody::rc(), vec![sub]),
                range: None,
            });
            return (None, Diagnostics::new());
        }

        debug!(path = %self.full_path, step = %name, "schema has no place for overlay, leaving it for later");
        (Some(Rc::new(self.clone())), Diagnostics::new())
    }

    fn apply_just_attributes(&self, attrs: &mut Attributes) -> Diagnostics {
        let steps = self.steps();
        if steps.len() != 1 {
            // There are no blocks to traverse in this mode.
            return self.unexpected();
        }
        let name = &steps[0];
        attrs.insert(name.clone(), self.literal_attribute(name));
        Diagnostics::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confdoc::{Body, Value};

    fn overlay(path: &str, value: &str) -> PathOverlay {
        let steps = path.split('.').map(str::to_string).collect();
        PathOverlay::from_parts(path, steps, value)
    }

    fn string_of(content: &BodyContent, name: &str) -> Option<String> {
        content
            .attributes
            .get(name)
            .map(|a| a.expr.value.to_string())
    }

    #[test]
    fn sub_overlay_shares_path_and_value() {
        let o = overlay("service.http.web.listen_addr", "x");
        let sub = o.sub_overlay(3);
        assert_eq!(sub.steps(), ["listen_addr".to_string()]);
        assert_eq!(sub.full_path(), "service.http.web.listen_addr");
        assert_eq!(sub.value(), "x");
        assert_eq!(o.steps().len(), 4);
    }

    #[test]
    fn labels_match_is_exact_and_length_sensitive() {
        let ab = vec!["a".to_string(), "b".to_string()];
        assert!(labels_match(&[], &[]));
        assert!(labels_match(&ab, &ab));
        assert!(!labels_match(&ab[..1], &ab));
        assert!(!labels_match(&["A".to_string()], &["a".to_string()]));
    }

    #[test]
    fn attribute_is_inserted_without_range() {
        let schema = Schema::new().attribute("foo");
        let mut content = BodyContent::new();
        let diags = overlay("foo", "b").apply_overlay(&mut content, &schema);
        assert!(diags.is_empty());
        assert_eq!(string_of(&content, "foo").as_deref(), Some("b"));
        assert!(content.attributes["foo"].range.is_none());
        assert_eq!(
            content.attributes["foo"].expr.value,
            Value::String("b".into())
        );
    }

    #[test]
    fn attribute_cannot_be_a_prefix() {
        let schema = Schema::new().attribute("foo");
        let mut content = BodyContent::new();
        let (remain, diags) = overlay("foo.bar", "b").partial_apply_overlay(&mut content, &schema);
        assert!(remain.is_none());
        assert!(diags.has_errors());
        assert!(diags.to_string().contains("\"foo\" is a single setting"));
        assert!(content.attributes.is_empty());
    }

    #[test]
    fn block_path_needs_labels_and_a_setting() {
        let schema = Schema::new().block("service", &["type", "name"]);
        for path in ["service", "service.http", "service.http.web"] {
            let mut content = BodyContent::new();
            let diags = overlay(path, "x").apply_overlay(&mut content, &schema);
            assert_eq!(diags.len(), 1, "{}", path);
            assert!(diags.to_string().contains(&format!("Unexpected argument \"{}\".", path)));
            assert!(content.blocks.is_empty());
        }
    }

    #[test]
    fn unknown_name_is_left_over_in_partial_mode() {
        let schema = Schema::new().attribute("foo");
        let mut content = BodyContent::new();
        let (remain, diags) = overlay("bar", "b").partial_apply_overlay(&mut content, &schema);
        assert!(diags.is_empty());
        assert!(content.attributes.is_empty());

        let remain = remain.expect("leftover overlay");
        let mut attrs = Attributes::new();
        assert!(remain.apply_just_attributes(&mut attrs).is_empty());
        assert_eq!(attrs["bar"].expr.value.to_string(), "b");
    }

    #[test]
    fn unknown_name_is_an_error_in_full_mode() {
        let schema = Schema::new().attribute("foo");
        let mut content = BodyContent::new();
        let diags = overlay("bar", "b").apply_overlay(&mut content, &schema);
        assert_eq!(diags.to_string(), "Invalid argument: Unexpected argument \"bar\".");
    }

    #[test]
    fn synthesized_block_has_position_less_labels() {
        let schema = Schema::new().block("service", &["type", "name"]);
        let mut content = BodyContent::new();
        let diags = overlay("service.http.web.listen_addr", ":80").apply_overlay(&mut content, &schema);
        assert!(diags.is_empty());

        let block = &content.blocks[0];
        assert_eq!(block.labels, vec!["http", "web"]);
        assert_eq!(block.label_ranges, vec![None, None]);
        assert!(block.range.is_none());

        let (inner, diags) = block
            .body
            .content(&Schema::new().required_attribute("listen_addr"));
        assert!(diags.is_empty(), "{}", diags);
        assert_eq!(string_of(&inner, "listen_addr").as_deref(), Some(":80"));
    }

    #[test]
    fn just_attributes_rejects_paths() {
        let mut attrs = Attributes::new();
        let diags = overlay("block.foo", "x").apply_just_attributes(&mut attrs);
        assert!(diags.has_errors());
        assert!(attrs.is_empty());
    }

    #[test]
    fn applying_never_changes_the_overlay() {
        let o = overlay("block.foo", "x");
        let schema = Schema::new().block("block", &[]);
        let mut content = BodyContent::new();
        o.apply_overlay(&mut content, &schema);
        o.apply_overlay(&mut content, &schema);
        assert_eq!(o.steps().len(), 2);
        assert_eq!(content.blocks.len(), 1);
    }
}
