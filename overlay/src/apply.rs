use std::rc::Rc;

use confdoc::body::missing_required_attributes;
use confdoc::{Attributes, Body, BodyContent, Diagnostics, Schema, SourceRange};
use tracing::debug;

use crate::overlay::Overlay;

/// Wrap `body` so that decoding it yields the result of applying `overlays`,
/// in order, each one seeing the result of the one before it.
///
/// The wrapped body is decoded with every attribute treated as optional;
/// required attributes are enforced on the overlaid result instead, so an
/// overlay can supply a setting the document leaves out.
pub fn apply_overlays(body: Rc<dyn Body>, overlays: Vec<Rc<dyn Overlay>>) -> Rc<dyn Body> {
    if overlays.is_empty() {
        return body;
    }
    Rc::new(OverlayBody {
        inner: body,
        overlays,
    })
}

#[derive(Debug)]
struct OverlayBody {
    inner: Rc<dyn Body>,
    overlays: Vec<Rc<dyn Overlay>>,
}

impl OverlayBody {
    /// Required attributes of the caller's original schema that are still
    /// missing after overlaying.
    fn check_required(&self, content: &BodyContent, schema: &Schema, diags: &mut Diagnostics) {
        diags.extend(missing_required_attributes(
            &content.attributes,
            schema,
            &self.missing_item_range(),
        ));
    }
}

impl Body for OverlayBody {
    fn content(&self, schema: &Schema) -> (BodyContent, Diagnostics) {
        let relaxed = schema.without_required();
        debug!(overlays = self.overlays.len(), "applying overlays to full content");

        let (mut content, mut diags) = self.inner.content(&relaxed);
        for overlay in &self.overlays {
            diags.extend(overlay.apply_overlay(&mut content, &relaxed));
        }

        self.check_required(&content, schema, &mut diags);
        (content, diags)
    }

    fn partial_content(&self, schema: &Schema) -> (BodyContent, Rc<dyn Body>, Diagnostics) {
        let relaxed = schema.without_required();
        debug!(overlays = self.overlays.len(), "applying overlays to partial content");

        let (mut content, remain, mut diags) = self.inner.partial_content(&relaxed);
        let mut leftovers = Vec::new();
        for overlay in &self.overlays {
            let (leftover, more) = overlay.partial_apply_overlay(&mut content, &relaxed);
            diags.extend(more);
            leftovers.extend(leftover);
        }
        if !leftovers.is_empty() {
            debug!(leftovers = leftovers.len(), "carrying overlays over to remaining body");
        }
        let remain = apply_overlays(remain, leftovers);

        self.check_required(&content, schema, &mut diags);
        (content, remain, diags)
    }

    fn just_attributes(&self) -> (Attributes, Diagnostics) {
        let (mut attrs, mut diags) = self.inner.just_attributes();
        for overlay in &self.overlays {
            diags.extend(overlay.apply_just_attributes(&mut attrs));
        }
        (attrs, diags)
    }

    fn missing_item_range(&self) -> SourceRange {
        self.inner.missing_item_range()
    }
}
