use std::fmt;
use std::rc::Rc;

use confdoc::{Attributes, BodyContent, Diagnostics, Schema};

/// An edit that can be folded onto the result of decoding a body, usually
/// adding or replacing attributes and blocks. See [`crate::apply_overlays`].
///
/// Implementations modify the given content in place rather than building a
/// new copy, and must never mutate themselves: one overlay may be applied to
/// many bodies.
pub trait Overlay: fmt::Debug {
    /// Apply the overlay to content decoded with `schema`.
    ///
    /// Reports an error if the schema has no place for any of the changes the
    /// overlay represents. Errors are phrased as if the overlay itself were
    /// invalid, since overlays usually come from an end user.
    fn apply_overlay(&self, content: &mut BodyContent, schema: &Schema) -> Diagnostics;

    /// Apply as much of the overlay as `schema` calls for. If the schema has
    /// no place for the overlay, return an overlay that would apply the rest
    /// so that a later pass with another schema can try again.
    fn partial_apply_overlay(
        &self,
        content: &mut BodyContent,
        schema: &Schema,
    ) -> (Option<Rc<dyn Overlay>>, Diagnostics);

    /// Apply only attribute changes, reporting an error if the overlay would
    /// need to add or descend into a block.
    fn apply_just_attributes(&self, attrs: &mut Attributes) -> Diagnostics;
}
