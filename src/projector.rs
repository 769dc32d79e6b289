//! Render projection: the single ordered list handed to the drawing surface.

#[cfg(test)]
#[path = "projector_test.rs"]
mod projector_test;

use strokes::Stroke;

/// Committed strokes in canonical order, followed by the provisional stroke.
///
/// The provisional stroke always renders last so the author sees their line
/// on top of everything else while drawing.
pub fn project<'a>(
    committed: impl IntoIterator<Item = &'a Stroke>,
    provisional: Option<&'a Stroke>,
) -> Vec<&'a Stroke> {
    committed.into_iter().chain(provisional).collect()
}
