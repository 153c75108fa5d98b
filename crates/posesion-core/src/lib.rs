//! Posesión efectiva form engine
//!
//! Fills Chile's Registro Civil "Formulario 2.1" (posesión efectiva
//! intestada) from a structured estate record. A layout registry maps
//! every header field and inventory table to design-space coordinates;
//! the renderer projects those through a rotation strategy onto the
//! four-page template and appends annex pages whenever an inventory
//! outgrows its printed slots.

pub mod error;
pub mod fields;
pub mod format;
pub mod geometry;
pub mod model;
pub mod overflow;
pub mod pdf;
pub mod registry;
pub mod render;
pub mod totals;

pub use error::{RegistryError, RenderError};
pub use model::{EstateCase, TaxDeclaration};
pub use registry::LayoutRegistry;
pub use render::render_case;
pub use totals::Totals;

/// Fill the built-in Formulario 2.1 layout with one estate record.
pub fn fill_form(template: &[u8], case: &EstateCase) -> Result<Vec<u8>, RenderError> {
    render::render_case(template, case, LayoutRegistry::builtin())
}
