//! Layout registry
//!
//! The single source of truth for where every value lands on the form.
//! The registry is data, not code: a JSON document mapping logical
//! field paths to design-space coordinates and repeating sections to
//! row geometry, validated once at load. A revised template asset is
//! accommodated by swapping the file, never by touching rendering
//! logic. The known revision ships embedded in the binary.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::RegistryError;
use crate::fields::{self, Category};
use crate::geometry::{PageGeometry, RotationStrategy};

/// Layout for the bundled template revision (Formulario de Posesión
/// Efectiva 2.1).
const BUILTIN_LAYOUT: &str = include_str!("../layout/formulario_2_1.json");

static BUILTIN: Lazy<LayoutRegistry> = Lazy::new(|| {
    LayoutRegistry::from_json(BUILTIN_LAYOUT)
        .expect("bundled layout registry must parse and validate")
});

/// A fixed-position entry: logical field path → design coordinate.
///
/// The same path may appear on several pages (the header quadruple
/// repeats on pages 1, 3 and 4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub path: String,
    pub page: usize,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub size: Option<f64>,
}

/// A positioned output slot without a path (totals, declaration marks).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldPos {
    pub page: usize,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub size: Option<f64>,
}

/// One column of a repeating section's table region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnSpec {
    pub name: String,
    pub x: f64,
    #[serde(default)]
    pub size: Option<f64>,
}

/// One page slot of a repeating section. Row `i` of a slot sits at
/// `(column.x, start_y - i * row_height)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionSlot {
    pub page: usize,
    pub start_y: f64,
    pub row_height: f64,
    pub capacity: usize,
}

/// A repeating section: ordered page slots, column map, row font and
/// the per-category total coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionSpec {
    pub name: String,
    /// Human label, used for continuation-page block headings.
    pub label: String,
    pub font_size: f64,
    pub slots: Vec<SectionSlot>,
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub total: Option<FieldPos>,
}

impl SectionSpec {
    /// Total inline rows across all slots.
    pub fn capacity(&self) -> usize {
        self.slots.iter().map(|s| s.capacity).sum()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Page-4 aggregate coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummarySpec {
    pub total_activos: FieldPos,
    pub total_pasivos: FieldPos,
    pub masa_hereditaria: FieldPos,
}

/// The three mutually exclusive tax-declaration mark positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclarationSpec {
    pub exentas: FieldPos,
    pub afectas_algunas: FieldPos,
    pub afectas_todas: FieldPos,
}

/// Continuation-page construction and layout parameters, in design
/// space like everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnnexSpec {
    /// MediaBox width/height for appended pages.
    pub media_box: [f64; 2],
    /// Page /Rotate value for appended pages (matches the template).
    pub rotate: i64,
    pub title: String,
    pub left_x: f64,
    pub top_y: f64,
    pub bottom_y: f64,
    pub line_height: f64,
    pub font_size: f64,
    pub heading_size: f64,
}

/// Default and small font sizes for fixed fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontSpec {
    pub size: f64,
    pub small: f64,
}

/// The complete, versioned layout table for one template revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutRegistry {
    pub version: String,
    pub strategy: RotationStrategy,
    pub page: PageGeometry,
    pub base_pages: usize,
    pub font: FontSpec,
    #[serde(default)]
    pub include_firearms_in_assets: bool,
    pub fields: Vec<FieldSpec>,
    pub sections: Vec<SectionSpec>,
    pub summary: SummarySpec,
    pub declaration: DeclarationSpec,
    pub annex: AnnexSpec,
}

impl LayoutRegistry {
    /// The embedded layout for the bundled template revision. Parsed
    /// and validated once per process.
    pub fn builtin() -> &'static LayoutRegistry {
        &BUILTIN
    }

    /// Parse and validate a registry from JSON text.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let registry: LayoutRegistry = serde_json::from_str(json)?;
        registry.validate()?;
        Ok(registry)
    }

    /// Load and validate a registry from a file, for template
    /// revisions supplied at deploy time.
    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Sections in their declared render order.
    pub fn sections(&self) -> &[SectionSpec] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&SectionSpec> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Fixed fields declared for one page, in declared order.
    pub fn fields_on_page(&self, page: usize) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(move |f| f.page == page)
    }

    /// Check every structural invariant the renderer depends on. A
    /// registry that passes is safe to use for the life of the process.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.version.trim().is_empty() {
            return Err(invalid("version must not be empty"));
        }
        if self.base_pages == 0 {
            return Err(invalid("base_pages must be at least 1"));
        }
        if self.page.width <= 0.0 || self.page.height <= 0.0 {
            return Err(invalid("page geometry must be positive"));
        }
        if self.font.size <= 0.0 || self.font.small <= 0.0 {
            return Err(invalid("font sizes must be positive"));
        }

        for field in &self.fields {
            if field.page >= self.base_pages {
                return Err(invalid(&format!(
                    "field '{}' targets page {} outside the {}-page template",
                    field.path, field.page, self.base_pages
                )));
            }
            if !fields::is_known_field(&field.path) {
                return Err(invalid(&format!("unknown field path '{}'", field.path)));
            }
            if matches!(field.size, Some(s) if s <= 0.0) {
                return Err(invalid(&format!("field '{}' has a non-positive size", field.path)));
            }
        }

        let mut seen = Vec::with_capacity(self.sections.len());
        for section in &self.sections {
            let category = Category::from_name(&section.name).ok_or_else(|| {
                invalid(&format!("unknown section '{}'", section.name))
            })?;
            if seen.contains(&category) {
                return Err(invalid(&format!("section '{}' declared twice", section.name)));
            }
            seen.push(category);

            if section.slots.is_empty() {
                return Err(invalid(&format!("section '{}' has no slots", section.name)));
            }
            for slot in &section.slots {
                if slot.page >= self.base_pages {
                    return Err(invalid(&format!(
                        "section '{}' slot targets page {} outside the template",
                        section.name, slot.page
                    )));
                }
                if slot.capacity == 0 {
                    return Err(invalid(&format!(
                        "section '{}' declares a zero-capacity slot",
                        section.name
                    )));
                }
                if slot.row_height <= 0.0 {
                    return Err(invalid(&format!(
                        "section '{}' declares a non-positive row height",
                        section.name
                    )));
                }
            }
            if section.columns.is_empty() {
                return Err(invalid(&format!("section '{}' has no columns", section.name)));
            }
            for column in &section.columns {
                if !category.columns().contains(&column.name.as_str()) {
                    return Err(invalid(&format!(
                        "section '{}' has unknown column '{}'",
                        section.name, column.name
                    )));
                }
            }
            if section.font_size <= 0.0 {
                return Err(invalid(&format!(
                    "section '{}' has a non-positive row font size",
                    section.name
                )));
            }
            if let Some(total) = &section.total {
                if total.page >= self.base_pages {
                    return Err(invalid(&format!(
                        "section '{}' total targets a page outside the template",
                        section.name
                    )));
                }
            }
        }

        for (name, pos) in [
            ("summary.total_activos", self.summary.total_activos),
            ("summary.total_pasivos", self.summary.total_pasivos),
            ("summary.masa_hereditaria", self.summary.masa_hereditaria),
            ("declaration.exentas", self.declaration.exentas),
            ("declaration.afectas_algunas", self.declaration.afectas_algunas),
            ("declaration.afectas_todas", self.declaration.afectas_todas),
        ] {
            if pos.page >= self.base_pages {
                return Err(invalid(&format!("{name} targets a page outside the template")));
            }
        }

        let annex = &self.annex;
        if annex.media_box[0] <= 0.0 || annex.media_box[1] <= 0.0 {
            return Err(invalid("annex media box must be positive"));
        }
        if !matches!(annex.rotate, 0 | 90 | 180 | 270) {
            return Err(invalid("annex rotate must be a multiple of 90"));
        }
        if annex.line_height <= 0.0 {
            return Err(invalid("annex line height must be positive"));
        }
        if annex.top_y <= annex.bottom_y {
            return Err(invalid("annex top margin must sit above the bottom margin"));
        }
        if annex.font_size <= 0.0 || annex.heading_size <= 0.0 {
            return Err(invalid("annex font sizes must be positive"));
        }

        Ok(())
    }
}

fn invalid(msg: &str) -> RegistryError {
    RegistryError::Invalid(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_layout_parses_and_validates() {
        let registry = LayoutRegistry::builtin();
        assert_eq!(registry.base_pages, 4);
        assert_eq!(registry.strategy, RotationStrategy::CounterRotated);
        assert!(!registry.include_firearms_in_assets);
    }

    #[test]
    fn builtin_declares_all_nine_sections_in_order() {
        let names: Vec<&str> = LayoutRegistry::builtin()
            .sections()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(
            names,
            [
                "herederos",
                "bienes_raices",
                "vehiculos",
                "menaje",
                "inmuebles_excluidos",
                "otros_muebles",
                "otros_bienes",
                "armas",
                "pasivos",
            ]
        );
    }

    #[test]
    fn builtin_heir_capacity_splits_eight_then_twelve() {
        let heirs = LayoutRegistry::builtin().section("herederos").unwrap();
        let caps: Vec<usize> = heirs.slots.iter().map(|s| s.capacity).collect();
        assert_eq!(caps, [8, 12]);
        assert_eq!(heirs.capacity(), 20);
    }

    #[test]
    fn builtin_header_repeats_on_three_pages() {
        let registry = LayoutRegistry::builtin();
        let pages: Vec<usize> = registry
            .fields
            .iter()
            .filter(|f| f.path == "oficina")
            .map(|f| f.page)
            .collect();
        assert_eq!(pages, [0, 2, 3]);
    }

    #[test]
    fn unknown_field_path_is_rejected() {
        let mut registry = LayoutRegistry::builtin().clone();
        registry.fields.push(FieldSpec {
            path: "no_such_field".into(),
            page: 0,
            x: 10.0,
            y: 10.0,
            size: None,
        });
        let err = registry.validate().unwrap_err();
        assert!(err.to_string().contains("no_such_field"), "{err}");
    }

    #[test]
    fn unknown_section_column_is_rejected() {
        let mut registry = LayoutRegistry::builtin().clone();
        registry.sections[1].columns.push(ColumnSpec {
            name: "telefono".into(),
            x: 10.0,
            size: None,
        });
        assert!(registry.validate().is_err());
    }

    #[test]
    fn zero_capacity_slot_is_rejected() {
        let mut registry = LayoutRegistry::builtin().clone();
        registry.sections[0].slots[0].capacity = 0;
        assert!(registry.validate().is_err());
    }

    #[test]
    fn field_outside_base_pages_is_rejected() {
        let mut registry = LayoutRegistry::builtin().clone();
        registry.fields[0].page = 7;
        assert!(registry.validate().is_err());
    }

    #[test]
    fn inverted_annex_margins_are_rejected() {
        let mut registry = LayoutRegistry::builtin().clone();
        registry.annex.bottom_y = registry.annex.top_y + 1.0;
        assert!(registry.validate().is_err());
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        let err = LayoutRegistry::from_json("{ not json").unwrap_err();
        assert!(matches!(err, RegistryError::Parse(_)));
    }

    #[test]
    fn registry_round_trips_through_serde() {
        let registry = LayoutRegistry::builtin();
        let json = serde_json::to_string(registry).unwrap();
        let back = LayoutRegistry::from_json(&json).unwrap();
        assert_eq!(&back, registry);
    }
}
