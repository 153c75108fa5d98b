//! Form-filling pass over the template PDF
//!
//! `render_case` stamps a complete estate record onto the four base
//! pages of the Formulario 2.1 template: fixed header fields, the
//! inventory tables, section and summary totals, and the tax
//! declaration checkbox. Sections that outgrow their registry slots
//! continue on appended annex pages. Every coordinate goes through the
//! registry's rotation strategy, so the same layout drives both
//! upright and rotated templates.

use tracing::{debug, warn};

use crate::error::RenderError;
use crate::fields::{self, Category};
use crate::format::group_thousands;
use crate::geometry::DesignPoint;
use crate::model::{EstateCase, TaxDeclaration};
use crate::overflow::{self, AnnexBuilder};
use crate::pdf::{FormDocument, PageText};
use crate::registry::{FieldPos, LayoutRegistry, SectionSpec};
use crate::totals;

/// Row text standing in for the itemized household inventory when the
/// statutory 20% presumption is claimed.
const PRESUMPTION_LABEL: &str = "Según presunción 20%";

/// Fill the template with one estate record and return the finished
/// document bytes.
pub fn render_case(
    template: &[u8],
    case: &EstateCase,
    registry: &LayoutRegistry,
) -> Result<Vec<u8>, RenderError> {
    let mut form = FormDocument::load(template)?;
    if form.page_count() < registry.base_pages {
        return Err(RenderError::PageCount {
            expected: registry.base_pages,
            found: form.page_count(),
        });
    }
    check_page_sizes(&form, registry);

    let mut pages: Vec<PageText> = (0..registry.base_pages).map(|_| PageText::new()).collect();

    draw_fixed_fields(&mut pages, case, registry);

    let totals = totals::compute(case, registry);
    let mut annex = AnnexBuilder::new(&registry.annex);
    for section in registry.sections() {
        let Some(category) = Category::from_name(&section.name) else {
            warn!(section = %section.name, "layout names an unknown section");
            continue;
        };
        draw_section(&mut pages, &mut annex, case, registry, section, category);
        if let (Some(pos), Some(total)) = (section.total, totals::section_total(&totals, category))
        {
            draw_pos(&mut pages, registry, pos, &group_thousands(total));
        }
    }

    let summary = &registry.summary;
    draw_pos(&mut pages, registry, summary.total_activos, &group_thousands(totals.total_activos));
    draw_pos(&mut pages, registry, summary.total_pasivos, &group_thousands(totals.total_pasivos));
    draw_pos(
        &mut pages,
        registry,
        summary.masa_hereditaria,
        &group_thousands(totals.masa_hereditaria),
    );

    let declaration = match case.declaracion_impuesto {
        TaxDeclaration::Exentas => registry.declaration.exentas,
        TaxDeclaration::AfectasAlgunas => registry.declaration.afectas_algunas,
        TaxDeclaration::AfectasTodas => registry.declaration.afectas_todas,
    };
    draw_pos(&mut pages, registry, declaration, "X");

    let annex_pages = annex.finish();
    let appended = annex_pages.len();
    for annex_page in &annex_pages {
        let mut text = PageText::new();
        for line in &annex_page.lines {
            let at = registry
                .strategy
                .project(DesignPoint::new(registry.annex.left_x, line.y), registry.page);
            text.draw(at, line.size, &line.text);
        }
        form.append_page(registry.annex.media_box, registry.annex.rotate, text)?;
    }

    for (index, text) in pages.into_iter().enumerate() {
        form.apply_text(index, text)?;
    }
    debug!(base = registry.base_pages, annex = appended, "form filled");
    form.finish()
}

/// Warn when template page sizes disagree with the layout geometry.
/// Rotated templates report transposed dimensions, so both readings
/// are accepted.
fn check_page_sizes(form: &FormDocument, registry: &LayoutRegistry) {
    for index in 0..registry.base_pages {
        let Some((width, height)) = form.media_box(index) else {
            continue;
        };
        let (w, h) = (registry.page.width, registry.page.height);
        let direct = (width - w).abs() <= 0.5 && (height - h).abs() <= 0.5;
        let transposed = (width - h).abs() <= 0.5 && (height - w).abs() <= 0.5;
        if !direct && !transposed {
            warn!(page = index, width, height, "template page size differs from layout geometry");
        }
    }
}

fn draw_fixed_fields(pages: &mut [PageText], case: &EstateCase, registry: &LayoutRegistry) {
    for field in &registry.fields {
        let Some(value) = fields::resolve_field(case, &field.path) else {
            warn!(path = %field.path, "layout references an unknown field path");
            continue;
        };
        if value.is_empty() {
            continue;
        }
        let size = field.size.unwrap_or(registry.font.size);
        let at = registry.strategy.project(DesignPoint::new(field.x, field.y), registry.page);
        if let Some(page) = pages.get_mut(field.page) {
            page.draw(at, size, &value);
        }
    }
}

/// Draw one inventory section: inline rows into the registry slots,
/// the overflow marker when items continue, and the continued items
/// into the annex.
fn draw_section(
    pages: &mut [PageText],
    annex: &mut AnnexBuilder<'_>,
    case: &EstateCase,
    registry: &LayoutRegistry,
    section: &SectionSpec,
    category: Category,
) {
    if category == Category::Menaje && case.presuncion_20 {
        draw_presumed_household(pages, case, registry, section);
        return;
    }

    let capacities: Vec<usize> = section.slots.iter().map(|slot| slot.capacity).collect();
    let plan = overflow::plan_section(fields::section_len(case, category), &capacities);

    for (slot, range) in section.slots.iter().zip(plan.slots.iter()) {
        for (row, item) in range.clone().enumerate() {
            let Some(cells) = fields::section_row(case, category, item) else {
                continue;
            };
            let y = slot.start_y - row as f64 * slot.row_height;
            for (name, value) in cells {
                if value.is_empty() {
                    continue;
                }
                let Some(column) = section.column(name) else {
                    continue;
                };
                let size = column.size.unwrap_or(section.font_size);
                let at = registry.strategy.project(DesignPoint::new(column.x, y), registry.page);
                if let Some(page) = pages.get_mut(slot.page) {
                    page.draw(at, size, &value);
                }
            }
        }
    }

    if let Some(marker) = plan.marker {
        let slot = section.slots[marker.slot];
        if let Some(column) = section.columns.first() {
            let y = slot.start_y - marker.row as f64 * slot.row_height;
            let at = registry.strategy.project(DesignPoint::new(column.x, y), registry.page);
            if let Some(page) = pages.get_mut(slot.page) {
                page.draw(at, section.font_size, &overflow::marker_text(marker.hidden));
            }
        }
        annex.heading(&section.label);
        for item in plan.overflow.clone() {
            if let Some(line) = fields::annex_line(case, category, item) {
                annex.line(line);
            }
        }
        annex.gap();
    }
}

/// Under the 20% presumption the household inventory is not
/// enumerated: a single synthesized row carries the presumed total and
/// any itemized entries are ignored.
fn draw_presumed_household(
    pages: &mut [PageText],
    case: &EstateCase,
    registry: &LayoutRegistry,
    section: &SectionSpec,
) {
    let Some(slot) = section.slots.first() else {
        return;
    };
    let total = totals::presumed_household_total(case);
    let cells = [
        ("numero", "1".to_string()),
        ("descripcion", PRESUMPTION_LABEL.to_string()),
        ("valoracion", group_thousands(total)),
    ];
    for (name, value) in cells {
        let Some(column) = section.column(name) else {
            continue;
        };
        let size = column.size.unwrap_or(section.font_size);
        let at = registry
            .strategy
            .project(DesignPoint::new(column.x, slot.start_y), registry.page);
        if let Some(page) = pages.get_mut(slot.page) {
            page.draw(at, size, &value);
        }
    }
}

fn draw_pos(pages: &mut [PageText], registry: &LayoutRegistry, pos: FieldPos, text: &str) {
    let size = pos.size.unwrap_or(registry.font.size);
    let at = registry.strategy.project(DesignPoint::new(pos.x, pos.y), registry.page);
    if let Some(page) = pages.get_mut(pos.page) {
        page.draw(at, size, text);
    }
}
