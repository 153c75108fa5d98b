//! Inline/overflow split and continuation-page layout
//!
//! A section's items fill its registry slots in order until capacity
//! runs out; the remainder continues on appended annex pages, never
//! dropped. Planning is pure arithmetic over item counts, and the
//! annex builder produces positioned lines in design space so the
//! renderer can project them exactly like any other field.

use std::ops::Range;

use crate::registry::AnnexSpec;

/// How one section's items distribute over its slots and the annex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionPlan {
    /// Item index range placed in each registry slot, in slot order.
    pub slots: Vec<Range<usize>>,
    /// Item indexes that continue on the annex; empty when all fit.
    pub overflow: Range<usize>,
    /// Marker position, present exactly when `overflow` is non-empty.
    pub marker: Option<Marker>,
}

/// Position of the "+K más, ver anexo" row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    /// Index of the registry slot carrying the marker.
    pub slot: usize,
    /// Row position inside that slot, immediately after the final
    /// inline row.
    pub row: usize,
    /// Count of items continued on the annex.
    pub hidden: usize,
}

/// Distribute `total` items over slots with the given capacities.
pub fn plan_section(total: usize, capacities: &[usize]) -> SectionPlan {
    let mut slots = Vec::with_capacity(capacities.len());
    let mut next = 0usize;
    for &capacity in capacities {
        let take = capacity.min(total.saturating_sub(next));
        slots.push(next..next + take);
        next += take;
    }
    let overflow = next..total;
    let marker = if overflow.is_empty() {
        None
    } else {
        slots
            .iter()
            .rposition(|rows| !rows.is_empty())
            .map(|slot| Marker {
                slot,
                row: slots[slot].len(),
                hidden: overflow.len(),
            })
    };
    SectionPlan { slots, overflow, marker }
}

/// The inline marker row text.
pub fn marker_text(hidden: usize) -> String {
    format!("+{hidden} más, ver anexo")
}

/// One positioned annex line; `y` is design-space, x is the annex's
/// left margin.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnexLine {
    pub y: f64,
    pub size: f64,
    pub text: String,
}

/// One appended page worth of annex lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnexPage {
    pub lines: Vec<AnnexLine>,
}

/// Accumulates labeled continuation blocks into pages, breaking to a
/// fresh page whenever the cursor passes the bottom margin. Arbitrary
/// item counts produce arbitrarily many pages.
pub struct AnnexBuilder<'a> {
    spec: &'a AnnexSpec,
    pages: Vec<AnnexPage>,
    cursor: f64,
}

impl<'a> AnnexBuilder<'a> {
    pub fn new(spec: &'a AnnexSpec) -> Self {
        Self { spec, pages: Vec::new(), cursor: 0.0 }
    }

    /// Start a labeled continuation block. The heading stays attached
    /// to at least one following line.
    pub fn heading(&mut self, label: &str) {
        if !self.pages.is_empty() && self.cursor - self.spec.line_height < self.spec.bottom_y {
            self.start_page();
        }
        self.push(format!("{label} (continuación)"), self.spec.heading_size);
    }

    /// Append one item line to the current block.
    pub fn line(&mut self, text: String) {
        self.push(text, self.spec.font_size);
    }

    /// Vertical gap between blocks.
    pub fn gap(&mut self) {
        if !self.pages.is_empty() {
            self.cursor -= self.spec.line_height;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn finish(self) -> Vec<AnnexPage> {
        self.pages
    }

    fn start_page(&mut self) {
        self.pages.push(AnnexPage {
            lines: vec![AnnexLine {
                y: self.spec.top_y,
                size: self.spec.heading_size,
                text: self.spec.title.clone(),
            }],
        });
        self.cursor = self.spec.top_y - 2.0 * self.spec.line_height;
    }

    fn push(&mut self, text: String, size: f64) {
        if self.pages.is_empty() || self.cursor < self.spec.bottom_y {
            self.start_page();
        }
        let y = self.cursor;
        self.cursor -= self.spec.line_height;
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(AnnexLine { y, size, text });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn annex_spec() -> AnnexSpec {
        AnnexSpec {
            media_box: [612.0, 792.0],
            rotate: 90,
            title: "ANEXO".into(),
            left_x: 40.0,
            top_y: 100.0,
            bottom_y: 20.0,
            line_height: 10.0,
            font_size: 8.0,
            heading_size: 9.0,
        }
    }

    #[test]
    fn inline_and_overflow_counts_for_all_small_sizes() {
        let capacity = 4;
        for total in 0..=50 {
            let plan = plan_section(total, &[capacity]);
            assert_eq!(plan.slots[0].len(), total.min(capacity), "total {total}");
            assert_eq!(plan.overflow.len(), total.saturating_sub(capacity), "total {total}");
            assert_eq!(plan.marker.is_some(), total > capacity, "total {total}");
        }
    }

    #[test]
    fn items_fill_slots_in_order() {
        let plan = plan_section(5, &[8, 12]);
        assert_eq!(plan.slots, vec![0..5, 5..5]);
        assert_eq!(plan.overflow, 5..5);
        assert_eq!(plan.marker, None);

        let plan = plan_section(20, &[8, 12]);
        assert_eq!(plan.slots, vec![0..8, 8..20]);
        assert_eq!(plan.overflow, 20..20);
        assert_eq!(plan.marker, None);
    }

    #[test]
    fn overflow_fills_every_slot_and_marks_after_the_last_row() {
        let plan = plan_section(25, &[8, 12]);
        assert_eq!(plan.slots, vec![0..8, 8..20]);
        assert_eq!(plan.overflow, 20..25);
        assert_eq!(plan.marker, Some(Marker { slot: 1, row: 12, hidden: 5 }));
    }

    #[test]
    fn marker_text_names_the_hidden_count() {
        assert_eq!(marker_text(5), "+5 más, ver anexo");
    }

    #[test]
    fn every_annex_page_opens_with_the_title() {
        let spec = annex_spec();
        let mut builder = AnnexBuilder::new(&spec);
        builder.heading("Pasivos");
        for i in 0..10 {
            builder.line(format!("line {i}"));
        }
        let pages = builder.finish();
        assert!(pages.len() > 1);
        for page in &pages {
            assert_eq!(page.lines[0].text, "ANEXO");
            assert_eq!(page.lines[0].y, 100.0);
        }
    }

    #[test]
    fn cursor_descends_and_breaks_at_the_bottom_margin() {
        let spec = annex_spec();
        let mut builder = AnnexBuilder::new(&spec);
        builder.heading("Pasivos");
        for i in 0..20 {
            builder.line(format!("line {i}"));
        }
        let pages = builder.finish();
        for page in &pages {
            let mut previous = f64::INFINITY;
            for line in &page.lines {
                assert!(line.y < previous);
                assert!(line.y >= spec.bottom_y);
                previous = line.y;
            }
        }
        // Every line landed somewhere, in order.
        let texts: Vec<&str> = pages
            .iter()
            .flat_map(|p| p.lines.iter())
            .filter(|l| l.text.starts_with("line "))
            .map(|l| l.text.as_str())
            .collect();
        let expected: Vec<String> = (0..20).map(|i| format!("line {i}")).collect();
        assert_eq!(texts, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn heading_near_the_bottom_starts_a_fresh_page() {
        let spec = annex_spec();
        let mut builder = AnnexBuilder::new(&spec);
        builder.heading("Vehículos");
        // Fill to one line above the break point.
        for i in 0..5 {
            builder.line(format!("v{i}"));
        }
        builder.gap();
        builder.heading("Pasivos");
        builder.line("p0".into());
        let pages = builder.finish();
        // The second heading must share a page with its first line.
        for page in &pages {
            if let Some(pos) = page.lines.iter().position(|l| l.text == "Pasivos (continuación)") {
                assert!(page.lines.get(pos + 1).map(|l| l.text.as_str()) == Some("p0"));
            }
        }
    }

    #[test]
    fn thousand_lines_span_many_pages_in_order() {
        let spec = annex_spec();
        let mut builder = AnnexBuilder::new(&spec);
        builder.heading("Pasivos");
        for i in 0..1000 {
            builder.line(format!("{}. deuda {i}", i + 1));
        }
        let pages = builder.finish();
        assert!(pages.len() > 1);
        let mut seen = 0usize;
        for page in &pages {
            for line in &page.lines {
                if let Some(rest) = line.text.strip_prefix(&format!("{}. ", seen + 1)) {
                    assert_eq!(rest, format!("deuda {seen}"));
                    seen += 1;
                }
            }
        }
        assert_eq!(seen, 1000);
    }
}
