//! Segmented document structure: documents, pages, zones and lines.
//!
//! Layout segmentation happens upstream; this module only holds its output
//! and the per-page statistics feature calculators depend on.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::labels::Label;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub text: String,
    pub bounds: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
}

impl Line {
    /// Number of non-whitespace characters, used to weight font statistics.
    fn weight(&self) -> usize {
        self.text.chars().filter(|c| !c.is_whitespace()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    pub bounds: BoundingBox,
    #[serde(default)]
    pub lines: Vec<Line>,
}

impl Zone {
    pub fn new(label: Option<Label>, bounds: BoundingBox, lines: Vec<Line>) -> Self {
        Self {
            label,
            bounds,
            lines,
        }
    }

    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Most frequent font in the zone, weighted by character count.
    pub fn dominant_font(&self) -> Option<&str> {
        dominant_font(self.lines.iter())
    }

    /// Character-weighted mean font size of the lines that carry one.
    pub fn mean_font_size(&self) -> Option<f64> {
        weighted_font_size(self.lines.iter())
    }

    pub fn mean_line_height(&self) -> Option<f64> {
        mean_line_height(self.lines.iter())
    }
}

/// Page-level statistics that must be resolved before features are computed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageStatistics {
    pub dominant_font: Option<String>,
    pub dominant_font_size: Option<f64>,
    pub mean_line_height: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Zero-based position of the page in its document.
    #[serde(default)]
    pub number: usize,
    pub bounds: BoundingBox,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<PageStatistics>,
}

impl Page {
    pub fn new(number: usize, bounds: BoundingBox, zones: Vec<Zone>) -> Self {
        Self {
            number,
            bounds,
            zones,
            statistics: None,
        }
    }

    fn lines(&self) -> impl Iterator<Item = &Line> {
        self.zones.iter().flat_map(|z| z.lines.iter())
    }

    /// Compute the page statistics from the page's lines, replacing any previous value.
    pub fn resolve_statistics(&mut self) {
        let statistics = PageStatistics {
            dominant_font: dominant_font(self.lines()).map(str::to_string),
            dominant_font_size: dominant_font_size(self.lines()),
            mean_line_height: mean_line_height(self.lines()),
        };
        self.statistics = Some(statistics);
    }

    pub fn statistics(&self) -> Option<&PageStatistics> {
        self.statistics.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { id: None, pages }
    }

    pub fn resolve_statistics(&mut self) {
        for page in self.pages.iter_mut() {
            page.resolve_statistics();
        }
    }

    /// All zones of the document paired with their page, in reading order.
    pub fn zones(&self) -> impl Iterator<Item = (&Page, &Zone)> {
        self.pages
            .iter()
            .flat_map(|page| page.zones.iter().map(move |zone| (page, zone)))
    }
}

fn dominant_font<'a>(lines: impl Iterator<Item = &'a Line>) -> Option<&'a str> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for line in lines {
        if let Some(font) = line.font_name.as_deref() {
            *counts.entry(font).or_insert(0) += line.weight();
        }
    }
    // BTreeMap iteration is sorted, so ties resolve to the smallest font name.
    let mut best: Option<(&str, usize)> = None;
    for (font, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((font, count)),
        }
    }
    best.map(|(font, _)| font)
}

fn dominant_font_size<'a>(lines: impl Iterator<Item = &'a Line>) -> Option<f64> {
    // Sizes are bucketed to a tenth of a point.
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for line in lines {
        if let Some(size) = line.font_size.filter(|s| s.is_finite()) {
            *counts.entry((size * 10.0).round() as i64).or_insert(0) += line.weight();
        }
    }
    let mut best: Option<(i64, usize)> = None;
    for (bucket, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((bucket, count)),
        }
    }
    best.map(|(bucket, _)| bucket as f64 / 10.0)
}

fn weighted_font_size<'a>(lines: impl Iterator<Item = &'a Line>) -> Option<f64> {
    let mut total = 0.0;
    let mut weight = 0usize;
    for line in lines {
        if let Some(size) = line.font_size {
            let w = line.weight().max(1);
            total += size * w as f64;
            weight += w;
        }
    }
    if weight == 0 {
        None
    } else {
        Some(total / weight as f64)
    }
}

fn mean_line_height<'a>(lines: impl Iterator<Item = &'a Line>) -> Option<f64> {
    let mut total = 0.0;
    let mut count = 0usize;
    for line in lines {
        total += line.bounds.height;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, font: &str, size: f64, height: f64) -> Line {
        Line {
            text: text.to_string(),
            bounds: BoundingBox::new(0.0, 0.0, 100.0, height),
            font_name: Some(font.to_string()),
            font_size: Some(size),
        }
    }

    #[test]
    fn dominant_font_is_weighted_by_characters() {
        let zone = Zone::new(
            None,
            BoundingBox::default(),
            vec![
                line("a", "Bold", 12.0, 10.0),
                line("b", "Bold", 12.0, 10.0),
                line("a much longer line of text", "Regular", 10.0, 10.0),
            ],
        );
        assert_eq!(zone.dominant_font(), Some("Regular"));
    }

    #[test]
    fn page_statistics_are_unresolved_until_requested() {
        let zone = Zone::new(
            None,
            BoundingBox::default(),
            vec![line("text", "Regular", 10.0, 8.0), line("more text", "Regular", 10.0, 12.0)],
        );
        let mut page = Page::new(0, BoundingBox::new(0.0, 0.0, 600.0, 800.0), vec![zone]);
        assert!(page.statistics().is_none());

        page.resolve_statistics();
        let stats = page.statistics().unwrap();
        assert_eq!(stats.dominant_font.as_deref(), Some("Regular"));
        assert_eq!(stats.dominant_font_size, Some(10.0));
        assert_eq!(stats.mean_line_height, Some(10.0));
    }

    #[test]
    fn empty_page_resolves_to_missing_values() {
        let mut page = Page::new(0, BoundingBox::new(0.0, 0.0, 600.0, 800.0), vec![]);
        page.resolve_statistics();
        let stats = page.statistics().unwrap();
        assert!(stats.dominant_font.is_none());
        assert!(stats.mean_line_height.is_none());
    }
}
