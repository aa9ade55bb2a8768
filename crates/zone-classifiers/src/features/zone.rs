//! Feature calculators over zones, with the containing page as context.
use crate::error::{ClassifierError, Result};
use crate::features::{FeatureCalculator, FeatureVectorBuilder, FnFeature};
use crate::structure::{Page, PageStatistics, Zone};

pub type ZoneFeatureBuilder = FeatureVectorBuilder<Zone, Page>;

/// The default zone feature schema.
///
/// Changing the list or its order changes the schema and makes previously
/// trained models incompatible.
pub fn initial_zone_features() -> ZoneFeatureBuilder {
    FeatureVectorBuilder::new()
        .with(FnFeature::new("x_position", x_position))
        .with(FnFeature::new("y_position", y_position))
        .with(FnFeature::new("relative_width", relative_width))
        .with(FnFeature::new("relative_height", relative_height))
        .with(FnFeature::new("relative_area", relative_area))
        .with(FnFeature::new("line_count", line_count))
        .with(FnFeature::new("char_count", char_count))
        .with(FnFeature::new("uppercase_ratio", uppercase_ratio))
        .with(FnFeature::new("digit_ratio", digit_ratio))
        .with(FnFeature::new("contains_at_sign", contains_at_sign))
        .with(FnFeature::new("reference_marker", reference_marker))
        .with(FnFeature::new("first_page", first_page))
        .with(FnFeature::new("relative_line_height", relative_line_height))
        .with(FnFeature::new("relative_font_size", relative_font_size))
        .with(FnFeature::new("dominant_page_font", dominant_page_font))
        .with(KeywordFeature::new("abstract_keyword", &["abstract", "summary"]))
        .with(KeywordFeature::new("keywords_keyword", &["keywords", "key words", "index terms"]))
        .with(KeywordFeature::new("references_keyword", &["references", "bibliography", "literature"]))
}

/// The default schema followed by a font-code feature over `known_fonts`.
pub fn zone_features_with_fonts(known_fonts: Vec<String>) -> ZoneFeatureBuilder {
    initial_zone_features().with(FontCodeFeature::new(known_fonts))
}

fn page_dimension(value: f64, feature: &str) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ClassifierError::feature(
            feature,
            format!("page has a degenerate dimension ({})", value),
        ))
    }
}

fn page_statistics<'a>(page: &'a Page, feature: &str) -> Result<&'a PageStatistics> {
    page.statistics().ok_or_else(|| {
        ClassifierError::feature(
            feature,
            format!("statistics of page {} have not been resolved", page.number),
        )
    })
}

fn ratio(zone: &Zone, among: fn(char) -> bool, matching: fn(char) -> bool) -> f64 {
    let mut total = 0usize;
    let mut hits = 0usize;
    for c in zone.lines.iter().flat_map(|l| l.text.chars()) {
        if among(c) {
            total += 1;
            if matching(c) {
                hits += 1;
            }
        }
    }
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

fn x_position(zone: &Zone, page: &Page) -> Result<f64> {
    Ok(zone.bounds.x / page_dimension(page.bounds.width, "x_position")?)
}

fn y_position(zone: &Zone, page: &Page) -> Result<f64> {
    Ok(zone.bounds.y / page_dimension(page.bounds.height, "y_position")?)
}

fn relative_width(zone: &Zone, page: &Page) -> Result<f64> {
    Ok(zone.bounds.width / page_dimension(page.bounds.width, "relative_width")?)
}

fn relative_height(zone: &Zone, page: &Page) -> Result<f64> {
    Ok(zone.bounds.height / page_dimension(page.bounds.height, "relative_height")?)
}

fn relative_area(zone: &Zone, page: &Page) -> Result<f64> {
    Ok(zone.bounds.area() / page_dimension(page.bounds.area(), "relative_area")?)
}

fn line_count(zone: &Zone, _page: &Page) -> Result<f64> {
    Ok(zone.lines.len() as f64)
}

fn char_count(zone: &Zone, _page: &Page) -> Result<f64> {
    Ok(zone
        .lines
        .iter()
        .flat_map(|l| l.text.chars())
        .filter(|c| !c.is_whitespace())
        .count() as f64)
}

fn uppercase_ratio(zone: &Zone, _page: &Page) -> Result<f64> {
    Ok(ratio(zone, |c| c.is_alphabetic(), |c| c.is_uppercase()))
}

fn digit_ratio(zone: &Zone, _page: &Page) -> Result<f64> {
    Ok(ratio(zone, |c| !c.is_whitespace(), |c| c.is_ascii_digit()))
}

fn contains_at_sign(zone: &Zone, _page: &Page) -> Result<f64> {
    let found = zone.lines.iter().any(|l| l.text.contains('@'));
    Ok(if found { 1.0 } else { 0.0 })
}

/// 1 when the zone opens like a numbered bibliography entry: `[12]`, `12.` or `12)`.
fn reference_marker(zone: &Zone, _page: &Page) -> Result<f64> {
    let text = zone.lines.first().map(|l| l.text.trim_start()).unwrap_or("");
    let body = text.strip_prefix('[').unwrap_or(text);
    let digits = body.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return Ok(0.0);
    }
    let next = body[digits..].chars().next();
    let closes = if text.starts_with('[') {
        next == Some(']')
    } else {
        matches!(next, Some('.') | Some(')'))
    };
    Ok(if closes { 1.0 } else { 0.0 })
}

fn first_page(_zone: &Zone, page: &Page) -> Result<f64> {
    Ok(if page.number == 0 { 1.0 } else { 0.0 })
}

fn relative_line_height(zone: &Zone, page: &Page) -> Result<f64> {
    const NAME: &str = "relative_line_height";
    let zone_height = zone
        .mean_line_height()
        .ok_or_else(|| ClassifierError::feature(NAME, "zone has no lines"))?;
    let page_height = page_statistics(page, NAME)?
        .mean_line_height
        .ok_or_else(|| ClassifierError::feature(NAME, "page has no line height statistic"))?;
    Ok(zone_height / page_dimension(page_height, NAME)?)
}

fn relative_font_size(zone: &Zone, page: &Page) -> Result<f64> {
    const NAME: &str = "relative_font_size";
    let zone_size = zone
        .mean_font_size()
        .ok_or_else(|| ClassifierError::feature(NAME, "zone lines carry no font size"))?;
    let page_size = page_statistics(page, NAME)?
        .dominant_font_size
        .ok_or_else(|| ClassifierError::feature(NAME, "page has no dominant font size"))?;
    Ok(zone_size / page_dimension(page_size, NAME)?)
}

fn dominant_page_font(zone: &Zone, page: &Page) -> Result<f64> {
    const NAME: &str = "dominant_page_font";
    let zone_font = zone
        .dominant_font()
        .ok_or_else(|| ClassifierError::feature(NAME, "zone lines carry no font name"))?;
    let page_font = page_statistics(page, NAME)?
        .dominant_font
        .as_deref()
        .ok_or_else(|| ClassifierError::feature(NAME, "page has no dominant font"))?;
    Ok(if zone_font == page_font { 1.0 } else { 0.0 })
}

/// 1 when the zone text starts with one of the keywords, ignoring case.
pub struct KeywordFeature {
    name: &'static str,
    keywords: &'static [&'static str],
}

impl KeywordFeature {
    pub fn new(name: &'static str, keywords: &'static [&'static str]) -> Self {
        Self { name, keywords }
    }
}

impl FeatureCalculator<Zone, Page> for KeywordFeature {
    fn name(&self) -> &str {
        self.name
    }

    fn calculate(&self, zone: &Zone, _page: &Page) -> Result<f64> {
        let text = zone.text();
        let text = text.trim_start().to_lowercase();
        let found = self.keywords.iter().any(|k| text.starts_with(k));
        Ok(if found { 1.0 } else { 0.0 })
    }
}

/// Encodes the zone's dominant font as its rank among known fonts.
///
/// `known_fonts` is ordered by prior frequency. Fonts not in the list map to
/// `known_fonts.len()`.
pub struct FontCodeFeature {
    known_fonts: Vec<String>,
}

impl FontCodeFeature {
    pub fn new(known_fonts: Vec<String>) -> Self {
        Self { known_fonts }
    }

    pub fn code(&self, font: &str) -> usize {
        self.known_fonts
            .iter()
            .position(|known| known == font)
            .unwrap_or(self.known_fonts.len())
    }
}

impl FeatureCalculator<Zone, Page> for FontCodeFeature {
    fn name(&self) -> &str {
        "font_code"
    }

    fn calculate(&self, zone: &Zone, _page: &Page) -> Result<f64> {
        let font = zone
            .dominant_font()
            .ok_or_else(|| ClassifierError::feature("font_code", "zone lines carry no font name"))?;
        Ok(self.code(font) as f64)
    }
}
