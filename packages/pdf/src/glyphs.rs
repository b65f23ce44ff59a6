//! Positioned text, collected from `pdf-extract`'s content stream
//! interpreter.
//!
//! `pdf-extract` decodes fonts (simple encodings, `Differences`, `ToUnicode`
//! maps and CID fonts), follows form XObjects and applies the text matrix.
//! [`GlyphCollector`] receives every decoded character with its text
//! rendering matrix and records where it lands on the page.

use std::collections::BTreeMap;

use pdf_extract::{Document, MediaBox, OutputDev, OutputError, Transform};

/// One decoded character, in points from the top-left corner of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Decoded text; usually one character, several for ligatures.
    pub text: String,
    /// Left edge.
    pub x: f64,
    /// Baseline, measured downwards from the top of the page.
    pub baseline: f64,
    /// Horizontal advance.
    pub width: f64,
    /// Effective font size after the text and page matrices.
    pub size: f64,
}

impl Glyph {
    #[must_use]
    pub const fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn center_x(&self) -> f64 {
        self.width.mul_add(0.5, self.x)
    }

    /// Vertical centre of the glyph's em box.
    #[must_use]
    pub fn center_y(&self) -> f64 {
        self.size.mul_add(-0.5, self.baseline)
    }
}

/// [`OutputDev`] that keeps every character with its position, per page.
#[derive(Debug, Default)]
pub struct GlyphCollector {
    pages: BTreeMap<u32, Vec<Glyph>>,
    page: u32,
    page_top: f64,
    current: Vec<Glyph>,
}

impl GlyphCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Glyphs of every page seen so far, keyed by 1-based page number.
    #[must_use]
    pub fn into_pages(self) -> BTreeMap<u32, Vec<Glyph>> {
        self.pages
    }
}

impl OutputDev for GlyphCollector {
    fn begin_page(
        &mut self,
        page_num: u32,
        media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        self.page = page_num;
        self.page_top = media_box.ury;
        self.current.clear();
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        self.pages
            .insert(self.page, std::mem::take(&mut self.current));
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> Result<(), OutputError> {
        if char.is_empty() {
            return Ok(());
        }

        // `trm` maps text space to user space; `width` is in text space
        // units per unit of font size.
        let scale_x = trm.m11.hypot(trm.m12);
        let scale_y = trm.m21.hypot(trm.m22);

        self.current.push(Glyph {
            text: char.to_owned(),
            x: trm.m31,
            baseline: self.page_top - trm.m32,
            width: width * font_size * scale_x,
            size: font_size * scale_y,
        });
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Runs `pdf-extract` over every page of `document`.
///
/// # Errors
///
/// Returns [`OutputError`] if a content stream cannot be decoded.
pub fn document_glyphs(document: &Document) -> Result<BTreeMap<u32, Vec<Glyph>>, OutputError> {
    let mut collector = GlyphCollector::new();
    pdf_extract::output_doc(document, &mut collector)?;
    Ok(collector.into_pages())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Cell, FontEncoding, Placement, TextStyle, styled_table_pdf, table_pdf};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn glyphs_of(bytes: &[u8]) -> Vec<Glyph> {
        let document = Document::load_mem(bytes).unwrap();
        document_glyphs(&document)
            .unwrap()
            .remove(&1)
            .unwrap_or_default()
    }

    fn positions(glyphs: &[Glyph]) -> Vec<(String, f64, f64)> {
        glyphs
            .iter()
            .filter(|g| !g.text.trim().is_empty())
            .map(|g| (g.text.clone(), g.x, g.baseline))
            .collect()
    }

    #[test]
    fn courier_glyphs_advance_six_points_at_ten() {
        let bytes = table_pdf(&[vec![Cell::new(50, 100, "AB C")]]).unwrap();
        let glyphs = glyphs_of(&bytes);

        let xs: Vec<f64> = glyphs.iter().map(|g| g.x).collect();
        assert_eq!(glyphs.len(), 4);
        for (x, expected) in xs.iter().zip([50.0, 56.0, 62.0, 68.0]) {
            assert!(approx(*x, expected), "{xs:?}");
        }
        for glyph in &glyphs {
            assert!(approx(glyph.baseline, 100.0));
            assert!(approx(glyph.size, 10.0));
            assert!(approx(glyph.width, 6.0));
        }
    }

    #[test]
    fn text_matrix_scale_applies_to_size_and_width() {
        let style = TextStyle {
            placement: Placement::Scaled,
            ..TextStyle::default()
        };
        let bytes = styled_table_pdf(&[vec![Cell::new(50, 100, "AB")]], style).unwrap();
        let glyphs = glyphs_of(&bytes);

        assert_eq!(glyphs.len(), 2);
        assert!(approx(glyphs[1].x, 56.0));
        assert!(approx(glyphs[0].size, 10.0));
        assert!(approx(glyphs[0].width, 6.0));
        assert!(approx(glyphs[0].baseline, 100.0));
    }

    #[test]
    fn every_placement_lands_in_the_same_spot() {
        let page = vec![Cell::new(50, 100, "ANA SOUZA"), Cell::new(150, 120, "1001")];
        let plain = positions(&glyphs_of(&table_pdf(&[page.clone()]).unwrap()));

        for placement in [Placement::Kerned, Placement::Scaled, Placement::Form] {
            let style = TextStyle {
                placement,
                ..TextStyle::default()
            };
            let other = positions(&glyphs_of(
                &styled_table_pdf(&[page.clone()], style).unwrap(),
            ));

            assert_eq!(other.len(), plain.len(), "{placement:?}");
            for (a, b) in other.iter().zip(&plain) {
                assert_eq!(a.0, b.0, "{placement:?}");
                assert!(
                    approx(a.1, b.1) && approx(a.2, b.2),
                    "{placement:?}: {a:?} vs {b:?}"
                );
            }
        }
    }

    #[test]
    fn win_ansi_accents_are_decoded() {
        let style = TextStyle {
            encoding: FontEncoding::WinAnsi,
            ..TextStyle::default()
        };
        let bytes = styled_table_pdf(&[vec![Cell::new(50, 100, "JOSÉ")]], style).unwrap();
        let text: String = glyphs_of(&bytes).iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "JOSÉ");
    }

    #[test]
    fn identity_h_text_goes_through_to_unicode() {
        let style = TextStyle {
            encoding: FontEncoding::IdentityH,
            ..TextStyle::default()
        };
        let bytes = styled_table_pdf(&[vec![Cell::new(50, 100, "ANA")]], style).unwrap();
        let glyphs = glyphs_of(&bytes);

        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "ANA");
        assert!(approx(glyphs[1].x, 56.0));
    }

    #[test]
    fn pages_are_keyed_by_number() {
        let bytes = table_pdf(&[
            vec![Cell::new(50, 100, "A")],
            vec![],
            vec![Cell::new(50, 100, "B")],
        ])
        .unwrap();
        let document = Document::load_mem(&bytes).unwrap();
        let pages = document_glyphs(&document).unwrap();

        assert_eq!(pages.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(pages[&2].is_empty());
        assert_eq!(pages[&3][0].text, "B");
    }
}
