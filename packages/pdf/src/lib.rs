#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fixed-area table extraction from admission list PDFs.
//!
//! Admission lists are published as text-based PDFs. This crate reads the
//! text of every page with its positions through `pdf-extract`
//! ([`glyphs`]) and rebuilds the table lying inside a configured rectangle
//! ([`text_table`]).
//!
//! The primary entry point is [`PdfDocument`], which implements
//! [`RegionExtractor`]. Extraction goes through `&mut self`: one extractor
//! must not be shared between concurrent jobs.

#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;
pub mod glyphs;
pub mod text_table;

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use chamadas_admission_models::{PartialTable, RegionSpec};
use pdf_extract::{Document, OutputError};

use crate::glyphs::Glyph;

/// Errors specific to PDF extraction.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// The file is not a readable PDF.
    #[error("failed to load PDF {path}: {source}")]
    Load {
        /// Path of the document.
        path: String,
        /// Underlying parser error.
        source: pdf_extract::Error,
    },

    /// A region refers to a page the document does not have.
    #[error("page {page} out of range (document has {pages} page(s))")]
    PageOutOfRange {
        /// Requested 1-based page.
        page: u32,
        /// Number of pages in the document.
        pages: usize,
    },

    /// A content stream could not be decoded.
    #[error("failed to read page text: {0}")]
    Text(#[from] OutputError),

    /// `pdf-extract` gave up on a construct it does not support.
    #[error("unsupported PDF content: {0}")]
    Unsupported(String),
}

/// Extracts the table inside one region of a document.
pub trait RegionExtractor {
    /// Extracts the table inside `region`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the region's page does not exist or cannot
    /// be read.
    fn extract_region(&mut self, region: &RegionSpec) -> Result<PartialTable, PdfError>;
}

/// An opened PDF. Page text is positioned once, on the first extraction,
/// and reused by every region.
#[derive(Debug)]
pub struct PdfDocument {
    document: Document,
    page_count: usize,
    glyphs: Option<BTreeMap<u32, Vec<Glyph>>>,
}

impl PdfDocument {
    /// Opens a PDF file.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Load`] if the file cannot be read or parsed.
    pub fn open(path: &Path) -> Result<Self, PdfError> {
        let document = Document::load(path).map_err(|source| PdfError::Load {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_document(document))
    }

    /// Parses a PDF held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Load`] if the bytes are not a PDF.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let document = Document::load_mem(bytes).map_err(|source| PdfError::Load {
            path: "<memory>".to_owned(),
            source,
        })?;
        Ok(Self::from_document(document))
    }

    fn from_document(document: Document) -> Self {
        let page_count = document.get_pages().len();
        Self {
            document,
            page_count,
            glyphs: None,
        }
    }

    /// Number of pages in the document.
    #[must_use]
    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    /// Returns the positioned glyphs of a 1-based page.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::PageOutOfRange`] for a page the document does
    /// not have, or [`PdfError::Text`]/[`PdfError::Unsupported`] if the
    /// document's text cannot be read.
    pub fn page_glyphs(&mut self, page: u32) -> Result<&[Glyph], PdfError> {
        let pages = match self.glyphs.take() {
            Some(pages) => pages,
            None => {
                let pages = read_glyphs(&self.document)?;
                for (number, glyphs) in &pages {
                    log::debug!("page {number}: {} glyph(s)", glyphs.len());
                }
                pages
            }
        };
        let pages = self.glyphs.insert(pages);

        pages
            .get(&page)
            .map(Vec::as_slice)
            .ok_or(PdfError::PageOutOfRange {
                page,
                pages: self.page_count,
            })
    }
}

/// Runs the glyph collector, turning a panic inside `pdf-extract` into an
/// error so one malformed document does not take the batch down.
fn read_glyphs(document: &Document) -> Result<BTreeMap<u32, Vec<Glyph>>, PdfError> {
    match catch_unwind(AssertUnwindSafe(|| glyphs::document_glyphs(document))) {
        Ok(result) => Ok(result?),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown error".to_owned());
            Err(PdfError::Unsupported(message))
        }
    }
}

impl RegionExtractor for PdfDocument {
    fn extract_region(&mut self, region: &RegionSpec) -> Result<PartialTable, PdfError> {
        let glyphs = self.page_glyphs(region.page)?;
        let table = text_table::extract(glyphs, region);

        log::debug!(
            "page {} [{:.1}, {:.1}, {:.1}, {:.1}]: {} column(s), {} row(s)",
            region.page,
            region.top,
            region.left,
            region.bottom,
            region.right,
            table.columns.len(),
            table.rows.len()
        );

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{
        Cell, FontEncoding, Placement, TextStyle, accented_list_page, admission_list_pages,
        styled_table_pdf, table_pdf, write_table_pdf,
    };

    fn region(page: u32) -> RegionSpec {
        RegionSpec {
            page,
            top: 90.0,
            left: 40.0,
            bottom: 170.0,
            right: 560.0,
        }
    }

    #[test]
    fn extracts_both_admission_list_regions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("UFRJ_2023_1.pdf");
        write_table_pdf(&path, &admission_list_pages()).unwrap();

        let mut pdf = PdfDocument::open(&path).unwrap();
        assert_eq!(pdf.page_count(), 2);

        let first = pdf.extract_region(&region(1)).unwrap();
        assert_eq!(first.columns, vec!["INSCRICAO", "NOME", "CURSO"]);
        assert_eq!(
            first.rows,
            vec![
                vec!["1001", "ANA SOUZA", "MEDICINA"],
                vec!["1002", "BRUNO LIMA", "DIREITO"],
                vec!["1003", "CARLA DIAS", "FISICA"],
            ]
        );

        let second = pdf.extract_region(&region(2)).unwrap();
        assert_eq!(
            second.columns,
            vec!["INSCRICAO", "Unnamed: 1", "CURSO", "CANDIDATO"]
        );
        assert_eq!(
            second.rows,
            vec![
                vec!["1004", "DANIEL REIS", "QUIMICA", ""],
                vec!["1005", "ELISA MOTA", "MEDICINA", ""],
            ]
        );
    }

    #[test]
    fn re_extraction_is_identical() {
        let bytes = table_pdf(&admission_list_pages()).unwrap();

        let mut first = PdfDocument::from_bytes(&bytes).unwrap();
        let mut second = PdfDocument::from_bytes(&bytes).unwrap();

        let a = first.extract_region(&region(1)).unwrap();
        let b = first.extract_region(&region(1)).unwrap();
        let c = second.extract_region(&region(1)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn missing_page_is_an_error() {
        let bytes = table_pdf(&admission_list_pages()).unwrap();
        let mut pdf = PdfDocument::from_bytes(&bytes).unwrap();

        let err = pdf.extract_region(&region(3)).unwrap_err();
        assert!(matches!(err, PdfError::PageOutOfRange { page: 3, pages: 2 }));
    }

    #[test]
    fn garbage_is_not_a_pdf() {
        assert!(matches!(
            PdfDocument::from_bytes(b"<html>not found</html>"),
            Err(PdfError::Load { .. })
        ));
    }

    #[test]
    fn accented_names_survive_every_font_encoding() {
        for encoding in [FontEncoding::WinAnsi, FontEncoding::IdentityH] {
            let style = TextStyle {
                encoding,
                ..TextStyle::default()
            };
            let bytes = styled_table_pdf(&[accented_list_page()], style).unwrap();
            let mut pdf = PdfDocument::from_bytes(&bytes).unwrap();

            let table = pdf.extract_region(&region(1)).unwrap();
            assert_eq!(table.columns, vec!["INSCRICAO", "NOME"], "{encoding:?}");
            assert_eq!(
                table.rows,
                vec![
                    vec!["2001", "JOSÉ ARAÚJO"],
                    vec!["2002", "CONCEIÇÃO GONÇALVES"],
                ],
                "{encoding:?}"
            );
        }
    }

    #[test]
    fn plain_ascii_header_with_identity_h_font() {
        let style = TextStyle {
            encoding: FontEncoding::IdentityH,
            ..TextStyle::default()
        };
        let pages = vec![vec![
            Cell::new(150, 100, "NOME"),
            Cell::new(150, 120, "ANA"),
        ]];
        let bytes = styled_table_pdf(&pages, style).unwrap();
        let mut pdf = PdfDocument::from_bytes(&bytes).unwrap();

        let table = pdf.extract_region(&region(1)).unwrap();
        assert_eq!(table.columns, vec!["NOME"]);
        assert_eq!(table.rows, vec![vec!["ANA"]]);
    }

    #[test]
    fn text_drawn_through_a_form_xobject_is_extracted() {
        let style = TextStyle {
            placement: Placement::Form,
            ..TextStyle::default()
        };
        let pages = vec![vec![
            Cell::new(150, 100, "NOME"),
            Cell::new(150, 120, "ANA"),
        ]];
        let bytes = styled_table_pdf(&pages, style).unwrap();
        let mut pdf = PdfDocument::from_bytes(&bytes).unwrap();

        let table = pdf.extract_region(&region(1)).unwrap();
        assert_eq!(table.columns, vec!["NOME"]);
        assert_eq!(table.rows, vec![vec!["ANA"]]);
    }

    #[test]
    fn kerned_scaled_and_form_layouts_give_the_plain_tables() {
        let plain_bytes = table_pdf(&admission_list_pages()).unwrap();
        let mut plain = PdfDocument::from_bytes(&plain_bytes).unwrap();
        let expected = [
            plain.extract_region(&region(1)).unwrap(),
            plain.extract_region(&region(2)).unwrap(),
        ];
        assert_eq!(expected[0].rows[0], vec!["1001", "ANA SOUZA", "MEDICINA"]);

        for placement in [Placement::Kerned, Placement::Scaled, Placement::Form] {
            let style = TextStyle {
                placement,
                ..TextStyle::default()
            };
            let bytes = styled_table_pdf(&admission_list_pages(), style).unwrap();
            let mut pdf = PdfDocument::from_bytes(&bytes).unwrap();

            for (page, table) in (1..).zip(&expected) {
                let got = pdf.extract_region(&region(page)).unwrap();
                assert_eq!(got.columns, table.columns, "{placement:?} page {page}");
                assert_eq!(got.rows, table.rows, "{placement:?} page {page}");
            }
        }
    }

    #[test]
    fn kerned_words_keep_their_word_break() {
        let style = TextStyle {
            placement: Placement::Kerned,
            encoding: FontEncoding::WinAnsi,
        };
        let bytes = styled_table_pdf(&[accented_list_page()], style).unwrap();
        let mut pdf = PdfDocument::from_bytes(&bytes).unwrap();

        let table = pdf.extract_region(&region(1)).unwrap();
        assert_eq!(table.columns, vec!["INSCRICAO", "NOME"]);
        assert_eq!(table.rows[0], vec!["2001", "JOSÉ ARAÚJO"]);
    }
}
