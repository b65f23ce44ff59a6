//! Builds small PDFs with text at known positions, for tests.
//!
//! Every variant lays text out on the same grid: Courier at an effective
//! 10pt, advancing 6pt per character. Only the way the content stream and
//! font express it changes.

use std::collections::BTreeMap;
use std::path::Path;

use pdf_extract::content::{Content, Operation};
use pdf_extract::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

/// Page height of generated documents (A4).
pub const PAGE_HEIGHT: i64 = 842;

/// Page width of generated documents (A4).
pub const PAGE_WIDTH: i64 = 595;

/// Effective font size of generated text.
pub const FONT_SIZE: i64 = 10;

/// Courier advance, in thousandths of the font size.
const GLYPH_WIDTH: i64 = 600;

/// A piece of text whose baseline starts at `(x, top)`, in points from the
/// top-left corner of the page.
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    pub x: i64,
    pub top: i64,
    pub text: &'a str,
}

impl<'a> Cell<'a> {
    #[must_use]
    pub const fn new(x: i64, top: i64, text: &'a str) -> Self {
        Self { x, top, text }
    }
}

/// How character codes in the content stream map to text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FontEncoding {
    /// Standard Courier with its built-in encoding. ASCII only.
    #[default]
    Standard,
    /// Courier with an `/Encoding` dictionary over `WinAnsiEncoding` and
    /// explicit widths. Covers Latin-1.
    WinAnsi,
    /// A Type0 font with two-byte `Identity-H` codes and a `ToUnicode` map.
    IdentityH,
}

/// How each cell is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Placement {
    /// `Td` to the cell, then `Tj`.
    #[default]
    Plain,
    /// One `TJ` per cell with words as separate strings, spaced by a
    /// one-character adjustment instead of a space.
    Kerned,
    /// A `Tm` scaling text space by 2 with a 5pt font.
    Scaled,
    /// Plain placement inside a form XObject drawn with `Do`.
    Form,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextStyle {
    pub encoding: FontEncoding,
    pub placement: Placement,
}

fn dictionary<const N: usize>(entries: [(&str, Object); N]) -> Dictionary {
    let mut dictionary = Dictionary::new();
    for (key, value) in entries {
        dictionary.set(key, value);
    }
    dictionary
}

/// Character codes assigned to text under one encoding.
struct Encoder {
    encoding: FontEncoding,
    cids: BTreeMap<char, u16>,
}

impl Encoder {
    fn new(encoding: FontEncoding, pages: &[Vec<Cell<'_>>]) -> Result<Self, Box<dyn std::error::Error>> {
        let mut cids = BTreeMap::new();
        if encoding == FontEncoding::IdentityH {
            for c in pages.iter().flatten().flat_map(|cell| cell.text.chars()) {
                let next = u16::try_from(cids.len() + 1)?;
                cids.entry(c).or_insert(next);
            }
        }
        Ok(Self { encoding, cids })
    }

    fn string(&self, text: &str) -> Result<Object, Box<dyn std::error::Error>> {
        Ok(match self.encoding {
            FontEncoding::Standard => Object::String(text.as_bytes().to_vec(), StringFormat::Literal),
            FontEncoding::WinAnsi => {
                let bytes = text
                    .chars()
                    .map(|c| u8::try_from(u32::from(c)))
                    .collect::<Result<Vec<u8>, _>>()?;
                Object::String(bytes, StringFormat::Literal)
            }
            FontEncoding::IdentityH => {
                let mut bytes = Vec::new();
                for c in text.chars() {
                    let cid = self.cids.get(&c).ok_or("character without CID")?;
                    bytes.extend(cid.to_be_bytes());
                }
                Object::String(bytes, StringFormat::Hexadecimal)
            }
        })
    }

    fn to_unicode(&self) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n\
             12 dict begin\n\
             begincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n\
             /CMapType 2 def\n\
             1 begincodespacerange\n\
             <0000> <FFFF>\n\
             endcodespacerange\n",
        );
        cmap.push_str(&format!("{} beginbfchar\n", self.cids.len()));
        for (c, cid) in &self.cids {
            let unicode = u16::try_from(u32::from(*c))?;
            cmap.push_str(&format!("<{cid:04X}> <{unicode:04X}>\n"));
        }
        cmap.push_str(
            "endbfchar\n\
             endcmap\n\
             CMapName currentdict /CMap defineresource pop\n\
             end\n\
             end\n",
        );
        Ok(cmap.into_bytes())
    }
}

fn add_font(doc: &mut Document, encoder: &Encoder) -> Result<ObjectId, Box<dyn std::error::Error>> {
    Ok(match encoder.encoding {
        FontEncoding::Standard => doc.add_object(dictionary([
            ("Type", "Font".into()),
            ("Subtype", "Type1".into()),
            ("BaseFont", "Courier".into()),
        ])),
        FontEncoding::WinAnsi => doc.add_object(dictionary([
            ("Type", "Font".into()),
            ("Subtype", "Type1".into()),
            ("BaseFont", "Courier".into()),
            (
                "Encoding",
                dictionary([
                    ("Type", "Encoding".into()),
                    ("BaseEncoding", "WinAnsiEncoding".into()),
                ])
                .into(),
            ),
            ("FirstChar", 32.into()),
            ("LastChar", 255.into()),
            ("Widths", vec![Object::Integer(GLYPH_WIDTH); 224].into()),
        ])),
        FontEncoding::IdentityH => {
            let to_unicode = doc.add_object(Stream::new(Dictionary::new(), encoder.to_unicode()?));
            let descendant = doc.add_object(dictionary([
                ("Type", "Font".into()),
                ("Subtype", "CIDFontType2".into()),
                ("BaseFont", "Courier".into()),
                (
                    "CIDSystemInfo",
                    dictionary([
                        ("Registry", Object::string_literal("Adobe")),
                        ("Ordering", Object::string_literal("Identity")),
                        ("Supplement", 0.into()),
                    ])
                    .into(),
                ),
                ("DW", GLYPH_WIDTH.into()),
            ]));
            doc.add_object(dictionary([
                ("Type", "Font".into()),
                ("Subtype", "Type0".into()),
                ("BaseFont", "Courier".into()),
                ("Encoding", "Identity-H".into()),
                ("DescendantFonts", vec![Object::from(descendant)].into()),
                ("ToUnicode", to_unicode.into()),
            ]))
        }
    })
}

fn cell_operations(
    cell: &Cell<'_>,
    placement: Placement,
    encoder: &Encoder,
) -> Result<Vec<Operation>, Box<dyn std::error::Error>> {
    let baseline = PAGE_HEIGHT - cell.top;

    let (size, position, show) = match placement {
        Placement::Plain | Placement::Form => (
            FONT_SIZE,
            Operation::new("Td", vec![cell.x.into(), baseline.into()]),
            Operation::new("Tj", vec![encoder.string(cell.text)?]),
        ),
        Placement::Kerned => {
            let mut parts = Vec::new();
            for (i, word) in cell.text.split(' ').enumerate() {
                if i > 0 {
                    parts.push(Object::Integer(-GLYPH_WIDTH));
                }
                parts.push(encoder.string(word)?);
            }
            (
                FONT_SIZE,
                Operation::new("Td", vec![cell.x.into(), baseline.into()]),
                Operation::new("TJ", vec![parts.into()]),
            )
        }
        Placement::Scaled => (
            FONT_SIZE / 2,
            Operation::new(
                "Tm",
                vec![
                    2.into(),
                    0.into(),
                    0.into(),
                    2.into(),
                    cell.x.into(),
                    baseline.into(),
                ],
            ),
            Operation::new("Tj", vec![encoder.string(cell.text)?]),
        ),
    };

    Ok(vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), size.into()]),
        position,
        show,
        Operation::new("ET", vec![]),
    ])
}

/// Builds a PDF with one page per entry of `pages`, in plain Courier.
///
/// # Errors
///
/// Returns an error if the content stream cannot be encoded or the document
/// cannot be serialised.
pub fn table_pdf(pages: &[Vec<Cell<'_>>]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    styled_table_pdf(pages, TextStyle::default())
}

/// Builds a PDF with one page per entry of `pages`, drawn with `style`.
///
/// # Errors
///
/// Returns an error if some text cannot be expressed in the chosen
/// encoding, or the document cannot be serialised.
pub fn styled_table_pdf(
    pages: &[Vec<Cell<'_>>],
    style: TextStyle,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");
    let encoder = Encoder::new(style.encoding, pages)?;

    let pages_id = doc.new_object_id();
    let font_id = add_font(&mut doc, &encoder)?;
    let fonts = || dictionary([("F1", font_id.into())]);
    let media_box = || -> Object {
        vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()].into()
    };

    let mut page_ids = Vec::new();

    for cells in pages {
        let mut operations = Vec::new();
        for cell in cells {
            operations.extend(cell_operations(cell, style.placement, &encoder)?);
        }
        let content = Content { operations }.encode()?;

        let (content, resources) = if style.placement == Placement::Form {
            let form_id = doc.add_object(Stream::new(
                dictionary([
                    ("Type", "XObject".into()),
                    ("Subtype", "Form".into()),
                    ("BBox", media_box()),
                    ("Resources", dictionary([("Font", fonts().into())]).into()),
                ]),
                content,
            ));
            let draw = Content {
                operations: vec![Operation::new("Do", vec!["Fm1".into()])],
            };
            (
                draw.encode()?,
                dictionary([
                    ("Font", fonts().into()),
                    ("XObject", dictionary([("Fm1", form_id.into())]).into()),
                ]),
            )
        } else {
            (content, dictionary([("Font", fonts().into())]))
        };

        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
        let page_id = doc.add_object(dictionary([
            ("Type", "Page".into()),
            ("Parent", pages_id.into()),
            ("Contents", content_id.into()),
            ("Resources", resources.into()),
        ]));
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary([
            ("Type", "Pages".into()),
            (
                "Kids",
                page_ids
                    .iter()
                    .map(|id| Object::from(*id))
                    .collect::<Vec<Object>>()
                    .into(),
            ),
            ("Count", i64::try_from(page_ids.len())?.into()),
            ("MediaBox", media_box()),
        ])),
    );

    let catalog_id = doc.add_object(dictionary([
        ("Type", "Catalog".into()),
        ("Pages", pages_id.into()),
    ]));
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Writes [`table_pdf`] output to `path`.
///
/// # Errors
///
/// See [`table_pdf`]; also fails if the file cannot be written.
pub fn write_table_pdf(
    path: &Path,
    pages: &[Vec<Cell<'_>>],
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, table_pdf(pages)?)?;
    Ok(())
}

/// Two pages of an admission list.
///
/// Page 1 has a regular table (`INSCRICAO`, `NOME`, `CURSO`) with three
/// candidates. Page 2 lost the name header: names sit in a column with no
/// header while the `CANDIDATO` header sits over an empty column, with two
/// candidates. Both tables start 100pt from the top of the page; page 1 also
/// has a title above the table.
#[must_use]
pub fn admission_list_pages() -> Vec<Vec<Cell<'static>>> {
    vec![
        vec![
            Cell::new(50, 60, "LISTA DE APROVADOS"),
            Cell::new(50, 100, "INSCRICAO"),
            Cell::new(150, 100, "NOME"),
            Cell::new(300, 100, "CURSO"),
            Cell::new(50, 120, "1001"),
            Cell::new(150, 120, "ANA SOUZA"),
            Cell::new(300, 120, "MEDICINA"),
            Cell::new(50, 140, "1002"),
            Cell::new(150, 140, "BRUNO LIMA"),
            Cell::new(300, 140, "DIREITO"),
            Cell::new(50, 160, "1003"),
            Cell::new(150, 160, "CARLA DIAS"),
            Cell::new(300, 160, "FISICA"),
        ],
        vec![
            Cell::new(50, 100, "INSCRICAO"),
            Cell::new(300, 100, "CURSO"),
            Cell::new(450, 100, "CANDIDATO"),
            Cell::new(50, 120, "1004"),
            Cell::new(150, 120, "DANIEL REIS"),
            Cell::new(300, 120, "QUIMICA"),
            Cell::new(50, 140, "1005"),
            Cell::new(150, 140, "ELISA MOTA"),
            Cell::new(300, 140, "MEDICINA"),
        ],
    ]
}

/// One page listing candidates with accented names, under `INSCRICAO` and
/// `NOME` headers 100pt from the top.
#[must_use]
pub fn accented_list_page() -> Vec<Cell<'static>> {
    vec![
        Cell::new(50, 100, "INSCRICAO"),
        Cell::new(150, 100, "NOME"),
        Cell::new(50, 120, "2001"),
        Cell::new(150, 120, "JOSÉ ARAÚJO"),
        Cell::new(50, 140, "2002"),
        Cell::new(150, 140, "CONCEIÇÃO GONÇALVES"),
    ]
}
