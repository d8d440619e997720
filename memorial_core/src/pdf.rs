//! # PDF Generation Module
//!
//! Renders a memorial to PDF using Typst.
//!
//! ## Architecture
//!
//! - The page preamble is an embedded Typst string constant
//! - Each block is turned into Typst markup; user text is escaped
//! - Comparison rows and the summary table are recomputed from the catalog
//!   with the memorial's own policy
//! - Output is raw PDF bytes (`Vec<u8>`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use memorial_core::memorial::{BlockKind, ComparisonData, Memorial};
//! use memorial_core::pdf::render_memorial_pdf;
//!
//! let mut memorial = Memorial::new("Projeto Campo Forte");
//! memorial.add_block(BlockKind::Comparison(ComparisonData::projecting(10.0)), None).unwrap();
//! memorial.add_block(BlockKind::SummaryTable, None).unwrap();
//!
//! let pdf_bytes = render_memorial_pdf(&memorial).unwrap();
//! std::fs::write("memorial.pdf", pdf_bytes).unwrap();
//! ```

use chrono::Utc;
use once_cell::sync::Lazy;
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::calculations::dimensioning::{dimension, DimensioningResult};
use crate::calculations::summary::ProjectSummary;
use crate::catalog::{self, format_cv};
use crate::equipment::StartingMethod;
use crate::errors::{CalcError, CalcResult};
use crate::memorial::{Block, BlockKind, ComparisonData, Memorial, TextAlign};
use crate::policy::DimensioningPolicy;

// ============================================================================
// Typst World Implementation
// ============================================================================

/// Bundled fonts, parsed once per process.
static FONTS: Lazy<Vec<Font>> = Lazy::new(|| {
    typst_assets::fonts()
        .flat_map(|font_bytes| Font::iter(Bytes::new(font_bytes.to_vec())))
        .collect()
});

/// A minimal Typst world for compiling documents without external files.
struct PdfWorld {
    main: Source,
    book: LazyHash<FontBook>,
    library: LazyHash<Library>,
}

impl PdfWorld {
    fn new(source: String) -> Self {
        PdfWorld {
            main: Source::detached(source),
            book: LazyHash::new(FontBook::from_fonts(FONTS.iter())),
            library: LazyHash::new(Library::default()),
        }
    }
}

impl World for PdfWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        FONTS.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Utc::now();
        Datetime::from_ymd(
            now.format("%Y").to_string().parse().ok()?,
            now.format("%m").to_string().parse().ok()?,
            now.format("%d").to_string().parse().ok()?,
        )
    }
}

// ============================================================================
// PDF Template
// ============================================================================

/// Page setup shared by every memorial
const PREAMBLE: &str = r##"
#set document(title: "{{TITLE_STR}}")
#set page(
  paper: "a4",
  margin: (top: 2cm, bottom: 2cm, left: 2cm, right: 2cm),
  header: align(right)[
    #text(size: 8pt, fill: gray)[{{TITLE_TEXT}}]
  ],
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr),
      align(left)[#text(size: 8pt)[{{DATE}}]],
      align(right)[#text(size: 8pt)[Página #counter(page).display() de #counter(page).final().first()]],
    )
  ]
)

#set text(font: "Libertinus Serif", size: 11pt, lang: "pt")
"##;

const TABLE_HEADER_FILL: &str = r##"rgb("#001d3d")"##;

// ============================================================================
// PDF Rendering Functions
// ============================================================================

/// Render a memorial to PDF.
///
/// Pages map to PDF page breaks; a page too long for one sheet flows onto
/// the next. Summary tables reflect the memorial's current motors.
///
/// # Arguments
///
/// * `memorial` - The document to render, with its own dimensioning policy
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - PDF file as bytes
/// * `Err(CalcError::RenderFailed)` - Typst rejected the generated source or
///   the PDF export failed
///
/// # Example
///
/// ```rust,no_run
/// use memorial_core::memorial::Memorial;
/// use memorial_core::pdf::render_memorial_pdf;
///
/// let memorial = Memorial::new("Projeto");
/// let pdf = render_memorial_pdf(&memorial).unwrap();
/// assert!(pdf.starts_with(b"%PDF"));
/// ```
pub fn render_memorial_pdf(memorial: &Memorial) -> CalcResult<Vec<u8>> {
    let source = memorial_source(memorial);
    let pdf = compile_pdf(source)?;
    tracing::info!(
        title = %memorial.meta.title,
        pages = memorial.pages.len(),
        bytes = pdf.len(),
        "memorial rendered"
    );
    Ok(pdf)
}

/// Typst source for a memorial.
fn memorial_source(memorial: &Memorial) -> String {
    let policy = &memorial.settings.policy;
    let summary = memorial.summary();

    let mut source = PREAMBLE
        .replace("{{TITLE_STR}}", &escape_string(&memorial.meta.title))
        .replace("{{TITLE_TEXT}}", &escape_typst(&memorial.meta.title))
        .replace("{{DATE}}", &Utc::now().format("%d/%m/%Y").to_string());

    for (index, page) in memorial.pages.iter().enumerate() {
        if index > 0 {
            source.push_str("\n#pagebreak()\n");
        }
        for block in &page.blocks {
            source.push_str(&block_markup(block, policy, &summary));
            source.push('\n');
        }
    }
    source
}

fn compile_pdf(source: String) -> CalcResult<Vec<u8>> {
    let world = PdfWorld::new(source);
    let warned = typst::compile(&world);

    let document = warned.output.map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        CalcError::render_failed("compile", error_msgs.join("; "))
    })?;

    typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        CalcError::render_failed("export", error_msgs.join("; "))
    })
}

fn block_markup(block: &Block, policy: &DimensioningPolicy, summary: &ProjectSummary) -> String {
    match &block.kind {
        BlockKind::Text(text) => text_markup(block, text),
        BlockKind::Comparison(data) => comparison_markup(data, policy),
        BlockKind::SummaryTable => summary_markup(summary),
    }
}

fn text_markup(block: &Block, text: &str) -> String {
    if text.trim().is_empty() {
        return format!("#v({}pt)", block.font_size);
    }

    let (align, justify) = match block.align {
        TextAlign::Left => ("left", false),
        TextAlign::Center => ("center", false),
        TextAlign::Right => ("right", false),
        TextAlign::Justify => ("left", true),
    };
    format!(
        "#align({align})[#par(justify: {justify})[#text(size: {size}pt, weight: \"{weight}\", style: \"{style}\")[{body}]]]",
        size = block.font_size,
        weight = if block.bold { "bold" } else { "regular" },
        style = if block.italic { "italic" } else { "normal" },
        body = escape_typst(text),
    )
}

fn comparison_markup(data: &ComparisonData, policy: &DimensioningPolicy) -> String {
    let before = &data.before;
    let before_kw = catalog::lookup(before.cv).map_or(0.0, |m| m.kw);

    let projected = catalog::lookup(data.after.cv).map(|motor| dimension(motor, policy));
    let after_row = match &projected {
        Some(result) => format!(
            "[*PROJ:*], [{cv} CV ({kw:.2} kW)], [{cable}], [{breaker}], [{starter}],",
            cv = format_cv(result.motor.cv),
            kw = result.motor.kw,
            cable = escape_typst(result.cable_size()),
            breaker = escape_typst(result.circuit_breaker()),
            starter = starter_text(result),
        ),
        None => format!(
            "[*PROJ:*], [{cv} CV], table.cell(colspan: 3)[_Potência fora do catálogo_],",
            cv = format_cv(data.after.cv),
        ),
    };

    format!(
        r##"#table(
  columns: (auto, 1fr, auto, auto, auto),
  inset: 5pt,
  stroke: 0.5pt + gray,
  align: (left, left, center, center, center),
  table.header([], [*Motor*], [*Cabo*], [*Disjuntor*], [*Partida*]),
  [ANT:], [{before_cv} CV ({before_kw:.2} kW)], [{before_cable}], [{before_breaker}], [{before_starter}],
  {after_row}
)"##,
        before_cv = format_cv(before.cv),
        before_kw = before_kw,
        before_cable = escape_typst(&before.cable),
        before_breaker = escape_typst(&before.breaker),
        before_starter = escape_typst(&before.starter),
        after_row = after_row,
    )
}

fn starter_text(result: &DimensioningResult) -> String {
    result
        .starter_label()
        .map(|label| escape_typst(&label))
        .unwrap_or_else(|| StartingMethod::DirectOnLine.display_name().to_string())
}

fn summary_markup(summary: &ProjectSummary) -> String {
    let rows: Vec<String> = summary
        .details
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let motor = &d.motor;
            format!(
                "  [{item}], [*{cv} CV ({kw} kW)* #linebreak() {model} #linebreak() #text(size: 7pt)[Carcaça: {frame} | In: {current} A | RPM: {rpm} | Rend.: {eff}% | FP: {pf} | Peso: {weight} kg]], [Cabo: {cable} #linebreak() Disjuntor: {breaker} #linebreak() Partida: {method}], [Contator: {contactor} #linebreak() {starter} #linebreak() {protection}],",
                item = i + 1,
                cv = format_cv(motor.cv),
                kw = motor.kw,
                model = escape_typst(&motor.model),
                frame = escape_typst(&motor.frame),
                current = motor.current_in_a,
                rpm = motor.rpm,
                eff = motor.efficiency_pct,
                pf = motor.power_factor,
                weight = motor.weight_kg,
                cable = escape_typst(d.cable_size()),
                breaker = escape_typst(d.circuit_breaker()),
                method = d.starting_method().display_name(),
                contactor = escape_typst(&d.contactor),
                starter = escape_typst(&d.starter_label().unwrap_or_else(|| "PARTIDA DIRETA".to_string())),
                protection = escape_typst(&d.protection_type),
            )
        })
        .collect();

    format!(
        r##"#v(8pt)
#block(width: 100%, fill: {fill}, inset: 8pt)[
  #align(center)[#text(fill: white, weight: "bold", size: 10pt)[QUADRO DE ESPECIFICAÇÕES TÉCNICAS E DIMENSIONAMENTO]]
]
#table(
  columns: (auto, 2fr, 1.3fr, 1.3fr),
  inset: 5pt,
  stroke: 0.5pt + gray,
  table.header([*Item*], [*Motor / Ficha técnica*], [*Dimensionamento elétrico*], [*Componentes*]),
{rows}
  table.cell(colspan: 2)[*Totalização: {count} unidades | {cv} CV ({kw:.2} kW)*],
  [*In total: {total_in:.1} A* #linebreak() Ip estimada: {total_ip:.1} A],
  [*{breaker}*],
)"##,
        fill = TABLE_HEADER_FILL,
        rows = rows.join("\n"),
        count = summary.motor_count,
        cv = format_cv(summary.total_cv),
        kw = summary.total_kw,
        total_in = summary.total_in_a,
        total_ip = summary.total_ip_a,
        breaker = escape_typst(&summary.recommended_main_breaker),
    )
}

/// Escape special Typst characters in user-provided markup text
fn escape_typst(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '*' | '_' | '#' | '$' | '@' | '<' | '>' | '\\' | '`' | '[' | ']' | '=' | '/' | '~'
            | '-' | '+' => format!("\\{}", c),
            '\n' => "#linebreak()".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

/// Escape text placed inside a Typst string literal
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_memorial() -> Memorial {
        let mut memorial = Memorial::new("Projeto \"Campo\" #1");
        memorial
            .add_block(BlockKind::Text("Motores [bomba] *principais*\n= revisão".into()), None)
            .unwrap();
        memorial
            .add_block(BlockKind::Comparison(ComparisonData::projecting(10.0)), None)
            .unwrap();
        memorial
            .add_block(BlockKind::Comparison(ComparisonData::projecting(0.5)), None)
            .unwrap();
        memorial.add_page().unwrap();
        memorial
            .add_block(BlockKind::Comparison(ComparisonData::projecting(9999.0)), None)
            .unwrap();
        memorial.add_block(BlockKind::SummaryTable, None).unwrap();
        memorial
    }

    #[test]
    fn test_escape_typst() {
        assert_eq!(escape_typst("a*b_c"), "a\\*b\\_c");
        assert_eq!(escape_typst("[x]"), "\\[x\\]");
        assert_eq!(escape_typst("= título"), "\\= título");
        assert_eq!(escape_typst("l1\nl2"), "l1#linebreak()l2");
        assert_eq!(escape_typst("Disjuntor Geral 125A"), "Disjuntor Geral 125A");
    }

    #[test]
    fn test_source_contains_blocks() {
        let memorial = sample_memorial();
        let source = memorial_source(&memorial);

        assert!(source.contains("MEMORIAL DESCRITIVO TÉCNICO"));
        assert!(source.contains("#pagebreak()"));
        assert!(source.contains("\\[bomba\\]"));
        assert!(source.contains("[ANT:]"));
        assert!(source.contains("MPW18"));
        assert!(source.contains("Potência fora do catálogo"));
        assert!(source.contains("Disjuntor Geral 40A"));
        assert!(source.contains("Projeto \\\"Campo\\\" #1"));
        assert!(source.contains("[Projeto \"Campo\" \\#1]"));
    }

    #[test]
    fn test_text_formatting_markup() {
        let block = Block::text("Parecer")
            .with_font_size(10.0)
            .bold()
            .italic()
            .aligned(TextAlign::Justify);
        let markup = text_markup(&block, "Parecer");
        assert!(markup.contains("justify: true"));
        assert!(markup.contains("size: 10pt"));
        assert!(markup.contains("weight: \"bold\""));
        assert!(markup.contains("style: \"italic\""));

        let spacer = text_markup(&Block::text(""), "");
        assert_eq!(spacer, "#v(11pt)");
    }

    #[test]
    fn test_pdf_generation() {
        let pdf = render_memorial_pdf(&sample_memorial());
        assert!(pdf.is_ok(), "PDF generation failed: {:?}", pdf.err());

        let pdf_bytes = pdf.unwrap();
        assert!(pdf_bytes.starts_with(b"%PDF"), "Output is not a valid PDF");
        assert!(pdf_bytes.len() > 1000, "PDF seems too small");
    }

    #[test]
    fn test_empty_memorial_renders() {
        let mut memorial = Memorial::new("Vazio");
        memorial.add_block(BlockKind::SummaryTable, None).unwrap();
        let pdf_bytes = render_memorial_pdf(&memorial).unwrap();
        assert!(pdf_bytes.starts_with(b"%PDF"));
    }
}
