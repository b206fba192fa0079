//! Turns a report into a downloadable document.

use std::fmt::Write as _;

use chrono::NaiveDate;

/// Output document format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// UTF-8 text, written verbatim.
    Text,
    /// A PDF with the built-in Helvetica font. The text is transliterated
    /// to ASCII first.
    #[default]
    Pdf,
}

impl ExportFormat {
    /// File extension without the dot.
    #[inline]
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// MIME type of the rendered document.
    #[inline]
    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Text => "text/plain; charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    /// Parses `txt`/`text` or `pdf`, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Some(ExportFormat::Text),
            "pdf" => Some(ExportFormat::Pdf),
            _ => None,
        }
    }
}

/// Renders `text` as a document. The output depends only on the input,
/// so exporting the same text twice gives identical bytes.
pub fn export(text: &str, format: ExportFormat) -> Vec<u8> {
    match format {
        ExportFormat::Text => text.as_bytes().to_vec(),
        ExportFormat::Pdf => pdf::render(&transliterate(text)),
    }
}

/// Names an exported file after the workflow label and a date, e.g.
/// `Analysis_Report_2026-10-15.pdf`.
pub fn file_name(label: &str, date: NaiveDate, format: ExportFormat) -> String {
    let mut stem = String::new();
    for c in transliterate(label).chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c);
        } else if matches!(c, ' ' | '_' | '-' | '.') && !stem.ends_with('_') {
            stem.push('_');
        }
    }
    let stem = stem.trim_matches('_');
    let stem = if stem.is_empty() { "Report" } else { stem };
    format!("{stem}_{}.{}", date.format("%Y-%m-%d"), format.extension())
}

/// Characters outside printable ASCII and their plain-ASCII stand-ins.
pub const SUBSTITUTIONS: &[(char, &str)] = &[
    // Turkish
    ('ç', "c"),
    ('Ç', "C"),
    ('ğ', "g"),
    ('Ğ', "G"),
    ('ı', "i"),
    ('İ', "I"),
    ('ö', "o"),
    ('Ö', "O"),
    ('ş', "s"),
    ('Ş', "S"),
    ('ü', "u"),
    ('Ü', "U"),
    ('â', "a"),
    ('Â', "A"),
    ('î', "i"),
    ('Î', "I"),
    ('û', "u"),
    ('Û', "U"),
    // Other Latin letters
    ('á', "a"),
    ('à', "a"),
    ('ä', "a"),
    ('Ä', "A"),
    ('é', "e"),
    ('è', "e"),
    ('ê', "e"),
    ('ë', "e"),
    ('É', "E"),
    ('í', "i"),
    ('ó', "o"),
    ('ú', "u"),
    ('ñ', "n"),
    ('ß', "ss"),
    // Punctuation
    ('\u{00A0}', " "),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201A}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{201E}', "\""),
    ('\u{2010}', "-"),
    ('\u{2013}', "-"),
    ('\u{2014}', "-"),
    ('\u{2026}', "..."),
    ('\u{2022}', "*"),
    ('\u{00B7}', "*"),
    ('\u{00AB}', "<<"),
    ('\u{00BB}', ">>"),
    ('\u{2032}', "'"),
    ('\u{2033}', "\""),
    // Math and engineering symbols
    ('×', "x"),
    ('÷', "/"),
    ('±', "+/-"),
    ('°', " deg"),
    ('≤', "<="),
    ('≥', ">="),
    ('≠', "!="),
    ('≈', "~"),
    ('\u{2212}', "-"),
    ('µ', "u"),
    ('μ', "u"),
    ('Ø', "dia"),
    ('ø', "dia"),
    ('⌀', "dia"),
    ('∅', "dia"),
    ('²', "^2"),
    ('³', "^3"),
    ('½', "1/2"),
    ('¼', "1/4"),
    ('¾', "3/4"),
    ('√', "sqrt"),
    ('∞', "inf"),
    ('→', "->"),
    ('←', "<-"),
    ('Δ', "Delta"),
    ('π', "pi"),
    ('α', "alpha"),
    ('β', "beta"),
    ('σ', "sigma"),
    ('τ', "tau"),
    ('ε', "epsilon"),
    ('θ', "theta"),
    ('λ', "lambda"),
    ('φ', "phi"),
    ('Ω', "Ohm"),
    // Currency and marks
    ('€', "EUR"),
    ('£', "GBP"),
    ('₺', "TL"),
    ('©', "(c)"),
    ('®', "(R)"),
    ('™', "TM"),
];

/// Maps `text` onto printable ASCII plus newlines and tabs.
///
/// Characters in [`SUBSTITUTIONS`] are replaced; any other character
/// outside that range is dropped.
pub fn transliterate(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\n' || c == '\t' || (' '..='~').contains(&c) {
            output.push(c);
        } else if let Some((_, replacement)) =
            SUBSTITUTIONS.iter().find(|(from, _)| *from == c)
        {
            output.push_str(replacement);
        }
    }
    output
}

mod pdf {
    use super::*;

    const PAGE_WIDTH: u32 = 595;
    const PAGE_HEIGHT: u32 = 842;
    const MARGIN: u32 = 50;
    const FONT_SIZE: u32 = 10;
    const LEADING: u32 = 13;
    const MAX_COLUMNS: usize = 95;
    const TAB: &str = "    ";

    /// Writes a minimal PDF 1.4 file. `text` must already be ASCII.
    pub fn render(text: &str) -> Vec<u8> {
        let lines = wrap(text);
        let lines_per_page = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;
        let pages: Vec<&[String]> = if lines.is_empty() {
            vec![&[]]
        } else {
            lines.chunks(lines_per_page).collect()
        };

        // Objects 1-3 are the catalog, the page tree and the font; each
        // page then takes a page object and a content stream.
        let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + 2 * i).collect();
        let mut objects = Vec::with_capacity(3 + 2 * pages.len());
        objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_owned());
        let kids = page_ids
            .iter()
            .map(|id| format!("{id} 0 R"))
            .collect::<Vec<_>>()
            .join(" ");
        objects.push(format!(
            "<< /Type /Pages /Kids [{kids}] /Count {} >>",
            pages.len()
        ));
        objects.push(
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica \
             /Encoding /WinAnsiEncoding >>"
                .to_owned(),
        );
        for (page, id) in pages.iter().zip(&page_ids) {
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                id + 1
            ));
            let stream = content_stream(page);
            objects.push(format!(
                "<< /Length {} >>\nstream\n{stream}endstream",
                stream.len()
            ));
        }

        let mut out = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (idx, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(
                format!("{} 0 obj\n{body}\nendobj\n", idx + 1).as_bytes(),
            );
        }

        let xref_offset = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            let _ = writeln!(xref, "{offset:010} 00000 n ");
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        );
        out.extend_from_slice(xref.as_bytes());
        out
    }

    fn content_stream(lines: &[String]) -> String {
        let mut stream = String::new();
        let top = PAGE_HEIGHT - MARGIN;
        let _ = writeln!(stream, "BT\n/F1 {FONT_SIZE} Tf\n{LEADING} TL");
        let _ = writeln!(stream, "{MARGIN} {top} Td");
        for line in lines {
            let _ = writeln!(stream, "({}) Tj T*", escape(line));
        }
        stream.push_str("ET\n");
        stream
    }

    fn escape(line: &str) -> String {
        let mut escaped = String::with_capacity(line.len());
        for c in line.chars() {
            if matches!(c, '\\' | '(' | ')') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }

    /// Splits into lines of at most `MAX_COLUMNS` characters, breaking at
    /// spaces where possible.
    pub(super) fn wrap(text: &str) -> Vec<String> {
        let mut lines = Vec::new();
        for raw in text.lines() {
            let raw = raw.replace('\t', TAB);
            let mut line = String::new();
            for word in raw.split(' ') {
                let mut word = word;
                while word.len() > MAX_COLUMNS {
                    if !line.is_empty() {
                        lines.push(std::mem::take(&mut line));
                    }
                    let (head, tail) = word.split_at(MAX_COLUMNS);
                    lines.push(head.to_owned());
                    word = tail;
                }
                if !line.is_empty() && line.len() + 1 + word.len() > MAX_COLUMNS
                {
                    lines.push(std::mem::take(&mut line));
                } else if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(word);
            }
            lines.push(line);
        }
        lines
    }
}
