//! Single-page PDF summary of a student record
//!
//! [`layout`] is a pure function from a record to positioned text lines;
//! [`render`] draws that layout with printpdf. Keeping the two apart makes the
//! page content comparable without parsing PDF output.
//!
//! Rendering is byte-stable: document dates come from the record's
//! `created_at` and the trailer id from its id and timestamp.

use crate::error::{Error, Result};
use crate::students::Student;
use printpdf::lopdf::{self, Object, StringFormat};
use printpdf::{BuiltinFont, Mm, OffsetDateTime, PdfDocument, Pt};

/// US Letter, in points
pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

const MARGIN_LEFT: f32 = 100.0;
const TITLE: &str = "Student Information";
const TITLE_SIZE: f32 = 20.0;
const BODY_SIZE: f32 = 12.0;
const LINE_SPACING: f32 = 30.0;
const PLACEHOLDER: &str = "Not specified";
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Font used for a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Regular,
    Bold,
}

/// A positioned line of text; coordinates in points from the bottom-left
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub face: Face,
    pub size: f32,
    pub x: f32,
    pub y: f32,
}

/// Everything drawn on the page
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub lines: Vec<TextLine>,
}

impl PageLayout {
    /// Whether any line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.text.contains(needle))
    }
}

/// Compute the fixed layout for a record
pub fn layout(student: &Student) -> PageLayout {
    let or_placeholder = |value: Option<&str>| value.unwrap_or(PLACEHOLDER).to_string();

    let fields = [
        format!("Name: {}", student.full_name()),
        format!("Email: {}", student.email),
        format!("Phone: {}", or_placeholder(student.phone.as_deref())),
        format!(
            "Birth date: {}",
            student
                .birth_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string())
        ),
        format!("Address: {}", or_placeholder(student.address.as_deref())),
        format!(
            "Registered: {}",
            student.created_at.format(TIMESTAMP_FORMAT)
        ),
    ];

    let mut lines = Vec::with_capacity(fields.len() + 1);
    lines.push(TextLine {
        text: TITLE.to_string(),
        face: Face::Bold,
        size: TITLE_SIZE,
        x: MARGIN_LEFT,
        y: PAGE_HEIGHT - 100.0,
    });

    let mut y = PAGE_HEIGHT - 150.0;
    for text in fields {
        lines.push(TextLine {
            text,
            face: Face::Regular,
            size: BODY_SIZE,
            x: MARGIN_LEFT,
            y,
        });
        y -= LINE_SPACING;
    }

    PageLayout { lines }
}

/// Render the record's summary page as PDF bytes
pub fn render(student: &Student) -> Result<Vec<u8>> {
    let page = layout(student);

    let created = OffsetDateTime::from_unix_timestamp(student.created_at.timestamp())
        .map_err(|e| Error::Document(format!("Invalid record timestamp: {}", e)))?;

    let (doc, page_index, layer_index) = PdfDocument::new(
        format!("Student {}", student.full_name()),
        Mm::from(Pt(PAGE_WIDTH)),
        Mm::from(Pt(PAGE_HEIGHT)),
        "Layer 1",
    );
    let doc = doc
        .with_document_id(document_id(student))
        .with_creation_date(created)
        .with_mod_date(created)
        .with_metadata_date(created);

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| Error::Document(format!("Failed to load Helvetica: {}", e)))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| Error::Document(format!("Failed to load Helvetica-Bold: {}", e)))?;

    let layer = doc.get_page(page_index).get_layer(layer_index);
    for line in &page.lines {
        let font = match line.face {
            Face::Regular => &regular,
            Face::Bold => &bold,
        };
        layer.use_text(
            line.text.clone(),
            line.size,
            Mm::from(Pt(line.x)),
            Mm::from(Pt(line.y)),
            font,
        );
    }

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| Error::Document(format!("Failed to write PDF: {}", e)))?;
    let bytes = pin_trailer_id(&bytes, &document_id(student))?;

    tracing::debug!(student_id = student.id, bytes = bytes.len(), "Rendered student PDF");
    Ok(bytes)
}

/// Stable 32-character id for a record's document
fn document_id(student: &Student) -> String {
    format!(
        "{:016x}{:016x}",
        student.id,
        student.created_at.timestamp() as u64
    )
}

/// printpdf writes a random trailer `/ID`; replace both halves with `id`
fn pin_trailer_id(bytes: &[u8], id: &str) -> Result<Vec<u8>> {
    let mut pdf = lopdf::Document::load_mem(bytes)
        .map_err(|e| Error::Document(format!("Failed to reread PDF: {}", e)))?;

    let id = Object::String(id.as_bytes().to_vec(), StringFormat::Literal);
    pdf.trailer.set("ID", Object::Array(vec![id.clone(), id]));

    let mut out = Vec::with_capacity(bytes.len());
    pdf.save_to(&mut out)
        .map_err(|e| Error::Document(format!("Failed to write PDF: {}", e)))?;
    Ok(out)
}

/// Attachment filename for a record's summary
pub fn filename(student: &Student) -> String {
    format!(
        "student_{}_{}_{}.pdf",
        student.id, student.first_name, student.last_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn student() -> Student {
        Student {
            id: 1,
            first_name: "Ana".to_string(),
            last_name: "Gomez".to_string(),
            email: "ana@x.com".to_string(),
            birth_date: None,
            phone: None,
            address: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap(),
            owner: "u".to_string(),
        }
    }

    fn texts(page: &PageLayout) -> Vec<&str> {
        page.lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_layout_order_and_placeholders() {
        let page = layout(&student());
        assert_eq!(
            texts(&page),
            vec![
                "Student Information",
                "Name: Ana Gomez",
                "Email: ana@x.com",
                "Phone: Not specified",
                "Birth date: Not specified",
                "Address: Not specified",
                "Registered: 05/03/2024 14:07",
            ]
        );
    }

    #[test]
    fn test_layout_with_optional_fields() {
        let mut s = student();
        s.phone = Some("+54 9 11 1234-5678".to_string());
        s.birth_date = NaiveDate::from_ymd_opt(2010, 3, 15);
        s.address = Some("Calle Falsa 123".to_string());

        let page = layout(&s);
        assert!(page.contains("Phone: +54 9 11 1234-5678"));
        assert!(page.contains("Birth date: 2010-03-15"));
        assert!(page.contains("Address: Calle Falsa 123"));
        assert!(!page.contains(PLACEHOLDER));
    }

    #[test]
    fn test_layout_positions() {
        let page = layout(&student());
        let title = &page.lines[0];
        assert_eq!(title.face, Face::Bold);
        assert_eq!(title.size, 20.0);
        assert_eq!(title.y, 692.0);

        let ys: Vec<f32> = page.lines[1..].iter().map(|l| l.y).collect();
        assert_eq!(ys, vec![642.0, 612.0, 582.0, 552.0, 522.0, 492.0]);
        assert!(page.lines.iter().all(|l| l.x == 100.0));
    }

    #[test]
    fn test_layout_is_deterministic() {
        let s = student();
        assert_eq!(layout(&s), layout(&s.clone()));
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render(&student()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 200);
    }

    #[test]
    fn test_render_is_byte_stable() {
        let s = student();
        let first = render(&s).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let second = render(&s.clone()).unwrap();
        assert_eq!(first, second);

        let mut other = s.clone();
        other.id = 2;
        assert_ne!(render(&other).unwrap(), first);
    }

    #[test]
    fn test_render_dates_follow_record() {
        let bytes = render(&student()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("D:20240305140700"));
    }

    #[test]
    fn test_filename() {
        assert_eq!(filename(&student()), "student_1_Ana_Gomez.pdf");
    }
}
