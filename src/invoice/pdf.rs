//! A4 invoice rendering on top of printpdf.
//!
//! Coordinates in this module are top-based millimeters (origin at the top
//! left, y growing downwards) and get flipped to printpdf's bottom-left
//! origin inside the drawing helpers.

use std::path::{Path, PathBuf};

use printpdf::{
    path::PaintMode, BuiltinFont, Color, CustomPdfConformance, IndirectFontRef, Mm,
    PdfConformance, PdfDocument, PdfLayerReference, Rect, Rgb,
};

use super::Invoice;
use crate::{sanitize_filename, CompanyInfo};

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;

// Header band and brand colors (0..255 sRGB)
const NAVY: (u8, u8, u8) = (13, 79, 139);
const ORANGE: (u8, u8, u8) = (242, 153, 74);
const WHITE: (u8, u8, u8) = (255, 255, 255);
const GRAY_TEXT: (u8, u8, u8) = (100, 100, 100);
const DARK_TEXT: (u8, u8, u8) = (60, 60, 60);
const FOOTER_TEXT: (u8, u8, u8) = (150, 150, 150);
const FOOTER_RULE: (u8, u8, u8) = (200, 200, 200);
const STRIPE: (u8, u8, u8) = (245, 245, 245);

// Items table geometry
const TABLE_LEFT: f32 = 15.0;
const COL_WIDTHS: [f32; 6] = [45.0, 50.0, 15.0, 25.0, 20.0, 25.0];
const TABLE_HEADERS: [&str; 6] = ["Item", "Description", "Qty", "Unit Price", "Discount", "Total"];
const CELL_PAD_X: f32 = 2.0;
const HEADER_ROW_H: f32 = 10.0;
const BODY_LINE_GAP: f32 = 4.5;
const BODY_FIRST_BASELINE: f32 = 6.5;
const BODY_PAD_BOTTOM: f32 = 3.5;

// Footer occupies the bottom of every page; the table never enters it.
const FOOTER_RESERVE: f32 = 35.0;

/// Region anchors for the A4 layout, in top-based millimeters. Kept as a
/// value so block positions can be asserted without parsing a PDF.
#[derive(Debug, Clone)]
pub struct PageLayout {
    /// Height of the colored band at the top of the first page.
    pub header_band_h: f32,
    /// Company name baseline inside the band.
    pub brand: (f32, f32),
    pub issuer_top: f32,
    /// The invoice-meta column starts this far from the right edge.
    pub meta_right_offset: f32,
    pub bill_to_top: f32,
    pub table_top: f32,
    /// Table resume position on continuation pages.
    pub continuation_top: f32,
    /// Gap between the last table row and the totals block.
    pub totals_gap: f32,
    /// Footer baseline sits this far above the bottom edge.
    pub footer_offset: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        PageLayout {
            header_band_h: 40.0,
            brand: (20.0, 25.0),
            issuer_top: 50.0,
            meta_right_offset: 70.0,
            bill_to_top: 90.0,
            table_top: 135.0,
            continuation_top: 20.0,
            totals_gap: 10.0,
            footer_offset: 20.0,
        }
    }
}

impl PageLayout {
    pub fn meta_x(&self) -> f32 {
        PAGE_W - self.meta_right_offset
    }

    pub fn footer_y(&self) -> f32 {
        PAGE_H - self.footer_offset
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Align {
    Left,
    Center,
    Right,
}

const COL_ALIGNS: [Align; 6] = [
    Align::Left,
    Align::Left,
    Align::Center,
    Align::Right,
    Align::Center,
    Align::Right,
];

fn rgb(c: (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        c.0 as f32 / 255.0,
        c.1 as f32 / 255.0,
        c.2 as f32 / 255.0,
        None,
    ))
}

fn push_line(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    font_size: f32,
    x: f32,
    y_top: f32,
) {
    layer.use_text(text, font_size, Mm(x), Mm(PAGE_H - y_top), font);
}

// printpdf doesn't expose reliable text metrics for builtin fonts; use a
// pragmatic estimate. Good enough for numeric columns and short labels.
fn text_width_est(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.42
}

fn push_line_right(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    font_size: f32,
    x_right: f32,
    y_top: f32,
) {
    let x = (x_right - text_width_est(text, font_size)).max(0.0);
    push_line(layer, font, text, font_size, x, y_top);
}

fn push_line_center(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    font_size: f32,
    x_center: f32,
    y_top: f32,
) {
    let x = (x_center - text_width_est(text, font_size) / 2.0).max(0.0);
    push_line(layer, font, text, font_size, x, y_top);
}

fn fill_rect(layer: &PdfLayerReference, x: f32, y_top: f32, w: f32, h: f32, color: (u8, u8, u8)) {
    layer.set_fill_color(rgb(color));
    let rect = Rect::new(
        Mm(x),
        Mm(PAGE_H - y_top - h),
        Mm(x + w),
        Mm(PAGE_H - y_top),
    )
    .with_mode(PaintMode::Fill);
    layer.add_rect(rect);
}

fn draw_rule(layer: &PdfLayerReference, x1: f32, x2: f32, y_top: f32, color: (u8, u8, u8)) {
    layer.set_outline_color(rgb(color));
    layer.set_outline_thickness(0.2);
    layer.add_line(printpdf::Line {
        points: vec![
            (printpdf::Point::new(Mm(x1), Mm(PAGE_H - y_top)), false),
            (printpdf::Point::new(Mm(x2), Mm(PAGE_H - y_top)), false),
        ],
        is_closed: false,
    });
}

fn wrap_text_lines(input: &str, max_chars: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in input.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        if current.len() + 1 + word.len() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            out.push(current);
            current = word.to_string();
        }
    }

    if !current.is_empty() {
        out.push(current);
    }

    out
}

fn col_x(i: usize) -> f32 {
    TABLE_LEFT + COL_WIDTHS[..i].iter().sum::<f32>()
}

fn col_max_chars(i: usize, font_size: f32) -> usize {
    let usable = COL_WIDTHS[i] - 2.0 * CELL_PAD_X;
    ((usable / (font_size * 0.42)) as usize).max(1)
}

fn format_discount(d: f64) -> String {
    if d.fract() == 0.0 {
        format!("{:.0}%", d)
    } else {
        format!("{}%", d)
    }
}

const NOTES_LABEL_OFFSET: f32 = 35.0;
const NOTES_FIRST_LINE_OFFSET: f32 = 42.0;
const NOTES_LINE_GAP: f32 = 5.0;
const BANK_BLOCK_H: f32 = 30.0;

/// Vertical extent of the totals/notes/bank unit, measured from its top.
/// Returns `(needed, bank_start)`: the height to reserve before drawing,
/// and the offset of the "Payment Details:" header, pushed down when the
/// wrapped notes run past the default position.
fn trailing_block_metrics(note_lines: usize, has_bank: bool) -> (f32, f32) {
    let notes_end = NOTES_FIRST_LINE_OFFSET + note_lines.saturating_sub(1) as f32 * NOTES_LINE_GAP;
    let bank_start = if note_lines > 0 {
        notes_end + 13.0
    } else {
        55.0
    };
    let mut needed: f32 = 22.0;
    if note_lines > 0 {
        needed = needed.max(notes_end + NOTES_LINE_GAP);
    }
    if has_bank {
        needed = needed.max(bank_start + BANK_BLOCK_H);
    }
    (needed, bank_start)
}

/// Rejects invoices whose numeric fields cannot be rendered. The editor's
/// normalization keeps these out, but the renderer also accepts
/// deserialized snapshots, so it checks again.
fn validate(invoice: &Invoice) -> Result<(), String> {
    if !invoice.tax_rate.is_finite() {
        return Err("invoice tax rate is not a finite number".to_string());
    }
    for it in &invoice.items {
        if !it.unit_price.is_finite() || !it.discount.is_finite() {
            return Err(format!(
                "line item '{}' has a non-numeric price or discount",
                if it.name.is_empty() { &it.id } else { &it.name }
            ));
        }
    }
    Ok(())
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

fn draw_table_header(layer: &PdfLayerReference, fonts: &Fonts, y_top: f32) -> f32 {
    let table_w: f32 = COL_WIDTHS.iter().sum();
    fill_rect(layer, TABLE_LEFT, y_top, table_w, HEADER_ROW_H, NAVY);
    layer.set_fill_color(rgb(WHITE));
    let baseline = y_top + 6.5;
    for (i, label) in TABLE_HEADERS.iter().enumerate() {
        match COL_ALIGNS[i] {
            Align::Left => push_line(layer, &fonts.bold, label, 9.0, col_x(i) + CELL_PAD_X, baseline),
            Align::Center => push_line_center(
                layer,
                &fonts.bold,
                label,
                9.0,
                col_x(i) + COL_WIDTHS[i] / 2.0,
                baseline,
            ),
            Align::Right => push_line_right(
                layer,
                &fonts.bold,
                label,
                9.0,
                col_x(i) + COL_WIDTHS[i] - CELL_PAD_X,
                baseline,
            ),
        }
    }
    y_top + HEADER_ROW_H
}

fn draw_table_row(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    cells: &[Vec<String>; 6],
    y_top: f32,
    row_h: f32,
    striped: bool,
) {
    let table_w: f32 = COL_WIDTHS.iter().sum();
    if striped {
        fill_rect(layer, TABLE_LEFT, y_top, table_w, row_h, STRIPE);
    }
    layer.set_fill_color(rgb(DARK_TEXT));
    for (i, lines) in cells.iter().enumerate() {
        for (li, line) in lines.iter().enumerate() {
            let baseline = y_top + BODY_FIRST_BASELINE + li as f32 * BODY_LINE_GAP;
            match COL_ALIGNS[i] {
                Align::Left => {
                    push_line(layer, &fonts.regular, line, 9.0, col_x(i) + CELL_PAD_X, baseline)
                }
                Align::Center => push_line_center(
                    layer,
                    &fonts.regular,
                    line,
                    9.0,
                    col_x(i) + COL_WIDTHS[i] / 2.0,
                    baseline,
                ),
                Align::Right => push_line_right(
                    layer,
                    &fonts.regular,
                    line,
                    9.0,
                    col_x(i) + COL_WIDTHS[i] - CELL_PAD_X,
                    baseline,
                ),
            }
        }
    }
}

/// Renders the invoice to PDF bytes using the default layout.
/// Re-rendering an unchanged invoice yields byte-identical output
/// (document metadata is pinned).
pub fn generate_pdf_bytes(invoice: &Invoice, company: &CompanyInfo) -> Result<Vec<u8>, String> {
    generate_pdf_bytes_with_layout(invoice, company, &PageLayout::default())
}

pub fn generate_pdf_bytes_with_layout(
    invoice: &Invoice,
    company: &CompanyInfo,
    layout: &PageLayout,
) -> Result<Vec<u8>, String> {
    validate(invoice)?;

    let title = format!("Invoice {}", invoice.invoice_number);
    let (doc, page1, layer1) = PdfDocument::new(&title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    // Pin metadata so an unchanged invoice renders to identical bytes.
    let epoch = time::OffsetDateTime::UNIX_EPOCH;
    let doc = doc
        .with_conformance(PdfConformance::Custom(CustomPdfConformance {
            requires_icc_profile: false,
            requires_xmp_metadata: false,
            ..Default::default()
        }))
        .with_creation_date(epoch)
        .with_mod_date(epoch);

    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(|e| e.to_string())?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| e.to_string())?,
    };

    let mut layer = doc.get_page(page1).get_layer(layer1);

    // ----- Header band -----
    fill_rect(&layer, 0.0, 0.0, PAGE_W, layout.header_band_h, NAVY);
    layer.set_fill_color(rgb(WHITE));
    let (brand_x, brand_y) = layout.brand;
    push_line(&layer, &fonts.bold, &company.name, 24.0, brand_x, brand_y);
    push_line_right(&layer, &fonts.regular, "INVOICE", 10.0, PAGE_W - 20.0, brand_y);

    // ----- Issuer block -----
    layer.set_fill_color(rgb(GRAY_TEXT));
    let y = layout.issuer_top;
    push_line(&layer, &fonts.regular, &company.address, 9.0, 20.0, y);
    let city_line = format!("{}, {}", company.city, company.country);
    push_line(&layer, &fonts.regular, &city_line, 9.0, 20.0, y + 5.0);
    push_line(&layer, &fonts.regular, &format!("Phone: {}", company.phone), 9.0, 20.0, y + 10.0);
    push_line(&layer, &fonts.regular, &format!("Email: {}", company.email), 9.0, 20.0, y + 15.0);
    if let Some(tax_id) = company.tax_id.as_deref().filter(|s| !s.trim().is_empty()) {
        push_line(&layer, &fonts.regular, &format!("Tax ID: {}", tax_id), 9.0, 20.0, y + 20.0);
    }

    // ----- Invoice meta -----
    let meta_x = layout.meta_x();
    layer.set_fill_color(rgb(NAVY));
    push_line(&layer, &fonts.bold, "Invoice Details", 11.0, meta_x, y);
    layer.set_fill_color(rgb(DARK_TEXT));
    push_line(
        &layer,
        &fonts.regular,
        &format!("Invoice #: {}", invoice.invoice_number),
        9.0,
        meta_x,
        y + 8.0,
    );
    push_line(&layer, &fonts.regular, &format!("Date: {}", invoice.date), 9.0, meta_x, y + 14.0);
    push_line(
        &layer,
        &fonts.regular,
        &format!("Due Date: {}", invoice.due_date),
        9.0,
        meta_x,
        y + 20.0,
    );

    // ----- Bill To -----
    let y = layout.bill_to_top;
    layer.set_fill_color(rgb(NAVY));
    push_line(&layer, &fonts.bold, "Bill To:", 11.0, 20.0, y);
    layer.set_fill_color(rgb(DARK_TEXT));
    let bill = &invoice.bill_to;
    let company_name = if bill.company_name.trim().is_empty() {
        "N/A"
    } else {
        bill.company_name.as_str()
    };
    push_line(&layer, &fonts.regular, company_name, 9.0, 20.0, y + 8.0);
    push_line(&layer, &fonts.regular, &bill.contact_person, 9.0, 20.0, y + 14.0);
    push_line(&layer, &fonts.regular, &bill.address, 9.0, 20.0, y + 20.0);
    push_line(&layer, &fonts.regular, &bill.email, 9.0, 20.0, y + 26.0);
    push_line(&layer, &fonts.regular, &bill.phone, 9.0, 20.0, y + 32.0);

    // ----- Items table -----
    let mut y = draw_table_header(&layer, &fonts, layout.table_top);
    let page_bottom = PAGE_H - FOOTER_RESERVE;

    for (idx, item) in invoice.items.iter().enumerate() {
        let cells: [Vec<String>; 6] = [
            wrap_text_lines(&item.name, col_max_chars(0, 9.0)),
            wrap_text_lines(&item.description, col_max_chars(1, 9.0)),
            vec![item.quantity.to_string()],
            vec![invoice.format_amount(item.unit_price)],
            vec![format_discount(item.discount)],
            vec![invoice.format_amount(item.line_total())],
        ];
        let line_count = cells.iter().map(|c| c.len().max(1)).max().unwrap_or(1);
        let row_h =
            BODY_FIRST_BASELINE + (line_count as f32 - 1.0) * BODY_LINE_GAP + BODY_PAD_BOTTOM;

        if y + row_h > page_bottom {
            if layout.continuation_top + HEADER_ROW_H + row_h > page_bottom {
                return Err(format!(
                    "line item '{}' is too tall to fit on a page",
                    item.name
                ));
            }
            let (page, layer_idx) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            layer = doc.get_page(page).get_layer(layer_idx);
            y = draw_table_header(&layer, &fonts, layout.continuation_top);
        }

        draw_table_row(&layer, &fonts, &cells, y, row_h, idx % 2 == 1);
        y += row_h;
    }

    // ----- Totals, notes, bank details -----
    // The trailing blocks are drawn as one unit; break to a fresh page if
    // they would collide with the footer.
    let notes = invoice.notes.trim();
    let notes_lines = wrap_text_lines(notes, 90);
    let has_notes = !notes_lines.is_empty();
    let has_bank = company.bank_details.is_some();
    let (needed, bank_start) = trailing_block_metrics(notes_lines.len(), has_bank);
    let mut final_y = y + layout.totals_gap;
    if final_y + needed > page_bottom {
        let (page, layer_idx) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        layer = doc.get_page(page).get_layer(layer_idx);
        final_y = layout.continuation_top;
    }

    layer.set_fill_color(rgb(DARK_TEXT));
    push_line(&layer, &fonts.regular, "Subtotal:", 10.0, PAGE_W - 70.0, final_y);
    push_line_right(
        &layer,
        &fonts.regular,
        &invoice.format_amount(invoice.subtotal()),
        10.0,
        PAGE_W - 20.0,
        final_y,
    );
    push_line(
        &layer,
        &fonts.regular,
        &format!("Tax ({}%):", format_discount(invoice.tax_rate).trim_end_matches('%')),
        10.0,
        PAGE_W - 70.0,
        final_y + 7.0,
    );
    push_line_right(
        &layer,
        &fonts.regular,
        &invoice.format_amount(invoice.tax()),
        10.0,
        PAGE_W - 20.0,
        final_y + 7.0,
    );

    fill_rect(&layer, PAGE_W - 80.0, final_y + 12.0, 60.0, 10.0, ORANGE);
    layer.set_fill_color(rgb(WHITE));
    push_line(&layer, &fonts.bold, "Total:", 10.0, PAGE_W - 75.0, final_y + 19.0);
    push_line_right(
        &layer,
        &fonts.bold,
        &invoice.format_amount(invoice.total()),
        10.0,
        PAGE_W - 22.0,
        final_y + 19.0,
    );

    // Notes that outgrow even a fresh page continue on further pages.
    let mut last_note_y = final_y;
    if has_notes {
        layer.set_fill_color(rgb(GRAY_TEXT));
        push_line(
            &layer,
            &fonts.regular,
            "Notes:",
            9.0,
            20.0,
            final_y + NOTES_LABEL_OFFSET,
        );
        let mut note_y = final_y + NOTES_FIRST_LINE_OFFSET;
        for line in &notes_lines {
            if note_y > page_bottom {
                let (page, layer_idx) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
                layer = doc.get_page(page).get_layer(layer_idx);
                layer.set_fill_color(rgb(GRAY_TEXT));
                note_y = layout.continuation_top;
            }
            push_line(&layer, &fonts.regular, line, 9.0, 20.0, note_y);
            last_note_y = note_y;
            note_y += NOTES_LINE_GAP;
        }
    }

    if let Some(bank) = &company.bank_details {
        let mut bank_y = if has_notes {
            last_note_y + 13.0
        } else {
            final_y + bank_start
        };
        if bank_y + BANK_BLOCK_H > page_bottom {
            let (page, layer_idx) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            layer = doc.get_page(page).get_layer(layer_idx);
            bank_y = layout.continuation_top;
        }
        layer.set_fill_color(rgb(NAVY));
        push_line(&layer, &fonts.bold, "Payment Details:", 10.0, 20.0, bank_y);
        layer.set_fill_color(rgb(DARK_TEXT));
        push_line(
            &layer,
            &fonts.regular,
            &format!("Bank: {}", bank.bank_name),
            9.0,
            20.0,
            bank_y + 7.0,
        );
        push_line(
            &layer,
            &fonts.regular,
            &format!("Account: {}", bank.account_name),
            9.0,
            20.0,
            bank_y + 13.0,
        );
        push_line(
            &layer,
            &fonts.regular,
            &format!("Account #: {}", bank.account_number),
            9.0,
            20.0,
            bank_y + 19.0,
        );
        if let Some(swift) = bank.swift_code.as_deref().filter(|s| !s.trim().is_empty()) {
            push_line(
                &layer,
                &fonts.regular,
                &format!("SWIFT: {}", swift),
                9.0,
                20.0,
                bank_y + 25.0,
            );
        }
    }

    // ----- Footer -----
    let footer_y = layout.footer_y();
    draw_rule(&layer, 20.0, PAGE_W - 20.0, footer_y - 10.0, FOOTER_RULE);
    layer.set_fill_color(rgb(FOOTER_TEXT));
    push_line_center(
        &layer,
        &fonts.regular,
        "Thank you for your business!",
        8.0,
        PAGE_W / 2.0,
        footer_y,
    );

    let mut writer = std::io::BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer).map_err(|e| e.to_string())?;
    let bytes = writer.into_inner().map_err(|e| e.to_string())?;
    Ok(bytes)
}

/// Writes `<invoiceNumber>.pdf` into `dir` and returns the full path.
pub fn export_pdf_to_dir(
    invoice: &Invoice,
    company: &CompanyInfo,
    dir: &Path,
) -> Result<PathBuf, String> {
    let bytes = generate_pdf_bytes(invoice, company)?;
    std::fs::create_dir_all(dir).map_err(|e| e.to_string())?;
    let file_name = format!("{}.pdf", sanitize_filename(&invoice.invoice_number));
    let path = dir.join(file_name);
    std::fs::write(&path, bytes).map_err(|e| e.to_string())?;
    Ok(path)
}

/// Renders to a `data:application/pdf;base64,` URI for in-place preview
/// and print dialogs.
pub fn generate_pdf_data_uri(invoice: &Invoice, company: &CompanyInfo) -> Result<String, String> {
    use base64::Engine as _;
    let bytes = generate_pdf_bytes(invoice, company)?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(format!("data:application/pdf;base64,{}", encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{InvoicePatch, LineItemPatch};

    fn sample_invoice() -> Invoice {
        let mut inv = Invoice::new();
        inv.invoice_number = "INV-TEST-001".to_string();
        inv.date = "2026-01-15".to_string();
        inv.due_date = "2026-02-14".to_string();
        let id = inv.add_blank_item();
        inv.update_item(
            &id,
            LineItemPatch {
                name: Some("Cordless Drill X200".to_string()),
                description: Some("SKU: PT-001".to_string()),
                quantity: Some(2),
                unit_price: Some(100.0),
                discount: Some(10.0),
                ..Default::default()
            },
        );
        inv
    }

    #[test]
    fn renders_valid_pdf_bytes() {
        let bytes = generate_pdf_bytes(&sample_invoice(), &CompanyInfo::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn unchanged_invoice_renders_identical_bytes() {
        let inv = sample_invoice();
        let company = CompanyInfo::default();
        let a = generate_pdf_bytes(&inv, &company).unwrap();
        let b = generate_pdf_bytes(&inv, &company).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_invoice_still_renders() {
        let mut inv = sample_invoice();
        inv.items.clear();
        inv.notes.clear();
        let mut company = CompanyInfo::default();
        company.bank_details = None;
        company.tax_id = None;
        let bytes = generate_pdf_bytes(&inv, &company).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn many_items_paginate() {
        let mut inv = sample_invoice();
        for i in 0..60 {
            let id = inv.add_blank_item();
            inv.update_item(
                &id,
                LineItemPatch {
                    name: Some(format!("Bulk item {}", i)),
                    quantity: Some(1),
                    unit_price: Some(10.0),
                    ..Default::default()
                },
            );
        }
        let one_page = generate_pdf_bytes(&sample_invoice(), &CompanyInfo::default()).unwrap();
        let many_pages = generate_pdf_bytes(&inv, &CompanyInfo::default()).unwrap();
        assert!(many_pages.len() > one_page.len());
    }

    #[test]
    fn non_finite_price_is_rejected() {
        let mut inv = sample_invoice();
        inv.items[0].unit_price = f64::NAN;
        let err = generate_pdf_bytes(&inv, &CompanyInfo::default()).unwrap_err();
        assert!(err.contains("Cordless Drill X200"));

        let mut inv = sample_invoice();
        inv.apply(InvoicePatch::default());
        inv.tax_rate = f64::INFINITY;
        assert!(generate_pdf_bytes(&inv, &CompanyInfo::default()).is_err());
    }

    #[test]
    fn export_writes_file_named_after_invoice_number() {
        let dir = tempfile::tempdir().unwrap();
        let inv = sample_invoice();
        let path = export_pdf_to_dir(&inv, &CompanyInfo::default(), dir.path()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "INV-TEST-001.pdf"
        );
        assert!(path.exists());
    }

    #[test]
    fn export_sanitizes_hostile_invoice_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let mut inv = sample_invoice();
        inv.invoice_number = "INV/2026\\01:*?".to_string();
        let path = export_pdf_to_dir(&inv, &CompanyInfo::default(), dir.path()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(!name.contains('/') && !name.contains('\\') && !name.contains(':'));
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn data_uri_wraps_the_same_bytes() {
        use base64::Engine as _;
        let inv = sample_invoice();
        let company = CompanyInfo::default();
        let uri = generate_pdf_data_uri(&inv, &company).unwrap();
        assert!(uri.starts_with("data:application/pdf;base64,"));
        let encoded = &uri["data:application/pdf;base64,".len()..];
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded, generate_pdf_bytes(&inv, &company).unwrap());
    }

    #[test]
    fn default_layout_block_positions() {
        let l = PageLayout::default();
        assert_eq!(l.meta_x(), 140.0);
        assert_eq!(l.footer_y(), 277.0);
        assert_eq!(l.table_top, 135.0);
        assert_eq!(l.bill_to_top, 90.0);
        // columns span the content area symmetrically
        assert_eq!(col_x(0), 15.0);
        assert_eq!(col_x(2), 110.0);
        assert_eq!(col_x(5) + COL_WIDTHS[5], PAGE_W - 15.0);
    }

    #[test]
    fn custom_layout_changes_output() {
        let inv = sample_invoice();
        let company = CompanyInfo::default();
        let moved = PageLayout {
            table_top: 150.0,
            ..PageLayout::default()
        };
        let default_bytes = generate_pdf_bytes(&inv, &company).unwrap();
        let moved_bytes =
            generate_pdf_bytes_with_layout(&inv, &company, &moved).unwrap();
        assert_ne!(default_bytes, moved_bytes);
    }

    #[test]
    fn trailing_reservation_tracks_note_length() {
        // single-line notes keep the classic offsets
        assert_eq!(trailing_block_metrics(1, true), (85.0, 55.0));
        assert_eq!(trailing_block_metrics(0, true), (85.0, 55.0));
        // four wrapped lines push the bank block below the last note line
        let (needed, bank_start) = trailing_block_metrics(4, true);
        assert_eq!(bank_start, 70.0);
        assert_eq!(needed, 100.0);
        // notes alone reserve through their last line
        assert_eq!(trailing_block_metrics(10, false).0, 42.0 + 9.0 * 5.0 + 5.0);
    }

    #[test]
    fn long_notes_push_trailing_blocks_to_more_pages() {
        let company = CompanyInfo::default();
        let short = generate_pdf_bytes(&sample_invoice(), &company).unwrap();

        // ~23 wrapped lines: the whole trailing unit moves to a second page
        let mut inv = sample_invoice();
        inv.notes = "lorem ipsum dolor sit amet ".repeat(75);
        let long = generate_pdf_bytes(&inv, &company).unwrap();
        assert!(long.len() > short.len());

        // notes taller than a full page continue onto further pages
        let mut inv = sample_invoice();
        inv.notes = "lorem ipsum dolor sit amet ".repeat(400);
        let very_long = generate_pdf_bytes(&inv, &company).unwrap();
        assert!(very_long.len() > long.len());
    }

    #[test]
    fn discount_column_formatting() {
        assert_eq!(format_discount(10.0), "10%");
        assert_eq!(format_discount(12.5), "12.5%");
        assert_eq!(format_discount(0.0), "0%");
    }

    #[test]
    fn wrapping_respects_column_width() {
        let lines = wrap_text_lines("Cordless Drill X200 heavy duty kit", 11);
        assert!(lines.len() > 1);
        for l in &lines {
            assert!(l.len() <= 11 || !l.contains(' '));
        }
    }
}
