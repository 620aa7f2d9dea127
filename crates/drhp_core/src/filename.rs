use crate::state::strip_pdf_extension;

const REPORT_SUFFIX: &str = "_IPO_Notes.pdf";

/// Download name for a report generated from an uploaded file: `{stem}_IPO_Notes.pdf`.
pub fn source_report_filename(file_name: &str) -> String {
    let stem = sanitize_stem(strip_pdf_extension(file_name));
    format!("{stem}{REPORT_SUFFIX}")
}

/// Download name for a stored company report; every non-alphanumeric character becomes `_`.
pub fn company_report_filename(company_name: &str) -> String {
    let mut cleaned: String = company_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        cleaned = "Report".to_string();
    }
    format!("{cleaned}{REPORT_SUFFIX}")
}

fn sanitize_stem(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&[' ', '.'][..]);
    if cleaned.is_empty() {
        "Report".to_string()
    } else {
        cleaned.to_string()
    }
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}
