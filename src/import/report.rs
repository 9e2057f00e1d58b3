//! Text rendering of an import result.

use std::fmt::Write;

use super::ImportResult;

/// Render the three counts, then one line per rejected row.
pub fn render(result: &ImportResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Import Result ===");
    let _ = writeln!(out);
    let _ = writeln!(out, "  Imported:    {}", result.imported);
    let _ = writeln!(out, "  Duplicates:  {}", result.duplicates);
    let _ = writeln!(out, "  Errors:      {}", result.errors);

    let listed = result.details.duplicates.len();
    if result.duplicates > 0 || listed > 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "Duplicates (matricule already registered):");
        if listed > 0 {
            let _ = writeln!(out, "  {:<8}  {:<10}  {}", "LINE", "MATRICULE", "NAME");
        }
        for row in &result.details.duplicates {
            let _ = writeln!(
                out,
                "  {:<8}  {:<10}  {}",
                row.line,
                display_matricule(&row.matricule),
                row.name
            );
        }
        write_unlisted(&mut out, result.duplicates, listed, "duplicate");
    }

    let listed = result.details.errors.len();
    if result.errors > 0 || listed > 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "Errors:");
        if listed > 0 {
            let _ = writeln!(out, "  {:<8}  {:<10}  {}", "LINE", "MATRICULE", "REASON");
        }
        for row in &result.details.errors {
            let _ = writeln!(
                out,
                "  {:<8}  {:<10}  {}",
                row.line,
                display_matricule(&row.matricule),
                row.error
            );
        }
        write_unlisted(&mut out, result.errors, listed, "error");
    }

    if result.has_rejections() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Fix the listed lines in the spreadsheet and upload it again."
        );
    }

    out
}

/// Note the rows the server counted in a bucket but did not detail
fn write_unlisted(out: &mut String, count: usize, listed: usize, noun: &str) {
    let missing = count.saturating_sub(listed);
    if missing > 0 {
        let plural = if missing == 1 { "" } else { "s" };
        let _ = writeln!(
            out,
            "  {} {}{} reported without line details",
            missing, noun, plural
        );
    }
}

fn display_matricule(matricule: &str) -> &str {
    if matricule.is_empty() {
        "-"
    } else {
        matricule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{DuplicateRow, ErrorRow, ImportDetails};

    #[test]
    fn test_render_lists_every_rejected_line() {
        let result = ImportResult {
            imported: 7,
            duplicates: 1,
            errors: 1,
            details: ImportDetails {
                duplicates: vec![DuplicateRow {
                    line: 3,
                    matricule: "1234567".to_string(),
                    name: "Awa Diop".to_string(),
                }],
                errors: vec![ErrorRow {
                    line: 5,
                    matricule: String::new(),
                    error: "Missing matricule".to_string(),
                }],
            },
        };

        let text = render(&result);
        assert!(text.contains("Imported:    7"));
        assert!(text.contains("3         1234567     Awa Diop"));
        assert!(text.contains("5         -           Missing matricule"));
        assert!(!text.contains("without line details"));
        assert!(text.contains("upload it again"));
    }

    #[test]
    fn test_clean_import_has_no_detail_panels() {
        let text = render(&ImportResult {
            imported: 4,
            ..ImportResult::default()
        });
        assert!(!text.contains("Duplicates ("));
        assert!(!text.contains("Errors:\n"));
        assert!(!text.contains("upload it again"));
    }

    #[test]
    fn test_counts_without_details_are_reported() {
        let text = render(&ImportResult {
            imported: 7,
            duplicates: 2,
            errors: 1,
            details: ImportDetails {
                duplicates: vec![DuplicateRow {
                    line: 3,
                    matricule: "2100001".to_string(),
                    name: "Moussa Sarr".to_string(),
                }],
                errors: Vec::new(),
            },
        });

        assert!(text.contains("Errors:\n"));
        assert!(text.contains("  1 error reported without line details"));
        assert!(!text.contains("REASON"));
        assert!(text.contains("3         2100001     Moussa Sarr"));
        assert!(text.contains("  1 duplicate reported without line details"));
        assert!(text.contains("upload it again"));
    }

    #[test]
    fn test_error_panel_without_any_rows() {
        let text = render(&ImportResult {
            imported: 0,
            duplicates: 0,
            errors: 3,
            details: ImportDetails::default(),
        });
        assert!(text.contains("  3 errors reported without line details"));
        assert!(!text.contains("Duplicates ("));
    }
}
