//! Import file intake: type/size allowlist before anything is uploaded.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::ImportError;

/// Accepted extensions (csv and txt for the template round-trip)
pub const ALLOWED_EXTENSIONS: &[&str] = &["xlsx", "xls", "csv", "txt"];

const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "text/csv",
    "text/plain",
];

/// Maximum upload size when none is configured (5 MiB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// Column header of the import template
pub const TEMPLATE_HEADER: &[&str] = &["matricule", "firstName", "lastName", "dateOfBirth", "program"];

/// A spreadsheet accepted for upload
#[derive(Debug, Clone)]
pub struct ImportFile {
    pub path: PathBuf,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImportFile {
    /// Read `path` after checking its type and size
    pub async fn load(path: &Path, max_bytes: u64) -> Result<Self, ImportError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = check_type(path, &file_name)?;

        let size = fs::metadata(path).await?.len();
        if size == 0 {
            return Err(ImportError::EmptyFile(file_name));
        }
        if size > max_bytes {
            return Err(ImportError::TooLarge {
                size,
                max: max_bytes,
            });
        }

        let bytes = fs::read(path).await?;
        debug!(file = %file_name, %mime, size, "Import file accepted");
        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            mime,
            bytes,
        })
    }

    /// Whether the file is plain text (csv/txt)
    pub fn is_text(&self) -> bool {
        self.mime.starts_with("text/")
    }

    /// Number of data rows for text files; spreadsheets are only parsed
    /// server-side.
    pub fn count_data_rows(&self) -> Option<usize> {
        if !self.is_text() {
            return None;
        }
        Some(count_data_rows(&String::from_utf8_lossy(&self.bytes)))
    }
}

/// Check the extension and guessed MIME type, returning the MIME type
pub fn check_type(path: &Path, file_name: &str) -> Result<String, ImportError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ImportError::UnsupportedType(file_name.to_string()));
    }

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let essence = mime.essence_str();
    if !ALLOWED_MIME_TYPES.contains(&essence) {
        return Err(ImportError::UnsupportedType(file_name.to_string()));
    }
    Ok(essence.to_string())
}

/// Data rows of a delimited text file: non-blank lines after the header
pub fn count_data_rows(content: &str) -> usize {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .count()
        .saturating_sub(1)
}

/// Template file content: the header row only
pub fn template_csv() -> String {
    format!("{}\n", TEMPLATE_HEADER.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_type_allowlist() {
        for name in ["etudiants.xlsx", "ETUDIANTS.XLS", "export.csv", "modele.txt"] {
            assert!(check_type(Path::new(name), name).is_ok(), "{}", name);
        }
        for name in ["photo.png", "notes.pdf", "noextension", "archive.xlsx.zip"] {
            assert!(
                matches!(
                    check_type(Path::new(name), name),
                    Err(ImportError::UnsupportedType(_))
                ),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_count_data_rows() {
        assert_eq!(count_data_rows("matricule,firstName\n12345,Awa\n\n1234567,Modou\n"), 2);
        assert_eq!(count_data_rows("matricule,firstName\n"), 0);
        assert_eq!(count_data_rows(""), 0);
    }

    #[test]
    fn test_template() {
        let template = template_csv();
        assert!(template.starts_with("matricule,"));
        assert_eq!(count_data_rows(&template), 0);
    }

    #[tokio::test]
    async fn test_load_checks_size() {
        let temp_dir = tempfile::tempdir().unwrap();

        let empty = temp_dir.path().join("vide.csv");
        std::fs::write(&empty, "").unwrap();
        assert!(matches!(
            ImportFile::load(&empty, 1024).await,
            Err(ImportError::EmptyFile(_))
        ));

        let big = temp_dir.path().join("gros.csv");
        std::fs::write(&big, "x".repeat(2048)).unwrap();
        assert!(matches!(
            ImportFile::load(&big, 1024).await,
            Err(ImportError::TooLarge { size: 2048, max: 1024 })
        ));

        let ok = temp_dir.path().join("ok.csv");
        std::fs::write(&ok, "matricule\n12345\n").unwrap();
        let file = ImportFile::load(&ok, 1024).await.unwrap();
        assert_eq!(file.file_name, "ok.csv");
        assert_eq!(file.mime, "text/csv");
        assert_eq!(file.count_data_rows(), Some(1));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = ImportFile::load(Path::new("/definitely/missing.xlsx"), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::Io(_)));
    }
}
