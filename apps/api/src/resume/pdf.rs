use anyhow::anyhow;

use crate::errors::AppError;

const PDF_MAGIC: &[u8] = b"%PDF";

pub fn looks_like_pdf(bytes: &[u8], filename: Option<&str>, content_type: Option<&str>) -> bool {
    bytes.starts_with(PDF_MAGIC)
        || content_type.is_some_and(|ct| ct.eq_ignore_ascii_case("application/pdf"))
        || filename.is_some_and(|f| f.to_lowercase().ends_with(".pdf"))
}

/// Extracts text from a PDF on the blocking pool. PDFs with no extractable
/// text (scanned images) are rejected as unprocessable.
pub async fn extract_pdf_text(bytes: Vec<u8>) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| {
            // pdf-extract panics on some malformed documents
            if e.is_panic() {
                AppError::UnprocessableEntity("could not read PDF".to_string())
            } else {
                AppError::Internal(anyhow!("PDF extraction task failed: {e}"))
            }
        })?
        .map_err(|e| AppError::UnprocessableEntity(format!("could not read PDF: {e}")))?;

    if text.trim().is_empty() {
        return Err(AppError::UnprocessableEntity(
            "PDF contains no extractable text".to_string(),
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_detection() {
        assert!(looks_like_pdf(b"%PDF-1.7 ...", None, None));
        assert!(looks_like_pdf(b"", Some("CV.PDF"), None));
        assert!(looks_like_pdf(b"", None, Some("application/pdf")));
        assert!(!looks_like_pdf(b"plain text", Some("cv.txt"), Some("text/plain")));
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_unprocessable() {
        let err = extract_pdf_text(b"%PDF-1.4 not really a pdf".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
    }
}
