use axum::extract::Multipart;

use crate::errors::AppError;
use crate::models::document::RawDocument;

const FILE_FIELD: &str = "file";
/// Undeclared uploads are accepted only if they carry the PDF magic bytes.
const UNKNOWN_MIME: &str = "application/octet-stream";

/// Reads the `file` field of a multipart upload into a `RawDocument`.
pub async fn read_pdf_upload(mut multipart: Multipart) -> Result<RawDocument, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid form data: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let mime_type = field.content_type().unwrap_or(UNKNOWN_MIME).to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read uploaded file: {e}")))?;

        return Ok(RawDocument::new(bytes, mime_type, file_name));
    }

    Err(AppError::Validation("No file provided".to_string()))
}
