use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio_util::io::ReaderStream;

use crate::error::ApiError;
use crate::range::{parse_range, ByteRange};
use crate::state::ApiState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    Attachment,
    Inline,
}

/// Download a file as an attachment. Honors single-range `Range` headers.
pub async fn download(
    State(state): State<ApiState>,
    Path(file_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    serve_blob(&state, &file_id, &headers, Disposition::Attachment).await
}

/// Stream a file body, optionally a byte range of it. Shared by the
/// download and video-streaming endpoints; they differ only in the
/// Content-Disposition they send.
pub(crate) async fn serve_blob(
    state: &ApiState,
    file_id: &str,
    headers: &HeaderMap,
    disposition: Disposition,
) -> Result<Response, ApiError> {
    let record = state
        .db
        .get_file(file_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("file not found: {}", file_id)))?;

    if !record.is_available() {
        return Err(ApiError::not_found(format!(
            "file not available: {}",
            file_id
        )));
    }

    let mut file = state.store.open(&record.storage_path).await?;
    let size = file
        .metadata()
        .await
        .map_err(|e| ApiError::internal(format!("stat failed: {}", e)))?
        .len();

    let range_header = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok());

    let range = parse_range(range_header, size);

    // A fresh download, not a resumed tail fetch.
    let counts_as_download = matches!(
        range,
        ByteRange::Full | ByteRange::Segment { start: 0, .. }
    );
    if disposition == Disposition::Attachment && counts_as_download {
        state.db.bump_download_count(file_id).await?;
    }

    let builder = Response::builder()
        .header(header::CONTENT_TYPE, record.mime_type.as_str())
        .header(header::ACCEPT_RANGES, "bytes")
        .header(
            header::CONTENT_DISPOSITION,
            disposition_header(disposition, &record.filename),
        );

    let response = match range {
        ByteRange::Full => builder
            .status(StatusCode::OK)
            .header(header::CONTENT_LENGTH, size)
            .body(Body::from_stream(ReaderStream::new(file))),
        ByteRange::Segment { start, end } => {
            file.seek(SeekFrom::Start(start))
                .await
                .map_err(|e| ApiError::internal(format!("seek failed: {}", e)))?;
            let len = end - start + 1;

            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_LENGTH, len)
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", start, end, size),
                )
                .body(Body::from_stream(ReaderStream::new(file.take(len))))
        }
        ByteRange::Unsatisfiable => Response::builder()
            .status(StatusCode::RANGE_NOT_SATISFIABLE)
            .header(header::CONTENT_RANGE, format!("bytes */{}", size))
            .body(Body::empty()),
    };

    response.map_err(|e| ApiError::internal(format!("response build failed: {}", e)))
}

fn disposition_header(disposition: Disposition, filename: &str) -> String {
    // Quotes inside the filename would break the quoted-string form.
    let safe = filename.replace('"', "_");
    match disposition {
        Disposition::Attachment => format!("attachment; filename=\"{}\"", safe),
        Disposition::Inline => format!("inline; filename=\"{}\"", safe),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_header() {
        assert_eq!(
            disposition_header(Disposition::Attachment, "a.txt"),
            "attachment; filename=\"a.txt\""
        );
        assert_eq!(
            disposition_header(Disposition::Inline, "we\"ird.mp4"),
            "inline; filename=\"we_ird.mp4\""
        );
    }
}
