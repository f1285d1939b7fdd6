use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{
        FromRef, Multipart, State,
        multipart::{Field, MultipartError},
    },
    http::StatusCode,
};

use crate::{
    AppState, Error, UserID,
    receipt::{
        MAX_RECEIPT_SIZE, RECEIPT_FIELD,
        parse::{ScannedReceipt, parse_receipt_text},
        scanner::ReceiptScanner,
    },
};

/// The state needed for scanning receipts.
#[derive(Clone)]
pub struct ReceiptState {
    /// The service that reads the receipt images.
    pub scanner: Arc<dyn ReceiptScanner>,
}

impl FromRef<AppState> for ReceiptState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            scanner: state.receipt_scanner.clone(),
        }
    }
}

/// A route handler that extracts the amount, date and category from an
/// uploaded receipt image.
///
/// The image must be sent in the multipart field "receipt".
pub async fn scan_receipt_endpoint(
    State(state): State<ReceiptState>,
    Extension(user_id): Extension<UserID>,
    mut multipart: Multipart,
) -> Result<Json<ScannedReceipt>, Error> {
    let (image, mime_type) = read_receipt(&mut multipart).await?;

    tracing::info!(
        "User {user_id} uploaded a {} byte receipt ({mime_type})",
        image.len()
    );

    let text = state.scanner.scan(&image, &mime_type).await?;

    let receipt = parse_receipt_text(&text).inspect_err(|error| match error {
        Error::NotAReceipt => tracing::debug!("The scanner did not find a receipt"),
        error => tracing::error!("Could not parse scanner response {text:?}: {error}"),
    })?;

    Ok(Json(receipt))
}

/// Find the receipt field and return its bytes and content type.
async fn read_receipt(multipart: &mut Multipart) -> Result<(Vec<u8>, String), Error> {
    while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
        if field.name() != Some(RECEIPT_FIELD) {
            continue;
        }

        return read_image_field(field).await;
    }

    Err(Error::NoFileUploaded)
}

async fn read_image_field(field: Field<'_>) -> Result<(Vec<u8>, String), Error> {
    let mime_type = match field.content_type() {
        Some(mime_type) if mime_type.starts_with("image/") => mime_type.to_owned(),
        _ => return Err(Error::NotAnImage),
    };

    let data = field.bytes().await.map_err(map_multipart_error)?;

    if data.is_empty() {
        return Err(Error::NoFileUploaded);
    }

    if data.len() > MAX_RECEIPT_SIZE {
        return Err(Error::FileTooLarge);
    }

    Ok((data.to_vec(), mime_type))
}

fn map_multipart_error(error: MultipartError) -> Error {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::FileTooLarge
    } else {
        tracing::debug!("Could not read multipart form: {error}");
        Error::MultipartError(error.body_text())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Extension,
        body::Body,
        extract::{FromRequest, Multipart, State},
        http::Request,
    };
    use time::macros::datetime;

    use crate::{
        Error, UserID,
        receipt::{
            MAX_RECEIPT_SIZE,
            endpoint::{ReceiptState, scan_receipt_endpoint},
        },
        test_utils::StubScanner,
    };

    async fn must_make_multipart(name: &str, content_type: &str, data: &[u8]) -> Multipart {
        let boundary = "MY_BOUNDARY123456789";

        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"receipt\"\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        Multipart::from_request(request, &()).await.unwrap()
    }

    fn state_replying(reply: &str) -> ReceiptState {
        ReceiptState {
            scanner: Arc::new(StubScanner::replying(reply)),
        }
    }

    #[tokio::test]
    async fn returns_scanned_details() {
        let state = state_replying(
            "```json\n{\"amount\": 9.99, \"date\": \"2025-07-04\", \"category\": \"food\"}\n```",
        );
        let multipart = must_make_multipart("receipt", "image/jpeg", b"jpeg bytes").await;

        let response = scan_receipt_endpoint(State(state), Extension(UserID::new(1)), multipart)
            .await
            .unwrap();

        assert_eq!(response.amount, Some(9.99));
        assert_eq!(response.date, Some(datetime!(2025-07-04 00:00 UTC)));
        assert_eq!(response.category.as_deref(), Some("food"));
    }

    #[tokio::test]
    async fn rejects_non_images() {
        let multipart = must_make_multipart("receipt", "application/pdf", b"%PDF").await;

        let result =
            scan_receipt_endpoint(State(state_replying("{}")), Extension(UserID::new(1)), multipart)
                .await;

        assert!(matches!(result, Err(Error::NotAnImage)));
    }

    #[tokio::test]
    async fn rejects_missing_file() {
        let multipart = must_make_multipart("other", "image/png", b"png bytes").await;

        let result =
            scan_receipt_endpoint(State(state_replying("{}")), Extension(UserID::new(1)), multipart)
                .await;

        assert!(matches!(result, Err(Error::NoFileUploaded)));
    }

    // Without a route body limit the default limit of axum applies, which is
    // below the receipt size limit.
    #[tokio::test]
    async fn body_limit_error_is_file_too_large() {
        let data = vec![0; MAX_RECEIPT_SIZE + 1];
        let multipart = must_make_multipart("receipt", "image/png", &data).await;

        let result =
            scan_receipt_endpoint(State(state_replying("{}")), Extension(UserID::new(1)), multipart)
                .await;

        assert!(matches!(result, Err(Error::FileTooLarge)));
    }

    #[tokio::test]
    async fn empty_reply_is_not_a_receipt() {
        let multipart = must_make_multipart("receipt", "image/png", b"png bytes").await;

        let result =
            scan_receipt_endpoint(State(state_replying("{}")), Extension(UserID::new(1)), multipart)
                .await;

        assert!(matches!(result, Err(Error::NotAReceipt)));
    }
}
