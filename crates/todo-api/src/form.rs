use std::collections::HashMap;

use axum::{
    Form,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};

use crate::error::ApiError;

/// A file part from a multipart body.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

/// Fields of `POST /add`, read from either a multipart or an urlencoded body.
/// Any other body type yields an empty form.
#[derive(Debug, Default)]
pub struct AddTodoForm {
    pub content: Option<String>,
    pub pasted_image: Option<String>,
    pub image: Option<UploadedFile>,
    pub category_id: Option<String>,
}

impl<S> FromRequest<S> for AddTodoForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|r| rejected(r.status(), r.body_text()))?;
            read_multipart(multipart).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(mut fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|r| rejected(r.status(), r.body_text()))?;
            Ok(Self {
                content: fields.remove("content"),
                pasted_image: fields.remove("pasted_image"),
                image: None,
                category_id: fields.remove("category_id"),
            })
        } else {
            Ok(Self::default())
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<AddTodoForm, ApiError> {
    let mut form = AddTodoForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejected(e.status(), e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        let slot = match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                form.image.get_or_insert(UploadedFile { filename, bytes });
                continue;
            }
            "content" => &mut form.content,
            "pasted_image" => &mut form.pasted_image,
            "category_id" => &mut form.category_id,
            _ => continue,
        };

        let text = field
            .text()
            .await
            .map_err(|e| rejected(e.status(), e.body_text()))?;
        slot.get_or_insert(text);
    }

    Ok(form)
}

fn rejected(status: axum::http::StatusCode, message: String) -> ApiError {
    ApiError::Rejected { status, message }
}
