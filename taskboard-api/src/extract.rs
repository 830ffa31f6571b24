/// Request extractors
///
/// [`ValidJson`] replaces `axum::Json` on every endpoint that takes a body:
/// it deserializes, runs the `validator` rules, and reports both kinds of
/// failure as `422` with the standard error body.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// JSON body that has passed validation
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(length(min = 3, max = 30, message = "Title must be 3-30 characters"))]
        title: String,
    }

    fn request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body() {
        let ValidJson(payload) = ValidJson::<Payload>::from_request(request(r#"{"title":"Launch"}"#), &())
            .await
            .unwrap();
        assert_eq!(payload.title, "Launch");
    }

    #[tokio::test]
    async fn test_rule_violation_is_validation_error() {
        let err = ValidJson::<Payload>::from_request(request(r#"{"title":"ab"}"#), &())
            .await
            .unwrap_err();

        match err {
            ApiError::ValidationError(details) => {
                assert_eq!(details[0].field, "title");
                assert_eq!(details[0].message, "Title must be 3-30 characters");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_field_is_validation_error() {
        let err = ValidJson::<Payload>::from_request(request("{}"), &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));

        let err = ValidJson::<Payload>::from_request(request("not json"), &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }
}
