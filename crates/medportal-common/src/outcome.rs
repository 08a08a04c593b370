//! `{data, error}` result shape
//!
//! Results crossing the boundary between the portal core and its HTTP
//! clients are serialized as `{"data": ..., "error": null}` or
//! `{"data": null, "error": ...}`. Exactly one side is ever populated.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt::Display;
use std::future::Future;

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T, E>(Result<T, E>);

impl<T, E> Outcome<T, E> {
    pub fn success(data: T) -> Self {
        Self(Ok(data))
    }

    pub fn failure(error: E) -> Self {
        Self(Err(error))
    }

    pub fn is_success(&self) -> bool {
        self.0.is_ok()
    }

    pub fn data(&self) -> Option<&T> {
        self.0.as_ref().ok()
    }

    pub fn error(&self) -> Option<&E> {
        self.0.as_ref().err()
    }

    pub fn into_result(self) -> Result<T, E> {
        self.0
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        Self(result)
    }
}

impl<T: Serialize, E: Serialize> Serialize for Outcome<T, E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Outcome", 2)?;
        match &self.0 {
            Ok(data) => {
                state.serialize_field("data", data)?;
                state.serialize_field("error", &None::<()>)?;
            }
            Err(error) => {
                state.serialize_field("data", &None::<()>)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

/// Await a fallible operation and fold it into an [`Outcome`], rendering the
/// error as its display message.
pub async fn attempt<T, E, F>(operation: F) -> Outcome<T, String>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match operation.await {
        Ok(data) => Outcome::success(data),
        Err(err) => Outcome::failure(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_shape() {
        let outcome: Outcome<u32, String> = Outcome::success(7);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!({ "data": 7, "error": null }));
    }

    #[test]
    fn test_failure_shape() {
        let outcome: Outcome<u32, String> = Outcome::failure("boom".into());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!({ "data": null, "error": "boom" }));
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_attempt_folds_error_message() {
        let outcome = attempt(async { Err::<(), _>(std::io::Error::other("disk gone")) }).await;
        assert_eq!(outcome.error().map(String::as_str), Some("disk gone"));

        let outcome = attempt(async { Ok::<_, std::io::Error>("ok") }).await;
        assert_eq!(outcome.into_result(), Ok("ok"));
    }
}
