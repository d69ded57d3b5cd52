//! Canned responses and the sources that produce them.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use hyper::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::mock::MockError;
use crate::request::Request;

/// A response returned from the interception hook.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Empty response with the given status.
    pub fn with_status(status: StatusCode) -> Self {
        Self::new(status, HeaderMap::new(), Bytes::new())
    }

    /// Serialize `data` as the JSON body, with an `application/json` content type.
    pub fn json<T: Serialize + ?Sized>(
        data: &T,
        status: StatusCode,
    ) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(data)?;
        Ok(Self::encoded_json(
            body,
            status,
            HeaderValue::from_static("application/json"),
        ))
    }

    fn encoded_json(body: Vec<u8>, status: StatusCode, content_type: HeaderValue) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, content_type);
        Self::new(status, headers, body)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body as JSON.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

impl From<Response> for hyper::Response<Full<Bytes>> {
    fn from(response: Response) -> Self {
        let mut out = hyper::Response::new(Full::new(response.body));
        *out.status_mut() = response.status;
        *out.headers_mut() = response.headers;
        out
    }
}

type ResponseFn = dyn Fn(&Request) -> Response + Send + Sync;

type EncodeFn = dyn Fn() -> Result<Vec<u8>, serde_json::Error> + Send + Sync;

/// Where an expectation's response comes from.
#[derive(Clone)]
pub enum ResponseSource {
    /// The same response instance for every matching call.
    Fixed(Arc<Response>),
    /// An empty response with this status.
    Status(StatusCode),
    /// A JSON body serialized on each call.
    Json {
        encode: Arc<EncodeFn>,
        status: StatusCode,
    },
    /// Computed from the intercepted request.
    Computed(Arc<ResponseFn>),
}

impl Default for ResponseSource {
    fn default() -> Self {
        ResponseSource::Status(StatusCode::OK)
    }
}

impl ResponseSource {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        ResponseSource::Computed(Arc::new(f))
    }

    /// Serialize `data` whenever a response is produced. Encoding errors
    /// surface from interception as [`MockError::Json`].
    pub fn json<T>(data: T, status: StatusCode) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        ResponseSource::Json {
            encode: Arc::new(move || serde_json::to_vec(&data)),
            status,
        }
    }

    pub(crate) fn produce(
        &self,
        request: &Request,
        json_content_type: &HeaderValue,
    ) -> Result<Arc<Response>, MockError> {
        match self {
            ResponseSource::Fixed(response) => Ok(Arc::clone(response)),
            ResponseSource::Status(status) => Ok(Arc::new(Response::with_status(*status))),
            ResponseSource::Json { encode, status } => Ok(Arc::new(Response::encoded_json(
                encode()?,
                *status,
                json_content_type.clone(),
            ))),
            ResponseSource::Computed(f) => Ok(Arc::new(f(request))),
        }
    }
}

impl fmt::Debug for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseSource::Fixed(response) => f.debug_tuple("Fixed").field(response).finish(),
            ResponseSource::Status(status) => f.debug_tuple("Status").field(status).finish(),
            ResponseSource::Json { status, .. } => f
                .debug_struct("Json")
                .field("status", status)
                .finish_non_exhaustive(),
            ResponseSource::Computed(_) => f.write_str("Computed(<fn>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Method;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    fn any_request() -> Request {
        Request::new(Method::GET, "http://example.com/".parse().unwrap())
    }

    fn json_type() -> HeaderValue {
        HeaderValue::from_static("application/json")
    }

    #[test]
    fn test_fixed_response_keeps_identity() {
        let fixed = Arc::new(Response::new(
            StatusCode::OK,
            HeaderMap::new(),
            "interesting message",
        ));
        let source = ResponseSource::Fixed(Arc::clone(&fixed));

        let first = source.produce(&any_request(), &json_type()).unwrap();
        let second = source.produce(&any_request(), &json_type()).unwrap();
        assert!(Arc::ptr_eq(&fixed, &first));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_status_response_is_empty() {
        let source = ResponseSource::Status(StatusCode::from_u16(234).unwrap());
        let response = source.produce(&any_request(), &json_type()).unwrap();
        assert_eq!(response.status().as_u16(), 234);
        assert!(response.body().is_empty());
        assert!(response.headers().is_empty());
    }

    #[test]
    fn test_json_response_sets_content_type() {
        let source = ResponseSource::json(
            json!({"foo": "bar", "faz": ["baz", "shnaz"]}),
            StatusCode::OK,
        );
        let response = source.produce(&any_request(), &json_type()).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body: Value = response.json_body().unwrap();
        assert_eq!(body, json!({"foo": "bar", "faz": ["baz", "shnaz"]}));
    }

    #[test]
    fn test_json_response_encoding_error() {
        // JSON object keys must be strings
        let data = BTreeMap::from([((1u8, 2u8), "pair")]);
        let source = ResponseSource::json(data, StatusCode::OK);

        let err = source.produce(&any_request(), &json_type()).unwrap_err();
        assert!(matches!(err, MockError::Json(_)));
        assert!(err.to_string().starts_with("failed to encode JSON response"));
    }

    #[test]
    fn test_computed_response_sees_request_body() {
        let source = ResponseSource::computed(|request| {
            Response::new(StatusCode::CREATED, HeaderMap::new(), request.body().clone())
        });
        let request = any_request().with_body("echo me");
        let response = source.produce(&request, &json_type()).unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.text(), "echo me");
    }

    #[test]
    fn test_into_hyper_response() {
        let response = Response::json(&json!({"ok": true}), StatusCode::ACCEPTED).unwrap();
        let hyper_response: hyper::Response<Full<Bytes>> = response.into();
        assert_eq!(hyper_response.status(), StatusCode::ACCEPTED);
        assert_eq!(
            hyper_response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
