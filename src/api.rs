use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Serialize, de::DeserializeOwned};

use crate::Profile;

mod error;
mod filter;
mod paginate;
mod query;
pub mod rows;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::*;
pub use filter::*;
pub use paginate::*;
pub use query::*;

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Implemented by types that can be sent as requests to a table endpoint.
pub trait TableRequest: Sized {
    /// The corresponding response type.
    type Response: TableResponse;

    /// The method to use.
    fn method(&self) -> http::Method {
        http::Method::GET
    }

    /// The query parameters, derived fresh for every request.
    fn query(&self) -> Result<QueryParams, Error> {
        Ok(QueryParams::default())
    }

    /// Extra headers for this request. These take precedence over the
    /// profile's headers.
    fn headers(&self) -> Result<HeaderMap, Error> {
        Ok(HeaderMap::new())
    }

    /// The serializable request body.
    fn body(&self) -> Option<impl Serialize> {
        None::<&()>
    }

    /// Consume the request and return an [http::Request] suitable for passing
    /// to your favorite HTTP client.
    ///
    /// Fails with [Error::MissingTable] if the profile isn't bound to a table.
    fn into_request(self, profile: &Profile) -> Result<http::Request<String>, Error> {
        let Some(table) = profile.table.as_deref() else {
            return Err(Error::MissingTable);
        };

        let query = self.query()?;
        let mut uri = format!(
            "{}{}",
            profile.base_url,
            utf8_percent_encode(table, PATH_SEGMENT)
        );
        if !query.is_empty() {
            uri.push('?');
            uri.push_str(&query.to_query_string());
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("apikey"),
            HeaderValue::from_str(&profile.api_key)?,
        );
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", profile.api_key))?,
        );
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&profile.user_agent)?,
        );

        let body = match self.body() {
            Some(body) => {
                let body_str = serde_json::to_string(&body).map_err(Error::Encode)?;
                headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body_str.len()));
                body_str
            }
            None => String::new(),
        };

        // Replaces any existing values for the same names.
        headers.extend(self.headers()?);

        let mut req = http::Request::builder()
            .method(self.method())
            .uri(uri)
            .body(body)?;
        *req.headers_mut() = headers;

        Ok(req)
    }
}

/// Implemented by types that can be read from a successful response.
pub trait TableResponse: Sized {
    /// Read the response from an [http::Response] whose status has already
    /// been checked.
    fn from_response(resp: http::Response<String>) -> Result<Self, Error>;
}

impl TableResponse for serde_json::Value {
    fn from_response(resp: http::Response<String>) -> Result<Self, Error> {
        if resp.body().trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }

        decode_json(resp)
    }
}

impl TableResponse for String {
    fn from_response(resp: http::Response<String>) -> Result<Self, Error> {
        Ok(resp.into_body())
    }
}

impl TableResponse for () {
    fn from_response(_resp: http::Response<String>) -> Result<Self, Error> {
        Ok(())
    }
}

/// Decode a JSON response body into any deserializable type.
pub fn decode_json<T: DeserializeOwned>(resp: http::Response<String>) -> Result<T, Error> {
    let status = resp.status();
    serde_json::from_str(resp.body()).map_err(|e| {
        tracing::error!("Failed to parse response: {e:#?}");
        Error::InvalidResponse(status, e)
    })
}

/// Fail with [Error::Request] if the response status isn't a success.
pub fn check_status(resp: http::Response<String>) -> Result<http::Response<String>, Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(Error::Request {
            status,
            body: resp.into_body(),
        })
    }
}
