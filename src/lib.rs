//! A client for PostgREST-style table endpoints, such as the `rest/v1` API of
//! a [Supabase](https://supabase.com) project.
//!
//! Filters and selections are built with [`Filter`] and [`Query`], and
//! serialized into PostgREST query parameters (`select=a,b`,
//! `age=gte.18`). Pagination uses the `Range` header, via [`RowRange`].
//!
//! # Using the client
//!
//! ```no_run
//! use serde_json::json;
//! use supatable::{Client, Filter, Profile, RowRange, rows::Row};
//!
//! # fn main() -> anyhow::Result<()> {
//! let profile = Profile::from_default_env()?.with_table("users");
//! let client = Client::new(profile);
//!
//! let rows = client.read(["id", "name"], Some(RowRange::new(0, 9)))?;
//! println!("{rows}");
//!
//! let values: Row = serde_json::from_value(json!({"name": "Jane"}))?;
//! client.update(values, Filter::new("id", "eq", 1)?)?;
//! # Ok(())
//! # }
//! ```
//!
//! # HTTP Requests and Responses
//!
//! The request types in [`rows`] work with any HTTP client that uses the
//! [`http`] crate. Use [`TableRequest::into_request`] to create a request,
//! [`check_status`] to reject error responses, and
//! [`TableResponse::from_response`] to read the body.
//!
//! ```no_run
//! use supatable::{Profile, Query, TableRequest, TableResponse, check_status, rows::Select};
//!
//! # fn main() -> anyhow::Result<()> {
//! let profile = Profile::new("abcdefgh", "anon-key", Some("users"))?;
//!
//! let req = Select {
//!     query: Query::SelectAll,
//!     range: None,
//! };
//!
//! let http_req = req.into_request(&profile)?;
//! let resp = ureq::run(http_req)?;
//! let (parts, mut body) = resp.into_parts();
//! let resp = http::Response::from_parts(parts, body.read_to_string()?);
//!
//! let rows = serde_json::Value::from_response(check_status(resp)?)?;
//! println!("{rows}");
//! # Ok(())
//! # }
//! ```

#![warn(
    anonymous_parameters,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    single_use_lifetimes,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_qualifications,
    variant_size_differences
)]

mod api;
mod client;
pub mod config;
mod transport;

pub use api::*;
pub use client::Client;
pub use config::Profile;
pub use transport::*;
