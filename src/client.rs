use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    AsyncTransport, Error, Filter, HttpTransport, Profile, Query, RowRange, TableRequest,
    TableResponse, Transport, check_status, decode_json, paginate,
    rows::{Delete, Insert, Row, Rows, Select, Update},
};

/// A client bound to one table endpoint.
///
/// Every operation builds a request value (see [`rows`](crate::rows)) and
/// drives it through [`Client::send`] or [`Client::send_async`], so the
/// blocking and non-blocking variants put identical requests on the wire.
#[derive(Debug, Clone)]
pub struct Client<T = HttpTransport> {
    profile: Profile,
    transport: T,
}

impl Client {
    /// Create a client using the default [`HttpTransport`].
    pub fn new(profile: Profile) -> Self {
        Self::with_transport(profile, HttpTransport::default())
    }
}

impl<T> Client<T> {
    /// Create a client that sends requests through `transport`.
    pub fn with_transport(profile: Profile, transport: T) -> Self {
        Self { profile, transport }
    }

    /// The profile requests are built from.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// The bound table, if any.
    pub fn table(&self) -> Option<&str> {
        self.profile.table.as_deref()
    }

    /// Bind (or rebind) the client to a table.
    pub fn set_table(&mut self, table: impl Into<String>) {
        self.profile.table = Some(table.into());
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport> Client<T> {
    /// Send a request and check the response status. Returns the raw
    /// response on success.
    ///
    /// Fails with [`Error::MissingTable`] before any I/O if the client isn't
    /// bound to a table, and with [`Error::Request`] on any non-success
    /// status.
    pub fn send<R: TableRequest>(&self, req: R) -> Result<http::Response<String>, Error> {
        let req = req.into_request(&self.profile)?;
        debug!(method = %req.method(), uri = %req.uri(), "sending request");

        let resp = self.transport.execute(req)?;
        check_status(resp)
    }

    /// Send a request and decode its response.
    pub fn roundtrip<R: TableRequest>(&self, req: R) -> Result<R::Response, Error> {
        let resp = self.send(req)?;
        R::Response::from_response(resp)
    }

    /// Read rows from the table, returning the decoded JSON body.
    ///
    /// ```no_run
    /// # use supatable::{Client, Filter, Profile, RowRange};
    /// # fn main() -> anyhow::Result<()> {
    /// let client = Client::new(Profile::from_default_env()?);
    /// let adults = client.read(Filter::new("age", "gte", 18)?, Some(RowRange::new(0, 9)))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn read(
        &self,
        query: impl Into<Query>,
        range: Option<RowRange>,
    ) -> Result<serde_json::Value, Error> {
        self.roundtrip(Select {
            query: query.into(),
            range,
        })
    }

    /// Like [`Client::read`], but decodes the body into `D`.
    pub fn read_as<D: DeserializeOwned>(
        &self,
        query: impl Into<Query>,
        range: Option<RowRange>,
    ) -> Result<D, Error> {
        let resp = self.send(Select {
            query: query.into(),
            range,
        })?;

        decode_json(resp)
    }

    /// Walk the table in windows of `page_size` rows, yielding one row at a
    /// time. Stops after a short page, or once `limit` rows were yielded.
    pub fn read_pages(
        &self,
        query: impl Into<Query>,
        page_size: u64,
        limit: Option<usize>,
    ) -> impl Iterator<Item = Result<serde_json::Value, Error>> {
        let query = query.into();
        paginate(page_size, limit, move |range| {
            let page = self.read(query.clone(), Some(range))?;
            Ok(page_rows(page))
        })
    }

    /// Insert one or many rows. Returns the raw response text, which depends
    /// on the preference sent with `upsert`.
    pub fn insert(
        &self,
        rows: impl Into<Rows>,
        filters: impl Into<Vec<Filter>>,
        upsert: bool,
    ) -> Result<String, Error> {
        self.roundtrip(Insert {
            rows: rows.into(),
            filters: filters.into(),
            upsert,
        })
    }

    /// Overwrite fields on the rows matching `filters`, returning the updated
    /// rows. At least one filter is required.
    pub fn update(
        &self,
        values: Row,
        filters: impl Into<Vec<Filter>>,
    ) -> Result<serde_json::Value, Error> {
        self.roundtrip(Update {
            values,
            filters: filters.into(),
        })
    }

    /// Delete the rows matching `filters`. At least one filter is required.
    pub fn delete(&self, filters: impl Into<Vec<Filter>>) -> Result<(), Error> {
        self.roundtrip(Delete {
            filters: filters.into(),
        })
    }
}

impl<T: AsyncTransport> Client<T> {
    /// The non-blocking version of [`Client::send`].
    pub async fn send_async<R: TableRequest>(
        &self,
        req: R,
    ) -> Result<http::Response<String>, Error> {
        let req = req.into_request(&self.profile)?;
        debug!(method = %req.method(), uri = %req.uri(), "sending request");

        let resp = self.transport.execute_async(req).await?;
        check_status(resp)
    }

    /// The non-blocking version of [`Client::roundtrip`].
    pub async fn roundtrip_async<R: TableRequest>(&self, req: R) -> Result<R::Response, Error> {
        let resp = self.send_async(req).await?;
        R::Response::from_response(resp)
    }

    /// The non-blocking version of [`Client::read`].
    pub async fn read_async(
        &self,
        query: impl Into<Query>,
        range: Option<RowRange>,
    ) -> Result<serde_json::Value, Error> {
        self.roundtrip_async(Select {
            query: query.into(),
            range,
        })
        .await
    }

    /// The non-blocking version of [`Client::read_as`].
    pub async fn read_as_async<D: DeserializeOwned>(
        &self,
        query: impl Into<Query>,
        range: Option<RowRange>,
    ) -> Result<D, Error> {
        let resp = self
            .send_async(Select {
                query: query.into(),
                range,
            })
            .await?;

        decode_json(resp)
    }

    /// The non-blocking version of [`Client::insert`].
    pub async fn insert_async(
        &self,
        rows: impl Into<Rows>,
        filters: impl Into<Vec<Filter>>,
        upsert: bool,
    ) -> Result<String, Error> {
        self.roundtrip_async(Insert {
            rows: rows.into(),
            filters: filters.into(),
            upsert,
        })
        .await
    }

    /// The non-blocking version of [`Client::update`].
    pub async fn update_async(
        &self,
        values: Row,
        filters: impl Into<Vec<Filter>>,
    ) -> Result<serde_json::Value, Error> {
        self.roundtrip_async(Update {
            values,
            filters: filters.into(),
        })
        .await
    }

    /// The non-blocking version of [`Client::delete`].
    pub async fn delete_async(&self, filters: impl Into<Vec<Filter>>) -> Result<(), Error> {
        self.roundtrip_async(Delete {
            filters: filters.into(),
        })
        .await
    }
}

/// Split a page into its rows. A non-array body counts as a single row.
fn page_rows(page: serde_json::Value) -> Vec<serde_json::Value> {
    match page {
        serde_json::Value::Array(rows) => rows,
        serde_json::Value::Null => Vec::new(),
        other => vec![other],
    }
}
