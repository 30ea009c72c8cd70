use crate::csv_import::csv_to_triples;
use crate::query::{delete_data, insert_data, QueryForm};
use crate::results::{decode_json_results, decode_n_triples};
use crate::{DriverError, EndpointTechnology, Solutions};
use logre_model::{PrefixTable, Triple};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout of a single request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";
const N_TRIPLES: &str = "application/n-triples";
const N_QUADS: &str = "application/n-quads";
const TURTLE: &str = "text/turtle";

/// HTTP basic authentication credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// A client of one SPARQL endpoint.
///
/// The driver turns user queries into HTTP requests and decodes their answers. Every request is
/// prefixed with the `PREFIX` declarations of the [`PrefixTable`] it is given, and every IRI in
/// the answer is shortened with the same table.
///
/// Cloning a driver is cheap and shares the underlying connection pool.
#[derive(Clone, Debug)]
pub struct SparqlDriver {
    technology: EndpointTechnology,
    url: String,
    credentials: Option<Credentials>,
    verbose: bool,
    client: Client,
}

impl SparqlDriver {
    /// Creates a driver for the endpoint at `url`.
    pub fn new(technology: EndpointTechnology, url: impl Into<String>) -> Self {
        Self {
            technology,
            url: url.into().trim_end_matches('/').to_owned(),
            credentials: None,
            verbose: false,
            client: build_client(DEFAULT_TIMEOUT),
        }
    }

    /// Authenticates every request. An empty username disables authentication.
    #[must_use]
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = (!username.is_empty()).then(|| Credentials {
            username: username.to_owned(),
            password: password.to_owned(),
        });
        self
    }

    /// Logs every request at `INFO` level instead of `DEBUG`.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    pub fn technology(&self) -> EndpointTechnology {
        self.technology
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// The URL RDF documents are uploaded to.
    pub fn upload_url(&self) -> String {
        self.technology.upload_url(&self.url)
    }

    /// Executes `query`.
    ///
    /// Read queries return their solutions. `ASK` queries return a single row with a `boolean`
    /// binding. `CONSTRUCT` and `DESCRIBE` queries return one row per triple with the `subject`,
    /// `predicate` and `object` bindings. Updates return [`None`].
    pub async fn run(
        &self,
        query: &str,
        prefixes: &PrefixTable,
    ) -> Result<Option<Solutions>, DriverError> {
        let form = QueryForm::of(query);
        let text = format!(
            "{}{}{query}",
            self.technology.extra_declarations(),
            prefixes.to_sparql()
        );
        self.log_request(&text);

        match form {
            QueryForm::Update => {
                let request = self.client.post(&self.url).form(&[("update", text)]);
                self.send(request).await?;
                Ok(None)
            }
            QueryForm::Construct => {
                let request = self
                    .client
                    .post(&self.url)
                    .header(ACCEPT, N_TRIPLES)
                    .form(&[("query", text)]);
                let body = self
                    .send(request)
                    .await?
                    .bytes()
                    .await
                    .map_err(DriverError::from_transport)?;
                decode_n_triples(&body, prefixes).map(Some)
            }
            QueryForm::Select | QueryForm::Ask => {
                let request = self
                    .client
                    .post(&self.url)
                    .header(ACCEPT, SPARQL_RESULTS_JSON)
                    .form(&[("query", text)]);
                let body = self
                    .send(request)
                    .await?
                    .bytes()
                    .await
                    .map_err(DriverError::from_transport)?;
                decode_json_results(&body, prefixes).map(Some)
            }
        }
    }

    /// Inserts `triples` into `graph` (or the default graph), in chunks.
    ///
    /// On AllegroGraph, which keeps duplicate triples, the triples are deleted first so that each
    /// triple is stored at most once. The two steps are not atomic: if the insert fails, the
    /// triples stay deleted.
    pub async fn insert(
        &self,
        triples: &[Triple],
        graph: Option<&str>,
        prefixes: &PrefixTable,
    ) -> Result<(), DriverError> {
        if triples.is_empty() {
            return Ok(());
        }
        if self.technology.replaces_on_insert() {
            self.delete(triples, graph, prefixes).await?;
        }
        for request in insert_data(triples, graph, prefixes)? {
            self.run(&request, prefixes).await?;
        }
        Ok(())
    }

    /// Deletes `triples` from `graph` (or the default graph), in chunks.
    ///
    /// Triples containing variables are patterns and delete every matching triple.
    pub async fn delete(
        &self,
        triples: &[Triple],
        graph: Option<&str>,
        prefixes: &PrefixTable,
    ) -> Result<(), DriverError> {
        for request in delete_data(triples, graph, prefixes)? {
            self.run(&request, prefixes).await?;
        }
        Ok(())
    }

    /// Downloads the whole store as N-Quads.
    pub async fn dump(&self) -> Result<String, DriverError> {
        let request = self.client.get(self.upload_url()).header(ACCEPT, N_QUADS);
        debug!(url = %self.upload_url(), "Dumping the endpoint");
        self.send(request)
            .await?
            .text()
            .await
            .map_err(DriverError::from_transport)
    }

    /// Uploads an N-Quads document. Graphs are taken from the quads.
    pub async fn upload_nquads(&self, body: String) -> Result<(), DriverError> {
        info!(url = %self.upload_url(), bytes = body.len(), "Uploading N-Quads");
        let request = self
            .client
            .post(self.upload_url())
            .header(CONTENT_TYPE, N_QUADS)
            .body(body);
        self.send(request).await.map(drop)
    }

    /// Uploads a Turtle document into `graph` (or the default graph).
    pub async fn upload_turtle(
        &self,
        body: String,
        graph: Option<&str>,
    ) -> Result<(), DriverError> {
        info!(url = %self.upload_url(), graph, bytes = body.len(), "Uploading Turtle");
        let mut request = self
            .client
            .post(self.upload_url())
            .header(CONTENT_TYPE, TURTLE)
            .body(body);
        request = match graph {
            Some(graph) => request.query(&[self.technology.graph_parameter(graph)]),
            None if self.technology == EndpointTechnology::Fuseki => {
                request.query(&[("default", "")])
            }
            None => request,
        };
        self.send(request).await.map(drop)
    }

    /// Imports a CSV document into `graph` (or the default graph) and returns the number of
    /// inserted triples.
    ///
    /// See [`csv_to_triples`] for the expected layout. Nothing is written if the document is
    /// malformed.
    pub async fn upload_csv(
        &self,
        body: &str,
        graph: Option<&str>,
        prefixes: &PrefixTable,
    ) -> Result<usize, DriverError> {
        let triples = csv_to_triples(body, prefixes)?;
        info!(triples = triples.len(), graph, "Importing CSV");
        self.insert(&triples, graph, prefixes).await?;
        Ok(triples.len())
    }

    fn log_request(&self, text: &str) {
        if self.verbose {
            info!(endpoint = %self.url, "{text}");
        } else {
            debug!(endpoint = %self.url, "{text}");
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, DriverError> {
        let request = match &self.credentials {
            Some(credentials) => {
                request.basic_auth(&credentials.username, Some(&credentials.password))
            }
            None => request,
        };
        let response = request.send().await.map_err(DriverError::from_transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(DriverError::Http {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_owned(),
            body,
        })
    }
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}
