use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use logre_driver::{EndpointTechnology, SparqlDriver};
use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{GraphName, NamedNode};
use oxigraph::sparql::results::QueryResultsFormat;
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::error;

const FORM: &str = "application/x-www-form-urlencoded";

/// A request received by a [`TestEndpoint`].
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    /// Decoded URL parameters.
    pub parameters: Vec<(String, String)>,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns a field of a form-encoded body.
    pub fn form_field(&self, name: &str) -> Option<String> {
        url::form_urlencoded::parse(self.body.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn is_update(&self) -> bool {
        self.form_field("update").is_some()
    }
}

#[derive(Clone)]
struct Shared {
    store: Store,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Shared {
    fn record(&self, request: RecordedRequest) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
    }
}

/// An in-process SPARQL endpoint backed by an in-memory store.
///
/// It speaks the subset of the SPARQL protocol and graph store protocol used by the three
/// supported back-ends:
/// - `POST /sparql` with a form-encoded `query` or `update`,
/// - `POST /sparql?graph=…` (Fuseki) and `POST /statements?context=<…>` (AllegroGraph, GraphDB)
///   to upload RDF documents,
/// - `GET` on the same URLs to dump the store as N-Quads.
///
/// Every request is recorded.
pub struct TestEndpoint {
    address: SocketAddr,
    shared: Shared,
    server: JoinHandle<()>,
}

impl TestEndpoint {
    pub async fn start() -> Result<Self> {
        let shared = Shared {
            store: Store::new()?,
            requests: Arc::default(),
        };
        let router = Router::new()
            .route("/sparql", get(dump).post(sparql))
            .route("/statements", get(dump).post(upload))
            .route("/sparql/statements", get(dump).post(upload))
            .with_state(shared.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        let server = tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, router).await {
                error!(%error, "Test endpoint stopped");
            }
        });
        Ok(Self {
            address,
            shared,
            server,
        })
    }

    /// The SPARQL endpoint URL.
    pub fn url(&self) -> String {
        format!("http://{}/sparql", self.address)
    }

    pub fn driver(&self, technology: EndpointTechnology) -> SparqlDriver {
        SparqlDriver::new(technology, self.url())
    }

    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_requests(&self) {
        self.shared
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Loads a document straight into the store, bypassing HTTP.
    pub fn load(&self, format: RdfFormat, graph: Option<&str>, body: &str) -> Result<()> {
        let graph = match graph {
            Some(graph) => GraphName::from(NamedNode::new(graph)?),
            None => GraphName::DefaultGraph,
        };
        self.shared
            .store
            .load_from_reader(RdfParser::from_format(format).with_default_graph(graph), body.as_bytes())
            .context("Failed to load test data")
    }

    /// Counts the triples of a named graph, or of the default graph.
    pub fn graph_len(&self, graph: Option<&str>) -> Result<usize> {
        let graph = match graph {
            Some(graph) => GraphName::from(NamedNode::new(graph)?),
            None => GraphName::DefaultGraph,
        };
        Ok(self
            .shared
            .store
            .quads_for_pattern(None, None, None, Some(graph.as_ref()))
            .count())
    }
}

impl Drop for TestEndpoint {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn parameters(uri: &Uri) -> Vec<(String, String)> {
    url::form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes())
        .into_owned()
        .collect()
}

fn record(shared: &Shared, method: Method, uri: &Uri, headers: &HeaderMap, body: &Bytes) -> RecordedRequest {
    let header = |name| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    };
    let request = RecordedRequest {
        method,
        path: uri.path().to_owned(),
        parameters: parameters(uri),
        content_type: header(header::CONTENT_TYPE),
        authorization: header(header::AUTHORIZATION),
        body: String::from_utf8_lossy(body).into_owned(),
    };
    shared.record(request.clone());
    request
}

fn bad_request(message: impl ToString) -> Response {
    (StatusCode::BAD_REQUEST, message.to_string()).into_response()
}

async fn dump(State(shared): State<Shared>, uri: Uri, headers: HeaderMap) -> Response {
    record(&shared, Method::GET, &uri, &headers, &Bytes::new());
    match shared.store.dump_to_writer(RdfFormat::NQuads, Vec::new()) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/n-quads")], body).into_response(),
        Err(error) => bad_request(error),
    }
}

async fn sparql(State(shared): State<Shared>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let request = record(&shared, Method::POST, &uri, &headers, &body);
    if !request
        .content_type
        .as_deref()
        .is_some_and(|content_type| content_type.starts_with(FORM))
    {
        return load(&shared, &request);
    }
    if let Some(update) = request.form_field("update") {
        return match shared.store.update(update.as_str()) {
            Ok(()) => StatusCode::NO_CONTENT.into_response(),
            Err(error) => bad_request(error),
        };
    }
    let Some(query) = request.form_field("query") else {
        return bad_request("Expected a query or an update");
    };
    let results = match shared.store.query(query.as_str()) {
        Ok(results) => results,
        Err(error) => return bad_request(error),
    };
    let answer = if matches!(results, QueryResults::Graph(_)) {
        results
            .write_graph(Vec::new(), RdfFormat::NTriples)
            .map(|body| ("application/n-triples", body))
    } else {
        results
            .write(Vec::new(), QueryResultsFormat::Json)
            .map(|body| ("application/sparql-results+json", body))
    };
    match answer {
        Ok((content_type, body)) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        Err(error) => bad_request(error),
    }
}

async fn upload(State(shared): State<Shared>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let request = record(&shared, Method::POST, &uri, &headers, &body);
    load(&shared, &request)
}

fn load(shared: &Shared, request: &RecordedRequest) -> Response {
    let format = match request.content_type.as_deref().unwrap_or_default() {
        content_type if content_type.starts_with("text/turtle") => RdfFormat::Turtle,
        content_type if content_type.starts_with("application/n-quads") => RdfFormat::NQuads,
        content_type if content_type.starts_with("application/n-triples") => RdfFormat::NTriples,
        content_type => {
            return (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!("Unsupported content type '{content_type}'"),
            )
                .into_response();
        }
    };
    let graph = match request
        .parameter("graph")
        .or_else(|| request.parameter("context"))
    {
        Some(graph) => {
            match NamedNode::new(graph.trim_start_matches('<').trim_end_matches('>')) {
                Ok(graph) => GraphName::from(graph),
                Err(error) => return bad_request(error),
            }
        }
        None => GraphName::DefaultGraph,
    };
    let parser = RdfParser::from_format(format).with_default_graph(graph);
    match shared.store.load_from_reader(parser, request.body.as_bytes()) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => bad_request(error),
    }
}
