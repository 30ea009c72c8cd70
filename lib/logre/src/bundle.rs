use crate::cache::QueryCache;
use crate::LogreError;
use logre_driver::{Graph, QueryForm, Row, Solutions, SparqlDriver, Value};
use logre_model::{snake_case, CoreProperties, Prefix, PrefixTable, Resource, Triple, BASE_PREFIX};
use logre_schema::{Model, ModelFramework};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// One of the three graphs of a data bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GraphSelector {
    Data,
    Model,
    Metadata,
}

impl GraphSelector {
    pub const ALL: [GraphSelector; 3] = [
        GraphSelector::Data,
        GraphSelector::Model,
        GraphSelector::Metadata,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GraphSelector::Data => "data",
            GraphSelector::Model => "model",
            GraphSelector::Metadata => "metadata",
        }
    }
}

impl Display for GraphSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GraphSelector {
    type Err = LogreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GraphSelector::ALL
            .into_iter()
            .find(|selector| selector.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LogreError::UnknownGraph(s.to_owned()))
    }
}

/// Everything needed to build a [`DataBundle`] besides its driver.
#[derive(Clone, Debug, Default)]
pub struct DataBundleOptions {
    pub name: String,
    pub base_uri: String,
    pub framework: ModelFramework,
    pub core: CoreProperties,
    /// [`None`] selects the default graph.
    pub graph_data_uri: Option<String>,
    pub graph_model_uri: Option<String>,
    pub graph_metadata_uri: Option<String>,
    /// Prefixes registered in addition to `base` and the standard ones.
    pub prefixes: Vec<Prefix>,
}

/// A data graph, its model graph and its metadata graph on one endpoint.
///
/// The endpoint is the source of truth: a bundle holds no data besides the loaded [`Model`] and a
/// cache of read answers. The cache is cleared by every write going through the bundle.
#[derive(Debug)]
pub struct DataBundle {
    name: String,
    key: String,
    prefixes: PrefixTable,
    driver: SparqlDriver,
    framework: ModelFramework,
    core: CoreProperties,
    graph_data: Graph,
    graph_model: Graph,
    graph_metadata: Graph,
    model: Mutex<Option<Arc<Model>>>,
    cache: QueryCache,
}

impl DataBundle {
    pub fn new(options: DataBundleOptions, driver: SparqlDriver) -> Result<Self, LogreError> {
        let mut prefixes = PrefixTable::new(options.base_uri.trim());
        for prefix in options
            .prefixes
            .iter()
            .filter(|prefix| prefix.short != BASE_PREFIX)
        {
            prefixes.add(&prefix.short, &prefix.long)?;
        }
        let graph = |uri: Option<String>| Graph::new(driver.clone(), uri);

        Ok(Self {
            key: snake_case(&options.name),
            name: options.name,
            prefixes,
            framework: options.framework,
            core: options.core,
            graph_data: graph(options.graph_data_uri),
            graph_model: graph(options.graph_model_uri),
            graph_metadata: graph(options.graph_metadata_uri),
            driver,
            model: Mutex::default(),
            cache: QueryCache::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A URL-safe identifier derived from the name.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn base_uri(&self) -> &str {
        self.prefixes.base().unwrap_or_default()
    }

    pub fn prefixes(&self) -> &PrefixTable {
        &self.prefixes
    }

    pub fn driver(&self) -> &SparqlDriver {
        &self.driver
    }

    pub fn framework(&self) -> ModelFramework {
        self.framework
    }

    pub fn graph(&self, selector: GraphSelector) -> &Graph {
        match selector {
            GraphSelector::Data => &self.graph_data,
            GraphSelector::Model => &self.graph_model,
            GraphSelector::Metadata => &self.graph_metadata,
        }
    }

    /// The type, label and comment properties, in the shortened form used by query answers.
    pub fn core(&self) -> CoreProperties {
        CoreProperties {
            type_property: self.canonical(&self.core.type_property),
            label_property: self.canonical(&self.core.label_property),
            comment_property: self.canonical(&self.core.comment_property),
        }
    }

    /// Registers a prefix. Cached answers and the loaded model use the previous shortening rules,
    /// so both are dropped.
    pub fn add_prefix(&mut self, short: &str, long: &str) -> Result<(), LogreError> {
        self.prefixes.add(short, long)?;
        info!(bundle = %self.name, short, long, "Added prefix");
        self.cache.clear();
        self.drop_model();
        Ok(())
    }

    /// Returns the model, loading it on first use.
    pub async fn model(&self) -> Result<Arc<Model>, LogreError> {
        let loaded = self
            .model
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match loaded {
            Some(model) => Ok(model),
            None => self.reload_model().await,
        }
    }

    /// Reads the model again from the endpoint.
    pub async fn reload_model(&self) -> Result<Arc<Model>, LogreError> {
        let model = Arc::new(
            Model::load(
                self.framework,
                &self.graph_model,
                &self.graph_data,
                self.core(),
                &self.prefixes,
            )
            .await?,
        );
        info!(
            bundle = %self.name,
            framework = %self.framework,
            classes = model.get_classes().len(),
            properties = model.get_properties().len(),
            "Loaded model"
        );
        *self.model.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Forgets every cached answer.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Inserts triples into one of the graphs.
    pub async fn insert(&self, selector: GraphSelector, triples: &[Triple]) -> Result<(), LogreError> {
        let result = self.graph(selector).insert(triples, &self.prefixes).await;
        self.after_write(selector);
        Ok(result?)
    }

    /// Deletes triples (or patterns) from one of the graphs.
    pub async fn delete(&self, selector: GraphSelector, triples: &[Triple]) -> Result<(), LogreError> {
        let result = self.graph(selector).delete(triples, &self.prefixes).await;
        self.after_write(selector);
        Ok(result?)
    }

    /// Removes every triple of the data graph that has `uri` as subject or object.
    pub async fn delete_entity(&self, uri: &str) -> Result<(), LogreError> {
        let entity = self.entity_token(uri)?;
        self.delete(
            GraphSelector::Data,
            &[
                Triple::new(entity.as_str(), "?p", "?o"),
                Triple::new("?s", "?p", entity.as_str()),
            ],
        )
        .await
    }

    /// Uploads an N-Quads document. The quads select their graphs.
    pub async fn import_nquads(&self, body: String) -> Result<(), LogreError> {
        let result = self.driver.upload_nquads(body).await;
        self.after_write_all();
        Ok(result?)
    }

    pub async fn import_turtle(&self, selector: GraphSelector, body: String) -> Result<(), LogreError> {
        let result = self.graph(selector).upload_turtle(body, &self.prefixes).await;
        self.after_write(selector);
        Ok(result?)
    }

    /// Imports a CSV document and returns the number of inserted triples.
    pub async fn import_csv(&self, selector: GraphSelector, body: &str) -> Result<usize, LogreError> {
        let result = self.graph(selector).upload_csv(body, &self.prefixes).await;
        self.after_write(selector);
        Ok(result?)
    }

    /// Runs a query typed by the operator.
    ///
    /// Read answers are never cached. Updates may touch any graph, so they clear the cache and
    /// drop the model.
    pub async fn run_sparql(&self, query: &str) -> Result<Option<Solutions>, LogreError> {
        let result = self.driver.run(query, &self.prefixes).await;
        if QueryForm::of(query).is_update() {
            self.after_write_all();
        }
        Ok(result?)
    }

    /// Runs a read query through the cache.
    pub(crate) async fn select(&self, query: &str) -> Result<Solutions, LogreError> {
        if let Some(solutions) = self.cache.get(query) {
            debug!(bundle = %self.name, "Cache hit");
            return Ok(solutions);
        }
        let solutions = self
            .driver
            .run(query, &self.prefixes)
            .await?
            .unwrap_or_default();
        self.cache.insert(query.to_owned(), solutions.clone());
        Ok(solutions)
    }

    /// Runs a `COUNT` query and reads its `count` binding.
    pub(crate) async fn count(&self, query: &str) -> Result<usize, LogreError> {
        let solutions = self.select(query).await?;
        let count = solutions
            .iter()
            .find_map(|row| row.integer("count"))
            .unwrap_or_default();
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Normalizes a token known to be non-empty (property URIs, class URIs).
    pub(crate) fn n(&self, token: &str) -> String {
        self.prefixes.normalize(token).unwrap_or_default()
    }

    /// Normalizes the URI of a named node, refusing blank nodes.
    pub(crate) fn entity_token(&self, uri: &str) -> Result<String, LogreError> {
        let uri = uri.trim();
        if uri.starts_with("_:") {
            return Err(LogreError::CantGetInfoOfBlankNode(uri.to_owned()));
        }
        if uri.is_empty() {
            return Err(LogreError::EmptyUri);
        }
        self.prefixes
            .normalize(uri)
            .ok_or_else(|| LogreError::InvalidUri(uri.to_owned()))
    }

    /// Returns `uri` in the shortened form used by query answers.
    pub(crate) fn canonical(&self, uri: &str) -> String {
        self.prefixes.shorten(&self.prefixes.lengthen(uri))
    }

    fn after_write(&self, selector: GraphSelector) {
        // Partial writes may have happened even if the write failed.
        self.cache.clear();
        let model_source = match self.framework {
            ModelFramework::Shacl => GraphSelector::Model,
            ModelFramework::NoFramework => GraphSelector::Data,
        };
        if selector == model_source {
            self.drop_model();
        }
    }

    fn after_write_all(&self) {
        self.cache.clear();
        self.drop_model();
    }

    fn drop_model(&self) {
        *self.model.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Builds the resource bound to `value`, taking its label, comment and class from the `label`,
/// `comment` and `class` bindings of `row`.
pub(crate) fn resource_from(value: &Value, row: &Row) -> Resource {
    let resource = match value {
        Value::Iri(uri) => Resource::iri(uri),
        Value::BlankNode(id) => Resource::blank(id),
        literal => {
            return Resource::literal(literal.to_string())
                .with_class(row.non_empty_string("class"));
        }
    };
    resource
        .with_label(row.non_empty_string("label"))
        .with_comment(row.non_empty_string("comment"))
        .with_class(row.non_empty_string("class"))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use logre_driver::EndpointTechnology;

    pub(crate) fn bundle() -> DataBundle {
        let options = DataBundleOptions {
            name: "My Bundle".to_owned(),
            base_uri: "http://ex.org/".to_owned(),
            graph_data_uri: Some("http://ex.org/data".to_owned()),
            graph_model_uri: Some("http://ex.org/model".to_owned()),
            graph_metadata_uri: Some("http://ex.org/metadata".to_owned()),
            prefixes: vec![
                Prefix::new("crm", "http://www.cidoc-crm.org/cidoc-crm/"),
                Prefix::new("base", "http://ignored.org/"),
            ],
            ..DataBundleOptions::default()
        };
        let driver = SparqlDriver::new(EndpointTechnology::Fuseki, "http://localhost:3030/ds");
        DataBundle::new(options, driver).unwrap()
    }

    #[test]
    fn test_new_bundle() {
        let bundle = bundle();
        assert_eq!(bundle.key(), "my_bundle");
        assert_eq!(bundle.base_uri(), "http://ex.org/");
        assert_eq!(bundle.prefixes().get("crm"), Some("http://www.cidoc-crm.org/cidoc-crm/"));
        assert_eq!(bundle.core().type_property, "rdf:type");
        assert_eq!(bundle.graph(GraphSelector::Model).uri(), Some("http://ex.org/model"));
    }

    #[test]
    fn test_graph_selector() {
        assert_eq!("Model".parse::<GraphSelector>().ok(), Some(GraphSelector::Model));
        assert!(matches!(
            "other".parse::<GraphSelector>(),
            Err(LogreError::UnknownGraph(_))
        ));
    }

    #[test]
    fn test_blank_nodes_are_refused() {
        assert!(matches!(
            bundle().entity_token("_:b0"),
            Err(LogreError::CantGetInfoOfBlankNode(id)) if id == "_:b0"
        ));
        assert_eq!(
            bundle().entity_token("http://ex.org/e1").ok().as_deref(),
            Some("base:e1")
        );
        assert!(matches!(bundle().entity_token(" "), Err(LogreError::EmptyUri)));
        assert!(matches!(
            bundle().entity_token("base:c - http://ex.org/b"),
            Err(LogreError::InvalidUri(_))
        ));
    }

    #[test]
    fn test_add_prefix_drops_cache() -> Result<(), LogreError> {
        let mut bundle = bundle();
        bundle
            .cache
            .insert("SELECT 1".to_owned(), Solutions::boolean(true));
        bundle.add_prefix("ex", "http://example.com/")?;
        assert_eq!(bundle.cache.len(), 0);
        assert!(bundle.add_prefix("not valid", "http://example.com/").is_err());
        Ok(())
    }
}
