use crate::{DataBundle, DataBundleOptions, LogreError, Settings};
use logre_driver::{EndpointTechnology, SparqlDriver};
use logre_model::{CoreProperties, Prefix, PrefixTable};
use logre_schema::ModelFramework;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Version written by this release.
pub const CURRENT_VERSION: &str = "2.1";

fn current_version() -> String {
    CURRENT_VERSION.to_owned()
}

fn default_framework() -> String {
    ModelFramework::default().name().to_owned()
}

fn default_type_uri() -> String {
    CoreProperties::default().type_property
}

fn default_label_uri() -> String {
    CoreProperties::default().label_property
}

fn default_comment_uri() -> String {
    CoreProperties::default().comment_property
}

/// A data bundle as stored in the configuration file.
///
/// Technology and framework are kept as written so that an unsupported value is reported when the
/// bundle is built, not when the file is read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataBundleConfig {
    pub name: String,
    pub base_uri: String,
    pub endpoint_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub endpoint_technology: String,
    #[serde(default = "default_framework")]
    pub model_framework: String,
    #[serde(default = "default_type_uri")]
    pub prop_type_uri: String,
    #[serde(default = "default_label_uri")]
    pub prop_label_uri: String,
    #[serde(default = "default_comment_uri")]
    pub prop_comment_uri: String,
    /// Empty for the default graph.
    #[serde(default)]
    pub graph_data_uri: String,
    #[serde(default)]
    pub graph_model_uri: String,
    #[serde(default)]
    pub graph_metadata_uri: String,
}

impl DataBundleConfig {
    pub fn new(
        name: impl Into<String>,
        base_uri: impl Into<String>,
        endpoint_url: impl Into<String>,
        technology: EndpointTechnology,
    ) -> Self {
        Self {
            name: name.into(),
            base_uri: base_uri.into(),
            endpoint_url: endpoint_url.into(),
            username: String::new(),
            password: String::new(),
            endpoint_technology: technology.name().to_owned(),
            model_framework: default_framework(),
            prop_type_uri: default_type_uri(),
            prop_label_uri: default_label_uri(),
            prop_comment_uri: default_comment_uri(),
            graph_data_uri: String::new(),
            graph_model_uri: String::new(),
            graph_metadata_uri: String::new(),
        }
    }

    fn uses_endpoint(&self, url: &str) -> bool {
        self.endpoint_url.trim().trim_end_matches('/') == url.trim().trim_end_matches('/')
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixEntry {
    pub short: String,
    pub long: String,
}

impl From<&PrefixEntry> for Prefix {
    fn from(entry: &PrefixEntry) -> Self {
        Prefix::new(entry.short.as_str(), entry.long.as_str())
    }
}

/// A named SPARQL query, stored as a `[name, text]` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedQuery(pub String, pub String);

impl SavedQuery {
    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn text(&self) -> &str {
        &self.1
    }
}

/// The process-wide configuration document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub data_bundles: Vec<DataBundleConfig>,
    /// Prefixes shared by every data bundle.
    #[serde(default)]
    pub prefixes: Vec<PrefixEntry>,
    #[serde(default)]
    pub default_data_bundle: Option<String>,
    #[serde(default)]
    pub sparql_queries: Vec<SavedQuery>,
    #[serde(default = "current_version")]
    pub version: String,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            data_bundles: Vec::new(),
            prefixes: Vec::new(),
            default_data_bundle: None,
            sparql_queries: Vec::new(),
            version: current_version(),
        }
    }
}

impl ConfigDocument {
    /// Parses a document, upgrading legacy layouts.
    pub fn parse(text: &str) -> Result<Self, LogreError> {
        let mut value = serde_json::from_str::<Value>(text)?;
        if migrate(&mut value) {
            info!(version = CURRENT_VERSION, "Migrated legacy configuration");
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Flattens the legacy `endpoints[].data_bundles[]` layout into `data_bundles[]`.
///
/// Returns whether the document was changed.
fn migrate(document: &mut Value) -> bool {
    let Some(object) = document.as_object_mut() else {
        return false;
    };
    let Some(Value::Array(endpoints)) = object.remove("endpoints") else {
        return false;
    };
    let mut bundles = match object.remove("data_bundles") {
        Some(Value::Array(bundles)) => bundles,
        _ => Vec::new(),
    };
    for endpoint in endpoints {
        let Value::Object(mut endpoint) = endpoint else {
            continue;
        };
        let Some(Value::Array(nested)) = endpoint.remove("data_bundles") else {
            continue;
        };
        for bundle in nested {
            let Value::Object(mut bundle) = bundle else {
                continue;
            };
            for (from, to) in [
                ("url", "endpoint_url"),
                ("username", "username"),
                ("password", "password"),
                ("technology", "endpoint_technology"),
            ] {
                if let Some(value) = endpoint.get(from) {
                    bundle.entry(to).or_insert_with(|| value.clone());
                }
            }
            bundles.push(Value::Object(bundle));
        }
    }
    object.insert("data_bundles".to_owned(), Value::Array(bundles));
    object.insert("version".to_owned(), Value::from(CURRENT_VERSION));
    true
}

/// The configuration file and the operations on it.
///
/// Every mutation is in memory only until [`ConfigStore::save`] is called.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    path: PathBuf,
    settings: Settings,
    document: ConfigDocument,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>, settings: Settings, document: ConfigDocument) -> Self {
        Self {
            path: path.into(),
            settings,
            document,
        }
    }

    /// Reads the configuration at `path`. A missing file yields an empty document.
    pub fn load(path: impl Into<PathBuf>, settings: Settings) -> Result<Self, LogreError> {
        let path = path.into();
        let document = match fs::read_to_string(&path) {
            Ok(text) => ConfigDocument::parse(&text)?,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No configuration file, starting empty");
                ConfigDocument::default()
            }
            Err(source) => return Err(LogreError::ConfigIo { path, source }),
        };
        Ok(Self::new(path, settings, document))
    }

    /// Writes the configuration back. Does nothing in hosted mode.
    pub fn save(&self) -> Result<(), LogreError> {
        if self.settings.is_hosted() {
            debug!(path = %self.path.display(), "Hosted mode, configuration not written");
            return Ok(());
        }
        let text = serde_json::to_string_pretty(&self.document)?;
        fs::write(&self.path, text).map_err(|source| LogreError::ConfigIo {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), "Saved configuration");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    pub fn data_bundles(&self) -> &[DataBundleConfig] {
        &self.document.data_bundles
    }

    pub fn data_bundle(&self, name: &str) -> Result<&DataBundleConfig, LogreError> {
        self.document
            .data_bundles
            .iter()
            .find(|bundle| bundle.name == name)
            .ok_or_else(|| LogreError::NotExistingDataBundle(name.to_owned()))
    }

    /// Returns the data bundles living on the endpoint at `url`.
    pub fn bundles_on_endpoint(&self, url: &str) -> Result<Vec<&DataBundleConfig>, LogreError> {
        let bundles = self
            .document
            .data_bundles
            .iter()
            .filter(|bundle| bundle.uses_endpoint(url))
            .collect::<Vec<_>>();
        if bundles.is_empty() {
            return Err(LogreError::NotExistingEndpoint(url.to_owned()));
        }
        Ok(bundles)
    }

    /// Adds a data bundle, replacing the one with the same name.
    pub fn upsert_data_bundle(&mut self, bundle: DataBundleConfig) {
        match self
            .document
            .data_bundles
            .iter_mut()
            .find(|existing| existing.name == bundle.name)
        {
            Some(existing) => *existing = bundle,
            None => self.document.data_bundles.push(bundle),
        }
    }

    pub fn remove_data_bundle(&mut self, name: &str) -> Result<DataBundleConfig, LogreError> {
        let index = self
            .document
            .data_bundles
            .iter()
            .position(|bundle| bundle.name == name)
            .ok_or_else(|| LogreError::NotExistingDataBundle(name.to_owned()))?;
        if self.document.default_data_bundle.as_deref() == Some(name) {
            self.document.default_data_bundle = None;
        }
        Ok(self.document.data_bundles.remove(index))
    }

    pub fn set_default_data_bundle(&mut self, name: &str) -> Result<(), LogreError> {
        self.data_bundle(name)?;
        self.document.default_data_bundle = Some(name.to_owned());
        Ok(())
    }

    /// Returns the default data bundle, or the first one when none is set.
    pub fn default_data_bundle(&self) -> Option<&DataBundleConfig> {
        self.document
            .default_data_bundle
            .as_deref()
            .and_then(|name| self.data_bundle(name).ok())
            .or_else(|| self.document.data_bundles.first())
    }

    pub fn prefixes(&self) -> &[PrefixEntry] {
        &self.document.prefixes
    }

    /// Adds a shared prefix, replacing the namespace of an existing one.
    pub fn add_prefix(&mut self, short: &str, long: &str) -> Result<(), LogreError> {
        PrefixTable::empty().add(short, long)?;
        let entry = PrefixEntry {
            short: short.to_owned(),
            long: long.to_owned(),
        };
        match self
            .document
            .prefixes
            .iter_mut()
            .find(|prefix| prefix.short == short)
        {
            Some(existing) => *existing = entry,
            None => self.document.prefixes.push(entry),
        }
        Ok(())
    }

    pub fn saved_queries(&self) -> &[SavedQuery] {
        &self.document.sparql_queries
    }

    pub fn saved_query(&self, name: &str) -> Option<&str> {
        self.document
            .sparql_queries
            .iter()
            .find(|query| query.name() == name)
            .map(SavedQuery::text)
    }

    /// Saves a query, overwriting the one with the same name.
    pub fn save_query(&mut self, name: &str, text: &str) {
        let query = SavedQuery(name.to_owned(), text.to_owned());
        match self
            .document
            .sparql_queries
            .iter_mut()
            .find(|existing| existing.name() == name)
        {
            Some(existing) => *existing = query,
            None => self.document.sparql_queries.push(query),
        }
    }

    /// Returns whether a query was deleted.
    pub fn delete_query(&mut self, name: &str) -> bool {
        let before = self.document.sparql_queries.len();
        self.document.sparql_queries.retain(|query| query.name() != name);
        self.document.sparql_queries.len() < before
    }

    /// Connects the data bundle `name` to its endpoint.
    pub fn build_bundle(&self, name: &str) -> Result<DataBundle, LogreError> {
        self.build(self.data_bundle(name)?)
    }

    pub fn build_bundles(&self) -> Result<Vec<DataBundle>, LogreError> {
        self.document
            .data_bundles
            .iter()
            .map(|config| self.build(config))
            .collect()
    }

    fn build(&self, config: &DataBundleConfig) -> Result<DataBundle, LogreError> {
        let technology = config.endpoint_technology.parse::<EndpointTechnology>()?;
        let framework = config.model_framework.parse::<ModelFramework>()?;
        let driver = SparqlDriver::new(technology, config.endpoint_url.trim())
            .with_credentials(&config.username, &config.password)
            .with_verbose(self.settings.verbose);
        let graph = |uri: &str| Some(uri.trim().to_owned()).filter(|uri| !uri.is_empty());
        let options = DataBundleOptions {
            name: config.name.clone(),
            base_uri: config.base_uri.clone(),
            framework,
            core: CoreProperties {
                type_property: config.prop_type_uri.clone(),
                label_property: config.prop_label_uri.clone(),
                comment_property: config.prop_comment_uri.clone(),
            },
            graph_data_uri: graph(&config.graph_data_uri),
            graph_model_uri: graph(&config.graph_model_uri),
            graph_metadata_uri: graph(&config.graph_metadata_uri),
            prefixes: self.document.prefixes.iter().map(Prefix::from).collect(),
        };
        DataBundle::new(options, driver)
    }
}
