use crate::inferred::load_inferred;
use crate::shacl::load_shacl;
use crate::{ModelError, ModelFramework};
use logre_driver::Graph;
use logre_model::{CoreProperties, PrefixTable, Property, Resource};

/// The schema of a data bundle: its classes and their properties.
///
/// Classes and properties reference each other by URI only. All URIs are shortened with the prefix
/// table the model was loaded with.
#[derive(Clone, Debug, Default)]
pub struct Model {
    framework: ModelFramework,
    classes: Vec<Resource>,
    properties: Vec<Property>,
    core: CoreProperties,
}

impl Model {
    pub fn new(
        framework: ModelFramework,
        classes: Vec<Resource>,
        properties: Vec<Property>,
        core: CoreProperties,
    ) -> Self {
        Self {
            framework,
            classes,
            properties,
            core,
        }
    }

    /// Loads a model.
    ///
    /// SHACL models are read from `model_graph`. Models without framework are inferred from
    /// `data_graph`.
    pub async fn load(
        framework: ModelFramework,
        model_graph: &Graph,
        data_graph: &Graph,
        core: CoreProperties,
        prefixes: &PrefixTable,
    ) -> Result<Self, ModelError> {
        let (classes, properties) = match framework {
            ModelFramework::Shacl => load_shacl(model_graph, &core, prefixes).await?,
            ModelFramework::NoFramework => load_inferred(data_graph, &core, prefixes).await?,
        };
        Ok(Self::new(framework, classes, properties, core))
    }

    pub fn framework(&self) -> ModelFramework {
        self.framework
    }

    pub fn get_classes(&self) -> &[Resource] {
        &self.classes
    }

    pub fn get_properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn find_class(&self, uri: &str) -> Option<&Resource> {
        self.classes.iter().find(|class| class.uri == uri)
    }

    /// Returns every record of the property `uri`, optionally restricted to a domain and a range.
    pub fn find_properties(
        &self,
        uri: &str,
        domain: Option<&str>,
        range: Option<&str>,
    ) -> Vec<&Property> {
        self.properties
            .iter()
            .filter(|property| property.uri == uri)
            .filter(|property| domain.is_none() || property.domain.as_deref() == domain)
            .filter(|property| range.is_none() || property.range.as_deref() == range)
            .collect()
    }

    /// Returns the best record of the property `uri` for the given domain and range.
    ///
    /// Falls back to a looser match when no record matches both ends.
    pub fn find_property(
        &self,
        uri: &str,
        domain: Option<&str>,
        range: Option<&str>,
    ) -> Option<&Property> {
        [(domain, range), (domain, None), (None, range), (None, None)]
            .into_iter()
            .find_map(|(domain, range)| self.find_properties(uri, domain, range).first().copied())
    }

    /// Returns the properties shown on the card of `class_uri`, sorted by order.
    pub fn get_card_properties_of(&self, class_uri: &str) -> Vec<Property> {
        let mut properties = self
            .properties
            .iter()
            .filter(|property| property.card_of.as_deref() == Some(class_uri))
            .cloned()
            .collect::<Vec<_>>();
        properties.sort_by(Property::cmp_by_order);
        properties
    }

    /// Returns the label of a class, or `uri` if the class is unknown.
    pub fn get_class_name(&self, uri: &str) -> String {
        self.find_class(uri)
            .map_or_else(|| uri.to_owned(), |class| class.label.clone())
    }

    pub fn core(&self) -> &CoreProperties {
        &self.core
    }

    pub fn type_property(&self) -> &str {
        &self.core.type_property
    }

    pub fn label_property(&self) -> &str {
        &self.core.label_property
    }

    pub fn comment_property(&self) -> &str {
        &self.core.comment_property
    }
}
