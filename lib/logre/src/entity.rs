use crate::bundle::resource_from;
use crate::{DataBundle, GraphSelector, LogreError};
use logre_driver::Row;
use logre_model::{
    defuse_numeric_label, literal, Direction, Property, Resource, Statement,
};
use logre_schema::Model;
use std::collections::HashSet;
use std::fmt::Write;

/// Formats the `LIMIT` and `OFFSET` clauses of a paginated query.
pub(crate) fn page(limit: Option<usize>, offset: usize) -> String {
    let mut out = String::new();
    if let Some(limit) = limit {
        let _ = write!(out, "\nLIMIT {limit}");
    }
    if offset > 0 {
        let _ = write!(out, "\nOFFSET {offset}");
    }
    out
}

/// Returns the model record of `uri` best matching the given ends, or a raw property.
fn enrich(
    model: &Model,
    uri: &str,
    domain: Option<&str>,
    range: Option<&str>,
    direction: Direction,
) -> Property {
    model
        .find_property(uri, domain, range)
        .cloned()
        .unwrap_or_else(|| Property {
            domain: domain.map(str::to_owned),
            range: range.map(str::to_owned),
            direction,
            ..Property::new(uri)
        })
}

fn defused(mut resource: Resource) -> Resource {
    if !resource.is_literal() {
        resource.label = defuse_numeric_label(&resource.label).into_owned();
    }
    resource
}

#[allow(clippy::multiple_inherent_impl, reason = "Entity reads are kept apart from bundle plumbing")]
impl DataBundle {
    pub fn find_entities_query(
        &self,
        label: Option<&str>,
        class_uri: Option<&str>,
        limit: Option<usize>,
        offset: usize,
    ) -> String {
        let core = self.core();
        let mut pattern = match class_uri {
            Some(class_uri) => {
                let class = self.n(class_uri);
                format!(
                    "?uri {} {class} .\nBIND({class} AS ?class_)\n",
                    self.n(&core.type_property)
                )
            }
            None => format!("?uri {} ?class_ .\n", self.n(&core.type_property)),
        };
        let _ = writeln!(
            pattern,
            "OPTIONAL {{ ?uri {} ?label_ . }}\nOPTIONAL {{ ?uri {} ?comment_ . }}",
            self.n(&core.label_property),
            self.n(&core.comment_property)
        );
        if let Some(label) = label.filter(|label| !label.trim().is_empty()) {
            let _ = writeln!(
                pattern,
                "FILTER(CONTAINS(LCASE(STR(?label_)), LCASE({})))",
                literal(label.trim())
            );
        }
        format!(
            "SELECT ?uri (SAMPLE(?label_) AS ?label) (SAMPLE(?comment_) AS ?comment) (SAMPLE(?class_) AS ?class) WHERE {{\n{}}}\nGROUP BY ?uri\nORDER BY ?uri{}",
            self.graph(GraphSelector::Data).scope(&pattern, self.prefixes()),
            page(limit, offset)
        )
    }

    /// Finds the instances of `class_uri` (or of any class) whose label contains `label`, ignoring
    /// case.
    pub async fn find_entities(
        &self,
        label: Option<&str>,
        class_uri: Option<&str>,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<Resource>, LogreError> {
        let query = self.find_entities_query(label, class_uri, limit, offset);
        Ok(self
            .select(&query)
            .await?
            .iter()
            .filter_map(|row| Some(resource_from(row.get("uri")?, row)))
            .collect())
    }

    /// Returns the label, comment and class of an entity.
    pub async fn get_entity_basics(&self, uri: &str) -> Result<Resource, LogreError> {
        let entity = self.entity_token(uri)?;
        let core = self.core();
        let pattern = format!(
            "OPTIONAL {{ {entity} {} ?class_ . }}\nOPTIONAL {{ {entity} {} ?label_ . }}\nOPTIONAL {{ {entity} {} ?comment_ . }}\n",
            self.n(&core.type_property),
            self.n(&core.label_property),
            self.n(&core.comment_property),
        );
        let query = format!(
            "SELECT (SAMPLE(?label_) AS ?label) (SAMPLE(?comment_) AS ?comment) (SAMPLE(?class_) AS ?class) WHERE {{\n{}}}",
            self.graph(GraphSelector::Data).scope(&pattern, self.prefixes())
        );
        let solutions = self.select(&query).await?;
        let row = solutions.rows.first().cloned().unwrap_or_default();
        Ok(Resource::iri(self.canonical(uri))
            .with_label(row.non_empty_string("label"))
            .with_comment(row.non_empty_string("comment"))
            .with_class(row.non_empty_string("class")))
    }

    /// Returns the predicates used by an entity, enriched with the model.
    pub async fn get_outgoing_properties_of(&self, uri: &str) -> Result<Vec<Property>, LogreError> {
        let entity = self.entity_token(uri)?;
        let type_property = self.n(&self.core().type_property);
        let pattern = format!(
            "{entity} ?uri ?o .\nOPTIONAL {{ ?o {type_property} ?object_class . }}\nBIND(COALESCE(?object_class, DATATYPE(?o)) AS ?range)\n"
        );
        let query = format!(
            "SELECT DISTINCT ?uri ?range WHERE {{\n{}}}\nORDER BY ?uri ?range",
            self.graph(GraphSelector::Data).scope(&pattern, self.prefixes())
        );
        let class = self.get_entity_basics(uri).await?.class_uri;
        let model = self.model().await?;
        Ok(self
            .select(&query)
            .await?
            .iter()
            .filter_map(|row| {
                let property = row.get("uri")?.as_iri()?;
                let range = row.non_empty_string("range");
                Some(enrich(
                    &model,
                    property,
                    class.as_deref(),
                    range.as_deref(),
                    Direction::Outgoing,
                ))
            })
            .collect())
    }

    /// Returns the predicates pointing to an entity, enriched with the model.
    pub async fn get_incoming_properties_of(&self, uri: &str) -> Result<Vec<Property>, LogreError> {
        let entity = self.entity_token(uri)?;
        let type_property = self.n(&self.core().type_property);
        let pattern = format!("?s ?uri {entity} .\nOPTIONAL {{ ?s {type_property} ?domain . }}\n");
        let query = format!(
            "SELECT DISTINCT ?uri ?domain WHERE {{\n{}}}\nORDER BY ?uri ?domain",
            self.graph(GraphSelector::Data).scope(&pattern, self.prefixes())
        );
        let class = self.get_entity_basics(uri).await?.class_uri;
        let model = self.model().await?;
        Ok(self
            .select(&query)
            .await?
            .iter()
            .filter_map(|row| {
                let property = row.get("uri")?.as_iri()?;
                let domain = row.non_empty_string("domain");
                Some(enrich(
                    &model,
                    property,
                    domain.as_deref(),
                    class.as_deref(),
                    Direction::Incoming,
                ))
            })
            .collect())
    }

    /// Returns the properties shown on the card of a class, sorted by order.
    pub async fn get_card_properties_of(&self, class_uri: &str) -> Result<Vec<Property>, LogreError> {
        Ok(self
            .model()
            .await?
            .get_card_properties_of(&self.canonical(class_uri)))
    }

    /// Returns every class of the model with its number of instances in the data graph.
    pub async fn get_classes_with_counts(&self) -> Result<Vec<(Resource, usize)>, LogreError> {
        let pattern = format!("?s {} ?class .\n", self.n(&self.core().type_property));
        let query = format!(
            "SELECT ?class (COUNT(DISTINCT ?s) AS ?count) WHERE {{\n{}}}\nGROUP BY ?class",
            self.graph(GraphSelector::Data).scope(&pattern, self.prefixes())
        );
        let counts = self.select(&query).await?;
        let model = self.model().await?;
        Ok(model
            .get_classes()
            .iter()
            .map(|class| {
                let count = counts
                    .iter()
                    .find(|row| row.get("class").and_then(|c| c.as_iri()) == Some(class.uri.as_str()))
                    .and_then(|row| row.integer("count"))
                    .and_then(|count| usize::try_from(count).ok())
                    .unwrap_or_default();
                (class.clone(), count)
            })
            .collect())
    }

    fn objects_pattern(&self, entity: &str, property: &str) -> String {
        let core = self.core();
        format!(
            "{entity} {} ?o .\nOPTIONAL {{ ?o {} ?label_ . }}\nOPTIONAL {{ ?o {} ?comment_ . }}\nOPTIONAL {{ ?o {} ?type_ . }}\nBIND(COALESCE(?type_, DATATYPE(?o)) AS ?class_)\n",
            self.n(property),
            self.n(&core.label_property),
            self.n(&core.comment_property),
            self.n(&core.type_property),
        )
    }

    pub fn get_objects_of_query(
        &self,
        uri: &str,
        property: &str,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<String, LogreError> {
        let entity = self.entity_token(uri)?;
        let pattern = self.objects_pattern(&entity, property);
        Ok(format!(
            "SELECT ?o (SAMPLE(?label_) AS ?label) (SAMPLE(?comment_) AS ?comment) (SAMPLE(?class_) AS ?class) WHERE {{\n{}}}\nGROUP BY ?o\nORDER BY ?o{}",
            self.graph(GraphSelector::Data).scope(&pattern, self.prefixes()),
            page(limit, offset)
        ))
    }

    /// Returns the objects of `(uri, property, ?o)`. Literal objects get their datatype as class.
    pub async fn get_objects_of(
        &self,
        uri: &str,
        property: &str,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<Resource>, LogreError> {
        let query = self.get_objects_of_query(uri, property, limit, offset)?;
        Ok(collect_distinct(&self.select(&query).await?.rows, "o"))
    }

    pub async fn get_objects_of_count(&self, uri: &str, property: &str) -> Result<usize, LogreError> {
        let entity = self.entity_token(uri)?;
        let pattern = format!("{entity} {} ?o .\n", self.n(property));
        self.count(&format!(
            "SELECT (COUNT(DISTINCT ?o) AS ?count) WHERE {{\n{}}}",
            self.graph(GraphSelector::Data).scope(&pattern, self.prefixes())
        ))
        .await
    }

    /// Returns the subjects of `(?s, property, uri)`.
    pub async fn get_subjects_of(
        &self,
        uri: &str,
        property: &str,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<Resource>, LogreError> {
        let entity = self.entity_token(uri)?;
        let core = self.core();
        let pattern = format!(
            "?s {} {entity} .\nOPTIONAL {{ ?s {} ?label_ . }}\nOPTIONAL {{ ?s {} ?comment_ . }}\nOPTIONAL {{ ?s {} ?class_ . }}\n",
            self.n(property),
            self.n(&core.label_property),
            self.n(&core.comment_property),
            self.n(&core.type_property),
        );
        let query = format!(
            "SELECT ?s (SAMPLE(?label_) AS ?label) (SAMPLE(?comment_) AS ?comment) (SAMPLE(?class_) AS ?class) WHERE {{\n{}}}\nGROUP BY ?s\nORDER BY ?s{}",
            self.graph(GraphSelector::Data).scope(&pattern, self.prefixes()),
            page(limit, offset)
        );
        Ok(collect_distinct(&self.select(&query).await?.rows, "s"))
    }

    pub async fn get_subjects_of_count(&self, uri: &str, property: &str) -> Result<usize, LogreError> {
        let entity = self.entity_token(uri)?;
        let pattern = format!("?s {} {entity} .\n", self.n(property));
        self.count(&format!(
            "SELECT (COUNT(DISTINCT ?s) AS ?count) WHERE {{\n{}}}",
            self.graph(GraphSelector::Data).scope(&pattern, self.prefixes())
        ))
        .await
    }

    /// Returns every triple having `uri` as subject, except those using one of `skip_properties`.
    pub async fn get_outgoing_statements_of(
        &self,
        uri: &str,
        skip_properties: &[&str],
    ) -> Result<Vec<Statement>, LogreError> {
        let entity = self.entity_token(uri)?;
        let core = self.core();
        let pattern = format!(
            "{entity} ?p ?o .\n{}OPTIONAL {{ ?o {} ?label_ . }}\nOPTIONAL {{ ?o {} ?type_ . }}\nBIND(COALESCE(?type_, DATATYPE(?o)) AS ?class_)\n",
            self.skip_filter(skip_properties),
            self.n(&core.label_property),
            self.n(&core.type_property),
        );
        let query = format!(
            "SELECT ?p ?o (SAMPLE(?label_) AS ?label) (SAMPLE(?class_) AS ?class) WHERE {{\n{}}}\nGROUP BY ?p ?o\nORDER BY ?p ?o",
            self.graph(GraphSelector::Data).scope(&pattern, self.prefixes())
        );

        let subject = defused(self.get_entity_basics(uri).await?);
        let model = self.model().await?;
        Ok(self
            .select(&query)
            .await?
            .iter()
            .filter_map(|row| {
                let object = defused(resource_from(row.get("o")?, row));
                let predicate = enrich(
                    &model,
                    row.get("p")?.as_iri()?,
                    subject.class_uri.as_deref(),
                    object.class_uri.as_deref(),
                    Direction::Outgoing,
                );
                Some(Statement {
                    subject: subject.clone(),
                    predicate,
                    object,
                })
            })
            .collect())
    }

    /// Returns the triples having `uri` as object, except those using one of `skip_properties`.
    pub async fn get_incoming_statements_of(
        &self,
        uri: &str,
        limit: Option<usize>,
        offset: usize,
        skip_properties: &[&str],
    ) -> Result<Vec<Statement>, LogreError> {
        let entity = self.entity_token(uri)?;
        let core = self.core();
        let pattern = format!(
            "?s ?p {entity} .\n{}OPTIONAL {{ ?s {} ?label_ . }}\nOPTIONAL {{ ?s {} ?class_ . }}\n",
            self.skip_filter(skip_properties),
            self.n(&core.label_property),
            self.n(&core.type_property),
        );
        let query = format!(
            "SELECT ?s ?p (SAMPLE(?label_) AS ?label) (SAMPLE(?class_) AS ?class) WHERE {{\n{}}}\nGROUP BY ?s ?p\nORDER BY ?s ?p{}",
            self.graph(GraphSelector::Data).scope(&pattern, self.prefixes()),
            page(limit, offset)
        );

        let object = defused(self.get_entity_basics(uri).await?);
        let model = self.model().await?;
        Ok(self
            .select(&query)
            .await?
            .iter()
            .filter_map(|row| {
                let subject = defused(resource_from(row.get("s")?, row));
                let predicate = enrich(
                    &model,
                    row.get("p")?.as_iri()?,
                    subject.class_uri.as_deref(),
                    object.class_uri.as_deref(),
                    Direction::Incoming,
                );
                Some(Statement {
                    subject,
                    predicate,
                    object: object.clone(),
                })
            })
            .collect())
    }

    pub async fn get_incoming_statements_of_count(
        &self,
        uri: &str,
        skip_properties: &[&str],
    ) -> Result<usize, LogreError> {
        let entity = self.entity_token(uri)?;
        let pattern = format!("?s ?p {entity} .\n{}", self.skip_filter(skip_properties));
        self.count(&format!(
            "SELECT (COUNT(*) AS ?count) WHERE {{\nSELECT DISTINCT ?s ?p WHERE {{\n{}}}\n}}",
            self.graph(GraphSelector::Data).scope(&pattern, self.prefixes())
        ))
        .await
    }

    fn skip_filter(&self, skip_properties: &[&str]) -> String {
        let skipped = skip_properties
            .iter()
            .filter_map(|property| self.prefixes().normalize(property))
            .collect::<Vec<_>>();
        if skipped.is_empty() {
            String::new()
        } else {
            format!("FILTER(?p NOT IN ({}))\n", skipped.join(", "))
        }
    }
}

/// Builds one resource per distinct value of `variable`, keeping the first row of duplicates.
fn collect_distinct(rows: &[Row], variable: &str) -> Vec<Resource> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter_map(|row| {
            let value = row.get(variable)?;
            seen.insert(value.clone())
                .then(|| resource_from(value, row))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::tests::bundle;
    use logre_driver::Value;
    use logre_model::ResourceType;

    #[test]
    fn test_find_entities_query() {
        let query = bundle().find_entities_query(Some("O'Ali"), Some("crm:E21"), Some(10), 20);
        insta::assert_snapshot!(query, @r"
        SELECT ?uri (SAMPLE(?label_) AS ?label) (SAMPLE(?comment_) AS ?comment) (SAMPLE(?class_) AS ?class) WHERE {
        GRAPH base:data {
        ?uri rdf:type crm:E21 .
        BIND(crm:E21 AS ?class_)
        OPTIONAL { ?uri rdfs:label ?label_ . }
        OPTIONAL { ?uri rdfs:comment ?comment_ . }
        FILTER(CONTAINS(LCASE(STR(?label_)), LCASE('O\'Ali')))
        }
        }
        GROUP BY ?uri
        ORDER BY ?uri
        LIMIT 10
        OFFSET 20
        ");
    }

    #[test]
    fn test_objects_query() -> Result<(), LogreError> {
        let query = bundle().get_objects_of_query("base:e1", "crm:P1", None, 0)?;
        insta::assert_snapshot!(query, @r"
        SELECT ?o (SAMPLE(?label_) AS ?label) (SAMPLE(?comment_) AS ?comment) (SAMPLE(?class_) AS ?class) WHERE {
        GRAPH base:data {
        base:e1 crm:P1 ?o .
        OPTIONAL { ?o rdfs:label ?label_ . }
        OPTIONAL { ?o rdfs:comment ?comment_ . }
        OPTIONAL { ?o rdf:type ?type_ . }
        BIND(COALESCE(?type_, DATATYPE(?o)) AS ?class_)
        }
        }
        GROUP BY ?o
        ORDER BY ?o
        ");
        Ok(())
    }

    #[test]
    fn test_collect_distinct_keeps_first_row() {
        let rows = [
            Row::from_iter([
                ("o", Value::Iri("base:e2".to_owned())),
                ("label", Value::string("Bob")),
            ]),
            Row::from_iter([
                ("o", Value::Iri("base:e2".to_owned())),
                ("label", Value::string("Robert")),
            ]),
            Row::from_iter([
                ("o", Value::string("42")),
                ("class", Value::Iri("xsd:string".to_owned())),
            ]),
        ];
        let resources = collect_distinct(&rows, "o");
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].label, "Bob");
        assert_eq!(resources[1].resource_type, ResourceType::Literal);
        assert_eq!(resources[1].class_uri.as_deref(), Some("xsd:string"));
    }

    #[test]
    fn test_numeric_labels_are_defused() {
        let resource = defused(Resource::iri("base:e1").with_label(Some("1984".to_owned())));
        assert!(resource.label.parse::<i64>().is_err());
        assert_eq!(defused(Resource::literal("1984")).label, "1984");
    }

    #[test]
    fn test_page() {
        assert_eq!(page(None, 0), "");
        assert_eq!(page(Some(5), 0), "\nLIMIT 5");
        assert_eq!(page(None, 5), "\nOFFSET 5");
    }
}
