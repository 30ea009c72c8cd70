use crate::query::in_graph;
use crate::results::LiteralValue;
use crate::{DriverError, Solutions, SparqlDriver, Value};
use logre_model::vocab::xsd;
use logre_model::{literal, PrefixTable, Triple};
use oxrdf::{BlankNode, GraphName, Literal, NamedNode, Quad, Subject, Term};
use std::fmt::Write;
use tracing::debug;

/// Number of triples fetched per request while dumping a graph.
pub const DUMP_PAGE_SIZE: usize = 10_000;

/// A triple read back from an endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StoredTriple {
    pub subject: Value,
    pub predicate: Value,
    pub object: Value,
}

/// A named graph (or the default graph) of an endpoint.
#[derive(Clone, Debug)]
pub struct Graph {
    uri: Option<String>,
    driver: SparqlDriver,
}

impl Graph {
    /// Creates a handle on the graph named `uri`. An empty URI means the default graph.
    pub fn new(driver: SparqlDriver, uri: Option<String>) -> Self {
        Self {
            uri: uri.filter(|uri| !uri.trim().is_empty()),
            driver,
        }
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn driver(&self) -> &SparqlDriver {
        &self.driver
    }

    /// Wraps a group graph pattern so that it only matches this graph.
    pub fn scope(&self, pattern: &str, prefixes: &PrefixTable) -> String {
        in_graph(pattern, self.uri(), prefixes)
    }

    pub async fn run(
        &self,
        query: &str,
        prefixes: &PrefixTable,
    ) -> Result<Option<Solutions>, DriverError> {
        self.driver.run(query, prefixes).await
    }

    pub async fn insert(&self, triples: &[Triple], prefixes: &PrefixTable) -> Result<(), DriverError> {
        self.driver.insert(triples, self.uri(), prefixes).await
    }

    pub async fn delete(&self, triples: &[Triple], prefixes: &PrefixTable) -> Result<(), DriverError> {
        self.driver.delete(triples, self.uri(), prefixes).await
    }

    /// Removes every triple of the graph.
    pub async fn clear(&self, prefixes: &PrefixTable) -> Result<(), DriverError> {
        self.delete(&[Triple::new("?s", "?p", "?o")], prefixes).await
    }

    /// Returns every triple of the graph, ordered by subject, predicate and object.
    pub async fn dump(&self, prefixes: &PrefixTable) -> Result<Vec<StoredTriple>, DriverError> {
        let pattern = self.scope("?s ?p ?o .\n", prefixes);
        let mut triples = Vec::new();
        let mut offset = 0;
        loop {
            let query = format!(
                "SELECT ?s ?p ?o (isLiteral(?o) AS ?literal) WHERE {{\n{pattern}}}\nORDER BY ?s ?p ?o LIMIT {DUMP_PAGE_SIZE} OFFSET {offset}"
            );
            let page = self.run(&query, prefixes).await?.unwrap_or_default();
            let fetched = page.len();
            triples.extend(page.into_iter().filter_map(|mut row| {
                Some(StoredTriple {
                    subject: row.remove("s")?,
                    predicate: row.remove("p")?,
                    object: row.remove("o")?,
                })
            }));
            if fetched < DUMP_PAGE_SIZE {
                break;
            }
            offset += DUMP_PAGE_SIZE;
        }
        debug!(graph = ?self.uri, triples = triples.len(), "Dumped graph");
        Ok(triples)
    }

    /// Serializes the graph as Turtle, with the prefix table as header.
    pub async fn dump_turtle(&self, prefixes: &PrefixTable) -> Result<String, DriverError> {
        let triples = self.dump(prefixes).await?;
        let mut out = prefixes.to_turtle();
        out.push('\n');
        for triple in &triples {
            let _ = writeln!(
                out,
                "{} {} {} .",
                turtle_term(&triple.subject, prefixes),
                turtle_term(&triple.predicate, prefixes),
                turtle_term(&triple.object, prefixes)
            );
        }
        Ok(out)
    }

    /// Serializes the graph as N-Quads. Quads carry the graph name, unless this is the default
    /// graph.
    pub async fn dump_nquads(&self, prefixes: &PrefixTable) -> Result<String, DriverError> {
        let graph_name = match self.uri() {
            Some(uri) => GraphName::NamedNode(NamedNode::new_unchecked(prefixes.lengthen(uri))),
            None => GraphName::DefaultGraph,
        };
        let triples = self.dump(prefixes).await?;
        let mut out = String::new();
        for triple in &triples {
            let (Some(subject), Some(predicate)) = (
                subject_of(&triple.subject, prefixes),
                named_node_of(&triple.predicate, prefixes),
            ) else {
                continue;
            };
            let quad = Quad::new(
                subject,
                predicate,
                term_of(&triple.object, prefixes),
                graph_name.clone(),
            );
            let _ = writeln!(out, "{quad} .");
        }
        Ok(out)
    }

    /// Uploads a Turtle document into the graph.
    pub async fn upload_turtle(&self, body: String, prefixes: &PrefixTable) -> Result<(), DriverError> {
        let graph = self.uri().map(|uri| prefixes.lengthen(uri));
        self.driver.upload_turtle(body, graph.as_deref()).await
    }

    /// Imports a CSV document into the graph and returns the number of inserted triples.
    pub async fn upload_csv(&self, body: &str, prefixes: &PrefixTable) -> Result<usize, DriverError> {
        self.driver.upload_csv(body, self.uri(), prefixes).await
    }
}

fn turtle_term(value: &Value, prefixes: &PrefixTable) -> String {
    match value {
        Value::Iri(iri) => prefixes
            .normalize(iri)
            .unwrap_or_else(|| format!("<{iri}>")),
        Value::BlankNode(id) => id.clone(),
        Value::Integer(value) => value.to_string(),
        Value::Boolean(value) => value.to_string(),
        Value::Literal(LiteralValue {
            value,
            datatype,
            language,
        }) => {
            let mut out = literal(value);
            if let Some(language) = language {
                let _ = write!(out, "@{language}");
            } else if let Some(datatype) = datatype.as_deref().and_then(|dt| prefixes.normalize(dt)) {
                let _ = write!(out, "^^{datatype}");
            }
            out
        }
    }
}

fn named_node_of(value: &Value, prefixes: &PrefixTable) -> Option<NamedNode> {
    value
        .as_iri()
        .map(|iri| NamedNode::new_unchecked(prefixes.lengthen(iri)))
}

fn subject_of(value: &Value, prefixes: &PrefixTable) -> Option<Subject> {
    match value {
        Value::Iri(_) => named_node_of(value, prefixes).map(Subject::NamedNode),
        Value::BlankNode(id) => Some(Subject::BlankNode(blank_node(id))),
        _ => None,
    }
}

fn term_of(value: &Value, prefixes: &PrefixTable) -> Term {
    match value {
        Value::Iri(iri) => NamedNode::new_unchecked(prefixes.lengthen(iri)).into(),
        Value::BlankNode(id) => blank_node(id).into(),
        Value::Integer(value) => {
            Literal::new_typed_literal(value.to_string(), NamedNode::new_unchecked(xsd::INTEGER))
                .into()
        }
        Value::Boolean(value) => {
            Literal::new_typed_literal(value.to_string(), NamedNode::new_unchecked(xsd::BOOLEAN))
                .into()
        }
        Value::Literal(LiteralValue {
            value,
            datatype,
            language,
        }) => match (language, datatype) {
            (Some(language), _) => {
                Literal::new_language_tagged_literal_unchecked(value, language.to_ascii_lowercase())
                    .into()
            }
            (None, Some(datatype)) => Literal::new_typed_literal(
                value,
                NamedNode::new_unchecked(prefixes.lengthen(datatype)),
            )
            .into(),
            (None, None) => Literal::new_simple_literal(value).into(),
        },
    }
}

fn blank_node(id: &str) -> BlankNode {
    BlankNode::new_unchecked(id.trim_start_matches("_:"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes() -> PrefixTable {
        PrefixTable::new("http://ex.org/")
    }

    #[test]
    fn test_turtle_terms() {
        let prefixes = prefixes();
        assert_eq!(turtle_term(&Value::Iri("base:e1".to_owned()), &prefixes), "base:e1");
        assert_eq!(
            turtle_term(&Value::Iri("base:p/42".to_owned()), &prefixes),
            "<http://ex.org/p/42>"
        );
        assert_eq!(turtle_term(&Value::Integer(42), &prefixes), "42");
        assert_eq!(turtle_term(&Value::string("O'Brien"), &prefixes), "'O\\'Brien'");
        assert_eq!(
            turtle_term(
                &Value::Literal(LiteralValue {
                    value: "2020-01-01".to_owned(),
                    datatype: Some("xsd:date".to_owned()),
                    language: None,
                }),
                &prefixes
            ),
            "'2020-01-01'^^xsd:date"
        );
    }

    #[test]
    fn test_quad_terms() {
        let prefixes = prefixes();
        let quad = Quad::new(
            subject_of(&Value::BlankNode("_:b0".to_owned()), &prefixes).unwrap(),
            named_node_of(&Value::Iri("rdfs:label".to_owned()), &prefixes).unwrap(),
            term_of(&Value::string("Alice"), &prefixes),
            GraphName::NamedNode(NamedNode::new_unchecked("http://ex.org/data")),
        );
        assert_eq!(
            quad.to_string(),
            "_:b0 <http://www.w3.org/2000/01/rdf-schema#label> \"Alice\" <http://ex.org/data>"
        );
    }

    #[test]
    fn test_default_graph_is_not_scoped() {
        let driver = SparqlDriver::new(crate::EndpointTechnology::Fuseki, "http://localhost/ds");
        let graph = Graph::new(driver.clone(), Some(String::new()));
        assert_eq!(graph.uri(), None);
        assert_eq!(graph.scope("?s ?p ?o .\n", &prefixes()), "?s ?p ?o .\n");

        let graph = Graph::new(driver, Some("http://ex.org/data".to_owned()));
        assert_eq!(
            graph.scope("?s ?p ?o .\n", &prefixes()),
            "GRAPH base:data {\n?s ?p ?o .\n}\n"
        );
    }
}
