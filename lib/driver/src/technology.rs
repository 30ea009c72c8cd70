use crate::DriverError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The back-ends Logre knows how to talk to.
///
/// All back-ends share the same contract (see [`SparqlDriver`](crate::SparqlDriver)). This enum
/// holds the few places where they differ.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndpointTechnology {
    Fuseki,
    AllegroGraph,
    GraphDb,
}

impl EndpointTechnology {
    /// All supported technologies.
    pub const ALL: [EndpointTechnology; 3] = [
        EndpointTechnology::Fuseki,
        EndpointTechnology::AllegroGraph,
        EndpointTechnology::GraphDb,
    ];

    /// The name used in configuration documents.
    pub fn name(self) -> &'static str {
        match self {
            EndpointTechnology::Fuseki => "Fuseki",
            EndpointTechnology::AllegroGraph => "Allegrograph",
            EndpointTechnology::GraphDb => "GraphDB",
        }
    }

    /// The URL RDF documents are posted to and the full dump is read from.
    pub fn upload_url(self, url: &str) -> String {
        let url = url.trim_end_matches('/');
        match self {
            EndpointTechnology::Fuseki => url.to_owned(),
            EndpointTechnology::AllegroGraph => {
                let base = url.strip_suffix("/sparql").unwrap_or(url);
                format!("{base}/statements")
            }
            EndpointTechnology::GraphDb => format!("{url}/statements"),
        }
    }

    /// The URL parameter selecting the named graph of an upload.
    pub fn graph_parameter(self, graph_uri: &str) -> (&'static str, String) {
        match self {
            EndpointTechnology::Fuseki => ("graph", graph_uri.to_owned()),
            EndpointTechnology::AllegroGraph | EndpointTechnology::GraphDb => {
                ("context", format!("<{graph_uri}>"))
            }
        }
    }

    /// Declarations that are prepended to every request in addition to the user prefixes.
    ///
    /// AllegroGraph hides the union of the named graphs unless the default dataset behaviour is
    /// switched to plain RDF semantics.
    pub fn extra_declarations(self) -> &'static str {
        match self {
            EndpointTechnology::AllegroGraph => {
                "PREFIX franzOption_defaultDatasetBehavior: <franz:rdf>\n"
            }
            EndpointTechnology::Fuseki | EndpointTechnology::GraphDb => "",
        }
    }

    /// Whether inserts must first delete the same triples to keep at-most-one semantics.
    pub fn replaces_on_insert(self) -> bool {
        self == EndpointTechnology::AllegroGraph
    }
}

impl Display for EndpointTechnology {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EndpointTechnology {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EndpointTechnology::ALL
            .into_iter()
            .find(|technology| technology.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DriverError::EndpointTechnologyNotSupported(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_technology() {
        assert_eq!("Fuseki".parse::<EndpointTechnology>().ok(), Some(EndpointTechnology::Fuseki));
        assert_eq!(
            "allegrograph".parse::<EndpointTechnology>().ok(),
            Some(EndpointTechnology::AllegroGraph)
        );
        assert_eq!("GraphDB".parse::<EndpointTechnology>().ok(), Some(EndpointTechnology::GraphDb));
        assert!(matches!(
            "Virtuoso".parse::<EndpointTechnology>(),
            Err(DriverError::EndpointTechnologyNotSupported(name)) if name == "Virtuoso"
        ));
    }

    #[test]
    fn test_upload_urls() {
        assert_eq!(
            EndpointTechnology::Fuseki.upload_url("http://localhost:3030/ds"),
            "http://localhost:3030/ds"
        );
        assert_eq!(
            EndpointTechnology::AllegroGraph.upload_url("http://ag:10035/repositories/r/sparql"),
            "http://ag:10035/repositories/r/statements"
        );
        assert_eq!(
            EndpointTechnology::GraphDb.upload_url("http://gdb:7200/repositories/r/"),
            "http://gdb:7200/repositories/r/statements"
        );
    }

    #[test]
    fn test_graph_parameter() {
        assert_eq!(
            EndpointTechnology::Fuseki.graph_parameter("http://ex.org/g"),
            ("graph", "http://ex.org/g".to_owned())
        );
        assert_eq!(
            EndpointTechnology::AllegroGraph.graph_parameter("http://ex.org/g"),
            ("context", "<http://ex.org/g>".to_owned())
        );
    }
}
