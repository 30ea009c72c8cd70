//! IRIs of the vocabularies Logre relies on.

/// [RDF](https://www.w3.org/TR/rdf11-concepts/) vocabulary.
pub mod rdf {
    pub const NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
}

/// [RDFS](https://www.w3.org/TR/rdf-schema/) vocabulary.
pub mod rdfs {
    pub const NAMESPACE: &str = "http://www.w3.org/2000/01/rdf-schema#";
    pub const LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
    pub const COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";
}

/// [XML Schema](https://www.w3.org/TR/xmlschema11-2/) datatypes.
pub mod xsd {
    pub const NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
}

/// [OWL](https://www.w3.org/TR/owl2-overview/) vocabulary.
pub mod owl {
    pub const NAMESPACE: &str = "http://www.w3.org/2002/07/owl#";
}

/// [SHACL](https://www.w3.org/TR/shacl/) vocabulary.
pub mod sh {
    pub const NAMESPACE: &str = "http://www.w3.org/ns/shacl#";
    pub const NODE_SHAPE: &str = "http://www.w3.org/ns/shacl#NodeShape";
    pub const TARGET_CLASS: &str = "http://www.w3.org/ns/shacl#targetClass";
    pub const PROPERTY: &str = "http://www.w3.org/ns/shacl#property";
    pub const PATH: &str = "http://www.w3.org/ns/shacl#path";
    pub const INVERSE_PATH: &str = "http://www.w3.org/ns/shacl#inversePath";
    pub const NAME: &str = "http://www.w3.org/ns/shacl#name";
    pub const DESCRIPTION: &str = "http://www.w3.org/ns/shacl#description";
    pub const ORDER: &str = "http://www.w3.org/ns/shacl#order";
    pub const MIN_COUNT: &str = "http://www.w3.org/ns/shacl#minCount";
    pub const MAX_COUNT: &str = "http://www.w3.org/ns/shacl#maxCount";
    pub const DATATYPE: &str = "http://www.w3.org/ns/shacl#datatype";
    pub const CLASS: &str = "http://www.w3.org/ns/shacl#class";
    pub const NODE: &str = "http://www.w3.org/ns/shacl#node";
}
