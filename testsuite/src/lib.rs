//! End-to-end test harness of Logre.
//!
//! The tests drive data bundles against a [`TestEndpoint`], an in-process SPARQL endpoint backed
//! by an in-memory Oxigraph store.

mod endpoint;

pub use endpoint::*;

use anyhow::Result;
use logre::{DataBundle, DataBundleOptions};
use logre_driver::EndpointTechnology;
use logre_model::Prefix;
use logre_schema::ModelFramework;
use std::fmt::Write;

pub const BASE_URI: &str = "http://ex.org/";
pub const DATA_GRAPH: &str = "http://ex.org/data";
pub const MODEL_GRAPH: &str = "http://ex.org/model";
pub const METADATA_GRAPH: &str = "http://ex.org/metadata";
pub const CRM: &str = "http://www.cidoc-crm.org/cidoc-crm/";

/// A SHACL shape of `crm:E21` with a single `Name` property.
pub const PERSON_SHAPE: &str = r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
@prefix crm: <http://www.cidoc-crm.org/cidoc-crm/> .
@prefix base: <http://ex.org/> .

base:PersonShape a sh:NodeShape ;
    sh:targetClass crm:E21 ;
    sh:name "Person" ;
    sh:property base:PersonNameShape .

base:PersonNameShape sh:path rdfs:label ;
    sh:name "Name" ;
    sh:order 1 ;
    sh:minCount 1 ;
    sh:maxCount 1 ;
    sh:datatype xsd:string .
"#;

/// Builds a data bundle named "People" on `endpoint`, with the `data`, `model` and `metadata`
/// graphs under [`BASE_URI`] and the `crm` prefix.
pub fn bundle(
    endpoint: &TestEndpoint,
    technology: EndpointTechnology,
    framework: ModelFramework,
) -> Result<DataBundle> {
    let options = DataBundleOptions {
        name: "People".to_owned(),
        base_uri: BASE_URI.to_owned(),
        framework,
        graph_data_uri: Some(DATA_GRAPH.to_owned()),
        graph_model_uri: Some(MODEL_GRAPH.to_owned()),
        graph_metadata_uri: Some(METADATA_GRAPH.to_owned()),
        prefixes: vec![Prefix::new("crm", CRM)],
        ..DataBundleOptions::default()
    };
    Ok(DataBundle::new(options, endpoint.driver(technology))?)
}

/// Turtle describing `count` persons `base:p00`, `base:p01`, … labelled `Person 00`, `Person 01`, …
pub fn persons(count: usize) -> String {
    let mut out = String::from(
        "@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n@prefix crm: <http://www.cidoc-crm.org/cidoc-crm/> .\n@prefix base: <http://ex.org/> .\n",
    );
    for index in 0..count {
        let _ = writeln!(
            out,
            "base:p{index:02} a crm:E21 ; rdfs:label \"Person {index:02}\" ."
        );
    }
    out
}
