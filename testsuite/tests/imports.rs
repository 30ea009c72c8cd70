#![cfg(test)]

use anyhow::Result;
use logre::{GraphSelector, LogreError};
use logre_driver::{DriverError, EndpointTechnology};
use logre_schema::ModelFramework;
use logre_testsuite::{bundle, persons, TestEndpoint, DATA_GRAPH, MODEL_GRAPH, PERSON_SHAPE};
use oxigraph::io::RdfFormat;

#[tokio::test]
async fn csv_import() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    let bundle = bundle(&endpoint, EndpointTechnology::Fuseki, ModelFramework::Shacl)?;
    let inserted = bundle
        .import_csv(
            GraphSelector::Data,
            "uri,rdf:type,rdfs:label\nbase:e1,crm:E21,Alice\n",
        )
        .await?;
    assert_eq!(inserted, 2);
    assert_eq!(endpoint.graph_len(Some(DATA_GRAPH))?, 2);

    let statements = bundle.get_outgoing_statements_of("base:e1", &[]).await?;
    let objects = statements
        .iter()
        .map(|statement| (statement.predicate.uri.as_str(), statement.object.key()))
        .collect::<Vec<_>>();
    assert_eq!(objects, [("rdf:type", "crm:E21"), ("rdfs:label", "Alice")]);
    Ok(())
}

#[tokio::test]
async fn malformed_csv_writes_nothing() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    let bundle = bundle(&endpoint, EndpointTechnology::Fuseki, ModelFramework::Shacl)?;
    let result = bundle
        .import_csv(GraphSelector::Data, "rdf:type,rdfs:label\ncrm:E21,Alice\n")
        .await;
    assert!(matches!(
        result,
        Err(LogreError::Driver(DriverError::MalformedCsv(_)))
    ));
    assert!(endpoint.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn nquads_round_trip() -> Result<()> {
    let source = TestEndpoint::start().await?;
    source.load(RdfFormat::Turtle, Some(MODEL_GRAPH), PERSON_SHAPE)?;
    source.load(RdfFormat::Turtle, Some(DATA_GRAPH), &persons(5))?;
    let original = bundle(&source, EndpointTechnology::Fuseki, ModelFramework::Shacl)?;
    let dump = original.dump_nq().await?;
    assert_eq!(dump.lines().count(), source.store().len()?);

    let target = TestEndpoint::start().await?;
    let copy = bundle(&target, EndpointTechnology::GraphDb, ModelFramework::Shacl)?;
    copy.import_nquads(dump).await?;

    assert_eq!(
        copy.get_classes_with_counts().await?,
        original.get_classes_with_counts().await?
    );
    assert_eq!(target.graph_len(Some(DATA_GRAPH))?, 10);
    assert_eq!(target.graph_len(Some(MODEL_GRAPH))?, source.graph_len(Some(MODEL_GRAPH))?);
    Ok(())
}

#[tokio::test]
async fn turtle_dump() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    endpoint.load(RdfFormat::Turtle, Some(DATA_GRAPH), &persons(2))?;
    let original = bundle(&endpoint, EndpointTechnology::Fuseki, ModelFramework::Shacl)?;

    let dump = original.dump_ttl().await?;
    let data = dump.get(GraphSelector::Data);
    assert!(data.contains("@prefix crm: <http://www.cidoc-crm.org/cidoc-crm/> .\n"));
    assert!(data.contains("base:p01 rdfs:label 'Person 01' .\n"), "{data}");
    assert!(data.contains("base:p00 rdf:type crm:E21 .\n"), "{data}");
    assert!(!dump.get(GraphSelector::Model).contains("base:p00"));

    // A Turtle dump loads back into the same graph.
    let target = TestEndpoint::start().await?;
    let copy = bundle(&target, EndpointTechnology::Fuseki, ModelFramework::Shacl)?;
    copy.import_turtle(GraphSelector::Data, data.to_owned()).await?;
    assert_eq!(target.graph_len(Some(DATA_GRAPH))?, 4);
    Ok(())
}
