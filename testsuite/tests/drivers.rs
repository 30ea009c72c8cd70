#![cfg(test)]

use anyhow::Result;
use axum::http::Method;
use logre::{GraphSelector, LogreError};
use logre_driver::{DriverError, EndpointTechnology, SparqlDriver};
use logre_model::{PrefixTable, Triple};
use logre_schema::ModelFramework;
use logre_testsuite::{bundle, persons, TestEndpoint, BASE_URI, DATA_GRAPH};

#[tokio::test]
async fn allegrograph_inserts_replace() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    let bundle = bundle(&endpoint, EndpointTechnology::AllegroGraph, ModelFramework::Shacl)?;
    let triple = Triple::new("base:e1", "rdf:type", "crm:E21");
    for _ in 0..2 {
        bundle
            .insert(GraphSelector::Data, std::slice::from_ref(&triple))
            .await?;
    }
    assert_eq!(bundle.get_objects_of_count("base:e1", "rdf:type").await?, 1);
    assert_eq!(bundle.get_class_instances_count("crm:E21", None, None).await?, 1);
    assert_eq!(endpoint.graph_len(Some(DATA_GRAPH))?, 1);

    let updates = endpoint
        .requests()
        .iter()
        .filter_map(|request| request.form_field("update"))
        .collect::<Vec<_>>();
    assert_eq!(updates.len(), 4);
    for (update, keyword) in updates.iter().zip(["DELETE DATA", "INSERT DATA"].iter().cycle()) {
        assert!(update.starts_with("PREFIX franzOption_defaultDatasetBehavior: <franz:rdf>\n"));
        assert!(update.contains(keyword), "{update}");
    }
    Ok(())
}

#[tokio::test]
async fn fuseki_inserts_once() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    let bundle = bundle(&endpoint, EndpointTechnology::Fuseki, ModelFramework::Shacl)?;
    bundle
        .insert(GraphSelector::Data, &[Triple::new("base:e1", "rdf:type", "crm:E21")])
        .await?;
    let requests = endpoint.requests();
    assert_eq!(requests.len(), 1);
    let update = requests[0].form_field("update").unwrap_or_default();
    assert!(!update.contains("franz"));
    assert!(update.contains("INSERT DATA"));
    assert!(update.contains("GRAPH base:data {"));
    Ok(())
}

#[tokio::test]
async fn upload_urls() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    let expected = [
        (EndpointTechnology::Fuseki, "/sparql", "graph", DATA_GRAPH.to_owned()),
        (
            EndpointTechnology::AllegroGraph,
            "/statements",
            "context",
            format!("<{DATA_GRAPH}>"),
        ),
        (
            EndpointTechnology::GraphDb,
            "/sparql/statements",
            "context",
            format!("<{DATA_GRAPH}>"),
        ),
    ];
    for (technology, path, parameter, value) in expected {
        endpoint.clear_requests();
        let bundle = bundle(&endpoint, technology, ModelFramework::Shacl)?;
        bundle.import_turtle(GraphSelector::Data, persons(1)).await?;

        let requests = endpoint.requests();
        assert_eq!(requests.len(), 1, "{technology}");
        let upload = &requests[0];
        assert_eq!(upload.method, Method::POST);
        assert_eq!(upload.path, path, "{technology}");
        assert_eq!(upload.parameter(parameter), Some(value.as_str()), "{technology}");
        assert_eq!(upload.content_type.as_deref(), Some("text/turtle"));
    }
    assert_eq!(endpoint.graph_len(Some(DATA_GRAPH))?, 2);
    Ok(())
}

#[tokio::test]
async fn basic_authentication() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    let driver = endpoint
        .driver(EndpointTechnology::GraphDb)
        .with_credentials("admin", "secret");
    driver
        .run("ASK { ?s ?p ?o }", &PrefixTable::new(BASE_URI))
        .await?;
    let requests = endpoint.requests();
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Basic YWRtaW46c2VjcmV0")
    );

    endpoint.clear_requests();
    endpoint
        .driver(EndpointTechnology::GraphDb)
        .run("ASK { ?s ?p ?o }", &PrefixTable::new(BASE_URI))
        .await?;
    assert_eq!(endpoint.requests()[0].authorization, None);
    Ok(())
}

#[tokio::test]
async fn query_forms() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    let prefixes = PrefixTable::new(BASE_URI);
    let driver = endpoint.driver(EndpointTechnology::Fuseki);

    let empty = driver.run("ASK { ?s ?p ?o }", &prefixes).await?.unwrap_or_default();
    assert_eq!(empty.rows[0].boolean("boolean"), Some(false));

    let inserted = driver
        .run("INSERT DATA { base:e1 base:knows base:e2 }", &prefixes)
        .await?;
    assert!(inserted.is_none());

    let answer = driver
        .run("ASK { base:e1 base:knows ?o }", &prefixes)
        .await?
        .unwrap_or_default();
    assert_eq!(answer.rows[0].boolean("boolean"), Some(true));

    let graph = driver
        .run("CONSTRUCT { ?s ?p ?o } WHERE { ?s ?p ?o }", &prefixes)
        .await?
        .unwrap_or_default();
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.rows[0].string("object").as_deref(), Some("base:e2"));
    Ok(())
}

#[tokio::test]
async fn malformed_queries_fail_with_the_endpoint_status() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    let result = endpoint
        .driver(EndpointTechnology::Fuseki)
        .run("SELECT ?s WHERE {", &PrefixTable::new(BASE_URI))
        .await;
    assert_eq!(result.err().as_ref().and_then(DriverError::status), Some(400));
    Ok(())
}

#[tokio::test]
async fn unreachable_endpoints() -> Result<()> {
    let driver = SparqlDriver::new(EndpointTechnology::Fuseki, "http://127.0.0.1:1/sparql");
    let result = driver
        .run("ASK { ?s ?p ?o }", &PrefixTable::new(BASE_URI))
        .await;
    assert!(matches!(result, Err(DriverError::Connection(_))));
    Ok(())
}

#[tokio::test]
async fn dumps_keep_literal_types() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    let bundle = bundle(&endpoint, EndpointTechnology::Fuseki, ModelFramework::Shacl)?;
    bundle
        .insert(
            GraphSelector::Data,
            &[
                Triple::new("base:e1", "base:age", "\"42\"^^xsd:int"),
                Triple::new("base:e1", "rdfs:label", "'Alice'@en"),
                Triple::new("base:e1", "base:count", "7"),
            ],
        )
        .await?;
    let dump = bundle.dump_nq().await?;
    assert!(dump.contains("\"42\"^^<http://www.w3.org/2001/XMLSchema#int>"), "{dump}");
    assert!(dump.contains("\"Alice\"@en"), "{dump}");
    assert!(dump.contains("\"7\"^^<http://www.w3.org/2001/XMLSchema#integer>"), "{dump}");
    Ok(())
}

#[tokio::test]
async fn invalid_iris_are_not_sent() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    let bundle = bundle(&endpoint, EndpointTechnology::Fuseki, ModelFramework::Shacl)?;
    let result = bundle
        .insert(
            GraphSelector::Data,
            &[Triple::new("base:a", "base:knows", "base:c - http://ex.org/b")],
        )
        .await;
    assert!(matches!(
        result,
        Err(LogreError::Driver(DriverError::IncompleteTriple(_)))
    ));
    assert!(endpoint.requests().is_empty());
    Ok(())
}
