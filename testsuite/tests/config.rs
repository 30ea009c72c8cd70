#![cfg(test)]

use anyhow::Result;
use logre::{ConfigDocument, ConfigStore, DataBundleConfig, GraphSelector, Settings};
use logre_driver::EndpointTechnology;
use logre_model::Triple;
use logre_testsuite::{TestEndpoint, CRM, DATA_GRAPH, MODEL_GRAPH};

fn store(endpoint: &TestEndpoint) -> Result<ConfigStore> {
    let mut store = ConfigStore::new(
        "logre.json",
        Settings::default(),
        ConfigDocument::default(),
    );
    let mut people = DataBundleConfig::new(
        "People",
        "http://ex.org/",
        endpoint.url(),
        EndpointTechnology::GraphDb,
    );
    people.username = "admin".to_owned();
    people.password = "secret".to_owned();
    people.graph_data_uri = DATA_GRAPH.to_owned();
    people.graph_model_uri = MODEL_GRAPH.to_owned();
    store.upsert_data_bundle(people);
    store.upsert_data_bundle(DataBundleConfig::new(
        "Scratch",
        "http://scratch.org/",
        endpoint.url(),
        EndpointTechnology::Fuseki,
    ));
    store.add_prefix("crm", CRM)?;
    Ok(store)
}

#[tokio::test]
async fn configured_bundles_reach_their_endpoint() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    let store = store(&endpoint)?;
    assert_eq!(store.bundles_on_endpoint(&endpoint.url())?.len(), 2);

    let people = store.build_bundle("People")?;
    assert_eq!(people.prefixes().get("crm"), Some(CRM));
    people
        .insert(GraphSelector::Data, &[Triple::new("base:e1", "rdf:type", "crm:E21")])
        .await?;
    assert_eq!(endpoint.graph_len(Some(DATA_GRAPH))?, 1);

    let request = &endpoint.requests()[0];
    assert_eq!(request.authorization.as_deref(), Some("Basic YWRtaW46c2VjcmV0"));

    // Graphless bundles write to the default graph.
    endpoint.clear_requests();
    let scratch = store.build_bundle("Scratch")?;
    scratch
        .insert(GraphSelector::Data, &[Triple::new("base:e1", "rdf:type", "crm:E21")])
        .await?;
    assert_eq!(endpoint.graph_len(None)?, 1);
    assert_eq!(endpoint.requests()[0].authorization, None);
    Ok(())
}

#[tokio::test]
async fn every_bundle_is_built() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    let store = store(&endpoint)?;
    let names = store
        .build_bundles()?
        .iter()
        .map(|bundle| bundle.name().to_owned())
        .collect::<Vec<_>>();
    assert_eq!(names, ["People", "Scratch"]);
    assert_eq!(store.default_data_bundle().map(|b| b.name.as_str()), Some("People"));
    Ok(())
}
