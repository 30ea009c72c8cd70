#![cfg(test)]

use anyhow::Result;
use logre::{
    DataBundle, DataTableOptions, GraphSelector, LogreError, SortDirection, INCOMING_COUNT_COLUMN,
    MODEL_CLASSES_FILE, MODEL_PROPERTIES_FILE, OUTGOING_COUNT_COLUMN, URI_COLUMN,
};
use logre_driver::EndpointTechnology;
use logre_schema::ModelFramework;
use logre_testsuite::{bundle, persons, TestEndpoint, DATA_GRAPH, MODEL_GRAPH, PERSON_SHAPE};
use oxigraph::io::RdfFormat;

const NAME: &str = "Name (xsd:string)";

async fn people(endpoint: &TestEndpoint, data: &str) -> Result<DataBundle> {
    endpoint.load(RdfFormat::Turtle, Some(MODEL_GRAPH), PERSON_SHAPE)?;
    endpoint.load(RdfFormat::Turtle, Some(DATA_GRAPH), data)?;
    let bundle = bundle(endpoint, EndpointTechnology::Fuseki, ModelFramework::Shacl)?;
    assert_eq!(bundle.get_data_table_columns_names("crm:E21").await?, [NAME]);
    Ok(bundle)
}

#[tokio::test]
async fn sorted_page() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    let bundle = people(&endpoint, &persons(50)).await?;

    let options = DataTableOptions {
        limit: Some(10),
        offset: 20,
        sort_column: Some(NAME.to_owned()),
        sort_direction: SortDirection::Asc,
        ..DataTableOptions::default()
    };
    let table = bundle.get_data_table("crm:E21", &options).await?;
    let expected = (20..30).map(|index| format!("Person {index}")).collect::<Vec<_>>();
    assert_eq!(table.column("name_0"), expected);
    assert_eq!(table.column(NAME), expected);
    assert_eq!(table.get(0, URI_COLUMN), Some("base:p20"));
    assert!(table.column(OUTGOING_COUNT_COLUMN).iter().all(|count| *count == "2"));
    assert!(table.column(INCOMING_COUNT_COLUMN).iter().all(|count| *count == "0"));
    Ok(())
}

#[tokio::test]
async fn sorted_by_uri() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    let bundle = people(&endpoint, &persons(12)).await?;

    let options = DataTableOptions {
        limit: Some(3),
        sort_column: Some(URI_COLUMN.to_owned()),
        sort_direction: SortDirection::Desc,
        ..DataTableOptions::default()
    };
    let table = bundle.get_data_table("crm:E21", &options).await?;
    assert_eq!(table.column(URI_COLUMN), ["base:p11", "base:p10", "base:p09"]);

    let unsorted = bundle
        .get_data_table("crm:E21", &DataTableOptions::default())
        .await?;
    assert_eq!(unsorted.len(), 12);
    assert_eq!(unsorted.get(0, URI_COLUMN), Some("base:p00"));
    Ok(())
}

const NAMES: &str = r#"
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix crm: <http://www.cidoc-crm.org/cidoc-crm/> .
@prefix base: <http://ex.org/> .

base:alice a crm:E21 ; rdfs:label "Alice" .
base:albert a crm:E21 ; rdfs:label "Albert" .
base:valerie a crm:E21 ; rdfs:label "Valerie" .
base:bob a crm:E21 ; rdfs:label "Bob" ; base:knows base:alice .
"#;

#[tokio::test]
async fn filtered_table() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    let bundle = people(&endpoint, NAMES).await?;

    let options = DataTableOptions {
        sort_column: Some(NAME.to_owned()),
        filter_column: Some(NAME.to_owned()),
        filter_value: Some("AL".to_owned()),
        ..DataTableOptions::default()
    };
    let table = bundle.get_data_table("crm:E21", &options).await?;
    assert_eq!(table.column("name_0"), ["Albert", "Alice", "Valerie"]);
    assert_eq!(
        bundle
            .get_class_instances_count("crm:E21", Some(NAME), Some("al"))
            .await?,
        3
    );
    assert_eq!(bundle.get_class_instances_count("crm:E21", None, None).await?, 4);

    let alice = table
        .rows
        .iter()
        .position(|row| row[0] == "base:alice")
        .ok_or_else(|| anyhow::anyhow!("missing base:alice"))?;
    assert_eq!(table.column(INCOMING_COUNT_COLUMN)[alice], "1");

    let by_uri = DataTableOptions {
        filter_column: Some(URI_COLUMN.to_owned()),
        filter_value: Some("bo".to_owned()),
        ..DataTableOptions::default()
    };
    assert_eq!(
        bundle.get_data_table("crm:E21", &by_uri).await?.column(URI_COLUMN),
        ["base:bob"]
    );
    Ok(())
}

#[tokio::test]
async fn unknown_columns_are_rejected() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    let bundle = people(&endpoint, NAMES).await?;
    let options = DataTableOptions {
        sort_column: Some("Age".to_owned()),
        ..DataTableOptions::default()
    };
    assert!(matches!(
        bundle.get_data_table("crm:E21", &options).await,
        Err(LogreError::UnknownColumn { .. })
    ));

    for column in [NAME, "name_0", "http://www.w3.org/2000/01/rdf-schema#label"] {
        let property = bundle.find_column_property("crm:E21", column).await?;
        assert_eq!(property.map(|p| p.uri).as_deref(), Some("rdfs:label"), "{column}");
    }
    assert_eq!(bundle.find_column_property("crm:E21", URI_COLUMN).await?, None);
    assert!(bundle.find_column_property("crm:E21", "Age").await.is_err());
    Ok(())
}

#[tokio::test]
async fn download_instances() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    let bundle = people(&endpoint, NAMES).await?;
    let table = bundle.download_class_instances("crm:E21").await?;
    insta::assert_snapshot!(table.to_csv()?, @r"
    uri,rdf:type,rdfs:label
    base:albert,crm:E21,Albert
    base:alice,crm:E21,Alice
    base:bob,crm:E21,Bob
    base:valerie,crm:E21,Valerie
    ");
    Ok(())
}

#[tokio::test]
async fn csv_dump() -> Result<()> {
    let endpoint = TestEndpoint::start().await?;
    let bundle = people(&endpoint, NAMES).await?;
    let files = bundle.dump_csv().await?;
    assert_eq!(
        files.keys().map(String::as_str).collect::<Vec<_>>(),
        [MODEL_CLASSES_FILE, MODEL_PROPERTIES_FILE, "person"]
    );
    insta::assert_snapshot!(&files[MODEL_CLASSES_FILE], @r"
    uri,label,comment
    crm:E21,Person,
    ");
    assert!(files["person"].starts_with("uri,rdf:type,rdfs:label\nbase:albert,crm:E21,Albert\n"));

    // Exports do not write.
    assert!(endpoint
        .requests()
        .iter()
        .all(|request| !request.is_update()));
    Ok(())
}

/// Adds a multi-valued, IRI-valued `Knows` property to the person shape.
const KNOWS_SHAPE: &str = r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix crm: <http://www.cidoc-crm.org/cidoc-crm/> .
@prefix base: <http://ex.org/> .

base:PersonShape sh:property base:PersonKnowsShape .

base:PersonKnowsShape sh:path base:knows ;
    sh:name "Knows" ;
    sh:order 2 ;
    sh:class crm:E21 .
"#;

const FRIENDS: &str = r#"
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix crm: <http://www.cidoc-crm.org/cidoc-crm/> .
@prefix base: <http://ex.org/> .

base:a a crm:E21 ; rdfs:label "Ann" ; base:knows base:b, base:c .
base:b a crm:E21 ; rdfs:label "Ben" ; base:knows base:c .
base:c a crm:E21 ; rdfs:label "Cid, Jr. - the third" .
"#;

fn friends(endpoint: &TestEndpoint, data: &str) -> Result<DataBundle> {
    endpoint.load(RdfFormat::Turtle, Some(MODEL_GRAPH), PERSON_SHAPE)?;
    endpoint.load(RdfFormat::Turtle, Some(MODEL_GRAPH), KNOWS_SHAPE)?;
    endpoint.load(RdfFormat::Turtle, Some(DATA_GRAPH), data)?;
    bundle(endpoint, EndpointTechnology::Fuseki, ModelFramework::Shacl)
}

fn sorted_lines(text: &str) -> Vec<&str> {
    let mut lines = text.lines().collect::<Vec<_>>();
    lines.sort_unstable();
    lines
}

#[tokio::test]
async fn csv_export_imports_back() -> Result<()> {
    let source = TestEndpoint::start().await?;
    let original = friends(&source, FRIENDS)?;
    let files = original.dump_csv().await?;
    let person = &files["person"];

    let mut lines = person.lines();
    assert_eq!(lines.next(), Some("uri,rdf:type,rdfs:label,base:knows"));
    let ann = lines.next().unwrap_or_default();
    assert!(
        ann == "base:a,crm:E21,Ann,base:b - base:c" || ann == "base:a,crm:E21,Ann,base:c - base:b",
        "{ann}"
    );
    assert!(person.contains("base:c,crm:E21,\"Cid, Jr. - the third\","), "{person}");

    let target = TestEndpoint::start().await?;
    let copy = friends(&target, "")?;
    let inserted = copy.import_csv(GraphSelector::Data, person).await?;
    assert_eq!(inserted, 9);
    assert_eq!(target.graph_len(Some(DATA_GRAPH))?, source.graph_len(Some(DATA_GRAPH))?);
    assert_eq!(
        copy.get_classes_with_counts().await?,
        original.get_classes_with_counts().await?
    );
    assert_eq!(
        sorted_lines(&copy.dump_nq().await?),
        sorted_lines(&original.dump_nq().await?)
    );
    Ok(())
}
