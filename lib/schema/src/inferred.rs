use crate::ModelError;
use logre_driver::{Graph, Row};
use logre_model::vocab::xsd;
use logre_model::{CoreProperties, Direction, PrefixTable, Property, RangeKind, Resource};
use tracing::debug;

pub fn inferred_classes_query(graph: &Graph, core: &CoreProperties, prefixes: &PrefixTable) -> String {
    let n = |iri: &str| prefixes.normalize(iri).unwrap_or_default();
    let pattern = format!(
        "?instance {} ?uri .\nOPTIONAL {{ ?uri {} ?class_label . }}\nOPTIONAL {{ ?uri {} ?class_comment . }}\n",
        n(&core.type_property),
        n(&core.label_property),
        n(&core.comment_property),
    );
    format!(
        "SELECT ?uri (SAMPLE(?class_label) AS ?label) (SAMPLE(?class_comment) AS ?comment) WHERE {{\n{}}}\nGROUP BY ?uri\nORDER BY ?uri",
        graph.scope(&pattern, prefixes)
    )
}

/// Builds the query listing every `(domain, predicate, range)` combination used in the data.
///
/// The range of a literal is `xsd:string`. The range of an untyped IRI is unbound.
pub fn inferred_properties_query(
    graph: &Graph,
    core: &CoreProperties,
    prefixes: &PrefixTable,
) -> String {
    let n = |iri: &str| prefixes.normalize(iri).unwrap_or_default();
    let rdf_type = n(&core.type_property);
    let pattern = format!(
        "?s ?uri ?o .
?s {rdf_type} ?domain .
OPTIONAL {{ ?o {rdf_type} ?object_class . }}
BIND(isLiteral(?o) AS ?is_literal)
BIND(IF(?is_literal, {string}, ?object_class) AS ?range)
",
        string = n(xsd::STRING),
    );
    format!(
        "SELECT DISTINCT ?domain ?uri ?range ?is_literal WHERE {{\n{}}}\nORDER BY ?domain ?uri ?range",
        graph.scope(&pattern, prefixes)
    )
}

/// Infers the classes and properties of a data graph from the types and predicates it uses.
pub async fn load_inferred(
    graph: &Graph,
    core: &CoreProperties,
    prefixes: &PrefixTable,
) -> Result<(Vec<Resource>, Vec<Property>), ModelError> {
    let classes = graph
        .run(&inferred_classes_query(graph, core, prefixes), prefixes)
        .await?
        .unwrap_or_default()
        .iter()
        .filter_map(|row| {
            let uri = row.get("uri")?.as_iri()?;
            Some(
                Resource::iri(uri)
                    .with_label(row.non_empty_string("label"))
                    .with_comment(row.non_empty_string("comment")),
            )
        })
        .collect::<Vec<_>>();

    let properties = graph
        .run(&inferred_properties_query(graph, core, prefixes), prefixes)
        .await?
        .unwrap_or_default()
        .iter()
        .filter_map(property_from_row)
        .collect::<Vec<_>>();

    debug!(
        classes = classes.len(),
        properties = properties.len(),
        "Inferred model from data"
    );
    Ok((classes, properties))
}

fn property_from_row(row: &Row) -> Option<Property> {
    let uri = row.get("uri")?.as_iri()?;
    let domain = row.get("domain")?.as_iri()?.to_owned();
    let range_kind = if row.boolean("is_literal").unwrap_or(false) {
        RangeKind::Datatype
    } else {
        RangeKind::Class
    };
    Some(Property {
        order: 0,
        range: row.non_empty_string("range"),
        card_of: Some(domain.clone()),
        domain: Some(domain),
        direction: Direction::Outgoing,
        range_kind,
        ..Property::new(uri)
    })
}
