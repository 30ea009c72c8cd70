use crate::rows::{bounded, integer_like};
use crate::ModelError;
use logre_driver::{Graph, Row};
use logre_model::vocab::{rdf, sh};
use logre_model::{CoreProperties, Direction, PrefixTable, Property, RangeKind, Resource};
use tracing::debug;

/// Builds the query listing the classes targeted by node shapes.
pub fn shacl_classes_query(graph: &Graph, core: &CoreProperties, prefixes: &PrefixTable) -> String {
    let n = |iri: &str| prefixes.normalize(iri).unwrap_or_default();
    let pattern = format!(
        "?shape {rdf_type} {node_shape} ; {target} ?uri .
OPTIONAL {{ ?shape {name} ?shape_name . }}
OPTIONAL {{ ?uri {label} ?class_label . }}
OPTIONAL {{ ?shape {description} ?shape_description . }}
OPTIONAL {{ ?uri {comment} ?class_comment . }}
",
        rdf_type = n(rdf::TYPE),
        node_shape = n(sh::NODE_SHAPE),
        target = n(sh::TARGET_CLASS),
        name = n(sh::NAME),
        label = n(&core.label_property),
        description = n(sh::DESCRIPTION),
        comment = n(&core.comment_property),
    );
    format!(
        "SELECT ?uri (SAMPLE(COALESCE(?shape_name, ?class_label)) AS ?label) (SAMPLE(COALESCE(?shape_description, ?class_comment)) AS ?comment) WHERE {{
{}}}
GROUP BY ?uri
ORDER BY ?uri",
        graph.scope(&pattern, prefixes)
    )
}

/// Builds the query returning one row per property shape of every node shape.
///
/// Direct paths bind `?inverse` to `false`, inverse paths (`sh:inversePath`) to `true`.
pub fn shacl_properties_query(graph: &Graph, prefixes: &PrefixTable) -> String {
    let n = |iri: &str| prefixes.normalize(iri).unwrap_or_default();
    let pattern = format!(
        "?shape {rdf_type} {node_shape} ; {target} ?card_of ; {property} ?property .
{{ ?property {path} ?uri . FILTER(isIRI(?uri)) BIND(false AS ?inverse) }}
UNION
{{ ?property {path} ?inverse_path . ?inverse_path {inverse_path} ?uri . BIND(true AS ?inverse) }}
OPTIONAL {{ ?property {name} ?name . }}
OPTIONAL {{ ?property {description} ?description . }}
OPTIONAL {{ ?property {order} ?order . }}
OPTIONAL {{ ?property {min_count} ?min_count . }}
OPTIONAL {{ ?property {max_count} ?max_count . }}
OPTIONAL {{ ?property {datatype} ?datatype . }}
OPTIONAL {{ ?property {class} ?class . }}
OPTIONAL {{ ?property {node} ?node . ?node {target} ?node_class . }}
",
        rdf_type = n(rdf::TYPE),
        node_shape = n(sh::NODE_SHAPE),
        target = n(sh::TARGET_CLASS),
        property = n(sh::PROPERTY),
        path = n(sh::PATH),
        inverse_path = n(sh::INVERSE_PATH),
        name = n(sh::NAME),
        description = n(sh::DESCRIPTION),
        order = n(sh::ORDER),
        min_count = n(sh::MIN_COUNT),
        max_count = n(sh::MAX_COUNT),
        datatype = n(sh::DATATYPE),
        class = n(sh::CLASS),
        node = n(sh::NODE),
    );
    format!(
        "SELECT ?card_of ?uri ?inverse ?name ?description ?order ?min_count ?max_count ?datatype ?class ?node_class WHERE {{
{}}}
ORDER BY ?card_of ?order ?uri",
        graph.scope(&pattern, prefixes)
    )
}

/// Reads the classes and properties described by the node shapes of `graph`.
pub async fn load_shacl(
    graph: &Graph,
    core: &CoreProperties,
    prefixes: &PrefixTable,
) -> Result<(Vec<Resource>, Vec<Property>), ModelError> {
    let classes = graph
        .run(&shacl_classes_query(graph, core, prefixes), prefixes)
        .await?
        .unwrap_or_default()
        .iter()
        .filter_map(class_from_row)
        .collect::<Vec<_>>();

    let mut properties = Vec::<Property>::new();
    let rows = graph
        .run(&shacl_properties_query(graph, prefixes), prefixes)
        .await?
        .unwrap_or_default();
    for property in rows.iter().filter_map(property_from_row) {
        if !properties.contains(&property) {
            properties.push(property);
        }
    }

    debug!(
        classes = classes.len(),
        properties = properties.len(),
        "Loaded SHACL model"
    );
    Ok((classes, properties))
}

fn class_from_row(row: &Row) -> Option<Resource> {
    let uri = row.get("uri")?.as_iri()?;
    Some(
        Resource::iri(uri)
            .with_label(row.non_empty_string("label"))
            .with_comment(row.non_empty_string("comment")),
    )
}

/// Turns a row of [`shacl_properties_query`] into a property.
///
/// A direct path is shown on the card of the target class and points to its `sh:datatype` or
/// `sh:class`. An inverse path is shown on the card of the target class too, but its domain is
/// the class on the other side: `sh:class`, or the target class of the `sh:node` shape.
fn property_from_row(row: &Row) -> Option<Property> {
    let uri = row.get("uri")?.as_iri()?;
    let card_of = row.get("card_of")?.as_iri()?.to_owned();
    let inverse = row.boolean("inverse").unwrap_or(false);
    let class = row
        .non_empty_string("class")
        .or_else(|| row.non_empty_string("node_class"));
    let datatype = row.non_empty_string("datatype");

    let (direction, domain, range, range_kind) = if inverse {
        (Direction::Incoming, class, Some(card_of.clone()), RangeKind::Class)
    } else if let Some(datatype) = datatype {
        (Direction::Outgoing, Some(card_of.clone()), Some(datatype), RangeKind::Datatype)
    } else {
        (Direction::Outgoing, Some(card_of.clone()), class, RangeKind::Class)
    };

    Some(Property {
        label: row.non_empty_string("name").unwrap_or_else(|| uri.to_owned()),
        comment: row.non_empty_string("description"),
        order: integer_like(row, "order").unwrap_or(logre_model::UNBOUNDED),
        min_count: integer_like(row, "min_count").unwrap_or(0),
        max_count: bounded(integer_like(row, "max_count")),
        domain,
        range,
        card_of: Some(card_of),
        direction,
        range_kind,
        ..Property::new(uri)
    })
}
