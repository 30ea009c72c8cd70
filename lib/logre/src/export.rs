use crate::table::{Column, Table};
use crate::{DataBundle, GraphSelector, LogreError};
use logre_model::{local_name, snake_case, Direction, Property, Resource, UNBOUNDED};
use std::collections::BTreeMap;
use tracing::info;

pub const MODEL_CLASSES_FILE: &str = "model-classes";
pub const MODEL_PROPERTIES_FILE: &str = "model-properties";

/// The three graphs of a bundle serialized as Turtle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurtleDump {
    pub data: String,
    pub model: String,
    pub metadata: String,
}

impl TurtleDump {
    pub fn get(&self, selector: GraphSelector) -> &str {
        match selector {
            GraphSelector::Data => &self.data,
            GraphSelector::Model => &self.model,
            GraphSelector::Metadata => &self.metadata,
        }
    }
}

#[allow(clippy::multiple_inherent_impl, reason = "Bulk exports are kept apart from bundle plumbing")]
impl DataBundle {
    /// Serializes the three graphs as one N-Quads document.
    ///
    /// Graphs sharing a URI are written once.
    pub async fn dump_nq(&self) -> Result<String, LogreError> {
        let mut seen = Vec::new();
        let mut out = String::new();
        for selector in GraphSelector::ALL {
            let graph = self.graph(selector);
            if seen.contains(&graph.uri()) {
                continue;
            }
            seen.push(graph.uri());
            out.push_str(&graph.dump_nquads(self.prefixes()).await?);
        }
        info!(bundle = %self.name(), lines = out.lines().count(), "Dumped bundle as N-Quads");
        Ok(out)
    }

    pub async fn dump_ttl(&self) -> Result<TurtleDump, LogreError> {
        let dump = |selector| self.graph(selector).dump_turtle(self.prefixes());
        Ok(TurtleDump {
            data: dump(GraphSelector::Data).await?,
            model: dump(GraphSelector::Model).await?,
            metadata: dump(GraphSelector::Metadata).await?,
        })
    }

    /// Exports the model and the instances of every class as CSV documents.
    ///
    /// Keys are file stems: [`MODEL_CLASSES_FILE`], [`MODEL_PROPERTIES_FILE`] and one snake-cased
    /// class name per class.
    pub async fn dump_csv(&self) -> Result<BTreeMap<String, String>, LogreError> {
        let model = self.model().await?;
        let mut files = BTreeMap::new();
        files.insert(
            MODEL_CLASSES_FILE.to_owned(),
            classes_table(model.get_classes()).to_csv()?,
        );
        files.insert(
            MODEL_PROPERTIES_FILE.to_owned(),
            properties_table(model.get_properties()).to_csv()?,
        );
        for class in model.get_classes() {
            let table = self.download_class_instances(&class.uri).await?;
            let mut stem = class_file_stem(class);
            if files.contains_key(&stem) {
                stem = format!("{stem}_{}", files.len());
            }
            files.insert(stem, table.to_csv()?);
        }
        info!(bundle = %self.name(), files = files.len(), "Dumped bundle as CSV");
        Ok(files)
    }
}

fn class_file_stem(class: &Resource) -> String {
    let stem = snake_case(&class.label);
    if stem.is_empty() {
        snake_case(local_name(&class.uri))
    } else {
        stem
    }
}

fn columns(keys: &[&str]) -> Vec<Column> {
    keys.iter()
        .map(|key| Column {
            key: (*key).to_owned(),
            label: (*key).to_owned(),
        })
        .collect()
}

fn classes_table(classes: &[Resource]) -> Table {
    Table {
        columns: columns(&["uri", "label", "comment"]),
        rows: classes
            .iter()
            .map(|class| {
                vec![
                    class.uri.clone(),
                    class.label.clone(),
                    class.comment.clone().unwrap_or_default(),
                ]
            })
            .collect(),
    }
}

fn bound(value: i64) -> String {
    if value == UNBOUNDED {
        String::new()
    } else {
        value.to_string()
    }
}

fn properties_table(properties: &[Property]) -> Table {
    Table {
        columns: columns(&[
            "uri", "label", "order", "min_count", "max_count", "domain", "range", "card_of",
            "direction",
        ]),
        rows: properties
            .iter()
            .map(|property| {
                vec![
                    property.uri.clone(),
                    property.label.clone(),
                    bound(property.order),
                    property.min_count.to_string(),
                    bound(property.max_count),
                    property.domain.clone().unwrap_or_default(),
                    property.range.clone().unwrap_or_default(),
                    property.card_of.clone().unwrap_or_default(),
                    match property.direction {
                        Direction::Outgoing => "outgoing",
                        Direction::Incoming => "incoming",
                    }
                    .to_owned(),
                ]
            })
            .collect(),
    }
}
