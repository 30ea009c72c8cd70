use crate::{DataBundle, GraphSelector, LogreError};
pub use logre_driver::VALUE_SEPARATOR;
use logre_driver::Row;
use logre_model::{literal, snake_case, Property};
use logre_schema::Model;
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Write};
use std::str::FromStr;

/// The pseudo-column holding the URI of each instance.
pub const URI_COLUMN: &str = "uri";
pub const OUTGOING_COUNT_COLUMN: &str = "outgoing_count";
pub const INCOMING_COUNT_COLUMN: &str = "incoming_count";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    /// Identifier of the column: a variable name or a property URI.
    pub key: String,
    /// Human-readable name, `"{label} ({range})"` for property columns.
    pub label: String,
}

impl Column {
    fn plain(key: &str) -> Self {
        Self {
            key: key.to_owned(),
            label: key.to_owned(),
        }
    }
}

/// A table of text cells.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<Column>,
    /// One cell per column. Missing values are empty strings.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the position of the column whose key or label is `column`.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.key == column || c.label == column)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index).map(String::as_str)
    }

    /// Returns the cells of one column.
    pub fn column(&self, column: &str) -> Vec<&str> {
        match self.column_index(column) {
            Some(index) => self
                .rows
                .iter()
                .filter_map(|row| row.get(index).map(String::as_str))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Writes the table as CSV with the column keys as header.
    pub fn to_csv(&self) -> Result<String, LogreError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(self.columns.iter().map(|c| c.key.as_str()))?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|error| csv::Error::from(error.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        })
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(format!("Expected 'ASC' or 'DESC', got '{s}'")),
        }
    }
}

/// Pagination, sorting and filtering of a data table.
///
/// Columns are named by their label (see [`DataBundle::get_data_table_columns_names`]), their key,
/// their property URI or [`URI_COLUMN`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataTableOptions {
    pub limit: Option<usize>,
    pub offset: usize,
    pub sort_column: Option<String>,
    pub sort_direction: SortDirection,
    pub filter_column: Option<String>,
    pub filter_value: Option<String>,
}

impl DataTableOptions {
    fn filter(&self) -> Option<(&str, &str)> {
        match (self.filter_column.as_deref(), self.filter_value.as_deref()) {
            (Some(column), Some(value)) if !value.is_empty() => Some((column, value)),
            _ => None,
        }
    }
}

/// What a column argument designates.
enum ColumnTarget<'a> {
    Uri,
    Property(&'a Property),
}

/// Whether IRI values are replaced by their label.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Rendering {
    Labels,
    Raw,
}

/// The variable holding the values of the `index`-th card property.
pub fn column_key(property: &Property, index: usize) -> String {
    let base = snake_case(&property.label);
    if base.is_empty() {
        format!("property_{index}")
    } else {
        format!("{base}_{index}")
    }
}

/// The human-readable name of a property column: `"{label} ({class name of the other end})"`.
pub fn column_name(model: &Model, property: &Property) -> String {
    match property.target_class() {
        Some(target) => format!("{} ({})", property.label, model.get_class_name(target)),
        None => property.label.clone(),
    }
}

#[allow(clippy::multiple_inherent_impl, reason = "The data table compiler is kept apart from bundle plumbing")]
impl DataBundle {
    fn resolve_column<'a>(
        &self,
        model: &Model,
        class_uri: &str,
        card: &'a [Property],
        column: &str,
    ) -> Result<ColumnTarget<'a>, LogreError> {
        if column == URI_COLUMN {
            return Ok(ColumnTarget::Uri);
        }
        let canonical = self.canonical(column);
        card.iter()
            .enumerate()
            .find(|(index, property)| {
                column_name(model, property) == column
                    || column_key(property, *index) == column
                    || property.uri == canonical
            })
            .map(|(_, property)| ColumnTarget::Property(property))
            .ok_or_else(|| LogreError::UnknownColumn {
                class: class_uri.to_owned(),
                column: column.to_owned(),
            })
    }

    /// Returns the card property shown in `column`, or [`None`] for the [`URI_COLUMN`].
    pub async fn find_column_property(
        &self,
        class_uri: &str,
        column: &str,
    ) -> Result<Option<Property>, LogreError> {
        let model = self.model().await?;
        let card = model.get_card_properties_of(&self.canonical(class_uri));
        Ok(match self.resolve_column(&model, class_uri, &card, column)? {
            ColumnTarget::Uri => None,
            ColumnTarget::Property(property) => Some(property.clone()),
        })
    }

    /// Binds `?{value}` to the values of `property` for `?uri`, through `?{node}`.
    fn value_pattern(&self, property: &Property, node: &str, value: &str, rendering: Rendering) -> String {
        let predicate = self.n(&property.uri);
        let edge = if property.is_incoming() {
            format!("?{node} {predicate} ?uri .")
        } else {
            format!("?uri {predicate} ?{node} .")
        };
        if property.is_literal_valued() || rendering == Rendering::Raw {
            format!("{edge}\nBIND(?{node} AS ?{value})")
        } else {
            format!(
                "{edge}\nOPTIONAL {{ ?{node} {} ?{node}_label . }}\nBIND(COALESCE(?{node}_label, STR(?{node})) AS ?{value})",
                self.n(&self.core().label_property)
            )
        }
    }

    /// Restricts `?uri` to the instances whose `column` contains `value`, ignoring case.
    fn filter_pattern(&self, target: &ColumnTarget<'_>, value: &str) -> String {
        let condition = |variable: &str| {
            format!(
                "FILTER(CONTAINS(LCASE(STR(?{variable})), LCASE({})))",
                literal(value)
            )
        };
        match target {
            ColumnTarget::Uri => format!("{}\n", condition("uri")),
            ColumnTarget::Property(property) => format!(
                "{{\n{}\n{}\n}}\n",
                self.value_pattern(property, "filter_node", "filter_on", Rendering::Labels),
                condition("filter_on")
            ),
        }
    }

    fn instances_pattern(&self, class_uri: &str) -> String {
        format!(
            "?uri {} {} .\n",
            self.n(&self.core().type_property),
            self.n(class_uri)
        )
    }

    fn aggregated_columns(
        &self,
        columns: &[(String, &Property)],
        rendering: Rendering,
    ) -> (String, String) {
        let mut projection = String::new();
        let mut patterns = String::new();
        for (key, property) in columns {
            let _ = write!(
                projection,
                " (GROUP_CONCAT(DISTINCT STR(?{key}_value); separator=\"{VALUE_SEPARATOR}\") AS ?{key})"
            );
            let _ = writeln!(
                patterns,
                "OPTIONAL {{\n{}\n}}",
                self.value_pattern(property, &format!("{key}_node"), &format!("{key}_value"), rendering)
            );
        }
        (projection, patterns)
    }

    /// Compiles the main query of [`DataBundle::get_data_table`].
    pub fn data_table_query(
        &self,
        model: &Model,
        class_uri: &str,
        options: &DataTableOptions,
    ) -> Result<String, LogreError> {
        let card = model.get_card_properties_of(&self.canonical(class_uri));
        let columns = card
            .iter()
            .enumerate()
            .map(|(index, property)| (column_key(property, index), property))
            .collect::<Vec<_>>();
        let (mut projection, column_patterns) = self.aggregated_columns(&columns, Rendering::Labels);

        let mut pattern = self.instances_pattern(class_uri);
        if let Some((column, value)) = options.filter() {
            let target = self.resolve_column(model, class_uri, &card, column)?;
            pattern.push_str(&self.filter_pattern(&target, value));
        }
        let order = match options.sort_column.as_deref() {
            Some(column) => match self.resolve_column(model, class_uri, &card, column)? {
                ColumnTarget::Uri => format!("{}(?uri)", options.sort_direction),
                ColumnTarget::Property(property) => {
                    let _ = writeln!(
                        pattern,
                        "OPTIONAL {{\n{}\n}}",
                        self.value_pattern(property, "sort_node", "sort_on", Rendering::Labels)
                    );
                    projection.push_str(" (MIN(?sort_on) AS ?sort_key)");
                    format!("{}(?sort_key) ?uri", options.sort_direction)
                }
            },
            None => "?uri".to_owned(),
        };
        pattern.push_str(&column_patterns);

        Ok(format!(
            "SELECT ?uri{projection} WHERE {{\n{}}}\nGROUP BY ?uri\nORDER BY {order}{}",
            self.graph(GraphSelector::Data).scope(&pattern, self.prefixes()),
            crate::entity::page(options.limit, options.offset)
        ))
    }

    /// Returns one page of the instances of a class, with one column per card property and the
    /// number of outgoing and incoming triples of each instance.
    pub async fn get_data_table(
        &self,
        class_uri: &str,
        options: &DataTableOptions,
    ) -> Result<Table, LogreError> {
        let model = self.model().await?;
        let query = self.data_table_query(&model, class_uri, options)?;
        let card = model.get_card_properties_of(&self.canonical(class_uri));

        let mut columns = vec![Column::plain(URI_COLUMN)];
        columns.extend(card.iter().enumerate().map(|(index, property)| Column {
            key: column_key(property, index),
            label: column_name(&model, property),
        }));

        let solutions = self.select(&query).await?;
        let uris = solutions
            .iter()
            .filter_map(|row| row.get("uri")?.as_iri())
            .map(str::to_owned)
            .collect::<Vec<_>>();
        let outgoing = self.triple_counts(&uris, "?uri ?p ?o .\n").await?;
        let incoming = self.triple_counts(&uris, "?s ?p ?uri .\n").await?;

        let rows = solutions
            .iter()
            .map(|row| {
                let uri = row.string(URI_COLUMN).unwrap_or_default();
                let mut cells = columns
                    .iter()
                    .map(|column| row.string(&column.key).unwrap_or_default())
                    .collect::<Vec<_>>();
                cells.push(outgoing.get(&uri).copied().unwrap_or_default().to_string());
                cells.push(incoming.get(&uri).copied().unwrap_or_default().to_string());
                cells
            })
            .collect();
        columns.push(Column::plain(OUTGOING_COUNT_COLUMN));
        columns.push(Column::plain(INCOMING_COUNT_COLUMN));
        Ok(Table { columns, rows })
    }

    /// Counts the triples matching `pattern` for each of `uris`.
    async fn triple_counts(&self, uris: &[String], pattern: &str) -> Result<HashMap<String, i64>, LogreError> {
        if uris.is_empty() {
            return Ok(HashMap::new());
        }
        let values = uris
            .iter()
            .filter_map(|uri| self.prefixes().normalize(uri))
            .collect::<Vec<_>>()
            .join(" ");
        let query = format!(
            "SELECT ?uri (COUNT(*) AS ?count) WHERE {{\nVALUES ?uri {{ {values} }}\n{}}}\nGROUP BY ?uri",
            self.graph(GraphSelector::Data).scope(pattern, self.prefixes())
        );
        Ok(self
            .select(&query)
            .await?
            .iter()
            .filter_map(|row: &Row| Some((row.string(URI_COLUMN)?, row.integer("count")?)))
            .collect())
    }

    /// Returns the names of the data table columns of a class, in card order.
    pub async fn get_data_table_columns_names(&self, class_uri: &str) -> Result<Vec<String>, LogreError> {
        let model = self.model().await?;
        Ok(model
            .get_card_properties_of(&self.canonical(class_uri))
            .iter()
            .map(|property| column_name(&model, property))
            .collect())
    }

    /// Counts the instances of a class, optionally filtered like [`DataBundle::get_data_table`].
    pub async fn get_class_instances_count(
        &self,
        class_uri: &str,
        filter_column: Option<&str>,
        filter_value: Option<&str>,
    ) -> Result<usize, LogreError> {
        let mut pattern = self.instances_pattern(class_uri);
        if let (Some(column), Some(value)) = (filter_column, filter_value.filter(|v| !v.is_empty())) {
            let model = self.model().await?;
            let card = model.get_card_properties_of(&self.canonical(class_uri));
            let target = self.resolve_column(&model, class_uri, &card, column)?;
            pattern.push_str(&self.filter_pattern(&target, value));
        }
        self.count(&format!(
            "SELECT (COUNT(DISTINCT ?uri) AS ?count) WHERE {{\n{}}}",
            self.graph(GraphSelector::Data).scope(&pattern, self.prefixes())
        ))
        .await
    }

    /// Returns every instance of a class with its class and one column per outgoing card property.
    ///
    /// Column keys are the property URIs and cells hold raw values, so that the table can be
    /// imported back as CSV.
    pub async fn download_class_instances(&self, class_uri: &str) -> Result<Table, LogreError> {
        let model = self.model().await?;
        let card = model.get_card_properties_of(&self.canonical(class_uri));
        let outgoing = card
            .iter()
            .filter(|property| !property.is_incoming())
            .enumerate()
            .map(|(index, property)| (column_key(property, index), property))
            .collect::<Vec<_>>();
        let (projection, patterns) = self.aggregated_columns(&outgoing, Rendering::Raw);
        let mut pattern = self.instances_pattern(class_uri);
        pattern.push_str(&patterns);
        let query = format!(
            "SELECT ?uri{projection} WHERE {{\n{}}}\nGROUP BY ?uri\nORDER BY ?uri",
            self.graph(GraphSelector::Data).scope(&pattern, self.prefixes())
        );

        let core = self.core();
        let type_property = &core.type_property;
        let class = self.canonical(class_uri);
        let typed = !outgoing.iter().any(|(_, property)| &property.uri == type_property);

        let mut columns = vec![Column::plain(URI_COLUMN)];
        if typed {
            columns.push(Column::plain(type_property));
        }
        columns.extend(outgoing.iter().map(|(_, property)| Column {
            key: property.uri.clone(),
            label: column_name(&model, property),
        }));
        let rows = self
            .select(&query)
            .await?
            .iter()
            .map(|row| {
                let mut cells = vec![row.string(URI_COLUMN).unwrap_or_default()];
                if typed {
                    cells.push(class.clone());
                }
                cells.extend(outgoing.iter().map(|(key, _)| {
                    row.string(key)
                        .map(|cell| self.shorten_cell(&cell))
                        .unwrap_or_default()
                }));
                cells
            })
            .collect();
        Ok(Table { columns, rows })
    }

    /// Shortens every IRI of a cell, one value at a time.
    fn shorten_cell(&self, cell: &str) -> String {
        cell.split(VALUE_SEPARATOR)
            .map(|value| {
                if value.starts_with("http://") || value.starts_with("https://") {
                    self.prefixes().shorten(value)
                } else {
                    value.to_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(VALUE_SEPARATOR)
    }
}
