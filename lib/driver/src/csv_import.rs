use crate::DriverError;
use logre_model::{literal, PrefixTable, Triple};

/// The CSV column holding the subject of each row.
pub const URI_COLUMN: &str = "uri";
/// Separator between the values of a multi-valued cell.
pub const VALUE_SEPARATOR: &str = " - ";

/// Converts a CSV document into triples.
///
/// The header row names the predicates (IRIs or prefixed names). The [`URI_COLUMN`] names the
/// subject of each row. Each other non-empty cell yields one triple. Cells that look like IRIs
/// (`http://`, `https://` or a prefixed name of a registered prefix) become IRIs, everything else
/// becomes a string literal.
///
/// A cell whose [`VALUE_SEPARATOR`]-separated parts all look like IRIs holds several values and
/// yields one triple per value. Other cells are kept whole, separator included.
pub fn csv_to_triples(body: &str, prefixes: &PrefixTable) -> Result<Vec<Triple>, DriverError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    if let Some(position) = headers.iter().position(str::is_empty) {
        return Err(DriverError::MalformedCsv(format!(
            "column {} has no header",
            position + 1
        )));
    }
    let uri_column = headers
        .iter()
        .position(|header| header == URI_COLUMN)
        .ok_or_else(|| {
            DriverError::MalformedCsv(format!("missing '{URI_COLUMN}' column"))
        })?;

    let mut triples = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);
        let subject = record
            .get(uri_column)
            .filter(|subject| !subject.is_empty())
            .ok_or_else(|| DriverError::MalformedCsv(format!("line {line} has no {URI_COLUMN}")))?;

        for (column, (predicate, cell)) in headers.iter().zip(record.iter()).enumerate() {
            if column == uri_column || cell.is_empty() {
                continue;
            }
            let values = cell.split(VALUE_SEPARATOR).map(str::trim).collect::<Vec<_>>();
            if values.iter().all(|value| looks_like_iri(value, prefixes)) {
                triples.extend(
                    values
                        .into_iter()
                        .map(|value| Triple::new(subject, predicate, value)),
                );
            } else {
                triples.push(Triple::new(subject, predicate, literal(cell)));
            }
        }
    }
    Ok(triples)
}

fn looks_like_iri(cell: &str, prefixes: &PrefixTable) -> bool {
    cell.starts_with("http://") || cell.starts_with("https://") || prefixes.is_prefixed(cell)
}
