use logre_driver::Row;
use logre_model::UNBOUNDED;

/// Reads an integer binding, accepting decimal lexical forms like `1.0`.
pub(crate) fn integer_like(row: &Row, variable: &str) -> Option<i64> {
    row.integer(variable).or_else(|| {
        let value = row.string(variable)?.trim().parse::<f64>().ok()?;
        #[allow(
            clippy::cast_possible_truncation,
            reason = "orders and cardinalities are small"
        )]
        let value = value as i64;
        Some(value)
    })
}

/// Maps a missing or negative upper bound to [`UNBOUNDED`].
pub(crate) fn bounded(value: Option<i64>) -> i64 {
    value.filter(|value| *value >= 0).unwrap_or(UNBOUNDED)
}
