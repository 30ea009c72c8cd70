use crate::DriverError;
use logre_model::vocab::xsd;
use logre_model::PrefixTable;
use oxrdf::{Literal, Term, Variable};
use oxttl::NTriplesParser;
use sparesults::{QueryResultsFormat, QueryResultsParser, QuerySolution, ReaderQueryResultsParserOutput};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// The name of the single binding of the row returned for `ASK` queries.
pub const BOOLEAN_VARIABLE: &str = "boolean";

/// A literal returned by an endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LiteralValue {
    pub value: String,
    /// Shortened datatype IRI. [`None`] for plain strings and language-tagged strings.
    pub datatype: Option<String>,
    pub language: Option<String>,
}

impl LiteralValue {
    pub fn simple(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }
}

/// A decoded binding.
///
/// IRIs are shortened with the prefix table of the request. `xsd:integer` literals are converted
/// to [`Value::Integer`] when their lexical form is the canonical form of an `i64`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Iri(String),
    /// A blank node identifier, including its `_:` marker.
    BlankNode(String),
    Literal(LiteralValue),
    Integer(i64),
    Boolean(bool),
}

impl Value {
    /// Creates a plain string literal.
    pub fn string(value: impl Into<String>) -> Self {
        Value::Literal(LiteralValue::simple(value))
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Value::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Returns the URI of a node: IRIs and blank nodes.
    pub fn as_node(&self) -> Option<&str> {
        match self {
            Value::Iri(id) | Value::BlankNode(id) => Some(id),
            _ => None,
        }
    }

    /// Returns the integer value, parsing literals if needed.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            Value::Literal(literal) => literal.value.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns the boolean value. Accepts `true`, `false`, `1` and `0` literals.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            Value::Integer(value) => Some(*value != 0),
            Value::Literal(literal) => match literal.value.trim() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Value::Literal(_) | Value::Integer(_) | Value::Boolean(_)
        )
    }

    pub fn is_blank_node(&self) -> bool {
        matches!(self, Value::BlankNode(_))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Iri(id) | Value::BlankNode(id) => f.write_str(id),
            Value::Literal(literal) => f.write_str(&literal.value),
            Value::Integer(value) => write!(f, "{value}"),
            Value::Boolean(value) => write!(f, "{value}"),
        }
    }
}

/// One solution: variable name to value. Unbound variables are absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row(BTreeMap<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, variable: &str) -> Option<&Value> {
        self.0.get(variable)
    }

    /// Returns the textual form of a binding.
    pub fn string(&self, variable: &str) -> Option<String> {
        self.get(variable).map(ToString::to_string)
    }

    /// Returns the textual form of a binding, ignoring empty strings.
    pub fn non_empty_string(&self, variable: &str) -> Option<String> {
        self.string(variable).filter(|value| !value.is_empty())
    }

    pub fn integer(&self, variable: &str) -> Option<i64> {
        self.get(variable).and_then(Value::as_integer)
    }

    pub fn boolean(&self, variable: &str) -> Option<bool> {
        self.get(variable).and_then(Value::as_bool)
    }

    pub fn insert(&mut self, variable: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(variable.into(), value)
    }

    pub fn remove(&mut self, variable: &str) -> Option<Value> {
        self.0.remove(variable)
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.0.contains_key(variable)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'row> IntoIterator for &'row Row {
    type Item = (&'row String, &'row Value);
    type IntoIter = btree_map::Iter<'row, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// The decoded answer of a read query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Solutions {
    /// Projected variables, in projection order.
    pub variables: Vec<String>,
    pub rows: Vec<Row>,
}

impl Solutions {
    /// The answer of an `ASK` query: a single row with a single [`BOOLEAN_VARIABLE`] binding.
    pub fn boolean(value: bool) -> Self {
        Self {
            variables: vec![BOOLEAN_VARIABLE.to_owned()],
            rows: vec![Row::from_iter([(BOOLEAN_VARIABLE, Value::Boolean(value))])],
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl IntoIterator for Solutions {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'solutions> IntoIterator for &'solutions Solutions {
    type Item = &'solutions Row;
    type IntoIter = std::slice::Iter<'solutions, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Decodes a `application/sparql-results+json` document.
pub fn decode_json_results(body: &[u8], prefixes: &PrefixTable) -> Result<Solutions, DriverError> {
    let parser = QueryResultsParser::from_format(QueryResultsFormat::Json);
    match parser.for_reader(body)? {
        ReaderQueryResultsParserOutput::Boolean(value) => Ok(Solutions::boolean(value)),
        ReaderQueryResultsParserOutput::Solutions(solutions) => {
            let variables = solutions
                .variables()
                .iter()
                .map(|variable| variable.as_str().to_owned())
                .collect();
            let rows = solutions
                .map(|solution| solution.map(|solution| decode_solution(&solution, prefixes)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Solutions { variables, rows })
        }
    }
}

/// Decodes the `application/n-triples` answer of a `CONSTRUCT` or `DESCRIBE` query into rows with
/// the `subject`, `predicate` and `object` bindings.
pub fn decode_n_triples(body: &[u8], prefixes: &PrefixTable) -> Result<Solutions, DriverError> {
    let rows = NTriplesParser::new()
        .for_reader(body)
        .map(|triple| {
            let triple = triple?;
            Ok(Row::from_iter([
                ("subject", decode_term(&triple.subject.into(), prefixes)),
                ("predicate", decode_term(&triple.predicate.into(), prefixes)),
                ("object", decode_term(&triple.object, prefixes)),
            ]))
        })
        .collect::<Result<Vec<_>, DriverError>>()?;
    Ok(Solutions {
        variables: ["subject", "predicate", "object"].map(str::to_owned).to_vec(),
        rows,
    })
}

fn decode_solution(solution: &QuerySolution, prefixes: &PrefixTable) -> Row {
    solution
        .iter()
        .map(|(variable, term): (&Variable, &Term)| {
            (variable.as_str(), decode_term(term, prefixes))
        })
        .collect()
}

pub(crate) fn decode_term(term: &Term, prefixes: &PrefixTable) -> Value {
    match term {
        Term::NamedNode(node) => Value::Iri(prefixes.shorten(node.as_str())),
        Term::BlankNode(node) => Value::BlankNode(format!("_:{}", node.as_str())),
        Term::Literal(literal) => decode_literal(literal, prefixes),
        #[allow(
            unreachable_patterns,
            reason = "Quoted triples only exist when oxrdf is built with rdf-star"
        )]
        _ => Value::string(term.to_string()),
    }
}

fn decode_literal(literal: &Literal, prefixes: &PrefixTable) -> Value {
    let datatype = literal.datatype().as_str();
    if datatype == xsd::INTEGER {
        // Non-canonical forms such as `007` or `+7` stay literals so that they are written back
        // unchanged.
        if let Ok(value) = literal.value().parse::<i64>() {
            if value.to_string() == literal.value() {
                return Value::Integer(value);
            }
        }
    }

    let datatype = match (literal.language(), datatype) {
        (Some(_), _) => None,
        (None, xsd::STRING) => None,
        (None, datatype) => Some(prefixes.shorten(datatype)),
    };
    Value::Literal(LiteralValue {
        value: literal.value().to_owned(),
        datatype,
        language: literal.language().map(str::to_owned),
    })
}
