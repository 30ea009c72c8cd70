use crate::DriverError;
use logre_model::{PrefixTable, Triple};

/// Maximum number of triples sent in a single update request.
pub const CHUNK_SIZE: usize = 1000;

/// The kind of a SPARQL request, which decides how it is sent and how its answer is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryForm {
    Select,
    Ask,
    /// `CONSTRUCT` and `DESCRIBE`: the answer is an RDF graph.
    Construct,
    Update,
}

impl QueryForm {
    /// Detects the form of `query` from its first keyword. Comments and prologue declarations
    /// are skipped. Text without any known keyword is treated as a `SELECT` query.
    pub fn of(query: &str) -> Self {
        query
            .lines()
            .map(str::trim_start)
            .filter(|line| !line.starts_with('#'))
            .flat_map(str::split_whitespace)
            .find_map(|word| {
                let end = word
                    .find(|c: char| !c.is_ascii_alphabetic())
                    .unwrap_or(word.len());
                // `insert:` is a prefix name, not a keyword
                if word[end..].starts_with(':') {
                    return None;
                }
                Self::of_keyword(&word[..end])
            })
            .unwrap_or(QueryForm::Select)
    }

    fn of_keyword(keyword: &str) -> Option<Self> {
        const UPDATE_KEYWORDS: [&str; 10] = [
            "INSERT", "DELETE", "WITH", "LOAD", "CLEAR", "CREATE", "DROP", "COPY", "MOVE", "ADD",
        ];
        let keyword = keyword.to_ascii_uppercase();
        match keyword.as_str() {
            "SELECT" => Some(QueryForm::Select),
            "ASK" => Some(QueryForm::Ask),
            "CONSTRUCT" | "DESCRIBE" => Some(QueryForm::Construct),
            k if UPDATE_KEYWORDS.contains(&k) => Some(QueryForm::Update),
            _ => None,
        }
    }

    pub fn is_update(self) -> bool {
        self == QueryForm::Update
    }
}

/// Wraps `body` into a `GRAPH` block if `graph` is set.
pub fn in_graph(body: &str, graph: Option<&str>, prefixes: &PrefixTable) -> String {
    match graph.and_then(|graph| prefixes.normalize(graph)) {
        Some(graph) => format!("GRAPH {graph} {{\n{body}}}\n"),
        None => body.to_owned(),
    }
}

/// Builds one `INSERT DATA` request per chunk of [`CHUNK_SIZE`] triples.
pub fn insert_data(
    triples: &[Triple],
    graph: Option<&str>,
    prefixes: &PrefixTable,
) -> Result<Vec<String>, DriverError> {
    triples
        .chunks(CHUNK_SIZE)
        .map(|chunk| {
            let body = triple_block(chunk, prefixes)?;
            Ok(format!(
                "INSERT DATA {{\n{}}}",
                in_graph(&body, graph, prefixes)
            ))
        })
        .collect()
}

/// Builds the requests deleting `triples`.
///
/// Concrete triples are deleted with `DELETE DATA`, one request per chunk of [`CHUNK_SIZE`].
/// Triples containing variables or blank nodes are patterns: each one gets its own
/// `DELETE WHERE` operation, so that the variables of two patterns are never joined. The
/// operations of one chunk are sent as a single request.
pub fn delete_data(
    triples: &[Triple],
    graph: Option<&str>,
    prefixes: &PrefixTable,
) -> Result<Vec<String>, DriverError> {
    let (patterns, concrete): (Vec<_>, Vec<_>) = triples
        .iter()
        .cloned()
        .partition(|triple| triple.is_pattern(prefixes));

    let mut requests = Vec::new();
    for chunk in concrete.chunks(CHUNK_SIZE) {
        let body = triple_block(chunk, prefixes)?;
        requests.push(format!(
            "DELETE DATA {{\n{}}}",
            in_graph(&body, graph, prefixes)
        ));
    }
    for chunk in patterns.chunks(CHUNK_SIZE) {
        let operations = chunk
            .iter()
            .map(|pattern| {
                let body = triple_block(std::slice::from_ref(pattern), prefixes)?;
                Ok(format!(
                    "DELETE WHERE {{\n{}}}",
                    in_graph(&body, graph, prefixes)
                ))
            })
            .collect::<Result<Vec<_>, DriverError>>()?;
        requests.push(operations.join(" ;\n"));
    }
    Ok(requests)
}

fn triple_block(triples: &[Triple], prefixes: &PrefixTable) -> Result<String, DriverError> {
    triples.iter().try_fold(String::new(), |mut out, triple| {
        let line = triple
            .to_sparql(prefixes)
            .ok_or_else(|| DriverError::IncompleteTriple(format!("{triple:?}")))?;
        out.push_str(&line);
        out.push_str(" .\n");
        Ok(out)
    })
}
