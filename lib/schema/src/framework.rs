use crate::ModelError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// How the schema of a data bundle is obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ModelFramework {
    /// Extracted from the `sh:NodeShape`s of the model graph.
    #[default]
    Shacl,
    /// Inferred from the types and the predicates used in the data graph.
    NoFramework,
}

impl ModelFramework {
    /// The name used in configuration documents.
    pub fn name(self) -> &'static str {
        match self {
            ModelFramework::Shacl => "SHACL",
            ModelFramework::NoFramework => "No Framework",
        }
    }
}

impl Display for ModelFramework {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelFramework {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-', ' '], "");
        match normalized.as_str() {
            "shacl" => Ok(ModelFramework::Shacl),
            "noframework" | "none" => Ok(ModelFramework::NoFramework),
            _ => Err(ModelError::ModelFrameworkNotSupported(s.to_owned())),
        }
    }
}
