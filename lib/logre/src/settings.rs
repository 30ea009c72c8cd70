use std::env;

/// Environment variable enabling verbose query logging (`true` or `1`).
pub const VERBOSE_VARIABLE: &str = "LOGRE_VERBOSE";
/// Environment variable selecting the [`Mode`] (`local` or `hosted`).
pub const MODE_VARIABLE: &str = "LOGRE_MODE";

/// Where Logre runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// On the machine of the operator. The configuration is written back to disk.
    #[default]
    Local,
    /// As a shared service. The configuration file is never written.
    Hosted,
}

/// Process-wide settings read from the environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    /// Logs every query sent to an endpoint.
    pub verbose: bool,
    pub mode: Mode,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the settings through `lookup`, which returns the value of an environment variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let verbose = lookup(VERBOSE_VARIABLE)
            .is_some_and(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1"));
        let mode = match lookup(MODE_VARIABLE) {
            Some(value) if value.trim().eq_ignore_ascii_case("hosted") => Mode::Hosted,
            _ => Mode::Local,
        };
        Self { verbose, mode }
    }

    pub fn is_hosted(&self) -> bool {
        self.mode == Mode::Hosted
    }
}
