use std::{fmt::Display, ops::Deref, path::PathBuf};

/// A resolved setting together with where it came from.
///
/// Connection settings can arrive from three places plus a built-in
/// default; error messages and debug logs report the winning source.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ParsedProperty<T> {
    /// Supplied on the command line.
    Cli(T),
    /// Read from an environment variable.
    Env(T),
    /// Read from the credentials file at the given path.
    File(T, PathBuf),
    /// Built-in default.
    Default(T),
}

impl<T> ParsedProperty<T> {
    pub fn value(&self) -> &T {
        match self {
            Self::Cli(value) | Self::Env(value) | Self::Default(value) => value,
            Self::File(value, _) => value,
        }
    }

    /// Short source label for logs and error messages.
    pub fn source_name(&self) -> &'static str {
        match self {
            Self::Cli(_) => "cli",
            Self::Env(_) => "env",
            Self::File(_, _) => "file",
            Self::Default(_) => "default",
        }
    }
}

impl<T> Deref for ParsedProperty<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.value()
    }
}

impl<T: Display> Display for ParsedProperty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// # Value Access Across Sources
    ///
    /// Tests that the wrapped value is reachable regardless of source.
    ///
    /// ## Test Scenario
    /// - Wraps the same value in every source variant
    /// - Reads it back through value() and Deref
    ///
    /// ## Expected Outcome
    /// - All variants yield the wrapped value
    #[test]
    fn test_value_access() {
        let props = [
            ParsedProperty::Cli("my-project".to_string()),
            ParsedProperty::Env("my-project".to_string()),
            ParsedProperty::File(
                "my-project".to_string(),
                PathBuf::from("credentials.json"),
            ),
            ParsedProperty::Default("my-project".to_string()),
        ];

        for prop in &props {
            assert_eq!(prop.value(), "my-project");
            assert_eq!(prop.len(), 10);
        }
    }

    /// # Source Labels
    ///
    /// Tests the source label used in logs and error messages.
    ///
    /// ## Test Scenario
    /// - Checks source_name() for every variant
    ///
    /// ## Expected Outcome
    /// - Each variant reports its own label
    #[test]
    fn test_source_labels() {
        assert_eq!(ParsedProperty::Cli(1).source_name(), "cli");
        assert_eq!(ParsedProperty::Env(1).source_name(), "env");
        assert_eq!(
            ParsedProperty::File(1, PathBuf::from("x")).source_name(),
            "file"
        );
        assert_eq!(ParsedProperty::Default(1).source_name(), "default");
    }

    /// # Display Passthrough
    ///
    /// Tests that Display renders the wrapped value only.
    ///
    /// ## Test Scenario
    /// - Formats a wrapped version string
    ///
    /// ## Expected Outcome
    /// - Output matches the inner value, no source decoration
    #[test]
    fn test_display_passthrough() {
        let prop = ParsedProperty::Env("7.1".to_string());
        assert_eq!(prop.to_string(), "7.1");
    }
}
