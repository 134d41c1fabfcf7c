//! Prefix command argument parsing.

use super::CustomPrefix;

/// What a `prefix <arg>` invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixUpdate {
    /// Use exactly this string. May be empty.
    Set(String),
    /// `no_prefix`: commands work without any prefix.
    NoPrefix,
    /// `reset`: go back to the default prefix.
    Reset,
}

impl PrefixUpdate {
    /// Parse the raw argument. Keywords are case-insensitive; anything else
    /// is taken literally with no validation.
    ///
    /// The command parser trims arguments, so a prefix set through a command
    /// never has leading or trailing whitespace.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("no_prefix") {
            Self::NoPrefix
        } else if raw.eq_ignore_ascii_case("reset") {
            Self::Reset
        } else {
            Self::Set(raw.to_string())
        }
    }

    pub fn into_custom(self) -> CustomPrefix {
        match self {
            Self::Set(value) => CustomPrefix::from_stored(Some(value)),
            Self::NoPrefix => CustomPrefix::Empty,
            Self::Reset => CustomPrefix::Unset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(PrefixUpdate::parse("no_prefix"), PrefixUpdate::NoPrefix);
        assert_eq!(PrefixUpdate::parse("NO_PREFIX"), PrefixUpdate::NoPrefix);
        assert_eq!(PrefixUpdate::parse("Reset"), PrefixUpdate::Reset);
        assert_eq!(PrefixUpdate::parse("?"), PrefixUpdate::Set("?".to_string()));
    }

    #[test]
    fn test_literal_values_are_not_validated() {
        assert_eq!(
            PrefixUpdate::parse("hey bot,"),
            PrefixUpdate::Set("hey bot,".to_string())
        );
        assert_eq!(PrefixUpdate::parse("resetx").into_custom(), CustomPrefix::Value("resetx".to_string()));
    }

    #[test]
    fn test_into_custom() {
        assert_eq!(PrefixUpdate::NoPrefix.into_custom(), CustomPrefix::Empty);
        assert_eq!(PrefixUpdate::Reset.into_custom(), CustomPrefix::Unset);
        assert_eq!(PrefixUpdate::Set(String::new()).into_custom(), CustomPrefix::Empty);
    }
}
