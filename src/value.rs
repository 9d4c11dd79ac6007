use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    String(String),
    Boolean(bool),
}

/// The discriminant of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Integer,
    String,
    Boolean,
}

impl Tag {
    /// The tag fixed by a variable name's suffix: `$` for strings, `%` for integers.
    pub fn for_variable(name: &str) -> Option<Tag> {
        match name.chars().last() {
            Some('$') => Some(Tag::String),
            Some('%') => Some(Tag::Integer),
            _ => None,
        }
    }

    /// "an integer", "a string", "a boolean".
    pub fn with_article(self) -> &'static str {
        match self {
            Tag::Integer => "an integer",
            Tag::String => "a string",
            Tag::Boolean => "a boolean",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            Tag::Integer => "integers",
            Tag::String => "strings",
            Tag::Boolean => "booleans",
        }
    }
}

impl Value {
    pub fn tag(&self) -> Tag {
        match self {
            Value::Integer(_) => Tag::Integer,
            Value::String(_) => Tag::String,
            Value::Boolean(_) => Tag::Boolean,
        }
    }
}

/// The form PRINT writes: strings unquoted, booleans as `TRUE`/`FALSE`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(true) => write!(f, "TRUE"),
            Value::Boolean(false) => write!(f, "FALSE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_suffix_fixes_tag() {
        assert_eq!(Tag::for_variable("ABC$"), Some(Tag::String));
        assert_eq!(Tag::for_variable("ABC%"), Some(Tag::Integer));
        assert_eq!(Tag::for_variable("ABC"), None);
        assert_eq!(Tag::for_variable(""), None);
    }

    #[test]
    fn test_print_form() {
        assert_eq!(Value::Integer(-12).to_string(), "-12");
        assert_eq!(Value::String("def".to_string()).to_string(), "def");
        assert_eq!(Value::Boolean(true).to_string(), "TRUE");
        assert_eq!(Value::Boolean(false).to_string(), "FALSE");
    }
}
