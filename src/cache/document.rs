//! Selection model for operations and fragments.
//!
//! Documents are built in code rather than parsed, with argument values
//! already bound, so every field carries the exact arguments its invocation
//! is keyed by.

use std::fmt;

use serde_json::Value;

use super::keys::{Arguments, FieldKey, OperationKey, hash_value};

/// Field every keyed selection should include.
pub const TYPENAME_FIELD: &str = "__typename";

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub arguments: Arguments,
    pub selection: Option<SelectionSet>,
}

impl Field {
    /// A leaf field.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Arguments::new(),
            selection: None,
        }
    }

    /// A field with a sub-selection.
    pub fn object(name: impl Into<String>, fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            name: name.into(),
            arguments: Arguments::new(),
            selection: Some(SelectionSet::new(fields)),
        }
    }

    /// Bind an argument value.
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    pub fn key(&self) -> FieldKey {
        FieldKey::new(&self.name, &self.arguments)
    }

    pub fn is_typename(&self) -> bool {
        self.name == TYPENAME_FIELD
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    pub fields: Vec<Field>,
}

impl SelectionSet {
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub name: String,
    pub selection: SelectionSet,
}

impl Operation {
    pub fn query(name: impl Into<String>, fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            kind: OperationKind::Query,
            name: name.into(),
            selection: SelectionSet::new(fields),
        }
    }

    pub fn mutation(name: impl Into<String>, fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            kind: OperationKind::Mutation,
            name: name.into(),
            selection: SelectionSet::new(fields),
        }
    }

    /// Stable key of the operation text, including bound arguments.
    pub fn key(&self) -> OperationKey {
        hash_value(&self.to_string())
    }
}

/// A selection applied directly to one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub name: String,
    pub typename: String,
    pub selection: SelectionSet,
}

impl Fragment {
    pub fn new(
        name: impl Into<String>,
        typename: impl Into<String>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Self {
        Self {
            name: name.into(),
            typename: typename.into(),
            selection: SelectionSet::new(fields),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.arguments.is_empty() {
            f.write_str("(")?;
            for (index, (name, value)) in self.arguments.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{name}: {value}")?;
            }
            f.write_str(")")?;
        }
        if let Some(selection) = &self.selection {
            write!(f, " {selection}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SelectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for field in &self.fields {
            write!(f, " {field}")?;
        }
        f.write_str(" }")
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.kind.as_str(), self.name, self.selection)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fragment {} on {} {}",
            self.name, self.typename, self.selection
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posts(limit: i64, cursor: Option<&str>) -> Operation {
        Operation::query(
            "Posts",
            [Field::object(
                "posts",
                [Field::scalar("hasMore"), Field::scalar(TYPENAME_FIELD)],
            )
            .arg("limit", limit)
            .arg("cursor", cursor)],
        )
    }

    #[test]
    fn operation_text_includes_bound_arguments() {
        assert_eq!(
            posts(10, None).to_string(),
            "query Posts { posts(cursor: null, limit: 10) { hasMore __typename } }"
        );
    }

    #[test]
    fn operation_key_changes_with_arguments() {
        assert_eq!(posts(10, None).key(), posts(10, None).key());
        assert_ne!(posts(10, None).key(), posts(10, Some("42")).key());
    }

    #[test]
    fn fragment_text() {
        let fragment = Fragment::new("PostVote", "Post", [Field::scalar("points")]);
        assert_eq!(fragment.to_string(), "fragment PostVote on Post { points }");
    }
}
