//! Type references as they appear in assembled schema metadata.

use std::fmt;

use arcstr::ArcStr;
use serde::Serialize;

/// Nullability of a [`TypeRef`], one flag per axis.
///
/// `outer` covers the value itself (the outermost list for list types),
/// `items` covers the elements of the innermost list. Everything defaults to
/// non-nullable; wrapper levels between the two axes of a nested list are
/// always non-nullable.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize)]
pub struct Nullability {
    /// The value itself may be absent.
    pub outer: bool,
    /// Elements of the innermost list may be absent.
    pub items: bool,
}

impl Nullability {
    /// Non-nullable on both axes.
    pub const NON_NULL: Nullability = Nullability {
        outer: false,
        items: false,
    };

    /// Nullable on both axes.
    pub const FULL: Nullability = Nullability {
        outer: true,
        items: true,
    };
}

/// A reference to a named type, together with its list depth and nullability.
///
/// This carries no semantic information and might refer to types that do not
/// exist; references are resolved against the registry at finalization.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct TypeRef {
    /// Name of the referenced base type.
    pub name: ArcStr,
    /// Number of nested list wrappers around the base type.
    pub list_depth: usize,
    /// Nullability flags, see [`Nullability`].
    pub nullable: Nullability,
}

impl TypeRef {
    /// A non-nullable reference to the named type.
    pub fn named(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            list_depth: 0,
            nullable: Nullability::NON_NULL,
        }
    }

    /// Wraps this reference into one more level of list.
    #[must_use]
    pub fn list(mut self) -> Self {
        self.list_depth += 1;
        self
    }

    /// Marks the value itself as nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable.outer = true;
        self
    }

    /// Marks the innermost list items as nullable.
    #[must_use]
    pub fn items_nullable(mut self) -> Self {
        self.nullable.items = true;
        self
    }

    /// Whether this reference is a list of any depth.
    pub fn is_list(&self) -> bool {
        self.list_depth > 0
    }

    /// Whether a value for this reference may be null/absent.
    pub fn is_outer_nullable(&self) -> bool {
        self.nullable.outer
    }
}

impl fmt::Display for TypeRef {
    /// Renders the exact schema-language form, e.g. `[Int!]!`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base_bang = if self.list_depth == 0 {
            !self.nullable.outer
        } else {
            !self.nullable.items
        };
        for _ in 0..self.list_depth {
            write!(f, "[")?;
        }
        write!(f, "{}", self.name)?;
        if base_bang {
            write!(f, "!")?;
        }
        for level in 0..self.list_depth {
            let outermost = level + 1 == self.list_depth;
            write!(f, "]")?;
            if !outermost || !self.nullable.outer {
                write!(f, "!")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::TypeRef;

    #[test]
    fn renders_plain_and_non_null_names() {
        assert_eq!(TypeRef::named("Int").to_string(), "Int!");
        assert_eq!(TypeRef::named("String").nullable().to_string(), "String");
    }

    #[test]
    fn renders_lists_on_both_axes() {
        assert_eq!(TypeRef::named("Post").list().to_string(), "[Post!]!");
        assert_eq!(
            TypeRef::named("Post").list().nullable().to_string(),
            "[Post!]"
        );
        assert_eq!(
            TypeRef::named("Post").list().items_nullable().to_string(),
            "[Post]!"
        );
        assert_eq!(
            TypeRef::named("Post")
                .list()
                .nullable()
                .items_nullable()
                .to_string(),
            "[Post]"
        );
    }

    #[test]
    fn nested_list_wrappers_stay_non_null() {
        assert_eq!(
            TypeRef::named("Int")
                .list()
                .list()
                .nullable()
                .items_nullable()
                .to_string(),
            "[[Int]!]"
        );
    }
}
