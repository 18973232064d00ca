//! Static type model used by inference and code generation.

use std::fmt;

/// Inferred or declared type of a value.
///
/// `Unknown` is the bottom of the inference lattice; `Object` is the
/// top, chosen when branches disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Unknown,
    Int,
    Float,
    Bool,
    Str,
    None,
    List,
    Tuple,
    Set,
    Dict,
    Function,
    Class(String),
    Instance(String),
    Object,
}

impl Type {
    pub fn is_known(&self) -> bool {
        !matches!(self, Type::Unknown)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float | Type::Bool)
    }

    /// Join two types: equal types stand, numeric types widen toward
    /// `Float`, anything else falls back to `Object`.
    pub fn unify(&self, other: &Type) -> Type {
        if self == other {
            return self.clone();
        }
        match (self, other) {
            (Type::Unknown, t) | (t, Type::Unknown) => t.clone(),
            (Type::Int, Type::Float) | (Type::Float, Type::Int) => Type::Float,
            (Type::Bool, Type::Int) | (Type::Int, Type::Bool) => Type::Int,
            (Type::Bool, Type::Float) | (Type::Float, Type::Bool) => Type::Float,
            _ => Type::Object,
        }
    }

    /// Map an annotation name (`int`, `str`, ...) onto a type.
    pub fn from_annotation(name: &str) -> Type {
        match name {
            "int" => Type::Int,
            "float" => Type::Float,
            "bool" => Type::Bool,
            "str" => Type::Str,
            "list" => Type::List,
            "tuple" => Type::Tuple,
            "set" => Type::Set,
            "dict" => Type::Dict,
            "object" => Type::Object,
            other => Type::Instance(other.to_string()),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unknown => write!(f, "<unknown>"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::Str => write!(f, "str"),
            Type::None => write!(f, "None"),
            Type::List => write!(f, "list"),
            Type::Tuple => write!(f, "tuple"),
            Type::Set => write!(f, "set"),
            Type::Dict => write!(f, "dict"),
            Type::Function => write!(f, "function"),
            Type::Class(name) => write!(f, "type[{name}]"),
            Type::Instance(name) => write!(f, "{name}"),
            Type::Object => write!(f, "object"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unify_widens_numerics() {
        assert_eq!(Type::Int.unify(&Type::Float), Type::Float);
        assert_eq!(Type::Bool.unify(&Type::Int), Type::Int);
        assert_eq!(Type::Int.unify(&Type::Int), Type::Int);
    }

    #[test]
    fn unify_falls_back_to_object() {
        assert_eq!(Type::Int.unify(&Type::Str), Type::Object);
    }

    #[test]
    fn unknown_is_identity() {
        assert_eq!(Type::Unknown.unify(&Type::Str), Type::Str);
        assert_eq!(Type::List.unify(&Type::Unknown), Type::List);
    }
}
