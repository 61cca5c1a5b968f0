//! Type lattice for flow-insensitive inference
//!
//! Types are immutable values compared structurally. `Type::union` is the only
//! way unions should be built outside of tests: it keeps them flat and
//! de-duplicated.

/// Type system for graph-based type inference
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// Unknown type: the engine falls back to it instead of rejecting code
    Any,
    Void,
    /// `self` in a declared signature
    SelfType,
    /// `class` in a declared signature
    ClassType,
    /// `instance` in a declared signature
    InstanceType,
    Nil,
    True,
    False,
    Bool,
    Integer,
    /// String, optionally carrying the literal it was built from
    String(Option<String>),
    /// Symbol literal `:name`
    Symbol(String),
    /// Array with the union of its element types
    Array(Box<Type>),
    /// Hash as key/value type pairs
    Hash(Vec<(Type, Type)>),
    /// Class or module reference; `singleton` marks the class object itself
    Const { name: String, singleton: bool },
    /// Something that responds to the given method name
    Duck(String),
    /// Declared interface such as `_Each`
    Interface(String),
    /// Union type: always flat, unique, and at least two elements wide
    Union(Vec<Type>),
}

impl Type {
    /// Build a normalized union
    ///
    /// Nested unions are flattened, duplicates are removed keeping the first
    /// occurrence, a single survivor collapses to itself and exactly
    /// `{true, false}` collapses to `bool`.
    pub fn union<I>(types: I) -> Type
    where
        I: IntoIterator<Item = Type>,
    {
        let mut flat: Vec<Type> = Vec::new();
        for ty in types {
            match ty {
                Type::Union(inner) => {
                    for t in inner {
                        if !flat.contains(&t) {
                            flat.push(t);
                        }
                    }
                }
                other => {
                    if !flat.contains(&other) {
                        flat.push(other);
                    }
                }
            }
        }

        if flat.len() == 2 && flat.contains(&Type::True) && flat.contains(&Type::False) {
            return Type::Bool;
        }

        if flat.len() == 1 {
            return flat.remove(0);
        }

        Type::Union(flat)
    }

    /// Convert type to its surface representation
    pub fn show(&self) -> String {
        match self {
            Type::Any => "any".to_string(),
            Type::Void => "void".to_string(),
            Type::SelfType => "self".to_string(),
            Type::ClassType => "class".to_string(),
            Type::InstanceType => "instance".to_string(),
            Type::Nil => "nil".to_string(),
            Type::True => "true".to_string(),
            Type::False => "false".to_string(),
            Type::Bool => "bool".to_string(),
            Type::Integer => "Integer".to_string(),
            Type::String(Some(literal)) => format!("\"{}\"", literal),
            Type::String(None) => "String".to_string(),
            Type::Symbol(name) => format!(":{}", name),
            Type::Array(elem) => format!("[{}]", elem.show()),
            Type::Hash(pairs) => Self::show_hash(pairs),
            Type::Const { name, singleton } => {
                if *singleton {
                    format!("singleton({})", name)
                } else {
                    name.clone()
                }
            }
            Type::Duck(method_name) => format!("duck({})", method_name),
            Type::Interface(name) => name.clone(),
            Type::Union(types) => {
                let names: Vec<_> = types.iter().map(|t| t.show()).collect();
                names.join(" | ")
            }
        }
    }

    fn show_hash(pairs: &[(Type, Type)]) -> String {
        if pairs.is_empty() {
            return "{}".to_string();
        }

        if Self::is_fixed_hash(pairs) {
            let entries: Vec<_> = pairs
                .iter()
                .map(|(key, value)| match key {
                    Type::Symbol(name) => format!("{}: {}", name, value.show()),
                    _ => format!("{} => {}", key.show(), value.show()),
                })
                .collect();
            return format!("{{ {} }}", entries.join(", "));
        }

        let keys = Type::union(pairs.iter().map(|(k, _)| k.clone()));
        let values = Type::union(pairs.iter().map(|(_, v)| v.clone()));
        format!("{{ {} => {} }}", keys.show(), values.show())
    }

    /// A hash is fixed when every key is a string or symbol literal
    pub fn is_fixed_hash(pairs: &[(Type, Type)]) -> bool {
        pairs
            .iter()
            .all(|(key, _)| matches!(key, Type::Symbol(_) | Type::String(Some(_))))
    }

    /// Name of the class whose methods answer calls on a value of this type
    ///
    /// Returns `None` for types that cannot be resolved to a single receiver.
    pub fn receiver_name(&self) -> Option<(&str, bool)> {
        match self {
            Type::Nil => Some(("NilClass", false)),
            Type::True => Some(("TrueClass", false)),
            Type::False => Some(("FalseClass", false)),
            Type::Integer => Some(("Integer", false)),
            Type::String(_) => Some(("String", false)),
            Type::Symbol(_) => Some(("Symbol", false)),
            Type::Array(_) => Some(("Array", false)),
            Type::Hash(_) => Some(("Hash", false)),
            Type::Const { name, singleton } => Some((name.as_str(), *singleton)),
            _ => None,
        }
    }

    /// Value type of a receiver, the inverse of `receiver_name`
    ///
    /// Core classes with a dedicated variant map to it; everything else is a
    /// constant reference.
    pub fn from_receiver(name: &str, singleton: bool) -> Type {
        if singleton {
            return Type::singleton(name);
        }
        match name {
            "NilClass" => Type::Nil,
            "TrueClass" => Type::True,
            "FalseClass" => Type::False,
            "Integer" => Type::Integer,
            "String" => Type::string(),
            "Array" => Type::array_of(Type::Any),
            "Hash" => Type::Hash(vec![(Type::Any, Type::Any)]),
            _ => Type::instance(name),
        }
    }

    /// Calls on these receivers degrade to `any`
    pub fn is_unresolvable_receiver(&self) -> bool {
        matches!(self, Type::Any | Type::Union(_) | Type::Duck(_))
    }

    /// Convenience constructors
    pub fn string() -> Self {
        Type::String(None)
    }

    pub fn string_literal(value: &str) -> Self {
        Type::String(Some(value.to_string()))
    }

    pub fn symbol(name: &str) -> Self {
        Type::Symbol(name.to_string())
    }

    pub fn array_of(element_type: Type) -> Self {
        Type::Array(Box::new(element_type))
    }

    pub fn instance(name: &str) -> Self {
        Type::Const {
            name: name.to_string(),
            singleton: false,
        }
    }

    pub fn singleton(name: &str) -> Self {
        Type::Const {
            name: name.to_string(),
            singleton: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_show() {
        assert_eq!(Type::string().show(), "String");
        assert_eq!(Type::string_literal("hi").show(), "\"hi\"");
        assert_eq!(Type::Integer.show(), "Integer");
        assert_eq!(Type::Nil.show(), "nil");
        assert_eq!(Type::Any.show(), "any");
        assert_eq!(Type::symbol("foo").show(), ":foo");
        assert_eq!(Type::singleton("Foo").show(), "singleton(Foo)");
        assert_eq!(Type::instance("Foo").show(), "Foo");
    }

    #[test]
    fn test_union_of_true_and_false_is_bool() {
        assert_eq!(Type::union([Type::True, Type::False]), Type::Bool);
        assert_eq!(Type::union([Type::True, Type::False]).show(), "bool");
    }

    #[test]
    fn test_union_of_same_types_collapses() {
        let ty = Type::union([Type::True, Type::True]);
        assert_eq!(ty, Type::True);
        assert_eq!(ty.show(), "true");
    }

    #[test]
    fn test_union_flattens_nested_unions() {
        let inner = Type::Union(vec![Type::True, Type::False]);
        let ty = Type::union([inner, Type::Nil]);
        assert_eq!(ty.show(), "true | false | nil");
    }

    #[test]
    fn test_union_removes_duplicates_across_nested_unions() {
        let a = Type::union([Type::Integer, Type::string()]);
        let b = Type::union([Type::string(), Type::Nil]);
        let ty = Type::union([a, b]);
        assert_eq!(ty, Type::Union(vec![Type::Integer, Type::string(), Type::Nil]));
    }

    #[test]
    fn test_array_show() {
        assert_eq!(Type::array_of(Type::Integer).show(), "[Integer]");
        let mixed = Type::array_of(Type::union([Type::Integer, Type::string()]));
        assert_eq!(mixed.show(), "[Integer | String]");
    }

    #[test]
    fn test_fixed_hash_show() {
        let hash = Type::Hash(vec![
            (Type::symbol("a"), Type::Integer),
            (Type::string_literal("b"), Type::string()),
        ]);
        assert_eq!(hash.show(), "{ a: Integer, \"b\" => String }");
    }

    #[test]
    fn test_unfixed_hash_show() {
        let hash = Type::Hash(vec![
            (Type::Integer, Type::string()),
            (Type::Integer, Type::Nil),
        ]);
        assert_eq!(hash.show(), "{ Integer => String | nil }");
        assert_eq!(Type::Hash(vec![]).show(), "{}");
    }

    #[test]
    fn test_receiver_name() {
        assert_eq!(Type::Integer.receiver_name(), Some(("Integer", false)));
        assert_eq!(Type::singleton("Foo").receiver_name(), Some(("Foo", true)));
        assert_eq!(Type::Any.receiver_name(), None);
        assert_eq!(Type::Bool.receiver_name(), None);
    }

    #[test]
    fn test_from_receiver() {
        assert_eq!(Type::from_receiver("Integer", false), Type::Integer);
        assert_eq!(Type::from_receiver("NilClass", false), Type::Nil);
        assert_eq!(Type::from_receiver("Foo", false), Type::instance("Foo"));
        assert_eq!(Type::from_receiver("Integer", true), Type::singleton("Integer"));
        assert_eq!(Type::from_receiver("Array", false).show(), "[any]");
    }

    #[test]
    fn test_unresolvable_receivers() {
        assert!(Type::Any.is_unresolvable_receiver());
        assert!(Type::Duck("foo".to_string()).is_unresolvable_receiver());
        assert!(Type::union([Type::Integer, Type::Nil]).is_unresolvable_receiver());
        assert!(!Type::Integer.is_unresolvable_receiver());
    }
}
