use crate::types::Type;

/// Converter for the signature syntax used by stdlib declarations
///
/// Supports `untyped`, `top`, `void`, `bool`, `nil`, `self`, `instance`,
/// `class`, `true`, `false`, class names, `Array[T]`, `Hash[K, V]`,
/// `singleton(Foo)`, `_Interface`, `A | B` and the optional suffix `Foo?`.
pub struct TypeConverter;

impl TypeConverter {
    pub fn parse(signature: &str) -> Type {
        let parts = split_top_level(signature, '|');
        if parts.len() > 1 {
            return Type::union(parts.iter().map(|part| Self::parse_single(part)));
        }
        Self::parse_single(signature)
    }

    fn parse_single(signature: &str) -> Type {
        let signature = signature.trim();

        if let Some(inner) = signature.strip_suffix('?') {
            return Type::union([Self::parse_single(inner), Type::Nil]);
        }
        if let Some(inner) = signature
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return Self::parse(inner);
        }

        let signature = signature.trim_start_matches("::");
        match signature {
            "untyped" | "top" => return Type::Any,
            "void" => return Type::Void,
            "bool" => return Type::Bool,
            "nil" => return Type::Nil,
            "self" => return Type::SelfType,
            "instance" => return Type::InstanceType,
            "class" => return Type::ClassType,
            "true" => return Type::True,
            "false" => return Type::False,
            _ => {}
        }

        if let Some(name) = signature
            .strip_prefix("singleton(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return Type::singleton(name.trim().trim_start_matches("::"));
        }

        if let Some((name, args)) = generic_arguments(signature) {
            let args = split_top_level(args, ',');
            match (name, args.as_slice()) {
                ("Array", [element]) => return Type::array_of(Self::parse(element)),
                ("Hash", [key, value]) => {
                    return Type::Hash(vec![(Self::parse(key), Self::parse(value))])
                }
                // Other generics keep only their base class
                _ => return Type::from_receiver(name, false),
            }
        }

        if signature.starts_with('_') {
            return Type::Interface(signature.to_string());
        }

        Type::from_receiver(signature, false)
    }
}

/// `Array[Integer]` -> (`Array`, `Integer`)
fn generic_arguments(signature: &str) -> Option<(&str, &str)> {
    let open = signature.find('[')?;
    let inner = signature[open + 1..].strip_suffix(']')?;
    Some((&signature[..open], inner))
}

/// Split on `separator` outside of brackets and parentheses
fn split_top_level(signature: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in signature.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                parts.push(signature[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(signature[start..].trim());
    parts
}
