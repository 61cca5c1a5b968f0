//! Built-in core declarations
//!
//! Method signatures are written as `name(param: Type, ...) -> Return`; the
//! parameter list is optional.

use super::{ConstantDecl, MethodDecl, ReceiverDecl, StdlibDeclarations};
use crate::store::{ReceiverKind, Visibility};

const KERNEL_PRIVATE: &[&str] = &[
    "puts(objects: untyped) -> nil",
    "print(objects: untyped) -> nil",
    "p(object: untyped) -> untyped",
    "pp(object: untyped) -> untyped",
    "require(path: String) -> bool",
    "require_relative(path: String) -> bool",
    "raise(error: untyped) -> untyped",
    "loop -> untyped",
    "lambda -> Proc",
    "proc -> Proc",
    "format(format: String, args: untyped) -> String",
    "sprintf(format: String, args: untyped) -> String",
    "sleep(duration: untyped) -> Integer",
    "gets -> String?",
    "rand(max: untyped) -> untyped",
    "block_given? -> bool",
    "Integer(value: untyped) -> Integer",
    "Float(value: untyped) -> Float",
    "String(value: untyped) -> String",
    "Array(value: untyped) -> Array[untyped]",
];

const KERNEL_PUBLIC: &[&str] = &[
    "class -> class",
    "frozen? -> bool",
    "freeze -> self",
    "dup -> self",
    "clone -> self",
    "tap -> self",
    "then -> untyped",
    "to_s -> String",
    "inspect -> String",
    "nil? -> bool",
    "is_a?(klass: Module) -> bool",
    "kind_of?(klass: Module) -> bool",
    "instance_of?(klass: Module) -> bool",
    "respond_to?(name: Symbol) -> bool",
    "send(name: Symbol, args: untyped) -> untyped",
    "public_send(name: Symbol, args: untyped) -> untyped",
    "hash -> Integer",
    "object_id -> Integer",
    "instance_variable_get(name: Symbol) -> untyped",
    "instance_variable_set(name: Symbol, value: untyped) -> untyped",
    "instance_variables -> Array[Symbol]",
    "method(name: Symbol) -> untyped",
    "methods -> Array[Symbol]",
    "extend(module: Module) -> self",
    "===(other: untyped) -> bool",
    "=~(other: untyped) -> nil",
];

const BASIC_OBJECT: &[&str] = &[
    "! -> bool",
    "==(other: untyped) -> bool",
    "!=(other: untyped) -> bool",
    "equal?(other: untyped) -> bool",
    "instance_eval -> untyped",
    "instance_exec -> untyped",
    "__id__ -> Integer",
    "__send__(name: Symbol, args: untyped) -> untyped",
];

const MODULE: &[&str] = &[
    "name -> String?",
    "to_s -> String",
    "ancestors -> Array[Module]",
    "instance_methods -> Array[Symbol]",
    "method_defined?(name: Symbol) -> bool",
    "const_get(name: Symbol) -> untyped",
    "const_defined?(name: Symbol) -> bool",
    "include?(module: Module) -> bool",
    "define_method(name: Symbol) -> Symbol",
    "alias_method(new_name: Symbol, old_name: Symbol) -> Symbol",
    "private_constant(names: Symbol) -> nil",
    "===(object: untyped) -> bool",
    "<(other: Module) -> bool?",
];

const CLASS: &[&str] = &[
    "new -> instance",
    "allocate -> instance",
    "superclass -> Class?",
];

const COMPARABLE: &[&str] = &[
    "<(other: untyped) -> bool",
    "<=(other: untyped) -> bool",
    ">(other: untyped) -> bool",
    ">=(other: untyped) -> bool",
    "between?(min: untyped, max: untyped) -> bool",
    "clamp(min: untyped, max: untyped) -> self",
];

const ENUMERABLE: &[&str] = &[
    "map -> Array[untyped]",
    "collect -> Array[untyped]",
    "flat_map -> Array[untyped]",
    "select -> Array[untyped]",
    "filter -> Array[untyped]",
    "reject -> Array[untyped]",
    "filter_map -> Array[untyped]",
    "to_a -> Array[untyped]",
    "entries -> Array[untyped]",
    "sort -> Array[untyped]",
    "sort_by -> Array[untyped]",
    "first -> untyped",
    "find -> untyped",
    "detect -> untyped",
    "min -> untyped",
    "max -> untyped",
    "sum -> untyped",
    "reduce(initial: untyped) -> untyped",
    "inject(initial: untyped) -> untyped",
    "include?(item: untyped) -> bool",
    "member?(item: untyped) -> bool",
    "any? -> bool",
    "all? -> bool",
    "none? -> bool",
    "count -> Integer",
    "each_with_index -> self",
    "each_with_object(memo: untyped) -> untyped",
    "each_slice(size: Integer) -> untyped",
    "group_by -> Hash[untyped, Array[untyped]]",
    "partition -> Array[Array[untyped]]",
    "zip(others: untyped) -> Array[untyped]",
    "tally -> Hash[untyped, Integer]",
    "to_h -> Hash[untyped, untyped]",
    "uniq -> Array[untyped]",
];

const NIL_CLASS: &[&str] = &[
    "to_s -> String",
    "to_a -> Array[untyped]",
    "to_i -> Integer",
    "to_h -> Hash[untyped, untyped]",
    "nil? -> true",
    "inspect -> String",
    "&(other: untyped) -> false",
    "|(other: untyped) -> bool",
];

const TRUE_CLASS: &[&str] = &[
    "! -> false",
    "&(other: untyped) -> bool",
    "|(other: untyped) -> true",
    "to_s -> String",
];

const FALSE_CLASS: &[&str] = &[
    "! -> true",
    "&(other: untyped) -> false",
    "|(other: untyped) -> bool",
    "to_s -> String",
];

const INTEGER: &[&str] = &[
    "+(other: Integer) -> Integer",
    "-(other: Integer) -> Integer",
    "*(other: Integer) -> Integer",
    "/(other: Integer) -> Integer",
    "%(other: Integer) -> Integer",
    "**(other: Integer) -> Integer",
    "-@ -> Integer",
    "<=>(other: untyped) -> Integer?",
    "==(other: untyped) -> bool",
    "abs -> Integer",
    "succ -> Integer",
    "pred -> Integer",
    "times -> self",
    "upto(limit: Integer) -> self",
    "downto(limit: Integer) -> self",
    "to_s -> String",
    "to_i -> Integer",
    "to_f -> Float",
    "chr -> String",
    "digits -> Array[Integer]",
    "zero? -> bool",
    "positive? -> bool",
    "negative? -> bool",
    "even? -> bool",
    "odd? -> bool",
    "round -> Integer",
    "floor -> Integer",
    "ceil -> Integer",
];

const FLOAT: &[&str] = &[
    "+(other: untyped) -> Float",
    "-(other: untyped) -> Float",
    "*(other: untyped) -> Float",
    "/(other: untyped) -> Float",
    "-@ -> Float",
    "<=>(other: untyped) -> Integer?",
    "abs -> Float",
    "round -> Integer",
    "floor -> Integer",
    "ceil -> Integer",
    "to_i -> Integer",
    "to_f -> Float",
    "to_s -> String",
    "nan? -> bool",
    "zero? -> bool",
];

const STRING: &[&str] = &[
    "+(other: String) -> String",
    "*(times: Integer) -> String",
    "%(args: untyped) -> String",
    "<<(other: untyped) -> self",
    "==(other: untyped) -> bool",
    "<=>(other: untyped) -> Integer?",
    "=~(pattern: untyped) -> Integer?",
    "[](index: untyped) -> String?",
    "length -> Integer",
    "size -> Integer",
    "bytesize -> Integer",
    "upcase -> String",
    "downcase -> String",
    "capitalize -> String",
    "swapcase -> String",
    "strip -> String",
    "lstrip -> String",
    "rstrip -> String",
    "chomp -> String",
    "chop -> String",
    "reverse -> String",
    "squeeze -> String",
    "succ -> String",
    "center(width: Integer) -> String",
    "ljust(width: Integer) -> String",
    "rjust(width: Integer) -> String",
    "sub(pattern: untyped, replacement: String) -> String",
    "gsub(pattern: untyped, replacement: String) -> String",
    "tr(from: String, to: String) -> String",
    "delete(chars: String) -> String",
    "to_s -> String",
    "to_str -> String",
    "to_sym -> Symbol",
    "to_i -> Integer",
    "to_f -> Float",
    "empty? -> bool",
    "include?(other: String) -> bool",
    "start_with?(prefix: String) -> bool",
    "end_with?(suffix: String) -> bool",
    "match?(pattern: untyped) -> bool",
    "split(separator: untyped) -> Array[String]",
    "chars -> Array[String]",
    "lines -> Array[String]",
    "bytes -> Array[Integer]",
    "scan(pattern: untyped) -> Array[untyped]",
    "each_char -> self",
    "each_line -> self",
    "index(substring: String) -> Integer?",
    "count(chars: String) -> Integer",
    "encoding -> untyped",
    "unpack(format: String) -> Array[untyped]",
];

const SYMBOL: &[&str] = &[
    "to_s -> String",
    "to_sym -> self",
    "to_proc -> Proc",
    "length -> Integer",
    "size -> Integer",
    "<=>(other: untyped) -> Integer?",
    "upcase -> Symbol",
    "downcase -> Symbol",
];

const ARRAY: &[&str] = &[
    "[](index: untyped) -> untyped",
    "[]=(index: untyped, value: untyped) -> untyped",
    "+(other: Array[untyped]) -> Array[untyped]",
    "-(other: Array[untyped]) -> self",
    "&(other: Array[untyped]) -> self",
    "|(other: Array[untyped]) -> Array[untyped]",
    "*(times: Integer) -> self",
    "<<(item: untyped) -> self",
    "==(other: untyped) -> bool",
    "push(items: untyped) -> self",
    "append(items: untyped) -> self",
    "unshift(items: untyped) -> self",
    "prepend(items: untyped) -> self",
    "concat(others: untyped) -> self",
    "insert(index: Integer, items: untyped) -> self",
    "pop -> untyped",
    "shift -> untyped",
    "first -> untyped",
    "last -> untyped",
    "sample -> untyped",
    "dig(keys: untyped) -> untyped",
    "fetch(index: Integer) -> untyped",
    "delete(item: untyped) -> untyped",
    "delete_at(index: Integer) -> untyped",
    "length -> Integer",
    "size -> Integer",
    "count -> Integer",
    "index(item: untyped) -> Integer?",
    "empty? -> bool",
    "any? -> bool",
    "include?(item: untyped) -> bool",
    "each -> self",
    "each_index -> self",
    "reverse_each -> self",
    "map -> Array[untyped]",
    "map! -> self",
    "flat_map -> Array[untyped]",
    "select -> self",
    "filter -> self",
    "reject -> self",
    "compact -> self",
    "uniq -> self",
    "sort -> self",
    "sort_by -> self",
    "reverse -> self",
    "rotate -> self",
    "shuffle -> self",
    "take(count: Integer) -> self",
    "drop(count: Integer) -> self",
    "slice(index: untyped) -> untyped",
    "flatten -> Array[untyped]",
    "transpose -> Array[untyped]",
    "product(others: untyped) -> Array[untyped]",
    "combination(size: Integer) -> untyped",
    "join(separator: String) -> String",
    "pack(format: String) -> String",
    "to_a -> self",
    "to_ary -> self",
    "to_h -> Hash[untyped, untyped]",
    "clear -> self",
    "replace(other: Array[untyped]) -> self",
    "fill(value: untyped) -> self",
    "min -> untyped",
    "max -> untyped",
    "sum -> untyped",
];

const HASH: &[&str] = &[
    "[](key: untyped) -> untyped",
    "[]=(key: untyped, value: untyped) -> untyped",
    "==(other: untyped) -> bool",
    "fetch(key: untyped) -> untyped",
    "dig(keys: untyped) -> untyped",
    "store(key: untyped, value: untyped) -> untyped",
    "delete(key: untyped) -> untyped",
    "key(value: untyped) -> untyped",
    "keys -> Array[untyped]",
    "values -> Array[untyped]",
    "values_at(keys: untyped) -> Array[untyped]",
    "key?(key: untyped) -> bool",
    "has_key?(key: untyped) -> bool",
    "value?(value: untyped) -> bool",
    "include?(key: untyped) -> bool",
    "member?(key: untyped) -> bool",
    "empty? -> bool",
    "any? -> bool",
    "length -> Integer",
    "size -> Integer",
    "count -> Integer",
    "each -> self",
    "each_pair -> self",
    "each_key -> self",
    "each_value -> self",
    "merge(other: Hash[untyped, untyped]) -> Hash[untyped, untyped]",
    "merge!(other: Hash[untyped, untyped]) -> self",
    "update(other: Hash[untyped, untyped]) -> self",
    "select -> self",
    "filter -> self",
    "reject -> self",
    "compact -> self",
    "slice(keys: untyped) -> self",
    "except(keys: untyped) -> self",
    "transform_values -> Hash[untyped, untyped]",
    "transform_keys -> Hash[untyped, untyped]",
    "map -> Array[untyped]",
    "to_a -> Array[untyped]",
    "to_h -> self",
    "invert -> Hash[untyped, untyped]",
    "sort_by -> Array[untyped]",
    "group_by -> Hash[untyped, untyped]",
    "clear -> self",
];

const RANGE: &[&str] = &[
    "each -> self",
    "step(step: untyped) -> self",
    "to_a -> Array[untyped]",
    "first -> untyped",
    "last -> untyped",
    "begin -> untyped",
    "end -> untyped",
    "min -> untyped",
    "max -> untyped",
    "size -> Integer?",
    "include?(value: untyped) -> bool",
    "cover?(value: untyped) -> bool",
    "exclude_end? -> bool",
];

const PROC: &[&str] = &[
    "call(args: untyped) -> untyped",
    "yield(args: untyped) -> untyped",
    "[](args: untyped) -> untyped",
    "to_proc -> self",
    "arity -> Integer",
    "lambda? -> bool",
    "curry -> Proc",
];

const EXCEPTION: &[&str] = &[
    "message -> String",
    "full_message -> String",
    "backtrace -> Array[String]?",
    "cause -> Exception?",
];

const STRUCT: &[&str] = &[
    "to_a -> Array[untyped]",
    "to_h -> Hash[Symbol, untyped]",
    "members -> Array[Symbol]",
];

/// Classes created with `.new` that declare it themselves
const SINGLETON_NEW: &[(&str, &str)] = &[
    ("String", "new(value: String) -> String"),
    ("Array", "new(size: Integer) -> Array[untyped]"),
    ("Hash", "new(default: untyped) -> Hash[untyped, untyped]"),
    ("Struct", "new(members: Symbol) -> untyped"),
    ("Exception", "exception(message: String) -> instance"),
];

pub(super) fn declarations() -> StdlibDeclarations {
    let mut core = CoreBuilder::default();

    core.class("BasicObject", None, &[]);
    core.class("Object", Some("BasicObject"), &["Kernel"]);
    core.module("Kernel", &[]);
    core.class("Module", Some("Object"), &[]);
    core.class("Class", Some("Module"), &[]);
    core.module("Comparable", &[]);
    core.module("Enumerable", &[]);
    core.class("NilClass", Some("Object"), &[]);
    core.class("TrueClass", Some("Object"), &[]);
    core.class("FalseClass", Some("Object"), &[]);
    core.class("Numeric", Some("Object"), &["Comparable"]);
    core.class("Integer", Some("Numeric"), &[]);
    core.class("Float", Some("Numeric"), &[]);
    core.class("String", Some("Object"), &["Comparable"]);
    core.class("Symbol", Some("Object"), &["Comparable"]);
    core.class("Array", Some("Object"), &["Enumerable"]);
    core.class("Hash", Some("Object"), &["Enumerable"]);
    core.class("Range", Some("Object"), &["Enumerable"]);
    core.class("Proc", Some("Object"), &[]);
    core.class("Exception", Some("Object"), &[]);
    core.class("StandardError", Some("Exception"), &[]);
    core.class("ArgumentError", Some("StandardError"), &[]);
    core.class("RuntimeError", Some("StandardError"), &[]);
    core.class("NotImplementedError", Some("StandardError"), &[]);
    core.class("Struct", Some("Object"), &["Enumerable"]);

    core.methods("BasicObject", Visibility::Public, BASIC_OBJECT);
    core.methods("Kernel", Visibility::Private, KERNEL_PRIVATE);
    core.methods("Kernel", Visibility::Public, KERNEL_PUBLIC);
    core.methods("Module", Visibility::Public, MODULE);
    core.methods("Class", Visibility::Public, CLASS);
    core.methods("Comparable", Visibility::Public, COMPARABLE);
    core.methods("Enumerable", Visibility::Public, ENUMERABLE);
    core.methods("NilClass", Visibility::Public, NIL_CLASS);
    core.methods("TrueClass", Visibility::Public, TRUE_CLASS);
    core.methods("FalseClass", Visibility::Public, FALSE_CLASS);
    core.methods("Integer", Visibility::Public, INTEGER);
    core.methods("Float", Visibility::Public, FLOAT);
    core.methods("String", Visibility::Public, STRING);
    core.methods("Symbol", Visibility::Public, SYMBOL);
    core.methods("Array", Visibility::Public, ARRAY);
    core.methods("Hash", Visibility::Public, HASH);
    core.methods("Range", Visibility::Public, RANGE);
    core.methods("Proc", Visibility::Public, PROC);
    core.methods("Exception", Visibility::Public, EXCEPTION);
    core.methods("Struct", Visibility::Public, STRUCT);
    for (receiver, signature) in SINGLETON_NEW {
        core.singleton_method(receiver, signature);
    }

    core.constant("ARGV", "Array[String]");
    core.constant("RUBY_VERSION", "String");
    core.constant("RUBY_PLATFORM", "String");
    core.constant("ENV", "Hash[String, String]");
    core.constant("STDOUT", "untyped");
    core.constant("STDERR", "untyped");

    for interface in ["_Each", "_ToS", "_ToStr", "_ToProc"] {
        core.declarations.interfaces.push(interface.to_string());
    }

    core.declarations
}

#[derive(Default)]
struct CoreBuilder {
    declarations: StdlibDeclarations,
}

impl CoreBuilder {
    fn class(&mut self, name: &str, superclass: Option<&str>, includes: &[&str]) {
        self.receiver(name, ReceiverKind::Class, superclass, includes);
    }

    fn module(&mut self, name: &str, includes: &[&str]) {
        self.receiver(name, ReceiverKind::Module, None, includes);
    }

    fn receiver(
        &mut self,
        name: &str,
        kind: ReceiverKind,
        superclass: Option<&str>,
        includes: &[&str],
    ) {
        self.declarations.receivers.push(ReceiverDecl {
            name: name.to_string(),
            kind,
            superclass: superclass.map(str::to_string),
            includes: includes.iter().map(|s| s.to_string()).collect(),
        });
    }

    fn methods(&mut self, receiver: &str, visibility: Visibility, signatures: &[&str]) {
        for signature in signatures {
            let method = parse_signature(receiver, false, visibility, signature);
            self.declarations.methods.push(method);
        }
    }

    fn singleton_method(&mut self, receiver: &str, signature: &str) {
        let method = parse_signature(receiver, true, Visibility::Public, signature);
        self.declarations.methods.push(method);
    }

    fn constant(&mut self, name: &str, type_signature: &str) {
        self.declarations.constants.push(ConstantDecl {
            name: name.to_string(),
            type_signature: type_signature.to_string(),
        });
    }
}

/// `join(separator: String) -> String`
fn parse_signature(
    receiver: &str,
    singleton: bool,
    visibility: Visibility,
    signature: &str,
) -> MethodDecl {
    let (head, return_type) = signature
        .rsplit_once(" -> ")
        .unwrap_or((signature, "untyped"));
    let head = head.trim();

    let (name, params) = match head.find('(') {
        Some(open) if head.ends_with(')') => {
            let params = head[open + 1..head.len() - 1]
                .split(", ")
                .filter_map(|param| param.split_once(": "))
                .map(|(name, ty)| (name.trim().to_string(), ty.trim().to_string()))
                .collect();
            (&head[..open], params)
        }
        _ => (head, Vec::new()),
    };

    MethodDecl {
        receiver: receiver.to_string(),
        name: name.to_string(),
        singleton,
        visibility,
        params,
        return_type: return_type.trim().to_string(),
    }
}
