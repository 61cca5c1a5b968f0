//! Integration Tests - End-to-end analysis through the update coordinator
//!
//! This module contains integration tests that verify:
//! - Invalidation when a file is re-analyzed or removed
//! - Receivers reopened across files
//! - Accessors, visibility and mixins resolved through the symbol store
//! - Duck-typing guesses and stdlib method chains

use crate::config::ServiceConfig;
use crate::env::MethodKey;
use crate::graph::Constraints;
use crate::service::Service;
use crate::store::Visibility;
use std::path::Path;

const FILE: &str = "test.rb";

fn service() -> Service {
    Service::new(ServiceConfig {
        use_signature_cache: false,
        ..ServiceConfig::default()
    })
    .unwrap()
}

/// Helper to run a full update on in-memory Ruby source
fn analyze(source: &str) -> Service {
    let mut service = service();
    service.update_file(Path::new(FILE), Some(source)).unwrap();
    service
}

fn hover(service: &mut Service, line: usize, column: usize) -> String {
    service
        .hover(Path::new(FILE), line, column)
        .unwrap_or_else(|| panic!("nothing to hover at {}:{}", line, column))
}

fn method_return(service: &mut Service, receiver: &str, name: &str, singleton: bool) -> String {
    let key = MethodKey::new(receiver, name, singleton);
    let env = service.env_mut();
    env.begin_inference_pass();
    let ret = env.infer_method_return(&key, &Constraints::none()).show();
    env.end_inference_pass();
    ret
}

fn responds_to(service: &Service, fqname: &str) -> Vec<String> {
    service
        .env()
        .store
        .responds_of(fqname)
        .unwrap()
        .into_iter()
        .map(|respond| respond.method_name)
        .collect()
}

#[test]
fn test_class_rename_invalidates_old_constant() {
    let mut service = service();
    let path = Path::new(FILE);
    service.update_file(path, Some("class A\nend\n")).unwrap();
    assert!(service.env().consts.lookup("", "A").is_some());

    service.update_file(path, Some("class B\nend\n")).unwrap();
    assert!(service.env().consts.lookup("", "A").is_none());
    assert!(service.env().consts.lookup("", "B").is_some());
    assert!(service.env().store.find_receiver("A").unwrap().is_none());
}

#[test]
fn test_method_rename_invalidates_old_method() {
    let mut service = service();
    let path = Path::new(FILE);
    service
        .update_file(path, Some("class Foo\n  def old_name\n  end\nend\n"))
        .unwrap();
    service
        .update_file(path, Some("class Foo\n  def new_name\n  end\nend\n"))
        .unwrap();

    let methods = &service.env().methods;
    assert!(methods.get(&MethodKey::new("Foo", "old_name", false)).is_none());
    assert!(methods.get(&MethodKey::new("Foo", "new_name", false)).is_some());
    assert!(!responds_to(&service, "Foo").contains(&"old_name".to_string()));
}

#[test]
fn test_local_variable_rename() {
    let mut service = analyze("a = 1\n");
    service.update_file(Path::new(FILE), Some("b = :x\n")).unwrap();

    assert_eq!(hover(&mut service, 1, 0), ":x");
    let file = service.env().files.id_of(FILE).unwrap();
    let names: Vec<&str> = service
        .env()
        .vertices
        .ids_of_file(file)
        .iter()
        .filter_map(|&id| service.env().get_vertex(id))
        .map(|vertex| vertex.name.as_str())
        .collect();
    assert!(names.contains(&"b"));
    assert!(!names.contains(&"a"));
}

#[test]
fn test_reopened_receiver_across_files() {
    let mut service = service();
    service
        .update_file(Path::new("a.rb"), Some("class Foo\n  def m_a\n  end\nend\n"))
        .unwrap();
    service
        .update_file(Path::new("b.rb"), Some("class Foo\n  def m_b\n  end\nend\n"))
        .unwrap();

    let methods = responds_to(&service, "Foo");
    assert!(methods.contains(&"m_a".to_string()));
    assert!(methods.contains(&"m_b".to_string()));

    service.remove_file(Path::new("b.rb")).unwrap();
    assert!(service.env().consts.find("Foo").is_some());
    assert!(service.env().store.find_receiver("Foo").unwrap().is_some());

    let methods = responds_to(&service, "Foo");
    assert!(methods.contains(&"m_a".to_string()));
    assert!(!methods.contains(&"m_b".to_string()));
}

#[test]
fn test_constant_assigned_in_two_files_survives_removal_of_one() {
    let mut service = service();
    service
        .update_file(Path::new("a.rb"), Some("LIMIT = 1\n"))
        .unwrap();
    service
        .update_file(Path::new("b.rb"), Some("LIMIT = :big\n"))
        .unwrap();
    service
        .update_file(Path::new("c.rb"), Some("y = LIMIT\n"))
        .unwrap();
    assert_eq!(service.hover(Path::new("c.rb"), 1, 0).unwrap(), ":big");

    service.remove_file(Path::new("b.rb")).unwrap();
    assert_eq!(service.hover(Path::new("c.rb"), 1, 0).unwrap(), "Integer");
}

#[test]
fn test_accessor_follows_latest_writer() {
    let source = r#"
class Point
  attr_reader :x, :label

  def initialize
    @x = 1
  end
end
"#;
    let mut service = analyze(source);
    assert_eq!(method_return(&mut service, "Point", "x", false), "Integer");
    assert_eq!(method_return(&mut service, "Point", "label", false), "nil");

    let entry = service
        .env()
        .methods
        .get(&MethodKey::new("Point", "x", false))
        .unwrap();
    assert_eq!(entry.visibility, Visibility::Public);
}

#[test]
fn test_class_level_accessor_reads_class_level_ivar() {
    let source = r#"
class Settings
  class << self
    attr_reader :mode

    def configure
      @mode = :fast
    end
  end

  attr_reader :mode

  def initialize
    @mode = 1
  end
end
"#;
    let mut service = analyze(source);
    assert_eq!(method_return(&mut service, "Settings", "mode", true), ":fast");
    assert_eq!(method_return(&mut service, "Settings", "mode", false), "Integer");
}

#[test]
fn test_visibility_resolution() {
    let source = r#"
class Widget
  def a
  end

  private

  def b
  end

  public def c
  end
end
"#;
    let service = analyze(source);
    let visibility = |name: &str| {
        service
            .env()
            .methods
            .get(&MethodKey::new("Widget", name, false))
            .unwrap()
            .visibility
    };
    assert_eq!(visibility("a"), Visibility::Public);
    assert_eq!(visibility("b"), Visibility::Private);
    assert_eq!(visibility("c"), Visibility::Public);
}

#[test]
fn test_private_method_hidden_from_outside_calls() {
    let source = r#"
class Vault
  def open
    secret
  end

  private

  def secret
    42
  end
end

v = Vault.new
x = v.secret
"#;
    let mut service = analyze(source);
    assert_eq!(method_return(&mut service, "Vault", "open", false), "Integer");
    assert_eq!(hover(&mut service, 15, 0), "any");
}

#[test]
fn test_duck_typing_guess_with_unique_method() {
    let source = r#"
class Duck
  def quack_loudly
    :quack
  end
end

def call_it(d)
  d.quack_loudly
end
"#;
    let mut service = analyze(source);
    assert_eq!(hover(&mut service, 9, 4), ":quack");
    assert_eq!(method_return(&mut service, "Object", "call_it", false), ":quack");
}

#[test]
fn test_duck_typing_guess_degrades_when_ambiguous() {
    let source = r#"
class Cat
  def speak
    "meow"
  end
end

class Dog
  def speak
    :woof
  end
end

def talk(x)
  x.speak
end
"#;
    let mut service = analyze(source);
    assert_eq!(method_return(&mut service, "Object", "talk", false), "any");
}

#[test]
fn test_class_new_returns_instance() {
    let mut service = analyze("class Foo\nend\nfoo = Foo.new\n");
    assert_eq!(hover(&mut service, 3, 0), "Foo");
}

#[test]
fn test_implicit_new_in_singleton_method() {
    let source = r#"
class Config
  def self.load
    new
  end
end

c = Config.load
"#;
    let mut service = analyze(source);
    assert_eq!(hover(&mut service, 8, 0), "Config");
}

#[test]
fn test_mixin_method_resolution() {
    let source = r#"
module Greeter
  def hello
    "hi"
  end
end

class Other
  def hello
    1
  end
end

class Person
  include Greeter
end

x = Person.new.hello
"#;
    let mut service = analyze(source);
    assert_eq!(hover(&mut service, 18, 0), "\"hi\"");
    assert!(responds_to(&service, "Person").contains(&"hello".to_string()));
}

#[test]
fn test_inherited_method_resolution() {
    let source = r#"
class Base
  def id
    7
  end
end

class Child < Base
end

n = Child.new.id
"#;
    let mut service = analyze(source);
    assert_eq!(hover(&mut service, 11, 0), "Integer");
}

#[test]
fn test_stdlib_method_chain() {
    let source = "name = \"bob\".upcase\nsize = name.length\nwords = name.split(\" \")\n";
    let mut service = analyze(source);
    assert_eq!(hover(&mut service, 1, 0), "String");
    assert_eq!(hover(&mut service, 2, 0), "Integer");
    assert_eq!(hover(&mut service, 3, 0), "[String]");
}

#[test]
fn test_self_returning_stdlib_method_keeps_element_type() {
    let mut service = analyze("xs = [1, 2].compact\n");
    assert_eq!(hover(&mut service, 1, 0), "[Integer]");
}

#[test]
fn test_hover_on_method_definition() {
    let source = "class Foo\n  def bar\n    1\n  end\n\n  def self.build\n    :ok\n  end\nend\n";
    let mut service = analyze(source);
    assert_eq!(hover(&mut service, 2, 6), "Foo#bar -> Integer");
    assert_eq!(hover(&mut service, 6, 6), "Foo.build -> :ok");
}

#[test]
fn test_module_function_callable_on_module() {
    let source = r#"
module Util
  module_function

  def twice(n)
    n
  end

  def answer
    42
  end
end

x = Util.answer
"#;
    let mut service = analyze(source);
    assert_eq!(hover(&mut service, 14, 0), "Integer");
}

#[test]
fn test_loop_reassignment_reads_earlier_write() {
    let source = "x = 1\nwhile x\n  x = x\nend\ny = x\n";
    let mut service = analyze(source);
    assert_eq!(hover(&mut service, 5, 0), "Integer");
}

#[test]
fn test_repeated_calls_to_earlier_methods_infer_once() {
    // every method calls the previous one twice
    let depth = 40;
    let mut source = String::from("class Chain\n  def m_0\n    1\n  end\n");
    for i in 1..=depth {
        source.push_str(&format!("\n  def m_{}\n    [m_{}, m_{}]\n  end\n", i, i - 1, i - 1));
    }
    source.push_str("end\n");

    let mut service = analyze(&source);

    let expected = format!("{}Integer{}", "[".repeat(depth), "]".repeat(depth));
    assert_eq!(method_return(&mut service, "Chain", &format!("m_{}", depth), false), expected);
}

#[test]
fn test_mutually_recursive_methods_terminate() {
    let source = "class Ping\n  def a\n    b\n  end\n\n  def b\n    a\n  end\nend\n\nx = Ping.new.a\n";
    let mut service = analyze(source);

    assert_eq!(hover(&mut service, 2, 6), "Ping#a -> any");
    assert_eq!(hover(&mut service, 6, 6), "Ping#b -> any");
    assert_eq!(hover(&mut service, 11, 0), "any");
}
