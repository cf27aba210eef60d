//! Struct and class integration tests
//!
//! Instantiation, field access and mutation, copy semantics, inheritance,
//! and method dispatch.

mod common;

use common::*;
use pretty_assertions::assert_eq;

// ============================================================================
// Structs
// ============================================================================

#[test]
fn test_struct_default_fields() {
    let source = "
        struct Point {
            int x;
            int y;
        }
        Point p;
        p.x;
    ";
    assert_eval_int(source, 0);
}

#[test]
fn test_struct_field_initializers() {
    let source = "
        struct Config {
            int retries = 3;
            string host = \"localhost\";
        }
        Config c;
        c.retries;
    ";
    assert_eval_int(source, 3);
}

#[test]
fn test_struct_field_mutation() {
    let source = "
        struct Point {
            int x;
            int y;
        }
        Point p;
        p.x = 5;
        p.x;
    ";
    assert_eval_int(source, 5);
}

#[test]
fn test_struct_field_keeps_declared_type() {
    let source = "
        struct Point { int x; }
        Point p;
        p.x = \"nope\";
    ";
    assert_runtime_error(source, "EU0004");
}

#[test]
fn test_unknown_field() {
    let source = "
        struct Point { int x; }
        Point p;
        p.z;
    ";
    assert_runtime_error(source, "EU0002");
}

#[test]
fn test_struct_copy_is_deep() {
    // The copy is taken before the mutation and stays independent
    let source = "
        struct Point {
            int x;
            int y;
        }
        Point p;
        Point q = p;
        p.x = 5;
        q.x;
    ";
    assert_eval_int(source, 0);
}

#[test]
fn test_double_instantiation() {
    let source = "
        struct Point { int x; }
        Point p;
        Point p;
    ";
    assert_runtime_error(source, "EU0009");
}

#[test]
fn test_duplicate_type_definition() {
    let source = "
        struct Point { int x; }
        struct Point { int y; }
    ";
    assert_runtime_error(source, "EU0009");
}

#[test]
fn test_unknown_type_instantiation() {
    assert_runtime_error("Ghost g;", "EU0011");
}

#[test]
fn test_nested_struct_fields() {
    let source = "
        struct Inner { int value = 7; }
        struct Outer { Inner inner; }
        Outer o;
        Inner i = o.inner;
        i.value;
    ";
    assert_eval_int(source, 7);
}

#[test]
fn test_self_referential_field_type() {
    // Default-initializing the field would nest instances forever
    assert_runtime_error("struct A { A inner; } A a;", "EU0004");
}

#[test]
fn test_mutually_recursive_field_types() {
    let source = "
        struct A { B partner; }
        struct B { A partner; }
        A a;
    ";
    assert_runtime_error(source, "EU0004");
}

#[test]
fn test_repeated_field_type_is_not_a_cycle() {
    let source = "
        struct Point { int x = 1; }
        struct Pair {
            Point first;
            Point second;
        }
        Pair p;
        Point a = p.first;
        Point b = p.second;
        a.x + b.x;
    ";
    assert_eval_int(source, 2);
}

// ============================================================================
// Inheritance
// ============================================================================

#[test]
fn test_inherited_fields() {
    let source = "
        struct Base {
            int a = 1;
        }
        struct Derived : Base {
            int b = 2;
        }
        Derived d;
        d.a + d.b;
    ";
    assert_eval_int(source, 3);
}

#[test]
fn test_duplicate_field_across_hierarchy() {
    let source = "
        struct Base { int a; }
        struct Derived : Base { int a; }
        Derived d;
    ";
    assert_runtime_error(source, "EU0003");
}

#[test]
fn test_unknown_parent_type() {
    let source = "
        struct Derived : Ghost { int a; }
        Derived d;
    ";
    assert_runtime_error(source, "EU0011");
}

#[test]
fn test_inheritance_cycle() {
    let source = "
        struct A : B { int x; }
        struct B : A { int y; }
        A a;
    ";
    assert_runtime_error(source, "EU0004");
}

// ============================================================================
// Classes and methods
// ============================================================================

#[test]
fn test_method_reads_fields() {
    let source = "
        class Rect {
            int w = 3;
            int h = 4;
            func area() {
                return w * h;
            }
        }
        Rect r;
        r.area();
    ";
    assert_eval_int(source, 12);
}

#[test]
fn test_method_mutates_fields() {
    let source = "
        class Counter {
            int count = 0;
            func bump() {
                count = count + 1;
            }
        }
        Counter c;
        c.bump();
        c.bump();
        c.count;
    ";
    assert_eval_int(source, 2);
}

#[test]
fn test_method_sees_caller_scope() {
    let source = "
        int scale = 10;
        class Box {
            int size = 2;
            func scaled() {
                return size * scale;
            }
        }
        Box b;
        b.scaled();
    ";
    assert_eval_int(source, 20);
}

#[test]
fn test_method_arguments() {
    let source = "
        class Adder {
            int base = 100;
            func add(int n) {
                return base + n;
            }
        }
        Adder a;
        a.add(5);
    ";
    assert_eval_int(source, 105);
}

#[test]
fn test_method_arity_checked() {
    let source = "
        class Adder {
            func add(int n) { return n; }
        }
        Adder a;
        a.add(1, 2);
    ";
    assert_runtime_error(source, "EU0005");
}

#[test]
fn test_method_override() {
    let source = "
        class Animal {
            func sound() {
                return \"...\";
            }
        }
        class Dog : Animal {
            func sound() {
                return \"woof\";
            }
        }
        Dog d;
        d.sound();
    ";
    assert_eval_string(source, "woof");
}

#[test]
fn test_inherited_method() {
    let source = "
        class Base {
            int value = 5;
            func get() {
                return value;
            }
        }
        class Derived : Base {
            int extra = 1;
        }
        Derived d;
        d.get();
    ";
    assert_eval_int(source, 5);
}

#[test]
fn test_calling_a_field_is_an_error() {
    let source = "
        class C { int x; }
        C c;
        c.x();
    ";
    assert_runtime_error(source, "EU0004");
}

#[test]
fn test_instance_scope_detached_after_method_error() {
    // The failed call must not leave the instance parented to the caller:
    // afterwards the instance's fields still resolve but the caller's
    // variables stay invisible through member access
    let source = "
        class Fragile {
            int x = 1;
            func boom() {
                return missing;
            }
        }
        Fragile f;
        f.boom();
    ";
    assert_runtime_error(source, "EU0002");
}

#[test]
fn test_struct_method_free_class_mix() {
    let source = "
        struct Vec2 {
            float x = 1.5;
            float y = 2.5;
        }
        class Path {
            int steps = 0;
            func advance() {
                steps = steps + 1;
                return steps;
            }
        }
        Vec2 v;
        Path p;
        p.advance();
        p.advance();
        v.x + p.steps;
    ";
    assert_eval_float(source, 3.5);
}
