use cwat_interner::Interner;
use insta::assert_snapshot;

use crate::emit_program;

fn emit(source: &str) -> String {
    let mut interner = Interner::new();
    let (program, symbols) =
        cwat_frontend::parse(source, &mut interner).expect("program should compile");

    emit_program(&program, &symbols, &interner)
}

#[test]
fn exported_function() {
    let wat = emit("int add(int a, int b) { return a + b; }");
    assert_snapshot!(wat.trim_end(), @r###"
    (module
        (func $add (export "add")
            (param $V0 i32)
            (param $V1 i32)
            (result i32)
            local.get $V0
            local.get $V1
            i32.add
            return
        )
    )
    "###);
}

#[test]
fn while_loop() {
    let wat = emit("void main() { int i; i = 0; while (i < 5) { i = i + 1; } }");
    assert_snapshot!(wat.trim_end(), @r###"
    (module
        (func $main (export "main")
            (local $V0 i32)
            i32.const 0
            local.set $V0
            (block $WO1
                (loop $WI1
                    local.get $V0
                    i32.const 5
                    i32.lt_s
                    i32.eqz
                    br_if $WO1
                    local.get $V0
                    i32.const 1
                    i32.add
                    local.set $V0
                    br $WI1
                )
            )
        )
    )
    "###);
}

#[test]
fn int_initializer_converted_to_float() {
    let wat = emit("void f() { float x = 1; }");
    assert_snapshot!(wat.trim_end(), @r###"
    (module
        (func $f (export "f")
            (local $V0 f32)
            i32.const 1
            f32.convert_i32_s
            local.set $V0
        )
    )
    "###);
}

#[test]
fn globals_imports_and_loads() {
    let wat = emit(
        "extern void print_int(int n);
        int count = 3;
        float scale;
        int sum(int* p, int n) {
            int total = 0;
            while (n > 0 && *p != 0) {
                total = total + *p;
                p = p + 1;
                n = n - 1;
            }
            return total;
        }",
    );
    assert_snapshot!(wat.trim_end(), @r###"
    (module
        (import "env" "print_int" (func $print_int (param i32)))
        (memory 1)
        (global $V0 (mut i32) (i32.const 3))
        (global $V1 (mut f32) (f32.const 0))
        (func $sum (export "sum")
            (param $V2 i32)
            (param $V3 i32)
            (result i32)
            (local $V4 i32)
            i32.const 0
            local.set $V4
            (block $WO1
                (loop $WI1
                    local.get $V3
                    i32.const 0
                    i32.gt_s
                    (if (result i32)
                        (then
                            local.get $V2
                            i32.load
                            i32.const 0
                            i32.ne
                        )
                        (else
                            i32.const 0
                        )
                    )
                    i32.eqz
                    br_if $WO1
                    local.get $V4
                    local.get $V2
                    i32.load
                    i32.add
                    local.set $V4
                    local.get $V2
                    i32.const 1
                    i32.const 4
                    i32.mul
                    i32.add
                    local.set $V2
                    local.get $V3
                    i32.const 1
                    i32.sub
                    local.set $V3
                    br $WI1
                )
            )
            local.get $V4
            return
        )
    )
    "###);
}

#[test]
fn arrays_and_else_if_chain() {
    let wat = emit(
        "int pick(float x) {
            int a[2][3];
            int* p;
            if (x) {
                p = *(a + 1);
            } else if (!x) {
                return -1;
            } else {
                x = -x;
            }
            return p - *a;
        }",
    );
    assert_snapshot!(wat.trim_end(), @r###"
    (module
        (memory 1)
        (func $pick (export "pick")
            (param $V0 f32)
            (result i32)
            (local $V1 i32)
            (local $V2 i32)
            i32.const 16
            local.set $V1
            local.get $V0
            f32.const 0
            f32.ne
            (if
                (then
                    local.get $V1
                    i32.const 1
                    i32.const 12
                    i32.mul
                    i32.add
                    local.set $V2
                )
                (else
                    local.get $V0
                    f32.const 0
                    f32.eq
                    (if
                        (then
                            i32.const 0
                            i32.const 1
                            i32.sub
                            return
                        )
                        (else
                            local.get $V0
                            f32.neg
                            local.set $V0
                        )
                    )
                )
            )
            local.get $V2
            local.get $V1
            i32.sub
            i32.const 4
            i32.div_s
            return
        )
    )
    "###);
}

#[test]
fn nested_loop_labels() {
    let wat = emit(
        "int f(int n) {
            while (1) {
                while (n) {
                    if (n == 3) { break; }
                    continue;
                }
                break;
            }
        }",
    );
    assert_snapshot!(wat.trim_end(), @r###"
    (module
        (func $f (export "f")
            (param $V0 i32)
            (result i32)
            (block $WO1
                (loop $WI1
                    i32.const 1
                    i32.eqz
                    br_if $WO1
                    (block $WO2
                        (loop $WI2
                            local.get $V0
                            i32.eqz
                            br_if $WO2
                            local.get $V0
                            i32.const 3
                            i32.eq
                            (if
                                (then
                                    br $WO2
                                )
                            )
                            br $WI2
                            br $WI2
                        )
                    )
                    br $WO1
                    br $WI1
                )
            )
            unreachable
        )
    )
    "###);
}

#[test]
fn logical_or_normalizes_operands() {
    let wat = emit("int g(float a, int b) { return a || b; }");
    assert_snapshot!(wat.trim_end(), @r###"
    (module
        (func $g (export "g")
            (param $V0 f32)
            (param $V1 i32)
            (result i32)
            local.get $V0
            f32.const 0
            f32.ne
            (if (result i32)
                (then
                    i32.const 1
                )
                (else
                    local.get $V1
                    i32.const 0
                    i32.ne
                )
            )
            return
        )
    )
    "###);
}

#[test]
fn calls_drop_unused_results() {
    let wat = emit(
        "extern int read();
        extern void print(float x);
        void h() { read(); print(2.5); }",
    );
    assert_snapshot!(wat.trim_end(), @r###"
    (module
        (import "env" "read" (func $read (result i32)))
        (import "env" "print" (func $print (param f32)))
        (func $h (export "h")
            call $read
            drop
            f32.const 2.5
            call $print
        )
    )
    "###);
}

#[test]
fn no_memory_without_arrays_or_loads() {
    let wat = emit("int x; void f() { x = 2; }");

    assert!(!wat.contains("(memory"));
    assert!(wat.contains("global.set $V0"));
}

#[test]
fn function_named_memory_is_the_only_export_of_that_name() {
    let wat = emit("void memory() { int a[2]; }");

    assert_snapshot!(wat.trim_end(), @r###"
    (module
        (memory 1)
        (func $memory (export "memory")
            (local $V0 i32)
            i32.const 16
            local.set $V0
        )
    )
    "###);
    assert_eq!(wat.matches("(export \"memory\")").count(), 1);
}
