#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::io::Write;
    use std::rc::Rc;

    use treelox as lox;

    use lox::error::{LoxError, ResolveErrorKind, RuntimeErrorKind};
    use lox::interpreter::Interpreter;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::Scanner;
    use lox::token::Token;

    /// A `Write` sink sharing its buffer with the test, so program output
    /// can be inspected after the interpreter is done with it.
    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Run a source program through the full pipeline and capture stdout.
    fn run(source: &str) -> Result<String, LoxError> {
        let tokens: Vec<Token> =
            Scanner::new(source.as_bytes()).collect::<Result<Vec<Token>, LoxError>>()?;

        let statements = Parser::new(tokens)
            .parse()
            .map_err(|mut errors| errors.remove(0))?;

        let locals = Resolver::new().resolve(&statements)?;

        let buf = SharedBuf::default();
        let mut interpreter = Interpreter::with_output(Box::new(buf.clone()));

        interpreter.interpret(&statements, locals)?;

        let bytes = buf.0.borrow();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn runtime_error_kind(source: &str) -> RuntimeErrorKind {
        match run(source) {
            Err(LoxError::Runtime { kind, .. }) => kind,

            other => panic!("expected runtime error, got {:?}", other),
        }
    }

    // ── closures and scoping ───────────────────────────────────────────

    #[test]
    fn test_interpreter_01_counter_closure_holds_its_frame() {
        let source = "
            fun makeCounter() {
              var i = 0;
              fun count() { i = i + 1; print i; }
              return count;
            }
            var c = makeCounter();
            c(); c(); c();
        ";

        assert_eq!(run(source).unwrap(), "1\n2\n3\n");
    }

    #[test]
    fn test_interpreter_02_block_shadowing() {
        let source = "
            var a = \"global\";
            {
              var a = \"block\";
              print a;
            }
            print a;
        ";

        assert_eq!(run(source).unwrap(), "block\nglobal\n");
    }

    #[test]
    fn test_interpreter_03_resolved_reference_ignores_later_shadowing() {
        // `show` is resolved against the global `a` before the block-local
        // `a` exists, and keeps reading it afterwards.
        let source = "
            var a = \"global\";
            {
              fun show() { print a; }
              show();
              var a = \"block\";
              show();
            }
        ";

        assert_eq!(run(source).unwrap(), "global\nglobal\n");
    }

    #[test]
    fn test_interpreter_04_recursion() {
        let source = "
            fun fib(n) {
              if (n < 2) return n;
              return fib(n - 1) + fib(n - 2);
            }
            print fib(10);
        ";

        assert_eq!(run(source).unwrap(), "55\n");
    }

    #[test]
    fn test_interpreter_05_determinism() {
        let source = "
            var total = 0;
            for (var i = 1; i <= 10; i = i + 1) total = total + i;
            print total;
        ";

        let first = run(source).unwrap();
        let second = run(source).unwrap();

        assert_eq!(first, "55\n");
        assert_eq!(first, second);
    }

    // ── control flow ───────────────────────────────────────────────────

    #[test]
    fn test_interpreter_06_for_loop_desugared() {
        assert_eq!(
            run("for (var i = 0; i < 3; i = i + 1) print i;").unwrap(),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn test_interpreter_07_while_loop() {
        let source = "
            var i = 3;
            while (i > 0) {
              print i;
              i = i - 1;
            }
        ";

        assert_eq!(run(source).unwrap(), "3\n2\n1\n");
    }

    #[test]
    fn test_interpreter_08_truthiness() {
        let source = "
            if (0) print \"zero truthy\";
            if (\"\") print \"empty truthy\";
            if (nil) print \"unreached\"; else print \"nil falsy\";
            if (false) print \"unreached\"; else print \"false falsy\";
        ";

        assert_eq!(
            run(source).unwrap(),
            "zero truthy\nempty truthy\nnil falsy\nfalse falsy\n"
        );
    }

    #[test]
    fn test_interpreter_09_logical_operators_return_operands() {
        let source = "
            print nil or \"yes\";
            print 0 and 1;
            print false and \"unreached\";
            print \"first\" or \"second\";
        ";

        assert_eq!(run(source).unwrap(), "yes\n1\nfalse\nfirst\n");
    }

    #[test]
    fn test_interpreter_10_function_returns_nil_by_default() {
        assert_eq!(run("fun f() { } print f();").unwrap(), "nil\n");
    }

    // ── operators ──────────────────────────────────────────────────────

    #[test]
    fn test_interpreter_11_arithmetic_and_concatenation() {
        let source = "
            print \"foo\" + \"bar\";
            print 1 + 2;
            print 0.5 * 3.0;
            print 7 / 2;
            print 2 + 3 * 4;
        ";

        assert_eq!(run(source).unwrap(), "foobar\n3\n1.5\n3.5\n14\n");
    }

    #[test]
    fn test_interpreter_12_division_by_zero_is_ieee() {
        assert_eq!(run("print 1 / 0;").unwrap(), "inf\n");
        assert_eq!(run("print -1 / 0;").unwrap(), "-inf\n");
        assert_eq!(run("print 0 / 0;").unwrap(), "NaN\n");
    }

    #[test]
    fn test_interpreter_13_equality() {
        let source = "
            print 1 == 1;
            print \"a\" == \"a\";
            print nil == nil;
            print 1 == \"1\";
            print nil == false;
            print 1 != 2;
        ";

        assert_eq!(
            run(source).unwrap(),
            "true\ntrue\ntrue\nfalse\nfalse\ntrue\n"
        );
    }

    #[test]
    fn test_interpreter_14_operand_type_errors() {
        assert_eq!(runtime_error_kind("print -\"a\";"), RuntimeErrorKind::NumberOperand);

        assert_eq!(
            runtime_error_kind("print 1 < \"a\";"),
            RuntimeErrorKind::NumberOperands
        );

        assert_eq!(
            runtime_error_kind("print 1 + \"a\";"),
            RuntimeErrorKind::NumberOrStringOperands
        );
    }

    // ── variables ──────────────────────────────────────────────────────

    #[test]
    fn test_interpreter_15_undefined_variable() {
        assert_eq!(
            runtime_error_kind("print missing;"),
            RuntimeErrorKind::UndefinedVariable
        );

        assert_eq!(
            runtime_error_kind("missing = 1;"),
            RuntimeErrorKind::UndefinedVariable
        );
    }

    #[test]
    fn test_interpreter_16_assignment_is_an_expression() {
        assert_eq!(run("var a = 1; print a = 2; print a;").unwrap(), "2\n2\n");
    }

    // ── calls ──────────────────────────────────────────────────────────

    #[test]
    fn test_interpreter_17_arity_mismatch() {
        assert_eq!(
            runtime_error_kind("fun f(a, b) { print a + b; } f(1);"),
            RuntimeErrorKind::TooFewArguments
        );

        assert_eq!(
            runtime_error_kind("fun f(a) { print a; } f(1, 2);"),
            RuntimeErrorKind::TooManyArguments
        );
    }

    #[test]
    fn test_interpreter_18_only_functions_and_classes_are_callable() {
        assert_eq!(runtime_error_kind("\"hi\"();"), RuntimeErrorKind::NotCallable);

        assert_eq!(runtime_error_kind("1(2);"), RuntimeErrorKind::NotCallable);
    }

    #[test]
    fn test_interpreter_19_clock_builtin() {
        assert_eq!(run("print clock() >= 0;").unwrap(), "true\n");
        assert_eq!(run("print clock;").unwrap(), "<native fn>\n");
    }

    #[test]
    fn test_interpreter_20_stringification() {
        let source = "
            fun f() { }
            class A { }
            print f;
            print A;
            print A();
            print nil;
            print true;
        ";

        assert_eq!(
            run(source).unwrap(),
            "<fn f>\nA\nA instance\nnil\ntrue\n"
        );
    }

    // ── classes ────────────────────────────────────────────────────────

    #[test]
    fn test_interpreter_21_method_call_with_this() {
        let source = "
            class Bacon {
              eat() { print \"Crunch crunch crunch!\"; }
            }
            Bacon().eat();
        ";

        assert_eq!(run(source).unwrap(), "Crunch crunch crunch!\n");
    }

    #[test]
    fn test_interpreter_22_fields_shadow_methods() {
        let source = "
            class C { m() { print \"method\"; } }
            var c = C();
            c.m();
            c.m = 1;
            print c.m;
        ";

        assert_eq!(run(source).unwrap(), "method\n1\n");
    }

    #[test]
    fn test_interpreter_23_bound_method_keeps_receiver() {
        let source = "
            class C { m() { print this.x; } }
            var c = C();
            c.x = 42;
            var f = c.m;
            f();
        ";

        assert_eq!(run(source).unwrap(), "42\n");
    }

    #[test]
    fn test_interpreter_24_initializer_runs_and_returns_instance() {
        let source = "
            class Foo { init() { print \"init\"; } }
            var f = Foo();
            print f;
        ";

        assert_eq!(run(source).unwrap(), "init\nFoo instance\n");
    }

    #[test]
    fn test_interpreter_25_initializer_with_bare_return_yields_this() {
        let source = "
            class Foo {
              init(early) {
                this.x = 1;
                if (early) return;
                this.x = 2;
              }
            }
            print Foo(true).x;
            print Foo(false).x;
        ";

        assert_eq!(run(source).unwrap(), "1\n2\n");
    }

    #[test]
    fn test_interpreter_26_initializer_arity_is_class_arity() {
        let source = "
            class Point {
              init(x, y) {
                this.x = x;
                this.y = y;
              }
            }
            var p = Point(3, 4);
            print p.x + p.y;
        ";

        assert_eq!(run(source).unwrap(), "7\n");

        assert_eq!(
            runtime_error_kind("class P { init(x) { this.x = x; } } P();"),
            RuntimeErrorKind::TooFewArguments
        );
    }

    #[test]
    fn test_interpreter_27_property_errors() {
        assert_eq!(
            runtime_error_kind("var x = 1; print x.y;"),
            RuntimeErrorKind::InstanceProperty
        );

        assert_eq!(
            runtime_error_kind("var x = 1; x.y = 2;"),
            RuntimeErrorKind::InstanceProperty
        );

        assert_eq!(
            runtime_error_kind("class A { } print A().missing;"),
            RuntimeErrorKind::UndefinedProperty
        );
    }

    // ── inheritance ────────────────────────────────────────────────────

    #[test]
    fn test_interpreter_28_super_calls_parent_method() {
        let source = "
            class A { method() { print \"A\"; } }
            class B < A { method() { super.method(); print \"B\"; } }
            B().method();
        ";

        assert_eq!(run(source).unwrap(), "A\nB\n");
    }

    #[test]
    fn test_interpreter_29_method_lookup_walks_superclass_chain() {
        let source = "
            class A { m() { print \"A\"; } }
            class B < A { }
            class C < B { m() { super.m(); print \"C\"; } }
            C().m();
        ";

        assert_eq!(run(source).unwrap(), "A\nC\n");
    }

    #[test]
    fn test_interpreter_30_inherited_method_binds_subclass_instance() {
        let source = "
            class A { describe() { print this.label; } }
            class B < A { }
            var b = B();
            b.label = \"from B\";
            b.describe();
        ";

        assert_eq!(run(source).unwrap(), "from B\n");
    }

    #[test]
    fn test_interpreter_31_superclass_must_be_a_class() {
        assert_eq!(
            runtime_error_kind("var NotAClass = 1; class B < NotAClass { }"),
            RuntimeErrorKind::SuperclassNotClass
        );
    }

    #[test]
    fn test_interpreter_32_subclass_instance_prints_its_own_class() {
        assert_eq!(
            run("class A { } class B < A { } print B();").unwrap(),
            "B instance\n"
        );
    }

    // ── static errors through the pipeline ─────────────────────────────

    #[test]
    fn test_interpreter_33_static_error_prevents_execution() {
        match run("print \"reached\"; print this;") {
            Err(LoxError::Resolve { kind, .. }) => {
                assert_eq!(kind, ResolveErrorKind::ThisOutsideClass);
            }

            other => panic!("expected resolve error, got {:?}", other),
        }
    }
}
