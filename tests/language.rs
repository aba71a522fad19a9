use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::session::{on_session_stack, Session, Status};

/// A `Write` whose contents the test can read back afterwards.
#[derive(Clone, Default)]
struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.0.borrow_mut());
        String::from_utf8(bytes).expect("utf-8 output")
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Harness {
    session: Session,
    out: Capture,
    err: Capture,
}

impl Harness {
    fn new() -> Self {
        let out = Capture::default();
        let err = Capture::default();
        let session = Session::with_clock(Box::new(out.clone()), Box::new(err.clone()), || 1.5);

        Harness { session, out, err }
    }

    fn run(&mut self, source: &str) -> (Status, String, String) {
        let status = self.session.run(source);
        (status, self.out.take(), self.err.take())
    }
}

fn run(source: &str) -> (Status, String, String) {
    Harness::new().run(source)
}

fn stdout_of(source: &str) -> String {
    let (status, out, err) = run(source);
    assert_eq!(status, Status::Completed, "stderr was: {}", err);
    out
}

// ── end-to-end scenarios ────────────────────────────────────────────────────

#[test]
fn arithmetic_precedence() {
    assert_eq!(stdout_of("print 1 + 2 * 3;"), "7\n");
}

#[test]
fn string_concatenation() {
    assert_eq!(stdout_of("var a = \"hi\"; print a + \" there\";"), "hi there\n");
}

#[test]
fn for_loop() {
    assert_eq!(
        stdout_of("for (var i = 0; i < 3; i = i + 1) print i;"),
        "0\n1\n2\n"
    );
}

#[test]
fn closures_keep_their_own_state() {
    assert_eq!(
        stdout_of(
            "fun make() { var x = 0; fun inc() { x = x + 1; return x; } return inc; }
             var c = make(); print c(); print c(); print c();"
        ),
        "1\n2\n3\n"
    );
}

#[test]
fn methods_see_this() {
    assert_eq!(
        stdout_of(
            "class A { greet() { return \"hi \" + this.name; } }
             var a = A(); a.name = \"bob\"; print a.greet();"
        ),
        "hi bob\n"
    );
}

#[test]
fn super_calls_reach_the_superclass() {
    assert_eq!(
        stdout_of(
            "class A { f() { return \"A\"; } }
             class B < A { f() { return \"B>\" + super.f(); } }
             print B().f();"
        ),
        "B>A\n"
    );
}

#[test]
fn runtime_error_exits_70() {
    let (status, out, err) = run("\"x\" - 1;");
    assert_eq!(status, Status::RuntimeError);
    assert_eq!(status.exit_code(), 70);
    assert_eq!(out, "");
    assert_eq!(err, "Operands must be numbers.\n[line 1]\n");
}

#[test]
fn resolver_error_exits_64() {
    let (status, out, err) = run("fun bad() { return 1; } class C { init() { return 1; } }");
    assert_eq!(status, Status::StaticError);
    assert_eq!(status.exit_code(), 64);
    assert_eq!(out, "");
    assert!(err.contains("Can't return a value from an initializer"), "{}", err);
}

// ── scoping and closures ────────────────────────────────────────────────────

#[test]
fn each_call_gets_its_own_frame() {
    assert_eq!(
        stdout_of(
            "fun counter() { var n = 0; fun next() { n = n + 1; return n; } return next; }
             var a = counter(); var b = counter();
             print a(); print a(); print b();"
        ),
        "1\n2\n1\n"
    );
}

#[test]
fn closures_bind_lexically() {
    // The closure keeps seeing the global `a` even after a local shadows it.
    assert_eq!(
        stdout_of(
            "var a = \"global\";
             {
               fun show() { print a; }
               show();
               var a = \"block\";
               show();
             }"
        ),
        "global\nglobal\n"
    );
}

#[test]
fn shadowing_and_blocks() {
    assert_eq!(
        stdout_of(
            "var a = 1; { var a = 2; { var a = 3; print a; } print a; } print a;"
        ),
        "3\n2\n1\n"
    );
}

#[test]
fn recursion() {
    assert_eq!(
        stdout_of(
            "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
             print fib(15);"
        ),
        "610\n"
    );
}

// ── classes ─────────────────────────────────────────────────────────────────

#[test]
fn initializer_arguments_and_arity() {
    assert_eq!(
        stdout_of(
            "class Point { init(x, y) { this.x = x; this.y = y; } sum() { return this.x + this.y; } }
             print Point(2, 3).sum();"
        ),
        "5\n"
    );

    let (status, _, err) = run("class P { init(a) {} }\nP();");
    assert_eq!(status, Status::RuntimeError);
    assert_eq!(err, "Expected 1 arguments, but got 0.\n[line 2]\n");
}

#[test]
fn init_returns_the_instance() {
    assert_eq!(
        stdout_of(
            "class A { init() { this.n = 1; return; } }
             var a = A(); print a.init() == a; print a.n;"
        ),
        "true\n1\n"
    );
}

#[test]
fn inherited_methods_and_initializers() {
    assert_eq!(
        stdout_of(
            "class Animal { init(name) { this.name = name; } speak() { return this.name + \" makes a sound\"; } }
             class Dog < Animal { speak() { return super.speak() + \", woof\"; } }
             var d = Dog(\"rex\"); print d.speak(); print d; print Dog;"
        ),
        "rex makes a sound, woof\nDog instance\nDog\n"
    );
}

#[test]
fn fields_shadow_methods() {
    assert_eq!(
        stdout_of(
            "class A { m() { return \"method\"; } }
             var a = A(); fun f() { return \"field\"; } a.m = f; print a.m();"
        ),
        "field\n"
    );
}

#[test]
fn bound_methods_remember_their_instance() {
    assert_eq!(
        stdout_of(
            "class A { init(v) { this.v = v; } get() { return this.v; } }
             var m = A(7).get; print m(); print A(1).get == A(1).get;"
        ),
        "7\nfalse\n"
    );
}

#[test]
fn superclass_must_be_a_class() {
    let (status, _, err) = run("var S = \"no\";\nclass A < S {}");
    assert_eq!(status, Status::RuntimeError);
    assert_eq!(err, "Superclass must be a class.\n[line 2]\n");
}

// ── control flow ────────────────────────────────────────────────────────────

#[test]
fn break_leaves_the_innermost_loop() {
    assert_eq!(
        stdout_of(
            "for (var i = 0; i < 3; i = i + 1) {
               var j = 0;
               while (true) { if (j == i) break; j = j + 1; }
               print j;
             }"
        ),
        "0\n1\n2\n"
    );
}

#[test]
fn for_without_condition_runs_until_break() {
    assert_eq!(
        stdout_of("var n = 0; for (;;) { n = n + 1; if (n == 5) break; } print n;"),
        "5\n"
    );
}

#[test]
fn logical_operators_short_circuit() {
    assert_eq!(
        stdout_of(
            "var calls = 0; fun hit() { calls = calls + 1; return true; }
             print false and hit(); print true or hit(); print calls;
             print nil or \"default\";"
        ),
        "false\ntrue\n0\ndefault\n"
    );
}

// ── values ──────────────────────────────────────────────────────────────────

#[test]
fn stringify_rules() {
    assert_eq!(
        stdout_of(
            "print nil; print true; print 2.5; print 10 / 4; print 3.0;
             fun f() {} print f; print clock; print clock();"
        ),
        "nil\ntrue\n2.5\n2.5\n3\n<fn f>\nnative <fn> clock\n1.5\n"
    );
}

#[test]
fn division_by_zero_is_not_an_error() {
    assert_eq!(stdout_of("print 1 / 0; print 0 / 0 == 0 / 0;"), "inf\nfalse\n");
}

#[test]
fn calling_a_non_callable() {
    let (status, _, err) = run("var x = 1;\nx();");
    assert_eq!(status, Status::RuntimeError);
    assert_eq!(err, "Can only call function and classes\n[line 2]\n");
}

#[test]
fn arity_is_enforced_for_natives() {
    let (status, _, err) = run("clock(1);");
    assert_eq!(status, Status::RuntimeError);
    assert_eq!(err, "Expected 0 arguments, but got 1.\n[line 1]\n");
}

// ── diagnostics ─────────────────────────────────────────────────────────────

#[test]
fn parse_errors_are_all_reported() {
    let (status, out, err) = run("print 1;\nvar = 2;\nprint (3;\nprint 4");
    assert_eq!(status, Status::StaticError);
    assert_eq!(out, "");
    assert_eq!(
        err,
        "[ 2 ] Error  at '=': Expect variable name.\n\
         [ 3 ] Error  at ';': Expect ')' after expression.\n\
         [ 4 ] Error  at end: Expect ';' after value.\n"
    );
}

#[test]
fn lexical_errors_come_before_parse_errors() {
    let (status, _, err) = run("print 1 @;\nprint ;");
    assert_eq!(status, Status::StaticError);
    assert_eq!(
        err,
        "[ 1 ] Error : Unexpected character: @\n\
         [ 2 ] Error  at ';': Expect expression.\n"
    );
}

#[test]
fn runtime_error_keeps_earlier_output() {
    let (status, out, err) = run("print \"before\";\nprint undefined;\nprint \"after\";");
    assert_eq!(status, Status::RuntimeError);
    assert_eq!(out, "before\n");
    assert_eq!(err, "Undefined variable undefined.\n[line 2]\n");
}

#[test]
fn deep_recursion_is_reported_not_fatal() {
    let (status, _, err) =
        on_session_stack(|| run("fun down(n) { return down(n + 1); }\ndown(0);")).unwrap();
    assert_eq!(status, Status::RuntimeError);
    assert_eq!(err, "Stack overflow.\n[line 1]\n");
}

#[test]
fn nested_blocks_inside_recursive_initializers_complete() {
    let source = "class A { init(n) { if (n > 0) { { { { { { { { while (true) { this.c = A(n - 1); break; } } } } } } } } } } }
                  A(200);
                  print \"done\";";
    let (status, out, err) = on_session_stack(move || run(source)).unwrap();
    assert_eq!(status, Status::Completed, "stderr was: {}", err);
    assert_eq!(out, "done\n");
}

#[test]
fn heavily_nested_recursion_stops_with_a_runtime_error() {
    // Fewer than 256 calls, but each one nests 60 blocks and 60 groupings.
    let source = format!(
        "class A {{ init(n) {{ if (n > 0) {}this.c = {}A(n - 1){};{} }} }}\nA(250);\nprint \"unreached\";",
        "{ ".repeat(60),
        "(".repeat(60),
        ")".repeat(60),
        " }".repeat(60)
    );
    let (status, out, err) = on_session_stack(move || run(&source)).unwrap();
    assert_eq!(status, Status::RuntimeError);
    assert_eq!(out, "");
    assert_eq!(err, "Stack overflow.\n[line 1]\n");
}

#[test]
fn overly_nested_source_is_a_parse_error() {
    let source = format!("print {}5{};", "(".repeat(5000), ")".repeat(5000));
    let (status, out, err) = on_session_stack(move || run(&source)).unwrap();
    assert_eq!(status, Status::StaticError);
    assert_eq!(out, "");
    assert_eq!(err, "[ 1 ] Error  at '(': Nesting is too deep.\n");
}

// ── REPL behaviour ──────────────────────────────────────────────────────────

#[test]
fn repl_state_persists_between_lines() {
    let mut h = Harness::new();
    h.session.set_repl(true);

    assert_eq!(h.run("var a = 1;").1, "");
    assert_eq!(h.run("a + 1;").1, "2\n");
    assert_eq!(
        h.run("fun add(x) { return a + x; }").0,
        Status::Completed
    );
    assert_eq!(h.run("add(41);").1, "42\n");

    let (status, _, err) = h.run("b;");
    assert_eq!(status, Status::RuntimeError);
    assert_eq!(err, "Undefined variable b.\n[line 1]\n");
    h.session.reset_error();

    let (status, _, _) = h.run("class C { }");
    assert_eq!(status, Status::Completed);
    assert_eq!(h.run("C();").1, "C instance\n");
}

#[test]
fn script_mode_does_not_echo() {
    assert_eq!(stdout_of("1 + 1; \"quiet\";"), "");
}
