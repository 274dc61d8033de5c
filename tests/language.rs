use std::fs;

use octava::{
    get_result,
    interpreter::evaluator::{core::Evaluator, mathml::MathMLDisplay},
};
use walkdir::WalkDir;

#[test]
fn demo_scripts_work() {
    let mut count = 0;

    for entry in WalkDir::new("demos").into_iter()
                                      .filter_map(Result::ok)
                                      .filter(|e| {
                                          e.path().extension().is_some_and(|ext| ext == "oct")
                                      })
    {
        let path = entry.path();
        let content =
            fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));

        count += 1;
        if let Err(e) = get_result(&content, false) {
            panic!("Demo script {path:?} failed: {e}");
        }
    }

    assert!(count > 0, "No demo scripts found in demos/");
}

fn assert_success(src: &str) {
    if let Err(e) = get_result(src, false) {
        panic!("Script failed: {e}");
    }
}

fn assert_failure(src: &str) {
    if get_result(src, false).is_ok() {
        panic!("Script succeeded but was expected to fail")
    }
}

/// Runs a script and returns the text renderings of the non-suppressed
/// statement results.
fn display(src: &str) -> Vec<String> {
    Evaluator::new().run_display(src)
                    .unwrap_or_else(|e| panic!("Script failed:\n{src}\nError: {e}"))
}

/// Runs a script and returns the rendering of its last displayed result.
fn last_display(src: &str) -> String {
    display(src).pop()
                .unwrap_or_else(|| panic!("Script displayed nothing:\n{src}"))
}

fn error_message(src: &str) -> String {
    match get_result(src, false) {
        Ok(()) => panic!("Script succeeded but was expected to fail:\n{src}"),
        Err(e) => e.to_string(),
    }
}

#[test]
fn arithmetic_and_precedence() {
    assert_eq!(last_display("a = 2 + 3*4; a"), "14");
    assert_eq!(last_display("2^3^2"), "512");
    assert_eq!(last_display("-2^2"), "-4");
    assert_eq!(last_display("10/4"), "2.5");
    assert_eq!(last_display("7\\14"), "2");
}

#[test]
fn complex_arithmetic() {
    assert_eq!(last_display("2i*2i"), "-4");
    assert_eq!(last_display("(1+2i)*(3-1i)"), "5 + 5i");
    assert_eq!(last_display("sqrt(-4)"), "2i");
    assert_eq!(last_display("abs(3+4i)"), "5");
    assert_eq!(last_display("conj(1+2i)"), "1 - 2i");
}

#[test]
fn division_by_zero_produces_extended_values() {
    assert_eq!(last_display("1/0"), "Inf");
    assert_eq!(last_display("-1/0"), "-Inf");
    assert_eq!(last_display("0/0"), "NaN");
    assert_eq!(last_display("5/inf"), "0");
}

#[test]
fn matrix_literals_and_subscripts() {
    assert_eq!(last_display("A = [1,2;3,4]; A(2, :)"), "[3,4]");
    assert_eq!(last_display("A = [1,2;3,4]; A(:, 1)"), "[1;4]");
    assert_eq!(last_display("A = [1,2;3,4]; A(2, 2)"), "4");
    assert_eq!(last_display("A = [1,2;3,4]; A(end)"), "4");
    assert_eq!(last_display("A = [1,2,3;4,5,6]; A(end, end)"), "6");
}

#[test]
fn linear_indexing_is_column_major() {
    assert_eq!(last_display("A = [1,2;3,4]; A(2)"), "3");
    assert_eq!(last_display("A = [1,2;3,4]; A([1,4])"), "[1,4]");
}

#[test]
fn logical_indexing() {
    assert_eq!(last_display("x = [10,20,30,40]; x(x>15)"), "[20,30,40]");
    assert_eq!(last_display("x = [1,2,3,4]; x(x>2) = 0; x"), "[1,2,0,0]");
}

#[test]
fn logical_indexing_is_consistent_with_find() {
    assert_eq!(last_display("A = [5,8,1,9]; m = A>4; all = A(m) == A(find(m)); all"),
               "[1,1,1]");
    assert_eq!(last_display("find([0,1;1,0])"), "[2;3]");
}

#[test]
fn user_defined_functions() {
    assert_eq!(last_display("g(n) = n*2; g(7)"), "14");
    assert_eq!(last_display("add(a, b) = a + b; add(2, 5)"), "7");
    // nested calls re-enter through fresh frames
    assert_eq!(last_display("g(n) = n*2; h(m) = g(m) + 1; h(3)"), "7");
}

#[test]
fn calling_a_function_without_arguments_fails() {
    let message = error_message("g(n) = n*2; g");
    assert!(message.contains("calling g without arguments list"), "{message}");
}

#[test]
fn structures() {
    assert_eq!(last_display("s.a.b = 5; s.a.b"), "5");
    assert_eq!(last_display("s.x = 1; s.y = 2; s"), "struct(x = 1; y = 2)");
    assert_eq!(last_display("name = 'f'; s.(name) = 7; s.f"), "7");
    assert_failure("s = 5; s.a = 1");
    assert_failure("s.a = 1; s.b.c");
}

#[test]
fn if_selection() {
    assert_eq!(last_display("if 0; 1; elseif 1; 2; else 3; endif"), "2");
    assert_eq!(last_display("if 1; 5; endif"), "5");
    assert_eq!(last_display("if [1,1]; 7; else 8; endif"), "7");
    assert_eq!(last_display("if [1,0]; 7; else 8; endif"), "8");
}

#[test]
fn short_circuit_operators_skip_the_right_side() {
    assert_eq!(last_display("0 && this_name_is_unbound"), "0");
    assert_eq!(last_display("1 || this_name_is_unbound"), "1");
    assert_failure("1 && this_name_is_unbound");
}

#[test]
fn ranges() {
    assert_eq!(last_display("1:4"), "[1,2,3,4]");
    assert_eq!(last_display("1:2:7"), "[1,3,5,7]");
    assert_eq!(last_display("5:-2:1"), "[5,3,1]");
    assert_eq!(last_display("numel(5:1)"), "0");
    // length is floor((b-a)/s) + 1
    assert_eq!(last_display("numel(2:3:17)"), "6");
    assert_eq!(last_display("x = [10,20,30]; x(2:end)"), "[20,30]");
}

#[test]
fn multi_valued_size() {
    assert_eq!(last_display("size([1,2,3;4,5,6])"), "[2,3]");
    assert_eq!(last_display("[r, c] = size([1,2,3;4,5,6]); r"), "2");
    assert_eq!(last_display("[r, c] = size([1,2,3;4,5,6]); c"), "3");
    assert_eq!(last_display("[r, ~] = size([1,2;3,4]); r"), "2");
}

#[test]
fn return_list_selection_failures() {
    let message = error_message("[a, b] = 5");
    assert!(message.contains("element number 2 undefined in return list"),
            "{message}");
    assert_success("a = 5; a");
}

#[test]
fn computed_multiple_assignment_is_rejected() {
    let message = error_message("[a, b] += 1");
    assert!(message.contains("computed multiple assignment not allowed"),
            "{message}");
}

#[test]
fn compound_assignments() {
    assert_eq!(last_display("x = 2; x += 3; x"), "5");
    assert_eq!(last_display("x = 7; x -= 2; x"), "5");
    assert_eq!(last_display("x = 4; x *= 2; x"), "8");
    assert_eq!(last_display("x = 9; x /= 3; x"), "3");
    assert_eq!(last_display("x = 5; x ^= 2; x"), "25");
    assert_failure("unbound_target += 1");
}

#[test]
fn increment_and_decrement() {
    assert_eq!(last_display("x = 1; x++; x"), "2");
    assert_eq!(last_display("x = 5; x--; x"), "4");
    assert_eq!(last_display("x = 1; y = ++x; y"), "2");
    assert_eq!(last_display("x = 1; y = x++; y"), "1");
}

#[test]
fn out_of_bounds_writes_extend_with_fill() {
    assert_eq!(last_display("v = [1,2]; v(5) = 9; v"), "[1,2,0,0,9]");
    assert_eq!(last_display("A = [1,2;3,4]; A(3,3) = 7; A(3,3)"), "7");
    assert_eq!(last_display("A = [1,2;3,4]; A(3,3) = 7; A(1,3)"), "0");
    assert_failure("A = [1,2;3,4]; A(9) = 1");
}

#[test]
fn strings() {
    assert_eq!(last_display("s = 'abc'; s"), "'abc'");
    assert_eq!(last_display("s = \"abc\"; s"), "\"abc\"");
    assert_eq!(last_display("'a' == 'a'"), "1");
    assert_eq!(last_display("'a' == 'b'"), "0");
    assert_failure("'a' + 1");
}

#[test]
fn cell_arrays() {
    assert_eq!(last_display("c = {1, 'two'}; c{2}"), "'two'");
    assert_eq!(last_display("c = {1, 'two'}; c(1)"), "{1}");
    assert_eq!(last_display("c{3} = 5; c{3}"), "5");
}

#[test]
fn transposes() {
    assert_eq!(last_display("[1,2;3,4]'"), "[1,3;2,4]");
    assert_eq!(last_display("[1,2;3,4].'"), "[1,3;2,4]");
    assert_eq!(last_display("[1+2i,3]'"), "[1 - 2i;3]");
    assert_eq!(last_display("[1+2i,3].'"), "[1 + 2i;3]");
}

#[test]
fn matrix_products() {
    assert_eq!(last_display("[1,2;3,4] * [5;6]"), "[17;39]");
    assert_eq!(last_display("[1,2] * [3;4]"), "11");
    assert_eq!(last_display("[1,1;0,1]^2"), "[1,2;0,1]");
    assert_eq!(last_display("[1,2;3,4] .* [5,6;7,8]"), "[5,12;21,32]");
    assert_failure("[1,2;3,4] * [1,2;3,4;5,6]");
    assert_failure("[1,2;3,4] / [5,6;7,8]");
}

#[test]
fn factorials_match_products() {
    assert_eq!(last_display("factorial(0)"), "1");
    assert_eq!(last_display("factorial(5)"), "120");
    assert_eq!(last_display("factorial(5) == prod(1:5)"), "1");
    assert_eq!(last_display("factorial(7) == prod(1:7)"), "1");
    assert_failure("factorial(-1)");
    assert_failure("factorial(2.5)");
}

#[test]
fn commutativity_within_display_precision() {
    assert_eq!(last_display("0.1 + 0.2 == 0.2 + 0.1"), "1");
    assert_eq!(last_display("a = 1/3; b = 7; c = 0.25; (a*b)*c == a*(b*c)"), "1");
}

#[test]
fn assignment_idempotence() {
    assert_eq!(last_display("x = 3*7 + 1; x == 3*7 + 1"), "1");
}

#[test]
fn transcendental_functions() {
    assert_eq!(last_display("sin(0)"), "0");
    assert_eq!(last_display("cos(0)"), "1");
    assert_eq!(last_display("sin(pi/2)"), "1");
    assert_eq!(last_display("exp(0)"), "1");
    assert_eq!(last_display("log(e)"), "1");
    assert_eq!(last_display("log10(1000)"), "3");
    assert_eq!(last_display("logb(2, 8)"), "3");
    assert_eq!(last_display("atan(1) == pi/4"), "1");
    assert_eq!(last_display("sqrt(2)^2 == 2"), "1");
}

#[test]
fn mapper_functions_lift_over_arrays() {
    assert_eq!(last_display("abs([-1,2,-3])"), "[1,2,3]");
    assert_eq!(last_display("floor([1.5,2.7;-1.5,0])"), "[1,2;-2,0]");
    let message = error_message("sin([1,2], [3,4])");
    assert!(message.contains("single argument"), "{message}");
}

#[test]
fn reductions_and_shape_queries() {
    assert_eq!(last_display("sum([1,2,3,4])"), "10");
    assert_eq!(last_display("sum([1,2;3,4])"), "[4,6]");
    assert_eq!(last_display("prod([1,2,3,4])"), "24");
    assert_eq!(last_display("numel([1,2;3,4])"), "4");
    assert_eq!(last_display("ndims([1,2;3,4])"), "2");
    assert_eq!(last_display("numel(zeros(2,3))"), "6");
    assert_eq!(last_display("sum(ones(3))"), "[3,3,3]");
}

#[test]
fn reshape_keeps_column_major_order() {
    assert_eq!(last_display("reshape([1,2;3,4], 1, 4)"), "[1,3,2,4]");
    assert_eq!(last_display("A = reshape(1:8, 2, 2, 2); A(1, 2, 2)"), "7");
}

#[test]
fn natives_can_be_shadowed_and_cleared() {
    assert_eq!(last_display("pi = 3; pi"), "3");
    assert!(last_display("pi = 3; clear pi\npi").starts_with("3.14159265358979"));
    assert_eq!(last_display("true + true"), "2");
}

#[test]
fn clear_with_no_arguments_resets_everything() {
    assert_failure("x = 5; clear\nx");
    assert_failure("2 + 2\nclear\nans");
    assert_eq!(last_display("2 + 2\nans"), "4");
    // natives survive the reset
    assert!(last_display("clear\npi").starts_with("3.14159265358979"));
}

#[test]
fn sentinels_outside_indexing_are_syntax_errors() {
    assert_failure("x = end");
    assert_failure("y = 5; y(1:end); end + 1");
}

#[test]
fn exit_status_reflects_the_failing_phase() {
    let mut evaluator = Evaluator::new();

    assert!(evaluator.parse("a = ,").is_err());
    assert_eq!(evaluator.exit_status.code(), 2);

    let ast = evaluator.parse("unbound_name").unwrap();
    assert!(evaluator.evaluate(&ast).is_err());
    assert_eq!(evaluator.exit_status.code(), 3);

    let ast = evaluator.parse("1 + 1").unwrap();
    assert!(evaluator.evaluate(&ast).is_ok());
    assert_eq!(evaluator.exit_status.code(), 0);
}

#[test]
fn unparse_round_trips_values() {
    for source in ["14", "-2.5", "1 + 2i", "[1,2;3,4]", "'abc'", "[1,0.5;3,4]"] {
        let mut first = Evaluator::new();
        let rendered = {
            let value = first.run(source).unwrap().unwrap();
            first.unparse_value(&value)
        };
        let mut second = Evaluator::new();
        let reparsed = second.run(&rendered).unwrap().unwrap();
        assert_eq!(second.unparse_value(&reparsed), rendered, "via {source}");
    }
}

#[test]
fn unparse_canonical_forms() {
    let mut evaluator = Evaluator::new();

    let ast = evaluator.parse("a = 2 + 3*4; a").unwrap();
    assert_eq!(evaluator.unparse(&ast), "a = 2 + 3 * 4;\na");

    let ast = evaluator.parse("if x; 1; else 2; end").unwrap();
    assert_eq!(evaluator.unparse(&ast), "IF x\n1;\nELSE\n2;\nENDIF");

    let ast = evaluator.parse("clear x y").unwrap();
    assert_eq!(evaluator.unparse(&ast), "clear x y");

    let ast = evaluator.parse("A(2, :)").unwrap();
    assert_eq!(evaluator.unparse(&ast), "A(2,:)");

    let ast = evaluator.parse("1:2:9").unwrap();
    assert_eq!(evaluator.unparse(&ast), "1:2:9");
}

#[test]
fn mathml_fragments() {
    let mut evaluator = Evaluator::new();

    let ast = evaluator.parse("1 + 2").unwrap();
    let fragment = evaluator.unparse_mathml(&ast, MathMLDisplay::Inline).unwrap();
    assert!(fragment.starts_with("<math xmlns=\"http://www.w3.org/1998/Math/MathML\" display=\"inline\">"));
    assert!(fragment.contains("<mn>1</mn>"));
    assert!(fragment.contains("<mo>+</mo>"));

    let ast = evaluator.parse("Inf").unwrap();
    let fragment = evaluator.unparse_mathml(&ast, MathMLDisplay::Block).unwrap();
    assert!(fragment.contains("<mi>&infin;</mi>"));
    assert!(fragment.contains("display=\"block\""));

    let ast = evaluator.parse("abs(x)").unwrap();
    let fragment = evaluator.unparse_mathml(&ast, MathMLDisplay::Inline).unwrap();
    assert!(fragment.contains("<mo>|</mo>"));

    let ast = evaluator.parse("sqrt(2)").unwrap();
    let fragment = evaluator.unparse_mathml(&ast, MathMLDisplay::Inline).unwrap();
    assert!(fragment.contains("<msqrt>"));

    let ast = evaluator.parse("factorial(n)").unwrap();
    let fragment = evaluator.unparse_mathml(&ast, MathMLDisplay::Inline).unwrap();
    assert!(fragment.contains("<mo>!</mo>"));
}

#[test]
fn alias_resolver_maps_written_names() {
    use octava::interpreter::evaluator::core::EvaluatorConfig;
    use regex::Regex;

    let config = EvaluatorConfig { alias_table: vec![("sin".to_string(),
                                                      Regex::new("^sine$").unwrap())],
                                   ..EvaluatorConfig::default() };
    let mut evaluator = Evaluator::with_config(config);

    let ast = evaluator.parse("sine(0)").unwrap();
    let value = evaluator.evaluate(&ast).unwrap().unwrap();
    assert_eq!(evaluator.unparse_value(&value), "0");
}

#[test]
fn restart_resets_the_environment() {
    let mut evaluator = Evaluator::new();
    evaluator.run("x = 5").unwrap();
    evaluator.restart();
    assert!(evaluator.run("x").is_err());
    assert!(evaluator.variable_names().contains(&"pi".to_string()));
}

#[test]
fn clear_entry_point_restores_natives() {
    let mut evaluator = Evaluator::new();
    evaluator.run("x = 5; pi = 3").unwrap();

    evaluator.clear(&["x", "pi"]);
    assert!(evaluator.run("x").is_err());
    let pi = evaluator.run("pi").unwrap().unwrap();
    assert!(evaluator.unparse_value(&pi).starts_with("3.14159"));
}

#[test]
fn error_kinds_classify_failures() {
    use octava::error::ErrorKind;

    let mut evaluator = Evaluator::new();

    let ast = evaluator.parse("this_name_is_unbound").unwrap();
    assert_eq!(evaluator.evaluate(&ast).unwrap_err().kind(), ErrorKind::Reference);

    let ast = evaluator.parse("x = end").unwrap();
    assert_eq!(evaluator.evaluate(&ast).unwrap_err().kind(), ErrorKind::Syntax);

    let ast = evaluator.parse("factorial(-1)").unwrap();
    assert_eq!(evaluator.evaluate(&ast).unwrap_err().kind(), ErrorKind::Arithmetic);

    let ast = evaluator.parse("[a, b] = 5").unwrap();
    assert_eq!(evaluator.evaluate(&ast).unwrap_err().kind(), ErrorKind::Evaluation);
}

#[test]
fn parse_errors_carry_lines() {
    let mut evaluator = Evaluator::new();
    let error = evaluator.parse("x = 1\ny = ,").unwrap_err();
    assert_eq!(error.line_number(), 2);
}

#[test]
fn inspection_accessors() {
    let evaluator = Evaluator::new();

    assert!(evaluator.base_function_names().contains(&"sin".to_string()));
    assert!(evaluator.command_names().contains(&"clear".to_string()));
    assert!(evaluator.operator_names().contains(&".^"));
    assert!(evaluator.variable_names().contains(&"NaN".to_string()));
}
