#[cfg(test)]
mod parser_tests {
    use treelox as lox;

    use lox::ast_printer::AstPrinter;
    use lox::error::{LoxError, ParseErrorKind};
    use lox::parser::Parser;
    use lox::scanner::Scanner;
    use lox::stmt::Stmt;
    use lox::token::Token;

    fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .collect::<Result<Vec<Token>, LoxError>>()
            .expect("test source scans cleanly");

        Parser::new(tokens).parse()
    }

    fn printed(source: &str) -> String {
        let statements = parse(source).expect("test source parses cleanly");

        AstPrinter::print_program(&statements)
    }

    fn error_kinds(source: &str) -> Vec<ParseErrorKind> {
        match parse(source) {
            Ok(_) => panic!("expected parse errors for {:?}", source),

            Err(errors) => errors
                .iter()
                .map(|e| match e {
                    LoxError::Parse { kind, .. } => *kind,
                    other => panic!("unexpected error stratum: {}", other),
                })
                .collect(),
        }
    }

    #[test]
    fn test_parser_01_precedence() {
        assert_eq!(printed("print 1 + 2 * 3;"), "(print (+ 1.0 (* 2.0 3.0)))");
    }

    #[test]
    fn test_parser_02_grouping_unary_comparison() {
        assert_eq!(
            printed("print -(1 + 2) < 3 == true;"),
            "(print (== (< (- (group (+ 1.0 2.0))) 3.0) true))"
        );
    }

    #[test]
    fn test_parser_03_logical_operators() {
        assert_eq!(
            printed("print a or b and c;"),
            "(print (or a (and b c)))"
        );
    }

    #[test]
    fn test_parser_04_assignment_is_right_associative() {
        assert_eq!(printed("a = b = 1;"), "(; (= a (= b 1.0)))");
    }

    #[test]
    fn test_parser_05_assignment_to_property_is_set() {
        assert_eq!(printed("a.b = 1;"), "(; (=. a b 1.0))");
    }

    #[test]
    fn test_parser_06_call_and_property_chain() {
        assert_eq!(
            printed("obj.method(1)(2).field;"),
            "(; (. (call (call (. obj method) 1.0) 2.0) field))"
        );
    }

    #[test]
    fn test_parser_07_for_desugars_to_while() {
        assert_eq!(
            printed("for (var i = 0; i < 3; i = i + 1) print i;"),
            "(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"
        );
    }

    #[test]
    fn test_parser_08_for_with_empty_clauses() {
        // No initializer, no condition (becomes literal true), no increment.
        assert_eq!(printed("for (;;) print 1;"), "(while true (print 1.0))");
    }

    #[test]
    fn test_parser_09_function_declaration() {
        assert_eq!(
            printed("fun add(a, b) { return a + b; }"),
            "(fun add (a b) (return (+ a b)))"
        );
    }

    #[test]
    fn test_parser_10_class_with_superclass_and_method() {
        assert_eq!(
            printed("class A < B { m() { print this; } }"),
            "(class A (< B) (method m () (print this)))"
        );
    }

    #[test]
    fn test_parser_11_super_expression() {
        assert_eq!(
            printed("class A < B { m() { super.m(); } }"),
            "(class A (< B) (method m () (; (call (super m)))))"
        );
    }

    #[test]
    fn test_parser_12_if_else_binds_to_nearest() {
        assert_eq!(
            printed("if (a) if (b) print 1; else print 2;"),
            "(if a (if b (print 1.0) (print 2.0)))"
        );
    }

    #[test]
    fn test_parser_13_invalid_assignment_target() {
        assert_eq!(
            error_kinds("1 = 2;"),
            vec![ParseErrorKind::InvalidAssignTarget]
        );
    }

    #[test]
    fn test_parser_14_missing_semicolons() {
        assert_eq!(
            error_kinds("print 1"),
            vec![ParseErrorKind::MissingValueSemicolon]
        );

        assert_eq!(
            error_kinds("1 + 2"),
            vec![ParseErrorKind::MissingExprSemicolon]
        );

        assert_eq!(
            error_kinds("var a = 1"),
            vec![ParseErrorKind::MissingVarSemicolon]
        );
    }

    #[test]
    fn test_parser_15_missing_parens_and_braces() {
        assert_eq!(
            error_kinds("(1 + 2;"),
            vec![ParseErrorKind::MissingRightParen]
        );

        assert_eq!(
            error_kinds("{ print 1;"),
            vec![ParseErrorKind::MissingRightBrace]
        );

        assert_eq!(
            error_kinds("if true) print 1;"),
            vec![ParseErrorKind::MissingIfLeftParen]
        );

        assert_eq!(
            error_kinds("while (true print 1;"),
            vec![ParseErrorKind::MissingConditionRightParen]
        );
    }

    #[test]
    fn test_parser_16_missing_names() {
        assert_eq!(
            error_kinds("var = 1;"),
            vec![ParseErrorKind::MissingVariableName]
        );

        assert_eq!(
            error_kinds("fun (a) { }"),
            vec![ParseErrorKind::MissingFunctionName]
        );

        assert_eq!(error_kinds("class { }"), vec![ParseErrorKind::MissingClassName]);

        assert_eq!(
            error_kinds("class A < { }"),
            vec![ParseErrorKind::MissingSuperclassName]
        );
    }

    #[test]
    fn test_parser_17_super_errors() {
        assert_eq!(
            error_kinds("class A < B { m() { super; } }"),
            vec![ParseErrorKind::MissingSuperclassDot]
        );

        assert_eq!(
            error_kinds("class A < B { m() { super.; } }"),
            vec![ParseErrorKind::MissingSuperclassMethod]
        );
    }

    #[test]
    fn test_parser_18_missing_expression() {
        assert_eq!(error_kinds("print ;"), vec![ParseErrorKind::MissingExpr]);
    }

    #[test]
    fn test_parser_19_errors_accumulate_across_statements() {
        // One error per bad declaration; parsing resumes at the next
        // statement boundary.
        assert_eq!(
            error_kinds("var = 1;\nprint 1\nvar x = 2;"),
            vec![
                ParseErrorKind::MissingVariableName,
                ParseErrorKind::MissingValueSemicolon,
            ]
        );
    }

    #[test]
    fn test_parser_20_error_location_reports_lexeme_or_end() {
        let errors = parse("var = 1;").unwrap_err();

        match &errors[0] {
            LoxError::Parse { location, line, .. } => {
                assert_eq!(location, "'='");
                assert_eq!(*line, 1);
            }
            other => panic!("unexpected error: {}", other),
        }

        let errors = parse("print 1").unwrap_err();

        match &errors[0] {
            LoxError::Parse { location, .. } => assert_eq!(location, "end"),
            other => panic!("unexpected error: {}", other),
        }
    }
}
