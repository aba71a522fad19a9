#[cfg(test)]
mod scanner_tests {
    use rox::error::LoxError;
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    fn assert_token_matches(
        result: &Result<Token, LoxError>,
        expected_type: TokenType,
        expected_lexeme: &str,
    ) {
        match result {
            Ok(token) => {
                assert_eq!(
                    token.token_type, expected_type,
                    "Expected token type {:?}, got {:?}",
                    expected_type, token.token_type
                );
                assert_eq!(
                    token.lexeme, expected_lexeme,
                    "Expected lexeme '{}', got '{}'",
                    expected_lexeme, token.lexeme
                );
            }
            Err(e) => panic!("Expected token but got error: {}", e),
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_operators_and_comments() {
        assert_token_sequence(
            "!= == <= >= ! = < > / // comment until newline\n-",
            &[
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::BANG, "!"),
                (TokenType::EQUAL, "="),
                (TokenType::LESS, "<"),
                (TokenType::GREATER, ">"),
                (TokenType::SLASH, "/"),
                (TokenType::MINUS, "-"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_literals() {
        assert_token_sequence(
            "class fun var break _id2 \"str\" 12.5 7.",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::FUN, "fun"),
                (TokenType::VAR, "var"),
                (TokenType::BREAK, "break"),
                (TokenType::IDENTIFIER, "_id2"),
                (TokenType::STRING(String::new()), "\"str\""),
                (TokenType::NUMBER(0.0), "12.5"),
                (TokenType::NUMBER(0.0), "7"),
                (TokenType::DOT, "."),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let results: Vec<_> = Scanner::new(",.$(#").collect();

        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(|e| e.to_string())
            .collect();

        assert_eq!(
            errors,
            vec![
                "[ 1 ] Error : Unexpected character: $",
                "[ 1 ] Error : Unexpected character: #",
            ]
        );
    }

    #[test]
    fn test_unterminated_string_reports_opening_line() {
        let (tokens, errors) = scan_tokens("print 1;\n\"never\nclosed");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[ 2 ] Error : Unterminated string.");

        let last = tokens.last().expect("EOF token");
        assert_eq!(last.token_type, TokenType::EOF);
        assert_eq!(last.line, 3);
    }

    #[test]
    fn test_every_input_ends_in_eof() {
        for source in ["", "   ", "// only a comment", "@", "\"open", "1.2.3"] {
            let (tokens, _) = scan_tokens(source);
            let last = tokens.last().expect("at least one token");
            assert_eq!(last.token_type, TokenType::EOF, "source {:?}", source);
        }
    }

    #[test]
    fn test_token_dump_format() {
        let (tokens, errors) = scan_tokens("var x = 3; \"hi\" 2.50");
        assert!(errors.is_empty());

        let dump: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        assert_eq!(
            dump,
            vec![
                "VAR var null",
                "IDENTIFIER x null",
                "EQUAL = null",
                "NUMBER 3 3.0",
                "SEMICOLON ; null",
                "STRING \"hi\" hi",
                "NUMBER 2.50 2.5",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_lines_are_counted() {
        let (tokens, _) = scan_tokens("a\n\nb // c\nd");
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 3, 4, 4]);
    }
}
