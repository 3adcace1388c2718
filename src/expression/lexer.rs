use super::ExpressionError;

/// A lexical token of an output-variable formula
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Power,
    LeftParen,
    RightParen,
}

/// A token together with the byte offset it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

/// Splits `source` into tokens.
///
/// Identifiers start with an ASCII letter and continue with letters, digits,
/// `_` or `.` (RHESSys variable names such as `cs.leafc` contain dots).
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, ExpressionError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let c = bytes[pos];

        let token = match c {
            b' ' | b'\t' | b'\r' | b'\n' => {
                pos += 1;
                continue;
            }
            b'+' => {
                pos += 1;
                Token::Plus
            }
            b'-' => {
                pos += 1;
                Token::Minus
            }
            b'*' if bytes.get(pos + 1) == Some(&b'*') => {
                pos += 2;
                Token::Power
            }
            b'*' => {
                pos += 1;
                Token::Star
            }
            b'/' => {
                pos += 1;
                Token::Slash
            }
            b'(' => {
                pos += 1;
                Token::LeftParen
            }
            b')' => {
                pos += 1;
                Token::RightParen
            }
            c if c.is_ascii_alphabetic() => {
                while pos < bytes.len() && is_identifier_byte(bytes[pos]) {
                    pos += 1;
                }
                Token::Identifier(source[start..pos].to_string())
            }
            c if c.is_ascii_digit() || c == b'.' => {
                pos = scan_number(bytes, pos);
                let text = &source[start..pos];
                let value = text.parse::<f64>().map_err(|_| ExpressionError::InvalidNumber {
                    offset: start,
                    text: text.to_string(),
                })?;
                Token::Number(value)
            }
            _ => {
                let found = source[start..].chars().next().unwrap_or('?');
                return Err(ExpressionError::UnexpectedCharacter {
                    offset: start,
                    found,
                });
            }
        };

        tokens.push(Spanned {
            token,
            offset: start,
        });
    }

    Ok(tokens)
}

fn is_identifier_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'.'
}

/// Returns the end of the numeric literal starting at `pos`.
fn scan_number(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'.') {
        pos += 1;
    }

    // Exponent, only when followed by digits
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut exp = pos + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            while exp < bytes.len() && bytes[exp].is_ascii_digit() {
                exp += 1;
            }
            pos = exp;
        }
    }

    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn splits_operators_and_identifiers() {
        assert_eq!(
            tokens("trans_sat + trans_unsat"),
            vec![
                Token::Identifier("trans_sat".into()),
                Token::Plus,
                Token::Identifier("trans_unsat".into()),
            ]
        );
    }

    #[test]
    fn double_star_is_power() {
        assert_eq!(
            tokens("a**2*b"),
            vec![
                Token::Identifier("a".into()),
                Token::Power,
                Token::Number(2.0),
                Token::Star,
                Token::Identifier("b".into()),
            ]
        );
    }

    #[test]
    fn dotted_identifiers_stay_whole() {
        assert_eq!(
            tokens("cs.leafc/(1+x)"),
            vec![
                Token::Identifier("cs.leafc".into()),
                Token::Slash,
                Token::LeftParen,
                Token::Number(1.0),
                Token::Plus,
                Token::Identifier("x".into()),
                Token::RightParen,
            ]
        );
    }

    #[rstest]
    #[case("12", 12.0)]
    #[case("1.5", 1.5)]
    #[case(".25", 0.25)]
    #[case("2e-3", 0.002)]
    #[case("1E2", 100.0)]
    fn numbers(#[case] source: &str, #[case] expected: f64) {
        assert_eq!(tokens(source), vec![Token::Number(expected)]);
    }

    #[test]
    fn exponent_without_digits_is_not_consumed() {
        // "2e" lexes as the number 2 followed by identifier "e"
        assert_eq!(
            tokens("2e"),
            vec![Token::Number(2.0), Token::Identifier("e".into())]
        );
    }

    #[rstest]
    #[case("a; b", 1, ';')]
    #[case("__import__", 0, '_')]
    #[case("a % b", 2, '%')]
    fn rejects_unknown_characters(#[case] source: &str, #[case] offset: usize, #[case] found: char) {
        let err = tokenize(source).unwrap_err();
        assert_eq!(err, ExpressionError::UnexpectedCharacter { offset, found });
    }

    #[test]
    fn malformed_number_is_reported() {
        let err = tokenize("1.2.3").unwrap_err();
        assert!(matches!(err, ExpressionError::InvalidNumber { offset: 0, .. }));
    }
}
