use super::ExpressionError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    True,
    False,
    And,
    Or,
    Not,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("identifier '{name}'"),
            Token::Int(value) => format!("number {value}"),
            Token::Float(value) => format!("number {value}"),
            Token::Str(value) => format!("string '{value}'"),
            Token::True => "'true'".to_string(),
            Token::False => "'false'".to_string(),
            Token::And => "'and'".to_string(),
            Token::Or => "'or'".to_string(),
            Token::Not => "'not'".to_string(),
            Token::Lt => "'<'".to_string(),
            Token::Le => "'<='".to_string(),
            Token::Gt => "'>'".to_string(),
            Token::Ge => "'>='".to_string(),
            Token::Eq => "'=='".to_string(),
            Token::Ne => "'!='".to_string(),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
        }
    }
}

/// Returns true when `name` is a bare identifier that is not a reserved word.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .map(|first| first.is_ascii_alphabetic() || first == '_')
        .unwrap_or(false);

    starts_well
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && keyword(name).is_none()
}

fn keyword(word: &str) -> Option<Token> {
    match word {
        "and" => Some(Token::And),
        "or" => Some(Token::Or),
        "not" => Some(Token::Not),
        "true" | "True" => Some(Token::True),
        "false" | "False" => Some(Token::False),
        _ => None,
    }
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ExpressionError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let current = chars[pos];

        if current.is_whitespace() {
            pos += 1;
            continue;
        }

        if current.is_ascii_alphabetic() || current == '_' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            let word: String = chars[start..pos].iter().collect();
            tokens.push(keyword(&word).unwrap_or(Token::Ident(word)));
            continue;
        }

        if current.is_ascii_digit() {
            let (token, next) = lex_number(&chars, pos)?;
            tokens.push(token);
            pos = next;
            continue;
        }

        if current == '\'' || current == '"' {
            let (token, next) = lex_string(&chars, pos)?;
            tokens.push(token);
            pos = next;
            continue;
        }

        let next = chars.get(pos + 1).copied();
        let (token, width) = match (current, next) {
            ('<', Some('=')) => (Token::Le, 2),
            ('>', Some('=')) => (Token::Ge, 2),
            ('=', Some('=')) => (Token::Eq, 2),
            ('!', Some('=')) => (Token::Ne, 2),
            ('&', Some('&')) => (Token::And, 2),
            ('|', Some('|')) => (Token::Or, 2),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('!', _) => (Token::Not, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            (other, _) => {
                return Err(ExpressionError::Unsafe(format!(
                    "unexpected character '{other}' at offset {pos}"
                )))
            }
        };
        tokens.push(token);
        pos += width;
    }

    Ok(tokens)
}

fn lex_number(chars: &[char], start: usize) -> Result<(Token, usize), ExpressionError> {
    let mut pos = start;
    let mut digits = String::new();
    let mut is_float = false;

    while pos < chars.len() {
        let c = chars[pos];
        if c.is_ascii_digit() {
            digits.push(c);
        } else if c == '_' && chars.get(pos + 1).is_some_and(|n| n.is_ascii_digit()) {
            // digit separators, as in 800_000
        } else if c == '.' && !is_float {
            is_float = true;
            digits.push(c);
        } else {
            break;
        }
        pos += 1;
    }

    if chars
        .get(pos)
        .is_some_and(|c| c.is_ascii_alphabetic() || *c == '_')
    {
        return Err(ExpressionError::Unsafe(format!(
            "malformed number literal at offset {start}"
        )));
    }

    let token = if is_float {
        let value = digits.parse::<f64>().map_err(|_| {
            ExpressionError::Unsafe(format!("malformed number literal '{digits}'"))
        })?;
        Token::Float(value)
    } else {
        let value = digits.parse::<i64>().map_err(|_| {
            ExpressionError::Unsafe(format!("integer literal '{digits}' is out of range"))
        })?;
        Token::Int(value)
    };

    Ok((token, pos))
}

fn lex_string(chars: &[char], start: usize) -> Result<(Token, usize), ExpressionError> {
    let quote = chars[start];
    let mut pos = start + 1;
    let mut value = String::new();

    while pos < chars.len() {
        let c = chars[pos];
        if c == quote {
            return Ok((Token::Str(value), pos + 1));
        }
        if c == '\\' {
            let escaped = chars.get(pos + 1).copied().ok_or_else(|| {
                ExpressionError::Unsafe("unterminated escape in string literal".to_string())
            })?;
            match escaped {
                '\\' | '\'' | '"' => value.push(escaped),
                other => {
                    return Err(ExpressionError::Unsafe(format!(
                        "unsupported escape '\\{other}' in string literal"
                    )))
                }
            }
            pos += 2;
            continue;
        }
        value.push(c);
        pos += 1;
    }

    Err(ExpressionError::Unsafe(format!(
        "unterminated string literal starting at offset {start}"
    )))
}
