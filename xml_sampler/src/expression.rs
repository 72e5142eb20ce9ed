//! Parser for `{{ function(args) | scope }}` placeholders.
//!
//! Text outside placeholders is left alone. Argument text is opaque to the
//! parser: quotes and parentheses are only tracked so that a `|` or `)` inside
//! an argument is not mistaken for structure.

use std::fmt;

/// Cache lifetime requested by a placeholder modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Cached until the next schema file
    Local,
    /// Cached for the whole run
    Global,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Local => f.write_str("local"),
            Scope::Global => f.write_str("global"),
        }
    }
}

/// One `{{ ... }}` unit; `start..end` is its byte span in the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub start: usize,
    pub end: usize,
    pub function: String,
    pub argument: Option<String>,
    pub modifier: Option<Scope>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxErrorKind {
    #[error("placeholder is empty")]
    EmptyPlaceholder,
    #[error("function name is missing")]
    MissingFunction,
    #[error("unexpected text after function name '{0}'")]
    TextAfterFunction(String),
    #[error("unexpected text after arguments")]
    TextAfterArguments,
    #[error("arguments must start with '('")]
    ArgumentsStart,
    #[error("missing closing ')' for placeholder")]
    MissingClosingParenthesis,
    #[error("unexpected ')'")]
    UnexpectedClosingParenthesis,
    #[error("unterminated quote in placeholder")]
    UnterminatedQuote,
    #[error("missing closing '}}}}'")]
    MissingClosingBraces,
    #[error("modifier is empty")]
    EmptyModifier,
    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Failed to parse expression: {expression}: {kind} at position {position}")]
pub struct ExpressionSyntaxError {
    pub expression: String,
    pub position: usize,
    pub kind: SyntaxErrorKind,
}

impl ExpressionSyntaxError {
    fn new(expression: &str, position: usize, kind: SyntaxErrorKind) -> Self {
        ExpressionSyntaxError {
            expression: expression.to_string(),
            position: position.min(expression.len()),
            kind,
        }
    }

    pub fn description(&self) -> String {
        self.kind.to_string()
    }
}

/// Extract every placeholder of `expression` in order of appearance.
pub fn parse_placeholders(expression: &str) -> Result<Vec<Placeholder>, ExpressionSyntaxError> {
    let mut placeholders = vec![];
    let mut cursor = 0;

    while let Some(offset) = expression[cursor..].find("{{") {
        let start = cursor + offset;
        let Some(close) = expression[start + 2..].find("}}") else {
            return Err(ExpressionSyntaxError::new(
                expression,
                expression.len(),
                SyntaxErrorKind::MissingClosingBraces,
            ));
        };
        let end = start + 2 + close;

        let parser = PlaceholderParser { start };
        let (function, argument, modifier) = parser
            .parse(&expression[start + 2..end])
            .map_err(|(position, kind)| ExpressionSyntaxError::new(expression, position, kind))?;

        placeholders.push(Placeholder {
            start,
            end: end + 2,
            function,
            argument,
            modifier,
        });
        cursor = end + 2;
    }

    Ok(placeholders)
}

type ParseResult<T> = Result<T, (usize, SyntaxErrorKind)>;

/// Parses the text between `{{` and `}}`. Positions reported in errors are
/// absolute offsets into the full template.
struct PlaceholderParser {
    /// Offset of the opening `{{`
    start: usize,
}

impl PlaceholderParser {
    fn parse(&self, inner: &str) -> ParseResult<(String, Option<String>, Option<Scope>)> {
        let inner_start = self.start + 2;
        let text = inner.trim();
        if text.is_empty() {
            return Err((inner_start, SyntaxErrorKind::EmptyPlaceholder));
        }

        let text_offset = inner_start + leading_whitespace(inner);
        let (call, modifier) = self.split_modifier(text, text_offset)?;
        let (function, argument) = self.parse_call(call, text_offset)?;

        let modifier = match modifier {
            None => None,
            Some((modifier, offset)) => Some(parse_scope(modifier.trim(), offset)?),
        };

        Ok((function, argument, modifier))
    }

    /// Split at the first `|` outside quotes and parentheses.
    fn split_modifier<'t>(
        &self,
        text: &'t str,
        offset: usize,
    ) -> ParseResult<(&'t str, Option<(&'t str, usize)>)> {
        let bytes = text.as_bytes();
        let mut depth = 0usize;
        let mut quote = None;
        let mut i = 0;

        while i < bytes.len() {
            let ch = bytes[i];
            if let Some(open) = quote {
                if ch == b'\\' {
                    i += 2;
                    continue;
                }
                if ch == open {
                    quote = None;
                }
                i += 1;
                continue;
            }

            match ch {
                b'"' | b'\'' => quote = Some(ch),
                b'(' => depth += 1,
                b')' => {
                    if depth == 0 {
                        return Err((offset + i, SyntaxErrorKind::UnexpectedClosingParenthesis));
                    }
                    depth -= 1;
                }
                b'|' => {
                    self.verify_balanced(depth, quote)?;
                    return Ok((&text[..i], Some((&text[i + 1..], offset + i + 1))));
                }
                _ => {}
            }
            i += 1;
        }

        self.verify_balanced(depth, quote)?;
        Ok((text, None))
    }

    fn parse_call(&self, text: &str, offset: usize) -> ParseResult<(String, Option<String>)> {
        let call = text.trim();
        let call_offset = offset + leading_whitespace(text);
        if call.is_empty() {
            return Err((call_offset, SyntaxErrorKind::MissingFunction));
        }

        let name_end = call
            .find(|ch: char| ch.is_whitespace() || ch == '(')
            .unwrap_or(call.len());
        let function = &call[..name_end];

        let remainder = &call[name_end..];
        if remainder.is_empty() {
            return Ok((function.to_string(), None));
        }

        let arguments = remainder.trim_start();
        let arguments_offset = call_offset + name_end + leading_whitespace(remainder);
        if !arguments.starts_with('(') {
            return Err((
                arguments_offset,
                SyntaxErrorKind::TextAfterFunction(function.to_string()),
            ));
        }

        let (argument, rest, rest_offset) = self.extract_arguments(arguments, arguments_offset)?;
        if !rest.trim().is_empty() {
            return Err((
                rest_offset + leading_whitespace(rest),
                SyntaxErrorKind::TextAfterArguments,
            ));
        }

        Ok((function.to_string(), Some(argument.trim().to_string())))
    }

    /// Split `(args) rest` at the parenthesis matching the opening one.
    fn extract_arguments<'t>(
        &self,
        text: &'t str,
        offset: usize,
    ) -> ParseResult<(&'t str, &'t str, usize)> {
        let bytes = text.as_bytes();
        if bytes.first() != Some(&b'(') {
            return Err((offset, SyntaxErrorKind::ArgumentsStart));
        }

        let mut depth = 1usize;
        let mut quote = None;
        let mut i = 1;

        while i < bytes.len() {
            let ch = bytes[i];
            if let Some(open) = quote {
                if ch == b'\\' {
                    i += 2;
                    continue;
                }
                if ch == open {
                    quote = None;
                }
            } else {
                match ch {
                    b'"' | b'\'' => quote = Some(ch),
                    b'(' => depth += 1,
                    b')' => {
                        depth -= 1;
                        if depth == 0 {
                            return Ok((&text[1..i], &text[i + 1..], offset + i + 1));
                        }
                    }
                    _ => {}
                }
            }
            i += 1;
        }

        Err((self.start, SyntaxErrorKind::MissingClosingParenthesis))
    }

    fn verify_balanced(&self, depth: usize, quote: Option<u8>) -> ParseResult<()> {
        if depth != 0 {
            return Err((self.start, SyntaxErrorKind::MissingClosingParenthesis));
        }
        if quote.is_some() {
            return Err((self.start, SyntaxErrorKind::UnterminatedQuote));
        }

        Ok(())
    }
}

fn parse_scope(modifier: &str, offset: usize) -> ParseResult<Scope> {
    match modifier {
        "" => Err((offset, SyntaxErrorKind::EmptyModifier)),
        "local" => Ok(Scope::Local),
        "global" => Ok(Scope::Global),
        other => Err((offset, SyntaxErrorKind::UnknownModifier(other.to_string()))),
    }
}

fn leading_whitespace(text: &str) -> usize {
    text.len() - text.trim_start().len()
}
