//! Console line tokenizer.
//!
//! Turns a raw line into the token vector [`CommandTree::run`] expects.
//!
//! [`CommandTree::run`]: super::CommandTree::run

/// Failure to split a line into tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    #[error("unterminated string starting at position {position}")]
    UnterminatedString { position: usize },
}

/// Split a line into tokens.
///
/// - Tokens are separated by whitespace
/// - Single or double quotes group text, including whitespace
/// - A backslash escapes the next character; it is removed from the token
/// - `//` at the start of a token comments out the rest of the line
///
/// A blank line yields no tokens.
///
/// # Examples
///
/// ```
/// use bevy_command_tree::tokenize;
///
/// assert_eq!(tokenize("aim fov 90").unwrap(), ["aim", "fov", "90"]);
/// assert_eq!(tokenize(r#"say "hello world""#).unwrap(), ["say", "hello world"]);
/// assert_eq!(tokenize(r#"say "a \"quote\"""#).unwrap(), ["say", r#"a "quote""#]);
/// assert!(tokenize("  // nothing here").unwrap().is_empty());
/// ```
pub fn tokenize(input: &str) -> Result<Vec<String>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // Set once the current token has content, so `""` still yields a token
    let mut in_token = false;
    let mut chars = input.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '/' if !in_token && matches!(chars.peek(), Some((_, '/'))) => break,
            '"' | '\'' => {
                let quote = c;
                in_token = true;
                loop {
                    match chars.next() {
                        Some((_, ch)) if ch == quote => break,
                        Some((_, '\\')) => {
                            if let Some((_, escaped)) = chars.next() {
                                current.push(escaped);
                            }
                        }
                        Some((_, ch)) => current.push(ch),
                        None => return Err(TokenizeError::UnterminatedString { position }),
                    }
                }
            }
            '\\' => {
                in_token = true;
                if let Some((_, escaped)) = chars.next() {
                    current.push(escaped);
                }
            }
            _ => {
                in_token = true;
                current.push(c);
            }
        }
    }

    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Split a line on `;` into separate statements.
///
/// Semicolons inside quotes, or escaped with a backslash, do not split.
/// Empty statements are dropped.
///
/// # Examples
///
/// ```
/// use bevy_command_tree::split_commands;
///
/// assert_eq!(split_commands("aim on; esp off"), ["aim on", "esp off"]);
/// assert_eq!(split_commands(r#"say "a; b"; quit"#), [r#"say "a; b""#, "quit"]);
/// ```
pub fn split_commands(input: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (c, quote) {
            ('\\', _) => escaped = true,
            ('"' | '\'', None) => quote = Some(c),
            (c, Some(open)) if c == open => quote = None,
            (';', None) => {
                statements.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    statements.push(&input[start..]);

    statements
        .into_iter()
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .collect()
}
