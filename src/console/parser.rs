// Command line parsing - shell-style tokens and the dotted call syntax
//
// `User.update("1234", "name", "Betty")` is rewritten to
// `update User 1234 "name" "Betty"` before dispatch. Anything that does not
// look like a well-formed dotted call is passed through unchanged.

/// Verbs reachable through `<Class>.<verb>(...)`
pub const DOT_COMMANDS: [&str; 5] = ["all", "count", "show", "destroy", "update"];

/// Split off the first shell-style token.
///
/// Whitespace separates tokens; single or double quotes group text (quotes
/// may appear mid-token, as in `name="My house"`); a backslash escapes the
/// next character outside single quotes. An unterminated quote runs to the
/// end of the input. Returns the token and the unparsed remainder.
pub fn next_token(input: &str) -> Option<(String, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }

    let mut token = String::new();
    let mut quote: Option<char> = None;
    let mut chars = input.char_indices();

    while let Some((idx, c)) = chars.next() {
        match (quote, c) {
            (None, c) if c.is_whitespace() => return Some((token, &input[idx..])),
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (Some('\''), c) => token.push(c),
            (_, '\\') => match chars.next() {
                Some((_, escaped)) => token.push(escaped),
                None => token.push('\\'),
            },
            (_, c) => token.push(c),
        }
    }

    Some((token, ""))
}

/// Split a whole argument string into tokens.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = input;
    while let Some((token, remainder)) = next_token(rest) {
        tokens.push(token);
        rest = remainder;
    }
    tokens
}

/// Split a command line into its verb and the raw argument text.
pub fn split_command(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.find(char::is_whitespace) {
        Some(idx) => (&line[..idx], line[idx..].trim_start()),
        None => (line, ""),
    }
}

/// Rewrite `<Class>.<verb>(<args>)` into `<verb> <Class> <args>`.
pub fn rewrite_dotted(line: &str) -> String {
    match parse_dotted(line.trim()) {
        Some(rewritten) => rewritten,
        None => line.to_string(),
    }
}

fn parse_dotted(line: &str) -> Option<String> {
    let dot = line.find('.')?;
    let open = line.find('(')?;
    let close = line.rfind(')')?;
    if !(dot < open && open < close) {
        return None;
    }

    let class = &line[..dot];
    if class.is_empty() || class.contains(char::is_whitespace) {
        return None;
    }

    let verb = &line[dot + 1..open];
    if !DOT_COMMANDS.contains(&verb) {
        return None;
    }

    let inner = line[open + 1..close].trim();
    let mut parts = vec![verb.to_string(), class.to_string()];

    if !inner.is_empty() {
        let (id, rest) = match inner.split_once(',') {
            Some((id, rest)) => (id, rest.trim()),
            None => (inner, ""),
        };
        parts.push(id.trim().replace('"', ""));

        if !rest.is_empty() {
            if rest.starts_with('{') && rest.ends_with('}') {
                parts.push(rest.to_string());
            } else {
                parts.push(rest.replace(',', ""));
            }
        }
    }

    Some(parts.join(" "))
}
