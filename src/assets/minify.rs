//! Built-in minifiers.

/// Strip comments and redundant whitespace from a stylesheet. String
/// literals are copied verbatim.
pub fn minify_css(input: &str) -> Result<String, String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut pending_space = false;
    // One entry per open block: `true` when it holds declarations.
    let mut blocks: Vec<bool> = Vec::new();
    let mut prelude_start = 0;

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                flush_space(&mut out, &mut pending_space, c, false);
                out.push(c);
                let mut closed = false;
                while let Some(s) = chars.next() {
                    out.push(s);
                    if s == '\\' {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    } else if s == c {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err("unterminated string".to_string());
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                let mut closed = false;
                for s in chars.by_ref() {
                    if prev == '*' && s == '/' {
                        closed = true;
                        break;
                    }
                    prev = s;
                }
                if !closed {
                    return Err("unterminated comment".to_string());
                }
                pending_space = true;
            }
            c if c.is_whitespace() => pending_space = true,
            c => {
                let in_declarations = blocks.last().copied().unwrap_or(false);
                flush_space(&mut out, &mut pending_space, c, in_declarations);
                match c {
                    '{' => blocks.push(!holds_rules(&out[prelude_start..])),
                    '}' => {
                        blocks.pop();
                        if out.ends_with(';') {
                            out.pop();
                        }
                    }
                    _ => {}
                }
                out.push(c);
                if matches!(c, '{' | '}' | ';') {
                    prelude_start = out.len();
                }
            }
        }
    }
    Ok(out)
}

/// Whether a block opened after `prelude` contains rules rather than
/// declarations.
fn holds_rules(prelude: &str) -> bool {
    let prelude = prelude.trim_start();
    ["@media", "@supports", "@container", "@layer", "@document"]
        .iter()
        .any(|at_rule| prelude.starts_with(at_rule))
}

/// Emit a pending space unless it is redundant next to punctuation. Inside
/// declarations the space before `:` is redundant too; in selectors it is a
/// descendant combinator.
fn flush_space(out: &mut String, pending: &mut bool, next: char, in_declarations: bool) {
    if !*pending {
        return;
    }
    *pending = false;
    let Some(last) = out.chars().last() else {
        return;
    };
    if matches!(last, '{' | '}' | ';' | ',' | '>' | ':' | '(') || matches!(next, '{' | '}' | ';' | ',' | '>' | ')') {
        return;
    }
    if in_declarations && next == ':' {
        return;
    }
    out.push(' ');
}

/// Lexical state carried from one line of a script to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JsMode {
    Code,
    Quoted(char),
    Template,
    LineComment,
    BlockComment,
}

#[derive(Debug)]
struct JsScanner {
    mode: JsMode,
    /// Brace depth inside each open `${ }` substitution.
    substitutions: Vec<usize>,
}

impl JsScanner {
    fn new() -> Self {
        Self {
            mode: JsMode::Code,
            substitutions: Vec::new(),
        }
    }

    fn in_template(&self) -> bool {
        self.mode == JsMode::Template
    }

    /// Advance over one line, without its terminator.
    fn scan_line(&mut self, line: &str) {
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            match self.mode {
                JsMode::Code => match c {
                    '"' | '\'' => self.mode = JsMode::Quoted(c),
                    '`' => self.mode = JsMode::Template,
                    '/' if chars.peek() == Some(&'/') => self.mode = JsMode::LineComment,
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        self.mode = JsMode::BlockComment;
                    }
                    '{' => {
                        if let Some(depth) = self.substitutions.last_mut() {
                            *depth += 1;
                        }
                    }
                    '}' => match self.substitutions.last_mut() {
                        Some(0) => {
                            self.substitutions.pop();
                            self.mode = JsMode::Template;
                        }
                        Some(depth) => *depth -= 1,
                        None => {}
                    },
                    _ => {}
                },
                JsMode::Quoted(quote) => match c {
                    '\\' => {
                        chars.next();
                    }
                    c if c == quote => self.mode = JsMode::Code,
                    _ => {}
                },
                JsMode::Template => match c {
                    '\\' => {
                        chars.next();
                    }
                    '`' => self.mode = JsMode::Code,
                    '$' if chars.peek() == Some(&'{') => {
                        chars.next();
                        self.substitutions.push(0);
                        self.mode = JsMode::Code;
                    }
                    _ => {}
                },
                JsMode::BlockComment => {
                    if c == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        self.mode = JsMode::Code;
                    }
                }
                JsMode::LineComment => break,
            }
        }
        // Plain strings and line comments end with the line.
        if matches!(self.mode, JsMode::Quoted(_) | JsMode::LineComment) {
            self.mode = JsMode::Code;
        }
    }
}

/// Drop blank lines and trailing whitespace. Lines inside template literals
/// are kept verbatim; code is never rewritten.
pub fn trim_js(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut scanner = JsScanner::new();
    for line in input.lines() {
        let starts_in_template = scanner.in_template();
        scanner.scan_line(line);
        // Trailing whitespace of a line ending inside a literal is content.
        let kept = if scanner.in_template() { line } else { line.trim_end() };
        if !kept.is_empty() || starts_in_template {
            out.push_str(kept);
            out.push('\n');
        }
    }
    out
}
