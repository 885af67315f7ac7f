use std::fmt;

const ESCAPE_ADVICE: &str = "use `$$` to escape a literal `$`";

/// Template expansion error, carrying the byte index of the offending
/// character so the rendered message can point at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpolationError {
    pub input: String,
    pub index: usize,
    pub message: String,
}

impl fmt::Display for InterpolationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "`{}`", self.input)?;
        // The input renders with a leading backtick, so the caret sits one
        // column past the error index.
        writeln!(f, "{caret:>width$}", caret = "^", width = self.index + 2)?;
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for InterpolationError {}

/// Expand a template string. A `$` introduces either `$$` (a literal `$`)
/// or `${IDENT}`, resolved through `lookup`; anything else is an error at
/// that character.
pub fn interpolate<F>(input: &str, mut lookup: F) -> Result<String, InterpolationError>
where
    F: FnMut(&str) -> Result<String, String>,
{
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices();
    while let Some((_, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.next() {
            None => {
                return Err(error(
                    input,
                    input.len() - 1,
                    format!("expected `$` or `{{IDENT}}` after `$`; {ESCAPE_ADVICE}"),
                ));
            }
            Some((_, '$')) => out.push('$'),
            Some((open, '{')) => {
                let ident_start = open + 1;
                let Some(ident_end) = chars.by_ref().find(|(_, c)| *c == '}').map(|(i, _)| i)
                else {
                    return Err(error(
                        input,
                        input.len() - 1,
                        format!("unterminated interpolation, expected `}}`; {ESCAPE_ADVICE}"),
                    ));
                };
                let ident = &input[ident_start..ident_end];
                match lookup(ident) {
                    Ok(value) => out.push_str(&value),
                    Err(reason) => {
                        return Err(error(
                            input,
                            ident_start,
                            format!("invalid interpolation: {reason}"),
                        ));
                    }
                }
            }
            Some((at, other)) => {
                return Err(error(
                    input,
                    at,
                    format!("expected `$` or `{{IDENT}}` after `$`, got `{other}`; {ESCAPE_ADVICE}"),
                ));
            }
        }
    }
    Ok(out)
}

fn error(input: &str, index: usize, message: String) -> InterpolationError {
    InterpolationError { input: input.to_string(), index, message }
}
