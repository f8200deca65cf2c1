use cadre_core::{CadreError, CadreResult};

/// A prompt with positional placeholders.
///
/// `{0}`, `{1}`, ... refer to inputs by index and `{}` takes the next one in
/// order. `{{` and `}}` produce literal braces. Unused inputs are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Wrap a template string. Placeholders are checked at render time.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute `inputs` into the template.
    pub fn render<S: AsRef<str>>(&self, inputs: &[S]) -> CadreResult<String> {
        let mut out = String::with_capacity(self.template.len());
        let mut chars = self.template.chars().peekable();
        let mut next_auto = 0;

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut field = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => field.push(ch),
                            None => {
                                return Err(CadreError::Config(format!(
                                    "Unclosed placeholder in template: {{{field}"
                                )))
                            }
                        }
                    }
                    let index = if field.is_empty() {
                        next_auto += 1;
                        next_auto - 1
                    } else {
                        field.trim().parse::<usize>().map_err(|_| {
                            CadreError::Config(format!("Invalid placeholder {{{field}}}"))
                        })?
                    };
                    let input = inputs.get(index).ok_or_else(|| {
                        CadreError::Config(format!(
                            "Mismatch between placeholders and inputs: {{{index}}} with {} input(s)",
                            inputs.len()
                        ))
                    })?;
                    out.push_str(input.as_ref());
                }
                '}' => {
                    return Err(CadreError::Config(
                        "Single '}' encountered in template".to_string(),
                    ))
                }
                other => out.push(other),
            }
        }

        Ok(out)
    }
}
