use std::fmt;

use crate::errors::{Error, Result};

/// Whether an option takes a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueArity {
    /// The option takes no value. Derived from a prototype with neither
    /// `=` nor `:`.
    None,
    /// The option may take a value from the same argument, but never
    /// consumes the following one. Derived from `:`.
    Optional,
    /// The option must be given a value, inline or as the following
    /// argument. Derived from `=`.
    Required,
}

/// One compiled option: the canonical form of a prototype string.
///
/// Holds the alias names with their type and separator syntax stripped,
/// the derived [`ValueArity`], the maximum number of values and the
/// separators used to split them. Compilation is a pure function of the
/// prototype text and the value count; everything that can be rejected is
/// rejected here, never at parse time.
#[derive(Clone, Debug)]
pub struct Opt {
    prototype: String,
    description: String,
    names: Vec<String>,
    arity: ValueArity,
    max_values: usize,
    separators: Option<Vec<String>>,
}

impl Opt {
    /// Compiles `prototype` into an `Opt` accepting up to `max_values`
    /// values.
    ///
    /// `max_values` must be `0` only for options taking no value, and may
    /// exceed `1` only for options that take one. See the crate
    /// documentation for the prototype grammar.
    pub fn new(prototype: &str, description: &str, max_values: usize) -> Result<Opt> {
        if prototype.is_empty() {
            return Err(Error::Prototype(
                "prototype cannot be the empty string".into(),
            ));
        }
        let mut names: Vec<String> =
            prototype.split('|').map(str::to_owned).collect();
        let mut arity_char: Option<char> = None;
        let mut seps: Vec<String> = Vec::new();
        for name in &mut names {
            if name.is_empty() {
                return Err(Error::Prototype(format!(
                    "empty option name in prototype \"{}\"",
                    prototype
                )));
            }
            let end = match name.find(|c: char| c == '=' || c == ':') {
                None => continue,
                Some(end) => end,
            };
            let term = name.as_bytes()[end] as char;
            match arity_char {
                None => arity_char = Some(term),
                Some(t) if t == term => {}
                Some(t) => {
                    return Err(Error::Prototype(format!(
                        "conflicting option types '{}' and '{}' in \
                         prototype \"{}\"",
                        t, term, prototype
                    )))
                }
            }
            parse_separators(&name[end + 1..], &name[..], &mut seps)?;
            name.truncate(end);
        }
        let arity = match arity_char {
            None => ValueArity::None,
            Some('=') => ValueArity::Required,
            Some(_) => ValueArity::Optional,
        };
        if max_values == 0 && arity != ValueArity::None {
            return Err(Error::Prototype(format!(
                "cannot accept 0 values for an option that takes one: \
                 \"{}\"",
                prototype
            )));
        }
        if arity == ValueArity::None && max_values > 1 {
            return Err(Error::Prototype(format!(
                "cannot accept {} values for an option that takes none: \
                 \"{}\"",
                max_values, prototype
            )));
        }
        if names.iter().any(|n| n == "<>")
            && ((names.len() == 1 && arity != ValueArity::None)
                || (names.len() > 1 && max_values > 1))
        {
            return Err(Error::Prototype(
                "the default option handler '<>' cannot require values"
                    .into(),
            ));
        }
        let separators = if max_values <= 1 {
            if !seps.is_empty() {
                return Err(Error::Prototype(format!(
                    "cannot provide key/value separators for an option \
                     taking {} value(s): \"{}\"",
                    max_values, prototype
                )));
            }
            None
        } else if seps.is_empty() {
            Some(vec![":".to_owned(), "=".to_owned()])
        } else if seps.len() == 1 && seps[0].is_empty() {
            // The `{}` sentinel: no splitting, one value per argument.
            None
        } else {
            Some(seps)
        };
        Ok(Opt {
            prototype: prototype.to_owned(),
            description: description.to_owned(),
            names,
            arity,
            max_values,
            separators,
        })
    }

    /// The prototype this option was compiled from, verbatim.
    pub fn prototype(&self) -> &str {
        &self.prototype
    }

    /// The description used when rendering option help.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The alias names, in prototype order, stripped of type and
    /// separator syntax.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether this option takes a value.
    pub fn arity(&self) -> ValueArity {
        self.arity
    }

    /// The maximum number of values this option accepts.
    pub fn max_values(&self) -> usize {
        self.max_values
    }

    /// The separators used to split a raw value, or `None` when values
    /// are not split (options taking at most one value, and multi-value
    /// options declared with the `{}` sentinel).
    pub fn separators(&self) -> Option<&[String]> {
        self.separators.as_deref()
    }

    /// True for the `<>` handler invoked on arguments that are not
    /// option-shaped.
    pub fn is_default(&self) -> bool {
        self.names.iter().any(|n| n == "<>")
    }
}

impl fmt::Display for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prototype)
    }
}

/// Collects the separator syntax following an alias's type character.
/// Plain characters each yield a one-character separator; a `{...}` group
/// yields its contents verbatim, possibly empty.
fn parse_separators(rest: &str, name: &str, seps: &mut Vec<String>) -> Result<()> {
    let ill_formed = || {
        Error::Prototype(format!(
            "ill-formed name/value separator in \"{}\"",
            name
        ))
    };
    let mut start: Option<usize> = None;
    for (i, ch) in rest.char_indices() {
        match ch {
            '{' => {
                if start.is_some() {
                    return Err(ill_formed());
                }
                start = Some(i + 1);
            }
            '}' => match start.take() {
                None => return Err(ill_formed()),
                Some(s) => seps.push(rest[s..i].to_owned()),
            },
            _ => {
                if start.is_none() {
                    seps.push(ch.to_string());
                }
            }
        }
    }
    if start.is_some() {
        return Err(ill_formed());
    }
    Ok(())
}
