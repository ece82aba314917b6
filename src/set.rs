use std::fmt;
use std::io::{self, Write};
use std::result;
use std::str::FromStr;

use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use strsim::levenshtein;

use crate::errors::{Error, Result};
use crate::opt::{Opt, ValueArity};
use crate::registry::Registry;

// Message templates run through the localizer before the numbered
// placeholders are substituted.
const MSG_MISSING_VALUE: &str = "Missing required value for option '{0}'.";
const MSG_TOO_MANY_VALUES: &str =
    "Error: Found {0} option values when expecting {1}.";
const MSG_CONVERT: &str =
    "Could not convert string `{0}' to type {1} for option `{2}'.";
const MSG_NO_VALUE: &str = "Option '{0}' does not take a value.";

// Splits an option token into indicator, name and inline value. The name
// runs to the first `=` or `:`. `/`-prefixed tokens never get here; they
// are split without a regex because their remainder is all name.
static OPTION_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(?P<flag>--|-)(?P<name>[^:=]+)(?:[:=](?P<value>.*))?$")
        .unwrap()
});

/// Column where option descriptions start in help output.
const OPTION_WIDTH: usize = 29;
/// Total width help output is wrapped to.
const LINE_WIDTH: usize = 80;

/// The action bound to an option, tagged by the shape of value list it
/// receives. A single variant per shape instead of one type per arity.
enum Action<'a> {
    /// No formal values. Receives whether the option was enabled, which
    /// is false only for an explicit trailing `-` toggle.
    Flag(Box<dyn FnMut(bool) + 'a>),
    /// At most one value. Typed registrations convert here and report
    /// what failed; the matcher turns that into the full parse error.
    Value(Box<dyn FnMut(Option<&str>) -> result::Result<(), ConvertFailed> + 'a>),
    /// Up to `max_values` values.
    Values(Box<dyn FnMut(&[String]) + 'a>),
}

/// A failed string-to-typed-value conversion, minus the context only the
/// matcher knows.
struct ConvertFailed {
    value: String,
    type_name: &'static str,
}

struct Entry<'a> {
    opt: Opt,
    action: Action<'a>,
}

/// Scratch state for one matched option occurrence: the option name as it
/// appeared on the command line and the values collected for it. Built,
/// handed to the action, then dropped; nothing survives across tokens.
struct Context {
    name: String,
    values: Vec<String>,
}

/// An option token split into its parts.
struct Parts<'t> {
    flag: &'t str,
    name: &'t str,
    value: Option<&'t str>,
}

/// A set of options bound to actions, with the parser that drives them.
///
/// Options are registered with [`add`](OptionSet::add) and friends, each
/// taking a prototype string, a description for help output and a
/// callback. [`parse`](OptionSet::parse) then walks an argument vector,
/// invoking callbacks left to right and returning the arguments it did
/// not consume.
///
/// The lifetime parameter lets callbacks borrow from the caller:
///
/// ```
/// use optset::OptionSet;
///
/// let mut workers = 1usize;
/// let mut opts = OptionSet::new();
/// opts.add_parsed("j|jobs=", "Number of jobs.", |n| {
///     workers = n.unwrap();
/// }).unwrap();
/// opts.parse(["-j", "4"]).unwrap();
/// drop(opts);
/// assert_eq!(workers, 4);
/// ```
pub struct OptionSet<'a> {
    registry: Registry<Entry<'a>>,
    localizer: Box<dyn Fn(&str) -> String + 'a>,
}

impl<'a> OptionSet<'a> {
    /// Creates an empty option set.
    pub fn new() -> OptionSet<'a> {
        OptionSet {
            registry: Registry::new(),
            localizer: Box::new(|msg| msg.to_owned()),
        }
    }

    /// Replaces the message localizer.
    ///
    /// Every parse-time message template is passed through it before its
    /// placeholders are filled in, so translations can reorder them. The
    /// default localizer is the identity.
    pub fn with_localizer<F>(mut self, localizer: F) -> OptionSet<'a>
    where
        F: Fn(&str) -> String + 'a,
    {
        self.localizer = Box::new(localizer);
        self
    }

    /// Registers an option taking at most one value.
    ///
    /// The action receives the extracted value, or `None` when an
    /// optional value was omitted. For an option that takes no value it
    /// receives the matched name when enabled and `None` when disabled
    /// with a trailing `-`.
    pub fn add<F>(
        &mut self,
        prototype: &str,
        description: &str,
        mut action: F,
    ) -> Result<&mut Self>
    where
        F: FnMut(Option<&str>) + 'a,
    {
        self.register(
            Opt::new(prototype, description, 1)?,
            Action::Value(Box::new(move |v| {
                action(v);
                Ok(())
            })),
        )
    }

    /// Registers an option taking no value. The action receives `true`
    /// unless the option was disabled with a trailing `-`.
    pub fn add_flag<F>(
        &mut self,
        prototype: &str,
        description: &str,
        action: F,
    ) -> Result<&mut Self>
    where
        F: FnMut(bool) + 'a,
    {
        self.register(
            Opt::new(prototype, description, 0)?,
            Action::Flag(Box::new(action)),
        )
    }

    /// Registers an option taking up to `max_values` values, split on the
    /// prototype's separators.
    pub fn add_multi<F>(
        &mut self,
        prototype: &str,
        description: &str,
        max_values: usize,
        action: F,
    ) -> Result<&mut Self>
    where
        F: FnMut(&[String]) + 'a,
    {
        self.register(
            Opt::new(prototype, description, max_values)?,
            Action::Values(Box::new(action)),
        )
    }

    /// Registers an option taking at most one value, converted to `T`
    /// before the action sees it.
    ///
    /// The converter is resolved here, at registration time; a value that
    /// fails to convert aborts the parse with an error naming the value,
    /// the target type and the option.
    pub fn add_parsed<T, F>(
        &mut self,
        prototype: &str,
        description: &str,
        mut action: F,
    ) -> Result<&mut Self>
    where
        T: FromStr,
        F: FnMut(Option<T>) + 'a,
    {
        self.register(
            Opt::new(prototype, description, 1)?,
            Action::Value(Box::new(move |raw| match raw {
                None => {
                    action(None);
                    Ok(())
                }
                Some(s) => match s.parse::<T>() {
                    Ok(v) => {
                        action(Some(v));
                        Ok(())
                    }
                    Err(_) => Err(ConvertFailed {
                        value: s.to_owned(),
                        type_name: short_type_name::<T>(),
                    }),
                },
            })),
        )
    }

    fn register(&mut self, opt: Opt, action: Action<'a>) -> Result<&mut Self> {
        trace!("registering option \"{}\"", opt);
        let names = opt.names().to_vec();
        self.registry
            .insert(&names, Entry { opt, action })
            .map_err(Error::Duplicate)?;
        Ok(self)
    }

    /// The registered options, in registration order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Opt> + '_> {
        Box::new(self.registry.values().map(|entry| &entry.opt))
    }

    /// Parses the process argument vector, skipping the program name.
    pub fn parse_env(&mut self) -> Result<Vec<String>> {
        self.parse(std::env::args().skip(1))
    }

    /// Parses an argument vector, invoking the action of every recognized
    /// option and returning the arguments that were neither matched nor
    /// consumed as values, in their original order.
    ///
    /// Processing stops at a literal `--`; it and all following arguments
    /// are returned verbatim. An error aborts the parse immediately, but
    /// actions already invoked stay invoked.
    pub fn parse<I, S>(&mut self, args: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> =
            args.into_iter().map(|s| s.as_ref().to_owned()).collect();
        let mut unrecognized = Vec::new();
        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];
            if arg.as_str() == "--" {
                unrecognized.extend(args[i..].iter().cloned());
                break;
            }
            i += 1;
            match split_token(arg) {
                // Option-shaped but unsplittable, e.g. `-=x`. Never routed
                // to the default handler.
                None if is_option_shaped(arg) => {
                    debug!("unrecognized option {:?}", arg);
                    unrecognized.push(arg.clone());
                }
                None => self.unmatched(arg, &mut unrecognized)?,
                Some(parts) => {
                    if !self.try_exact(&parts, &args, &mut i)?
                        && !self.try_toggle(&parts)?
                        && !self.try_bundle(arg, &parts, &args, &mut i)?
                    {
                        debug!("unrecognized option {:?}", arg);
                        unrecognized.push(arg.clone());
                    }
                }
            }
        }
        Ok(unrecognized)
    }

    /// Returns the registered alias closest to `name`, rendered with its
    /// conventional indicator, when the edit distance makes it a
    /// plausible correction. Intended for "unknown option" diagnostics;
    /// unrecognized arguments themselves are data, not errors.
    pub fn suggest(&self, name: &str) -> Option<String> {
        let bare = name.trim_start_matches(|c| c == '-' || c == '/');
        if bare.is_empty() {
            return None;
        }
        let mut best: Option<(usize, &str)> = None;
        for cand in self.registry.names() {
            if cand == "<>" {
                continue;
            }
            let dist = levenshtein(bare, cand);
            if best.map_or(true, |(d, b)| (dist, cand) < (d, b)) {
                best = Some((dist, cand));
            }
        }
        match best {
            Some((dist, cand)) if dist < 3 => Some(indicate(cand)),
            _ => None,
        }
    }

    /// Writes one line per registered option: its names, a value marker
    /// matching its arity, and the wrapped description. The default
    /// handler `<>` is not listed.
    pub fn write_option_descriptions<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for entry in self.registry.values() {
            let opt = &entry.opt;
            let heading = match option_heading(opt) {
                None => continue,
                Some(heading) => heading,
            };
            if heading.len() < OPTION_WIDTH {
                write!(w, "{:1$}", heading, OPTION_WIDTH)?;
            } else {
                writeln!(w, "{}", heading)?;
                write!(w, "{:1$}", "", OPTION_WIDTH)?;
            }
            let description = (self.localizer)(opt.description());
            let mut lines = wrap(&description, LINE_WIDTH - OPTION_WIDTH);
            match lines.next() {
                None => writeln!(w)?,
                Some(first) => writeln!(w, "{}", first)?,
            }
            for line in lines {
                writeln!(w, "{:1$}{2}", "", OPTION_WIDTH, line)?;
            }
        }
        Ok(())
    }

    /// Exact alias match, then value extraction and invocation.
    fn try_exact(
        &mut self,
        parts: &Parts<'_>,
        args: &[String],
        i: &mut usize,
    ) -> Result<bool> {
        let idx = match self.registry.index_of(parts.name) {
            None => return Ok(false),
            Some(idx) => idx,
        };
        let name = format!("{}{}", parts.flag, parts.name);
        self.extract_and_invoke(idx, name, parts.value, args, i)?;
        Ok(true)
    }

    /// `-debug+` enables and `-debug-` disables an option that takes no
    /// value, instead of toggling it.
    fn try_toggle(&mut self, parts: &Parts<'_>) -> Result<bool> {
        if parts.value.is_some() {
            return Ok(false);
        }
        let last = match parts.name.chars().last() {
            None => return Ok(false),
            Some(last) => last,
        };
        if last != '+' && last != '-' {
            return Ok(false);
        }
        let stem = &parts.name[..parts.name.len() - 1];
        if stem.is_empty() {
            return Ok(false);
        }
        let idx = match self.registry.index_of(stem) {
            None => return Ok(false),
            Some(idx) => idx,
        };
        if self.registry.at(idx).opt.arity() != ValueArity::None {
            return Ok(false);
        }
        let mut ctx = Context {
            name: format!("{}{}", parts.flag, parts.name),
            values: Vec::new(),
        };
        if last == '+' {
            ctx.values.push(stem.to_owned());
        }
        self.invoke(idx, &ctx)?;
        Ok(true)
    }

    /// Bundled short options: `-abc`, with an optional trailing value for
    /// the last option (`-abDvalue`). All or nothing: the whole token is
    /// resolved by a trial scan before any action fires, so a character
    /// that fails to resolve leaves the token unrecognized with no side
    /// effects.
    fn try_bundle(
        &mut self,
        arg: &str,
        parts: &Parts<'_>,
        args: &[String],
        i: &mut usize,
    ) -> Result<bool> {
        if parts.flag != "-" {
            return Ok(false);
        }
        let body = &arg[1..];
        let mut flags: Vec<(usize, char)> = Vec::new();
        let mut tail: Option<(usize, char, usize)> = None;
        for (pos, ch) in body.char_indices() {
            let idx = match self.registry.single(ch) {
                None => {
                    debug!(
                        "cannot bundle {:?}: '{}' is not a registered option",
                        arg, ch
                    );
                    return Ok(false);
                }
                Some(idx) => idx,
            };
            if self.registry.at(idx).opt.arity() == ValueArity::None {
                flags.push((idx, ch));
            } else {
                // A value-taking option ends the bundle; the remainder of
                // the token is its value.
                tail = Some((idx, ch, pos + ch.len_utf8()));
                break;
            }
        }
        for (idx, ch) in flags {
            let ctx = Context {
                name: format!("-{}", ch),
                values: vec![ch.to_string()],
            };
            self.invoke(idx, &ctx)?;
        }
        if let Some((idx, ch, at)) = tail {
            let rest = &body[at..];
            let inline = if rest.is_empty() { None } else { Some(rest) };
            self.extract_and_invoke(idx, format!("-{}", ch), inline, args, i)?;
        }
        Ok(true)
    }

    /// Routes an argument that is not option-shaped: to the `<>` handler
    /// as its single value when one is registered, otherwise to the
    /// unrecognized list.
    fn unmatched(&mut self, arg: &str, unrecognized: &mut Vec<String>) -> Result<()> {
        match self.registry.index_of("<>") {
            Some(idx) => {
                let ctx = Context {
                    name: "<>".to_owned(),
                    values: vec![arg.to_owned()],
                };
                self.invoke(idx, &ctx)
            }
            None => {
                debug!("unrecognized argument {:?}", arg);
                unrecognized.push(arg.to_owned());
                Ok(())
            }
        }
    }

    fn extract_and_invoke(
        &mut self,
        idx: usize,
        name: String,
        inline: Option<&str>,
        args: &[String],
        i: &mut usize,
    ) -> Result<()> {
        let (arity, max_values, separators) = {
            let opt = &self.registry.at(idx).opt;
            (
                opt.arity(),
                opt.max_values(),
                opt.separators().map(<[String]>::to_vec),
            )
        };
        let mut ctx = Context { name, values: Vec::new() };
        match arity {
            ValueArity::None => {
                if inline.is_some() {
                    return Err(self.parse_error(
                        MSG_NO_VALUE,
                        &[&ctx.name],
                        &ctx.name,
                    ));
                }
                // The matched name stands in as the enabled sentinel.
                let bare: String = ctx
                    .name
                    .trim_start_matches(|c| c == '-' || c == '/')
                    .to_owned();
                ctx.values.push(bare);
            }
            _ => self.collect_values(
                &mut ctx,
                arity,
                max_values,
                separators.as_deref(),
                inline,
                args,
                i,
            )?,
        }
        self.invoke(idx, &ctx)
    }

    /// Fills the context with values per the option's arity, separator
    /// policy and value count, consuming lookahead arguments as needed.
    fn collect_values(
        &self,
        ctx: &mut Context,
        arity: ValueArity,
        max_values: usize,
        separators: Option<&[String]>,
        inline: Option<&str>,
        args: &[String],
        i: &mut usize,
    ) -> Result<()> {
        let mut got_first = false;
        if let Some(v) = inline {
            push_split(&mut ctx.values, v, separators);
            got_first = true;
        } else if arity == ValueArity::Required {
            if *i < args.len() && !is_option_shaped(&args[*i]) {
                let raw = &args[*i];
                *i += 1;
                push_split(&mut ctx.values, raw, separators);
                got_first = true;
            } else {
                return Err(self.missing_value(&ctx.name));
            }
        }
        if got_first && arity == ValueArity::Required {
            while ctx.values.len() < max_values
                && *i < args.len()
                && !is_option_shaped(&args[*i])
            {
                let raw = &args[*i];
                *i += 1;
                push_split(&mut ctx.values, raw, separators);
            }
            if ctx.values.len() < max_values {
                return Err(self.missing_value(&ctx.name));
            }
        }
        if ctx.values.len() > max_values {
            return Err(self.parse_error(
                MSG_TOO_MANY_VALUES,
                &[&ctx.values.len().to_string(), &max_values.to_string()],
                &ctx.name,
            ));
        }
        Ok(())
    }

    fn invoke(&mut self, idx: usize, ctx: &Context) -> Result<()> {
        let failed = {
            let entry = self.registry.at_mut(idx);
            match &mut entry.action {
                Action::Flag(action) => {
                    action(!ctx.values.is_empty());
                    return Ok(());
                }
                Action::Value(action) => {
                    match action(ctx.values.first().map(String::as_str)) {
                        Ok(()) => return Ok(()),
                        Err(failed) => failed,
                    }
                }
                Action::Values(action) => {
                    action(&ctx.values);
                    return Ok(());
                }
            }
        };
        Err(self.parse_error(
            MSG_CONVERT,
            &[&failed.value, failed.type_name, &ctx.name],
            &ctx.name,
        ))
    }

    fn missing_value(&self, option: &str) -> Error {
        self.parse_error(MSG_MISSING_VALUE, &[option], option)
    }

    fn parse_error(&self, template: &str, params: &[&str], option: &str) -> Error {
        Error::parse(substitute(&(self.localizer)(template), params), option)
    }
}

impl Default for OptionSet<'_> {
    fn default() -> Self {
        OptionSet::new()
    }
}

impl fmt::Debug for OptionSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.iter().map(Opt::prototype))
            .finish()
    }
}

fn cap<'t>(caps: &Captures<'t>, name: &str) -> &'t str {
    caps.name(name).map_or("", |m| m.as_str())
}

fn split_token(arg: &str) -> Option<Parts<'_>> {
    if let Some(rest) = arg.strip_prefix('/') {
        if rest.is_empty() {
            return None;
        }
        // `/`-prefixed options carry no inline value; the remainder is
        // all name, and a value comes from the following argument.
        return Some(Parts { flag: "/", name: rest, value: None });
    }
    let caps = OPTION_TOKEN.captures(arg)?;
    Some(Parts {
        flag: cap(&caps, "flag"),
        name: cap(&caps, "name"),
        value: caps.name("value").map(|m| m.as_str()),
    })
}

/// True for tokens the matcher would try to interpret as options, which
/// is also what stops lookahead value consumption. A bare `-` is data.
fn is_option_shaped(arg: &str) -> bool {
    arg.len() > 1 && (arg.starts_with('-') || arg.starts_with('/'))
}

/// Appends `raw` split on the first matching separator at each position,
/// or whole when the option does not split values.
fn push_split(values: &mut Vec<String>, raw: &str, separators: Option<&[String]>) {
    let separators = match separators {
        None => {
            values.push(raw.to_owned());
            return;
        }
        Some(separators) => separators,
    };
    let mut start = 0;
    let mut pos = 0;
    while pos < raw.len() {
        let hit = separators
            .iter()
            .find(|sep| !sep.is_empty() && raw[pos..].starts_with(sep.as_str()));
        match hit {
            Some(sep) => {
                values.push(raw[start..pos].to_owned());
                pos += sep.len();
                start = pos;
            }
            None => {
                pos += raw[pos..].chars().next().map_or(1, char::len_utf8);
            }
        }
    }
    values.push(raw[start..].to_owned());
}

fn substitute(template: &str, params: &[&str]) -> String {
    let mut out = template.to_owned();
    for (i, param) in params.iter().enumerate() {
        out = out.replace(&format!("{{{}}}", i), param);
    }
    out
}

/// Renders a bare alias with its conventional option indicator: a single
/// `-` for one-character names, `--` for longer ones.
fn indicate(name: &str) -> String {
    let prefix = if name.chars().count() == 1 { "-" } else { "--" };
    format!("{}{}", prefix, name)
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// `  -s, --status=VALUE` and friends; `None` for an option with no
/// listable name.
fn option_heading(opt: &Opt) -> Option<String> {
    let mut names = opt.names().iter().filter(|n| n.as_str() != "<>");
    let first = names.next()?;
    let mut out = String::new();
    if first.chars().count() == 1 {
        out.push_str("  -");
    } else {
        out.push_str("      --");
    }
    out.push_str(first);
    for name in names {
        out.push_str(", ");
        out.push_str(if name.chars().count() == 1 { "-" } else { "--" });
        out.push_str(name);
    }
    match opt.arity() {
        ValueArity::None => {}
        arity => {
            let optional = arity == ValueArity::Optional;
            if optional {
                out.push('[');
            }
            out.push_str("=VALUE");
            let sep = opt
                .separators()
                .and_then(|seps| seps.first())
                .map_or(" ", String::as_str);
            for _ in 1..opt.max_values() {
                out.push_str(sep);
                out.push_str("VALUE");
            }
            if optional {
                out.push(']');
            }
        }
    }
    Some(out)
}

fn wrap(text: &str, width: usize) -> impl Iterator<Item = String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines.into_iter()
}
