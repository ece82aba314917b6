//! Getopt-style option parsing for Rust, driven by callbacks.
//!
//! An [`OptionSet`] is built from a table of option format strings
//! ("prototypes") bound to actions. Parsing an argument vector invokes the
//! action of every recognized option with its extracted values and returns
//! whatever was left over, unchanged and in order.
//!
//! # Prototype grammar
//!
//! A prototype describes one option: its aliases, whether it takes a value,
//! and how multiple values are separated.
//!
//! ```text
//! name:    .+
//! type:    [=:]
//! sep:     ( [^{}] | '{' .* '}' )*
//! aliases: ( name type? sep? ) ( '|' name type? sep? )*
//! ```
//!
//! Each `|`-delimited name is an alias for the associated action. A
//! prototype ending in `=` has a required value; one ending in `:` has an
//! optional value; with neither, the option takes no value. The type
//! character need only appear on one alias, but aliases that do carry one
//! must agree.
//!
//! An alias may be followed by key/value separator syntax, used to split
//! values of options accepting more than one value. Unspecified, the
//! separators default to `=` and `:`. Each plain character after the type
//! is one separator; a `{...}` group is one separator taken verbatim. The
//! empty group `{}` means no separator at all: every value arrives as a
//! distinct argument.
//!
//! The name in a prototype carries no option indicator. On the command
//! line, any of `-`, `--` and `/` introduce a named option.
//!
//! # Matching
//!
//! Values are taken from the current argument after an `=` or `:`
//! (`--status=Ready`), or from the following argument when the option
//! requires a value (`--status Ready`). Options with optional values never
//! consume the following argument.
//!
//! Single-character options that take no value can be bundled: `-abc` is
//! `-a -b -c`, and `-Dname=value` is `-D name=value`. An option that takes
//! no value can be explicitly enabled with a trailing `+` and disabled with
//! a trailing `-` (`-debug+`, `-debug-`).
//!
//! Processing stops at `--`; it and everything after it are returned
//! untouched. Arguments that match no option are not errors; they are
//! handed back to the caller, or to the default handler registered under
//! the special name `<>` when one exists.
//!
//! # Example
//!
//! ```
//! use optset::OptionSet;
//!
//! let mut verbosity = 0;
//! let mut status = None;
//! let extra = {
//!     let mut opts = OptionSet::new();
//!     opts.add_flag("v|verbose", "Increase verbosity.", |on| {
//!         if on { verbosity += 1 } else { verbosity = 0 }
//!     }).unwrap();
//!     opts.add("s|status=", "Set the status.", |v| {
//!         status = v.map(str::to_owned);
//!     }).unwrap();
//!     opts.parse(["-vv", "--status=Ready", "rest"]).unwrap()
//! };
//! assert_eq!(verbosity, 2);
//! assert_eq!(status.as_deref(), Some("Ready"));
//! assert_eq!(extra, vec!["rest"]);
//! ```

pub use crate::errors::{Error, Result};
pub use crate::opt::{Opt, ValueArity};
pub use crate::set::OptionSet;

/// Print an error.
macro_rules! werr(
    ($($arg:tt)*) => ({
        use std::io::{Write, stderr};
        write!(&mut stderr(), $($arg)*).unwrap();
    })
);

mod errors;
mod opt;
mod registry;
mod set;
#[cfg(test)]
mod test;
