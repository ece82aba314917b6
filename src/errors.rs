//! The one and only error type for option parsing.
use std::error::Error as StdError;
use std::fmt;
use std::result;

/// Represents the ways building and using an option set can fail.
///
/// Registration failures (`Prototype`, `Duplicate`) can only be triggered
/// by the programmer, i.e. the writer of the option prototypes, and are
/// usually indicative of a bug in your program. `Parse` is the only error
/// produced by user input.
///
/// ### Example
///
/// Generally, you want to register your options, parse the argument vector
/// and quit the program if parsing reported an error. This can be achieved
/// like so:
///
/// ```no_run
/// use optset::OptionSet;
///
/// let mut opts = OptionSet::new();
/// opts.add("o|output=", "Write output to FILE.", |_| ()).unwrap();
/// let extra = opts.parse(std::env::args().skip(1))
///                 .unwrap_or_else(|e| e.exit());
/// ```
#[derive(Debug)]
pub enum Error {
    /// Compiling an option prototype failed.
    ///
    /// The payload describes what was wrong with the format string: an
    /// empty alias, conflicting `=`/`:` type characters, a value count
    /// that contradicts the declared value type, ill-formed separator
    /// syntax, or a default handler (`<>`) that would require values.
    Prototype(String),

    /// An alias was registered more than once.
    ///
    /// The payload is the offending alias name. Registration is atomic:
    /// none of the aliases of the rejected prototype are kept.
    Duplicate(String),

    /// Parsing the argument vector failed.
    ///
    /// Covers a missing required value, an inline value handed to an
    /// option that takes none, too few or too many values for a
    /// multi-value option, and a failed typed conversion. Everything
    /// parsed before the failing argument has already invoked its
    /// actions; those side effects are not rolled back.
    Parse {
        /// Localized, formatted description of the failure.
        message: String,
        /// The option that triggered it, as written on the command line.
        option: String,
    },
}

impl Error {
    pub(crate) fn parse(message: String, option: &str) -> Error {
        Error::Parse { message, option: option.to_owned() }
    }

    /// The name of the option a parse-time error is about, `None` for
    /// registration-time errors.
    pub fn option_name(&self) -> Option<&str> {
        match self {
            Error::Parse { ref option, .. } => Some(option),
            _ => None,
        }
    }

    /// Print this error to stderr and immediately exit the program with a
    /// non-zero status.
    pub fn exit(&self) -> ! {
        werr!("{}\n", self);
        ::std::process::exit(1)
    }
}

/// Short result type alias.
pub type Result<T> = result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Prototype(ref s) => write!(f, "{}", s),
            Error::Duplicate(ref name) => {
                write!(f, "duplicate option alias '{}'", name)
            }
            Error::Parse { ref message, .. } => write!(f, "{}", message),
        }
    }
}

impl StdError for Error {}
