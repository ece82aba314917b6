use std::cell::RefCell;
use std::rc::Rc;

use crate::{Error, OptionSet};

/// Shared recorder the test actions append to.
pub type Log = Rc<RefCell<Vec<String>>>;

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn strings(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

/// Builds a set registering every `(prototype, max_values)` pair with an
/// action that records its invocation as `"prototype -> rendered values"`.
/// The value count picks the registration flavor: 0 is a flag, 1 a plain
/// value option, anything else multi-value.
pub fn recording_set(
    log: &Log,
    protos: &[(&'static str, usize)],
) -> OptionSet<'static> {
    let mut set = OptionSet::new();
    for &(proto, max_values) in protos {
        let log = log.clone();
        match max_values {
            0 => {
                set.add_flag(proto, "", move |on| {
                    let state = if on { "on" } else { "off" };
                    log.borrow_mut().push(format!("{} -> {}", proto, state));
                })
                .unwrap();
            }
            1 => {
                set.add(proto, "", move |v| {
                    log.borrow_mut()
                        .push(format!("{} -> {}", proto, v.unwrap_or("<none>")));
                })
                .unwrap();
            }
            n => {
                set.add_multi(proto, "", n, move |vs| {
                    log.borrow_mut()
                        .push(format!("{} -> {}", proto, vs.join(",")));
                })
                .unwrap();
            }
        }
    }
    set
}

/// Parses `argv` against a recording set; returns the invocation log and
/// the unrecognized arguments.
pub fn parse_all(
    protos: &[(&'static str, usize)],
    argv: &[&str],
) -> (Vec<String>, Vec<String>) {
    let log = new_log();
    let mut set = recording_set(&log, protos);
    let extra = match set.parse(argv.iter().copied()) {
        Err(err) => panic!("parse failed: {}", err),
        Ok(extra) => extra,
    };
    let calls = log.borrow().clone();
    (calls, extra)
}

/// Like `parse_all`, but the parse must fail; returns the invocations
/// made before the failure alongside the error.
pub fn parse_fail(
    protos: &[(&'static str, usize)],
    argv: &[&str],
) -> (Vec<String>, Error) {
    let log = new_log();
    let mut set = recording_set(&log, protos);
    match set.parse(argv.iter().copied()) {
        Ok(extra) => panic!("parse succeeded with leftover {:?}", extra),
        Err(err) => (log.borrow().clone(), err),
    }
}

macro_rules! test_parse(
    ($name:ident, $protos:expr, $argv:expr, $calls:expr, $extra:expr) => (
        #[test]
        fn $name() {
            let (calls, extra) = crate::test::parse_all(&$protos, &$argv);
            assert_eq!(calls, crate::test::strings(&$calls), "invocations");
            assert_eq!(extra, crate::test::strings(&$extra), "unrecognized");
        }
    );
);

macro_rules! test_parse_err(
    ($name:ident, $protos:expr, $argv:expr, $option:expr) => (
        #[test]
        fn $name() {
            let (_, err) = crate::test::parse_fail(&$protos, &$argv);
            match err {
                crate::Error::Parse { ref option, .. } => {
                    assert_eq!(option.as_str(), $option);
                }
                ref err => panic!("expected parse error, got {:?}", err),
            }
        }
    );
);

macro_rules! test_proto_err(
    ($name:ident, $proto:expr, $max:expr) => (
        #[test]
        fn $name() {
            match crate::Opt::new($proto, "", $max) {
                Err(crate::Error::Prototype(_)) => {}
                other => panic!("expected prototype error, got {:?}", other),
            }
        }
    );
);
