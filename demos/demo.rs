use std::cell::Cell;
use std::io;

use optset::OptionSet;

// Try:
//
//     demo -v -v --status=Ready -Dkey=value extra -- --not-parsed
//
// which bumps verbosity twice, sets the status, records one define and
// leaves `extra`, `--` and `--not-parsed` untouched.
fn main() {
    let verbosity = Cell::new(0u32);
    let help = Cell::new(false);
    let mut status = String::new();
    let mut defines: Vec<(String, String)> = Vec::new();

    let mut opts = OptionSet::new();
    opts.add_flag("v|verbose", "Increase message verbosity.", |on| {
        if on {
            verbosity.set(verbosity.get() + 1);
        } else {
            verbosity.set(0);
        }
    })
    .unwrap();
    opts.add("s|status=", "Set the reported status.", |v| {
        status = v.unwrap_or("").to_owned();
    })
    .unwrap();
    opts.add_multi("D|define=", "Define a key/value pair.", 2, |vs| {
        let key = vs.first().cloned().unwrap_or_default();
        let value = vs.get(1).cloned().unwrap_or_default();
        defines.push((key, value));
    })
    .unwrap();
    opts.add_flag("h|?|help", "Show this message and exit.", |_| {
        help.set(true);
    })
    .unwrap();

    let extra = opts.parse_env().unwrap_or_else(|e| e.exit());

    if help.get() {
        println!("Usage: demo [OPTIONS] [ARGS]");
        println!();
        opts.write_option_descriptions(&mut io::stdout()).unwrap();
        return;
    }
    drop(opts);

    println!("verbosity: {}", verbosity.get());
    println!("status:    {:?}", status);
    for (key, value) in &defines {
        println!("define:    {}={}", key, value);
    }
    if !extra.is_empty() {
        println!("leftover:  {:?}", extra);
    }
}
