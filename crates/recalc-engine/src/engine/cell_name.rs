//! Cell and variable name grammar.
//!
//! A name is a letter or underscore followed by any number of letters,
//! digits or underscores (`x`, `_`, `A1`, `y_15`). Names are case-sensitive;
//! any case folding is the job of the caller-supplied [`Normalizer`].

use regex::Regex;
use std::rc::Rc;
use std::sync::OnceLock;

/// Maps a raw name to its canonical form before it is stored, compared or indexed.
pub type Normalizer = Rc<dyn Fn(&str) -> String>;

/// Extra restriction on canonical names, beyond the base grammar.
pub type Validator = Rc<dyn Fn(&str) -> bool>;

/// Returns true if `name` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_cell_name(name: &str) -> bool {
    cell_name_re().is_match(name)
}

/// Normalizer that leaves names untouched.
pub fn identity_normalizer() -> Normalizer {
    Rc::new(|name: &str| name.to_string())
}

/// Validator that accepts every name.
pub fn accept_all() -> Validator {
    Rc::new(|_: &str| true)
}

fn cell_name_re() -> &'static Regex {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    NAME_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("cell name regex must compile")
    })
}
