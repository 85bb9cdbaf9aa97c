//! Parameter Sets

use crate::fileutil::*;
use crate::pbrt::*;
use std::collections::HashMap;
use std::fmt;

mod paramset_item;

// Re-export
pub use paramset_item::*;

/// A hashmap of parameter sets stored by name.
pub type ParamSetMap<T> = HashMap<String, ParamSetItem<T>>;

/// Stores parameter set items of different types in hashmaps.
#[derive(Clone, Default)]
pub struct ParamSet {
    pub bools: ParamSetMap<bool>,
    pub ints: ParamSetMap<Int>,
    pub floats: ParamSetMap<Float>,
    pub strings: ParamSetMap<String>,
}

/// Define a macro that can be used to generate a function for adding/replacing
/// parameter set item.
macro_rules! paramset_add {
    ($func: ident, $t: ty, $paramset: ident) => {
        pub fn $func(&mut self, name: &str, values: &[$t]) {
            let n = String::from(name);
            self.$paramset.insert(n, ParamSetItem::new(values.to_vec()));
        }
    };
}

/// Define a macro that can be used to generate a function for finding
/// parameter set item that is stored as a single item.
macro_rules! paramset_find_one {
    ($func: ident, $t: ty, $paramset: ident) => {
        pub fn $func(&self, name: &str, default: $t) -> $t {
            match self.$paramset.get(name) {
                Some(param) if param.values.len() == 1 => param.values[0].clone(),
                _ => default,
            }
        }
    };
}

/// Define a macro that can be used to print parameter set items.
macro_rules! display_param {
    ($params: expr, $param_type: literal, $formatter: expr) => {
        let mut names: Vec<&String> = $params.keys().collect();
        names.sort();
        for name in names {
            writeln!($formatter, "\"{} {}\" {}", $param_type, name, $params[name])?;
        }
    };
}

impl ParamSet {
    /// Returns a new `ParamSet`.
    pub fn new() -> Self {
        Self::default()
    }

    paramset_find_one!(find_one_bool, bool, bools);
    paramset_add!(add_bool, bool, bools);

    paramset_find_one!(find_one_int, Int, ints);
    paramset_add!(add_int, Int, ints);

    paramset_find_one!(find_one_float, Float, floats);
    paramset_add!(add_float, Float, floats);

    paramset_find_one!(find_one_string, String, strings);
    paramset_add!(add_string, String, strings);

    /// Adds a parameter from its textual `name=value` form. Booleans
    /// (`true`/`false`) become bools; numbers become floats and, when they
    /// are integral, ints as well; anything else is stored as a string.
    ///
    /// * `assignment` - The `name=value` text.
    pub fn add_assignment(&mut self, assignment: &str) -> Result<(), String> {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| format!("Expected NAME=VALUE, got '{assignment}'"))?;
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() {
            return Err(format!("Missing parameter name in '{assignment}'"));
        }

        if let Ok(b) = value.parse::<bool>() {
            self.add_bool(name, &[b]);
        } else if let Ok(f) = value.parse::<Float>() {
            self.add_float(name, &[f]);
            if let Ok(i) = value.parse::<Int>() {
                self.add_int(name, &[i]);
            }
        } else {
            self.add_string(name, &[value.to_string()]);
        }
        Ok(())
    }

    /// Finds a filename and returns the absolute path to the file.
    ///
    /// * `name` - Parameter name.
    pub fn find_one_filename(&self, name: &str) -> Option<String> {
        let filename = self.find_one_string(name, String::from(""));
        if filename.is_empty() {
            return None;
        }
        absolute_path(&filename).ok()
    }
}

impl fmt::Display for ParamSet {
    /// Formats the value using the given formatter.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display_param!(self.bools, "bool", f);
        display_param!(self.ints, "integer", f);
        display_param!(self.floats, "float", f);
        display_param!(self.strings, "string", f);
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
