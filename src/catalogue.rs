//! Catalogue of standard Taguchi orthogonal arrays.
//!
//! Gives access to the classic textbook arrays by their common names. Each
//! array is returned saturated (all columns); use
//! [`Design::select_factors`](crate::Design::select_factors) to keep a subset.

use crate::construct::{Bose, Constructor, HadamardSylvester};
use crate::design::Design;
use crate::error::{Error, Result};

/// Retrieve an orthogonal array by its standard Taguchi name.
///
/// Supported arrays:
/// - **L4**: OA(4, 3, 2, 2)
/// - **L8**: OA(8, 7, 2, 2)
/// - **L9**: OA(9, 4, 3, 2)
/// - **L16**: OA(16, 15, 2, 2)
/// - **L25**: OA(25, 6, 5, 2)
/// - **L32**: OA(32, 31, 2, 2)
/// - **L49**: OA(49, 8, 7, 2)
///
/// # Example
///
/// ```
/// use confound::catalogue::get_by_name;
///
/// let oa = get_by_name("L9").unwrap();
/// assert_eq!(oa.runs(), 9);
/// assert_eq!(oa.levels(), 3);
/// ```
///
/// # Errors
///
/// Returns an error if the name is unknown.
pub fn get_by_name(name: &str) -> Result<Design> {
    match name.to_uppercase().as_str() {
        "L4" => HadamardSylvester::new(4)?.construct(3),
        "L8" => HadamardSylvester::new(8)?.construct(7),
        "L9" => Bose::new(3)?.construct(4),
        "L16" => HadamardSylvester::new(16)?.construct(15),
        "L25" => Bose::new(5)?.construct(6),
        "L32" => HadamardSylvester::new(32)?.construct(31),
        "L49" => Bose::new(7)?.construct(8),
        _ => Err(Error::invalid_params(format!(
            "unknown standard array: {name}"
        ))),
    }
}

/// List all available standard arrays.
#[must_use]
pub fn list_standard_arrays() -> Vec<&'static str> {
    vec!["L4", "L8", "L9", "L16", "L25", "L32", "L49"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_l8() {
        let oa = get_by_name("L8").unwrap();
        assert_eq!(oa.runs(), 8);
        assert_eq!(oa.factors(), 7);
        assert_eq!(oa.levels(), 2);
    }

    #[test]
    fn test_every_listed_array_verifies() {
        for name in list_standard_arrays() {
            let oa = get_by_name(name).unwrap();
            assert!(oa.verify().is_valid, "{name} failed verification");
            assert_eq!(format!("L{}", oa.runs()), name);
        }
    }

    #[test]
    fn test_case_insensitive() {
        assert!(get_by_name("l9").is_ok());
    }

    #[test]
    fn test_unknown() {
        assert!(get_by_name("L999").is_err());
    }
}
