//! Transition wavelengths for hydrogenic ions

use crate::constants::RYDBERG_H;
use crate::error::{Result, Sh95Error};

/// Vacuum wavelength in Angstrom of the transition between levels `n1` and `n2`
///
/// The levels may be given in either order. Equal levels, a zero level or
/// a zero charge describe no transition and are rejected.
pub fn wavelength(n1: u32, n2: u32, z: u32) -> Result<f64> {
    let domain_error = |reason: &str| Sh95Error::Domain {
        n1,
        n2,
        z,
        reason: reason.to_string(),
    };

    if n1 == n2 {
        return Err(domain_error("levels are equal"));
    }
    if n1 == 0 || n2 == 0 {
        return Err(domain_error("principal quantum numbers start at 1"));
    }
    if z == 0 {
        return Err(domain_error("charge must be at least 1"));
    }

    let (lower, upper) = if n1 < n2 { (n1, n2) } else { (n2, n1) };
    let lower = f64::from(lower);
    let upper = f64::from(upper);
    let z = f64::from(z);

    Ok(1.0 / (z * z * RYDBERG_H * (1.0 / (lower * lower) - 1.0 / (upper * upper))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balmer_alpha() {
        // H-alpha, 3 -> 2, close to 6564.6 A in vacuum
        let wave = wavelength(2, 3, 1).unwrap();
        assert!((wave - 6564.6).abs() < 0.5, "got {}", wave);
    }

    #[test]
    fn test_lyman_alpha() {
        let wave = wavelength(1, 2, 1).unwrap();
        assert!((wave - 1215.7).abs() < 0.5, "got {}", wave);
    }

    #[test]
    fn test_symmetric_in_levels() {
        for z in 1..=8 {
            for n1 in 1..=12 {
                for n2 in 1..=12 {
                    if n1 == n2 {
                        continue;
                    }
                    assert_eq!(
                        wavelength(n1, n2, z).unwrap(),
                        wavelength(n2, n1, z).unwrap()
                    );
                }
            }
        }
    }

    #[test]
    fn test_scales_with_charge_squared() {
        let hydrogen = wavelength(2, 3, 1).unwrap();
        let helium = wavelength(2, 3, 2).unwrap();
        assert!((hydrogen / helium - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_equal_levels_are_domain_errors() {
        for z in 1..=8 {
            for n in 1..=20 {
                assert!(matches!(wavelength(n, n, z), Err(Sh95Error::Domain { .. })));
            }
        }
    }

    #[test]
    fn test_zero_level_and_charge_rejected() {
        assert!(matches!(wavelength(0, 2, 1), Err(Sh95Error::Domain { .. })));
        assert!(matches!(wavelength(1, 2, 0), Err(Sh95Error::Domain { .. })));
    }
}
