//! Units of measure
//!
//! Every units name resolves to a [`CanonicalUnits`]: a magnitude relative to
//! the product of base units, and the exponent of each base unit. Two units
//! are compatible when their dimensions agree; the scaling factor between
//! them is then the ratio of their magnitudes.
//!
//! Built-in units are the standard SI set (plus `dimensionless`, `gram`,
//! `litre`/`liter` and the derived SI units). A model may define more units
//! from these, and a definition with no term introduces a new base unit.

use std::collections::{BTreeMap, HashMap};

use float_cmp::approx_eq;
use lazy_static::lazy_static;
use thiserror::Error;

use crate::json::{UnitPrefix, UnitsDefinition};

/// Exponent of each base unit
pub type Dimensions = BTreeMap<String, f64>;

/// Errors raised while resolving units
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitsError {
    #[error("Units '{0}' are not defined")]
    UnknownUnits(String),

    #[error("Units definitions are circular: {0}")]
    CircularUnits(String),

    #[error("Invalid prefix '{prefix}' in units '{units}'")]
    InvalidPrefix { prefix: String, units: String },

    #[error("Units '{from}' and '{to}' are not compatible")]
    Incompatible { from: String, to: String },
}

// ═══════════════════════════════════════════════════════════════════════════════
// Canonical form
// ═══════════════════════════════════════════════════════════════════════════════

/// Units reduced to base units: `magnitude * product(base^exponent)`
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalUnits {
    pub magnitude: f64,
    pub dimensions: Dimensions,
}

impl CanonicalUnits {
    pub fn dimensionless() -> Self {
        Self {
            magnitude: 1.0,
            dimensions: Dimensions::new(),
        }
    }

    /// A base unit with the given dimension name
    pub fn base(name: &str) -> Self {
        let mut dimensions = Dimensions::new();
        dimensions.insert(name.to_string(), 1.0);
        Self {
            magnitude: 1.0,
            dimensions,
        }
    }

    fn from_terms(magnitude: f64, terms: &[(&str, f64)]) -> Self {
        let dimensions = terms
            .iter()
            .map(|(name, exponent)| (name.to_string(), *exponent))
            .collect();
        Self {
            magnitude,
            dimensions,
        }
    }

    /// Multiply by `multiplier * (10^power * other)^exponent`
    fn accumulate(&mut self, other: &CanonicalUnits, power: i32, exponent: f64, multiplier: f64) {
        self.magnitude *= multiplier * (10f64.powi(power) * other.magnitude).powf(exponent);
        for (name, value) in &other.dimensions {
            let entry = self.dimensions.entry(name.clone()).or_insert(0.0);
            *entry += value * exponent;
        }
        self.dimensions.retain(|_, value| !approx_eq!(f64, *value, 0.0));
    }

    /// Whether both units measure the same dimension
    pub fn same_dimensions(&self, other: &CanonicalUnits) -> bool {
        self.dimensions.len() == other.dimensions.len()
            && self.dimensions.iter().all(|(name, value)| {
                other
                    .dimensions
                    .get(name)
                    .is_some_and(|v| approx_eq!(f64, *v, *value, ulps = 4))
            })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Built-in tables
// ═══════════════════════════════════════════════════════════════════════════════

const A: &str = "ampere";
const CD: &str = "candela";
const K: &str = "kelvin";
const KG: &str = "kilogram";
const M: &str = "metre";
const MOL: &str = "mole";
const S: &str = "second";

lazy_static! {
    static ref BUILTIN_UNITS: HashMap<&'static str, CanonicalUnits> = {
        let mut units = HashMap::new();
        for base in [A, CD, K, KG, M, MOL, S] {
            units.insert(base, CanonicalUnits::base(base));
        }
        units.insert("dimensionless", CanonicalUnits::dimensionless());
        units.insert("radian", CanonicalUnits::dimensionless());
        units.insert("steradian", CanonicalUnits::dimensionless());
        units.insert("meter", CanonicalUnits::base(M));
        units.insert("celsius", CanonicalUnits::base(K));
        units.insert("gram", CanonicalUnits::from_terms(1.0e-3, &[(KG, 1.0)]));
        units.insert("litre", CanonicalUnits::from_terms(1.0e-3, &[(M, 3.0)]));
        units.insert("liter", CanonicalUnits::from_terms(1.0e-3, &[(M, 3.0)]));
        units.insert("becquerel", CanonicalUnits::from_terms(1.0, &[(S, -1.0)]));
        units.insert("hertz", CanonicalUnits::from_terms(1.0, &[(S, -1.0)]));
        units.insert("coulomb", CanonicalUnits::from_terms(1.0, &[(S, 1.0), (A, 1.0)]));
        units.insert(
            "farad",
            CanonicalUnits::from_terms(1.0, &[(M, -2.0), (KG, -1.0), (S, 4.0), (A, 2.0)]),
        );
        units.insert("gray", CanonicalUnits::from_terms(1.0, &[(M, 2.0), (S, -2.0)]));
        units.insert("sievert", CanonicalUnits::from_terms(1.0, &[(M, 2.0), (S, -2.0)]));
        units.insert(
            "henry",
            CanonicalUnits::from_terms(1.0, &[(M, 2.0), (KG, 1.0), (S, -2.0), (A, -2.0)]),
        );
        units.insert(
            "joule",
            CanonicalUnits::from_terms(1.0, &[(M, 2.0), (KG, 1.0), (S, -2.0)]),
        );
        units.insert("katal", CanonicalUnits::from_terms(1.0, &[(S, -1.0), (MOL, 1.0)]));
        units.insert("lumen", CanonicalUnits::base(CD));
        units.insert("lux", CanonicalUnits::from_terms(1.0, &[(M, -2.0), (CD, 1.0)]));
        units.insert(
            "newton",
            CanonicalUnits::from_terms(1.0, &[(M, 1.0), (KG, 1.0), (S, -2.0)]),
        );
        units.insert(
            "ohm",
            CanonicalUnits::from_terms(1.0, &[(M, 2.0), (KG, 1.0), (S, -3.0), (A, -2.0)]),
        );
        units.insert(
            "pascal",
            CanonicalUnits::from_terms(1.0, &[(M, -1.0), (KG, 1.0), (S, -2.0)]),
        );
        units.insert(
            "siemens",
            CanonicalUnits::from_terms(1.0, &[(M, -2.0), (KG, -1.0), (S, 3.0), (A, 2.0)]),
        );
        units.insert(
            "tesla",
            CanonicalUnits::from_terms(1.0, &[(KG, 1.0), (S, -2.0), (A, -1.0)]),
        );
        units.insert(
            "volt",
            CanonicalUnits::from_terms(1.0, &[(M, 2.0), (KG, 1.0), (S, -3.0), (A, -1.0)]),
        );
        units.insert(
            "watt",
            CanonicalUnits::from_terms(1.0, &[(M, 2.0), (KG, 1.0), (S, -3.0)]),
        );
        units.insert(
            "weber",
            CanonicalUnits::from_terms(1.0, &[(M, 2.0), (KG, 1.0), (S, -2.0), (A, -1.0)]),
        );
        units
    };

    static ref PREFIXES: HashMap<&'static str, i32> = {
        let mut prefixes = HashMap::new();
        prefixes.insert("yotta", 24);
        prefixes.insert("zetta", 21);
        prefixes.insert("exa", 18);
        prefixes.insert("peta", 15);
        prefixes.insert("tera", 12);
        prefixes.insert("giga", 9);
        prefixes.insert("mega", 6);
        prefixes.insert("kilo", 3);
        prefixes.insert("hecto", 2);
        prefixes.insert("deca", 1);
        prefixes.insert("deka", 1);
        prefixes.insert("deci", -1);
        prefixes.insert("centi", -2);
        prefixes.insert("milli", -3);
        prefixes.insert("micro", -6);
        prefixes.insert("nano", -9);
        prefixes.insert("pico", -12);
        prefixes.insert("femto", -15);
        prefixes.insert("atto", -18);
        prefixes.insert("zepto", -21);
        prefixes.insert("yocto", -24);
        prefixes
    };
}

/// Whether `name` is one of the built-in units
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_UNITS.contains_key(name)
}

/// Power of ten denoted by a prefix
///
/// Named prefixes must be SI prefixes; a textual integer is also accepted.
pub fn prefix_power(prefix: &UnitPrefix, units: &str) -> Result<i32, UnitsError> {
    match prefix {
        UnitPrefix::Power(power) => Ok(*power),
        UnitPrefix::Name(name) => PREFIXES
            .get(name.as_str())
            .copied()
            .or_else(|| name.trim().parse::<i32>().ok())
            .ok_or_else(|| UnitsError::InvalidPrefix {
                prefix: name.clone(),
                units: units.to_string(),
            }),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════════

/// Built-in units plus the definitions of one model, all resolved up front
#[derive(Debug, Clone, Default)]
pub struct UnitsRegistry {
    resolved: HashMap<String, CanonicalUnits>,
}

impl UnitsRegistry {
    /// Resolve every definition, failing on the first unknown reference,
    /// invalid prefix or circular definition
    pub fn new(definitions: &[UnitsDefinition]) -> Result<Self, UnitsError> {
        let by_name: HashMap<&str, &UnitsDefinition> =
            definitions.iter().map(|d| (d.name.as_str(), d)).collect();
        let mut resolved = HashMap::new();

        for definition in definitions {
            let mut chain = Vec::new();
            Self::resolve(&definition.name, &by_name, &mut resolved, &mut chain)?;
        }

        Ok(Self { resolved })
    }

    fn resolve(
        name: &str,
        definitions: &HashMap<&str, &UnitsDefinition>,
        resolved: &mut HashMap<String, CanonicalUnits>,
        chain: &mut Vec<String>,
    ) -> Result<CanonicalUnits, UnitsError> {
        if let Some(units) = resolved.get(name) {
            return Ok(units.clone());
        }

        let Some(definition) = definitions.get(name) else {
            return BUILTIN_UNITS
                .get(name)
                .cloned()
                .ok_or_else(|| UnitsError::UnknownUnits(name.to_string()));
        };

        if chain.iter().any(|n| n == name) {
            chain.push(name.to_string());
            return Err(UnitsError::CircularUnits(chain.join(" -> ")));
        }
        chain.push(name.to_string());

        let units = if definition.is_base_unit() {
            CanonicalUnits::base(name)
        } else {
            let mut units = CanonicalUnits::dimensionless();
            for term in &definition.units {
                let reference = Self::resolve(&term.reference, definitions, resolved, chain)?;
                let power = match &term.prefix {
                    Some(prefix) => prefix_power(prefix, name)?,
                    None => 0,
                };
                units.accumulate(&reference, power, term.exponent(), term.multiplier());
            }
            units
        };

        chain.pop();
        resolved.insert(name.to_string(), units.clone());
        Ok(units)
    }

    /// Canonical form of a units name
    pub fn canonical(&self, name: &str) -> Result<CanonicalUnits, UnitsError> {
        self.resolved
            .get(name)
            .or_else(|| BUILTIN_UNITS.get(name))
            .cloned()
            .ok_or_else(|| UnitsError::UnknownUnits(name.to_string()))
    }

    /// Whether a units name is known
    pub fn contains(&self, name: &str) -> bool {
        self.resolved.contains_key(name) || is_builtin(name)
    }

    /// Whether two units measure the same dimension
    pub fn compatible(&self, a: &str, b: &str) -> Result<bool, UnitsError> {
        Ok(self.canonical(a)?.same_dimensions(&self.canonical(b)?))
    }

    /// Factor `f` such that a value expressed in `local` units equals `f` times
    /// the same value expressed in `reference` units
    ///
    /// For `local = millivolt` and `reference = volt` the factor is 1000.
    pub fn scaling_factor(&self, local: &str, reference: &str) -> Result<f64, UnitsError> {
        let local_units = self.canonical(local)?;
        let reference_units = self.canonical(reference)?;
        if !local_units.same_dimensions(&reference_units) {
            return Err(UnitsError::Incompatible {
                from: local.to_string(),
                to: reference.to_string(),
            });
        }
        Ok(reference_units.magnitude / local_units.magnitude)
    }
}
