//! Output vocabulary shared by the derivation and matching stages.

use cc_params::Mineralogy;

pub const CA: &str = "Ca(mol/kgw)";
pub const C: &str = "C(mol/kgw)";
pub const WATER_MASS: &str = "mass_H2O";
pub const F_CA: &str = "f_ca";
pub const F_C: &str = "f_c";
pub const D18O_PDB: &str = "d18O_PDB";
pub const R14C: &str = "R14C";
pub const DCP: &str = "DCP";
pub const D18O_PCP: &str = "d18O_PCP";
pub const D13C_KINETIC: &str = "d13C_calcite_kinetic";
pub const D18O_KINETIC: &str = "d18O_calcite_kinetic";

pub const TRACE_ELEMENTS: [&str; 4] = ["Ba", "Sr", "Mg", "U"];

/// Raw solver keys that carry no meaning once the run is post-processed.
pub const INTERNAL_KEYS: [&str; 5] = ["soln", WATER_MASS, "pct_err", "temp(C)", "I_R(14C)_CO2(aq)"];

pub fn molality(element: &str) -> String {
    format!("{element}(mol/kgw)")
}

/// Dissolved X/Ca ratio key, e.g. `Mg/Ca(mol/mol)`.
pub fn dissolved_ratio(element: &str) -> String {
    format!("{element}/Ca(mol/mol)")
}

/// Precipitate X/Ca ratio key, e.g. `Mg/Ca(mol/mol)_Calcite`.
pub fn precipitate_ratio(element: &str, mineralogy: Mineralogy) -> String {
    format!("{element}/Ca(mol/mol)_{mineralogy}")
}

/// Raw solver isotope ratio key for the precipitate, e.g. `I_R(18O)_Calcite`.
pub fn raw_isotope(isotope: &str, mineralogy: Mineralogy) -> String {
    format!("I_R({isotope})_{mineralogy}")
}

/// Renamed isotope key for the precipitate, e.g. `d13C_Aragonite`.
pub fn isotope(isotope: &str, mineralogy: Mineralogy) -> String {
    format!("d{isotope}_{mineralogy}")
}

/// Solver vocabulary to output vocabulary. Returns `None` for keys kept as-is.
///
/// `I_R(14C)_X` -> `R14C_X`, `I_R(13C)_X` -> `d13C_X`, `m_X` -> `X`,
/// `s_X` -> `moles_X`.
pub fn tidy_name(key: &str) -> Option<String> {
    if let Some(rest) = key.strip_prefix("I_R(") {
        let close = rest.find(')')?;
        let iso = &rest[..close];
        let tail = &rest[close + 1..];
        if iso == "14C" {
            Some(format!("R{iso}{tail}"))
        } else {
            Some(format!("d{iso}{tail}"))
        }
    } else if let Some(rest) = key.strip_prefix("m_") {
        Some(rest.to_string())
    } else {
        key.strip_prefix("s_").map(|rest| format!("moles_{rest}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tidy_names() {
        assert_eq!(tidy_name("I_R(14C)").as_deref(), Some("R14C"));
        assert_eq!(tidy_name("I_R(14C)_Calcite").as_deref(), Some("R14C_Calcite"));
        assert_eq!(tidy_name("I_R(18O)_Aragonite").as_deref(), Some("d18O_Aragonite"));
        assert_eq!(tidy_name("I_R(13C)_HCO3-").as_deref(), Some("d13C_HCO3-"));
        assert_eq!(tidy_name("m_Ca+2").as_deref(), Some("Ca+2"));
        assert_eq!(tidy_name("s_Calcite").as_deref(), Some("moles_Calcite"));
        assert_eq!(tidy_name("Ca(mol/kgw)"), None);
        assert_eq!(tidy_name("si_Calcite"), None);
    }

    #[test]
    fn mineral_keys() {
        assert_eq!(precipitate_ratio("U", Mineralogy::Aragonite), "U/Ca(mol/mol)_Aragonite");
        assert_eq!(raw_isotope("18O", Mineralogy::Calcite), "I_R(18O)_Calcite");
        assert_eq!(isotope("44Ca", Mineralogy::Calcite), "d44Ca_Calcite");
    }
}
