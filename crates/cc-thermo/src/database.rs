//! Flat-file database reader with per-instance lookup caches.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use cc_core::{ensure_finite, normalize_kelvin};
use tracing::debug;

use crate::error::{ThermoError, ThermoResult};
use crate::expression::evaluate_analytic;

/// Nested `-add_logk` references deeper than this are rejected.
const MAX_INDIRECTION: usize = 8;

/// Thermodynamic data found for one PHASES reaction.
///
/// Entries not present in the database are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KValues {
    pub log_k: Option<f64>,
    pub delta_h: Option<f64>,
    pub gamma: Option<f64>,
    /// The raw `-analytic` line, as written in the database.
    pub analytic_line: Option<String>,
    /// `analytic_line` evaluated at the requested temperature.
    pub analytic_value: Option<f64>,
}

/// Reads reaction constants and fractionation factors from a PHREEQC-style
/// database.
///
/// The file is read once on construction. Results are cached by lookup key
/// and temperature for the lifetime of the reader.
#[derive(Debug, Clone)]
pub struct ThermoDatabase {
    source: PathBuf,
    lines: Vec<String>,
    k_cache: HashMap<(String, u64), KValues>,
    alpha_cache: HashMap<(String, String, u64), f64>,
}

impl ThermoDatabase {
    pub fn open(path: impl AsRef<Path>) -> ThermoResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ThermoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_text(path, &text))
    }

    /// Build a reader over in-memory database text. `source` is only used in
    /// diagnostics.
    pub fn from_text(source: impl Into<PathBuf>, text: &str) -> Self {
        Self {
            source: source.into(),
            lines: text.lines().map(str::to_string).collect(),
            k_cache: HashMap::new(),
            alpha_cache: HashMap::new(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Look up the PHASES reaction formed by `reactants` and evaluate any
    /// analytic expression at `temperature_k`.
    pub fn get_k_values(&mut self, reactants: &[&str], temperature_k: f64) -> ThermoResult<KValues> {
        let t = normalize_kelvin(temperature_k);
        let reaction = reactants.join(" + ");
        let cache_key = (reaction.clone(), t.to_bits());
        if let Some(hit) = self.k_cache.get(&cache_key) {
            return Ok(hit.clone());
        }

        let body = self
            .block_after(|line| matches_reaction_header(line, &reaction))
            .ok_or_else(|| ThermoError::EntryNotFound {
                section: "PHASES",
                key: reaction.clone(),
            })?;

        let mut values = KValues::default();
        for tokens in &body {
            match tokens[0].as_str() {
                "log_k" | "-log_k" => values.log_k = Some(parse_token(&reaction, tokens, 1)?),
                "delta_h" | "-delta_h" => {
                    values.delta_h = Some(parse_token(&reaction, tokens, 1)?)
                }
                "-gamma" => values.gamma = Some(parse_token(&reaction, tokens, 1)?),
                "-analytic" | "-analytical_expression" => {
                    let coefficients = parse_coefficients(&reaction, &tokens[1..])?;
                    values.analytic_line = Some(tokens.join(" "));
                    values.analytic_value = Some(analytic(&reaction, &coefficients, t)?);
                }
                _ => {}
            }
        }

        debug!(reaction = %reaction, t_k = t, "database k values resolved");
        self.k_cache.insert(cache_key, values.clone());
        Ok(values)
    }

    /// 1000·ln(alpha) for `isotope` fractionating between the two species in
    /// `species_pair` (e.g. `"CO2(g)/CO2(aq)"`).
    pub fn get_1000lnalpha(
        &mut self,
        isotope: &str,
        species_pair: &str,
        temperature_k: f64,
    ) -> ThermoResult<f64> {
        let t = normalize_kelvin(temperature_k);
        self.lnalpha_at(isotope, species_pair, t, 0)
    }

    /// `exp(0.001 * get_1000lnalpha(..))`.
    pub fn get_alpha(
        &mut self,
        isotope: &str,
        species_pair: &str,
        temperature_k: f64,
    ) -> ThermoResult<f64> {
        let ln1000a = self.get_1000lnalpha(isotope, species_pair, temperature_k)?;
        Ok((0.001 * ln1000a).exp())
    }

    /// Absolute abundance ratio of `isotope` in its reference standard, from
    /// the last matching `-isotope [X]` line.
    pub fn get_iso_stnd(&self, isotope: &str) -> ThermoResult<f64> {
        let bracketed = format!("[{isotope}]");
        let line = self
            .lines
            .iter()
            .rev()
            .find(|line| {
                let mut tokens = line.split_whitespace();
                tokens.next() == Some("-isotope") && tokens.next() == Some(bracketed.as_str())
            })
            .ok_or_else(|| ThermoError::IsotopeStandardNotFound {
                isotope: isotope.to_string(),
            })?;

        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        parse_token(&format!("-isotope {bracketed}"), &tokens, 3)
    }

    fn lnalpha_at(
        &mut self,
        isotope: &str,
        species_pair: &str,
        t: f64,
        depth: usize,
    ) -> ThermoResult<f64> {
        let name = format!("Log_alpha_{isotope}_{species_pair}");
        if depth > MAX_INDIRECTION {
            return Err(ThermoError::IndirectionTooDeep { key: name });
        }

        let cache_key = (isotope.to_string(), species_pair.to_string(), t.to_bits());
        if let Some(hit) = self.alpha_cache.get(&cache_key) {
            return Ok(*hit);
        }

        let body = self
            .block_after(|line| line.split_whitespace().next() == Some(name.as_str()))
            .ok_or_else(|| ThermoError::EntryNotFound {
                section: "NAMED_EXPRESSIONS",
                key: name.clone(),
            })?;

        let mut value = 0.0;
        for tokens in &body {
            match tokens[0].as_str() {
                "-add_logk" => {
                    let target = tokens.get(1).ok_or_else(|| ThermoError::Parse {
                        entry: name.clone(),
                        token: tokens.join(" "),
                    })?;
                    let (ref_isotope, ref_species) = split_expression_name(target).ok_or_else(|| {
                        ThermoError::Parse {
                            entry: name.clone(),
                            token: target.clone(),
                        }
                    })?;
                    let multiplier = parse_token(&name, tokens, 2)?;
                    value += multiplier * self.lnalpha_at(&ref_isotope, &ref_species, t, depth + 1)?;
                }
                "-ln_alpha1000" => {
                    let coefficients = parse_coefficients(&name, &tokens[1..])?;
                    value += analytic(&name, &coefficients, t)?;
                }
                _ => {}
            }
        }

        self.alpha_cache.insert(cache_key, value);
        Ok(value)
    }

    /// Token lists of the indented lines following the first header for
    /// which `is_header` holds, up to the next blank line.
    fn block_after(&self, is_header: impl Fn(&str) -> bool) -> Option<Vec<Vec<String>>> {
        let start = self.lines.iter().position(|line| is_header(line))?;
        let mut block = Vec::new();
        for line in &self.lines[start + 1..] {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed == "#" {
                break;
            }
            let tokens: Vec<String> = strip_comment(trimmed)
                .split_whitespace()
                .map(str::to_string)
                .collect();
            if !tokens.is_empty() {
                block.push(tokens);
            }
        }
        Some(block)
    }
}

fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or("")
}

fn matches_reaction_header(line: &str, reaction: &str) -> bool {
    line.trim_start()
        .strip_prefix(reaction)
        .is_some_and(|rest| rest.trim_start().starts_with('='))
}

/// `Log_alpha_13C_CO2(g)/CO2(aq)` -> (`13C`, `CO2(g)/CO2(aq)`).
fn split_expression_name(name: &str) -> Option<(String, String)> {
    let mut parts = name.splitn(4, '_');
    let _log = parts.next()?;
    let _alpha = parts.next()?;
    let isotope = parts.next()?;
    let species = parts.next()?;
    Some((isotope.to_string(), species.to_string()))
}

fn analytic(entry: &str, coefficients: &[f64], t: f64) -> ThermoResult<f64> {
    ensure_finite(evaluate_analytic(coefficients, t), "analytic expression").map_err(|source| {
        ThermoError::Numeric {
            entry: entry.to_string(),
            source,
        }
    })
}

fn parse_token(entry: &str, tokens: &[String], index: usize) -> ThermoResult<f64> {
    let token = tokens.get(index).ok_or_else(|| ThermoError::Parse {
        entry: entry.to_string(),
        token: tokens.join(" "),
    })?;
    token.parse::<f64>().map_err(|_| ThermoError::Parse {
        entry: entry.to_string(),
        token: token.clone(),
    })
}

fn parse_coefficients(entry: &str, tokens: &[String]) -> ThermoResult<Vec<f64>> {
    tokens
        .iter()
        .map(|token| {
            token.parse::<f64>().map_err(|_| ThermoError::Parse {
                entry: entry.to_string(),
                token: token.clone(),
            })
        })
        .collect()
}
