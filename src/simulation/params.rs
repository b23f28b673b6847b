use std::str::FromStr;

use crate::config::{DEFAULT_BETA, DEFAULT_MU, DEFAULT_PERIOD, DEFAULT_RADIUS, DEFAULT_SIGMA};
use crate::error::{LeniaError, Result};

/// Physical parameters of a Lenia world.
///
/// `dx` and `dt` are derived from `radius` and `period` and cannot be set.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameters {
    /// Kernel radius in cells (R)
    pub radius: usize,
    /// Time steps per unit time (T)
    pub period: f64,
    /// Growth center (Mu)
    pub mu: f64,
    /// Growth width (Sigma)
    pub sigma: f64,
    /// Ring weights (Beta), one per concentric ring
    pub beta: Vec<f64>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            period: DEFAULT_PERIOD,
            mu: DEFAULT_MU,
            sigma: DEFAULT_SIGMA,
            beta: parse_beta(DEFAULT_BETA).unwrap_or_else(|_| vec![1.0]),
        }
    }
}

impl Parameters {
    pub fn new(radius: usize, period: f64, mu: f64, sigma: f64, beta: Vec<f64>) -> Self {
        Self {
            radius,
            period,
            mu,
            sigma,
            beta,
        }
    }

    /// Spatial step, `1/R`
    pub fn dx(&self) -> f64 {
        1.0 / self.radius as f64
    }

    /// Time step, `1/T`
    pub fn dt(&self) -> f64 {
        1.0 / self.period
    }

    /// Check every range constraint
    pub fn validate(&self) -> Result<()> {
        validate_radius(self.radius)?;
        validate_period(self.period)?;
        validate_mu(self.mu)?;
        validate_sigma(self.sigma)?;
        validate_beta(&self.beta)
    }

    /// Check that the kernel (side `2R+1`) fits a `rows x cols` grid
    pub fn validate_for_grid(&self, rows: usize, cols: usize) -> Result<()> {
        self.validate()?;
        let side = 2 * self.radius + 1;
        if side > rows || side > cols {
            return Err(LeniaError::invalid(
                "R",
                format!("kernel side {} does not fit a {}x{} grid", side, rows, cols),
            ));
        }
        Ok(())
    }

    /// Apply an update after validating it. On error `self` is unchanged.
    pub fn apply(&mut self, update: ParamUpdate) -> Result<()> {
        update.validate()?;
        match update {
            ParamUpdate::Radius(r) => self.radius = r,
            ParamUpdate::Period(t) => self.period = t,
            ParamUpdate::Mu(mu) => self.mu = mu,
            ParamUpdate::Sigma(sigma) => self.sigma = sigma,
            ParamUpdate::Beta(beta) => self.beta = beta,
        }
        Ok(())
    }
}

/// One parameter change from an external controller
#[derive(Clone, Debug, PartialEq)]
pub enum ParamUpdate {
    Radius(usize),
    Period(f64),
    Mu(f64),
    Sigma(f64),
    Beta(Vec<f64>),
}

impl ParamUpdate {
    /// Whether the kernel and its spectrum must be rebuilt
    pub fn affects_kernel(&self) -> bool {
        matches!(self, ParamUpdate::Radius(_) | ParamUpdate::Beta(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ParamUpdate::Radius(_) => "R",
            ParamUpdate::Period(_) => "T",
            ParamUpdate::Mu(_) => "Mu",
            ParamUpdate::Sigma(_) => "Sigma",
            ParamUpdate::Beta(_) => "Beta",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ParamUpdate::Radius(r) => validate_radius(*r),
            ParamUpdate::Period(t) => validate_period(*t),
            ParamUpdate::Mu(mu) => validate_mu(*mu),
            ParamUpdate::Sigma(sigma) => validate_sigma(*sigma),
            ParamUpdate::Beta(beta) => validate_beta(beta),
        }
    }
}

/// Parses `name=value`, e.g. `r=12`, `mu=0.15` or `beta=1,0.5`
impl FromStr for ParamUpdate {
    type Err = LeniaError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| LeniaError::invalid("update", format!("expected name=value, got '{}'", s)))?;
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "r" | "radius" => value
                .parse::<usize>()
                .map(ParamUpdate::Radius)
                .map_err(|e| LeniaError::invalid("R", format!("'{}': {}", value, e))),
            "t" | "period" => parse_real("T", value).map(ParamUpdate::Period),
            "mu" | "m" => parse_real("Mu", value).map(ParamUpdate::Mu),
            "sigma" | "s" => parse_real("Sigma", value).map(ParamUpdate::Sigma),
            "beta" | "b" => parse_beta(value).map(ParamUpdate::Beta),
            other => Err(LeniaError::invalid("update", format!("unknown parameter '{}'", other))),
        }
    }
}

fn parse_real(name: &'static str, value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .map_err(|e| LeniaError::invalid(name, format!("'{}': {}", value, e)))
}

/// Parse comma separated ring weights, e.g. `"1,0.6,0.3"`
pub fn parse_beta(s: &str) -> Result<Vec<f64>> {
    let beta = s
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| parse_real("Beta", v))
        .collect::<Result<Vec<f64>>>()?;
    validate_beta(&beta)?;
    Ok(beta)
}

fn validate_radius(radius: usize) -> Result<()> {
    if radius == 0 {
        return Err(LeniaError::invalid("R", "must be > 0"));
    }
    Ok(())
}

fn validate_period(period: f64) -> Result<()> {
    if !(period.is_finite() && period > 0.0) {
        return Err(LeniaError::invalid("T", format!("must be finite and > 0, got {}", period)));
    }
    Ok(())
}

fn validate_mu(mu: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&mu) {
        return Err(LeniaError::invalid("Mu", format!("must be in [0, 1], got {}", mu)));
    }
    Ok(())
}

fn validate_sigma(sigma: f64) -> Result<()> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(LeniaError::invalid("Sigma", format!("must be finite and > 0, got {}", sigma)));
    }
    Ok(())
}

fn validate_beta(beta: &[f64]) -> Result<()> {
    if beta.is_empty() {
        return Err(LeniaError::invalid("Beta", "needs at least one ring weight"));
    }
    if let Some(bad) = beta.iter().find(|b| !(b.is_finite() && **b >= 0.0)) {
        return Err(LeniaError::invalid(
            "Beta",
            format!("ring weights must be finite and >= 0, got {}", bad),
        ));
    }
    Ok(())
}
