use serde::{Deserialize, Serialize};
use std::fmt;

/// MeanDRS reference runs: low, normal and high flow regimes.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Low,
    Nrm,
    Hig,
}

impl Scenario {
    /// Low, normal, high. The order agreement ties are broken in.
    pub const ALL: [Scenario; 3] = [Scenario::Low, Scenario::Nrm, Scenario::Hig];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Low => "low",
            Scenario::Nrm => "nrm",
            Scenario::Hig => "hig",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Scenario {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "low" => Ok(Scenario::Low),
            "nrm" => Ok(Scenario::Nrm),
            "hig" => Ok(Scenario::Hig),
            _ => Err(()),
        }
    }
}

/// One value per reference scenario.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScenarioSet<T> {
    pub low: T,
    pub nrm: T,
    pub hig: T,
}

impl<T> ScenarioSet<T> {
    pub fn from_fn<F: FnMut(Scenario) -> T>(mut f: F) -> Self {
        ScenarioSet {
            low: f(Scenario::Low),
            nrm: f(Scenario::Nrm),
            hig: f(Scenario::Hig),
        }
    }

    pub fn try_from_fn<E, F>(mut f: F) -> Result<Self, E>
    where
        F: FnMut(Scenario) -> Result<T, E>,
    {
        Ok(ScenarioSet {
            low: f(Scenario::Low)?,
            nrm: f(Scenario::Nrm)?,
            hig: f(Scenario::Hig)?,
        })
    }

    pub fn get(&self, scenario: Scenario) -> &T {
        match scenario {
            Scenario::Low => &self.low,
            Scenario::Nrm => &self.nrm,
            Scenario::Hig => &self.hig,
        }
    }

    pub fn get_mut(&mut self, scenario: Scenario) -> &mut T {
        match scenario {
            Scenario::Low => &mut self.low,
            Scenario::Nrm => &mut self.nrm,
            Scenario::Hig => &mut self.hig,
        }
    }

    pub fn map<U, F: FnMut(&T) -> U>(&self, mut f: F) -> ScenarioSet<U> {
        ScenarioSet {
            low: f(&self.low),
            nrm: f(&self.nrm),
            hig: f(&self.hig),
        }
    }
}
