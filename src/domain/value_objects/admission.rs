//! Event admission - whether attending an event costs money

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether an event is free or paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Admission {
    Free,
    Paid,
}

impl Admission {
    pub fn as_str(self) -> &'static str {
        match self {
            Admission::Free => "free",
            Admission::Paid => "paid",
        }
    }
}

impl fmt::Display for Admission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown admission type: {0}")]
pub struct ParseAdmissionError(pub String);

impl FromStr for Admission {
    type Err = ParseAdmissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Admission::Free),
            "paid" => Ok(Admission::Paid),
            _ => Err(ParseAdmissionError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Free".parse::<Admission>().unwrap(), Admission::Free);
        assert_eq!(" paid ".parse::<Admission>().unwrap(), Admission::Paid);
        assert!("donation".parse::<Admission>().is_err());
    }
}
