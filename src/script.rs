use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::vision::normalize::TensorShape;

/// Numeral scripts with a recognition backend.
///
/// Every per-script constant hangs off this enum so that adding a script is
/// a matter of extending the `match` arms the compiler points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    Decimal,
    Devanagari,
}

impl Script {
    pub const ALL: [Script; 2] = [Script::Decimal, Script::Devanagari];

    /// Identifier used as `model_type` on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Script::Decimal => "decimal",
            Script::Devanagari => "devanagari",
        }
    }

    /// Multipart field carrying the image on this script's backend.
    pub fn field_name(self) -> &'static str {
        match self {
            Script::Decimal => "file",
            Script::Devanagari => "image",
        }
    }

    /// Input tensor the script's classifier is trained on.
    pub fn tensor_shape(self) -> TensorShape {
        match self {
            Script::Decimal => TensorShape::new(28, 28, 1),
            Script::Devanagari => TensorShape::new(64, 64, 3),
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Script::Decimal => 5100,
            Script::Devanagari => 5200,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Script::Decimal => "Decimal",
            Script::Devanagari => "Devanagari",
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Script {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Script::ALL
            .into_iter()
            .find(|script| script.as_str() == s)
            .ok_or_else(|| ValidationError::UnsupportedModelType(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_identifiers_exactly() {
        assert_eq!("decimal".parse::<Script>().unwrap(), Script::Decimal);
        assert_eq!("devanagari".parse::<Script>().unwrap(), Script::Devanagari);
        assert!("Decimal".parse::<Script>().is_err());
        assert!("roman".parse::<Script>().is_err());
    }

    #[test]
    fn per_script_constants() {
        assert_eq!(Script::Decimal.field_name(), "file");
        assert_eq!(Script::Devanagari.field_name(), "image");
        assert_eq!(Script::Decimal.tensor_shape(), TensorShape::new(28, 28, 1));
        assert_eq!(Script::Devanagari.tensor_shape(), TensorShape::new(64, 64, 3));
    }
}
