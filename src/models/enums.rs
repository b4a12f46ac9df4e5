use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The serialized form is the same label `as_str` returns.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.trim().eq_ignore_ascii_case($s) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(ModelError::InvalidLabel {
                    field: stringify!($name).into(),
                    value: s.into(),
                })
            }
        }
    };
}

str_enum!(PneumoniaType {
    Bacterial => "Bacterial",
    Viral => "Viral",
});

str_enum!(Severity {
    Mild => "Mild",
    Moderate => "Moderate",
    Severe => "Severe",
});

str_enum!(PredictionLabel {
    Normal => "NORMAL",
    BacterialPneumonia => "BACTERIAL_PNEUMONIA",
    ViralPneumonia => "VIRAL_PNEUMONIA",
    NonXray => "NON_XRAY",
    NonXraySafety => "NON_XRAY_SAFETY",
    Covid => "COVID",
    Tb => "TB",
});

impl PredictionLabel {
    /// Labels that describe a clinical finding on a genuine chest X-ray.
    pub fn is_clinical_finding(&self) -> bool {
        matches!(
            self,
            Self::Normal | Self::BacterialPneumonia | Self::ViralPneumonia
        )
    }

    /// Labels whose results are shown to the clinician but never persisted.
    pub fn is_validation_only(&self) -> bool {
        matches!(
            self,
            Self::NonXray | Self::NonXraySafety | Self::Covid | Self::Tb
        )
    }
}

/// Diagnosis label reported by the inference service.
///
/// `Normal` and `Pneumonia` are matched case-insensitively; any other label
/// (e.g. a validation label such as `NON_XRAY`) is carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Diagnosis {
    Normal,
    Pneumonia,
    Other(String),
}

impl Diagnosis {
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        if label.eq_ignore_ascii_case("normal") {
            Self::Normal
        } else if label.eq_ignore_ascii_case("pneumonia") {
            Self::Pneumonia
        } else {
            Self::Other(label.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Normal => "Normal",
            Self::Pneumonia => "Pneumonia",
            Self::Other(label) => label,
        }
    }

    pub fn is_pneumonia(&self) -> bool {
        matches!(self, Self::Pneumonia)
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Diagnosis {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

impl From<Diagnosis> for String {
    fn from(diagnosis: Diagnosis) -> Self {
        diagnosis.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn severity_round_trip() {
        for (variant, s) in [
            (Severity::Mild, "Mild"),
            (Severity::Moderate, "Moderate"),
            (Severity::Severe, "Severe"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Severity::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn prediction_label_parses_case_insensitively() {
        assert_eq!(
            PredictionLabel::from_str("non_xray").unwrap(),
            PredictionLabel::NonXray
        );
        assert_eq!(PredictionLabel::from_str(" tb ").unwrap(), PredictionLabel::Tb);
        assert!(PredictionLabel::from_str("SARS").is_err());
    }

    #[test]
    fn prediction_label_serializes_as_label() {
        let json = serde_json::to_string(&PredictionLabel::BacterialPneumonia).unwrap();
        assert_eq!(json, "\"BACTERIAL_PNEUMONIA\"");
        let json = serde_json::to_string(&PneumoniaType::Viral).unwrap();
        assert_eq!(json, "\"Viral\"");
    }

    #[test]
    fn validation_and_clinical_labels_are_disjoint() {
        for label in [
            PredictionLabel::Normal,
            PredictionLabel::BacterialPneumonia,
            PredictionLabel::ViralPneumonia,
            PredictionLabel::NonXray,
            PredictionLabel::NonXraySafety,
            PredictionLabel::Covid,
            PredictionLabel::Tb,
        ] {
            assert_ne!(label.is_clinical_finding(), label.is_validation_only());
        }
    }

    #[test]
    fn diagnosis_canonical_spelling() {
        assert_eq!(Diagnosis::parse("PNEUMONIA"), Diagnosis::Pneumonia);
        assert_eq!(Diagnosis::parse("normal"), Diagnosis::Normal);
        assert_eq!(
            Diagnosis::parse("NON_XRAY"),
            Diagnosis::Other("NON_XRAY".into())
        );
        assert_eq!(Diagnosis::Pneumonia.to_string(), "Pneumonia");
    }

    #[test]
    fn diagnosis_serde_uses_plain_string() {
        let json = serde_json::to_string(&Diagnosis::Pneumonia).unwrap();
        assert_eq!(json, "\"Pneumonia\"");
        let back: Diagnosis = serde_json::from_str("\"COVID\"").unwrap();
        assert_eq!(back, Diagnosis::Other("COVID".into()));
    }
}
