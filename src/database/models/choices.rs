//! Fixed choice sets. Each one is stored as a text column and travels as a
//! snake_case string on the wire.

use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef};
use sqlx::{Decode, Encode, Postgres, Type};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("\"{value}\" is not a valid {kind}; expected one of: {expected}")]
pub struct ChoiceError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($label:literal) {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ChoiceError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    other => Err(ChoiceError {
                        kind: $label,
                        value: other.to_string(),
                        expected: [$($text),+].join(", "),
                    }),
                }
            }
        }

        impl Type<Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <&str as Type<Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <&str as Type<Postgres>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $name {
            fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
                let text = <&str as Decode<Postgres>>::decode(value)?;
                Ok(text.parse::<$name>()?)
            }
        }

        impl<'q> Encode<'q, Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> IsNull {
                <&str as Encode<Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

choice_enum! {
    pub enum HiveStatus ("hive status") {
        Active => "active",
        Pending => "pending",
        Destroyed => "destroyed",
    }
}

choice_enum! {
    pub enum BeeSpecies ("bee species") {
        BlackBee => "black_bee",
        ItalianBee => "italian_bee",
        CaucasianBee => "caucasian_bee",
        CarnolianBee => "carnolian_bee",
        BuckfastBee => "buckfast_bee",
    }
}

choice_enum! {
    pub enum InterventionType ("intervention type") {
        ArtificialSwarming => "artificial_swarming",
        DestructionQueenCells => "destruction_queen_cells",
        Harvest => "harvest",
        HealthCheck => "health_check",
        SuperInstallation => "super_installation",
        SyrupDistribution => "syrup_distribution",
        Treatment => "treatment",
    }
}

choice_enum! {
    pub enum SyrupType ("syrup type") {
        Nectar => "nectar",
        CaneSugar => "cane_sugar",
        WhiteSugar => "white_sugar",
        RawSugar => "raw_sugar",
    }
}

choice_enum! {
    pub enum TreatmentType ("treatment type") {
        Antifungal => "antifungal",
        Apivar => "apivar",
        OxalicAcid => "oxalic_acid",
    }
}

choice_enum! {
    pub enum ContaminationType ("contamination type") {
        Parasite => "parasite",
        Illness => "illness",
    }
}

choice_enum! {
    /// Tag stored in `interventions.content_type`.
    pub enum DetailKind ("detail type") {
        Harvest => "harvest",
        SyrupDistribution => "syrup_distribution",
        Treatment => "treatment",
        Hive => "hive",
    }
}

impl InterventionType {
    /// The detail record an intervention of this type points at, if any.
    pub fn detail_kind(&self) -> Option<DetailKind> {
        match self {
            InterventionType::ArtificialSwarming => Some(DetailKind::Hive),
            InterventionType::Harvest => Some(DetailKind::Harvest),
            InterventionType::SyrupDistribution => Some(DetailKind::SyrupDistribution),
            InterventionType::Treatment => Some(DetailKind::Treatment),
            InterventionType::DestructionQueenCells
            | InterventionType::HealthCheck
            | InterventionType::SuperInstallation => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names() {
        assert_eq!("buckfast_bee".parse::<BeeSpecies>().unwrap(), BeeSpecies::BuckfastBee);
        assert_eq!("oxalic_acid".parse::<TreatmentType>().unwrap(), TreatmentType::OxalicAcid);
        assert_eq!(InterventionType::HealthCheck.to_string(), "health_check");
    }

    #[test]
    fn rejects_unknown_choice_with_expected_list() {
        let err = "Health Check".parse::<InterventionType>().unwrap_err();
        assert_eq!(err.kind, "intervention type");
        assert!(err.expected.contains("health_check"));
        assert!(err.to_string().contains("\"Health Check\""));
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let json = serde_json::to_string(&SyrupType::CaneSugar).unwrap();
        assert_eq!(json, "\"cane_sugar\"");
        let back: SyrupType = serde_json::from_str("\"raw_sugar\"").unwrap();
        assert_eq!(back, SyrupType::RawSugar);
    }

    #[test]
    fn payload_less_types_have_no_detail_kind() {
        let without: Vec<_> = InterventionType::ALL
            .iter()
            .filter(|t| t.detail_kind().is_none())
            .collect();
        assert_eq!(without.len(), 3);
        assert_eq!(InterventionType::ArtificialSwarming.detail_kind(), Some(DetailKind::Hive));
    }
}
