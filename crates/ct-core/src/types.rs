//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Primary key of a stored record (cycle, symptom, mood or medication).
pub type RecordId = i64;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A string did not name any known variant.
    #[error("unknown {field}: {value}")]
    UnknownValue { field: &'static str, value: String },

    /// A day count was negative or too large.
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },

    /// A structured column could not be decoded.
    #[error("malformed {field}: {value}")]
    Malformed { field: &'static str, value: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated user identifier.
    ///
    /// User IDs must be non-empty. Every record belongs to exactly one user.
    UserId, "user ID"
);

/// Generates a closed enum whose variants map one-to-one onto a storage string
/// and a display label.
///
/// The storage string is what the record store holds and what serde emits;
/// the label is what gets shown to a person.
macro_rules! define_record_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => ($value:literal, $label:literal)
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// String representation for storage and serialization.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            /// Human-readable label for display.
            #[must_use]
            pub const fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(ValidationError::UnknownValue {
                        field: $field_name,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

define_record_enum!(
    /// Kinds of physical symptom a user can log.
    SymptomType, "symptom type" {
        Cramps => ("cramps", "Cramps"),
        Headache => ("headache", "Headache"),
        Backache => ("backache", "Backache"),
        Nausea => ("nausea", "Nausea"),
        Fatigue => ("fatigue", "Fatigue"),
        Bloating => ("bloating", "Bloating"),
        BreastTenderness => ("breast_tenderness", "Breast tenderness"),
        Acne => ("acne", "Acne"),
        Insomnia => ("insomnia", "Insomnia"),
        Dizziness => ("dizziness", "Dizziness"),
        Cravings => ("cravings", "Cravings"),
        Diarrhea => ("diarrhea", "Diarrhea"),
        Constipation => ("constipation", "Constipation"),
        Other => ("other", "Other"),
    }
);

define_record_enum!(
    /// How strongly a symptom was felt.
    SymptomIntensity, "symptom intensity" {
        Light => ("light", "Light"),
        Medium => ("medium", "Medium"),
        Severe => ("severe", "Severe"),
    }
);

define_record_enum!(
    /// Kinds of mood a user can log.
    MoodType, "mood type" {
        Happy => ("happy", "Happy"),
        Energetic => ("energetic", "Energetic"),
        Calm => ("calm", "Calm"),
        Irritable => ("irritable", "Irritable"),
        Anxious => ("anxious", "Anxious"),
        Sad => ("sad", "Sad"),
        Depressed => ("depressed", "Depressed"),
        MoodSwings => ("mood_swings", "Mood swings"),
        Sensitive => ("sensitive", "Sensitive"),
        Stressed => ("stressed", "Stressed"),
        Other => ("other", "Other"),
    }
);

define_record_enum!(
    /// How strongly a mood was felt.
    MoodIntensity, "mood intensity" {
        Slight => ("slight", "Slight"),
        Moderate => ("moderate", "Moderate"),
        Strong => ("strong", "Strong"),
    }
);

define_record_enum!(
    /// Day of the week a recurring medication is due.
    Weekday, "weekday" {
        Monday => ("monday", "Monday"),
        Tuesday => ("tuesday", "Tuesday"),
        Wednesday => ("wednesday", "Wednesday"),
        Thursday => ("thursday", "Thursday"),
        Friday => ("friday", "Friday"),
        Saturday => ("saturday", "Saturday"),
        Sunday => ("sunday", "Sunday"),
    }
);

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}
