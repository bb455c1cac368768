use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    North,
    South,
    East,
    West,
    Central,
}

impl Region {
    pub const ALL: [Region; 5] =
        [Region::North, Region::South, Region::East, Region::West, Region::Central];

    /// Lowercase token used in prompts and the classifier vocabulary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
            Self::Central => "central",
        }
    }

    /// Capitalized name stored in the `region` columns.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Self::North => "North",
            Self::South => "South",
            Self::East => "East",
            Self::West => "West",
            Self::Central => "Central",
        }
    }
}

impl FromStr for Region {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|region| region.as_str() == normalized)
            .ok_or_else(|| DomainError::UnknownRegion(value.trim().to_string()))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Capitalizes the first character and lowercases the rest, matching how region and category
/// labels are displayed.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{capitalize, Region};
    use crate::errors::DomainError;

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!("NORTH".parse::<Region>(), Ok(Region::North));
        assert_eq!(" central ".parse::<Region>(), Ok(Region::Central));
    }

    #[test]
    fn unknown_region_is_rejected() {
        assert_eq!(
            "atlantis".parse::<Region>(),
            Err(DomainError::UnknownRegion("atlantis".to_string()))
        );
    }

    #[test]
    fn canonical_names_are_capitalized() {
        let names: Vec<_> = Region::ALL.iter().map(Region::canonical_name).collect();
        assert_eq!(names, vec!["North", "South", "East", "West", "Central"]);
        assert_eq!(capitalize("sOUTH"), "South");
        assert_eq!(capitalize(""), "");
    }
}
