use serde::Serialize;
use std::time::Duration;

/// One timed recording task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseDefinition {
    /// Position within its sequence
    pub ordinal: usize,

    /// Short name used in logs and clip file names (`reading`, `vowel-a`)
    pub name: String,

    /// Length of the recording window
    pub duration: Duration,
}

impl ExerciseDefinition {
    pub fn new(ordinal: usize, name: impl Into<String>, duration: Duration) -> Self {
        Self {
            ordinal,
            name: name.into(),
            duration,
        }
    }

    /// The single read-aloud exercise
    pub fn reading(duration: Duration) -> Vec<Self> {
        vec![Self::new(0, "reading", duration)]
    }

    /// One sustained-vowel exercise per vowel, in order
    pub fn vowels<S: AsRef<str>>(vowels: &[S], duration: Duration) -> Vec<Self> {
        vowels
            .iter()
            .enumerate()
            .map(|(ordinal, vowel)| Self::new(ordinal, format!("vowel-{}", vowel.as_ref()), duration))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vowel_definitions_are_ordered() {
        let defs = ExerciseDefinition::vowels(&["a", "e", "i", "o", "u"], Duration::from_secs(5));

        assert_eq!(defs.len(), 5);
        for (i, def) in defs.iter().enumerate() {
            assert_eq!(def.ordinal, i);
            assert_eq!(def.duration, Duration::from_secs(5));
        }
        assert_eq!(defs[0].name, "vowel-a");
        assert_eq!(defs[4].name, "vowel-u");
    }

    #[test]
    fn test_reading_is_single_exercise() {
        let defs = ExerciseDefinition::reading(Duration::from_secs(10));
        assert_eq!(defs, vec![ExerciseDefinition::new(0, "reading", Duration::from_secs(10))]);
    }
}
