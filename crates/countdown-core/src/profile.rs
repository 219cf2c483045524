use std::fmt;
use std::path::{Path, PathBuf};

use crate::color::{Rgb, PROFILE_PALETTE};

pub const DEFAULT_PROFILES: [(&str, &str); 6] = [
    ("Activate Immersion", "active.csv"),
    ("Passive Immersion", "passive.csv"),
    ("Phonetic Training", "phonetic.csv"),
    ("Output", "output.csv"),
    ("Soroban", "soroban.csv"),
    ("Anki/Migaku", "anki.csv"),
];
pub const DEFAULT_PROFILE_NAME: &str = "Activate Immersion";

const RESERVED_LABELS: [&str; 2] = ["add profile", "delete profile"];
const PATH_SEPARATORS: [char; 3] = ['/', '\\', ':'];
/// Characters with meaning in `settings.ini`, where names become keys and list items.
const SETTINGS_CHARACTERS: [char; 9] = ['=', ';', '#', '[', ']', '"', '\'', '|', '\n'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileError {
    Empty,
    PathSeparator,
    SettingsCharacter,
    AlreadyExists,
    NotCustom,
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ProfileError::Empty => "Profile name cannot be empty",
            ProfileError::PathSeparator => "Profile name cannot include path separators",
            ProfileError::SettingsCharacter => {
                "Profile name cannot include any of = ; # [ ] \" ' |"
            }
            ProfileError::AlreadyExists => "Profile already exists",
            ProfileError::NotCustom => "No custom profiles to delete",
        };
        f.write_str(text)
    }
}

impl std::error::Error for ProfileError {}

/// Built-in profiles followed by the user's custom ones, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileRegistry {
    custom: Vec<String>,
}

impl ProfileRegistry {
    /// Drops blanks, reserved names, built-in names and case-insensitive duplicates.
    pub fn new<I, S>(custom: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::default();
        for raw in custom {
            let label = raw.as_ref().trim();
            if label.is_empty() || is_reserved(label) || is_builtin(label) {
                continue;
            }
            if label.contains(SETTINGS_CHARACTERS) {
                continue;
            }
            if registry.contains(label) {
                continue;
            }
            registry.custom.push(label.to_owned());
        }
        registry
    }

    pub fn labels(&self) -> Vec<String> {
        DEFAULT_PROFILES
            .iter()
            .map(|(label, _)| (*label).to_owned())
            .chain(self.custom.iter().cloned())
            .collect()
    }

    pub fn custom(&self) -> &[String] {
        &self.custom
    }

    pub fn contains(&self, label: &str) -> bool {
        let needle = label.trim().to_lowercase();
        self.labels()
            .iter()
            .any(|existing| existing.to_lowercase() == needle)
    }

    pub fn file_name(&self, label: &str) -> String {
        if let Some((_, file)) = DEFAULT_PROFILES.iter().find(|(name, _)| *name == label) {
            return (*file).to_owned();
        }
        format!("{}.csv", strip_csv_suffix(label.trim()))
    }

    pub fn file_path(&self, data_dir: &Path, label: &str) -> PathBuf {
        data_dir.join(self.file_name(label))
    }

    /// Normalizes a user-typed name and checks it can become a new profile.
    pub fn validate_new(&self, raw: &str) -> Result<String, ProfileError> {
        let label = strip_csv_suffix(raw.trim()).trim().to_owned();
        if label.is_empty() {
            return Err(ProfileError::Empty);
        }
        if label.contains(PATH_SEPARATORS) {
            return Err(ProfileError::PathSeparator);
        }
        if label.contains(SETTINGS_CHARACTERS) {
            return Err(ProfileError::SettingsCharacter);
        }
        if is_reserved(&label) || self.contains(&label) {
            return Err(ProfileError::AlreadyExists);
        }
        Ok(label)
    }

    pub fn add(&mut self, raw: &str) -> Result<String, ProfileError> {
        let label = self.validate_new(raw)?;
        self.custom.push(label.clone());
        Ok(label)
    }

    pub fn remove(&mut self, label: &str) -> Result<(), ProfileError> {
        let Some(idx) = self.custom.iter().position(|existing| existing == label) else {
            return Err(ProfileError::NotCustom);
        };
        self.custom.remove(idx);
        Ok(())
    }

    /// The stored active profile when it still exists, otherwise the default one.
    pub fn resolve_active(&self, stored: Option<&str>) -> String {
        let candidate = stored.map(str::trim).filter(|value| !value.is_empty());
        match candidate {
            Some(label) if self.labels().iter().any(|existing| existing == label) => {
                label.to_owned()
            }
            _ => DEFAULT_PROFILE_NAME.to_owned(),
        }
    }
}

pub fn is_builtin(label: &str) -> bool {
    DEFAULT_PROFILES.iter().any(|(name, _)| *name == label)
}

pub fn is_reserved(label: &str) -> bool {
    let normalized = label.trim().to_lowercase();
    RESERVED_LABELS.contains(&normalized.as_str())
}

/// Settings key for a profile's daily super goal.
pub fn super_goal_key(label: &str) -> String {
    let clean = label.trim().to_lowercase();
    if clean.is_empty() {
        return "default".to_owned();
    }
    clean
        .chars()
        .map(|ch| if PATH_SEPARATORS.contains(&ch) { '_' } else { ch })
        .collect()
}

pub fn color_key(label: &str) -> String {
    label.trim().to_lowercase()
}

pub fn palette_color(label: &str) -> Rgb {
    let seed: u32 = label.trim().to_lowercase().chars().map(u32::from).sum();
    PROFILE_PALETTE[seed as usize % PROFILE_PALETTE.len()]
}

fn strip_csv_suffix(label: &str) -> &str {
    let split = label
        .len()
        .checked_sub(4)
        .and_then(|idx| label.get(idx..).map(|tail| (idx, tail)));
    match split {
        Some((idx, tail)) if tail.eq_ignore_ascii_case(".csv") => &label[..idx],
        _ => label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_list_is_sanitized() {
        let registry = ProfileRegistry::new([
            " Reading ",
            "reading",
            "",
            "Add Profile",
            "Output",
            "Drawing",
            "Bad=Name",
        ]);
        assert_eq!(registry.custom(), ["Reading".to_owned(), "Drawing".to_owned()]);
        assert_eq!(registry.labels().len(), DEFAULT_PROFILES.len() + 2);
    }

    #[test]
    fn validation_rejects_bad_names() {
        let registry = ProfileRegistry::new(["Reading"]);
        assert_eq!(registry.validate_new("  "), Err(ProfileError::Empty));
        assert_eq!(registry.validate_new(".csv"), Err(ProfileError::Empty));
        assert_eq!(registry.validate_new("a/b"), Err(ProfileError::PathSeparator));
        assert_eq!(registry.validate_new("c:d"), Err(ProfileError::PathSeparator));
        for name in ["Reading=Fun", "#1 Focus", "; notes", "[x]", "a|b", "\"q\"", "'q"] {
            assert_eq!(registry.validate_new(name), Err(ProfileError::SettingsCharacter));
        }
        assert_eq!(registry.validate_new("READING"), Err(ProfileError::AlreadyExists));
        assert_eq!(registry.validate_new("soroban"), Err(ProfileError::AlreadyExists));
        assert_eq!(registry.validate_new("delete profile"), Err(ProfileError::AlreadyExists));
        assert_eq!(registry.validate_new("Kanji.CSV"), Ok("Kanji".to_owned()));
    }

    #[test]
    fn file_names_follow_profile_kind() {
        let mut registry = ProfileRegistry::default();
        registry.add("Kanji").unwrap();
        assert_eq!(registry.file_name("Anki/Migaku"), "anki.csv");
        assert_eq!(registry.file_name("Kanji"), "Kanji.csv");
        assert_eq!(
            registry.file_path(Path::new("data"), "Output"),
            Path::new("data").join("output.csv")
        );
    }

    #[test]
    fn only_custom_profiles_are_removable() {
        let mut registry = ProfileRegistry::new(["Kanji"]);
        assert_eq!(registry.remove("Output"), Err(ProfileError::NotCustom));
        assert_eq!(registry.remove("Kanji"), Ok(()));
        assert!(registry.custom().is_empty());
    }

    #[test]
    fn active_profile_falls_back_to_default() {
        let registry = ProfileRegistry::new(["Kanji"]);
        assert_eq!(registry.resolve_active(Some("Kanji")), "Kanji");
        assert_eq!(registry.resolve_active(Some("Gone")), DEFAULT_PROFILE_NAME);
        assert_eq!(registry.resolve_active(None), DEFAULT_PROFILE_NAME);
    }

    #[test]
    fn keys_are_normalized() {
        assert_eq!(super_goal_key("Anki/Migaku"), "anki_migaku");
        assert_eq!(super_goal_key("  "), "default");
        assert_eq!(color_key(" Output "), "output");
        assert_eq!(palette_color("Output"), palette_color("output"));
    }
}
