//! Pet profiles and the allergy picker.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use petbox_core::{CustomerId, ParseEnumError, PetGender, PetId, PetSize, Species};

/// Labels that mean "this pet has no allergies".
const NO_ALLERGY_LABELS: &[&str] = &["nenhuma", "none"];

fn is_no_allergy(label: &str) -> bool {
    let label = label.trim().to_lowercase();
    NO_ALLERGY_LABELS.contains(&label.as_str())
}

fn same_label(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Multi-select allergy list with an exclusive "no allergies" option.
///
/// Picking "Nenhuma" clears every other allergy, picking anything else clears
/// "Nenhuma", and picking an already selected item deselects it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllergySelection(Vec<String>);

impl AllergySelection {
    /// Build a selection by toggling each item in order.
    pub fn from_items<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = Self::default();
        for item in items {
            let item = item.as_ref();
            if !selection.contains(item) {
                selection.toggle(item);
            }
        }
        selection
    }

    /// Toggle `item`.
    pub fn toggle(&mut self, item: &str) {
        let item = item.trim();
        if item.is_empty() {
            return;
        }
        if self.contains(item) {
            self.0.retain(|existing| !same_label(existing, item));
        } else if is_no_allergy(item) {
            self.0.clear();
            self.0.push(item.to_owned());
        } else {
            self.0.retain(|existing| !is_no_allergy(existing));
            self.0.push(item.to_owned());
        }
    }

    /// Whether `item` is selected, ignoring case.
    #[must_use]
    pub fn contains(&self, item: &str) -> bool {
        self.0.iter().any(|existing| same_label(existing, item))
    }

    /// Selected labels, including the "no allergies" label if picked.
    #[must_use]
    pub fn items(&self) -> &[String] {
        &self.0
    }

    /// Allergies to store: the selection minus the "no allergies" label.
    #[must_use]
    pub fn to_persisted(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|item| !is_no_allergy(item))
            .cloned()
            .collect()
    }
}

/// Raw pet form as sent by the customization page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PetProfileForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub allergies: Vec<String>,
}

/// Why a pet form was rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PetProfileError {
    #[error("pet name is required")]
    MissingName,
    #[error(transparent)]
    InvalidChoice(#[from] ParseEnumError),
}

/// A validated pet profile kept in the session until onboarding completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetProfile {
    pub name: String,
    pub species: Species,
    pub breed: Option<String>,
    pub size: PetSize,
    pub gender: PetGender,
    pub birth_date: Option<NaiveDate>,
    pub allergies: AllergySelection,
}

impl PetProfile {
    /// Validate a submitted form, mapping UI codes onto stored enums.
    ///
    /// # Errors
    ///
    /// Returns `PetProfileError::MissingName` for a blank name and
    /// `PetProfileError::InvalidChoice` for an unknown species, size or gender.
    pub fn from_form(form: PetProfileForm) -> Result<Self, PetProfileError> {
        let name = form.name.trim().to_owned();
        if name.is_empty() {
            return Err(PetProfileError::MissingName);
        }

        Ok(Self {
            name,
            species: form.species.parse()?,
            breed: form
                .breed
                .map(|b| b.trim().to_owned())
                .filter(|b| !b.is_empty()),
            size: form.size.parse()?,
            gender: form.gender.parse()?,
            birth_date: form.birth_date,
            allergies: AllergySelection::from_items(&form.allergies),
        })
    }

    /// Insert payload for this profile.
    #[must_use]
    pub fn to_new_pet(&self) -> NewPet {
        NewPet {
            name: self.name.clone(),
            species: self.species,
            breed: self.breed.clone(),
            size: self.size,
            gender: self.gender,
            birth_date: self.birth_date,
            allergies: self.allergies.to_persisted(),
        }
    }
}

/// Insert payload for a pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPet {
    pub name: String,
    pub species: Species,
    pub breed: Option<String>,
    pub size: PetSize,
    pub gender: PetGender,
    pub birth_date: Option<NaiveDate>,
    pub allergies: Vec<String>,
}

/// A pet row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: PetId,
    pub customer_id: CustomerId,
    pub name: String,
    pub species: Species,
    pub breed: Option<String>,
    pub size: PetSize,
    pub gender: PetGender,
    pub birth_date: Option<NaiveDate>,
    pub allergies: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> PetProfileForm {
        PetProfileForm {
            name: " Thor ".to_owned(),
            species: "dog".to_owned(),
            breed: Some(String::new()),
            size: "G".to_owned(),
            gender: "boy".to_owned(),
            birth_date: NaiveDate::from_ymd_opt(2021, 3, 14),
            allergies: vec!["Frango".to_owned()],
        }
    }

    #[test]
    fn test_no_allergy_clears_others() {
        let mut selection = AllergySelection::from_items(["Frango", "Soja"]);
        selection.toggle("Nenhuma");
        assert_eq!(selection.items(), ["Nenhuma"]);
    }

    #[test]
    fn test_allergy_clears_no_allergy() {
        let mut selection = AllergySelection::from_items(["none"]);
        selection.toggle("Trigo");
        assert_eq!(selection.items(), ["Trigo"]);
    }

    #[test]
    fn test_toggle_deselects() {
        let mut selection = AllergySelection::from_items(["Frango", "Soja"]);
        selection.toggle("frango");
        assert_eq!(selection.items(), ["Soja"]);

        selection.toggle("Nenhuma");
        selection.toggle("NENHUMA");
        assert!(selection.items().is_empty());
    }

    #[test]
    fn test_no_allergy_never_persisted() {
        let selection = AllergySelection::from_items(["Nenhuma"]);
        assert!(selection.to_persisted().is_empty());

        let selection = AllergySelection::from_items(["Nenhuma", "Carne bovina"]);
        assert_eq!(selection.to_persisted(), vec!["Carne bovina".to_owned()]);
    }

    #[test]
    fn test_from_items_ignores_duplicates() {
        let selection = AllergySelection::from_items(["Soja", "SOJA", " "]);
        assert_eq!(selection.items(), ["Soja"]);
    }

    #[test]
    fn test_profile_maps_ui_codes() {
        let profile = PetProfile::from_form(form()).unwrap();
        assert_eq!(profile.name, "Thor");
        assert_eq!(profile.size, PetSize::Large);
        assert_eq!(profile.gender, PetGender::Male);
        assert_eq!(profile.species, Species::Dog);
        assert_eq!(profile.breed, None);
    }

    #[test]
    fn test_profile_requires_name() {
        let mut input = form();
        input.name = "  ".to_owned();
        assert_eq!(
            PetProfile::from_form(input),
            Err(PetProfileError::MissingName)
        );
    }

    #[test]
    fn test_profile_rejects_unknown_size() {
        let mut input = form();
        input.size = "XG".to_owned();
        assert!(matches!(
            PetProfile::from_form(input),
            Err(PetProfileError::InvalidChoice(_))
        ));
    }
}
