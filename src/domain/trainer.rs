use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::ValidationError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SocialLinks {
    pub instagram: String,
    pub twitter: String,
    pub linkedin: String,
}

impl Default for SocialLinks {
    fn default() -> Self {
        Self {
            instagram: "#".to_string(),
            twitter: "#".to_string(),
            linkedin: "#".to_string(),
        }
    }
}

/// Entry in the public trainer directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trainer {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    /// Free text, e.g. "8 years"
    pub experience: String,
    pub image_url: String,
    pub social_links: SocialLinks,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct TrainerForm {
    pub name: String,
    pub specialty: String,
    pub experience: String,
    pub image_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTrainer {
    pub name: String,
    pub specialty: String,
    pub experience: String,
    pub image_url: String,
}

impl TrainerForm {
    pub fn validate(self) -> Result<NewTrainer, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::new("name", "must not be empty"));
        }

        Ok(NewTrainer {
            name: name.to_string(),
            specialty: self.specialty.trim().to_string(),
            experience: self.experience.trim().to_string(),
            image_url: self.image_url.trim().to_string(),
        })
    }
}

impl NewTrainer {
    pub fn into_trainer(self, created_at: DateTime<Utc>) -> Trainer {
        Trainer {
            id: Uuid::new_v4(),
            name: self.name,
            specialty: self.specialty,
            experience: self.experience,
            image_url: self.image_url,
            social_links: SocialLinks::default(),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    #[test]
    fn test_blank_name_rejected() {
        let form = TrainerForm {
            name: "   ".to_string(),
            ..Default::default()
        };

        assert_that!(form.validate())
            .is_err()
            .matches(|err| err.field == "name");
    }

    #[test]
    fn test_into_trainer_placeholder_links() {
        let trainer = TrainerForm {
            name: " Vikram ".to_string(),
            specialty: "Strength".to_string(),
            experience: "8 years".to_string(),
            image_url: String::new(),
        }
        .validate()
        .unwrap()
        .into_trainer(Utc::now());

        assert_that!(trainer.name.as_str()).is_equal_to("Vikram");
        assert_that!(trainer.social_links.instagram.as_str()).is_equal_to("#");
    }
}
