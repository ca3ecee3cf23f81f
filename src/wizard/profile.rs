use anyhow::Result;

use super::login::ValidationError;
use crate::backend::{Backend, TaskRecord};
use crate::session::{SessionContext, UserId};

/// Demographic form as typed by the participant
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub age: String,
    pub gender: String,
    pub pd_status: String,
}

impl ProfileForm {
    /// All three fields are required; age must be a positive whole number
    pub fn validate(&self, user_id: &UserId) -> Result<TaskRecord, ValidationError> {
        let age = self.age.trim();
        let gender = self.gender.trim();
        let pd_status = self.pd_status.trim();

        if age.is_empty() {
            return Err(ValidationError::MissingField("age"));
        }
        if gender.is_empty() {
            return Err(ValidationError::MissingField("gender"));
        }
        if pd_status.is_empty() {
            return Err(ValidationError::MissingField("PD status"));
        }

        let age = age
            .parse::<u32>()
            .ok()
            .filter(|&a| a > 0)
            .ok_or_else(|| ValidationError::InvalidAge(age.to_string()))?;

        Ok(TaskRecord {
            age: Some(age),
            gender: Some(gender.to_string()),
            pd_status: Some(pd_status.to_string()),
            ..TaskRecord::for_user(user_id)
        })
    }
}

pub async fn submit_profile(backend: &dyn Backend, session: &SessionContext, form: &ProfileForm) -> Result<TaskRecord> {
    let user_id = session.require_user()?;
    let record = form.validate(user_id)?;
    backend.save_task_data(&record).await?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(age: &str, gender: &str, pd: &str) -> ProfileForm {
        ProfileForm {
            age: age.to_string(),
            gender: gender.to_string(),
            pd_status: pd.to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let user = UserId::new("u1");
        let record = form(" 64 ", "female", "diagnosed").validate(&user).unwrap();

        assert_eq!(record.user_id, Some(user));
        assert_eq!(record.age, Some(64));
        assert_eq!(record.gender.as_deref(), Some("female"));
        assert_eq!(record.pd_status.as_deref(), Some("diagnosed"));
        assert!(record.task2_recording_url.is_none());
    }

    #[test]
    fn test_missing_fields() {
        let user = UserId::new("u1");
        assert_eq!(
            form("", "m", "none").validate(&user),
            Err(ValidationError::MissingField("age"))
        );
        assert_eq!(
            form("50", " ", "none").validate(&user),
            Err(ValidationError::MissingField("gender"))
        );
        assert_eq!(
            form("50", "m", "").validate(&user),
            Err(ValidationError::MissingField("PD status"))
        );
    }

    #[test]
    fn test_bad_age() {
        let user = UserId::new("u1");
        assert_eq!(
            form("sixty", "m", "none").validate(&user),
            Err(ValidationError::InvalidAge("sixty".to_string()))
        );
        assert_eq!(
            form("0", "m", "none").validate(&user),
            Err(ValidationError::InvalidAge("0".to_string()))
        );
    }
}
