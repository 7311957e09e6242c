//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainResult;
use crate::resource::{require, Resource};

/// User domain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    /// Store-assigned identifier
    pub id: i32,
    /// Display name
    pub name: String,
    /// Email address (unique across users)
    pub email: String,
    /// Creation timestamp assigned on insert
    pub created_at: DateTime<Utc>,
}

impl Resource for User {
    const NAME: &'static str = "User";
}

/// User data that passed the presence check and is ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// User creation request body.
///
/// Every field is optional at the wire level so a missing one can be reported
/// by name instead of as a generic decoding failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateUser {
    /// User display name
    #[cfg_attr(feature = "openapi", schema(example = "Ann"))]
    pub name: Option<String>,
    /// User email address
    #[cfg_attr(feature = "openapi", schema(example = "ann@x.com"))]
    pub email: Option<String>,
}

impl CreateUser {
    /// Check that every required field is present.
    pub fn into_new_user(self) -> DomainResult<NewUser> {
        Ok(NewUser {
            name: require(self.name, "name")?,
            email: require(self.email, "email")?,
        })
    }
}

/// User update request body. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateUser {
    /// New display name
    pub name: Option<String>,
    /// New email address
    pub email: Option<String>,
}

impl UpdateUser {
    /// True when the request carries no field to change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DomainError;

    #[test]
    fn test_create_user_requires_name_then_email() {
        let missing_both = CreateUser::default();
        assert_eq!(
            missing_both.into_new_user(),
            Err(DomainError::MissingField("name"))
        );

        let missing_email = CreateUser {
            name: Some("Ann".to_string()),
            email: None,
        };
        assert_eq!(
            missing_email.into_new_user().unwrap_err().to_string(),
            "email is required"
        );
    }

    #[test]
    fn test_create_user_with_all_fields() {
        let payload: CreateUser =
            serde_json::from_str(r#"{"name":"Ann","email":"ann@x.com"}"#).unwrap();
        let new_user = payload.into_new_user().unwrap();
        assert_eq!(new_user.name, "Ann");
        assert_eq!(new_user.email, "ann@x.com");
    }

    #[test]
    fn test_update_user_null_and_absent_are_both_unchanged() {
        let update: UpdateUser = serde_json::from_str(r#"{"name":null}"#).unwrap();
        assert!(update.is_empty());

        let update: UpdateUser = serde_json::from_str(r#"{"email":"new@x.com"}"#).unwrap();
        assert!(!update.is_empty());
        assert!(update.name.is_none());
    }

    #[test]
    fn test_user_serializes_camel_case() {
        let user = User {
            id: 7,
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], 7);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }
}
