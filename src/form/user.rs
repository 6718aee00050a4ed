use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::job::into_object;
use super::{json_source, lenient_string, EditBuffer};
use crate::config::{ApiRoutes, FrontRoutes};
use crate::controller::error::FormError;

/// The user form's edit buffer. On update an empty `password` or `gauth` keeps the
/// stored value.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UserBuffer {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, deserialize_with = "json_source")]
    pub ip_list: String,
    #[serde(default)]
    pub gauth: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_active: bool,
}

impl EditBuffer for UserBuffer {
    const JSON_FIELD: &'static str = "ip_list";

    fn id(&self) -> Option<String> {
        self.id.clone()
    }

    fn kind(&self) -> String {
        String::from("user")
    }

    fn json_source(&self) -> &str {
        &self.ip_list
    }

    fn payload_fields(&self) -> Result<Map<String, Value>, FormError> {
        let mut fields = into_object(serde_json::to_value(self))?;
        fields.remove(Self::JSON_FIELD);
        Ok(fields)
    }

    fn collection_route(routes: &ApiRoutes) -> &str {
        &routes.users
    }

    fn item_route(routes: &ApiRoutes) -> &str {
        &routes.user
    }

    fn list_view(routes: &FrontRoutes) -> &str {
        &routes.users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hydrates_from_fetched_record_with_numeric_id() {
        let buffer: UserBuffer = serde_json::from_value(json!({
            "id": 7,
            "username": "ops",
            "ip_list": ["10.0.0.1"],
            "permissions": ["get_jobs_view"],
            "is_admin": false,
            "is_active": true,
            "created_at": "2024-01-01 00:00:00"
        }))
        .unwrap();

        assert_eq!(buffer.id.as_deref(), Some("7"));
        assert_eq!(buffer.ip_list, r#"["10.0.0.1"]"#);
        assert!(buffer.password.is_empty());
        assert!(buffer.is_active);
    }

    #[test]
    fn payload_fields_leave_out_ip_list() {
        let buffer = UserBuffer {
            username: "ops".to_string(),
            password: "secret".to_string(),
            ip_list: "[]".to_string(),
            ..Default::default()
        };

        let fields = buffer.payload_fields().unwrap();
        assert_eq!(fields["username"], json!("ops"));
        assert_eq!(fields["permissions"], json!([]));
        assert!(!fields.contains_key("ip_list"));
        assert!(!fields.contains_key("id"));
    }
}
