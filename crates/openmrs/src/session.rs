//! Session representations (`/session`).

use crate::Ref;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub session_id: Option<String>,
    pub authenticated: bool,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub session_location: Option<Ref>,
    #[serde(default)]
    pub current_provider: Option<Ref>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uuid: String,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub system_id: Option<String>,
    #[serde(default)]
    pub person: Option<Ref>,
    #[serde(default)]
    pub privileges: Vec<Ref>,
    #[serde(default)]
    pub roles: Vec<Ref>,
}

/// Body posted to `/session` to change the session location.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLocationUpdate {
    pub session_location: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn parses_unauthenticated_session() {
        let session: Session =
            parse(r#"{"sessionId": "ABC", "authenticated": false}"#, "session").expect("parse");
        assert!(!session.authenticated);
        assert!(session.user.is_none());
    }

    #[test]
    fn parses_authenticated_session() {
        let session: Session = parse(
            r#"{"sessionId": "ABC", "authenticated": true, "locale": "en_GB",
                "user": {"uuid": "u-1", "display": "admin", "username": "admin",
                         "person": {"uuid": "per-1", "display": "Super User"},
                         "roles": [{"uuid": "r1", "display": "System Developer"}],
                         "privileges": []},
                "sessionLocation": {"uuid": "loc-1", "display": "Laboratory"}}"#,
            "session",
        )
        .expect("parse");
        let user = session.user.expect("user present");
        assert_eq!(user.roles[0].display.as_deref(), Some("System Developer"));
        assert_eq!(
            session.session_location.and_then(|l| l.display).as_deref(),
            Some("Laboratory")
        );
    }
}
