//! Location representations (`/location`).

use crate::Ref;
use serde::{Deserialize, Serialize};

/// Tag carried by locations a user may log in to.
pub const LOGIN_LOCATION_TAG: &str = "Login Location";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub uuid: String,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<Ref>,
    #[serde(default)]
    pub parent_location: Option<Ref>,
}

impl Location {
    pub fn name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.display.as_deref())
            .unwrap_or("")
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .iter()
            .any(|t| t.display.as_deref().is_some_and(|d| d.eq_ignore_ascii_case(tag)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn tags_are_matched_case_insensitively() {
        let location: Location = parse(
            r#"{"uuid": "loc-1", "display": "Outpatient Clinic",
                "tags": [{"uuid": "t1", "display": "login location"}]}"#,
            "location",
        )
        .expect("parse location");
        assert!(location.has_tag(LOGIN_LOCATION_TAG));
        assert_eq!(location.name(), "Outpatient Clinic");
    }
}
