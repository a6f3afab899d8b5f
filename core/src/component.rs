use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

pub const ID_FIELD: &str = "ID";
pub const NID_FIELD: &str = "NID";

/// Name used for the components endpoint in error messages.
pub const COMPONENTS_SOURCE: &str = "smd components";

/// One component record as returned by smd.
///
/// The record is kept as the raw JSON object so that every field, including
/// ones this crate does not know about, reaches the host variables unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Component {
    fields: Map<String, Value>,
}

impl Component {
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// The component identifier, used as the join key against memberships.
    pub fn id(&self) -> Result<&str> {
        match self.fields.get(ID_FIELD) {
            None | Some(Value::Null) => Err(Error::MissingField {
                field: ID_FIELD,
                component: self.describe(),
            }),
            Some(Value::String(id)) => Ok(id.as_str()),
            Some(other) => Err(Error::malformed(
                COMPONENTS_SOURCE,
                format!("`{ID_FIELD}` must be a string, got {other}"),
            )),
        }
    }

    pub fn nid(&self) -> Result<u64> {
        match self.fields.get(NID_FIELD) {
            None | Some(Value::Null) => Err(Error::MissingField {
                field: NID_FIELD,
                component: self.describe(),
            }),
            Some(value) => value.as_u64().ok_or_else(|| {
                Error::malformed(
                    COMPONENTS_SOURCE,
                    format!(
                        "`{NID_FIELD}` of component {} must be a non-negative integer, got \
                         {value}",
                        self.describe()
                    ),
                )
            }),
        }
    }

    /// A label for diagnostics; falls back to a placeholder when `ID` is unusable.
    fn describe(&self) -> String {
        match self.str_field(ID_FIELD) {
            Some(id) => format!("`{id}`"),
            None => "<without ID>".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ComponentArray {
    #[serde(rename = "Components")]
    components: Vec<Component>,
}

/// Parses the body of `GET /hsm/v2/State/Components`.
pub fn parse_components(body: &str) -> Result<Vec<Component>> {
    let array: ComponentArray = serde_json::from_str(body)
        .map_err(|err| Error::malformed(COMPONENTS_SOURCE, err.to_string()))?;
    Ok(array.components)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ErrorKind;

    fn component(value: Value) -> Component {
        serde_json::from_value(value).expect("component fixture should be an object")
    }

    #[test]
    fn parses_component_array() {
        let body = json!({
            "Components": [
                { "ID": "x1000c0s0b0n0", "Type": "Node", "NID": 1, "Role": "Compute" },
                { "ID": "x1000c0s0b0n1", "Type": "Node", "NID": 2, "Role": "Compute" }
            ]
        })
        .to_string();

        let components = parse_components(&body).expect("body should parse");
        assert_eq!(components.len(), 2);
        assert_eq!(components[1].id().unwrap(), "x1000c0s0b0n1");
        assert_eq!(components[1].nid().unwrap(), 2);
        assert_eq!(components[0].str_field("Role"), Some("Compute"));
    }

    #[test]
    fn missing_top_level_key_is_malformed() {
        let err = parse_components(r#"{"Nodes": []}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
        assert!(err.to_string().contains("Components"), "{err}");
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = parse_components("<html>gateway timeout</html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[test]
    fn missing_nid_is_missing_field() {
        let c = component(json!({ "ID": "x1", "Type": "Node" }));
        let err = c.nid().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert!(err.to_string().contains("`x1`"), "{err}");
    }

    #[test]
    fn negative_nid_is_malformed() {
        let c = component(json!({ "ID": "x1", "NID": -4 }));
        assert_eq!(c.nid().unwrap_err().kind(), ErrorKind::MalformedResponse);
    }

    #[test]
    fn missing_id_is_missing_field() {
        let c = component(json!({ "NID": 4 }));
        let err = c.id().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert!(err.to_string().contains("<without ID>"), "{err}");
    }
}
