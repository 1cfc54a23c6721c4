use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative schema document loaded from JSON or YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaDocument {
    pub members: Vec<MemberDef>,
    pub checks: Vec<CheckDef>,
}

/// One schema member: a rule (`required`/`optional` plus one gate) or a nested schema.
///
/// ```yaml
/// - required: number
///   filled: [int?, {eql?: 23}]
/// - schema: customer
///   members:
///     - required: name
///       filled: [str?]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MemberDef {
    pub required: Option<String>,
    pub optional: Option<String>,
    pub value: Option<Vec<Value>>,
    pub filled: Option<Vec<Value>>,
    pub maybe: Option<Vec<Value>>,
    pub each: Option<Vec<Value>>,
    pub schema: Option<String>,
    pub members: Vec<MemberDef>,
    pub checks: Vec<CheckDef>,
}

impl MemberDef {
    /// Key this member is addressed by, if any.
    pub fn key(&self) -> Option<&str> {
        self.required
            .as_deref()
            .or(self.optional.as_deref())
            .or(self.schema.as_deref())
    }
}

/// Cross-field check evaluated after every member of the same level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CheckDef {
    pub name: String,
    pub depends_on: Vec<String>,
    pub expr: Value,
}
