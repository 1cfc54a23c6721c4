use std::io::Read;

use serde_json::Value;

use crate::io::IoError;

/// Reads one YAML document and converts it to the JSON value model.
pub fn read_yaml<R: Read>(reader: R) -> Result<Value, IoError> {
    let yaml_value: serde_yaml::Value = serde_yaml::from_reader(reader)?;
    Ok(serde_json::to_value(yaml_value)?)
}
