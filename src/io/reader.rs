use std::io::Read;

use serde_json::Value;

use crate::io::format::{json, yaml};
use crate::io::{Format, IoError};

/// Reads exactly one document.
pub fn read_document<R: Read>(reader: R, format: Format) -> Result<Value, IoError> {
    match format {
        Format::Json => json::read_json(reader),
        Format::Yaml => yaml::read_yaml(reader),
    }
}
