use std::io::Read;

use serde_json::Value;

use crate::io::IoError;

pub fn read_json<R: Read>(reader: R) -> Result<Value, IoError> {
    Ok(serde_json::from_reader(reader)?)
}
