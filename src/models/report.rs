use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Status, Summary};

/// One executed command, in the order the backup engine ran them.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub command: String,
    pub status: Status,
    #[serde(default)]
    pub summary: Summary,
}
