//! Request and response documents of the plugin's web service methods

use crate::state::{NotifyTarget, TeamId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SUBMIT_MESSAGE: &str = "local_teamup-submit_message";
pub const PUBLISH_TEAM: &str = "local_teamup-publish_team";

/// Arguments of `local_teamup-submit_message`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitMessageArgs {
    pub teams: Vec<TeamId>,
    pub students: Vec<String>,
    pub subject: String,
    pub message: String,
    pub notify: Vec<NotifyTarget>,
}

/// Arguments of `local_teamup-publish_team`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishTeamArgs {
    pub id: TeamId,
    /// 1 publishes, 0 returns the team to planning
    pub publish: u8,
}

impl PublishTeamArgs {
    pub fn new(id: TeamId, publish: bool) -> Self {
        Self {
            id,
            publish: u8::from(publish),
        }
    }
}

/// A call to one of the plugin's methods
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcRequest {
    SubmitMessage(SubmitMessageArgs),
    PublishTeam(PublishTeamArgs),
}

impl RpcRequest {
    pub fn method(&self) -> &'static str {
        match self {
            Self::SubmitMessage(_) => SUBMIT_MESSAGE,
            Self::PublishTeam(_) => PUBLISH_TEAM,
        }
    }

    pub fn args(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::SubmitMessage(args) => serde_json::to_value(args),
            Self::PublishTeam(args) => serde_json::to_value(args),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RpcException {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errorcode: Option<String>,
}

/// One response document of the ajax service
///
/// `error` is usually a boolean, but session-level failures report it as a
/// string; anything other than `false`/absent marks a failure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub error: Value,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub exception: Option<RpcException>,
}

impl RpcResponse {
    pub fn success(data: Value) -> Self {
        Self {
            error: Value::Bool(false),
            data,
            exception: None,
        }
    }

    pub fn failure(message: Option<&str>) -> Self {
        Self {
            error: Value::Bool(true),
            data: Value::Null,
            exception: Some(RpcException {
                message: message.map(str::to_string),
                errorcode: None,
            }),
        }
    }

    pub fn is_failure(&self) -> bool {
        let flagged = match &self.error {
            Value::Null => false,
            Value::Bool(flag) => *flag,
            _ => true,
        };
        flagged || self.exception.is_some()
    }

    /// The exception message, else the text of a string `error`
    pub fn exception_message(&self) -> Option<&str> {
        self.exception
            .as_ref()
            .and_then(|exception| exception.message.as_deref())
            .or_else(|| self.error.as_str())
            .filter(|message| !message.is_empty())
    }
}
