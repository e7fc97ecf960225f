use std::fmt;

use serde::{Deserialize, Serialize};

/// Module reported for transactions with no decodable message.
pub const UNKNOWN_MODULE: &str = "Unknown";
/// Type reported for transactions with no decodable message.
pub const UNKNOWN_TYPE: &str = "Unknown";

/// The closed set of `(module, type)` message tags the indexer projects into
/// flat tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    Send,
    NodeStake,
    NodeBeginUnstake,
    NodeUnjail,
    AppStake,
    AppBeginUnstake,
    AppUnjail,
    ChangeParam,
    DaoTransfer,
    Upgrade,
    Claim,
    Proof,
}

impl MessageKind {
    pub const ALL: [MessageKind; 12] = [
        MessageKind::Send,
        MessageKind::NodeStake,
        MessageKind::NodeBeginUnstake,
        MessageKind::NodeUnjail,
        MessageKind::AppStake,
        MessageKind::AppBeginUnstake,
        MessageKind::AppUnjail,
        MessageKind::ChangeParam,
        MessageKind::DaoTransfer,
        MessageKind::Upgrade,
        MessageKind::Claim,
        MessageKind::Proof,
    ];

    pub fn module(self) -> &'static str {
        match self {
            Self::Send | Self::NodeStake | Self::NodeBeginUnstake | Self::NodeUnjail => "pos",
            Self::AppStake | Self::AppBeginUnstake | Self::AppUnjail => "apps",
            Self::ChangeParam | Self::DaoTransfer | Self::Upgrade => "gov",
            Self::Claim | Self::Proof => "pocketcore",
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Self::Send => "Send",
            Self::NodeStake => "MsgStake",
            Self::NodeBeginUnstake => "MsgBeginUnstake",
            Self::NodeUnjail => "MsgUnjail",
            Self::AppStake => "MsgAppStake",
            Self::AppBeginUnstake => "MsgAppBeginUnstake",
            Self::AppUnjail => "MsgAppUnjail",
            Self::ChangeParam => "msg_change_param",
            Self::DaoTransfer => "msg_dao_transfer",
            Self::Upgrade => "msg_upgrade",
            Self::Claim => "claim",
            Self::Proof => "proof",
        }
    }

    pub fn tag(self) -> String {
        format!("{}/{}", self.module(), self.type_name())
    }

    /// Resolves a wire tag such as `pos/Send`. The legacy `pos/8.0Msg*` tags
    /// resolve to their unversioned kinds.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let (module, type_name) = tag.split_once('/')?;
        let type_name = if module == "pos" {
            type_name.strip_prefix("8.0").unwrap_or(type_name)
        } else {
            type_name
        };
        Self::ALL
            .into_iter()
            .find(|k| k.module() == module && k.type_name() == type_name)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.module(), self.type_name())
    }
}
