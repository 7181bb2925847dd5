//! Distribution channels and channel selection.

use crate::TitlegenError;
use std::fmt;
use std::str::FromStr;

/// A deployment target with its own title identity namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    /// Titles launched from SD card.
    Sd,
    /// Titles installed to system memory.
    Nand,
    /// Channel forwarders.
    Forwarder,
}

impl Channel {
    /// Every channel, in processing order.
    pub const ALL: [Channel; 3] = [Channel::Sd, Channel::Nand, Channel::Forwarder];

    /// Lowercase name used on the command line and in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Sd => "sd",
            Channel::Nand => "nand",
            Channel::Forwarder => "forwarder",
        }
    }

    /// Whether a packaging procedure exists for this channel.
    ///
    /// NAND and forwarder packaging are not defined yet.
    pub fn is_synthesizable(self) -> bool {
        match self {
            Channel::Sd => true,
            Channel::Nand | Channel::Forwarder => false,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = TitlegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sd" => Ok(Channel::Sd),
            "nand" => Ok(Channel::Nand),
            "forwarder" => Ok(Channel::Forwarder),
            other => Err(TitlegenError::ConfigError(format!(
                "unknown channel '{}' (expected sd, nand or forwarder)",
                other
            ))),
        }
    }
}

/// Which channels a generate run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSelector {
    /// A single, explicitly requested channel.
    One(Channel),
    /// Every channel that can currently be synthesized.
    All,
}

impl ChannelSelector {
    /// Expand the selector into concrete channels.
    ///
    /// An explicit channel is returned as-is even when it cannot be
    /// synthesized, so the caller surfaces `UnsupportedChannel`. `All` only
    /// yields synthesizable channels and logs the ones it skips.
    pub fn channels(self) -> Vec<Channel> {
        match self {
            ChannelSelector::One(channel) => vec![channel],
            ChannelSelector::All => Channel::ALL
                .into_iter()
                .filter(|channel| {
                    let supported = channel.is_synthesizable();
                    if !supported {
                        tracing::warn!(channel = %channel, "skipping channel without a packaging procedure");
                    }
                    supported
                })
                .collect(),
        }
    }
}
