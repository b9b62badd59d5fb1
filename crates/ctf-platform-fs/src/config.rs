use std::env;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{PlatformError, Result};
use crate::kind::ContextKind;

pub const ENV_BUF_SIZE: &str = "CTF_PLATFORM_BUF_SIZE";
pub const ENV_STREAM_PATH: &str = "CTF_PLATFORM_STREAM_PATH";
pub const ENV_CONTEXT_KIND: &str = "CTF_PLATFORM_CONTEXT_KIND";

/// Everything a stream needs at initialization. Fixed for the stream's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PlatformConfig {
    #[serde(default)]
    pub kind: ContextKind,
    /// Packet buffer size in bytes; every flushed packet is exactly this long.
    pub buf_size: usize,
    pub stream_path: PathBuf,
}

impl PlatformConfig {
    pub fn new(buf_size: usize, stream_path: impl Into<PathBuf>) -> Self {
        Self {
            kind: ContextKind::Default,
            buf_size,
            stream_path: stream_path.into(),
        }
    }

    pub fn with_kind(mut self, kind: ContextKind) -> Self {
        self.kind = kind;
        self
    }

    /// Load from `CTF_PLATFORM_BUF_SIZE`, `CTF_PLATFORM_STREAM_PATH` and the optional
    /// `CTF_PLATFORM_CONTEXT_KIND` tag.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let buf_size = lookup(ENV_BUF_SIZE)
            .ok_or_else(|| PlatformError::Config(format!("{ENV_BUF_SIZE} is not set")))?;
        let buf_size = buf_size.trim().parse::<usize>().map_err(|err| {
            PlatformError::Config(format!("{ENV_BUF_SIZE}={buf_size:?} is invalid: {err}"))
        })?;

        let stream_path = lookup(ENV_STREAM_PATH)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| PlatformError::Config(format!("{ENV_STREAM_PATH} is not set")))?;

        let kind = match lookup(ENV_CONTEXT_KIND) {
            Some(tag) => {
                let tag = tag.trim().parse::<u32>().map_err(|err| {
                    PlatformError::Config(format!("{ENV_CONTEXT_KIND}={tag:?} is invalid: {err}"))
                })?;
                ContextKind::try_from(tag)?
            }
            None => ContextKind::Default,
        };

        let config = Self {
            kind,
            buf_size,
            stream_path: PathBuf::from(stream_path),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buf_size == 0 {
            return Err(PlatformError::EmptyBuffer);
        }
        if self.stream_path.as_os_str().is_empty() {
            return Err(PlatformError::Config("stream path is empty".to_string()));
        }
        Ok(())
    }
}
