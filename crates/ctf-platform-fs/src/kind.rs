use serde::Deserialize;

use crate::error::PlatformError;

/// Which stream context a platform context embeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u32")]
pub enum ContextKind {
    #[default]
    Default,
}

impl ContextKind {
    pub fn tag(self) -> u32 {
        match self {
            ContextKind::Default => 0,
        }
    }
}

impl TryFrom<u32> for ContextKind {
    type Error = PlatformError;

    fn try_from(tag: u32) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(ContextKind::Default),
            other => Err(PlatformError::InvalidContextKind(other)),
        }
    }
}

/// Tracer state for the active [`ContextKind`]; exactly one payload per kind.
#[derive(Debug)]
pub enum StreamSlot<T> {
    Default(T),
}

impl<T> StreamSlot<T> {
    pub fn new(kind: ContextKind, tracer: T) -> Self {
        match kind {
            ContextKind::Default => StreamSlot::Default(tracer),
        }
    }

    pub fn kind(&self) -> ContextKind {
        match self {
            StreamSlot::Default(_) => ContextKind::Default,
        }
    }

    pub fn get(&self) -> &T {
        match self {
            StreamSlot::Default(tracer) => tracer,
        }
    }

    pub fn get_mut(&mut self) -> &mut T {
        match self {
            StreamSlot::Default(tracer) => tracer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_zero_is_default() {
        let kind = ContextKind::try_from(0).unwrap();
        assert_eq!(kind, ContextKind::Default);
        assert_eq!(kind.tag(), 0);
    }

    #[test]
    fn unknown_tags_are_rejected() {
        let err = ContextKind::try_from(7).unwrap_err();
        assert!(matches!(err, PlatformError::InvalidContextKind(7)));
    }

    #[test]
    fn slot_reports_its_kind() {
        let mut slot = StreamSlot::new(ContextKind::Default, 5u32);
        assert_eq!(slot.kind(), ContextKind::Default);
        *slot.get_mut() += 1;
        assert_eq!(*slot.get(), 6);
    }
}
