//! `(name, tag)` player identity pair.
//!
//! `tag` disambiguates clients that chose the same display name. `0` is
//! reserved to mean "no tag assigned" and must never appear in an
//! authenticated session's full name or in the name registry.

use crate::codec::{Decode, Encode, FixedString};
use crate::error::ProtocolError;

pub const NAME_MAX_BYTES: usize = 24;

/// Tag value meaning "unassigned". Never valid for an authenticated player.
pub const UNASSIGNED_TAG: u16 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerFullName {
    pub name: FixedString<NAME_MAX_BYTES>,
    pub tag: u16,
}

impl PlayerFullName {
    pub fn new(name: FixedString<NAME_MAX_BYTES>, tag: u16) -> Self {
        Self { name, tag }
    }
}

impl Encode for PlayerFullName {
    const SIZE: usize = FixedString::<NAME_MAX_BYTES>::capacity() + u16::SIZE;

    fn encode(&self, out: &mut Vec<u8>) {
        self.name.encode(out);
        self.tag.encode(out);
    }
}

impl Decode for PlayerFullName {
    fn decode(buf: &mut &[u8]) -> Result<Self, ProtocolError> {
        let name = FixedString::decode(buf)?;
        let tag = u16::decode(buf)?;
        Ok(Self { name, tag })
    }
}
