//! Per-cell protection bitmask.
//!
//! Each cell carries one mask. Masks given for the default cell, a row, a
//! column and the cell itself are OR-ed together when the table is built, so
//! a protection bit can be added at any level but never cleared by a more
//! specific one. Protection is only enforced for [`crate::Operator::User`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Prevention: u32 {
        const DELETE_ROW     = 1 << 0;
        const DELETE_COL     = 1 << 1;
        const ADD_ROW_ABOVE  = 1 << 2;
        const ADD_ROW_BELOW  = 1 << 3;
        const ADD_COL_LEFT   = 1 << 4;
        const ADD_COL_RIGHT  = 1 << 5;
        const MOVE_FROM      = 1 << 6;
        const MOVE_TO        = 1 << 7;
        const WRITE          = 1 << 8;
        const STYLE          = 1 << 9;
        const RESIZE         = 1 << 10;
        const SET_RENDERER   = 1 << 11;
        const SET_PARSER     = 1 << 12;

        const MOVE      = Self::MOVE_FROM.bits() | Self::MOVE_TO.bits();
        const UPDATE    = Self::WRITE.bits()
            | Self::STYLE.bits()
            | Self::RESIZE.bits()
            | Self::SET_RENDERER.bits()
            | Self::SET_PARSER.bits();
        const ADD_ROW   = Self::ADD_ROW_ABOVE.bits() | Self::ADD_ROW_BELOW.bits();
        const ADD_COL   = Self::ADD_COL_LEFT.bits() | Self::ADD_COL_RIGHT.bits();
        const ADD       = Self::ADD_ROW.bits() | Self::ADD_COL.bits();
        const DELETE    = Self::DELETE_ROW.bits() | Self::DELETE_COL.bits();
        const READ_ONLY = Self::UPDATE.bits()
            | Self::DELETE.bits()
            | Self::ADD.bits()
            | Self::MOVE.bits();
    }
}

/// True when every bit of `flag` is set in `mask`.
pub fn is_prevented(mask: Option<Prevention>, flag: Prevention) -> bool {
    mask.is_some_and(|m| m.contains(flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composites_require_every_bit() {
        let mask = Some(Prevention::MOVE_FROM);
        assert!(is_prevented(mask, Prevention::MOVE_FROM));
        assert!(!is_prevented(mask, Prevention::MOVE));
        assert!(is_prevented(Some(Prevention::READ_ONLY), Prevention::MOVE));
        assert!(is_prevented(Some(Prevention::READ_ONLY), Prevention::SET_PARSER));
        assert!(!is_prevented(None, Prevention::WRITE));
    }

    #[test]
    fn test_read_only_covers_everything() {
        assert_eq!(Prevention::READ_ONLY, Prevention::all());
    }
}
