use crate::registers::{
    GRAM_ROWS, MADCTL_BGR, MADCTL_MV_NORM, MADCTL_MV_REV, MADCTL_MX_LR, MADCTL_MX_RL,
    MADCTL_MY_BT, MADCTL_MY_TB,
};

/// Clockwise display orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    #[default]
    None,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Rotation for a quarter-turn count, taken modulo 4.
    pub fn from_index(index: u8) -> Self {
        match index % 4 {
            0 => Rotation::None,
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            _ => Rotation::Deg270,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Rotation::None => 0,
            Rotation::Deg90 => 1,
            Rotation::Deg180 => 2,
            Rotation::Deg270 => 3,
        }
    }

    /// Get the next rotation in the cycle
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Get rotation angle in degrees for logging
    pub fn degrees(self) -> u16 {
        self.index() as u16 * 90
    }

    /// True when logical width and height are exchanged.
    pub fn is_swapped(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

impl From<u8> for Rotation {
    fn from(index: u8) -> Self {
        Self::from_index(index)
    }
}

/// Register values and addressing offsets derived for one rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationState {
    /// MADCTL parameter, BGR bit included.
    pub madctl: u8,
    /// VSCSAD parameter.
    pub scroll_offset: u16,
    pub row_offset: u16,
    pub column_offset: u16,
}

impl RotationState {
    /// Derives the state for this panel's default mounting.
    ///
    /// `row_offset`/`column_offset` are the configured offsets for the
    /// unrotated panel; the 90° orientation swaps them and the 180°/270°
    /// orientations address from the RAM origin.
    pub fn derive(
        rotation: Rotation,
        width: u16,
        bgr: bool,
        row_offset: u16,
        column_offset: u16,
    ) -> Self {
        // The visible area is shorter than display RAM, so the flipped
        // orientations scroll it back into view.
        let recenter = GRAM_ROWS.saturating_sub(width);

        let (madctl, scroll_offset, row_offset, column_offset) = match rotation {
            Rotation::None => (
                MADCTL_MX_RL | MADCTL_MY_TB | MADCTL_MV_REV,
                0,
                row_offset,
                column_offset,
            ),
            Rotation::Deg90 => (
                MADCTL_MX_RL | MADCTL_MY_BT | MADCTL_MV_NORM,
                recenter,
                column_offset,
                row_offset,
            ),
            Rotation::Deg180 => (MADCTL_MX_LR | MADCTL_MY_BT | MADCTL_MV_REV, recenter, 0, 0),
            Rotation::Deg270 => (MADCTL_MX_LR | MADCTL_MY_TB | MADCTL_MV_NORM, 0, 0, 0),
        };

        Self {
            madctl: if bgr { madctl | MADCTL_BGR } else { madctl },
            scroll_offset,
            row_offset,
            column_offset,
        }
    }
}
