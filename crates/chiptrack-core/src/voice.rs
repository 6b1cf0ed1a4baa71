//! Voice mute masks

use bitflags::bitflags;

bitflags! {
    /// Set of muted voices on one chip (bit `n` = voice `n`).
    ///
    /// Named flags cover the largest voice count of any built-in variant;
    /// use [`VoiceMask::voice`] for index-based access.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VoiceMask: u32 {
        /// First voice
        const VOICE_1 = 1 << 0;
        /// Second voice
        const VOICE_2 = 1 << 1;
        /// Third voice
        const VOICE_3 = 1 << 2;
        /// Fourth voice
        const VOICE_4 = 1 << 3;
        /// Fifth voice
        const VOICE_5 = 1 << 4;
        /// Sixth voice
        const VOICE_6 = 1 << 5;
    }
}

impl VoiceMask {
    /// Mask containing only voice `index` (empty for indices >= 32).
    pub fn voice(index: usize) -> Self {
        if index < 32 {
            Self::from_bits_retain(1 << index)
        } else {
            Self::empty()
        }
    }

    /// Whether voice `index` is muted.
    #[inline]
    pub fn is_muted(&self, index: usize) -> bool {
        self.intersects(Self::voice(index))
    }

    /// Bits `offset..offset + count` shifted down to start at voice 0.
    ///
    /// Used to split a session-wide mask into per-unit masks.
    pub fn window(&self, offset: usize, count: usize) -> Self {
        if offset >= 32 || count == 0 {
            return Self::empty();
        }
        let width = count.min(32 - offset);
        let bits = self.bits() >> offset;
        let keep = if width >= 32 {
            u32::MAX
        } else {
            (1u32 << width) - 1
        };
        Self::from_bits_retain(bits & keep)
    }
}
