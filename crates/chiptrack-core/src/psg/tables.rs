//! PSG lookup tables

/// Per-register value masks (R0-R15). Unused bits read back as zero.
pub const REGISTER_MASK: [u8; 16] = [
    0xFF, 0x0F, 0xFF, 0x0F, 0xFF, 0x0F, 0x1F, 0xFF, 0x1F, 0x1F, 0x1F, 0xFF, 0xFF, 0x0F, 0xFF,
    0xFF,
];

/// YM2149 output levels for the 32-step DAC, 1.5dB per step.
///
/// Index 0 is silence; index 31 is full scale for one voice. Three voices
/// at full scale sum to just under `i16::MAX`.
pub const YM_LEVELS: [u16; 32] = [
    0, 61, 73, 87, 103, 123, 146, 173, 206, 245, 291, 345, 410, 488, 580, 689, 819, 973, 1157,
    1375, 1634, 1942, 2308, 2743, 3261, 3875, 4606, 5474, 6506, 7732, 9190, 10922,
];

/// AY-3-8910 output levels for the 16-step DAC.
///
/// Indexed by the 32-step level shifted right by one, so the envelope runs
/// at the same rate on both variants but resolves half as many amplitudes.
pub const AY_LEVELS: [u16; 16] = [
    0, 53, 88, 125, 193, 258, 385, 525, 753, 1029, 1523, 2077, 3110, 4395, 7073, 10922,
];

/// Display names of the PSG voices.
pub const VOICE_NAMES: [&str; 3] = ["Square 1", "Square 2", "Square 3"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_tables_monotonic() {
        for pair in YM_LEVELS.windows(2) {
            assert!(pair[1] > pair[0]);
        }
        for pair in AY_LEVELS.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_three_voices_fit_i16() {
        let peak = 3 * u32::from(YM_LEVELS[31]);
        assert!(peak <= i16::MAX as u32);
        assert_eq!(YM_LEVELS[31], AY_LEVELS[15]);
    }
}
