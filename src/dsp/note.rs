/// Frequency in Hz of MIDI note `note`, tuned to A4 (note 69) = 440 Hz.
///
/// Fractional notes give detuned pitches.
///
/// ```
/// use klangwerk::dsp::note_to_frequency;
///
/// assert_eq!(note_to_frequency(69.0), 440.0);
/// assert!((note_to_frequency(60.0) - 261.6256).abs() < 1e-3);
/// ```
pub fn note_to_frequency(note: f32) -> f32 {
    440.0 * 2f32.powf((note - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn octaves_double() {
        assert_relative_eq!(note_to_frequency(81.0), 880.0, max_relative = 1e-6);
        assert_relative_eq!(note_to_frequency(57.0), 220.0, max_relative = 1e-6);
    }
}
