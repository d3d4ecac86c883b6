//! Transient state of the single screen, kept apart from egui types so
//! the pick/cancel/label contract stays unit-testable.

use classifier_core::PLACEHOLDER_LABEL;

pub struct ScreenState {
    /// Current display string under the image well.
    pub prediction: String,
    /// True once any image has been picked; never reset within a
    /// screen session. Gates cosmetic scale effects only.
    pub uploaded: bool,
}

impl Default for ScreenState {
    fn default() -> Self {
        Self {
            prediction: PLACEHOLDER_LABEL.to_string(),
            uploaded: false,
        }
    }
}

impl ScreenState {
    pub fn image_picked(&mut self) {
        self.uploaded = true;
    }

    /// Cancelling the picker halts the flow; prior state is untouched.
    pub fn picker_cancelled(&mut self) {}

    /// Each finished classification overwrites the label wholesale.
    /// With rapid picks the last delivery wins; earlier in-flight
    /// requests are neither cancelled nor superseded.
    pub fn label_arrived(&mut self, label: String) {
        self.prediction = label;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("It's a Tabby Cat!")]
    #[case("Failed to load model")]
    #[case("Could not classify image")]
    fn any_terminal_label_replaces_placeholder(#[case] label: &str) {
        let mut state = ScreenState::default();
        state.image_picked();
        state.label_arrived(label.to_string());
        assert_eq!(state.prediction, label);
        assert_ne!(state.prediction, PLACEHOLDER_LABEL);
    }

    #[test]
    fn starts_with_placeholder_and_no_upload() {
        let state = ScreenState::default();
        assert_eq!(state.prediction, "Upload an image to predict");
        assert!(!state.uploaded);
    }

    #[test]
    fn cancelling_the_picker_changes_nothing() {
        let mut state = ScreenState::default();
        state.picker_cancelled();
        assert_eq!(state.prediction, PLACEHOLDER_LABEL);
        assert!(!state.uploaded);

        state.image_picked();
        state.label_arrived("It's a Poodle!".to_string());
        state.picker_cancelled();
        assert_eq!(state.prediction, "It's a Poodle!");
        assert!(state.uploaded);
    }

    #[test]
    fn upload_flag_flips_once_and_never_reverts() {
        let mut state = ScreenState::default();
        state.image_picked();
        assert!(state.uploaded);
        state.label_arrived("Could not classify image".to_string());
        state.image_picked();
        assert!(state.uploaded);
    }

    #[test]
    fn last_label_delivery_wins() {
        let mut state = ScreenState::default();
        state.image_picked();
        state.label_arrived("It's a Tabby Cat!".to_string());
        state.label_arrived("It's a Beagle!".to_string());
        assert_eq!(state.prediction, "It's a Beagle!");
    }
}
