// 💬 Feedback Form
// Free-text suggestions; acknowledged locally, never stored

use crate::error::{CatalogError, Result};
use tracing::info;

pub const FEEDBACK_THANKS: &str = "Thank you for your feedback!";

/// Form state: open/closed plus the text being typed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackForm {
    pub open: bool,
    pub text: String,
}

impl FeedbackForm {
    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Blank text keeps the form open and returns the warning. Otherwise the
    /// text is cleared, the form closes and the acknowledgment comes back.
    pub fn submit(&mut self) -> Result<&'static str> {
        let ack = submit_feedback(&self.text)?;
        self.text.clear();
        self.close();
        Ok(ack)
    }
}

pub fn submit_feedback(text: &str) -> Result<&'static str> {
    let feedback = text.trim();
    if feedback.is_empty() {
        return Err(CatalogError::EmptyFeedback);
    }
    info!(chars = feedback.chars().count(), feedback, "feedback received");
    Ok(FEEDBACK_THANKS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_feedback() {
        assert_eq!(submit_feedback("Add more ocean data").unwrap(), FEEDBACK_THANKS);
        assert!(matches!(submit_feedback("   \n"), Err(CatalogError::EmptyFeedback)));
    }

    #[test]
    fn test_form_stays_open_on_empty_text() {
        let mut form = FeedbackForm::default();
        form.open();
        form.text = "  ".to_string();

        assert!(form.submit().is_err());
        assert!(form.open);
        assert_eq!(form.text, "  ");
    }

    #[test]
    fn test_form_closes_and_clears_on_success() {
        let mut form = FeedbackForm::default();
        form.open();
        form.text = "Great catalog".to_string();

        assert_eq!(form.submit().unwrap(), FEEDBACK_THANKS);
        assert!(!form.open);
        assert!(form.text.is_empty());
    }
}
