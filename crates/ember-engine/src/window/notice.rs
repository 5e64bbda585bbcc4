/// A failure shown to the user in a blocking, modal dialog.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FailureNotice {
    pub title: String,
    pub description: String,
}

impl FailureNotice {
    /// Device negotiation failed; nothing will ever be rendered.
    pub fn device_init_failed() -> Self {
        Self {
            title: "ERROR".to_string(),
            description: "GPU widget initialization failed.".to_string(),
        }
    }

    /// Shows the notice and blocks until the user dismisses it.
    pub fn show(&self) {
        let _ = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title(self.title.as_str())
            .set_description(self.description.as_str())
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_failure_notice_names_the_failure() {
        let notice = FailureNotice::device_init_failed();
        assert_eq!(notice.title, "ERROR");
        assert!(notice.description.contains("initialization failed"));
    }
}
