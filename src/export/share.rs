//! Share-text export.
//!
//! The shared text is the plan as pretty-printed JSON. Handing it to a
//! messaging app or mail client is done through a link with the text
//! percent-encoded.

use std::fmt;

use crate::errors::ExportError;
use crate::meal_plan::MealPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShareChannel {
    WhatsApp,
    Email,
}

impl ShareChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            ShareChannel::WhatsApp => "whatsapp",
            ShareChannel::Email => "email",
        }
    }
}

impl fmt::Display for ShareChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable serialization of the whole plan
pub fn share_text(plan: &MealPlan) -> Result<String, ExportError> {
    Ok(plan.to_json_pretty()?)
}

/// Link that opens `channel` with `text` prefilled
///
/// `subject` is only used for mail.
pub fn share_link(channel: ShareChannel, text: &str, subject: &str) -> String {
    let body = urlencoding::encode(text);
    match channel {
        ShareChannel::WhatsApp => format!("https://wa.me/?text={}", body),
        ShareChannel::Email => format!(
            "mailto:?subject={}&body={}",
            urlencoding::encode(subject),
            body
        ),
    }
}
