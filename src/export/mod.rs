//! # Plan Export
//!
//! Renderers that turn a meal plan into documents meant for other tools:
//!
//! - [`calendar`]: an iCalendar (`.ics`) document, one event per populated slot
//! - [`print`]: a printable HTML or plain-text overview
//! - [`share`]: the plan as text plus a WhatsApp or mail link
//!
//! Every renderer is a read-only projection of the plan. Documents are built
//! fresh for each request and never stored.

pub mod calendar;
pub mod print;
pub mod share;

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::errors::ExportError;
use share::ShareChannel;

/// Export target selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Calendar,
    Print,
    Text,
    WhatsApp,
    Email,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Calendar,
        ExportFormat::Print,
        ExportFormat::Text,
        ExportFormat::WhatsApp,
        ExportFormat::Email,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Calendar => "ics",
            ExportFormat::Print => "print",
            ExportFormat::Text => "text",
            ExportFormat::WhatsApp => "whatsapp",
            ExportFormat::Email => "email",
        }
    }

    /// File extension for a written document
    pub fn file_extension(self) -> &'static str {
        match self {
            ExportFormat::Calendar => "ics",
            ExportFormat::Print => "html",
            ExportFormat::Text | ExportFormat::WhatsApp | ExportFormat::Email => "txt",
        }
    }

    pub fn share_channel(self) -> Option<ShareChannel> {
        match self {
            ExportFormat::WhatsApp => Some(ShareChannel::WhatsApp),
            ExportFormat::Email => Some(ShareChannel::Email),
            _ => None,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        match wanted.as_str() {
            "ical" | "calendar" => return Ok(ExportFormat::Calendar),
            "html" => return Ok(ExportFormat::Print),
            "mail" => return Ok(ExportFormat::Email),
            _ => {}
        }
        ExportFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == wanted)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormat(pub String);

impl fmt::Display for UnknownFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown export format '{}' (expected ics, print, text, whatsapp or email)",
            self.0
        )
    }
}

impl std::error::Error for UnknownFormat {}

/// A rendered export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub format: ExportFormat,
    pub content: String,
    /// Hand-off URL for share exports
    pub link: Option<String>,
}

impl ExportDocument {
    pub fn new(format: ExportFormat, content: String) -> Self {
        Self {
            format,
            content,
            link: None,
        }
    }

    pub fn with_link(mut self, link: String) -> Self {
        self.link = Some(link);
        self
    }

    /// Write the document content to `path`
    pub fn write_to(&self, path: &Path) -> Result<(), ExportError> {
        match self.format {
            ExportFormat::Calendar => calendar::write_calendar_file(path, &self.content),
            _ => {
                fs::write(path, &self.content)?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("ics".parse::<ExportFormat>().unwrap(), ExportFormat::Calendar);
        assert_eq!("WhatsApp".parse::<ExportFormat>().unwrap(), ExportFormat::WhatsApp);
        assert_eq!(" email ".parse::<ExportFormat>().unwrap(), ExportFormat::Email);
        assert_eq!("html".parse::<ExportFormat>().unwrap(), ExportFormat::Print);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_share_channels() {
        assert_eq!(ExportFormat::Email.share_channel(), Some(ShareChannel::Email));
        assert_eq!(ExportFormat::Calendar.share_channel(), None);
        assert_eq!(ExportFormat::Print.file_extension(), "html");
    }
}
