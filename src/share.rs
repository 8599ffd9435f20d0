//! Share tokens: the history list as base64-encoded JSON, carried in the
//! `share` query parameter of the page URL.

use crate::errors::{DecodeError, ShareError};
use crate::models::{DayHistoryEntry, ShareLinkResponse};
use base64::{
    engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
    Engine as _,
};

pub const SHARE_PARAM: &str = "share";
pub const SHARE_TITLE: &str = "Чек-лист ухода";
pub const SHARE_TEXT: &str = "История ежедневного чек-листа за последние дни";

pub fn encode(history: &[DayHistoryEntry]) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(history)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Accepts both the URL-safe and the standard alphabet, padded or not.
pub fn decode(token: &str) -> Result<Vec<DayHistoryEntry>, DecodeError> {
    let trimmed = token.trim().trim_end_matches('=');
    let bytes = match URL_SAFE_NO_PAD.decode(trimmed) {
        Ok(bytes) => bytes,
        Err(url_safe_err) => STANDARD_NO_PAD
            .decode(trimmed)
            .map_err(|_| DecodeError::Base64(url_safe_err))?,
    };
    Ok(serde_json::from_slice(&bytes)?)
}

/// Builds the link payload along with the hand-off the page should use.
pub fn share_link(
    public_url: &str,
    history: &[DayHistoryEntry],
    method: ShareMethod,
) -> Result<ShareLinkResponse, serde_json::Error> {
    let token = encode(history)?;
    Ok(ShareLinkResponse {
        url: format!("{}/?{SHARE_PARAM}={token}", public_url.trim_end_matches('/')),
        token,
        title: SHARE_TITLE.to_string(),
        text: SHARE_TEXT.to_string(),
        method: method.as_str().to_string(),
    })
}

/// Where the page hands the link: the platform share sheet when it has one,
/// otherwise the clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareMethod {
    Native,
    Clipboard,
}

impl ShareMethod {
    pub fn detect(native_available: bool) -> Self {
        if native_available {
            Self::Native
        } else {
            Self::Clipboard
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "native" => Some(Self::Native),
            "clipboard" => Some(Self::Clipboard),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Clipboard => "clipboard",
        }
    }
}

impl ShareError {
    /// Classifies a `DOMException`-style failure by its `name`.
    pub fn from_platform(name: &str, message: &str) -> Self {
        match name {
            "AbortError" => Self::Cancelled,
            "NotAllowedError" | "SecurityError" => Self::Denied(message.to_string()),
            _ if message.is_empty() => Self::Failed(name.to_string()),
            _ => Self::Failed(format!("{name}: {message}")),
        }
    }

    /// Text for the user-visible notice. Cancellation stays silent.
    pub fn notice(&self) -> Option<String> {
        match self {
            Self::Cancelled => None,
            Self::Denied(_) => Some("Нет доступа к буферу обмена или меню «Поделиться»".to_string()),
            Self::Failed(_) => Some("Не удалось поделиться ссылкой".to_string()),
        }
    }
}
