use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Content and dismiss-policy overrides carried by a show-overlay signal.
///
/// Every field is optional on the wire. Decoding never fails a handler:
/// a field with the wrong type is treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShowPayload {
    pub message: Option<String>,
    pub icon: Option<String>,
    pub spinner: bool,
    pub loading_icon: Option<String>,
    pub opacity: Option<f32>,
    pub block_on_escape: Option<bool>,
    pub block_on_outside_click: Option<bool>,
}

/// Payload of the disconnected signal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisconnectedPayload {
    pub silent: bool,
    pub show: ShowPayload,
}

/// Signals consumed from the application-wide bus.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    ShowOverlay(ShowPayload),
    DismissOverlay,
    SignedIn,
    Disconnected(DisconnectedPayload),
}

/// Wire shape of a payload. Values stay untyped so that one bad field
/// cannot reject the others.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPayload {
    message: Option<Value>,
    icon: Option<Value>,
    spinner: Option<Value>,
    #[serde(alias = "loading_icon")]
    loading_icon: Option<Value>,
    opacity: Option<Value>,
    #[serde(alias = "noCancelOnEscKey")]
    block_on_escape: Option<Value>,
    #[serde(alias = "noCancelOnOutsideClick")]
    block_on_outside_click: Option<Value>,
    silent: Option<Value>,
}

impl RawPayload {
    fn parse(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(json)?)
    }

    fn show(&self) -> ShowPayload {
        ShowPayload {
            message: self.message.as_ref().and_then(Value::as_str).map(String::from),
            icon: self
                .icon
                .as_ref()
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from),
            spinner: matches!(self.spinner, Some(Value::Bool(true))),
            loading_icon: self
                .loading_icon
                .as_ref()
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from),
            opacity: self
                .opacity
                .as_ref()
                .and_then(Value::as_f64)
                .filter(|o| o.is_finite())
                .map(|o| o.clamp(0.0, 1.0) as f32),
            block_on_escape: self.block_on_escape.as_ref().and_then(Value::as_bool),
            block_on_outside_click: self.block_on_outside_click.as_ref().and_then(Value::as_bool),
        }
    }
}

impl ShowPayload {
    /// Decode a JSON object. An empty string is the empty payload.
    pub fn from_json(json: &str) -> Result<Self> {
        RawPayload::parse(json).map(|raw| raw.show())
    }
}

impl DisconnectedPayload {
    pub fn from_json(json: &str) -> Result<Self> {
        let raw = RawPayload::parse(json)?;
        Ok(Self {
            silent: raw.silent.as_ref().and_then(Value::as_bool).unwrap_or(false),
            show: raw.show(),
        })
    }
}

impl Signal {
    pub fn name(&self) -> &'static str {
        match self {
            Signal::ShowOverlay(_) => "show-overlay",
            Signal::DismissOverlay => "dismiss-overlay",
            Signal::SignedIn => "signed-in",
            Signal::Disconnected(_) => "disconnected",
        }
    }

    /// Parse one IPC line: `<signal-name> [json-payload]`.
    ///
    /// A malformed payload degrades to the default payload; only an unknown
    /// signal name is an error.
    pub fn parse_line(line: &str) -> Result<Signal> {
        let line = line.trim();
        if line.is_empty() {
            return Err(Error::EmptyLine);
        }
        let (name, payload) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        match name {
            "show-overlay" => Ok(Signal::ShowOverlay(
                ShowPayload::from_json(payload).unwrap_or_else(|e| {
                    tracing::warn!("show-overlay: malformed payload ({e}), using defaults");
                    ShowPayload::default()
                }),
            )),
            "dismiss-overlay" => Ok(Signal::DismissOverlay),
            "signed-in" => Ok(Signal::SignedIn),
            "disconnected" => Ok(Signal::Disconnected(
                DisconnectedPayload::from_json(payload).unwrap_or_else(|e| {
                    tracing::warn!("disconnected: malformed payload ({e}), using defaults");
                    DisconnectedPayload::default()
                }),
            )),
            other => Err(Error::UnknownSignal(other.to_string())),
        }
    }
}
