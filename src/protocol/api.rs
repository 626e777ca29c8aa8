//! Synchronous request/response API.
//!
//! | Path      | Query                          | Effect                      |
//! |-----------|--------------------------------|-----------------------------|
//! | `/status` |                                | status snapshot             |
//! | `/sensor` |                                | latest sensor sample        |
//! | `/buzzer` | `state=on\|off`                | switch the buzzer           |
//! | `/oled`   | `text=…`                       | replace the display line    |
//! | `/move`   | `direction=…[&duration=ms]`    | drive, auto-stop            |
//!
//! The HTTP adapter only splits the URI; the control loop executes the
//! request and answers with one [`ApiResponse`].

use serde::Serialize;

use crate::error::{Token, token};
use crate::state::DisplayText;

/// Parsed request.  Parameter values are kept raw so the control loop can
/// validate them with the same rules as websocket commands.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    Status,
    Sensor,
    Buzzer { state: Option<Token> },
    Oled { text: Option<DisplayText> },
    Move {
        direction: Option<Token>,
        duration: Option<Token>,
    },
    NotFound(Token),
}

impl ApiRequest {
    /// Parse a request URI such as `/move?direction=left&duration=500`.
    pub fn from_uri(uri: &str) -> Self {
        let (path, query) = uri.split_once('?').unwrap_or((uri, ""));
        Self::parse(path, query)
    }

    pub fn parse(path: &str, query: &str) -> Self {
        let param = |name: &str| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
        };
        match path.trim_end_matches('/') {
            "/status" => Self::Status,
            "/sensor" => Self::Sensor,
            "/buzzer" => Self::Buzzer {
                state: param("state").map(|s| token(&s)),
            },
            "/oled" => Self::Oled {
                text: param("text").map(|t| DisplayText::new(&t)),
            },
            "/move" => Self::Move {
                direction: param("direction").map(|d| token(&d)),
                duration: param("duration").map(|d| token(&d)),
            },
            other => Self::NotFound(token(other)),
        }
    }
}

/// HTTP status plus a JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

#[derive(Serialize)]
struct MessageBody<'a> {
    message: &'a str,
}

impl ApiResponse {
    pub const OK: u16 = 200;
    pub const BAD_REQUEST: u16 = 400;
    pub const NOT_FOUND: u16 = 404;
    pub const CONFLICT: u16 = 409;
    pub const UNAVAILABLE: u16 = 503;

    /// 200 with `value` as the JSON body.
    pub fn ok(value: &impl Serialize) -> Self {
        Self {
            status: Self::OK,
            body: to_json(value),
        }
    }

    pub fn message(message: &str) -> Self {
        Self::ok(&MessageBody { message })
    }

    pub fn error(status: u16, error: &str) -> Self {
        Self {
            status,
            body: to_json(&ErrorBody { error }),
        }
    }

    pub fn missing(param: &str) -> Self {
        Self::error(Self::BAD_REQUEST, &format!("Missing {param} parameter"))
    }

    pub fn not_found() -> Self {
        Self::error(Self::NOT_FOUND, "Not found")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn to_json(value: &impl Serialize) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| String::from("{}"))
}
