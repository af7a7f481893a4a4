use std::{fmt, str::FromStr};
use thiserror::Error;
use url::Url;

pub const SANDBOX_URL: &str = "https://testapi.smileidentity.com/v1";
pub const PRODUCTION_URL: &str = "https://api.smileidentity.com/v1";

/// Which API deployment requests go to.
///
/// Parses `0` as the sandbox, `1` as production and anything else as a
/// URL used verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Server {
    Sandbox,
    Production,
    Custom(Url),
}

#[derive(Debug, Error)]
#[error("[E009] Invalid server: {raw}\n\nSuggestions:\n  • Use 0 for the sandbox or 1 for production\n  • Or pass a full URL such as https://testapi.smileidentity.com/v1")]
pub struct ServerParseError {
    pub raw: String,
    #[source]
    pub source: url::ParseError,
}

impl Server {
    pub fn url(&self) -> Url {
        match self {
            Self::Sandbox => Url::parse(SANDBOX_URL).expect("sandbox url is valid"),
            Self::Production => Url::parse(PRODUCTION_URL).expect("production url is valid"),
            Self::Custom(url) => url.clone(),
        }
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::Sandbox
    }
}

impl FromStr for Server {
    type Err = ServerParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "0" => Ok(Self::Sandbox),
            "1" => Ok(Self::Production),
            other => Url::parse(other)
                .map(Self::Custom)
                .map_err(|source| ServerParseError {
                    raw: raw.to_owned(),
                    source,
                }),
        }
    }
}

impl From<Url> for Server {
    fn from(url: Url) -> Self {
        Self::Custom(url)
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_flags_select_well_known_servers() {
        assert_eq!("0".parse::<Server>().unwrap(), Server::Sandbox);
        assert_eq!("1".parse::<Server>().unwrap(), Server::Production);
        assert_eq!(Server::Sandbox.url().as_str(), SANDBOX_URL);
        assert_eq!(Server::Production.url().as_str(), PRODUCTION_URL);
    }

    #[test]
    fn test_custom_url_is_used_verbatim() {
        let server: Server = "https://random-server.smileidentity.com/v1".parse().unwrap();
        assert_eq!(
            server.url().as_str(),
            "https://random-server.smileidentity.com/v1"
        );
    }

    #[test]
    fn test_invalid_server() {
        let err = "2".parse::<Server>().unwrap_err();
        assert!(err.to_string().contains("[E009]"));
    }
}
