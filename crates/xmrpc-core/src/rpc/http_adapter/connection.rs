use std::fmt;

use reqwest::Url;

use crate::error::CoreError;

/// Username/password pair used to answer digest challenges.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Target node address plus optional credentials.
///
/// Immutable once built. Swapping credentials means building a new
/// descriptor and handing it to [`HttpRpcClient::with_connection`].
///
/// [`HttpRpcClient::with_connection`]: super::HttpRpcClient::with_connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    base: String,
    credentials: Option<Credentials>,
}

impl ConnectionDescriptor {
    /// Build a descriptor for an `http://` or `https://` base address.
    ///
    /// Credentials are attached when `username` is non-empty; the password
    /// may be empty.
    pub fn new(
        base_address: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self, CoreError> {
        let base = parse_base_address(base_address)?;
        let credentials = resolve_credentials(username, password);
        Ok(Self { base, credentials })
    }

    pub fn base_address(&self) -> &str {
        &self.base
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Full request URL for a method path such as `/json_rpc`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

fn resolve_credentials(username: Option<&str>, password: Option<&str>) -> Option<Credentials> {
    match username {
        Some(user) if !user.is_empty() => Some(Credentials {
            username: user.to_owned(),
            password: password.unwrap_or_default().to_owned(),
        }),
        _ => None,
    }
}

fn parse_base_address(address: &str) -> Result<String, CoreError> {
    let invalid = |reason: String| CoreError::InvalidAddress {
        address: address.to_owned(),
        reason,
    };

    let parsed = Url::parse(address).map_err(|e| invalid(format!("expected HTTP(S) URL ({e})")))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(invalid(format!(
                "unsupported scheme `{other}`; expected http or https"
            )))
        }
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host".to_owned()));
    }
    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err(invalid(
            "credentials in the URL are not allowed; pass a username and password".to_owned(),
        ));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid(
            "query or fragment in the base URL; only scheme, host, port and path are allowed"
                .to_owned(),
        ));
    }

    Ok(address.trim_end_matches('/').to_owned())
}
