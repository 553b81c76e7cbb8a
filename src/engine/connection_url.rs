// SPDX-License-Identifier: Apache-2.0

//! Connection URL parsing
//!
//! Turns a database connection URL into [`ConnectionProperties`]. Credentials
//! are lifted out of the URL (percent-decoded) so they never travel inside the
//! address string, and query parameters become driver options.
//!
//! Embedded databases address a file: `duckdb:///var/data/orders.duckdb`,
//! `duckdb::memory:`, `sqlite:///tmp/app.db`. Network databases must name a
//! host: `postgres://user:pass@db:5432/orders?sslmode=require`.

use url::Url;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::types::ConnectionProperties;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddressKind {
    File,
    Network,
}

/// Scheme → (driver id, address kind)
const SCHEMES: &[(&str, &str, AddressKind)] = &[
    ("duckdb", "duckdb", AddressKind::File),
    ("sqlite", "sqlite", AddressKind::File),
    ("postgres", "postgres", AddressKind::Network),
    ("postgresql", "postgres", AddressKind::Network),
    ("mysql", "mysql", AddressKind::Network),
    ("mariadb", "mysql", AddressKind::Network),
    ("sqlserver", "sqlserver", AddressKind::Network),
    ("mssql", "sqlserver", AddressKind::Network),
];

fn lookup_scheme(scheme: &str) -> Option<(&'static str, AddressKind)> {
    SCHEMES
        .iter()
        .find(|(s, _, _)| s.eq_ignore_ascii_case(scheme))
        .map(|(_, driver, kind)| (*driver, *kind))
}

/// Lists the URL schemes understood by [`parse_connection_url`].
pub fn supported_schemes() -> Vec<&'static str> {
    SCHEMES.iter().map(|(s, _, _)| *s).collect()
}

/// Parses a connection URL into connection properties.
pub fn parse_connection_url(text: &str) -> EngineResult<ConnectionProperties> {
    let url = Url::parse(text.trim())
        .map_err(|e| EngineError::validation(format!("Invalid URL: {e}")))?;

    let (driver, kind) = lookup_scheme(url.scheme()).ok_or_else(|| {
        EngineError::validation(format!(
            "Unsupported URL scheme '{}'. Supported schemes: {}",
            url.scheme(),
            supported_schemes().join(", ")
        ))
    })?;

    let address = match kind {
        AddressKind::File => file_address(&url)?,
        AddressKind::Network => network_address(&url)?,
    };

    let mut properties = ConnectionProperties::new(driver, address);

    if !url.username().is_empty() {
        properties.username = Some(percent_decode(url.username(), "username")?);
    }
    if let Some(password) = url.password() {
        let password = percent_decode(password, "password")?;
        properties.password = Some(crate::observability::Sensitive::new(password));
    }

    for (key, value) in url.query_pairs() {
        properties.options.insert(key.into_owned(), value.into_owned());
    }

    Ok(properties)
}

fn file_address(url: &Url) -> EngineResult<String> {
    let path = percent_decode(url.path(), "path")?;
    if path.is_empty() || path == "/" {
        return Err(EngineError::validation(format!(
            "{} URL must specify a file path or :memory:",
            url.scheme()
        )));
    }
    Ok(path)
}

fn network_address(url: &Url) -> EngineResult<String> {
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| EngineError::validation(format!("{} URL must specify a host", url.scheme())))?;

    let mut address = format!("{}://{}", url.scheme(), host);
    if let Some(port) = url.port() {
        address.push_str(&format!(":{port}"));
    }
    address.push_str(url.path());
    Ok(address)
}

fn percent_decode(s: &str, what: &str) -> EngineResult<String> {
    percent_encoding::percent_decode_str(s)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| EngineError::validation(format!("Invalid {what} encoding")))
}
