/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use url::Url;

use super::consts::*;

pub fn port_in_range(s: &str) -> Result<u16, String> {
    let port: usize = s
        .parse()
        .map_err(|_| format!("`{s}` is not a port number"))?;

    if PORT_RANGE.contains(&port) {
        Ok(port as u16)
    } else {
        Err(format!(
            "port not in range {}-{}",
            PORT_RANGE.start(),
            PORT_RANGE.end()
        ))
    }
}

pub fn greater_than_zero<
    T: std::str::FromStr + std::cmp::PartialOrd + std::fmt::Display + Default,
>(
    s: &str,
) -> Result<T, String> {
    let num: T = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid number", s))?;

    if num > T::default() {
        Ok(num)
    } else {
        Err(format!("`{}` is not larger than 0", s))
    }
}

pub fn load_secret(f: &str) -> String {
    let s = std::fs::read_to_string(f).unwrap_or_default();
    s.trim().replace(char::from(25), "")
}

/// The target URL of a build must be an absolute http(s) URL with a host.
pub fn valid_target_url(s: &str) -> bool {
    match Url::parse(s) {
        Ok(url) => {
            (url.scheme() == "http" || url.scheme() == "https") && url.host_str().is_some()
        }
        Err(_) => false,
    }
}

/// Android/iOS/HarmonyOS package identifiers: two or more dot-separated
/// segments, each starting with a letter followed by letters, digits, or
/// underscores. Case-insensitive.
pub fn valid_package_identifier(s: &str) -> bool {
    let segments: Vec<&str> = s.split('.').collect();

    if segments.len() < 2 {
        return false;
    }

    for segment in segments {
        let mut chars = segment.chars();

        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => {}
            _ => return false,
        }

        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return false;
        }
    }

    true
}

/// Version names look like `1`, `1.0`, or `1.0.3`.
pub fn valid_version_name(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }

    s.split('.')
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

/// Object paths handed to the artifact store must stay inside the store
/// root.
pub fn safe_object_path(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('/')
        && !s.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..")
}
