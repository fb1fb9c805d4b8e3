// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Hostname and OS fingerprint detection

use std::env;
use tracing::warn;

/// Get the system hostname
///
/// Tries multiple methods in order:
/// 1. FLEET_HOSTNAME environment variable (explicit override)
/// 2. HOSTNAME environment variable
/// 3. System hostname via `nix::unistd::gethostname()`
/// 4. Fallback to "unknown" if all methods fail
#[must_use]
pub fn hostname() -> String {
    if let Ok(hostname) = env::var("FLEET_HOSTNAME") {
        if !hostname.is_empty() {
            return hostname;
        }
    }

    if let Ok(hostname) = env::var("HOSTNAME") {
        if !hostname.is_empty() {
            return hostname;
        }
    }

    match nix::unistd::gethostname() {
        Ok(hostname_osstr) => {
            if let Some(hostname_str) = hostname_osstr.to_str() {
                if !hostname_str.is_empty() {
                    return hostname_str.to_string();
                }
            }
        }
        Err(e) => {
            warn!("Failed to get system hostname: {}", e);
        }
    }

    warn!("Could not determine hostname, using 'unknown'");
    "unknown".to_string()
}

/// A human-readable OS fingerprint for the registration descriptor,
/// e.g. `Linux 6.1.0 x86_64`.
#[must_use]
pub fn os_fingerprint() -> String {
    match nix::sys::utsname::uname() {
        Ok(info) => format!(
            "{} {} {}",
            info.sysname().to_string_lossy(),
            info.release().to_string_lossy(),
            info.machine().to_string_lossy()
        ),
        Err(e) => {
            warn!("Failed to read uname, falling back to compile-time OS: {}", e);
            env::consts::OS.to_string()
        }
    }
}
