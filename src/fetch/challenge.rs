// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Anti-bot interstitial detection

/// Markers of a bot-check page that carries no real content
///
/// Not `/cdn-cgi/challenge-platform/`: that script is injected into ordinary
/// pages as well.
const INTERSTITIAL_MARKERS: &[&str] = &[
    "cf-browser-verification",
    "cf_chl_opt",
    "<title>just a moment",
    "checking your browser before accessing",
    "ddos-guard",
    "enable javascript and cookies to continue",
];

/// Lenient check used by browser strategies to decide whether to wait
///
/// Any mention of "challenge" triggers the grace period. A false positive
/// only costs the wait.
pub fn has_challenge_marker(markup: &str) -> bool {
    markup.to_lowercase().contains("challenge")
}

/// Strict check used by HTTP strategies to reject interstitial bodies
pub fn is_challenge_interstitial(markup: &str) -> bool {
    let lower = markup.to_lowercase();
    INTERSTITIAL_MARKERS.iter().any(|m| lower.contains(m))
}
