use axum::http::HeaderValue;
use cookie::{time::Duration, Cookie};

use crate::config::RelayConfig;

const SESSION_MAX_AGE_HOURS: i64 = 24;

/// Splits one `Set-Cookie` header value into its cookie entries.
///
/// Some upstreams and intermediaries fold several cookies into a single
/// comma-joined value. A comma inside an `Expires` date is not a separator.
/// Any other comma is treated as one.
pub fn split_set_cookie(raw: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut start = 0;

    for (idx, _) in raw.match_indices(',') {
        let attribute = raw[start..idx]
            .rsplit(';')
            .next()
            .unwrap_or_default()
            .trim_start();
        let in_expires = attribute
            .get(..8)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("expires="))
            && !attribute.contains(',');
        if in_expires {
            continue;
        }
        entries.push(raw[start..idx].trim());
        start = idx + 1;
    }
    entries.push(raw[start..].trim());

    entries.retain(|entry| !entry.is_empty());
    entries
}

/// Re-issues the upstream session cookie under the local cookie policy.
///
/// Only cookies named `config.session_cookie_name` survive; the upstream's
/// own attributes are discarded.
pub fn translate_session_cookies<'a, I>(values: I, config: &RelayConfig) -> Vec<HeaderValue>
where
    I: IntoIterator<Item = &'a HeaderValue>,
{
    let mut translated = Vec::new();

    for value in values {
        let Ok(raw) = value.to_str() else {
            tracing::debug!("skipping non-UTF-8 set-cookie header");
            continue;
        };

        for entry in split_set_cookie(raw) {
            let parsed = match Cookie::parse(entry) {
                Ok(parsed) => parsed,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unparsable upstream cookie");
                    continue;
                }
            };
            if parsed.name() != config.session_cookie_name {
                continue;
            }

            let local = session_cookie(config, parsed.value());
            match HeaderValue::from_str(&local.to_string()) {
                Ok(header) => translated.push(header),
                Err(err) => tracing::warn!(error = %err, "session cookie is not a valid header"),
            }
        }
    }

    translated
}

fn session_cookie(config: &RelayConfig, value: &str) -> Cookie<'static> {
    Cookie::build((config.session_cookie_name.clone(), value.to_owned()))
        .http_only(true)
        .secure(config.secure)
        .same_site(config.same_site)
        .path("/")
        .max_age(Duration::hours(SESSION_MAX_AGE_HOURS))
        .build()
}
