//! Launch parameter selecting which seat this client plays.
//!
//! The parameter is a query string such as `p=1`, `?p=1` or a full URL
//! carrying `?p=1`. Anything missing or unparsable selects player 0.

use std::env;

/// Query key holding the player index.
pub const PLAYER_PARAM: &str = "p";
/// Environment variable consulted when no argument is given.
pub const LAUNCH_ENV: &str = "FLOCK_LAUNCH";

/// Player index encoded in `launch`, defaulting to 0.
pub fn player_index(launch: Option<&str>) -> usize {
    launch
        .and_then(|raw| {
            let query = raw.split_once('?').map_or(raw, |(_, query)| query);
            let query = query.split('#').next().unwrap_or_default();
            query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(key, _)| *key == PLAYER_PARAM)
                .and_then(|(_, value)| value.trim().parse().ok())
        })
        .unwrap_or(0)
}

/// Launch parameter from the first CLI argument, falling back to [`LAUNCH_ENV`].
pub fn from_env() -> Option<String> {
    env::args().nth(1).or_else(|| env::var(LAUNCH_ENV).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_player_from_query_forms() {
        assert_eq!(player_index(Some("p=1")), 1);
        assert_eq!(player_index(Some("?p=2")), 2);
        assert_eq!(player_index(Some("http://localhost:3000/?x=9&p=3#log")), 3);
    }

    #[test]
    fn missing_or_invalid_defaults_to_zero() {
        assert_eq!(player_index(None), 0);
        assert_eq!(player_index(Some("")), 0);
        assert_eq!(player_index(Some("p=")), 0);
        assert_eq!(player_index(Some("p=-1")), 0);
        assert_eq!(player_index(Some("p=two")), 0);
        assert_eq!(player_index(Some("q=1")), 0);
    }
}
