//! Social post URL parsing.

use faucet_types::PostId;

use crate::AttestationError;

/// Hosts a post URL may point at.
const POST_HOSTS: [&str; 4] = ["twitter.com", "www.twitter.com", "x.com", "www.x.com"];

/// Extract the post id from `http(s)://[www.](twitter.com|x.com)/<user>/status/<digits>`.
///
/// Anything after the digits (query string, `/photo/1`, ...) is ignored.
pub fn parse_post_url(url: &str) -> Result<PostId, AttestationError> {
    let invalid = || AttestationError::InvalidPostUrl(url.to_string());
    let url = url.trim();

    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(invalid)?;

    let (host, path) = rest.split_once('/').ok_or_else(invalid)?;
    if !POST_HOSTS.iter().any(|h| h.eq_ignore_ascii_case(host)) {
        return Err(invalid());
    }

    let mut segments = path.splitn(3, '/');
    let user = segments.next().unwrap_or_default();
    let status = segments.next().unwrap_or_default();
    let tail = segments.next().unwrap_or_default();
    if user.is_empty() || status != "status" {
        return Err(invalid());
    }

    let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
    PostId::parse(digits).map_err(|_| invalid())
}
