//! Magnet URI construction.

/// Trackers appended to every magnet link this crate builds.
pub const TRACKERS: [&str; 10] = [
    "udp://tracker.internetwarriors.net:1337/announce",
    "udp://tracker.opentrackr.org:1337/announce",
    "udp://p4p.arenabg.ch:1337/announce",
    "udp://tracker.openbittorrent.com:6969/announce",
    "udp://www.torrent.eu.org:451/announce",
    "udp://tracker.torrent.eu.org:451/announce",
    "udp://retracker.lanta-net.ru:2710/announce",
    "udp://open.stealth.si:80/announce",
    "udp://exodus.desync.com:6969/announce",
    "udp://tracker.tiny-vps.com:6969/announce",
];

/// Placeholder some sites use when they have no info-hash.
pub const NULL_INFO_HASH: &str = "0000000000000000000000000000000000000000";

/// Returns true if `hash` is the all-zero placeholder.
pub fn is_null_hash(hash: &str) -> bool {
    !hash.is_empty() && hash.chars().all(|c| c == '0')
}

/// Returns true if `hash` looks like a hex SHA-1 info-hash.
pub fn is_info_hash(hash: &str) -> bool {
    hash.len() == 40 && hash.chars().all(|c| c.is_ascii_hexdigit()) && !is_null_hash(hash)
}

/// Returns the value of a magnet URI's `xt=urn:btih:` parameter.
pub fn info_hash_of(magnet: &str) -> Option<&str> {
    const BTIH: &str = "urn:btih:";
    let start = magnet.to_ascii_lowercase().find(BTIH)? + BTIH.len();
    let rest = &magnet[start..];
    let end = rest.find('&').unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Accepts a magnet URI scraped from a page.
///
/// Returns `None` when it is not a magnet URI or carries the all-zero
/// placeholder hash.
pub fn checked_magnet(magnet: &str) -> Option<&str> {
    let magnet = magnet.trim();
    if !magnet.starts_with("magnet:") {
        return None;
    }
    match info_hash_of(magnet) {
        Some(hash) if is_null_hash(hash) => None,
        _ => Some(magnet),
    }
}

/// Builds `magnet:?xt=urn:btih:<hash>&dn=<name>&tr=...`.
///
/// Returns `None` for the all-zero placeholder hash or an empty hash.
pub fn magnet_link(hash: &str, name: &str) -> Option<String> {
    let hash = hash.trim();
    if hash.is_empty() || is_null_hash(hash) {
        return None;
    }
    let mut link = format!("magnet:?xt=urn:btih:{}", hash);
    if !name.is_empty() {
        link.push_str("&dn=");
        link.push_str(&urlencoding::encode(name));
    }
    for tracker in TRACKERS {
        link.push_str("&tr=");
        link.push_str(&urlencoding::encode(tracker));
    }
    Some(link)
}
