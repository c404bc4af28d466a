//! Channel to detector correlation.
//!
//! Vendors name the same light path differently in the channel list and in
//! the detector list, even within one file. A channel is matched to a
//! detector by name: exact matches first, then case-sensitive substring
//! containment in either direction. Within each pass detectors are taken in
//! document order (tracks in order, detectors in order within a track) and
//! the first match wins.

use crate::tree::RawNode;

/// A detector together with the channel name it records.
#[derive(Debug, Clone)]
pub struct DetectorRecord<'a> {
    /// Channel name recorded on the detector (may be empty)
    pub channel_name: String,
    /// The detector's subtree
    pub node: &'a RawNode,
}

impl<'a> DetectorRecord<'a> {
    /// Pair a detector node with its recorded channel name.
    pub fn new(channel_name: impl Into<String>, node: &'a RawNode) -> Self {
        Self {
            channel_name: channel_name.into(),
            node,
        }
    }
}

/// Every detector correlated with `channel`, best match first.
///
/// Blank names on either side never match.
pub fn candidates<'d, 'a>(
    channel: &str,
    detectors: &'d [DetectorRecord<'a>],
) -> Vec<&'d DetectorRecord<'a>> {
    let channel = channel.trim();
    if channel.is_empty() {
        return Vec::new();
    }

    let usable = detectors.iter().filter(|d| !d.channel_name.trim().is_empty());
    let exact = usable.clone().filter(|d| d.channel_name == channel);
    let fuzzy = usable.filter(|d| {
        d.channel_name != channel
            && (channel.contains(d.channel_name.as_str()) || d.channel_name.contains(channel))
    });
    exact.chain(fuzzy).collect()
}

/// The best detector for `channel`, if any.
pub fn correlate<'d, 'a>(
    channel: &str,
    detectors: &'d [DetectorRecord<'a>],
) -> Option<&'d DetectorRecord<'a>> {
    candidates(channel, detectors).into_iter().next()
}

/// The best detector for `channel` that also satisfies `accept`.
pub fn correlate_where<'d, 'a>(
    channel: &str,
    detectors: &'d [DetectorRecord<'a>],
    accept: impl Fn(&DetectorRecord<'a>) -> bool,
) -> Option<&'d DetectorRecord<'a>> {
    candidates(channel, detectors)
        .into_iter()
        .find(|detector| accept(detector))
}
