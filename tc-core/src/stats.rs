//! Parsing of `tc -s qdisc show` output.
//!
//! ```text
//! qdisc netem 8001: root refcnt 2 limit 1000 loss 40%
//!  Sent 12345 bytes 120 pkt (dropped 48, overlimits 0 requeues 0)
//!  backlog 0b 0p requeues 0
//! ```

use serde::{Deserialize, Serialize};

/// Counters for one queueing discipline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QdiscStats {
    /// Discipline kind (`netem`, `tbf`, `noqueue`, ...).
    pub kind: String,
    /// Handle as printed, e.g. `8001:`.
    pub handle: String,
    /// Attached at the interface root.
    pub root: bool,
    /// Parameters following the handle and placement.
    pub parameters: String,
    /// Bytes sent.
    pub sent_bytes: u64,
    /// Packets sent.
    pub sent_packets: u64,
    /// Packets dropped.
    pub dropped: u64,
    /// Overlimit events.
    pub overlimits: u64,
    /// Requeues.
    pub requeues: u64,
}

/// Every discipline reported for an interface, plus the raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QdiscReport {
    /// Parsed disciplines in output order.
    pub qdiscs: Vec<QdiscStats>,
    /// Unparsed output.
    pub raw: String,
}

impl QdiscReport {
    /// Parse `tc -s qdisc show dev <iface>` output.
    ///
    /// Lines that are not understood are skipped; the raw text is always kept.
    pub fn parse(raw: &str) -> Self {
        let mut qdiscs: Vec<QdiscStats> = Vec::new();

        for line in raw.lines() {
            let trimmed = line.trim();
            if let Some(rest) = trimmed.strip_prefix("qdisc ") {
                qdiscs.push(parse_header(rest));
            } else if let Some(rest) = trimmed.strip_prefix("Sent ") {
                if let Some(current) = qdiscs.last_mut() {
                    parse_counters(rest, current);
                }
            }
        }

        Self {
            qdiscs,
            raw: raw.to_string(),
        }
    }

    /// Disciplines attached at the root.
    pub fn roots(&self) -> impl Iterator<Item = &QdiscStats> {
        self.qdiscs.iter().filter(|q| q.root)
    }

    /// The single root discipline, if exactly one exists.
    pub fn root(&self) -> Option<&QdiscStats> {
        let mut roots = self.roots();
        let first = roots.next()?;
        roots.next().is_none().then_some(first)
    }

    /// Returns true if the root discipline is one this crate installs.
    pub fn has_impairment(&self) -> bool {
        self.roots().any(|q| q.kind == "netem" || q.kind == "tbf")
    }

    /// Total dropped packets across every discipline.
    pub fn total_dropped(&self) -> u64 {
        self.qdiscs.iter().map(|q| q.dropped).sum()
    }
}

fn parse_header(rest: &str) -> QdiscStats {
    let mut tokens = rest.split_whitespace();
    let kind = tokens.next().unwrap_or_default().to_string();
    let handle = tokens.next().unwrap_or_default().to_string();

    let remaining: Vec<&str> = tokens.collect();
    let root = remaining.first() == Some(&"root");
    let parameters = match remaining.first() {
        Some(&"root") => remaining[1..].join(" "),
        Some(&"parent") => remaining.get(2..).map(|r| r.join(" ")).unwrap_or_default(),
        _ => remaining.join(" "),
    };

    QdiscStats {
        kind,
        handle,
        root,
        parameters,
        ..Default::default()
    }
}

fn parse_counters(rest: &str, stats: &mut QdiscStats) {
    // "12345 bytes 120 pkt (dropped 48, overlimits 0 requeues 0)"
    let cleaned = rest.replace(['(', ')', ','], " ");
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();

    for pair in tokens.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        match (a.parse::<u64>(), b) {
            (Ok(n), "bytes") => stats.sent_bytes = n,
            (Ok(n), "pkt") => stats.sent_packets = n,
            _ => {}
        }
        if let Ok(n) = b.parse::<u64>() {
            match a {
                "dropped" => stats.dropped = n,
                "overlimits" => stats.overlimits = n,
                "requeues" => stats.requeues = n,
                _ => {}
            }
        }
    }
}
