//! `tc qdisc` argument construction.
//!
//! Builds `tc` command arguments for installing netem and tbf root disciplines,
//! deleting the root discipline, and reading statistics.
//! Requires `iproute2` in the target namespace and `CAP_NET_ADMIN`.

use tc_types::Impairment;

/// Burst allowance of the token-bucket filter.
pub const TBF_BURST: &str = "32kbit";

/// Queue limit of the token-bucket filter, in bytes.
///
/// Small enough that a full queue adds little latency at low rates
/// (12500 bytes drain in 100ms at 1mbit).
pub const TBF_LIMIT_BYTES: u32 = 12_500;

/// `tc` arguments for one interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QdiscConfig {
    /// Network interface to operate on.
    pub interface: String,
}

impl QdiscConfig {
    /// Arguments for the given interface.
    pub fn new(interface: &str) -> Self {
        Self {
            interface: interface.into(),
        }
    }

    /// Build the `tc qdisc add` arguments that install `impairment` at the root.
    ///
    /// Returns `None` for [`Impairment::Clear`], which installs nothing.
    pub fn to_tc_add_args(&self, impairment: &Impairment) -> Option<Vec<String>> {
        let mut args = vec![
            "qdisc".to_string(),
            "add".into(),
            "dev".into(),
            self.interface.clone(),
            "root".into(),
        ];

        match impairment {
            Impairment::Latency {
                delay_ms,
                jitter_ms,
            } => {
                args.push("netem".into());
                args.push("delay".into());
                args.push(format!("{}ms", delay_ms));

                if let Some(jitter) = jitter_ms {
                    args.push(format!("{}ms", jitter));
                }
            }
            Impairment::PacketLoss { percent } => {
                args.push("netem".into());
                args.push("loss".into());
                args.push(format!("{}%", percent));
            }
            Impairment::CorrelatedPacketLoss {
                percent,
                correlation_percent,
            } => {
                args.push("netem".into());
                args.push("loss".into());
                args.push(format!("{}%", percent));
                args.push(format!("{}%", correlation_percent));
            }
            Impairment::Bandwidth { rate } => {
                args.push("tbf".into());
                args.push("rate".into());
                args.push(rate.to_string());
                args.push("burst".into());
                args.push(TBF_BURST.into());
                args.push("limit".into());
                args.push(TBF_LIMIT_BYTES.to_string());
            }
            Impairment::Clear => return None,
        }

        Some(args)
    }

    /// Build the `tc qdisc del` arguments for clearing the root discipline.
    ///
    /// Returns args for: `tc qdisc del dev <iface> root`
    pub fn to_tc_del_args(&self) -> Vec<String> {
        vec![
            "qdisc".into(),
            "del".into(),
            "dev".into(),
            self.interface.clone(),
            "root".into(),
        ]
    }

    /// Build the `tc -s qdisc show` arguments.
    pub fn to_tc_show_args(&self) -> Vec<String> {
        vec![
            "-s".into(),
            "qdisc".into(),
            "show".into(),
            "dev".into(),
            self.interface.clone(),
        ]
    }
}

/// Why a failed root delete still counts as cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NothingToClear {
    /// The root is the kernel default discipline (handle 0).
    ZeroHandle,
    /// No discipline, or no such interface.
    NotFound,
}

const ZERO_HANDLE_MARKER: &str = "cannot delete qdisc with handle of zero";
const NOT_FOUND_MARKER: &str = "no such file or directory";

impl NothingToClear {
    /// Classify the stderr of a failed `tc qdisc del`.
    ///
    /// `tc` exits 2 for every netlink failure, so its message is the only signal.
    pub fn classify(stderr: &str) -> Option<Self> {
        let stderr = stderr.to_ascii_lowercase();
        if stderr.contains(ZERO_HANDLE_MARKER) {
            Some(NothingToClear::ZeroHandle)
        } else if stderr.contains(NOT_FOUND_MARKER) {
            Some(NothingToClear::NotFound)
        } else {
            None
        }
    }
}

/// Join a program and its arguments into a printable command line.
pub fn command_line(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}
