//! Replace and clear scenarios against a simulated kernel.
//!
//! Every `add_*` must leave exactly one root discipline, clearing must be safe
//! on a clean interface, and a target that is not running must fail fast.

#[cfg(test)]
mod tests {
    use crate::assertions::{assert_clean, assert_single_root};
    use crate::FakeKernel;
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tc_core::{DirectBackend, StaticPidResolver, TcError, ToolPaths, TrafficController};
    use tc_types::Target;

    const NODE1_PID: u32 = 4821;

    fn controller(kernel: &FakeKernel) -> TrafficController {
        let resolver = StaticPidResolver::new()
            .with("node1", NODE1_PID)
            .with("node2", 4822)
            .with("stopped", 0);
        let backend = DirectBackend::new(
            Arc::new(kernel.clone()),
            Arc::new(resolver),
            ToolPaths::default(),
        );
        TrafficController::new(Arc::new(backend))
    }

    // ========================================================================
    // Clearing
    // ========================================================================

    /// Clearing a never-impaired interface succeeds, twice in a row.
    #[tokio::test]
    async fn clear_on_clean_interface_is_idempotent() {
        let kernel = FakeKernel::new();
        let tc = controller(&kernel);

        tc.clear("node1").await.unwrap();
        tc.clear("node1").await.unwrap();

        assert_eq!(kernel.installed(), 0);
        assert_eq!(
            kernel.commands(),
            vec!["qdisc del dev eth0 root", "qdisc del dev eth0 root"]
        );
    }

    /// loss, clear, latency: the last call finds a clean interface.
    #[tokio::test]
    async fn clear_between_impairments() {
        let kernel = FakeKernel::new();
        let tc = controller(&kernel);

        tc.add_packet_loss("node1", 40.0).await.unwrap();
        tc.clear("node1").await.unwrap();
        assert!(assert_clean(&tc.stats("node1").await.unwrap()).passed);

        tc.add_latency("node1", 500, None).await.unwrap();
        assert_eq!(kernel.root(NODE1_PID, "eth0").as_deref(), Some("netem delay 500ms"));
    }

    // ========================================================================
    // Replace semantics
    // ========================================================================

    /// Two consecutive adds leave only the second discipline.
    #[tokio::test]
    async fn second_add_replaces_first() {
        let kernel = FakeKernel::new();
        let tc = controller(&kernel);

        tc.add_latency("node1", 500, Some(50)).await.unwrap();
        tc.add_packet_loss_correlated("node1", 40.0, 75.0).await.unwrap();

        assert_eq!(kernel.installed(), 1);
        assert_eq!(
            kernel.root(NODE1_PID, "eth0").as_deref(),
            Some("netem loss 40% 75%")
        );

        let result = assert_single_root(&tc.stats("node1").await.unwrap(), "netem");
        assert!(result.passed, "{:?}", result.failure_details);
    }

    /// Switching between netem and tbf keeps a single root.
    #[tokio::test]
    async fn switching_discipline_kind() {
        let kernel = FakeKernel::new();
        let tc = controller(&kernel);

        tc.add_packet_loss("node1", 10.0).await.unwrap();
        tc.add_bandwidth("node1", "1mbit").await.unwrap();

        let result = assert_single_root(&tc.stats("node1").await.unwrap(), "tbf");
        assert!(result.passed, "{:?}", result.failure_details);

        tc.add_latency("node1", 20, None).await.unwrap();
        let result = assert_single_root(&tc.stats("node1").await.unwrap(), "netem");
        assert!(result.passed, "{:?}", result.failure_details);
    }

    /// Impairing one node leaves the others untouched.
    #[tokio::test]
    async fn nodes_are_isolated() {
        let kernel = FakeKernel::new();
        let tc = controller(&kernel);

        tc.add_packet_loss("node2", 40.0).await.unwrap();

        assert!(kernel.root(NODE1_PID, "eth0").is_none());
        assert!(assert_clean(&tc.stats("node1").await.unwrap()).passed);
        assert!(tc.stats("node2").await.unwrap().has_impairment());
    }

    // ========================================================================
    // Failure modes
    // ========================================================================

    /// A stopped node is NotRunning well before the deadline.
    #[tokio::test]
    async fn stopped_node_fails_fast() {
        let kernel = FakeKernel::new();
        let tc = controller(&kernel).with_timeout(Duration::from_secs(5));

        let start = Instant::now();
        let err = tc.add_latency("stopped", 500, None).await.unwrap_err();

        assert!(err.is_not_running(), "{err}");
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(kernel.commands().is_empty());
    }

    /// A node the runtime never heard of is NotRunning too.
    #[tokio::test]
    async fn unknown_node_is_not_running() {
        let kernel = FakeKernel::new();
        let err = controller(&kernel).clear("node9").await.unwrap_err();
        assert!(err.is_not_running());
    }

    /// A missing interface is a command failure, not a tolerated clear.
    #[tokio::test]
    async fn missing_interface_is_command_error() {
        let kernel = FakeKernel::new();
        let tc = controller(&kernel);

        let err = tc
            .clear(Target::new("node1").interface("eth9"))
            .await
            .unwrap_err();

        match err {
            TcError::Command {
                command,
                exit_code,
                stderr,
                ..
            } => {
                assert_eq!(command, "nsenter -t 4821 -n tc qdisc del dev eth9 root");
                assert_eq!(exit_code, 1);
                assert!(stderr.contains("Cannot find device"));
            }
            other => panic!("expected Command, got {other:?}"),
        }
    }

    /// Shaping a secondary interface goes through the per-call override.
    #[tokio::test]
    async fn per_call_interface() {
        let kernel = FakeKernel::with_interfaces(&["eth0", "eth1"]);
        let tc = controller(&kernel);

        tc.add_packet_loss(Target::new("node1").interface("eth1"), 5.0)
            .await
            .unwrap();

        assert!(kernel.root(NODE1_PID, "eth0").is_none());
        assert_eq!(kernel.root(NODE1_PID, "eth1").as_deref(), Some("netem loss 5%"));
    }
}
