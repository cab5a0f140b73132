//! 硬件配置与快照步骤测试

mod common;

use std::sync::Arc;

use common::*;
use vmprov_pipeline::{
    ConfigureHardwareStep, CreateSnapshotStep, HardwareConfig, PipelineError, PipelineState,
    SnapshotTarget, Step, StepAction,
};

fn state_with_vm(platform: &Arc<MockPlatform>) -> PipelineState {
    let mut state = new_state(platform);
    state.vm = Some(cloned_vm("vm-42", "worker-01"));
    state.source_vm = Some(cloned_vm("vm-template", "base"));
    state
}

fn hardware(cpus: &str, memory: &str) -> ConfigureHardwareStep {
    ConfigureHardwareStep::new(HardwareConfig {
        cpus: cpus.to_string(),
        memory: memory.to_string(),
    })
}

#[tokio::test]
async fn test_hardware_cpu_only() {
    let platform = Arc::new(MockPlatform::new());
    let mut state = state_with_vm(&platform);

    let action = hardware("4", "").run(&mut state).await.unwrap();
    assert_eq!(action, StepAction::Continue);

    let specs = platform.reconfigure_calls();
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].num_cpus, Some(4));
    assert_eq!(specs[0].memory_mb, None);
}

#[tokio::test]
async fn test_hardware_both_fields_single_request() {
    let platform = Arc::new(MockPlatform::new());
    let mut state = state_with_vm(&platform);

    hardware("2", "4096").run(&mut state).await.unwrap();

    let specs = platform.reconfigure_calls();
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].num_cpus, Some(2));
    assert_eq!(specs[0].memory_mb, Some(4096));
}

#[tokio::test]
async fn test_hardware_skipped_without_values() {
    let platform = Arc::new(MockPlatform::new());
    // 跳过时不需要虚拟机
    let mut state = new_state(&platform);

    let action = hardware("", "").run(&mut state).await.unwrap();
    assert_eq!(action, StepAction::Skipped);
    assert!(platform.calls().is_empty());
}

#[tokio::test]
async fn test_hardware_invalid_value_submits_nothing() {
    let platform = Arc::new(MockPlatform::new());
    let mut state = state_with_vm(&platform);

    let err = hardware("abc", "2048").run(&mut state).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::InvalidHardwareValue { field: "cpus", .. }
    ));
    assert!(platform.calls().is_empty());
}

#[tokio::test]
async fn test_hardware_task_failure() {
    let platform = Arc::new(MockPlatform::with_faults(Faults {
        fail_task: vec!["reconfigure"],
        ..Default::default()
    }));
    let mut state = state_with_vm(&platform);

    let err = hardware("", "2048").run(&mut state).await.unwrap_err();
    assert!(matches!(err, PipelineError::ReconfigureTask(_)));
}

#[tokio::test]
async fn test_hardware_requires_vm() {
    let platform = Arc::new(MockPlatform::new());
    let mut state = new_state(&platform);

    let err = hardware("4", "").run(&mut state).await.unwrap_err();
    assert!(matches!(err, PipelineError::MissingState("vm")));
    assert!(platform.calls().is_empty());
}

#[tokio::test]
async fn test_snapshot_disabled_is_noop() {
    let platform = Arc::new(MockPlatform::new());
    let mut state = state_with_vm(&platform);

    let mut step = CreateSnapshotStep::new(false, "golden", SnapshotTarget::Clone);
    assert_eq!(step.run(&mut state).await.unwrap(), StepAction::Skipped);
    assert!(platform.calls().is_empty());
}

#[tokio::test]
async fn test_snapshot_of_clone() {
    let platform = Arc::new(MockPlatform::new());
    let mut state = state_with_vm(&platform);

    let mut step = CreateSnapshotStep::new(true, "golden", SnapshotTarget::Clone);
    assert_eq!(step.run(&mut state).await.unwrap(), StepAction::Continue);

    let snapshots = platform.snapshot_calls();
    assert_eq!(snapshots.len(), 1);
    let (vm, req) = &snapshots[0];
    assert_eq!(vm, "vm-42");
    assert_eq!(req.name, "golden");
    assert!(req.description.is_empty());
    assert!(req.memory && req.quiesce);
    assert_eq!(platform.wait_count(), 1);
}

#[tokio::test]
async fn test_snapshot_of_source() {
    let platform = Arc::new(MockPlatform::new());
    let mut state = state_with_vm(&platform);

    let mut step = CreateSnapshotStep::new(true, "golden", SnapshotTarget::Source);
    step.run(&mut state).await.unwrap();

    assert_eq!(platform.snapshot_calls()[0].0, "vm-template");
}

#[tokio::test]
async fn test_snapshot_task_failure() {
    let platform = Arc::new(MockPlatform::with_faults(Faults {
        fail_task: vec!["snapshot"],
        ..Default::default()
    }));
    let mut state = state_with_vm(&platform);

    let mut step = CreateSnapshotStep::new(true, "golden", SnapshotTarget::Clone);
    let err = step.run(&mut state).await.unwrap_err();
    assert!(matches!(err, PipelineError::SnapshotTask(_)));
}
