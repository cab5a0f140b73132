//! 测试用内存平台实现

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use vmprov_pipeline::{LocationConfig, PipelineState, Ui, VmConfig};
use vmprov_platform::{
    CloneSpec, ConfigSpec, ObjectKind, ObjectRef, PlatformError, Result, SnapshotRequest, Task,
    TaskResult, VirtPlatform,
};

pub const TEMPLATE_PATH: &str = "/DC1/vm/templates/base";

/// 克隆目标的清单路径
pub const TARGET_PATH: &str = "/DC1/vm/Workloads/worker-01";

/// 平台收到的变更请求
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Clone {
        source: String,
        folder: String,
        name: String,
        spec: CloneSpec,
    },
    Reconfigure {
        vm: String,
        spec: ConfigSpec,
    },
    Snapshot {
        vm: String,
        req: SnapshotRequest,
    },
    Destroy {
        vm: String,
    },
}

/// 注入的故障
#[derive(Debug, Default, Clone)]
pub struct Faults {
    pub datacenter: bool,
    pub folder: bool,
    pub pool_error: bool,
    pub pool_empty: bool,
    pub datastore: bool,
    pub template: bool,
    /// 提交即被拒绝的操作
    pub reject: Vec<&'static str>,
    /// 任务执行失败的操作
    pub fail_task: Vec<&'static str>,
    /// 克隆任务成功但不返回结果引用
    pub clone_without_result: bool,
    /// 前 N 次等待返回超时
    pub timeouts: usize,
}

pub struct MockPlatform {
    faults: Faults,
    calls: Mutex<Vec<Call>>,
    pool_paths: Mutex<Vec<String>>,
    tasks: Mutex<HashMap<String, (String, Option<ObjectRef>)>>,
    created: Mutex<Vec<ObjectRef>>,
    timeouts_left: AtomicUsize,
    waits: AtomicUsize,
    next_id: AtomicUsize,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::with_faults(Faults::default())
    }

    pub fn with_faults(faults: Faults) -> Self {
        Self {
            timeouts_left: AtomicUsize::new(faults.timeouts),
            faults,
            calls: Mutex::new(Vec::new()),
            pool_paths: Mutex::new(Vec::new()),
            tasks: Mutex::new(HashMap::new()),
            created: Mutex::new(Vec::new()),
            waits: AtomicUsize::new(0),
            next_id: AtomicUsize::new(1),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn destroy_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Destroy { vm } => Some(vm),
                _ => None,
            })
            .collect()
    }

    pub fn reconfigure_calls(&self) -> Vec<ConfigSpec> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Reconfigure { spec, .. } => Some(spec),
                _ => None,
            })
            .collect()
    }

    pub fn snapshot_calls(&self) -> Vec<(String, SnapshotRequest)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Snapshot { vm, req } => Some((vm, req)),
                _ => None,
            })
            .collect()
    }

    pub fn pool_paths(&self) -> Vec<String> {
        self.pool_paths.lock().unwrap().clone()
    }

    /// 预置一台已存在的虚拟机
    pub fn seed_vm(&self, vm: ObjectRef) {
        self.created.lock().unwrap().push(vm);
    }

    /// 清单路径上的虚拟机
    pub fn vm_at(&self, path: &str) -> Option<ObjectRef> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .find(|vm| vm.inventory_path == path)
            .cloned()
    }

    pub fn wait_count(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn submit(&self, operation: &'static str, call: Call, result: Option<ObjectRef>) -> Result<Task> {
        if self.faults.reject.contains(&operation) {
            return Err(PlatformError::ApiError(400, format!("{} rejected", operation)));
        }
        self.calls.lock().unwrap().push(call);

        let task = Task::new(self.next_id("task"), operation);
        self.tasks
            .lock()
            .unwrap()
            .insert(task.id.clone(), (operation.to_string(), result));
        Ok(task)
    }
}

#[async_trait]
impl VirtPlatform for MockPlatform {
    async fn datacenter_or_default(&self, name: &str) -> Result<ObjectRef> {
        if self.faults.datacenter {
            return Err(PlatformError::NotFound(format!("datacenter '{}'", name)));
        }
        let name = if name.is_empty() { "DC1" } else { name };
        Ok(ObjectRef::new(ObjectKind::Datacenter, "datacenter-1", name).with_path(format!("/{}", name)))
    }

    async fn folder_or_default(&self, datacenter: &ObjectRef, name: &str) -> Result<ObjectRef> {
        if self.faults.folder {
            return Err(PlatformError::NotFound(format!("folder '{}'", name)));
        }
        let path = if name.is_empty() {
            format!("/{}/vm", datacenter.name)
        } else {
            format!("/{}/vm/{}", datacenter.name, name)
        };
        let name = if name.is_empty() { "vm" } else { name };
        Ok(ObjectRef::new(ObjectKind::Folder, "group-v1", name).with_path(path))
    }

    async fn resource_pool(&self, path: &str) -> Result<Option<ObjectRef>> {
        self.pool_paths.lock().unwrap().push(path.to_string());
        if self.faults.pool_error {
            return Err(PlatformError::ApiError(500, "inventory unavailable".to_string()));
        }
        if self.faults.pool_empty {
            return Ok(None);
        }
        Ok(Some(
            ObjectRef::new(ObjectKind::ResourcePool, "resgroup-8", "default").with_path(path),
        ))
    }

    async fn datastore(&self, _datacenter: &ObjectRef, name: &str) -> Result<ObjectRef> {
        if self.faults.datastore {
            return Err(PlatformError::NotFound(format!("datastore '{}'", name)));
        }
        Ok(ObjectRef::new(ObjectKind::Datastore, "datastore-2", name))
    }

    async fn virtual_machine(&self, path: &str) -> Result<ObjectRef> {
        if path == TEMPLATE_PATH && !self.faults.template {
            return Ok(
                ObjectRef::new(ObjectKind::VirtualMachine, "vm-template", "base").with_path(path),
            );
        }
        self.created
            .lock()
            .unwrap()
            .iter()
            .find(|vm| vm.inventory_path == path)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("vm '{}'", path)))
    }

    async fn clone_vm(
        &self,
        source: &ObjectRef,
        folder: &ObjectRef,
        name: &str,
        spec: &CloneSpec,
    ) -> Result<Task> {
        let vm = ObjectRef::new(ObjectKind::VirtualMachine, self.next_id("vm"), name)
            .with_path(format!("{}/{}", folder.inventory_path, name));
        let result = (!self.faults.clone_without_result).then(|| vm.clone());

        let task = self.submit(
            "clone",
            Call::Clone {
                source: source.id.clone(),
                folder: folder.id.clone(),
                name: name.to_string(),
                spec: spec.clone(),
            },
            result,
        )?;

        // 平台在任务接受后即创建虚拟机
        self.created.lock().unwrap().push(vm);
        Ok(task)
    }

    async fn reconfigure_vm(&self, vm: &ObjectRef, spec: &ConfigSpec) -> Result<Task> {
        self.submit(
            "reconfigure",
            Call::Reconfigure {
                vm: vm.id.clone(),
                spec: spec.clone(),
            },
            None,
        )
    }

    async fn create_snapshot(&self, vm: &ObjectRef, req: &SnapshotRequest) -> Result<Task> {
        self.submit(
            "snapshot",
            Call::Snapshot {
                vm: vm.id.clone(),
                req: req.clone(),
            },
            None,
        )
    }

    async fn destroy_vm(&self, vm: &ObjectRef) -> Result<Task> {
        self.submit("destroy", Call::Destroy { vm: vm.id.clone() }, None)
    }

    async fn wait_for_task(&self, task: &Task, _deadline: Option<Duration>) -> Result<TaskResult> {
        self.waits.fetch_add(1, Ordering::SeqCst);

        let timed_out = self
            .timeouts_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if timed_out {
            return Err(PlatformError::Timeout(format!("task {}", task.id)));
        }

        let (operation, result) = self
            .tasks
            .lock()
            .unwrap()
            .get(&task.id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(task.id.clone()))?;

        if self.faults.fail_task.iter().any(|op| *op == operation) {
            return Err(PlatformError::TaskFailed(format!("{} fault", operation)));
        }
        Ok(TaskResult { result })
    }
}

/// 记录输出内容的界面
#[derive(Default)]
pub struct RecordingUi {
    said: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingUi {
    pub fn said(&self) -> Vec<String> {
        self.said.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Ui for RecordingUi {
    fn say(&self, message: &str) {
        self.said.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

pub fn location() -> LocationConfig {
    LocationConfig {
        datacenter: "DC1".to_string(),
        folder: "Workloads".to_string(),
        host: "cluster1".to_string(),
        resource_pool: "default".to_string(),
        datastore: None,
    }
}

pub fn vm_config() -> VmConfig {
    VmConfig {
        template: TEMPLATE_PATH.to_string(),
        name: "worker-01".to_string(),
    }
}

pub fn new_state(platform: &Arc<MockPlatform>) -> PipelineState {
    PipelineState::new(platform.clone(), Arc::new(RecordingUi::default()))
}

pub fn cloned_vm(id: &str, name: &str) -> ObjectRef {
    ObjectRef::new(ObjectKind::VirtualMachine, id, name)
}
