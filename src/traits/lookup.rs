use crate::descriptor::WorkerType;
use crate::registry::RegisteredWorker;

/// Type+name resolution over an ordered set of registered workers.
///
/// Implemented for slices so `after_init` can resolve siblings from the
/// snapshot it receives, and by the registry itself.
pub trait WorkerLookup {
    /// Resolve a worker, in order of precedence:
    /// 1. with `name`: the first enabled worker of `worker_type` with that name, else none
    /// 2. without: the first enabled `default` worker of `worker_type`
    /// 3. otherwise the first enabled worker of `worker_type`
    fn get_worker(&self, worker_type: &WorkerType, name: Option<&str>) -> Option<RegisteredWorker>;

    /// Every enabled worker of `worker_type`, in registration order
    fn workers_by_type(&self, worker_type: &WorkerType) -> Vec<RegisteredWorker>;
}

impl WorkerLookup for [RegisteredWorker] {
    fn get_worker(&self, worker_type: &WorkerType, name: Option<&str>) -> Option<RegisteredWorker> {
        let mut candidates = self
            .iter()
            .filter(|w| w.descriptor.enabled && &w.descriptor.worker_type == worker_type);

        let found = match name {
            Some(name) => candidates.find(|w| w.descriptor.name == name),
            None => {
                let mut first = None;
                let mut default = None;
                for worker in candidates {
                    if first.is_none() {
                        first = Some(worker);
                    }
                    if worker.descriptor.default {
                        default = Some(worker);
                        break;
                    }
                }
                default.or(first)
            }
        };

        found.cloned()
    }

    fn workers_by_type(&self, worker_type: &WorkerType) -> Vec<RegisteredWorker> {
        self.iter()
            .filter(|w| w.descriptor.enabled && &w.descriptor.worker_type == worker_type)
            .cloned()
            .collect()
    }
}
