use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use procflow_core::types::{Record, StepInstance, StepInstanceKind, StepSpec, StepStatus};
use procflow_core::Evaluate;

use super::transition::Transition;
use super::{Engine, Rejection};

fn new_instance(spec: &StepSpec, process_key: &str) -> StepInstance {
    let kind = match spec {
        StepSpec::Input(_) => StepInstanceKind::Input {
            temporary_data: Record::new(),
            active_actor: None,
        },
        StepSpec::System(_) => StepInstanceKind::System {
            attempt_timestamps: Vec::new(),
        },
    };
    StepInstance {
        instance_key: Uuid::new_v4().to_string(),
        spec_id: spec.spec_id().clone(),
        process_instance_key: process_key.to_string(),
        predecessors_completed: spec
            .predecessor_steps()
            .iter()
            .map(|p| (p.name.clone(), false))
            .collect(),
        status: StepStatus::Waiting,
        kind,
    }
}

impl Engine {
    /// Create or advance the instances of `specs` after `fired_by` finished
    /// (`None` for the initial steps of a new process).
    ///
    /// A step with N predecessors gets one shared instance. The first firing
    /// creates it WAITING with a join counter of N-1; every later firing
    /// decrements the counter, and the instance becomes ready once the
    /// counter is at or below zero. Input steps whose guard does not hold are
    /// skipped; system steps are never filtered.
    pub(crate) async fn spawn_steps(
        &self,
        tx: &mut Transition,
        specs: &[Arc<StepSpec>],
        fired_by: Option<&str>,
    ) -> Result<(), Rejection> {
        for spec in specs {
            let name = spec.name().to_string();

            if let (StepSpec::Input(_), Some(guard)) = (&**spec, spec.guard_expression()) {
                match guard.evaluate(&tx.process.data) {
                    Ok(true) => {}
                    Ok(false) => {
                        debug!(process_key = %tx.process.instance_key, step = %name, "guard is false, step skipped");
                        continue;
                    }
                    Err(e) => {
                        warn!(process_key = %tx.process.instance_key, step = %name, error = %e, "guard failed to evaluate, step skipped");
                        continue;
                    }
                }
            }

            let initial = spec.predecessor_steps().len() as i64 - 1;
            let waiting = match tx.process.waiting_steps.get(&name).cloned() {
                None => None,
                Some(key) => {
                    let instance = match tx.step(&key) {
                        Some(s) => s.clone(),
                        None => self.steps.get(&key).await?,
                    };
                    if instance.status == StepStatus::Waiting {
                        Some(instance)
                    } else {
                        warn!(step_key = %key, status = instance.status.as_str(), "registered join instance is not waiting");
                        None
                    }
                }
            };

            let (mut instance, counter) = match waiting {
                Some(instance) => {
                    let stored = tx.process.step_join_counters.get(&name).copied().unwrap_or(initial);
                    (instance, stored - 1)
                }
                None => (new_instance(spec, &tx.process.instance_key), initial),
            };

            if let Some(pred) = fired_by {
                instance.predecessors_completed.insert(pred.to_string(), true);
            }

            if counter <= 0 {
                let ready = match &**spec {
                    StepSpec::Input(_) => StepStatus::Ready,
                    StepSpec::System(_) => StepStatus::ExecuteReady,
                };
                instance.advance(ready);
                tx.process.step_join_counters.remove(&name);
                tx.process.waiting_steps.remove(&name);
                tx.log(Some(&name), format!("step {} is {}", spec.spec_id(), ready.as_str()));
            } else {
                tx.process.step_join_counters.insert(name.clone(), counter);
                tx.process
                    .waiting_steps
                    .insert(name.clone(), instance.instance_key.clone());
                tx.log(Some(&name), format!("step {} waits for {counter} more predecessor(s)", spec.spec_id()));
            }

            debug!(
                process_key = %tx.process.instance_key,
                step = %name,
                step_key = %instance.instance_key,
                status = instance.status.as_str(),
                "step instance created or advanced"
            );
            tx.process.open_steps.insert(instance.instance_key.clone());
            tx.put(instance);
        }
        Ok(())
    }
}
