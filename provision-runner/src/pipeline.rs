//! Pipeline driver
//!
//! Runs stages strictly in order, one at a time. The first failing stage
//! ends the run with that stage's exit status; earlier stages' side
//! effects stay in place. There are no retries and no rollback.

use provision_core::domain::run::{RunReport, RunResult};
use provision_core::domain::stage::StageId;
use tracing::{debug, info};
use uuid::Uuid;

use crate::context::StageContext;
use crate::stages::{Stage, stage_for};

/// The ordered provisioning pipeline
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Creates a pipeline from explicit stages
    ///
    /// Stages are sorted by ordinal so execution order never depends on
    /// the order they were supplied in.
    pub fn new(mut stages: Vec<Box<dyn Stage>>) -> Self {
        stages.sort_by_key(|stage| stage.id().ordinal());
        Self { stages }
    }

    /// The standard seven-stage pipeline
    pub fn standard() -> Self {
        Self::new(StageId::ALL.into_iter().map(stage_for).collect())
    }

    /// Stage identities in execution order
    pub fn stage_ids(&self) -> Vec<StageId> {
        self.stages.iter().map(|stage| stage.id()).collect()
    }

    /// Runs every stage
    pub fn run(&self, ctx: &StageContext<'_>) -> RunReport {
        self.execute(ctx, |_| true, "Provisioning")
    }

    /// Runs `from` and every stage after it
    pub fn run_from(&self, from: StageId, ctx: &StageContext<'_>) -> RunReport {
        self.execute(
            ctx,
            |id| id.ordinal() >= from.ordinal(),
            &format!("Provisioning from {}", from),
        )
    }

    /// Runs a single stage
    pub fn run_only(&self, only: StageId, ctx: &StageContext<'_>) -> RunReport {
        self.execute(ctx, |id| id == only, &only.to_string())
    }

    fn execute<F>(&self, ctx: &StageContext<'_>, selected: F, label: &str) -> RunReport
    where
        F: Fn(StageId) -> bool,
    {
        let run_id = Uuid::new_v4();
        let started_at = chrono::Utc::now();
        let stages: Vec<&dyn Stage> = self
            .stages
            .iter()
            .map(|stage| stage.as_ref())
            .filter(|stage| selected(stage.id()))
            .collect();

        info!("Starting run {} ({} stage(s))", run_id, stages.len());

        let mut completed = Vec::with_capacity(stages.len());

        for stage in &stages {
            let id = stage.id();
            info!(
                "Executing stage {}/{}: {}",
                id.ordinal(),
                StageId::ALL.len(),
                id.name()
            );

            if let Err(err) = stage.run(ctx) {
                // The reporter line below is the operator-facing diagnostic
                debug!(
                    "Run {} aborted at {}: {} (exit status {})",
                    run_id,
                    id,
                    err,
                    err.exit_code()
                );
                ctx.reporter.emit(err.severity(), Some(id), err.to_string());

                return RunReport {
                    run_id,
                    started_at,
                    finished_at: chrono::Utc::now(),
                    completed,
                    result: RunResult::Failed { stage: id, error: err },
                };
            }

            completed.push(id);
        }

        let finished_at = chrono::Utc::now();
        let elapsed = (finished_at - started_at).num_seconds();
        ctx.reporter.success(
            None,
            format!(
                "{} completed: {} stage(s) in {}s",
                label,
                completed.len(),
                elapsed
            ),
        );
        info!("Run {} completed", run_id);

        RunReport {
            run_id,
            started_at,
            finished_at,
            completed,
            result: RunResult::Success,
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{mode_of, parse};
    use crate::testing::TestEnv;
    use provision_core::StageError;
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    /// Tracing output captured in memory
    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl CapturedLog {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLog {
        type Writer = CapturedLog;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Fully prepared environment: every precondition of every stage holds
    fn ready_env() -> TestEnv {
        let env = TestEnv::new();
        std::fs::create_dir_all(&env.params.service_account.home).unwrap();
        env.with_media_package();
        env.with_creation_tool();
        env.with_writer();
        env
    }

    struct Probe {
        id: StageId,
        calls: Rc<Cell<u32>>,
        fail_with: Option<fn() -> StageError>,
    }

    impl Stage for Probe {
        fn id(&self) -> StageId {
            self.id
        }

        fn run(&self, _ctx: &StageContext<'_>) -> Result<(), StageError> {
            self.calls.set(self.calls.get() + 1);
            match self.fail_with {
                Some(make) => Err(make()),
                None => Ok(()),
            }
        }
    }

    fn empty_sid() -> StageError {
        StageError::invalid("sid", "must not be empty")
    }

    #[test]
    fn test_full_run_succeeds() {
        let env = ready_env();
        let report = Pipeline::standard().run(&env.context());

        assert!(report.result.is_success());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.completed, StageId::ALL.to_vec());

        let values: HashMap<String, String> =
            parse(&std::fs::read_to_string(env.config.env_file_path()).unwrap())
                .into_iter()
                .collect();
        assert_eq!(values["ORACLE_SID"], "ORCLCDB");
        assert_eq!(values["ORACLE_SERVICE_NAME"], "ORCLPDB1");
        assert_eq!(values["ORACLE_PASSWORD"], "Tone_Row_12");
        assert_eq!(mode_of(&env.config.env_file_path()).unwrap(), 0o600);

        let last = env.stdout().last().unwrap().clone();
        assert!(last.starts_with("[SUCCESS] Provisioning completed: 7 stage(s)"));
    }

    #[test]
    fn test_missing_package_stops_before_instance_creation() {
        let env = ready_env();
        let package = env.config.engine_package_path();
        std::fs::remove_file(&package).unwrap();

        let report = Pipeline::standard().run(&env.context());

        assert_eq!(report.result.failed_stage(), Some(StageId::EnginePackage));
        assert_eq!(report.exit_code(), 1);
        assert_eq!(
            report.completed,
            vec![
                StageId::Prerequisites,
                StageId::GuestAdditions,
                StageId::ServiceAccount
            ]
        );

        let errors = env.stderr();
        let last = errors.last().unwrap();
        assert!(last.starts_with("[ERROR] stage 4 (engine-package): "));
        assert!(last.contains(&package.display().to_string()));

        assert!(
            env.runner
                .calls()
                .iter()
                .all(|spec| !spec.args.iter().any(|a| a == "-createDatabase"))
        );
        assert!(!env.config.env_file_path().exists());
        assert!(!env.runner.invoked("python"));
    }

    #[test]
    fn test_prerequisite_failure_exits_with_package_status() {
        let env = ready_env();
        env.runner
            .fail_when("dnf", "oracle-database-preinstall-19c", 1);

        let report = Pipeline::standard().run(&env.context());

        assert_eq!(report.exit_code(), 2);
        assert!(report.completed.is_empty());
        assert_eq!(env.runner.calls().len(), 1);
        assert!(
            env.stderr()
                .last()
                .unwrap()
                .starts_with("[PACKAGE_ERROR] stage 1 (prerequisites): ")
        );
    }

    #[test]
    fn test_missing_manifest_does_not_abort() {
        let env = ready_env();
        assert!(!env.config.manifest_path().exists());

        let report = Pipeline::standard().run(&env.context());

        assert!(report.result.is_success());
        assert!(
            env.stderr()
                .iter()
                .any(|line| line.starts_with("[WARNING] stage 5 (runtime-dependencies):"))
        );
        assert!(report.completed.contains(&StageId::InstanceCreation));
    }

    #[test]
    fn test_writer_status_becomes_run_status() {
        let env = ready_env();
        env.runner.fail_when("python", "main.py", 5);

        let report = Pipeline::standard().run(&env.context());

        assert_eq!(report.exit_code(), 5);
        assert_eq!(report.result.failed_stage(), Some(StageId::Handoff));
        assert_eq!(
            env.stderr().last().unwrap(),
            "[ERROR] stage 7 (handoff): writer exited with status 5"
        );
    }

    #[test]
    fn test_run_from_skips_earlier_stages() {
        let env = ready_env();
        let report = Pipeline::standard().run_from(StageId::InstanceCreation, &env.context());

        assert!(report.result.is_success());
        assert_eq!(
            report.completed,
            vec![StageId::InstanceCreation, StageId::Handoff]
        );
        assert!(!env.runner.invoked("dnf"));
    }

    #[test]
    fn test_run_only_single_stage() {
        let env = ready_env();
        let report = Pipeline::standard().run_only(StageId::EnginePackage, &env.context());

        assert!(report.result.is_success());
        assert_eq!(report.completed, vec![StageId::EnginePackage]);
        assert_eq!(env.runner.calls().len(), 1);
    }

    #[test]
    fn test_stops_at_first_failure_without_running_later_stages() {
        let env = TestEnv::new();
        let counters: Vec<Rc<Cell<u32>>> = (0..3).map(|_| Rc::new(Cell::new(0))).collect();

        // Supplied out of order on purpose
        let pipeline = Pipeline::new(vec![
            Box::new(Probe {
                id: StageId::Handoff,
                calls: counters[2].clone(),
                fail_with: None,
            }),
            Box::new(Probe {
                id: StageId::Prerequisites,
                calls: counters[0].clone(),
                fail_with: None,
            }),
            Box::new(Probe {
                id: StageId::EnginePackage,
                calls: counters[1].clone(),
                fail_with: Some(empty_sid),
            }),
        ]);

        assert_eq!(
            pipeline.stage_ids(),
            vec![StageId::Prerequisites, StageId::EnginePackage, StageId::Handoff]
        );

        let report = pipeline.run(&env.context());

        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.completed, vec![StageId::Prerequisites]);
        assert_eq!(counters[0].get(), 1);
        assert_eq!(counters[1].get(), 1);
        assert_eq!(counters[2].get(), 0);
        assert!(env.stdout().iter().all(|line| !line.starts_with("[SUCCESS]")));
    }

    #[test]
    fn test_failed_run_writes_a_single_stderr_line() {
        let env = ready_env();
        std::fs::remove_dir_all(&env.config.media_dir).unwrap();
        let log = CapturedLog::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(log.clone())
            .finish();

        let report = tracing::subscriber::with_default(subscriber, || {
            Pipeline::standard().run_only(StageId::EnginePackage, &env.context())
        });

        assert_eq!(report.exit_code(), 1);
        assert_eq!(
            env.stderr(),
            vec![format!(
                "[ERROR] stage 4 (engine-package): directory not found: {}",
                env.config.media_dir.display()
            )]
        );
        assert_eq!(log.contents(), "");
    }
}
