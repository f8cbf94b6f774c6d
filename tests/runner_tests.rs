//! Runner sequencing tests
//!
//! These tests drive the script runner against a scripted executor to
//! verify its execution contract:
//! - Statements run strictly in source order, one execute call each
//! - The first failure stops the run; later statements never execute
//! - Atomic mode brackets the script in BEGIN/COMMIT or BEGIN/ROLLBACK
//! - A statement exceeding the timeout is recorded as that statement's
//!   failure

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use freightdb::runner::{RunnerOptions, ScriptRunner};
    use freightdb::script::Script;
    use freightdb::test_utils::ScriptedExecutor;

    fn runner() -> ScriptRunner {
        ScriptRunner::new(RunnerOptions::default())
    }

    #[tokio::test]
    async fn all_statements_execute_in_source_order() {
        let mut executor = ScriptedExecutor::new();
        let script = Script::from_source("schema.sql", "SELECT 1; SELECT 2; SELECT 3;");

        let report = runner().run_script(&mut executor, &script).await.unwrap();

        assert_eq!(executor.calls, vec!["SELECT 1", "SELECT 2", "SELECT 3"]);
        assert!(report.is_success());
        assert_eq!(report.total_statements, 3);
        assert_eq!(report.succeeded, 3);
        assert!(report.failed.is_none());
    }

    #[tokio::test]
    async fn two_create_statements_both_apply() {
        let mut executor = ScriptedExecutor::new();
        let script =
            Script::from_source("schema.sql", "CREATE TABLE a(id int); CREATE TABLE b(id int);");

        let report = runner().run_script(&mut executor, &script).await.unwrap();

        assert_eq!(report.total_statements, 2);
        assert_eq!(report.succeeded, 2);
        assert!(report.failed.is_none());
    }

    #[tokio::test]
    async fn first_failure_stops_the_run() {
        let mut executor =
            ScriptedExecutor::new().fail_on("nosuchtable", "relation \"nosuchtable\" does not exist");
        let script = Script::from_source(
            "schema.sql",
            "CREATE TABLE a(id int); INSERT INTO nosuchtable VALUES (1); CREATE TABLE c(id int);",
        );

        let report = runner().run_script(&mut executor, &script).await.unwrap();

        // Statement 3 never reaches the database.
        assert_eq!(executor.calls.len(), 2);
        assert!(executor.calls[1].contains("nosuchtable"));

        assert_eq!(report.succeeded, 1);
        let failure = report.failed.expect("run should have failed");
        assert_eq!(failure.index, 1);
        assert!(failure.message.contains("does not exist"));
        assert!(failure.excerpt.contains("nosuchtable"));
    }

    #[tokio::test]
    async fn failure_on_first_statement_applies_nothing() {
        let mut executor = ScriptedExecutor::new().fail_on("SELECT 1", "boom");
        let script = Script::from_source("schema.sql", "SELECT 1; SELECT 2;");

        let report = runner().run_script(&mut executor, &script).await.unwrap();

        assert_eq!(executor.calls.len(), 1);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed.unwrap().index, 0);
    }

    #[tokio::test]
    async fn empty_script_produces_an_empty_successful_report() {
        let mut executor = ScriptedExecutor::new();
        let script = Script::from_source("schema.sql", "-- nothing here\n");

        let report = runner().run_script(&mut executor, &script).await.unwrap();

        assert!(executor.calls.is_empty());
        assert_eq!(report.total_statements, 0);
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn atomic_run_commits_on_success() {
        let mut executor = ScriptedExecutor::new();
        let script = Script::from_source("schema.sql", "SELECT 1; SELECT 2;");
        let runner = ScriptRunner::new(RunnerOptions {
            atomic: true,
            ..RunnerOptions::default()
        });

        let report = runner.run_script(&mut executor, &script).await.unwrap();

        assert_eq!(
            executor.calls,
            vec!["BEGIN", "SELECT 1", "SELECT 2", "COMMIT"]
        );
        // Transaction bracketing is not counted as script statements.
        assert_eq!(report.total_statements, 2);
        assert_eq!(report.succeeded, 2);
    }

    #[tokio::test]
    async fn atomic_run_rolls_back_on_failure() {
        let mut executor = ScriptedExecutor::new().fail_on("SELECT 2", "boom");
        let script = Script::from_source("schema.sql", "SELECT 1; SELECT 2; SELECT 3;");
        let runner = ScriptRunner::new(RunnerOptions {
            atomic: true,
            ..RunnerOptions::default()
        });

        let report = runner.run_script(&mut executor, &script).await.unwrap();

        assert_eq!(
            executor.calls,
            vec!["BEGIN", "SELECT 1", "SELECT 2", "ROLLBACK"]
        );
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed.unwrap().index, 1);
    }

    #[tokio::test]
    async fn slow_statement_times_out_and_fails_the_run() {
        let mut executor =
            ScriptedExecutor::new().delay_on("SELECT 2", Duration::from_millis(200));
        let script = Script::from_source("schema.sql", "SELECT 1; SELECT 2; SELECT 3;");
        let runner = ScriptRunner::new(RunnerOptions {
            statement_timeout: Duration::from_millis(10),
            atomic: false,
        });

        let report = runner.run_script(&mut executor, &script).await.unwrap();

        // The timed-out statement was sent, the one after it was not.
        assert_eq!(executor.calls.len(), 2);
        assert_eq!(report.succeeded, 1);
        let failure = report.failed.expect("run should have failed");
        assert_eq!(failure.index, 1);
        assert!(failure.message.contains("timed out"));
    }

    #[tokio::test]
    async fn long_statement_excerpt_is_truncated() {
        let wide_table = format!("CREATE TABLE t({})", "x int, ".repeat(40) + "y int");
        let mut executor = ScriptedExecutor::new().fail_on("CREATE TABLE t", "boom");
        let script = Script::from_source("schema.sql", &format!("{};", wide_table));

        let report = runner().run_script(&mut executor, &script).await.unwrap();

        let failure = report.failed.unwrap();
        assert_eq!(failure.excerpt.chars().count(), 100);
    }
}
