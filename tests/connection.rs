mod common;

use std::collections::HashMap;

use sea_orm::{ConnectionTrait, DbErr, Transaction, Value};
use tokio_util::sync::CancellationToken;
use traced_sea_orm::prelude::*;
use traced_sea_orm::{DependencyRecord, NoopTracer};

use common::*;

#[tokio::test]
async fn fetch_one_success_reports_once_without_fields() {
    let (conn, tracer) = traced(postgres().append_query_results([vec![user_row(1, "ada")]]));
    let ctx = QueryContext::background();

    let user: User = conn
        .fetch_one(&ctx, pg_with("SELECT id, name FROM users WHERE id = $1", [1i32.into()]))
        .await
        .unwrap();

    assert_eq!(user, User { id: 1, name: "ada".into() });

    let records = tracer.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert!(record.success);
    assert_eq!(record.fields, None);
    assert_eq!(record.command_name, "FetchOne");
    assert_eq!(record.dependency_type, "postgres");
    assert_eq!(record.service_name, SERVICE);
    assert_eq!(record.span_id, "");
    assert!(record.end >= record.start);
}

#[tokio::test]
async fn fetch_one_without_rows_reports_not_found() {
    let (conn, tracer) = traced(postgres().append_query_results([no_rows()]));
    let ctx = QueryContext::background();
    let sql = "SELECT id, name FROM users WHERE id = 404";

    let err = conn.fetch_one::<User>(&ctx, pg(sql)).await.unwrap_err();
    assert!(matches!(err, DbErr::RecordNotFound(_)));

    let records = tracer.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert!(!record.success);
    assert_eq!(
        record.fields,
        Some(HashMap::from([
            ("error".to_string(), err.to_string()),
            ("query".to_string(), sql.to_string()),
        ]))
    );
}

#[tokio::test]
async fn fetch_many_reports_success_and_failure() {
    let (conn, tracer) = traced(
        postgres()
            .append_query_results([vec![user_row(1, "ada"), user_row(2, "grace")]])
            .append_query_errors([DbErr::Custom("relation \"userz\" does not exist".into())]),
    );
    let ctx = QueryContext::background();

    let users: Vec<User> = conn.fetch_many(&ctx, pg("SELECT * FROM users")).await.unwrap();
    assert_eq!(users.len(), 2);

    let err = conn
        .fetch_many::<User>(&ctx, pg("SELECT * FROM userz"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        DbErr::Custom("relation \"userz\" does not exist".into()).to_string()
    );

    let records = tracer.records();
    assert_eq!(records.len(), 2);
    assert!(records[0].success);
    assert_eq!(records[0].command_name, "FetchMany");
    assert!(!records[1].success);
    assert_eq!(records[1].command_name, "FetchMany");
    assert_eq!(records[1].field("error"), Some(err.to_string().as_str()));
    assert_eq!(records[1].field("query"), Some("SELECT * FROM userz"));
}

#[tokio::test]
async fn execute_insert_reports_execute_label() {
    let (conn, tracer) = traced(postgres().append_exec_results([exec_result(15, 1)]));
    let ctx = QueryContext::background();

    let result = conn
        .execute(
            &ctx,
            pg_with("INSERT INTO users (name) VALUES ($1)", ["ada".into()]),
        )
        .await
        .unwrap();
    assert_eq!(result.rows_affected(), 1);
    assert_eq!(result.last_insert_id(), 15);

    let records = tracer.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].success);
    assert_eq!(records[0].fields, None);
    assert_eq!(records[0].command_name, "Execute");
}

#[tokio::test]
async fn results_match_the_untraced_driver() {
    let mock = || {
        postgres()
            .append_exec_results([exec_result(7, 3)])
            .append_exec_errors([DbErr::Custom("deadlock detected".into())])
    };
    let (conn, _tracer) = traced(mock());
    let raw = mock().into_connection();
    let ctx = QueryContext::background();
    let stmt = || pg("UPDATE users SET active = false");

    let traced_ok = conn.execute(&ctx, stmt()).await.unwrap();
    let raw_ok = raw.execute(stmt()).await.unwrap();
    assert_eq!(traced_ok.rows_affected(), raw_ok.rows_affected());
    assert_eq!(traced_ok.last_insert_id(), raw_ok.last_insert_id());

    let traced_err = conn.execute(&ctx, stmt()).await.unwrap_err();
    let raw_err = raw.execute(stmt()).await.unwrap_err();
    assert_eq!(format!("{traced_err:?}"), format!("{raw_err:?}"));

    // The statement reaching the database is the one the caller built.
    assert_eq!(
        conn.into_inner().into_transaction_log(),
        raw.into_transaction_log()
    );
}

#[tokio::test]
async fn named_execute_binds_and_reports_named_sql() {
    let (conn, tracer) = traced(postgres().append_exec_results([exec_result(3, 1)]));
    let ctx = QueryContext::background();
    let sql = "INSERT INTO users (id, name) VALUES (:id, :name)";
    let args = HashMap::from([
        ("id".to_string(), Value::from(3i32)),
        ("name".to_string(), Value::from("lin")),
    ]);

    let result = conn.named_execute(&ctx, sql, &args).await.unwrap();
    assert_eq!(result.rows_affected(), 1);

    let records = tracer.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].success);
    assert_eq!(records[0].command_name, "NamedExecute");

    assert_eq!(
        conn.into_inner().into_transaction_log(),
        vec![Transaction::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "INSERT INTO users (id, name) VALUES ($1, $2)",
            [Value::from(3i32), Value::from("lin")],
        )]
    );
}

#[tokio::test]
async fn named_execute_missing_argument_is_reported_once() {
    let (conn, tracer) = traced(postgres());
    let ctx = QueryContext::background();
    let sql = "DELETE FROM users WHERE id = :id";

    let err = conn
        .named_execute(&ctx, sql, &[("name", Value::from("ada"))])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("could not find name id"));

    let records = tracer.records();
    assert_eq!(records.len(), 1);
    assert!(!records[0].success);
    assert_eq!(records[0].field("query"), Some(sql));
    assert!(conn.into_inner().into_transaction_log().is_empty());
}

#[tokio::test]
async fn legacy_command_names_report_get() {
    let (conn, tracer) = traced_with(
        postgres()
            .append_query_results([vec![user_row(1, "ada")], vec![user_row(1, "ada")]])
            .append_exec_results([exec_result(0, 1), exec_result(0, 1)]),
        TracingConfig::new(SERVICE).with_legacy_command_names(true),
    );
    let ctx = QueryContext::background();

    conn.fetch_one::<User>(&ctx, pg("SELECT * FROM users")).await.unwrap();
    conn.fetch_many::<User>(&ctx, pg("SELECT * FROM users")).await.unwrap();
    conn.execute(&ctx, pg("DELETE FROM users")).await.unwrap();
    conn.named_execute(&ctx, "DELETE FROM users WHERE id = :id", &[("id", Value::from(1i32))])
        .await
        .unwrap();

    let names: Vec<_> = tracer.records().iter().map(|r| r.command_name).collect();
    assert_eq!(names, ["Get", "Get", "Get", "Get"]);
}

#[tokio::test]
async fn cancelled_context_is_reported_as_failure() {
    let (conn, tracer) = traced(postgres().append_exec_results([exec_result(0, 1)]));
    let token = CancellationToken::new();
    token.cancel();
    let ctx = QueryContext::with_cancellation(token);

    let err = conn
        .execute(&ctx, pg("DELETE FROM users"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        DbErr::Custom("context canceled".into()).to_string()
    );

    let records = tracer.records();
    assert_eq!(records.len(), 1);
    assert!(!records[0].success);
    assert_eq!(records[0].field("error"), Some(err.to_string().as_str()));
}

#[tokio::test]
async fn tracer_sees_the_callers_context() {
    struct TokenCheck(CancellationToken);

    impl Tracer for TokenCheck {
        fn trace_dependency(&self, ctx: &QueryContext, _record: DependencyRecord) {
            assert!(ctx.token().is_some_and(|t| !t.is_cancelled()));
            self.0.cancel();
        }
    }

    let seen = CancellationToken::new();
    let conn = TracedConnection::new(
        postgres().append_exec_results([exec_result(0, 0)]).into_connection(),
        TokenCheck(seen.clone()),
        SERVICE,
    );
    let ctx = QueryContext::with_cancellation(CancellationToken::new());

    conn.execute(&ctx, pg("SELECT 1")).await.unwrap();
    assert!(seen.is_cancelled());
}

#[tokio::test]
async fn log_and_noop_tracers_do_not_change_results() {
    let ctx = QueryContext::background();

    let logged = TracedConnection::new(
        postgres().append_query_results([vec![user_row(9, "kay")]]).into_connection(),
        LogTracer,
        SERVICE,
    );
    let user: User = logged.fetch_one(&ctx, pg("SELECT * FROM users")).await.unwrap();
    assert_eq!(user.id, 9);

    let silent = TracedConnection::new(
        postgres().append_query_results([no_rows()]).into_connection(),
        NoopTracer,
        SERVICE,
    );
    assert!(silent.fetch_one::<User>(&ctx, pg("SELECT * FROM users")).await.is_err());
}

#[tokio::test]
async fn shared_connection_reports_every_task() {
    let (conn, tracer) = traced(
        postgres().append_exec_results([exec_result(0, 1), exec_result(0, 1)]),
    );
    let conn = std::sync::Arc::new(conn);

    let tasks: Vec<_> = ["DELETE FROM a", "DELETE FROM b"]
        .into_iter()
        .map(|sql| {
            let conn = conn.clone();
            tokio::spawn(async move {
                let ctx = QueryContext::background();
                conn.execute(&ctx, pg(sql)).await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(tracer.len(), 2);
}

#[tokio::test]
async fn disconnected_handle_returns_driver_errors() {
    let tracer = std::sync::Arc::new(traced_sea_orm::RecordingTracer::new());
    let conn = TracedConnection::new(
        sea_orm::DatabaseConnection::Disconnected,
        tracer.clone(),
        SERVICE,
    );
    let raw = sea_orm::DatabaseConnection::Disconnected;
    let ctx = QueryContext::background();

    let err = conn
        .execute(&ctx, pg("DELETE FROM users"))
        .await
        .unwrap_err();
    let raw_err = raw.execute(pg("DELETE FROM users")).await.unwrap_err();
    assert_eq!(format!("{err:?}"), format!("{raw_err:?}"));

    let records = tracer.records();
    assert_eq!(records.len(), 1);
    assert!(!records[0].success);
    assert_eq!(records[0].dependency_type, "disconnected");
    assert_eq!(records[0].field("query"), Some("DELETE FROM users"));
}
