use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use result_lookup::browser::Locator;
use result_lookup::config::{Config, FormUrls};
use result_lookup::error::SessionError;
use result_lookup::ingest::spreadsheet::read_spreadsheet;
use result_lookup::ingest::ColumnBindings;
use result_lookup::models::{FieldRole, LookupKind, ProgressEvent};
use result_lookup::orchestrator::{channel, BatchOrchestrator, BatchRequest};
use result_lookup::services::FileStore;
use result_lookup::testing::fixtures::{write_docx, write_xlsx};
use result_lookup::testing::{Scripted, ScriptedSessionFactory};
use result_lookup::ChromeSessionFactory;
use serde_json::Value;

const USER_ID_RESULT: Locator = Locator::Class("red12bold");
const EXAM_RESULT: Locator = Locator::Class("stones");
const PASS_RESULT: Locator = Locator::XPath("(//span[@class='red12bold'])[2]");

fn orchestrator(factory: &ScriptedSessionFactory, results: &Path) -> BatchOrchestrator {
    BatchOrchestrator::new(
        Arc::new(factory.clone()),
        FileStore::new(results),
        FormUrls::default(),
    )
}

/// 执行批次并收集全部事件
async fn run_batch(
    factory: &ScriptedSessionFactory,
    results: &Path,
    request: BatchRequest,
) -> Vec<ProgressEvent> {
    let (sender, mut receiver) = channel();
    let _ = orchestrator(factory, results).run(request, sender).await;

    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        events.push(event);
    }
    events
}

fn user_id_bindings() -> ColumnBindings {
    ColumnBindings::new()
        .with(FieldRole::Name, "Name")
        .with(FieldRole::Father, "Father")
        .with(FieldRole::Mobile, "Phone")
}

fn five_students(dir: &Path) -> std::path::PathBuf {
    write_xlsx(
        dir,
        "students.xlsx",
        &["Name", "Father", "Phone"],
        &[
            &["Ayesha", "Rahim", "1711111111"],
            &["Karim", "Salam", "01722222222"],
            &["Nadia", "Hasan", "1733333333"],
            &["Rafi", "Jamal", "1744444444"],
            &["Sumi", "Kabir", "1755555555"],
        ],
    )
}

#[tokio::test]
async fn test_failure_on_third_record_is_absorbed() {
    let dir = tempfile::tempdir().unwrap();
    let input = five_students(dir.path());
    let factory = ScriptedSessionFactory::new().respond(
        USER_ID_RESULT,
        [
            Scripted::text("MB24000001"),
            Scripted::text("Sorry, User ID not found!!"),
            Scripted::timeout(USER_ID_RESULT),
            Scripted::text("MB24000004"),
            Scripted::text("MB24000005"),
        ],
    );

    let events = run_batch(
        &factory,
        dir.path(),
        BatchRequest {
            kind: LookupKind::MbbsUserId,
            input,
            bindings: user_id_bindings(),
        },
    )
    .await;

    // start + 5 条记录 + 终止事件
    assert_eq!(events.len(), 7);
    assert_eq!(events[0], ProgressEvent::Started { total: 5 });
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);

    for (i, event) in events[1..6].iter().enumerate() {
        let value = serde_json::to_value(event).unwrap();
        assert_eq!(value["processed"], i + 1);
        assert_eq!(value["total"], 5);
        let sum = value["found"].as_u64().unwrap()
            + value["notFound"].as_u64().unwrap()
            + value["errorCount"].as_u64().unwrap();
        assert_eq!(sum, (i + 1) as u64);
    }

    let third = serde_json::to_value(&events[3]).unwrap();
    assert_eq!(third["Mobile Number"], "01733333333");
    assert!(third["MBBS User ID"].as_str().unwrap().starts_with("Failed: "));

    let handle = match &events[6] {
        ProgressEvent::Completed {
            download,
            file,
            processed,
            counters,
            ..
        } => {
            assert_eq!(*processed, 5);
            assert!(download.ends_with(file.as_str()));
            let counters = counters.unwrap();
            assert_eq!((counters.found, counters.not_found, counters.error_count), (3, 1, 1));
            file.clone()
        }
        other => panic!("unexpected terminal event: {:?}", other),
    };

    assert_eq!(factory.opened(), 1);
    assert_eq!(factory.closed(), 1);
    assert_eq!(factory.navigations(), 5);

    let table = read_spreadsheet(&dir.path().join(handle)).unwrap();
    let col = table.column_index("MBBS User ID").unwrap();
    assert_eq!(table.len(), 5);
    assert_eq!(table.cell(0, col), Some("MB24000001"));
    assert!(table.cell(2, col).unwrap().starts_with("Failed: "));
}

#[tokio::test]
async fn test_header_only_document_opens_no_session() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_docx(dir.path(), "roll.docx", &[&["MBBS_Roll"]]);
    let factory = ScriptedSessionFactory::new();

    let events = run_batch(
        &factory,
        dir.path(),
        BatchRequest {
            kind: LookupKind::MbbsResult,
            input,
            bindings: ColumnBindings::new(),
        },
    )
    .await;

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ProgressEvent::Failed { .. }));
    assert_eq!(factory.opened(), 0);
}

#[tokio::test]
async fn test_missing_column_opens_no_session() {
    let dir = tempfile::tempdir().unwrap();
    let input = five_students(dir.path());
    let factory = ScriptedSessionFactory::new();

    let events = run_batch(
        &factory,
        dir.path(),
        BatchRequest {
            kind: LookupKind::BdsUserId,
            input,
            bindings: ColumnBindings::new()
                .with(FieldRole::Name, "Name")
                .with(FieldRole::Mobile, "Phone"),
        },
    )
    .await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        ProgressEvent::Failed { error } => assert!(error.contains("father_col")),
        other => panic!("unexpected event: {:?}", other),
    }
    assert_eq!(factory.opened(), 0);
}

#[tokio::test]
async fn test_session_open_failure_is_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    let input = five_students(dir.path());
    let factory = ScriptedSessionFactory::new()
        .fail_open(SessionError::LaunchFailed("chrome not found".into()));

    let events = run_batch(
        &factory,
        dir.path(),
        BatchRequest {
            kind: LookupKind::MbbsUserId,
            input,
            bindings: user_id_bindings(),
        },
    )
    .await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0], ProgressEvent::Started { total: 5 });
    assert!(matches!(events[1], ProgressEvent::Failed { .. }));
    assert_eq!(factory.closed(), 0);
}

#[tokio::test]
async fn test_exam_results_are_renamed_by_position() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_docx(
        dir.path(),
        "rolls.docx",
        &[&["MBBS_Roll", "Remarks"], &["112233", "first"], &["445566", "second"]],
    );
    let factory = ScriptedSessionFactory::new().respond(
        EXAM_RESULT,
        [Scripted::texts(["112233", "AYESHA SIDDIKA", "72.5", "172.5", "15", "DMC", "Pass"])],
    );

    let events = run_batch(
        &factory,
        dir.path(),
        BatchRequest {
            kind: LookupKind::MbbsResult,
            input,
            bindings: ColumnBindings::new(),
        },
    )
    .await;

    assert_eq!(events.len(), 4);
    let first: Value = serde_json::to_value(&events[1]).unwrap();
    assert_eq!(first["MBBS_Roll"], "112233");
    assert_eq!(first["Result_2"], "AYESHA SIDDIKA");
    assert!(first.get("found").is_none());

    let second: Value = serde_json::to_value(&events[2]).unwrap();
    assert_eq!(second["Result_1"], "Result not found");

    let handle = match &events[3] {
        ProgressEvent::Completed { file, counters, .. } => {
            assert!(counters.is_none());
            file.clone()
        }
        other => panic!("unexpected terminal event: {:?}", other),
    };

    let table = read_spreadsheet(&dir.path().join(handle)).unwrap();
    let headers: Vec<&str> = table.headers().iter().map(String::as_str).collect();
    assert_eq!(
        headers,
        vec![
            "MBBS_Roll",
            "Remarks",
            "Roll No",
            "Student Name",
            "Test Score",
            "Merit Score",
            "Merit Position",
            "Allotted College Code",
            "Status"
        ]
    );
    assert_eq!(table.cell(0, 3), Some("AYESHA SIDDIKA"));
    assert_eq!(table.cell(1, 2), Some("Result not found"));
    assert_eq!(factory.closed(), 1);
}

#[tokio::test]
async fn test_pass_recover_reports_status() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_xlsx(
        dir.path(),
        "users.xlsx",
        &["USER_ID", "Mobile"],
        &[&["ABCD123456", "1711111111"], &["WXYZ654321", "1722222222"]],
    );
    let factory = ScriptedSessionFactory::new().respond(
        PASS_RESULT,
        [Scripted::text("  QWERTYUIOP "), Scripted::error("connection reset")],
    );

    let events = run_batch(
        &factory,
        dir.path(),
        BatchRequest {
            kind: LookupKind::BdsPassRecover,
            input,
            bindings: ColumnBindings::new()
                .with(FieldRole::UserId, "USER_ID")
                .with(FieldRole::Mobile, "Mobile"),
        },
    )
    .await;

    let first = serde_json::to_value(&events[1]).unwrap();
    assert_eq!(first["User ID"], "ABCD123456");
    assert_eq!(first["Result"], "QWERTYUIOP");
    assert_eq!(first["Status"], "found");

    let second = serde_json::to_value(&events[2]).unwrap();
    assert_eq!(second["Result"], "Sorry, User ID not found!!");
    assert_eq!(second["Status"], "error");
    assert_eq!(second["errorCount"], 1);
}

fn five_rolls(dir: &Path) -> std::path::PathBuf {
    write_xlsx(
        dir,
        "rolls.xlsx",
        &["MBBS_Roll"],
        &[&["100001"], &["100002"], &["100003"], &["100004"], &["100005"]],
    )
}

fn roll_request(input: std::path::PathBuf) -> BatchRequest {
    BatchRequest {
        kind: LookupKind::MbbsResult,
        input,
        bindings: ColumnBindings::new(),
    }
}

#[tokio::test]
async fn test_unread_subscriber_does_not_stall_batch() {
    let dir = tempfile::tempdir().unwrap();
    let input = five_rolls(dir.path());
    let factory = ScriptedSessionFactory::new();

    // 订阅者保持连接但从不读取
    let (sender, _receiver) = channel();
    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        orchestrator(&factory, dir.path()).run(roll_request(input), sender),
    )
    .await
    .expect("批次没有在订阅者不读取时完成")
    .unwrap();

    assert_eq!(summary.processed, 5);
    assert_eq!(factory.navigations(), 5);
    assert_eq!(factory.closed(), 1);
    assert!(dir.path().join(&summary.handle).is_file());
}

#[tokio::test]
async fn test_disconnected_subscriber_still_gets_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let input = five_rolls(dir.path());
    let factory = ScriptedSessionFactory::new();
    let orchestrator = orchestrator(&factory, dir.path());

    let (sender, mut receiver) = channel();
    let batch = tokio::spawn(async move { orchestrator.run(roll_request(input), sender).await });

    assert_eq!(receiver.recv().await, Some(ProgressEvent::Started { total: 5 }));
    drop(receiver);

    let summary = batch.await.unwrap().unwrap();
    assert_eq!(summary.processed, 5);
    assert!(summary.handle.starts_with("result_"));
    assert!(dir.path().join(&summary.handle).is_file());
    assert_eq!(factory.navigations(), 5);
    assert_eq!(factory.opened(), 1);
    assert_eq!(factory.closed(), 1);
}

#[tokio::test]
async fn test_duplicate_headers_keep_form_and_join_on_same_column() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_xlsx(
        dir.path(),
        "rolls.xlsx",
        &["Roll", "Roll"],
        &[&["112233", "x1"], &["445566", "x2"]],
    );
    let factory = ScriptedSessionFactory::new().respond(
        EXAM_RESULT,
        [
            Scripted::texts(["112233", "AYESHA SIDDIKA"]),
            Scripted::texts(["445566", "TANVIR AHMED"]),
        ],
    );

    let events = run_batch(
        &factory,
        dir.path(),
        BatchRequest {
            kind: LookupKind::MbbsResult,
            input,
            bindings: ColumnBindings::new().with(FieldRole::Roll, "Roll"),
        },
    )
    .await;

    assert_eq!(events.len(), 4);
    let first = serde_json::to_value(&events[1]).unwrap();
    assert_eq!(first["MBBS_Roll"], "112233");
    let second = serde_json::to_value(&events[2]).unwrap();
    assert_eq!(second["MBBS_Roll"], "445566");

    let handle = match &events[3] {
        ProgressEvent::Completed { file, .. } => file.clone(),
        other => panic!("unexpected terminal event: {:?}", other),
    };
    let table = read_spreadsheet(&dir.path().join(handle)).unwrap();
    assert_eq!(table.headers()[..2], ["Roll".to_string(), "Roll.1".to_string()]);
    let name = table.column_index("Student Name").unwrap();
    assert_eq!(table.cell(0, name), Some("AYESHA SIDDIKA"));
    assert_eq!(table.cell(1, name), Some("TANVIR AHMED"));
}

#[tokio::test]
async fn test_empty_roster_opens_no_session() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_xlsx(dir.path(), "empty.xlsx", &["Name", "Father", "Phone"], &[]);
    let factory = ScriptedSessionFactory::new();

    let events = run_batch(
        &factory,
        dir.path(),
        BatchRequest {
            kind: LookupKind::MbbsUserId,
            input,
            bindings: user_id_bindings(),
        },
    )
    .await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0], ProgressEvent::Started { total: 0 });
    match &events[1] {
        ProgressEvent::Completed { file, processed, .. } => {
            assert_eq!(*processed, 0);
            assert!(dir.path().join(file).is_file());
        }
        other => panic!("unexpected terminal event: {:?}", other),
    }
    assert_eq!(factory.opened(), 0);
}

#[tokio::test]
#[ignore] // 默认忽略，需要本机浏览器和网络：cargo test -- --ignored
async fn test_real_browser_roll_lookup() {
    result_lookup::utils::logging::init();

    let dir = tempfile::tempdir().unwrap();
    let config = Config::from_env();
    let input = write_xlsx(dir.path(), "roll.xlsx", &["MBBS_Roll"], &[&["112233"]]);

    let orchestrator = BatchOrchestrator::new(
        Arc::new(ChromeSessionFactory::new(&config)),
        FileStore::new(dir.path()),
        config.form_urls.clone(),
    );
    let (sender, mut receiver) = channel();
    let summary = orchestrator
        .run(
            BatchRequest {
                kind: LookupKind::MbbsResult,
                input,
                bindings: ColumnBindings::new(),
            },
            sender,
        )
        .await
        .expect("批次执行失败");

    assert_eq!(summary.processed, 1);
    while let Some(event) = receiver.recv().await {
        println!("{}", serde_json::to_string(&event).unwrap());
    }
}
