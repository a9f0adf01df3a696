use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use land_record_scrape::models::record::{RecordEntry, RunOutcome};
use land_record_scrape::services::checkpoint;
use land_record_scrape::services::document_capture::sanitize_filename;
use land_record_scrape::services::dom_query::clean_items;
use land_record_scrape::services::record_export::{
    join_list, split_list, RecordExporter, EXPORT_HEADER,
};
use land_record_scrape::utils::retry_with_backoff;

// ========== 文件名清洗 ==========

#[test]
fn sanitize_replaces_invalid_characters() {
    assert_eq!(sanitize_filename("2024/001234"), "2024_001234");
    assert_eq!(sanitize_filename(r#"a\b:c*d?e"f<g>h|i"#), "a_b_c_d_e_f_g_h_i");
}

#[test]
fn sanitize_is_idempotent() {
    let once = sanitize_filename("DOC 2024/00:12*34");
    let twice = sanitize_filename(&once);
    assert_eq!(once, twice);
}

#[test]
fn sanitize_empty_identifier_uses_placeholder() {
    assert_eq!(sanitize_filename(""), "document");
    assert_eq!(sanitize_filename("   "), "document");
}

// ========== 断点日期推进 ==========

#[test]
fn advance_one_day_crosses_month_boundary() {
    assert_eq!(
        checkpoint::advance_one_day("06/30/2024").as_deref(),
        Some("07/01/2024")
    );
}

#[test]
fn advance_one_day_crosses_year_boundary() {
    assert_eq!(
        checkpoint::advance_one_day("12/31/2024").as_deref(),
        Some("01/01/2025")
    );
}

#[test]
fn advance_one_day_rejects_bad_date() {
    assert_eq!(checkpoint::advance_one_day("2024-06-30"), None);
    assert_eq!(checkpoint::advance_one_day("不是日期"), None);
}

#[tokio::test]
async fn checkpoint_resumes_from_next_day() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("checkpoint.json");
    std::fs::write(&path, r#"{"last_processed_date":"06/30/2024"}"#).expect("写入断点失败");

    let effective = checkpoint::effective_start_date(&path.to_string_lossy(), "01/01/2024").await;
    assert_eq!(effective, "07/01/2024");
}

#[tokio::test]
async fn missing_checkpoint_keeps_configured_start() {
    let effective =
        checkpoint::effective_start_date("does-not-exist/checkpoint.json", "01/01/2024").await;
    assert_eq!(effective, "01/01/2024");
}

#[tokio::test]
async fn unreadable_checkpoint_is_ignored() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("checkpoint.json");
    std::fs::write(&path, "这不是 JSON").expect("写入断点失败");

    let effective = checkpoint::effective_start_date(&path.to_string_lossy(), "01/01/2024").await;
    assert_eq!(effective, "01/01/2024");
}

// ========== 列表字段清洗 ==========

#[test]
fn clean_items_drops_blank_entries_and_trims() {
    let raw = vec![
        "  SMITH JOHN  ".to_string(),
        "".to_string(),
        "   ".to_string(),
        "\n\tSMITH JANE".to_string(),
    ];
    let cleaned = clean_items(raw);
    assert_eq!(cleaned, vec!["SMITH JOHN", "SMITH JANE"]);
    // 不变量：清洗后不存在空白条目
    assert!(cleaned.iter().all(|item| !item.trim().is_empty()));
}

#[test]
fn clean_items_preserves_order() {
    let raw = vec!["c".to_string(), " ".to_string(), "a".to_string(), "b".to_string()];
    assert_eq!(clean_items(raw), vec!["c", "a", "b"]);
}

// ========== 导出往返 ==========

#[test]
fn join_split_round_trip() {
    let items = vec!["LOT 4 BLK 2".to_string(), "LOT 5 BLK 2".to_string()];
    assert_eq!(split_list(&join_list(&items)), items);
    assert_eq!(split_list(""), Vec::<String>::new());
}

#[test]
fn export_round_trip_preserves_list_fields() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("export.txt");
    let path_text = path.to_string_lossy().to_string();

    let mut record = RecordEntry::with_document_no("2024-001234");
    record.recorded_date = "06/15/2024".to_string();
    record.document_type = "WARRANTY DEED".to_string();
    record.consideration = "$250,000.00".to_string();
    record.notes = "RE-RECORDED".to_string();
    record.party1 = vec!["SMITH JOHN".to_string(), "SMITH JANE".to_string()];
    record.party2 = vec!["COUNTY OF EXAMPLE".to_string()];
    record.associated_documents = vec!["2020-000111".to_string()];
    record.legals = vec!["LOT 4 BLK 2".to_string(), "SEC 14 TWP 3N RNG 2E".to_string()];
    record.pdf_location = "downloads/2024-001234.pdf".to_string();

    {
        let mut exporter = RecordExporter::create(&path_text).expect("创建导出文件失败");
        exporter.append(&record).expect("追加记录失败");
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .from_path(&path)
        .expect("打开导出文件失败");

    let headers = reader.headers().expect("读取表头失败").clone();
    assert_eq!(headers.len(), EXPORT_HEADER.len());
    assert_eq!(&headers[0], "document_no");

    let row = reader
        .records()
        .next()
        .expect("导出文件应有一行记录")
        .expect("解析记录失败");

    assert_eq!(&row[0], "2024-001234");
    assert_eq!(&row[1], "06/15/2024");
    // 列表字段往返：条目不含分隔符时逐项还原
    assert_eq!(split_list(&row[5]), record.party1);
    assert_eq!(split_list(&row[6]), record.party2);
    assert_eq!(split_list(&row[7]), record.associated_documents);
    assert_eq!(split_list(&row[8]), record.legals);
    assert_eq!(&row[9], "downloads/2024-001234.pdf");
}

#[test]
fn export_appends_one_line_per_record() {
    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("export.txt");
    let path_text = path.to_string_lossy().to_string();

    {
        let mut exporter = RecordExporter::create(&path_text).expect("创建导出文件失败");
        for i in 0..3 {
            let record = RecordEntry::with_document_no(format!("2024-{:06}", i));
            exporter.append(&record).expect("追加记录失败");
        }
    }

    let content = std::fs::read_to_string(&path).expect("读取导出文件失败");
    // 表头 + 3 条记录
    assert_eq!(content.lines().count(), 4);
}

// ========== 有界重试 ==========

#[tokio::test]
async fn retry_succeeds_on_third_attempt() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_in_op = Arc::clone(&calls);

    let result = retry_with_backoff(3, Duration::from_millis(10), "测试操作", move |attempt| {
        let calls = Arc::clone(&calls_in_op);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            if attempt < 3 {
                anyhow::bail!("第 {} 次注定失败", attempt);
            }
            Ok(attempt)
        }
    })
    .await;

    // 前两次失败、第三次成功时，整个操作成功且行循环得以继续
    assert_eq!(result.expect("第三次应当成功"), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn retry_exhaustion_returns_last_error() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_in_op = Arc::clone(&calls);

    let result: anyhow::Result<()> =
        retry_with_backoff(3, Duration::from_millis(10), "测试操作", move |_attempt| {
            let calls = Arc::clone(&calls_in_op);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(anyhow!("永远失败"))
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

// ========== 运行统计 ==========

#[test]
fn one_failing_row_leaves_remaining_rows_counted() {
    // 模拟 5 行中第 2 行提取抛错的行循环记账
    let row_results: Vec<anyhow::Result<()>> = vec![
        Ok(()),
        Err(anyhow!("模拟提取失败")),
        Ok(()),
        Ok(()),
        Ok(()),
    ];

    let mut outcome = RunOutcome::default();
    for result in &row_results {
        match result {
            Ok(()) => outcome.record_success(),
            Err(_) => outcome.record_failure(),
        }
    }

    assert_eq!(outcome.total_attempted, 5);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.succeeded, 4);
}
