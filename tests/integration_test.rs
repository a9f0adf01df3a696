use land_record_scrape::services::dom_query;
use land_record_scrape::services::search;
use land_record_scrape::utils::logging;
use land_record_scrape::{App, Config, JsExecutor, SearchRange, Session};

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_session_start_stop() {
    // 初始化日志
    logging::init();

    // 启动并停止一次会话（验证回退启动和收尾路径）
    let session = Session::start(true).await.expect("启动浏览器会话失败");
    session.stop().await;
}

#[tokio::test]
#[ignore]
async fn test_search_submission() {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    let session = Session::start(config.headless).await.expect("启动浏览器会话失败");
    let executor = JsExecutor::new(session.page().clone());

    let range = SearchRange::new(&config.start_date, &config.end_date);
    let result = search::submit_with_retry(&executor, &config.portal_url, &range).await;

    assert!(result.is_ok(), "检索提交应该成功");

    // 提交成功后结果列表应已挂载
    let rows = dom_query::element_count(&executor, dom_query::SEL_RESULT_ROWS)
        .await
        .expect("统计结果行失败");
    println!("找到 {} 个结果行", rows);

    session.stop().await;
}

#[tokio::test]
#[ignore]
async fn test_full_run() {
    // 初始化日志
    logging::init();

    // 加载配置（注意：检索范围过大时运行时间会很长）
    let config = Config::from_env();

    // 完整运行：会话 → 检索 → 行循环 → 导出 → 收尾
    // 零结果时应以"未找到记录"终止且不创建导出文件
    let result = App::initialize(config).await.expect("初始化应用失败").run().await;

    assert!(result.is_ok(), "完整运行应该成功");
}
