use anyhow::Result;
use fashion_etl::core::Pipeline;
use fashion_etl::{EtlEngine, EtlError, FashionPipeline, LocalStorage, TomlConfig};
use httpmock::prelude::*;
use rust_decimal::Decimal;
use std::path::Path;
use tempfile::TempDir;

fn card(title: &str, price: Option<&str>, details: &[&str]) -> String {
    let details: String = details.iter().map(|d| format!("<p>{}</p>", d)).collect();
    // 無價格的卡片在目錄上只顯示一段文字
    let price = match price {
        Some(price) => format!(r#"<div class="price-container"><span class="price">{}</span></div>"#, price),
        None => r#"<p class="price">Price Unavailable</p>"#.to_string(),
    };
    format!(
        r#"<div class="collection-card">
    <img src="/img.png" alt="{title}">
    <h3 class="product-title">{title}</h3>
    {price}
    <div class="product-details">{details}</div>
</div>"#
    )
}

fn page(cards: &[String], next: Option<&str>) -> String {
    let pagination = next
        .map(|href| {
            format!(
                r#"<ul class="pagination"><li class="page-item next"><a class="page-link" href="{}">Next</a></li></ul>"#,
                href
            )
        })
        .unwrap_or_default();
    format!(
        "<html><body><div class=\"collection-grid\">{}</div>{}</body></html>",
        cards.concat(),
        pagination
    )
}

fn config_for(server: &MockServer, output: &Path) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.source.base_url = server.base_url();
    config.source.delay_seconds = 0.0;
    config.load.output_path = output.to_string_lossy().to_string();
    config
}

#[tokio::test]
async fn test_end_to_end_two_page_catalog() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();

    let first = page(
        &[
            card(
                "T-shirt 1",
                Some("$10.00"),
                &["Rating: ⭐ 4.5 / 5", "3 Colors", "Size: M", "Gender: Men"],
            ),
            card(
                "Unknown Product",
                Some("$100.00"),
                &["Rating: ⭐ Invalid Rating / 5", "5 Colors", "Size: M", "Gender: Men"],
            ),
            card("Pants 3", None, &["Rating: Not Rated", "8 Colors", "Size: S", "Gender: Women"]),
        ],
        Some("/page2"),
    );
    let second = page(
        &[card(
            "Hoodie 4",
            Some("$25.99"),
            &["Rating: ⭐ 4.8 / 5", "1 Colors", "Size: XL", "Gender: Unisex"],
        )],
        None,
    );

    let page1_mock = server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).header("Content-Type", "text/html").body(&first);
    });
    let page2_mock = server.mock(|when, then| {
        when.method(GET).path("/page2");
        then.status(200).header("Content-Type", "text/html").body(&second);
    });

    let config = config_for(&server, temp_dir.path());
    let storage = LocalStorage::new(temp_dir.path());
    let engine = EtlEngine::new(FashionPipeline::from_config(storage, config)?);

    let report = engine.run().await?;

    page1_mock.assert();
    page2_mock.assert();
    assert_eq!(report.rows, 2);
    assert_eq!(report.sheets_ok, None);
    assert_eq!(report.rows_inserted, None);

    let raw = std::fs::read_to_string(temp_dir.path().join("scraped_fashion_products.csv"))?;
    assert_eq!(raw.lines().count(), 5);
    assert!(raw.contains("Unknown Price"));

    let clean = engine.pipeline().read_clean_dataset().await?;
    assert_eq!(clean.len(), 2);
    assert_eq!(clean.records[0].title, "T-shirt 1");
    assert_eq!(clean.records[0].price, Decimal::from(160_000));
    assert_eq!(clean.records[0].gender, "Men");
    assert_eq!(clean.records[1].title, "Hoodie 4");
    assert_eq!(clean.records[1].price, Decimal::from(415_840));
    assert_eq!(clean.records[1].rating, Decimal::new(48, 1));
    assert_eq!(clean.records[1].colors, 1);
    assert_eq!(clean.records[1].size, "XL");

    Ok(())
}

#[tokio::test]
async fn test_first_page_failure_yields_empty_run() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let page_mock = server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(503);
    });

    let config = config_for(&server, temp_dir.path());
    let pipeline = FashionPipeline::from_config(LocalStorage::new(temp_dir.path()), config)?;

    let records = pipeline.extract().await?;
    page_mock.assert_hits(1);
    assert!(records.is_empty());

    // 只有表頭的原始檔
    let raw = std::fs::read_to_string(temp_dir.path().join("scraped_fashion_products.csv"))?;
    assert_eq!(raw.trim(), "Title,Price,Rating,Colors,Size,Gender,Timestamp");

    let table = pipeline.read_raw_table().await?;
    let result = pipeline.transform(table).await;
    assert!(matches!(result, Err(EtlError::EmptyDataset { .. })));

    Ok(())
}

#[tokio::test]
async fn test_later_page_failure_keeps_earlier_records() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let first = page(
        &[card(
            "Jacket 1",
            Some("$50.00"),
            &["Rating: ⭐ 3.5 / 5", "2 Colors", "Size: L", "Gender: Women"],
        )],
        Some("/page2"),
    );
    server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).body(&first);
    });
    let page2_mock = server.mock(|when, then| {
        when.method(GET).path("/page2");
        then.status(500);
    });

    let config = config_for(&server, temp_dir.path());
    let pipeline = FashionPipeline::from_config(LocalStorage::new(temp_dir.path()), config)?;

    let records = pipeline.extract().await?;

    page2_mock.assert_hits(1);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Jacket 1");
    assert_eq!(records[0].price, "$50.00");

    Ok(())
}

#[tokio::test]
async fn test_transform_resumes_from_raw_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(
        temp_dir.path().join("scraped_fashion_products.csv"),
        "Title,Price,Rating,Colors,Size,Gender,Timestamp\n\
         T-shirt 2,$102.15,Rating: ⭐ 3.9 / 5,3 Colors,Size: M,Gender: Women,2024-05-01T10:00:00.000001\n\
         T-shirt 2,$102.15,Rating: ⭐ 3.9 / 5,3 Colors,Size: M,Gender: Women,2024-05-01T10:00:00.000001\n\
         Hoodie 3,$496.88,N/A,8 Colors,Size: L,Gender: Unisex,2024-05-01T10:00:00.000002\n\
         Pants 4,\"$1,024.50\",Rating: ⭐ 4.1 / 5,5 Colors,Size: S,Gender: Men,2024-05-01T10:00:00.000003\n",
    )?;

    let mut config = TomlConfig::default();
    config.load.output_path = temp_dir.path().to_string_lossy().to_string();
    let pipeline = FashionPipeline::from_config(LocalStorage::new(temp_dir.path()), config)?;

    let table = pipeline.read_raw_table().await?;
    let dataset = pipeline.transform(table).await?;

    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.records[0].price, Decimal::new(163_440_000, 2));
    assert_eq!(dataset.records[1].title, "Pants 4");
    assert_eq!(dataset.records[1].price, Decimal::from(16_392_000));

    let clean = std::fs::read_to_string(temp_dir.path().join("cleaned_fashion_products.csv"))?;
    assert!(clean.starts_with("Title,Price,Rating,Colors,Size,Gender,Timestamp"));
    assert_eq!(clean.lines().count(), 3);

    Ok(())
}

#[tokio::test]
async fn test_load_sends_clean_file_to_spreadsheet() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let token_path = temp_dir.path().join("sheets-token");
    std::fs::write(&token_path, "integration-token\n")?;
    std::fs::write(
        temp_dir.path().join("cleaned_fashion_products.csv"),
        "Title,Price,Rating,Colors,Size,Gender,Timestamp\n\
         T-shirt 2,1634400.00,3.9,3,M,Women,2024-05-01T10:00:00\n",
    )?;

    let sheets_mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/v4/spreadsheets/sheet-42/values/Sheet1!A1")
            .query_param("valueInputOption", "RAW")
            .header("authorization", "Bearer integration-token")
            .body_contains("\"T-shirt 2\"");
        then.status(200).json_body(serde_json::json!({"updatedRows": 2}));
    });

    let mut config = config_for(&server, temp_dir.path());
    config.sheets.spreadsheet_id = Some("sheet-42".to_string());
    config.sheets.endpoint = server.base_url();
    config.sheets.credentials_file = Some(token_path);
    let pipeline = FashionPipeline::from_config(LocalStorage::new(temp_dir.path()), config)?;

    let dataset = pipeline.read_clean_dataset().await?;
    let report = pipeline.load(dataset).await?;

    sheets_mock.assert();
    assert_eq!(report.rows, 1);
    assert_eq!(report.sheets_ok, Some(true));
    assert_eq!(report.rows_inserted, None);

    Ok(())
}
