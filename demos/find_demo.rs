//! Read shots from a live server
//!
//! Needs `SG_SERVER_URL`, `SG_SCRIPT_NAME` and `SG_API_KEY`; run with
//! `RUST_LOG=debug` to see every RPC call.

use shotgun_api::api::{OrderBy, SummaryField};
use shotgun_api::{Config, Filter, FindRequest, Shotgun, SummaryRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut sg = Shotgun::with_http_transport(Config::from_env()?)?;
    let caps = sg.load_server_caps().await?;
    println!("Connected to {} running {}", caps.host, caps.version);

    let request = FindRequest::new("Shot")
        .filter(Filter::is("sg_status_list", "ip"))
        .filter(Filter::starts_with("code", "sh0"))
        .fields(&["code", "sg_status_list", "created_at"])
        .order(OrderBy::desc("created_at"))
        .limit(10);

    for shot in sg.find(&request).await? {
        println!(
            "{:>6}  {}",
            shot.id().unwrap_or_default(),
            shot.get("code").and_then(|code| code.as_str()).unwrap_or("-")
        );
    }

    let summary = sg
        .summarize(&SummaryRequest::new("Shot", vec![], vec![SummaryField::count("id")]))
        .await?;
    println!("Total shots: {:?}", summary.summary("id"));

    Ok(())
}
