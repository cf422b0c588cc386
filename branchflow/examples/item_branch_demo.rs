//! Demo routing words to per-length flows and merging the groups back

use branchflow::logger::{log_run_summary, try_init_tracing};
use branchflow::prelude::*;
use serde_json::{json, Value};

async fn tag(mut item: Value, kind: &'static str) -> anyhow::Result<Value> {
    item["type"] = json!(kind);
    Ok(item)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    try_init_tracing()?;

    println!("🚀 BranchFlow Item Branch Demo");
    println!("==============================");

    let too_long = Flow::<Vec<Value>>::new("tooLongBranch")
        .add_map(|item: Value| tag(item, "tooLong"))
        .handle();
    let too_short = Flow::<Vec<Value>>::new("tooShortBranch")
        .add_map(|item: Value| tag(item, "tooShort"))
        .handle();

    let flow = Flow::new("words")
        .add_named_stage("load", |mut words: Vec<Value>| async move {
            words.extend(["pippo", "paperina", "pluto", "paperino"].map(|w| json!({ "key1": w })));
            anyhow::Ok(words)
        })
        .add_item_branch(move |item: &Value| {
            let len = item["key1"].as_str().map_or(0, str::len);
            let target = if len > 6 { too_long.clone() } else { too_short.clone() };
            async move { anyhow::Ok(target) }
        });

    let context = RunContext::default().into_shared();
    match flow.execute_with_context(Vec::new(), context.clone()).await {
        Ok(items) => {
            println!("\n✅ Routed {} items:", items.len());
            for item in &items {
                println!("   {}", item);
            }
        }
        Err(e) => println!("\n❌ Error: {}", e),
    }

    log_run_summary(&*context.lock().await);
    Ok(())
}
