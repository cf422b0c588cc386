use anyhow::Result;
use branchflow::prelude::*;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

async fn tag_too_long(mut item: Value) -> Result<Value> {
    item["type"] = json!("tooLong");
    Ok(item)
}

async fn tag_too_short(mut item: Value) -> Result<Value> {
    item["type"] = json!("tooShort");
    Ok(item)
}

fn words(names: &[&str]) -> Vec<Value> {
    names.iter().map(|name| json!({ "key1": name })).collect()
}

fn key1s(items: &[Value]) -> Vec<&str> {
    items
        .iter()
        .map(|item| item["key1"].as_str().unwrap_or_default())
        .collect()
}

/// Routes words longer than six characters to "tooLongBranch".
fn length_router() -> Flow<Vec<Value>> {
    let too_long = Flow::<Vec<Value>>::new("tooLongBranch")
        .add_map(tag_too_long)
        .handle();
    let too_short = Flow::<Vec<Value>>::new("tooShortBranch")
        .add_map(tag_too_short)
        .handle();

    Flow::<Vec<Value>>::new("branch name").add_item_branch(move |item: &Value| {
        let len = item["key1"].as_str().map_or(0, str::len);
        let target = if len > 6 { too_long.clone() } else { too_short.clone() };
        async move { anyhow::Ok(target) }
    })
}

#[tokio::test]
async fn test_contiguous_groups_keep_order() -> Result<()> {
    let result = length_router()
        .execute(words(&["pippo", "pluto", "paperina", "paperino"]))
        .await?;

    assert_eq!(
        result,
        vec![
            json!({ "key1": "pippo", "type": "tooShort" }),
            json!({ "key1": "pluto", "type": "tooShort" }),
            json!({ "key1": "paperina", "type": "tooLong" }),
            json!({ "key1": "paperino", "type": "tooLong" }),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_interleaved_items_merge_as_group_blocks() -> Result<()> {
    let result = length_router()
        .execute(words(&["pippo", "paperina", "pluto", "paperino"]))
        .await?;

    assert_eq!(
        result,
        vec![
            json!({ "key1": "pippo", "type": "tooShort" }),
            json!({ "key1": "pluto", "type": "tooShort" }),
            json!({ "key1": "paperina", "type": "tooLong" }),
            json!({ "key1": "paperino", "type": "tooLong" }),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_groups_ordered_by_first_appearance() -> Result<()> {
    let make = |name: &str| Flow::<Vec<Value>>::new(name).handle();
    let (a, b, c) = (make("a"), make("b"), make("c"));

    let flow = Flow::<Vec<Value>>::new("router").add_item_branch(move |item: &Value| {
        let target = match item["key1"].as_str().and_then(|s| s.chars().next()) {
            Some('a') => a.clone(),
            Some('b') => b.clone(),
            _ => c.clone(),
        };
        async move { anyhow::Ok(target) }
    });

    let result = flow
        .execute(words(&["b1", "a1", "b2", "c1", "a2", "b3"]))
        .await?;

    assert_eq!(key1s(&result), vec!["b1", "b2", "b3", "a1", "a2", "c1"]);
    Ok(())
}

#[tokio::test]
async fn test_empty_input_yields_empty_output() -> Result<()> {
    let result = length_router().execute(Vec::new()).await?;

    assert!(result.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_group_output_feeds_next_stage() -> Result<()> {
    let flow = length_router().add_stage(|arr: Vec<Value>| async move {
        anyhow::Ok(vec![json!({ "count": arr.len() })])
    });

    let result = flow.execute(words(&["pippo", "paperina", "pluto"])).await?;

    assert_eq!(result, vec![json!({ "count": 3 })]);
    Ok(())
}

#[tokio::test]
async fn test_groups_run_concurrently() -> Result<()> {
    // Each group waits for the other; run one after the other they would
    // never get past the barrier.
    let barrier = Arc::new(Barrier::new(2));
    let make = |name: &str| {
        let barrier = barrier.clone();
        Flow::<Vec<Value>>::new(name)
            .add_stage(move |arr: Vec<Value>| {
                let barrier = barrier.clone();
                async move {
                    barrier.wait().await;
                    anyhow::Ok(arr)
                }
            })
            .handle()
    };
    let (left, right) = (make("left"), make("right"));

    let flow = Flow::<Vec<Value>>::new("router").add_item_branch(move |item: &Value| {
        let target = if item["side"] == "left" { left.clone() } else { right.clone() };
        async move { anyhow::Ok(target) }
    });

    let input = vec![json!({ "side": "left" }), json!({ "side": "right" })];
    let result = tokio::time::timeout(Duration::from_secs(5), flow.execute(input.clone()))
        .await
        .expect("groups should not wait on each other")?;

    assert_eq!(result, input);
    Ok(())
}

#[tokio::test]
async fn test_group_failure_fails_stage_without_cancelling_siblings() -> Result<()> {
    let slow_done = Arc::new(AtomicBool::new(false));

    let flag = slow_done.clone();
    let slow = Flow::<Vec<Value>>::new("slow")
        .add_stage(move |arr: Vec<Value>| {
            let flag = flag.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                flag.store(true, Ordering::SeqCst);
                anyhow::Ok(arr)
            }
        })
        .handle();
    let broken = Flow::<Vec<Value>>::new("broken")
        .add_stage(|_arr: Vec<Value>| async move {
            Err::<Vec<Value>, _>(anyhow::anyhow!("group exploded"))
        })
        .handle();

    let flow = Flow::<Vec<Value>>::new("router").add_item_branch(move |item: &Value| {
        let target = if item["ok"] == true { slow.clone() } else { broken.clone() };
        async move { anyhow::Ok(target) }
    });

    let input = vec![json!({ "ok": true }), json!({ "ok": false })];
    let err = flow.execute(input.clone()).await.unwrap_err();

    assert_eq!(err.to_string(), "group exploded");
    assert_eq!(err.partial(), Some(&input));
    assert!(!slow_done.load(Ordering::SeqCst));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(slow_done.load(Ordering::SeqCst));
    Ok(())
}

#[tokio::test]
async fn test_selector_failure_fails_stage() -> Result<()> {
    let fallback = Flow::<Vec<Value>>::new("fallback").handle();
    let flow = Flow::<Vec<Value>>::new("router").add_item_branch(move |item: &Value| {
        let known = item.get("key1").is_some();
        let target = fallback.clone();
        async move {
            if !known {
                anyhow::bail!("cannot route item without key1");
            }
            anyhow::Ok(target)
        }
    });

    let err = flow
        .execute(vec![json!({ "key1": "pippo" }), json!({ "other": 1 })])
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "cannot route item without key1");
    Ok(())
}

#[tokio::test]
async fn test_json_array_value_as_sequence() -> Result<()> {
    let upper = Flow::<Value>::new("upper")
        .add_map(|item: Value| async move {
            let word = item.as_str().unwrap_or_default().to_uppercase();
            anyhow::Ok(json!(word))
        })
        .handle();
    let keep = Flow::<Value>::new("keep").handle();

    let flow = Flow::<Value>::new("json").add_item_branch(move |item: &Value| {
        let target = if item.as_str().map_or(false, |s| s.starts_with('p')) {
            upper.clone()
        } else {
            keep.clone()
        };
        async move { anyhow::Ok(target) }
    });

    let result = flow.execute(json!(["pippo", "topolino", "pluto"])).await?;
    assert_eq!(result, json!(["PIPPO", "PLUTO", "topolino"]));

    let err = flow.execute(json!({ "key1": "pippo" })).await.unwrap_err();
    assert_eq!(err.to_string(), "expected a sequence, got an object");
    Ok(())
}

#[tokio::test]
async fn test_nested_groups_share_run_context() -> Result<()> {
    let ctx = RunContext::default().into_shared();

    length_router()
        .execute_with_context(words(&["pippo", "paperina", "pluto"]), ctx.clone())
        .await?;

    let guard = ctx.lock().await;
    assert_eq!(guard.logs_for("branch name").count(), 1);
    assert_eq!(guard.logs_for("tooShortBranch").count(), 1);
    assert_eq!(guard.logs_for("tooLongBranch").count(), 1);
    assert_eq!(guard.count_with_status(StageStatus::Success), 3);
    Ok(())
}
