#![allow(clippy::unwrap_used)]

mod common;

use common::{create_module, store};
use ledger_vectordb_core::InputError;
use ledger_vectordb_engine::EngineError;
use serde_json::{Value, json};

fn with_template(template: Value) -> Value {
    json!({
        "context": 0,
        "q_vector": "[1,2,3]",
        "max_distance": "1.0",
        "query_template": template,
    })
}

#[tokio::test]
async fn template_output_replaces_raw_list() {
    let (module, registry, _dir) = create_module(3).await;
    module
        .event_sink()
        .apply_block(module.storage().as_ref(), &[store(0, 7, "[1,2,3]"), store(0, 8, "[1,2,4]")])
        .await
        .unwrap();
    registry
        .register_fn("count_results", |args| {
            let results = args["closest_results"].as_array().cloned().unwrap_or_default();
            Ok(json!({ "count": results.len(), "label": args["label"] }))
        })
        .await;

    let chained = module
        .query(
            "query_closest_objects",
            &with_template(json!({ "type": "count_results", "args": { "label": "near" } })),
        )
        .await
        .unwrap();
    assert_eq!(chained, json!({ "count": 2, "label": "near" }));
}

#[tokio::test]
async fn handler_receives_closest_results_verbatim() {
    let (module, registry, _dir) = create_module(3).await;
    module
        .event_sink()
        .apply_block(module.storage().as_ref(), &[store(0, 1, "[1,2,3]")])
        .await
        .unwrap();
    registry.register_fn("echo", |args| Ok(args)).await;

    let raw = module
        .query("query_closest_objects", &json!({ "context": 0, "q_vector": "[1,2,3]", "max_distance": "1" }))
        .await
        .unwrap();
    let chained =
        module.query("query_closest_objects", &with_template(json!({ "type": "echo" }))).await.unwrap();
    assert_eq!(chained, json!({ "closest_results": raw }));
}

#[tokio::test]
async fn handlers_registered_later_are_found() {
    let (module, registry, _dir) = create_module(3).await;
    let args = with_template(json!({ "type": "late" }));

    let err = module.query("query_closest_objects", &args).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(InputError::UnknownQuery(ref q)) if q == "late"));

    registry.register_fn("late", |_| Ok(json!("found"))).await;
    assert_eq!(module.query("query_closest_objects", &args).await.unwrap(), json!("found"));
}

#[tokio::test]
async fn handler_failure_is_reported_by_name() {
    let (module, registry, _dir) = create_module(3).await;
    registry.register_fn("broken", |_| Err(anyhow::anyhow!("boom"))).await;

    let err = module
        .query("query_closest_objects", &with_template(json!({ "type": "broken" })))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Handler { ref name, .. } if name == "broken"));
    assert!(!err.is_user_error());
}

#[tokio::test]
async fn missing_template_type_is_user_error() {
    let (module, _registry, _dir) = create_module(3).await;
    let err = module
        .query("query_closest_objects", &with_template(json!({ "args": {} })))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvalidInput(InputError::MissingArgument("query_template.type"))
    ));
}
