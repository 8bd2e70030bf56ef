#[path = "../support/mod.rs"]
mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use normalized_cache::{
    ComputedDefinition, EntityId, Entrypoint, Environment, EnvironmentConfig, FetchPolicy,
    ReadDataResult, ReadOutcome, ReadValue, Scalar, SelectionNode, SelectionRegistry, Variables,
};
use serde_json::json;
use support::{pets_entrypoint, pets_response, pets_selections, vars, ScriptedNetwork, PETS_QUERY};

fn pets_environment(config: EnvironmentConfig) -> (Environment, ScriptedNetwork) {
    let network = ScriptedNetwork::new();
    network.respond(PETS_QUERY, pets_response());
    let env = Environment::with_config(SelectionRegistry::new(), network.clone(), config);
    (env, network)
}

#[test]
fn identical_fetches_share_one_request() {
    let (env, network) = pets_environment(EnvironmentConfig::default());
    let entrypoint = pets_entrypoint();

    let mut first = env.fetch(&entrypoint, vars(json!({"first": 2})), FetchPolicy::Always).unwrap();
    let mut second = env.fetch(&entrypoint, vars(json!({"first": 2})), FetchPolicy::Always).unwrap();

    assert_eq!(network.request_count(), 1);
    assert!(first.shares_item_with(&second));
    assert_eq!(network.requests()[0].variables, vars(json!({"first": 2})));

    first.dispose().unwrap();
    second.dispose().unwrap();
}

#[test]
fn different_variables_are_different_requests() {
    let (env, network) = pets_environment(EnvironmentConfig::default());
    let entrypoint = pets_entrypoint();

    let first = env.fetch(&entrypoint, vars(json!({"first": 2})), FetchPolicy::Always).unwrap();
    let second = env.fetch(&entrypoint, vars(json!({"first": 3})), FetchPolicy::Always).unwrap();

    assert_eq!(network.request_count(), 2);
    assert!(!first.shares_item_with(&second));
}

#[test]
fn fetched_fragment_reads_ready() {
    let (env, _) = pets_environment(EnvironmentConfig::default());
    let pointer = env.load(&pets_entrypoint(), vars(json!({"first": 2}))).unwrap();

    let fragment = pointer.get_item().unwrap();
    let value = env.read(&fragment).unwrap().ready().unwrap();
    assert_eq!(value.to_json(), Some(pets_response()));
}

#[test]
fn network_failures_are_errors_and_not_cached() {
    let network = ScriptedNetwork::new();
    let env = Environment::new(SelectionRegistry::new(), network.clone());

    assert!(env.fetch(&pets_entrypoint(), vars(json!({"first": 2})), FetchPolicy::Always).is_err());
    network.respond(PETS_QUERY, pets_response());
    assert!(env.fetch(&pets_entrypoint(), vars(json!({"first": 2})), FetchPolicy::Always).is_ok());
    assert_eq!(network.request_count(), 2);
}

#[test]
fn released_queries_are_collected_once_out_of_the_buffer() {
    let config = EnvironmentConfig {
        gc_buffer_size: 0,
        collect_on_release: true,
        ..EnvironmentConfig::default()
    };
    let (env, _) = pets_environment(config);

    let mut pointer = env.fetch(&pets_entrypoint(), vars(json!({"first": 2})), FetchPolicy::Always).unwrap();
    assert!(env.store().contains(&EntityId::new("0")).unwrap());

    pointer.dispose().unwrap();
    assert_eq!(env.store().ids().unwrap(), vec![EntityId::root()]);
}

#[test]
fn retained_and_buffered_queries_survive_collection() {
    let (env, _) = pets_environment(EnvironmentConfig::default());
    let mut pointer = env.fetch(&pets_entrypoint(), vars(json!({"first": 2})), FetchPolicy::Always).unwrap();
    env.write(
        &[SelectionNode::linked("stray", vec![SelectionNode::scalar("name")])],
        json!({"stray": {"id": "99", "name": "gone"}}).as_object().unwrap(),
        &Variables::new(),
        &EntityId::root(),
    )
    .unwrap();

    assert_eq!(env.garbage_collect().unwrap(), 1);
    assert!(!env.store().contains(&EntityId::new("99")).unwrap());

    // Released but still within the recency buffer.
    pointer.dispose().unwrap();
    assert_eq!(env.garbage_collect().unwrap(), 0);
    assert!(env.store().contains(&EntityId::new("1")).unwrap());
}

#[test]
fn fragment_subscriptions_fire_only_on_changed_results() {
    let (env, _) = pets_environment(EnvironmentConfig::default());
    let pointer = env.load(&pets_entrypoint(), vars(json!({"first": 2}))).unwrap();
    let fragment = (*pointer.get_item().unwrap()).clone();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let buffer = Arc::clone(&seen);
    env.subscribe_fragment(fragment, move |result| {
        buffer.lock().unwrap().push(result.clone());
    })
    .unwrap();

    let rename = |name: &str| {
        env.write(
            &[SelectionNode::linked("pet", vec![SelectionNode::scalar("id"), SelectionNode::scalar("name")])],
            json!({"pet": {"id": "1", "name": name}}).as_object().unwrap(),
            &Variables::new(),
            &EntityId::root(),
        )
        .unwrap();
    };
    rename("Tom");
    assert!(seen.lock().unwrap().is_empty());

    rename("Thomas");
    let results = seen.lock().unwrap().clone();
    assert_eq!(results.len(), 1);
    let ReadDataResult::Success(value) = &results[0] else {
        panic!("expected success");
    };
    let names: Vec<_> = value
        .get("pets")
        .and_then(ReadValue::as_list)
        .unwrap()
        .iter()
        .map(|pet| pet.get("name").and_then(ReadValue::as_str).unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Rex", "Thomas"]);
}

#[test]
fn fragment_subscription_hears_the_write_that_fills_it() {
    let env = Environment::new(SelectionRegistry::new(), ScriptedNetwork::new());
    let fragment = pets_entrypoint().fragment(vars(json!({"first": 2})));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let buffer = Arc::clone(&seen);
    env.subscribe_fragment(fragment, move |result| {
        buffer.lock().unwrap().push(result.is_success());
    })
    .unwrap();

    env.write(
        &pets_selections(),
        pets_response().as_object().unwrap(),
        &vars(json!({"first": 2})),
        &EntityId::root(),
    )
    .unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![true]);
}

#[test]
fn subscribers_may_fetch_the_query_being_written() {
    let (env, network) = pets_environment(EnvironmentConfig::default());
    let nested = Arc::new(Mutex::new(Vec::new()));
    let handles = Arc::clone(&nested);
    let inner = env.clone();
    env.subscriptions()
        .subscribe(move |_| {
            let pointer = inner
                .fetch(&pets_entrypoint(), vars(json!({"first": 2})), FetchPolicy::IfNecessary)
                .unwrap();
            handles.lock().unwrap().push(pointer);
        })
        .unwrap();

    let outer = env.fetch(&pets_entrypoint(), vars(json!({"first": 2})), FetchPolicy::Always).unwrap();
    let nested = nested.lock().unwrap();
    assert_eq!(nested.len(), 1);
    assert!(nested[0].shares_item_with(&outer));
    assert_eq!(network.request_count(), 1);
}

#[test]
fn abandoned_pending_reads_leave_no_waiters() {
    let env = Environment::new(SelectionRegistry::new(), ScriptedNetwork::new());
    let fragment = pets_entrypoint().fragment(vars(json!({"first": 2})));

    for _ in 0..100 {
        assert!(env.read(&fragment).unwrap().is_pending());
    }
    assert_eq!(env.subscriptions().len().unwrap(), 0);
}

#[test]
fn record_subscriptions_hear_their_record() {
    let (env, _) = pets_environment(EnvironmentConfig::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    env.subscriptions()
        .subscribe_to_record(EntityId::new("1"), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    env.load(&pets_entrypoint(), vars(json!({"first": 2}))).unwrap();
    env.fetch(&pets_entrypoint(), vars(json!({"first": 2})), FetchPolicy::Always).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn deferred_components_materialize_later() {
    let mut registry = SelectionRegistry::new();
    registry.register_lazy("PetBadge", || {
        ComputedDefinition::component("PetBadge", vec![SelectionNode::scalar("name")], |value, _| {
            let name = value.get("name").and_then(ReadValue::as_str).unwrap_or_default();
            ReadValue::Scalar(Scalar::from(format!("[{}]", name)))
        })
    });
    let network = ScriptedNetwork::new();
    network.respond(PETS_QUERY, pets_response());
    let env = Environment::new(registry, network);

    let entrypoint = pets_entrypoint().with_reader(vec![SelectionNode::linked(
        "pets",
        vec![SelectionNode::computed("PetBadge").with_alias("badge")],
    )
    .with_argument("first", normalized_cache::ArgumentValue::Variable("first".into()))]);
    let pointer = env.load(&entrypoint, vars(json!({"first": 2}))).unwrap();

    let value = env.read(&pointer.get_item().unwrap()).unwrap().ready().unwrap();
    let badge = value.get("pets").and_then(ReadValue::as_list).unwrap()[1]
        .get("badge")
        .and_then(ReadValue::as_deferred)
        .unwrap()
        .clone();

    let rendered = env.materialize(&badge).unwrap().ready().unwrap();
    assert_eq!(rendered, ReadValue::Scalar(Scalar::from("[Tom]")));
}

#[test]
fn entrypoint_transform_shapes_the_result() {
    let (env, _) = pets_environment(EnvironmentConfig::default());
    let entrypoint: Entrypoint = pets_entrypoint().with_transform(|value, variables| {
        let count = value.get("pets").and_then(ReadValue::as_list).map_or(0, |pets| pets.len());
        let limit = variables.get("first").and_then(|first| first.as_i64()).unwrap_or(0);
        ReadValue::Scalar(Scalar::from(format!("{}/{}", count, limit)))
    });

    let pointer = env.load(&entrypoint, vars(json!({"first": 2}))).unwrap();
    let value = env.read(&pointer.get_item().unwrap()).unwrap().ready().unwrap();
    assert_eq!(value.as_str(), Some("2/2"));
}

#[tokio::test]
async fn pending_reads_resume_after_a_write() {
    let env = Environment::new(SelectionRegistry::new(), ScriptedNetwork::new());
    let fragment = pets_entrypoint().fragment(vars(json!({"first": 2})));

    let ReadOutcome::Pending { missing, next_change } = env.read(&fragment).unwrap() else {
        panic!("expected pending");
    };
    assert!(missing.record.is_root());

    let writer = env.clone();
    tokio::spawn(async move {
        writer
            .write(
                &pets_selections(),
                pets_response().as_object().unwrap(),
                &vars(json!({"first": 2})),
                &EntityId::root(),
            )
            .unwrap();
    });

    next_change.await;
    assert!(!env.read(&fragment).unwrap().is_pending());
}
